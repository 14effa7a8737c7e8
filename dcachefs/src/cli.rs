use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Args {
    /// dCache namespace API base URL
    #[arg(long, env = "DCACHE_API_URL")]
    pub(crate) api_url: Option<String>,

    /// WebDAV door base URL
    #[arg(long, env = "DCACHE_WEBDAV_URL")]
    pub(crate) webdav_url: Option<String>,

    /// Username for basic authentication
    #[arg(short, long, env = "DCACHE_USERNAME")]
    pub(crate) username: Option<String>,

    /// Password for basic authentication
    #[arg(short, long, env = "DCACHE_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,

    /// Bearer token (macaroon)
    #[arg(short, long, env = "DCACHE_TOKEN", hide_env_values = true)]
    pub(crate) token: Option<String>,

    /// Block size for buffered transfers; 0 streams without caching
    #[arg(short, long, env = "DCACHE_BLOCK_SIZE")]
    pub(crate) block_size: Option<u64>,

    #[clap(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// List a directory.
    Ls {
        path: String,
        /// Show size, type and modification time.
        #[arg(short, long)]
        long: bool,
        /// Maximum number of entries to fetch.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Show metadata of a single path as JSON.
    Info { path: String },
    /// Rename or move a path.
    Mv { from: String, to: String },
    /// Delete a file or an empty directory.
    Rm { path: String },
    /// Print a remote file to stdout.
    Cat { path: String },
    /// Upload a local file.
    Put { local: String, remote: String },
    /// Download a remote file.
    Get { remote: String, local: String },
}
