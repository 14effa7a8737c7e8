use anyhow::Context;
use clap::Parser;
use cli::{Args, Command};
use comfy_table::Table;
use comfy_table::presets::UTF8_FULL;
use dcachefs::{DcacheFs, FsConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing_subscriber::EnvFilter;

mod cli;

/// Local I/O granularity for `put` and `get`.
const COPY_CHUNK: usize = 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = FsConfig::new(
        args.api_url.as_deref(),
        args.webdav_url.as_deref(),
        args.username,
        args.password,
        args.token,
    )?
    .with_block_size(args.block_size);
    let fs = DcacheFs::new(config)?;

    match args.command {
        Command::Ls { path, long, limit } => ls(&fs, &path, long, limit).await,
        Command::Info { path } => {
            let details = fs.info(&path).await?;
            println!("{}", serde_json::to_string_pretty(&details)?);
            Ok(())
        }
        Command::Mv { from, to } => Ok(fs.mv(&from, &to).await?),
        Command::Rm { path } => Ok(fs.rm(&path).await?),
        Command::Cat { path } => {
            let data = fs.cat(&path).await?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
            Ok(())
        }
        Command::Put { local, remote } => put(&fs, &local, &remote).await,
        Command::Get { remote, local } => get(&fs, &remote, &local).await,
    }
}

async fn ls(fs: &DcacheFs, path: &str, long: bool, limit: Option<u32>) -> anyhow::Result<()> {
    let entries = fs.ls(path, limit).await?;
    if !long {
        entries.iter().for_each(|e| println!("{}", e.name));
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["name", "type", "size", "modified"]);
    for e in entries {
        table.add_row(vec![
            e.name,
            e.kind.to_string(),
            e.size.map(|s| s.to_string()).unwrap_or_default(),
            e.modified.map(|m| m.to_rfc3339()).unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}

async fn put(fs: &DcacheFs, local: &str, remote: &str) -> anyhow::Result<()> {
    let mut src = tokio::fs::File::open(local)
        .await
        .with_context(|| format!("failed to open {local}"))?;
    let mut dst = fs.open(remote, "wb").await?;
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        let n = match src.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                dst.close().await?;
                return Err(e).with_context(|| format!("failed to read {local}"));
            }
        };
        if n == 0 {
            break;
        }
        dst.write(&buf[..n]).await?;
    }
    dst.close().await?;
    tracing::info!("uploaded {} bytes to {remote}", dst.tell());
    Ok(())
}

async fn get(fs: &DcacheFs, remote: &str, local: &str) -> anyhow::Result<()> {
    let mut src = fs.open(remote, "rb").await?;
    let mut dst = tokio::fs::File::create(local)
        .await
        .with_context(|| format!("failed to create {local}"))?;
    loop {
        let chunk = src.read(COPY_CHUNK).await?;
        if chunk.is_empty() {
            break;
        }
        dst.write_all(&chunk).await?;
    }
    dst.flush().await?;
    src.close().await?;
    tracing::info!("downloaded {} bytes from {remote}", src.tell());
    Ok(())
}
