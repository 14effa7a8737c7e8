//! dcachefs: filesystem-style access to a dCache instance.
//!
//! Metadata goes through the namespace REST API (`meta`), file bytes through
//! range requests against the WebDAV door (`door`). `file` turns sequences of
//! `read`/`write` calls into those range requests and [`DcacheFs`] ties the
//! pieces together.

pub mod config;
pub mod door;
pub mod error;
pub mod file;
pub mod fs;
pub mod memory;
pub mod meta;
pub mod path;

pub use config::{Credentials, DEFAULT_BLOCK_SIZE, FsConfig};
pub use error::{FsError, Result};
pub use file::FileHandle;
pub use fs::DcacheFs;
