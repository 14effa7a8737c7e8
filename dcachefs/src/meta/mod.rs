//! Namespace (metadata) access
//!
//! Submodules:
//! - `model`: wire entries and caller-facing `FileDetails`
//! - `client`: REST client for the namespace API
pub mod client;
pub mod model;

use crate::error::Result;
use async_trait::async_trait;
use model::NamespaceEntry;

/// Metadata operations the filesystem facade needs from the storage service.
#[async_trait]
pub trait Namespace: Send + Sync {
    /// Entry for `path`; with `children`, directory listings are embedded.
    async fn stat(&self, path: &str, children: bool, limit: Option<u32>) -> Result<NamespaceEntry>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn remove(&self, path: &str) -> Result<()>;
}
