//! Byte-transfer door (WebDAV) access.
//!
//! Submodules:
//! - `range`: half-open byte spans and their `Range` header form
//! - `fetch`: range GET with size validation
//! - `upload`: range PUT
//!
//! File handles only see the [`ByteDoor`] trait; [`HttpDoor`] is the real
//! implementation and `crate::memory::InMemoryStore` the in-process one.
pub mod fetch;
pub mod range;
pub mod upload;

use crate::config::Credentials;
use crate::error::Result;
use crate::path::RemoteObject;
use async_trait::async_trait;
use bytes::Bytes;
use range::ByteRange;
use reqwest::Client;

#[async_trait]
pub trait ByteDoor: Send + Sync {
    /// Returns at most `range.len()` bytes; fewer (or none) at end of object.
    async fn fetch(&self, object: &RemoteObject, range: ByteRange) -> Result<Bytes>;

    /// Writes exactly `range.len()` bytes of `data` at `range.start()`.
    async fn upload(&self, object: &RemoteObject, range: ByteRange, data: Bytes) -> Result<()>;

    /// Makes `object` exist with zero length.
    async fn create_empty(&self, object: &RemoteObject) -> Result<()>;
}

pub struct HttpDoor {
    client: Client,
    credentials: Credentials,
}

impl HttpDoor {
    pub fn new(client: Client, credentials: Credentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl ByteDoor for HttpDoor {
    async fn fetch(&self, object: &RemoteObject, range: ByteRange) -> Result<Bytes> {
        fetch::fetch_range(&self.client, &self.credentials, object, range).await
    }

    async fn upload(&self, object: &RemoteObject, range: ByteRange, data: Bytes) -> Result<()> {
        upload::upload_range(&self.client, &self.credentials, object, range, data).await
    }

    async fn create_empty(&self, object: &RemoteObject) -> Result<()> {
        upload::create_empty(&self.client, &self.credentials, object).await
    }
}
