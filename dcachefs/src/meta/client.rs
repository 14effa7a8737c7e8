//! REST client for `{api}/namespace/{path}`.

use super::Namespace;
use super::model::NamespaceEntry;
use crate::config::Credentials;
use crate::error::{FsError, Result};
use crate::path::strip_protocol;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

pub struct NamespaceClient {
    client: Client,
    credentials: Credentials,
    api_url: Url,
}

impl NamespaceClient {
    pub fn new(client: Client, credentials: Credentials, api_url: Url) -> Self {
        Self {
            client,
            credentials,
            api_url,
        }
    }

    /// `{api}/namespace/{path}` with the whole path encoded as one segment.
    fn namespace_url(&self, path: &str) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| FsError::InvalidInput(format!("cannot-be-a-base url {}", self.api_url)))?
            .pop_if_empty()
            .push("namespace")
            .push(&strip_protocol(path));
        Ok(url)
    }
}

#[async_trait]
impl Namespace for NamespaceClient {
    async fn stat(&self, path: &str, children: bool, limit: Option<u32>) -> Result<NamespaceEntry> {
        let mut url = self.namespace_url(path)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("children", if children { "true" } else { "false" });
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        tracing::debug!("GET {url}");
        let res = self.credentials.apply(self.client.get(url)).send().await?;
        if !res.status().is_success() {
            return Err(FsError::from_response(strip_protocol(path), res).await);
        }
        Ok(res.json().await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let url = self.namespace_url(from)?;
        let body = json!({ "action": "mv", "destination": strip_protocol(to) });
        tracing::info!("mv {} -> {}", strip_protocol(from), strip_protocol(to));
        let res = self
            .credentials
            .apply(self.client.post(url).json(&body))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(FsError::from_response(strip_protocol(from), res).await);
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let url = self.namespace_url(path)?;
        tracing::info!("rm {}", strip_protocol(path));
        let res = self.credentials.apply(self.client.delete(url)).send().await?;
        if !res.status().is_success() {
            return Err(FsError::from_response(strip_protocol(path), res).await);
        }
        Ok(())
    }
}
