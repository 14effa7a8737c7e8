//! Client configuration: endpoints, credentials and the default block size.

use crate::error::{FsError, Result};
use reqwest::RequestBuilder;
use url::Url;

/// Default caching unit for buffered file handles (5 MiB).
pub const DEFAULT_BLOCK_SIZE: u64 = 5 * 1024 * 1024;

/// Credentials attached to every namespace and door request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    Anonymous,
    Bearer(String),
    Basic { username: String, password: String },
}

impl Credentials {
    /// Builds credentials from the optional user-facing fields.
    ///
    /// Username and password must come together, and a token cannot be
    /// combined with a password.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        match (username, password, token) {
            (Some(_), None, _) | (None, Some(_), _) => Err(FsError::InvalidConfig(
                "username or password not provided".to_string(),
            )),
            (Some(_), Some(_), Some(_)) => Err(FsError::InvalidConfig(
                "provide either token or username/password".to_string(),
            )),
            (Some(username), Some(password), None) => Ok(Self::Basic { username, password }),
            (None, None, Some(token)) => Ok(Self::Bearer(token)),
            (None, None, None) => Ok(Self::Anonymous),
        }
    }

    pub(crate) fn apply(&self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Anonymous => builder,
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FsConfig {
    /// Base URL of the namespace REST API (e.g. `https://host:3880/api/v1`).
    pub api_url: Option<Url>,
    /// Base URL of the WebDAV byte-transfer door.
    pub webdav_url: Option<Url>,
    pub credentials: Credentials,
    /// `None` selects [`DEFAULT_BLOCK_SIZE`]; `Some(0)` selects unbuffered streaming.
    pub block_size: Option<u64>,
}

impl FsConfig {
    pub fn new(
        api_url: Option<&str>,
        webdav_url: Option<&str>,
        username: Option<String>,
        password: Option<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let credentials = Credentials::from_parts(username, password, token)?;
        Ok(Self {
            api_url: api_url.map(Url::parse).transpose()?,
            webdav_url: webdav_url.map(Url::parse).transpose()?,
            credentials,
            block_size: None,
        })
    }

    pub fn with_block_size(mut self, block_size: Option<u64>) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn api_url(&self) -> Result<&Url> {
        self.api_url.as_ref().ok_or(FsError::MissingUrl("dCache API URL"))
    }

    pub fn webdav_url(&self) -> Result<&Url> {
        self.webdav_url.as_ref().ok_or(FsError::MissingUrl("WebDAV URL"))
    }

    pub fn effective_block_size(&self) -> u64 {
        self.block_size.unwrap_or(DEFAULT_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        assert_eq!(
            Credentials::from_parts(None, None, None).unwrap(),
            Credentials::Anonymous
        );
        assert_eq!(
            Credentials::from_parts(None, None, Some("t".into())).unwrap(),
            Credentials::Bearer("t".into())
        );
        assert!(matches!(
            Credentials::from_parts(Some("u".into()), None, None),
            Err(FsError::InvalidConfig(_))
        ));
        assert!(matches!(
            Credentials::from_parts(None, Some("p".into()), None),
            Err(FsError::InvalidConfig(_))
        ));
        assert!(matches!(
            Credentials::from_parts(Some("u".into()), Some("p".into()), Some("t".into())),
            Err(FsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_urls_are_reported_lazily() {
        let config = FsConfig::new(None, Some("https://door.example:2880"), None, None, None)
            .unwrap();
        assert!(matches!(config.api_url(), Err(FsError::MissingUrl(_))));
        assert_eq!(
            config.webdav_url().unwrap().as_str(),
            "https://door.example:2880/"
        );
        assert_eq!(config.effective_block_size(), DEFAULT_BLOCK_SIZE);
        assert_eq!(config.with_block_size(Some(0)).effective_block_size(), 0);
    }
}
