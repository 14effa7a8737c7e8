//! Path helpers: protocol stripping and remote object addressing.

use crate::error::{FsError, Result};
use url::Url;

/// Reduces `https://host/a/b` (or a bare `/a/b`) to the absolute path `/a/b`.
pub fn strip_protocol(path: &str) -> String {
    let raw = match Url::parse(path) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => path.to_string(),
    };
    normalize(&raw)
}

/// Origin (`scheme://host[:port]`) of a full URL, used to override the door base.
pub fn door_from_url(path: &str) -> Option<Url> {
    let url = Url::parse(path).ok()?;
    if !url.has_host() {
        return None;
    }
    Url::parse(&url.origin().ascii_serialization()).ok()
}

fn normalize(p: &str) -> String {
    let parts: Vec<&str> = p.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", parts.join("/"))
}

/// Joins `child` under `parent` the way listings name their entries.
pub fn join(parent: &str, child: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// A remote file as seen by the byte-transfer door.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteObject {
    path: String,
    door: Url,
}

impl RemoteObject {
    pub fn new(door: Url, path: &str) -> Self {
        Self {
            path: strip_protocol(path),
            door,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Door URL of the object: the door base with the path segments appended.
    pub fn url(&self) -> Result<Url> {
        let mut url = self.door.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| FsError::InvalidInput(format!("cannot-be-a-base url {}", self.door)))?;
            segments.pop_if_empty();
            segments.extend(self.path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }
}
