//! Namespace API payloads and the details shape handed to callers.

use crate::path::{join, strip_protocol};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw entry returned by `GET /namespace/{path}`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub creation_time: Option<i64>,
    /// Milliseconds since the epoch.
    #[serde(default)]
    pub mtime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NamespaceEntry>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
    Other,
}

impl FileKind {
    pub fn from_wire(file_type: Option<&str>) -> Self {
        match file_type {
            Some("REGULAR") => FileKind::File,
            Some("DIR") => FileKind::Directory,
            _ => FileKind::Other,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            FileKind::File => "REGULAR",
            FileKind::Directory => "DIR",
            FileKind::Other => "LINK",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::File => write!(f, "file"),
            FileKind::Directory => write!(f, "directory"),
            FileKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileDetails {
    pub name: String,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl FileDetails {
    /// Details for `entry` as listed under `path`: a named entry is a child of
    /// `path`, an unnamed one is `path` itself.
    pub fn from_entry(path: &str, entry: &NamespaceEntry) -> Self {
        let path = strip_protocol(path);
        let name = match &entry.file_name {
            Some(name) => join(&path, name),
            None => path,
        };
        Self {
            name,
            size: entry.size,
            kind: FileKind::from_wire(entry.file_type.as_deref()),
            created: entry.creation_time.and_then(DateTime::from_timestamp_millis),
            modified: entry.mtime.and_then(DateTime::from_timestamp_millis),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}
