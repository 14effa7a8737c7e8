//! In-process storage implementing both the namespace and the byte door.
//!
//! Used by unit tests; it behaves like a well-mannered
//! dCache (honours ranges, answers past-EOF fetches with nothing) and records
//! every range it serves so tests can count round trips.

use crate::door::ByteDoor;
use crate::door::range::ByteRange;
use crate::error::{FsError, Result};
use crate::meta::Namespace;
use crate::meta::model::{FileKind, NamespaceEntry};
use crate::path::{RemoteObject, strip_protocol};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

struct MemObject {
    data: Vec<u8>,
    created: i64,
    mtime: i64,
}

impl MemObject {
    fn new() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            data: Vec::new(),
            created: now,
            mtime: now,
        }
    }

    fn touch(&mut self) {
        self.mtime = chrono::Utc::now().timestamp_millis();
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    objects: Mutex<BTreeMap<String, MemObject>>,
    dirs: Mutex<BTreeSet<String>>,
    fetches: Mutex<Vec<ByteRange>>,
    uploads: Mutex<Vec<ByteRange>>,
    failing_uploads: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `path` with `data`, replacing any previous content.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        let mut obj = MemObject::new();
        obj.data = data.into();
        self.objects.lock().unwrap().insert(strip_protocol(path), obj);
    }

    pub fn mkdir(&self, path: &str) {
        self.dirs.lock().unwrap().insert(strip_protocol(path));
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&strip_protocol(path))
            .map(|o| o.data.clone())
    }

    /// Ranges requested through [`ByteDoor::fetch`], in call order.
    pub fn fetches(&self) -> Vec<ByteRange> {
        self.fetches.lock().unwrap().clone()
    }

    /// Ranges written through [`ByteDoor::upload`], in call order.
    pub fn uploads(&self) -> Vec<ByteRange> {
        self.uploads.lock().unwrap().clone()
    }

    /// Makes the next `n` uploads fail with a 503.
    pub fn fail_next_uploads(&self, n: usize) {
        self.failing_uploads.store(n, Ordering::SeqCst);
    }

    fn is_dir(&self, path: &str) -> bool {
        if path == "/" || self.dirs.lock().unwrap().contains(path) {
            return true;
        }
        let prefix = format!("{path}/");
        self.objects
            .lock()
            .unwrap()
            .keys()
            .any(|k| k.starts_with(&prefix))
    }

    fn children_of(&self, path: &str) -> Vec<NamespaceEntry> {
        let prefix = if path == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };
        let mut names: BTreeMap<String, NamespaceEntry> = BTreeMap::new();
        for (key, obj) in self.objects.lock().unwrap().iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind, size) = match rest.split_once('/') {
                Some((dir, _)) => (dir.to_string(), FileKind::Directory, None),
                None => (rest.to_string(), FileKind::File, Some(obj.data.len() as u64)),
            };
            names.entry(name.clone()).or_insert_with(|| NamespaceEntry {
                file_name: Some(name),
                file_type: Some(kind.as_wire().to_string()),
                size,
                creation_time: Some(obj.created),
                mtime: Some(obj.mtime),
                children: None,
            });
        }
        for dir in self.dirs.lock().unwrap().iter() {
            if let Some(rest) = dir.strip_prefix(&prefix) {
                let name = rest.split('/').next().unwrap_or(rest).to_string();
                if name.is_empty() {
                    continue;
                }
                names.entry(name.clone()).or_insert_with(|| NamespaceEntry {
                    file_name: Some(name),
                    file_type: Some(FileKind::Directory.as_wire().to_string()),
                    ..Default::default()
                });
            }
        }
        names.into_values().collect()
    }
}

#[async_trait]
impl ByteDoor for InMemoryStore {
    async fn fetch(&self, object: &RemoteObject, range: ByteRange) -> Result<Bytes> {
        self.fetches.lock().unwrap().push(range);
        let objects = self.objects.lock().unwrap();
        let obj = objects
            .get(object.path())
            .ok_or_else(|| FsError::NotFound(object.path().to_string()))?;
        let len = obj.data.len() as u64;
        if range.start() >= len {
            return Ok(Bytes::new());
        }
        let end = range.end().min(len);
        Ok(Bytes::copy_from_slice(
            &obj.data[range.start() as usize..end as usize],
        ))
    }

    async fn upload(&self, object: &RemoteObject, range: ByteRange, data: Bytes) -> Result<()> {
        let failing = self.failing_uploads.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_uploads.store(failing - 1, Ordering::SeqCst);
            return Err(FsError::RemoteRequest {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "injected failure".to_string(),
            });
        }
        if data.len() as u64 != range.len() {
            return Err(FsError::InvalidInput(format!(
                "payload of {} bytes does not match range {range}",
                data.len()
            )));
        }
        self.uploads.lock().unwrap().push(range);
        let mut objects = self.objects.lock().unwrap();
        let obj = objects
            .entry(object.path().to_string())
            .or_insert_with(MemObject::new);
        let (start, end) = (range.start() as usize, range.end() as usize);
        if obj.data.len() < end {
            obj.data.resize(end, 0);
        }
        obj.data[start..end].copy_from_slice(&data);
        obj.touch();
        Ok(())
    }

    async fn create_empty(&self, object: &RemoteObject) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        let obj = objects
            .entry(object.path().to_string())
            .or_insert_with(MemObject::new);
        obj.data.clear();
        obj.touch();
        Ok(())
    }
}

#[async_trait]
impl Namespace for InMemoryStore {
    async fn stat(&self, path: &str, children: bool, limit: Option<u32>) -> Result<NamespaceEntry> {
        let path = strip_protocol(path);
        if let Some(obj) = self.objects.lock().unwrap().get(&path) {
            return Ok(NamespaceEntry {
                file_name: None,
                file_type: Some(FileKind::File.as_wire().to_string()),
                size: Some(obj.data.len() as u64),
                creation_time: Some(obj.created),
                mtime: Some(obj.mtime),
                children: None,
            });
        }
        if !self.is_dir(&path) {
            return Err(FsError::NotFound(path));
        }
        let listing = children.then(|| {
            let mut all = self.children_of(&path);
            if let Some(limit) = limit {
                all.truncate(limit as usize);
            }
            all
        });
        Ok(NamespaceEntry {
            file_type: Some(FileKind::Directory.as_wire().to_string()),
            children: listing,
            ..Default::default()
        })
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let (from, to) = (strip_protocol(from), strip_protocol(to));
        let mut objects = self.objects.lock().unwrap();
        if let Some(obj) = objects.remove(&from) {
            objects.insert(to, obj);
            return Ok(());
        }
        let prefix = format!("{from}/");
        let moved: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        let mut dirs = self.dirs.lock().unwrap();
        let had_dir = dirs.remove(&from);
        if moved.is_empty() && !had_dir {
            return Err(FsError::NotFound(from));
        }
        if had_dir {
            dirs.insert(to.clone());
        }
        for key in moved {
            if let Some(obj) = objects.remove(&key) {
                objects.insert(format!("{to}/{}", &key[prefix.len()..]), obj);
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let path = strip_protocol(path);
        if self.objects.lock().unwrap().remove(&path).is_some() {
            return Ok(());
        }
        if !self.is_dir(&path) {
            return Err(FsError::NotFound(path));
        }
        if !self.children_of(&path).is_empty() {
            return Err(FsError::RemoteRequest {
                status: reqwest::StatusCode::BAD_REQUEST,
                body: format!("directory {path} is not empty"),
            });
        }
        self.dirs.lock().unwrap().remove(&path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn object(path: &str) -> RemoteObject {
        RemoteObject::new(Url::parse("http://door.local/").unwrap(), path)
    }

    #[tokio::test]
    async fn test_fetch_past_end_is_empty() {
        let store = InMemoryStore::new();
        store.insert("/a", b"Hello world!".to_vec());
        let out = store
            .fetch(&object("/a"), ByteRange::new(20, 30).unwrap())
            .await
            .unwrap();
        assert!(out.is_empty());
        let out = store
            .fetch(&object("/a"), ByteRange::new(0, 100).unwrap())
            .await
            .unwrap();
        assert_eq!(&out[..], b"Hello world!");
    }

    #[tokio::test]
    async fn test_listing_and_rename() {
        let store = InMemoryStore::new();
        store.insert("/d/a", b"1".to_vec());
        store.insert("/d/sub/b", b"22".to_vec());
        let entry = store.stat("/d", true, None).await.unwrap();
        let names: Vec<_> = entry
            .children
            .unwrap()
            .into_iter()
            .filter_map(|c| c.file_name)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "sub".to_string()]);

        store.rename("/d/sub", "/d/moved").await.unwrap();
        assert_eq!(store.get("/d/moved/b").unwrap(), b"22");
        assert!(matches!(
            store.remove("/d/nope").await,
            Err(FsError::NotFound(_))
        ));
    }
}
