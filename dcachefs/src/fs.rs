//! Filesystem facade: path-level metadata operations plus file handles.

use crate::config::FsConfig;
use crate::door::{ByteDoor, HttpDoor};
use crate::error::{FsError, Result};
use crate::file::mode::{Access, OpenMode};
use crate::file::text::TextFile;
use crate::file::{FileHandle, open_handle};
use crate::meta::Namespace;
use crate::meta::client::NamespaceClient;
use crate::meta::model::FileDetails;
use crate::path::{RemoteObject, door_from_url, strip_protocol};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::pin::Pin;
use std::sync::Arc;
use url::Url;

pub struct DcacheFs {
    config: FsConfig,
    namespace: Option<Arc<dyn Namespace>>,
    door: Arc<dyn ByteDoor>,
}

impl DcacheFs {
    /// Builds the HTTP-backed filesystem described by `config`.
    pub fn new(config: FsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dcachefs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let namespace = config.api_url.clone().map(|api_url| {
            Arc::new(NamespaceClient::new(
                client.clone(),
                config.credentials.clone(),
                api_url,
            )) as Arc<dyn Namespace>
        });
        let door = Arc::new(HttpDoor::new(client, config.credentials.clone()));
        Ok(Self {
            config,
            namespace,
            door,
        })
    }

    /// Filesystem over caller-supplied backends (e.g. `InMemoryStore`).
    pub fn with_backends(
        config: FsConfig,
        namespace: Arc<dyn Namespace>,
        door: Arc<dyn ByteDoor>,
    ) -> Self {
        Self {
            config,
            namespace: Some(namespace),
            door,
        }
    }

    fn namespace(&self) -> Result<&Arc<dyn Namespace>> {
        self.namespace
            .as_ref()
            .ok_or(FsError::MissingUrl("dCache API URL"))
    }

    /// Door base for `path`: a full URL brings its own origin.
    fn door_for(&self, path: &str) -> Result<Url> {
        match door_from_url(path) {
            Some(door) => Ok(door),
            None => Ok(self.config.webdav_url()?.clone()),
        }
    }

    pub async fn info(&self, path: &str) -> Result<FileDetails> {
        let entry = self.namespace()?.stat(path, false, None).await?;
        Ok(FileDetails::from_entry(path, &entry))
    }

    /// Like [`info`](Self::info) but maps a missing path to `None`.
    pub async fn resolve(&self, path: &str) -> Result<Option<FileDetails>> {
        match self.info(path).await {
            Ok(details) => Ok(Some(details)),
            Err(FsError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path).await?.is_some())
    }

    /// Details of the children of `path`, or of `path` itself when it has none.
    pub async fn ls(&self, path: &str, limit: Option<u32>) -> Result<Vec<FileDetails>> {
        let entry = self.namespace()?.stat(path, true, limit).await?;
        let details = match entry.children.as_deref() {
            Some(children) if !children.is_empty() => children
                .iter()
                .map(|child| FileDetails::from_entry(path, child))
                .collect(),
            _ => vec![FileDetails::from_entry(path, &entry)],
        };
        Ok(details)
    }

    pub async fn ls_names(&self, path: &str, limit: Option<u32>) -> Result<Vec<String>> {
        Ok(self
            .ls(path, limit)
            .await?
            .into_iter()
            .map(|d| d.name)
            .collect())
    }

    pub async fn created(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.info(path).await?.created)
    }

    pub async fn modified(&self, path: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self.info(path).await?.modified)
    }

    pub async fn mv(&self, from: &str, to: &str) -> Result<()> {
        self.namespace()?.rename(from, to).await
    }

    pub async fn rm(&self, path: &str) -> Result<()> {
        self.namespace()?.remove(path).await
    }

    /// Opens `path` with the configured block size.
    pub async fn open(&self, path: &str, mode: &str) -> Result<Box<dyn FileHandle>> {
        self.open_with(path, mode, self.config.block_size).await
    }

    /// Opens `path`; `block_size` of `Some(0)` selects the unbuffered stream handle.
    pub async fn open_with(
        &self,
        path: &str,
        mode: &str,
        block_size: Option<u64>,
    ) -> Result<Box<dyn FileHandle>> {
        let mode: OpenMode = mode.parse()?;
        if mode.access == Access::Append {
            return Err(FsError::Unsupported(format!(
                "append mode on {}",
                strip_protocol(path)
            )));
        }
        let block_size = block_size.unwrap_or_else(|| self.config.effective_block_size());
        let object = RemoteObject::new(self.door_for(path)?, path);

        let size = if mode.is_read() {
            let details = self
                .resolve(path)
                .await?
                .ok_or_else(|| FsError::NotFound(object.path().to_string()))?;
            if details.is_dir() {
                return Err(FsError::IsADirectory(object.path().to_string()));
            }
            Some(details.size.unwrap_or(0))
        } else {
            None
        };
        tracing::debug!(
            "open {} mode={mode} block_size={block_size} size={size:?}",
            object.path()
        );
        open_handle(self.door.clone(), object, mode, block_size, size)
    }

    pub async fn open_text(&self, path: &str, mode: &str) -> Result<TextFile> {
        Ok(TextFile::new(self.open(path, mode).await?))
    }

    /// Runs `f` with an open handle and closes it on every exit path.
    ///
    /// An error from `f` takes precedence over an error from the close.
    pub async fn with_file<F, R>(&self, path: &str, mode: &str, f: F) -> Result<R>
    where
        F: for<'a> FnOnce(
            &'a mut dyn FileHandle,
        ) -> Pin<Box<dyn Future<Output = Result<R>> + Send + 'a>>,
    {
        let mut handle = self.open(path, mode).await?;
        let out = f(handle.as_mut()).await;
        let closed = handle.close().await;
        match (out, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!("closing {path} after error failed: {close_err}");
                }
                Err(e)
            }
            (Ok(_), Err(e)) => Err(e),
        }
    }

    /// Whole content of `path`.
    pub async fn cat(&self, path: &str) -> Result<Bytes> {
        self.with_file(path, "rb", |f| Box::pin(async move { f.read_to_end().await }))
            .await
    }

    /// Replaces the content of `path` with `data`.
    pub async fn pipe(&self, path: &str, data: impl Into<Bytes>) -> Result<()> {
        let data: Bytes = data.into();
        self.with_file(path, "wb", |f| {
            Box::pin(async move {
                f.write(&data).await?;
                Ok::<(), FsError>(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::meta::model::FileKind;

    fn fs_with(store: Arc<InMemoryStore>, block_size: Option<u64>) -> DcacheFs {
        let config = FsConfig::new(
            Some("http://api.local/api/v1"),
            Some("http://door.local/"),
            None,
            None,
            Some("token".into()),
        )
        .unwrap()
        .with_block_size(block_size);
        DcacheFs::with_backends(config, store.clone(), store)
    }

    #[tokio::test]
    async fn test_hello_world_scenario() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/data/hello.txt", b"Hello world!".to_vec());
        let fs = fs_with(store, Some(4));
        let mut f = fs.open("/data/hello.txt", "rb").await.unwrap();
        assert_eq!(&f.read(5).await.unwrap()[..], b"Hello");
        f.read(1).await.unwrap();
        assert_eq!(&f.read(5).await.unwrap()[..], b"world");
        f.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_round_trip_sizes() {
        let block = 16usize;
        for (n, block_size) in [
            (0, Some(block as u64)),
            (1, Some(block as u64)),
            (block, Some(block as u64)),
            (block * 3 + 5, Some(block as u64)),
            (block * 3 + 5, Some(0)),
            (0, Some(0)),
        ] {
            let store = Arc::new(InMemoryStore::new());
            let fs = fs_with(store.clone(), block_size);
            let data: Vec<u8> = (0..n).map(|i| (i % 251) as u8).collect();
            let mut w = fs.open("/rt.bin", "wb").await.unwrap();
            for part in data.chunks(7) {
                w.write(part).await.unwrap();
            }
            w.close().await.unwrap();

            let mut r = fs.open("/rt.bin", "rb").await.unwrap();
            let back = r.read_to_end().await.unwrap();
            r.close().await.unwrap();
            assert_eq!(&back[..], &data[..], "n={n} block_size={block_size:?}");
        }
    }

    #[tokio::test]
    async fn test_append_fails_regardless_of_existence() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/exists", b"x".to_vec());
        let fs = fs_with(store.clone(), None);
        for path in ["/exists", "/missing"] {
            for mode in ["a", "ab", "at"] {
                assert!(matches!(
                    fs.open(path, mode).await,
                    Err(FsError::Unsupported(_))
                ));
            }
        }
        assert!(store.fetches().is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_or_dir() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/d/f", b"x".to_vec());
        let fs = fs_with(store, None);
        assert!(matches!(
            fs.open("/nope", "rb").await,
            Err(FsError::NotFound(_))
        ));
        assert!(matches!(
            fs.open("/d", "rb").await,
            Err(FsError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let store = Arc::new(InMemoryStore::new());
        store.mkdir("/empty");
        let fs = fs_with(store, None);
        assert!(fs.exists("/empty").await.unwrap());
        assert!(fs.info("/empty").await.unwrap().is_dir());
        let listing = fs.ls("/empty", None).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "/empty");
        assert!(listing[0].is_dir());
        assert_eq!(fs.ls_names("/", None).await.unwrap(), vec!["/empty".to_string()]);
        assert!(matches!(
            fs.open("/empty", "rb").await,
            Err(FsError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_open_keeps_text_mode() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/t.txt", b"text".to_vec());
        let fs = fs_with(store, Some(0));
        let mut f = fs.open("/t.txt", "rt").await.unwrap();
        assert_eq!(f.mode().to_string(), "rt");
        assert_eq!(&f.read_to_end().await.unwrap()[..], b"text");
        f.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_with_file_closes_on_error() {
        let store = Arc::new(InMemoryStore::new());
        let fs = fs_with(store.clone(), Some(1024));
        let res: Result<()> = fs
            .with_file("/partial", "wb", |f| {
                Box::pin(async move {
                    f.write(b"persisted").await?;
                    Err::<(), FsError>(FsError::InvalidInput("caller bailed".into()))
                })
            })
            .await;
        assert!(matches!(res, Err(FsError::InvalidInput(_))));
        assert_eq!(store.get("/partial").unwrap(), b"persisted");
    }

    #[tokio::test]
    async fn test_metadata_operations() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/d/a.txt", b"abc".to_vec());
        store.insert("/d/sub/b.txt", b"".to_vec());
        let fs = fs_with(store.clone(), None);

        let listing = fs.ls("/d", None).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].name, "/d/a.txt");
        assert_eq!(listing[0].size, Some(3));
        assert_eq!(listing[1].kind, FileKind::Directory);

        // A file lists as itself.
        assert_eq!(fs.ls_names("/d/a.txt", None).await.unwrap(), vec!["/d/a.txt"]);

        let info = fs.info("/d/a.txt").await.unwrap();
        assert_eq!(info.kind, FileKind::File);
        assert!(fs.created("/d/a.txt").await.unwrap().is_some());
        assert!(fs.modified("/d/a.txt").await.unwrap().is_some());

        fs.mv("/d/a.txt", "/d/c.txt").await.unwrap();
        assert!(!fs.exists("/d/a.txt").await.unwrap());
        assert_eq!(&fs.cat("/d/c.txt").await.unwrap()[..], b"abc");

        fs.rm("/d/c.txt").await.unwrap();
        assert!(fs.resolve("/d/c.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_text_mode_and_pipe() {
        let store = Arc::new(InMemoryStore::new());
        let fs = fs_with(store.clone(), Some(3));
        fs.pipe("/p.txt", &b"Hello world!"[..]).await.unwrap();
        let mut t = fs.open_text("/p.txt", "rt").await.unwrap();
        assert_eq!(t.read_to_string().await.unwrap(), "Hello world!");
        t.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_urls() {
        let config = FsConfig::new(None, None, None, None, None).unwrap();
        let fs = DcacheFs::new(config).unwrap();
        assert!(matches!(
            fs.info("/x").await,
            Err(FsError::MissingUrl(_))
        ));
        assert!(matches!(
            fs.open("/x", "wb").await,
            Err(FsError::MissingUrl(_))
        ));
    }
}
