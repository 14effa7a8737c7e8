//! UTF-8 text adapter over a binary handle.

use super::FileHandle;
use crate::error::Result;

pub struct TextFile {
    inner: Box<dyn FileHandle>,
}

impl TextFile {
    pub fn new(inner: Box<dyn FileHandle>) -> Self {
        Self { inner }
    }

    /// Reads the rest of the file and decodes it.
    pub async fn read_to_string(&mut self) -> Result<String> {
        let bytes = self.inner.read_to_end().await?;
        Ok(String::from_utf8(bytes.to_vec())?)
    }

    pub async fn write_str(&mut self, s: &str) -> Result<usize> {
        self.inner.write(s.as_bytes()).await
    }

    pub async fn flush(&mut self) -> Result<()> {
        self.inner.flush().await
    }

    pub async fn close(&mut self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsError;
    use crate::file::buffered::BufferedFile;
    use crate::memory::InMemoryStore;
    use crate::path::RemoteObject;
    use std::sync::Arc;
    use url::Url;

    #[tokio::test]
    async fn test_text_round_trip() {
        let store = Arc::new(InMemoryStore::new());
        let object = RemoteObject::new(Url::parse("http://door.local/").unwrap(), "/t.txt");
        let mut w = TextFile::new(Box::new(BufferedFile::writer(store.clone(), object.clone(), 4)));
        w.write_str("grüß ").await.unwrap();
        w.write_str("dich").await.unwrap();
        w.close().await.unwrap();

        let size = store.get("/t.txt").unwrap().len() as u64;
        let mut r = TextFile::new(Box::new(BufferedFile::reader(store, object, size, 3)));
        assert_eq!(r.read_to_string().await.unwrap(), "grüß dich");
        r.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let store = Arc::new(InMemoryStore::new());
        store.insert("/bad", vec![0xff, 0xfe]);
        let object = RemoteObject::new(Url::parse("http://door.local/").unwrap(), "/bad");
        let mut r = TextFile::new(Box::new(BufferedFile::reader(store, object, 2, 8)));
        assert!(matches!(r.read_to_string().await, Err(FsError::Utf8(_))));
    }
}
