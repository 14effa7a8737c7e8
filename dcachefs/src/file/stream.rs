//! StreamFile: one door call per `read`/`write`, nothing held in between.

use super::FileHandle;
use super::mode::OpenMode;
use crate::door::ByteDoor;
use crate::door::range::ByteRange;
use crate::error::{FsError, Result};
use crate::path::RemoteObject;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::SeekFrom;
use std::sync::Arc;

pub struct StreamFile {
    door: Arc<dyn ByteDoor>,
    object: RemoteObject,
    mode: OpenMode,
    offset: u64,
    /// Object size resolved at open; `None` for write handles.
    size: Option<u64>,
    /// Write handles only: whether the object has been touched on the door.
    created: bool,
    closed: bool,
}

impl StreamFile {
    pub fn reader(door: Arc<dyn ByteDoor>, object: RemoteObject, size: u64) -> Self {
        Self::new(door, object, OpenMode::READ, Some(size))
    }

    pub fn writer(door: Arc<dyn ByteDoor>, object: RemoteObject) -> Self {
        Self::new(door, object, OpenMode::WRITE, None)
    }

    fn new(
        door: Arc<dyn ByteDoor>,
        object: RemoteObject,
        mode: OpenMode,
        size: Option<u64>,
    ) -> Self {
        Self {
            door,
            object,
            mode,
            offset: 0,
            size,
            created: false,
            closed: false,
        }
    }

    /// Marks the handle as opened in text mode.
    pub fn with_text(mut self, text: bool) -> Self {
        self.mode.text = text;
        self
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(FsError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl FileHandle for StreamFile {
    fn path(&self) -> &str {
        self.object.path()
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn tell(&self) -> u64 {
        self.offset
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn read(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_open()?;
        let Some(size) = self.size else {
            return Err(FsError::Unsupported("read on a write handle".to_string()));
        };
        if n == 0 || self.offset >= size {
            return Ok(Bytes::new());
        }
        let end = self.offset.saturating_add(n as u64).min(size);
        let range = ByteRange::new(self.offset, end)?;
        let data = self.door.fetch(&self.object, range).await?;
        self.offset += data.len() as u64;
        Ok(data)
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        if self.mode.is_read() {
            return Err(FsError::Unsupported("write on a read handle".to_string()));
        }
        if data.is_empty() {
            return Ok(0);
        }
        let range = ByteRange::with_len(self.offset, data.len() as u64)?;
        self.door
            .upload(&self.object, range, Bytes::copy_from_slice(data))
            .await?;
        self.offset = range.end();
        self.created = true;
        Ok(data.len())
    }

    async fn flush(&mut self) -> Result<()> {
        self.ensure_open()
    }

    async fn seek(&mut self, _pos: SeekFrom) -> Result<u64> {
        Err(FsError::Unsupported(
            "seek on a sequential stream handle".to_string(),
        ))
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        if !self.mode.is_read() && !self.created {
            self.door.create_empty(&self.object).await?;
            self.created = true;
        }
        self.closed = true;
        Ok(())
    }
}
