//! BufferedFile: random-access reads through a single-range read cache and
//! appending writes through a block-sized write buffer.

use super::mode::OpenMode;
use super::{FileHandle, seek_target};
use crate::door::ByteDoor;
use crate::door::range::ByteRange;
use crate::error::{FsError, Result};
use crate::path::RemoteObject;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::io::SeekFrom;
use std::sync::Arc;

/// Bytes of the object currently held in memory, tagged with where they came from.
struct ReadCache {
    range: ByteRange,
    data: Bytes,
}

enum State {
    Read {
        size: u64,
        cache: Option<ReadCache>,
    },
    Write {
        buffer: BytesMut,
        /// Bytes already acknowledged by the door.
        flushed: u64,
        /// Whether any upload or create has reached the door yet.
        created: bool,
    },
}

pub struct BufferedFile {
    door: Arc<dyn ByteDoor>,
    object: RemoteObject,
    mode: OpenMode,
    block_size: u64,
    offset: u64,
    state: State,
    closed: bool,
}

impl BufferedFile {
    pub fn reader(
        door: Arc<dyn ByteDoor>,
        object: RemoteObject,
        size: u64,
        block_size: u64,
    ) -> Self {
        Self {
            door,
            object,
            mode: OpenMode::READ,
            block_size: block_size.max(1),
            offset: 0,
            state: State::Read { size, cache: None },
            closed: false,
        }
    }

    pub fn writer(door: Arc<dyn ByteDoor>, object: RemoteObject, block_size: u64) -> Self {
        Self {
            door,
            object,
            mode: OpenMode::WRITE,
            block_size: block_size.max(1),
            offset: 0,
            state: State::Write {
                buffer: BytesMut::new(),
                flushed: 0,
                created: false,
            },
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

    /// Uploads the whole write buffer as one range. State only moves on success.
    async fn flush_buffer(&mut self) -> Result<()> {
        let State::Write {
            buffer,
            flushed,
            created,
        } = &mut self.state
        else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }
        let range = ByteRange::with_len(*flushed, buffer.len() as u64)?;
        let data = Bytes::copy_from_slice(buffer);
        self.door.upload(&self.object, range, data).await?;
        *flushed = range.end();
        *created = true;
        buffer.clear();
        Ok(())
    }
}

#[async_trait]
impl FileHandle for BufferedFile {
    fn path(&self) -> &str {
        self.object.path()
    }

    fn mode(&self) -> OpenMode {
        self.mode
    }

    fn tell(&self) -> u64 {
        match &self.state {
            State::Read { .. } => self.offset,
            State::Write {
                buffer, flushed, ..
            } => flushed + buffer.len() as u64,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn read(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_open()?;
        let block_size = self.block_size;
        let offset = self.offset;
        let State::Read { size, cache } = &mut self.state else {
            return Err(FsError::Unsupported("read on a write handle".to_string()));
        };
        let size = *size;
        if n == 0 || offset >= size {
            return Ok(Bytes::new());
        }
        let end = offset.saturating_add(n as u64).min(size);

        let hit = cache.as_ref().is_some_and(|c| c.range.contains(offset, end));
        if !hit {
            let want = (end - offset).max(block_size);
            let fetch_end = offset.saturating_add(want).min(size);
            let range = ByteRange::new(offset, fetch_end)?;
            let data = self.door.fetch(&self.object, range).await?;
            tracing::trace!(
                "{}: cache refill {range} returned {} bytes",
                self.object.path(),
                data.len()
            );
            *cache = if data.is_empty() {
                None
            } else {
                Some(ReadCache {
                    range: ByteRange::with_len(offset, data.len() as u64)?,
                    data,
                })
            };
        }

        let out = match cache {
            Some(c) if c.range.contains(offset, offset + 1) => {
                let from = (offset - c.range.start()) as usize;
                let to = (end.min(c.range.end()) - c.range.start()) as usize;
                c.data.slice(from..to)
            }
            _ => Bytes::new(),
        };
        self.offset += out.len() as u64;
        Ok(out)
    }

    async fn read_to_end(&mut self) -> Result<Bytes> {
        let remaining = match &self.state {
            State::Read { size, .. } => size.saturating_sub(self.offset),
            State::Write { .. } => 0,
        };
        let n = usize::try_from(remaining)
            .map_err(|_| FsError::InvalidInput(format!("{remaining} bytes do not fit in memory")))?;
        let mut out = BytesMut::with_capacity(n);
        loop {
            let chunk = self.read(n.max(1)).await?;
            if chunk.is_empty() {
                return Ok(out.freeze());
            }
            out.extend_from_slice(&chunk);
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.ensure_open()?;
        let block_size = self.block_size;
        let State::Write { buffer, .. } = &mut self.state else {
            return Err(FsError::Unsupported("write on a read handle".to_string()));
        };
        let before = buffer.len();
        buffer.extend_from_slice(data);
        if buffer.len() as u64 >= block_size {
            if let Err(e) = self.flush_buffer().await {
                // Undo the append; a retry sends the same range again.
                if let State::Write { buffer, .. } = &mut self.state {
                    buffer.truncate(before);
                }
                return Err(e);
            }
        }
        Ok(data.len())
    }

    async fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_buffer().await
    }

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let State::Read { size, .. } = &self.state else {
            return Err(FsError::Unsupported("seek on a write handle".to_string()));
        };
        self.offset = seek_target(pos, self.offset, *size)?;
        Ok(self.offset)
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_buffer().await?;
        match &mut self.state {
            State::Read { cache, .. } => *cache = None,
            State::Write { created, .. } => {
                if !*created {
                    self.door.create_empty(&self.object).await?;
                    *created = true;
                }
            }
        }
        self.closed = true;
        Ok(())
    }
}

impl Drop for BufferedFile {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let State::Write {
            buffer, created, ..
        } = &self.state
        {
            if !buffer.is_empty() {
                tracing::warn!(
                    "{} dropped without close; {} buffered bytes were not uploaded",
                    self.object.path(),
                    buffer.len()
                );
            } else if !*created {
                tracing::warn!(
                    "{} dropped without close; the object was never created",
                    self.object.path()
                );
            }
        }
    }
}
