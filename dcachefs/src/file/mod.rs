//! Remote file handles
//!
//! Submodules:
//! - `mode`: open-mode parsing
//! - `buffered`: block-cached random-access handle
//! - `stream`: unbuffered sequential handle (`block_size == 0`)
//! - `text`: UTF-8 adapter over a binary handle
//!
//! [`open_handle`] picks the variant; everything above it talks to
//! `Box<dyn FileHandle>`.
pub mod buffered;
pub mod mode;
pub mod stream;
pub mod text;

use crate::door::ByteDoor;
use crate::error::{FsError, Result};
use crate::path::RemoteObject;
use async_trait::async_trait;
use buffered::BufferedFile;
use bytes::{Bytes, BytesMut};
use mode::{Access, OpenMode};
use std::io::SeekFrom;
use std::sync::Arc;
use stream::StreamFile;

/// Read size used by the default [`FileHandle::read_to_end`]; handles that know
/// their remaining length override it.
pub const STREAM_READ_CHUNK: usize = 1024 * 1024;

#[async_trait]
pub trait FileHandle: Send {
    fn path(&self) -> &str;

    fn mode(&self) -> OpenMode;

    /// Current logical position.
    fn tell(&self) -> u64;

    fn is_closed(&self) -> bool;

    /// Reads up to `n` bytes. Fewer bytes (or none) means end of file.
    async fn read(&mut self, n: usize) -> Result<Bytes>;

    /// Reads from the current position to end of file.
    async fn read_to_end(&mut self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        loop {
            let chunk = self.read(STREAM_READ_CHUNK).await?;
            if chunk.is_empty() {
                return Ok(out.freeze());
            }
            out.extend_from_slice(&chunk);
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Pushes any buffered bytes to the door. A no-op for read handles.
    async fn flush(&mut self) -> Result<()>;

    async fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Releases the handle, uploading whatever is still buffered.
    ///
    /// Calling it again after success does nothing. If the final upload fails
    /// the handle stays open with its buffer intact.
    async fn close(&mut self) -> Result<()>;
}

/// Chooses the handle variant for `mode` and `block_size`.
///
/// `size` is the resolved object size and is required for every read handle.
pub fn open_handle(
    door: Arc<dyn ByteDoor>,
    object: RemoteObject,
    mode: OpenMode,
    block_size: u64,
    size: Option<u64>,
) -> Result<Box<dyn FileHandle>> {
    let handle: Box<dyn FileHandle> = match (mode.access, block_size) {
        (Access::Append, _) => {
            return Err(FsError::Unsupported(format!(
                "append mode on {}",
                object.path()
            )));
        }
        (Access::Write, 0) => Box::new(StreamFile::writer(door, object).with_text(mode.text)),
        (Access::Write, block_size) => {
            Box::new(BufferedFile::writer(door, object, block_size).with_text(mode.text))
        }
        (Access::Read, block_size) => {
            let size = size.ok_or_else(|| {
                FsError::InvalidInput(format!("unknown size for {}", object.path()))
            })?;
            if block_size == 0 {
                Box::new(StreamFile::reader(door, object, size).with_text(mode.text))
            } else {
                Box::new(BufferedFile::reader(door, object, size, block_size).with_text(mode.text))
            }
        }
    };
    Ok(handle)
}

/// Resolves a seek target against the current position and object size.
pub(crate) fn seek_target(pos: SeekFrom, current: u64, size: u64) -> Result<u64> {
    let target = match pos {
        SeekFrom::Start(p) => Some(p),
        SeekFrom::Current(d) => current.checked_add_signed(d),
        SeekFrom::End(d) => size.checked_add_signed(d),
    };
    target.ok_or_else(|| FsError::InvalidInput(format!("invalid seek to {pos:?}")))
}
