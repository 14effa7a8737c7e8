//! Half-open byte spans used for both range GETs and range PUTs.

use crate::error::{FsError, Result};
use std::fmt;

/// `[start, end)`; never empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if end <= start {
            return Err(FsError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range of `len` bytes beginning at `start`.
    pub fn with_len(start: u64, len: u64) -> Result<Self> {
        let end = start
            .checked_add(len)
            .ok_or(FsError::InvalidRange { start, end: u64::MAX })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, start: u64, end: u64) -> bool {
        start >= self.start && end <= self.end
    }

    /// Value for the `Range` header: the end is inclusive on the wire.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end - 1)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
