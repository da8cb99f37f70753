// src/watch/buffer.rs

use std::io;

use crate::watch::decoder::RawHeader;

/// Longest entry name the kernel reports (`NAME_MAX`).
pub const MAX_NAME_LEN: usize = 255;

/// Smallest buffer guaranteed to hold one complete record.
pub const MIN_BUFFER_CAPACITY: usize = RawHeader::SIZE + MAX_NAME_LEN + 1;

/// Fixed-capacity byte buffer filled by exactly one read per cycle.
///
/// `filled()` only exposes the bytes that read returned; nothing assumes
/// they form a whole number of records.
#[derive(Debug)]
pub struct RawEventBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl RawEventBuffer {
    /// Allocate a buffer of `requested` bytes, raised to
    /// [`MIN_BUFFER_CAPACITY`] if smaller.
    pub fn with_capacity(requested: usize) -> Self {
        let capacity = requested.max(MIN_BUFFER_CAPACITY);
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Replace the contents with one read.
    ///
    /// On error the buffer is left empty.
    pub fn fill_with<F>(&mut self, read: F) -> io::Result<usize>
    where
        F: FnOnce(&mut [u8]) -> io::Result<usize>,
    {
        self.len = 0;
        let n = read(&mut self.data[..])?;
        self.len = n.min(self.data.len());
        Ok(self.len)
    }

    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for RawEventBuffer {
    fn default() -> Self {
        Self::with_capacity(MIN_BUFFER_CAPACITY)
    }
}
