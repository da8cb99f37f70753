// src/watch/decoder.rs

//! Decoding of raw notification buffers.
//!
//! A buffer returned by one read holds zero or more records back to back:
//!
//! ```text
//! +--------+--------+--------+--------+------------------------+
//! | wd i32 | mask   | cookie | len    | name: `len` bytes,     |
//! |        | u32    | u32    | u32    | NUL padded (optional)  |
//! +--------+--------+--------+--------+------------------------+
//! ```
//!
//! Fields are in native byte order. Each record is `HEADER_SIZE + len`
//! bytes; the declared `len` is authoritative, the padding may hold several
//! NULs. Everything here is a pure function of the input bytes and uses
//! bounds-checked slicing only.

use crate::errors::WatchcmdError;
use crate::types::{EventKind, EventMask, EventRecord, WatchId};
use crate::watch::registry::WatchRegistry;

/// Fixed-size header at the start of every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHeader {
    pub wd: i32,
    pub mask: u32,
    pub cookie: u32,
    pub len: u32,
}

impl RawHeader {
    pub const SIZE: usize = 16;

    /// Parse a header from the first [`Self::SIZE`] bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let b = bytes.get(..Self::SIZE)?;
        Some(Self {
            wd: i32::from_ne_bytes(b[0..4].try_into().ok()?),
            mask: u32::from_ne_bytes(b[4..8].try_into().ok()?),
            cookie: u32::from_ne_bytes(b[8..12].try_into().ok()?),
            len: u32::from_ne_bytes(b[12..16].try_into().ok()?),
        })
    }

    /// Total size of the record this header starts.
    pub fn record_size(&self) -> usize {
        Self::SIZE.saturating_add(self.len as usize)
    }
}

/// One wire record, still borrowing its name field from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub header: RawHeader,
    /// The full declared name field, padding included.
    pub name_field: &'a [u8],
}

impl RawRecord<'_> {
    /// Entry name with the NUL terminator and padding removed.
    pub fn name(&self) -> Option<String> {
        let end = self
            .name_field
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.name_field.len());
        if end == 0 {
            None
        } else {
            Some(String::from_utf8_lossy(&self.name_field[..end]).into_owned())
        }
    }
}

/// Where decoding of a buffer stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedRecord {
    /// Offset of the record that did not fit.
    pub offset: usize,
    /// Bytes that record needs (header only, if the header itself was cut).
    pub needed: usize,
    /// Bytes left in the buffer from `offset`.
    pub available: usize,
}

impl From<TruncatedRecord> for WatchcmdError {
    fn from(t: TruncatedRecord) -> Self {
        WatchcmdError::TruncatedRecord {
            offset: t.offset,
            needed: t.needed,
            available: t.available,
        }
    }
}

/// Result of walking a buffer without resolving ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBuffer<'a> {
    pub records: Vec<RawRecord<'a>>,
    /// Bytes covered by complete records. Equals the logical length when
    /// nothing was truncated.
    pub consumed: usize,
    pub truncated: Option<TruncatedRecord>,
}

/// Walk the first `len` bytes of `buf` record by record.
///
/// `len` larger than the slice is clamped; nothing past either bound is
/// ever read.
pub fn parse_records(buf: &[u8], len: usize) -> ParsedBuffer<'_> {
    let data = &buf[..len.min(buf.len())];
    let mut records = Vec::new();
    let mut cursor = 0usize;
    let mut truncated = None;

    while cursor < data.len() {
        let rest = &data[cursor..];

        let Some(header) = RawHeader::parse(rest) else {
            truncated = Some(TruncatedRecord {
                offset: cursor,
                needed: RawHeader::SIZE,
                available: rest.len(),
            });
            break;
        };

        let size = header.record_size();
        if size == 0 || size > rest.len() {
            truncated = Some(TruncatedRecord {
                offset: cursor,
                needed: size,
                available: rest.len(),
            });
            break;
        }

        records.push(RawRecord {
            header,
            name_field: &rest[RawHeader::SIZE..size],
        });
        cursor += size;
    }

    ParsedBuffer {
        records,
        consumed: cursor,
        truncated,
    }
}

/// Decoded events for one buffer, plus the anomalies met on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Events in buffer order.
    pub events: Vec<EventRecord>,
    pub consumed: usize,
    pub truncated: Option<TruncatedRecord>,
    /// Ids that had no registry entry. Their events carry an empty path.
    pub unresolved: Vec<WatchId>,
}

/// Decode the first `len` bytes of `buf` into events, resolving each watch
/// id through `registry`.
pub fn decode(buf: &[u8], len: usize, registry: &WatchRegistry) -> DecodeOutcome {
    let parsed = parse_records(buf, len);
    let mut outcome = DecodeOutcome {
        events: Vec::with_capacity(parsed.records.len()),
        consumed: parsed.consumed,
        truncated: parsed.truncated,
        unresolved: Vec::new(),
    };

    for record in &parsed.records {
        let watch_id = WatchId::new(record.header.wd);
        let mask = EventMask::from_bits_retain(record.header.mask);

        let path = match registry.resolve(watch_id) {
            Some(p) => p.to_path_buf(),
            None => {
                outcome.unresolved.push(watch_id);
                Default::default()
            }
        };

        outcome.events.push(EventRecord {
            watch_id,
            kind: EventKind::from_mask(mask),
            mask,
            cookie: record.header.cookie,
            path,
            name: record.name(),
        });
    }

    outcome
}
