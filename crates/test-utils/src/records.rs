use watchcmd::types::EventMask;
use watchcmd::watch::RawHeader;

/// Builds raw notification buffers in the kernel's wire layout.
#[derive(Debug, Default, Clone)]
pub struct RecordBuilder {
    bytes: Vec<u8>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for a directly watched file: no name field.
    pub fn event(self, wd: i32, mask: EventMask) -> Self {
        self.raw(wd, mask, 0, &[])
    }

    /// Record carrying an entry name, NUL terminated and padded to a
    /// multiple of 16 bytes the way the kernel does it.
    pub fn named(self, wd: i32, mask: EventMask, name: &str) -> Self {
        let mut field = name.as_bytes().to_vec();
        field.push(0);
        while field.len() % 16 != 0 {
            field.push(0);
        }
        self.raw(wd, mask, 0, &field)
    }

    /// Record with an explicit name field; the declared length is the
    /// field's length.
    pub fn raw(self, wd: i32, mask: EventMask, cookie: u32, name_field: &[u8]) -> Self {
        self.header_only(wd, mask, cookie, name_field.len() as u32)
            .bytes(name_field)
    }

    /// Header alone, declaring `declared_len` name bytes that are not
    /// appended.
    pub fn header_only(mut self, wd: i32, mask: EventMask, cookie: u32, declared_len: u32) -> Self {
        self.bytes.extend_from_slice(&wd.to_ne_bytes());
        self.bytes.extend_from_slice(&mask.bits().to_ne_bytes());
        self.bytes.extend_from_slice(&cookie.to_ne_bytes());
        self.bytes.extend_from_slice(&declared_len.to_ne_bytes());
        self
    }

    /// Append arbitrary bytes.
    pub fn bytes(mut self, extra: &[u8]) -> Self {
        self.bytes.extend_from_slice(extra);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Size of a record with a `name_len`-byte name field.
pub fn record_size(name_len: usize) -> usize {
    RawHeader::SIZE + name_len
}
