//! Zone index for cluster documents
//!
//! A cluster document stores its records in zones: byte ranges of a data
//! buffer addressed by a small integer id. The index maps each id to its
//! range. Zones are kept in an arena and referred to by position; the id is
//! only used to find that position.

use std::collections::HashMap;

use log::warn;

use crate::common::error::{Error, Result};
use crate::common::stream::InputStream;

/// Signature of a zone index.
pub const ZONE_INDEX_SIGNATURE: &[u8; 4] = b"ZIDX";

/// An entry in the zone index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneEntry {
    /// Zone identifier
    pub id: u32,
    /// Offset of the zone in the data buffer
    pub offset: usize,
    /// Length of the zone data
    pub length: usize,
}

impl ZoneEntry {
    pub fn new(id: u32, offset: usize, length: usize) -> Self {
        Self { id, offset, length }
    }

    fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// Zone arena over a data buffer.
#[derive(Debug, Clone)]
pub struct ZoneTable<'a> {
    data: &'a [u8],
    version: u16,
    entries: Vec<ZoneEntry>,
    by_id: HashMap<u32, usize>,
    /// Index entries that were dropped (outside the buffer, duplicate id)
    rejected: Vec<ZoneEntry>,
}

impl<'a> ZoneTable<'a> {
    fn empty(data: &'a [u8], version: u16) -> Self {
        Self {
            data,
            version,
            entries: Vec::new(),
            by_id: HashMap::new(),
            rejected: Vec::new(),
        }
    }

    /// Parse a big-endian zone index describing the zones of `data`.
    ///
    /// A bad signature or a truncated index is fatal. Entries pointing
    /// outside `data` and repeated ids are dropped and kept in
    /// [`rejected`](Self::rejected).
    pub fn parse(index: &[u8], data: &'a [u8]) -> Result<Self> {
        let mut input = InputStream::new(index);
        let signature = input.read_block(4)?;
        if signature != ZONE_INDEX_SIGNATURE {
            return Err(Error::InvalidFormat(format!(
                "zone index signature {:02x?}",
                signature
            )));
        }
        let version = input.read_u16()?;
        let count = input.read_u32()? as usize;
        if !input.check_position(input.tell().saturating_add(count.saturating_mul(12))) {
            return Err(Error::CorruptedFile(format!(
                "zone index announces {} entries in {} bytes",
                count,
                index.len()
            )));
        }

        let mut table = Self::empty(data, version);
        for _ in 0..count {
            let id = input.read_u32()?;
            let offset = input.read_u32()? as usize;
            let length = input.read_u32()? as usize;
            table.insert(ZoneEntry::new(id, offset, length));
        }
        Ok(table)
    }

    /// Build a table from known entries.
    ///
    /// Unlike [`parse`](Self::parse), an entry that does not fit `data` is
    /// an error here.
    pub fn from_entries(data: &'a [u8], entries: &[ZoneEntry]) -> Result<Self> {
        let mut table = Self::empty(data, 0);
        for entry in entries {
            if !table.insert(*entry) {
                return Err(Error::CorruptedFile(format!(
                    "zone {} ({} bytes at {}) does not fit the data",
                    entry.id, entry.length, entry.offset
                )));
            }
        }
        Ok(table)
    }

    fn insert(&mut self, entry: ZoneEntry) -> bool {
        let fits = entry.end().is_some_and(|end| end <= self.data.len());
        if !fits || self.by_id.contains_key(&entry.id) {
            warn!(
                "zone index: dropping zone {} ({} bytes at {})",
                entry.id, entry.length, entry.offset
            );
            self.rejected.push(entry);
            return false;
        }
        self.by_id.insert(entry.id, self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arena position of a zone id
    pub fn position(&self, id: u32) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    pub fn entry(&self, position: usize) -> Option<&ZoneEntry> {
        self.entries.get(position)
    }

    pub fn entries(&self) -> &[ZoneEntry] {
        &self.entries
    }

    pub fn rejected(&self) -> &[ZoneEntry] {
        &self.rejected
    }

    /// Bytes of the zone at `position`
    pub fn bytes(&self, position: usize) -> Option<&'a [u8]> {
        let entry = self.entries.get(position)?;
        self.data.get(entry.offset..entry.offset + entry.length)
    }

    /// Bytes of the zone `id`
    pub fn zone_bytes(&self, id: u32) -> Option<&'a [u8]> {
        self.bytes(self.position(id)?)
    }
}
