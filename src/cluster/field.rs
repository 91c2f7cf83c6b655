//! Cluster zones and their field records
//!
//! A cluster zone starts with its role and a field count, followed by the
//! fields. Each field is tagged with a four-character file type and an
//! element size, which a [`ClusterSchema`] checks against what the role
//! expects.

use crate::common::error::{Error, Result};
use crate::common::stream::InputStream;

use super::link::LinkKind;

/// Size of a field header: file type, field size, count, payload length.
const FIELD_HEADER_SIZE: usize = 14;

/// Four-character code as a big-endian `u32`
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// One field of a cluster zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRecord<'a> {
    pub file_type: u32,
    pub field_size: u16,
    pub count: u32,
    pub payload: &'a [u8],
}

impl FieldRecord<'_> {
    /// The file type as text, for messages
    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.file_type.to_be_bytes()).into_owned()
    }
}

/// A parsed cluster zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterZone<'a> {
    pub role: u16,
    pub fields: Vec<FieldRecord<'a>>,
}

impl<'a> ClusterZone<'a> {
    /// Parse the fields of a cluster zone.
    ///
    /// A field whose payload runs past the zone makes the whole zone
    /// unreadable: the offsets of the following fields cannot be trusted.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let mut input = InputStream::new(bytes);
        let role = input.read_u16()?;
        let field_count = input.read_u16()? as usize;
        if !input.check_position(input.tell() + field_count * FIELD_HEADER_SIZE) {
            return Err(Error::CorruptedFile(format!(
                "{} fields do not fit {} bytes",
                field_count,
                bytes.len()
            )));
        }

        let mut fields = Vec::with_capacity(field_count);
        for index in 0..field_count {
            let file_type = input.read_u32()?;
            let field_size = input.read_u16()?;
            let count = input.read_u32()?;
            let payload_len = input.read_u32()? as usize;
            if !input.check_position(input.tell().saturating_add(payload_len)) {
                return Err(Error::CorruptedFile(format!(
                    "field {} declares {} bytes, {} left",
                    index,
                    payload_len,
                    input.remaining()
                )));
            }
            let payload = input.read_block(payload_len)?;
            fields.push(FieldRecord {
                file_type,
                field_size,
                count,
                payload,
            });
        }
        Ok(Self { role, fields })
    }
}

/// What a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Leaf data, kept as bytes
    Data,
    /// Zone references
    Link(LinkKind),
}

/// Expected shape of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Required element size, any size when `None`
    pub field_size: Option<u16>,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn data() -> Self {
        Self {
            field_size: None,
            kind: FieldKind::Data,
        }
    }

    pub const fn link(kind: LinkKind) -> Self {
        Self {
            field_size: None,
            kind: FieldKind::Link(kind),
        }
    }

    pub const fn with_field_size(mut self, size: u16) -> Self {
        self.field_size = Some(size);
        self
    }

    /// Does `field` have the expected element size?
    pub fn accepts(&self, field: &FieldRecord<'_>) -> bool {
        self.field_size.is_none_or(|size| size == field.field_size)
    }
}

/// Expected field types per cluster role.
pub trait ClusterSchema {
    /// Expected shape of a `file_type` field in a cluster of `role`, `None` when
    /// such a field is not expected.
    fn expected(&self, role: u16, file_type: u32) -> Option<FieldSpec>;
}

impl<T: ClusterSchema + ?Sized> ClusterSchema for &T {
    fn expected(&self, role: u16, file_type: u32) -> Option<FieldSpec> {
        (**self).expected(role, file_type)
    }
}

/// A schema row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaEntry {
    pub role: u16,
    pub file_type: u32,
    pub spec: FieldSpec,
}

impl SchemaEntry {
    pub const fn new(role: u16, file_type: &[u8; 4], spec: FieldSpec) -> Self {
        Self {
            role,
            file_type: fourcc(file_type),
            spec,
        }
    }
}

/// A schema backed by a table, usually a `static` one.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema<'s> {
    entries: &'s [SchemaEntry],
}

impl<'s> TableSchema<'s> {
    pub const fn new(entries: &'s [SchemaEntry]) -> Self {
        Self { entries }
    }
}

impl ClusterSchema for TableSchema<'_> {
    fn expected(&self, role: u16, file_type: u32) -> Option<FieldSpec> {
        self.entries
            .iter()
            .find(|e| e.role == role && e.file_type == file_type)
            .map(|e| e.spec)
    }
}
