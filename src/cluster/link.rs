//! Links between zones
//!
//! A link field of a cluster names one or more zones and says how their
//! bytes are to be read. The link itself owns nothing: the targets are
//! parsed later, when the resolver reaches them.

use smallvec::SmallVec;

use crate::common::error::{Error, Result};
use crate::common::stream::InputStream;

/// How the target of a link is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// One zone, itself a cluster
    SingleRef,
    /// Zones holding a list of cluster ids
    ListOfIds,
    /// Zones holding `count` records of `field_size` bytes
    ListOfRecords,
    /// Zones of exactly `field_size * count` bytes
    RawFixedSize,
}

/// How a zone is read once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneLayout {
    Cluster,
    /// `count` zero means "as many ids as the zone holds"
    IdList { count: usize },
    Records { field_size: usize, count: usize },
    Raw { size: usize },
}

/// A link field of a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub targets: SmallVec<[u32; 4]>,
    /// Element size in the target
    pub field_size: u16,
    /// Element count in the target
    pub count: u32,
    pub kind: LinkKind,
}

impl Link {
    /// Read the target ids of a link field: big-endian `u32`s filling the
    /// whole payload.
    pub fn parse(payload: &[u8], field_size: u16, count: u32, kind: LinkKind) -> Result<Self> {
        if payload.is_empty() || payload.len() % 4 != 0 {
            return Err(Error::CorruptedFile(format!(
                "link payload of {} bytes",
                payload.len()
            )));
        }
        let mut input = InputStream::new(payload);
        let mut targets = SmallVec::new();
        while !input.is_end() {
            targets.push(input.read_u32()?);
        }
        if kind == LinkKind::SingleRef && targets.len() != 1 {
            return Err(Error::CorruptedFile(format!(
                "single reference with {} targets",
                targets.len()
            )));
        }
        Ok(Self {
            targets,
            field_size,
            count,
            kind,
        })
    }

    /// Layout the targets are read with.
    pub fn target_layout(&self) -> ZoneLayout {
        let field_size = self.field_size as usize;
        let count = self.count as usize;
        match self.kind {
            LinkKind::SingleRef => ZoneLayout::Cluster,
            LinkKind::ListOfIds => ZoneLayout::IdList { count },
            LinkKind::ListOfRecords => ZoneLayout::Records { field_size, count },
            LinkKind::RawFixedSize => ZoneLayout::Raw {
                size: field_size * count,
            },
        }
    }
}

impl ZoneLayout {
    /// Check `bytes` against the layout.
    pub fn check(&self, bytes: &[u8]) -> Result<()> {
        let len = bytes.len();
        let ok = match *self {
            ZoneLayout::Cluster => true,
            ZoneLayout::IdList { count: 0 } => len % 4 == 0,
            ZoneLayout::IdList { count } => count.checked_mul(4) == Some(len),
            ZoneLayout::Records { field_size, count } => {
                field_size > 0 && field_size.checked_mul(count).is_some_and(|n| n <= len)
            },
            ZoneLayout::Raw { size } => size == len,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::CorruptedFile(format!(
                "{} bytes do not match {:?}",
                len, self
            )))
        }
    }
}
