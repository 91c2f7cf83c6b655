//! macpict - decoders for legacy Macintosh drawing documents
//!
//! This library reads Mac OS Classic drawing data and replays it as drawing
//! and text events against an abstract document interface.
//!
//! # Features
//!
//! - **PICT decoder**: QuickDraw pictures, version 1 and 2, including
//!   packed bitmaps and pixmaps, regions, polygons, arcs, text and embedded
//!   QuickTime images
//! - **Cluster resolver**: worklist traversal of zone graphs used by
//!   cluster-based page layout documents
//! - **Best-effort recovery**: a damaged opcode or zone is skipped and
//!   reported, everything decoded before it is kept
//!
//! # Example - Decoding a PICT file
//!
//! ```no_run
//! use macpict::images::pict::{decode_pict, PictOptions};
//! use macpict::listener::RecordingListener;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("drawing.pict")?;
//! let mut listener = RecordingListener::new();
//! let summary = decode_pict(&data, &mut listener, PictOptions::default())?;
//!
//! for (shape, style) in listener.shapes() {
//!     println!("{:?} drawn with {:?}", shape, style);
//! }
//! for diagnostic in &summary.diagnostics {
//!     eprintln!("offset {}: {}", diagnostic.offset, diagnostic.message);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Resolving a zone graph
//!
//! ```no_run
//! use macpict::cluster::{
//!     resolve_zones, FieldSpec, LinkKind, ResolverOptions, SchemaEntry, TableSchema, ZoneTable,
//! };
//!
//! static SCHEMA: [SchemaEntry; 1] =
//!     [SchemaEntry::new(1, b"KIDS", FieldSpec::link(LinkKind::ListOfIds))];
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index = std::fs::read("document.idx")?;
//! let data = std::fs::read("document.dat")?;
//! let table = ZoneTable::parse(&index, &data)?;
//! let resolver = resolve_zones(&table, TableSchema::new(&SCHEMA), 1, ResolverOptions::default())?;
//! println!("{} zones parsed", resolver.report().zones_parsed);
//! # Ok(())
//! # }
//! ```

/// Common types shared by the decoders
pub mod common;

/// Document construction interface the decoders feed
pub mod listener;

/// Picture formats
pub mod images;

/// Zone graphs of cluster-based documents
pub mod cluster;

pub use common::{Error, Result};
