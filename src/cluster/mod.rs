// Cluster document zone graphs
//
// Page-layout documents of this family keep their objects in zones addressed
// by small integer ids. A cluster zone is a list of typed fields, some of
// which reference other zones; following those references from a root
// cluster reaches every object of the document. The resolver walks that
// graph lazily, visiting each zone once.

pub mod field;
pub mod link;
pub mod resolver;
pub mod zone;

#[cfg(test)]
mod tests;

pub use field::{
    ClusterSchema, ClusterZone, FieldKind, FieldRecord, FieldSpec, SchemaEntry, TableSchema, fourcc,
};
pub use link::{Link, LinkKind, ZoneLayout};
pub use resolver::{
    ResolveReport, Resolver, ResolverOptions, ZoneContent, ZoneDiagnostic, ZoneState, resolve_zones,
};
pub use zone::{ZONE_INDEX_SIGNATURE, ZoneEntry, ZoneTable};
