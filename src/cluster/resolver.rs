//! Worklist resolution of a zone graph
//!
//! Starting from a root cluster, the resolver parses each zone it reaches,
//! turns the link fields into [`Link`]s and queues their targets. Every zone
//! is parsed at most once, so shared zones and cycles need no special care:
//! the second reference finds the zone already queued or parsed.
//!
//! A zone that cannot be read, or whose fields do not match the schema, is
//! marked [`ZoneState::ParsedWithErrors`] and its links are not followed.
//! The walk goes on with the other queued zones.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use log::{debug, warn};

use super::field::{ClusterSchema, ClusterZone, FieldKind};
use super::link::{Link, ZoneLayout};
use super::zone::ZoneTable;
use crate::common::error::{Error, Result};
use crate::common::stream::InputStream;

/// Resolution state of a zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneState {
    Unvisited,
    Queued,
    Parsed,
    ParsedWithErrors,
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Stop after parsing this many zones
    pub max_zones_visited: Option<usize>,
    /// A field that does not match the schema marks its zone as erroneous;
    /// otherwise the field is only reported and left out
    pub strict_tags: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_zones_visited: None,
            strict_tags: true,
        }
    }
}

impl ResolverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_zones_visited(mut self, max: Option<usize>) -> Self {
        self.max_zones_visited = max;
        self
    }

    pub fn with_strict_tags(mut self, strict: bool) -> Self {
        self.strict_tags = strict;
        self
    }
}

/// A recovered problem in one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDiagnostic {
    pub zone: u32,
    pub message: String,
}

/// Outcome of the resolution so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub zones_parsed: usize,
    pub zones_with_errors: usize,
    /// The zone cap was reached with zones still queued
    pub stopped_early: bool,
    pub diagnostics: Vec<ZoneDiagnostic>,
}

/// What a parsed zone holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneContent<'a> {
    /// A cluster and the links of its fields
    Cluster {
        cluster: ClusterZone<'a>,
        links: Vec<Link>,
    },
    IdList(Vec<u32>),
    Records { field_size: usize, count: usize },
    Raw,
}

struct Slot<'a> {
    layout: Option<ZoneLayout>,
    content: Option<ZoneContent<'a>>,
    parse_count: u32,
}

/// Worklist resolver over a [`ZoneTable`].
pub struct Resolver<'t, 'a, S: ClusterSchema> {
    table: &'t ZoneTable<'a>,
    schema: S,
    options: ResolverOptions,
    slots: Vec<Slot<'a>>,
    queued: FixedBitSet,
    parsed: FixedBitSet,
    errors: FixedBitSet,
    worklist: VecDeque<usize>,
    report: ResolveReport,
}

impl<'t, 'a, S: ClusterSchema> Resolver<'t, 'a, S> {
    pub fn new(table: &'t ZoneTable<'a>, schema: S, options: ResolverOptions) -> Self {
        let len = table.len();
        Self {
            table,
            schema,
            options,
            slots: (0..len)
                .map(|_| Slot {
                    layout: None,
                    content: None,
                    parse_count: 0,
                })
                .collect(),
            queued: FixedBitSet::with_capacity(len),
            parsed: FixedBitSet::with_capacity(len),
            errors: FixedBitSet::with_capacity(len),
            worklist: VecDeque::new(),
            report: ResolveReport::default(),
        }
    }

    /// Resolve everything reachable from the cluster `root`.
    ///
    /// Only an unknown root is an error. Calling this again with another
    /// root continues the same walk: zones already parsed are not parsed
    /// again.
    pub fn resolve(&mut self, root: u32) -> Result<&ResolveReport> {
        let Some(position) = self.table.position(root) else {
            return Err(Error::ParseError(format!("root zone {} is not in the index", root)));
        };
        self.enqueue(position, ZoneLayout::Cluster, root);

        while let Some(position) = self.worklist.pop_front() {
            if let Some(max) = self.options.max_zones_visited
                && self.report.zones_parsed >= max
            {
                warn!("cluster: stopping after {} zones", max);
                self.worklist.push_front(position);
                self.report.stopped_early = true;
                break;
            }
            self.visit(position);
        }
        Ok(&self.report)
    }

    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    pub fn into_report(self) -> ResolveReport {
        self.report
    }

    fn id_at(&self, position: usize) -> u32 {
        self.table.entry(position).map_or(0, |e| e.id)
    }

    fn diagnose(&mut self, zone: u32, message: String) {
        debug!("cluster: zone {}: {}", zone, message);
        self.report.diagnostics.push(ZoneDiagnostic { zone, message });
    }

    /// Queue `position` to be read as `layout`; `from` is the referencing
    /// zone. The first layout a zone is queued with is the one it keeps.
    fn enqueue(&mut self, position: usize, layout: ZoneLayout, from: u32) {
        if self.queued.contains(position) {
            let first = self.slots[position].layout;
            if first != Some(layout) {
                let id = self.id_at(position);
                self.diagnose(
                    from,
                    format!("zone {} already read as {:?}, not as {:?}", id, first, layout),
                );
            }
            return;
        }
        self.queued.insert(position);
        self.slots[position].layout = Some(layout);
        self.worklist.push_back(position);
    }

    fn enqueue_id(&mut self, id: u32, layout: ZoneLayout, from: u32) {
        match self.table.position(id) {
            Some(position) => self.enqueue(position, layout, from),
            None => self.diagnose(from, format!("link to zone {} which is not in the index", id)),
        }
    }

    fn visit(&mut self, position: usize) {
        let id = self.id_at(position);
        let layout = self.slots[position].layout.unwrap_or(ZoneLayout::Cluster);
        self.slots[position].parse_count += 1;
        self.parsed.insert(position);
        self.report.zones_parsed += 1;

        let Some(bytes) = self.table.bytes(position) else {
            self.fail(position, id, "zone bytes are missing".to_string());
            return;
        };
        if let Err(err) = layout.check(bytes) {
            self.fail(position, id, err.to_string());
            return;
        }

        match layout {
            ZoneLayout::Cluster => self.visit_cluster(position, id, bytes),
            ZoneLayout::IdList { .. } => {
                let mut input = InputStream::new(bytes);
                let mut ids = Vec::with_capacity(bytes.len() / 4);
                while let Ok(child) = input.read_u32() {
                    ids.push(child);
                }
                for &child in &ids {
                    self.enqueue_id(child, ZoneLayout::Cluster, id);
                }
                self.slots[position].content = Some(ZoneContent::IdList(ids));
            },
            ZoneLayout::Records { field_size, count } => {
                self.slots[position].content = Some(ZoneContent::Records { field_size, count });
            },
            ZoneLayout::Raw { .. } => self.slots[position].content = Some(ZoneContent::Raw),
        }
    }

    fn fail(&mut self, position: usize, id: u32, message: String) {
        warn!("cluster: zone {} skipped: {}", id, message);
        self.errors.insert(position);
        self.report.zones_with_errors += 1;
        self.diagnose(id, message);
    }

    fn visit_cluster(&mut self, position: usize, id: u32, bytes: &'a [u8]) {
        let cluster = match ClusterZone::parse(bytes) {
            Ok(cluster) => cluster,
            Err(err) => {
                self.fail(position, id, err.to_string());
                return;
            },
        };

        let mut links = Vec::new();
        let mut broken = None;
        for field in &cluster.fields {
            let spec = self
                .schema
                .expected(cluster.role, field.file_type)
                .filter(|spec| spec.accepts(field));
            let Some(spec) = spec else {
                let message = format!(
                    "unexpected field {} (size {}) in role {}",
                    field.type_name(),
                    field.field_size,
                    cluster.role
                );
                if self.options.strict_tags {
                    broken = Some(message);
                    break;
                }
                self.diagnose(id, message);
                continue;
            };
            if let FieldKind::Link(kind) = spec.kind {
                match Link::parse(field.payload, field.field_size, field.count, kind) {
                    Ok(link) => links.push(link),
                    Err(err) => {
                        broken = Some(format!("field {}: {}", field.type_name(), err));
                        break;
                    },
                }
            }
        }

        if let Some(message) = broken {
            self.fail(position, id, message);
            self.slots[position].content = Some(ZoneContent::Cluster {
                cluster,
                links: Vec::new(),
            });
            return;
        }
        for link in &links {
            let layout = link.target_layout();
            for &target in &link.targets {
                self.enqueue_id(target, layout, id);
            }
        }
        self.slots[position].content = Some(ZoneContent::Cluster { cluster, links });
    }

    pub fn state(&self, id: u32) -> ZoneState {
        match self.table.position(id) {
            Some(p) if self.errors.contains(p) => ZoneState::ParsedWithErrors,
            Some(p) if self.parsed.contains(p) => ZoneState::Parsed,
            Some(p) if self.queued.contains(p) => ZoneState::Queued,
            _ => ZoneState::Unvisited,
        }
    }

    /// How many times zone `id` was parsed (0 or 1)
    pub fn parse_count(&self, id: u32) -> u32 {
        self.table
            .position(id)
            .map_or(0, |p| self.slots[p].parse_count)
    }

    pub fn content(&self, id: u32) -> Option<&ZoneContent<'a>> {
        self.slots[self.table.position(id)?].content.as_ref()
    }

    pub fn cluster(&self, id: u32) -> Option<&ClusterZone<'a>> {
        match self.content(id)? {
            ZoneContent::Cluster { cluster, .. } => Some(cluster),
            _ => None,
        }
    }

    /// Links of a cluster; empty for other zones and for clusters with errors
    pub fn links(&self, id: u32) -> &[Link] {
        match self.content(id) {
            Some(ZoneContent::Cluster { links, .. }) => links.as_slice(),
            _ => &[],
        }
    }

    /// Zones directly referenced by `id`, in field order
    pub fn children(&self, id: u32) -> Vec<u32> {
        match self.content(id) {
            Some(ZoneContent::Cluster { links, .. }) => {
                links.iter().flat_map(|l| l.targets.iter().copied()).collect()
            },
            Some(ZoneContent::IdList(ids)) => ids.clone(),
            _ => Vec::new(),
        }
    }

    /// Record `index` of a record list zone
    pub fn record(&self, id: u32, index: usize) -> Option<&'a [u8]> {
        let ZoneContent::Records { field_size, count } = self.content(id)? else {
            return None;
        };
        if index >= *count {
            return None;
        }
        let bytes = self.table.zone_bytes(id)?;
        bytes.get(index * field_size..(index + 1) * field_size)
    }

    /// Bytes of a parsed leaf zone
    pub fn raw(&self, id: u32) -> Option<&'a [u8]> {
        match self.content(id)? {
            ZoneContent::Raw => self.table.zone_bytes(id),
            _ => None,
        }
    }
}

/// Resolve the zone graph under `root` with a fresh resolver.
pub fn resolve_zones<'t, 'a, S: ClusterSchema>(
    table: &'t ZoneTable<'a>,
    schema: S,
    root: u32,
    options: ResolverOptions,
) -> Result<Resolver<'t, 'a, S>> {
    let mut resolver = Resolver::new(table, schema, options);
    resolver.resolve(root)?;
    Ok(resolver)
}
