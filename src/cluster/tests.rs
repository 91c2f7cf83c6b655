//! Tests for the zone graph resolver

use proptest::prelude::*;

use super::*;

const PAGE: u16 = 1;
const SHAPE: u16 = 2;

static SCHEMA: [SchemaEntry; 7] = [
    SchemaEntry::new(PAGE, b"NAME", FieldSpec::data()),
    SchemaEntry::new(PAGE, b"KIDS", FieldSpec::link(LinkKind::SingleRef)),
    SchemaEntry::new(PAGE, b"LIST", FieldSpec::link(LinkKind::ListOfIds).with_field_size(4)),
    SchemaEntry::new(PAGE, b"RECS", FieldSpec::link(LinkKind::ListOfRecords)),
    SchemaEntry::new(PAGE, b"RAWD", FieldSpec::link(LinkKind::RawFixedSize)),
    SchemaEntry::new(SHAPE, b"NAME", FieldSpec::data()),
    SchemaEntry::new(SHAPE, b"BACK", FieldSpec::link(LinkKind::SingleRef)),
];

fn schema() -> TableSchema<'static> {
    TableSchema::new(&SCHEMA)
}

fn ids(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn field(file_type: &[u8; 4], field_size: u16, count: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = file_type.to_vec();
    out.extend(field_size.to_be_bytes());
    out.extend(count.to_be_bytes());
    out.extend((payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

fn cluster(role: u16, fields: &[Vec<u8>]) -> Vec<u8> {
    let mut out = role.to_be_bytes().to_vec();
    out.extend((fields.len() as u16).to_be_bytes());
    for f in fields {
        out.extend(f);
    }
    out
}

fn kids(target: u32) -> Vec<u8> {
    field(b"KIDS", 0, 0, &ids(&[target]))
}

fn back(target: u32) -> Vec<u8> {
    field(b"BACK", 0, 0, &ids(&[target]))
}

fn name(text: &str) -> Vec<u8> {
    field(b"NAME", 1, text.len() as u32, text.as_bytes())
}

/// Lays zones out one after the other in a data buffer.
#[derive(Default)]
struct DocumentBuilder {
    data: Vec<u8>,
    entries: Vec<ZoneEntry>,
}

impl DocumentBuilder {
    fn zone(mut self, id: u32, bytes: Vec<u8>) -> Self {
        self.entries.push(ZoneEntry::new(id, self.data.len(), bytes.len()));
        self.data.extend(bytes);
        self
    }

    fn index(&self) -> Vec<u8> {
        let mut out = ZONE_INDEX_SIGNATURE.to_vec();
        out.extend(1u16.to_be_bytes());
        out.extend((self.entries.len() as u32).to_be_bytes());
        for e in &self.entries {
            out.extend(e.id.to_be_bytes());
            out.extend((e.offset as u32).to_be_bytes());
            out.extend((e.length as u32).to_be_bytes());
        }
        out
    }
}

fn table(doc: &DocumentBuilder) -> ZoneTable<'_> {
    ZoneTable::from_entries(&doc.data, &doc.entries).unwrap()
}

#[test]
fn test_cycle_is_parsed_once() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[name("page"), kids(2)]))
        .zone(2, cluster(SHAPE, &[back(1)]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.parse_count(1), 1);
    assert_eq!(resolver.parse_count(2), 1);
    assert_eq!(resolver.state(1), ZoneState::Parsed);
    assert_eq!(resolver.state(2), ZoneState::Parsed);
    assert_eq!(resolver.children(1), vec![2]);
    assert_eq!(resolver.children(2), vec![1]);
    let report = resolver.report();
    assert_eq!(report.zones_parsed, 2);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn test_shared_zone_is_parsed_once() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"LIST", 4, 2, &ids(&[10])), kids(3)]))
        .zone(10, ids(&[2, 3]))
        .zone(2, cluster(SHAPE, &[back(3)]))
        .zone(3, cluster(SHAPE, &[name("shared")]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.parse_count(3), 1);
    assert_eq!(resolver.content(10), Some(&ZoneContent::IdList(vec![2, 3])));
    assert_eq!(resolver.children(10), vec![2, 3]);
    assert_eq!(resolver.cluster(3).map(|c| c.fields[0].payload), Some(&b"shared"[..]));
    assert_eq!(resolver.report().zones_parsed, 4);
}

#[test]
fn test_tag_mismatch_stops_link_extraction() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"ZZZZ", 1, 0, &[]), kids(2)]))
        .zone(2, cluster(SHAPE, &[]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.state(1), ZoneState::ParsedWithErrors);
    assert_eq!(resolver.state(2), ZoneState::Unvisited);
    assert!(resolver.links(1).is_empty());
    assert_eq!(resolver.cluster(1).map(|c| c.fields.len()), Some(2));
    assert_eq!(resolver.report().zones_with_errors, 1);
}

#[test]
fn test_tag_mismatch_when_not_strict() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"ZZZZ", 1, 0, &[]), kids(2)]))
        .zone(2, cluster(SHAPE, &[]));
    let table = table(&doc);
    let options = ResolverOptions::new().with_strict_tags(false);
    let resolver = resolve_zones(&table, schema(), 1, options).unwrap();

    assert_eq!(resolver.state(1), ZoneState::Parsed);
    assert_eq!(resolver.state(2), ZoneState::Parsed);
    let report = resolver.report();
    assert_eq!(report.zones_with_errors, 0);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.diagnostics[0].zone, 1);
}

#[test]
fn test_wrong_field_size_is_a_mismatch() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"LIST", 2, 0, &ids(&[2]))]))
        .zone(2, ids(&[]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();
    assert_eq!(resolver.state(1), ZoneState::ParsedWithErrors);
    assert_eq!(resolver.state(2), ZoneState::Unvisited);
}

#[test]
fn test_oversized_zone_does_not_stop_the_walk() {
    let mut broken = cluster(SHAPE, &[name("abcdef")]);
    broken.truncate(broken.len() - 2);
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"LIST", 4, 0, &ids(&[10]))]))
        .zone(10, ids(&[2, 3]))
        .zone(2, broken)
        .zone(3, cluster(SHAPE, &[back(1)]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.state(2), ZoneState::ParsedWithErrors);
    assert_eq!(resolver.content(2), None);
    assert_eq!(resolver.state(3), ZoneState::Parsed);
    assert_eq!(resolver.report().zones_with_errors, 1);
    assert_eq!(resolver.report().zones_parsed, 4);
}

#[test]
fn test_id_list_with_wrong_count() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"LIST", 4, 3, &ids(&[10]))]))
        .zone(10, ids(&[2, 3]))
        .zone(2, cluster(SHAPE, &[]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();
    assert_eq!(resolver.state(10), ZoneState::ParsedWithErrors);
    assert_eq!(resolver.state(2), ZoneState::Unvisited);
}

#[test]
fn test_list_of_records() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"RECS", 3, 2, &ids(&[20]))]))
        .zone(20, b"abcdefg".to_vec());
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.state(20), ZoneState::Parsed);
    assert_eq!(resolver.record(20, 0), Some(&b"abc"[..]));
    assert_eq!(resolver.record(20, 1), Some(&b"def"[..]));
    assert_eq!(resolver.record(20, 2), None);
    assert_eq!(resolver.record(1, 0), None);
    let link = &resolver.links(1)[0];
    assert_eq!(link.kind, LinkKind::ListOfRecords);
    assert_eq!(link.target_layout(), ZoneLayout::Records { field_size: 3, count: 2 });
}

#[test]
fn test_raw_fixed_size() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[field(b"RAWD", 4, 3, &ids(&[20, 21]))]))
        .zone(20, vec![7; 12])
        .zone(21, vec![7; 11]);
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert_eq!(resolver.state(20), ZoneState::Parsed);
    assert_eq!(resolver.raw(20).map(<[u8]>::len), Some(12));
    assert_eq!(resolver.state(21), ZoneState::ParsedWithErrors);
    assert_eq!(resolver.raw(21), None);
}

#[test]
fn test_first_layout_wins() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[kids(2), field(b"RAWD", 1, 4, &ids(&[2]))]))
        .zone(2, cluster(SHAPE, &[]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();

    assert!(resolver.cluster(2).is_some());
    assert_eq!(resolver.parse_count(2), 1);
    assert_eq!(resolver.report().diagnostics.len(), 1);
}

#[test]
fn test_link_to_missing_zone() {
    let doc = DocumentBuilder::default().zone(1, cluster(PAGE, &[kids(99)]));
    let table = table(&doc);
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();
    assert_eq!(resolver.state(1), ZoneState::Parsed);
    assert_eq!(resolver.state(99), ZoneState::Unvisited);
    assert_eq!(resolver.report().diagnostics.len(), 1);
}

#[test]
fn test_unknown_root() {
    let doc = DocumentBuilder::default().zone(1, cluster(PAGE, &[]));
    let table = table(&doc);
    assert!(resolve_zones(&table, schema(), 5, ResolverOptions::default()).is_err());
}

#[test]
fn test_zone_cap() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[kids(2)]))
        .zone(2, cluster(SHAPE, &[back(3)]))
        .zone(3, cluster(SHAPE, &[]));
    let table = table(&doc);
    let options = ResolverOptions::new().with_max_zones_visited(Some(2));
    let mut resolver = Resolver::new(&table, schema(), options);
    let report = resolver.resolve(1).unwrap();
    assert!(report.stopped_early);
    assert_eq!(report.zones_parsed, 2);
    assert_eq!(resolver.state(3), ZoneState::Queued);
}

#[test]
fn test_several_roots_share_the_walk() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[kids(3)]))
        .zone(2, cluster(PAGE, &[kids(3)]))
        .zone(3, cluster(SHAPE, &[]));
    let table = table(&doc);
    let schema = schema();
    let mut resolver = Resolver::new(&table, &schema, ResolverOptions::default());
    resolver.resolve(1).unwrap();
    resolver.resolve(2).unwrap();
    assert_eq!(resolver.parse_count(3), 1);
    assert_eq!(resolver.into_report().zones_parsed, 3);
}

#[test]
fn test_resolve_from_zone_index() {
    let doc = DocumentBuilder::default()
        .zone(1, cluster(PAGE, &[kids(2)]))
        .zone(2, cluster(SHAPE, &[back(1)]));
    let index = doc.index();
    let table = ZoneTable::parse(&index, &doc.data).unwrap();
    let resolver = resolve_zones(&table, schema(), 1, ResolverOptions::default()).unwrap();
    assert_eq!(resolver.report().zones_parsed, 2);
}

proptest! {
    #[test]
    fn prop_every_reachable_zone_is_parsed_once(
        edges in prop::collection::vec(prop::collection::vec(0u32..12, 0..4), 12)
    ) {
        // zone i is a page whose KIDS fields point at edges[i]
        let mut doc = DocumentBuilder::default();
        for (id, targets) in edges.iter().enumerate() {
            let fields: Vec<Vec<u8>> = targets.iter().map(|t| kids(*t)).collect();
            doc = doc.zone(id as u32, cluster(PAGE, &fields));
        }
        let table = table(&doc);
        let resolver = resolve_zones(&table, schema(), 0, ResolverOptions::default()).unwrap();

        let mut reachable = vec![false; edges.len()];
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut reachable[node], true) {
                continue;
            }
            stack.extend(edges[node].iter().map(|t| *t as usize));
        }
        for (id, seen) in reachable.iter().enumerate() {
            let expected = if *seen { 1 } else { 0 };
            prop_assert_eq!(resolver.parse_count(id as u32), expected);
        }
        prop_assert_eq!(resolver.report().zones_parsed, reachable.iter().filter(|r| **r).count());
    }
}
