//! Presence/absence diffing of two enumerations.
//!
//! Only existence is compared. An entity present on both sides produces no
//! entry, even if its definition differs.

use std::collections::{HashMap, HashSet};

use crate::entity::{ChangeKind, DiffEntry, EntityIdentifier, EntityKind};

/// Classifies every entity present on exactly one side.
///
/// Output order is every [`ChangeKind::ToCreate`] entry in the first side's
/// order, then every [`ChangeKind::ToDelete`] entry in the second side's
/// order. Columns are diffed table by table (tables in the first side's
/// order) and only for tables present on both sides.
#[must_use]
pub fn diff_entities(
    kind: EntityKind,
    first: &[EntityIdentifier],
    second: &[EntityIdentifier],
) -> Vec<DiffEntry> {
    if kind == EntityKind::Columns {
        return diff_columns(first, second);
    }
    let first: Vec<&EntityIdentifier> = first.iter().collect();
    let second: Vec<&EntityIdentifier> = second.iter().collect();
    classify(kind, &first, &second)
}

fn classify(
    kind: EntityKind,
    first: &[&EntityIdentifier],
    second: &[&EntityIdentifier],
) -> Vec<DiffEntry> {
    let ours: HashSet<&str> = first.iter().map(|e| e.name.as_str()).collect();
    let theirs: HashSet<&str> = second.iter().map(|e| e.name.as_str()).collect();

    let created = first
        .iter()
        .filter(|e| !theirs.contains(e.name.as_str()))
        .map(|e| DiffEntry::from_identifier(kind, e, ChangeKind::ToCreate));
    let deleted = second
        .iter()
        .filter(|e| !ours.contains(e.name.as_str()))
        .map(|e| DiffEntry::from_identifier(kind, e, ChangeKind::ToDelete));

    created.chain(deleted).collect()
}

/// Groups columns by table, keeping first-seen table order.
fn by_table(columns: &[EntityIdentifier]) -> (Vec<&str>, HashMap<&str, Vec<&EntityIdentifier>>) {
    let mut order = Vec::new();
    let mut groups: HashMap<&str, Vec<&EntityIdentifier>> = HashMap::new();
    for column in columns {
        let Some(table) = column.parent.as_deref() else {
            continue;
        };
        let group = groups.entry(table).or_default();
        if group.is_empty() {
            order.push(table);
        }
        group.push(column);
    }
    (order, groups)
}

fn diff_columns(first: &[EntityIdentifier], second: &[EntityIdentifier]) -> Vec<DiffEntry> {
    let (tables, ours) = by_table(first);
    let (_, theirs) = by_table(second);

    let mut entries = Vec::new();
    for table in tables {
        if let (Some(ours), Some(theirs)) = (ours.get(table), theirs.get(table)) {
            entries.extend(classify(EntityKind::Columns, ours, theirs));
        }
    }
    entries
}
