//! Flattens a normalized document into one row per (candidate, application).

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::teamtailor::{NormalizedDocument, PrimaryRecord, RelatedRecord};

/// Fixed CSV column order.
pub const CSV_HEADER: [&str; 6] = [
    "primary_id",
    "first_name",
    "last_name",
    "email",
    "related_id",
    "related_created_at",
];

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRow {
    pub primary_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub related_id: Option<String>,
    pub related_created_at: Option<String>,
}

impl FlatRow {
    /// Fields in `CSV_HEADER` order; absent related fields become empty.
    pub fn as_record(&self) -> [&str; 6] {
        [
            self.primary_id.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.related_id.as_deref().unwrap_or(""),
            self.related_created_at.as_deref().unwrap_or(""),
        ]
    }
}

/// Projects every candidate into flat rows.
///
/// Total: never fails. Candidates without references produce a single row
/// with empty related fields. Each reference that resolves against
/// `included` by exact `{id, type}` produces one row, in reference order,
/// duplicates included. Unresolved references are logged and skipped.
pub fn project(doc: &NormalizedDocument) -> Vec<FlatRow> {
    let index = index_included(&doc.included);
    let mut rows = Vec::with_capacity(doc.primary.len());

    for candidate in &doc.primary {
        project_candidate(candidate, &index, &mut rows);
    }

    rows
}

/// First occurrence wins when `included` repeats a key.
fn index_included(included: &[RelatedRecord]) -> HashMap<(&str, &str), &RelatedRecord> {
    let mut index = HashMap::with_capacity(included.len());
    for record in included {
        index
            .entry((record.id.as_str(), record.kind.as_str()))
            .or_insert(record);
    }
    index
}

fn project_candidate(
    candidate: &PrimaryRecord,
    index: &HashMap<(&str, &str), &RelatedRecord>,
    rows: &mut Vec<FlatRow>,
) {
    let base = FlatRow {
        primary_id: candidate.id.clone(),
        first_name: attribute_text(&candidate.attributes, "first-name"),
        last_name: attribute_text(&candidate.attributes, "last-name"),
        email: attribute_text(&candidate.attributes, "email"),
        related_id: None,
        related_created_at: None,
    };

    if candidate.relationships.is_empty() {
        rows.push(base);
        return;
    }

    for reference in &candidate.relationships {
        match index.get(&(reference.id.as_str(), reference.kind.as_str())) {
            Some(related) => rows.push(FlatRow {
                related_id: Some(related.id.clone()),
                related_created_at: Some(attribute_text(&related.attributes, "created-at")),
                ..base.clone()
            }),
            None => warn!(
                "[EXPORT] Candidate {} references {} {} which is not in included; skipping",
                candidate.id, reference.kind, reference.id
            ),
        }
    }
}

/// Attribute as text. Strings pass through verbatim, missing or null become
/// empty, other scalars use their JSON rendering.
fn attribute_text(attributes: &Map<String, Value>, key: &str) -> String {
    match attributes.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
