//! Normalized (data + included) candidate document.
//!
//! The upstream response follows JSON:API: primary candidates under `data`,
//! job applications side-loaded under `included`, and pagination under
//! `links`. Normalization is lenient. Ids may arrive as numbers, relationship
//! blocks may be missing, and malformed reference entries are dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use url::Url;

use crate::error::AppError;

/// JSON:API type tag of the related records we join against.
pub const JOB_APPLICATION_TYPE: &str = "job-applications";

/// Query parameter carrying the pagination cursor in upstream links.
pub const PAGE_AFTER_PARAM: &str = "page[after]";

// ─────────────────────────────────────────────────────────────────────────────
// PageCursor
// ─────────────────────────────────────────────────────────────────────────────

/// Opaque pagination token owned by the upstream API.
///
/// Never interpreted; only extracted from a `next` link and reinserted as the
/// `page[after]` parameter of the following request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the cursor from a link previously returned as `links.next`.
    ///
    /// An absolute URL carrying `page[after]` yields that parameter's value.
    /// Any other non-empty string is taken verbatim. Blank input yields `None`.
    pub fn from_link(link: &str) -> Option<Self> {
        if link.trim().is_empty() {
            return None;
        }

        if let Ok(url) = Url::parse(link.trim()) {
            if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == PAGE_AFTER_PARAM) {
                return Some(Self(value.into_owned()));
            }
        }

        Some(Self(link.to_string()))
    }
}

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalized Types
// ─────────────────────────────────────────────────────────────────────────────

/// `{id, type}` pair linking a candidate to a related record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipRef {
    pub id: String,
    pub kind: String,
}

/// A candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryRecord {
    pub id: String,
    pub attributes: Map<String, Value>,
    /// Job-application references in upstream order.
    pub relationships: Vec<RelationshipRef>,
}

/// A side-loaded record from `included`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedRecord {
    pub id: String,
    pub kind: String,
    pub attributes: Map<String, Value>,
}

/// Pagination links of one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<String>,
    pub prev: Option<String>,
}

/// One fetched page, request-scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDocument {
    pub primary: Vec<PrimaryRecord>,
    pub included: Vec<RelatedRecord>,
    pub page_links: PageLinks,
    /// `meta["record-count"]`: total candidates across all pages.
    pub total_count: Option<u64>,
    /// Raw `meta` object, passed through to the caller.
    pub meta: Map<String, Value>,
    /// Raw `links` object, passed through to the caller.
    pub links: Map<String, Value>,
}

impl NormalizedDocument {
    /// Parses an upstream response body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::MalformedResponse` if the body is not JSON or the
    /// top-level shape is wrong (e.g. `data` is not an array).
    pub fn from_json(body: &str) -> Result<Self, AppError> {
        let wire: WireDocument = serde_json::from_str(body)
            .map_err(|e| AppError::MalformedResponse(format!("Failed to parse candidates response: {}", e)))?;
        Ok(wire.normalize())
    }

    /// Cursor for the following page, if there is one.
    pub fn next_cursor(&self) -> Option<PageCursor> {
        self.page_links.next.as_deref().and_then(PageCursor::from_link)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Wire Types (match the JSON:API response)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireDocument {
    #[serde(default)]
    data: Vec<WireResource>,
    #[serde(default)]
    included: Vec<Value>,
    #[serde(default)]
    links: Option<Map<String, Value>>,
    #[serde(default)]
    meta: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct WireResource {
    id: Value,
    #[serde(default)]
    attributes: Option<Map<String, Value>>,
    #[serde(default)]
    relationships: Option<Map<String, Value>>,
}

impl WireDocument {
    fn normalize(self) -> NormalizedDocument {
        let links = self.links.unwrap_or_default();
        let meta = self.meta.unwrap_or_default();

        let page_links = PageLinks {
            next: link_text(links.get("next")),
            prev: link_text(links.get("prev")),
        };
        let total_count = meta.get("record-count").and_then(Value::as_u64);

        let primary = self
            .data
            .into_iter()
            .map(|resource| {
                let id = id_text(&resource.id);
                let relationships = resource
                    .relationships
                    .as_ref()
                    .map(|rels| relationship_refs(&id, rels))
                    .unwrap_or_default();
                PrimaryRecord {
                    id,
                    attributes: resource.attributes.unwrap_or_default(),
                    relationships,
                }
            })
            .collect();

        let included = self.included.iter().filter_map(related_record).collect();

        NormalizedDocument {
            primary,
            included,
            page_links,
            total_count,
            meta,
            links,
        }
    }
}

/// Renders a JSON:API id (normally a string) as text.
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Links may be plain strings or `{ "href": ... }` objects.
fn link_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(obj) => obj.get("href").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// Reads one `included` entry. Entries without an id or a string type are
/// dropped so that the rest of the page still exports.
fn related_record(entry: &Value) -> Option<RelatedRecord> {
    let id = entry.get("id").filter(|v| !v.is_null()).map(id_text);
    let kind = entry.get("type").and_then(Value::as_str);

    match (id, kind) {
        (Some(id), Some(kind)) => Some(RelatedRecord {
            id,
            kind: kind.to_string(),
            attributes: entry
                .get("attributes")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }),
        _ => {
            warn!("[TT] Skipping malformed included record: id={:?}", entry.get("id"));
            None
        }
    }
}

/// Reads `relationships["job-applications"].data`, keeping well-formed entries.
fn relationship_refs(owner_id: &str, relationships: &Map<String, Value>) -> Vec<RelationshipRef> {
    let Some(data) = relationships
        .get(JOB_APPLICATION_TYPE)
        .and_then(|rel| rel.get("data"))
    else {
        return Vec::new();
    };

    let entries: &[Value] = match data {
        Value::Array(items) => items,
        Value::Null => &[],
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => {
            warn!("[TT] Candidate {} has a non-array job-applications relationship", owner_id);
            &[]
        }
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry.get("id").filter(|v| !v.is_null()).map(id_text);
            let kind = entry.get("type").and_then(Value::as_str);
            match (id, kind) {
                (Some(id), Some(kind)) => Some(RelationshipRef {
                    id,
                    kind: kind.to_string(),
                }),
                _ => {
                    warn!("[TT] Skipping malformed relationship reference on candidate {}", owner_id);
                    None
                }
            }
        })
        .collect()
}
