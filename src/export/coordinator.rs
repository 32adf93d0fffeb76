//! Request-scoped export orchestration: fetch → project → serialize.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::AppError;
use crate::export::csv_output::write_csv;
use crate::export::projector::project;
use crate::teamtailor::{CandidateSource, PageCursor};

// ─────────────────────────────────────────────────────────────────────────────
// Status Notifications
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of one export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    Generating,
    Done,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Generating => "generating",
            ExportStatus::Done => "done",
        }
    }
}

/// Caller-supplied receiver of status notifications.
pub trait StatusSink: Send + Sync {
    fn notify(&self, status: ExportStatus);
}

impl<F> StatusSink for F
where
    F: Fn(ExportStatus) + Send + Sync,
{
    fn notify(&self, status: ExportStatus) {
        self(status)
    }
}

/// Sink that discards notifications.
pub struct NoopSink;

impl StatusSink for NoopSink {
    fn notify(&self, _status: ExportStatus) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// Result
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of exporting one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    /// CSV text including the header row.
    pub csv: String,
    /// Upstream `meta`, verbatim.
    pub meta: Map<String, Value>,
    /// Upstream `links`, verbatim.
    pub links: Map<String, Value>,
    /// Candidates on this page. Not the CSV row count.
    pub record_count: usize,
    /// Cursor for the next page, `None` on the last page.
    pub next_cursor: Option<PageCursor>,
    /// `meta["record-count"]`, if upstream reported it.
    #[serde(skip)]
    pub total_count: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// ExportCoordinator
// ─────────────────────────────────────────────────────────────────────────────

/// Runs the export pipeline against a candidate source.
///
/// Holds no per-request state; concurrent `export` calls are independent and
/// are neither deduplicated nor coalesced.
#[derive(Clone)]
pub struct ExportCoordinator {
    source: Arc<dyn CandidateSource>,
}

impl ExportCoordinator {
    pub fn new(source: Arc<dyn CandidateSource>) -> Self {
        Self { source }
    }

    /// Exports the page after `cursor` (or the first page).
    ///
    /// Emits `Generating` on entry and `Done` on success. Any fetch failure
    /// aborts the export; no partial CSV is returned and nothing is retried.
    pub async fn export(
        &self,
        cursor: Option<&PageCursor>,
        sink: &dyn StatusSink,
    ) -> Result<ExportResult, AppError> {
        sink.notify(ExportStatus::Generating);
        let start = Instant::now();

        let document = self.source.fetch(cursor).await?;
        let rows = project(&document);
        let csv = write_csv(&rows)?;

        let result = ExportResult {
            csv,
            record_count: document.primary.len(),
            next_cursor: document.next_cursor(),
            total_count: document.total_count,
            meta: document.meta,
            links: document.links,
        };

        info!(
            "[EXPORT] Page exported: {} candidates, {} rows, next={} {}ms",
            result.record_count,
            rows.len(),
            result.next_cursor.is_some(),
            start.elapsed().as_millis()
        );

        sink.notify(ExportStatus::Done);
        Ok(result)
    }
}
