//! Client-side "load next batch" loop.
//!
//! The pipeline is stateless; this is the layer that remembers where the
//! caller is. A batch only advances the cursor once it succeeded, so a failed
//! batch can be retried without losing or duplicating candidates.

use tracing::info;

use crate::error::AppError;
use crate::export::coordinator::{ExportCoordinator, ExportResult, StatusSink};
use crate::teamtailor::PageCursor;

/// Per-session pagination state.
pub struct BatchSession {
    coordinator: ExportCoordinator,
    cursor: Option<PageCursor>,
    downloaded: usize,
    total: Option<u64>,
    batches: usize,
    finished: bool,
}

impl BatchSession {
    /// Starts at the first page.
    pub fn new(coordinator: ExportCoordinator) -> Self {
        Self::resume(coordinator, None)
    }

    /// Starts after `cursor`, as if earlier batches were already downloaded.
    pub fn resume(coordinator: ExportCoordinator, cursor: Option<PageCursor>) -> Self {
        Self {
            coordinator,
            cursor,
            downloaded: 0,
            total: None,
            batches: 0,
            finished: false,
        }
    }

    /// Exports the next batch, or returns `None` once the last page was seen.
    ///
    /// # Errors
    ///
    /// Propagates the export failure. Session state is left unchanged so the
    /// same page is requested again on the next call.
    pub async fn next_batch(&mut self, sink: &dyn StatusSink) -> Result<Option<ExportResult>, AppError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.coordinator.export(self.cursor.as_ref(), sink).await?;

        self.batches += 1;
        self.downloaded += result.record_count;
        if result.total_count.is_some() {
            self.total = result.total_count;
        }
        match &result.next_cursor {
            Some(next) => self.cursor = Some(next.clone()),
            None => {
                self.cursor = None;
                self.finished = true;
            }
        }

        info!("[EXPORT] Batch {} done: {}", self.batches, self.status_line());
        Ok(Some(result))
    }

    /// Cursor the next call will send.
    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Progress message, e.g. "Downloaded 30 candidates out of 95."
    pub fn status_line(&self) -> String {
        match self.total {
            Some(total) => format!("Downloaded {} candidates out of {}.", self.downloaded, total),
            None => format!("Downloaded {} candidates.", self.downloaded),
        }
    }
}
