//! Export pipeline: candidate page → flat rows → CSV text.

pub mod coordinator;
pub mod csv_output;
pub mod projector;
pub mod session;

pub use coordinator::{ExportCoordinator, ExportResult, ExportStatus, NoopSink, StatusSink};
pub use csv_output::write_csv;
pub use projector::{project, FlatRow, CSV_HEADER};
pub use session::BatchSession;
