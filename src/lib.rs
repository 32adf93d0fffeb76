pub mod config;
pub mod error;
pub mod export;
pub mod observability;
pub mod output;
pub mod server;
pub mod teamtailor;

pub use config::ExportConfig;
pub use error::AppError;
pub use export::{BatchSession, ExportCoordinator, ExportResult};
pub use server::{build_app, AppState};
