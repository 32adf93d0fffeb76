//! Teamtailor candidate source.
//!
//! - **Paginated reads** of the candidates endpoint with side-loaded job applications
//! - **Secure credential handling** via `secrecy::SecretString`
//! - **Safe logging** that never leaks the API key or pagination cursors
//! - **Optional TTL cache** as a decorator around any source

use std::future::Future;
use std::pin::Pin;

use crate::error::AppError;

pub mod cache;
pub mod client;
pub mod document;

pub use cache::CachedSource;
pub use client::{LoggingMode, TeamtailorClient, PAGE_SIZE};
pub use document::{NormalizedDocument, PageCursor, PageLinks, PrimaryRecord, RelatedRecord, RelationshipRef};

/// Future returned by [`CandidateSource::fetch`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<NormalizedDocument, AppError>> + Send + 'a>>;

/// A provider of candidate pages.
///
/// Decouples the export pipeline from the HTTP client so the cache decorator
/// and tests can stand in for the real upstream.
pub trait CandidateSource: Send + Sync {
    /// Fetches the page after `cursor`, or the first page when `None`.
    fn fetch<'a>(&'a self, cursor: Option<&'a PageCursor>) -> SourceFuture<'a>;
}

impl<S: CandidateSource + ?Sized> CandidateSource for std::sync::Arc<S> {
    fn fetch<'a>(&'a self, cursor: Option<&'a PageCursor>) -> SourceFuture<'a> {
        (**self).fetch(cursor)
    }
}
