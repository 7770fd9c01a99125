/// Remote advisor abstraction
///
/// A provider turns a user query plus the catalog into raw model text. Parsing and
/// fallback live elsewhere, so providers stay thin and easy to swap or mock.
use crate::{error::AppResult, models::Catalog};

pub mod gemini;

pub use gemini::GeminiProvider;

/// Raw output of one remote call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteCompletion {
    /// First text part of the first candidate; `None` when the envelope carries none
    pub text: Option<String>,
    /// Model identity reported by the service, if any
    pub model: Option<String>,
}

/// Trait for remote recommendation providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AdvisorProvider: Send + Sync {
    /// Requests a ranked shortlist for `query` over `catalog`
    ///
    /// Sends exactly one request. Implementations must fail with
    /// `AppError::Configuration` before any network I/O when no credential is
    /// available, and with `AppError::RemoteService` on a non-success status.
    async fn request_recommendations(
        &self,
        query: &str,
        catalog: &Catalog,
    ) -> AppResult<RemoteCompletion>;

    /// Label used when the service does not report its model
    fn model_label(&self) -> String;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
