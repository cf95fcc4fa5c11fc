//! The seam between the lookup core and whatever answers lookups.

use crate::options::LookupOptions;
use crate::types::LookupResult;
use async_trait::async_trait;

/// Why a lookup failed. Every variant is an ordinary transport-level failure from the
/// coordinator's point of view: it is recorded and surfaced, never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    #[error("http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("api error {code}: {message}")]
    Api { code: String, message: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

/// A paginated, sortable query endpoint.
#[async_trait]
pub trait LookupEndpoint: Send + Sync + 'static {
    type Item: Clone + Send + 'static;

    /// Fetch the page described by `options`.
    async fn lookup(
        &self,
        options: &LookupOptions,
    ) -> Result<LookupResult<Self::Item>, LookupError>;
}
