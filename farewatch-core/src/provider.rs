use async_trait::async_trait;

use crate::search::{SearchFilters, SearchResponse};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Flight provider request failed: {0}")]
    Transport(String),

    #[error("Flight provider returned a malformed payload: {0}")]
    Malformed(String),

    #[error("Flight provider returned {found} results for a {expected} search")]
    TripTypeMismatch { expected: String, found: String },
}

/// Source of raw flight options. Retries and timeouts are the
/// implementation's business.
#[async_trait]
pub trait FlightProvider: Send + Sync {
    /// May return an empty result list, never a missing one.
    async fn search(&self, filters: &SearchFilters) -> Result<SearchResponse, ProviderError>;
}
