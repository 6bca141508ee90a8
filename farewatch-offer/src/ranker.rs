use std::num::NonZeroUsize;

use farewatch_core::search::Priced;
use farewatch_core::{CoreError, CoreResult};
use tracing::debug;

/// Orders provider results by what the traveller pays and keeps the cheapest
/// `limit` of them.
#[derive(Debug, Clone, Copy)]
pub struct ResultRanker {
    limit: NonZeroUsize,
}

impl ResultRanker {
    pub fn new(limit: usize) -> CoreResult<Self> {
        let limit = NonZeroUsize::new(limit)
            .ok_or_else(|| CoreError::ValidationError("result limit must be at least 1".to_string()))?;
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Ascending total price. `sort_by` is stable, so equal prices keep the
    /// provider's order.
    pub fn rank<T: Priced>(&self, mut results: Vec<T>) -> Vec<T> {
        let received = results.len();
        results.sort_by(|a, b| a.total_price().total_cmp(&b.total_price()));
        results.truncate(self.limit.get());
        debug!("Ranked {} results, kept {}", received, results.len());
        results
    }
}
