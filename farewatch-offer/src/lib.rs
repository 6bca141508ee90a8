pub mod ranker;
pub mod alerts;
pub mod tracker;

pub use ranker::ResultRanker;
pub use alerts::{AlertEvaluator, AlertState};
pub use tracker::{PriceTracker, RankedResults, RefreshOutcome, TrackError, TrackOutcome};
