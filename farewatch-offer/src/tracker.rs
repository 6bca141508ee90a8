use std::sync::Arc;

use chrono::Utc;
use farewatch_core::provider::{FlightProvider, ProviderError};
use farewatch_core::repository::{LedgerError, TrackedRouteRepository};
use farewatch_core::search::{Priced, SearchFilters, SearchResult};
use farewatch_core::tracking::{PriceSnapshot, RouteId, TrackedRoute};
use farewatch_core::CoreError;
use tracing::{debug, info, warn};

use crate::alerts::{AlertEvaluator, AlertState};
use crate::ranker::ResultRanker;

#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Provider quoted {route} in {found} but the route tracks {expected}")]
    CurrencyMismatch {
        route: RouteId,
        expected: String,
        found: String,
    },
}

/// Ranked, size-bounded provider results.
#[derive(Debug, Clone)]
pub struct RankedResults {
    pub results: Vec<SearchResult>,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub enum TrackOutcome {
    /// The identity was already in the ledger; nothing was searched or written.
    AlreadyTracked(RouteId),
    Tracked { route: TrackedRoute, alert: AlertState },
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub route: TrackedRoute,
    pub alert: AlertState,
}

/// Runs the search, track and refresh flows: one provider call, one ranking
/// pass and at most one ledger read-modify-write per operation.
pub struct PriceTracker {
    provider: Arc<dyn FlightProvider>,
    ledger: Arc<dyn TrackedRouteRepository>,
    evaluator: AlertEvaluator,
    passengers: u32,
}

impl PriceTracker {
    pub fn new(provider: Arc<dyn FlightProvider>, ledger: Arc<dyn TrackedRouteRepository>) -> Self {
        Self {
            provider,
            ledger,
            evaluator: AlertEvaluator::new(),
            passengers: 1,
        }
    }

    /// Passenger count used when re-running searches for stored routes.
    pub fn with_passengers(mut self, passengers: u32) -> Self {
        self.passengers = passengers;
        self
    }

    pub async fn search(&self, filters: &SearchFilters, limit: usize) -> Result<RankedResults, TrackError> {
        let ranker = ResultRanker::new(limit)?;
        let response = self.provider.search(filters).await?;
        Ok(RankedResults {
            results: ranker.rank(response.results),
            currency: response.currency,
        })
    }

    pub async fn track(
        &self,
        filters: &SearchFilters,
        target_price: Option<f64>,
    ) -> Result<TrackOutcome, TrackError> {
        let route_id = RouteId::for_filters(filters);
        if self.ledger.find(&route_id)?.is_some() {
            info!("Already tracking {}", route_id);
            return Ok(TrackOutcome::AlreadyTracked(route_id));
        }

        let (snapshot, currency) = self.observe(filters).await?;
        let mut route = TrackedRoute::new(filters, target_price, currency, snapshot.timestamp())?;
        let alert = self.evaluator.evaluate(&route, &snapshot);
        route
            .push_snapshot(snapshot)
            .map_err(|_| LedgerError::OutOfOrderSnapshot(route_id.clone()))?;

        if !self.ledger.add_if_absent(route.clone())? {
            return Ok(TrackOutcome::AlreadyTracked(route_id));
        }
        self.log_alert(&route_id, alert);
        Ok(TrackOutcome::Tracked { route, alert })
    }

    /// One observation for a stored route. This is what a scheduler calls.
    pub async fn refresh(&self, route_id: &RouteId) -> Result<RefreshOutcome, TrackError> {
        let stored = self
            .ledger
            .find(route_id)?
            .ok_or_else(|| LedgerError::NotFound(route_id.clone()))?;
        let filters = stored.search_filters(self.passengers)?;

        let (snapshot, currency) = self.observe(&filters).await?;
        if currency != stored.currency() {
            return Err(TrackError::CurrencyMismatch {
                route: route_id.clone(),
                expected: stored.currency().to_string(),
                found: currency,
            });
        }

        let route = self.ledger.append_snapshot(route_id, snapshot)?;
        let alert = self
            .evaluator
            .evaluate_latest(&route)
            .unwrap_or(AlertState::NoPriceFound);
        self.log_alert(route_id, alert);
        Ok(RefreshOutcome { route, alert })
    }

    /// Refreshes every tracked route. A failing route is reported in its own
    /// slot and does not stop the rest.
    pub async fn refresh_all(&self) -> Result<Vec<(RouteId, Result<RefreshOutcome, TrackError>)>, TrackError> {
        let routes = self.ledger.load()?;
        let mut outcomes = Vec::with_capacity(routes.len());

        for route in routes {
            let route_id = route.id().clone();
            let outcome = self.refresh(&route_id).await;
            if let Err(ref e) = outcome {
                warn!("Refreshing {} failed: {}", route_id, e);
            }
            outcomes.push((route_id, outcome));
        }
        Ok(outcomes)
    }

    async fn observe(&self, filters: &SearchFilters) -> Result<(PriceSnapshot, String), TrackError> {
        let ranked = self.search(filters, 1).await?;
        let now = Utc::now();

        let snapshot = match ranked.results.first() {
            Some(best) => {
                let airline = best.outbound().carrier().ok_or_else(|| {
                    CoreError::ValidationError("best option has no legs".to_string())
                })?;
                PriceSnapshot::observed(now, best.total_price(), airline)?
            }
            None => {
                debug!("No flights found for {} -> {}", filters.origin, filters.destination);
                PriceSnapshot::no_flights(now)
            }
        };
        Ok((snapshot, ranked.currency))
    }

    fn log_alert(&self, route_id: &RouteId, alert: AlertState) {
        if alert.is_triggered() {
            warn!("Price alert for {}: at or below target", route_id);
        } else {
            debug!("Alert state for {}: {:?}", route_id, alert);
        }
    }
}
