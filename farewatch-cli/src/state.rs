use std::path::PathBuf;
use std::sync::Arc;

use farewatch_core::{AirportDirectory, FlightProvider, TrackedRouteRepository};
use farewatch_offer::PriceTracker;
use farewatch_store::app_config::Config;
use farewatch_store::{HttpFlightProvider, JsonTrackedRouteStore};

use crate::error::AppError;

pub struct AppState {
    pub tracker: PriceTracker,
    pub ledger: Arc<dyn TrackedRouteRepository>,
    pub directory: AirportDirectory,
    pub default_results: usize,
    pub passengers: u32,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn FlightProvider>,
        ledger: Arc<dyn TrackedRouteRepository>,
        directory: AirportDirectory,
        default_results: usize,
        passengers: u32,
    ) -> Self {
        Self {
            tracker: PriceTracker::new(provider, ledger.clone()).with_passengers(passengers),
            ledger,
            directory,
            default_results,
            passengers,
        }
    }

    /// Wires the HTTP provider and the JSON ledger. `ledger_override` wins
    /// over `store.ledger_path`.
    pub fn from_config(config: &Config, ledger_override: Option<PathBuf>) -> Result<Self, AppError> {
        let ledger_path = ledger_override.unwrap_or_else(|| config.store.ledger_path.clone());
        tracing::debug!("Using ledger {}", ledger_path.display());

        let provider = HttpFlightProvider::new(&config.provider).map_err(anyhow::Error::from)?;

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(JsonTrackedRouteStore::new(ledger_path)),
            AirportDirectory::with_extra(&config.locations.extra_airports),
            config.search.default_results,
            config.search.passengers,
        ))
    }
}
