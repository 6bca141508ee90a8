pub mod search;
pub mod iata;
pub mod tracking;
pub mod repository;
pub mod provider;

pub use search::{
    CabinClass, FlightOption, Leg, MaxStops, Priced, RoundTripOption, SearchFilters,
    SearchResponse, SearchResult, TripType,
};
pub use iata::{AirportCode, AirportDirectory};
pub use tracking::{BestFare, PriceSnapshot, RouteId, TrackedRoute};
pub use repository::{LedgerError, LedgerResult, TrackedRouteRepository};
pub use provider::{FlightProvider, ProviderError};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Unknown airport code: {0}")]
    UnknownLocation(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
