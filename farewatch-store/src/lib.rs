pub mod app_config;
pub mod tracked_repo;
pub mod flight_provider;

pub use tracked_repo::JsonTrackedRouteStore;
pub use flight_provider::HttpFlightProvider;
