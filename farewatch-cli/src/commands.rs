use std::fmt::Write;

use farewatch_core::{AirportDirectory, RouteId, SearchFilters};
use farewatch_offer::TrackOutcome;
use tracing::info;

use crate::cli::{Command, RouteArgs};
use crate::error::AppError;
use crate::render;
use crate::state::AppState;

/// Resolves both airports before anything else runs.
pub fn build_filters(
    route: &RouteArgs,
    directory: &AirportDirectory,
    passengers: u32,
) -> Result<SearchFilters, AppError> {
    let origin = directory.resolve(&route.origin)?;
    let destination = directory.resolve(&route.destination)?;
    Ok(SearchFilters::new(
        origin,
        destination,
        route.date,
        route.return_date,
        route.cabin,
        route.stops,
        passengers,
    )?)
}

pub async fn execute(command: Command, state: &AppState) -> Result<String, AppError> {
    match command {
        Command::Search(args) => {
            let filters = build_filters(&args.route, &state.directory, state.passengers)?;
            let limit = args.results.unwrap_or(state.default_results);
            info!(
                "Searching {} -> {} on {}...",
                filters.origin, filters.destination, filters.departure_date
            );

            let ranked = state.tracker.search(&filters, limit).await?;
            Ok(render::render_results(&ranked.results, &ranked.currency, &state.directory))
        }
        Command::Track(args) => {
            let filters = build_filters(&args.route, &state.directory, state.passengers)?;
            info!(
                "Searching {} -> {} on {}...",
                filters.origin, filters.destination, filters.departure_date
            );

            match state.tracker.track(&filters, args.target_price).await? {
                TrackOutcome::AlreadyTracked(id) => Ok(format!("Already tracking {}\n", id)),
                TrackOutcome::Tracked { route, alert } => Ok(render::render_tracked(&route, alert)),
            }
        }
        Command::Refresh { route_id: Some(route_id) } => {
            let outcome = state.tracker.refresh(&RouteId::from(route_id.as_str())).await?;
            Ok(render::render_refreshed(&outcome.route, outcome.alert))
        }
        Command::Refresh { route_id: None } => {
            let outcomes = state.tracker.refresh_all().await?;
            if outcomes.is_empty() {
                return Ok("No routes tracked.\n".to_string());
            }

            let mut out = String::new();
            for (route_id, outcome) in outcomes {
                match outcome {
                    Ok(refreshed) => out.push_str(&render::render_refreshed(&refreshed.route, refreshed.alert)),
                    Err(err) => {
                        let _ = writeln!(out, "{}: refresh failed: {}", route_id, err);
                    }
                }
            }
            Ok(out)
        }
        Command::List => {
            let routes = state.ledger.load().map_err(farewatch_offer::TrackError::from)?;
            Ok(render::render_route_list(&routes))
        }
    }
}
