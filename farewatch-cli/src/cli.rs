use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use farewatch_core::{CabinClass, MaxStops};

#[derive(Debug, Parser)]
#[command(name = "farewatch", version, about = "Search flights and track route prices")]
pub struct Cli {
    /// Ledger file; overrides `store.ledger_path` from the configuration
    #[arg(long, global = true, env = "FAREWATCH_LEDGER")]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search a route and print the cheapest options
    Search(SearchArgs),
    /// Start tracking a route's price
    Track(TrackArgs),
    /// Record a fresh price observation for one or all tracked routes
    Refresh {
        /// Route identity, e.g. LHR-JFK-2025-06-01; all routes when omitted
        route_id: Option<String>,
    },
    /// Show tracked routes and their latest observation
    List,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Origin airport IATA code (e.g. LHR)
    pub origin: String,
    /// Destination airport IATA code (e.g. JFK)
    pub destination: String,
    /// Departure date (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Return date for round trips (YYYY-MM-DD)
    #[arg(long)]
    pub return_date: Option<NaiveDate>,
    /// ECONOMY, PREMIUM_ECONOMY, BUSINESS or FIRST
    #[arg(long, default_value = "ECONOMY")]
    pub cabin: CabinClass,
    /// ANY, NON_STOP, ONE_STOP or TWO_STOPS
    #[arg(long, default_value = "ANY")]
    pub stops: MaxStops,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub route: RouteArgs,
    /// Number of results; defaults to `search.default_results`
    #[arg(long)]
    pub results: Option<usize>,
}

#[derive(Debug, Args)]
pub struct TrackArgs {
    #[command(flatten)]
    pub route: RouteArgs,
    /// Alert when the best price drops to or below this
    #[arg(long)]
    pub target_price: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_command() {
        let cli = Cli::try_parse_from([
            "farewatch", "track", "lhr", "jfk", "2025-06-01",
            "--return-date", "2025-06-10", "--stops", "NON_STOP", "--target-price", "500",
        ])
        .expect("arguments should parse");

        match cli.command {
            Command::Track(args) => {
                assert_eq!(args.route.origin, "lhr");
                assert_eq!(args.route.return_date, NaiveDate::from_ymd_opt(2025, 6, 10));
                assert_eq!(args.route.stops, MaxStops::NonStop);
                assert_eq!(args.route.cabin, CabinClass::Economy);
                assert_eq!(args.target_price, Some(500.0));
            }
            other => panic!("expected track, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_cabin() {
        assert!(Cli::try_parse_from(["farewatch", "search", "LHR", "JFK", "2025-06-01", "--cabin", "COACH"]).is_err());
    }
}
