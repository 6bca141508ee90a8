use std::fmt::Write;

use farewatch_core::search::{FlightOption, Priced, SearchResult};
use farewatch_core::tracking::{PriceSnapshot, TrackedRoute};
use farewatch_core::{AirportCode, AirportDirectory};
use farewatch_offer::AlertState;

const RULE: &str = "============================================================";

pub fn format_duration(minutes: u32) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn fmt_price(price: f64, currency: &str) -> String {
    format!("{} {:.2}", currency, price)
}

/// `LHR (London Heathrow)` when the directory knows the code, the bare code
/// otherwise.
fn airport_label(code: &str, directory: &AirportDirectory) -> String {
    match AirportCode::parse(code).ok().and_then(|parsed| directory.name(&parsed)) {
        Some(name) => format!("{} ({})", code, name),
        None => code.to_string(),
    }
}

fn write_legs(out: &mut String, option: &FlightOption, indent: &str, directory: &AirportDirectory) {
    for leg in &option.legs {
        let _ = writeln!(
            out,
            "{}{} {}: {} {} -> {} {}",
            indent,
            leg.airline,
            leg.flight_number,
            airport_label(&leg.departure_airport, directory),
            leg.departure_time.format("%H:%M"),
            airport_label(&leg.arrival_airport, directory),
            leg.arrival_time.format("%H:%M"),
        );
    }
}

fn summary(option: &FlightOption, currency: &str) -> String {
    format!(
        "{} | {} | {} stop(s)",
        fmt_price(option.price, currency),
        format_duration(option.duration_minutes),
        option.stops
    )
}

pub fn render_results(results: &[SearchResult], currency: &str, directory: &AirportDirectory) -> String {
    if results.is_empty() {
        return "No flights found.\n".to_string();
    }

    let mut out = format!("Prices in {}\n", currency);
    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(out, "\n{}", RULE);
        match result {
            SearchResult::OneWay(option) => {
                let _ = writeln!(out, "Option {}: {}", idx + 1, summary(option, currency));
                write_legs(&mut out, option, "  ", directory);
            }
            SearchResult::RoundTrip(pair) => {
                let _ = writeln!(
                    out,
                    "Option {}: {} total",
                    idx + 1,
                    fmt_price(pair.total_price(), currency)
                );
                let _ = writeln!(out, "  Outbound: {}", summary(&pair.outbound, currency));
                write_legs(&mut out, &pair.outbound, "    ", directory);
                let _ = writeln!(out, "  Return: {}", summary(&pair.inbound, currency));
                write_legs(&mut out, &pair.inbound, "    ", directory);
            }
        }
    }
    let _ = writeln!(out, "\n{} result(s) found.", results.len());
    out
}

fn describe_snapshot(snapshot: &PriceSnapshot, currency: &str) -> String {
    match snapshot.best() {
        Some(fare) => format!("{} ({})", fmt_price(fare.price, currency), fare.airline),
        None => "no flights found".to_string(),
    }
}

pub fn render_alert(route: &TrackedRoute, alert: AlertState) -> Option<String> {
    match (alert, route.target_price()) {
        (AlertState::AtOrBelowTarget, Some(target)) => Some(format!(
            "ALERT: {} is at or below your target of {}",
            route.id(),
            fmt_price(target, route.currency())
        )),
        _ => None,
    }
}

pub fn render_tracked(route: &TrackedRoute, alert: AlertState) -> String {
    let mut out = format!(
        "Now tracking: {} -> {} on {}\n",
        route.origin(),
        route.destination(),
        route.date()
    );
    if let Some(snapshot) = route.latest_snapshot() {
        if snapshot.best().is_some() {
            let _ = writeln!(out, "Current best price: {}", describe_snapshot(snapshot, route.currency()));
        }
    }
    if let Some(target) = route.target_price() {
        let _ = writeln!(out, "Target price: {}", fmt_price(target, route.currency()));
    }
    if let Some(alert) = render_alert(route, alert) {
        let _ = writeln!(out, "{}", alert);
    }
    out
}

pub fn render_refreshed(route: &TrackedRoute, alert: AlertState) -> String {
    let latest = route
        .latest_snapshot()
        .map(|snapshot| describe_snapshot(snapshot, route.currency()))
        .unwrap_or_else(|| "no observations".to_string());
    let mut out = format!("{}: {}\n", route.id(), latest);
    if let Some(alert) = render_alert(route, alert) {
        let _ = writeln!(out, "{}", alert);
    }
    out
}

pub fn render_route_list(routes: &[TrackedRoute]) -> String {
    if routes.is_empty() {
        return "No routes tracked.\n".to_string();
    }

    let mut out = String::new();
    for route in routes {
        let target = route
            .target_price()
            .map(|t| fmt_price(t, route.currency()))
            .unwrap_or_else(|| "-".to_string());
        let latest = route
            .latest_snapshot()
            .map(|s| {
                format!(
                    "{} at {}",
                    describe_snapshot(s, route.currency()),
                    s.timestamp().format("%Y-%m-%d %H:%M UTC")
                )
            })
            .unwrap_or_else(|| "no observations".to_string());
        let _ = writeln!(
            out,
            "{}  {}/{}  target {}  latest {}  [{} observation(s)]",
            route.id(),
            route.cabin(),
            route.stops(),
            target,
            latest,
            route.price_history().len()
        );
    }
    out
}
