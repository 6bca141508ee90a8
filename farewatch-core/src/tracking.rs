use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::iata::AirportCode;
use crate::search::{CabinClass, MaxStops, SearchFilters};
use crate::{CoreError, CoreResult};

/// Deterministic identity of a tracked route:
/// `ORIGIN-DESTINATION-DATE[-RT-RETURN_DATE]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(
        origin: &AirportCode,
        destination: &AirportCode,
        date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> Self {
        let mut id = format!("{}-{}-{}", origin, destination, date.format("%Y-%m-%d"));
        if let Some(return_date) = return_date {
            id.push_str(&format!("-RT-{}", return_date.format("%Y-%m-%d")));
        }
        Self(id)
    }

    pub fn for_filters(filters: &SearchFilters) -> Self {
        Self::new(
            &filters.origin,
            &filters.destination,
            filters.departure_date,
            filters.return_date,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Accepts user-typed keys; airport codes are upper-cased the same way
/// [`AirportCode::parse`] does it.
impl From<&str> for RouteId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cheapest fare seen in one observation.
#[derive(Debug, Clone, PartialEq)]
pub struct BestFare {
    pub price: f64,
    pub airline: String,
}

/// One timestamped price observation. A snapshot either carries both a
/// price and an airline or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    timestamp: DateTime<Utc>,
    best: Option<BestFare>,
}

impl PriceSnapshot {
    /// Prices are kept to the cent.
    pub fn observed(timestamp: DateTime<Utc>, price: f64, airline: impl Into<String>) -> CoreResult<Self> {
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::ValidationError(format!("invalid observed price {}", price)));
        }
        Ok(Self {
            timestamp,
            best: Some(BestFare {
                price: (price * 100.0).round() / 100.0,
                airline: airline.into(),
            }),
        })
    }

    pub fn no_flights(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, best: None }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn best(&self) -> Option<&BestFare> {
        self.best.as_ref()
    }

    pub fn best_price(&self) -> Option<f64> {
        self.best.as_ref().map(|fare| fare.price)
    }

    pub fn airline(&self) -> Option<&str> {
        self.best.as_ref().map(|fare| fare.airline.as_str())
    }
}

/// A route under price observation. Everything except the price history is
/// fixed at creation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedRoute {
    id: RouteId,
    origin: AirportCode,
    destination: AirportCode,
    date: NaiveDate,
    return_date: Option<NaiveDate>,
    cabin: CabinClass,
    stops: MaxStops,
    target_price: Option<f64>,
    currency: String,
    added_at: DateTime<Utc>,
    price_history: Vec<PriceSnapshot>,
}

impl TrackedRoute {
    pub fn new(
        filters: &SearchFilters,
        target_price: Option<f64>,
        currency: impl Into<String>,
        added_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if let Some(target) = target_price {
            if !target.is_finite() || target < 0.0 {
                return Err(CoreError::ValidationError(format!("invalid target price {}", target)));
            }
        }
        Ok(Self {
            id: RouteId::for_filters(filters),
            origin: filters.origin.clone(),
            destination: filters.destination.clone(),
            date: filters.departure_date,
            return_date: filters.return_date,
            cabin: filters.cabin,
            stops: filters.max_stops,
            target_price,
            currency: currency.into(),
            added_at,
            price_history: Vec::new(),
        })
    }

    /// Rebuilds a route from already-validated stored parts.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        origin: AirportCode,
        destination: AirportCode,
        date: NaiveDate,
        return_date: Option<NaiveDate>,
        cabin: CabinClass,
        stops: MaxStops,
        target_price: Option<f64>,
        currency: String,
        added_at: DateTime<Utc>,
        price_history: Vec<PriceSnapshot>,
    ) -> CoreResult<Self> {
        if price_history
            .windows(2)
            .any(|w| w[1].timestamp() < w[0].timestamp())
        {
            return Err(CoreError::ValidationError("price history is not chronological".to_string()));
        }
        Ok(Self {
            id: RouteId::new(&origin, &destination, date, return_date),
            origin,
            destination,
            date,
            return_date,
            cabin,
            stops,
            target_price,
            currency,
            added_at,
            price_history,
        })
    }

    /// Appends at the end of the history. A snapshot older than the last one
    /// is handed back unchanged.
    pub fn push_snapshot(&mut self, snapshot: PriceSnapshot) -> Result<(), PriceSnapshot> {
        if let Some(last) = self.price_history.last() {
            if snapshot.timestamp() < last.timestamp() {
                return Err(snapshot);
            }
        }
        self.price_history.push(snapshot);
        Ok(())
    }

    /// Filters that reproduce the original search for a refresh run.
    pub fn search_filters(&self, passengers: u32) -> CoreResult<SearchFilters> {
        SearchFilters::new(
            self.origin.clone(),
            self.destination.clone(),
            self.date,
            self.return_date,
            self.cabin,
            self.stops,
            passengers,
        )
    }

    pub fn id(&self) -> &RouteId {
        &self.id
    }

    pub fn origin(&self) -> &AirportCode {
        &self.origin
    }

    pub fn destination(&self) -> &AirportCode {
        &self.destination
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.return_date
    }

    pub fn cabin(&self) -> CabinClass {
        self.cabin
    }

    pub fn stops(&self) -> MaxStops {
        self.stops
    }

    pub fn target_price(&self) -> Option<f64> {
        self.target_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub fn price_history(&self) -> &[PriceSnapshot] {
        &self.price_history
    }

    pub fn latest_snapshot(&self) -> Option<&PriceSnapshot> {
        self.price_history.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn filters(return_date: Option<NaiveDate>) -> SearchFilters {
        SearchFilters::new(
            AirportCode::parse("LHR").unwrap(),
            AirportCode::parse("JFK").unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            return_date,
            CabinClass::Economy,
            MaxStops::Any,
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_route_identity() {
        assert_eq!(RouteId::for_filters(&filters(None)).as_str(), "LHR-JFK-2025-06-01");

        let rt = filters(NaiveDate::from_ymd_opt(2025, 6, 10));
        assert_eq!(RouteId::for_filters(&rt).as_str(), "LHR-JFK-2025-06-01-RT-2025-06-10");
    }

    #[test]
    fn test_typed_route_id_is_normalized() {
        assert_eq!(RouteId::from(" lhr-jfk-2025-06-01 "), RouteId::for_filters(&filters(None)));

        let rt = filters(NaiveDate::from_ymd_opt(2025, 6, 10));
        assert_eq!(RouteId::from("lhr-jfk-2025-06-01-rt-2025-06-10"), RouteId::for_filters(&rt));
    }

    #[test]
    fn test_snapshot_rounds_to_cents() {
        let now = Utc::now();
        let snapshot = PriceSnapshot::observed(now, 649.996, "Delta").unwrap();
        assert_eq!(snapshot.best_price(), Some(650.0));
        assert_eq!(snapshot.airline(), Some("Delta"));

        let empty = PriceSnapshot::no_flights(now);
        assert_eq!(empty.best_price(), None);
        assert_eq!(empty.airline(), None);

        assert!(PriceSnapshot::observed(now, -5.0, "Delta").is_err());
    }

    #[test]
    fn test_history_is_append_only_and_chronological() {
        let added = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let mut route = TrackedRoute::new(&filters(None), Some(500.0), "GBP", added).unwrap();

        route.push_snapshot(PriceSnapshot::observed(added, 650.0, "BA").unwrap()).unwrap();
        route
            .push_snapshot(PriceSnapshot::no_flights(added + Duration::hours(6)))
            .unwrap();

        let stale = PriceSnapshot::observed(added - Duration::hours(1), 400.0, "BA").unwrap();
        assert_eq!(route.push_snapshot(stale.clone()), Err(stale));

        assert_eq!(route.price_history().len(), 2);
        assert_eq!(route.latest_snapshot().and_then(|s| s.best_price()), None);
    }

    #[test]
    fn test_rejects_negative_target() {
        assert!(TrackedRoute::new(&filters(None), Some(-1.0), "GBP", Utc::now()).is_err());
    }
}
