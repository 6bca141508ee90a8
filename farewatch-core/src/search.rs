use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::iata::AirportCode;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "ECONOMY",
            CabinClass::PremiumEconomy => "PREMIUM_ECONOMY",
            CabinClass::Business => "BUSINESS",
            CabinClass::First => "FIRST",
        }
    }
}

impl Default for CabinClass {
    fn default() -> Self {
        CabinClass::Economy
    }
}

impl fmt::Display for CabinClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CabinClass {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ECONOMY" => Ok(CabinClass::Economy),
            "PREMIUM_ECONOMY" => Ok(CabinClass::PremiumEconomy),
            "BUSINESS" => Ok(CabinClass::Business),
            "FIRST" => Ok(CabinClass::First),
            other => Err(CoreError::ValidationError(format!("unknown cabin class '{}'", other))),
        }
    }
}

/// Upper bound on the number of stops the provider may return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaxStops {
    Any,
    NonStop,
    OneStop,
    TwoStops,
}

impl MaxStops {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaxStops::Any => "ANY",
            MaxStops::NonStop => "NON_STOP",
            MaxStops::OneStop => "ONE_STOP",
            MaxStops::TwoStops => "TWO_STOPS",
        }
    }
}

impl Default for MaxStops {
    fn default() -> Self {
        MaxStops::Any
    }
}

impl fmt::Display for MaxStops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaxStops {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ANY" => Ok(MaxStops::Any),
            "NON_STOP" => Ok(MaxStops::NonStop),
            "ONE_STOP" => Ok(MaxStops::OneStop),
            "TWO_STOPS" => Ok(MaxStops::TwoStops),
            other => Err(CoreError::ValidationError(format!("unknown stops policy '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    OneWay,
    RoundTrip,
}

/// What the caller asks the provider for.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchFilters {
    pub origin: AirportCode,
    pub destination: AirportCode,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub cabin: CabinClass,
    pub max_stops: MaxStops,
    pub passengers: u32,
}

impl SearchFilters {
    pub fn new(
        origin: AirportCode,
        destination: AirportCode,
        departure_date: NaiveDate,
        return_date: Option<NaiveDate>,
        cabin: CabinClass,
        max_stops: MaxStops,
        passengers: u32,
    ) -> CoreResult<Self> {
        if origin == destination {
            return Err(CoreError::ValidationError(format!(
                "origin and destination are both {}",
                origin
            )));
        }
        if let Some(return_date) = return_date {
            if return_date < departure_date {
                return Err(CoreError::ValidationError(format!(
                    "return date {} is before departure date {}",
                    return_date, departure_date
                )));
            }
        }
        if passengers == 0 {
            return Err(CoreError::ValidationError("at least one passenger is required".to_string()));
        }

        Ok(Self {
            origin,
            destination,
            departure_date,
            return_date,
            cabin,
            max_stops,
            passengers,
        })
    }

    pub fn trip_type(&self) -> TripType {
        if self.return_date.is_some() {
            TripType::RoundTrip
        } else {
            TripType::OneWay
        }
    }
}

/// One direct flight segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Leg {
    pub airline: String,
    pub flight_number: String,
    pub departure_airport: String,
    pub departure_time: NaiveDateTime,
    pub arrival_airport: String,
    pub arrival_time: NaiveDateTime,
}

/// A complete priced itinerary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOption {
    pub price: f64,
    pub duration_minutes: u32,
    pub stops: u32,
    pub legs: Vec<Leg>,
}

impl FlightOption {
    /// Checks the shape guarantees the provider owes us.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::ValidationError(format!("invalid price {}", self.price)));
        }
        if self.legs.is_empty() {
            return Err(CoreError::ValidationError("flight option has no legs".to_string()));
        }
        for pair in self.legs.windows(2) {
            if pair[1].departure_time < pair[0].departure_time {
                return Err(CoreError::ValidationError(format!(
                    "legs out of order: {} departs before {}",
                    pair[1].flight_number, pair[0].flight_number
                )));
            }
        }
        Ok(())
    }

    /// Airline operating the first leg.
    pub fn carrier(&self) -> Option<&str> {
        self.legs.first().map(|leg| leg.airline.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundTripOption {
    pub outbound: FlightOption,
    #[serde(rename = "return")]
    pub inbound: FlightOption,
}

impl RoundTripOption {
    pub fn new(outbound: FlightOption, inbound: FlightOption) -> Self {
        Self { outbound, inbound }
    }
}

/// A provider result. One-way searches yield `OneWay`, round trips yield
/// already-paired `RoundTrip` options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "trip", rename_all = "snake_case")]
pub enum SearchResult {
    OneWay(FlightOption),
    RoundTrip(RoundTripOption),
}

impl SearchResult {
    pub fn trip_type(&self) -> TripType {
        match self {
            SearchResult::OneWay(_) => TripType::OneWay,
            SearchResult::RoundTrip(_) => TripType::RoundTrip,
        }
    }

    pub fn outbound(&self) -> &FlightOption {
        match self {
            SearchResult::OneWay(option) => option,
            SearchResult::RoundTrip(pair) => &pair.outbound,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        match self {
            SearchResult::OneWay(option) => option.validate(),
            SearchResult::RoundTrip(pair) => {
                pair.outbound.validate()?;
                pair.inbound.validate()
            }
        }
    }
}

/// Anything that can be ordered by what the traveller pays.
pub trait Priced {
    fn total_price(&self) -> f64;
}

impl Priced for FlightOption {
    fn total_price(&self) -> f64 {
        self.price
    }
}

impl Priced for RoundTripOption {
    fn total_price(&self) -> f64 {
        self.outbound.price + self.inbound.price
    }
}

impl Priced for SearchResult {
    fn total_price(&self) -> f64 {
        match self {
            SearchResult::OneWay(option) => option.total_price(),
            SearchResult::RoundTrip(pair) => pair.total_price(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub currency: String,
}
