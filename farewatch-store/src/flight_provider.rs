use std::time::Duration;

use async_trait::async_trait;
use farewatch_core::provider::{FlightProvider, ProviderError};
use farewatch_core::search::{SearchFilters, SearchResponse, TripType};
use tracing::{debug, warn};

use crate::app_config::ProviderConfig;

/// Flight provider reached over HTTP. Expects `GET {base_url}/search` to
/// answer with `{"currency": "...", "results": [...]}` where round trips are
/// already paired.
pub struct HttpFlightProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFlightProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn query(filters: &SearchFilters) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", filters.origin.to_string()),
            ("destination", filters.destination.to_string()),
            ("date", filters.departure_date.format("%Y-%m-%d").to_string()),
            ("cabin", filters.cabin.as_str().to_string()),
            ("stops", filters.max_stops.as_str().to_string()),
            ("adults", filters.passengers.to_string()),
        ];
        if let Some(return_date) = filters.return_date {
            query.push(("return_date", return_date.format("%Y-%m-%d").to_string()));
        }
        query
    }
}

/// Rejects payloads the rest of the system cannot trust.
pub fn check_response(filters: &SearchFilters, response: &SearchResponse) -> Result<(), ProviderError> {
    if response.currency.trim().is_empty() {
        return Err(ProviderError::Malformed("missing currency".to_string()));
    }

    let expected = filters.trip_type();
    for (idx, result) in response.results.iter().enumerate() {
        if result.trip_type() != expected {
            return Err(ProviderError::TripTypeMismatch {
                expected: trip_label(expected).to_string(),
                found: trip_label(result.trip_type()).to_string(),
            });
        }
        result
            .validate()
            .map_err(|e| ProviderError::Malformed(format!("result {}: {}", idx, e)))?;
    }
    Ok(())
}

fn trip_label(trip: TripType) -> &'static str {
    match trip {
        TripType::OneWay => "one-way",
        TripType::RoundTrip => "round-trip",
    }
}

#[async_trait]
impl FlightProvider for HttpFlightProvider {
    async fn search(&self, filters: &SearchFilters) -> Result<SearchResponse, ProviderError> {
        let url = format!("{}/search", self.base_url);
        debug!("Querying {} for {} -> {}", url, filters.origin, filters.destination);

        let response = self
            .client
            .get(&url)
            .query(&Self::query(filters))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Flight provider answered {}", status);
            return Err(ProviderError::Transport(format!("provider answered {}", status)));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        check_response(filters, &payload)?;
        debug!("Provider returned {} results in {}", payload.results.len(), payload.currency);
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use farewatch_core::search::{CabinClass, FlightOption, Leg, MaxStops, RoundTripOption, SearchResult};
    use farewatch_core::AirportCode;

    fn filters(return_date: Option<NaiveDate>) -> SearchFilters {
        SearchFilters::new(
            AirportCode::parse("SFO").unwrap(),
            AirportCode::parse("LHR").unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            return_date,
            CabinClass::Economy,
            MaxStops::OneStop,
            1,
        )
        .unwrap()
    }

    fn option(price: f64) -> FlightOption {
        let day = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
        FlightOption {
            price,
            duration_minutes: 630,
            stops: 0,
            legs: vec![Leg {
                airline: "United".to_string(),
                flight_number: "UA901".to_string(),
                departure_airport: "SFO".to_string(),
                departure_time: day.and_hms_opt(16, 0, 0).unwrap(),
                arrival_airport: "LHR".to_string(),
                arrival_time: day.and_hms_opt(23, 30, 0).unwrap(),
            }],
        }
    }

    #[test]
    fn test_query_includes_return_date_for_round_trips() {
        let query = HttpFlightProvider::query(&filters(NaiveDate::from_ymd_opt(2024, 12, 9)));
        assert!(query.contains(&("return_date", "2024-12-09".to_string())));
        assert!(query.contains(&("stops", "ONE_STOP".to_string())));

        let one_way = HttpFlightProvider::query(&filters(None));
        assert!(one_way.iter().all(|(key, _)| *key != "return_date"));
    }

    #[test]
    fn test_check_response_accepts_empty_results() {
        let response = SearchResponse { results: vec![], currency: "USD".to_string() };
        assert!(check_response(&filters(None), &response).is_ok());
    }

    #[test]
    fn test_check_response_rejects_wrong_trip_type() {
        let response = SearchResponse {
            results: vec![SearchResult::RoundTrip(RoundTripOption::new(option(400.0), option(350.0)))],
            currency: "USD".to_string(),
        };
        assert!(matches!(
            check_response(&filters(None), &response),
            Err(ProviderError::TripTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_check_response_rejects_negative_price() {
        let response = SearchResponse {
            results: vec![SearchResult::OneWay(option(-10.0))],
            currency: "USD".to_string(),
        };
        assert!(matches!(check_response(&filters(None), &response), Err(ProviderError::Malformed(_))));
    }
}
