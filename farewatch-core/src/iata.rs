use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::{CoreError, CoreResult};

// ============================================================================
// Airport codes
// ============================================================================

/// A syntactically valid, upper-cased IATA airport code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AirportCode(String);

impl AirportCode {
    /// Checks shape only (three ASCII letters). Use [`AirportDirectory::resolve`]
    /// when the code comes from a user.
    pub fn parse(code: &str) -> CoreResult<Self> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::UnknownLocation(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Directory
// ============================================================================

const KNOWN_AIRPORTS: &[(&str, &str)] = &[
    ("AMS", "Amsterdam Schiphol"),
    ("ATH", "Athens International"),
    ("ATL", "Hartsfield-Jackson Atlanta"),
    ("AUH", "Abu Dhabi International"),
    ("BCN", "Barcelona El Prat"),
    ("BKK", "Bangkok Suvarnabhumi"),
    ("BOM", "Mumbai Chhatrapati Shivaji"),
    ("BOS", "Boston Logan"),
    ("BRU", "Brussels"),
    ("CDG", "Paris Charles de Gaulle"),
    ("CPH", "Copenhagen"),
    ("CPT", "Cape Town International"),
    ("DEL", "Delhi Indira Gandhi"),
    ("DEN", "Denver International"),
    ("DFW", "Dallas/Fort Worth"),
    ("DOH", "Doha Hamad"),
    ("DUB", "Dublin"),
    ("DXB", "Dubai International"),
    ("EDI", "Edinburgh"),
    ("EWR", "Newark Liberty"),
    ("FCO", "Rome Fiumicino"),
    ("FRA", "Frankfurt"),
    ("GRU", "Sao Paulo Guarulhos"),
    ("GVA", "Geneva"),
    ("HEL", "Helsinki-Vantaa"),
    ("HKG", "Hong Kong International"),
    ("HND", "Tokyo Haneda"),
    ("IAD", "Washington Dulles"),
    ("ICN", "Seoul Incheon"),
    ("IST", "Istanbul"),
    ("JFK", "New York John F. Kennedy"),
    ("JNB", "Johannesburg O.R. Tambo"),
    ("LAS", "Las Vegas Harry Reid"),
    ("LAX", "Los Angeles International"),
    ("LGW", "London Gatwick"),
    ("LHR", "London Heathrow"),
    ("LIS", "Lisbon Humberto Delgado"),
    ("MAD", "Madrid Barajas"),
    ("MAN", "Manchester"),
    ("MEL", "Melbourne"),
    ("MEX", "Mexico City International"),
    ("MIA", "Miami International"),
    ("MUC", "Munich"),
    ("MXP", "Milan Malpensa"),
    ("NRT", "Tokyo Narita"),
    ("ORD", "Chicago O'Hare"),
    ("OSL", "Oslo Gardermoen"),
    ("PEK", "Beijing Capital"),
    ("PVG", "Shanghai Pudong"),
    ("SEA", "Seattle-Tacoma"),
    ("SFO", "San Francisco International"),
    ("SIN", "Singapore Changi"),
    ("STN", "London Stansted"),
    ("SYD", "Sydney Kingsford Smith"),
    ("VIE", "Vienna"),
    ("YUL", "Montreal Trudeau"),
    ("YVR", "Vancouver International"),
    ("YYZ", "Toronto Pearson"),
    ("ZRH", "Zurich"),
];

/// Resolves user-supplied codes against the built-in airport list plus any
/// codes added through configuration.
#[derive(Debug, Clone, Default)]
pub struct AirportDirectory {
    extra: HashSet<String>,
}

impl AirportDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: extra
                .into_iter()
                .map(|code| code.as_ref().trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn resolve(&self, code: &str) -> CoreResult<AirportCode> {
        let parsed = AirportCode::parse(code)?;
        if self.name(&parsed).is_some() || self.extra.contains(parsed.as_str()) {
            Ok(parsed)
        } else {
            tracing::debug!("Airport code {} not in directory", parsed);
            Err(CoreError::UnknownLocation(parsed.0))
        }
    }

    pub fn name(&self, code: &AirportCode) -> Option<&'static str> {
        KNOWN_AIRPORTS
            .binary_search_by(|(known, _)| known.cmp(&code.as_str()))
            .ok()
            .map(|idx| KNOWN_AIRPORTS[idx].1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_airports_sorted() {
        assert!(KNOWN_AIRPORTS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let directory = AirportDirectory::new();
        let code = directory.resolve("lhr").expect("LHR should resolve");
        assert_eq!(code.as_str(), "LHR");
        assert_eq!(directory.name(&code), Some("London Heathrow"));
    }

    #[test]
    fn test_unknown_location() {
        let directory = AirportDirectory::new();
        match directory.resolve("QQQ") {
            Err(CoreError::UnknownLocation(code)) => assert_eq!(code, "QQQ"),
            other => panic!("expected UnknownLocation, got {:?}", other),
        }
        assert!(matches!(directory.resolve("LONDON"), Err(CoreError::UnknownLocation(_))));
    }

    #[test]
    fn test_configured_extras_resolve() {
        let directory = AirportDirectory::with_extra(["bhx"]);
        let code = directory.resolve("BHX").expect("configured extra should resolve");
        assert_eq!(directory.name(&code), None);
    }
}
