use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use farewatch_core::repository::{LedgerError, LedgerResult, TrackedRouteRepository};
use farewatch_core::tracking::{PriceSnapshot, TrackedRoute};
use farewatch_core::{AirportCode, CabinClass, CoreError, MaxStops};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

// ============================================================================
// Stored record shapes
// ============================================================================
//
// Field names are part of the on-disk contract. Unknown fields are ignored
// and optional ones may be missing, so older and newer ledgers both load.

#[derive(Debug, Serialize, Deserialize)]
struct TrackedRouteRecord {
    id: String,
    origin: String,
    destination: String,
    date: String,
    #[serde(default)]
    return_date: Option<String>,
    cabin: String,
    stops: String,
    #[serde(default)]
    target_price: Option<f64>,
    currency: String,
    added_at: String,
    #[serde(default)]
    price_history: Vec<PriceSnapshotRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PriceSnapshotRecord {
    timestamp: String,
    #[serde(default)]
    best_price: Option<f64>,
    #[serde(default)]
    airline: Option<String>,
}

impl From<&TrackedRoute> for TrackedRouteRecord {
    fn from(route: &TrackedRoute) -> Self {
        Self {
            id: route.id().to_string(),
            origin: route.origin().to_string(),
            destination: route.destination().to_string(),
            date: route.date().format("%Y-%m-%d").to_string(),
            return_date: route.return_date().map(|d| d.format("%Y-%m-%d").to_string()),
            cabin: route.cabin().as_str().to_string(),
            stops: route.stops().as_str().to_string(),
            target_price: route.target_price(),
            currency: route.currency().to_string(),
            added_at: route.added_at().to_rfc3339(),
            price_history: route
                .price_history()
                .iter()
                .map(|snapshot| PriceSnapshotRecord {
                    timestamp: snapshot.timestamp().to_rfc3339(),
                    best_price: snapshot.best_price(),
                    airline: snapshot.airline().map(str::to_string),
                })
                .collect(),
        }
    }
}

/// Maps one loose record onto the typed model, naming the offending field on
/// failure.
struct RecordParser<'a> {
    path: &'a Path,
    record: String,
}

impl RecordParser<'_> {
    fn corrupt(&self, field: &str, detail: impl Into<String>) -> LedgerError {
        LedgerError::CorruptStore {
            path: self.path.to_path_buf(),
            record: self.record.clone(),
            field: field.to_string(),
            detail: detail.into(),
        }
    }

    fn date(&self, field: &str, value: &str) -> LedgerResult<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| self.corrupt(field, e.to_string()))
    }

    fn timestamp(&self, field: &str, value: &str) -> LedgerResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| self.corrupt(field, e.to_string()))
    }

    fn price(&self, field: &str, value: f64) -> LedgerResult<f64> {
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err(self.corrupt(field, format!("invalid price {}", value)))
        }
    }

    fn snapshot(&self, idx: usize, record: PriceSnapshotRecord) -> LedgerResult<PriceSnapshot> {
        let timestamp = self.timestamp(&format!("price_history[{}].timestamp", idx), &record.timestamp)?;
        match (record.best_price, record.airline) {
            (Some(price), Some(airline)) => {
                let field = format!("price_history[{}].best_price", idx);
                let price = self.price(&field, price)?;
                PriceSnapshot::observed(timestamp, price, airline).map_err(|e| self.corrupt(&field, e.to_string()))
            }
            (None, None) => Ok(PriceSnapshot::no_flights(timestamp)),
            (Some(_), None) => Err(self.corrupt(
                &format!("price_history[{}].airline", idx),
                "best_price is set but airline is missing",
            )),
            (None, Some(_)) => Err(self.corrupt(
                &format!("price_history[{}].best_price", idx),
                "airline is set but best_price is missing",
            )),
        }
    }

    fn route(&self, record: TrackedRouteRecord) -> LedgerResult<TrackedRoute> {
        let origin = AirportCode::parse(&record.origin).map_err(|e| self.corrupt("origin", e.to_string()))?;
        let destination =
            AirportCode::parse(&record.destination).map_err(|e| self.corrupt("destination", e.to_string()))?;
        let date = self.date("date", &record.date)?;
        let return_date = record
            .return_date
            .as_deref()
            .map(|value| self.date("return_date", value))
            .transpose()?;
        let cabin: CabinClass = record.cabin.parse().map_err(|e: CoreError| self.corrupt("cabin", e.to_string()))?;
        let stops: MaxStops = record.stops.parse().map_err(|e: CoreError| self.corrupt("stops", e.to_string()))?;
        let target_price = record
            .target_price
            .map(|value| self.price("target_price", value))
            .transpose()?;
        let added_at = self.timestamp("added_at", &record.added_at)?;

        let history = record
            .price_history
            .into_iter()
            .enumerate()
            .map(|(idx, snapshot)| self.snapshot(idx, snapshot))
            .collect::<LedgerResult<Vec<_>>>()?;

        let route = TrackedRoute::restore(
            origin,
            destination,
            date,
            return_date,
            cabin,
            stops,
            target_price,
            record.currency,
            added_at,
            history,
        )
        .map_err(|e| self.corrupt("price_history", e.to_string()))?;

        if route.id().as_str() != record.id {
            return Err(self.corrupt(
                "id",
                format!("stored id does not match route identity {}", route.id()),
            ));
        }
        Ok(route)
    }
}

// ============================================================================
// JSON ledger
// ============================================================================

/// Tracked-route ledger kept as a pretty-printed JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonTrackedRouteStore {
    path: PathBuf,
}

impl JsonTrackedRouteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parse(&self, contents: &str) -> LedgerResult<Vec<TrackedRoute>> {
        let document: Value = serde_json::from_str(contents).map_err(|e| LedgerError::CorruptStore {
            path: self.path.clone(),
            record: "<document>".to_string(),
            field: "<root>".to_string(),
            detail: e.to_string(),
        })?;

        let Value::Array(items) = document else {
            return Err(LedgerError::CorruptStore {
                path: self.path.clone(),
                record: "<document>".to_string(),
                field: "<root>".to_string(),
                detail: "expected an array of tracked routes".to_string(),
            });
        };

        let mut routes: Vec<TrackedRoute> = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let label = item
                .get("id")
                .and_then(Value::as_str)
                .map(|id| format!("#{} ({})", idx, id))
                .unwrap_or_else(|| format!("#{}", idx));
            let parser = RecordParser {
                path: &self.path,
                record: label,
            };

            let record: TrackedRouteRecord =
                serde_json::from_value(item).map_err(|e| parser.corrupt("<record>", e.to_string()))?;
            let route = parser.route(record)?;

            if routes.iter().any(|existing| existing.id() == route.id()) {
                return Err(parser.corrupt("id", "duplicate route identity"));
            }
            routes.push(route);
        }
        Ok(routes)
    }
}

impl TrackedRouteRepository for JsonTrackedRouteStore {
    fn load(&self) -> LedgerResult<Vec<TrackedRoute>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Ledger {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let routes = self.parse(&contents)?;
        debug!("Loaded {} tracked routes from {}", routes.len(), self.path.display());
        Ok(routes)
    }

    fn save(&self, routes: &[TrackedRoute]) -> LedgerResult<()> {
        let records: Vec<TrackedRouteRecord> = routes.iter().map(TrackedRouteRecord::from).collect();
        let json = serde_json::to_string_pretty(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write beside the target and rename over it so readers never see a
        // half-written ledger.
        let tmp = self.temp_path();
        let written = fs::File::create(&tmp).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.write_all(b"\n")?;
            file.sync_all()
        });
        if let Err(e) = written.and_then(|_| fs::rename(&tmp, &self.path)) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        info!("Saved {} tracked routes to {}", routes.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use farewatch_core::tracking::RouteId;
    use farewatch_core::SearchFilters;
    use tempfile::TempDir;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).single().expect("valid timestamp")
    }

    fn route(date: (i32, u32, u32), return_date: Option<NaiveDate>, target: Option<f64>) -> TrackedRoute {
        let filters = SearchFilters::new(
            AirportCode::parse("LHR").unwrap(),
            AirportCode::parse("JFK").unwrap(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            return_date,
            CabinClass::Economy,
            MaxStops::Any,
            1,
        )
        .unwrap();
        TrackedRoute::new(&filters, target, "GBP", ts(9)).unwrap()
    }

    fn store() -> (TempDir, JsonTrackedRouteStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonTrackedRouteStore::new(dir.path().join("data").join("tracked.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_ledger_loads_empty() {
        let (_dir, store) = store();
        assert!(store.load().unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_add_if_absent_is_idempotent() {
        let (_dir, store) = store();
        let rt = NaiveDate::from_ymd_opt(2025, 6, 10);

        assert!(store.add_if_absent(route((2025, 6, 1), rt, Some(500.0))).unwrap());
        // Same identity, different target: still a duplicate.
        assert!(!store.add_if_absent(route((2025, 6, 1), rt, Some(300.0))).unwrap());

        let routes = store.load().unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].target_price(), Some(500.0));
        assert_eq!(routes[0].id().as_str(), "LHR-JFK-2025-06-01-RT-2025-06-10");
    }

    #[test]
    fn test_append_snapshot_keeps_call_order() {
        let (_dir, store) = store();
        let tracked = route((2025, 6, 1), None, None);
        let id = tracked.id().clone();
        store.add_if_absent(tracked).unwrap();

        for (n, price) in [650.0, 610.0, 480.0].into_iter().enumerate() {
            let at = ts(10) + Duration::hours(n as i64);
            store
                .append_snapshot(&id, PriceSnapshot::observed(at, price, "British Airways").unwrap())
                .unwrap();
        }
        store.append_snapshot(&id, PriceSnapshot::no_flights(ts(20))).unwrap();

        let routes = store.load().unwrap();
        let prices: Vec<Option<f64>> = routes[0].price_history().iter().map(|s| s.best_price()).collect();
        assert_eq!(prices, vec![Some(650.0), Some(610.0), Some(480.0), None]);
    }

    #[test]
    fn test_append_snapshot_to_unknown_route() {
        let (_dir, store) = store();
        let err = store
            .append_snapshot(&RouteId::from("LHR-JFK-2025-06-01"), PriceSnapshot::no_flights(ts(10)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(id) if id.as_str() == "LHR-JFK-2025-06-01"));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_out_of_order_snapshot_rejected() {
        let (_dir, store) = store();
        let tracked = route((2025, 6, 1), None, None);
        let id = tracked.id().clone();
        store.add_if_absent(tracked).unwrap();
        store.append_snapshot(&id, PriceSnapshot::no_flights(ts(12))).unwrap();

        let err = store.append_snapshot(&id, PriceSnapshot::no_flights(ts(11))).unwrap_err();
        assert!(matches!(err, LedgerError::OutOfOrderSnapshot(_)));
        assert_eq!(store.load().unwrap()[0].price_history().len(), 1);
    }

    #[test]
    fn test_save_load_fixed_point() {
        let (_dir, store) = store();
        let mut first = route((2025, 6, 1), None, Some(500.0));
        first.push_snapshot(PriceSnapshot::observed(ts(10), 650.0, "Virgin Atlantic").unwrap()).unwrap();
        first.push_snapshot(PriceSnapshot::no_flights(ts(11))).unwrap();
        let second = route((2025, 7, 4), NaiveDate::from_ymd_opt(2025, 7, 18), None);

        store.save(&[first, second]).unwrap();
        let loaded = store.load().unwrap();
        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), loaded);
        assert!(!store.temp_path().exists());
    }

    #[test]
    fn test_loads_legacy_records() {
        let (_dir, store) = store();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(
            store.path(),
            r#"[
              {
                "id": "LHR-JFK-2025-06-01",
                "origin": "LHR",
                "destination": "JFK",
                "date": "2025-06-01",
                "return_date": null,
                "cabin": "ECONOMY",
                "stops": "ANY",
                "target_price": 500.0,
                "currency": "GBP",
                "added_at": "2025-03-01T09:00:00.123456+00:00",
                "notes": "fields we do not know about are ignored",
                "price_history": [
                  {"timestamp": "2025-03-01T09:00:00.123456+00:00", "best_price": 650.0, "airline": "Delta"},
                  {"timestamp": "2025-03-02T09:00:00+00:00", "best_price": null, "airline": null}
                ]
              }
            ]"#,
        )
        .unwrap();

        let routes = store.load().unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].return_date(), None);
        assert_eq!(routes[0].price_history()[0].airline(), Some("Delta"));
        assert_eq!(routes[0].price_history()[1].best_price(), None);
    }

    fn write_raw(store: &JsonTrackedRouteStore, contents: &str) {
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), contents).unwrap();
    }

    #[test]
    fn test_malformed_json_is_corrupt() {
        let (_dir, store) = store();
        write_raw(&store, "[{\"id\": ");
        assert!(matches!(store.load(), Err(LedgerError::CorruptStore { .. })));
    }

    #[test]
    fn test_airline_without_price_is_corrupt() {
        let (_dir, store) = store();
        write_raw(
            &store,
            r#"[{"id": "LHR-JFK-2025-06-01", "origin": "LHR", "destination": "JFK", "date": "2025-06-01",
                 "cabin": "ECONOMY", "stops": "ANY", "currency": "GBP", "added_at": "2025-03-01T09:00:00Z",
                 "price_history": [{"timestamp": "2025-03-01T09:00:00Z", "best_price": null, "airline": "Delta"}]}]"#,
        );
        match store.load() {
            Err(LedgerError::CorruptStore { record, field, .. }) => {
                assert_eq!(record, "#0 (LHR-JFK-2025-06-01)");
                assert_eq!(field, "price_history[0].best_price");
            }
            other => panic!("expected CorruptStore, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_id_is_corrupt() {
        let (_dir, store) = store();
        write_raw(
            &store,
            r#"[{"id": "LHR-JFK-2025-06-02", "origin": "LHR", "destination": "JFK", "date": "2025-06-01",
                 "cabin": "ECONOMY", "stops": "ANY", "currency": "GBP", "added_at": "2025-03-01T09:00:00Z"}]"#,
        );
        assert!(matches!(store.load(), Err(LedgerError::CorruptStore { field, .. }) if field == "id"));
    }

    #[test]
    fn test_corrupt_ledger_is_not_overwritten() {
        let (_dir, store) = store();
        write_raw(&store, "{\"not\": \"an array\"}");
        assert!(store.add_if_absent(route((2025, 6, 1), None, None)).is_err());
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{\"not\": \"an array\"}");
    }

    #[test]
    fn test_failed_write_leaves_ledger_intact() {
        let (_dir, store) = store();
        let tracked = route((2025, 6, 1), None, Some(500.0));
        let id = tracked.id().clone();
        store.add_if_absent(tracked).unwrap();
        store
            .append_snapshot(&id, PriceSnapshot::observed(ts(10), 650.0, "British Airways").unwrap())
            .unwrap();
        let before = fs::read(store.path()).unwrap();

        // A directory in the temp file's place makes the write fail.
        fs::create_dir(store.temp_path()).unwrap();
        let err = store
            .append_snapshot(&id, PriceSnapshot::observed(ts(11), 480.0, "Norse Atlantic").unwrap())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Io { ref path, .. } if path == store.path()));

        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap()[0].price_history().len(), 1);
    }
}
