use std::path::PathBuf;

use tracing::{debug, info};

use crate::tracking::{PriceSnapshot, RouteId, TrackedRoute};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Tracked route not found: {0}")]
    NotFound(RouteId),

    #[error("Corrupt ledger {path}: record {record}, field '{field}': {detail}")]
    CorruptStore {
        path: PathBuf,
        record: String,
        field: String,
        detail: String,
    },

    #[error("Snapshot for {0} is older than the last recorded observation")]
    OutOfOrderSnapshot(RouteId),

    #[error("Ledger I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Persistent ledger of tracked routes.
///
/// Implementations perform a plain read-modify-write and assume a single
/// writer. Concurrent processes sharing a ledger have to serialize
/// `add_if_absent` and `append_snapshot` behind an external lock.
pub trait TrackedRouteRepository: Send + Sync {
    /// Reads every route. A ledger that does not exist yet is empty.
    fn load(&self) -> LedgerResult<Vec<TrackedRoute>>;

    /// Replaces the ledger contents with `routes`.
    fn save(&self, routes: &[TrackedRoute]) -> LedgerResult<()>;

    /// Returns `false` without writing when a route with the same identity is
    /// already stored.
    fn add_if_absent(&self, route: TrackedRoute) -> LedgerResult<bool> {
        let mut routes = self.load()?;
        if routes.iter().any(|existing| existing.id() == route.id()) {
            debug!("Route {} already tracked", route.id());
            return Ok(false);
        }
        info!("Tracking new route {}", route.id());
        routes.push(route);
        self.save(&routes)?;
        Ok(true)
    }

    /// Appends to the route's history and returns the updated route.
    fn append_snapshot(&self, route_id: &RouteId, snapshot: PriceSnapshot) -> LedgerResult<TrackedRoute> {
        let mut routes = self.load()?;
        let route = routes
            .iter_mut()
            .find(|route| route.id() == route_id)
            .ok_or_else(|| LedgerError::NotFound(route_id.clone()))?;

        route
            .push_snapshot(snapshot)
            .map_err(|_| LedgerError::OutOfOrderSnapshot(route_id.clone()))?;
        let updated = route.clone();
        debug!("Appended snapshot #{} to {}", updated.price_history().len(), route_id);

        self.save(&routes)?;
        Ok(updated)
    }

    fn find(&self, route_id: &RouteId) -> LedgerResult<Option<TrackedRoute>> {
        Ok(self.load()?.into_iter().find(|route| route.id() == route_id))
    }
}
