use farewatch_core::tracking::{PriceSnapshot, TrackedRoute};

/// Outcome of comparing an observation with a route's target price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    NoTarget,
    NoPriceFound,
    AboveTarget,
    AtOrBelowTarget,
}

impl AlertState {
    /// Whether the caller should notify someone.
    pub fn is_triggered(&self) -> bool {
        matches!(self, AlertState::AtOrBelowTarget)
    }
}

/// Pure decision function; notifying anyone is up to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEvaluator;

impl AlertEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(&self, route: &TrackedRoute, snapshot: &PriceSnapshot) -> AlertState {
        let Some(target) = route.target_price() else {
            return AlertState::NoTarget;
        };
        let Some(price) = snapshot.best_price() else {
            return AlertState::NoPriceFound;
        };

        if price <= target {
            AlertState::AtOrBelowTarget
        } else {
            AlertState::AboveTarget
        }
    }

    /// Evaluates the most recent observation, if any.
    pub fn evaluate_latest(&self, route: &TrackedRoute) -> Option<AlertState> {
        route
            .latest_snapshot()
            .map(|snapshot| self.evaluate(route, snapshot))
    }
}
