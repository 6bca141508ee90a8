use std::process::ExitCode;

use farewatch_core::repository::LedgerError;
use farewatch_core::CoreError;
use farewatch_offer::TrackError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unknown airport code: {0}")]
    UnknownLocation(String),
    #[error("{0}")]
    Validation(String),
    #[error("Not tracking {0}")]
    NotFound(String),
    #[error(transparent)]
    Track(TrackError),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// Prints the failure to stderr and yields the process exit status.
    pub fn report(&self) -> ExitCode {
        match self {
            AppError::Anyhow(err) => eprintln!("Error: {:#}", err),
            other => eprintln!("{}", other),
        }
        ExitCode::FAILURE
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownLocation(code) => AppError::UnknownLocation(code),
            CoreError::ValidationError(msg) => AppError::Validation(msg),
        }
    }
}

impl From<TrackError> for AppError {
    fn from(err: TrackError) -> Self {
        match err {
            TrackError::Validation(core) => core.into(),
            TrackError::Ledger(LedgerError::NotFound(id)) => AppError::NotFound(id.to_string()),
            other => AppError::Track(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use farewatch_core::tracking::RouteId;

    #[test]
    fn test_track_errors_are_unwrapped() {
        let err: AppError = TrackError::Validation(CoreError::UnknownLocation("QQQ".to_string())).into();
        assert_eq!(err.to_string(), "Unknown airport code: QQQ");

        let err: AppError = TrackError::Ledger(LedgerError::NotFound(RouteId::from("LHR-JFK-2025-06-01"))).into();
        assert_eq!(err.to_string(), "Not tracking LHR-JFK-2025-06-01");
    }
}
