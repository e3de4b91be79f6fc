use crate::domain::{Fixed6, TimeMs, Version};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Impossible input. Never repaired; the affected account/market is reported unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    #[error("position has more than one non-zero side (maker={maker}, long={long}, short={short})")]
    MultipleSides {
        maker: Fixed6,
        long: Fixed6,
        short: Fixed6,
    },
    #[error("negative position magnitude {0}")]
    NegativeMagnitude(Fixed6),
    #[error("global accumulator regressed from version {earlier} to {later}")]
    AccumulatorRegression { earlier: Version, later: Version },
    #[error("no global accumulator at or before version {0}")]
    MissingAccumulator(Version),
    #[error("account accumulation at version {end} precedes checkpoint at version {start}")]
    AccumulationBeforeCheckpoint { start: Version, end: Version },
    #[error("cumulative {field} decreased from {start} to {end}")]
    CumulativeRegression {
        field: &'static str,
        start: Fixed6,
        end: Fixed6,
    },
    #[error("open checkpoint at version {first} has no close before open at version {second}")]
    UnpairedOpen { first: Version, second: Version },
}

/// Errors surfaced by the reconciliation engine and live overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("data integrity error: {0}")]
    DataIntegrity(#[from] IntegrityViolation),
    #[error("stale {what}: published at {published_ms}ms, limit {max_age_ms}ms at {now_ms}ms")]
    StaleInput {
        what: &'static str,
        published_ms: i64,
        now_ms: i64,
        max_age_ms: i64,
    },
    #[error("{what} published at {published_ms}ms is ahead of {now_ms}ms by more than {max_skew_ms}ms")]
    FutureInput {
        what: &'static str,
        published_ms: i64,
        now_ms: i64,
        max_skew_ms: i64,
    },
}

impl EngineError {
    pub fn stale(what: &'static str, published: TimeMs, now: TimeMs, max_age_ms: i64) -> Self {
        EngineError::StaleInput {
            what,
            published_ms: published.as_ms(),
            now_ms: now.as_ms(),
            max_age_ms,
        }
    }

    pub fn ahead(what: &'static str, published: TimeMs, now: TimeMs, max_skew_ms: i64) -> Self {
        EngineError::FutureInput {
            what,
            published_ms: published.as_ms(),
            now_ms: now.as_ms(),
            max_skew_ms,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

impl From<crate::orchestration::OrchestrationError> for AppError {
    fn from(err: crate::orchestration::OrchestrationError) -> Self {
        use crate::datasource::DataSourceError;
        use crate::orchestration::OrchestrationError;

        match err {
            OrchestrationError::Engine(e) => AppError::Unprocessable(e.to_string()),
            OrchestrationError::DataSource(DataSourceError::NotFound(what)) => {
                AppError::NotFound(what)
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
