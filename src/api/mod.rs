//! HTTP API layer.
//!
//! Boundary-only concerns live here: routing, payload (de)serialization, and
//! the mapping from [`ScheduleError`] to HTTP status codes. The engine and
//! store know nothing about HTTP.

pub mod server;

pub use server::{AppState, build_router, serve};

use crate::error::{ErrorCode, ScheduleError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Wire-level error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// HTTP-facing wrapper around domain errors.
#[derive(Debug)]
pub struct ApiError(pub ScheduleError);

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(ScheduleError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let status = match code {
            ErrorCode::ProjectNotFound | ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::DependencyCycle
            | ErrorCode::DependentTasksExist
            | ErrorCode::ConcurrentModification => StatusCode::CONFLICT,
            ErrorCode::UnknownPredecessor | ErrorCode::InvalidFieldValue => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::PersistenceError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorBody {
            code,
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ScheduleError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn cycle_maps_to_conflict() {
        assert_eq!(
            status_of(ScheduleError::CyclicDependency { task_id: 1 }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn missing_entities_map_to_not_found() {
        assert_eq!(
            status_of(ScheduleError::ProjectNotFound(1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ScheduleError::TaskNotFound(1)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn dangling_predecessor_maps_to_unprocessable() {
        assert_eq!(
            status_of(ScheduleError::UnknownPredecessor {
                task_id: 1,
                predecessor_id: 2
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
