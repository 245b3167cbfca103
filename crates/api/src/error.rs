use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use layoutsmith_core::error::CoreError;
use layoutsmith_db::StoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for storage
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `layoutsmith_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An error from the active storage backend.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Store(store) => classify_store_error(store),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
        CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::DependencyFailure(msg) => {
            tracing::warn!(error = %msg, "Generator dependency failure");
            (
                StatusCode::BAD_GATEWAY,
                "DEPENDENCY_FAILURE",
                "The layout generator is unavailable. Try again later.".to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Classify a storage error into an HTTP status, error code, and message.
///
/// - `Duplicate` maps to 409 with a message chosen by constraint name.
/// - `NotFound` maps to 404.
/// - `Rule` is classified like the wrapped [`CoreError`].
/// - Database errors map to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> Classified {
    match err {
        StoreError::Duplicate { constraint } => (
            StatusCode::CONFLICT,
            "CONFLICT",
            duplicate_message(constraint),
        ),
        StoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        StoreError::Rule(core) => classify_core_error(core),
        StoreError::Database(db_err) => {
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
    }
}

/// User-facing message for a unique-constraint violation.
fn duplicate_message(constraint: &str) -> String {
    match constraint {
        "uq_users_username" => "Username is already taken".to_string(),
        "uq_users_email" => "Email is already registered".to_string(),
        "uq_categories_owner_name" => "You already have a category with this name".to_string(),
        "uq_tags_owner_name" => "You already have a tag with this name".to_string(),
        "uq_generated_layouts_owner_root_title" => {
            "You already have a layout with this title".to_string()
        }
        "uq_team_invitations_pending" => {
            "This user already has a pending invitation to the team".to_string()
        }
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
