use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy shared by all services.
///
/// Transient read failures degrade to cached data where a fallback is defined;
/// write failures always surface. Nothing is retried automatically.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Base de données inaccessible: {0}")]
    Transport(String),

    #[error("Requête invalide: {0}")]
    Query(String),

    #[error("Données invalides: {0}")]
    Validation(String),

    #[error("Introuvable: {0}")]
    NotFound(String),

    #[error("Format illisible: {0}")]
    Parse(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Parse(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("aucune ligne correspondante".into()),
            sqlx::Error::Database(db) => AppError::Query(db.to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                AppError::Query(e.to_string())
            }
            other => AppError::Transport(other.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Transport(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
