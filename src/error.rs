use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("repository unavailable: {0}")]
    RepositoryUnavailable(#[from] sqlx::Error),

    #[error("object store error: {0}")]
    ObjectStore(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// An extractor refused the request; keeps axum's status and message.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RepositoryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::ObjectStore(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Rejected { status, .. } => *status,
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),*) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )*
    };
}

impl_from_rejection!(QueryRejection, JsonRejection, FormRejection);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Infrastructure details stay in the logs.
        let message = match &self {
            AppError::RepositoryUnavailable(e) => {
                error!("Repository call failed: {}", e);
                "Internal server error".to_string()
            }
            AppError::ObjectStore(e) => {
                error!("Object store call failed: {}", e);
                "Storage unavailable".to_string()
            }
            AppError::Config(e) => {
                error!("Misconfiguration: {}", e);
                "Internal server error".to_string()
            }
            other => {
                let mut msg = other.to_string();
                if let Some(first) = msg.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                msg
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
