use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Directory error: {0}")]
    DirectoryError(#[from] DirectoryError),

    #[error("Notification error: {0}")]
    NotificationError(#[from] NotificationError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

// Implement conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DirectoryError(err.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl AppError {
    /// Message that is safe to hand to a client. Persistence and internal
    /// failures are replaced with a generic text.
    pub fn client_message(&self) -> String {
        match self {
            AppError::DirectoryError(DirectoryError::NotFound)
            | AppError::DirectoryError(DirectoryError::Duplicate) => self.to_string(),
            AppError::DirectoryError(_)
            | AppError::ConfigError(_)
            | AppError::InternalError(_)
            | AppError::AuthError(AuthError::Signing(_)) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let response = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.client_message()
            }
        });
        HttpResponse::build(status).json(response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthError(e) => match e {
                AuthError::OtpNotFound => StatusCode::NOT_FOUND,
                AuthError::OtpIncorrect => StatusCode::UNAUTHORIZED,
                AuthError::UserDeactivated => StatusCode::FORBIDDEN,
                AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
                AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DirectoryError(DirectoryError::NotFound) => StatusCode::NOT_FOUND,
            AppError::DirectoryError(DirectoryError::Duplicate) => StatusCode::CONFLICT,
            AppError::NotificationError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("otp not found")]
    OtpNotFound,

    /// Wrong and expired codes share this variant.
    #[error("otp is incorrect")]
    OtpIncorrect,

    #[error("user is deactivated")]
    UserDeactivated,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("User not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DirectoryError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => DirectoryError::Duplicate,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DirectoryError::ConnectionError(err.to_string())
            }
            _ => DirectoryError::QueryError(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("SMS request failed: {0}")]
    RequestFailed(String),

    #[error("SMS gateway rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::RequestFailed(err.to_string())
    }
}
