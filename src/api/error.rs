use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use tracing::{error, warn};

use super::validation::ErrorResponse;
use crate::session::AuthError;
use crate::wizard::WizardError;

/// Service-level errors
#[derive(Debug)]
pub enum ServiceError {
    /// Submitted data failed validation
    Validation(String),

    /// No active session
    Unauthorized(String),

    /// The requested record does not exist
    NotFound(String),

    /// The request conflicts with the wizard's current state
    Conflict(String),

    /// Storage or another internal dependency failed
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message) = match self {
            ServiceError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                ("Validation failed", msg.as_str())
            }
            ServiceError::Unauthorized(msg) => {
                warn!("Unauthorized request: {}", msg);
                ("Authentication required", msg.as_str())
            }
            ServiceError::NotFound(msg) => {
                warn!("Not found: {}", msg);
                ("Not found", msg.as_str())
            }
            ServiceError::Conflict(msg) => {
                warn!("Conflict: {}", msg);
                ("Request conflicts with current state", msg.as_str())
            }
            ServiceError::Internal(msg) => {
                // Keep storage details out of the response
                error!("Internal error: {}", msg);
                ("Failed to process request", "Storage error occurred")
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: error.to_string(),
            fields: serde_json::json!({"message": message}),
        })
    }
}

impl From<WizardError> for ServiceError {
    fn from(e: WizardError) -> Self {
        match e {
            WizardError::StepInvalid { message, .. } => ServiceError::Validation(message),
            WizardError::Storage(_) => ServiceError::Internal(e.to_string()),
            WizardError::NavigationRejected { .. }
            | WizardError::StepNotActive { .. }
            | WizardError::StaleResponse { .. }
            | WizardError::Incomplete { .. } => ServiceError::Conflict(e.to_string()),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ServiceError::Validation(msg),
            AuthError::NotAuthenticated | AuthError::Provider(_) => {
                ServiceError::Unauthorized(e.to_string())
            }
        }
    }
}
