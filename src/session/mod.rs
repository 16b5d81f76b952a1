pub mod manager;
pub mod provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use manager::{SessionManager, SessionStatus, SESSION_EXPIRED_MESSAGE};
pub use provider::{AuthProvider, SimulatedAuthProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "System Administrator")]
    SystemAdministrator,
    #[serde(rename = "Integration Manager")]
    IntegrationManager,
    #[serde(rename = "Read-Only Auditor")]
    ReadOnlyAuditor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupData {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Submitted credentials failed form validation
    Validation(String),

    /// No active session
    NotAuthenticated,

    /// The auth provider rejected or failed the request
    Provider(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Validation(msg) => write!(f, "{}", msg),
            AuthError::NotAuthenticated => write!(f, "Please log in to continue"),
            AuthError::Provider(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for AuthError {}
