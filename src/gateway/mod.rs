pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::wizard::{Connection, ConnectionKind, ConnectionSide, SyncObject, TestResult};

pub use simulated::SimulatedGateway;

pub const SAMPLE_SIZE_MIN: u32 = 10;
pub const SAMPLE_SIZE_MAX: u32 = 1000;

/// Collaborator-level errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote side could not complete the call
    Unavailable(String),

    /// The call was rejected before reaching the remote side
    InvalidRequest(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Unavailable(msg) => write!(f, "{}", msg),
            GatewayError::InvalidRequest(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Response of the object-listing collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectListing {
    pub success: bool,
    pub objects: Vec<SyncObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ObjectListing {
    pub fn ok(objects: Vec<SyncObject>) -> Self {
        Self {
            success: true,
            objects,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            objects: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Collapse into the shape the wizard consumes
    pub fn into_result(self) -> Result<Vec<SyncObject>, String> {
        if self.success {
            Ok(self.objects)
        } else {
            Err(self
                .error
                .unwrap_or_else(|| "Failed to load objects".to_string()))
        }
    }
}

/// Credentials for testing one side's connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub side: ConnectionSide,
    pub username: String,
    pub password: String,
    pub environment: ConnectionKind,
}

/// Check a sample size against the accepted range
pub fn check_sample_size(sample_size: u32) -> Result<u32, GatewayError> {
    if (SAMPLE_SIZE_MIN..=SAMPLE_SIZE_MAX).contains(&sample_size) {
        Ok(sample_size)
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "Sample size must be between {} and {}",
            SAMPLE_SIZE_MIN, SAMPLE_SIZE_MAX
        )))
    }
}

/// Remote capabilities the wizard depends on
///
/// Implementations are plain request/response calls. Keeping at most one
/// call in flight per action and discarding stale responses is the
/// caller's job.
#[async_trait]
pub trait SyncGateway: Send + Sync {
    async fn list_objects(&self, connection_id: &str) -> ObjectListing;

    async fn run_test(&self, sample_size: u32) -> Result<TestResult, GatewayError>;

    async fn test_connection(&self, request: &ConnectionRequest) -> Result<Connection, GatewayError>;
}
