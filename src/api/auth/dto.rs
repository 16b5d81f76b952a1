use serde::Serialize;

use crate::session::{SessionStatus, User};

/// Current session as reported to the client
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: SessionStatus,
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
