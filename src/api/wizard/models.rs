use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::gateway::ConnectionRequest;
use crate::wizard::{ConnectionKind, ConnectionSide, FieldMapping, JobSchedule, ScheduleFrequency};

/// Partial update of the details step; absent fields are left unchanged
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct DetailsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ConnectionTestRequest {
    pub side: ConnectionSide,
    #[validate(email(message = "Please enter a valid email address"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub environment: ConnectionKind,
}

impl From<ConnectionTestRequest> for ConnectionRequest {
    fn from(req: ConnectionTestRequest) -> Self {
        ConnectionRequest {
            side: req.side,
            username: req.username,
            password: req.password,
            environment: req.environment,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ObjectSearchQuery {
    #[validate(length(max = 100, message = "Search term is too long"))]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SelectObjectRequest {
    pub object: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct MappingsRequest {
    #[validate(length(max = 500, message = "At most 500 field mappings are allowed"))]
    pub mappings: Vec<FieldMapping>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct TestRunRequest {
    #[validate(range(min = 10, max = 1000, message = "Sample size must be between 10 and 1000"))]
    pub sample_size: u32,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ScheduleRequest {
    pub frequency: ScheduleFrequency,
    pub start_at: Option<DateTime<Utc>>,
}

impl From<ScheduleRequest> for JobSchedule {
    fn from(req: ScheduleRequest) -> Self {
        JobSchedule {
            frequency: req.frequency,
            start_at: req.start_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_size_range_is_enforced() {
        assert!(TestRunRequest { sample_size: 10 }.validate().is_ok());
        assert!(TestRunRequest { sample_size: 1000 }.validate().is_ok());

        let errors = TestRunRequest { sample_size: 9 }.validate().unwrap_err();
        let messages = crate::api::validation::field_messages(&errors);
        assert_eq!(
            messages["sample_size"]["errors"][0],
            "Sample size must be between 10 and 1000"
        );
    }

    #[test]
    fn connection_test_needs_email_username() {
        let req = ConnectionTestRequest {
            side: ConnectionSide::Target,
            username: "admin".to_string(),
            password: "secret".to_string(),
            environment: ConnectionKind::Sandbox,
        };
        assert!(req.validate().is_err());
    }
}
