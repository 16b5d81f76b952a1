use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::time::{sleep, Duration};
use tracing::info;

use super::{check_sample_size, ConnectionRequest, GatewayError, ObjectListing, SyncGateway};
use crate::validation::rules::EMAIL_REGEX;
use crate::wizard::model::fallback_objects;
use crate::wizard::{Connection, ConnectionSide, SyncObject, TestResult};

/// Stand-in for the remote org API
///
/// Every call waits for the configured latency. Test runs fail a small,
/// random share of records, the way a real dry-run against live data does.
pub struct SimulatedGateway {
    latency: Duration,
    objects: Vec<SyncObject>,
}

impl SimulatedGateway {
    pub fn new(latency: Duration) -> Self {
        let mut objects = fallback_objects();
        objects.push(SyncObject {
            name: "Invoice__c".to_string(),
            label: "Invoice".to_string(),
            field_count: 18,
            description: Some("Custom invoice records".to_string()),
        });
        Self { latency, objects }
    }
}

#[async_trait]
impl SyncGateway for SimulatedGateway {
    async fn list_objects(&self, connection_id: &str) -> ObjectListing {
        sleep(self.latency).await;
        info!("Listed {} objects for connection {}", self.objects.len(), connection_id);
        ObjectListing::ok(self.objects.clone())
    }

    async fn run_test(&self, sample_size: u32) -> Result<TestResult, GatewayError> {
        let sample_size = check_sample_size(sample_size)?;
        sleep(self.latency).await;

        // Up to 5% of the sample fails
        let records_failed = rand::thread_rng().gen_range(0..=sample_size / 20);
        let errors = (0..records_failed.min(5))
            .map(|i| format!("Record {}: REQUIRED_FIELD_MISSING", i + 1))
            .collect();

        info!(
            "Test run processed {} records, {} failed",
            sample_size, records_failed
        );
        Ok(TestResult {
            sample_size,
            records_processed: sample_size,
            records_succeeded: sample_size - records_failed,
            records_failed,
            success: records_failed == 0,
            errors,
        })
    }

    async fn test_connection(&self, request: &ConnectionRequest) -> Result<Connection, GatewayError> {
        if !EMAIL_REGEX.is_match(&request.username) || request.password.is_empty() {
            return Err(GatewayError::InvalidRequest(
                "Invalid username or password".to_string(),
            ));
        }
        sleep(self.latency).await;

        let side = match request.side {
            ConnectionSide::Source => "source",
            ConnectionSide::Target => "target",
        };
        let suffix: u32 = rand::thread_rng().gen();
        Ok(Connection {
            id: format!("conn_{}_{:08x}", side, suffix),
            name: format!("{} ({:?})", request.username, request.environment),
            kind: request.environment,
            verified: true,
            last_tested: Utc::now(),
        })
    }
}
