use async_trait::async_trait;
use chrono::Utc;
use tokio::time::{sleep, Duration};
use tracing::info;

use super::{AuthError, SignupData, User, UserRole};

/// Backend that verifies credentials and creates accounts
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthError>;

    async fn register(&self, data: &SignupData) -> Result<User, AuthError>;
}

/// Accepts any well-formed credentials after a delay
pub struct SimulatedAuthProvider {
    latency: Duration,
}

impl SimulatedAuthProvider {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl AuthProvider for SimulatedAuthProvider {
    async fn authenticate(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        sleep(self.latency).await;

        let now = Utc::now();
        let full_name = email.split('@').next().unwrap_or(email).to_string();
        info!("Authenticated {}", email);
        Ok(User {
            id: format!("user_{}", now.timestamp_millis()),
            email: email.to_string(),
            full_name,
            role: UserRole::IntegrationManager,
            created_at: now,
        })
    }

    async fn register(&self, data: &SignupData) -> Result<User, AuthError> {
        // Sign-ups take a little longer than logins
        sleep(self.latency + self.latency / 2).await;

        let now = Utc::now();
        info!("Registered {}", data.email);
        Ok(User {
            id: format!("user_{}", now.timestamp_millis()),
            email: data.email.clone(),
            full_name: data.full_name.clone(),
            role: UserRole::IntegrationManager,
            created_at: now,
        })
    }
}
