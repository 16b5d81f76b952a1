use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::api::auth::AuthService;
use crate::session::SessionStatus;

/// Background worker that enforces the session inactivity timeout
pub struct SessionTicker {
    auth: Arc<AuthService>,
    interval: Duration,
}

impl SessionTicker {
    pub fn new(auth: Arc<AuthService>, interval: Duration) -> Self {
        Self { auth, interval }
    }

    /// Tick until the shutdown flag flips to true
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("Session ticker started, checking every {:?}", self.interval);

        loop {
            tokio::select! {
                _ = sleep(self.interval) => {
                    match self.auth.tick() {
                        SessionStatus::Expired => info!("Session ticker expired an idle session"),
                        status => debug!("Session ticker: {:?}", status),
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Session ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::{SessionManager, SimulatedAuthProvider};
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    #[tokio::test(start_paused = true)]
    async fn expires_idle_session_and_stops_on_shutdown() {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap()));
        let sessions = SessionManager::new(
            Arc::new(MemoryStore::new()),
            clock.clone(),
            chrono::Duration::minutes(30),
        );
        let auth = Arc::new(AuthService::new(
            sessions,
            Arc::new(SimulatedAuthProvider::new(Duration::ZERO)),
        ));
        auth.login("ops@example.com", "Password1!").await.unwrap();

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ticker = SessionTicker::new(auth.clone(), Duration::from_secs(60));
        let handle = tokio::spawn(async move { ticker.run(shutdown_rx).await });

        sleep(Duration::from_secs(61)).await;
        assert!(auth.authorize().is_ok());

        clock.advance(chrono::Duration::minutes(45));
        sleep(Duration::from_secs(60)).await;
        assert_eq!(auth.session().status, SessionStatus::Expired);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
