use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use super::dto::SessionResponse;
use crate::api::error::ServiceError;
use crate::session::{
    AuthError, AuthProvider, SessionManager, SessionStatus, SignupData, User, SESSION_EXPIRED_MESSAGE,
};

/// Auth service wrapping the session manager and the auth provider
///
/// The manager lock is never held across a provider call.
pub struct AuthService {
    sessions: Mutex<SessionManager>,
    provider: Arc<dyn AuthProvider>,
}

impl AuthService {
    /// Create the service and resume any stored session
    pub fn new(mut sessions: SessionManager, provider: Arc<dyn AuthProvider>) -> Self {
        match sessions.initialize() {
            SessionStatus::Active => info!("Service: Resumed stored session"),
            SessionStatus::Expired => info!("Service: Stored session had expired"),
            SessionStatus::Anonymous => {}
        }
        Self {
            sessions: Mutex::new(sessions),
            provider,
        }
    }

    fn sessions(&self) -> MutexGuard<'_, SessionManager> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> SessionResponse {
        let sessions = self.sessions();
        SessionResponse {
            status: sessions.status(),
            user: sessions.user().cloned(),
            error: sessions.error().map(str::to_string),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<SessionResponse, ServiceError> {
        info!("Service: Login attempt for {}", email);
        self.sessions().check_login(email, password)?;

        let user = self.provider.authenticate(email, password).await;
        self.finish(user)
    }

    pub async fn signup(&self, data: SignupData) -> Result<SessionResponse, ServiceError> {
        info!("Service: Signup attempt for {}", data.email);
        self.sessions().check_signup(&data)?;

        let user = self.provider.register(&data).await;
        self.finish(user)
    }

    fn finish(&self, user: Result<User, AuthError>) -> Result<SessionResponse, ServiceError> {
        match user {
            Ok(user) => {
                self.sessions().establish(user);
                Ok(self.session())
            }
            Err(e) => {
                warn!("Service: Auth provider rejected request: {}", e);
                self.sessions().fail(&e);
                Err(e.into())
            }
        }
    }

    pub fn logout(&self) -> SessionResponse {
        self.sessions().logout();
        info!("Service: Logged out");
        self.session()
    }

    /// Require an active session and count the call as activity
    ///
    /// The inactivity timeout is checked before the activity is recorded.
    pub fn authorize(&self) -> Result<User, ServiceError> {
        let mut sessions = self.sessions();
        if sessions.tick() == SessionStatus::Expired {
            warn!("Service: Rejected request on an expired session");
            return Err(ServiceError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()));
        }
        let user = sessions.user().cloned().ok_or(AuthError::NotAuthenticated)?;
        sessions.touch();
        Ok(user)
    }

    /// Run the inactivity check once
    pub fn tick(&self) -> SessionStatus {
        self.sessions().tick()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::SimulatedAuthProvider;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn service(clock: Arc<ManualClock>) -> AuthService {
        let sessions = SessionManager::new(Arc::new(MemoryStore::new()), clock, Duration::minutes(30));
        let provider = Arc::new(SimulatedAuthProvider::new(std::time::Duration::ZERO));
        AuthService::new(sessions, provider)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()))
    }

    #[tokio::test]
    async fn login_establishes_session() {
        let auth = service(clock());
        assert!(matches!(auth.authorize(), Err(ServiceError::Unauthorized(_))));

        let session = auth.login("dev@example.com", "Password1!").await.unwrap();
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.user.unwrap().full_name, "dev");
        assert!(auth.authorize().is_ok());
    }

    #[tokio::test]
    async fn invalid_login_is_rejected_before_the_provider() {
        let auth = service(clock());
        let err = auth.login("dev@example.com", "short").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(auth.session().error.is_some());
    }

    #[tokio::test]
    async fn idle_session_expires_on_tick() {
        let clock = clock();
        let auth = service(clock.clone());
        auth.login("dev@example.com", "Password1!").await.unwrap();

        clock.advance(Duration::minutes(31));
        assert_eq!(auth.tick(), SessionStatus::Expired);

        let session = auth.session();
        assert_eq!(session.status, SessionStatus::Expired);
        assert!(session.user.is_none());
        assert_eq!(
            session.error.as_deref(),
            Some("Your session has expired. Please log in again.")
        );
    }

    #[tokio::test]
    async fn idle_session_is_not_revived_before_tick() {
        let clock = clock();
        let auth = service(clock.clone());
        auth.login("dev@example.com", "Password1!").await.unwrap();

        clock.advance(Duration::hours(5));
        match auth.authorize() {
            Err(ServiceError::Unauthorized(msg)) => assert_eq!(msg, SESSION_EXPIRED_MESSAGE),
            other => panic!("expected an expired session, got {:?}", other.map(|u| u.email)),
        }
        assert_eq!(auth.session().status, SessionStatus::Expired);
        assert_eq!(auth.tick(), SessionStatus::Anonymous);

        // Later requests see a plain missing session
        assert!(matches!(auth.authorize(), Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn activity_within_timeout_keeps_session_alive() {
        let clock = clock();
        let auth = service(clock.clone());
        auth.login("dev@example.com", "Password1!").await.unwrap();

        clock.advance(Duration::minutes(29));
        assert!(auth.authorize().is_ok());
        clock.advance(Duration::minutes(29));
        assert!(auth.authorize().is_ok());
        assert_eq!(auth.tick(), SessionStatus::Active);
    }
}
