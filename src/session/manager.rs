use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AuthError, SignupData, User};
use crate::clock::Clock;
use crate::storage::{KeyValueStore, LAST_ACTIVITY_KEY, SESSION_KEY};
use crate::validation::{auth_rules, login_rules, validate_form};

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Anonymous,
    Active,
    Expired,
}

/// Owns the authenticated user and enforces the inactivity timeout
///
/// Nothing here runs on its own: the host calls [`SessionManager::touch`]
/// on user activity and [`SessionManager::tick`] periodically.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    user: Option<User>,
    last_activity: Option<DateTime<Utc>>,
    error: Option<String>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
            user: None,
            last_activity: None,
            error: None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_authenticated() {
            SessionStatus::Active
        } else if self.error() == Some(SESSION_EXPIRED_MESSAGE) {
            SessionStatus::Expired
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Resume a stored session that has not timed out.
    ///
    /// Missing, expired or unreadable session data leaves the manager
    /// anonymous; the latter two also wipe the stored slots.
    pub fn initialize(&mut self) -> SessionStatus {
        let (session, last_activity) = match (self.read(SESSION_KEY), self.read(LAST_ACTIVITY_KEY)) {
            (Some(session), Some(last_activity)) => (session, last_activity),
            _ => return SessionStatus::Anonymous,
        };

        let user = serde_json::from_str::<User>(&session);
        let last_activity = last_activity
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

        match (user, last_activity) {
            (Ok(user), Some(last)) if self.clock.now() - last < self.timeout => {
                info!("Resumed session for {}", user.email);
                self.user = Some(user);
                self.touch();
                SessionStatus::Active
            }
            (Ok(_), Some(_)) => {
                info!("Stored session has expired");
                self.clear_session();
                SessionStatus::Expired
            }
            _ => {
                warn!("Discarding unreadable stored session");
                self.clear_session();
                SessionStatus::Anonymous
            }
        }
    }

    /// Check login credentials, recording the first failure as the error
    pub fn check_login(&mut self, email: &str, password: &str) -> Result<(), AuthError> {
        self.error = None;
        let data = [("email", email), ("password", password)];
        self.first_error(validate_form(&data[..], &login_rules()))
    }

    /// Check signup data, recording the first failure as the error
    pub fn check_signup(&mut self, data: &SignupData) -> Result<(), AuthError> {
        self.error = None;
        let fields = [
            ("fullName", data.full_name.as_str()),
            ("email", data.email.as_str()),
            ("password", data.password.as_str()),
            ("confirmPassword", data.confirm_password.as_str()),
        ];
        self.first_error(validate_form(&fields[..], &auth_rules()))
    }

    fn first_error(&mut self, errors: Vec<crate::validation::FieldError>) -> Result<(), AuthError> {
        match errors.into_iter().next() {
            Some(error) => {
                self.error = Some(error.message.clone());
                Err(AuthError::Validation(error.message))
            }
            None => Ok(()),
        }
    }

    /// Record a provider failure as the visible error
    pub fn fail(&mut self, error: &AuthError) {
        self.error = Some(error.to_string());
    }

    /// Make `user` the active session and persist it
    pub fn establish(&mut self, user: User) {
        match serde_json::to_string(&user) {
            Ok(encoded) => {
                if let Err(e) = self.store.set(SESSION_KEY, &encoded) {
                    warn!("Could not persist session: {}", e);
                }
            }
            Err(e) => warn!("Could not encode session: {}", e),
        }
        info!("Session established for {}", user.email);
        self.user = Some(user);
        self.error = None;
        self.touch();
    }

    /// Record user activity
    pub fn touch(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        let now = self.clock.now();
        self.last_activity = Some(now);
        if let Err(e) = self
            .store
            .set(LAST_ACTIVITY_KEY, &now.timestamp_millis().to_string())
        {
            warn!("Could not persist last activity: {}", e);
        }
    }

    /// Expire the session once the inactivity timeout has elapsed
    pub fn tick(&mut self) -> SessionStatus {
        let Some(last) = self.last_activity.filter(|_| self.is_authenticated()) else {
            return SessionStatus::Anonymous;
        };

        if self.clock.now() - last >= self.timeout {
            info!("Session expired after inactivity");
            self.logout();
            self.error = Some(SESSION_EXPIRED_MESSAGE.to_string());
            return SessionStatus::Expired;
        }
        debug!("Session still active");
        SessionStatus::Active
    }

    pub fn logout(&mut self) {
        self.clear_session();
        self.error = None;
    }

    fn clear_session(&mut self) {
        for key in [SESSION_KEY, LAST_ACTIVITY_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!("Could not clear {}: {}", key, e);
            }
        }
        self.user = None;
        self.last_activity = None;
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::session::UserRole;
    use crate::storage::MemoryStore;

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                clock: Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap())),
            }
        }

        fn manager(&self) -> SessionManager {
            SessionManager::new(self.store.clone(), self.clock.clone(), Duration::minutes(30))
        }
    }

    fn user() -> User {
        User {
            id: "user_1".to_string(),
            email: "ops@example.com".to_string(),
            full_name: "ops".to_string(),
            role: UserRole::IntegrationManager,
            created_at: Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn login_validation_reports_first_failure() {
        let mut sessions = Fixture::new().manager();
        let err = sessions.check_login("nope", "weak").unwrap_err();
        assert_eq!(err, AuthError::Validation("Please enter a valid email address".into()));
        assert_eq!(sessions.error(), Some("Please enter a valid email address"));

        assert!(sessions.check_login("ops@example.com", "Password1!").is_ok());
        assert!(sessions.error().is_none());
    }

    #[test]
    fn signup_checks_confirmation_and_name() {
        let mut sessions = Fixture::new().manager();
        let mut data = SignupData {
            full_name: "Ops Team".to_string(),
            email: "ops@example.com".to_string(),
            password: "Password1!".to_string(),
            confirm_password: "Password2!".to_string(),
        };
        assert_eq!(
            sessions.check_signup(&data),
            Err(AuthError::Validation("Passwords must match".into()))
        );

        data.confirm_password = data.password.clone();
        data.full_name = "O".to_string();
        assert_eq!(
            sessions.check_signup(&data),
            Err(AuthError::Validation("Full name is required (2-50 characters)".into()))
        );
    }

    #[test]
    fn stored_session_resumes_within_timeout() {
        let fixture = Fixture::new();
        fixture.manager().establish(user());

        fixture.clock.advance(Duration::minutes(29));
        let mut resumed = fixture.manager();
        assert_eq!(resumed.initialize(), SessionStatus::Active);
        assert_eq!(resumed.user(), Some(&user()));
    }

    #[test]
    fn stored_session_expires_after_timeout() {
        let fixture = Fixture::new();
        fixture.manager().establish(user());

        fixture.clock.advance(Duration::minutes(30));
        let mut resumed = fixture.manager();
        assert_eq!(resumed.initialize(), SessionStatus::Expired);
        assert!(!resumed.is_authenticated());
        assert!(fixture.store.get(SESSION_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_session_is_treated_as_absent() {
        let fixture = Fixture::new();
        fixture.store.set(SESSION_KEY, "{oops").unwrap();
        fixture.store.set(LAST_ACTIVITY_KEY, "123").unwrap();

        let mut sessions = fixture.manager();
        assert_eq!(sessions.initialize(), SessionStatus::Anonymous);
        assert!(sessions.error().is_none());
        assert!(fixture.store.get(LAST_ACTIVITY_KEY).unwrap().is_none());
    }

    #[test]
    fn tick_expires_idle_sessions_and_touch_extends_them() {
        let fixture = Fixture::new();
        let mut sessions = fixture.manager();
        assert_eq!(sessions.tick(), SessionStatus::Anonymous);

        sessions.establish(user());
        fixture.clock.advance(Duration::minutes(20));
        assert_eq!(sessions.tick(), SessionStatus::Active);

        sessions.touch();
        fixture.clock.advance(Duration::minutes(20));
        assert_eq!(sessions.tick(), SessionStatus::Active);

        fixture.clock.advance(Duration::minutes(10));
        assert_eq!(sessions.tick(), SessionStatus::Expired);
        assert!(!sessions.is_authenticated());
        assert_eq!(sessions.error(), Some(SESSION_EXPIRED_MESSAGE));
        assert_eq!(sessions.status(), SessionStatus::Expired);

        sessions.clear_error();
        assert_eq!(sessions.status(), SessionStatus::Anonymous);
    }

    #[test]
    fn logout_clears_slots_and_error() {
        let fixture = Fixture::new();
        let mut sessions = fixture.manager();
        sessions.establish(user());
        sessions.fail(&AuthError::Provider("boom".into()));
        sessions.logout();

        assert!(!sessions.is_authenticated());
        assert!(sessions.error().is_none());
        assert!(fixture.store.get(SESSION_KEY).unwrap().is_none());
        assert!(fixture.store.get(LAST_ACTIVITY_KEY).unwrap().is_none());
    }
}
