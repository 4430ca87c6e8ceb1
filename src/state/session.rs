use crate::api::{self, ApiError, ApiErrorKind, Transport};
use crate::config::LOGIN_PATH;
use crate::models::{Session, SessionStatus, User};
use crate::routing::Navigator;
use crate::storage::{load_json_from_storage, save_json_to_storage, KeyValueStore, SESSION_KEY};
use leptos::prelude::*;
use std::sync::{Arc, Mutex};

type TeardownHook = Arc<dyn Fn() + Send + Sync>;

/// Login/signup failure, shown verbatim on the form.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub(crate) struct AuthError {
    pub message: String,
}

impl AuthError {
    /// Backend `detail` wins, then transport messages, then `fallback`.
    fn from_api(e: ApiError, fallback: &str) -> Self {
        let message = match (e.detail, e.kind) {
            (Some(detail), _) => detail,
            (None, ApiErrorKind::Network) => e.message,
            (None, _) => fallback.to_string(),
        };
        Self { message }
    }
}

/// Owns the token + identity. Everything else reads the session through here.
#[derive(Clone)]
pub(crate) struct SessionStore {
    session: RwSignal<Option<Session>>,

    /// Set once the login redirect for the current teardown has been issued;
    /// concurrent 401s after that are absorbed.
    redirected: RwSignal<bool>,

    /// Run after a signed-in session is cleared, whichever way it ended.
    teardown_hooks: Arc<Mutex<Vec<TeardownHook>>>,

    storage: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    transport: Arc<dyn Transport>,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            session: RwSignal::new(None),
            redirected: RwSignal::new(false),
            teardown_hooks: Arc::new(Mutex::new(vec![])),
            storage,
            navigator,
            transport,
        }
    }

    /// Rehydrate from durable storage. Missing or malformed data means
    /// anonymous; nothing is surfaced and nothing is written.
    pub fn restore(&self) {
        let stored = load_json_from_storage::<Session>(self.storage.as_ref(), SESSION_KEY)
            .filter(|s| !s.token.trim().is_empty());

        match &stored {
            Some(s) => tracing::info!(email = %s.user.email, "session restored"),
            None => tracing::debug!("no stored session"),
        }
        self.session.set(stored);
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        let res = api::login_request(self.transport.as_ref(), email, password)
            .await
            .map_err(|e| AuthError::from_api(e, "Login failed"))?;

        if res.access_token.trim().is_empty() {
            return Err(AuthError {
                message: "Login failed".to_string(),
            });
        }

        let session = Session {
            user: User {
                email: email.to_string(),
            },
            token: res.access_token,
        };
        save_json_to_storage(self.storage.as_ref(), SESSION_KEY, &session);
        self.session.set(Some(session.clone()));
        self.redirected.set(false);

        tracing::info!(email = %session.user.email, "signed in");
        Ok(session)
    }

    /// Register, then sign in with the same credentials. A login failure after
    /// a successful registration is what the caller sees.
    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        api::signup_request(self.transport.as_ref(), email.trim(), password)
            .await
            .map_err(|e| AuthError::from_api(e, "Signup failed"))?;
        tracing::info!(email = %email.trim(), "account registered");

        self.login(email, password).await
    }

    /// Registers `hook` to run whenever a signed-in session ends.
    pub fn on_teardown(&self, hook: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut hooks) = self.teardown_hooks.lock() {
            hooks.push(Arc::new(hook));
        }
    }

    /// Unconditional and idempotent.
    pub fn logout(&self) {
        let was_signed_in = self.session.with_untracked(|s| s.is_some());
        self.session.set(None);
        self.storage.remove_item(SESSION_KEY);
        if was_signed_in {
            tracing::info!("signed out");
            self.run_teardown_hooks();
        }
    }

    fn run_teardown_hooks(&self) {
        // Cloned out so a hook can register or log out without deadlocking.
        let hooks = self
            .teardown_hooks
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default();
        for hook in hooks {
            hook();
        }
    }

    /// Backend rejected the token: clear everything and route to login. Only
    /// the first call per teardown navigates.
    pub fn expire(&self) {
        self.logout();
        if self.redirected.get_untracked() {
            tracing::debug!("session already expired; redirect pending");
            return;
        }
        self.redirected.set(true);
        tracing::warn!("session rejected by backend; redirecting to login");
        self.navigator.go_to(LOGIN_PATH);
    }

    /// `Bearer <token>` while authenticated.
    pub fn auth_header(&self) -> Option<String> {
        self.session.with_untracked(|s| {
            s.as_ref()
                .filter(|s| !s.token.is_empty())
                .map(|s| api::bearer(&s.token))
        })
    }

    #[cfg(test)]
    pub fn session_untracked(&self) -> Option<Session> {
        self.session.get_untracked()
    }

    pub fn is_authenticated_untracked(&self) -> bool {
        self.session.with_untracked(|s| s.is_some())
    }

    /// Tracked: re-runs UI closures on login/logout.
    pub fn status(&self) -> SessionStatus {
        if self.session.with(|s| s.is_some()) {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    /// Tracked.
    pub fn identity(&self) -> Option<User> {
        self.session.with(|s| s.as_ref().map(|s| s.user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Failure, Harness};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_login_persists_record_and_header() {
        let h = Harness::new();
        h.backend.add_user("ada@example.com", "secret");

        let s = block_on(h.session.login("ada@example.com", "secret")).expect("login ok");
        assert_eq!(s.token, "token-ada@example.com");

        let stored: serde_json::Value = serde_json::from_str(
            &h.storage.get_item(SESSION_KEY).expect("session persisted"),
        )
        .expect("valid json");
        assert_eq!(
            stored,
            serde_json::json!({"user": {"email": "ada@example.com"}, "token": "token-ada@example.com"})
        );
        assert_eq!(
            h.session.auth_header().as_deref(),
            Some("Bearer token-ada@example.com")
        );
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
    }

    #[test]
    fn test_failed_login_surfaces_detail_and_keeps_prior_session() {
        let h = Harness::authed();
        let writes_before = h.storage.write_count();

        let err = block_on(h.session.login("u@example.com", "wrong")).expect_err("must fail");
        assert_eq!(err.message, "Invalid credentials");

        assert!(h.session.is_authenticated_untracked());
        assert_eq!(h.storage.write_count(), writes_before);
        assert!(h.navigator.visits().is_empty());
    }

    #[test]
    fn test_login_without_detail_uses_fallback() {
        let h = Harness::new();
        h.backend.fail("/auth/login", Failure::Status(500));

        let err = block_on(h.session.login("a@b.c", "pw")).expect_err("must fail");
        assert_eq!(err.message, "Login failed");
    }

    #[test]
    fn test_signup_then_login() {
        let h = Harness::new();
        let s = block_on(h.session.signup("new@example.com", "pw123456")).expect("signup ok");
        assert_eq!(s.user.email, "new@example.com");
        assert!(h.session.is_authenticated_untracked());
    }

    #[test]
    fn test_signup_duplicate_surfaces_detail() {
        let h = Harness::new();
        h.backend.add_user("dup@example.com", "pw");
        let err = block_on(h.session.signup("dup@example.com", "pw")).expect_err("must fail");
        assert_eq!(err.message, "Email already registered");
    }

    #[test]
    fn test_signup_login_failure_is_what_surfaces() {
        let h = Harness::new();
        h.backend.fail("/auth/login", Failure::Network);

        let err = block_on(h.session.signup("x@example.com", "pw")).expect_err("must fail");
        assert!(err.message.contains("network error"));
        assert!(!h.session.is_authenticated_untracked());
    }

    #[test]
    fn test_logout_twice_is_same_as_once() {
        let h = Harness::authed();
        h.session.logout();
        let after_once = (h.session.session_untracked(), h.storage.get_item(SESSION_KEY));
        h.session.logout();
        let after_twice = (h.session.session_untracked(), h.storage.get_item(SESSION_KEY));

        assert_eq!(after_once, (None, None));
        assert_eq!(after_once, after_twice);
        assert!(h.session.auth_header().is_none());
    }

    #[test]
    fn test_restore_reads_persisted_session() {
        let h = Harness::new();
        h.storage.set_item(
            SESSION_KEY,
            r#"{"user":{"email":"back@example.com"},"token":"t-1"}"#,
        );
        let writes = h.storage.write_count();

        h.session.restore();
        assert_eq!(
            h.session.identity().map(|u| u.email).as_deref(),
            Some("back@example.com")
        );
        assert_eq!(h.session.auth_header().as_deref(), Some("Bearer t-1"));
        assert_eq!(h.storage.write_count(), writes);
    }

    #[test]
    fn test_restore_malformed_or_empty_token_is_anonymous() {
        for raw in ["{broken", r#"{"user":{"email":"a"},"token":""}"#, r#"{"token":"t"}"#] {
            let h = Harness::new();
            h.storage.set_item(SESSION_KEY, raw);
            h.session.restore();
            assert_eq!(h.session.status(), SessionStatus::Anonymous, "input: {raw}");
        }
    }

    #[test]
    fn test_teardown_hooks_run_once_per_session_end() {
        let h = Harness::authed();
        let runs = Arc::new(Mutex::new(0));
        h.session.on_teardown({
            let runs = runs.clone();
            move || *runs.lock().expect("counter") += 1
        });

        h.session.logout();
        h.session.logout();
        assert_eq!(*runs.lock().expect("counter"), 1);

        block_on(h.session.login("u@example.com", "pw")).expect("login ok");
        h.session.expire();
        h.session.expire();
        assert_eq!(*runs.lock().expect("counter"), 2);
    }

    #[test]
    fn test_expire_redirects_once_until_next_login() {
        let h = Harness::authed();
        h.session.expire();
        h.session.expire();
        assert_eq!(h.navigator.visits(), vec![LOGIN_PATH.to_string()]);

        block_on(h.session.login("u@example.com", "pw")).expect("login ok");
        h.session.expire();
        assert_eq!(h.navigator.visits().len(), 2);
    }
}
