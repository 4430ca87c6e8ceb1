mod chat;
mod dispatcher;
mod notebooks;
mod planner;
mod quiz;
mod session;
mod slots;

pub(crate) use chat::QuickAction;
pub(crate) use notebooks::{NotebookRegistry, PanelAction};
pub(crate) use planner::{Difficulty, ExamInput, TargetGrade};
pub(crate) use session::SessionStore;
pub(crate) use slots::SlotId;

pub(crate) use dispatcher::AiDispatcher;

use chat::ChatController;
use planner::PlannerController;
use quiz::QuizController;
use slots::SlotTracker;

use crate::api::{ApiClient, ReqwestTransport, Transport};
use crate::config::EnvConfig;
use crate::routing::{Navigator, WindowNavigator};
use crate::storage::{BrowserStorage, KeyValueStore};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: EnvConfig,
    pub session: SessionStore,

    /// Shared by every AI control; one in-flight request per slot.
    pub slots: SlotTracker,

    pub notebooks: NotebookRegistry,
    pub chat: ChatController,
    pub planner: PlannerController,
    pub quiz: QuizController,
}

impl AppState {
    /// Browser wiring: `window.ENV`, `localStorage`, `window.location` and
    /// reqwest against the configured API.
    pub fn new() -> Self {
        let config = EnvConfig::new();
        let transport = Arc::new(ReqwestTransport::new(config.api_url.clone()));
        Self::with_ports(
            config,
            Arc::new(BrowserStorage),
            Arc::new(WindowNavigator),
            transport,
        )
    }

    /// Restores any persisted session before returning. Ending the session
    /// later (sign-out or a rejected token) runs
    /// [`AppState::reset_session_state`].
    pub fn with_ports(
        config: EnvConfig,
        storage: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn Navigator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let session = SessionStore::new(storage, navigator, transport.clone());
        session.restore();

        let api = ApiClient::new(transport, session.clone());
        let slots = SlotTracker::new();
        let dispatcher = AiDispatcher::new(api.clone(), slots);

        let state = Self {
            notebooks: NotebookRegistry::new(api, dispatcher.clone()),
            chat: ChatController::new(dispatcher.clone()),
            planner: PlannerController::new(dispatcher.clone()),
            quiz: QuizController::new(dispatcher),
            config,
            session,
            slots,
        };

        let on_teardown = state.clone();
        state
            .session
            .on_teardown(move || on_teardown.reset_session_state());
        state
    }

    /// Forgets everything the previous user loaded or asked for. In-flight AI
    /// requests lose their slots, so their results are dropped on arrival.
    pub fn reset_session_state(&self) {
        tracing::debug!("clearing per-session state");
        self.slots.release_all();
        self.notebooks.reset();
        self.chat.reset();
        self.planner.reset();
        self.quiz.reset();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, SESSION_KEY};
    use crate::testing::{FakeBackend, Harness, RecordingNavigator};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use leptos::prelude::{GetUntracked, WithUntracked};

    #[test]
    fn test_with_ports_restores_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(
            SESSION_KEY,
            r#"{"user":{"email":"r@example.com"},"token":"t"}"#,
        );

        let app = AppState::with_ports(
            EnvConfig::defaults(),
            storage,
            Arc::new(RecordingNavigator::default()),
            Arc::new(FakeBackend::new()),
        );
        assert!(app.session.is_authenticated_untracked());
        assert!(!app.slots.is_in_flight_untracked(SlotId::Chat));
    }

    #[test]
    fn test_sign_out_then_new_user_sees_only_their_own_state() {
        let h = Harness::authed();
        h.backend.seed_notebook("Secrets", Some("user A secret"));
        let app = &h.app;

        block_on(app.notebooks.list()).expect("list ok");
        block_on(app.chat.submit("hello"));
        block_on(app.quiz.generate("graphs", Default::default(), Default::default(), ""));
        assert_eq!(app.notebooks.editor.with_untracked(|e| e.content.clone()), "user A secret");

        app.session.logout();
        assert!(app.notebooks.active.get_untracked().is_none());
        assert!(app.notebooks.notebooks.get_untracked().is_empty());
        assert_eq!(app.notebooks.editor.get_untracked().notebook_id, None);
        assert!(app.chat.transcript.get_untracked().is_empty());
        assert_eq!(app.quiz.result.get_untracked(), "");

        h.backend.add_user("b@example.com", "pw");
        block_on(app.session.login("b@example.com", "pw")).expect("login ok");
        let mine = h.backend.seed_notebook("B notes", Some("user B notes"));
        block_on(app.notebooks.list()).expect("list ok");

        // The fake backend is shared, so B lists both; B's newest is selected.
        assert_eq!(app.notebooks.active.get_untracked(), Some(mine));
        assert_eq!(app.notebooks.editor.with_untracked(|e| e.content.clone()), "user B notes");
    }

    #[test]
    fn test_expired_session_drops_in_flight_chat_reply() {
        let h = Harness::authed();
        let gate = h.backend.gate("/ai/chat");
        let app = h.app.clone();

        let pending = app.chat.submit("before expiry");
        block_on(async {
            futures::join!(pending, async {
                app.session.expire();
                let _ = gate.send(());
            })
        });

        assert!(app.chat.transcript.get_untracked().is_empty());
        assert!(!app.slots.is_in_flight_untracked(SlotId::Chat));
        assert_eq!(h.navigator.visits(), vec![crate::config::LOGIN_PATH.to_string()]);
    }

    #[test]
    fn test_sign_out_clears_planner() {
        let h = Harness::authed();
        let today = chrono::NaiveDate::from_ymd_opt(2026, 3, 9).expect("date");
        let input = ExamInput {
            subject: "Networks".to_string(),
            exam_date: today + chrono::Days::new(4),
            difficulty: Difficulty::Easy,
            target_grade: TargetGrade::B,
            notebook_id: None,
        };
        block_on(h.app.planner.add_exam_on(input, today));
        assert_eq!(h.app.planner.countdown.get_untracked(), "Networks exam in 4 days");

        h.app.session.logout();
        assert_eq!(h.app.planner.countdown.get_untracked(), "");
        assert_eq!(h.app.planner.plan.get_untracked(), "");
    }
}
