//! In-process fakes for the ports: a scripted backend, a recording navigator
//! and the wiring that puts them behind a real [`AppState`].

use crate::api::{ApiClient, HttpRequest, HttpResponse, Transport, TransportError};
use crate::api::transport::RequestBody;
use crate::config::EnvConfig;
use crate::models::{Note, Notebook};
use crate::routing::Navigator;
use crate::state::{AiDispatcher, AppState, SessionStore};
use crate::storage::MemoryStorage;
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::block_on;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Failure {
    Status(u16),
    Network,
}

#[derive(Default)]
struct FakeState {
    users: HashMap<String, String>,
    notebooks: Vec<Notebook>,
    notes: HashMap<String, Note>,
    next_id: u64,
    requests: Vec<HttpRequest>,
    failures: HashMap<String, Failure>,
    gates: HashMap<String, VecDeque<oneshot::Receiver<()>>>,
}

/// Scripted stand-in for the study backend. Responses are computed when the
/// request is released, so a gated request sees state written meanwhile.
#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.to_string(),
    }
}

fn status(code: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status: code,
        body: body.to_string(),
    }
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .unwrap_or_default()
        .to_string()
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let mut st = self.state.lock().expect("fake backend lock poisoned");
        f(&mut st)
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.with_state(|st| {
            st.users.insert(email.to_string(), password.to_string());
        });
    }

    /// Adds a notebook as the newest one, optionally with a note.
    pub fn seed_notebook(&self, title: &str, content: Option<&str>) -> Notebook {
        self.with_state(|st| {
            st.next_id += 1;
            let nb = Notebook {
                id: format!("nb-{}", st.next_id),
                title: title.to_string(),
                description: None,
            };
            st.notebooks.insert(0, nb.clone());
            if let Some(c) = content {
                st.notes.insert(
                    nb.id.clone(),
                    Note {
                        notebook_id: nb.id.clone(),
                        content: c.to_string(),
                        ai_summary: None,
                    },
                );
            }
            nb
        })
    }

    pub fn note_content(&self, notebook_id: &str) -> Option<String> {
        self.with_state(|st| st.notes.get(notebook_id).map(|n| n.content.clone()))
    }

    pub fn notebook_titles(&self) -> Vec<String> {
        self.with_state(|st| st.notebooks.iter().map(|n| n.title.clone()).collect())
    }

    pub fn fail(&self, path: &str, failure: Failure) {
        self.with_state(|st| {
            st.failures.insert(path.to_string(), failure);
        });
    }

    pub fn recover(&self, path: &str) {
        self.with_state(|st| {
            st.failures.remove(path);
        });
    }

    /// Holds the next request to `path` until the returned sender fires (or
    /// is dropped).
    pub fn gate(&self, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.with_state(|st| st.gates.entry(path.to_string()).or_default().push_back(rx));
        tx
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.with_state(|st| st.requests.clone())
    }

    pub fn count(&self, path: &str) -> usize {
        self.with_state(|st| st.requests.iter().filter(|r| r.path == path).count())
    }

    fn respond(&self, req: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.with_state(|st| {
            match st.failures.get(&req.path) {
                Some(Failure::Network) => {
                    return Err(TransportError::Network("connection refused".to_string()))
                }
                Some(Failure::Status(code)) => {
                    return Ok(HttpResponse {
                        status: *code,
                        body: "error".to_string(),
                    })
                }
                None => {}
            }

            let body = match &req.body {
                RequestBody::Json(v) => v.clone(),
                _ => Value::Null,
            };

            let res = match (req.method.as_str(), req.path.as_str()) {
                ("POST", "/auth/signup") => {
                    let email = str_field(&body, "email");
                    if st.users.contains_key(&email) {
                        status(400, json!({"detail": "Email already registered"}))
                    } else {
                        st.users.insert(email.clone(), str_field(&body, "password"));
                        ok(json!({"id": format!("u-{}", st.users.len()), "email": email}))
                    }
                }
                ("POST", "/auth/login") => {
                    let email = str_field(&body, "email");
                    let password = str_field(&body, "password");
                    if st.users.get(&email) == Some(&password) {
                        ok(json!({"access_token": format!("token-{email}"), "token_type": "bearer"}))
                    } else {
                        status(401, json!({"detail": "Invalid credentials"}))
                    }
                }
                ("GET", "/notebooks/list") => ok(json!(st.notebooks)),
                ("POST", "/notebooks/create") => {
                    st.next_id += 1;
                    let nb = Notebook {
                        id: format!("nb-{}", st.next_id),
                        title: str_field(&body, "title"),
                        description: body
                            .get("description")
                            .and_then(|d| d.as_str())
                            .map(|d| d.to_string()),
                    };
                    st.notebooks.insert(0, nb.clone());
                    ok(json!({
                        "id": nb.id,
                        "user_id": "u-1",
                        "title": nb.title,
                        "description": nb.description,
                        "created_at": "2026-01-01T00:00:00"
                    }))
                }
                ("GET", path) if path.starts_with("/notebooks/notes/") => {
                    let raw = &path["/notebooks/notes/".len()..];
                    let id = urlencoding::decode(raw)
                        .map(|c| c.into_owned())
                        .unwrap_or_default();
                    if !st.notebooks.iter().any(|n| n.id == id) {
                        status(404, json!({"detail": "Notebook not found"}))
                    } else {
                        match st.notes.get(&id) {
                            Some(n) => ok(json!(n)),
                            None => ok(Value::Null),
                        }
                    }
                }
                ("POST", "/notebooks/notes") => {
                    let id = str_field(&body, "notebook_id");
                    if !st.notebooks.iter().any(|n| n.id == id) {
                        status(404, json!({"detail": "Notebook not found"}))
                    } else {
                        let note = Note {
                            notebook_id: id.clone(),
                            content: str_field(&body, "content"),
                            ai_summary: None,
                        };
                        st.notes.insert(id, note.clone());
                        ok(json!(note))
                    }
                }
                ("POST", "/upload") => match &req.body {
                    RequestBody::Multipart { file, fields } => {
                        let has_notebook = fields.iter().any(|(k, v)| k == "notebook_id" && !v.is_empty());
                        if has_notebook {
                            ok(json!({"extracted_text": format!("text of {}", file.file_name)}))
                        } else {
                            status(422, json!({"detail": "notebook_id required"}))
                        }
                    }
                    _ => status(422, json!({"detail": "multipart body required"})),
                },
                ("POST", "/ai/chat") => {
                    let last = body
                        .get("messages")
                        .and_then(|m| m.as_array())
                        .and_then(|m| m.last())
                        .map(|m| str_field(m, "content"))
                        .unwrap_or_default();
                    ok(json!({"answer": format!("answer to: {last}")}))
                }
                ("POST", "/ai/summary") => {
                    ok(json!({"summary": format!("summary of: {}", str_field(&body, "text"))}))
                }
                ("POST", "/ai/quiz") => ok(json!({
                    "quiz_raw": format!(
                        "{}/{} quiz on: {}",
                        str_field(&body, "level"),
                        str_field(&body, "qtype"),
                        str_field(&body, "text")
                    )
                })),
                ("POST", "/ai/study-plan") => ok(json!({
                    "plan_raw": format!(
                        "plan until {}: {}",
                        str_field(&body, "exam_date"),
                        str_field(&body, "text")
                    )
                })),
                _ => status(404, json!({"detail": "Not Found"})),
            };
            Ok(res)
        })
    }
}

#[async_trait(?Send)]
impl Transport for FakeBackend {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let gate = self.with_state(|st| {
            st.requests.push(req.clone());
            st.gates.get_mut(&req.path).and_then(|q| q.pop_front())
        });
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.respond(&req)
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        if let Ok(mut v) = self.visits.lock() {
            v.push(path.to_string());
        }
    }
}

pub(crate) struct Harness {
    pub backend: Arc<FakeBackend>,
    pub storage: Arc<MemoryStorage>,
    pub navigator: Arc<RecordingNavigator>,
    pub app: AppState,
    pub session: SessionStore,
    /// Same transport and session as the app's own client.
    pub api: ApiClient,
    /// Shares the app's slot tracker.
    pub dispatcher: AiDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        let backend = Arc::new(FakeBackend::new());
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RecordingNavigator::default());

        let app = AppState::with_ports(
            EnvConfig::defaults(),
            storage.clone(),
            navigator.clone(),
            backend.clone(),
        );

        let api = ApiClient::new(backend.clone(), app.session.clone());
        let dispatcher = AiDispatcher::new(api.clone(), app.slots);

        Self {
            session: app.session.clone(),
            api,
            dispatcher,
            app,
            backend,
            storage,
            navigator,
        }
    }

    /// Signed in as `u@example.com`.
    pub fn authed() -> Self {
        let h = Self::new();
        h.backend.add_user("u@example.com", "pw");
        block_on(h.session.login("u@example.com", "pw")).expect("harness login should succeed");
        h
    }
}
