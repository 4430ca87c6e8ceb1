use super::dispatcher::{fallback_message, AiDispatcher, AiKind, AiRequest, AiRequestError};
use super::slots::SlotId;
use crate::api::{ApiClient, ApiError, UploadFile};
use crate::models::{Notebook, QuestionType, QuizLevel};
use leptos::prelude::*;
use std::future::Future;
use strum::IntoEnumIterator;

/// The edit buffer. `notebook_id` is the notebook whose note was last loaded
/// into it; saves and uploads target that id, not whatever is highlighted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct EditorState {
    pub notebook_id: Option<String>,
    pub title: String,
    pub content: String,
    pub ai_result: String,
}

impl EditorState {
    fn bound_to(nb: &Notebook, content: String, ai_result: String) -> Self {
        Self {
            notebook_id: Some(nb.id.clone()),
            title: nb.title.clone(),
            content,
            ai_result,
        }
    }

    fn is_bound_to(&self, notebook_id: &str) -> bool {
        self.notebook_id.as_deref() == Some(notebook_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum PanelAction {
    Summary,
    Explain,
    Questions,
}

impl PanelAction {
    pub fn label(self) -> &'static str {
        match self {
            PanelAction::Summary => "Summarize",
            PanelAction::Explain => "Explain simply",
            PanelAction::Questions => "Generate questions",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            PanelAction::Summary => "Summarizing...",
            PanelAction::Explain => "Explaining...",
            PanelAction::Questions => "Generating...",
        }
    }

    pub fn kind(self) -> AiKind {
        match self {
            PanelAction::Summary => AiKind::Summary,
            PanelAction::Explain => AiKind::Explain,
            PanelAction::Questions => AiKind::Questions,
        }
    }

    fn request(self, notebook_id: String, text: String) -> AiRequest {
        let notebook_id = Some(notebook_id);
        match self {
            PanelAction::Summary => AiRequest::Summary { notebook_id, text },
            PanelAction::Explain => AiRequest::Explain { notebook_id, text },
            PanelAction::Questions => AiRequest::Questions {
                notebook_id,
                text,
                level: QuizLevel::Medium,
                qtype: QuestionType::Mix,
            },
        }
    }
}

/// Create/save/upload failures. The edit buffer is never touched on error.
#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum PersistenceError {
    #[error("Failed to create notebook")]
    Create(#[source] ApiError),
    #[error("Failed to save note")]
    Title(#[source] ApiError),
    #[error("Failed to save note")]
    Content(#[source] ApiError),
    #[error("Upload failed")]
    Upload(#[source] ApiError),
    #[error("A save is already in progress")]
    SaveInFlight,
    #[error("No notebook selected")]
    NoActiveNotebook,
}

impl PersistenceError {
    fn api_error(&self) -> Option<&ApiError> {
        match self {
            PersistenceError::Create(e)
            | PersistenceError::Title(e)
            | PersistenceError::Content(e)
            | PersistenceError::Upload(e) => Some(e),
            PersistenceError::SaveInFlight | PersistenceError::NoActiveNotebook => None,
        }
    }
}

/// Notebook list, active selection and the editor buffer.
#[derive(Clone)]
pub(crate) struct NotebookRegistry {
    api: ApiClient,
    dispatcher: AiDispatcher,

    pub notebooks: RwSignal<Vec<Notebook>>,
    pub active: RwSignal<Option<Notebook>>,
    pub editor: RwSignal<EditorState>,

    /// Bumped on every selection; a note fetch only lands if it still matches.
    select_seq: RwSignal<u64>,
    /// Bumped when the session ends; list and create results from before
    /// that are dropped.
    epoch: RwSignal<u64>,

    pub list_loading: RwSignal<bool>,
    pub note_loading: RwSignal<bool>,
    pub saving: RwSignal<bool>,
    pub uploading: RwSignal<bool>,

    /// Blocking notification for the notes page.
    pub notice: RwSignal<Option<String>>,
}

impl NotebookRegistry {
    pub fn new(api: ApiClient, dispatcher: AiDispatcher) -> Self {
        Self {
            api,
            dispatcher,
            notebooks: RwSignal::new(vec![]),
            active: RwSignal::new(None),
            editor: RwSignal::new(EditorState::default()),
            select_seq: RwSignal::new(0),
            epoch: RwSignal::new(0),
            list_loading: RwSignal::new(false),
            note_loading: RwSignal::new(false),
            saving: RwSignal::new(false),
            uploading: RwSignal::new(false),
            notice: RwSignal::new(None),
        }
    }

    fn notify(&self, message: impl Into<String>) {
        self.notice.set(Some(message.into()));
    }

    /// Logs and surfaces `e`. An expired session is handled globally and
    /// gets no notification of its own.
    fn report(&self, e: PersistenceError) -> PersistenceError {
        match e.api_error() {
            Some(api) if api.is_unauthorized() => {}
            Some(api) => {
                tracing::warn!(error = %api, status = ?api.status, "{e}");
                self.notify(e.to_string());
            }
            None => {
                tracing::debug!("{e}");
                self.notify(e.to_string());
            }
        }
        e
    }

    /// Replaces the local list with the backend's. Selects the first notebook
    /// when nothing is active yet.
    pub async fn list(&self) -> Result<(), ApiError> {
        let epoch = self.epoch.get_untracked();
        self.list_loading.set(true);
        let res = self.api.list_notebooks().await;
        if self.epoch.get_untracked() != epoch {
            tracing::debug!("session ended during list; result dropped");
            return res.map(|_| ());
        }
        self.list_loading.set(false);

        let list = match res {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load notebooks");
                if !e.is_unauthorized() {
                    self.notify("Failed to load notebooks");
                }
                return Err(e);
            }
        };

        tracing::debug!(count = list.len(), "notebooks loaded");
        let first = list.first().cloned();
        self.notebooks.set(list);

        if self.active.with_untracked(|a| a.is_none()) {
            if let Some(nb) = first {
                self.select(nb).await;
            }
        }
        Ok(())
    }

    /// Creates a notebook, puts it first and makes it active with an empty
    /// editor.
    pub async fn create(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Notebook, PersistenceError> {
        let epoch = self.epoch.get_untracked();
        let nb = self
            .api
            .create_notebook(title, description)
            .await
            .map_err(|e| self.report(PersistenceError::Create(e)))?;
        if self.epoch.get_untracked() != epoch {
            tracing::debug!(id = %nb.id, "session ended during create; not shown");
            return Ok(nb);
        }

        tracing::info!(id = %nb.id, "notebook created");
        self.notebooks.update(|list| list.insert(0, nb.clone()));

        // Invalidate any selection fetch still in flight.
        self.select_seq.update(|s| *s = s.saturating_add(1));
        self.note_loading.set(false);
        self.active.set(Some(nb.clone()));
        self.editor
            .set(EditorState::bound_to(&nb, String::new(), String::new()));

        Ok(nb)
    }

    /// Marks `nb` active now and loads its note when the returned future runs.
    /// Only the latest selection's fetch is applied.
    pub fn select(&self, nb: Notebook) -> impl Future<Output = ()> + 'static {
        let seq = self.select_seq.get_untracked().saturating_add(1);
        self.select_seq.set(seq);
        self.active.set(Some(nb.clone()));
        self.note_loading.set(true);

        let this = self.clone();
        async move {
            let res = this.api.get_note(&nb.id).await;

            if this.select_seq.get_untracked() != seq {
                tracing::debug!(id = %nb.id, "discarding stale note fetch");
                return;
            }
            this.note_loading.set(false);

            match res {
                Ok(note) => {
                    let (content, ai_result) = note
                        .map(|n| (n.content, n.ai_summary.unwrap_or_default()))
                        .unwrap_or_default();
                    this.editor
                        .set(EditorState::bound_to(&nb, content, ai_result));
                }
                Err(e) => {
                    tracing::warn!(id = %nb.id, error = %e, "failed to load note");
                    if !e.is_unauthorized() {
                        this.notify("Failed to load note");
                    }
                }
            }
        }
    }

    pub fn set_title(&self, title: String) {
        self.editor.update(|e| e.title = title);
    }

    pub fn set_content(&self, content: String) {
        self.editor.update(|e| e.content = content);
    }

    /// Title request (when the title changed) then content save, in that order.
    /// The target and the text are captured when this is called.
    pub fn save_active(&self) -> impl Future<Output = Result<(), PersistenceError>> + 'static {
        let snapshot = self.editor.get_untracked();
        let this = self.clone();
        async move {
            let Some(id) = snapshot.notebook_id.clone() else {
                return Err(this.report(PersistenceError::NoActiveNotebook));
            };
            if this.saving.get_untracked() {
                return Err(this.report(PersistenceError::SaveInFlight));
            }

            this.saving.set(true);
            let res = this.persist(&id, &snapshot).await;
            this.saving.set(false);

            match res {
                Ok(()) => {
                    tracing::info!(%id, "note saved");
                    Ok(())
                }
                Err(e) => Err(this.report(e)),
            }
        }
    }

    async fn persist(&self, id: &str, snapshot: &EditorState) -> Result<(), PersistenceError> {
        let stored = self
            .notebooks
            .with_untracked(|list| list.iter().find(|n| n.id == id).cloned());

        if let Some(nb) = stored.filter(|nb| nb.title != snapshot.title) {
            self.api
                .create_notebook(&snapshot.title, nb.description.as_deref())
                .await
                .map_err(PersistenceError::Title)?;
            self.rename_local(id, &snapshot.title);
        }

        self.api
            .save_note(id, &snapshot.content)
            .await
            .map_err(PersistenceError::Content)
    }

    fn rename_local(&self, id: &str, title: &str) {
        self.notebooks.update(|list| {
            if let Some(nb) = list.iter_mut().find(|n| n.id == id) {
                nb.title = title.to_string();
            }
        });
        self.active.update(|active| {
            if let Some(nb) = active.as_mut().filter(|nb| nb.id == id) {
                nb.title = title.to_string();
            }
        });
    }

    /// Uploads `file` for the loaded notebook and appends the extracted text to
    /// its buffer. Dropped if another notebook was loaded meanwhile.
    pub fn upload(&self, file: UploadFile) -> impl Future<Output = Result<(), PersistenceError>> + 'static {
        let target = self.editor.with_untracked(|e| e.notebook_id.clone());
        let this = self.clone();
        async move {
            let Some(id) = target else {
                return Err(this.report(PersistenceError::NoActiveNotebook));
            };

            this.uploading.set(true);
            let res = this.api.upload(&id, file).await;
            this.uploading.set(false);

            let text = res.map_err(|e| this.report(PersistenceError::Upload(e)))?;
            let applied = this.editor.try_update(|e| {
                if e.is_bound_to(&id) {
                    e.content.push_str("\n\n");
                    e.content.push_str(&text);
                    true
                } else {
                    false
                }
            });
            if applied != Some(true) {
                tracing::debug!(%id, "notebook switched during upload; text dropped");
            }
            Ok(())
        }
    }

    /// Tracked.
    pub fn panel_busy(&self) -> bool {
        self.dispatcher.slots().is_in_flight(SlotId::EditorPanel)
    }

    /// Tracked. The panel action currently running, if any.
    pub fn panel_running(&self) -> Option<PanelAction> {
        let kind = self.dispatcher.slots().in_flight_kind(SlotId::EditorPanel)?;
        PanelAction::iter().find(|a| a.kind() == kind)
    }

    /// Drops everything loaded for the previous session. In-flight note
    /// fetches, lists and creates are invalidated; uploads and panel results
    /// find the editor unbound and are dropped too.
    pub fn reset(&self) {
        self.epoch.update(|e| *e = e.saturating_add(1));
        self.select_seq.update(|s| *s = s.saturating_add(1));
        self.notebooks.set(vec![]);
        self.active.set(None);
        self.editor.set(EditorState::default());
        self.list_loading.set(false);
        self.note_loading.set(false);
        self.saving.set(false);
        self.uploading.set(false);
        self.notice.set(None);
    }

    /// Runs `action` on the loaded note. Ignored while the panel slot is busy.
    pub fn run_panel_action(&self, action: PanelAction) -> impl Future<Output = ()> + 'static {
        let snapshot = self.editor.get_untracked();
        let guard = match snapshot.notebook_id {
            Some(_) => self.dispatcher.try_acquire(SlotId::EditorPanel, action.kind()),
            None => None,
        };
        let this = self.clone();
        async move {
            let (Some(id), Some(guard)) = (snapshot.notebook_id, guard) else {
                return;
            };

            let req = action.request(id.clone(), snapshot.content);
            let text = match this.dispatcher.run(guard, req).await {
                Ok(text) => text,
                Err(AiRequestError::Stale(_)) => return,
                Err(AiRequestError::Request(_)) => fallback_message(SlotId::EditorPanel).to_string(),
            };

            this.editor.update(|e| {
                if e.is_bound_to(&id) {
                    e.ai_result = text;
                } else {
                    tracing::debug!(%id, %action, "notebook switched; panel result dropped");
                }
            });
        }
    }
}
