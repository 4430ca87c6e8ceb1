use super::slots::{SlotGuard, SlotId, SlotTracker};
use crate::api::{ApiClient, ApiError};
use crate::models::{ChatMessage, QuestionType, QuizLevel};
use chrono::NaiveDate;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum AiKind {
    Chat,
    Explain,
    Summary,
    Questions,
    Plan,
}

/// One AI operation plus the payload its endpoint expects.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AiRequest {
    Chat {
        notebook_id: Option<String>,
        messages: Vec<ChatMessage>,
    },
    /// Sent to the chat endpoint as a single synthesized user turn.
    Explain {
        notebook_id: Option<String>,
        text: String,
    },
    Summary {
        notebook_id: Option<String>,
        text: String,
    },
    Questions {
        notebook_id: Option<String>,
        text: String,
        level: QuizLevel,
        qtype: QuestionType,
    },
    Plan {
        notebook_id: Option<String>,
        text: String,
        exam_date: Option<NaiveDate>,
    },
}

impl AiRequest {
    pub fn kind(&self) -> AiKind {
        match self {
            AiRequest::Chat { .. } => AiKind::Chat,
            AiRequest::Explain { .. } => AiKind::Explain,
            AiRequest::Summary { .. } => AiKind::Summary,
            AiRequest::Questions { .. } => AiKind::Questions,
            AiRequest::Plan { .. } => AiKind::Plan,
        }
    }
}

pub(crate) fn explain_prompt(content: &str) -> String {
    format!("Explain this content in simple terms:\n{content}")
}

#[derive(Clone, Debug, thiserror::Error)]
pub(crate) enum AiRequestError {
    /// The slot was released (sign-out) while the call was out. Callers
    /// drop the outcome without writing anything.
    #[error("{0} was released before the response arrived")]
    Stale(SlotId),
    #[error(transparent)]
    Request(#[from] ApiError),
}

/// Text shown in place of a result when a request on `slot` fails.
pub(crate) fn fallback_message(slot: SlotId) -> &'static str {
    match slot {
        SlotId::Chat => "Sorry, something went wrong with the AI request.",
        SlotId::EditorPanel => "AI request failed",
        SlotId::Planner => "Failed to generate study plan. Check the AI backend.",
        SlotId::QuizGenerator => "Failed to generate questions. Check the AI backend.",
    }
}

/// Routes [`AiRequest`]s through the gateway, one in-flight request per slot.
#[derive(Clone)]
pub(crate) struct AiDispatcher {
    api: ApiClient,
    slots: SlotTracker,
}

impl AiDispatcher {
    pub fn new(api: ApiClient, slots: SlotTracker) -> Self {
        Self { api, slots }
    }

    pub fn slots(&self) -> SlotTracker {
        self.slots
    }

    /// Synchronous half of a request. Controllers call this before touching
    /// their own state so a busy slot leaves everything unchanged. `None`
    /// means busy: the request is dropped, never queued.
    pub fn try_acquire(&self, slot: SlotId, kind: AiKind) -> Option<SlotGuard> {
        self.slots.try_begin(slot, kind)
    }

    /// Exactly one network call. The slot stays in flight until `guard` drops
    /// at the end of this future, on success, failure or cancellation.
    pub async fn run(&self, guard: SlotGuard, req: AiRequest) -> Result<String, AiRequestError> {
        let kind = req.kind();
        let slot = guard.slot();
        tracing::debug!(%slot, %kind, id = guard.id().0, "ai request started");

        let res = self.call(req).await;
        if !self.slots.is_current(slot, guard.id()) {
            tracing::debug!(%slot, %kind, "slot released mid-request; outcome dropped");
            return Err(AiRequestError::Stale(slot));
        }
        match &res {
            Ok(text) => tracing::debug!(%slot, %kind, len = text.len(), "ai request finished"),
            Err(e) => tracing::warn!(%slot, %kind, error = %e, "ai request failed"),
        }

        drop(guard);
        res.map_err(AiRequestError::from)
    }

    async fn call(&self, req: AiRequest) -> Result<String, ApiError> {
        match req {
            AiRequest::Chat {
                notebook_id,
                messages,
            } => self.api.ai_chat(notebook_id, messages).await,
            AiRequest::Explain { notebook_id, text } => {
                let messages = vec![ChatMessage::user(explain_prompt(&text))];
                self.api.ai_chat(notebook_id, messages).await
            }
            AiRequest::Summary { notebook_id, text } => self.api.ai_summary(notebook_id, text).await,
            AiRequest::Questions {
                notebook_id,
                text,
                level,
                qtype,
            } => self.api.ai_quiz(notebook_id, text, level, qtype).await,
            AiRequest::Plan {
                notebook_id,
                text,
                exam_date,
            } => self.api.ai_study_plan(notebook_id, text, exam_date).await,
        }
    }
}
