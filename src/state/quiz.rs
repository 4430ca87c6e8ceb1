use super::dispatcher::{fallback_message, AiDispatcher, AiKind, AiRequest, AiRequestError};
use super::slots::SlotId;
use crate::models::{QuestionType, QuizLevel};
use crate::util::non_blank;
use leptos::prelude::*;
use std::future::Future;

/// Stand-alone question generation from a free-text topic.
#[derive(Clone)]
pub(crate) struct QuizController {
    dispatcher: AiDispatcher,
    /// Raw quiz text, rendered verbatim.
    pub result: RwSignal<String>,
}

impl QuizController {
    pub fn new(dispatcher: AiDispatcher) -> Self {
        Self {
            dispatcher,
            result: RwSignal::new(String::new()),
        }
    }

    /// Tracked.
    pub fn is_generating(&self) -> bool {
        self.dispatcher.slots().is_in_flight(SlotId::QuizGenerator)
    }

    pub fn generate(
        &self,
        topic: &str,
        level: QuizLevel,
        qtype: QuestionType,
        notebook_id: &str,
    ) -> impl Future<Output = ()> + 'static {
        let topic = topic.trim().to_string();
        let guard = if topic.is_empty() {
            None
        } else {
            self.dispatcher.try_acquire(SlotId::QuizGenerator, AiKind::Questions)
        };
        let notebook_id = non_blank(notebook_id);
        let this = self.clone();

        async move {
            let Some(guard) = guard else {
                return;
            };

            let req = AiRequest::Questions {
                notebook_id,
                text: topic,
                level,
                qtype,
            };
            let text = match this.dispatcher.run(guard, req).await {
                Ok(text) => text,
                Err(AiRequestError::Stale(_)) => return,
                Err(AiRequestError::Request(_)) => {
                    fallback_message(SlotId::QuizGenerator).to_string()
                }
            };
            this.result.set(text);
        }
    }

    pub fn reset(&self) {
        self.result.set(String::new());
    }
}
