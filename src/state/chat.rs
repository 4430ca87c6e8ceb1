use super::dispatcher::{fallback_message, AiDispatcher, AiKind, AiRequest, AiRequestError};
use super::slots::SlotId;
use crate::models::ChatMessage;
use crate::util::non_blank;
use leptos::prelude::*;
use std::future::Future;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum QuickAction {
    Mcq,
    Summary,
    Plan,
}

impl QuickAction {
    pub fn label(self) -> &'static str {
        match self {
            QuickAction::Mcq => "Generate 100 MCQs",
            QuickAction::Summary => "Create summary",
            QuickAction::Plan => "Make study plan",
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            QuickAction::Mcq => "Generate 100 multiple-choice questions from my current notebook.",
            QuickAction::Summary => "Create a concise exam summary for this notebook.",
            QuickAction::Plan => "Make a day-by-day study plan for this exam.",
        }
    }
}

/// Session-only transcript. Turns are appended, never edited.
#[derive(Clone)]
pub(crate) struct ChatController {
    dispatcher: AiDispatcher,
    pub transcript: RwSignal<Vec<ChatMessage>>,
    /// Optional notebook the answers should draw on.
    pub notebook_id: RwSignal<String>,
}

impl ChatController {
    pub fn new(dispatcher: AiDispatcher) -> Self {
        Self {
            dispatcher,
            transcript: RwSignal::new(vec![]),
            notebook_id: RwSignal::new(String::new()),
        }
    }

    /// Tracked.
    pub fn is_sending(&self) -> bool {
        self.dispatcher.slots().is_in_flight(SlotId::Chat)
    }

    /// Appends the user turn right away, then the answer (or a fixed apology)
    /// when the returned future completes. Blank input or a send already in
    /// progress leaves the transcript untouched.
    pub fn submit(&self, text: &str) -> impl Future<Output = ()> + 'static {
        let text = text.trim().to_string();
        let guard = if text.is_empty() {
            None
        } else {
            self.dispatcher.try_acquire(SlotId::Chat, AiKind::Chat)
        };

        let messages = guard.as_ref().map(|_| {
            self.transcript.update(|t| t.push(ChatMessage::user(text)));
            self.transcript.get_untracked()
        });
        let notebook_id = non_blank(&self.notebook_id.get_untracked());
        let this = self.clone();

        async move {
            let (Some(guard), Some(messages)) = (guard, messages) else {
                return;
            };

            let req = AiRequest::Chat {
                notebook_id,
                messages,
            };
            let reply = match this.dispatcher.run(guard, req).await {
                Ok(answer) => answer,
                Err(AiRequestError::Stale(_)) => return,
                Err(AiRequestError::Request(_)) => fallback_message(SlotId::Chat).to_string(),
            };
            this.transcript
                .update(|t| t.push(ChatMessage::assistant(reply)));
        }
    }

    pub fn quick(&self, action: QuickAction) -> impl Future<Output = ()> + 'static {
        self.submit(action.prompt())
    }

    /// Forgets the conversation and the linked notebook.
    pub fn reset(&self) {
        self.transcript.set(vec![]);
        self.notebook_id.set(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Failure, Harness};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_submit_appends_user_turn_then_answer() {
        let h = Harness::authed();
        let chat = &h.app.chat;

        block_on(chat.submit("  what is a heap?  "));
        assert_eq!(
            chat.transcript.get_untracked(),
            vec![
                ChatMessage::user("what is a heap?"),
                ChatMessage::assistant("answer to: what is a heap?"),
            ]
        );
        assert!(!h.app.slots.is_in_flight_untracked(SlotId::Chat));
    }

    #[test]
    fn test_whole_transcript_is_sent() {
        let h = Harness::authed();
        let chat = &h.app.chat;
        chat.notebook_id.set("nb-9".to_string());

        block_on(chat.submit("first"));
        block_on(chat.submit("second"));

        let reqs = h.backend.requests();
        let last = reqs
            .iter()
            .rev()
            .find(|r| r.path == "/ai/chat")
            .and_then(|r| r.json_body())
            .cloned()
            .expect("chat request sent");
        assert_eq!(last["notebook_id"], "nb-9");
        let sent = last["messages"].as_array().map(|m| m.len());
        assert_eq!(sent, Some(3));
        assert_eq!(last["messages"][2]["content"], "second");
    }

    #[test]
    fn test_blank_notebook_id_is_sent_as_null() {
        let h = Harness::authed();
        block_on(h.app.chat.submit("hi"));
        let body = h.backend.requests()[1].json_body().cloned().expect("json body");
        assert!(body["notebook_id"].is_null());
    }

    #[test]
    fn test_failure_appends_one_apology() {
        let h = Harness::authed();
        h.backend.fail("/ai/chat", Failure::Network);
        let chat = &h.app.chat;

        block_on(chat.submit("hello"));
        assert_eq!(
            chat.transcript.get_untracked(),
            vec![
                ChatMessage::user("hello"),
                ChatMessage::assistant("Sorry, something went wrong with the AI request."),
            ]
        );
        assert!(!h.app.slots.is_in_flight_untracked(SlotId::Chat));
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let h = Harness::authed();
        block_on(h.app.chat.submit("   "));
        assert!(h.app.chat.transcript.get_untracked().is_empty());
        assert_eq!(h.backend.count("/ai/chat"), 0);
    }

    #[test]
    fn test_submit_while_sending_is_noop() {
        let h = Harness::authed();
        let chat = h.app.chat.clone();
        let gate = h.backend.gate("/ai/chat");

        let first = chat.submit("one");
        assert!(h.app.slots.is_in_flight_untracked(SlotId::Chat));
        block_on(async {
            futures::join!(first, async {
                chat.submit("two").await;
                let _ = gate.send(());
            })
        });

        assert_eq!(h.backend.count("/ai/chat"), 1);
        assert_eq!(
            chat.transcript.get_untracked(),
            vec![ChatMessage::user("one"), ChatMessage::assistant("answer to: one")]
        );
    }

    #[test]
    fn test_quick_action_goes_through_submit() {
        let h = Harness::authed();
        block_on(h.app.chat.quick(QuickAction::Summary));

        let t = h.app.chat.transcript.get_untracked();
        assert_eq!(t[0], ChatMessage::user(QuickAction::Summary.prompt()));
        assert_eq!(t.len(), 2);
    }
}
