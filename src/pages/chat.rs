use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, Card, CardContent, Input, Label, Textarea,
};
use crate::models::ChatRole;
use crate::state::{AppContext, QuickAction};
use leptos::prelude::*;
use leptos::task::spawn_local;
use strum::IntoEnumIterator;

#[component]
pub fn ChatPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let chat = app_state.0.chat.clone();
    let transcript = chat.transcript;
    let draft: RwSignal<String> = RwSignal::new(String::new());

    let sending = {
        let chat = chat.clone();
        Signal::derive(move || chat.is_sending())
    };

    let on_submit = {
        let chat = chat.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let text = draft.get_untracked();
            if text.trim().is_empty() || sending.get_untracked() {
                return;
            }
            draft.set(String::new());
            spawn_local(chat.submit(&text));
        }
    };

    view! {
        <div class="flex h-[calc(100vh-3rem)] gap-4">
            <aside class="hidden w-56 shrink-0 flex-col rounded-xl border bg-card p-3 md:flex">
                <h2 class="mb-2 text-sm font-semibold">"Chat history"</h2>
                <p class="text-xs text-muted-foreground">
                    "Only the current session is kept. Reloading the page starts a new chat."
                </p>
                <div class="mt-auto flex flex-col gap-1.5">
                    <Label html_for="chat-notebook">"Notebook ID (optional)"</Label>
                    <Input
                        id="chat-notebook"
                        class="h-8 text-xs"
                        placeholder="Link a notebook for context"
                        bind_value=chat.notebook_id
                    />
                </div>
            </aside>

            <Card class="flex-1 gap-3 py-4">
                <CardContent class="flex h-full flex-col gap-3 px-4">
                    <div>
                        <p class="text-sm font-semibold">"AI Chat"</p>
                        <p class="text-xs text-muted-foreground">
                            "Ask questions based on your notebooks and uploads."
                        </p>
                    </div>

                    <div class="flex-1 space-y-3 overflow-y-auto rounded-xl border px-4 py-3">
                        <Show
                            when=move || !transcript.with(|t| t.is_empty())
                            fallback=|| view! {
                                <p class="text-xs text-muted-foreground">
                                    "Start a conversation or use a quick action below to generate MCQs, summaries or a study plan."
                                </p>
                            }
                        >
                            {move || {
                                transcript
                                    .get()
                                    .into_iter()
                                    .map(|m| {
                                        let bubble = match m.role {
                                            ChatRole::User => "ml-auto bg-primary text-primary-foreground rounded-br-sm",
                                            ChatRole::Assistant => "mr-auto bg-muted text-foreground rounded-bl-sm",
                                        };
                                        view! {
                                            <div class="flex">
                                                <div class=format!(
                                                    "max-w-[80%] whitespace-pre-wrap rounded-2xl px-3 py-2 text-xs leading-relaxed {bubble}",
                                                )>{m.content}</div>
                                            </div>
                                        }
                                    })
                                    .collect_view()
                            }}
                        </Show>
                    </div>

                    <div class="flex flex-wrap gap-2">
                        {QuickAction::iter()
                            .map(|action| {
                                let chat = chat.clone();
                                view! {
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Pill
                                        attr:disabled=move || sending.get()
                                        on:click=move |_| spawn_local(chat.quick(action))
                                    >
                                        {action.label()}
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </div>

                    <form class="flex items-end gap-2" on:submit=on_submit>
                        <Textarea
                            class="max-h-32"
                            rows=2u32
                            placeholder="Ask anything about your notes..."
                            value=draft
                            on_change=Callback::new(move |v| draft.set(v))
                        />
                        <Button attr:disabled=move || sending.get()>
                            <BusyLabel busy=sending idle_text="Send" busy_text="Thinking..." />
                        </Button>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}
