use crate::components::ui::{
    enum_options, BusyLabel, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardHeader, CardTitle, Input, Label, NativeSelect, ResultPane,
};
use crate::models::{QuestionType, QuizLevel};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::str::FromStr;
use std::time::Duration;
use strum::IntoEnumIterator;
use wasm_bindgen::{JsCast, JsValue};

const DOWNLOAD_NAME: &str = "questions.txt";
/// Some browsers cancel a download whose object URL is revoked in the same
/// tick as the click.
const REVOKE_DELAY: Duration = Duration::from_secs(1);

/// Offers `text` as a plain-text file download.
fn download_text(file_name: &str, text: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let parts = js_sys::Array::of1(&JsValue::from_str(text));
    let opts = web_sys::BlobPropertyBag::new();
    opts.set_type("text/plain");
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &opts)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;

    let anchor: web_sys::HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    anchor.set_href(&url);
    anchor.set_download(file_name);
    anchor.click();

    set_timeout(
        move || {
            if let Err(e) = web_sys::Url::revoke_object_url(&url) {
                tracing::debug!(error = ?e, "could not revoke download url");
            }
        },
        REVOKE_DELAY,
    );
    Ok(())
}

#[component]
pub fn QuizPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let quiz = app_state.0.quiz.clone();
    let result = quiz.result;

    let topic: RwSignal<String> = RwSignal::new(String::new());
    let level: RwSignal<String> = RwSignal::new(QuizLevel::default().to_string());
    let qtype: RwSignal<String> = RwSignal::new(QuestionType::default().to_string());
    let notebook_id: RwSignal<String> = RwSignal::new(String::new());

    let generating = {
        let quiz = quiz.clone();
        Signal::derive(move || quiz.is_generating())
    };

    let on_generate = move |_| {
        let level = QuizLevel::from_str(&level.get_untracked()).unwrap_or_default();
        let qtype = QuestionType::from_str(&qtype.get_untracked()).unwrap_or_default();
        spawn_local(quiz.generate(
            &topic.get_untracked(),
            level,
            qtype,
            &notebook_id.get_untracked(),
        ));
    };

    let on_download = move |_| {
        if let Err(e) = download_text(DOWNLOAD_NAME, &result.get_untracked()) {
            tracing::warn!(error = ?e, "download failed");
        }
    };

    let level_options = enum_options(QuizLevel::iter(), |l| {
        let s = l.to_string();
        let mut chars = s.chars();
        chars
            .next()
            .map(|c| c.to_uppercase().chain(chars).collect())
            .unwrap_or_default()
    });
    let qtype_options = enum_options(QuestionType::iter(), |t| t.label().to_string());

    view! {
        <div class="grid gap-4 xl:grid-cols-3">
            <Card class="gap-3 py-4">
                <CardHeader class="px-4">
                    <CardTitle class="text-sm">"Question generator"</CardTitle>
                    <CardDescription class="text-xs">
                        "Generate exam-style questions from a topic or a linked notebook."
                    </CardDescription>
                </CardHeader>
                <CardContent class="flex flex-col gap-3 px-4">
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="quiz-topic">"Topic or text"</Label>
                        <Input id="quiz-topic" placeholder="e.g. Dynamic programming" bind_value=topic />
                    </div>
                    <div class="grid grid-cols-2 gap-2">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="quiz-level">"Level"</Label>
                            <NativeSelect id="quiz-level" options=level_options bind_value=level />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="quiz-type">"Question type"</Label>
                            <NativeSelect id="quiz-type" options=qtype_options bind_value=qtype />
                        </div>
                    </div>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="quiz-notebook">"Notebook ID (optional)"</Label>
                        <Input id="quiz-notebook" class="text-xs" bind_value=notebook_id />
                    </div>
                    <Button
                        class="w-full"
                        attr:disabled=move || generating.get() || topic.with(|t| t.trim().is_empty())
                        on:click=on_generate
                    >
                        <BusyLabel busy=generating idle_text="Generate questions" busy_text="Generating..." />
                    </Button>
                </CardContent>
            </Card>

            <Card class="gap-3 py-4 xl:col-span-2">
                <CardHeader class="px-4">
                    <div class="flex w-full items-center justify-between">
                        <CardTitle class="text-sm">"Questions"</CardTitle>
                        <Button
                            variant=ButtonVariant::Outline
                            size=ButtonSize::Sm
                            attr:disabled=move || result.with(|r| r.is_empty())
                            on:click=on_download
                        >
                            "Download"
                        </Button>
                    </div>
                </CardHeader>
                <CardContent class="px-4">
                    <ResultPane>
                        {move || {
                            let text = result.get();
                            if text.is_empty() {
                                "Generated questions will appear here.".to_string()
                            } else {
                                text
                            }
                        }}
                    </ResultPane>
                </CardContent>
            </Card>
        </div>
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    async fn test_download_url_outlives_the_click() {
        assert!(download_text(DOWNLOAD_NAME, "Q1. What is a cell?").is_ok());
        // The queued revoke must run cleanly once the delay has passed.
        sleep(REVOKE_DELAY + Duration::from_millis(50)).await;
    }

    async fn sleep(delay: Duration) {
        let (tx, rx) = futures::channel::oneshot::channel::<()>();
        set_timeout(
            move || {
                let _ = tx.send(());
            },
            delay,
        );
        let _ = rx.await;
    }
}
