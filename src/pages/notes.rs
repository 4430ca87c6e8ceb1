use crate::api::UploadFile;
use crate::components::ui::{
    BusyLabel, Button, ButtonSize, ButtonVariant, Card, CardContent, CardHeader, CardTitle,
    ErrorAlert, Label, ResultPane, Spinner, Textarea,
};
use crate::state::{AppContext, NotebookRegistry, PanelAction};
use leptos::html;
use leptos::prelude::*;
use leptos::task::spawn_local;
use strum::IntoEnumIterator;
use wasm_bindgen_futures::JsFuture;

const NEW_NOTEBOOK_TITLE: &str = "New notebook";
const UPLOAD_ACCEPT: &str = ".pdf,.doc,.docx,.png,.jpg,.jpeg";

async fn read_upload(file: web_sys::File) -> Result<UploadFile, String> {
    let buf = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("{e:?}"))?;
    Ok(UploadFile {
        file_name: file.name(),
        mime: Some(file.type_()),
        bytes: js_sys::Uint8Array::new(&buf).to_vec(),
    })
}

#[component]
pub fn NotesPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let reg = app_state.0.notebooks.clone();

    Effect::new({
        let reg = reg.clone();
        move |_| {
            let reg = reg.clone();
            spawn_local(async move {
                let _ = reg.list().await;
            });
        }
    });

    view! {
        <div class="flex h-[calc(100vh-3rem)] gap-4">
            <NotebookSidebar reg=reg.clone() />

            <section class="flex min-w-0 flex-1 flex-col gap-3">
                <ErrorAlert message=reg.notice dismissible=true />
                <NoteEditor reg=reg.clone() />
            </section>

            <AiPanel reg=reg />
        </div>
    }
}

#[component]
fn NotebookSidebar(reg: NotebookRegistry) -> impl IntoView {
    let creating: RwSignal<bool> = RwSignal::new(false);
    let notebooks = reg.notebooks;
    let active = reg.active;
    let list_loading = reg.list_loading;

    let on_create = {
        let reg = reg.clone();
        move |_| {
            if creating.get_untracked() {
                return;
            }
            creating.set(true);
            let reg = reg.clone();
            spawn_local(async move {
                let _ = reg.create(NEW_NOTEBOOK_TITLE, Some("")).await;
                creating.set(false);
            });
        }
    };

    view! {
        <aside class="hidden w-60 shrink-0 flex-col rounded-xl border bg-card p-3 md:flex">
            <div class="mb-3 flex items-center justify-between">
                <h2 class="text-sm font-semibold">"Notebooks"</h2>
                <Button size=ButtonSize::Sm attr:disabled=move || creating.get() on:click=on_create>
                    "New"
                </Button>
            </div>

            <Show
                when=move || !notebooks.with(|l| l.is_empty())
                fallback=move || view! {
                    <div class="text-xs text-muted-foreground">
                        {move || if list_loading.get() {
                            "Loading notebooks..."
                        } else {
                            "No notebooks yet. Create one to start taking notes."
                        }}
                    </div>
                }
            >
                <ul class="flex flex-col gap-1 overflow-y-auto">
                    {
                        let reg = reg.clone();
                        move || {
                            notebooks
                                .get()
                                .into_iter()
                                .map(|nb| {
                                    let id = nb.id.clone();
                                    let is_active = move || {
                                        active.with(|a| a.as_ref().map(|a| a.id == id).unwrap_or(false))
                                    };
                                    let title = nb.title.clone();
                                    let reg = reg.clone();
                                    view! {
                                        <li>
                                            <button
                                                type="button"
                                                class="w-full truncate rounded-md px-2 py-1.5 text-left text-sm hover:bg-accent"
                                                class:bg-accent=is_active.clone()
                                                class:font-medium=is_active
                                                on:click=move |_| spawn_local(reg.select(nb.clone()))
                                            >
                                                {title}
                                            </button>
                                        </li>
                                    }
                                })
                                .collect_view()
                        }
                    }
                </ul>
            </Show>
        </aside>
    }
}

#[component]
fn NoteEditor(reg: NotebookRegistry) -> impl IntoView {
    let editor = reg.editor;
    let saving = reg.saving;
    let uploading = reg.uploading;
    let note_loading = reg.note_loading;
    let has_note = move || editor.with(|e| e.notebook_id.is_some());

    let file_ref: NodeRef<html::Input> = NodeRef::new();

    let on_title = {
        let reg = reg.clone();
        move |ev: web_sys::Event| reg.set_title(event_target_value(&ev))
    };

    let on_content = {
        let reg = reg.clone();
        Callback::new(move |v: String| reg.set_content(v))
    };

    let on_save = {
        let reg = reg.clone();
        move |_| {
            let save = reg.save_active();
            spawn_local(async move {
                let _ = save.await;
            });
        }
    };

    let on_file = {
        let reg = reg.clone();
        move |_: web_sys::Event| {
            let Some(input) = file_ref.get_untracked() else {
                return;
            };
            let Some(file) = input.files().and_then(|list| list.get(0)) else {
                return;
            };
            input.set_value("");

            let reg = reg.clone();
            spawn_local(async move {
                match read_upload(file).await {
                    Ok(upload) => {
                        let _ = reg.upload(upload).await;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "could not read the selected file");
                        reg.notice.set(Some("Upload failed".to_string()));
                    }
                }
            });
        }
    };

    view! {
        <Card class="flex-1 gap-3 py-4">
            <CardContent class="flex h-full flex-col gap-3 px-4">
                <div class="flex items-center gap-2">
                    <input
                        class="w-full bg-transparent text-xl font-semibold outline-none placeholder:text-muted-foreground"
                        placeholder="Untitled notebook"
                        disabled=move || !has_note()
                        prop:value=move || editor.with(|e| e.title.clone())
                        on:input=on_title
                    />
                    <Show when=move || note_loading.get() fallback=|| ().into_view()>
                        <Spinner />
                    </Show>
                </div>

                <div class="text-xs text-muted-foreground">
                    "Markdown-style: use **bold**, # headings and - bullet lists."
                </div>

                <Textarea
                    class="flex-1 bg-muted/40"
                    rows=18u32
                    placeholder="Type your lecture notes, summaries and key formulas here..."
                    disabled=Signal::derive(move || !has_note())
                    value=Signal::derive(move || editor.with(|e| e.content.clone()))
                    on_change=on_content
                />

                <div class="flex flex-wrap items-center gap-2">
                    <input
                        node_ref=file_ref
                        type="file"
                        accept=UPLOAD_ACCEPT
                        class="hidden"
                        on:change=on_file
                    />
                    <Button
                        variant=ButtonVariant::Dashed
                        size=ButtonSize::Sm
                        attr:disabled=move || uploading.get() || !has_note()
                        on:click=move |_| {
                            if let Some(input) = file_ref.get_untracked() {
                                input.click();
                            }
                        }
                    >
                        <BusyLabel
                            busy=uploading
                            idle_text="Upload PDF / DOCX / Image"
                            busy_text="Uploading..."
                        />
                    </Button>

                    <Button
                        class="ml-auto"
                        size=ButtonSize::Sm
                        attr:disabled=move || saving.get() || !has_note()
                        on:click=on_save
                    >
                        <BusyLabel busy=saving idle_text="Save" busy_text="Saving..." />
                    </Button>
                </div>
            </CardContent>
        </Card>
    }
}

#[component]
fn AiPanel(reg: NotebookRegistry) -> impl IntoView {
    let editor = reg.editor;
    let busy = {
        let reg = reg.clone();
        Signal::derive(move || reg.panel_busy())
    };
    let has_note = move || editor.with(|e| e.notebook_id.is_some());

    view! {
        <aside class="hidden w-72 shrink-0 xl:flex">
            <Card class="w-full gap-3 py-4">
                <CardHeader class="px-4">
                    <CardTitle class="text-sm">"AI assistant"</CardTitle>
                </CardHeader>
                <CardContent class="flex flex-col gap-3 px-4">
                    <div class="flex flex-wrap gap-2">
                        {PanelAction::iter()
                            .map(|action| {
                                let running = {
                                    let reg = reg.clone();
                                    Signal::derive(move || reg.panel_running() == Some(action))
                                };
                                let reg = reg.clone();
                                view! {
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        attr:disabled=move || busy.get() || !has_note()
                                        on:click=move |_| spawn_local(reg.run_panel_action(action))
                                    >
                                        <BusyLabel
                                            busy=running
                                            idle_text=action.label()
                                            busy_text=action.busy_label()
                                        />
                                    </Button>
                                }
                            })
                            .collect_view()}
                    </div>

                    <Label>"Result"</Label>
                    <ResultPane>
                        {move || {
                            let text = editor.with(|e| e.ai_result.clone());
                            if text.is_empty() {
                                "Run an action to see AI output here.".to_string()
                            } else {
                                text
                            }
                        }}
                    </ResultPane>
                </CardContent>
            </Card>
        </aside>
    }
}
