mod auth;
mod chat;
mod notes;
mod planner;
mod quiz;
mod settings;

pub use auth::{LoginPage, SignupPage};
pub use chat::ChatPage;
pub use notes::NotesPage;
pub use planner::PlannerPage;
pub use quiz::QuizPage;
pub use settings::SettingsPage;

use crate::models::SessionStatus;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos_router::hooks::use_location;

const NAV_ITEMS: [(&str, &str); 5] = [
    ("/", "Notes"),
    ("/chat", "AI Chat"),
    ("/quiz", "Question generator"),
    ("/planner", "Exam planner"),
    ("/settings", "Settings"),
];

#[component]
pub fn AppLayout(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session.clone();
    let pathname = use_location().pathname;

    let email = move || session.identity().map(|u| u.email).unwrap_or_default();

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex w-full max-w-[1280px] gap-4 px-4 py-6">
                <aside class="hidden w-52 shrink-0 flex-col gap-1 md:flex">
                    <div class="mb-4 px-2">
                        <div class="text-sm font-semibold">"StudyDesk"</div>
                        <div class="truncate text-xs text-muted-foreground">{email}</div>
                    </div>

                    {NAV_ITEMS
                        .into_iter()
                        .map(|(href, label)| {
                            let active = move || pathname.with(|p| p == href);
                            view! {
                                <a
                                    href=href
                                    class="rounded-md px-2 py-1.5 text-sm hover:bg-accent"
                                    class:bg-accent=active
                                    class:font-medium=active
                                >
                                    {label}
                                </a>
                            }
                        })
                        .collect_view()}
                </aside>

                <main class="min-w-0 flex-1">{children()}</main>
            </div>
        </div>
    }
}

/// Renders `children` inside the app shell when signed in, the login form
/// otherwise.
#[component]
pub fn RootAuthed(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session.clone();
    let is_authenticated = move || session.status() == SessionStatus::Authenticated;

    // Store children so the view macro sees an `Fn` (not an `FnOnce`).
    let children = StoredValue::new(children);

    view! {
        <Show when=is_authenticated fallback=move || view! { <LoginPage /> }>
            <AppLayout>
                {move || children.with_value(|c| c())}
            </AppLayout>
        </Show>
    }
}
