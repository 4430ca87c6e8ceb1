use crate::pages::{
    ChatPage, LoginPage, NotesPage, PlannerPage, QuizPage, RootAuthed, SettingsPage, SignupPage,
};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new()));

    // IMPORTANT:
    // - Leptos CSR requires the `csr` feature on `leptos`.
    // - router hooks require a <Router> context.
    view! {
        <Router>
            <Routes fallback=|| view! { <div class="px-4 py-8 text-xs text-muted-foreground">"Not found"</div> }>
                <Route path=path!("login") view=LoginPage />
                <Route path=path!("signup") view=SignupPage />
                <Route path=path!("chat") view=move || view! {
                    <RootAuthed>
                        <ChatPage />
                    </RootAuthed>
                } />
                <Route path=path!("quiz") view=move || view! {
                    <RootAuthed>
                        <QuizPage />
                    </RootAuthed>
                } />
                <Route path=path!("planner") view=move || view! {
                    <RootAuthed>
                        <PlannerPage />
                    </RootAuthed>
                } />
                <Route path=path!("settings") view=move || view! {
                    <RootAuthed>
                        <SettingsPage />
                    </RootAuthed>
                } />
                <Route path=path!("") view=move || view! {
                    <RootAuthed>
                        <NotesPage />
                    </RootAuthed>
                } />
            </Routes>
        </Router>
    }
}
