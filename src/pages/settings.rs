use crate::components::ui::{
    Button, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle, Label,
};
use crate::config::LOGIN_PATH;
use crate::state::AppContext;
use leptos::prelude::*;
use leptos_router::hooks::use_navigate;

#[component]
pub fn SettingsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session.clone();
    let api_url = app_state.0.config.api_url.clone();
    let log_level = app_state.0.config.log_level.clone();
    let navigate = StoredValue::new(use_navigate());

    let email = {
        let session = session.clone();
        move || session.identity().map(|u| u.email).unwrap_or_default()
    };

    let on_logout = move |_| {
        session.logout();
        navigate.with_value(|nav| nav(LOGIN_PATH, Default::default()));
    };

    view! {
        <div class="flex max-w-xl flex-col gap-4">
            <Card>
                <CardHeader>
                    <CardTitle>"Account"</CardTitle>
                    <CardDescription>"Signed in as " {email}</CardDescription>
                </CardHeader>
                <CardContent>
                    <Button variant=ButtonVariant::Outline on:click=on_logout>
                        "Sign out"
                    </Button>
                </CardContent>
            </Card>

            <Card>
                <CardHeader>
                    <CardTitle>"Connection"</CardTitle>
                    <CardDescription>"Read from window.ENV when the app starts."</CardDescription>
                </CardHeader>
                <CardContent class="flex flex-col gap-2 text-sm">
                    <Label>"Backend URL"</Label>
                    <code class="rounded bg-muted px-2 py-1 text-xs">{api_url}</code>
                    <Label>"Log level"</Label>
                    <code class="rounded bg-muted px-2 py-1 text-xs">{log_level}</code>
                </CardContent>
            </Card>
        </div>
    }
}
