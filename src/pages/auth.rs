use crate::components::ui::{
    BusyLabel, Button, Card, CardContent, CardDescription, CardFooter, CardHeader, CardTitle,
    ErrorAlert, Input, Label,
};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_navigate;

#[derive(Clone, Copy, PartialEq, Eq)]
enum AuthMode {
    Login,
    Signup,
}

impl AuthMode {
    fn title(self) -> &'static str {
        match self {
            AuthMode::Login => "Log in",
            AuthMode::Signup => "Create account",
        }
    }

    fn submit_labels(self) -> (&'static str, &'static str) {
        match self {
            AuthMode::Login => ("Sign in", "Signing in..."),
            AuthMode::Signup => ("Sign up", "Creating account..."),
        }
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    view! { <AuthForm mode=AuthMode::Login /> }
}

#[component]
pub fn SignupPage() -> impl IntoView {
    view! { <AuthForm mode=AuthMode::Signup /> }
}

#[component]
fn AuthForm(mode: AuthMode) -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();
    let navigate = StoredValue::new(use_navigate());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get_untracked();
        let password_val = password.get_untracked();
        let session = app_state.0.session.clone();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            let res = match mode {
                AuthMode::Login => session.login(&email_val, &password_val).await,
                AuthMode::Signup => session.signup(&email_val, &password_val).await,
            };
            loading.set(false);
            match res {
                Ok(_) => navigate.with_value(|nav| nav("/", Default::default())),
                Err(e) => error.set(Some(e.message)),
            }
        });
    };

    let (idle_text, busy_text) = mode.submit_labels();

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 text-center">
                    <div class="text-sm font-semibold text-foreground">"StudyDesk"</div>
                    <div class="text-xs text-muted-foreground">
                        "Notes, summaries and exam planning in one place."
                    </div>
                </div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">{mode.title()}</CardTitle>
                        <CardDescription class="text-xs">
                            "Use your email and password to continue."
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    placeholder="••••••••"
                                    bind_value=password
                                    required=true
                                />
                            </div>

                            <ErrorAlert message=error />

                            <Button class="w-full" attr:disabled=move || loading.get()>
                                <BusyLabel busy=loading idle_text=idle_text busy_text=busy_text />
                            </Button>
                        </form>
                    </CardContent>

                    <CardFooter>
                        <div class="text-xs text-muted-foreground">
                            {match mode {
                                AuthMode::Login => view! {
                                    "No account? "
                                    <a class="text-primary underline underline-offset-4" href="/signup">"Create one"</a>
                                }
                                .into_any(),
                                AuthMode::Signup => view! {
                                    "Already registered? "
                                    <a class="text-primary underline underline-offset-4" href="/login">"Log in"</a>
                                }
                                .into_any(),
                            }}
                        </div>
                    </CardFooter>
                </Card>
            </div>
        </div>
    }
}
