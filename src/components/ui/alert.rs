use icons::X;
use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border px-4 py-3 text-sm"}
    clx! {AlertDescription, p, "text-sm [&_p]:leading-relaxed"}
}

pub use components::*;

/// Destructive alert bound to an optional message. Renders nothing while the
/// message is `None`; the close button clears it.
#[component]
pub fn ErrorAlert(
    message: RwSignal<Option<String>>,
    #[prop(optional)] dismissible: bool,
) -> impl IntoView {
    view! {
        <Show when=move || message.with(|m| m.is_some()) fallback=|| ().into_view()>
            <Alert class="flex items-start justify-between gap-2 border-destructive/30">
                <AlertDescription class="text-destructive">
                    {move || message.get().unwrap_or_default()}
                </AlertDescription>
                <Show when=move || dismissible fallback=|| ().into_view()>
                    <button
                        type="button"
                        class="text-muted-foreground hover:text-foreground"
                        aria-label="Dismiss"
                        on:click=move |_| message.set(None)
                    >
                        <X class="size-4" />
                    </button>
                </Show>
            </Alert>
        </Show>
    }
}
