use icons::LoaderCircle;
use leptos::prelude::*;
use tw_merge::tw_merge;

#[component]
pub fn Spinner(#[prop(into, optional)] class: String) -> impl IntoView {
    let merged_class = tw_merge!("size-4 animate-spin", class);

    view! { <LoaderCircle class=merged_class attr:role="status" attr:aria-label="Loading" /> }
}

/// Button content: spinner plus `busy_text` while `busy`, else `idle_text`.
#[component]
pub fn BusyLabel(
    #[prop(into)] busy: Signal<bool>,
    idle_text: &'static str,
    busy_text: &'static str,
) -> impl IntoView {
    view! {
        <span class="inline-flex items-center gap-2">
            <Show when=move || busy.get() fallback=|| ().into_view()>
                <Spinner />
            </Show>
            {move || if busy.get() { busy_text } else { idle_text }}
        </span>
    }
}
