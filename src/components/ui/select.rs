use leptos::prelude::*;
use tw_merge::*;
use wasm_bindgen::JsCast;

/// Native `<select>` over `(value, label)` pairs, bound to `bind_value`.
#[component]
pub fn NativeSelect(
    #[prop(optional, into)] class: String,
    #[prop(optional, into)] id: String,
    options: Vec<(String, String)>,
    #[prop(into)] bind_value: RwSignal<String>,
) -> impl IntoView {
    let merged_class = tw_merge!(
        "border-input h-9 w-full rounded-md border bg-transparent px-2 text-sm shadow-xs outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50",
        class
    );

    let on_change = move |ev: web_sys::Event| {
        if let Some(select) = ev
            .target()
            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
        {
            bind_value.set(select.value());
        }
    };

    view! {
        <select data-name="NativeSelect" id=id class=merged_class on:change=on_change>
            {options
                .into_iter()
                .map(|(value, label)| {
                    let selected = {
                        let value = value.clone();
                        move || bind_value.with(|v| *v == value)
                    };
                    view! {
                        <option value=value selected=selected>
                            {label}
                        </option>
                    }
                })
                .collect_view()}
        </select>
    }
}

/// Options for a strum enum: wire value from `AsRef<str>`, label from `label`.
pub fn enum_options<T, I>(items: I, label: impl Fn(&T) -> String) -> Vec<(String, String)>
where
    T: AsRef<str>,
    I: IntoIterator<Item = T>,
{
    items
        .into_iter()
        .map(|item| (item.as_ref().to_string(), label(&item)))
        .collect()
}
