use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "bg-card text-card-foreground flex flex-col gap-4 rounded-xl border py-6 shadow-sm"}
    clx! {CardHeader, div, "flex flex-col items-start gap-1.5 px-6"}
    clx! {CardTitle, h2, "leading-none font-semibold"}
    clx! {CardContent, div, "px-6"}
    clx! {CardDescription, p, "text-muted-foreground text-sm"}
    clx! {CardFooter, footer, "flex items-center px-6", "gap-2"}

    // Scrollable, pre-wrapped block for raw AI output (quiz, plan, panel).
    clx! {ResultPane, pre, "min-h-24 whitespace-pre-wrap break-words rounded-lg border bg-muted/40 px-3 py-2 font-sans text-xs leading-relaxed"}
}

pub use components::*;
