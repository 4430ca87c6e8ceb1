use crate::components::ui::{
    enum_options, BusyLabel, Button, Card, CardContent, CardDescription, CardHeader, CardTitle,
    ErrorAlert, Input, Label, NativeSelect, ResultPane,
};
use crate::state::{AppContext, Difficulty, ExamInput, TargetGrade};
use crate::util::{non_blank, parse_exam_date};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::str::FromStr;
use strum::IntoEnumIterator;

#[component]
pub fn PlannerPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let planner = app_state.0.planner.clone();
    let countdown = planner.countdown;
    let plan = planner.plan;

    let subject: RwSignal<String> = RwSignal::new(String::new());
    let exam_date: RwSignal<String> = RwSignal::new(String::new());
    let difficulty: RwSignal<String> = RwSignal::new(Difficulty::default().to_string());
    let target_grade: RwSignal<String> = RwSignal::new(TargetGrade::default().to_string());
    let notebook_id: RwSignal<String> = RwSignal::new(String::new());
    let form_error: RwSignal<Option<String>> = RwSignal::new(None);

    let generating = {
        let planner = planner.clone();
        Signal::derive(move || planner.is_generating())
    };

    let on_add = move |_| {
        let Some(date) = parse_exam_date(&exam_date.get_untracked()) else {
            form_error.set(Some("Pick an exam date".to_string()));
            return;
        };
        form_error.set(None);

        let input = ExamInput {
            subject: subject.get_untracked(),
            exam_date: date,
            difficulty: Difficulty::from_str(&difficulty.get_untracked()).unwrap_or_default(),
            target_grade: TargetGrade::from_str(&target_grade.get_untracked())
                .unwrap_or_default(),
            notebook_id: non_blank(&notebook_id.get_untracked()),
        };
        spawn_local(planner.add_exam(input));
    };

    let difficulty_options = enum_options(Difficulty::iter(), |d| match d {
        Difficulty::Easy => "Easy".to_string(),
        Difficulty::Medium => "Medium".to_string(),
        Difficulty::Hard => "Hard".to_string(),
    });
    let grade_options = enum_options(TargetGrade::iter(), |g| g.to_string());

    view! {
        <div class="grid gap-4 xl:grid-cols-3">
            <Card class="gap-3 py-4">
                <CardHeader class="px-4">
                    <CardTitle class="text-sm">"Exam planner"</CardTitle>
                    <CardDescription class="text-xs">
                        "Add an exam to get a countdown and a day-by-day study plan."
                    </CardDescription>
                </CardHeader>
                <CardContent class="flex flex-col gap-3 px-4">
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="plan-subject">"Subject"</Label>
                        <Input id="plan-subject" placeholder="e.g. Operating Systems" bind_value=subject />
                    </div>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="plan-date">"Exam date"</Label>
                        <Input id="plan-date" r#type="date" bind_value=exam_date />
                    </div>
                    <div class="grid grid-cols-2 gap-2">
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="plan-difficulty">"Difficulty"</Label>
                            <NativeSelect
                                id="plan-difficulty"
                                options=difficulty_options
                                bind_value=difficulty
                            />
                        </div>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="plan-grade">"Target grade"</Label>
                            <NativeSelect id="plan-grade" options=grade_options bind_value=target_grade />
                        </div>
                    </div>
                    <div class="flex flex-col gap-1.5">
                        <Label html_for="plan-notebook">"Notebook ID (optional)"</Label>
                        <Input id="plan-notebook" class="text-xs" bind_value=notebook_id />
                    </div>

                    <ErrorAlert message=form_error />

                    <Button
                        class="w-full"
                        attr:disabled=move || generating.get() || subject.with(|s| s.trim().is_empty())
                        on:click=on_add
                    >
                        <BusyLabel busy=generating idle_text="Add exam & generate plan" busy_text="Generating plan..." />
                    </Button>
                </CardContent>
            </Card>

            <Card class="gap-3 py-4 xl:col-span-2">
                <CardHeader class="px-4">
                    <CardTitle class="text-sm">"Study plan"</CardTitle>
                    <CardDescription class="text-xs">
                        {move || {
                            let c = countdown.get();
                            if c.is_empty() { "No exam added yet.".to_string() } else { c }
                        }}
                    </CardDescription>
                </CardHeader>
                <CardContent class="px-4">
                    <ResultPane>
                        {move || {
                            let text = plan.get();
                            if text.is_empty() {
                                "Your plan will appear here.".to_string()
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
