use super::dispatcher::{fallback_message, AiDispatcher, AiKind, AiRequest, AiRequestError};
use super::slots::SlotId;
use crate::util::today_local;
use chrono::NaiveDate;
use leptos::prelude::*;
use std::future::Future;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub(crate) enum TargetGrade {
    #[strum(serialize = "A+")]
    APlus,
    #[default]
    A,
    B,
    C,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ExamInput {
    pub subject: String,
    pub exam_date: NaiveDate,
    pub difficulty: Difficulty,
    pub target_grade: TargetGrade,
    pub notebook_id: Option<String>,
}

impl ExamInput {
    fn prompt(&self) -> String {
        format!(
            "Subject: {}\nDifficulty: {}\nTarget grade: {}",
            self.subject.trim(),
            self.difficulty,
            self.target_grade
        )
    }
}

/// Whole calendar days from `today` to `exam`; negative once the exam is past.
pub(crate) fn days_until(exam: NaiveDate, today: NaiveDate) -> i64 {
    (exam - today).num_days()
}

pub(crate) fn countdown_label(subject: &str, days: i64) -> String {
    format!("{} exam in {} days", subject.trim(), days)
}

#[derive(Clone)]
pub(crate) struct PlannerController {
    dispatcher: AiDispatcher,
    pub countdown: RwSignal<String>,
    /// Raw plan text, rendered verbatim.
    pub plan: RwSignal<String>,
}

impl PlannerController {
    pub fn new(dispatcher: AiDispatcher) -> Self {
        Self {
            dispatcher,
            countdown: RwSignal::new(String::new()),
            plan: RwSignal::new(String::new()),
        }
    }

    /// Tracked.
    pub fn is_generating(&self) -> bool {
        self.dispatcher.slots().is_in_flight(SlotId::Planner)
    }

    pub fn add_exam(&self, input: ExamInput) -> impl Future<Output = ()> + 'static {
        self.add_exam_on(input, today_local())
    }

    /// Countdown is shown immediately and does not depend on the plan
    /// request; the plan lands when the returned future completes. While a
    /// plan is still generating no second request is sent.
    pub fn add_exam_on(
        &self,
        input: ExamInput,
        today: NaiveDate,
    ) -> impl Future<Output = ()> + 'static {
        let guard = if input.subject.trim().is_empty() {
            None
        } else {
            let days = days_until(input.exam_date, today);
            self.countdown.set(countdown_label(&input.subject, days));
            self.dispatcher.try_acquire(SlotId::Planner, AiKind::Plan)
        };

        let this = self.clone();
        async move {
            let Some(guard) = guard else {
                return;
            };

            let req = AiRequest::Plan {
                notebook_id: input.notebook_id.clone(),
                text: input.prompt(),
                exam_date: Some(input.exam_date),
            };
            let plan = match this.dispatcher.run(guard, req).await {
                Ok(plan) => plan,
                Err(AiRequestError::Stale(_)) => return,
                Err(AiRequestError::Request(_)) => fallback_message(SlotId::Planner).to_string(),
            };
            this.plan.set(plan);
        }
    }

    pub fn reset(&self) {
        self.countdown.set(String::new());
        self.plan.set(String::new());
    }
}
