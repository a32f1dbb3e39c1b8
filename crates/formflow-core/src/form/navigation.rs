use serde::Serialize;

use super::config::FormConfig;
use crate::FormId;

/// Position of a step within its form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepNavigation {
    pub form_id: FormId,
    pub current_step_index: usize,
    pub total_steps: usize,
    pub is_first_step: bool,
    pub is_last_step: bool,
    pub previous_step_slug: Option<String>,
    pub next_step_slug: Option<String>,
}

impl FormConfig {
    /// Navigation for `step_slug`, or `None` if the form has no such step
    pub fn navigation(&self, form_id: &FormId, step_slug: &str) -> Option<StepNavigation> {
        let index = self.step_index(step_slug)?;
        let total = self.steps.len();

        Some(StepNavigation {
            form_id: form_id.clone(),
            current_step_index: index,
            total_steps: total,
            is_first_step: index == 0,
            is_last_step: index + 1 == total,
            previous_step_slug: index
                .checked_sub(1)
                .and_then(|prev| self.steps.get(prev))
                .map(|step| step.slug.clone()),
            next_step_slug: self.steps.get(index + 1).map(|step| step.slug.clone()),
        })
    }
}
