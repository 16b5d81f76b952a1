use serde::Serialize;

use crate::wizard::{
    description_counter, CharacterCount, CreatedJob, JobConfiguration, Progress, StepId, StepReport,
    SyncObject, WizardController, WizardStep,
};

/// Full wizard snapshot returned by every wizard route
#[derive(Debug, Serialize)]
pub struct WizardView {
    pub current_step: StepId,
    pub steps: Vec<WizardStep>,
    pub progress: Progress,
    /// Validation of the active step
    pub report: StepReport,
    pub config: JobConfiguration,
    pub description_counter: CharacterCount,
    pub objects_loaded: bool,
    pub using_fallback_objects: bool,
    pub error: Option<String>,
    pub dirty: bool,
}

impl WizardView {
    pub fn from_controller(wizard: &WizardController) -> Self {
        let step = wizard.current_step();
        Self {
            current_step: step,
            steps: wizard.steps(),
            progress: wizard.progress(),
            report: wizard.report(step),
            config: wizard.config().clone(),
            description_counter: description_counter(&wizard.config().description),
            objects_loaded: wizard.catalog().is_some(),
            using_fallback_objects: wizard.catalog().is_some_and(|c| c.fallback),
            error: wizard.error().map(str::to_string),
            dirty: wizard.is_dirty(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ObjectsResponse {
    pub fallback: bool,
    pub total: usize,
    pub objects: Vec<SyncObject>,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub message: String,
    pub wizard: WizardView,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub message: String,
    pub job: CreatedJob,
}
