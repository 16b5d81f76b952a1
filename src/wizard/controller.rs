use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::draft::DraftStore;
use super::model::{
    CompatibilityResult, Connection, ConnectionSide, CreatedJob, FieldMapping, JobConfiguration,
    JobSchedule, JobStatus, ObjectCatalog, ScheduleFrequency, SyncObject, TestResult,
};
use super::steps::{check_compatibility, validate_step, StepContext, StepId, StepReport};
use crate::clock::Clock;
use crate::storage::StorageError;

/// Wizard-level errors
#[derive(Debug)]
pub enum WizardError {
    /// The current step failed validation
    StepInvalid { step: StepId, message: String },

    /// `go_to` target is neither completed, current, nor the next step after a completed one
    NavigationRejected { target: usize },

    /// Data was submitted for a step other than the active one
    StepNotActive { step: StepId, current: StepId },

    /// A collaborator response arrived after its step visit ended
    StaleResponse { step: StepId },

    /// Job creation attempted before every step was completed
    Incomplete { step: StepId },

    /// Draft storage failed
    Storage(StorageError),
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::StepInvalid { message, .. } => write!(f, "{}", message),
            WizardError::NavigationRejected { target } => {
                write!(f, "Step {} is not reachable yet", target)
            }
            WizardError::StepNotActive { step, current } => write!(
                f,
                "Cannot edit '{}' while '{}' is the active step",
                step, current
            ),
            WizardError::StaleResponse { step } => {
                write!(f, "Discarded a response for '{}' that is no longer current", step)
            }
            WizardError::Incomplete { step } => {
                write!(f, "Step '{}' must be completed before creating the job", step)
            }
            WizardError::Storage(e) => write!(f, "Draft storage failed: {}", e),
        }
    }
}

impl std::error::Error for WizardError {}

impl From<StorageError> for WizardError {
    fn from(e: StorageError) -> Self {
        WizardError::Storage(e)
    }
}

/// A partial update owned by exactly one step
#[derive(Debug, Clone)]
pub enum StepUpdate {
    Details {
        name: Option<String>,
        description: Option<String>,
    },
    Connection {
        side: ConnectionSide,
        connection: Option<Connection>,
    },
    Object {
        name: Option<String>,
    },
    Mappings(Vec<FieldMapping>),
    Compatibility(Vec<CompatibilityResult>),
    Schedule(JobSchedule),
    TestResult(TestResult),
}

impl StepUpdate {
    pub fn step(&self) -> StepId {
        match self {
            StepUpdate::Details { .. } => StepId::Details,
            StepUpdate::Connection { .. } => StepId::Connections,
            StepUpdate::Object { .. } => StepId::ObjectSelection,
            StepUpdate::Mappings(_) => StepId::FieldMapping,
            StepUpdate::Compatibility(_) => StepId::FieldValidation,
            StepUpdate::Schedule(_) | StepUpdate::TestResult(_) => StepId::TestSchedule,
        }
    }
}

/// Proof that a collaborator call was started from a given step visit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub step: StepId,
    visit: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StepState {
    completed: bool,
    has_errors: bool,
}

/// Snapshot of one step for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardStep {
    pub id: StepId,
    pub index: usize,
    pub title: &'static str,
    pub description: &'static str,
    pub is_completed: bool,
    pub is_active: bool,
    pub has_errors: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub completed: usize,
    pub with_errors: usize,
    pub percent: f64,
}

/// Drives the job wizard: step order, navigation, and the job configuration
///
/// Steps are addressed by [`StepId`]; the 1-based index exposed to callers
/// is derived from the configured order. Only the active step's slice of
/// the configuration can be edited.
pub struct WizardController {
    order: Vec<StepId>,
    states: BTreeMap<StepId, StepState>,
    current: usize,
    config: JobConfiguration,
    catalog: Option<ObjectCatalog>,
    error: Option<String>,
    dirty: bool,
    visit: u64,
    clock: Arc<dyn Clock>,
}

impl WizardController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_steps(StepId::ORDER.to_vec(), clock)
    }

    /// Build a wizard over a custom step order.
    ///
    /// Repeated steps keep their first position; an empty order means the
    /// default one.
    pub fn with_steps(order: Vec<StepId>, clock: Arc<dyn Clock>) -> Self {
        let mut unique: Vec<StepId> = Vec::with_capacity(order.len());
        for step in order {
            if !unique.contains(&step) {
                unique.push(step);
            }
        }
        let order = if unique.is_empty() {
            StepId::ORDER.to_vec()
        } else {
            unique
        };
        let states = order.iter().map(|step| (*step, StepState::default())).collect();
        Self {
            order,
            states,
            current: 0,
            config: JobConfiguration::default(),
            catalog: None,
            error: None,
            dirty: false,
            visit: 0,
            clock,
        }
    }

    /// Start from a previously saved configuration.
    ///
    /// Completion is recomputed as the longest run of leading steps that
    /// validate, and the first incomplete step becomes active.
    pub fn restore(&mut self, config: JobConfiguration) {
        self.config = config;
        self.catalog = None;
        self.error = None;
        self.dirty = false;

        let mut first_incomplete = None;
        for (i, step) in self.order.clone().into_iter().enumerate() {
            let completed = first_incomplete.is_none() && self.report(step).is_valid();
            if !completed && first_incomplete.is_none() {
                first_incomplete = Some(i);
            }
            *self.state_mut(step) = StepState {
                completed,
                has_errors: false,
            };
        }

        // In-flight responses from before the restore must not land
        self.current = first_incomplete.unwrap_or(self.order.len() - 1);
        self.visit += 1;
        info!(
            "Restored wizard draft: {} of {} steps completed",
            self.completed_count(),
            self.order.len()
        );
    }

    pub fn config(&self) -> &JobConfiguration {
        &self.config
    }

    pub fn catalog(&self) -> Option<&ObjectCatalog> {
        self.catalog.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn current_step(&self) -> StepId {
        self.order[self.current]
    }

    /// 1-based index of the active step
    pub fn current_index(&self) -> usize {
        self.current + 1
    }

    pub fn total_steps(&self) -> usize {
        self.order.len()
    }

    pub fn is_completed(&self, step: StepId) -> bool {
        self.states.get(&step).is_some_and(|s| s.completed)
    }

    pub fn steps(&self) -> Vec<WizardStep> {
        self.order
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let state = self.states.get(step).copied().unwrap_or_default();
                WizardStep {
                    id: *step,
                    index: i + 1,
                    title: step.title(),
                    description: step.description(),
                    is_completed: state.completed,
                    is_active: i == self.current,
                    has_errors: state.has_errors,
                }
            })
            .collect()
    }

    pub fn progress(&self) -> Progress {
        let total = self.order.len();
        Progress {
            current: self.current_index(),
            total,
            completed: self.completed_count(),
            with_errors: self.states.values().filter(|s| s.has_errors).count(),
            percent: self.current_index() as f64 / total as f64 * 100.0,
        }
    }

    /// Validate a step against the current data
    pub fn report(&self, step: StepId) -> StepReport {
        let ctx = StepContext {
            config: &self.config,
            catalog: self.catalog.as_ref(),
            now: self.clock.now(),
        };
        validate_step(step, &ctx)
    }

    /// Validate the active step and move forward if it passes.
    ///
    /// On the last step a passing validation only marks it completed.
    pub fn next(&mut self) -> Result<StepId, WizardError> {
        let step = self.current_step();
        let report = self.report(step);

        if let Some(first) = report.first_error() {
            let message = first.message.clone();
            self.state_mut(step).has_errors = true;
            self.error = Some(message.clone());
            debug!("Step '{}' failed validation: {}", step, message);
            return Err(WizardError::StepInvalid { step, message });
        }

        let state = self.state_mut(step);
        state.completed = true;
        state.has_errors = false;
        self.error = None;

        if self.current + 1 < self.order.len() {
            self.move_to(self.current + 1);
        }
        debug!("Completed step '{}', now on '{}'", step, self.current_step());
        Ok(self.current_step())
    }

    /// Move back one step; completion flags are left untouched
    pub fn previous(&mut self) -> StepId {
        if self.current > 0 {
            self.move_to(self.current - 1);
            self.error = None;
        }
        self.current_step()
    }

    /// Jump to a 1-based step index.
    ///
    /// Allowed for completed steps, the current step, or the step right
    /// after a completed current step. Rejections leave all state unchanged.
    pub fn go_to(&mut self, target: usize) -> Result<StepId, WizardError> {
        if target == 0 || target > self.order.len() {
            return Err(WizardError::NavigationRejected { target });
        }

        let index = target - 1;
        let allowed = self.is_completed(self.order[index])
            || index == self.current
            || (index == self.current + 1 && self.is_completed(self.current_step()));
        if !allowed {
            return Err(WizardError::NavigationRejected { target });
        }

        if index != self.current {
            self.move_to(index);
            self.error = None;
        }
        Ok(self.current_step())
    }

    /// Merge a partial update into the active step's slice.
    ///
    /// The owning step is revalidated immediately. When the change feeds
    /// later steps, their derived data is dropped and every dependent step
    /// that no longer validates loses its completion.
    pub fn update_step_data(&mut self, update: StepUpdate) -> Result<StepReport, WizardError> {
        let step = update.step();
        let current = self.current_step();
        if step != current {
            return Err(WizardError::StepNotActive { step, current });
        }

        let before = self.config.clone();
        self.apply(update);

        if self.config != before {
            self.dirty = true;
            self.invalidate_derived(step);
            self.revalidate_dependents(step);
        }

        let report = self.report(step);
        let valid = report.is_valid();
        let state = self.state_mut(step);
        state.has_errors = !valid;
        state.completed &= valid;
        if valid {
            self.error = None;
        }
        Ok(report)
    }

    /// Run the compatibility check over the current mappings
    pub fn check_compatibility(&mut self) -> Result<StepReport, WizardError> {
        let results = check_compatibility(&self.config.field_mappings);
        self.update_step_data(StepUpdate::Compatibility(results))
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Mark the start of a collaborator call issued from the active step
    pub fn begin_request(&self) -> RequestTicket {
        RequestTicket {
            step: self.current_step(),
            visit: self.visit,
        }
    }

    /// True while the step visit that issued `ticket` is still active
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.visit == self.visit && ticket.step == self.current_step()
    }

    fn ensure_current(&self, ticket: &RequestTicket) -> Result<(), WizardError> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            debug!("Dropping stale response for step '{}'", ticket.step);
            Err(WizardError::StaleResponse { step: ticket.step })
        }
    }

    /// Install the result of an object listing.
    ///
    /// A failed listing falls back to the built-in candidates and raises a
    /// dismissible banner instead of blocking the step.
    pub fn apply_object_listing(
        &mut self,
        ticket: RequestTicket,
        listing: Result<Vec<SyncObject>, String>,
    ) -> Result<(), WizardError> {
        self.ensure_current(&ticket)?;

        let catalog = match listing {
            Ok(objects) => ObjectCatalog::loaded(objects),
            Err(message) => {
                warn!("Object listing failed, using built-in objects: {}", message);
                self.error = Some(message);
                ObjectCatalog::fallback()
            }
        };

        self.catalog = Some(catalog);
        if !self.report(StepId::ObjectSelection).is_valid() {
            self.state_mut(StepId::ObjectSelection).completed = false;
        }
        Ok(())
    }

    /// Install the outcome of a connection test for one side
    pub fn apply_connection_test(
        &mut self,
        ticket: RequestTicket,
        side: ConnectionSide,
        outcome: Result<Connection, String>,
    ) -> Result<StepReport, WizardError> {
        self.ensure_current(&ticket)?;

        match outcome {
            Ok(connection) => self.update_step_data(StepUpdate::Connection {
                side,
                connection: Some(connection),
            }),
            Err(message) => {
                warn!("Connection test failed for {:?}: {}", side, message);
                let report = self.update_step_data(StepUpdate::Connection {
                    side,
                    connection: None,
                })?;
                self.error = Some(message);
                Ok(report)
            }
        }
    }

    /// Install the outcome of a test run
    pub fn apply_test_result(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<TestResult, String>,
    ) -> Result<StepReport, WizardError> {
        self.ensure_current(&ticket)?;

        match outcome {
            Ok(result) => self.update_step_data(StepUpdate::TestResult(result)),
            Err(message) => {
                warn!("Test run failed: {}", message);
                self.error = Some(message);
                Ok(self.report(StepId::TestSchedule))
            }
        }
    }

    pub fn save_as_draft(&mut self, drafts: &DraftStore) -> Result<(), WizardError> {
        drafts.save(&self.config)?;
        self.dirty = false;
        info!("Saved wizard draft");
        Ok(())
    }

    /// Remove the persisted draft; the in-memory configuration is kept
    pub fn clear_draft(&self, drafts: &DraftStore) -> Result<(), WizardError> {
        drafts.clear()?;
        info!("Cleared wizard draft");
        Ok(())
    }

    /// Restore the saved draft, returning whether one existed
    pub fn load_draft(&mut self, drafts: &DraftStore) -> bool {
        match drafts.load() {
            Some(config) => {
                self.restore(config);
                true
            }
            None => false,
        }
    }

    /// Turn a fully completed wizard into a job and start over.
    ///
    /// Every step is validated again against the current clock. A step that
    /// no longer passes loses its completion and becomes the active step.
    pub fn create_job(&mut self, drafts: &DraftStore) -> Result<CreatedJob, WizardError> {
        if let Some(step) = self.order.iter().find(|s| !self.is_completed(**s)) {
            return Err(WizardError::Incomplete { step: *step });
        }

        for (index, step) in self.order.clone().into_iter().enumerate() {
            let report = self.report(step);
            if let Some(first) = report.first_error() {
                let message = first.message.clone();
                warn!("Step '{}' is no longer valid: {}", step, message);
                *self.state_mut(step) = StepState {
                    completed: false,
                    has_errors: true,
                };
                self.move_to(index);
                self.error = Some(message.clone());
                return Err(WizardError::StepInvalid { step, message });
            }
        }

        let incomplete = |step| WizardError::Incomplete { step };
        let config = &self.config;
        let source = config
            .source_connection
            .clone()
            .ok_or_else(|| incomplete(StepId::Connections))?;
        let target = config
            .target_connection
            .clone()
            .ok_or_else(|| incomplete(StepId::Connections))?;
        let object = config
            .selected_object
            .clone()
            .ok_or_else(|| incomplete(StepId::ObjectSelection))?;

        let now = self.clock.now();
        let next_run = match config.schedule.frequency {
            ScheduleFrequency::Manual => None,
            _ => config.schedule.start_at,
        };
        let job = CreatedJob {
            id: format!("job_{}_{:08x}", now.timestamp_millis(), rand::thread_rng().gen::<u32>()),
            name: config.name.clone(),
            description: config.description.clone(),
            source_connection: source,
            target_connection: target,
            object,
            field_mappings: config.field_mappings.clone(),
            schedule: config.schedule.clone(),
            status: JobStatus::Active,
            created_at: now,
            next_run,
        };

        if let Err(e) = drafts.clear() {
            warn!("Job created but the draft could not be cleared: {}", e);
        }
        self.reset();
        info!("Created job id={} name={}", job.id, job.name);
        Ok(job)
    }

    fn reset(&mut self) {
        self.config = JobConfiguration::default();
        self.catalog = None;
        self.error = None;
        self.dirty = false;
        for state in self.states.values_mut() {
            *state = StepState::default();
        }
        self.move_to(0);
    }

    fn apply(&mut self, update: StepUpdate) {
        let config = &mut self.config;
        match update {
            StepUpdate::Details { name, description } => {
                if let Some(name) = name {
                    config.name = name;
                }
                if let Some(description) = description {
                    config.description = description;
                }
            }
            StepUpdate::Connection { side, connection } => match side {
                ConnectionSide::Source => config.source_connection = connection,
                ConnectionSide::Target => config.target_connection = connection,
            },
            StepUpdate::Object { name } => config.selected_object = name,
            StepUpdate::Mappings(mappings) => config.field_mappings = mappings,
            StepUpdate::Compatibility(results) => config.compatibility = Some(results),
            StepUpdate::Schedule(schedule) => config.schedule = schedule,
            StepUpdate::TestResult(result) => config.test_result = Some(result),
        }
    }

    /// Drop data computed from the edited step's output
    fn invalidate_derived(&mut self, step: StepId) {
        match step {
            StepId::Connections => {
                self.catalog = None;
                self.config.test_result = None;
            }
            StepId::ObjectSelection => {
                self.config.compatibility = None;
                self.config.test_result = None;
            }
            StepId::FieldMapping => {
                self.config.compatibility = None;
                self.config.test_result = None;
            }
            StepId::Details | StepId::FieldValidation | StepId::TestSchedule => {}
        }
    }

    fn revalidate_dependents(&mut self, step: StepId) {
        for dependent in self.dependents_of(step) {
            if self.is_completed(dependent) && !self.report(dependent).is_valid() {
                debug!("Step '{}' invalidated by change to '{}'", dependent, step);
                self.state_mut(dependent).completed = false;
            }
        }
    }

    /// Steps that transitively read `step`, in wizard order
    fn dependents_of(&self, step: StepId) -> Vec<StepId> {
        let mut affected = vec![step];
        for candidate in &self.order {
            if candidate
                .depends_on()
                .iter()
                .any(|upstream| affected.contains(upstream))
                && !affected.contains(candidate)
            {
                affected.push(*candidate);
            }
        }
        affected.retain(|s| *s != step);
        affected
    }

    fn move_to(&mut self, index: usize) {
        if index != self.current {
            self.current = index;
            self.visit += 1;
        }
    }

    fn completed_count(&self) -> usize {
        self.states.values().filter(|s| s.completed).count()
    }

    fn state_mut(&mut self, step: StepId) -> &mut StepState {
        self.states.entry(step).or_default()
    }
}
