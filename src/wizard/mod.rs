pub mod controller;
pub mod draft;
pub mod model;
pub mod steps;

// Re-export commonly used types
pub use controller::{Progress, RequestTicket, StepUpdate, WizardController, WizardError, WizardStep};
pub use draft::DraftStore;
pub use model::{
    CompatibilityResult, CompatibilityStatus, Connection, ConnectionKind, ConnectionSide, CreatedJob,
    FieldMapping, JobConfiguration, JobSchedule, JobStatus, ObjectCatalog, ScheduleFrequency,
    SyncObject, TestResult,
};
pub use steps::{description_counter, CharacterCount, StepId, StepReport};
