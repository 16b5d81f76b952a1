use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

use super::dto::{DraftResponse, JobResponse, ObjectsResponse, WizardView};
use crate::api::error::ServiceError;
use crate::gateway::{ConnectionRequest, SyncGateway};
use crate::wizard::{
    DraftStore, FieldMapping, JobSchedule, RequestTicket, StepId, StepUpdate, WizardController,
    WizardError,
};

/// Collaborator calls limited to one in flight at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Action {
    ConnectionTest,
    ObjectListing,
    TestRun,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::ConnectionTest => write!(f, "connection test"),
            Action::ObjectListing => write!(f, "object listing"),
            Action::TestRun => write!(f, "test run"),
        }
    }
}

/// Releases an in-flight slot when dropped
struct InFlight<'a> {
    pending: &'a Mutex<HashSet<Action>>,
    action: Action,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.action);
    }
}

/// Wizard service driving the controller and its collaborators
///
/// The controller lock is released while a collaborator call is pending;
/// the response is applied afterwards only if its step visit is still
/// current.
pub struct WizardService {
    wizard: Mutex<WizardController>,
    gateway: Arc<dyn SyncGateway>,
    drafts: DraftStore,
    pending: Mutex<HashSet<Action>>,
}

impl WizardService {
    pub fn new(wizard: WizardController, gateway: Arc<dyn SyncGateway>, drafts: DraftStore) -> Self {
        Self {
            wizard: Mutex::new(wizard),
            gateway,
            drafts,
            pending: Mutex::new(HashSet::new()),
        }
    }

    fn wizard(&self) -> MutexGuard<'_, WizardController> {
        self.wizard.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start(&self, action: Action) -> Result<InFlight<'_>, ServiceError> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(action) {
            return Err(ServiceError::Conflict(format!(
                "A {} is already in progress",
                action
            )));
        }
        Ok(InFlight {
            pending: &self.pending,
            action,
        })
    }

    /// Issue a ticket for a call that belongs to `step`
    fn ticket(wizard: &WizardController, step: StepId) -> Result<RequestTicket, ServiceError> {
        let current = wizard.current_step();
        if current != step {
            return Err(WizardError::StepNotActive { step, current }.into());
        }
        Ok(wizard.begin_request())
    }

    pub fn view(&self) -> WizardView {
        WizardView::from_controller(&self.wizard())
    }

    pub fn is_dirty(&self) -> bool {
        self.wizard().is_dirty()
    }

    pub fn next(&self) -> Result<WizardView, ServiceError> {
        let mut wizard = self.wizard();
        wizard.next()?;
        Ok(WizardView::from_controller(&wizard))
    }

    pub fn previous(&self) -> WizardView {
        let mut wizard = self.wizard();
        wizard.previous();
        WizardView::from_controller(&wizard)
    }

    pub fn go_to(&self, step: usize) -> Result<WizardView, ServiceError> {
        let mut wizard = self.wizard();
        wizard.go_to(step)?;
        Ok(WizardView::from_controller(&wizard))
    }

    pub fn update(&self, update: StepUpdate) -> Result<WizardView, ServiceError> {
        let mut wizard = self.wizard();
        wizard.update_step_data(update)?;
        Ok(WizardView::from_controller(&wizard))
    }

    pub fn update_details(
        &self,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<WizardView, ServiceError> {
        self.update(StepUpdate::Details { name, description })
    }

    pub fn select_object(&self, name: Option<String>) -> Result<WizardView, ServiceError> {
        self.update(StepUpdate::Object { name })
    }

    pub fn update_mappings(&self, mappings: Vec<FieldMapping>) -> Result<WizardView, ServiceError> {
        self.update(StepUpdate::Mappings(mappings))
    }

    pub fn update_schedule(&self, schedule: JobSchedule) -> Result<WizardView, ServiceError> {
        self.update(StepUpdate::Schedule(schedule))
    }

    pub fn check_mappings(&self) -> Result<WizardView, ServiceError> {
        let mut wizard = self.wizard();
        wizard.check_compatibility()?;
        Ok(WizardView::from_controller(&wizard))
    }

    pub fn dismiss_error(&self) -> WizardView {
        let mut wizard = self.wizard();
        wizard.dismiss_error();
        WizardView::from_controller(&wizard)
    }

    pub async fn test_connection(&self, request: ConnectionRequest) -> Result<WizardView, ServiceError> {
        let _slot = self.start(Action::ConnectionTest)?;
        let ticket = {
            let wizard = self.wizard();
            Self::ticket(&wizard, StepId::Connections)?
        };

        info!("Service: Testing {:?} connection for {}", request.side, request.username);
        let outcome = self
            .gateway
            .test_connection(&request)
            .await
            .map_err(|e| e.to_string());

        let mut wizard = self.wizard();
        wizard.apply_connection_test(ticket, request.side, outcome)?;
        Ok(WizardView::from_controller(&wizard))
    }

    /// Load candidate objects for the source connection
    pub async fn load_objects(&self) -> Result<WizardView, ServiceError> {
        let _slot = self.start(Action::ObjectListing)?;
        let (ticket, connection_id) = {
            let wizard = self.wizard();
            let ticket = Self::ticket(&wizard, StepId::ObjectSelection)?;
            let id = wizard
                .config()
                .source_connection
                .as_ref()
                .map(|c| c.id.clone())
                .ok_or_else(|| ServiceError::Validation("Please connect a source org".to_string()))?;
            (ticket, id)
        };

        info!("Service: Loading objects for connection {}", connection_id);
        let listing = self.gateway.list_objects(&connection_id).await.into_result();

        let mut wizard = self.wizard();
        wizard.apply_object_listing(ticket, listing)?;
        Ok(WizardView::from_controller(&wizard))
    }

    /// Filter the loaded candidates without changing them
    pub fn objects(&self, search: Option<&str>) -> Result<ObjectsResponse, ServiceError> {
        let wizard = self.wizard();
        let catalog = wizard.catalog().ok_or_else(|| {
            ServiceError::NotFound("Objects have not been loaded for the current connection".to_string())
        })?;

        let objects: Vec<_> = catalog
            .search(search.unwrap_or_default())
            .into_iter()
            .cloned()
            .collect();
        Ok(ObjectsResponse {
            fallback: catalog.fallback,
            total: catalog.objects().len(),
            objects,
        })
    }

    pub async fn run_test(&self, sample_size: u32) -> Result<WizardView, ServiceError> {
        let _slot = self.start(Action::TestRun)?;
        let ticket = {
            let wizard = self.wizard();
            Self::ticket(&wizard, StepId::TestSchedule)?
        };

        info!("Service: Running test with sample size {}", sample_size);
        let outcome = self
            .gateway
            .run_test(sample_size)
            .await
            .map_err(|e| e.to_string());

        let mut wizard = self.wizard();
        wizard.apply_test_result(ticket, outcome)?;
        Ok(WizardView::from_controller(&wizard))
    }

    pub fn save_draft(&self) -> Result<DraftResponse, ServiceError> {
        let mut wizard = self.wizard();
        wizard.save_as_draft(&self.drafts)?;
        Ok(DraftResponse {
            message: "Draft saved".to_string(),
            wizard: WizardView::from_controller(&wizard),
        })
    }

    pub fn clear_draft(&self) -> Result<DraftResponse, ServiceError> {
        let wizard = self.wizard();
        wizard.clear_draft(&self.drafts)?;
        Ok(DraftResponse {
            message: "Draft cleared".to_string(),
            wizard: WizardView::from_controller(&wizard),
        })
    }

    pub fn restore_draft(&self) -> Result<DraftResponse, ServiceError> {
        let mut wizard = self.wizard();
        if !wizard.load_draft(&self.drafts) {
            return Err(ServiceError::NotFound("No saved draft".to_string()));
        }
        Ok(DraftResponse {
            message: "Draft restored".to_string(),
            wizard: WizardView::from_controller(&wizard),
        })
    }

    pub fn create_job(&self) -> Result<JobResponse, ServiceError> {
        let job = self.wizard().create_job(&self.drafts).map_err(|e| {
            warn!("Service: Job creation refused: {}", e);
            ServiceError::from(e)
        })?;

        info!("Service: Job created successfully with id={}", job.id);
        Ok(JobResponse {
            message: "Job created successfully".to_string(),
            job,
        })
    }
}
