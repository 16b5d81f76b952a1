use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Environment of a connected org
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    Production,
    Sandbox,
    Developer,
}

/// Which end of the sync a connection serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSide {
    Source,
    Target,
}

/// A connection established through the connection-test collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub name: String,
    pub kind: ConnectionKind,
    pub verified: bool,
    pub last_tested: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub source_field: String,
    pub target_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityStatus {
    Valid,
    Warning,
    Error,
}

/// Outcome of checking one field mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub field: String,
    pub status: CompatibilityStatus,
    pub message: String,
}

/// How often a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScheduleFrequency {
    #[default]
    #[serde(rename = "manual")]
    Manual,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "1hour")]
    Hourly,
    #[serde(rename = "2hours")]
    TwoHours,
    #[serde(rename = "6hours")]
    SixHours,
    #[serde(rename = "12hours")]
    TwelveHours,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "monthly")]
    Monthly,
    /// Selectable, but not supported by the scheduler yet
    #[serde(rename = "custom")]
    Custom,
}

impl ScheduleFrequency {
    pub const ALL: [ScheduleFrequency; 11] = [
        ScheduleFrequency::Manual,
        ScheduleFrequency::ThirtyMinutes,
        ScheduleFrequency::Hourly,
        ScheduleFrequency::TwoHours,
        ScheduleFrequency::SixHours,
        ScheduleFrequency::TwelveHours,
        ScheduleFrequency::Daily,
        ScheduleFrequency::Weekly,
        ScheduleFrequency::TwoWeeks,
        ScheduleFrequency::Monthly,
        ScheduleFrequency::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ScheduleFrequency::Manual => "Manual",
            ScheduleFrequency::ThirtyMinutes => "Every 30 minutes",
            ScheduleFrequency::Hourly => "Every hour",
            ScheduleFrequency::TwoHours => "Every 2 hours",
            ScheduleFrequency::SixHours => "Every 6 hours",
            ScheduleFrequency::TwelveHours => "Every 12 hours",
            ScheduleFrequency::Daily => "Daily",
            ScheduleFrequency::Weekly => "Weekly",
            ScheduleFrequency::TwoWeeks => "Every 2 weeks",
            ScheduleFrequency::Monthly => "Monthly",
            ScheduleFrequency::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobSchedule {
    pub frequency: ScheduleFrequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
}

/// Counts reported by a dry-run of the job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub sample_size: u32,
    pub records_processed: u32,
    pub records_succeeded: u32,
    pub records_failed: u32,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Cross-step aggregate describing the sync job being built
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfiguration {
    pub name: String,
    pub description: String,
    pub source_connection: Option<Connection>,
    pub target_connection: Option<Connection>,
    pub selected_object: Option<String>,
    pub field_mappings: Vec<FieldMapping>,
    /// Results of the last compatibility check, `None` until checked
    pub compatibility: Option<Vec<CompatibilityResult>>,
    pub schedule: JobSchedule,
    pub test_result: Option<TestResult>,
}

impl JobConfiguration {
    pub fn connection(&self, side: ConnectionSide) -> Option<&Connection> {
        match side {
            ConnectionSide::Source => self.source_connection.as_ref(),
            ConnectionSide::Target => self.target_connection.as_ref(),
        }
    }
}

/// An object that can be synchronized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncObject {
    pub name: String,
    pub label: String,
    pub field_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SyncObject {
    fn new(name: &str, label: &str, field_count: u32, description: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_count,
            description: Some(description.to_string()),
        }
    }
}

/// Built-in candidates used when the object listing cannot be loaded
pub fn fallback_objects() -> Vec<SyncObject> {
    vec![
        SyncObject::new("Account", "Account", 68, "Companies and organizations you do business with"),
        SyncObject::new("Contact", "Contact", 54, "People associated with accounts"),
        SyncObject::new("Lead", "Lead", 49, "Prospects that have not been qualified yet"),
        SyncObject::new("Opportunity", "Opportunity", 41, "Pending and closed deals"),
        SyncObject::new("Case", "Case", 37, "Customer issues and support requests"),
        SyncObject::new("Product2", "Product", 22, "Products and services you sell"),
        SyncObject::new("User", "User", 160, "Users of the org"),
        SyncObject::new("Campaign", "Campaign", 33, "Marketing campaigns"),
        SyncObject::new("Task", "Task", 30, "Activities to be completed"),
        SyncObject::new("Event", "Event", 35, "Calendar events"),
    ]
}

/// Candidate objects for the object selection step
///
/// The candidate set is fixed once loaded; searching only filters what is
/// displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectCatalog {
    objects: Vec<SyncObject>,
    /// True when the built-in candidates replaced a failed listing
    pub fallback: bool,
}

impl ObjectCatalog {
    pub fn loaded(objects: Vec<SyncObject>) -> Self {
        Self {
            objects,
            fallback: false,
        }
    }

    pub fn fallback() -> Self {
        Self {
            objects: fallback_objects(),
            fallback: true,
        }
    }

    pub fn objects(&self) -> &[SyncObject] {
        &self.objects
    }

    pub fn find(&self, name: &str) -> Option<&SyncObject> {
        self.objects.iter().find(|object| object.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Case-insensitive match on name, label or description
    pub fn search(&self, term: &str) -> Vec<&SyncObject> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return self.objects.iter().collect();
        }

        self.objects
            .iter()
            .filter(|object| {
                object.name.to_lowercase().contains(&term)
                    || object.label.to_lowercase().contains(&term)
                    || object
                        .description
                        .as_ref()
                        .is_some_and(|d| d.to_lowercase().contains(&term))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    Active,
    Paused,
    Failed,
    Completed,
}

/// A job produced by finishing the wizard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedJob {
    pub id: String,
    pub name: String,
    pub description: String,
    pub source_connection: Connection,
    pub target_connection: Connection,
    pub object: String,
    pub field_mappings: Vec<FieldMapping>,
    pub schedule: JobSchedule,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub next_run: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_filters_without_touching_candidates() {
        let catalog = ObjectCatalog::fallback();
        let before = catalog.objects().len();

        let hits = catalog.search("OPPOR");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Opportunity");

        let by_description = catalog.search("support");
        assert_eq!(by_description[0].name, "Case");

        assert!(catalog.search("zzz").is_empty());
        assert_eq!(catalog.search("   ").len(), before);
        assert_eq!(catalog.objects().len(), before);
    }

    #[test]
    fn frequencies_use_short_wire_names() {
        let json = serde_json::to_string(&ScheduleFrequency::ThirtyMinutes).unwrap();
        assert_eq!(json, "\"30min\"");
        let parsed: ScheduleFrequency = serde_json::from_str("\"2weeks\"").unwrap();
        assert_eq!(parsed, ScheduleFrequency::TwoWeeks);
    }

    #[test]
    fn partial_configuration_deserializes_with_defaults() {
        let config: JobConfiguration = serde_json::from_str(r#"{"name":"Nightly"}"#).unwrap();
        assert_eq!(config.name, "Nightly");
        assert_eq!(config.schedule.frequency, ScheduleFrequency::Manual);
        assert!(config.field_mappings.is_empty());
    }
}
