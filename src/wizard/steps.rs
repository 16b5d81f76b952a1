use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::model::{
    CompatibilityResult, CompatibilityStatus, ConnectionSide, FieldMapping, JobConfiguration,
    ObjectCatalog, ScheduleFrequency,
};
use crate::validation::{validate_chain, FieldError, ValidationRule};

pub const NAME_MIN_LENGTH: usize = 3;
pub const NAME_MAX_LENGTH: usize = 120;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;
/// Counter switches to its warning state above this many characters
pub const DESCRIPTION_WARNING_THRESHOLD: usize = 900;
/// Minimum lead time between "now" and the first scheduled run
pub const MIN_START_LEAD_MINUTES: i64 = 30;

/// Transformations the sync engine knows how to apply
pub const KNOWN_TRANSFORMATIONS: [&str; 4] = ["uppercase", "lowercase", "trim", "date_only"];

/// Identifier of a wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Details,
    Connections,
    ObjectSelection,
    FieldMapping,
    FieldValidation,
    TestSchedule,
}

impl StepId {
    /// Default step order of the job wizard
    pub const ORDER: [StepId; 6] = [
        StepId::Details,
        StepId::Connections,
        StepId::ObjectSelection,
        StepId::FieldMapping,
        StepId::FieldValidation,
        StepId::TestSchedule,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            StepId::Details => "Job Details",
            StepId::Connections => "Connections",
            StepId::ObjectSelection => "Object Selection",
            StepId::FieldMapping => "Field Mapping",
            StepId::FieldValidation => "Field Validation",
            StepId::TestSchedule => "Test & Schedule",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StepId::Details => "Name and describe the sync job",
            StepId::Connections => "Connect the source and target orgs",
            StepId::ObjectSelection => "Choose the object to synchronize",
            StepId::FieldMapping => "Configure field mappings and transformations",
            StepId::FieldValidation => "Validate field compatibility and mappings",
            StepId::TestSchedule => "Test your job and configure scheduling",
        }
    }

    /// Steps whose output this step reads
    pub fn depends_on(&self) -> &'static [StepId] {
        match self {
            StepId::Details | StepId::Connections => &[],
            StepId::ObjectSelection => &[StepId::Connections],
            StepId::FieldMapping => &[StepId::ObjectSelection],
            StepId::FieldValidation => &[StepId::FieldMapping],
            StepId::TestSchedule => &[
                StepId::Connections,
                StepId::ObjectSelection,
                StepId::FieldMapping,
            ],
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Everything a step validator may read
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub config: &'a JobConfiguration,
    pub catalog: Option<&'a ObjectCatalog>,
    pub now: DateTime<Utc>,
}

/// Result of validating one step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Failures that block leaving the step
    pub errors: Vec<FieldError>,
    /// Failures shown to the user that do not block the step
    pub advisories: Vec<FieldError>,
}

impl StepReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn first_error(&self) -> Option<&FieldError> {
        self.errors.first()
    }
}

/// Validate one step against the current configuration
pub fn validate_step(step: StepId, ctx: &StepContext<'_>) -> StepReport {
    match step {
        StepId::Details => validate_details(ctx.config),
        StepId::Connections => validate_connections(ctx.config),
        StepId::ObjectSelection => validate_object_selection(ctx.config, ctx.catalog),
        StepId::FieldMapping => validate_field_mappings(&ctx.config.field_mappings),
        StepId::FieldValidation => validate_compatibility(ctx.config),
        StepId::TestSchedule => validate_test_schedule(ctx.config, ctx.now),
    }
}

fn name_rules() -> [ValidationRule; 4] {
    [
        ValidationRule::new("Job name is required").required(),
        ValidationRule::new("Job name must be at least 3 characters").min_length(NAME_MIN_LENGTH),
        ValidationRule::new("Job name must be less than 120 characters").max_length(NAME_MAX_LENGTH),
        ValidationRule::new("Job name cannot have leading or trailing whitespace")
            .custom(|value| value == value.trim()),
    ]
}

fn description_rules() -> [ValidationRule; 1] {
    [ValidationRule::new("Description must be less than 1000 characters")
        .custom(|value| value.chars().count() <= DESCRIPTION_MAX_LENGTH)]
}

pub fn validate_job_name(name: &str) -> Option<FieldError> {
    validate_chain("name", name, &name_rules())
}

pub fn validate_description(description: &str) -> Option<FieldError> {
    validate_chain("description", description, &description_rules())
}

fn validate_details(config: &JobConfiguration) -> StepReport {
    StepReport {
        errors: validate_job_name(&config.name).into_iter().collect(),
        advisories: validate_description(&config.description).into_iter().collect(),
    }
}

fn validate_connections(config: &JobConfiguration) -> StepReport {
    let mut errors = Vec::new();
    for (side, field, message) in [
        (ConnectionSide::Source, "source_connection", "Please connect a source org"),
        (ConnectionSide::Target, "target_connection", "Please connect a target org"),
    ] {
        if !config.connection(side).is_some_and(|c| c.verified) {
            errors.push(FieldError::new(field, message));
        }
    }
    StepReport {
        errors,
        advisories: Vec::new(),
    }
}

fn validate_object_selection(config: &JobConfiguration, catalog: Option<&ObjectCatalog>) -> StepReport {
    let error = match (config.selected_object.as_deref(), catalog) {
        (None, _) => Some("Please select an object to continue"),
        (Some(_), None) => Some("Objects have not been loaded for the current connection"),
        (Some(name), Some(catalog)) if !catalog.contains(name) => {
            Some("Selected object is not available for this connection")
        }
        _ => None,
    };

    StepReport {
        errors: error
            .map(|message| FieldError::new("selected_object", message))
            .into_iter()
            .collect(),
        advisories: Vec::new(),
    }
}

/// An empty mapping list means every field is synchronized as-is
pub fn validate_field_mappings(mappings: &[FieldMapping]) -> StepReport {
    let mut errors = Vec::new();
    let mut targets = HashSet::new();

    for (i, mapping) in mappings.iter().enumerate() {
        let field = format!("field_mappings[{}]", i);
        if mapping.source_field.trim().is_empty() {
            errors.push(FieldError::new(&field, format!("Mapping {} needs a source field", i + 1)));
            continue;
        }
        if mapping.target_field.trim().is_empty() {
            errors.push(FieldError::new(&field, format!("Mapping {} needs a target field", i + 1)));
            continue;
        }
        if !targets.insert(mapping.target_field.trim()) {
            errors.push(FieldError::new(
                &field,
                format!("Target field '{}' is mapped more than once", mapping.target_field.trim()),
            ));
        }
    }

    StepReport {
        errors,
        advisories: Vec::new(),
    }
}

/// Check each mapping for compatibility between its source and target
pub fn check_compatibility(mappings: &[FieldMapping]) -> Vec<CompatibilityResult> {
    mappings
        .iter()
        .map(|mapping| {
            let field = mapping.target_field.clone();
            match mapping.transformation.as_deref() {
                Some(t) if !KNOWN_TRANSFORMATIONS.contains(&t) => CompatibilityResult {
                    field,
                    status: CompatibilityStatus::Error,
                    message: format!("Unknown transformation '{}'", t),
                },
                None if mapping.source_field != mapping.target_field => CompatibilityResult {
                    field,
                    status: CompatibilityStatus::Warning,
                    message: format!(
                        "Source field '{}' maps to a differently named target field",
                        mapping.source_field
                    ),
                },
                _ => CompatibilityResult {
                    field,
                    status: CompatibilityStatus::Valid,
                    message: "Fields are compatible".to_string(),
                },
            }
        })
        .collect()
}

fn validate_compatibility(config: &JobConfiguration) -> StepReport {
    let errors = match &config.compatibility {
        None => vec![FieldError::new(
            "compatibility",
            "Please validate field mappings before continuing",
        )],
        Some(results) => results
            .iter()
            .filter(|r| r.status == CompatibilityStatus::Error)
            .map(|r| FieldError::new(&r.field, &r.message))
            .collect(),
    };
    let advisories = config
        .compatibility
        .iter()
        .flatten()
        .filter(|r| r.status == CompatibilityStatus::Warning)
        .map(|r| FieldError::new(&r.field, &r.message))
        .collect();

    StepReport { errors, advisories }
}

fn validate_test_schedule(config: &JobConfiguration, now: DateTime<Utc>) -> StepReport {
    let mut errors = Vec::new();

    if config.test_result.is_none() {
        errors.push(FieldError::new("test_result", "Please run a test before proceeding"));
    }

    let schedule = &config.schedule;
    match schedule.frequency {
        ScheduleFrequency::Manual => {}
        ScheduleFrequency::Custom => {
            errors.push(FieldError::new("schedule", "Custom schedules are not supported yet"));
        }
        _ => match schedule.start_at {
            None => errors.push(FieldError::new("start_at", "Please set a start time")),
            Some(start) if start <= now + Duration::minutes(MIN_START_LEAD_MINUTES) => {
                errors.push(FieldError::new(
                    "start_at",
                    "Start time must be at least 30 minutes from now",
                ));
            }
            Some(_) => {}
        },
    }

    StepReport {
        errors,
        advisories: Vec::new(),
    }
}

/// Description character counter shown under the description field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CharacterCount {
    pub count: usize,
    pub limit: usize,
    pub warning: bool,
}

pub fn description_counter(description: &str) -> CharacterCount {
    let count = description.chars().count();
    CharacterCount {
        count,
        limit: DESCRIPTION_MAX_LENGTH,
        warning: count > DESCRIPTION_WARNING_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::model::{Connection, ConnectionKind, JobSchedule, TestResult};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn details(name: &str, description: &str) -> StepReport {
        let config = JobConfiguration {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        };
        validate_step(
            StepId::Details,
            &StepContext {
                config: &config,
                catalog: None,
                now: now(),
            },
        )
    }

    fn connection(id: &str, verified: bool) -> Connection {
        Connection {
            id: id.to_string(),
            name: id.to_string(),
            kind: ConnectionKind::Sandbox,
            verified,
            last_tested: now(),
        }
    }

    fn tested() -> TestResult {
        TestResult {
            sample_size: 100,
            records_processed: 100,
            records_succeeded: 100,
            records_failed: 0,
            success: true,
            errors: Vec::new(),
        }
    }

    #[test]
    fn short_name_is_rejected() {
        let report = details("AB", "");
        assert!(!report.is_valid());
        assert_eq!(
            report.first_error().unwrap().message,
            "Job name must be at least 3 characters"
        );
    }

    #[test]
    fn padded_name_is_rejected_even_with_valid_length() {
        let report = details("  Valid Name  ", "");
        assert_eq!(
            report.first_error().unwrap().message,
            "Job name cannot have leading or trailing whitespace"
        );
    }

    #[test]
    fn name_checks_follow_required_short_long_order() {
        assert_eq!(validate_job_name("").unwrap().message, "Job name is required");
        assert_eq!(validate_job_name("    ").unwrap().message, "Job name is required");
        assert_eq!(
            validate_job_name(" ab ").unwrap().message,
            "Job name must be at least 3 characters"
        );
        let long = "x".repeat(121);
        assert_eq!(
            validate_job_name(&long).unwrap().message,
            "Job name must be less than 120 characters"
        );
        assert!(validate_job_name(&"x".repeat(120)).is_none());
    }

    #[test]
    fn required_wins_and_short_tracks_trimmed_length() {
        for s in ["", " ", "a", " a", "ab", "ab ", "abc", " abc", "abcd"] {
            let error = validate_job_name(s).map(|e| e.message);
            let trimmed = s.trim().chars().count();
            let is_short = error.as_deref() == Some("Job name must be at least 3 characters");
            let is_required = error.as_deref() == Some("Job name is required");
            assert_eq!(is_short, trimmed > 0 && trimmed < 3, "input {:?}", s);
            assert_eq!(is_required, trimmed == 0, "input {:?}", s);
        }
    }

    #[test]
    fn valid_name_with_empty_description_passes() {
        let report = details("Valid Job Name", "");
        assert!(report.is_valid());
        assert!(report.advisories.is_empty());
    }

    #[test]
    fn long_description_does_not_block_the_step() {
        let report = details("Valid Job Name", &"d".repeat(1001));
        assert!(report.is_valid());
        assert_eq!(
            report.advisories[0].message,
            "Description must be less than 1000 characters"
        );
    }

    #[test]
    fn counter_warns_above_nine_hundred_characters() {
        let counter = description_counter(&"d".repeat(950));
        assert_eq!(counter.count, 950);
        assert!(counter.warning);
        assert!(details("Valid Job Name", &"d".repeat(950)).is_valid());
        assert!(!description_counter(&"d".repeat(900)).warning);
    }

    #[test]
    fn validation_is_idempotent() {
        assert_eq!(details("  x", "y"), details("  x", "y"));
    }

    #[test]
    fn connections_require_both_verified_sides() {
        let mut config = JobConfiguration {
            source_connection: Some(connection("src", true)),
            target_connection: Some(connection("dst", false)),
            ..Default::default()
        };
        let ctx = StepContext {
            config: &config,
            catalog: None,
            now: now(),
        };
        let report = validate_step(StepId::Connections, &ctx);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "Please connect a target org");

        config.target_connection = Some(connection("dst", true));
        let ctx = StepContext {
            config: &config,
            catalog: None,
            now: now(),
        };
        assert!(validate_step(StepId::Connections, &ctx).is_valid());
    }

    #[test]
    fn object_must_come_from_the_candidate_set() {
        let catalog = ObjectCatalog::fallback();
        let mut config = JobConfiguration::default();
        let check = |config: &JobConfiguration, catalog: Option<&ObjectCatalog>| {
            validate_step(
                StepId::ObjectSelection,
                &StepContext {
                    config,
                    catalog,
                    now: now(),
                },
            )
        };

        assert!(!check(&config, Some(&catalog)).is_valid());

        config.selected_object = Some("Widget__c".to_string());
        assert!(!check(&config, Some(&catalog)).is_valid());

        config.selected_object = Some("Contact".to_string());
        assert!(check(&config, Some(&catalog)).is_valid());
        assert!(!check(&config, None).is_valid());
    }

    #[test]
    fn mappings_reject_blank_and_duplicate_targets() {
        assert!(validate_field_mappings(&[]).is_valid());

        let mapping = |s: &str, t: &str| FieldMapping {
            source_field: s.to_string(),
            target_field: t.to_string(),
            transformation: None,
        };
        let report = validate_field_mappings(&[
            mapping("Name", "Name"),
            mapping("", "Phone"),
            mapping("Email", "Name"),
        ]);
        let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Mapping 2 needs a source field",
                "Target field 'Name' is mapped more than once"
            ]
        );
    }

    #[test]
    fn compatibility_flags_unknown_transformations() {
        let results = check_compatibility(&[
            FieldMapping {
                source_field: "Name".into(),
                target_field: "Name".into(),
                transformation: None,
            },
            FieldMapping {
                source_field: "Mail".into(),
                target_field: "Email".into(),
                transformation: None,
            },
            FieldMapping {
                source_field: "Phone".into(),
                target_field: "Phone".into(),
                transformation: Some("reverse".into()),
            },
        ]);
        let statuses: Vec<CompatibilityStatus> = results.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                CompatibilityStatus::Valid,
                CompatibilityStatus::Warning,
                CompatibilityStatus::Error
            ]
        );

        let config = JobConfiguration {
            compatibility: Some(results),
            ..Default::default()
        };
        let report = validate_compatibility(&config);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.advisories.len(), 1);
        assert!(!validate_compatibility(&JobConfiguration::default()).is_valid());
    }

    #[test]
    fn manual_schedule_needs_no_start_time() {
        let config = JobConfiguration {
            test_result: Some(tested()),
            schedule: JobSchedule::default(),
            ..Default::default()
        };
        assert!(validate_test_schedule(&config, now()).is_valid());
    }

    #[test]
    fn scheduled_start_needs_thirty_minutes_lead() {
        let mut config = JobConfiguration {
            test_result: Some(tested()),
            schedule: JobSchedule {
                frequency: ScheduleFrequency::Daily,
                start_at: Some(now() + Duration::minutes(10)),
            },
            ..Default::default()
        };
        let report = validate_test_schedule(&config, now());
        assert_eq!(
            report.first_error().unwrap().message,
            "Start time must be at least 30 minutes from now"
        );

        config.schedule.start_at = Some(now() + Duration::minutes(30));
        assert!(!validate_test_schedule(&config, now()).is_valid());

        config.schedule.start_at = Some(now() + Duration::minutes(31));
        assert!(validate_test_schedule(&config, now()).is_valid());

        config.schedule.start_at = None;
        assert_eq!(
            validate_test_schedule(&config, now()).first_error().unwrap().message,
            "Please set a start time"
        );
    }

    #[test]
    fn untested_or_custom_schedules_are_blocked() {
        let mut config = JobConfiguration::default();
        assert_eq!(
            validate_test_schedule(&config, now()).first_error().unwrap().message,
            "Please run a test before proceeding"
        );

        config.test_result = Some(tested());
        config.schedule.frequency = ScheduleFrequency::Custom;
        assert_eq!(
            validate_test_schedule(&config, now()).first_error().unwrap().message,
            "Custom schedules are not supported yet"
        );
    }
}
