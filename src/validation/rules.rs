use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Email shape: something@something.tld with no whitespace
pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Symbols accepted by the password rules and strength meter
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// A single validation failure scoped to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Declarative validation rule
///
/// Rules are built once and never mutated afterwards. Every check shares
/// the same failure message, so a field that needs distinct messages per
/// check is described as a chain of rules (see [`validate_chain`]).
#[derive(Clone)]
pub struct ValidationRule {
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<Regex>,
    /// Name of the companion field whose value this field must equal
    pub match_field: Option<String>,
    pub custom: Option<Predicate>,
    pub message: String,
}

impl ValidationRule {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            required: false,
            min_length: None,
            max_length: None,
            pattern: None,
            match_field: None,
            custom: None,
            message: message.into(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn matches(mut self, field: impl Into<String>) -> Self {
        self.match_field = Some(field.into());
        self
    }

    pub fn custom<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.custom = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRule")
            .field("required", &self.required)
            .field("min_length", &self.min_length)
            .field("max_length", &self.max_length)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("match_field", &self.match_field)
            .field("custom", &self.custom.is_some())
            .field("message", &self.message)
            .finish()
    }
}

/// Validate one value against one rule.
///
/// Checks run in a fixed order and stop at the first failure:
/// required, empty short-circuit, min length, max length, pattern,
/// companion match, custom predicate. Lengths are counted in characters
/// of the trimmed value.
pub fn validate_field(value: &str, rule: &ValidationRule, match_value: Option<&str>) -> Option<String> {
    let trimmed = value.trim();

    if rule.required && trimmed.is_empty() {
        return Some(rule.message.clone());
    }

    if value.is_empty() && !rule.required {
        return None;
    }

    let length = trimmed.chars().count();

    if rule.min_length.is_some_and(|min| length < min) {
        return Some(rule.message.clone());
    }

    if rule.max_length.is_some_and(|max| length > max) {
        return Some(rule.message.clone());
    }

    if rule.pattern.as_ref().is_some_and(|pattern| !pattern.is_match(value)) {
        return Some(rule.message.clone());
    }

    if match_value.is_some_and(|other| value != other) {
        return Some(rule.message.clone());
    }

    if rule.custom.as_ref().is_some_and(|predicate| !predicate(value)) {
        return Some(rule.message.clone());
    }

    None
}

/// Run rules in order and report the first failure only
pub fn validate_chain(field: &str, value: &str, rules: &[ValidationRule]) -> Option<FieldError> {
    rules
        .iter()
        .find_map(|rule| validate_field(value, rule, None))
        .map(|message| FieldError::new(field, message))
}

/// Named rule set for a whole form, evaluated in declaration order
#[derive(Debug, Clone, Default)]
pub struct FormRules {
    rules: Vec<(String, ValidationRule)>,
}

impl FormRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, rule: ValidationRule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    pub fn get(&self, name: &str) -> Option<&ValidationRule> {
        self.rules.iter().find(|(field, _)| field == name).map(|(_, rule)| rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationRule)> {
        self.rules.iter().map(|(field, rule)| (field.as_str(), rule))
    }
}

/// Source of raw form values keyed by field name
pub trait FormData {
    fn value(&self, field: &str) -> Option<&str>;
}

impl FormData for HashMap<String, String> {
    fn value(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

impl FormData for BTreeMap<String, String> {
    fn value(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

impl FormData for [(&str, &str)] {
    fn value(&self, field: &str) -> Option<&str> {
        self.iter().find(|(name, _)| *name == field).map(|(_, value)| *value)
    }
}

/// Validate every declared field, at most one error per field.
///
/// Missing values are treated as empty strings. A rule with a
/// `match_field` is compared against that field's value.
pub fn validate_form<D>(data: &D, rules: &FormRules) -> Vec<FieldError>
where
    D: FormData + ?Sized,
{
    rules
        .iter()
        .filter_map(|(field, rule)| {
            let value = data.value(field).unwrap_or("");
            let match_value = rule
                .match_field
                .as_deref()
                .map(|other| data.value(other).unwrap_or(""));
            validate_field(value, rule, match_value).map(|message| FieldError::new(field, message))
        })
        .collect()
}

/// Validate one field of a form as the user edits it
pub fn validate_field_in_form<D>(field: &str, value: &str, data: &D, rules: &FormRules) -> Option<String>
where
    D: FormData + ?Sized,
{
    let rule = rules.get(field)?;
    let match_value = rule
        .match_field
        .as_deref()
        .map(|other| data.value(other).unwrap_or(""));
    validate_field(value, rule, match_value)
}

fn has_password_classes(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_lowercase())
        && value.chars().any(|c| c.is_ascii_uppercase())
        && value.chars().any(|c| c.is_ascii_digit())
        && value.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Rules for the login and signup forms
pub fn auth_rules() -> FormRules {
    FormRules::new()
        .field("email", email_rule())
        .field("password", password_rule())
        .field(
            "confirmPassword",
            ValidationRule::new("Passwords must match").required().matches("password"),
        )
        .field("fullName", full_name_rule())
}

/// Subset of [`auth_rules`] used by login
pub fn login_rules() -> FormRules {
    FormRules::new()
        .field("email", email_rule())
        .field("password", password_rule())
}

fn full_name_rule() -> ValidationRule {
    ValidationRule::new("Full name is required (2-50 characters)")
        .required()
        .min_length(2)
        .max_length(50)
}

fn email_rule() -> ValidationRule {
    ValidationRule::new("Please enter a valid email address")
        .required()
        .pattern(EMAIL_REGEX.clone())
}

fn password_rule() -> ValidationRule {
    ValidationRule::new(
        "Password must be at least 8 characters with uppercase, lowercase, number, and symbol",
    )
    .required()
    .min_length(8)
    .custom(has_password_classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_rule() -> ValidationRule {
        ValidationRule::new("Job name is required (3-120 characters)")
            .required()
            .min_length(3)
            .max_length(120)
    }

    #[test]
    fn required_takes_precedence_over_length() {
        let rule = name_rule();
        for value in ["", " ", "\t\n", "   "] {
            assert_eq!(validate_field(value, &rule, None), Some(rule.message.clone()));
        }
    }

    #[test]
    fn short_values_fail_only_when_trimmed_length_is_below_minimum() {
        let short = ValidationRule::new("too short").min_length(3);
        assert_eq!(validate_field("ab", &short, None).as_deref(), Some("too short"));
        assert_eq!(validate_field("  ab  ", &short, None).as_deref(), Some("too short"));
        assert_eq!(validate_field("abc", &short, None), None);
        assert_eq!(validate_field("", &short, None), None);
    }

    #[test]
    fn empty_optional_value_skips_every_other_check() {
        let rule = ValidationRule::new("never")
            .min_length(5)
            .pattern(EMAIL_REGEX.clone())
            .custom(|_| false);
        assert_eq!(validate_field("", &rule, Some("other")), None);
    }

    #[test]
    fn required_empty_never_reports_pattern_mismatch() {
        let rules = [
            ValidationRule::new("required").required(),
            ValidationRule::new("bad email").pattern(EMAIL_REGEX.clone()),
        ];
        let error = validate_chain("email", "", &rules).expect("error expected");
        assert_eq!(error.message, "required");
    }

    #[test]
    fn pattern_match_and_custom_checks_run_in_order() {
        let rule = ValidationRule::new("invalid")
            .pattern(Regex::new("^[a-z]+$").unwrap())
            .custom(|v| v.len() % 2 == 0);
        assert!(validate_field("ABC", &rule, None).is_some());
        assert!(validate_field("abc", &rule, None).is_some());
        assert!(validate_field("abcd", &rule, None).is_none());
        assert!(validate_field("abcd", &rule, Some("abce")).is_some());
    }

    #[test]
    fn validate_form_reports_one_error_per_field() {
        let data = [
            ("fullName", "A"),
            ("email", "not-an-email"),
            ("password", "Secret1!"),
            ("confirmPassword", "Secret2!"),
        ];
        let errors = validate_form(&data[..], &auth_rules());
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "confirmPassword", "fullName"]);
        assert_eq!(errors[1].message, "Passwords must match");
    }

    #[test]
    fn validate_form_treats_missing_fields_as_empty() {
        let data: HashMap<String, String> = HashMap::new();
        let errors = validate_form(&data, &login_rules());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].message, "Please enter a valid email address");
    }

    #[test]
    fn password_requires_every_character_class() {
        let rules = login_rules();
        let rule = rules.get("password").unwrap();
        assert!(validate_field("password", rule, None).is_some());
        assert!(validate_field("Password1", rule, None).is_some());
        assert!(validate_field("Pa1!", rule, None).is_some());
        assert!(validate_field("Password1!", rule, None).is_none());
    }

    #[test]
    fn realtime_validation_uses_companion_value() {
        let rules = auth_rules();
        let data = [("password", "Password1!")];
        assert_eq!(
            validate_field_in_form("confirmPassword", "Password2!", &data[..], &rules).as_deref(),
            Some("Passwords must match")
        );
        assert_eq!(
            validate_field_in_form("confirmPassword", "Password1!", &data[..], &rules),
            None
        );
        assert_eq!(validate_field_in_form("unknown", "x", &data[..], &rules), None);
    }

    #[test]
    fn repeated_validation_is_stable() {
        let data = [("email", "bad"), ("password", "")];
        let first = validate_form(&data[..], &login_rules());
        let second = validate_form(&data[..], &login_rules());
        assert_eq!(first, second);
    }
}
