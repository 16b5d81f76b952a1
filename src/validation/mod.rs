pub mod password;
pub mod rules;

// Re-export commonly used types
pub use password::{password_strength, PasswordStrength, StrengthLevel};
pub use rules::{
    auth_rules, login_rules, validate_chain, validate_field, validate_field_in_form, validate_form,
    FieldError, FormData, FormRules, ValidationRule,
};
