use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::session::SignupData;

/// Login form
///
/// Field rules are checked by the session manager so the first failing
/// field is reported in form order; only size limits are enforced here.
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: String,
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(max = 100, message = "Full name is too long"))]
    pub full_name: String,
    #[validate(length(max = 254, message = "Email is too long"))]
    pub email: String,
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
    #[validate(length(max = 128, message = "Password is too long"))]
    pub confirm_password: String,
}

impl From<SignupRequest> for SignupData {
    fn from(req: SignupRequest) -> Self {
        SignupData {
            full_name: req.full_name,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PasswordStrengthRequest {
    #[validate(length(max = 128, message = "Password is too long"))]
    pub password: String,
}
