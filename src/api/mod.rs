pub mod auth;
pub mod error;
pub mod health;
pub mod validation;
pub mod wizard;

use actix_web::web;

pub use error::ServiceError;

/// Register every route
pub fn routes(config: &mut web::ServiceConfig) {
    config
        .configure(health::health_config)
        .configure(auth::auth_config)
        .configure(wizard::wizard_config);
}
