use actix_web::{get, web, HttpResponse, Responder};
use serde::Serialize;
use tracing::error;

use crate::storage::{KeyValueStore, DRAFT_KEY};

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    storage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// Reads the draft slot to confirm storage is usable.
#[get("/health")]
async fn health_check(store: web::Data<dyn KeyValueStore>) -> impl Responder {
    match store.get(DRAFT_KEY) {
        Ok(_) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            storage: "available".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy".to_string(),
                storage: "unavailable".to_string(),
                error: Some(format!("Storage error: {}", e)),
            })
        }
    }
}

/// Liveness check endpoint; does not touch storage
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        storage: "not_checked".to_string(),
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config.service(health_check).service(liveness_check);
}
