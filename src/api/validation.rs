use actix_web::{error::InternalError, HttpResponse};
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

fn bad_request(error: &str, fields: serde_json::Map<String, serde_json::Value>) -> actix_web::Error {
    let body = ErrorResponse {
        error: error.to_string(),
        fields: serde_json::Value::Object(fields),
    };
    InternalError::from_response("", HttpResponse::BadRequest().json(body)).into()
}

/// Collect per-field messages as `{"field": {"errors": [...]}}`
pub fn field_messages(errors: &ValidationErrors) -> serde_json::Map<String, serde_json::Value> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation error in field: {}", field))
                })
                .collect();
            (field.to_string(), serde_json::json!({ "errors": messages }))
        })
        .collect()
}

fn deserialize_message(err: &str) -> &'static str {
    if err.contains("EOF while parsing") {
        "Request body is empty. Expected JSON payload"
    } else if err.contains("unknown variant") {
        "Invalid enum value. Check allowed values for this field"
    } else if err.contains("missing field") {
        "A required field is missing"
    } else {
        "Invalid JSON format"
    }
}

/// JSON extractor config shared by every route
pub fn json_config() -> actix_web_validator::JsonConfig {
    actix_web_validator::JsonConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(errors) => {
            bad_request("Validation failed", field_messages(&errors))
        }
        actix_web_validator::Error::Deserialize(de_err) => {
            let mut fields = serde_json::Map::new();
            fields.insert(
                "message".to_string(),
                serde_json::json!(deserialize_message(&de_err.to_string())),
            );
            bad_request("Request validation failed", fields)
        }
        _ => {
            let mut fields = serde_json::Map::new();
            fields.insert("message".to_string(), serde_json::json!("Validation error"));
            bad_request("Validation failed", fields)
        }
    })
}

/// Query extractor config; same error shape as [`json_config`]
pub fn query_config() -> actix_web_validator::QueryConfig {
    actix_web_validator::QueryConfig::default().error_handler(|err, _req| match err {
        actix_web_validator::Error::Validate(errors) => {
            bad_request("Validation failed", field_messages(&errors))
        }
        _ => {
            let mut fields = serde_json::Map::new();
            fields.insert("message".to_string(), serde_json::json!("Invalid query string"));
            bad_request("Request validation failed", fields)
        }
    })
}
