use actix_web::{
    get, post,
    web::{scope, Data, ServiceConfig},
    HttpResponse,
};
use actix_web_validator::Json;

use super::models::{LoginRequest, PasswordStrengthRequest, SignupRequest};
use super::service::AuthService;
use crate::api::error::ServiceError;
use crate::validation::password_strength;

#[post("/login")]
async fn login(
    auth: Data<AuthService>,
    req: Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    let response = auth.login(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/signup")]
async fn signup(
    auth: Data<AuthService>,
    req: Json<SignupRequest>,
) -> Result<HttpResponse, ServiceError> {
    let response = auth.signup(req.into_inner().into()).await?;
    Ok(HttpResponse::Created().json(response))
}

#[post("/logout")]
async fn logout(auth: Data<AuthService>) -> HttpResponse {
    HttpResponse::Ok().json(auth.logout())
}

#[get("/session")]
async fn get_session(auth: Data<AuthService>) -> HttpResponse {
    HttpResponse::Ok().json(auth.session())
}

/// Record user activity to keep the session alive
#[post("/activity")]
async fn activity(auth: Data<AuthService>) -> Result<HttpResponse, ServiceError> {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(auth.session()))
}

#[post("/password-strength")]
async fn strength(req: Json<PasswordStrengthRequest>) -> HttpResponse {
    HttpResponse::Ok().json(password_strength(&req.password))
}

pub fn auth_config(config: &mut ServiceConfig) {
    config.service(
        scope("/auth")
            .service(login)
            .service(signup)
            .service(logout)
            .service(get_session)
            .service(activity)
            .service(strength),
    );
}
