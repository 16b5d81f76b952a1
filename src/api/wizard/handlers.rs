use actix_web::{
    delete, get, post, put,
    web::{scope, Data, Path, ServiceConfig},
    HttpResponse,
};
use actix_web_validator::{Json, Query};

use super::models::{
    ConnectionTestRequest, DetailsRequest, MappingsRequest, ObjectSearchQuery, ScheduleRequest,
    SelectObjectRequest, TestRunRequest,
};
use super::service::WizardService;
use crate::api::auth::AuthService;
use crate::api::error::ServiceError;

type Handled = Result<HttpResponse, ServiceError>;

#[get("")]
async fn get_wizard(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.view()))
}

#[post("/next")]
async fn next(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.next()?))
}

#[post("/previous")]
async fn previous(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.previous()))
}

/// Jump to a 1-based step
#[post("/steps/{step}")]
async fn go_to(auth: Data<AuthService>, wizard: Data<WizardService>, path: Path<usize>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.go_to(path.into_inner())?))
}

#[put("/details")]
async fn update_details(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<DetailsRequest>,
) -> Handled {
    auth.authorize()?;
    let DetailsRequest { name, description } = req.into_inner();
    Ok(HttpResponse::Ok().json(wizard.update_details(name, description)?))
}

#[post("/connections/test")]
async fn test_connection(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<ConnectionTestRequest>,
) -> Handled {
    auth.authorize()?;
    let view = wizard.test_connection(req.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/objects/load")]
async fn load_objects(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.load_objects().await?))
}

#[get("/objects")]
async fn list_objects(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    query: Query<ObjectSearchQuery>,
) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.objects(query.search.as_deref())?))
}

#[put("/object")]
async fn select_object(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<SelectObjectRequest>,
) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.select_object(req.into_inner().object)?))
}

#[put("/mappings")]
async fn update_mappings(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<MappingsRequest>,
) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.update_mappings(req.into_inner().mappings)?))
}

#[post("/mappings/check")]
async fn check_mappings(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.check_mappings()?))
}

#[post("/test-run")]
async fn run_test(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<TestRunRequest>,
) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.run_test(req.sample_size).await?))
}

#[put("/schedule")]
async fn update_schedule(
    auth: Data<AuthService>,
    wizard: Data<WizardService>,
    req: Json<ScheduleRequest>,
) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.update_schedule(req.into_inner().into())?))
}

#[delete("/error")]
async fn dismiss_error(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.dismiss_error()))
}

#[post("/draft")]
async fn save_draft(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.save_draft()?))
}

#[delete("/draft")]
async fn clear_draft(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.clear_draft()?))
}

#[post("/draft/restore")]
async fn restore_draft(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Ok().json(wizard.restore_draft()?))
}

#[post("/jobs")]
async fn create_job(auth: Data<AuthService>, wizard: Data<WizardService>) -> Handled {
    auth.authorize()?;
    Ok(HttpResponse::Created().json(wizard.create_job()?))
}

pub fn wizard_config(config: &mut ServiceConfig) {
    config.service(
        scope("/wizard")
            .service(get_wizard)
            .service(next)
            .service(previous)
            .service(go_to)
            .service(update_details)
            .service(test_connection)
            .service(load_objects)
            .service(list_objects)
            .service(select_object)
            .service(update_mappings)
            .service(check_mappings)
            .service(run_test)
            .service(update_schedule)
            .service(dismiss_error)
            .service(save_draft)
            .service(clear_draft)
            .service(restore_draft)
            .service(create_job),
    );
}
