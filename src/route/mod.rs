use rocket::{Build, Rocket, Route};

pub mod catchers;
pub mod feedback;
pub mod questions;
pub mod resources;

use feedback::*;
use questions::*;
use resources::*;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    data::{feedback::FeedbackDocument, question::QuestionDocument},
    resp::{jwt::doc::JwtAuth, problem::Problem},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        question_list,
        question_create,
        question_delete_many,
        question_get,
        question_delete,
        question_update,
        feedback_list,
        feedback_create,
        feedback_delete_many,
        feedback_get,
        feedback_delete,
        resource_list,
        resource_create,
        resource_delete_many,
        resource_get,
        resource_update,
        resource_delete
    ),
    components(schemas(QuestionDocument, FeedbackDocument, Problem)),
    modifiers(&JwtAuth)
)]
pub struct ApiDoc;

pub struct PathPrefix(pub String);

impl utoipa::Modify for PathPrefix {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.paths.paths = std::mem::take(&mut openapi.paths.paths)
            .into_iter()
            .map(|(path, item)| (self.0.trim_end_matches('/').to_string() + &path, item))
            .collect();
    }
}

pub fn openapi(prefix: &str) -> utoipa::openapi::OpenApi {
    use utoipa::Modify;

    let mut doc = ApiDoc::openapi();
    PathPrefix(prefix.to_string()).modify(&mut doc);
    doc
}

/// Every resource router. Each handler takes the caller's [`Identity`], so
/// nothing under the API prefix is reachable without a valid token.
///
/// [`Identity`]: crate::resp::jwt::Identity
pub fn api_routes() -> Vec<Route> {
    routes![
        question_list,
        question_create,
        question_delete_many,
        question_get,
        question_delete,
        question_update,
        feedback_list,
        feedback_create,
        feedback_delete_many,
        feedback_get,
        feedback_delete,
        resource_list,
        resource_create,
        resource_delete_many,
        resource_get,
        resource_update,
        resource_delete
    ]
}

pub fn mount_api(rocket: Rocket<Build>, prefix: &str) -> Rocket<Build> {
    rocket
        .mount(prefix, api_routes())
        .mount(
            "/",
            SwaggerUi::new("/swagger/<_..>").url("/api-docs/openapi.json", openapi(prefix)),
        )
        .register("/", catchers::catchers())
}
