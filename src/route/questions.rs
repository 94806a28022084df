use rocket::http::Status;
use rocket::serde::json::{Json, Value};
use rocket::State;

use crate::data::question::{QuestionDocument, QUESTION_PARENT_FIELD, QUESTION_SCHEMA};
use crate::data::scoped::{parse_id, ScopedCollection};
use crate::data::store::Store;
use crate::middleware::query::QueryFilter;
use crate::resp::json::{document_to_json, documents_to_json, parse_body, JsonBody};
use crate::resp::jwt::Identity;
use crate::resp::problem::{problems, Problem};

fn questions<'a>(store: &'a Store, course_mat_id: &str) -> Result<ScopedCollection<'a>, Problem> {
    let parent = parse_id(course_mat_id)?;
    Ok(ScopedCollection::new(store, &QUESTION_SCHEMA).scoped(QUESTION_PARENT_FIELD, parent))
}

#[inline]
fn question_not_found() -> Problem {
    problems::not_found("Question")
}

/// List questions of a course material
///
/// Any query parameter is matched by equality against question fields.
#[utoipa::path(
    params(
        ("course_mat_id", description = "course material ID")
    ),
    responses(
        (status = 200, description = "Matching questions", body = Vec<QuestionDocument>),
        (status = 401, description = "Missing or invalid token", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/course-material/<course_mat_id>/questions")]
#[tracing::instrument(skip(store))]
pub async fn question_list(
    course_mat_id: &str,
    _auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let found = questions(store, course_mat_id)?.list(query.pairs()).await?;
    Ok(Json(documents_to_json(found)))
}

/// Create a question
///
/// The `type` query selects the question kind; the course material ID from the
/// path is stored as the question's parent.
#[utoipa::path(
    request_body = QuestionDocument,
    params(
        ("course_mat_id", description = "course material ID"),
        ("type" = String, Query, description = "`mult` or `text`")
    ),
    responses(
        (status = 201, description = "Created question", body = QuestionDocument),
        (status = 403, description = "Caller isn't an admin or `type` is missing", body = Problem),
        (status = 500, description = "Validation or store failure", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post(
    "/course-material/<course_mat_id>/questions",
    data = "<body>"
)]
#[tracing::instrument(skip(store))]
pub async fn question_create(
    course_mat_id: &str,
    auth: Identity,
    query: QueryFilter,
    body: JsonBody<'_>,
    store: &State<Store>,
) -> Result<(Status, Json<Value>), Problem> {
    auth.require_admin()?;

    let variant = query
        .get("type")
        .and_then(|t| QUESTION_SCHEMA.variant(t))
        .ok_or_else(problems::missing_type)?;

    let body = parse_body(body)?;
    let created = questions(store, course_mat_id)?
        .create(Some(variant), body)
        .await?;

    Ok((Status::Created, Json(document_to_json(created))))
}

/// Delete every matching question of a course material
#[utoipa::path(
    params(
        ("course_mat_id", description = "course material ID")
    ),
    responses(
        (status = 204, description = "Matching questions removed (possibly none)"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/course-material/<course_mat_id>/questions")]
#[tracing::instrument(skip(store))]
pub async fn question_delete_many(
    course_mat_id: &str,
    auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;

    questions(store, course_mat_id)?
        .delete_many(query.pairs())
        .await?;

    Ok(Status::NoContent)
}

/// Get a question
#[utoipa::path(
    params(
        ("course_mat_id", description = "course material ID"),
        ("q_id", description = "question ID")
    ),
    responses(
        (status = 200, description = "The question", body = QuestionDocument),
        (status = 404, description = "No such question under this course material", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/course-material/<course_mat_id>/questions/<q_id>")]
#[tracing::instrument(skip(store))]
pub async fn question_get(
    course_mat_id: &str,
    q_id: &str,
    _auth: Identity,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let id = parse_id(q_id)?;

    questions(store, course_mat_id)?
        .get(id)
        .await?
        .map(|q| Json(document_to_json(q)))
        .ok_or_else(question_not_found)
}

/// Delete a question
#[utoipa::path(
    params(
        ("course_mat_id", description = "course material ID"),
        ("q_id", description = "question ID")
    ),
    responses(
        (status = 204, description = "Question removed"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "No such question under this course material", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/course-material/<course_mat_id>/questions/<q_id>")]
#[tracing::instrument(skip(store))]
pub async fn question_delete(
    course_mat_id: &str,
    q_id: &str,
    auth: Identity,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;
    let id = parse_id(q_id)?;

    if questions(store, course_mat_id)?.delete_one(id).await? {
        Ok(Status::NoContent)
    } else {
        Err(question_not_found())
    }
}

/// Update a question
///
/// Fields in the body are set on the stored question. The ID, kind and parent
/// course material can't be changed.
#[utoipa::path(
    request_body = QuestionDocument,
    params(
        ("course_mat_id", description = "course material ID"),
        ("q_id", description = "question ID")
    ),
    responses(
        (status = 200, description = "Updated question", body = QuestionDocument),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "No such question under this course material", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[put(
    "/course-material/<course_mat_id>/questions/<q_id>",
    data = "<body>"
)]
#[tracing::instrument(skip(store))]
pub async fn question_update(
    course_mat_id: &str,
    q_id: &str,
    auth: Identity,
    body: JsonBody<'_>,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    auth.require_admin()?;
    let id = parse_id(q_id)?;
    let body = parse_body(body)?;

    questions(store, course_mat_id)?
        .update(id, body)
        .await?
        .map(|q| Json(document_to_json(q)))
        .ok_or_else(question_not_found)
}

///////////////////////
//       TESTS
///////////////////////
