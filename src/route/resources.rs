use rocket::http::Status;
use rocket::serde::json::{Json, Value};
use rocket::State;

use crate::data::resource::Resource;
use crate::data::scoped::{parse_id, ScopedCollection};
use crate::data::store::Store;
use crate::middleware::query::QueryFilter;
use crate::resp::json::{document_to_json, documents_to_json, parse_body, JsonBody};
use crate::resp::jwt::Identity;
use crate::resp::problem::{problems, Problem};

fn resource(path: &str) -> Result<Resource, Problem> {
    Resource::from_path(path).ok_or_else(|| problems::not_found("Resource"))
}

fn collection(store: &Store, resource: Resource) -> ScopedCollection<'_> {
    ScopedCollection::new(store, resource.schema())
}

/// List documents of a resource family
#[utoipa::path(
    params(
        ("resource", description = "one of `cohorts`, `days`, `assignments`, `course-material`, `skills-tree`, `branches`")
    ),
    responses(
        (status = 200, description = "Matching documents"),
        (status = 404, description = "Unknown resource", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/<resource>")]
#[tracing::instrument(skip(store))]
pub async fn resource_list(
    resource: &str,
    _auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let resource = self::resource(resource)?;
    let found = collection(store, resource).list(query.pairs()).await?;
    Ok(Json(documents_to_json(found)))
}

/// Create a document in a resource family
#[utoipa::path(
    params(
        ("resource", description = "resource family")
    ),
    request_body = Value,
    responses(
        (status = 201, description = "Created document"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "Unknown resource", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/<resource>", data = "<body>")]
#[tracing::instrument(skip(store))]
pub async fn resource_create(
    resource: &str,
    auth: Identity,
    body: JsonBody<'_>,
    store: &State<Store>,
) -> Result<(Status, Json<Value>), Problem> {
    auth.require_admin()?;
    let resource = self::resource(resource)?;

    let body = parse_body(body)?;
    let created = collection(store, resource).create(None, body).await?;

    Ok((Status::Created, Json(document_to_json(created))))
}

/// Delete matching documents of a resource family
#[utoipa::path(
    params(
        ("resource", description = "resource family")
    ),
    responses(
        (status = 204, description = "Matching documents removed (possibly none)"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/<resource>")]
#[tracing::instrument(skip(store))]
pub async fn resource_delete_many(
    resource: &str,
    auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;
    let resource = self::resource(resource)?;

    collection(store, resource)
        .delete_many(query.pairs())
        .await?;

    Ok(Status::NoContent)
}

/// Get one document of a resource family
#[utoipa::path(
    params(
        ("resource", description = "resource family"),
        ("id", description = "document ID")
    ),
    responses(
        (status = 200, description = "The document"),
        (status = 404, description = "Unknown resource or document", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/<resource>/<id>")]
#[tracing::instrument(skip(store))]
pub async fn resource_get(
    resource: &str,
    id: &str,
    _auth: Identity,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let resource = self::resource(resource)?;
    let id = parse_id(id)?;

    collection(store, resource)
        .get(id)
        .await?
        .map(|d| Json(document_to_json(d)))
        .ok_or_else(|| problems::not_found(resource.noun()))
}

/// Update one document of a resource family
#[utoipa::path(
    params(
        ("resource", description = "resource family"),
        ("id", description = "document ID")
    ),
    request_body = Value,
    responses(
        (status = 200, description = "Updated document"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "Unknown resource or document", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[put("/<resource>/<id>", data = "<body>")]
#[tracing::instrument(skip(store))]
pub async fn resource_update(
    resource: &str,
    id: &str,
    auth: Identity,
    body: JsonBody<'_>,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    auth.require_admin()?;
    let resource = self::resource(resource)?;
    let id = parse_id(id)?;
    let body = parse_body(body)?;

    collection(store, resource)
        .update(id, body)
        .await?
        .map(|d| Json(document_to_json(d)))
        .ok_or_else(|| problems::not_found(resource.noun()))
}

/// Delete one document of a resource family
#[utoipa::path(
    params(
        ("resource", description = "resource family"),
        ("id", description = "document ID")
    ),
    responses(
        (status = 204, description = "Document removed"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "Unknown resource or document", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/<resource>/<id>")]
#[tracing::instrument(skip(store))]
pub async fn resource_delete(
    resource: &str,
    id: &str,
    auth: Identity,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;
    let resource = self::resource(resource)?;
    let id = parse_id(id)?;

    if collection(store, resource).delete_one(id).await? {
        Ok(Status::NoContent)
    } else {
        Err(problems::not_found(resource.noun()))
    }
}
