use rocket::http::Status;
use rocket::serde::json::{Json, Value};
use rocket::State;

use crate::data::feedback::{FeedbackDocument, FEEDBACK_PARENT_FIELD, FEEDBACK_SCHEMA};
use crate::data::scoped::{parse_id, ScopedCollection};
use crate::data::store::Store;
use crate::middleware::query::QueryFilter;
use crate::resp::json::{document_to_json, documents_to_json, parse_body, JsonBody};
use crate::resp::jwt::Identity;
use crate::resp::problem::{problems, Problem};

fn feedback<'a>(store: &'a Store, assignment_id: &str) -> Result<ScopedCollection<'a>, Problem> {
    let assignment = parse_id(assignment_id)?;
    Ok(ScopedCollection::new(store, &FEEDBACK_SCHEMA).scoped(FEEDBACK_PARENT_FIELD, assignment))
}

/// List feedback left on an assignment
#[utoipa::path(
    params(
        ("assignment_id", description = "assignment ID")
    ),
    responses(
        (status = 200, description = "Matching feedback", body = Vec<FeedbackDocument>),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/assignments/<assignment_id>/feedback")]
#[tracing::instrument(skip(store))]
pub async fn feedback_list(
    assignment_id: &str,
    _auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let found = feedback(store, assignment_id)?.list(query.pairs()).await?;
    Ok(Json(documents_to_json(found)))
}

/// Leave feedback on an assignment
#[utoipa::path(
    request_body = FeedbackDocument,
    params(
        ("assignment_id", description = "assignment ID"),
        ("type" = String, Query, description = "`coding` or `noncoding`")
    ),
    responses(
        (status = 201, description = "Stored feedback", body = FeedbackDocument),
        (status = 403, description = "Caller isn't an admin or `type` is missing", body = Problem),
        (status = 500, description = "Validation or store failure", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[post("/assignments/<assignment_id>/feedback", data = "<body>")]
#[tracing::instrument(skip(store))]
pub async fn feedback_create(
    assignment_id: &str,
    auth: Identity,
    query: QueryFilter,
    body: JsonBody<'_>,
    store: &State<Store>,
) -> Result<(Status, Json<Value>), Problem> {
    auth.require_admin()?;

    let variant = query
        .get("type")
        .and_then(|t| FEEDBACK_SCHEMA.variant(t))
        .ok_or_else(problems::missing_type)?;

    let body = parse_body(body)?;
    let created = feedback(store, assignment_id)?
        .create(Some(variant), body)
        .await?;

    Ok((Status::Created, Json(document_to_json(created))))
}

/// Delete matching feedback on an assignment
#[utoipa::path(
    params(
        ("assignment_id", description = "assignment ID")
    ),
    responses(
        (status = 204, description = "Matching feedback removed (possibly none)"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/assignments/<assignment_id>/feedback")]
#[tracing::instrument(skip(store))]
pub async fn feedback_delete_many(
    assignment_id: &str,
    auth: Identity,
    query: QueryFilter,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;

    feedback(store, assignment_id)?
        .delete_many(query.pairs())
        .await?;

    Ok(Status::NoContent)
}

/// Get one piece of feedback
#[utoipa::path(
    params(
        ("assignment_id", description = "assignment ID"),
        ("feedback_id", description = "feedback ID")
    ),
    responses(
        (status = 200, description = "The feedback", body = FeedbackDocument),
        (status = 404, description = "No such feedback on this assignment", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[get("/assignments/<assignment_id>/feedback/<feedback_id>")]
#[tracing::instrument(skip(store))]
pub async fn feedback_get(
    assignment_id: &str,
    feedback_id: &str,
    _auth: Identity,
    store: &State<Store>,
) -> Result<Json<Value>, Problem> {
    let id = parse_id(feedback_id)?;

    feedback(store, assignment_id)?
        .get(id)
        .await?
        .map(|f| Json(document_to_json(f)))
        .ok_or_else(|| problems::not_found("Feedback"))
}

/// Delete one piece of feedback
#[utoipa::path(
    params(
        ("assignment_id", description = "assignment ID"),
        ("feedback_id", description = "feedback ID")
    ),
    responses(
        (status = 204, description = "Feedback removed"),
        (status = 403, description = "Caller isn't an admin", body = Problem),
        (status = 404, description = "No such feedback on this assignment", body = Problem),
    ),
    security(
        ("jwt" = [])
    )
)]
#[delete("/assignments/<assignment_id>/feedback/<feedback_id>")]
#[tracing::instrument(skip(store))]
pub async fn feedback_delete(
    assignment_id: &str,
    feedback_id: &str,
    auth: Identity,
    store: &State<Store>,
) -> Result<Status, Problem> {
    auth.require_admin()?;
    let id = parse_id(feedback_id)?;

    if feedback(store, assignment_id)?.delete_one(id).await? {
        Ok(Status::NoContent)
    } else {
        Err(problems::not_found("Feedback"))
    }
}

#[cfg(test)]
mod feedback_endpoints {
    use bson::oid::ObjectId;
    use rocket::http::Status;
    use serde_json::{json, Value};

    use crate::testing::{self, TestClient};

    fn feedback_uri(assignment: &ObjectId) -> String {
        format!("/api/assignments/{}/feedback", assignment.to_hex())
    }

    fn base_body() -> Value {
        json!({
            "instructor": ObjectId::new().to_hex(),
            "student": ObjectId::new().to_hex(),
            "comment": "Consider borrowing here instead of cloning.",
        })
    }

    #[rocket::async_test]
    async fn coding_feedback_is_stored_with_defaults() {
        let client = TestClient::new().await;
        let assignment = ObjectId::new();
        let mut body = base_body();
        body["filename"] = json!("main");
        body["extension"] = json!("rs");
        body["ignored"] = json!("not in schema");

        let response = client
            .post(format!("{}?type=coding", feedback_uri(&assignment)), &testing::token(true), &body)
            .await;
        assert_eq!(response.status(), Status::Created);

        let created: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(created["kind"], "CodingFeedback");
        assert_eq!(created["assignment"], assignment.to_hex());
        assert_eq!(created["lineNum"], Value::Null);
        assert!(created.get("ignored").is_none(), "strict schema kept unknown field");

        let uri = format!("{}/{}", feedback_uri(&assignment), created["_id"].as_str().unwrap());
        let response = client.get(uri, &testing::token(false)).await;
        assert_eq!(response.status(), Status::Ok);
        let fetched: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(fetched, created);
    }

    #[rocket::async_test]
    async fn coding_feedback_without_extension_fails_validation() {
        let client = TestClient::new().await;
        let assignment = ObjectId::new();
        let mut body = base_body();
        body["filename"] = json!("main");

        let response = client
            .post(format!("{}?type=coding", feedback_uri(&assignment)), &testing::token(true), &body)
            .await;
        assert_eq!(response.status(), Status::InternalServerError);

        let problem: Value = response.into_json().await.expect("invalid response json");
        assert_eq!(problem["detail"], "Path `extension` is required.");

        let response = client
            .get(feedback_uri(&assignment), &testing::token(false))
            .await;
        let stored: Vec<Value> = response.into_json().await.expect("invalid response json");
        assert!(stored.is_empty(), "invalid feedback was stored");
    }

    #[rocket::async_test]
    async fn list_filters_by_numeric_field() {
        let client = TestClient::new().await;
        let assignment = ObjectId::new();

        for n in [1, 2, 2] {
            let mut body = base_body();
            body["questionNum"] = json!(n);
            let response = client
                .post(
                    format!("{}?type=noncoding", feedback_uri(&assignment)),
                    &testing::token(true),
                    &body,
                )
                .await;
            assert_eq!(response.status(), Status::Created);
        }

        let response = client
            .get(format!("{}?questionNum=2", feedback_uri(&assignment)), &testing::token(false))
            .await;
        let matching: Vec<Value> = response.into_json().await.expect("invalid response json");
        assert_eq!(matching.len(), 2);
    }

    #[rocket::async_test]
    async fn create_without_type_is_forbidden() {
        let client = TestClient::new().await;
        let assignment = ObjectId::new();

        let response = client
            .post(feedback_uri(&assignment), &testing::token(true), &base_body())
            .await;
        assert_eq!(response.status(), Status::Forbidden);
    }

    #[rocket::async_test]
    async fn only_admins_delete_feedback() {
        let client = TestClient::new().await;
        let assignment = ObjectId::new();
        let mut body = base_body();
        body["questionNum"] = json!(3);

        let response = client
            .post(format!("{}?type=noncoding", feedback_uri(&assignment)), &testing::token(true), &body)
            .await;
        let created: Value = response.into_json().await.expect("invalid response json");
        let uri = format!("{}/{}", feedback_uri(&assignment), created["_id"].as_str().unwrap());

        let response = client.delete(uri.clone(), &testing::token(false)).await;
        assert_eq!(response.status(), Status::Forbidden);

        let response = client.delete(uri.clone(), &testing::token(true)).await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client.get(uri, &testing::token(true)).await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
