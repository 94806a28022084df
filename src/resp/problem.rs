use std::io::Cursor;

use rocket::http::hyper::header::CONTENT_LANGUAGE;
use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{response, Request, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;

use crate::error::{StoreError, ValidationError};

/// Implements [RFC7807](https://tools.ietf.org/html/rfc7807).
///
/// The rendered body also carries a `message` member equal to the title, which
/// is what API clients read.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Problem {
    #[serde(skip)]
    pub status: Status,
    pub type_uri: String,
    pub title: String,

    pub detail: Option<String>,
    pub instance_uri: Option<String>,

    #[schema(value_type = Object)]
    pub body: Map<String, Value>,
}

impl Default for Problem {
    fn default() -> Self {
        Problem {
            status: Status::InternalServerError,
            type_uri: "about:blank".to_string(),
            title: "Problem".to_string(),
            detail: None,
            instance_uri: None,
            body: Map::new(),
        }
    }
}

impl Problem {
    pub fn new_untyped(status: Status, title: impl ToString) -> Problem {
        Problem {
            status,
            type_uri: "about:blank".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn detail(&mut self, value: impl ToString) -> &mut Problem {
        self.detail = Some(value.to_string());
        self
    }

    pub fn instance_uri(&mut self, value: String) -> &mut Problem {
        self.instance_uri = Some(value);
        self
    }

    pub fn insert_str(&mut self, key: impl ToString, value: impl ToString) -> &mut Problem {
        self.body
            .insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    /// Body as sent to the client.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut body = self.body.clone();

        body.insert(String::from("message"), Value::from(self.title.clone()));

        // Following are required by rfc7807
        body.insert(String::from("type"), Value::from(self.type_uri.clone()));
        body.insert(String::from("title"), Value::from(self.title.clone()));

        // Optional parameters as specified by rfc7807
        if let Some(detail) = &self.detail {
            body.insert(String::from("detail"), Value::from(detail.clone()));
        }
        body.insert(String::from("status"), Value::from(self.status.code));
        if let Some(instance) = &self.instance_uri {
            body.insert(String::from("instance"), Value::from(instance.clone()));
        }

        body
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.title)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({})", detail)?;
        }
        Ok(())
    }
}

impl std::error::Error for Problem {}

impl<'r> Responder<'r, 'static> for Problem {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let body_string = Value::Object(self.to_json()).to_string();

        Response::build()
            .status(self.status)
            .header(ContentType::new("application", "problem+json"))
            .raw_header(CONTENT_LANGUAGE.as_str(), "en")
            .sized_body(body_string.len(), Cursor::new(body_string))
            .ok()
    }
}

pub mod problems {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn parse_problem() -> Problem {
        Problem::new_untyped(
            Status::BadRequest,
            "There was a problem parsing part of the request.",
        )
    }

    #[inline]
    pub fn body_not_object() -> Problem {
        parse_problem()
            .detail("Request body must be a JSON object.")
            .to_owned()
    }

    #[inline]
    pub fn admin_required() -> Problem {
        Problem::new_untyped(Status::Forbidden, "Admin authorization required")
    }

    /// Reported when the `type` query selecting a subtype is missing or
    /// unknown. Kept as 403 for compatibility with existing clients.
    #[inline]
    pub fn missing_type() -> Problem {
        Problem::new_untyped(Status::Forbidden, "Query 'type' must be provided")
    }

    #[inline]
    pub fn not_found(what: &str) -> Problem {
        Problem::new_untyped(Status::NotFound, format!("{} not found", what))
    }

    #[inline]
    pub fn unauthorized(detail: impl ToString) -> Problem {
        Problem::new_untyped(Status::Unauthorized, "Unable to authorize user.")
            .detail(detail)
            .to_owned()
    }
}

impl From<mongodb::error::Error> for Problem {
    fn from(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        fn mongodb_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB failed while processing request.",
            )
        }

        fn access_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "Server was unable to access MongoDB.",
            )
        }

        fn bad_db_request() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "MongoDB was unable to process bad server request.",
            )
        }

        fn bson_problem() -> Problem {
            Problem::new_untyped(
                Status::InternalServerError,
                "There was a problem with handling MongoDB bson.",
            )
        }

        let mut problem = match e.kind.as_ref() {
            ErrorKind::InvalidArgument { .. }
            | ErrorKind::Command(_)
            | ErrorKind::BulkWrite(_) => bad_db_request(),
            ErrorKind::Authentication { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::InvalidTlsConfig { .. }
            | ErrorKind::IncompatibleServer { .. } => access_problem(),
            ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => bson_problem(),
            _ => mongodb_problem(),
        };
        problem.detail(e);
        problem
    }
}

impl From<ValidationError> for Problem {
    fn from(e: ValidationError) -> Self {
        let path = match &e {
            ValidationError::Required(path) | ValidationError::Cast { path, .. } => {
                Some(path.clone())
            }
            ValidationError::Operator(_) => None,
        };

        match path {
            Some(path) => {
                Problem::new_untyped(Status::InternalServerError, "Document validation failed.")
                    .detail(e)
                    .insert_str("path", path)
                    .to_owned()
            }
            // A malformed query, not a failed document.
            None => problems::parse_problem().detail(e).to_owned(),
        }
    }
}

impl From<StoreError> for Problem {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(e) => Problem::from(e),
            StoreError::Database(e) => Problem::from(e),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for Problem {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match e.into_kind() {
            ErrorKind::ExpiredSignature => problems::unauthorized("Expired JWT signature."),
            ErrorKind::InvalidSignature => problems::unauthorized("Invalid JWT signature."),
            _ => problems::unauthorized("Error while handling JWT."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_carries_message_and_rfc7807_members() {
        let body = problems::admin_required().to_json();

        assert_eq!(body["message"], "Admin authorization required");
        assert_eq!(body["title"], "Admin authorization required");
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["status"], 403);
        assert!(!body.contains_key("detail"));
    }

    #[test]
    fn validation_errors_are_server_errors_with_detail() {
        let problem = Problem::from(StoreError::from(ValidationError::Required(
            "extension".to_string(),
        )));

        assert_eq!(problem.status, Status::InternalServerError);
        assert_eq!(
            problem.detail.as_deref(),
            Some("Path `extension` is required.")
        );
        assert_eq!(problem.to_json()["path"], "extension");
    }

    #[test]
    fn operator_keys_are_client_errors() {
        let problem = Problem::from(ValidationError::Operator("$where".to_string()));

        assert_eq!(problem.status, Status::BadRequest);
        assert_eq!(
            problem.detail.as_deref(),
            Some("Query key `$where` is not a field name.")
        );
    }

    #[test]
    fn expired_tokens_are_unauthorized() {
        let e = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        let problem = Problem::from(e);

        assert_eq!(problem.status, Status::Unauthorized);
        assert_eq!(problem.detail.as_deref(), Some("Expired JWT signature."));
    }
}
