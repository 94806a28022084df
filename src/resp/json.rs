//! Conversion between JSON request/response bodies and stored BSON documents.
//!
//! Object ids leave the API as plain hex strings and dates as RFC 3339
//! strings, which is how clients already see them.

use bson::{Bson, Document};
use rocket::serde::json::{self, Json};
use serde_json::{Map, Value};

use crate::resp::problem::{problems, Problem};

/// Request body as received. Parse failures are kept so handlers can report
/// them after their permission check.
pub type JsonBody<'r> = Result<Json<Value>, json::Error<'r>>;

pub fn parse_body(body: JsonBody<'_>) -> Result<Document, Problem> {
    match body {
        Ok(value) => body_to_document(value.into_inner()),
        Err(e) => Err(problems::parse_problem().detail(e).to_owned()),
    }
}

pub fn body_to_document(body: Value) -> Result<Document, Problem> {
    match Bson::try_from(body) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(problems::body_not_object()),
        Err(e) => Err(problems::parse_problem().detail(e).to_owned()),
    }
}

pub fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        Bson::DateTime(date) => Value::String(date.to_chrono().to_rfc3339()),
        Bson::Document(doc) => document_to_json(doc),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

pub fn document_to_json(doc: Document) -> Value {
    Value::Object(
        doc.into_iter()
            .map(|(k, v)| (k, bson_to_json(v)))
            .collect::<Map<String, Value>>(),
    )
}

pub fn documents_to_json(docs: Vec<Document>) -> Value {
    Value::Array(docs.into_iter().map(document_to_json).collect())
}
