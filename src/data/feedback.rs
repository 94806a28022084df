use bson::Bson;
use serde::Serialize;
use utoipa::ToSchema;

use super::schema::{Field, FieldType, Schema, Variant};

pub const FEEDBACK_COLLECTION_NAME: &str = "feedbacks";

/// Field holding the assignment the feedback was left on.
pub const FEEDBACK_PARENT_FIELD: &str = "assignment";

const FEEDBACK_BASE: &[Field] = &[
    Field::required("instructor", FieldType::ObjectId),
    Field::required("assignment", FieldType::ObjectId),
    Field::required("student", FieldType::ObjectId),
    Field::required("comment", FieldType::String),
];

// Covers both projects and exercises.
const CODING_FIELDS: &[Field] = &[
    Field::required("filename", FieldType::String),
    Field::required("extension", FieldType::String),
    Field::optional("lineNum", FieldType::Number).with_default(|| Bson::Null),
];

const NON_CODING_FIELDS: &[Field] = &[Field::required("questionNum", FieldType::Number)];

const FEEDBACK_VARIANTS: &[Variant] = &[
    Variant {
        name: "coding",
        tag: "CodingFeedback",
        fields: CODING_FIELDS,
    },
    Variant {
        name: "noncoding",
        tag: "NonCodingFeedback",
        fields: NON_CODING_FIELDS,
    },
];

pub static FEEDBACK_SCHEMA: Schema = Schema {
    collection: FEEDBACK_COLLECTION_NAME,
    discriminator_key: Some("kind"),
    base: FEEDBACK_BASE,
    variants: FEEDBACK_VARIANTS,
    strict: true,
};

/// Stored feedback, as served by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind")]
pub enum FeedbackDocument {
    CodingFeedback {
        #[serde(rename = "_id")]
        id: String,
        instructor: String,
        assignment: String,
        student: String,
        comment: String,
        filename: String,
        extension: String,
        #[serde(rename = "lineNum")]
        line_num: Option<f64>,
    },
    NonCodingFeedback {
        #[serde(rename = "_id")]
        id: String,
        instructor: String,
        assignment: String,
        student: String,
        comment: String,
        #[serde(rename = "questionNum")]
        question_num: f64,
    },
}
