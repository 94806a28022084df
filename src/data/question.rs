use serde::Serialize;
use utoipa::ToSchema;

use super::schema::{Field, FieldType, Schema, Variant};

pub const QUESTION_COLLECTION_NAME: &str = "questions";

/// Field holding the owning course material.
pub const QUESTION_PARENT_FIELD: &str = "courseMaterial";

const QUESTION_BASE: &[Field] = &[Field::required("courseMaterial", FieldType::ObjectId)];

const MULT_CHOICE_FIELDS: &[Field] = &[Field::required("options", FieldType::Array)];

const QUESTION_VARIANTS: &[Variant] = &[
    Variant {
        name: "mult",
        tag: "MultChoiceQuestion",
        fields: MULT_CHOICE_FIELDS,
    },
    Variant {
        name: "text",
        tag: "TextQuestion",
        fields: &[],
    },
];

/// Questions keep fields they don't declare; course material authors attach
/// prompts, answers and points freely.
pub static QUESTION_SCHEMA: Schema = Schema {
    collection: QUESTION_COLLECTION_NAME,
    discriminator_key: Some("kind"),
    base: QUESTION_BASE,
    variants: QUESTION_VARIANTS,
    strict: false,
};

/// Stored question, as served by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind")]
pub enum QuestionDocument {
    MultChoiceQuestion {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "courseMaterial")]
        course_material: String,
        options: Vec<String>,
    },
    TextQuestion {
        #[serde(rename = "_id")]
        id: String,
        #[serde(rename = "courseMaterial")]
        course_material: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn mult_requires_options() {
        let parent = ObjectId::new();
        let err = QUESTION_SCHEMA
            .validate(QUESTION_SCHEMA.variant("mult"), doc! { "courseMaterial": parent })
            .unwrap_err();
        assert_eq!(err.to_string(), "Path `options` is required.");
    }

    #[test]
    fn text_keeps_free_fields() {
        let parent = ObjectId::new();
        let out = QUESTION_SCHEMA
            .validate(
                QUESTION_SCHEMA.variant("text"),
                doc! { "courseMaterial": parent.to_hex(), "prompt": "Explain ownership." },
            )
            .unwrap();

        assert_eq!(
            out,
            doc! { "courseMaterial": parent, "prompt": "Explain ownership.", "kind": "TextQuestion" }
        );
    }

    #[test]
    fn unknown_type_has_no_variant() {
        assert!(QUESTION_SCHEMA.variant("essay").is_none());
        assert!(QUESTION_SCHEMA.variant("").is_none());
    }
}
