//! Declarative document shapes.
//!
//! A [`Schema`] lists the fields every document of a collection has, plus the
//! extra fields of each discriminated variant. Documents, query filters and
//! updates are cast through it before they reach the store, so values arriving
//! as JSON strings end up stored with the field's declared type.

use bson::oid::ObjectId;
use bson::{Bson, Document};

use crate::error::ValidationError;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldType {
    ObjectId,
    String,
    Number,
    Boolean,
    Array,
    /// Stored as received.
    Mixed,
}

impl FieldType {
    fn name(self) -> &'static str {
        match self {
            FieldType::ObjectId => "ObjectId",
            FieldType::String => "string",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Array => "Array",
            FieldType::Mixed => "Mixed",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub default: Option<fn() -> Bson>,
}

impl Field {
    pub const fn required(name: &'static str, ty: FieldType) -> Field {
        Field {
            name,
            ty,
            required: true,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Field {
        Field {
            name,
            ty,
            required: false,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: fn() -> Bson) -> Field {
        self.default = Some(default);
        self
    }
}

/// One subtype of a discriminated collection.
#[derive(Debug, Clone, Copy)]
pub struct Variant {
    /// Value clients use to select the variant (`?type=`).
    pub name: &'static str,
    /// Value stored under the discriminator key.
    pub tag: &'static str,
    pub fields: &'static [Field],
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub collection: &'static str,
    pub discriminator_key: Option<&'static str>,
    pub base: &'static [Field],
    pub variants: &'static [Variant],
    /// Strict schemas drop fields they don't declare.
    pub strict: bool,
}

impl Schema {
    pub fn variant(&self, name: &str) -> Option<&'static Variant> {
        self.variants.iter().find(|v| v.name == name)
    }

    fn field(&self, name: &str) -> Option<&'static Field> {
        self.base
            .iter()
            .chain(self.variants.iter().flat_map(|v| v.fields.iter()))
            .find(|f| f.name == name)
    }

    fn field_type(&self, name: &str) -> Option<FieldType> {
        if name == ID_FIELD {
            return Some(FieldType::ObjectId);
        }
        self.field(name).map(|f| f.ty)
    }

    /// Shapes a new document: applies defaults, casts declared fields, checks
    /// required ones and stamps the discriminator tag.
    pub fn validate(
        &self,
        variant: Option<&Variant>,
        mut doc: Document,
    ) -> Result<Document, ValidationError> {
        let fields = self
            .base
            .iter()
            .chain(variant.into_iter().flat_map(|v| v.fields.iter()));

        let mut out = Document::new();
        if let Some(id) = doc.remove(ID_FIELD) {
            out.insert(ID_FIELD, cast(ID_FIELD, FieldType::ObjectId, id)?);
        }

        for field in fields {
            let value = match doc.remove(field.name) {
                Some(Bson::Null) | None => field.default.map(|f| f()),
                Some(v) => Some(cast(field.name, field.ty, v)?),
            };

            match value {
                Some(Bson::Null) | None if field.required => {
                    return Err(ValidationError::Required(field.name.to_string()))
                }
                Some(v) => {
                    out.insert(field.name, v);
                }
                None => {}
            }
        }

        if let Some(key) = self.discriminator_key {
            doc.remove(key);
        }
        if !self.strict {
            out.extend(doc);
        }

        if let (Some(key), Some(v)) = (self.discriminator_key, variant) {
            out.insert(key, v.tag);
        }

        Ok(out)
    }

    /// Casts an update body. Declared fields of any variant are cast, `_id` and
    /// the discriminator key are dropped, undeclared fields follow `strict`.
    pub fn cast_update(&self, doc: Document) -> Result<Document, ValidationError> {
        let mut out = Document::new();
        for (key, value) in doc {
            if key == ID_FIELD || Some(key.as_str()) == self.discriminator_key {
                continue;
            }
            match self.field(&key) {
                Some(field) => {
                    let value = match value {
                        Bson::Null => Bson::Null,
                        v => cast(field.name, field.ty, v)?,
                    };
                    out.insert(key, value);
                }
                None if !self.strict => {
                    out.insert(key, value);
                }
                None => {}
            }
        }
        Ok(out)
    }

    /// Builds an equality filter from raw query-string pairs.
    pub fn cast_filter<'a>(
        &self,
        pairs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Document, ValidationError> {
        let mut filter = Document::new();
        for (key, raw) in pairs {
            // Filters are equality only; `$where`, `$expr` and friends stay out.
            if key.starts_with('$') {
                return Err(ValidationError::Operator(key.to_string()));
            }
            let value = match self.field_type(key) {
                Some(ty @ (FieldType::ObjectId | FieldType::Number | FieldType::Boolean)) => {
                    cast(key, ty, Bson::String(raw.to_string()))?
                }
                _ => Bson::String(raw.to_string()),
            };
            filter.insert(key, value);
        }
        Ok(filter)
    }
}

fn cast_error(path: &str, ty: FieldType, value: &Bson) -> ValidationError {
    let value = match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    };
    ValidationError::Cast {
        path: path.to_string(),
        expected: ty.name(),
        value,
    }
}

/// Casts `value` to `ty` the way an ODM would on save.
pub fn cast(path: &str, ty: FieldType, value: Bson) -> Result<Bson, ValidationError> {
    match (ty, value) {
        (FieldType::Mixed, v) => Ok(v),
        (_, Bson::Null) => Ok(Bson::Null),

        (FieldType::ObjectId, Bson::ObjectId(id)) => Ok(Bson::ObjectId(id)),
        (FieldType::ObjectId, Bson::String(s)) => ObjectId::parse_str(s.trim())
            .map(Bson::ObjectId)
            .map_err(|_| cast_error(path, ty, &Bson::String(s))),

        (FieldType::String, Bson::String(s)) => Ok(Bson::String(s)),
        (FieldType::String, v @ (Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_))) => {
            Ok(Bson::String(v.to_string()))
        }
        (FieldType::String, Bson::Boolean(b)) => Ok(Bson::String(b.to_string())),
        (FieldType::String, Bson::ObjectId(id)) => Ok(Bson::String(id.to_hex())),

        (FieldType::Number, Bson::Double(n)) => Ok(Bson::Double(n)),
        (FieldType::Number, Bson::Int32(n)) => Ok(Bson::Double(n as f64)),
        (FieldType::Number, Bson::Int64(n)) => Ok(Bson::Double(n as f64)),
        (FieldType::Number, Bson::String(s)) if s.trim().is_empty() => Ok(Bson::Null),
        (FieldType::Number, Bson::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Bson::Double(n)),
            _ => Err(cast_error(path, ty, &Bson::String(s))),
        },
        (FieldType::Number, Bson::Boolean(b)) => Ok(Bson::Double(if b { 1.0 } else { 0.0 })),

        (FieldType::Boolean, Bson::Boolean(b)) => Ok(Bson::Boolean(b)),
        (FieldType::Boolean, Bson::String(s)) => match s.as_str() {
            "true" | "1" | "yes" => Ok(Bson::Boolean(true)),
            "false" | "0" | "no" => Ok(Bson::Boolean(false)),
            _ => Err(cast_error(path, ty, &Bson::String(s))),
        },
        (FieldType::Boolean, Bson::Int32(n)) if n == 0 || n == 1 => Ok(Bson::Boolean(n == 1)),
        (FieldType::Boolean, Bson::Int64(n)) if n == 0 || n == 1 => Ok(Bson::Boolean(n == 1)),

        (FieldType::Array, Bson::Array(items)) => Ok(Bson::Array(items)),
        (FieldType::Array, v) => Ok(Bson::Array(vec![v])),

        (ty, v) => Err(cast_error(path, ty, &v)),
    }
}
