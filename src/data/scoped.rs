use bson::oid::ObjectId;
use bson::{doc, Bson, Document};

use super::schema::{cast, FieldType, Schema, Variant, ID_FIELD};
use super::store::Store;
use crate::error::{StoreError, ValidationError};

/// Parses an identifier taken from the request path.
pub fn parse_id(raw: &str) -> Result<ObjectId, ValidationError> {
    match cast(ID_FIELD, FieldType::ObjectId, Bson::String(raw.to_string()))? {
        Bson::ObjectId(id) => Ok(id),
        _ => Err(ValidationError::Cast {
            path: ID_FIELD.to_string(),
            expected: "ObjectId",
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug, Clone, Copy)]
struct Scope {
    field: &'static str,
    id: ObjectId,
}

/// CRUD over one collection, optionally restricted to documents whose parent
/// field equals a given id. The parent id always comes from the request path;
/// it's added to every filter and can't be changed through a body.
pub struct ScopedCollection<'a> {
    store: &'a Store,
    schema: &'static Schema,
    scope: Option<Scope>,
}

impl<'a> ScopedCollection<'a> {
    pub fn new(store: &'a Store, schema: &'static Schema) -> ScopedCollection<'a> {
        ScopedCollection {
            store,
            schema,
            scope: None,
        }
    }

    pub fn scoped(mut self, field: &'static str, id: ObjectId) -> ScopedCollection<'a> {
        self.scope = Some(Scope { field, id });
        self
    }

    fn scope_filter(&self, mut filter: Document) -> Document {
        if let Some(scope) = self.scope {
            filter.insert(scope.field, scope.id);
        }
        filter
    }

    fn id_filter(&self, id: ObjectId) -> Document {
        self.scope_filter(doc! { ID_FIELD: id })
    }

    pub async fn list(&self, query: &[(String, String)]) -> Result<Vec<Document>, StoreError> {
        let filter = self
            .schema
            .cast_filter(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        self.store
            .find(self.schema.collection, self.scope_filter(filter))
            .await
    }

    pub async fn create(
        &self,
        variant: Option<&Variant>,
        mut body: Document,
    ) -> Result<Document, StoreError> {
        body.remove(ID_FIELD);
        if let Some(scope) = self.scope {
            body.insert(scope.field, scope.id);
        }

        let mut doc = doc! { ID_FIELD: ObjectId::new() };
        doc.extend(self.schema.validate(variant, body)?);

        self.store
            .insert_one(self.schema.collection, doc.clone())
            .await?;
        tracing::debug!("created document in '{}'", self.schema.collection);

        Ok(doc)
    }

    pub async fn get(&self, id: ObjectId) -> Result<Option<Document>, StoreError> {
        self.store
            .find_one(self.schema.collection, self.id_filter(id))
            .await
    }

    pub async fn update(&self, id: ObjectId, body: Document) -> Result<Option<Document>, StoreError> {
        let mut update = self.schema.cast_update(body)?;
        if let Some(scope) = self.scope {
            update.remove(scope.field);
        }

        self.store
            .find_one_and_update(self.schema.collection, self.id_filter(id), update)
            .await
    }

    /// Returns whether a document was removed.
    pub async fn delete_one(&self, id: ObjectId) -> Result<bool, StoreError> {
        let deleted = self
            .store
            .delete_one(self.schema.collection, self.id_filter(id))
            .await?;
        Ok(deleted > 0)
    }

    pub async fn delete_many(&self, query: &[(String, String)]) -> Result<u64, StoreError> {
        let filter = self
            .schema
            .cast_filter(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        let deleted = self
            .store
            .delete_many(self.schema.collection, self.scope_filter(filter))
            .await?;
        tracing::debug!(
            "deleted {} document(s) from '{}'",
            deleted,
            self.schema.collection
        );
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::question::{QUESTION_PARENT_FIELD, QUESTION_SCHEMA};
    use crate::data::store::MemoryStore;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(parse_id("5f1b2c3d4e5f6a7b8c9d0e1f").is_ok());
        assert!(matches!(
            parse_id("not-an-id"),
            Err(ValidationError::Cast { .. })
        ));
    }

    #[rocket::async_test]
    async fn create_injects_parent_over_body_value() {
        let store = Store::new(MemoryStore::new());
        let parent = ObjectId::new();
        let questions = ScopedCollection::new(&store, &QUESTION_SCHEMA)
            .scoped(QUESTION_PARENT_FIELD, parent);

        let created = questions
            .create(
                QUESTION_SCHEMA.variant("text"),
                doc! { "courseMaterial": ObjectId::new(), "prompt": "Why?" },
            )
            .await
            .unwrap();

        assert_eq!(created.get_object_id("courseMaterial").unwrap(), parent);
        let id = created.get_object_id("_id").unwrap();
        assert_eq!(questions.get(id).await.unwrap(), Some(created));
    }

    #[rocket::async_test]
    async fn other_parents_are_invisible() {
        let store = Store::new(MemoryStore::new());
        let mine = ScopedCollection::new(&store, &QUESTION_SCHEMA)
            .scoped(QUESTION_PARENT_FIELD, ObjectId::new());
        let theirs = ScopedCollection::new(&store, &QUESTION_SCHEMA)
            .scoped(QUESTION_PARENT_FIELD, ObjectId::new());

        let created = theirs
            .create(QUESTION_SCHEMA.variant("text"), doc! {})
            .await
            .unwrap();
        let id = created.get_object_id("_id").unwrap();

        assert_eq!(mine.get(id).await.unwrap(), None);
        assert_eq!(mine.update(id, doc! { "prompt": "x" }).await.unwrap(), None);
        assert!(!mine.delete_one(id).await.unwrap());
        assert!(mine.list(&[]).await.unwrap().is_empty());
        assert_eq!(theirs.list(&[]).await.unwrap().len(), 1);
    }

    #[rocket::async_test]
    async fn update_cannot_move_document() {
        let store = Store::new(MemoryStore::new());
        let parent = ObjectId::new();
        let questions = ScopedCollection::new(&store, &QUESTION_SCHEMA)
            .scoped(QUESTION_PARENT_FIELD, parent);

        let created = questions
            .create(QUESTION_SCHEMA.variant("mult"), doc! { "options": ["a"] })
            .await
            .unwrap();
        let id = created.get_object_id("_id").unwrap();

        let updated = questions
            .update(
                id,
                doc! { "courseMaterial": ObjectId::new(), "kind": "TextQuestion", "options": ["a", "b"] },
            )
            .await
            .unwrap()
            .expect("question should exist");

        assert_eq!(updated.get_object_id("courseMaterial").unwrap(), parent);
        assert_eq!(updated.get_str("kind").unwrap(), "MultChoiceQuestion");
        assert_eq!(updated.get_array("options").unwrap().len(), 2);
    }

    #[rocket::async_test]
    async fn delete_many_honours_query_and_scope() {
        let store = Store::new(MemoryStore::new());
        let questions = ScopedCollection::new(&store, &QUESTION_SCHEMA)
            .scoped(QUESTION_PARENT_FIELD, ObjectId::new());

        for week in ["1", "1", "2"] {
            questions
                .create(QUESTION_SCHEMA.variant("text"), doc! { "week": week })
                .await
                .unwrap();
        }

        assert_eq!(questions.delete_many(&pairs(&[("week", "1")])).await.unwrap(), 2);
        assert_eq!(questions.delete_many(&pairs(&[("week", "9")])).await.unwrap(), 0);
        assert_eq!(questions.list(&[]).await.unwrap().len(), 1);
    }
}
