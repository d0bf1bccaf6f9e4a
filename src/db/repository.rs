use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::{
    CollectionKind, ContentRecord, ListQuery, NewRecord, OrderField, RecordPatch, SortDirection,
};
use crate::error::AppError;

/// Document store operations for content records.
///
/// This trait allows mocking the database layer in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new record. The store assigns the identifier and the creation
    /// timestamp, and defaults `published_at` to the creation timestamp.
    async fn insert(&self, kind: CollectionKind, record: NewRecord) -> Result<ContentRecord, AppError>;

    /// Find a record by its identifier.
    async fn find_by_id(&self, kind: CollectionKind, id: &str) -> Result<Option<ContentRecord>, AppError>;

    /// Apply a partial update and return the updated record.
    ///
    /// Returns `AppError::NotFound` when no record has this identifier.
    async fn update(&self, kind: CollectionKind, id: &str, patch: RecordPatch) -> Result<ContentRecord, AppError>;

    /// Delete a record by its identifier.
    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), AppError>;

    /// List the records of a collection in the requested order.
    async fn list(&self, kind: CollectionKind, query: &ListQuery) -> Result<Vec<ContentRecord>, AppError>;
}

/// MongoDB representation of a content record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<mongodb::bson::oid::ObjectId>,
    fields: BTreeMap<String, String>,
    thumbnail_url: String,
    #[serde(default)]
    gallery: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    published_at: DateTime<Utc>,
}

impl StoredRecord {
    fn into_record(self, kind: CollectionKind) -> Result<ContentRecord, AppError> {
        let id = self
            .id
            .ok_or_else(|| AppError::Database(format!("{kind} record without _id")))?;
        Ok(ContentRecord {
            id: id.to_hex(),
            kind,
            fields: self.fields,
            thumbnail_url: self.thumbnail_url,
            gallery: self.gallery,
            created_at: self.created_at,
            published_at: self.published_at,
        })
    }
}

/// MongoDB implementation of the DocumentStore, one collection per content kind.
pub struct MongoDocumentStore {
    db: mongodb::Database,
}

impl MongoDocumentStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self { db: db.clone() }
    }

    fn collection(&self, kind: CollectionKind) -> mongodb::Collection<StoredRecord> {
        self.db.collection(kind.collection_name())
    }

    /// Create the sort indexes used by the public listings.
    pub async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::bson::doc;
        use mongodb::IndexModel;

        for kind in CollectionKind::ALL {
            let indexes = vec![
                IndexModel::builder().keys(doc! { "created_at": -1 }).build(),
                IndexModel::builder().keys(doc! { "published_at": -1 }).build(),
            ];
            self.collection(kind).create_indexes(indexes).await?;
        }
        Ok(())
    }
}

/// Identifiers that are not valid ObjectIds cannot exist in the store.
fn parse_object_id(id: &str) -> Option<mongodb::bson::oid::ObjectId> {
    mongodb::bson::oid::ObjectId::parse_str(id).ok()
}

fn sort_key(field: OrderField) -> &'static str {
    match field {
        OrderField::CreatedAt => "created_at",
        OrderField::PublishedAt => "published_at",
        OrderField::Title => "fields.title",
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn insert(&self, kind: CollectionKind, record: NewRecord) -> Result<ContentRecord, AppError> {
        // BSON dates hold milliseconds
        let now = Utc::now().trunc_subsecs(3);
        let mut stored = StoredRecord {
            id: None,
            fields: record.fields,
            thumbnail_url: record.thumbnail_url,
            gallery: record.gallery,
            created_at: now,
            published_at: record.published_at.map(|at| at.trunc_subsecs(3)).unwrap_or(now),
        };

        let result = self.collection(kind).insert_one(&stored).await?;
        stored.id = Some(
            result
                .inserted_id
                .as_object_id()
                .ok_or_else(|| AppError::Database("Insert did not return an ObjectId".into()))?,
        );

        stored.into_record(kind)
    }

    async fn find_by_id(&self, kind: CollectionKind, id: &str) -> Result<Option<ContentRecord>, AppError> {
        use mongodb::bson::doc;

        let Some(oid) = parse_object_id(id) else {
            return Ok(None);
        };

        self.collection(kind)
            .find_one(doc! { "_id": oid })
            .await?
            .map(|stored| stored.into_record(kind))
            .transpose()
    }

    async fn update(&self, kind: CollectionKind, id: &str, patch: RecordPatch) -> Result<ContentRecord, AppError> {
        use mongodb::bson::{doc, Document};
        use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

        let not_found = || AppError::NotFound(format!("{kind}/{id}"));
        let oid = parse_object_id(id).ok_or_else(not_found)?;

        // Only the submitted fields are set; the rest of the map is untouched.
        let mut set = Document::new();
        for (name, value) in patch.fields {
            set.insert(format!("fields.{name}"), value);
        }
        set.insert("thumbnail_url", patch.thumbnail_url);
        set.insert("gallery", patch.gallery);
        if let Some(published_at) = patch.published_at {
            set.insert("published_at", mongodb::bson::DateTime::from_chrono(published_at));
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        self.collection(kind)
            .find_one_and_update(doc! { "_id": oid }, doc! { "$set": set })
            .with_options(options)
            .await?
            .ok_or_else(not_found)?
            .into_record(kind)
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), AppError> {
        use mongodb::bson::doc;

        let not_found = || AppError::NotFound(format!("{kind}/{id}"));
        let oid = parse_object_id(id).ok_or_else(not_found)?;

        let result = self.collection(kind).delete_one(doc! { "_id": oid }).await?;
        if result.deleted_count == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn list(&self, kind: CollectionKind, query: &ListQuery) -> Result<Vec<ContentRecord>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::{doc, Document};
        use mongodb::options::FindOptions;

        let direction = match query.order.direction {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        };

        // _id breaks ties so equal timestamps keep a stable order
        let mut sort = Document::new();
        sort.insert(sort_key(query.order.field), direction);
        sort.insert("_id", direction);

        let options = FindOptions::builder()
            .sort(sort)
            .limit(query.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX)))
            .build();

        let mut cursor = self
            .collection(kind)
            .find(doc! {})
            .with_options(options)
            .await?;

        let mut records = Vec::new();
        while let Some(stored) = cursor.try_next().await? {
            records.push(stored.into_record(kind)?);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("65f1a2b3c4d5e6f708192a3b").is_some());
        assert!(parse_object_id("not-an-object-id").is_none());
        assert!(parse_object_id("").is_none());
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(sort_key(OrderField::CreatedAt), "created_at");
        assert_eq!(sort_key(OrderField::PublishedAt), "published_at");
        assert_eq!(sort_key(OrderField::Title), "fields.title");
    }

    #[test]
    fn test_stored_record_bson_layout() {
        let now = Utc::now();
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Water Governance".to_string());
        let stored = StoredRecord {
            id: None,
            fields,
            thumbnail_url: "https://cdn.example/o/projects%2Fthumbnails%2Fa.png?alt=media".into(),
            gallery: vec![],
            created_at: now,
            published_at: now,
        };

        let doc = mongodb::bson::to_document(&stored).unwrap();
        assert!(!doc.contains_key("_id"), "unsaved records must let MongoDB assign the id");
        assert!(doc.get_datetime("created_at").is_ok(), "timestamps are stored as BSON dates");
        assert_eq!(
            doc.get_document("fields").unwrap().get_str("title").unwrap(),
            "Water Governance"
        );
    }

    #[test]
    fn test_into_record_requires_id() {
        let now = Utc::now();
        let stored = StoredRecord {
            id: None,
            fields: BTreeMap::new(),
            thumbnail_url: String::new(),
            gallery: vec![],
            created_at: now,
            published_at: now,
        };
        assert!(matches!(
            stored.into_record(CollectionKind::Events),
            Err(AppError::Database(_))
        ));
    }
}
