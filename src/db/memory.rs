use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};

use crate::db::models::{
    CollectionKind, ContentRecord, ListQuery, NewRecord, OrderField, RecordPatch, SortDirection,
};
use crate::db::repository::DocumentStore;
use crate::error::AppError;

/// In-process document store used in demo mode and by the test suites.
///
/// Records are kept in insertion order; the insertion sequence breaks ties
/// between equal sort keys the same way `_id` does in MongoDB.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    collections: Mutex<HashMap<CollectionKind, Vec<(u64, ContentRecord)>>>,
    next_seq: Mutex<u64>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_collections(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<CollectionKind, Vec<(u64, ContentRecord)>>>, AppError> {
        self.collections
            .lock()
            .map_err(|_| AppError::Database("In-memory store lock poisoned".into()))
    }

    fn next_seq(&self) -> Result<u64, AppError> {
        let mut seq = self
            .next_seq
            .lock()
            .map_err(|_| AppError::Database("In-memory store lock poisoned".into()))?;
        *seq += 1;
        Ok(*seq)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, kind: CollectionKind, record: NewRecord) -> Result<ContentRecord, AppError> {
        let seq = self.next_seq()?;
        let now = Utc::now().trunc_subsecs(3);
        let stored = ContentRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            fields: record.fields,
            thumbnail_url: record.thumbnail_url,
            gallery: record.gallery,
            created_at: now,
            published_at: record.published_at.map_or(now, |at| at.trunc_subsecs(3)),
        };

        self.lock_collections()?
            .entry(kind)
            .or_default()
            .push((seq, stored.clone()));

        Ok(stored)
    }

    async fn find_by_id(&self, kind: CollectionKind, id: &str) -> Result<Option<ContentRecord>, AppError> {
        Ok(self
            .lock_collections()?
            .get(&kind)
            .and_then(|records| records.iter().find(|(_, r)| r.id == id))
            .map(|(_, r)| r.clone()))
    }

    async fn update(&self, kind: CollectionKind, id: &str, patch: RecordPatch) -> Result<ContentRecord, AppError> {
        let mut collections = self.lock_collections()?;
        let record = collections
            .get_mut(&kind)
            .and_then(|records| records.iter_mut().find(|(_, r)| r.id == id))
            .map(|(_, r)| r)
            .ok_or_else(|| AppError::NotFound(format!("{kind}/{id}")))?;

        record.fields.extend(patch.fields);
        record.thumbnail_url = patch.thumbnail_url;
        record.gallery = patch.gallery;
        if let Some(published_at) = patch.published_at {
            record.published_at = published_at.trunc_subsecs(3);
        }

        Ok(record.clone())
    }

    async fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), AppError> {
        let mut collections = self.lock_collections()?;
        let records = collections.entry(kind).or_default();
        let before = records.len();
        records.retain(|(_, r)| r.id != id);

        if records.len() == before {
            return Err(AppError::NotFound(format!("{kind}/{id}")));
        }
        Ok(())
    }

    async fn list(&self, kind: CollectionKind, query: &ListQuery) -> Result<Vec<ContentRecord>, AppError> {
        let mut records = self
            .lock_collections()?
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        records.sort_by(|(seq_a, a), (seq_b, b)| {
            let ordering = match query.order.field {
                OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderField::PublishedAt => a.published_at.cmp(&b.published_at),
                OrderField::Title => a.title().cmp(b.title()),
            }
            .then(seq_a.cmp(seq_b));

            match query.order.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(records.into_iter().take(limit).map(|(_, r)| r).collect())
    }
}
