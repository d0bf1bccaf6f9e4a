//! Create, update and delete content records together with their media.
//!
//! Each operation is a short sequence of storage uploads followed by one
//! document store write. Uploaded media is not rolled back when a later step
//! fails, and replaced thumbnails or pruned gallery images stay in storage
//! until cleaned up by hand.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::content::validation::{
    validate_changed_fields, validate_new_fields, validate_retained_gallery, validate_upload,
};
use crate::db::live::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::db::models::{CollectionKind, ContentRecord, NewRecord, RecordPatch, MAX_GALLERY_IMAGES};
use crate::db::repository::DocumentStore;
use crate::error::AppError;
use crate::storage::client::StorageClient;
use crate::storage::media::{object_key, MediaHandle, MediaRole, MediaUrlScheme};

/// An image file received from the admin forms.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Input of [`ContentRecordManager::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateContent {
    pub fields: BTreeMap<String, String>,
    pub published_at: Option<DateTime<Utc>>,
    pub thumbnail: Option<MediaUpload>,
    pub gallery: Vec<MediaUpload>,
}

/// Input of [`ContentRecordManager::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdateContent {
    /// Only the fields present here are changed.
    pub fields: BTreeMap<String, String>,
    pub published_at: Option<DateTime<Utc>>,
    /// The stored gallery URLs to keep, in the order they should appear.
    /// `None` keeps the stored gallery as it is; `Some(vec![])` empties it.
    pub retained_gallery: Option<Vec<String>>,
    /// Replaces the stored thumbnail when present.
    pub thumbnail: Option<MediaUpload>,
    /// Appended after the retained images.
    pub gallery: Vec<MediaUpload>,
}

pub struct ContentRecordManager {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn StorageClient>,
    urls: MediaUrlScheme,
    feed: ChangeFeed,
}

impl ContentRecordManager {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn StorageClient>,
        urls: MediaUrlScheme,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            store,
            storage,
            urls,
            feed,
        }
    }

    pub async fn find(&self, kind: CollectionKind, id: &str) -> Result<ContentRecord, AppError> {
        self.store
            .find_by_id(kind, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{kind}/{id}")))
    }

    /// Upload the thumbnail and gallery, then insert the record.
    ///
    /// Nothing is uploaded or written unless every required field and the
    /// thumbnail are present. Gallery images past the tenth are ignored.
    pub async fn create(&self, kind: CollectionKind, request: CreateContent) -> Result<ContentRecord, AppError> {
        let CreateContent {
            fields,
            published_at,
            thumbnail,
            mut gallery,
        } = request;

        validate_new_fields(kind, &fields)?;
        let thumbnail = thumbnail.ok_or_else(|| AppError::BadRequest("A thumbnail image is required".into()))?;
        validate_upload(&thumbnail)?;

        if gallery.len() > MAX_GALLERY_IMAGES {
            tracing::debug!(
                "Ignoring {} gallery image(s) beyond the limit of {}",
                gallery.len() - MAX_GALLERY_IMAGES,
                MAX_GALLERY_IMAGES
            );
            gallery.truncate(MAX_GALLERY_IMAGES);
        }
        for upload in &gallery {
            validate_upload(upload)?;
        }

        let thumbnail = self.upload(kind, MediaRole::Thumbnail, thumbnail).await?;
        let gallery = self.upload_gallery(kind, gallery).await?;

        let record = self
            .store
            .insert(
                kind,
                NewRecord {
                    fields,
                    thumbnail_url: thumbnail.to_url().to_string(),
                    gallery,
                    published_at,
                },
            )
            .await?;

        self.notify(kind, &record.id, ChangeKind::Created);
        tracing::info!(
            "Created {} '{}' ({}) with {} gallery image(s)",
            kind,
            record.title(),
            record.id,
            record.gallery.len()
        );
        Ok(record)
    }

    /// Apply an edit. The resulting gallery is the retained URLs followed by
    /// the newly uploaded images, capped at ten in total.
    pub async fn update(&self, kind: CollectionKind, id: &str, request: UpdateContent) -> Result<ContentRecord, AppError> {
        let UpdateContent {
            fields,
            published_at,
            retained_gallery,
            thumbnail,
            mut gallery,
        } = request;

        validate_changed_fields(kind, &fields)?;
        if let Some(thumbnail) = &thumbnail {
            validate_upload(thumbnail)?;
        }

        let existing = self.find(kind, id).await?;
        let retained_gallery = match retained_gallery {
            Some(retained) => {
                validate_retained_gallery(&existing.gallery, &retained)?;
                retained
            }
            None => existing.gallery,
        };

        let capacity = MAX_GALLERY_IMAGES.saturating_sub(retained_gallery.len());
        if gallery.len() > capacity {
            tracing::debug!(
                "Ignoring {} new gallery image(s) for {}/{}: {} retained, limit {}",
                gallery.len() - capacity,
                kind,
                id,
                retained_gallery.len(),
                MAX_GALLERY_IMAGES
            );
            gallery.truncate(capacity);
        }
        for upload in &gallery {
            validate_upload(upload)?;
        }

        let thumbnail_url = match thumbnail {
            Some(upload) => self.upload(kind, MediaRole::Thumbnail, upload).await?.to_url().to_string(),
            None => existing.thumbnail_url,
        };
        let mut final_gallery = retained_gallery;
        final_gallery.extend(self.upload_gallery(kind, gallery).await?);

        let record = self
            .store
            .update(
                kind,
                id,
                RecordPatch {
                    fields,
                    thumbnail_url,
                    gallery: final_gallery,
                    published_at,
                },
            )
            .await?;

        self.notify(kind, &record.id, ChangeKind::Updated);
        tracing::info!("Updated {} '{}' ({})", kind, record.title(), record.id);
        Ok(record)
    }

    /// Look up a record and delete it with its media.
    pub async fn delete(&self, kind: CollectionKind, id: &str) -> Result<(), AppError> {
        let record = self.find(kind, id).await?;
        self.delete_record(&record).await
    }

    /// Delete every media object of the record, then the record itself.
    ///
    /// A media object that cannot be deleted is logged and skipped; only a
    /// failure to delete the record is returned.
    pub async fn delete_record(&self, record: &ContentRecord) -> Result<(), AppError> {
        for url in record.media_urls() {
            let handle = match MediaHandle::from_url(url) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!("Skipping media cleanup for {}/{}: {}", record.kind, record.id, e);
                    continue;
                }
            };
            if let Err(e) = self.storage.delete_object(handle.to_path()).await {
                tracing::warn!(
                    "Failed to delete media '{}' of {}/{}: {}",
                    handle.to_path(),
                    record.kind,
                    record.id,
                    e
                );
            }
        }

        self.store.delete(record.kind, &record.id).await?;

        self.notify(record.kind, &record.id, ChangeKind::Deleted);
        tracing::info!("Deleted {} '{}' ({})", record.kind, record.title(), record.id);
        Ok(())
    }

    async fn upload(&self, kind: CollectionKind, role: MediaRole, upload: MediaUpload) -> Result<MediaHandle, AppError> {
        let key = object_key(kind, role, &upload.file_name);
        self.storage
            .put_object(&key, upload.data, &upload.content_type)
            .await?;
        Ok(self.urls.handle_for_path(&key))
    }

    /// One at a time, so the URLs come back in input order.
    async fn upload_gallery(&self, kind: CollectionKind, uploads: Vec<MediaUpload>) -> Result<Vec<String>, AppError> {
        let mut urls = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let handle = self.upload(kind, MediaRole::Gallery, upload).await?;
            urls.push(handle.to_url().to_string());
        }
        Ok(urls)
    }

    fn notify(&self, kind: CollectionKind, id: &str, change: ChangeKind) {
        self.feed.publish(ChangeEvent {
            kind,
            id: id.to_string(),
            change,
        });
    }
}
