use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::public::parse_collection;
use crate::app::AppState;
use crate::auth::middleware::AdminSession;
use crate::content::manager::{CreateContent, MediaUpload, UpdateContent};
use crate::db::models::{CollectionKind, ContentRecord};
use crate::error::AppError;

/// Body of every successful admin mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ContentRecord>,
}

/// The parts of an admin form submission.
///
/// Text parts become record fields, except `published_at`, the repeated
/// `retained_gallery` and `clear_gallery`. File parts are `thumbnail` and the
/// repeated `gallery`.
///
/// An update without `retained_gallery` parts keeps the stored gallery;
/// `clear_gallery=true` drops it.
#[derive(Debug, Default)]
pub struct ContentForm {
    pub fields: BTreeMap<String, String>,
    pub published_at: Option<DateTime<Utc>>,
    pub retained_gallery: Option<Vec<String>>,
    pub clear_gallery: bool,
    pub thumbnail: Option<MediaUpload>,
    pub gallery: Vec<MediaUpload>,
}

impl ContentForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ContentForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or("").to_string();

            if let Some(file_name) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {e}")))?;

                // An empty file input is submitted as a nameless, empty part
                if file_name.is_empty() && data.is_empty() {
                    continue;
                }

                form.push_file(
                    &name,
                    MediaUpload {
                        file_name,
                        content_type,
                        data: data.to_vec(),
                    },
                )?;
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read field '{name}': {e}")))?;
                form.push_text(&name, value)?;
            }
        }

        Ok(form)
    }

    pub fn push_text(&mut self, name: &str, value: String) -> Result<(), AppError> {
        match name {
            "" => Err(AppError::BadRequest("Form field without a name".into())),
            "published_at" => {
                self.published_at = parse_published_at(&value)?;
                Ok(())
            }
            "retained_gallery" => {
                self.retained_gallery.get_or_insert_with(Vec::new).push(value);
                Ok(())
            }
            "clear_gallery" => {
                self.clear_gallery = match value.trim() {
                    "true" | "on" | "1" => true,
                    "false" | "off" | "0" | "" => false,
                    other => {
                        return Err(AppError::BadRequest(format!(
                            "Invalid clear_gallery '{other}'. Expected true or false"
                        )))
                    }
                };
                Ok(())
            }
            "thumbnail" | "gallery" => Err(AppError::BadRequest(format!("'{name}' must be a file"))),
            _ => {
                self.fields.insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn push_file(&mut self, name: &str, upload: MediaUpload) -> Result<(), AppError> {
        match name {
            "thumbnail" => {
                self.thumbnail = Some(upload);
                Ok(())
            }
            "gallery" => {
                self.gallery.push(upload);
                Ok(())
            }
            other => Err(AppError::BadRequest(format!("Unexpected file field '{other}'"))),
        }
    }

    pub fn into_create(self) -> CreateContent {
        CreateContent {
            fields: self.fields,
            published_at: self.published_at,
            thumbnail: self.thumbnail,
            gallery: self.gallery,
        }
    }

    pub fn into_update(self) -> Result<UpdateContent, AppError> {
        let retained_gallery = match (self.clear_gallery, self.retained_gallery) {
            (true, Some(_)) => {
                return Err(AppError::BadRequest(
                    "clear_gallery cannot be combined with retained_gallery".into(),
                ))
            }
            (true, None) => Some(Vec::new()),
            (false, retained) => retained,
        };

        Ok(UpdateContent {
            fields: self.fields,
            published_at: self.published_at,
            retained_gallery,
            thumbnail: self.thumbnail,
            gallery: self.gallery,
        })
    }
}

/// Accepts RFC 3339 or a plain `YYYY-MM-DD` date (midnight UTC). Blank means
/// "not set".
fn parse_published_at(value: &str) -> Result<Option<DateTime<Utc>>, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid published_at '{value}'. Expected YYYY-MM-DD or an RFC 3339 timestamp"
            ))
        })
}

fn record_label(kind: CollectionKind) -> &'static str {
    match kind {
        CollectionKind::Articles => "Article",
        CollectionKind::Projects => "Project",
        CollectionKind::Events => "Event",
        CollectionKind::Courses => "Course",
    }
}

/// `POST /api/v1/admin/{collection}`
pub async fn create_handler(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(collection): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MutationResponse>), AppError> {
    let kind = parse_collection(&collection)?;
    let form = ContentForm::from_multipart(multipart).await?;

    let record = state.manager.create(kind, form.into_create()).await?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: format!("{} '{}' created", record_label(kind), record.title()),
            record: Some(record),
        }),
    ))
}

/// `PUT /api/v1/admin/{collection}/{id}`
pub async fn update_handler(
    State(state): State<AppState>,
    _session: AdminSession,
    Path((collection, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<MutationResponse>, AppError> {
    let kind = parse_collection(&collection)?;
    let form = ContentForm::from_multipart(multipart).await?;

    let record = state.manager.update(kind, &id, form.into_update()?).await?;

    Ok(Json(MutationResponse {
        message: format!("{} '{}' updated", record_label(kind), record.title()),
        record: Some(record),
    }))
}

/// `DELETE /api/v1/admin/{collection}/{id}`
pub async fn delete_handler(
    State(state): State<AppState>,
    _session: AdminSession,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, AppError> {
    let kind = parse_collection(&collection)?;
    state.manager.delete(kind, &id).await?;

    Ok(Json(MutationResponse {
        message: format!("{} deleted", record_label(kind)),
        record: None,
    }))
}
