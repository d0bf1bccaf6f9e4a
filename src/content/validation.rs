use std::collections::{BTreeMap, HashSet};

use crate::content::manager::MediaUpload;
use crate::db::models::CollectionKind;
use crate::error::AppError;

/// Check the fields submitted by the create form: every required field is
/// present and non-blank, and nothing outside the collection schema is sent.
pub fn validate_new_fields(kind: CollectionKind, fields: &BTreeMap<String, String>) -> Result<(), AppError> {
    reject_unknown_fields(kind, fields)?;

    let missing: Vec<&str> = kind
        .required_fields()
        .iter()
        .copied()
        .filter(|name| fields.get(*name).map_or(true, |value| value.trim().is_empty()))
        .collect();

    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required {} field(s): {}",
            kind,
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Check the fields submitted by the edit form. Fields may be left out, but a
/// required field that is sent must not be blank.
pub fn validate_changed_fields(kind: CollectionKind, fields: &BTreeMap<String, String>) -> Result<(), AppError> {
    reject_unknown_fields(kind, fields)?;

    if let Some(blank) = kind
        .required_fields()
        .iter()
        .find(|name| fields.get(**name).is_some_and(|value| value.trim().is_empty()))
    {
        return Err(AppError::BadRequest(format!("Field '{blank}' cannot be empty")));
    }

    Ok(())
}

fn reject_unknown_fields(kind: CollectionKind, fields: &BTreeMap<String, String>) -> Result<(), AppError> {
    if let Some(unknown) = fields.keys().find(|name| !kind.accepts_field(name)) {
        return Err(AppError::BadRequest(format!(
            "Unknown field '{}' for {}. Expected: {}",
            unknown,
            kind,
            kind.required_fields()
                .iter()
                .chain(kind.optional_fields())
                .copied()
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    Ok(())
}

/// Only non-empty image files are accepted.
pub fn validate_upload(upload: &MediaUpload) -> Result<(), AppError> {
    if !upload.content_type.starts_with("image/") {
        return Err(AppError::BadRequest(format!(
            "'{}' is not an image; only image files are allowed",
            upload.file_name
        )));
    }
    if upload.data.is_empty() {
        return Err(AppError::BadRequest(format!("'{}' is empty", upload.file_name)));
    }
    Ok(())
}

/// The retained gallery must be drawn from the stored gallery, each entry at
/// most once.
pub fn validate_retained_gallery(stored: &[String], retained: &[String]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for url in retained {
        if !stored.contains(url) {
            return Err(AppError::BadRequest(format!(
                "Retained image '{url}' is not part of this record's gallery"
            )));
        }
        if !seen.insert(url.as_str()) {
            return Err(AppError::BadRequest(format!("Retained image '{url}' is listed twice")));
        }
    }
    Ok(())
}
