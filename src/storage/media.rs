//! Media handles: the download URL and the storage path of one stored image.
//!
//! Download URLs have the shape `{public_base}/o/{percent-encoded path}?alt=media`.
//! The path is encoded as a single segment (`/` becomes `%2F`), so it can be
//! recovered from any download URL without knowing the base it was built with.

use chrono::Utc;

use crate::db::models::CollectionKind;
use crate::error::AppError;

/// Marks the start of the encoded path in a download URL.
const OBJECT_MARKER: &str = "/o/";

/// Which slot of a record an upload fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRole {
    Thumbnail,
    Gallery,
}

impl MediaRole {
    fn directory(&self) -> &'static str {
        match self {
            MediaRole::Thumbnail => "thumbnails",
            MediaRole::Gallery => "gallery",
        }
    }
}

/// One stored image, addressable both by URL and by storage path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    url: String,
    path: String,
}

impl MediaHandle {
    /// Recover the handle of a download URL.
    pub fn from_url(url: &str) -> Result<Self, AppError> {
        let parsed = url::Url::parse(url)
            .map_err(|e| AppError::BadRequest(format!("Invalid media URL '{url}': {e}")))?;

        let encoded = parsed
            .path()
            .rfind(OBJECT_MARKER)
            .map(|start| &parsed.path()[start + OBJECT_MARKER.len()..])
            .filter(|segment| !segment.is_empty() && !segment.contains('/'))
            .ok_or_else(|| AppError::BadRequest(format!("Not a media download URL: '{url}'")))?;

        let path = urlencoding::decode(encoded)
            .map_err(|e| AppError::BadRequest(format!("Invalid media path in '{url}': {e}")))?
            .into_owned();

        Ok(Self {
            url: url.to_string(),
            path,
        })
    }

    pub fn to_url(&self) -> &str {
        &self.url
    }

    pub fn to_path(&self) -> &str {
        &self.path
    }
}

/// Builds download URLs for the storage paths this deployment writes.
#[derive(Debug, Clone)]
pub struct MediaUrlScheme {
    public_base: String,
}

impl MediaUrlScheme {
    /// `public_base` is the absolute URL the media endpoint is reachable at,
    /// e.g. `https://example.org/media`.
    pub fn new(public_base: &str) -> Result<Self, AppError> {
        url::Url::parse(public_base)
            .map_err(|e| AppError::Internal(format!("Invalid public media base '{public_base}': {e}")))?;

        Ok(Self {
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn handle_for_path(&self, path: &str) -> MediaHandle {
        MediaHandle {
            url: format!(
                "{}{}{}?alt=media",
                self.public_base,
                OBJECT_MARKER,
                urlencoding::encode(path)
            ),
            path: path.to_string(),
        }
    }
}

/// Storage key for a new upload: `{collection}/{thumbnails|gallery}/{millis}_{random}_{name}`.
///
/// The random component keeps two uploads of the same file name within one
/// millisecond apart.
pub fn object_key(kind: CollectionKind, role: MediaRole, file_name: &str) -> String {
    let timestamp = Utc::now().timestamp_millis();
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}/{}/{}_{}_{}",
        kind.collection_name(),
        role.directory(),
        timestamp,
        &unique[..8],
        sanitize_file_name(file_name)
    )
}

fn sanitize_file_name(file_name: &str) -> String {
    // Browsers may send a full client path as the file name
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let sanitized: String = base
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();

    if sanitized.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}
