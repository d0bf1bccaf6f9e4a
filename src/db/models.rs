use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of gallery images a record may carry.
pub const MAX_GALLERY_IMAGES: usize = 10;

/// The content collections managed from the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Articles,
    Projects,
    Events,
    Courses,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [
        CollectionKind::Articles,
        CollectionKind::Projects,
        CollectionKind::Events,
        CollectionKind::Courses,
    ];

    /// Name of the backing collection, also used as the storage prefix.
    pub fn collection_name(&self) -> &'static str {
        match self {
            CollectionKind::Articles => "articles",
            CollectionKind::Projects => "projects",
            CollectionKind::Events => "events",
            CollectionKind::Courses => "courses",
        }
    }

    /// Parse a collection from its URL segment (case-insensitive).
    pub fn from_str_ci(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "articles" => Some(CollectionKind::Articles),
            "projects" => Some(CollectionKind::Projects),
            "events" => Some(CollectionKind::Events),
            "courses" => Some(CollectionKind::Courses),
            _ => None,
        }
    }

    /// Fields that must be present and non-empty on every record.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            CollectionKind::Articles => &["title", "author", "description"],
            CollectionKind::Projects => &["title", "description"],
            CollectionKind::Events => &["title", "description"],
            CollectionKind::Courses => &["title", "description", "duration"],
        }
    }

    /// Classification fields that may be left out.
    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            CollectionKind::Articles => &["category"],
            CollectionKind::Projects => &["place", "category", "client"],
            CollectionKind::Events => &["place", "category"],
            CollectionKind::Courses => &["format", "level", "price", "category", "instructor"],
        }
    }

    pub fn accepts_field(&self, name: &str) -> bool {
        self.required_fields().contains(&name) || self.optional_fields().contains(&name)
    }

    /// Ordering used by the public pages when the client does not ask for one.
    pub fn default_order(&self) -> RecordOrder {
        match self {
            CollectionKind::Events => RecordOrder {
                field: OrderField::PublishedAt,
                direction: SortDirection::Desc,
            },
            _ => RecordOrder::default(),
        }
    }
}

/// A content record (article, project, event or course) as stored in the
/// document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Store-assigned identifier, immutable once created.
    pub id: String,
    pub kind: CollectionKind,
    /// Text fields keyed by name; see [`CollectionKind::required_fields`].
    pub fields: BTreeMap<String, String>,
    /// Download URL of the thumbnail image.
    pub thumbnail_url: String,
    /// Download URLs of the gallery images, in display order.
    #[serde(default)]
    pub gallery: Vec<String>,
    /// Assigned by the store at insert time.
    pub created_at: DateTime<Utc>,
    /// "Published" for articles and projects, "occurs at" for events.
    pub published_at: DateTime<Utc>,
}

impl ContentRecord {
    pub fn title(&self) -> &str {
        self.fields.get("title").map(String::as_str).unwrap_or_default()
    }

    /// Thumbnail followed by every gallery URL.
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.thumbnail_url.as_str()).chain(self.gallery.iter().map(String::as_str))
    }
}

/// A record ready to be inserted. Identity and creation time are assigned by
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub fields: BTreeMap<String, String>,
    pub thumbnail_url: String,
    pub gallery: Vec<String>,
    /// Defaults to the creation time when `None`.
    pub published_at: Option<DateTime<Utc>>,
}

/// A partial update. Fields absent from `fields` keep their stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPatch {
    pub fields: BTreeMap<String, String>,
    pub thumbnail_url: String,
    pub gallery: Vec<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    #[default]
    CreatedAt,
    PublishedAt,
    Title,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordOrder {
    pub field: OrderField,
    pub direction: SortDirection,
}

/// Ordered query over one collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListQuery {
    pub order: RecordOrder,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn for_collection(kind: CollectionKind) -> Self {
        Self {
            order: kind.default_order(),
            limit: None,
        }
    }
}
