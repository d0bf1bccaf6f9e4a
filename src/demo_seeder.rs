use std::collections::BTreeMap;

use crate::content::manager::{ContentRecordManager, CreateContent, MediaUpload};
use crate::db::models::{CollectionKind, ListQuery};
use crate::db::repository::DocumentStore;

/// A 1x1 transparent PNG used as placeholder artwork.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn demo_records() -> Vec<(CollectionKind, Vec<(&'static str, &'static str)>, usize)> {
    vec![
        (
            CollectionKind::Articles,
            vec![
                ("title", "Reading a Flood Risk Map"),
                ("author", "Research Team"),
                ("description", "How return periods, depth bands and uncertainty are shown on a hazard map."),
                ("category", "Hydrology"),
            ],
            2,
        ),
        (
            CollectionKind::Projects,
            vec![
                ("title", "Coastal Erosion Survey"),
                ("description", "Drone photogrammetry of twelve kilometres of shoreline."),
                ("place", "Kerala"),
                ("client", "State Coastal Authority"),
                ("category", "Remote sensing"),
            ],
            3,
        ),
        (
            CollectionKind::Events,
            vec![
                ("title", "Open Lab Day"),
                ("description", "Walk-through of the field instruments and a live mapping demo."),
                ("place", "Main campus"),
            ],
            1,
        ),
        (
            CollectionKind::Courses,
            vec![
                ("title", "Introduction to GIS"),
                ("description", "Vector and raster basics with open source tools."),
                ("duration", "4 weeks"),
                ("format", "Online"),
                ("level", "Beginner"),
                ("price", "Free"),
            ],
            0,
        ),
    ]
}

fn placeholder(name: String) -> MediaUpload {
    MediaUpload {
        file_name: name,
        content_type: "image/png".to_string(),
        data: PLACEHOLDER_PNG.to_vec(),
    }
}

/// Insert one sample record into every empty collection. Returns how many
/// records were created.
pub async fn seed_demo_content(store: &dyn DocumentStore, manager: &ContentRecordManager) -> usize {
    tracing::info!("Starting demo content seeding...");
    let mut created = 0;

    for (kind, fields, gallery_size) in demo_records() {
        let probe = ListQuery {
            limit: Some(1),
            ..ListQuery::default()
        };
        match store.list(kind, &probe).await {
            Ok(existing) if !existing.is_empty() => {
                tracing::info!("Collection '{}' already has content, skipping.", kind);
                continue;
            }
            Err(e) => {
                tracing::error!("Failed to check collection '{}': {}", kind, e);
                continue;
            }
            Ok(_) => {}
        }

        let request = CreateContent {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            published_at: None,
            thumbnail: Some(placeholder(format!("{kind}-cover.png"))),
            gallery: (1..=gallery_size)
                .map(|i| placeholder(format!("{kind}-{i}.png")))
                .collect(),
        };

        match manager.create(kind, request).await {
            Ok(record) => {
                tracing::info!("Seeded {} '{}'.", kind, record.title());
                created += 1;
            }
            Err(e) => tracing::error!("Failed to seed {}: {}", kind, e),
        }
    }

    tracing::info!("Demo content seeding complete ({} record(s)).", created);
    created
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::live::ChangeFeed;
    use crate::db::memory::InMemoryDocumentStore;
    use crate::storage::media::MediaUrlScheme;
    use crate::storage::memory::InMemoryStorageClient;

    #[tokio::test]
    async fn test_seeding_is_idempotent() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let storage = Arc::new(InMemoryStorageClient::new());
        let manager = ContentRecordManager::new(
            store.clone(),
            storage.clone(),
            MediaUrlScheme::new("http://localhost:3000/media").unwrap(),
            ChangeFeed::default(),
        );

        assert_eq!(seed_demo_content(store.as_ref(), &manager).await, 4);
        assert_eq!(seed_demo_content(store.as_ref(), &manager).await, 0);

        for kind in CollectionKind::ALL {
            let records = store.list(kind, &ListQuery::default()).await.unwrap();
            assert_eq!(records.len(), 1, "{kind}");
        }
        // Four thumbnails plus six gallery images.
        assert_eq!(storage.len(), 10);
    }
}
