use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AppError;
use crate::storage::client::{StorageClient, StoredObject};

/// In-process object storage used in demo mode and by the test suites.
///
/// Unlike S3, deleting a missing key is an error, which is what a storage
/// provider with strict deletes reports for an already removed object.
#[derive(Default)]
pub struct InMemoryStorageClient {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl InMemoryStorageClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredObject>>, AppError> {
        self.objects
            .lock()
            .map_err(|_| AppError::Storage("In-memory storage lock poisoned".into()))
    }
}

#[async_trait]
impl StorageClient for InMemoryStorageClient {
    async fn put_object(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        self.lock()?.insert(
            key.to_string(),
            StoredObject {
                content_type: content_type.to_string(),
                data: content,
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.lock()?
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| AppError::Storage(format!("Object '{}' does not exist", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let storage = InMemoryStorageClient::new();
        storage
            .put_object("articles/thumbnails/a.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        let object = storage.get_object("articles/thumbnails/a.png").await.unwrap().unwrap();
        assert_eq!(object.content_type, "image/png");
        assert_eq!(object.data, vec![1, 2, 3]);

        storage.delete_object("articles/thumbnails/a.png").await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_object_fails() {
        let storage = InMemoryStorageClient::new();
        let result = storage.delete_object("articles/gallery/gone.png").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
