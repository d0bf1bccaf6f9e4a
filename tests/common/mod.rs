#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::minio::MinIO;
use testcontainers_modules::mongo::Mongo;

use research_site::app::{build_router, AppState};
use research_site::auth::config::{hash_password, AdminCredentials};
use research_site::db::memory::InMemoryDocumentStore;
use research_site::db::repository::{DocumentStore, MongoDocumentStore};
use research_site::error::AppError;
use research_site::storage::client::{S3StorageClient, StorageClient, StoredObject};
use research_site::storage::media::MediaUrlScheme;
use research_site::storage::memory::InMemoryStorageClient;

pub const ADMIN_EMAIL: &str = "office@consultancy.example";
pub const ADMIN_PASSWORD: &str = "correct horse battery";
pub const PUBLIC_BASE: &str = "http://localhost";

/// A minimal 1x1 PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Holds the router and the backends behind it.
///
/// Containers, when used, are kept alive for as long as this struct lives.
pub struct TestEnv {
    _containers: Option<(ContainerAsync<Mongo>, ContainerAsync<MinIO>)>,
    pub router: Router,
    pub state: AppState,
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn StorageClient>,
}

impl TestEnv {
    /// In-memory document store and object storage.
    pub fn in_memory() -> Self {
        Self::with_backends(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryStorageClient::new()),
        )
    }

    /// In-memory document store with the given object storage.
    pub fn with_storage(storage: Arc<dyn StorageClient>) -> Self {
        Self::with_backends(Arc::new(InMemoryDocumentStore::new()), storage)
    }

    fn with_backends(store: Arc<dyn DocumentStore>, storage: Arc<dyn StorageClient>) -> Self {
        let admin = AdminCredentials::new(
            ADMIN_EMAIL.to_string(),
            hash_password(ADMIN_PASSWORD).expect("Failed to hash password"),
        );
        let state = AppState::new(
            store.clone(),
            storage.clone(),
            MediaUrlScheme::new(&format!("{PUBLIC_BASE}/media")).expect("Invalid media base"),
            admin,
            chrono::Duration::minutes(30),
            16 * 1024 * 1024,
        );

        Self {
            _containers: None,
            router: build_router(state.clone()),
            state,
            store,
            storage,
        }
    }

    /// MongoDB and MinIO in containers. Requires Docker.
    pub async fn with_containers() -> Self {
        let (mongo_container, minio_container) = tokio::join!(Mongo::default().start(), MinIO::default().start());
        let mongo_container = mongo_container.expect("Failed to start MongoDB container");
        let minio_container = minio_container.expect("Failed to start MinIO container");

        // --- MongoDB ---
        let mongo_port = mongo_container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");
        let mongo_client = mongodb::Client::with_uri_str(format!("mongodb://127.0.0.1:{}", mongo_port))
            .await
            .expect("Failed to connect to MongoDB");
        let mongo_store = MongoDocumentStore::new(&mongo_client.database("research_site_test"));
        mongo_store
            .ensure_indexes()
            .await
            .expect("Failed to create indexes");

        // --- MinIO (S3) ---
        let minio_port = minio_container
            .get_host_port_ipv4(9000)
            .await
            .expect("Failed to get MinIO port");
        let minio_endpoint = format!("http://127.0.0.1:{}", minio_port);

        // Set env vars for AWS SDK to pick up MinIO credentials
        unsafe {
            std::env::set_var("AWS_ACCESS_KEY_ID", "minioadmin");
            std::env::set_var("AWS_SECRET_ACCESS_KEY", "minioadmin");
        }

        let bucket_name = "research-site-test";
        let storage = S3StorageClient::connect(bucket_name, "us-east-1", Some(&minio_endpoint)).await;

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .endpoint_url(&minio_endpoint)
            .region(aws_config::Region::new("us-east-1"))
            .load()
            .await;
        let s3_client = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&s3_config)
                .force_path_style(true)
                .build(),
        );
        let _ = s3_client.create_bucket().bucket(bucket_name).send().await;

        let mut env = Self::with_backends(Arc::new(mongo_store), Arc::new(storage));
        env._containers = Some((mongo_container, minio_container));
        env
    }

    /// Build an `axum_test::TestServer` from this environment's router.
    pub fn server(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .expect_success_by_default()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }

    /// Build a `TestServer` that does NOT expect success by default (for error tests).
    pub fn server_permissive(&self) -> axum_test::TestServer {
        axum_test::TestServer::builder()
            .save_cookies()
            .try_build(self.router.clone())
            .expect("Failed to build TestServer")
    }
}

/// Helper: log in as the admin; the session cookie is kept by the server.
pub async fn login(server: &axum_test::TestServer) -> String {
    let response = server
        .post("/api/auth/login")
        .json(&serde_json::json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("login returns a token").to_string()
}

pub fn image(name: &str) -> Part {
    Part::bytes(PNG.to_vec()).file_name(name).mime_type("image/png")
}

/// Multipart form for a valid article with the given gallery file names.
pub fn article_form(title: &str, gallery: &[&str]) -> MultipartForm {
    let mut form = MultipartForm::new()
        .add_text("title", title)
        .add_text("author", "A. Kumar")
        .add_text("description", "River basin modelling")
        .add_part("thumbnail", image("thumb.png"));
    for name in gallery {
        form = form.add_part("gallery", image(name));
    }
    form
}

/// Helper: create an article through the admin API and return the record.
pub async fn create_article(server: &axum_test::TestServer, title: &str, gallery: &[&str]) -> serde_json::Value {
    let response = server
        .post("/api/v1/admin/articles")
        .multipart(article_form(title, gallery))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    body["record"].clone()
}

/// Server-relative path of a media download URL.
pub fn media_path(url: &str) -> String {
    let without_base = url.strip_prefix(PUBLIC_BASE).expect("URL under the public base");
    without_base
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(without_base)
        .to_string()
}

/// Object storage that refuses every upload.
pub struct UnavailableStorage;

#[async_trait]
impl StorageClient for UnavailableStorage {
    async fn put_object(&self, key: &str, _content: Vec<u8>, _content_type: &str) -> Result<(), AppError> {
        Err(AppError::Storage(format!("bucket unreachable while writing '{key}'")))
    }

    async fn get_object(&self, _key: &str) -> Result<Option<StoredObject>, AppError> {
        Ok(None)
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        Err(AppError::Storage(format!("bucket unreachable while deleting '{key}'")))
    }
}
