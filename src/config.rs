//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then an optional `site.toml` in the
//! working directory, then `SITE_*` environment variables. Nested keys use a
//! double underscore, e.g. `SITE_MONGODB__URI` or `SITE_ADMIN__PASSWORD_HASH`.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Where records and media are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// MongoDB for records, S3 for media.
    Mongo,
    /// Everything in process memory; lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO or LocalStack.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminSettings {
    pub email: String,
    /// Argon2 PHC string, see `research-site hash-password`.
    pub password_hash: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_address: String,
    /// Absolute URL the site is reachable at. Media download URLs are built
    /// under `{public_base_url}/media`.
    pub public_base_url: String,
    pub backend: Backend,
    pub mongodb: MongoSettings,
    pub s3: S3Settings,
    pub admin: AdminSettings,
    pub session_ttl_minutes: i64,
    /// Request body limit for the admin endpoints.
    pub max_upload_bytes: usize,
    /// Insert a few sample records at startup when the store is empty.
    pub seed_demo_content: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name("site").required(false))
            .add_source(
                Environment::with_prefix("SITE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn media_base_url(&self) -> String {
        format!("{}/media", self.public_base_url.trim_end_matches('/'))
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("bind_address", "0.0.0.0:3000")?
        .set_default("public_base_url", "http://localhost:3000")?
        .set_default("backend", "mongo")?
        .set_default("mongodb.uri", "mongodb://localhost:27017")?
        .set_default("mongodb.database", "research_site")?
        .set_default("s3.bucket", "research-site-media")?
        .set_default("s3.region", "us-east-1")?
        .set_default("admin.email", "admin@example.org")?
        .set_default("admin.password_hash", "")?
        .set_default("session_ttl_minutes", 480_i64)?
        .set_default("max_upload_bytes", 64_i64 * 1024 * 1024)?
        .set_default("seed_demo_content", false)
}
