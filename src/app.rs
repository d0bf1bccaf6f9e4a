use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::auth;
use crate::auth::config::AdminCredentials;
use crate::auth::session::SessionStore;
use crate::content::manager::ContentRecordManager;
use crate::db::live::ChangeFeed;
use crate::db::repository::DocumentStore;
use crate::storage::client::StorageClient;
use crate::storage::media::MediaUrlScheme;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn StorageClient>,
    pub feed: ChangeFeed,
    pub manager: Arc<ContentRecordManager>,
    pub sessions: Arc<SessionStore>,
    pub admin: Arc<AdminCredentials>,
    /// Request body limit for admin submissions.
    pub upload_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn StorageClient>,
        media: MediaUrlScheme,
        admin: AdminCredentials,
        session_ttl: chrono::Duration,
        upload_limit: usize,
    ) -> Self {
        let feed = ChangeFeed::default();
        let manager = Arc::new(ContentRecordManager::new(
            store.clone(),
            storage.clone(),
            media,
            feed.clone(),
        ));

        Self {
            store,
            storage,
            feed,
            manager,
            sessions: Arc::new(SessionStore::new(session_ttl)),
            admin: Arc::new(admin),
            upload_limit,
        }
    }
}

/// Build the router with every API route.
pub fn build_router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/{collection}", post(api::admin::create_handler))
        .route(
            "/{collection}/{id}",
            axum::routing::put(api::admin::update_handler).delete(api::admin::delete_handler),
        )
        .layer(DefaultBodyLimit::max(state.upload_limit));

    Router::new()
        .route("/api/auth/login", post(auth::handlers::login_handler))
        .route("/api/auth/logout", post(auth::handlers::logout_handler))
        .route("/api/auth/me", get(auth::handlers::me_handler))
        .nest("/api/v1/admin", admin_routes)
        .route("/api/v1/{collection}", get(api::public::list_handler))
        .route("/api/v1/{collection}/live", get(api::public::live_handler))
        .route("/api/v1/{collection}/{id}", get(api::public::get_handler))
        .route("/media/o/{path}", get(api::media::serve_media_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
