pub mod app;
pub mod config;
pub mod demo_seeder;
pub mod error;
pub mod auth {
    pub mod config;
    pub mod handlers;
    pub mod middleware;
    pub mod models;
    pub mod session;
}
pub mod content {
    pub mod manager;
    pub mod validation;
}
pub mod db {
    pub mod live;
    pub mod memory;
    pub mod models;
    pub mod repository;
}
pub mod storage {
    pub mod client;
    pub mod media;
    pub mod memory;
}
pub mod api {
    pub mod admin;
    pub mod errors;
    pub mod media;
    pub mod public;
}
