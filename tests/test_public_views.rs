mod common;

use std::collections::BTreeMap;
use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::Request;
use common::{create_article, login};
use futures::StreamExt;
use research_site::content::manager::{CreateContent, MediaUpload};
use research_site::db::models::CollectionKind;
use tower::ServiceExt;

fn titles(records: &[serde_json::Value]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r["fields"]["title"].as_str().unwrap_or(""))
        .collect()
}

fn event_request(title: &str, date: &str) -> CreateContent {
    let mut fields = BTreeMap::new();
    fields.insert("title".to_string(), title.to_string());
    fields.insert("description".to_string(), "Annual meetup".to_string());
    CreateContent {
        fields,
        published_at: Some(format!("{date}T09:00:00Z").parse().unwrap()),
        thumbnail: Some(MediaUpload {
            file_name: "cover.png".into(),
            content_type: "image/png".into(),
            data: common::PNG.to_vec(),
        }),
        gallery: vec![],
    }
}

#[tokio::test]
async fn list_defaults_to_newest_first() {
    let env = common::TestEnv::in_memory();
    let server = env.server();
    login(&server).await;

    for title in ["First", "Second", "Third"] {
        create_article(&server, title, &[]).await;
    }

    let records: Vec<serde_json::Value> = server.get("/api/v1/articles").await.json();
    assert_eq!(titles(&records), vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn list_honours_order_and_limit() {
    let env = common::TestEnv::in_memory();
    let server = env.server();
    login(&server).await;

    for title in ["Beta", "Alpha", "Gamma"] {
        create_article(&server, title, &[]).await;
    }

    let records: Vec<serde_json::Value> = server
        .get("/api/v1/articles")
        .add_query_param("order", "title")
        .add_query_param("direction", "asc")
        .add_query_param("limit", 2)
        .await
        .json();
    assert_eq!(titles(&records), vec!["Alpha", "Beta"]);
}

#[tokio::test]
async fn zero_limit_is_rejected() {
    let env = common::TestEnv::in_memory();
    let server = env.server_permissive();
    login(&server).await;
    create_article(&server, "Only Article", &[]).await;

    server
        .get("/api/v1/articles")
        .add_query_param("limit", 0)
        .await
        .assert_status_bad_request();
    server
        .get("/api/v1/articles/live")
        .add_query_param("limit", 0)
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn events_are_ordered_by_occurrence() {
    let env = common::TestEnv::in_memory();
    let server = env.server();

    let manager = &env.state.manager;
    manager
        .create(CollectionKind::Events, event_request("Spring Expo", "2025-04-01"))
        .await
        .unwrap();
    manager
        .create(CollectionKind::Events, event_request("Winter Forum", "2025-12-01"))
        .await
        .unwrap();
    manager
        .create(CollectionKind::Events, event_request("Summer School", "2025-07-01"))
        .await
        .unwrap();

    let records: Vec<serde_json::Value> = server.get("/api/v1/events").await.json();
    assert_eq!(titles(&records), vec!["Winter Forum", "Summer School", "Spring Expo"]);
}

#[tokio::test]
async fn collections_are_isolated() {
    let env = common::TestEnv::in_memory();
    let server = env.server();
    login(&server).await;
    create_article(&server, "Only Article", &[]).await;

    let projects: Vec<serde_json::Value> = server.get("/api/v1/projects").await.json();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn get_by_id() {
    let env = common::TestEnv::in_memory();
    let server = env.server();
    login(&server).await;
    let record = create_article(&server, "Flood Study", &[]).await;
    let id = record["id"].as_str().unwrap();

    let fetched: serde_json::Value = server.get(&format!("/api/v1/articles/{id}")).await.json();
    assert_eq!(fetched, record);
}

#[tokio::test]
async fn get_unknown_record_or_collection() {
    let env = common::TestEnv::in_memory();
    let server = env.server_permissive();

    server.get("/api/v1/articles/nope").await.assert_status_not_found();
    server.get("/api/v1/services").await.assert_status_not_found();
}

async fn next_event(stream: &mut BodyDataStream) -> String {
    let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("timed out waiting for an event")
        .expect("stream ended")
        .expect("body error");
    String::from_utf8(chunk.to_vec()).unwrap()
}

#[tokio::test]
async fn live_stream_sends_snapshots_and_releases_on_disconnect() {
    let env = common::TestEnv::in_memory();
    assert_eq!(env.state.feed.active_subscriptions(), 0);

    let response = env
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/events/live")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let mut body = response.into_body().into_data_stream();
    let initial = next_event(&mut body).await;
    assert!(initial.starts_with("event: snapshot"), "{initial}");
    assert!(initial.contains("data: []"), "{initial}");
    assert_eq!(env.state.feed.active_subscriptions(), 1);

    env.state
        .manager
        .create(CollectionKind::Events, event_request("Open Lab Day", "2025-05-10"))
        .await
        .unwrap();

    let update = next_event(&mut body).await;
    assert!(update.starts_with("event: snapshot"), "{update}");
    assert!(update.contains("Open Lab Day"), "{update}");

    drop(body);
    assert_eq!(env.state.feed.active_subscriptions(), 0);
}
