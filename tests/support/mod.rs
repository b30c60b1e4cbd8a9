//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// English edition that passes the best-edition filter.
pub fn english_edition_json(title: &str, publish_date: &str) -> Value {
    json!({
        "title": title,
        "isbn_13": ["9780316229296"],
        "languages": [{"key": "/languages/eng"}],
        "covers": [10_234_567],
        "publish_date": publish_date,
        "publishers": ["Orbit"],
        "number_of_pages": 468
    })
}

/// Mounts a subject listing answering both the count and the page request.
pub async fn mount_subject(server: &MockServer, subject: &str, work_count: u64, works: Value) {
    let subject_path = format!("/subjects/{subject}.json");
    Mock::given(method("GET"))
        .and(path(subject_path.as_str()))
        .and(query_param("details", "true"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"work_count": work_count, "works": []})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(subject_path.as_str()))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"work_count": work_count, "works": works})),
        )
        .mount(server)
        .await;
}

/// Mounts the editions list of one work.
pub async fn mount_editions(server: &MockServer, work_key: &str, entries: Value) {
    Mock::given(method("GET"))
        .and(path(format!("{work_key}/editions.json").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": entries})))
        .mount(server)
        .await;
}

/// Mounts an author record.
pub async fn mount_author(server: &MockServer, author_key: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{author_key}.json").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"key": author_key, "name": name})),
        )
        .mount(server)
        .await;
}

/// Mounts the yearly trending list.
pub async fn mount_trending(server: &MockServer, works: Value) {
    Mock::given(method("GET"))
        .and(path("/trending/yearly.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"works": works})))
        .mount(server)
        .await;
}
