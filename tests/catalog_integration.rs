//! Integration tests for the Open Library client.
//!
//! Drives the public catalog API against a mock server.

use bookswipe_core::catalog::{BookSearch, Catalog, CatalogError, HttpSettings, OpenLibraryClient};
use bookswipe_core::edition::select_best_edition;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;
use support::{english_edition_json, mount_author, mount_editions, mount_subject};

fn client_for(uri: &str) -> OpenLibraryClient {
    OpenLibraryClient::with_base_url(&HttpSettings::default(), uri).expect("client should build")
}

#[tokio::test]
async fn test_subject_count_and_page() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_subject(
        &mock_server,
        "fantasy",
        4321,
        json!([
            {
                "key": "/works/OL1W",
                "title": "The Fifth Season",
                "authors": [{"key": "/authors/OL1A", "name": "N. K. Jemisin"}],
                "subject": ["Fantasy", "Orogeny"],
                "first_publish_year": 2015,
                "cover_id": 7_894_561
            },
            {"title": "Missing key"}
        ]),
    )
    .await;

    let client = client_for(&mock_server.uri());
    assert_eq!(client.subject_work_count("fantasy").await.unwrap(), 4321);

    let page = client.subject_works("fantasy", 0, 20).await.unwrap();
    assert_eq!(page.work_count, 4321);
    assert_eq!(page.works.len(), 1, "malformed work should be skipped");
    assert_eq!(page.works[0].title, "The Fifth Season");
    assert_eq!(page.works[0].first_publish_year, Some(2015));
}

#[tokio::test]
async fn test_editions_feed_best_edition_selection() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    let mut french = english_edition_json("La Cinquième Saison", "2018");
    french["languages"] = json!([{"key": "/languages/fre"}]);
    let mut no_cover = english_edition_json("The Fifth Season", "2020");
    no_cover["covers"] = json!([-1]);
    mount_editions(
        &mock_server,
        "/works/OL1W",
        json!([
            english_edition_json("The Fifth Season", "August 2015"),
            english_edition_json("The Fifth Season", "2016"),
            french,
            no_cover,
        ]),
    )
    .await;

    let client = client_for(&mock_server.uri());
    let editions = client.work_editions("OL1W").await.unwrap();
    assert_eq!(editions.len(), 4);

    let best = select_best_edition(&editions).expect("an edition qualifies");
    assert_eq!(best.publish_date.as_deref(), Some("2016"));
}

#[tokio::test]
async fn test_author_detail_and_missing_author() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_author(&mock_server, "/authors/OL1A", "N. K. Jemisin").await;

    let client = client_for(&mock_server.uri());
    let author = client.author("/authors/OL1A").await.unwrap();
    assert_eq!(author.display_name(), Some("N. K. Jemisin"));

    let err = client.author("OL404A").await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err}");
}

#[tokio::test]
async fn test_search_books_english_query() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .and(query_param("title", "Piranesi"))
        .and(query_param("author", "Susanna Clarke"))
        .and(query_param("language", "eng"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "numFound": 1,
            "docs": [{
                "key": "/works/OL20893680W",
                "title": "Piranesi",
                "author_name": ["Susanna Clarke"],
                "first_publish_year": 2020
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let docs = client
        .search_books(&BookSearch::english("Piranesi", Some("Susanna Clarke")))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].key, "/works/OL20893680W");
    assert_eq!(docs[0].author_name, vec!["Susanna Clarke".to_string()]);
}

#[tokio::test]
async fn test_search_authors_and_trending() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/search/authors.json"))
        .and(query_param("q", "Ursula K. Le Guin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [{
                "key": "OL31574A",
                "name": "Ursula K. Le Guin",
                "top_work": "A Wizard of Earthsea",
                "work_count": 542
            }]
        })))
        .mount(&mock_server)
        .await;
    support::mount_trending(
        &mock_server,
        json!([{"key": "/works/OL5W", "title": "Fourth Wing", "author_name": ["Rebecca Yarros"]}]),
    )
    .await;

    let client = client_for(&mock_server.uri());
    let authors = client.search_authors("Ursula K. Le Guin", 1).await.unwrap();
    assert_eq!(authors[0].top_work.as_deref(), Some("A Wizard of Earthsea"));
    assert_eq!(authors[0].work_count, Some(542));

    let trending = client.trending_yearly(10).await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].title, "Fourth Wing");
}

#[tokio::test]
async fn test_rate_limited_response_is_status_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server.uri());
    let err = client.work("OL1W").await.unwrap_err();
    assert!(
        matches!(err, CatalogError::Status { status: 429, .. }),
        "expected 429 status error, got: {err:?}"
    );
    assert!(!err.is_not_found());
}
