use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;
use tower::ServiceExt;

fn write_corpus(dir: &std::path::Path) {
    fs::write(dir.join("0.txt"), "The cat sat on the mat. Cats nap often.").unwrap();
    fs::write(dir.join("1.txt"), "Dogs bark loudly at the moon.").unwrap();
    fs::write(dir.join("2.txt"), "A cat and a dog shared a porch.").unwrap();
}

async fn call(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::get(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = server::build_app(dir.path()).unwrap();

    let (status, json) = call(app, "/search?query=cats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 2);
    let results = json["results"].as_array().unwrap();
    // doc0 mentions cats twice and ranks first; doc1 never matches
    assert_eq!(results[0]["doc_id"].as_u64().unwrap(), 0);
    assert_eq!(results[1]["doc_id"].as_u64().unwrap(), 2);
    assert!(results[0]["score"].as_f64().unwrap() > results[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn unmatched_query_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = server::build_app(dir.path()).unwrap();

    let (status, json) = call(app, "/search?query=zeppelin").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_hits"].as_u64().unwrap(), 0);
    assert!(json["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn document_round_trip_and_not_found() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = server::build_app(dir.path()).unwrap();

    let (status, json) = call(app.clone(), "/document/1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["text"].as_str().unwrap().contains("Dogs bark"));

    let (status, json) = call(app, "/document/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"].as_str().unwrap(), "document not found");
}

#[tokio::test]
async fn health_endpoint() {
    let dir = tempdir().unwrap();
    write_corpus(dir.path());
    let app = server::build_app(dir.path()).unwrap();

    let req = Request::get("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
