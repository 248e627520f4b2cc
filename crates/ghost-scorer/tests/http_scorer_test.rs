//! HttpScorer against a local mock classifier.

use axum::{http::StatusCode, routing::post, Json, Router};
use ghost_scorer::{HttpScorer, ScorerError, SentimentScorer};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;

/// Echoes the received text length in the score so truncation is visible.
async fn classify(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    let chars = text.chars().count() as f64;
    let response = if text.contains("crash") {
        json!([{"label": "negative", "score": 0.75}])
    } else if text.contains("boring") {
        json!({"label": "neutral", "score": 0.98})
    } else {
        json!({"label": "positive", "score": chars / 1000.0})
    };
    (StatusCode::OK, Json(response))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "model loading")
}

async fn start_classifier() -> String {
    let app = Router::new()
        .route("/classify", post(classify))
        .route("/broken", post(broken));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_http_scorer_labels() {
    let base = start_classifier().await;
    let scorer = HttpScorer::new(format!("{base}/classify"), Some(Duration::from_secs(5)), 512).unwrap();

    assert_eq!(scorer.score("market crash incoming").await.unwrap(), -0.75);
    assert_eq!(scorer.score("boring sideways day").await.unwrap(), 0.0);
    assert_eq!(scorer.score("moon").await.unwrap(), 0.004);
}

#[tokio::test]
async fn test_http_scorer_truncates_input() {
    let base = start_classifier().await;
    let scorer = HttpScorer::new(format!("{base}/classify"), None, 512).unwrap();

    let long = "x".repeat(2000);
    assert_eq!(scorer.score(&long).await.unwrap(), 0.512);
}

#[tokio::test]
async fn test_http_scorer_status_error() {
    let base = start_classifier().await;
    let scorer = HttpScorer::new(format!("{base}/broken"), None, 512).unwrap();

    match scorer.score("anything").await {
        Err(ScorerError::Status { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "model loading");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_scorer_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let scorer = HttpScorer::new(format!("http://{addr}/classify"), Some(Duration::from_secs(2)), 512).unwrap();
    assert!(matches!(
        scorer.score("moon").await,
        Err(ScorerError::HttpClient(_))
    ));
}
