use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::watch::notify::LogNotifier;
use crate::workflows::watch::pipeline::ShutdownSignal;
use crate::workflows::watch::router::watch_router;
use crate::workflows::watch::service::WatchService;

fn service() -> Arc<WatchService> {
    let north = partition("north");
    let listings = ScriptedSource::default().with(
        &north,
        vec![raw_record("a", 500_000), raw_record("b", 500_000)],
    );
    let details = DetailStub::default()
        .serve("a", required_schools())
        .serve("b", required_schools());
    let harness = Harness::new(listings, details);
    Arc::new(WatchService::new(
        Arc::new(harness.pipeline(vec![north])),
        Arc::new(LogNotifier),
        ShutdownSignal::never(),
    ))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn latest_run_is_not_found_before_any_run() {
    let response = watch_router(service())
        .oneshot(get("/api/v1/runs/latest"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = read_json_body(response).await;
    assert_eq!(body["running"], false);
}

#[tokio::test]
async fn triggered_run_reports_matches_and_fills_history() {
    let service = service();

    let response = watch_router(service.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/runs")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["state"], "done");
    assert_eq!(body["notification"]["status"], "delivered");
    assert_eq!(body["notification"]["count"], 2);

    let response = watch_router(service.clone())
        .oneshot(get("/api/v1/matches?limit=1"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["matches"][0]["listing_id"], "b");

    let response = watch_router(service)
        .oneshot(get("/api/v1/runs/latest"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["report"]["considered"], 2);
}
