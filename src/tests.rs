use super::*;
use crate::form::{MSG_LIST_FAILED, MSG_SELECT_FILTER};
use crate::models::{Question, StatisticsSummary};
use crate::service::stub::StubSearchService;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

fn app_with(stub: &Arc<StubSearchService>) -> (Router, SearchForm) {
    let form = SearchForm::new(stub.clone());
    let app = build_router(AppState { form: form.clone() });
    (app, form)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

fn put_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_request(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_options_lists_seven_of_each() {
    let (app, _) = app_with(&Arc::new(StubSearchService::new()));

    let (status, body) = send(&app, get_request("/options")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phases"].as_array().unwrap().len(), 7);
    assert_eq!(body["activities"][0]["view_value"], "Atividade 1");
}

#[tokio::test]
async fn test_search_without_filters_is_rejected() {
    let stub = Arc::new(StubSearchService::new());
    let (app, _) = app_with(&stub);

    let (status, body) = send(&app, post_request("/search")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["message"], MSG_SELECT_FILTER);
    assert_eq!(body["data"]["results"], serde_json::json!([]));
    assert!(stub.calls().is_empty());
}

#[tokio::test]
async fn test_put_filters_then_search_and_wait() {
    let stub = Arc::new(StubSearchService::new());
    stub.script_list(
        "3",
        Ok(vec![
            Question(serde_json::json!({ "id": 1 })),
            Question(serde_json::json!({ "id": 2 })),
        ]),
    );
    let (app, _) = app_with(&stub);

    let filters = serde_json::json!({ "phase": "3" });
    let (status, filters) = send(&app, put_json("/search/filters", filters)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filters["phase"], "3");
    assert_eq!(filters["activity"], "");

    let (status, body) = send(&app, post_request("/search?wait=true")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(
        body["data"]["results"],
        serde_json::json!([{ "id": 1 }, { "id": 2 }])
    );
    assert_eq!(body["data"]["error_message"], "");
    assert_eq!(body["data"]["status"], "success");
}

#[tokio::test]
async fn test_dated_statistics_reach_state() {
    let stub = Arc::new(StubSearchService::new());
    let summary: StatisticsSummary =
        serde_json::from_value(serde_json::json!({ "yes": 12, "no": 4 })).unwrap();
    stub.script_statistics("2", Ok(summary));
    let (app, form) = app_with(&stub);

    let filters = serde_json::json!({
        "phase": "2",
        "activity": "5",
        "start_date": "2024-01-01",
        "end_date": "2024-01-31",
    });
    send(&app, put_json("/search/filters", filters)).await;

    let (status, body) = send(&app, post_request("/search")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["message"], "Search #1 (dated)");

    // let the detached query tasks finish
    while form.display().statistics_status == crate::models::SlotStatus::Pending {
        tokio::task::yield_now().await;
    }

    let (_, state) = send(&app, get_request("/search/state")).await;
    assert_eq!(state["statistics"], serde_json::json!({ "yes": 12, "no": 4 }));
    assert_eq!(state["generation"], 1);
}

#[tokio::test]
async fn test_backend_failure_shows_retry_message() {
    let stub = Arc::new(StubSearchService::new());
    stub.script_list("7", Err("connection refused".to_string()));
    let (app, _) = app_with(&stub);
    let filters = serde_json::json!({ "activity": "1", "phase": "7" });
    send(&app, put_json("/search/filters", filters)).await;

    let (status, body) = send(&app, post_request("/search?wait=true")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "error");
    assert_eq!(body["data"]["error_message"], MSG_LIST_FAILED);
    assert_eq!(body["data"]["list_error"], MSG_LIST_FAILED);
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = app_with(&Arc::new(StubSearchService::new()));

    let (status, body) = send(&app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
