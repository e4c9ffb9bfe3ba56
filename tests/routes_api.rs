use actix_web::{test, web, App};
use askboard::table::inmem::InMemTable;
use askboard::{config, AppState, QuestionStore, SessionRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn state() -> AppState {
    let store = Arc::new(QuestionStore::new(Arc::new(InMemTable::new())));
    AppState { sessions: Arc::new(SessionRegistry::new(store, Duration::ZERO, Duration::from_secs(3600))) }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data(web::Data::new($state)).configure(config)).await
    };
}

#[actix_web::test]
async fn dashboard_flow_over_http() {
    let app = app!(state());

    // submitter dashboard starts empty
    let req = test::TestRequest::post().uri("/api/v1/sessions").set_json(&json!({"kind": "submitter"})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    let sub = body["session_id"].as_str().unwrap().to_string();
    assert_eq!(body["view"]["questions"].as_array().unwrap().len(), 0);
    assert!(body["view"].get("by_status").is_none());

    // blank text rejected
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/sessions/{sub}/questions"))
        .set_json(&json!({"text": "  "}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 400);

    // submit anonymously
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/sessions/{sub}/questions"))
        .set_json(&json!({"text": "Q1", "submitter": ""}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let q: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(q["id"], 1);
    assert_eq!(q["submitter"], "Anonymous");
    assert_eq!(q["status"], "pending");

    // vote twice
    for expected in [1, 2] {
        let req = test::TestRequest::post().uri(&format!("/api/v1/sessions/{sub}/questions/1/vote")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);
        let q: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
        assert_eq!(q["votes"], expected);
    }

    // submitters cannot moderate
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/sessions/{sub}/questions/1/status"))
        .set_json(&json!({"status": "asked"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    // moderator marks it asked
    let req = test::TestRequest::post().uri("/api/v1/sessions").set_json(&json!({"kind": "moderator"})).to_request();
    let body: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    let moderator = body["session_id"].as_str().unwrap().to_string();
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/sessions/{moderator}/questions/1/status"))
        .set_json(&json!({"status": "asked"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get().uri(&format!("/api/v1/sessions/{moderator}")).to_request();
    let view: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    assert_eq!(view["questions"][0]["badge"], "asked");
    assert_eq!(view["counts"], json!({"total": 1, "pending": 0, "asked": 1}));
    assert_eq!(view["by_status"][0]["mean_votes"], 2.0);

    // reset back to pending
    let req = test::TestRequest::post().uri(&format!("/api/v1/sessions/{moderator}/reset")).to_request();
    let body: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    assert_eq!(body["reset"], 1);

    // the submitter sees it after a refresh
    let req = test::TestRequest::post().uri(&format!("/api/v1/sessions/{sub}/refresh")).to_request();
    let view: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    assert_eq!(view["questions"][0]["status"], "pending");
    assert_eq!(view["questions"][0]["votes"], 2);
}

#[actix_web::test]
async fn unknown_session_and_question_are_404() {
    let app = app!(state());
    let req = test::TestRequest::get().uri(&format!("/api/v1/sessions/{}", uuid::Uuid::new_v4())).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);

    let req = test::TestRequest::post().uri("/api/v1/sessions").set_json(&json!({"kind": "submitter"})).to_request();
    let body: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    let sid = body["session_id"].as_str().unwrap().to_string();
    let req = test::TestRequest::post().uri(&format!("/api/v1/sessions/{sid}/questions/99/vote")).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert_eq!(body["error"], "not found");

    let req = test::TestRequest::delete().uri(&format!("/api/v1/sessions/{sid}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);
    let req = test::TestRequest::delete().uri(&format!("/api/v1/sessions/{sid}")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn unknown_status_value_is_400() {
    let app = app!(state());
    let req = test::TestRequest::post().uri("/api/v1/sessions").set_json(&json!({"kind": "submitter"})).to_request();
    let body: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    let sub = body["session_id"].as_str().unwrap().to_string();
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/sessions/{sub}/questions"))
        .set_json(&json!({"text": "Q1"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    let req = test::TestRequest::post().uri("/api/v1/sessions").set_json(&json!({"kind": "moderator"})).to_request();
    let body: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    let moderator = body["session_id"].as_str().unwrap().to_string();
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/sessions/{moderator}/questions/1/status"))
        .set_json(&json!({"status": "banana"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("banana"));

    let req = test::TestRequest::get().uri(&format!("/api/v1/sessions/{moderator}")).to_request();
    let view: Value = serde_json::from_slice(&test::read_body(test::call_service(&app, req).await).await).unwrap();
    assert_eq!(view["questions"][0]["status"], "pending");
}

#[actix_web::test]
async fn health_is_ok() {
    let app = app!(state());
    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
