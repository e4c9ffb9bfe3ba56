use std::sync::Arc;
use std::time::Duration;

use askboard::config::SheetsConfig;
use askboard::error::StoreError;
use askboard::models::{Question, Status};
use askboard::sheets::SheetsTable;
use askboard::table::TableBackend;
use askboard::QuestionStore;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALUES: &str = "/v4/spreadsheets/sheet-123/values/Questions";

fn sheets(server: &MockServer, token: Option<&str>) -> SheetsTable {
    SheetsTable::new(&SheetsConfig {
        spreadsheet_id: "sheet-123".into(),
        range: "Questions".into(),
        api_base: server.uri(),
        token: token.map(str::to_string),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn fetch_parses_value_grid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALUES))
        .and(query_param("valueRenderOption", "UNFORMATTED_VALUE"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Questions!A1:F3",
            "majorDimension": "ROWS",
            "values": [
                ["id", "text", "submitter", "votes", "timestamp", "status"],
                [1, "How?", "Ann", 3, "2024-05-01 10:00:00", "asked"],
                [2, "Why?"]
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let table = sheets(&server, Some("tok")).fetch_all_rows().await.unwrap();
    assert_eq!(table.columns.len(), 6);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec![json!(2), json!("Why?")]);
}

#[tokio::test]
async fn read_normalizes_short_rows() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALUES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                ["id", "text", "submitter", "votes", "timestamp", "status"],
                ["1", "How?", "Ann", "3", "2024-05-01 10:00:00", "asked"],
                [2, "Why?"]
            ]
        })))
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    let out = store.read().await;
    assert!(out.error.is_none());
    assert_eq!(out.questions[0].votes, 3);
    assert_eq!(out.questions[0].status, Status::Asked);
    assert_eq!(out.questions[1].submitter, "Anonymous");
    assert_eq!(out.questions[1].status, Status::Pending);
    assert_eq!(out.questions[1].timestamp, "");
}

#[tokio::test]
async fn missing_values_key_is_empty_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALUES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "Questions!A1:Z1000"})))
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    let out = store.read().await;
    assert!(out.error.is_none());
    assert!(out.questions.is_empty());
}

#[tokio::test]
async fn http_error_becomes_read_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALUES))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    let out = store.read().await;
    assert!(out.questions.is_empty());
    match out.error {
        Some(StoreError::Transport(msg)) => assert!(msg.contains("403") && msg.contains("PERMISSION_DENIED")),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn write_clears_then_puts_canonical_grid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{VALUES}:clear")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clearedRange": "Questions!A1:F9"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(VALUES))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(json!({
            "range": "Questions",
            "majorDimension": "ROWS",
            "values": [
                ["id", "text", "submitter", "votes", "timestamp", "status"],
                [1, "How?", "Ann", 2, "2024-05-01 10:00:00", "later"]
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedRows": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    let out = store
        .write(&[Question {
            id: 1,
            text: "How?".into(),
            submitter: "Ann".into(),
            votes: 2,
            timestamp: "2024-05-01 10:00:00".into(),
            status: Status::Other("later".into()),
        }])
        .await;
    assert!(out.ok, "{:?}", out.error);
}

#[tokio::test]
async fn writing_nothing_only_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{VALUES}:clear")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    assert!(store.write(&[]).await.ok);
}

#[tokio::test]
async fn failed_update_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{VALUES}:clear")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(VALUES))
        .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
        .mount(&server)
        .await;

    let store = QuestionStore::new(Arc::new(sheets(&server, None)));
    let out = store
        .write(&[Question {
            id: 1,
            text: "q".into(),
            submitter: "s".into(),
            votes: 0,
            timestamp: "t".into(),
            status: Status::Pending,
        }])
        .await;
    assert!(!out.ok);
    assert!(matches!(out.error, Some(StoreError::Transport(_))));
}

#[test]
fn blank_spreadsheet_id_is_rejected() {
    let cfg = SheetsConfig {
        spreadsheet_id: " ".into(),
        range: "Sheet1".into(),
        api_base: "http://localhost".into(),
        token: None,
        timeout: Duration::from_secs(1),
    };
    assert!(SheetsTable::new(&cfg).is_err());
}
