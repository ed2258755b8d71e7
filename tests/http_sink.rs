use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

use visitlog::{
    remote::{
        RemoteFailure, RemoteVisitSink,
        http::{HttpVisitSink, RemoteConfig},
    },
    types::{VisitId, VisitPurpose},
    visit::VisitRecord,
};

fn sink(base_url: &str) -> HttpVisitSink {
    HttpVisitSink::new(RemoteConfig {
        base_url: base_url.to_string(),
        api_key: "test-key".to_string(),
        table: "visitors".to_string(),
    })
    .expect("sink")
}

fn asha() -> VisitRecord {
    VisitRecord {
        id: VisitId::new("local-1"),
        visitor_name: "Asha Rao".to_string(),
        person_to_meet: Some("Dev Patel".to_string()),
        purpose: Some(VisitPurpose::Other),
        free_text_reason: Some("Fire inspection".to_string()),
        phone_number: Some("0412 555 019".to_string()),
        photo_reference: None,
        check_in_time: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
        check_out_time: None,
    }
}

#[tokio::test]
async fn check_in_posts_row_and_returns_remote_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .and(header("apikey", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!([{
            "full_name": "Asha Rao",
            "reason_for_visit": "Fire inspection",
            "person_to_meet": "Dev Patel",
        }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": 42 }])))
        .expect(1)
        .mount(&server)
        .await;

    let id = sink(&server.uri())
        .record_check_in(&asha())
        .await
        .expect("check in");
    assert_eq!(id, VisitId::new("42"));
}

#[tokio::test]
async fn check_in_sends_purpose_code_for_listed_purposes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/visitors"))
        .and(body_partial_json(json!([{ "reason_for_visit": "personal-visit" }])))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([{ "id": "9b2f0c1e" }])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut record = asha();
    record.purpose = Some(VisitPurpose::PersonalVisit);
    record.free_text_reason = None;
    let id = sink(&server.uri())
        .record_check_in(&record)
        .await
        .expect("check in");
    assert_eq!(id.as_str(), "9b2f0c1e");
}

#[tokio::test]
async fn check_out_patches_matching_row() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/visitors"))
        .and(query_param("id", "eq.42"))
        .and(body_partial_json(json!({ "checked_out_at": "2026-03-02T10:30:00Z" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 42 }])))
        .expect(1)
        .mount(&server)
        .await;

    sink(&server.uri())
        .record_check_out(
            &VisitId::new("42"),
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 30, 0).unwrap(),
        )
        .await
        .expect("check out");
}

#[tokio::test]
async fn check_out_of_unknown_row_reports_missing_row() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = sink(&server.uri())
        .record_check_out(&VisitId::new("local-1"), Utc::now())
        .await
        .expect_err("missing row");
    assert_eq!(err, RemoteFailure::MissingRow(VisitId::new("local-1")));
}

#[tokio::test]
async fn non_success_status_is_rejected_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = sink(&server.uri())
        .record_check_in(&asha())
        .await
        .expect_err("rejected");
    assert_eq!(
        err,
        RemoteFailure::Rejected {
            status: 401,
            body: "invalid api key".to_string(),
        }
    );
}

#[tokio::test]
async fn malformed_response_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{ "id": null }])))
        .mount(&server)
        .await;

    let err = sink(&server.uri())
        .record_check_in(&asha())
        .await
        .expect_err("decode");
    assert!(matches!(err, RemoteFailure::Decode(_)));
}

#[tokio::test]
async fn unreachable_server_is_reported() {
    let err = sink("http://127.0.0.1:1")
        .record_check_in(&asha())
        .await
        .expect_err("unreachable");
    assert!(matches!(err, RemoteFailure::Unreachable(_)));
}
