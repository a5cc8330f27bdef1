/// Integration tests for the emergency notifier HTTP API
///
/// This test module covers:
/// - The `{"data": [report]}` invocation envelope
/// - Error response format for unrecoverable failures
/// - Notification failures never failing the request
/// - Invocation timeout
use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use emergency_notifier::handlers::register_routes;
use emergency_notifier::models::{GeoPoint, NotificationPayload, UserDirectoryEntry, UserRole};
use emergency_notifier::{
    DirectoryError, EmergencyNotifier, FcmPushSender, InMemoryUserDirectory, MulticastOutcome,
    NotifierConfig, PushError, PushSender, UserDirectory,
};
use mockall::mock;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Push {}

    #[async_trait]
    impl PushSender for Push {
        async fn send_to_topic(
            &self,
            payload: &NotificationPayload,
            topic: &str,
        ) -> Result<String, PushError>;
        async fn send_each_for_multicast(
            &self,
            payload: &NotificationPayload,
            tokens: &[String],
        ) -> Result<MulticastOutcome, PushError>;
    }
}

/// Directory whose query never completes within the invocation budget
struct StalledDirectory;

#[async_trait]
impl UserDirectory for StalledDirectory {
    async fn fetch_all_users(&self) -> Result<Vec<UserDirectoryEntry>, DirectoryError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

fn notifier() -> Arc<EmergencyNotifier> {
    let directory = InMemoryUserDirectory::new(vec![
        UserDirectoryEntry::new(
            UserRole::Citizen,
            Some(GeoPoint::new(10.03, 10.0).unwrap()),
            Some("T1"),
        ),
        UserDirectoryEntry::new(
            UserRole::Responder,
            Some(GeoPoint::new(10.01, 10.0).unwrap()),
            Some("R1"),
        ),
    ]);

    // No FCM credentials: every dispatch is recorded as failed
    Arc::new(EmergencyNotifier::new(
        Arc::new(directory),
        Arc::new(FcmPushSender::new(None)),
        NotifierConfig::default(),
    ))
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(notifier()))
                .configure(register_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_notify_returns_delivery_result_even_when_pushes_fail() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .set_json(json!({
            "data": [{
                "id": "em-1",
                "category": "fire",
                "latitude": 10.0,
                "longitude": 10.0,
                "description": "Building fire reported"
            }]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["emergency_id"], "em-1");
    assert_eq!(body["data"]["topic"], "fire");
    assert_eq!(body["data"]["nearby_recipients"], 1);
    assert_eq!(body["data"]["topic_status"]["status"], "failed");
    assert_eq!(body["data"]["nearby_status"]["status"], "failed");
}

#[actix_web::test]
async fn test_only_first_report_is_consumed() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .set_json(json!({
            "data": [
                {"id": "first", "category": "medical", "latitude": 50.0, "longitude": 50.0},
                {"id": "second", "category": "fire", "latitude": 10.0, "longitude": 10.0}
            ]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["emergency_id"], "first");
    assert_eq!(body["data"]["nearby_recipients"], 0);
    assert_eq!(body["data"]["nearby_status"]["status"], "skipped");
}

#[actix_web::test]
async fn test_empty_envelope_is_internal_error() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .set_json(json!({ "data": [] }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "internal");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("no emergency report"));
}

#[actix_web::test]
async fn test_missing_category_is_internal_error() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .set_json(json!({
            "data": [{"id": "em-1", "latitude": 10.0, "longitude": 10.0}]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["kind"], "internal");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("missing category"));
}

#[actix_web::test]
async fn test_malformed_body_is_internal_error() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .insert_header(("content-type", "application/json"))
        .set_payload(r#"{"data": [{"latitude": "north"}]}"#)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "internal");
}

#[actix_web::test]
async fn test_stalled_directory_times_out_as_internal_error() {
    let mut push = MockPush::new();
    push.expect_send_to_topic()
        .times(1)
        .returning(|_, _| Ok("projects/p/messages/1".to_string()));
    push.expect_send_each_for_multicast().never();

    let config = NotifierConfig {
        invocation_timeout_secs: 1,
        ..Default::default()
    };
    let notifier = Arc::new(EmergencyNotifier::new(
        Arc::new(StalledDirectory),
        Arc::new(push),
        config,
    ));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(notifier))
            .configure(register_routes),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/emergencies/notify")
        .set_json(json!({
            "data": [{"id": "em-1", "category": "fire", "latitude": 10.0, "longitude": 10.0}]
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["kind"], "internal");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}
