use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{appointment_routes, package_routes};
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockDatabaseResponses, TestConfig, TestUser};

fn config_for(server: &MockServer) -> AppConfig {
    TestConfig::with_database(&server.uri()).to_app_config()
}

fn appointments_app(config: &AppConfig) -> Router {
    appointment_routes(Arc::new(config.clone()))
}

fn packages_app(config: &AppConfig) -> Router {
    package_routes(Arc::new(config.clone()))
}

fn token_for(user: &TestUser, config: &AppConfig) -> String {
    JwtTestUtils::create_test_token(user, &config.jwt_secret, Some(1))
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn mount_patient(server: &MockServer, patient_id: &str, owner_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::patient_document(patient_id, owner_id, "self", "ada")
        ])))
        .mount(server)
        .await;
}

async fn mount_appointment(server: &MockServer, appointment: Value) {
    let id = appointment["id"].as_str().unwrap().to_string();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([appointment])))
        .mount(server)
        .await;
}

// ==============================================================================
// BOOKING
// ==============================================================================

#[tokio::test]
async fn test_book_appointment_takes_doctor_from_package() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let patient_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();
    let doctor_id = Uuid::new_v4().to_string();
    let appointment_id = Uuid::new_v4().to_string();

    mount_patient(&mock_server, &patient_id, &user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("id", format!("eq.{}", package_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::package_document(&package_id, &doctor_id)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({
            "patient_id": patient_id,
            "package_id": package_id,
            "doctor_id": doctor_id,
            "status": "upcoming"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDatabaseResponses::appointment_document(&appointment_id, &patient_id, &package_id, &doctor_id, "upcoming")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&user, &config)),
            Some(json!({
                "patient_id": patient_id,
                "package_id": package_id,
                "scheduled_at": (Utc::now() + Duration::days(3)).to_rfc3339(),
                "notes": "Follow-up"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["doctor_id"], doctor_id);
    assert_eq!(body["status"], "upcoming");

    let requests = mock_server.received_requests().await.unwrap();
    let insert = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let sent: Value = serde_json::from_slice(&insert.body).unwrap();
    let booking_id = sent["booking_id"].as_str().unwrap();
    assert!(booking_id.starts_with(&format!("BK-{}-", Utc::now().format("%Y%m%d"))));
    assert_eq!(booking_id.len(), "BK-YYYYMMDD-XXXXXX".len());
}

#[tokio::test]
async fn test_book_in_the_past_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&user, &config)),
            Some(json!({
                "patient_id": Uuid::new_v4(),
                "package_id": Uuid::new_v4(),
                "scheduled_at": (Utc::now() - Duration::hours(2)).to_rfc3339()
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["scheduled_at"], "Appointment time must be in the future.");
}

#[tokio::test]
async fn test_book_for_someone_elses_patient_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let patient_id = Uuid::new_v4().to_string();

    mount_patient(&mock_server, &patient_id, &Uuid::new_v4().to_string()).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&user, &config)),
            Some(json!({
                "patient_id": patient_id,
                "package_id": Uuid::new_v4(),
                "scheduled_at": (Utc::now() + Duration::days(1)).to_rfc3339()
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_book_with_missing_package() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let patient_id = Uuid::new_v4().to_string();

    mount_patient(&mock_server, &patient_id, &user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&user, &config)),
            Some(json!({
                "patient_id": patient_id,
                "package_id": Uuid::new_v4(),
                "scheduled_at": (Utc::now() + Duration::days(1)).to_rfc3339()
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Package not found");
}

#[tokio::test]
async fn test_appointments_require_a_token() {
    let config = TestConfig::default().to_app_config();

    let response = appointments_app(&config)
        .oneshot(request("GET", "/", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ==============================================================================
// READS
// ==============================================================================

#[tokio::test]
async fn test_list_is_scoped_to_callers_patients() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("user_id", format!("eq.{}", user.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": patient_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("in.({})", patient_id)))
        .and(query_param("status", "eq.upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::appointment_document(
                &Uuid::new_v4().to_string(),
                &patient_id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "upcoming"
            )
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request("GET", "/?status=upcoming", Some(&token_for(&user, &config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["patient_id"], patient_id);
}

#[tokio::test]
async fn test_list_without_patients_skips_the_query() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request("GET", "/", Some(&token_for(&user, &config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_detail_resolves_doctor_through_package() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();
    let package_doctor = Uuid::new_v4().to_string();
    let stale_doctor = Uuid::new_v4().to_string();

    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(&appointment_id, &patient_id, &package_id, &stale_doctor, "upcoming"),
    )
    .await;
    mount_patient(&mock_server, &patient_id, &user.id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::package_document(&package_id, &package_doctor)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", package_doctor)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_document(&package_doctor, "Dr. Rao", None)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request("GET", &format!("/{}", appointment_id), Some(&token_for(&user, &config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], appointment_id);
    assert_eq!(body["patient"]["name"], "ada");
    assert_eq!(body["package"]["package"], "video_call");
    assert_eq!(body["doctor"]["id"], package_doctor);
}

#[tokio::test]
async fn test_lookup_by_booking_id() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("booking_id", "eq.BK-20250101-ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::appointment_document(
                &appointment_id,
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                "upcoming"
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request("GET", "/booking/BK-20250101-ABC123", Some(&token_for(&admin, &config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], appointment_id);
    assert!(body["package"].is_null());
    assert!(body["doctor"].is_null());
}

// ==============================================================================
// LIFECYCLE
// ==============================================================================

#[tokio::test]
async fn test_cancel_upcoming_appointment() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();
    let doctor_id = Uuid::new_v4().to_string();

    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(&appointment_id, &patient_id, &package_id, &doctor_id, "upcoming"),
    )
    .await;
    mount_patient(&mock_server, &patient_id, &user.id).await;

    let mut cancelled =
        MockDatabaseResponses::appointment_document(&appointment_id, &patient_id, &package_id, &doctor_id, "cancelled");
    cancelled["cancellation_reason"] = json!("Feeling better");
    cancelled["cancelled_at"] = json!(Utc::now().to_rfc3339());

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.upcoming"))
        .and(body_partial_json(json!({
            "status": "cancelled",
            "cancellation_reason": "Feeling better"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            &format!("/{}/cancel", appointment_id),
            Some(&token_for(&user, &config)),
            Some(json!({ "reason": "Feeling better" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancellation_reason"], "Feeling better");
    assert!(body["cancelled_at"].is_string());
}

#[tokio::test]
async fn test_cancel_without_body() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();

    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(&appointment_id, &ids[0], &ids[1], &ids[2], "upcoming"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "cancelled", "cancellation_reason": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::appointment_document(&appointment_id, &ids[0], &ids[1], &ids[2], "cancelled")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request("POST", &format!("/{}/cancel", appointment_id), Some(&token_for(&admin, &config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cancel_twice_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let user = TestUser::patient("ada@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();

    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(
            &appointment_id,
            &patient_id,
            &Uuid::new_v4().to_string(),
            &Uuid::new_v4().to_string(),
            "cancelled",
        ),
    )
    .await;
    mount_patient(&mock_server, &patient_id, &user.id).await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            &format!("/{}/cancel", appointment_id),
            Some(&token_for(&user, &config)),
            Some(json!({ "reason": "Again" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Appointment is already cancelled");
}

#[tokio::test]
async fn test_update_after_cancellation_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();

    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(&appointment_id, &ids[0], &ids[1], &ids[2], "cancelled"),
    )
    .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "PUT",
            &format!("/{}", appointment_id),
            Some(&token_for(&admin, &config)),
            Some(json!({ "scheduled_at": (Utc::now() + Duration::days(5)).to_rfc3339() })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_complete_requires_admin() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::patient("ada@example.com");

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            &format!("/{}/complete", Uuid::new_v4()),
            Some(&token_for(&user, &config)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_complete_after_concurrent_cancel_reports_status() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let appointment_id = Uuid::new_v4().to_string();
    let ids: Vec<String> = (0..3).map(|_| Uuid::new_v4().to_string()).collect();

    // Upcoming when first read, cancelled by the time the write lands
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::appointment_document(&appointment_id, &ids[0], &ids[1], &ids[2], "upcoming")
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_appointment(
        &mock_server,
        MockDatabaseResponses::appointment_document(&appointment_id, &ids[0], &ids[1], &ids[2], "cancelled"),
    )
    .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.upcoming"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = appointments_app(&config)
        .oneshot(request(
            "POST",
            &format!("/{}/complete", appointment_id),
            Some(&token_for(&admin, &config)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Appointment cannot be modified in current status: cancelled"
    );
}

#[tokio::test]
async fn test_delete_missing_appointment() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = appointments_app(&config);
    let token = token_for(&admin, &config);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/{}", Uuid::new_v4()), Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(request("DELETE", "/not-a-uuid", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ==============================================================================
// PACKAGES
// ==============================================================================

#[tokio::test]
async fn test_create_package_defaults() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let doctor_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": doctor_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/doctor_packages"))
        .and(body_partial_json(json!({
            "doctor_id": doctor_id,
            "duration_minutes": 15,
            "package": "video_call",
            "amount": 0
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDatabaseResponses::package_document(&package_id, &doctor_id)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = packages_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&admin, &config)),
            Some(json!({ "doctor_id": doctor_id, "package": "video_call" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_create_package_for_unknown_doctor() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = packages_app(&config)
        .oneshot(request(
            "POST",
            "/",
            Some(&token_for(&admin, &config)),
            Some(json!({ "doctor_id": Uuid::new_v4(), "package": "messaging", "amount": 300 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["doctor_id"], "Doctor not found.");
}

#[tokio::test]
async fn test_create_package_rejects_bad_values() {
    let config = TestConfig::default().to_app_config();
    let admin = TestUser::admin("root@example.com");
    let app = packages_app(&config);
    let token = token_for(&admin, &config);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/",
            Some(&token),
            Some(json!({ "doctor_id": Uuid::new_v4(), "package": "in_person", "duration_minutes": 0 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["duration_minutes"].is_string());

    let response = app
        .oneshot(request(
            "POST",
            "/",
            Some(&token),
            Some(json!({ "doctor_id": Uuid::new_v4(), "package": "in_person", "amount": -5 })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["amount"].is_string());
}

#[tokio::test]
async fn test_list_packages_by_doctor_is_public() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::package_document(&Uuid::new_v4().to_string(), &doctor_id)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = packages_app(&config)
        .oneshot(request("GET", &format!("/?doctor_id={}", doctor_id), None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await[0]["doctor_id"], doctor_id);
}

#[tokio::test]
async fn test_delete_package() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let package_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("id", format!("eq.{}", package_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::package_document(&package_id, &Uuid::new_v4().to_string())
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = packages_app(&config);
    let token = token_for(&admin, &config);

    let response = app
        .clone()
        .oneshot(request("DELETE", &format!("/{}", package_id), Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Package deleted successfully");

    let response = app
        .oneshot(request("DELETE", &format!("/{}", Uuid::new_v4()), Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "Package not found");
}

#[tokio::test]
async fn test_package_with_appointments_cannot_be_deleted() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server);
    let admin = TestUser::admin("root@example.com");
    let package_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("package_id", format!("eq.{}", package_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = packages_app(&config)
        .oneshot(request(
            "DELETE",
            &format!("/{}", package_id),
            Some(&token_for(&admin, &config)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Package has appointments and cannot be deleted");
}
