use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use directory_cell::directory_routes;
use shared_config::AppConfig;
use shared_utils::test_utils::{JwtTestUtils, MockDatabaseResponses, TestConfig, TestUser};

fn config_for(server: &MockServer, media_root: Option<&std::path::Path>) -> AppConfig {
    let mut config = TestConfig::with_database(&server.uri());
    if let Some(root) = media_root {
        config.media_root = root.to_string_lossy().to_string();
    }
    config.to_app_config()
}

fn create_test_app(config: &AppConfig) -> Router {
    directory_routes(Arc::new(config.clone()))
}

fn admin_token(config: &AppConfig) -> String {
    JwtTestUtils::create_test_token(&TestUser::admin("root@example.com"), &config.jwt_secret, Some(1))
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

#[tokio::test]
async fn test_list_doctors_includes_review_aggregates() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let rated = Uuid::new_v4().to_string();
    let unrated = Uuid::new_v4().to_string();
    let author = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_document(&rated, "Dr. Mehta", None),
            MockDatabaseResponses::doctor_document(&unrated, "Dr. Shah", None)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/reviews"))
        .and(query_param("entity_type", "eq.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::review_document(&Uuid::new_v4().to_string(), &author, &rated, 1, 5),
            MockDatabaseResponses::review_document(&Uuid::new_v4().to_string(), &author, &rated, 1, 4)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("GET", "/doctors", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body[0]["id"], rated);
    assert_eq!(body[0]["review_count"], 2);
    assert_eq!(body[0]["average_rating"], 4.5);
    assert_eq!(body[1]["review_count"], 0);
    assert_eq!(body[1]["average_rating"], 0.0);
}

#[tokio::test]
async fn test_hospital_detail_inlines_related_records() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let hospital_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::hospital_document(&hospital_id, "City Care")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/working_times"))
        .and(query_param("entity_type", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::working_time_document(&hospital_id, 2, "monday")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/reviews"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::review_document(&Uuid::new_v4().to_string(), &Uuid::new_v4().to_string(), &hospital_id, 2, 3)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("hospital_id", format!("eq.{}", hospital_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_document(&Uuid::new_v4().to_string(), "Dr. Iyer", Some(&hospital_id))
        ])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("GET", &format!("/hospitals/{}", hospital_id), None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "City Care");
    assert_eq!(body["review_count"], 1);
    assert_eq!(body["average_rating"], 3.0);
    assert_eq!(body["working_times"][0]["day"], "monday");
    assert_eq!(body["specialists"][0]["name"], "Dr. Iyer");
}

#[tokio::test]
async fn test_create_hospital_seeds_default_working_times() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let hospital_id = Uuid::new_v4().to_string();

    Mock::given(method("POST"))
        .and(path("/rest/v1/hospitals"))
        .and(body_partial_json(json!({ "name": "City Care", "is_favorite": false })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDatabaseResponses::hospital_document(&hospital_id, "City Care")
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let seeded: Vec<Value> = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"]
        .iter()
        .map(|day| MockDatabaseResponses::working_time_document(&hospital_id, 2, day))
        .collect();

    Mock::given(method("POST"))
        .and(path("/rest/v1/working_times"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(seeded)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request(
            "POST",
            "/hospitals",
            Some(&admin_token(&config)),
            Some(json!({
                "name": "City Care",
                "location": {
                    "address": "1 Main Street",
                    "city": "Ahmedabad",
                    "state": "Gujarat",
                    "country": "India"
                }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["id"], hospital_id);

    let requests = mock_server.received_requests().await.unwrap();
    let seed = requests
        .iter()
        .find(|r| r.url.path() == "/rest/v1/working_times")
        .unwrap();
    let slots: Vec<Value> = serde_json::from_slice(&seed.body).unwrap();
    assert_eq!(slots.len(), 7);
    assert!(slots.iter().all(|s| s["start_time"] == "09:00" && s["end_time"] == "17:00" && s["entity_type"] == 2));
}

#[tokio::test]
async fn test_writes_require_admin() {
    let config = TestConfig::default().to_app_config();
    let token = JwtTestUtils::create_test_token(&TestUser::patient("ada@example.com"), &config.jwt_secret, Some(1));
    let app = create_test_app(&config);

    let response = app
        .clone()
        .oneshot(request("POST", "/categories", Some(&token), Some(json!({ "name": "Cardiology" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(request("POST", "/categories", None, Some(json!({ "name": "Cardiology" }))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_category_name_is_rejected() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .and(query_param("name", "eq.Cardiology"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("POST", "/categories", Some(&admin_token(&config)), Some(json!({ "name": "Cardiology" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["name"], "Category with this name already exists.");
}

#[tokio::test]
async fn test_create_doctor_with_unknown_category() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request(
            "POST",
            "/doctors",
            Some(&admin_token(&config)),
            Some(json!({ "name": "Dr. Mehta", "category_id": Uuid::new_v4() })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["category_id"], "Category not found.");
}

#[tokio::test]
async fn test_delete_missing_doctor_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/working_times"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("DELETE", &format!("/doctors/{}", Uuid::new_v4()), Some(&admin_token(&config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_doctor_cascades_dependents() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let doctor_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": package_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("package_id", format!("in.({})", package_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_document(&doctor_id, "Dr. Mehta", None)
        ])))
        .mount(&mock_server)
        .await;

    for collection in ["working_times", "reviews", "favorites"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/rest/v1/{}", collection)))
            .and(query_param("entity_id", format!("eq.{}", doctor_id)))
            .and(query_param("entity_type", "eq.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::package_document(&package_id, &doctor_id)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("DELETE", &format!("/doctors/{}", doctor_id), Some(&admin_token(&config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_doctor_with_appointments_cannot_be_deleted() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let doctor_id = Uuid::new_v4().to_string();
    let package_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctor_packages"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": package_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("package_id", format!("in.({})", package_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("DELETE", &format!("/doctors/{}", doctor_id), Some(&admin_token(&config)), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Doctor has appointments and cannot be deleted");
}

#[tokio::test]
async fn test_delete_missing_records_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let token = admin_token(&config);

    for collection in ["categories", "hospitals", "working_times"] {
        Mock::given(method("DELETE"))
            .and(path(format!("/rest/v1/{}", collection)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    for (uri, message) in [
        ("categories", "Category not found"),
        ("hospitals", "Hospital not found"),
        ("working-times", "Working time not found"),
    ] {
        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/{}/{}", uri, Uuid::new_v4()), Some(&token), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body_json(response).await["error"], message);
    }
}

#[tokio::test]
async fn test_delete_category_releases_references() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let category_id = Uuid::new_v4().to_string();
    let other_category = Uuid::new_v4().to_string();
    let hospital_id = Uuid::new_v4().to_string();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::category_document(&category_id, "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("category_id", format!("eq.{}", category_id)))
        .and(body_partial_json(json!({ "category_id": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut hospital = MockDatabaseResponses::hospital_document(&hospital_id, "City Care");
    hospital["category_ids"] = json!([category_id, other_category]);

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .and(query_param("category_ids", format!("cs.{{{}}}", category_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([hospital])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/hospitals"))
        .and(query_param("id", format!("eq.{}", hospital_id)))
        .and(body_partial_json(json!({ "category_ids": [other_category] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request(
            "DELETE",
            &format!("/categories/{}", category_id),
            Some(&admin_token(&config)),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_working_time_window_is_validated() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let token = admin_token(&config);

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/working-times",
            Some(&token),
            Some(json!({
                "entity_id": Uuid::new_v4(),
                "entity_type": 1,
                "day": "monday",
                "start_time": "18:00",
                "end_time": "09:00"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["end_time"].is_string());

    let response = app
        .oneshot(request(
            "POST",
            "/working-times",
            Some(&token),
            Some(json!({
                "entity_id": Uuid::new_v4(),
                "entity_type": 1,
                "day": "someday",
                "start_time": "09:00",
                "end_time": "17:00"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_doctor_image_upload_replaces_reference() {
    let mock_server = MockServer::start().await;
    let media = tempfile::tempdir().unwrap();
    let config = config_for(&mock_server, Some(media.path()));
    let doctor_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDatabaseResponses::doctor_document(&doctor_id, "Dr. Mehta", None)
        ])))
        .mount(&mock_server)
        .await;

    let mut updated = MockDatabaseResponses::doctor_document(&doctor_id, "Dr. Mehta", None);
    updated["image"] = json!(format!("media/doctors/{}/portrait.jpg", doctor_id));

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request(
            "POST",
            &format!("/doctors/{}/image", doctor_id),
            Some(&admin_token(&config)),
            Some(json!({ "file_data": "data:image/jpeg;base64,/9j/4AAQSkZJRg==" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let requests = mock_server.received_requests().await.unwrap();
    let patch = requests.iter().find(|r| r.method.as_str() == "PATCH").unwrap();
    let sent: Value = serde_json::from_slice(&patch.body).unwrap();
    let reference = sent["image"].as_str().unwrap();
    assert!(reference.starts_with(&format!("media/doctors/{}/", doctor_id)));
    assert!(reference.ends_with(".jpg"));

    let on_disk = media.path().join(reference.trim_start_matches("media/"));
    assert!(on_disk.exists());
}

#[tokio::test]
async fn test_directory_counts() {
    let mock_server = MockServer::start().await;
    let config = config_for(&mock_server, None);
    let cardiology = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": cardiology }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/hospitals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }, { "id": Uuid::new_v4() }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": Uuid::new_v4(), "category_id": cardiology },
            { "id": Uuid::new_v4(), "category_id": cardiology },
            { "id": Uuid::new_v4(), "category_id": null }
        ])))
        .mount(&mock_server)
        .await;

    let response = create_test_app(&config)
        .oneshot(request("GET", "/directory/counts", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["categories"], 1);
    assert_eq!(body["hospitals"], 2);
    assert_eq!(body["doctors"], 3);
    assert_eq!(body["doctors_per_category"][&cardiology], 2);
}
