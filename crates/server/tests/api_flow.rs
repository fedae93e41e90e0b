use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use service::{
    cache::CourseListCache,
    mail::{spawn_worker, MailQueue},
    store::memory::{MemoryStore, MockGateway, RecordingMailer},
    Repositories, Services,
};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    gateway: Arc<MockGateway>,
    mailer: Arc<RecordingMailer>,
}

fn test_app(gateway: MockGateway) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let gateway = Arc::new(gateway);
    let mailer = Arc::new(RecordingMailer::default());
    let (mail, rx) = MailQueue::channel(16, "no-reply@learningplatform.com");
    spawn_worker(rx, mailer.clone());
    let cache = Arc::new(CourseListCache::new(Duration::from_secs(60), 100));
    let services = Services::new(Repositories::memory(store), gateway.clone(), cache, mail, "usd");
    TestApp { router: server::build_app(services), gateway, mailer }
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Token {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, value)
    }

    /// Register then log in, returning the token.
    async fn signup(&self, email: &str, role: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/register/",
                None,
                Some(json!({"email": email, "username": email.split('@').next().unwrap(), "password": "secret123", "role": role})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let (status, body) = self
            .call(Method::POST, "/api/login/", None, Some(json!({"email": email, "password": "secret123"})))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_course(&self, token: &str, title: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/courses/",
                Some(token),
                Some(json!({"title": title, "description": format!("Learn {title} from scratch"), "price": "49.99"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app(MockGateway::approving());
    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = test_app(MockGateway::approving());
    let (status, _) = app.call(Method::GET, "/api/courses/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.call(Method::GET, "/api/courses/", Some("not-a-real-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_rejects_duplicates_and_admin_role() {
    let app = test_app(MockGateway::approving());
    app.signup("ada@example.com", "student").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/register/",
            None,
            Some(json!({"email": "ada@example.com", "username": "ada2", "password": "secret123"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["email"][0], "user with this email already exists.");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/register/",
            None,
            Some(json!({"email": "root@example.com", "username": "root", "password": "secret123", "role": "admin"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["role"].is_array());
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app(MockGateway::approving());
    app.signup("ada@example.com", "student").await;
    let (status, body) = app
        .call(Method::POST, "/api/login/", None, Some(json!({"email": "ada@example.com", "password": "nope-nope"})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Invalid credentials"}));
}

#[tokio::test]
async fn logout_revokes_the_token() {
    let app = test_app(MockGateway::approving());
    let token = app.signup("ada@example.com", "student").await;
    let (status, body) = app.call(Method::GET, "/api/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");

    let (status, _) = app.call(Method::POST, "/api/logout/", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, "/api/me/", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_instructors_create_courses() {
    let app = test_app(MockGateway::approving());
    let student = app.signup("sam@example.com", "student").await;
    let (status, _) = app
        .call(
            Method::POST,
            "/api/courses/",
            Some(&student),
            Some(json!({"title": "Nope", "description": "Nope", "price": "1.00"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn course_list_search_and_owner_edits() {
    let app = test_app(MockGateway::approving());
    let instructor = app.signup("ian@example.com", "instructor").await;
    let other = app.signup("oli@example.com", "instructor").await;
    let id = app.create_course(&instructor, "Rust").await;
    app.create_course(&instructor, "Python").await;

    let (status, page) = app.call(Method::GET, "/api/courses/?page=1&page_size=10", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["instructor"]["email"], "ian@example.com");

    let (status, hits) = app.call(Method::GET, "/api/courses/search/?q=rust", Some(&other), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["title"], "Rust");

    let (status, body) = app.call(Method::GET, "/api/courses/search/", Some(&other), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["q"].is_array());

    let uri = format!("/api/courses/{id}/");
    let (status, _) = app.call(Method::PATCH, &uri, Some(&other), Some(json!({"title": "Mine now"}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call(Method::PATCH, &uri, Some(&instructor), Some(json!({"is_active": false}))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["is_active"], false);

    // the edit invalidates the cached page
    let (_, page) = app.call(Method::GET, "/api/courses/?page=1&page_size=10", Some(&other), None).await;
    assert_eq!(page["count"], 1);

    let (status, _) = app.call(Method::DELETE, &uri, Some(&instructor), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, &uri, Some(&instructor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pay_enrolls_and_sends_confirmation() {
    let app = test_app(MockGateway::approving());
    let instructor = app.signup("ian@example.com", "instructor").await;
    let student = app.signup("sam@example.com", "student").await;
    let course_id = app.create_course(&instructor, "Rust").await;

    let pay = json!({"course_id": course_id, "stripe_token": "tok_visa"});
    let (status, body) = app.call(Method::POST, "/api/pay/", Some(&student), Some(pay.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["message"], "Payment successful. You are now enrolled.");
    assert_eq!(app.gateway.last_request().unwrap().amount_minor, 4999);

    let (_, enrollments) = app.call(Method::GET, "/api/enrollments/", Some(&student), None).await;
    assert_eq!(enrollments.as_array().unwrap().len(), 1);
    let (_, payments) = app.call(Method::GET, "/api/payments/", Some(&student), None).await;
    assert_eq!(payments[0]["status"], "completed");

    // second attempt is refused before the card is charged again
    let (status, body) = app.call(Method::POST, "/api/pay/", Some(&student), Some(pay)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["non_field_errors"][0], "You are already enrolled in this course.");
    assert_eq!(app.gateway.calls(), 1);

    for _ in 0..50 {
        if !app.mailer.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "sam@example.com");
    assert_eq!(sent[0].subject, "Payment Confirmation");
}

#[tokio::test]
async fn declined_card_leaves_no_enrollment() {
    let app = test_app(MockGateway::declining("Your card was declined."));
    let instructor = app.signup("ian@example.com", "instructor").await;
    let student = app.signup("sam@example.com", "student").await;
    let course_id = app.create_course(&instructor, "Rust").await;

    let (status, body) = app
        .call(Method::POST, "/api/pay/", Some(&student), Some(json!({"course_id": course_id, "stripe_token": "tok_chargeDeclined"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Your card was declined."}));

    let (_, enrollments) = app.call(Method::GET, "/api/enrollments/", Some(&student), None).await;
    assert!(enrollments.as_array().unwrap().is_empty());
    let (_, payments) = app.call(Method::GET, "/api/payments/", Some(&student), None).await;
    assert_eq!(payments[0]["status"], "failed");
    assert!(payments[0]["gateway_transaction_id"].is_null());
}

#[tokio::test]
async fn enrolled_students_review_once() {
    let app = test_app(MockGateway::approving());
    let instructor = app.signup("ian@example.com", "instructor").await;
    let student = app.signup("sam@example.com", "student").await;
    let course_id = app.create_course(&instructor, "Rust").await;
    let reviews = format!("/api/courses/{course_id}/reviews/");

    let (status, _) = app.call(Method::POST, &reviews, Some(&student), Some(json!({"rating": 5, "comment": "Great"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.call(Method::POST, &format!("/api/courses/{course_id}/enroll/"), Some(&student), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Successfully enrolled.");

    let (status, body) = app.call(Method::POST, &reviews, Some(&student), Some(json!({"rating": 5, "comment": "Great"}))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["rating"], 5);

    let (status, _) = app.call(Method::POST, &reviews, Some(&student), Some(json!({"rating": 4}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, list) = app.call(Method::GET, &reviews, Some(&instructor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_json_is_a_field_error() {
    let app = test_app(MockGateway::approving());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/login/")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_path_and_query_use_the_error_envelope() {
    let app = test_app(MockGateway::approving());
    let token = app.signup("lost@example.com", "student").await;

    let (status, body) = app.call(Method::GET, "/api/courses/not-a-uuid/", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"][0].is_string());

    let (status, body) = app.call(Method::POST, "/api/courses/not-a-uuid/enroll/", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"].is_array());

    let (status, body) = app.call(Method::GET, "/api/courses/?page=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["non_field_errors"][0].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = test_app(MockGateway::approving());
    let (status, doc) = app.call(Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/pay/"].is_object());
}
