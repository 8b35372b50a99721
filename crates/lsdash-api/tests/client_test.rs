// Integration tests for `ApiClient` and `TokenManager` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lsdash_api::{ApiClient, AppCredentials, Error, UserCredentials};

// ── Helpers ─────────────────────────────────────────────────────────

fn app() -> AppCredentials {
    AppCredentials {
        app_id: "app-123".into(),
        client_string: "gbtestc".into(),
    }
}

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        app(),
    )
    .unwrap();
    client
        .tokens()
        .set_credentials(Some(UserCredentials::new(
            "amy",
            SecretString::from("hunter2"),
        )))
        .await;
    (server, client)
}

async fn mount_token(server: &MockServer, token: &str, expires_in: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "expires_in": expires_in,
            "token_type": "bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ── Token manager ───────────────────────────────────────────────────

#[tokio::test]
async fn test_token_request_is_form_encoded_password_grant() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=app-123"))
        .and(body_string_contains("username=gbtestc%5Camy"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok-1", "expires_in": 3600 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client.tokens().valid_token().await.unwrap();
    assert!(token.is_valid());
    assert!(client.tokens().has_valid_token().await);
}

#[tokio::test]
async fn test_token_is_reused_until_expiry() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/terms"))
        .and(header("X-Authorization", "Access_Token access_token=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "terms": [] })))
        .expect(2)
        .mount(&server)
        .await;

    client.list_terms().await.unwrap();
    client.list_terms().await.unwrap();
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let (server, client) = setup().await;
    // Zero lifetime: every call must re-authenticate.
    mount_token(&server, "short-lived", 0, 2).await;

    Mock::given(method("GET"))
        .and(path("/me/terms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "terms": [] })))
        .mount(&server)
        .await;

    client.list_terms().await.unwrap();
    client.list_terms().await.unwrap();
    assert!(!client.tokens().has_valid_token().await);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    let (a, b, c) = tokio::join!(
        client.tokens().valid_token(),
        client.tokens().valid_token(),
        client.tokens().valid_token(),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
}

#[tokio::test]
async fn test_rejected_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "The user name or password is incorrect."
        })))
        .mount(&server)
        .await;

    let err = client.get_me().await.unwrap_err();
    match err {
        Error::Authentication { message } => {
            assert_eq!(message, "The user name or password is incorrect.");
        }
        other => panic!("expected Authentication, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_endpoint_outage_is_not_an_auth_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.get_me().await.unwrap_err();
    assert!(err.is_transient(), "got: {err:?}");
    assert!(!err.is_auth_expired());
    match err {
        Error::Api { status, .. } => assert_eq!(status, 503),
        other => panic!("expected Api, got: {other:?}"),
    }
    assert!(!client.tokens().has_valid_token().await);
}

#[tokio::test]
async fn test_token_response_without_access_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": 60 })))
        .mount(&server)
        .await;

    let err = client.tokens().valid_token().await.unwrap_err();
    assert!(matches!(err, Error::MissingToken), "got: {err:?}");
}

#[tokio::test]
async fn test_missing_credentials_never_hit_network() {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        app(),
    )
    .unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.tokens().valid_token().await.unwrap_err();
    assert!(err.is_auth_expired());
}

#[tokio::test]
async fn test_changing_credentials_drops_cached_token() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 2).await;

    client.tokens().valid_token().await.unwrap();
    client
        .tokens()
        .set_credentials(Some(UserCredentials::new("bob", SecretString::from("pw"))))
        .await;
    assert!(!client.tokens().has_valid_token().await);
    client.tokens().valid_token().await.unwrap();
}

// ── Endpoints ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_me() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "me": { "id": 42, "firstName": "Amy", "lastName": "Pond" }
        })))
        .mount(&server)
        .await;

    let me = client.get_me().await.unwrap();
    assert_eq!(me.get("firstName"), Some(&json!("Amy")));
}

#[tokio::test]
async fn test_list_courses_sends_date_ranges() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/courses"))
        .and(query_param("expand", "course"))
        .and(query_param("startDatesBetween", "01/01/2024,03/01/2024"))
        .and(query_param("endDatesBetween", "03/01/2024,05/01/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [
                { "links": [{
                    "href": "https://api.learningstudio.com/courses/101",
                    "rel": "https://api.learningstudio.com/rel/course",
                    "course": { "id": 101, "title": "Biology", "displayCourseCode": "BIO-101" }
                }] }
            ]
        })))
        .mount(&server)
        .await;

    let enrollments = client
        .list_courses("01/01/2024,03/01/2024", "03/01/2024,05/01/2024")
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 1);
    let course = enrollments[0].links[0].course.as_ref().unwrap();
    assert_eq!(course.id, 101);
    assert_eq!(course.display_course_code, "BIO-101");
}

#[tokio::test]
async fn test_whats_happening_query() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/whatshappeningfeed"))
        .and(query_param("v", "2"))
        .and(query_param("after", "2024-02-27T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activityStream": { "items": [{
                "postedTime": "2024-02-28T10:00:00Z",
                "actor": { "title": "Prof. Song" },
                "object": { "objectType": "thread-post", "title": "Re: lab" },
                "target": { "courseId": "101", "objectType": "thread-topic", "title": "Lab 2" }
            }] }
        })))
        .mount(&server)
        .await;

    let items = client.whats_happening("2024-02-27T00:00:00Z").await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].actor.title.as_deref(), Some("Prof. Song"));
    assert_eq!(items[0].target.course_id, json!("101"));
}

#[tokio::test]
async fn test_upcoming_events_optional_since() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/upcomingEvents"))
        .and(query_param("expand", "schedule"))
        .and(query_param("since", "03/01/2024"))
        .and(query_param("until", "03/09/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upcomingEvents": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client
        .upcoming_events(Some("03/01/2024"), "03/09/2024")
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_grade_and_time_zone() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/courses/101/courseGradeToDate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courseGradeToDate": {
                "average": 91.5, "earned": 183, "possible": 200, "extraCredit": 0,
                "letterGrade": { "letterGrade": "A-" }
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/courses/101/timeZone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timeZone": { "zoneName": "America/Denver" }
        })))
        .mount(&server)
        .await;

    let grade = client.get_grade_to_date("101").await.unwrap();
    assert!((grade.average - 91.5).abs() < f64::EPSILON);
    assert_eq!(
        grade.letter_grade.and_then(|l| l.letter_grade).as_deref(),
        Some("A-")
    );

    let tz = client.get_time_zone("101").await.unwrap();
    assert_eq!(tz.zone_name, "America/Denver");
}

#[tokio::test]
async fn test_mark_announcement_read_accepts_empty_body() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("PUT"))
        .and(path("/me/courses/101/announcements/9/readstatus"))
        .and(body_json(json!({ "announcementReadStatus": { "markedAsRead": true } })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.mark_announcement_read("101", "9").await.unwrap();
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/courses/101/announcements"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = client.list_announcements("101").await.unwrap_err();
    assert!(err.is_transient());
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected Api, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_invalidates_token() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.get_me().await.unwrap_err();
    assert!(err.is_auth_expired());
    assert!(!client.tokens().has_valid_token().await);
}

#[tokio::test]
async fn test_malformed_payload() {
    let (server, client) = setup().await;
    mount_token(&server, "tok-1", 3600, 1).await;

    Mock::given(method("GET"))
        .and(path("/me/terms"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"terms\": 5}"))
        .mount(&server)
        .await;

    let err = client.list_terms().await.unwrap_err();
    assert!(matches!(err, Error::Deserialization { .. }), "got: {err:?}");
}
