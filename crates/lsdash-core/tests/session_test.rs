// Integration tests for `Session` sync and `DeltaProber` using wiremock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::broadcast;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lsdash_api::models::{REL_COURSE, REL_SCHEDULE};
use lsdash_core::dates::format_timestamp;
use lsdash_core::{
    CourseId, CoreError, ErrorKind, MemorySecretStore, MemoryStateStore, PersistedState,
    ProbeOutcome, Resource, SecretStore, Session, SessionConfig, SessionEvent, StateStore,
    SyncPhase,
};

// ── Harness ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    session: Session,
    state: Arc<MemoryStateStore>,
    secrets: Arc<MemorySecretStore>,
    _dir: TempDir,
}

fn session_config(server: &MockServer, dir: &TempDir) -> SessionConfig {
    SessionConfig::new(
        Url::parse(&server.uri()).unwrap(),
        "app-123",
        "gbtestc",
        dir.path().join("snapshot.json"),
    )
}

async fn harness(initial: PersistedState) -> Harness {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = session_config(&server, &dir);
    let state = Arc::new(MemoryStateStore::new(initial));
    let secrets = Arc::new(MemorySecretStore::default());
    let session = Session::new(
        config,
        Arc::clone(&state) as Arc<dyn StateStore>,
        Arc::clone(&secrets) as Arc<dyn SecretStore>,
    )
    .unwrap();
    Harness {
        server,
        session,
        state,
        secrets,
        _dir: dir,
    }
}

fn ts(at: DateTime<Utc>) -> String {
    format_timestamp(at)
}

async fn mount_json(server: &MockServer, route: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok-1", "expires_in": 3600 })),
        )
        .mount(server)
        .await;
}

async fn mount_profile(server: &MockServer) {
    mount_json(
        server,
        "/me",
        json!({ "me": { "id": 7, "firstName": "Amy", "lastName": "Song" } }),
    )
    .await;
}

async fn mount_courses(server: &MockServer, now: DateTime<Utc>) {
    mount_json(
        server,
        "/me/terms",
        json!({ "terms": [{
            "name": "Spring",
            "startDateTime": ts(now - TimeDelta::days(30)),
            "endDateTime": ts(now + TimeDelta::days(60))
        }] }),
    )
    .await;
    mount_json(
        server,
        "/me/courses",
        json!({ "courses": [
            { "links": [{ "rel": "self", "course": { "id": 101, "title": "Biology", "displayCourseCode": "BIO-101" } }] },
            { "links": [{ "rel": "self", "course": { "id": 202, "title": "Chemistry", "displayCourseCode": "CHM-202" } }] }
        ] }),
    )
    .await;
}

/// Detail endpoints for course 101, with one fresh item of each kind.
async fn mount_details(server: &MockServer, now: DateTime<Utc>) {
    let recent = ts(now - TimeDelta::hours(1));
    mount_json(
        server,
        "/me/courses/101/timeZone",
        json!({ "timeZone": { "zoneName": "America/Denver" } }),
    )
    .await;
    mount_json(
        server,
        "/me/courses/101/courseGradeToDate",
        json!({ "courseGradeToDate": {
            "average": 91.5, "earned": 183.0, "possible": 200.0, "extraCredit": 0.0,
            "letterGrade": { "letterGrade": "A-" }
        } }),
    )
    .await;
    mount_json(
        server,
        "/me/courses/101/announcements",
        json!({ "announcements": [
            { "id": 9, "subject": "Lab moved", "submitter": "Prof. Song", "startDisplayDate": recent, "text": "Room 4", "readstatus": false },
            { "id": 10, "subject": "Old", "submitter": "Prof. Song", "startDisplayDate": recent, "text": "", "readstatus": true }
        ] }),
    )
    .await;
    mount_json(
        server,
        "/me/whatshappeningfeed",
        json!({ "activityStream": { "items": [{
            "id": "h1",
            "postedTime": recent,
            "actor": { "title": "Prof. Song" },
            "object": { "objectType": "thread-post", "title": "Re: lab" },
            "target": { "courseId": 101, "objectType": "course", "title": "Biology" }
        }] } }),
    )
    .await;
    mount_json(
        server,
        "/me/upcomingEvents",
        json!({ "upcomingEvents": [{
            "id": 55,
            "category": "due",
            "title": "Quiz 1",
            "when": { "time": ts(now + TimeDelta::days(2)) },
            "links": [
                { "href": "https://api.learningstudio.com/me/courses/101", "rel": REL_COURSE },
                { "href": "https://api.learningstudio.com/schedule/55", "rel": REL_SCHEDULE, "schedule": {
                    "dueDate": ts(now + TimeDelta::days(2)),
                    "accessSchedule": { "startDateTime": recent, "canAccessBeforeStartDateTime": false }
                } }
            ]
        }] }),
    )
    .await;
}

async fn logged_in(initial: PersistedState) -> Harness {
    let h = harness(initial).await;
    mount_token(&h.server).await;
    mount_profile(&h.server).await;
    h.session
        .login("amy", SecretString::from("hunter2"))
        .await
        .unwrap();
    h
}

fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn ignoring_chemistry() -> PersistedState {
    PersistedState {
        ignored_courses: ["202".to_owned()].into(),
        ..PersistedState::default()
    }
}

// ── Login ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_persists_credentials() {
    let h = logged_in(PersistedState::default()).await;

    assert_eq!(h.session.username().as_deref(), Some("amy"));
    assert_eq!(h.state.load().unwrap().username.as_deref(), Some("amy"));
    let stored = h.secrets.password("amy").unwrap().unwrap();
    assert_eq!(stored.expose_secret(), "hunter2");

    let first_name = h
        .session
        .with_user_data(|d| d.first_name().map(str::to_owned))
        .await
        .flatten();
    assert_eq!(first_name.as_deref(), Some("Amy"));
}

#[tokio::test]
async fn test_rejected_login_forgets_credentials() {
    let h = harness(PersistedState::default()).await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&h.server)
        .await;

    let err = h
        .session
        .login("amy", SecretString::from("wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
    assert_eq!(h.session.username(), None);
    assert_eq!(h.state.load().unwrap().username, None);
    assert!(h.secrets.password("amy").unwrap().is_none());
}

#[tokio::test]
async fn test_restore_credentials_from_stores() {
    let h = harness(PersistedState {
        username: Some("amy".into()),
        ..PersistedState::default()
    })
    .await;
    h.secrets
        .set_password("amy", &SecretString::from("hunter2"))
        .unwrap();

    assert!(h.session.restore_credentials().await.unwrap());
    assert_eq!(h.session.username().as_deref(), Some("amy"));
}

// ── Sync ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reload_without_profile_is_not_authenticated() {
    let h = harness(PersistedState::default()).await;
    let err = h.session.reload_data().await.unwrap_err();
    assert!(matches!(err, CoreError::NotAuthenticated));
}

#[tokio::test]
async fn test_first_sync_populates_model_without_deltas() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    let mut rx = h.session.subscribe();

    let report = h.session.reload_data().await.unwrap();

    assert_eq!(report.previous_load_time, None);
    assert_eq!(report.deltas.total(), 0);
    assert_eq!(*h.session.sync_phase().borrow(), SyncPhase::Done);

    let data = h.session.user_data().await.unwrap();
    let biology = CourseId::from(101);
    assert_eq!(data.course_ids(), vec![biology.clone()]);
    assert!(data.is_hidden(&CourseId::from(202)));
    assert_eq!(data.time_zone(&biology), Some("America/Denver"));
    assert_eq!(data.announcements_for(&biology).len(), 1);
    assert_eq!(data.happenings_for(&biology).len(), 1);
    assert_eq!(data.upcoming_events_for(&biology).len(), 1);
    assert!(data.grades_loaded());

    let events = drain(&mut rx);
    assert_eq!(events.first(), Some(&SessionEvent::CoursesRefreshed));
    for expected in [
        SessionEvent::TimeZonesRefreshed,
        SessionEvent::UpcomingEventsRefreshed,
        SessionEvent::HappeningsRefreshed,
        SessionEvent::GradesRefreshed,
        SessionEvent::AnnouncementsRefreshed,
    ] {
        assert!(events.contains(&expected), "missing {expected:?}");
    }
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SessionEvent::NewHappenings { .. }))
    );

    let stored = h.state.load().unwrap();
    assert!(stored.last_load_time.is_some());
    assert_eq!(stored.last_load_time, stored.last_activity_time);
    assert!(stored.course_start_range.is_some());
    assert!(stored.course_end_range.is_some());

    let window = h.session.search_window().unwrap();
    assert_eq!((window.end - window.start).num_days(), 11);
}

#[tokio::test]
async fn test_time_zones_load_before_upcoming_events() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    let mut rx = h.session.subscribe();

    h.session.reload_data().await.unwrap();

    let events = drain(&mut rx);
    let zones = events
        .iter()
        .position(|e| *e == SessionEvent::TimeZonesRefreshed)
        .unwrap();
    let upcoming = events
        .iter()
        .position(|e| *e == SessionEvent::UpcomingEventsRefreshed)
        .unwrap();
    assert!(zones < upcoming);
}

#[tokio::test]
async fn test_second_sync_reports_new_items() {
    let now = Utc::now();
    let previous = now - TimeDelta::days(2);
    let h = logged_in(PersistedState {
        last_load_time: Some(ts(previous)),
        ..ignoring_chemistry()
    })
    .await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    let mut rx = h.session.subscribe();

    let report = h.session.reload_data().await.unwrap();

    assert_eq!(report.deltas.happenings, 1);
    assert_eq!(report.deltas.announcements, 1);
    assert_eq!(report.deltas.upcoming_events, 1);
    assert_eq!(report.deltas.grades, 0);
    assert_eq!(
        h.session.last_load_time().map(|t| t.timestamp()),
        Some(previous.timestamp())
    );

    let events = drain(&mut rx);
    assert!(events.contains(&SessionEvent::NewHappenings { count: 1 }));
    assert!(events.contains(&SessionEvent::NewAnnouncements { count: 1 }));
    assert!(events.contains(&SessionEvent::NewUpcomingEvents { count: 1 }));
    assert!(!events.contains(&SessionEvent::NewGrades { count: 0 }));

    let recent = ts(now - TimeDelta::hours(1));
    assert!(h.session.is_new(Some(recent.as_str())));
}

#[tokio::test]
async fn test_course_failure_tears_session_down() {
    let earlier = ts(Utc::now() - TimeDelta::days(5));
    let h = logged_in(PersistedState {
        last_load_time: Some(earlier.clone()),
        ..PersistedState::default()
    })
    .await;
    Mock::given(method("GET"))
        .and(path("/me/terms"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;
    let mut rx = h.session.subscribe();

    let err = h.session.reload_data().await.unwrap_err();

    assert_eq!(err.failed_resource(), Some(Resource::Courses));
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(
        *h.session.sync_phase().borrow(),
        SyncPhase::Failed {
            resource: Resource::Courses
        }
    );
    assert!(h.session.user_data().await.is_none());
    assert_eq!(h.session.username(), None);

    let stored = h.state.load().unwrap();
    assert_eq!(stored.username, None);
    assert_eq!(stored.last_load_time, Some(earlier));
    assert!(h.secrets.password("amy").unwrap().is_none());

    let events = drain(&mut rx);
    assert!(events.contains(&SessionEvent::SyncFailed {
        resource: Resource::Courses
    }));
    assert_eq!(events.last(), Some(&SessionEvent::SessionCleared));
}

#[tokio::test]
async fn test_detail_failure_fails_whole_sync() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    Mock::given(method("GET"))
        .and(path("/me/courses/101/courseGradeToDate"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&h.server)
        .await;
    mount_details(&h.server, now).await;

    let err = h.session.reload_data().await.unwrap_err();

    assert_eq!(err.failed_resource(), Some(Resource::GradesToDate));
    assert!(h.session.user_data().await.is_none());
    assert_eq!(h.state.load().unwrap().last_load_time, None);
}

#[tokio::test]
async fn test_slices_landing_after_failure_are_dropped() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    Mock::given(method("GET"))
        .and(path("/me/courses/101/courseGradeToDate"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/courses/101/announcements"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "announcements": [
                    { "id": 9, "subject": "Late", "startDisplayDate": ts(now), "readstatus": false }
                ] }))
                .set_delay(Duration::from_millis(300)),
        )
        .with_priority(1)
        .expect(1)
        .mount(&h.server)
        .await;
    mount_details(&h.server, now).await;
    let mut rx = h.session.subscribe();

    let err = h.session.reload_data().await.unwrap_err();

    assert_eq!(err.failed_resource(), Some(Resource::GradesToDate));
    // The slow sibling still ran to completion.
    h.server.verify().await;

    let events = drain(&mut rx);
    assert!(!events.contains(&SessionEvent::AnnouncementsRefreshed));
    assert!(!events.contains(&SessionEvent::GradesRefreshed));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::SyncFailed { .. }))
            .count(),
        1
    );
    assert!(h.session.user_data().await.is_none());
}

// ── Persistence failures ────────────────────────────────────────────

/// State store that refuses writes matching `rejects`.
struct FailingStateStore {
    inner: MemoryStateStore,
    rejects: fn(&PersistedState) -> bool,
}

impl StateStore for FailingStateStore {
    fn load(&self) -> Result<PersistedState, CoreError> {
        self.inner.load()
    }

    fn save(&self, state: &PersistedState) -> Result<(), CoreError> {
        if (self.rejects)(state) {
            return Err(CoreError::Storage {
                message: "disk full".into(),
            });
        }
        self.inner.save(state)
    }
}

/// Signed-in session over a state store that rejects some writes.
async fn failing_state_session(
    rejects: fn(&PersistedState) -> bool,
) -> (MockServer, Session, Arc<MemorySecretStore>, TempDir) {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state = Arc::new(FailingStateStore {
        inner: MemoryStateStore::new(ignoring_chemistry()),
        rejects,
    });
    let secrets = Arc::new(MemorySecretStore::default());
    let session = Session::new(
        session_config(&server, &dir),
        state as Arc<dyn StateStore>,
        Arc::clone(&secrets) as Arc<dyn SecretStore>,
    )
    .unwrap();
    mount_token(&server).await;
    mount_profile(&server).await;
    session
        .login("amy", SecretString::from("hunter2"))
        .await
        .unwrap();
    (server, session, secrets, dir)
}

#[tokio::test]
async fn test_load_time_write_failure_tears_session_down() {
    let now = Utc::now();
    let (server, session, secrets, _dir) =
        failing_state_session(|s| s.last_load_time.is_some()).await;
    mount_courses(&server, now).await;
    mount_details(&server, now).await;
    let mut rx = session.subscribe();

    let err = session.reload_data().await.unwrap_err();

    assert_eq!(err.failed_resource(), Some(Resource::SyncState));
    assert!(matches!(
        err,
        CoreError::SyncFailed { ref source, .. } if matches!(**source, CoreError::Storage { .. })
    ));
    assert_eq!(
        *session.sync_phase().borrow(),
        SyncPhase::Failed {
            resource: Resource::SyncState
        }
    );
    assert!(session.user_data().await.is_none());
    assert_eq!(session.username(), None);
    assert!(secrets.password("amy").unwrap().is_none());

    let events = drain(&mut rx);
    assert!(events.contains(&SessionEvent::SyncFailed {
        resource: Resource::SyncState
    }));
    assert_eq!(events.last(), Some(&SessionEvent::SessionCleared));
}

#[tokio::test]
async fn test_course_range_write_failure_fails_at_courses() {
    let now = Utc::now();
    let (server, session, _secrets, _dir) =
        failing_state_session(|s| s.course_start_range.is_some()).await;
    mount_courses(&server, now).await;
    mount_details(&server, now).await;
    let mut rx = session.subscribe();

    let err = session.reload_data().await.unwrap_err();

    assert_eq!(err.failed_resource(), Some(Resource::Courses));
    assert_eq!(
        *session.sync_phase().borrow(),
        SyncPhase::Failed {
            resource: Resource::Courses
        }
    );
    assert!(session.user_data().await.is_none());

    let events = drain(&mut rx);
    assert!(!events.contains(&SessionEvent::CoursesRefreshed));
    assert!(events.contains(&SessionEvent::SyncFailed {
        resource: Resource::Courses
    }));
}

#[tokio::test]
async fn test_no_active_term_fails_sync() {
    let h = logged_in(PersistedState::default()).await;
    mount_json(
        &h.server,
        "/me/terms",
        json!({ "terms": [{
            "startDateTime": "2001-01-01T00:00:00Z",
            "endDateTime": "2001-06-01T00:00:00Z"
        }] }),
    )
    .await;

    let err = h.session.reload_data().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoActiveTerm);
}

// ── Mutations ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_hiding_course_updates_model_and_state() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    h.session.reload_data().await.unwrap();
    let mut rx = h.session.subscribe();

    h.session
        .set_course_hidden(&CourseId::from(101), true)
        .await
        .unwrap();
    h.session
        .set_course_hidden(&CourseId::from(202), false)
        .await
        .unwrap();

    let data = h.session.user_data().await.unwrap();
    assert_eq!(data.course_ids(), vec![CourseId::from(202)]);
    assert!(data.is_hidden(&CourseId::from(101)));
    let ignored = h.state.load().unwrap().ignored_courses;
    assert_eq!(ignored.into_iter().collect::<Vec<_>>(), vec!["101".to_owned()]);
    assert_eq!(drain(&mut rx).len(), 2);
}

#[tokio::test]
async fn test_mark_announcement_read_removes_item() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    Mock::given(method("PUT"))
        .and(path("/me/courses/101/announcements/9/readstatus"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&h.server)
        .await;
    h.session.reload_data().await.unwrap();
    let mut rx = h.session.subscribe();

    h.session
        .mark_announcement_read(&CourseId::from(101), "9")
        .await
        .unwrap();

    let data = h.session.user_data().await.unwrap();
    assert!(data.announcements_for(&CourseId::from(101)).is_empty());
    assert_eq!(drain(&mut rx), vec![SessionEvent::AnnouncementsRefreshed]);
}

#[tokio::test]
async fn test_course_date_renders_in_course_zone() {
    let now = Utc::now();
    let h = logged_in(ignoring_chemistry()).await;
    mount_courses(&h.server, now).await;
    mount_details(&h.server, now).await;
    h.session.reload_data().await.unwrap();

    let rendered = h
        .session
        .convert_course_date(&CourseId::from(101), "2024-03-01T18:30:00Z", true)
        .await;
    assert_eq!(rendered, "2024-03-01 11:30 AM");
}

// ── Snapshot ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_snapshot_drops_and_restores_model() {
    let h = logged_in(PersistedState::default()).await;

    h.session.save_snapshot().await.unwrap();
    assert!(h.session.user_data().await.is_none());
    assert!(h.session.has_snapshot());

    assert!(h.session.ensure_loaded().await);
    let restored = h.session.user_data().await.unwrap();
    assert_eq!(restored.first_name(), Some("Amy"));
    assert!(!h.session.has_snapshot());
}

#[tokio::test]
async fn test_logout_clears_everything() {
    let h = logged_in(PersistedState::default()).await;

    h.session.logout().await.unwrap();

    assert!(h.session.user_data().await.is_none());
    assert!(!h.session.ensure_loaded().await);
    assert_eq!(h.state.load().unwrap().username, None);
    assert!(h.secrets.password("amy").unwrap().is_none());
}

// ── Delta probe ─────────────────────────────────────────────────────

fn probe_state(now: DateTime<Utc>) -> PersistedState {
    PersistedState {
        username: Some("amy".into()),
        course_start_range: Some("01/01/2024,03/01/2024".into()),
        course_end_range: Some("03/01/2024,06/01/2024".into()),
        last_activity_time: Some(ts(now - TimeDelta::hours(2))),
        ..ignoring_chemistry()
    }
}

async fn mount_probe(server: &MockServer, now: DateTime<Utc>, feed_status: u16) {
    let recent = ts(now - TimeDelta::hours(1));
    Mock::given(method("GET"))
        .and(path("/me/upcomingEvents"))
        .and(query_param("expand", "schedule"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "upcomingEvents": [{
            "category": "access_start",
            "title": "Midterm",
            "links": [
                { "href": "https://api.learningstudio.com/me/courses/101", "rel": REL_COURSE },
                { "href": "https://api.learningstudio.com/schedule/1", "rel": REL_SCHEDULE, "schedule": {
                    "dueDate": ts(now + TimeDelta::days(3)),
                    "accessSchedule": { "startDateTime": recent, "canAccessBeforeStartDateTime": false }
                } }
            ]
        }] })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/whatshappeningfeed"))
        .respond_with(ResponseTemplate::new(feed_status).set_body_json(json!({
            "activityStream": { "items": [
                { "postedTime": recent, "target": { "courseId": 101 } },
                { "postedTime": recent, "target": { "courseId": 202 } }
            ] }
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/courses"))
        .and(query_param("startDatesBetween", "01/01/2024,03/01/2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "courses": [
            { "links": [{ "course": { "id": 101, "title": "Biology" } }] },
            { "links": [{ "course": { "id": 202, "title": "Chemistry" } }] }
        ] })))
        .mount(server)
        .await;
    mount_json(
        server,
        "/me/courses/101/announcements",
        json!({ "announcements": [
            { "id": 1, "startDisplayDate": recent, "readstatus": false }
        ] }),
    )
    .await;
}

#[tokio::test]
async fn test_probe_counts_new_items_and_advances_baseline() {
    let now = Utc::now();
    let h = harness(probe_state(now)).await;
    h.secrets
        .set_password("amy", &SecretString::from("hunter2"))
        .unwrap();
    mount_token(&h.server).await;
    mount_probe(&h.server, now, 200).await;

    let outcome = h.session.prober().run_at(now).await.unwrap();

    match outcome {
        ProbeOutcome::NewData(result) => {
            assert_eq!(result.upcoming_events, 1);
            assert_eq!(result.happenings, 1);
            assert_eq!(result.announcements, 1);
        }
        other => panic!("expected new data, got {other:?}"),
    }
    assert_eq!(h.state.load().unwrap().last_activity_time, Some(ts(now)));
}

#[tokio::test]
async fn test_probe_within_cooldown_makes_no_requests() {
    let now = Utc::now();
    let h = harness(probe_state(now)).await;
    h.secrets
        .set_password("amy", &SecretString::from("hunter2"))
        .unwrap();
    mount_token(&h.server).await;
    mount_probe(&h.server, now, 200).await;
    let prober = h.session.prober();

    prober.run_at(now).await.unwrap();
    let after_first = h.server.received_requests().await.unwrap().len();
    let second = prober
        .run_at(now + TimeDelta::minutes(10))
        .await
        .unwrap();

    assert!(matches!(second, ProbeOutcome::Skipped { .. }));
    assert_eq!(second.new_items(), 0);
    assert_eq!(h.server.received_requests().await.unwrap().len(), after_first);
}

#[tokio::test]
async fn test_probe_failure_keeps_baseline() {
    let now = Utc::now();
    let initial = probe_state(now);
    let baseline = initial.last_activity_time.clone();
    let h = harness(initial).await;
    h.secrets
        .set_password("amy", &SecretString::from("hunter2"))
        .unwrap();
    mount_token(&h.server).await;
    mount_probe(&h.server, now, 500).await;

    let outcome = h.session.prober().run_at(now).await.unwrap();

    assert_eq!(outcome, ProbeOutcome::Failed);
    assert_eq!(h.state.load().unwrap().last_activity_time, baseline);
}

#[tokio::test]
async fn test_probe_without_baseline_starts_one() {
    let now = Utc::now();
    let h = harness(PersistedState {
        last_activity_time: None,
        ..probe_state(now)
    })
    .await;
    h.secrets
        .set_password("amy", &SecretString::from("hunter2"))
        .unwrap();

    let outcome = h.session.prober().run_at(now).await.unwrap();

    assert_eq!(outcome, ProbeOutcome::NoData);
    assert_eq!(h.state.load().unwrap().last_activity_time, Some(ts(now)));
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_probe_without_credentials_reports_no_data() {
    let now = Utc::now();
    let h = harness(PersistedState {
        username: None,
        ..probe_state(now)
    })
    .await;

    let outcome = h.session.prober().run_at(now).await.unwrap();

    assert_eq!(outcome, ProbeOutcome::NoData);
    assert!(h.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_probe_without_credentials_leaves_missing_baseline_alone() {
    let now = Utc::now();
    let h = harness(PersistedState {
        username: None,
        last_activity_time: None,
        ..probe_state(now)
    })
    .await;

    let outcome = h.session.prober().run_at(now).await.unwrap();

    assert_eq!(outcome, ProbeOutcome::NoData);
    assert_eq!(h.state.load().unwrap().last_activity_time, None);
}
