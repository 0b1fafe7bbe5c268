use axum::http::StatusCode;
use http_body_util::BodyExt;
use rotator_core::{Autostart, AvatarClient, Config, ConfigStore, Endpoints, OutfitRef};
use rotator_server::{build_router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    dir: TempDir,
    state: AppState,
}

impl Harness {
    fn store(&self) -> ConfigStore {
        self.state.store.clone()
    }

    fn app(&self) -> axum::Router {
        build_router(self.state.clone())
    }
}

/// App state over a temp config dir and an auto-start entry in the same dir.
fn harness(endpoints: Endpoints, config: Option<Config>) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = ConfigStore::new(dir.path().join("config.json"));
    if let Some(config) = config {
        store.save(&config).unwrap();
    }
    let client = AvatarClient::new(endpoints.clone(), "").unwrap();
    let rotator = rotator_core::rotation::spawn(client, store.clone());
    let autostart = Autostart::desktop_entry(&dir.path().join("autostart"), "avatar-rotator");
    let state = AppState::new(store, rotator, Some(autostart), endpoints);
    Harness { dir, state }
}

fn offline() -> Endpoints {
    Endpoints::single("http://127.0.0.1:9")
}

fn ready_config() -> Config {
    Config {
        cookie: "cookie".into(),
        outfits: vec![OutfitRef::new(1, "Casual"), OutfitRef::new(2, "Formal")],
        interval: 30,
    }
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST with a raw `application/json` body, valid or not.
async fn post_raw(app: axum::Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ---------------------------------------------------------------------------
// Status and toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_starts_idle() {
    let h = harness(offline(), Some(ready_config()));
    let (status, json) = get(h.app(), "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["active"], false);
    assert_eq!(json["index"], 0);
    assert_eq!(json["interval"], 30);
    assert_eq!(json["outfit_count"], 2);
    assert_eq!(json["current"]["name"], "Casual");
    assert!(json["last_equipped_at"].is_null());
}

#[tokio::test]
async fn toggle_without_settings_stays_idle() {
    let h = harness(offline(), None);
    let (status, json) = post_json(h.app(), "/api/toggle", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"active": false}));
}

#[tokio::test]
async fn toggle_flips_rotation() {
    let h = harness(offline(), Some(ready_config()));
    let (_, json) = post_json(h.app(), "/api/toggle", serde_json::json!({})).await;
    assert_eq!(json, serde_json::json!({"active": true}));
    let (_, status) = get(h.app(), "/api/status").await;
    assert_eq!(status["active"], true);

    let (_, json) = post_json(h.app(), "/api/toggle", serde_json::json!({})).await;
    assert_eq!(json, serde_json::json!({"active": false}));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_config_on_fresh_install_returns_defaults() {
    let h = harness(offline(), None);
    let (status, json) = get(h.app(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({"cookie": "", "outfits": [], "interval": 5, "startup": false})
    );
}

#[tokio::test]
async fn get_config_with_broken_file_returns_defaults() {
    let h = harness(offline(), None);
    std::fs::write(h.store().path(), "{ definitely not json").unwrap();
    let (status, json) = get(h.app(), "/api/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["interval"], 5);
    assert_eq!(json["cookie"], "");
}

#[tokio::test]
async fn save_persists_and_updates_rotation() {
    let h = harness(offline(), None);
    let (status, json) = post_json(
        h.app(),
        "/api/save",
        serde_json::json!({
            "cookie": "new-cookie",
            "outfits": [{"id": 10, "name": "Ten"}, {"id": 20, "name": "Twenty"}],
            "interval": 12,
            "startup": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, serde_json::json!({"success": true}));

    let saved = h.store().load().unwrap();
    assert_eq!(saved.cookie, "new-cookie");
    let ids: Vec<u64> = saved.outfits.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![10, 20]);
    assert_eq!(saved.interval, 12);
    assert!(h
        .dir
        .path()
        .join("autostart")
        .join(rotator_core::paths::AUTOSTART_DESKTOP_FILE)
        .exists());

    let (_, config) = get(h.app(), "/api/config").await;
    assert_eq!(config["startup"], true);

    let (_, status) = get(h.app(), "/api/status").await;
    assert_eq!(status["outfit_count"], 2);
    assert_eq!(status["interval"], 12);
    assert_eq!(status["active"], false);
}

#[tokio::test]
async fn save_defaults_missing_fields() {
    let h = harness(offline(), None);
    let (status, _) = post_json(h.app(), "/api/save", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let saved = h.store().load().unwrap();
    assert_eq!(saved, Config::default());
}

#[tokio::test]
async fn save_with_startup_false_removes_entry() {
    let h = harness(offline(), None);
    let entry = h.state.autostart.clone().unwrap();
    entry.set_enabled(true).unwrap();

    let (status, _) = post_json(
        h.app(),
        "/api/save",
        serde_json::json!({"cookie": "c", "outfits": [1], "startup": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!entry.is_enabled());
}

#[tokio::test]
async fn save_rejects_duplicate_outfits() {
    let h = harness(offline(), None);
    let (status, json) = post_json(
        h.app(),
        "/api/save",
        serde_json::json!({"cookie": "c", "outfits": [{"id": 1, "name": "A"}, {"id": 1, "name": "A"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("more than once"));
    assert!(!h.store().path().exists());
}

#[tokio::test]
async fn save_rejects_non_positive_interval() {
    let h = harness(offline(), None);
    for interval in [0, -3] {
        let (status, json) = post_json(
            h.app(),
            "/api/save",
            serde_json::json!({"cookie": "c", "outfits": [], "interval": interval}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["message"].is_string());
    }
}

#[tokio::test]
async fn save_rejects_interval_over_one_day() {
    let h = harness(offline(), None);
    let (status, json) = post_json(
        h.app(),
        "/api/save",
        serde_json::json!({"cookie": "c", "outfits": [1], "interval": i64::MAX}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].as_str().unwrap().contains("at most"));
    assert!(!h.store().path().exists());

    let (status, _) = get(h.app(), "/api/status").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unreadable_save_body_is_400_with_message() {
    let h = harness(offline(), None);
    for body in [
        "{not json",
        r#"{"cookie": "c", "interval": "soon"}"#,
        r#"{"cookie": "c", "interval": 99999999999999999999}"#,
    ] {
        let (status, json) = post_raw(h.app(), "/api/save", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(json["message"].is_string(), "body: {body}");
    }
    assert!(!h.store().path().exists());
}

// ---------------------------------------------------------------------------
// Outfits preview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn outfits_without_cookie_is_400() {
    let h = harness(offline(), None);
    let (status, json) = post_json(h.app(), "/api/outfits", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json, serde_json::json!({"message": "Cookie is required"}));
}

#[tokio::test]
async fn unreadable_outfits_body_is_400_with_message() {
    let h = harness(offline(), None);
    let (status, json) = post_raw(h.app(), "/api/outfits", r#"{"cookie": 7}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn outfits_with_rejected_cookie_is_401() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/users/authenticated")
        .with_status(401)
        .create_async()
        .await;

    let h = harness(Endpoints::single(server.url()), None);
    let (status, json) = post_json(
        h.app(),
        "/api/outfits",
        serde_json::json!({"cookie": "expired"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        json,
        serde_json::json!({"message": "Invalid cookie. Could not authenticate."})
    );
}

#[tokio::test]
async fn outfits_lists_avatar_outfits_for_cookie() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v1/users/authenticated")
        .match_header("cookie", ".ROBLOSECURITY=preview")
        .with_status(200)
        .with_body(r#"{"id": 5, "name": "u", "displayName": "U"}"#)
        .create_async()
        .await;
    server
        .mock("GET", mockito::Matcher::Regex(r"^/v2/avatar/users/5/outfits".into()))
        .with_status(200)
        .with_body(
            r#"{"data": [
                {"id": 1, "name": "Casual", "outfitType": "Avatar"},
                {"id": 2, "name": "Animation pack", "outfitType": "Animation"}
            ]}"#,
        )
        .create_async()
        .await;

    let h = harness(Endpoints::single(server.url()), None);
    let (status, json) = post_json(
        h.app(),
        "/api/outfits",
        serde_json::json!({"cookie": "preview"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        serde_json::json!({"outfits": [{"id": 1, "name": "Casual"}]})
    );
    // Previewing does not save anything.
    assert!(!h.store().path().exists());
}

// ---------------------------------------------------------------------------
// Static page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn root_serves_settings_page() {
    let h = harness(offline(), None);
    let req = axum::http::Request::builder()
        .uri("/")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = h.app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/html"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&body).contains("Avatar Rotator"));
}

#[tokio::test]
async fn stylesheet_served_with_css_type() {
    let h = harness(offline(), None);
    let req = axum::http::Request::builder()
        .uri("/style.css")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = h.app().oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/css");
}

#[tokio::test]
async fn unknown_api_path_is_404() {
    let h = harness(offline(), None);
    let (status, _) = get(h.app(), "/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
