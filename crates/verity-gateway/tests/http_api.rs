#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use verity_gateway::{app_state::AppState, config, router};

const AUTHORITY: &str = "0x00000000000000000000000000000000000000a0";
const ALLOWLIST: &str = "0x0000000000000000000000000000000000000001";
const US_ONLY: &str = "0x0000000000000000000000000000000000000002";
const U: &str = "0x0000000000000000000000000000000000000055";
const V: &str = "0x0000000000000000000000000000000000000056";

fn test_state() -> AppState {
    let yaml = format!(
        r#"
version: 1
router:
  authority: "{AUTHORITY}"
deployments:
  - address: "{ALLOWLIST}"
    kind: allowlist
    users: ["{U}"]
  - address: "{US_ONLY}"
    kind: jurisdiction_allowlist
    jurisdictions: ["US"]
registrations:
  general:
    - address: "{ALLOWLIST}"
"#
    );
    AppState::new(config::load_from_str(&yaml).unwrap()).unwrap()
}

fn test_app() -> axum::Router {
    router::build_router(test_state())
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, caller: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(c) = caller {
        b = b.header("x-verity-caller", c);
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, caller: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .header("x-verity-caller", caller)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn general_query_reflects_allowlist() {
    let (status, body) = send(test_app(), get(&format!("/v1/compliance/{U}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "user": U, "compliant": true }));

    let (_, body) = send(test_app(), get(&format!("/v1/compliance/{V}"))).await;
    assert_eq!(body["compliant"], json!(false));
}

#[tokio::test]
async fn malformed_user_is_bad_request() {
    let (status, body) = send(test_app(), get("/v1/compliance/0x1234")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("BAD_REQUEST"));
}

#[tokio::test]
async fn register_then_query_jurisdiction() {
    let state = test_state();

    let (status, _) = send(
        router::build_router(state.clone()),
        get(&format!("/v1/compliance/{U}/US")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        router::build_router(state.clone()),
        post("/v1/modules/jurisdiction", Some(AUTHORITY), json!({ "address": US_ONLY })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "identity": US_ONLY, "selector": "0xda704ed6" }));

    let (_, body) = send(
        router::build_router(state.clone()),
        get(&format!("/v1/compliance/{U}/US")),
    )
    .await;
    assert_eq!(body, json!({ "user": U, "jurisdiction": "US", "compliant": true }));

    let (_, body) = send(
        router::build_router(state.clone()),
        get(&format!("/v1/compliance/{U}/EU")),
    )
    .await;
    assert_eq!(body["compliant"], json!(false));

    let (_, body) = send(router::build_router(state), get("/v1/modules/count")).await;
    assert_eq!(body, json!({ "general": 1, "jurisdiction": 1 }));
}

#[tokio::test]
async fn mutation_errors_map_to_status_codes() {
    let state = test_state();
    let app = || router::build_router(state.clone());

    // missing caller header
    let (status, body) = send(app(), post("/v1/modules/general", None, json!({ "address": V }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("BAD_REQUEST"));

    // not the authority
    let (status, body) = send(app(), post("/v1/modules/general", Some(V), json!({ "address": V }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], json!("UNAUTHORIZED"));

    // already registered
    let (status, body) = send(
        app(),
        post("/v1/modules/general", Some(AUTHORITY), json!({ "address": ALLOWLIST })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("ALREADY_REGISTERED"));

    // null identity
    let (status, body) = send(
        app(),
        post(
            "/v1/modules/general",
            Some(AUTHORITY),
            json!({ "address": "0x0000000000000000000000000000000000000000" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("INVALID_IDENTITY"));

    // zero selector
    let (status, body) = send(
        app(),
        post(
            "/v1/modules/general",
            Some(AUTHORITY),
            json!({ "address": V, "selector": "0x00000000" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("INVALID_SELECTOR"));

    // remove unknown
    let (status, body) = send(app(), delete(&format!("/v1/modules/{V}"), AUTHORITY)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("NOT_REGISTERED"));

    assert_eq!(state.router().general_count(), 1);
    assert_eq!(state.router().events().len(), 1);
}

#[tokio::test]
async fn remove_and_events() {
    let state = test_state();
    let app = || router::build_router(state.clone());

    let (status, body) = send(app(), delete(&format!("/v1/modules/{ALLOWLIST}"), AUTHORITY)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "removed": ALLOWLIST, "categories": ["general"] }));

    let (_, body) = send(app(), get(&format!("/v1/compliance/{U}"))).await;
    assert_eq!(body["compliant"], json!(false));

    let (status, body) = send(app(), get("/v1/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "seq": 1, "event": "GeneralComplianceContractRegistered", "identity": ALLOWLIST, "selector": "0xa200e5d0" },
            { "seq": 2, "event": "ComplianceContractRemoved", "identity": ALLOWLIST },
        ])
    );

    let (_, body) = send(app(), get("/v1/events?after=1")).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (status, body) = send(app(), get("/v1/events?limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["seq"], json!(1));
}

#[tokio::test]
async fn ops_endpoints() {
    let state = test_state();
    let app = || router::build_router(state.clone());

    let (status, body) = send(app(), get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let _ = send(app(), get(&format!("/v1/compliance/{U}"))).await;
    let (status, body) = send(app(), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("verity_queries_total{category=\"general\",result=\"compliant\"} 1"));
    assert!(text.contains("verity_registered_modules{category=\"general\"} 1"));

    state.set_draining();
    let (status, _) = send(app(), get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
