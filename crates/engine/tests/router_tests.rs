//! Router tests driven through `tower::ServiceExt::oneshot`, without a listener

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use http_body_util::BodyExt;
use m13_engine::{
    router, spawn_engine_worker, EngineGuard, ProcessRef, SandboxEngine, SandboxFrame, SessionId,
    TargetRef, ThreadRef,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app() -> Router {
    let guard = EngineGuard::new(SandboxEngine::demo());
    router(spawn_engine_worker(guard).unwrap())
}

async fn call(app: Router, method: Method, uri: &str) -> Value {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_unknown_route_is_reported_in_body() {
    let reply = call(app(), Method::GET, "/target/0/modules").await;
    assert_eq!(reply, json!({"error": {"message": "Unknown resource."}}));
}

#[tokio::test]
async fn test_wrong_method_is_reported_in_body() {
    let reply = call(app(), Method::POST, "/target/0").await;
    assert_eq!(reply, json!({"error": {"message": "Unknown resource."}}));
}

#[tokio::test]
async fn test_undecodable_segments_are_reported_in_body() {
    for uri in [
        "/target/%FF",
        "/target/0/thread/%C3%28",
        "/target/0/process/%FF",
        "/target/0/breakpoints/1/%FF",
        "/debugger/%FF",
    ] {
        let method = if uri.contains("breakpoints") { Method::PUT } else { Method::GET };
        let reply = call(app(), method, uri).await;
        assert_eq!(reply, json!({"error": {"message": "Unknown resource."}}), "{uri}");
    }
}

#[tokio::test]
async fn test_engine_keeps_answering_after_pc_wraps() {
    let mut engine = SandboxEngine::demo();
    let target = TargetRef { session: SessionId(1), index: 0 };
    let thread = ThreadRef { process: ProcessRef { target }, id: 0x1b58 };
    engine.push_frame(thread, SandboxFrame::new(u64::MAX - 1, 0x7ff0, 0x7ff8, "spin")).unwrap();
    let app = router(spawn_engine_worker(EngineGuard::new(engine)).unwrap());

    let reply = call(app.clone(), Method::GET, "/target/0/thread/selected/step_over").await;
    assert_eq!(reply["frames"][0]["pc"], 2);

    let reply = call(app, Method::GET, "/debugger").await;
    assert_eq!(reply["id"], "0x1");
}

#[tokio::test]
async fn test_frame_selected_sentinels() {
    let reply = call(app(), Method::GET, "/target/selected/thread/selected/frame/selected").await;
    assert_eq!(reply["id"], 0);
    assert_eq!(reply["function_name"], "serve");
    assert_eq!(reply["arguments"][0]["name"], "port");
    assert_eq!(reply["locals"], json!([]));
}

#[tokio::test]
async fn test_target_without_process() {
    let reply = call(app(), Method::GET, "/target/1/process").await;
    assert_eq!(reply, json!({"error": {"message": "Unable to find process."}}));

    let reply = call(app(), Method::GET, "/target/1/thread/selected").await;
    assert_eq!(reply, json!({"error": {"message": "Unable to find process."}}));
}
