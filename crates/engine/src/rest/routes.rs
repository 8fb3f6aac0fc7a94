// m13 - REST facade for live debugging sessions
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Route table.
//!
//! | Method | Path |
//! |---|---|
//! | GET | `/info`, `/health` |
//! | GET | `/debugger`, `/debugger/{debugger_id}` |
//! | PUT | `/debugger/{action}` (`prompt`, `async`) |
//! | GET | `/target/{idx}` |
//! | GET | `/target/{idx}/breakpoints[/{breakpoint_id}]` |
//! | PUT | `/target/{idx}/breakpoints/{breakpoint_id}/{action}` (`enable`) |
//! | GET | `/target/{idx}/process[/{action}]` |
//! | GET | `/target/{idx}/thread/{thread_id}[/{action}]` |
//! | GET | `/target/{idx}/thread/{thread_id}/frame/{frame_idx}` |
//!
//! Process and thread actions are GETs because existing clients issue them
//! that way.

use axum::{
    extract::{
        rejection::{FormRejection, PathRejection},
        Form, Path, State,
    },
    http::Method,
    routing::{get, put},
    Router,
};
use m13_common::types::ErrorBody;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error};

use super::{server::Work, JsonBody};
use crate::facade::{Reply, Request};

/// Reply to any request that does not name a resource
const UNKNOWN_RESOURCE: &str = "Unknown resource.";

/// Shared state of every handler
#[derive(Clone)]
struct RestState {
    /// Channel to the engine worker
    tx: mpsc::Sender<Work>,
}

impl RestState {
    /// Hand a request to the engine worker and wait for its reply
    async fn submit(&self, req: Request) -> JsonBody<Reply> {
        let (rsp_tx, rsp_rx) = oneshot::channel();
        if self.tx.send(Work { req, rsp: rsp_tx }).await.is_err() {
            error!("Engine worker is gone");
            return JsonBody(Reply::Error(ErrorBody::new("Engine is unavailable.")));
        }

        match rsp_rx.await {
            Ok(reply) => JsonBody(reply),
            Err(_) => {
                error!("Engine worker dropped the response channel");
                JsonBody(Reply::Error(ErrorBody::new("Engine is unavailable.")))
            }
        }
    }
}

/// Form body of `PUT /debugger/prompt`
#[derive(Debug, Deserialize)]
struct PromptForm {
    prompt: Option<String>,
}

/// Build the router; requests are forwarded to the worker behind `tx`
pub fn router(tx: mpsc::Sender<Work>) -> Router {
    Router::new()
        .route("/info", get(info))
        .route("/health", get(health_check))
        .route("/debugger", get(session))
        .route("/debugger/{debugger_id}", get(session_by_id).put(session_action))
        .route("/target/{idx}", get(target))
        .route("/target/{idx}/breakpoints", get(breakpoints))
        .route("/target/{idx}/breakpoints/{breakpoint_id}", get(breakpoint))
        .route("/target/{idx}/breakpoints/{breakpoint_id}/{action}", put(breakpoint_action))
        .route("/target/{idx}/process", get(process))
        .route("/target/{idx}/process/{action}", get(process_action))
        .route("/target/{idx}/thread/{thread_id}", get(thread))
        .route("/target/{idx}/thread/{thread_id}/{action}", get(thread_action))
        .route("/target/{idx}/thread/{thread_id}/frame/{frame_idx}", get(frame))
        .fallback(unknown_resource)
        .method_not_allowed_fallback(unknown_resource)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::PUT])
                .allow_headers(Any)
                .allow_origin(Any),
        )
        .with_state(RestState { tx })
}

async fn info(State(state): State<RestState>) -> JsonBody<Reply> {
    state.submit(Request::Info).await
}

/// Liveness document; answered without touching the engine
async fn health_check() -> JsonBody<serde_json::Value> {
    JsonBody(serde_json::json!({
        "status": "healthy",
        "service": "m13-rest-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn session(State(state): State<RestState>) -> JsonBody<Reply> {
    state.submit(Request::Session { session: None }).await
}

/// Path segments of a matched route; undecodable segments are unknown resources
type Segments<T> = Result<Path<T>, PathRejection>;

async fn session_by_id(State(state): State<RestState>, path: Segments<String>) -> JsonBody<Reply> {
    let debugger_id = match path {
        Ok(Path(debugger_id)) => debugger_id,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Session { session: Some(debugger_id) }).await
}

async fn session_action(
    State(state): State<RestState>,
    path: Segments<String>,
    form: Result<Form<PromptForm>, FormRejection>,
) -> JsonBody<Reply> {
    let action = match path {
        Ok(Path(action)) => action,
        Err(rejection) => return rejected(rejection),
    };
    // A missing or malformed body only matters to `prompt`, which reports the missing field.
    let prompt = form.ok().and_then(|Form(form)| form.prompt);
    state.submit(Request::SessionAction { action, prompt }).await
}

async fn target(State(state): State<RestState>, path: Segments<String>) -> JsonBody<Reply> {
    let target = match path {
        Ok(Path(target)) => target,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Target { target }).await
}

async fn breakpoints(State(state): State<RestState>, path: Segments<String>) -> JsonBody<Reply> {
    let target = match path {
        Ok(Path(target)) => target,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Breakpoints { target }).await
}

async fn breakpoint(
    State(state): State<RestState>,
    path: Segments<(String, String)>,
) -> JsonBody<Reply> {
    let (target, breakpoint) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Breakpoint { target, breakpoint }).await
}

async fn breakpoint_action(
    State(state): State<RestState>,
    path: Segments<(String, String, String)>,
) -> JsonBody<Reply> {
    let (target, breakpoint, action) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::BreakpointAction { target, breakpoint, action }).await
}

async fn process(State(state): State<RestState>, path: Segments<String>) -> JsonBody<Reply> {
    let target = match path {
        Ok(Path(target)) => target,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Process { target }).await
}

async fn process_action(
    State(state): State<RestState>,
    path: Segments<(String, String)>,
) -> JsonBody<Reply> {
    let (target, action) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::ProcessAction { target, action }).await
}

async fn thread(
    State(state): State<RestState>,
    path: Segments<(String, String)>,
) -> JsonBody<Reply> {
    let (target, thread) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Thread { target, thread }).await
}

async fn thread_action(
    State(state): State<RestState>,
    path: Segments<(String, String, String)>,
) -> JsonBody<Reply> {
    let (target, thread, action) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::ThreadAction { target, thread, action }).await
}

async fn frame(
    State(state): State<RestState>,
    path: Segments<(String, String, String)>,
) -> JsonBody<Reply> {
    let (target, thread, frame) = match path {
        Ok(Path(segments)) => segments,
        Err(rejection) => return rejected(rejection),
    };
    state.submit(Request::Frame { target, thread, frame }).await
}

fn rejected(rejection: PathRejection) -> JsonBody<Reply> {
    debug!(%rejection, "Rejected path segments");
    JsonBody(Reply::Error(ErrorBody::new(UNKNOWN_RESOURCE)))
}

async fn unknown_resource() -> JsonBody<ErrorBody> {
    JsonBody::error(UNKNOWN_RESOURCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RestState>();
    }
}
