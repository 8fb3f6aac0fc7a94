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

//! Request handling.
//!
//! A [`Request`] carries the raw path segments of one HTTP request.
//! [`handle`] resolves them, applies the verb if there is one, and snapshots
//! the result, all against one `&mut` borrow of the engine. The caller holds
//! the engine lock for exactly that call and serializes the returned
//! [`Reply`] afterwards.
//!
//! Resources are always resolved before the verb is parsed, so a request
//! against a missing resource reports not-found even when its verb is also
//! unknown.

use m13_common::types::{
    BreakpointSnapshot, ErrorBody, FrameSnapshot, InfoSnapshot, ProcessSnapshot, SessionSnapshot,
    TargetSnapshot, ThreadSnapshot,
};
use serde::Serialize;
use tracing::debug;

use crate::{
    action::{BreakpointAction, ProcessAction, SessionAction, ThreadAction},
    adapter::DebugEngine,
    error::FacadeResult,
    resolve::Resolver,
    snapshot,
};

/// One facade request; path segments are kept as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `GET /info`
    Info,
    /// `GET /debugger[/{debugger_id}]`
    Session {
        /// Session segment, `None` for the selected session
        session: Option<String>,
    },
    /// `PUT /debugger/{action}`
    SessionAction {
        /// Verb token
        action: String,
        /// Form field `prompt`, if submitted
        prompt: Option<String>,
    },
    /// `GET /target/{idx}`
    Target {
        /// Target segment
        target: String,
    },
    /// `GET /target/{idx}/breakpoints`
    Breakpoints {
        /// Target segment
        target: String,
    },
    /// `GET /target/{idx}/breakpoints/{breakpoint_id}`
    Breakpoint {
        /// Target segment
        target: String,
        /// Breakpoint segment
        breakpoint: String,
    },
    /// `PUT /target/{idx}/breakpoints/{breakpoint_id}/{action}`
    BreakpointAction {
        /// Target segment
        target: String,
        /// Breakpoint segment
        breakpoint: String,
        /// Verb token
        action: String,
    },
    /// `GET /target/{idx}/process`
    Process {
        /// Target segment
        target: String,
    },
    /// `GET /target/{idx}/process/{action}`
    ProcessAction {
        /// Target segment
        target: String,
        /// Verb token
        action: String,
    },
    /// `GET /target/{idx}/thread/{thread_id}`
    Thread {
        /// Target segment
        target: String,
        /// Thread segment
        thread: String,
    },
    /// `GET /target/{idx}/thread/{thread_id}/{action}`
    ThreadAction {
        /// Target segment
        target: String,
        /// Thread segment
        thread: String,
        /// Verb token
        action: String,
    },
    /// `GET /target/{idx}/thread/{thread_id}/frame/{frame_idx}`
    Frame {
        /// Target segment
        target: String,
        /// Thread segment
        thread: String,
        /// Frame segment
        frame: String,
    },
}

/// Owned response document, serialized without any wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Engine version document
    Info(InfoSnapshot),
    /// Session document
    Session(SessionSnapshot),
    /// Target document
    Target(TargetSnapshot),
    /// Breakpoint list
    Breakpoints(Vec<BreakpointSnapshot>),
    /// Breakpoint document
    Breakpoint(BreakpointSnapshot),
    /// Process document
    Process(ProcessSnapshot),
    /// Thread document
    Thread(ThreadSnapshot),
    /// Frame document
    Frame(FrameSnapshot),
    /// In-body error
    Error(ErrorBody),
}

impl Reply {
    /// The error body, if this reply is one
    pub fn as_error(&self) -> Option<&ErrorBody> {
        match self {
            Self::Error(body) => Some(body),
            _ => None,
        }
    }
}

/// Resolve, act and snapshot one request
pub fn handle<E: DebugEngine + ?Sized>(engine: &mut E, request: Request) -> Reply {
    match dispatch(engine, request) {
        Ok(reply) => reply,
        Err(error) => {
            debug!(%error, "Request failed");
            Reply::Error(error.to_body())
        }
    }
}

fn dispatch<E: DebugEngine + ?Sized>(engine: &mut E, request: Request) -> FacadeResult<Reply> {
    match request {
        Request::Info => Ok(Reply::Info(InfoSnapshot { version: engine.version() })),
        Request::Session { session } => {
            let session = Resolver::new(&*engine).session(session.as_deref())?;
            Ok(Reply::Session(snapshot::session_snapshot(&*engine, session)?))
        }
        Request::SessionAction { action, prompt } => {
            let session = Resolver::new(&*engine).session(None)?;
            SessionAction::parse(&action, prompt)?.apply(engine, session)?;
            Ok(Reply::Session(snapshot::session_snapshot(&*engine, session)?))
        }
        Request::Target { target } => {
            let target = Resolver::new(&*engine).target(&target)?;
            Ok(Reply::Target(snapshot::target_snapshot(&*engine, target)?))
        }
        Request::Breakpoints { target } => {
            let target = Resolver::new(&*engine).target(&target)?;
            Ok(Reply::Breakpoints(snapshot::breakpoint_snapshots(&*engine, target)))
        }
        Request::Breakpoint { target, breakpoint } => {
            let breakpoint = Resolver::new(&*engine).breakpoint(&target, &breakpoint)?;
            Ok(Reply::Breakpoint(snapshot::breakpoint_snapshot(&*engine, breakpoint)?))
        }
        Request::BreakpointAction { target, breakpoint, action } => {
            let breakpoint = Resolver::new(&*engine).breakpoint(&target, &breakpoint)?;
            action.parse::<BreakpointAction>()?.apply(engine, breakpoint)?;
            Ok(Reply::Breakpoint(snapshot::breakpoint_snapshot(&*engine, breakpoint)?))
        }
        Request::Process { target } => {
            let process = Resolver::new(&*engine).process(&target)?;
            Ok(Reply::Process(snapshot::process_snapshot(&*engine, process)?))
        }
        Request::ProcessAction { target, action } => {
            let process = Resolver::new(&*engine).process(&target)?;
            action.parse::<ProcessAction>()?.apply(engine, process)?;
            Ok(Reply::Process(snapshot::process_snapshot(&*engine, process)?))
        }
        Request::Thread { target, thread } => {
            let thread = Resolver::new(&*engine).thread(&target, &thread)?;
            Ok(Reply::Thread(snapshot::thread_snapshot(&*engine, thread)?))
        }
        Request::ThreadAction { target, thread, action } => {
            let thread = Resolver::new(&*engine).thread(&target, &thread)?;
            action.parse::<ThreadAction>()?.apply(engine, thread)?;
            Ok(Reply::Thread(snapshot::thread_snapshot(&*engine, thread)?))
        }
        Request::Frame { target, thread, frame } => {
            let frame = Resolver::new(&*engine).frame(&target, &thread, &frame)?;
            Ok(Reply::Frame(snapshot::frame_snapshot(&*engine, frame)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SandboxEngine;

    fn message(reply: &Reply) -> Option<&str> {
        reply.as_error().map(ErrorBody::message)
    }

    #[test]
    fn test_unknown_verb_leaves_process_alone() {
        let mut engine = SandboxEngine::demo();
        let before = handle(&mut engine, Request::Process { target: "0".into() });

        let reply = handle(
            &mut engine,
            Request::ProcessAction { target: "0".into(), action: "frobnicate".into() },
        );
        assert_eq!(message(&reply), Some("Unknown action."));
        assert_eq!(handle(&mut engine, Request::Process { target: "0".into() }), before);
    }

    #[test]
    fn test_missing_resource_wins_over_unknown_verb() {
        let mut engine = SandboxEngine::demo();
        let reply = handle(
            &mut engine,
            Request::ProcessAction { target: "1".into(), action: "frobnicate".into() },
        );
        assert_eq!(message(&reply), Some("Unable to find process."));
    }

    #[test]
    fn test_engine_refusal_is_reported_in_body() {
        let mut engine = SandboxEngine::demo();
        let reply = handle(
            &mut engine,
            Request::ProcessAction { target: "0".into(), action: "stop".into() },
        );
        assert_eq!(message(&reply), Some("Process is not running."));
    }

    #[test]
    fn test_prompt_action_returns_session() {
        let mut engine = SandboxEngine::demo();
        let reply = handle(
            &mut engine,
            Request::SessionAction { action: "prompt".into(), prompt: Some("(m13) ".into()) },
        );
        match reply {
            Reply::Session(session) => assert_eq!(session.prompt, "(m13) "),
            other => panic!("unexpected reply: {other:?}"),
        }

        let reply =
            handle(&mut engine, Request::SessionAction { action: "prompt".into(), prompt: None });
        assert_eq!(message(&reply), Some("Missing required field 'prompt'."));
    }

    #[test]
    fn test_reply_serializes_without_wrapper() {
        let mut engine = SandboxEngine::demo();
        let reply = handle(&mut engine, Request::Info);
        let value = serde_json::to_value(&reply).unwrap();
        assert!(value["version"].as_str().unwrap().starts_with("m13-sandbox"));
    }
}
