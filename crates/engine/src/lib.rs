// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0

//! # m13 engine
//!
//! Exposes a live native debugging session as a tree of HTTP resources.
//!
//! ## Overview
//!
//! A client addresses debugger objects by path (`/target/selected/thread/0x1b58`),
//! reads them as JSON snapshots, and acts on them with a small closed set of
//! verbs (continue, step over, toggle a breakpoint, ...). The crate is split
//! along the path a request takes:
//!
//! - [`adapter`] - the [`DebugEngine`] capability trait the facade needs
//! - [`sandbox`] - [`SandboxEngine`], an in-memory engine
//! - [`resolve`] - path segments to engine references
//! - [`action`] - verb tokens to engine calls
//! - [`snapshot`] - engine references to owned snapshot values
//! - [`facade`] - one request end to end
//! - [`guard`] - the lock every engine access goes through
//! - [`rest`] - the axum server
//!
//! ## Example
//!
//! ```rust,ignore
//! use m13_engine::{EngineGuard, RestServer, SandboxEngine, ServerConfig};
//!
//! let guard = EngineGuard::new(SandboxEngine::demo());
//! let handle = RestServer::new(guard.clone(), ServerConfig::default()).spawn()?;
//!
//! // The host keeps driving the engine through the same guard.
//! guard.with(|engine| engine.pump_events());
//!
//! handle.shutdown()?;
//! ```

pub mod action;
pub mod adapter;
pub mod config;
pub mod error;
pub mod facade;
pub mod guard;
pub mod resolve;
pub mod rest;
pub mod sandbox;
pub mod snapshot;

pub use action::*;
pub use adapter::*;
pub use config::*;
pub use error::*;
pub use facade::{handle, Reply, Request};
pub use guard::*;
pub use rest::*;
pub use sandbox::*;
