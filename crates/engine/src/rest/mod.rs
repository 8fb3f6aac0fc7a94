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

//! REST server exposing the debugging session as a resource tree.
//!
//! # Architecture
//!
//! - **Routes** ([`routes`]) - axum handlers that turn a path into a
//!   [`Request`](crate::Request) and forward it to the engine worker
//! - **Server** ([`server`]) - listener lifecycle and the engine worker thread
//! - **Response** ([`response`]) - the JSON body type shared by every handler
//!
//! Handlers never touch the engine. They send a work item over a channel to a
//! single worker thread, which runs the whole resolve, act and snapshot
//! sequence inside one [`EngineGuard`](crate::EngineGuard) window and answers
//! with an owned [`Reply`](crate::Reply). The reply is serialized back on the
//! handler task, after the lock is gone.
//!
//! # Protocol
//!
//! Every response is HTTP 200 with `Content-Type: application/json;
//! charset=utf8`. Logical failures are reported in the body as
//! `{"error": {"message": "..."}}`.

pub mod response;
pub mod routes;
pub mod server;

pub use response::*;
pub use routes::router;
pub use server::*;
