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

//! Snapshot types shared by the REST facade and its clients.
//!
//! Every type in this module is an owned, point-in-time copy of engine state.
//! Nothing here borrows from or points into the debugging engine, so a value
//! that has been produced never changes when the engine moves on.
//!
//! # Wire format
//!
//! All ids are plain JSON integers except the session id and the breakpoint
//! owner-thread id, which are lowercase hexadecimal strings (`"0x1"`). Existing
//! clients depend on that asymmetry; see [`hex_id`].

mod breakpoint;
mod error;
pub mod hex_id;
mod process;
mod session;
mod target;
mod thread;

pub use breakpoint::*;
pub use error::*;
pub use process::*;
pub use session::*;
pub use target::*;
pub use thread::*;
