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

use serde::{Deserialize, Serialize};

use super::hex_id;

/// Point-in-time copy of one breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointSnapshot {
    /// Breakpoint id, unique within its target
    pub id: u32,
    /// Whether the breakpoint is still valid
    pub valid: bool,
    /// Whether the breakpoint is enabled
    pub enabled: bool,
    /// Whether the breakpoint deletes itself after the first hit
    pub one_shot: bool,
    /// Whether the breakpoint was created by the engine itself
    pub internal: bool,
    /// Number of times the breakpoint has been hit
    pub hit_count: u32,
    /// Condition expression, if any
    pub condition: Option<String>,
    /// Thread the breakpoint is restricted to, rendered as `0x...`
    /// (`0x0` when it applies to every thread)
    #[serde(with = "hex_id")]
    pub thread_id: u64,
}
