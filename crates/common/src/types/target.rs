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

/// Point-in-time copy of one target.
///
/// Deliberately shallow: breakpoints and modules are listed by identifier
/// only. Their details are separate resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    /// Position of the target within its session
    pub index: usize,
    /// Whether the target is still valid
    pub valid: bool,
    /// Id of the owning debugger instance
    pub debugger_id: u64,
    /// Full path of the executable, if the target has one
    pub executable_path: Option<String>,
    /// File name of the executable, if the target has one
    pub executable_name: Option<String>,
    /// Ids of the target's breakpoints
    pub breakpoints: Vec<u32>,
    /// UUIDs of the target's loaded modules
    pub modules: Vec<String>,
}
