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

/// Why a thread last stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Not stopped, or no particular reason
    None,
    /// Single instruction trace
    Trace,
    /// Hit a breakpoint
    Breakpoint,
    /// Hit a watchpoint
    Watchpoint,
    /// Received a signal
    Signal,
    /// Raised an exception
    Exception,
    /// Completed a step request
    PlanComplete,
    /// The thread is exiting
    ThreadExiting,
}

/// Point-in-time copy of one thread and its call stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    /// Engine-assigned thread id
    pub id: u64,
    /// Small sequential id assigned by the engine
    pub index_id: u32,
    /// Thread name, if the debuggee set one
    pub name: Option<String>,
    /// Dispatch queue name, if any
    pub queue_name: Option<String>,
    /// Whether the debugger keeps this thread suspended on resume
    pub suspended: bool,
    /// Why the thread last stopped
    pub stop_reason: StopReason,
    /// Stack frames, innermost first
    pub frames: Vec<FrameSnapshot>,
}

/// Point-in-time copy of one stack frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Position within the stack, 0 is innermost
    pub id: u32,
    /// Program counter
    pub pc: u64,
    /// Stack pointer
    pub sp: u64,
    /// Frame pointer
    pub fp: u64,
    /// Function name, if symbols are available
    pub function_name: Option<String>,
    /// Whether this frame is an inlined call
    pub inlined: bool,
    /// General purpose registers
    pub registers: Vec<RegisterValue>,
    /// Function arguments
    pub arguments: Vec<VariableValue>,
    /// Local variables
    pub locals: Vec<VariableValue>,
    /// Static variables visible from the frame
    pub statics: Vec<VariableValue>,
}

/// One register and its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    /// Register name, e.g. `rip`
    pub name: String,
    /// Register contents
    pub value: u64,
}

/// One variable binding visible from a frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    /// Variable name
    pub name: String,
    /// Type name as reported by the engine
    pub type_name: String,
    /// Formatted value, if it could be read
    pub value: Option<String>,
}
