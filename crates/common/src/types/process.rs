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

use std::fmt;

use serde::{Deserialize, Serialize};

/// Execution state of a debuggee process, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// The process handle no longer refers to anything
    Invalid,
    /// Target exists but no process has been created
    Unloaded,
    /// Connected to a remote stub, not yet attached or launched
    Connected,
    /// Attach in progress
    Attaching,
    /// Launch in progress
    Launching,
    /// Stopped and inspectable
    Stopped,
    /// Running freely
    Running,
    /// Executing a step request
    Stepping,
    /// Stopped because of a crash
    Crashed,
    /// The debugger let go of the process
    Detached,
    /// The process exited
    Exited,
    /// Suspended by the host, not by the debugger
    Suspended,
}

impl ProcessState {
    /// Whether the process is gone for good
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exited | Self::Detached | Self::Invalid)
    }

    /// Whether the process is halted and its threads can be inspected or stepped
    pub fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped | Self::Crashed | Self::Suspended)
    }

    /// Whether the process is executing code
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::Stepping)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Invalid => "invalid",
            Self::Unloaded => "unloaded",
            Self::Connected => "connected",
            Self::Attaching => "attaching",
            Self::Launching => "launching",
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Stepping => "stepping",
            Self::Crashed => "crashed",
            Self::Detached => "detached",
            Self::Exited => "exited",
            Self::Suspended => "suspended",
        };
        f.write_str(name)
    }
}

/// Byte order of the debuggee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByteOrder {
    /// Unknown
    Invalid,
    /// Little endian
    Little,
    /// Big endian
    Big,
    /// PDP-11 middle endian
    Pdp,
}

/// Point-in-time copy of one process.
///
/// Threads are listed by id only; a thread with its frames is a separate
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    /// Operating system process id
    pub id: u64,
    /// Execution state at the time of the snapshot
    pub state: ProcessState,
    /// Byte order of the debuggee
    pub byte_order: ByteOrder,
    /// Ids of the process's threads, in engine order
    pub threads: Vec<u64>,
    /// Id of the selected thread, if any
    pub selected_thread: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_serializes_as_snake_case_name() {
        assert_eq!(serde_json::to_value(ProcessState::Stopped).unwrap(), "stopped");
        assert_eq!(ProcessState::Running.to_string(), "running");
        assert_eq!(serde_json::to_value(ByteOrder::Little).unwrap(), "little");
    }

    #[test]
    fn test_state_classification() {
        assert!(ProcessState::Exited.is_terminal());
        assert!(ProcessState::Crashed.is_stopped());
        assert!(ProcessState::Stepping.is_running());
        assert!(!ProcessState::Launching.is_stopped());
    }
}
