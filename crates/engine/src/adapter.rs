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

//! Capability interface over a native debugging engine.
//!
//! The facade never holds engine objects across calls. Instead it addresses
//! them with small copyable references ([`TargetRef`], [`ThreadRef`], ...)
//! that spell out the path from the session down, and asks the engine to read
//! or act on whatever currently lives at that path. A reference to something
//! that has since disappeared simply reads back as `None`.
//!
//! # Object graph
//!
//! ```text
//! Session ─┬─ Target* ─┬─ Breakpoint*
//!          │           ├─ Module*
//!          │           └─ Process ── Thread* ── Frame* ─┬─ RegisterGroup*
//!          │                                            └─ Arguments / Locals / Statics
//! ```
//!
//! Any engine that implements [`DebugEngine`] can be served; the crate ships
//! [`SandboxEngine`](crate::SandboxEngine) as an in-memory implementation.

use m13_common::types::{ByteOrder, ProcessState, RegisterValue, StopReason, VariableValue};
use thiserror::Error;

/// Result of an engine call
pub type EngineResult<T> = Result<T, EngineError>;

/// Failures reported by the engine for control operations.
///
/// The engine guarantees that a failed call has no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The object is not in a state that allows the operation
    #[error("{0}")]
    InvalidState(String),
    /// The engine does not implement the capability
    #[error("{0} is not supported by this engine.")]
    Unsupported(&'static str),
    /// The object went away while the operation was being issued
    #[error("The {0} is no longer valid.")]
    Invalid(&'static str),
}

/// Engine-assigned id of a debugger instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// A target, addressed by its position within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetRef {
    /// Owning session
    pub session: SessionId,
    /// Position of the target within the session
    pub index: usize,
}

/// The process of a target (a target has at most one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessRef {
    /// Owning target
    pub target: TargetRef,
}

/// A thread, addressed by its engine-assigned id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRef {
    /// Owning process
    pub process: ProcessRef,
    /// Engine-assigned thread id
    pub id: u64,
}

/// A stack frame, addressed by its position (0 is innermost)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef {
    /// Owning thread
    pub thread: ThreadRef,
    /// Position within the stack
    pub index: u32,
}

/// A breakpoint, addressed by its engine-assigned id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BreakpointRef {
    /// Owning target
    pub target: TargetRef,
    /// Engine-assigned breakpoint id
    pub id: u32,
}

/// Scalar fields of a debugger instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionAttrs {
    /// Engine version string
    pub version: String,
    /// Instance name
    pub instance_name: String,
    /// Command prompt
    pub prompt: String,
    /// Validity flag
    pub valid: bool,
    /// Asynchronous execution flag
    pub is_async: bool,
}

/// Scalar fields of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAttrs {
    /// Validity flag
    pub valid: bool,
    /// Full path of the executable
    pub executable_path: Option<String>,
    /// File name of the executable
    pub executable_name: Option<String>,
}

/// Scalar fields of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessAttrs {
    /// Operating system process id
    pub pid: u64,
    /// Execution state
    pub state: ProcessState,
    /// Byte order of the debuggee
    pub byte_order: ByteOrder,
}

/// Scalar fields of a thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadAttrs {
    /// Sequential index id
    pub index_id: u32,
    /// Thread name
    pub name: Option<String>,
    /// Dispatch queue name
    pub queue_name: Option<String>,
    /// Suspended flag
    pub suspended: bool,
    /// Last stop reason
    pub stop_reason: StopReason,
}

/// Scalar fields of a stack frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameAttrs {
    /// Program counter
    pub pc: u64,
    /// Stack pointer
    pub sp: u64,
    /// Frame pointer
    pub fp: u64,
    /// Function name
    pub function_name: Option<String>,
    /// Inlined flag
    pub inlined: bool,
}

/// Scalar fields of a breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointAttrs {
    /// Validity flag
    pub valid: bool,
    /// Enabled flag
    pub enabled: bool,
    /// One-shot flag
    pub one_shot: bool,
    /// Internal flag
    pub internal: bool,
    /// Hit count
    pub hit_count: u32,
    /// Condition expression
    pub condition: Option<String>,
    /// Thread the breakpoint is restricted to, 0 for all threads
    pub thread_id: u64,
}

/// A named group of registers, e.g. `General Purpose Registers`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterGroup {
    /// Group name as the engine reports it
    pub name: String,
    /// Registers in the group
    pub registers: Vec<RegisterValue>,
}

/// Which variables of a frame to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableScope {
    /// Function arguments
    Arguments,
    /// Local variables
    Locals,
    /// Static variables
    Statics,
}

/// The capability set the facade needs from a debugging engine.
///
/// Readers return `None` when the addressed object does not exist; they must
/// never panic on stale references. Control operations return
/// [`EngineError`] and leave the engine unchanged on failure. Control
/// operations are fire-and-forget: they return once the request is issued, not
/// when the debuggee reaches its next stable state.
///
/// Implementations are not required to be reentrant; callers serialize access
/// through [`EngineGuard`](crate::EngineGuard).
pub trait DebugEngine: Send + 'static {
    /// Engine version string
    fn version(&self) -> String;

    /// Every live debugger instance
    fn sessions(&self) -> Vec<SessionId>;
    /// The current debugger instance
    fn selected_session(&self) -> Option<SessionId>;
    /// Read a debugger instance
    fn session(&self, session: SessionId) -> Option<SessionAttrs>;
    /// Replace the command prompt
    fn set_prompt(&mut self, session: SessionId, prompt: &str) -> EngineResult<()>;
    /// Switch asynchronous execution on or off
    fn set_async(&mut self, session: SessionId, enabled: bool) -> EngineResult<()>;

    /// Number of targets owned by a session
    fn num_targets(&self, session: SessionId) -> usize;
    /// Position of the selected target, if any
    fn selected_target(&self, session: SessionId) -> Option<usize>;
    /// Read a target
    fn target(&self, target: TargetRef) -> Option<TargetAttrs>;
    /// Ids of a target's breakpoints, in engine order
    fn breakpoint_ids(&self, target: TargetRef) -> Vec<u32>;
    /// UUIDs of a target's loaded modules
    fn module_uuids(&self, target: TargetRef) -> Vec<String>;

    /// Read a breakpoint
    fn breakpoint(&self, breakpoint: BreakpointRef) -> Option<BreakpointAttrs>;
    /// Enable or disable a breakpoint
    fn set_breakpoint_enabled(
        &mut self,
        breakpoint: BreakpointRef,
        enabled: bool,
    ) -> EngineResult<()>;

    /// Read the process of a target
    fn process(&self, process: ProcessRef) -> Option<ProcessAttrs>;
    /// Resume a stopped process
    fn continue_process(&mut self, process: ProcessRef) -> EngineResult<()>;
    /// Interrupt a running process
    fn stop_process(&mut self, process: ProcessRef) -> EngineResult<()>;
    /// Terminate a process
    fn kill_process(&mut self, process: ProcessRef) -> EngineResult<()>;
    /// Let go of a process without terminating it
    fn detach_process(&mut self, process: ProcessRef) -> EngineResult<()>;

    /// Ids of a process's threads, in engine order
    fn thread_ids(&self, process: ProcessRef) -> Vec<u64>;
    /// Id of the selected thread, if any
    fn selected_thread(&self, process: ProcessRef) -> Option<u64>;
    /// Read a thread
    fn thread(&self, thread: ThreadRef) -> Option<ThreadAttrs>;
    /// Step over the current source line
    fn step_over(&mut self, thread: ThreadRef) -> EngineResult<()>;
    /// Step into the call on the current source line
    fn step_into(&mut self, thread: ThreadRef) -> EngineResult<()>;
    /// Run until the current function returns
    fn step_out(&mut self, thread: ThreadRef) -> EngineResult<()>;
    /// Keep a thread suspended when the process resumes
    fn suspend_thread(&mut self, thread: ThreadRef) -> EngineResult<()>;
    /// Let a suspended thread run again when the process resumes
    fn resume_thread(&mut self, thread: ThreadRef) -> EngineResult<()>;

    /// Number of frames on a thread's stack
    fn num_frames(&self, thread: ThreadRef) -> usize;
    /// Position of the selected frame, if any
    fn selected_frame(&self, thread: ThreadRef) -> Option<u32>;
    /// Read a stack frame
    fn frame(&self, frame: FrameRef) -> Option<FrameAttrs>;
    /// Every register group of a frame
    fn register_groups(&self, frame: FrameRef) -> Vec<RegisterGroup>;

    /// Variables of a frame in the given scope.
    ///
    /// Engines without variable inspection keep the default, which reports
    /// [`EngineError::Unsupported`].
    fn variables(&self, frame: FrameRef, scope: VariableScope) -> EngineResult<Vec<VariableValue>> {
        let _ = (frame, scope);
        Err(EngineError::Unsupported("Variable inspection"))
    }
}
