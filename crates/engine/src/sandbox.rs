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

//! In-memory debugging engine.
//!
//! [`SandboxEngine`] keeps a complete object graph (sessions, targets,
//! breakpoints, modules, processes, threads, frames) in plain collections and
//! implements the same state machine a native engine exposes through
//! [`DebugEngine`]: a continued process runs until [`SandboxEngine::pump_events`]
//! delivers the next stop, steps complete immediately in synchronous mode and
//! on the next pump in asynchronous mode, and a killed or detached process
//! loses its threads.
//!
//! `pump_events` plays the role of the engine's event thread. The host calls
//! it from its main loop, through the same [`EngineGuard`](crate::EngineGuard)
//! the REST server uses.

use m13_common::types::{ByteOrder, ProcessState, RegisterValue, StopReason, VariableValue};
use tracing::debug;

use crate::adapter::{
    BreakpointAttrs, BreakpointRef, DebugEngine, EngineError, EngineResult, FrameAttrs, FrameRef,
    ProcessAttrs, ProcessRef, RegisterGroup, SessionAttrs, SessionId, TargetAttrs, TargetRef,
    ThreadAttrs, ThreadRef, VariableScope,
};

/// Prompt of a freshly created session
pub const DEFAULT_PROMPT: &str = "(lldb) ";

/// Creation parameters of a sandbox breakpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointSpec {
    /// Condition expression
    pub condition: Option<String>,
    /// Thread the breakpoint is restricted to, 0 for all threads
    pub thread_id: u64,
    /// Delete after the first hit
    pub one_shot: bool,
    /// Created by the engine rather than the user
    pub internal: bool,
    /// Initial enabled flag
    pub enabled: bool,
}

impl Default for BreakpointSpec {
    fn default() -> Self {
        Self { condition: None, thread_id: 0, one_shot: false, internal: false, enabled: true }
    }
}

/// One stack frame of a sandbox thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxFrame {
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
    /// Function called at `pc`, entered by `step_into`
    pub callee: Option<String>,
    /// Arguments, `None` when the engine cannot read them
    pub arguments: Option<Vec<VariableValue>>,
    /// Locals, `None` when the engine cannot read them
    pub locals: Option<Vec<VariableValue>>,
    /// Statics, `None` when the engine cannot read them
    pub statics: Option<Vec<VariableValue>>,
}

impl SandboxFrame {
    /// A frame in `function_name` with no variable information
    pub fn new(pc: u64, sp: u64, fp: u64, function_name: &str) -> Self {
        Self {
            pc,
            sp,
            fp,
            function_name: Some(function_name.to_string()),
            inlined: false,
            callee: None,
            arguments: None,
            locals: None,
            statics: None,
        }
    }

    /// Set the function called at the current pc
    pub fn with_callee(mut self, callee: &str) -> Self {
        self.callee = Some(callee.to_string());
        self
    }

    /// Set the readable arguments
    pub fn with_arguments(mut self, arguments: Vec<VariableValue>) -> Self {
        self.arguments = Some(arguments);
        self
    }

    /// Set the readable locals
    pub fn with_locals(mut self, locals: Vec<VariableValue>) -> Self {
        self.locals = Some(locals);
        self
    }
}

#[derive(Debug, Clone)]
struct SandboxBreakpoint {
    id: u32,
    spec: BreakpointSpec,
    hit_count: u32,
}

#[derive(Debug, Clone)]
struct SandboxThread {
    id: u64,
    index_id: u32,
    name: Option<String>,
    queue_name: Option<String>,
    suspended: bool,
    stop_reason: StopReason,
    frames: Vec<SandboxFrame>,
}

#[derive(Debug, Clone)]
struct SandboxProcess {
    pid: u64,
    state: ProcessState,
    byte_order: ByteOrder,
    threads: Vec<SandboxThread>,
    selected_thread: Option<u64>,
}

impl SandboxProcess {
    fn thread_mut(&mut self, id: u64) -> Option<&mut SandboxThread> {
        self.threads.iter_mut().find(|thread| thread.id == id)
    }

    /// Thread that reports the next stop: `preferred` if it exists, else the
    /// selected thread, else the first thread
    fn stopping_thread(&self, preferred: u64) -> Option<u64> {
        let exists = |id: u64| self.threads.iter().any(|thread| thread.id == id);
        if preferred != 0 && exists(preferred) {
            return Some(preferred);
        }
        self.selected_thread.filter(|id| exists(*id)).or_else(|| self.threads.first().map(|t| t.id))
    }
}

#[derive(Debug, Clone, Default)]
struct SandboxTarget {
    executable: Option<String>,
    modules: Vec<String>,
    breakpoints: Vec<SandboxBreakpoint>,
    next_breakpoint_id: u32,
    process: Option<SandboxProcess>,
}

#[derive(Debug, Clone)]
struct SandboxSession {
    id: SessionId,
    prompt: String,
    is_async: bool,
    targets: Vec<SandboxTarget>,
    selected_target: Option<usize>,
}

/// An in-memory [`DebugEngine`]
#[derive(Debug, Clone)]
pub struct SandboxEngine {
    version: String,
    sessions: Vec<SandboxSession>,
    selected_session: Option<SessionId>,
    next_session_id: u64,
}

impl Default for SandboxEngine {
    fn default() -> Self {
        Self::new(format!("m13-sandbox {}", env!("CARGO_PKG_VERSION")))
    }
}

impl SandboxEngine {
    /// An engine with no sessions
    pub fn new(version: impl Into<String>) -> Self {
        Self { version: version.into(), sessions: Vec::new(), selected_session: None, next_session_id: 1 }
    }

    /// An engine with one session describing a small server being debugged.
    ///
    /// Target 0 (`/usr/local/bin/echo-server`, selected) has two modules, two
    /// breakpoints and a stopped process with a `main` and a `worker-1`
    /// thread. Target 1 (`/bin/true`) has no process.
    pub fn demo() -> Self {
        let mut engine = Self::default();
        let session = engine.create_session();

        let Some(server) = engine.create_target(session, Some("/usr/local/bin/echo-server")) else {
            return engine;
        };
        engine.add_module(server, "5C7A1E2B-3D4F-4A6B-8C9D-0E1F2A3B4C5D");
        engine.add_module(server, "A1B2C3D4-E5F6-4789-9ABC-DEF012345678");
        engine.create_breakpoint(server, BreakpointSpec::default());
        engine.create_breakpoint(
            server,
            BreakpointSpec {
                condition: Some("len > 512".to_string()),
                thread_id: 0x1b59,
                enabled: false,
                ..Default::default()
            },
        );

        if let Some(process) = engine.launch(server, 4242) {
            if let Some(main) = engine.add_thread(process, 0x1b58, Some("main"), None) {
                engine.push_frame(main, SandboxFrame::new(0x1000_0a00, 0x7ffe_e000, 0x7ffe_e010, "main"));
                engine.push_frame(
                    main,
                    SandboxFrame::new(0x1000_1f40, 0x7ffe_dfc0, 0x7ffe_dff0, "serve")
                        .with_callee("read_request")
                        .with_arguments(vec![VariableValue {
                            name: "port".to_string(),
                            type_name: "u16".to_string(),
                            value: Some("8080".to_string()),
                        }]),
                );
            }
            if let Some(worker) =
                engine.add_thread(process, 0x1b59, Some("worker-1"), Some("echo.jobs"))
            {
                engine.push_frame(
                    worker,
                    SandboxFrame::new(0x1000_3000, 0x7000_1000, 0x7000_1010, "thread_start"),
                );
                engine.push_frame(
                    worker,
                    SandboxFrame::new(0x1000_2c80, 0x7000_0fc0, 0x7000_0ff0, "poll_jobs"),
                );
            }
        }

        engine.create_target(session, Some("/bin/true"));
        engine.select_target(session, 0);
        engine
    }

    /// Create a debugger instance; the first one becomes the selection
    pub fn create_session(&mut self) -> SessionId {
        let id = SessionId(self.next_session_id);
        self.next_session_id += 1;
        self.sessions.push(SandboxSession {
            id,
            prompt: DEFAULT_PROMPT.to_string(),
            is_async: false,
            targets: Vec::new(),
            selected_target: None,
        });
        self.selected_session.get_or_insert(id);
        id
    }

    /// Create a target and select it
    pub fn create_target(&mut self, session: SessionId, executable: Option<&str>) -> Option<TargetRef> {
        let session_state = self.session_mut(session)?;
        session_state.targets.push(SandboxTarget {
            executable: executable.map(str::to_string),
            next_breakpoint_id: 1,
            ..Default::default()
        });
        let index = session_state.targets.len() - 1;
        session_state.selected_target = Some(index);
        Some(TargetRef { session, index })
    }

    /// Change the selected target
    pub fn select_target(&mut self, session: SessionId, index: usize) -> bool {
        match self.session_mut(session) {
            Some(state) if index < state.targets.len() => {
                state.selected_target = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Record a loaded module
    pub fn add_module(&mut self, target: TargetRef, uuid: &str) -> bool {
        self.target_mut(target).map(|state| state.modules.push(uuid.to_string())).is_some()
    }

    /// Create a breakpoint; ids start at 1 and are never reused within a target
    pub fn create_breakpoint(&mut self, target: TargetRef, spec: BreakpointSpec) -> Option<BreakpointRef> {
        let state = self.target_mut(target)?;
        let id = state.next_breakpoint_id;
        state.next_breakpoint_id += 1;
        state.breakpoints.push(SandboxBreakpoint { id, spec, hit_count: 0 });
        Some(BreakpointRef { target, id })
    }

    /// Create a stopped process for a target that has none running
    pub fn launch(&mut self, target: TargetRef, pid: u64) -> Option<ProcessRef> {
        let state = self.target_mut(target)?;
        if state.process.as_ref().is_some_and(|process| !process.state.is_terminal()) {
            return None;
        }
        state.process = Some(SandboxProcess {
            pid,
            state: ProcessState::Stopped,
            byte_order: ByteOrder::Little,
            threads: Vec::new(),
            selected_thread: None,
        });
        Some(ProcessRef { target })
    }

    /// Add a thread to a process; the first thread becomes the selection
    pub fn add_thread(
        &mut self,
        process: ProcessRef,
        id: u64,
        name: Option<&str>,
        queue_name: Option<&str>,
    ) -> Option<ThreadRef> {
        let state = self.process_mut(process)?;
        if state.threads.iter().any(|thread| thread.id == id) {
            return None;
        }
        state.threads.push(SandboxThread {
            id,
            index_id: state.threads.len() as u32 + 1,
            name: name.map(str::to_string),
            queue_name: queue_name.map(str::to_string),
            suspended: false,
            stop_reason: StopReason::None,
            frames: Vec::new(),
        });
        state.selected_thread.get_or_insert(id);
        Some(ThreadRef { process, id })
    }

    /// Change the selected thread
    pub fn select_thread(&mut self, process: ProcessRef, id: u64) -> bool {
        match self.process_mut(process) {
            Some(state) if state.threads.iter().any(|thread| thread.id == id) => {
                state.selected_thread = Some(id);
                true
            }
            _ => false,
        }
    }

    /// Push a new innermost frame
    pub fn push_frame(&mut self, thread: ThreadRef, frame: SandboxFrame) -> Option<FrameRef> {
        self.thread_mut(thread)?.frames.insert(0, frame);
        Some(FrameRef { thread, index: 0 })
    }

    /// Deliver pending asynchronous events, as the engine's event thread would.
    ///
    /// - launching processes stop at entry
    /// - stepping processes complete their step
    /// - running processes stop at the first enabled breakpoint, or exit when
    ///   there is none
    ///
    /// Returns the number of processes that changed state.
    pub fn pump_events(&mut self) -> usize {
        let mut transitions = 0;

        for session in &mut self.sessions {
            for (index, target) in session.targets.iter_mut().enumerate() {
                let SandboxTarget { breakpoints, process, .. } = target;
                let Some(process) = process.as_mut() else { continue };

                match process.state {
                    ProcessState::Launching => {
                        process.state = ProcessState::Stopped;
                    }
                    ProcessState::Stepping => {
                        process.state = ProcessState::Stopped;
                        if let Some(id) = process.selected_thread {
                            if let Some(thread) = process.thread_mut(id) {
                                thread.stop_reason = StopReason::PlanComplete;
                            }
                        }
                    }
                    ProcessState::Running => {
                        match breakpoints.iter().position(|bp| bp.spec.enabled) {
                            Some(position) => {
                                let breakpoint = &mut breakpoints[position];
                                breakpoint.hit_count += 1;
                                let stopping = process.stopping_thread(breakpoint.spec.thread_id);
                                debug!(
                                    target_index = index,
                                    breakpoint = breakpoint.id,
                                    thread = ?stopping,
                                    "Process stopped at breakpoint"
                                );
                                if breakpoint.spec.one_shot {
                                    breakpoints.remove(position);
                                }

                                process.state = ProcessState::Stopped;
                                if let Some(id) = stopping {
                                    process.selected_thread = Some(id);
                                    if let Some(thread) = process.thread_mut(id) {
                                        thread.stop_reason = StopReason::Breakpoint;
                                    }
                                }
                            }
                            None => {
                                debug!(target_index = index, pid = process.pid, "Process exited");
                                process.state = ProcessState::Exited;
                                process.threads.clear();
                                process.selected_thread = None;
                            }
                        }
                    }
                    _ => continue,
                }
                transitions += 1;
            }
        }

        transitions
    }

    fn session_at(&self, id: SessionId) -> Option<&SandboxSession> {
        self.sessions.iter().find(|session| session.id == id)
    }

    fn session_mut(&mut self, id: SessionId) -> Option<&mut SandboxSession> {
        self.sessions.iter_mut().find(|session| session.id == id)
    }

    fn target_at(&self, target: TargetRef) -> Option<&SandboxTarget> {
        self.session_at(target.session)?.targets.get(target.index)
    }

    fn target_mut(&mut self, target: TargetRef) -> Option<&mut SandboxTarget> {
        self.session_mut(target.session)?.targets.get_mut(target.index)
    }

    fn breakpoint_at(&self, breakpoint: BreakpointRef) -> Option<&SandboxBreakpoint> {
        self.target_at(breakpoint.target)?.breakpoints.iter().find(|bp| bp.id == breakpoint.id)
    }

    fn process_at(&self, process: ProcessRef) -> Option<&SandboxProcess> {
        self.target_at(process.target)?.process.as_ref()
    }

    fn process_mut(&mut self, process: ProcessRef) -> Option<&mut SandboxProcess> {
        self.target_mut(process.target)?.process.as_mut()
    }

    fn thread_at(&self, thread: ThreadRef) -> Option<&SandboxThread> {
        self.process_at(thread.process)?.threads.iter().find(|t| t.id == thread.id)
    }

    fn thread_mut(&mut self, thread: ThreadRef) -> Option<&mut SandboxThread> {
        self.process_mut(thread.process)?.thread_mut(thread.id)
    }

    fn frame_at(&self, frame: FrameRef) -> Option<&SandboxFrame> {
        self.thread_at(frame.thread)?.frames.get(frame.index as usize)
    }

    /// Check that `thread` can be stepped; returns the session's async flag
    fn begin_step(&self, thread: ThreadRef) -> EngineResult<bool> {
        let session = self
            .session_at(thread.process.target.session)
            .ok_or(EngineError::Invalid("debugger"))?;
        let process = self.process_at(thread.process).ok_or(EngineError::Invalid("process"))?;
        if !process.state.is_stopped() {
            return Err(EngineError::InvalidState("Process is not stopped.".to_string()));
        }
        let state = self.thread_at(thread).ok_or(EngineError::Invalid("thread"))?;
        if state.suspended {
            return Err(EngineError::InvalidState("Thread is suspended.".to_string()));
        }
        if state.frames.is_empty() {
            return Err(EngineError::InvalidState("Thread has no frames.".to_string()));
        }
        Ok(session.is_async)
    }

    /// Record a completed (sync) or issued (async) step on `thread`
    fn finish_step(&mut self, thread: ThreadRef, is_async: bool) {
        if let Some(process) = self.process_mut(thread.process) {
            process.selected_thread = Some(thread.id);
            if is_async {
                process.state = ProcessState::Stepping;
            }
        }
        if let Some(state) = self.thread_mut(thread) {
            state.stop_reason = if is_async { StopReason::None } else { StopReason::PlanComplete };
        }
    }

    fn advance_innermost(&mut self, thread: ThreadRef) {
        if let Some(frame) = self.thread_mut(thread).and_then(|state| state.frames.first_mut()) {
            frame.pc = frame.pc.wrapping_add(4);
        }
    }

    fn set_suspended(&mut self, thread: ThreadRef, suspended: bool) -> EngineResult<()> {
        let alive = self.process_at(thread.process).is_some_and(|p| !p.state.is_terminal());
        if !alive {
            return Err(EngineError::Invalid("process"));
        }
        let state = self.thread_mut(thread).ok_or(EngineError::Invalid("thread"))?;
        state.suspended = suspended;
        Ok(())
    }

    fn end_process(&mut self, process: ProcessRef, end_state: ProcessState) -> EngineResult<()> {
        let state = self.process_mut(process).ok_or(EngineError::Invalid("process"))?;
        if state.state.is_terminal() {
            return Err(EngineError::InvalidState("Process has already exited.".to_string()));
        }
        state.state = end_state;
        state.threads.clear();
        state.selected_thread = None;
        Ok(())
    }
}

impl DebugEngine for SandboxEngine {
    fn version(&self) -> String {
        self.version.clone()
    }

    fn sessions(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|session| session.id).collect()
    }

    fn selected_session(&self) -> Option<SessionId> {
        self.selected_session
    }

    fn session(&self, session: SessionId) -> Option<SessionAttrs> {
        let state = self.session_at(session)?;
        Some(SessionAttrs {
            version: self.version.clone(),
            instance_name: format!("debugger_{}", state.id.0),
            prompt: state.prompt.clone(),
            valid: true,
            is_async: state.is_async,
        })
    }

    fn set_prompt(&mut self, session: SessionId, prompt: &str) -> EngineResult<()> {
        let state = self.session_mut(session).ok_or(EngineError::Invalid("debugger"))?;
        state.prompt = prompt.to_string();
        Ok(())
    }

    fn set_async(&mut self, session: SessionId, enabled: bool) -> EngineResult<()> {
        let state = self.session_mut(session).ok_or(EngineError::Invalid("debugger"))?;
        state.is_async = enabled;
        Ok(())
    }

    fn num_targets(&self, session: SessionId) -> usize {
        self.session_at(session).map_or(0, |state| state.targets.len())
    }

    fn selected_target(&self, session: SessionId) -> Option<usize> {
        self.session_at(session)?.selected_target
    }

    fn target(&self, target: TargetRef) -> Option<TargetAttrs> {
        let state = self.target_at(target)?;
        let executable_name = state
            .executable
            .as_deref()
            .map(|path| path.rsplit('/').next().unwrap_or(path).to_string());
        Some(TargetAttrs { valid: true, executable_path: state.executable.clone(), executable_name })
    }

    fn breakpoint_ids(&self, target: TargetRef) -> Vec<u32> {
        self.target_at(target).map_or_else(Vec::new, |state| {
            state.breakpoints.iter().map(|bp| bp.id).collect()
        })
    }

    fn module_uuids(&self, target: TargetRef) -> Vec<String> {
        self.target_at(target).map_or_else(Vec::new, |state| state.modules.clone())
    }

    fn breakpoint(&self, breakpoint: BreakpointRef) -> Option<BreakpointAttrs> {
        let state = self.breakpoint_at(breakpoint)?;
        Some(BreakpointAttrs {
            valid: true,
            enabled: state.spec.enabled,
            one_shot: state.spec.one_shot,
            internal: state.spec.internal,
            hit_count: state.hit_count,
            condition: state.spec.condition.clone(),
            thread_id: state.spec.thread_id,
        })
    }

    fn set_breakpoint_enabled(
        &mut self,
        breakpoint: BreakpointRef,
        enabled: bool,
    ) -> EngineResult<()> {
        let state = self
            .target_mut(breakpoint.target)
            .and_then(|target| target.breakpoints.iter_mut().find(|bp| bp.id == breakpoint.id))
            .ok_or(EngineError::Invalid("breakpoint"))?;
        state.spec.enabled = enabled;
        Ok(())
    }

    fn process(&self, process: ProcessRef) -> Option<ProcessAttrs> {
        let state = self.process_at(process)?;
        Some(ProcessAttrs { pid: state.pid, state: state.state, byte_order: state.byte_order })
    }

    fn continue_process(&mut self, process: ProcessRef) -> EngineResult<()> {
        let state = self.process_mut(process).ok_or(EngineError::Invalid("process"))?;
        if !state.state.is_stopped() {
            return Err(EngineError::InvalidState("Process is not stopped.".to_string()));
        }
        state.state = ProcessState::Running;
        for thread in &mut state.threads {
            thread.stop_reason = StopReason::None;
        }
        Ok(())
    }

    fn stop_process(&mut self, process: ProcessRef) -> EngineResult<()> {
        let state = self.process_mut(process).ok_or(EngineError::Invalid("process"))?;
        if !state.state.is_running() {
            return Err(EngineError::InvalidState("Process is not running.".to_string()));
        }
        state.state = ProcessState::Stopped;
        if let Some(id) = state.stopping_thread(0) {
            state.selected_thread = Some(id);
            if let Some(thread) = state.thread_mut(id) {
                thread.stop_reason = StopReason::Signal;
            }
        }
        Ok(())
    }

    fn kill_process(&mut self, process: ProcessRef) -> EngineResult<()> {
        self.end_process(process, ProcessState::Exited)
    }

    fn detach_process(&mut self, process: ProcessRef) -> EngineResult<()> {
        self.end_process(process, ProcessState::Detached)
    }

    fn thread_ids(&self, process: ProcessRef) -> Vec<u64> {
        self.process_at(process)
            .map_or_else(Vec::new, |state| state.threads.iter().map(|t| t.id).collect())
    }

    fn selected_thread(&self, process: ProcessRef) -> Option<u64> {
        self.process_at(process)?.selected_thread
    }

    fn thread(&self, thread: ThreadRef) -> Option<ThreadAttrs> {
        let state = self.thread_at(thread)?;
        Some(ThreadAttrs {
            index_id: state.index_id,
            name: state.name.clone(),
            queue_name: state.queue_name.clone(),
            suspended: state.suspended,
            stop_reason: state.stop_reason,
        })
    }

    fn step_over(&mut self, thread: ThreadRef) -> EngineResult<()> {
        let is_async = self.begin_step(thread)?;
        self.advance_innermost(thread);
        self.finish_step(thread, is_async);
        Ok(())
    }

    fn step_into(&mut self, thread: ThreadRef) -> EngineResult<()> {
        let is_async = self.begin_step(thread)?;
        let entered = self.thread_mut(thread).and_then(|state| {
            let caller = state.frames.first_mut()?;
            let callee = caller.callee.take()?;
            let frame = SandboxFrame::new(
                caller.pc.wrapping_add(0x1000) & !0xf,
                caller.sp.wrapping_sub(0x40),
                caller.sp.wrapping_sub(0x10),
                &callee,
            );
            state.frames.insert(0, frame);
            Some(())
        });
        // Nothing to enter on this line: behaves like a step over.
        if entered.is_none() {
            self.advance_innermost(thread);
        }
        self.finish_step(thread, is_async);
        Ok(())
    }

    fn step_out(&mut self, thread: ThreadRef) -> EngineResult<()> {
        let is_async = self.begin_step(thread)?;
        let state = self.thread_mut(thread).ok_or(EngineError::Invalid("thread"))?;
        if state.frames.len() < 2 {
            return Err(EngineError::InvalidState(
                "Unable to step out of the outermost frame.".to_string(),
            ));
        }
        state.frames.remove(0);
        self.advance_innermost(thread);
        self.finish_step(thread, is_async);
        Ok(())
    }

    fn suspend_thread(&mut self, thread: ThreadRef) -> EngineResult<()> {
        self.set_suspended(thread, true)
    }

    fn resume_thread(&mut self, thread: ThreadRef) -> EngineResult<()> {
        self.set_suspended(thread, false)
    }

    fn num_frames(&self, thread: ThreadRef) -> usize {
        self.thread_at(thread).map_or(0, |state| state.frames.len())
    }

    fn selected_frame(&self, thread: ThreadRef) -> Option<u32> {
        self.thread_at(thread).filter(|state| !state.frames.is_empty()).map(|_| 0)
    }

    fn frame(&self, frame: FrameRef) -> Option<FrameAttrs> {
        let state = self.frame_at(frame)?;
        Some(FrameAttrs {
            pc: state.pc,
            sp: state.sp,
            fp: state.fp,
            function_name: state.function_name.clone(),
            inlined: state.inlined,
        })
    }

    fn register_groups(&self, frame: FrameRef) -> Vec<RegisterGroup> {
        let Some(state) = self.frame_at(frame) else { return Vec::new() };
        let register = |name: &str, value: u64| RegisterValue { name: name.to_string(), value };

        vec![
            RegisterGroup {
                name: "General Purpose Registers".to_string(),
                registers: vec![
                    register("rip", state.pc),
                    register("rsp", state.sp),
                    register("rbp", state.fp),
                ],
            },
            RegisterGroup {
                name: "Floating Point Registers".to_string(),
                registers: vec![register("fctrl", 0x37f), register("fstat", 0)],
            },
            RegisterGroup {
                name: "Exception State Registers".to_string(),
                registers: vec![register("trapno", 3), register("err", 0)],
            },
        ]
    }

    fn variables(&self, frame: FrameRef, scope: VariableScope) -> EngineResult<Vec<VariableValue>> {
        let state = self.frame_at(frame).ok_or(EngineError::Invalid("frame"))?;
        let variables = match scope {
            VariableScope::Arguments => &state.arguments,
            VariableScope::Locals => &state.locals,
            VariableScope::Statics => &state.statics,
        };
        variables.clone().ok_or(EngineError::Unsupported("Variable inspection"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_process(engine: &SandboxEngine) -> ProcessRef {
        let session = engine.selected_session().unwrap();
        ProcessRef { target: TargetRef { session, index: 0 } }
    }

    #[test]
    fn test_demo_layout() {
        let engine = SandboxEngine::demo();
        let session = engine.selected_session().unwrap();

        assert_eq!(engine.num_targets(session), 2);
        assert_eq!(engine.selected_target(session), Some(0));

        let process = demo_process(&engine);
        assert_eq!(engine.thread_ids(process), vec![0x1b58, 0x1b59]);
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Stopped);
        assert!(engine.process(ProcessRef { target: TargetRef { session, index: 1 } }).is_none());
    }

    #[test]
    fn test_continue_then_pump_stops_at_enabled_breakpoint() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);

        engine.continue_process(process).unwrap();
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Running);

        assert_eq!(engine.pump_events(), 1);
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Stopped);

        let breakpoint = BreakpointRef { target: process.target, id: 1 };
        assert_eq!(engine.breakpoint(breakpoint).unwrap().hit_count, 1);

        let selected = engine.selected_thread(process).unwrap();
        let thread = engine.thread(ThreadRef { process, id: selected }).unwrap();
        assert_eq!(thread.stop_reason, StopReason::Breakpoint);
    }

    #[test]
    fn test_running_process_without_breakpoints_exits() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        engine.set_breakpoint_enabled(BreakpointRef { target: process.target, id: 1 }, false).unwrap();

        engine.continue_process(process).unwrap();
        engine.pump_events();

        assert_eq!(engine.process(process).unwrap().state, ProcessState::Exited);
        assert!(engine.thread_ids(process).is_empty());
    }

    #[test]
    fn test_failed_control_leaves_state_unchanged() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);

        let err = engine.stop_process(process).unwrap_err();
        assert_eq!(err, EngineError::InvalidState("Process is not running.".to_string()));
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Stopped);

        engine.kill_process(process).unwrap();
        assert!(engine.kill_process(process).is_err());
        assert!(engine.continue_process(process).is_err());
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Exited);
    }

    #[test]
    fn test_steps_move_frames() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        let main = ThreadRef { process, id: 0x1b58 };
        let innermost = FrameRef { thread: main, index: 0 };
        let pc = engine.frame(innermost).unwrap().pc;

        engine.step_over(main).unwrap();
        assert_eq!(engine.frame(innermost).unwrap().pc, pc + 4);

        engine.step_into(main).unwrap();
        assert_eq!(engine.num_frames(main), 3);
        assert_eq!(engine.frame(innermost).unwrap().function_name.as_deref(), Some("read_request"));

        engine.step_out(main).unwrap();
        assert_eq!(engine.num_frames(main), 2);
        assert_eq!(engine.frame(innermost).unwrap().pc, pc + 8);

        engine.step_out(main).unwrap();
        assert!(engine.step_out(main).is_err());
    }

    #[test]
    fn test_async_step_completes_on_pump() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        engine.set_async(process.target.session, true).unwrap();

        let worker = ThreadRef { process, id: 0x1b59 };
        engine.step_over(worker).unwrap();
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Stepping);

        engine.pump_events();
        assert_eq!(engine.process(process).unwrap().state, ProcessState::Stopped);
        assert_eq!(engine.thread(worker).unwrap().stop_reason, StopReason::PlanComplete);
    }

    #[test]
    fn test_suspended_thread_cannot_step() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        let worker = ThreadRef { process, id: 0x1b59 };

        engine.suspend_thread(worker).unwrap();
        assert!(engine.thread(worker).unwrap().suspended);
        assert!(engine.step_over(worker).is_err());

        engine.resume_thread(worker).unwrap();
        assert!(engine.step_over(worker).is_ok());
    }

    #[test]
    fn test_one_shot_breakpoint_is_removed_after_hit() {
        let mut engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        engine.set_breakpoint_enabled(BreakpointRef { target: process.target, id: 1 }, false).unwrap();
        let once = engine
            .create_breakpoint(process.target, BreakpointSpec { one_shot: true, ..Default::default() })
            .unwrap();

        engine.continue_process(process).unwrap();
        engine.pump_events();

        assert!(engine.breakpoint(once).is_none());
        assert_eq!(engine.breakpoint_ids(process.target), vec![1, 2]);
    }

    #[test]
    fn test_variables_default_to_unsupported() {
        let engine = SandboxEngine::demo();
        let process = demo_process(&engine);
        let frame = FrameRef { thread: ThreadRef { process, id: 0x1b58 }, index: 0 };

        assert_eq!(engine.variables(frame, VariableScope::Arguments).unwrap().len(), 1);
        assert_eq!(
            engine.variables(frame, VariableScope::Locals),
            Err(EngineError::Unsupported("Variable inspection"))
        );
    }
}
