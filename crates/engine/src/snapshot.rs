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

//! Snapshot construction.
//!
//! Walks resolved references and copies what the engine reports into the
//! owned snapshot types of [`m13_common::types`]. Nothing here keeps a
//! reference into the engine, so the results can be serialized after the
//! engine lock is released.
//!
//! Depth differs per resource:
//!
//! - a session embeds all of its targets
//! - a target lists breakpoint ids and module UUIDs only
//! - a process lists thread ids only
//! - a thread embeds every frame

use m13_common::types::{
    BreakpointSnapshot, FrameSnapshot, ProcessSnapshot, RegisterValue, SessionSnapshot,
    TargetSnapshot, ThreadSnapshot, VariableValue,
};

use crate::{
    adapter::{
        BreakpointRef, DebugEngine, FrameRef, ProcessRef, SessionId, TargetRef, ThreadRef,
        VariableScope,
    },
    error::{FacadeError, FacadeResult, ResourceKind},
};

/// Register group embedded in frame snapshots, matched case-insensitively
/// as a substring of the engine's group names
pub const GENERAL_PURPOSE: &str = "general purpose";

/// Snapshot a session and every target it owns
pub fn session_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    session: SessionId,
) -> FacadeResult<SessionSnapshot> {
    let attrs = engine.session(session).ok_or(FacadeError::NotFound(ResourceKind::Debugger))?;
    let targets = (0..engine.num_targets(session))
        .filter_map(|index| target_snapshot(engine, TargetRef { session, index }).ok())
        .collect();

    Ok(SessionSnapshot {
        id: session.0,
        version: attrs.version,
        instance_name: attrs.instance_name,
        prompt: attrs.prompt,
        valid: attrs.valid,
        is_async: attrs.is_async,
        targets,
    })
}

/// Snapshot a target
pub fn target_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    target: TargetRef,
) -> FacadeResult<TargetSnapshot> {
    let attrs = engine.target(target).ok_or(FacadeError::NotFound(ResourceKind::Target))?;
    Ok(TargetSnapshot {
        index: target.index,
        valid: attrs.valid,
        debugger_id: target.session.0,
        executable_path: attrs.executable_path,
        executable_name: attrs.executable_name,
        breakpoints: engine.breakpoint_ids(target),
        modules: engine.module_uuids(target),
    })
}

/// Snapshot one breakpoint
pub fn breakpoint_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    breakpoint: BreakpointRef,
) -> FacadeResult<BreakpointSnapshot> {
    let attrs =
        engine.breakpoint(breakpoint).ok_or(FacadeError::NotFound(ResourceKind::Breakpoint))?;
    Ok(BreakpointSnapshot {
        id: breakpoint.id,
        valid: attrs.valid,
        enabled: attrs.enabled,
        one_shot: attrs.one_shot,
        internal: attrs.internal,
        hit_count: attrs.hit_count,
        condition: attrs.condition,
        thread_id: attrs.thread_id,
    })
}

/// Snapshot every breakpoint of a target, in engine order
pub fn breakpoint_snapshots<E: DebugEngine + ?Sized>(
    engine: &E,
    target: TargetRef,
) -> Vec<BreakpointSnapshot> {
    engine
        .breakpoint_ids(target)
        .into_iter()
        .filter_map(|id| breakpoint_snapshot(engine, BreakpointRef { target, id }).ok())
        .collect()
}

/// Snapshot a process
pub fn process_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    process: ProcessRef,
) -> FacadeResult<ProcessSnapshot> {
    let attrs = engine.process(process).ok_or(FacadeError::NotFound(ResourceKind::Process))?;
    Ok(ProcessSnapshot {
        id: attrs.pid,
        state: attrs.state,
        byte_order: attrs.byte_order,
        threads: engine.thread_ids(process),
        selected_thread: engine.selected_thread(process),
    })
}

/// Snapshot a thread with its full call stack
pub fn thread_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    thread: ThreadRef,
) -> FacadeResult<ThreadSnapshot> {
    let attrs = engine.thread(thread).ok_or(FacadeError::NotFound(ResourceKind::Thread))?;
    let frames = (0..engine.num_frames(thread))
        .filter_map(|index| u32::try_from(index).ok())
        .filter_map(|index| frame_snapshot(engine, FrameRef { thread, index }).ok())
        .collect();

    Ok(ThreadSnapshot {
        id: thread.id,
        index_id: attrs.index_id,
        name: attrs.name,
        queue_name: attrs.queue_name,
        suspended: attrs.suspended,
        stop_reason: attrs.stop_reason,
        frames,
    })
}

/// Snapshot one stack frame
pub fn frame_snapshot<E: DebugEngine + ?Sized>(
    engine: &E,
    frame: FrameRef,
) -> FacadeResult<FrameSnapshot> {
    let attrs = engine.frame(frame).ok_or(FacadeError::NotFound(ResourceKind::Frame))?;
    Ok(FrameSnapshot {
        id: frame.index,
        pc: attrs.pc,
        sp: attrs.sp,
        fp: attrs.fp,
        function_name: attrs.function_name,
        inlined: attrs.inlined,
        registers: registers(engine, frame, GENERAL_PURPOSE),
        arguments: variables(engine, frame, VariableScope::Arguments),
        locals: variables(engine, frame, VariableScope::Locals),
        statics: variables(engine, frame, VariableScope::Statics),
    })
}

/// Registers of the first group whose name contains `kind`, ignoring case
fn registers<E: DebugEngine + ?Sized>(
    engine: &E,
    frame: FrameRef,
    kind: &str,
) -> Vec<RegisterValue> {
    let kind = kind.to_lowercase();
    engine
        .register_groups(frame)
        .into_iter()
        .find(|group| group.name.to_lowercase().contains(&kind))
        .map(|group| group.registers)
        .unwrap_or_default()
}

/// Variables in `scope`; an engine without the capability yields an empty list
fn variables<E: DebugEngine + ?Sized>(
    engine: &E,
    frame: FrameRef,
    scope: VariableScope,
) -> Vec<VariableValue> {
    engine.variables(frame, scope).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolve::Resolver, SandboxEngine};

    #[test]
    fn test_session_embeds_targets() {
        let engine = SandboxEngine::demo();
        let session = Resolver::new(&engine).session(None).unwrap();

        let snapshot = session_snapshot(&engine, session).unwrap();
        assert_eq!(snapshot.instance_name, "debugger_1");
        assert_eq!(snapshot.targets.len(), 2);
        assert_eq!(snapshot.targets[0].breakpoints, vec![1, 2]);
        assert_eq!(snapshot.targets[1].executable_name.as_deref(), Some("true"));
        assert!(snapshot.targets.iter().all(|t| t.debugger_id == 1));
    }

    #[test]
    fn test_frame_carries_general_purpose_registers_only() {
        let engine = SandboxEngine::demo();
        let frame = Resolver::new(&engine).frame("0", "selected", "0").unwrap();

        let snapshot = frame_snapshot(&engine, frame).unwrap();
        let names: Vec<_> = snapshot.registers.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["rip", "rsp", "rbp"]);
        assert_eq!(snapshot.registers[0].value, snapshot.pc);
    }

    #[test]
    fn test_unsupported_variables_render_empty() {
        let engine = SandboxEngine::demo();
        let frame = Resolver::new(&engine).frame("0", "selected", "0").unwrap();

        let snapshot = frame_snapshot(&engine, frame).unwrap();
        assert_eq!(snapshot.arguments.len(), 1);
        assert!(snapshot.locals.is_empty());
        assert!(snapshot.statics.is_empty());
    }

    #[test]
    fn test_thread_frames_are_innermost_first() {
        let engine = SandboxEngine::demo();
        let thread = Resolver::new(&engine).thread("0", "0x1b58").unwrap();

        let snapshot = thread_snapshot(&engine, thread).unwrap();
        let ids: Vec<_> = snapshot.frames.iter().map(|f| f.id).collect();
        assert_eq!(ids, [0, 1]);
        assert_eq!(snapshot.frames[1].function_name.as_deref(), Some("main"));
    }

    #[test]
    fn test_process_lists_thread_ids() {
        let engine = SandboxEngine::demo();
        let process = Resolver::new(&engine).process("0").unwrap();

        let snapshot = process_snapshot(&engine, process).unwrap();
        assert_eq!(snapshot.id, 4242);
        assert_eq!(snapshot.threads, vec![0x1b58, 0x1b59]);
        assert_eq!(snapshot.selected_thread, Some(0x1b58));
    }
}
