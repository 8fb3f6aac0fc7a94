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

//! Resource resolution.
//!
//! Turns URL path segments into engine references. Every level accepts the
//! literal `selected` or an integer in decimal or `0x` hexadecimal. Targets
//! and frames are positional, sessions, threads and breakpoints are looked up
//! by engine id. Anything that does not resolve is a
//! [`FacadeError::NotFound`] for the level that failed.

use std::str::FromStr;

use m13_common::types::hex_id;

use crate::{
    adapter::{BreakpointRef, DebugEngine, FrameRef, ProcessRef, SessionId, TargetRef, ThreadRef},
    error::{FacadeError, FacadeResult, ResourceKind},
};

/// Sentinel segment naming the engine's current selection
pub const SELECTED: &str = "selected";

/// A parsed path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The current selection at this level
    Selected,
    /// An explicit index or id
    Id(u64),
}

impl FromStr for Selector {
    type Err = ();

    fn from_str(segment: &str) -> Result<Self, Self::Err> {
        if segment == SELECTED {
            return Ok(Self::Selected);
        }
        hex_id::parse(segment).map(Self::Id).ok_or(())
    }
}

fn selector(segment: &str, kind: ResourceKind) -> FacadeResult<Selector> {
    segment.parse().map_err(|_| FacadeError::NotFound(kind))
}

/// Resolves path segments against one engine
#[derive(Debug)]
pub struct Resolver<'a, E: ?Sized> {
    engine: &'a E,
}

impl<'a, E: DebugEngine + ?Sized> Resolver<'a, E> {
    /// Resolve against `engine`
    pub fn new(engine: &'a E) -> Self {
        Self { engine }
    }

    /// Resolve a session; `None` means the selected one
    pub fn session(&self, segment: Option<&str>) -> FacadeResult<SessionId> {
        let not_found = FacadeError::NotFound(ResourceKind::Debugger);
        let id = match segment.map(|s| selector(s, ResourceKind::Debugger)).transpose()? {
            None | Some(Selector::Selected) => self.engine.selected_session().ok_or(not_found)?,
            Some(Selector::Id(id)) => SessionId(id),
        };
        if !self.engine.sessions().contains(&id) {
            return Err(FacadeError::NotFound(ResourceKind::Debugger));
        }
        Ok(id)
    }

    /// Resolve a target of the selected session
    pub fn target(&self, segment: &str) -> FacadeResult<TargetRef> {
        let not_found = || FacadeError::NotFound(ResourceKind::Target);
        let session = self.session(None).map_err(|_| not_found())?;
        let index = match selector(segment, ResourceKind::Target)? {
            Selector::Selected => self.engine.selected_target(session).ok_or_else(not_found)?,
            Selector::Id(index) => usize::try_from(index).map_err(|_| not_found())?,
        };
        if index >= self.engine.num_targets(session) {
            return Err(not_found());
        }
        let target = TargetRef { session, index };
        self.engine.target(target).ok_or_else(not_found)?;
        Ok(target)
    }

    /// Resolve the process of a target
    pub fn process(&self, target_segment: &str) -> FacadeResult<ProcessRef> {
        let target = self.target(target_segment)?;
        let process = ProcessRef { target };
        if self.engine.process(process).is_none() {
            return Err(FacadeError::NotFound(ResourceKind::Process));
        }
        Ok(process)
    }

    /// Resolve a thread of a target's process
    pub fn thread(&self, target_segment: &str, thread_segment: &str) -> FacadeResult<ThreadRef> {
        let process = self.process(target_segment)?;
        let not_found = || FacadeError::NotFound(ResourceKind::Thread);
        let id = match selector(thread_segment, ResourceKind::Thread)? {
            Selector::Selected => self.engine.selected_thread(process).ok_or_else(not_found)?,
            Selector::Id(id) => id,
        };
        let thread = ThreadRef { process, id };
        self.engine.thread(thread).ok_or_else(not_found)?;
        Ok(thread)
    }

    /// Resolve a stack frame of a thread
    pub fn frame(
        &self,
        target_segment: &str,
        thread_segment: &str,
        frame_segment: &str,
    ) -> FacadeResult<FrameRef> {
        let thread = self.thread(target_segment, thread_segment)?;
        let not_found = || FacadeError::NotFound(ResourceKind::Frame);
        let index = match selector(frame_segment, ResourceKind::Frame)? {
            Selector::Selected => self.engine.selected_frame(thread).ok_or_else(not_found)?,
            Selector::Id(index) => u32::try_from(index).map_err(|_| not_found())?,
        };
        let frame = FrameRef { thread, index };
        self.engine.frame(frame).ok_or_else(not_found)?;
        Ok(frame)
    }

    /// Resolve a breakpoint of a target by id
    pub fn breakpoint(
        &self,
        target_segment: &str,
        breakpoint_segment: &str,
    ) -> FacadeResult<BreakpointRef> {
        let target = self.target(target_segment)?;
        let not_found = || FacadeError::NotFound(ResourceKind::Breakpoint);
        // Breakpoints have no selection.
        let id = match selector(breakpoint_segment, ResourceKind::Breakpoint)? {
            Selector::Selected => return Err(not_found()),
            Selector::Id(id) => u32::try_from(id).map_err(|_| not_found())?,
        };
        let breakpoint = BreakpointRef { target, id };
        self.engine.breakpoint(breakpoint).ok_or_else(not_found)?;
        Ok(breakpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SandboxEngine;

    #[test]
    fn test_selector_parsing() {
        assert_eq!("selected".parse::<Selector>(), Ok(Selector::Selected));
        assert_eq!("12".parse::<Selector>(), Ok(Selector::Id(12)));
        assert_eq!("0x1b58".parse::<Selector>(), Ok(Selector::Id(0x1b58)));
        assert_eq!("Selected".parse::<Selector>(), Err(()));
        assert_eq!("-1".parse::<Selector>(), Err(()));
        assert_eq!("abc".parse::<Selector>(), Err(()));
    }

    #[test]
    fn test_selected_and_index_agree() {
        let engine = SandboxEngine::demo();
        let resolver = Resolver::new(&engine);

        assert_eq!(resolver.target("selected").unwrap(), resolver.target("0").unwrap());
        assert_eq!(resolver.session(Some("0x1")).unwrap(), resolver.session(None).unwrap());
        assert_eq!(
            resolver.thread("0", "selected").unwrap(),
            resolver.thread("0", "7000").unwrap()
        );
    }

    #[test]
    fn test_failures_name_the_level() {
        let engine = SandboxEngine::demo();
        let resolver = Resolver::new(&engine);

        let kind = |result: FacadeError| match result {
            FacadeError::NotFound(kind) => kind,
            other => panic!("unexpected error: {other}"),
        };

        assert_eq!(kind(resolver.session(Some("0x99")).unwrap_err()), ResourceKind::Debugger);
        assert_eq!(kind(resolver.target("7").unwrap_err()), ResourceKind::Target);
        assert_eq!(kind(resolver.target("x").unwrap_err()), ResourceKind::Target);
        assert_eq!(kind(resolver.process("1").unwrap_err()), ResourceKind::Process);
        assert_eq!(kind(resolver.thread("0", "1").unwrap_err()), ResourceKind::Thread);
        assert_eq!(kind(resolver.thread("9", "1").unwrap_err()), ResourceKind::Target);
        assert_eq!(kind(resolver.frame("0", "selected", "5").unwrap_err()), ResourceKind::Frame);
        assert_eq!(kind(resolver.breakpoint("0", "99").unwrap_err()), ResourceKind::Breakpoint);
        assert_eq!(
            kind(resolver.breakpoint("0", "selected").unwrap_err()),
            ResourceKind::Breakpoint
        );
    }

    #[test]
    fn test_frame_selected_is_innermost() {
        let engine = SandboxEngine::demo();
        let resolver = Resolver::new(&engine);

        let frame = resolver.frame("selected", "selected", "selected").unwrap();
        assert_eq!(frame.index, 0);
        assert_eq!(frame.thread.id, 0x1b58);
    }
}
