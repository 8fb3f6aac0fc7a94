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

//! Action verbs.
//!
//! Each resource that can be acted on has a closed set of verbs. A verb token
//! parses into its enum or fails with [`FacadeError::UnknownAction`], and
//! every variant calls exactly one engine method.

use std::str::FromStr;

use crate::{
    adapter::{BreakpointRef, DebugEngine, EngineResult, ProcessRef, SessionId, ThreadRef},
    error::FacadeError,
};

/// Verbs on `/target/{idx}/process/{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessAction {
    /// Resume execution
    Continue,
    /// Interrupt execution
    Stop,
    /// Terminate the process
    Kill,
    /// Release the process
    Detach,
}

impl FromStr for ProcessAction {
    type Err = FacadeError;

    fn from_str(verb: &str) -> Result<Self, Self::Err> {
        match verb {
            "continue" => Ok(Self::Continue),
            "stop" => Ok(Self::Stop),
            "kill" => Ok(Self::Kill),
            "detach" => Ok(Self::Detach),
            _ => Err(FacadeError::UnknownAction),
        }
    }
}

impl ProcessAction {
    /// Issue the action
    pub fn apply<E: DebugEngine + ?Sized>(self, engine: &mut E, process: ProcessRef) -> EngineResult<()> {
        match self {
            Self::Continue => engine.continue_process(process),
            Self::Stop => engine.stop_process(process),
            Self::Kill => engine.kill_process(process),
            Self::Detach => engine.detach_process(process),
        }
    }
}

/// Verbs on `/target/{idx}/thread/{thread_id}/{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadAction {
    /// Step over the current line
    StepOver,
    /// Step into the call on the current line
    StepInto,
    /// Finish the current function
    StepOut,
    /// Keep the thread suspended
    Suspend,
    /// Release a suspended thread
    Resume,
}

impl FromStr for ThreadAction {
    type Err = FacadeError;

    fn from_str(verb: &str) -> Result<Self, Self::Err> {
        match verb {
            "step_over" => Ok(Self::StepOver),
            "step_into" => Ok(Self::StepInto),
            "step_out" => Ok(Self::StepOut),
            "suspend" => Ok(Self::Suspend),
            "resume" => Ok(Self::Resume),
            _ => Err(FacadeError::UnknownAction),
        }
    }
}

impl ThreadAction {
    /// Issue the action
    pub fn apply<E: DebugEngine + ?Sized>(self, engine: &mut E, thread: ThreadRef) -> EngineResult<()> {
        match self {
            Self::StepOver => engine.step_over(thread),
            Self::StepInto => engine.step_into(thread),
            Self::StepOut => engine.step_out(thread),
            Self::Suspend => engine.suspend_thread(thread),
            Self::Resume => engine.resume_thread(thread),
        }
    }
}

/// Verbs on `/target/{idx}/breakpoints/{breakpoint_id}/{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakpointAction {
    /// Flip the enabled flag
    ToggleEnabled,
}

impl FromStr for BreakpointAction {
    type Err = FacadeError;

    fn from_str(verb: &str) -> Result<Self, Self::Err> {
        match verb {
            "enable" => Ok(Self::ToggleEnabled),
            _ => Err(FacadeError::UnknownAction),
        }
    }
}

impl BreakpointAction {
    /// Issue the action
    pub fn apply<E: DebugEngine + ?Sized>(
        self,
        engine: &mut E,
        breakpoint: BreakpointRef,
    ) -> EngineResult<()> {
        match self {
            Self::ToggleEnabled => {
                let enabled = engine.breakpoint(breakpoint).is_some_and(|attrs| attrs.enabled);
                engine.set_breakpoint_enabled(breakpoint, !enabled)
            }
        }
    }
}

/// Verbs on `/debugger/{action}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionAction {
    /// Replace the prompt with the given text
    SetPrompt(String),
    /// Flip the asynchronous execution flag
    ToggleAsync,
}

impl SessionAction {
    /// Parse a verb token; `prompt` is the submitted form field, if any
    pub fn parse(verb: &str, prompt: Option<String>) -> Result<Self, FacadeError> {
        match verb {
            "prompt" => prompt.map(Self::SetPrompt).ok_or(FacadeError::MissingField("prompt")),
            "async" => Ok(Self::ToggleAsync),
            _ => Err(FacadeError::UnknownAction),
        }
    }

    /// Issue the action
    pub fn apply<E: DebugEngine + ?Sized>(self, engine: &mut E, session: SessionId) -> EngineResult<()> {
        match self {
            Self::SetPrompt(prompt) => engine.set_prompt(session, &prompt),
            Self::ToggleAsync => {
                let is_async = engine.session(session).is_some_and(|attrs| attrs.is_async);
                engine.set_async(session, !is_async)
            }
        }
    }
}
