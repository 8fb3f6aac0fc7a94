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

//! Facade error taxonomy.
//!
//! Every variant is a logical failure that ends up as an in-body
//! [`ErrorBody`]; none of them is a transport failure.

use std::fmt;

use m13_common::types::ErrorBody;
use thiserror::Error;

use crate::adapter::EngineError;

/// Result of a facade operation
pub type FacadeResult<T> = Result<T, FacadeError>;

/// Kind of resource a path segment failed to resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A debugger instance
    Debugger,
    /// A target
    Target,
    /// A process
    Process,
    /// A thread
    Thread,
    /// A stack frame
    Frame,
    /// A breakpoint
    Breakpoint,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debugger => "debugger",
            Self::Target => "target",
            Self::Process => "process",
            Self::Thread => "thread",
            Self::Frame => "frame",
            Self::Breakpoint => "breakpoint",
        };
        f.write_str(name)
    }
}

/// Failures of the resolve, act and snapshot pipeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacadeError {
    /// A path segment did not resolve
    #[error("Unable to find {0}.")]
    NotFound(ResourceKind),
    /// The verb is not one the resource understands
    #[error("Unknown action.")]
    UnknownAction,
    /// A required form field was absent
    #[error("Missing required field '{0}'.")]
    MissingField(&'static str),
    /// The engine refused a control operation
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl FacadeError {
    /// Convert into the JSON error document sent to clients
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody::new(self.to_string())
    }
}

impl From<FacadeError> for ErrorBody {
    fn from(error: FacadeError) -> Self {
        error.to_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_messages() {
        let expected = [
            (ResourceKind::Debugger, "Unable to find debugger."),
            (ResourceKind::Target, "Unable to find target."),
            (ResourceKind::Process, "Unable to find process."),
            (ResourceKind::Thread, "Unable to find thread."),
            (ResourceKind::Frame, "Unable to find frame."),
            (ResourceKind::Breakpoint, "Unable to find breakpoint."),
        ];
        for (kind, message) in expected {
            assert_eq!(FacadeError::NotFound(kind).to_string(), message);
        }
    }

    #[test]
    fn test_engine_message_passes_through() {
        let error: FacadeError =
            EngineError::InvalidState("Process is not stopped.".to_string()).into();
        assert_eq!(error.to_body().message(), "Process is not stopped.");
        assert_eq!(FacadeError::UnknownAction.to_body().message(), "Unknown action.");
    }
}
