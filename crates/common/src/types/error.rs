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

/// In-body error document: `{"error": {"message": "..."}}`.
///
/// Logical failures are always delivered with HTTP 200 and this body;
/// clients test for the presence of the `error` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error detail
    pub error: ErrorMessage,
}

/// Human-readable error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    /// Message shown to the client, e.g. `Unknown action.`
    pub message: String,
}

impl ErrorBody {
    /// Create an error body carrying `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: ErrorMessage { message: message.into() } }
    }

    /// The carried message
    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Document returned by `/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSnapshot {
    /// Version string reported by the debugging engine
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody::new("Unknown action.")).unwrap();
        assert_eq!(body, serde_json::json!({"error": {"message": "Unknown action."}}));
    }
}
