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

use super::{hex_id, TargetSnapshot};

/// Point-in-time copy of one debugger instance.
///
/// A session snapshot embeds the snapshot of every target it owns, so it is
/// the most expensive resource to produce: one walk over all targets with
/// their breakpoint and module lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Debugger instance id, rendered as `0x...`
    #[serde(with = "hex_id")]
    pub id: u64,
    /// Engine version string
    pub version: String,
    /// Instance name, e.g. `debugger_1`
    pub instance_name: String,
    /// Current command prompt
    pub prompt: String,
    /// Whether the debugger instance is still valid
    pub valid: bool,
    /// Whether the engine runs commands asynchronously
    #[serde(rename = "async")]
    pub is_async: bool,
    /// Every target owned by this session, in engine order
    pub targets: Vec<TargetSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_hex_and_async_is_renamed() {
        let snapshot = SessionSnapshot {
            id: 26,
            version: "lldb-1500".to_string(),
            instance_name: "debugger_26".to_string(),
            prompt: "(lldb) ".to_string(),
            valid: true,
            is_async: false,
            targets: vec![],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["id"], "0x1a");
        assert_eq!(value["async"], false);
        assert!(value.get("is_async").is_none());

        let back: SessionSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, snapshot);
    }
}
