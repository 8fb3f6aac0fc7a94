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

//! Network presence advertisement.
//!
//! Once the listener is confirmed ready, m13 tells an optional registry where
//! to find it. The registry is a JSON-RPC endpoint that accepts
//! `m13_register` with `[pid, port, service_name]`. Advertisement is best
//! effort: a missing or failing registry never affects the server.

use std::time::Duration;

use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Where and how to advertise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvertiseConfig {
    /// Registry endpoint; nothing is advertised when unset
    pub url: Option<String>,
    /// Name the service is registered under
    pub service_name: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AdvertiseConfig {
    fn default() -> Self {
        Self { url: None, service_name: "m13".to_string(), timeout_secs: 5 }
    }
}

/// Register this instance with the configured registry
pub async fn advertise(config: &AdvertiseConfig, port: u16) -> Result<()> {
    let Some(url) = config.url.as_deref() else {
        debug!("No registry configured, skipping advertisement");
        return Ok(());
    };

    let client = reqwest::Client::new();
    let pid = std::process::id();

    let request = json!({
        "jsonrpc": "2.0",
        "method": "m13_register",
        "params": [pid, port, config.service_name],
        "id": 1
    });

    let response = client
        .post(url)
        .json(&request)
        .timeout(Duration::from_secs(config.timeout_secs))
        .send()
        .await?;

    let response_json: Value = response.json().await?;

    if let Some(error) = response_json.get("error") {
        return Err(eyre!("Registry rejected registration: {error}"));
    }

    info!("Advertised {} on port {} (PID: {})", config.service_name, port, pid);
    Ok(())
}

/// [`advertise`], logging instead of failing
pub async fn advertise_best_effort(config: &AdvertiseConfig, port: u16) {
    if let Err(e) = advertise(config, port).await {
        warn!("Advertisement failed, continuing without it: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    fn config_for(server: &MockServer) -> AdvertiseConfig {
        AdvertiseConfig { url: Some(server.uri()), ..Default::default() }
    }

    #[tokio::test]
    async fn test_registration_document() {
        let registry = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "m13_register",
                "params": [std::process::id(), 8080, "m13"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "result": true, "id": 1
            })))
            .expect(1)
            .mount(&registry)
            .await;

        advertise(&config_for(&registry), 8080).await.unwrap();
    }

    #[tokio::test]
    async fn test_registry_error_is_reported() {
        let registry = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32000, "message": "duplicate"},
                "id": 1
            })))
            .mount(&registry)
            .await;

        let err = advertise(&config_for(&registry), 8080).await.unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        // Best effort never fails.
        advertise_best_effort(&config_for(&registry), 8080).await;
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_not_fatal() {
        let config = AdvertiseConfig {
            url: Some("http://127.0.0.1:9".to_string()),
            timeout_secs: 1,
            ..Default::default()
        };

        assert!(advertise(&config, 8080).await.is_err());
        advertise_best_effort(&config, 8080).await;
    }

    #[tokio::test]
    async fn test_no_registry_is_a_no_op() {
        advertise(&AdvertiseConfig::default(), 8080).await.unwrap();
    }
}
