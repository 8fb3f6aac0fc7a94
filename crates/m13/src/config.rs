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

//! Configuration file handling.
//!
//! Settings come from three places, highest priority first: command line
//! flags (or their environment variables), the TOML file, and built-in
//! defaults. The file lives at `~/.m13.toml` unless `--config` names another
//! one.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [advertise]
//! url = "http://127.0.0.1:9100"
//! service_name = "m13"
//! timeout_secs = 5
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{Result, WrapErr};
use m13_engine::ServerConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{advertise::AdvertiseConfig, ServeArgs};

/// Name of the default configuration file in the home directory
const CONFIG_FILE_NAME: &str = ".m13.toml";

/// Everything `m13 serve` can be configured with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerConfig,
    /// Registry settings
    pub advertise: AdvertiseConfig,
}

impl Config {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home.join(CONFIG_FILE_NAME))
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. The default file is optional; when it is
    /// absent the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    debug!("No config file at {:?}, using defaults", default_path);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        debug!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Apply command line overrides
    pub fn with_overrides(mut self, args: &ServeArgs) -> Self {
        if let Some(host) = args.host {
            self.server.host = host;
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(url) = &args.advertise_url {
            self.advertise.url = Some(url.clone());
        }
        if let Some(name) = &args.service_name {
            self.advertise.service_name = name.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        net::{IpAddr, Ipv4Addr},
    };

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::{Cli, Commands};

    fn serve_args(args: &[&str]) -> ServeArgs {
        let argv = ["m13", "serve"].iter().chain(args).copied();
        match Cli::parse_from(argv).command {
            Commands::Serve(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_file_values_are_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 9100\n\n[advertise]\nservice_name = \"lab\"").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.advertise.service_name, "lab");
        assert_eq!(config.advertise.url, None);
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nhost = \"0.0.0.0\"\nport = 9100").unwrap();

        let config = Config::load(Some(file.path()))
            .unwrap()
            .with_overrides(&serve_args(&["--port", "9200", "--advertise-url", "http://r"]));

        assert_eq!(config.server.port, 9200);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.advertise.url.as_deref(), Some("http://r"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a port\"").unwrap();

        assert!(Config::load(Some(file.path())).is_err());
    }
}
