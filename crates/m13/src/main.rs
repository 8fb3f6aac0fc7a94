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

//! m13 - REST facade for live debugging sessions
//!
//! Serves a debugging session over HTTP so that UIs and automation can inspect
//! and drive it without linking against the debugger.

use std::{net::IpAddr, path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use m13_common::{logging, types::InfoSnapshot};
use m13_engine::{DebugEngine, EngineGuard, RestServer, SandboxEngine};
use tracing::Level;

mod advertise;
mod config;

use config::Config;

/// How often the main loop delivers engine events
const EVENT_PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// Command-line interface for m13
#[derive(Debug, Parser)]
#[command(name = "m13")]
#[command(about = "m13 - REST facade for live debugging sessions")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to $TMP/m13-logs
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the debugging session over HTTP
    Serve(ServeArgs),
    /// Print the engine version document
    Info,
}

/// Options of `m13 serve`
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Interface to listen on
    #[arg(long, env = "M13_HOST")]
    pub host: Option<IpAddr>,

    /// Port to listen on
    #[arg(long, env = "M13_PORT")]
    pub port: Option<u16>,

    /// Configuration file (default: ~/.m13.toml)
    #[arg(long, env = "M13_CONFIG")]
    pub config: Option<PathBuf>,

    /// Registry to advertise this instance to
    #[arg(long, env = "M13_ADVERTISE_URL")]
    pub advertise_url: Option<String>,

    /// Name to advertise this instance under
    #[arg(long, env = "M13_SERVICE_NAME")]
    pub service_name: Option<String>,
}

impl Cli {
    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();
    logging::init_logging("m13", cli.log_level(), cli.log_file)?;

    match &cli.command {
        Commands::Serve(args) => serve(args),
        Commands::Info => info(),
    }
}

/// Print `{"version": ...}` for the engine m13 would serve
fn info() -> Result<()> {
    let engine = SandboxEngine::default();
    let document = InfoSnapshot { version: engine.version() };
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn serve(args: &ServeArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?.with_overrides(args);
    tracing::debug!(?config, "Effective configuration");

    let guard = EngineGuard::new(SandboxEngine::demo());

    // Bind and wait for readiness before telling anyone where we are.
    let server_handle = RestServer::new(guard.clone(), config.server.clone()).spawn()?;
    let port = server_handle.port();
    tracing::info!("REST server is running on http://{}", server_handle.addr());
    println!("The \"m13\" command has been installed and is ready for use.");

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(async {
        advertise::advertise_best_effort(&config.advertise, port).await;

        tracing::info!("Press Ctrl+C to exit.");
        let mut pump = tokio::time::interval(EVENT_PUMP_INTERVAL);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Received Ctrl+C, shutting down...");
                    break;
                }
                _ = pump.tick() => {
                    let transitions = guard.with(|engine| engine.pump_events());
                    if transitions > 0 {
                        tracing::debug!(transitions, "Delivered engine events");
                    }
                }
            }
        }
    });

    tracing::info!("Shutting down m13...");

    // Gracefully shutdown the REST server
    if let Err(e) = server_handle.shutdown() {
        tracing::error!("Failed to shutdown REST server: {}", e);
    } else {
        tracing::info!("REST server shut down successfully");
    }

    Ok(())
}
