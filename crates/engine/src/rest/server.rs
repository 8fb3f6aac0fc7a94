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

use std::{
    net::SocketAddr,
    panic::{self, AssertUnwindSafe},
    sync::mpsc as std_mpsc,
    thread::{self, JoinHandle},
};

use axum::Router;
use eyre::{eyre, Result, WrapErr};
use m13_common::types::ErrorBody;
use tokio::{
    net::TcpListener,
    sync::{mpsc, oneshot},
};
use tracing::{debug, error, info, warn};

use super::routes;
use crate::{
    adapter::DebugEngine,
    config::ServerConfig,
    facade::{self, Reply, Request},
    guard::EngineGuard,
};

/// Capacity of the handler-to-worker channel
const WORK_QUEUE_CAPACITY: usize = 1024;

/// Reply to a request whose handling panicked
const ENGINE_FAILED: &str = "Engine failed to handle the request.";

/// Handle to the running REST server
#[derive(Debug)]
pub struct RestServerHandle {
    /// Address the server is listening on
    pub addr: SocketAddr,
    /// Shutdown signal
    shutdown_tx: oneshot::Sender<()>,
    /// Listener thread, when the server owns one
    thread: Option<JoinHandle<()>>,
}

impl RestServerHandle {
    /// Get the server address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Gracefully shut the server down and wait for its thread, if any
    pub fn shutdown(self) -> Result<()> {
        if self.shutdown_tx.send(()).is_err() {
            warn!("REST server already shut down");
        }
        if let Some(thread) = self.thread {
            thread.join().map_err(|_| eyre!("REST server thread panicked"))?;
        }
        Ok(())
    }
}

/// Work item sent to the engine worker
#[derive(Debug)]
pub struct Work {
    /// The request to handle
    pub req: Request,
    /// Channel to send back the reply
    pub rsp: oneshot::Sender<Reply>,
}

/// Start the engine worker thread and return the channel feeding it.
///
/// The worker handles one request at a time, each inside a single guard
/// window, and exits once every sender is dropped.
pub fn spawn_engine_worker<E: DebugEngine>(guard: EngineGuard<E>) -> Result<mpsc::Sender<Work>> {
    spawn_worker(move |req| guard.with(|engine| facade::handle(engine, req)))
}

/// Run `handler` on a dedicated thread. A panicking request is answered with
/// an in-body error and the worker keeps serving.
fn spawn_worker<F>(mut handler: F) -> Result<mpsc::Sender<Work>>
where
    F: FnMut(Request) -> Reply + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<Work>(WORK_QUEUE_CAPACITY);

    thread::Builder::new()
        .name("m13-engine".to_string())
        .spawn(move || {
            debug!("Engine worker started");
            while let Some(Work { req, rsp }) = rx.blocking_recv() {
                let reply = panic::catch_unwind(AssertUnwindSafe(|| handler(req)))
                    .unwrap_or_else(|_| {
                        error!("Engine panicked while handling a request");
                        Reply::Error(ErrorBody::new(ENGINE_FAILED))
                    });

                // Send response back (ignore if receiver dropped)
                if rsp.send(reply).is_err() {
                    warn!("Client dropped connection before response");
                }
            }
            debug!("Engine worker shutting down");
        })
        .wrap_err("failed to spawn engine worker thread")?;

    Ok(tx)
}

/// REST server over a shared engine
#[derive(Debug)]
pub struct RestServer<E> {
    guard: EngineGuard<E>,
    config: ServerConfig,
}

impl<E: DebugEngine> RestServer<E> {
    /// Create a server for the engine behind `guard`
    pub fn new(guard: EngineGuard<E>, config: ServerConfig) -> Self {
        Self { guard, config }
    }

    /// Start the server on the current tokio runtime
    pub async fn start(self) -> Result<RestServerHandle> {
        let (listener, app) = self.bind().await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(serve(listener, app, shutdown_rx));

        info!("REST server started on {}", addr);
        Ok(RestServerHandle { addr, shutdown_tx, thread: None })
    }

    /// Start the server on a dedicated `m13-http` thread with its own runtime.
    ///
    /// Returns once the listener is bound, so the returned address is ready to
    /// accept connections.
    pub fn spawn(self) -> Result<RestServerHandle> {
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<SocketAddr>>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let thread = thread::Builder::new()
            .name("m13-http".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_multi_thread()
                    .thread_name("m13-http-worker")
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        let _ = ready_tx.send(Err(eyre!("failed to build HTTP runtime: {err}")));
                        return;
                    }
                };

                runtime.block_on(async move {
                    let bound = match self.bind().await {
                        Ok((listener, app)) => listener.local_addr().map(|addr| (listener, app, addr)),
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                            return;
                        }
                    };
                    match bound {
                        Ok((listener, app, addr)) => {
                            let _ = ready_tx.send(Ok(addr));
                            serve(listener, app, shutdown_rx).await;
                        }
                        Err(err) => {
                            let _ = ready_tx.send(Err(err.into()));
                        }
                    }
                });
            })
            .wrap_err("failed to spawn HTTP thread")?;

        let addr = ready_rx
            .recv()
            .map_err(|_| eyre!("HTTP thread exited before reporting readiness"))??;

        info!("REST server started on {}", addr);
        Ok(RestServerHandle { addr, shutdown_tx, thread: Some(thread) })
    }

    async fn bind(self) -> Result<(TcpListener, Router)> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .wrap_err_with(|| format!("failed to bind REST server to {addr}"))?;
        let tx = spawn_engine_worker(self.guard)?;
        Ok((listener, routes::router(tx)))
    }
}

async fn serve(listener: TcpListener, app: Router, shutdown_rx: oneshot::Receiver<()>) {
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        })
        .await;

    match result {
        Ok(()) => info!("REST server stopped"),
        Err(err) => error!("REST server failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Work>();
    }

    #[test]
    fn test_worker_survives_a_panicking_request() {
        let tx = spawn_worker(|req| match req {
            Request::Info => panic!("engine blew up"),
            _ => Reply::Error(ErrorBody::new("handled")),
        })
        .unwrap();

        let ask = |req| {
            let (rsp_tx, rsp_rx) = oneshot::channel();
            tx.blocking_send(Work { req, rsp: rsp_tx }).unwrap();
            rsp_rx.blocking_recv().unwrap()
        };

        assert_eq!(ask(Request::Info).as_error().unwrap().message(), ENGINE_FAILED);
        assert_eq!(
            ask(Request::Session { session: None }).as_error().unwrap().message(),
            "handled"
        );
    }

    #[test]
    fn test_spawned_server_reports_bound_port() {
        let guard = EngineGuard::new(crate::SandboxEngine::demo());
        let config = ServerConfig::default().with_port(0);

        let handle = RestServer::new(guard, config).spawn().unwrap();
        assert_ne!(handle.port(), 0);
        handle.shutdown().unwrap();
    }
}
