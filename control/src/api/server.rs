//! API Server - accepts HTTP/1 connections and dispatches to the handler

use crate::api::handler::{handle_request, ApiState};
use crate::error::RouteError;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Resolve once `signal` fires
///
/// If the signal cannot be listened for, never resolves: the server keeps
/// running until the process is killed.
pub async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

/// Route API server
pub struct ApiServer {
    listener: TcpListener,
    state: Arc<ApiState>,
}

impl ApiServer {
    /// Bind the API listener
    pub async fn bind(bind_addr: &str, state: Arc<ApiState>) -> Result<Self, RouteError> {
        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            error!("Failed to bind to {}: {}", bind_addr, e);
            RouteError::Io(e)
        })?;

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RouteError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until `shutdown` resolves
    ///
    /// Connections already accepted keep running on their own tasks.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RouteError>
    where
        F: Future<Output = ()>,
    {
        let local_addr = self.local_addr()?;
        info!("Route API listening on {}", local_addr);

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            debug!("Accepted connection from {}", peer_addr);

                            let state = self.state.clone();
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                                    handle_request(req, state.clone())
                                });

                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Connection error from {}: {}", peer_addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error on {}: {}", local_addr, e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Route API on {} received shutdown signal", local_addr);
                    break;
                }
            }
        }

        Ok(())
    }
}
