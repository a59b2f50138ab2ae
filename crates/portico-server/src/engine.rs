//! The engine contract and the listener handle.
//!
//! An [`Engine`] binds routes to one native HTTP implementation. It only
//! has to build its native instance ([`Engine::initialize`]) and bind a
//! single route ([`Engine::register_route_with_engine`]); everything else,
//! including the socket and the accept loop, lives in
//! [`Server`](crate::Server) and [`HttpServer`].
//!
//! # Architecture
//!
//! ```text
//! TcpListener ── accept loop ── hyper http1 connection ── HttpServer::dispatch
//!                                                              │
//!                                                     engine's native service
//!                                                              │
//!                                        RouteConfig::invoke (call stack)
//! ```

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use portico_middleware::BoxFuture;
use portico_router::Capabilities;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::route::RouteConfig;
use crate::shutdown::{InFlight, ShutdownSignal};

/// A native HTTP implementation that routes can be bound to.
pub trait Engine: Send + Sync + 'static {
    /// The native engine instance exposed through
    /// [`Server::engine`](crate::Server::engine).
    type Native;

    /// Engine name used in logs and errors.
    const NAME: &'static str;

    /// Returns which path syntax this engine can express.
    fn capabilities(&self) -> Capabilities;

    /// Builds the native engine and returns the listener handle that will
    /// serve it.
    ///
    /// Called at most once per server.
    ///
    /// # Errors
    ///
    /// Returns an error if the native engine cannot be built.
    fn initialize(&mut self, config: &ServerConfig) -> Result<HttpServer, ServerError>;

    /// Binds one route to the native routing table.
    ///
    /// Must either bind the route completely or return an error and leave
    /// the native table untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Registration`] if the engine cannot express the
    /// route's pattern, [`ServerError::DuplicateRoute`] if it is already
    /// bound, or [`ServerError::NotInitialized`] before
    /// [`initialize`](Engine::initialize).
    fn register_route_with_engine(&mut self, route: Arc<RouteConfig>) -> Result<(), ServerError>;

    /// Returns the native engine, once initialized.
    fn native(&self) -> Option<&Self::Native>;
}

/// The function an engine serves requests with.
pub type HttpService =
    Arc<dyn Fn(http::Request<Bytes>) -> BoxFuture<'static, http::Response<Bytes>> + Send + Sync>;

/// Handle to the listener that serves an engine.
///
/// Cloning is cheap; all clones refer to the same listener. Before
/// [`Server::start`](crate::Server::start) the handle can already
/// [`dispatch`](HttpServer::dispatch) requests in memory, which is what
/// `portico-test` uses.
#[derive(Clone)]
pub struct HttpServer {
    inner: Arc<Inner>,
}

struct Inner {
    engine: &'static str,
    service: HttpService,
    shutdown: ShutdownSignal,
    in_flight: InFlight,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Creates a handle that serves requests with `service`.
    pub fn new<F, Fut>(engine: &'static str, service: F) -> Self
    where
        F: Fn(http::Request<Bytes>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = http::Response<Bytes>> + Send + 'static,
    {
        let service: HttpService = Arc::new(move |request: http::Request<Bytes>| {
            Box::pin(service(request)) as BoxFuture<'static, http::Response<Bytes>>
        });

        Self {
            inner: Arc::new(Inner {
                engine,
                service,
                shutdown: ShutdownSignal::new(),
                in_flight: InFlight::new(),
                local_addr: OnceLock::new(),
            }),
        }
    }

    /// Returns the name of the engine behind this handle.
    #[must_use]
    pub fn engine_name(&self) -> &'static str {
        self.inner.engine
    }

    /// Serves one request without going through a socket.
    pub async fn dispatch(&self, request: http::Request<Bytes>) -> http::Response<Bytes> {
        (self.inner.service)(request).await
    }

    /// Returns the bound address, once listening.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr.get().copied()
    }

    /// Returns true once the listener is bound.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.inner.local_addr.get().is_some()
    }

    /// Returns the signal that stops the accept loop.
    #[must_use]
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.inner.shutdown
    }

    /// Returns the number of open connections.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        self.inner.in_flight.count()
    }

    /// Starts accepting connections on `listener` in a background task.
    pub(crate) fn spawn_accept_loop(
        &self,
        listener: TcpListener,
        addr: SocketAddr,
        shutdown_timeout: Duration,
    ) -> JoinHandle<()> {
        // Set once; a second start is rejected before it gets here.
        let _ = self.inner.local_addr.set(addr);
        let server = self.clone();
        tokio::spawn(async move { server.accept_loop(listener, shutdown_timeout).await })
    }

    async fn accept_loop(self, listener: TcpListener, shutdown_timeout: Duration) {
        let shutdown = self.inner.shutdown.clone();
        let engine = self.inner.engine;

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = self.clone();
                            let guard = self.inner.in_flight.enter();
                            tokio::spawn(async move {
                                server.serve_connection(stream, remote_addr).await;
                                drop(guard);
                            });
                        }
                        Err(err) => {
                            tracing::error!(engine, error = %err, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.wait() => {
                    tracing::info!(engine, "shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        // Stop accepting before draining.
        drop(listener);

        let open = self.inner.in_flight.count();
        tracing::info!(engine, open, timeout = ?shutdown_timeout, "waiting for connections to close");

        tokio::select! {
            () = self.inner.in_flight.drained() => {
                tracing::info!(engine, "all connections closed");
            }
            () = tokio::time::sleep(shutdown_timeout) => {
                tracing::warn!(
                    engine,
                    open = self.inner.in_flight.count(),
                    "shutdown timeout reached with connections still open"
                );
            }
        }
    }

    async fn serve_connection(self, stream: TcpStream, remote_addr: SocketAddr) {
        let io = TokioIo::new(stream);
        let server = self.clone();
        let service = service_fn(move |request: http::Request<Incoming>| {
            let server = server.clone();
            async move { Ok::<_, Infallible>(server.handle_incoming(request).await) }
        });

        let conn = http1::Builder::new().serve_connection(io, service);
        tokio::pin!(conn);
        let shutdown = self.inner.shutdown.wait();
        tokio::pin!(shutdown);

        let result = tokio::select! {
            result = conn.as_mut() => result,
            () = &mut shutdown => {
                tracing::debug!(%remote_addr, "closing connection for shutdown");
                conn.as_mut().graceful_shutdown();
                conn.await
            }
        };

        // The client is gone; there is nobody left to tell.
        if let Err(err) = result {
            tracing::error!(engine = self.inner.engine, %remote_addr, error = %err, "connection error");
        }
    }

    async fn handle_incoming(&self, request: http::Request<Incoming>) -> http::Response<Full<Bytes>> {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read request body");
                let mut response = http::Response::new(Full::new(Bytes::from_static(
                    b"failed to read request body",
                )));
                *response.status_mut() = StatusCode::BAD_REQUEST;
                return response;
            }
        };

        self.dispatch(http::Request::from_parts(parts, body))
            .await
            .map(Full::new)
    }
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("engine", &self.inner.engine)
            .field("local_addr", &self.local_addr())
            .field("shutdown", &self.inner.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}
