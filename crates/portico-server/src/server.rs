//! The server base.
//!
//! [`Server`] owns the configuration, the route table and the lifecycle,
//! and leaves everything engine-specific to its [`Engine`].
//!
//! The lifecycle has two phases. While registering, routes are added and
//! bound to the engine one by one. Once [`Server::start`] binds the
//! listener the table is closed and further registrations fail.
//!
//! # Example
//!
//! ```rust,no_run
//! use http::Method;
//! use portico_middleware::handler_fn;
//! use portico_server::{ExpressEngine, RouteConfig, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ExpressEngine::new(), ServerConfig::default());
//!
//!     server.register(
//!         RouteConfig::builder(
//!             Method::GET,
//!             "/items/:id",
//!             handler_fn(|request, response| async move {
//!                 let id = request.param("id").unwrap_or_default().to_string();
//!                 Ok(response.with_body(serde_json::json!({ "id": id })))
//!             }),
//!         )
//!         .build()?,
//!     )?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use portico_core::Response;
use portico_middleware::{CallStack, Middleware};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::controller::{join_paths, Controller};
use crate::engine::{Engine, HttpServer};
use crate::error::ServerError;
use crate::route::{default_response, RouteConfig};
use crate::route_table::RouteTable;
use crate::shutdown::ShutdownSignal;

/// A server bound to one engine.
pub struct Server<E: Engine> {
    config: ServerConfig,
    engine: E,
    routes: RouteTable,
    global_middleware: Vec<Arc<dyn Middleware>>,
    http_server: Option<HttpServer>,
    accept_task: Option<JoinHandle<()>>,
    rejected: Vec<String>,
}

impl<E: Engine> Server<E> {
    /// Creates a server. Nothing is built or bound until the first
    /// registration or [`start`](Server::start).
    #[must_use]
    pub fn new(engine: E, config: ServerConfig) -> Self {
        Self {
            config,
            engine,
            routes: RouteTable::new(),
            global_middleware: Vec::new(),
            http_server: None,
            accept_task: None,
            rejected: Vec::new(),
        }
    }

    /// Adds middleware that runs first for every route registered through
    /// [`register_controller`](Server::register_controller).
    ///
    /// Routes passed to [`register`](Server::register) already carry their
    /// composed call stack and are not affected.
    #[must_use]
    pub fn with_global_middleware(mut self, middleware: impl Middleware) -> Self {
        self.global_middleware.push(Arc::new(middleware));
        self
    }

    /// Builds the native engine and captures its listener handle.
    ///
    /// Runs at most once; later calls do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot be built.
    pub fn initialize(&mut self) -> Result<&mut Self, ServerError> {
        if self.http_server.is_none() {
            let http_server = self.engine.initialize(&self.config)?;
            tracing::debug!(engine = E::NAME, "engine initialized");
            self.http_server = Some(http_server);
        }
        Ok(self)
    }

    /// Registers a route and binds it to the engine.
    ///
    /// The route is added to the table only if the engine accepted it. A
    /// failed registration is remembered and makes [`start`](Server::start)
    /// refuse to serve.
    ///
    /// # Errors
    ///
    /// - [`ServerError::RegistrationClosed`] once the server has started
    /// - [`ServerError::DuplicateRoute`] if the method and path are taken
    /// - [`ServerError::Registration`] if the engine cannot express the path
    pub fn register(&mut self, route: RouteConfig) -> Result<&mut Self, ServerError> {
        if let Err(err) = self.check(&route, &self.routes) {
            return Err(self.reject(err));
        }
        self.bind(Arc::new(route))?;
        Ok(self)
    }

    /// Registers every route a controller declares, in declaration order.
    ///
    /// Each call stack runs global middleware, then controller middleware,
    /// then route middleware, then the handler. Every declaration is parsed
    /// and checked against the engine before any of them is bound, so a bad
    /// declaration leaves the table untouched.
    ///
    /// # Errors
    ///
    /// Returns the first declaration error, or the first engine error if
    /// binding fails part way.
    pub fn register_controller(&mut self, controller: &dyn Controller) -> Result<&mut Self, ServerError> {
        let controller_middleware = controller.middleware();

        let mut pending = RouteTable::new();
        for declaration in controller.routes() {
            let path = join_paths(controller.base_path(), declaration.path());
            let call_stack = CallStack::from_arc(Arc::clone(declaration.handler())).preceded_by(
                self.global_middleware
                    .iter()
                    .chain(&controller_middleware)
                    .chain(declaration.middleware())
                    .cloned(),
            );
            let route = RouteConfig::new(
                declaration.method().clone(),
                &path,
                declaration.method_name(),
                call_stack,
            )
            .and_then(|route| {
                self.check(&route, &self.routes)?;
                self.check(&route, &pending)?;
                Ok(route)
            });

            match route {
                Ok(route) => pending.push(Arc::new(route)),
                Err(err) => return Err(self.reject(err)),
            }
        }

        for route in pending.iter().cloned() {
            self.bind(route)?;
        }
        Ok(self)
    }

    /// Checks a route against `table` and the engine's capabilities
    /// without binding anything.
    fn check(&self, route: &RouteConfig, table: &RouteTable) -> Result<(), ServerError> {
        if self.is_started() {
            return Err(ServerError::RegistrationClosed {
                method: route.method().clone(),
                path: route.path().to_string(),
            });
        }

        if table.contains(route) {
            return Err(ServerError::DuplicateRoute {
                method: route.method().clone(),
                path: route.path().to_string(),
            });
        }

        self.engine
            .capabilities()
            .check(route.pattern())
            .map_err(|source| ServerError::from_router(route.method(), route.path(), source))
    }

    fn bind(&mut self, route: Arc<RouteConfig>) -> Result<(), ServerError> {
        self.initialize()?;

        if let Err(err) = self.engine.register_route_with_engine(Arc::clone(&route)) {
            return Err(self.reject(err));
        }

        tracing::info!(
            engine = E::NAME,
            method = %route.method(),
            path = route.path(),
            route = route.method_name(),
            "route registered"
        );
        self.routes.push(route);
        Ok(())
    }

    /// Logs a rejected registration and remembers it so the server never
    /// serves a partial table.
    fn reject(&mut self, err: ServerError) -> ServerError {
        tracing::error!(engine = E::NAME, error = %err, "route rejected");
        if !matches!(err, ServerError::RegistrationClosed { .. }) {
            self.rejected.push(err.to_string());
        }
        err
    }

    /// Returns the registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Binds the listener and starts serving.
    ///
    /// Initializes the engine first if needed. Returns once the listener is
    /// bound; connections are accepted in a background task.
    ///
    /// # Errors
    ///
    /// - [`ServerError::AlreadyStarted`] if called twice
    /// - [`ServerError::RegistrationFailed`] if any route failed to register
    /// - [`ServerError::InvalidAddress`] if the host does not resolve
    /// - [`ServerError::Bind`] if the port is in use or not permitted
    pub async fn start(&mut self) -> Result<&mut Self, ServerError> {
        if self.is_started() {
            return Err(ServerError::AlreadyStarted);
        }

        if let Some(first) = self.rejected.first() {
            let err = ServerError::RegistrationFailed {
                count: self.rejected.len(),
                first: first.clone(),
            };
            tracing::error!(engine = E::NAME, error = %err, "refusing to start");
            return Err(err);
        }

        self.initialize()?;
        let http_server = self
            .http_server
            .clone()
            .ok_or(ServerError::NotInitialized { engine: E::NAME })?;

        let target = self.config.bind_target();
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host(&target)
            .await
            .map_err(|source| ServerError::InvalidAddress {
                address: target.clone(),
                source,
            })?
            .collect();

        let mut last_err = None;
        let mut bound = None;
        for addr in &addrs {
            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    bound = Some(listener);
                    break;
                }
                Err(err) => last_err = Some(err),
            }
        }

        let listener = match (bound, last_err) {
            (Some(listener), _) => listener,
            (None, Some(source)) => {
                return Err(ServerError::Bind {
                    address: target,
                    source,
                })
            }
            (None, None) => {
                return Err(ServerError::InvalidAddress {
                    address: target,
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "host resolved to no addresses",
                    ),
                })
            }
        };

        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            address: target.clone(),
            source,
        })?;

        self.accept_task =
            Some(http_server.spawn_accept_loop(listener, local_addr, self.config.shutdown_timeout()));

        tracing::info!(
            engine = E::NAME,
            address = %local_addr,
            routes = self.routes.len(),
            "server listening"
        );
        Ok(self)
    }

    /// Starts the server and serves until SIGINT/SIGTERM or
    /// [`shutdown`](Server::shutdown) on a clone of its signal.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`start`](Server::start).
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.start().await?;

        let os_signal = ShutdownSignal::with_os_signals();
        if let Some(http_server) = &self.http_server {
            let own_signal = http_server.shutdown_signal().clone();
            tokio::select! {
                () = os_signal.wait() => {}
                () = own_signal.wait() => {}
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Stops accepting connections and waits for open ones to finish, up
    /// to the configured shutdown timeout.
    pub async fn shutdown(&mut self) {
        if let Some(http_server) = &self.http_server {
            http_server.shutdown_signal().trigger();
        }

        if let Some(task) = self.accept_task.take() {
            if let Err(err) = task.await {
                tracing::error!(engine = E::NAME, error = %err, "accept loop ended abnormally");
            }
            tracing::info!(engine = E::NAME, "server stopped");
        }
    }

    /// Returns the native engine, for configuration the abstraction does
    /// not cover. `None` before initialization.
    #[must_use]
    pub fn engine(&self) -> Option<&E::Native> {
        self.engine.native()
    }

    /// Returns the listener handle. `None` before initialization.
    #[must_use]
    pub fn http_server(&self) -> Option<&HttpServer> {
        self.http_server.as_ref()
    }

    /// Returns the response every call stack starts from.
    #[must_use]
    pub fn default_response(&self) -> Response {
        default_response()
    }

    /// Returns the bound address once started.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.http_server.as_ref().and_then(HttpServer::local_addr)
    }

    /// Returns true once [`start`](Server::start) has bound the listener.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.accept_task.is_some()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the base URL, using the bound port once started.
    #[must_use]
    pub fn host(&self) -> String {
        match self.local_addr() {
            Some(addr) => format!("http://{addr}"),
            None => self.config.url(),
        }
    }
}

impl<E: Engine> Drop for Server<E> {
    fn drop(&mut self) {
        if self.accept_task.is_some() {
            if let Some(http_server) = &self.http_server {
                http_server.shutdown_signal().trigger();
            }
        }
    }
}

impl<E: Engine> fmt::Debug for Server<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("engine", &E::NAME)
            .field("config", &self.config)
            .field("routes", &self.routes.len())
            .field("started", &self.is_started())
            .finish_non_exhaustive()
    }
}
