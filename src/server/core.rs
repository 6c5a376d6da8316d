//! Server core module - route registration and the per-request entry point.

use http::{Method, Request, StatusCode};
use may_minihttp::{HttpServer as MiniHttpServer, HttpService, Request as RawRequest, Response};
use std::fmt;
use std::io;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use tracing::{info, warn};

use super::http_server::ServerHandle;
use super::request::into_http_request;
use super::sink::ResponseSink;
use crate::context::Context;
use crate::dispatcher::{flush_layer, Dispatcher};
use crate::middleware::{compose, handler, HandleFunc, Middleware};
use crate::router::{RouteError, Router};
use crate::template::TemplateEngine;

/// Registration phase of a server.
///
/// Collect routes and middleware, then call [`into_service`](Self::into_service)
/// or [`start`](Self::start). Both consume the server, so no route can be
/// added once requests are being served.
///
/// ```rust
/// use webtrie::server::{HttpServer, RecordingSink};
///
/// # fn main() -> Result<(), webtrie::router::RouteError> {
/// let mut server = HttpServer::new(Vec::new());
/// server.get("/user/:id", |ctx| {
///     let id = ctx.path_value("id").into_string().unwrap_or_default();
///     ctx.resp_body = format!("user {id}").into_bytes();
/// })?;
///
/// let service = server.into_service();
/// let mut sink = RecordingSink::new();
/// let req = http::Request::get("/user/7").body(Vec::new()).unwrap();
/// service.serve(req, &mut sink);
/// assert_eq!(sink.body(), b"user 7");
/// # Ok(())
/// # }
/// ```
pub struct HttpServer {
    router: Router<HandleFunc>,
    middlewares: Vec<Middleware>,
    template_engine: Option<Arc<dyn TemplateEngine>>,
}

impl fmt::Debug for HttpServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServer")
            .field("routes", &self.router.routes())
            .field("middlewares", &self.middlewares.len())
            .field("template_engine", &self.template_engine.is_some())
            .finish()
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl HttpServer {
    /// Server with `middlewares` applied in order, first outermost.
    pub fn new(middlewares: Vec<Middleware>) -> Self {
        Self {
            router: Router::new(),
            middlewares,
            template_engine: None,
        }
    }

    /// Append a middleware inside the ones already registered.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn set_template_engine(&mut self, engine: Arc<dyn TemplateEngine>) -> &mut Self {
        self.template_engine = Some(engine);
        self
    }

    /// Register `handle` for `(method, path)`.
    ///
    /// # Errors
    ///
    /// Any [`RouteError`] from the router; the route table is misconfigured
    /// and startup should abort.
    pub fn add_route(
        &mut self,
        method: Method,
        path: &str,
        handle: HandleFunc,
    ) -> Result<&mut Self, RouteError> {
        self.router.add_route(method, path, handle)?;
        Ok(self)
    }

    /// Register a `GET` handler.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn get<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_route(Method::GET, path, handler(f))
    }

    /// Register a `POST` handler.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn post<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_route(Method::POST, path, handler(f))
    }

    /// Register a `PUT` handler.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn put<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_route(Method::PUT, path, handler(f))
    }

    /// Register a `DELETE` handler.
    ///
    /// # Errors
    ///
    /// See [`add_route`](Self::add_route).
    pub fn delete<F>(&mut self, path: &str, f: F) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context<'_>) + Send + Sync + 'static,
    {
        self.add_route(Method::DELETE, path, handler(f))
    }

    pub fn router(&self) -> &Router<HandleFunc> {
        &self.router
    }

    /// Freeze the route table and compose the request chain.
    ///
    /// The chain is `m0(m1(..mN(flush(dispatch))))`, built once and shared by
    /// every request.
    pub fn into_service(self) -> AppService {
        let router = Arc::new(self.router);
        let dispatch = Dispatcher::new(Arc::clone(&router)).into_handler();
        let chain = compose(&self.middlewares, flush_layer()(dispatch));
        AppService {
            router,
            chain,
            template_engine: self.template_engine,
        }
    }

    /// Bind `addr` and serve in the background.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        self.into_service().start(addr)
    }

    /// Bind `addr` and serve until the accept loop exits.
    ///
    /// # Errors
    ///
    /// Bind errors, or `Other` if the accept loop panicked.
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> io::Result<()> {
        self.start(addr)?
            .join()
            .map_err(|_| io::Error::other("server coroutine panicked"))
    }
}

/// Serving phase: the frozen route table and the composed chain.
///
/// Cheap to clone; every `may_minihttp` connection gets its own clone.
#[derive(Clone)]
pub struct AppService {
    router: Arc<Router<HandleFunc>>,
    chain: HandleFunc,
    template_engine: Option<Arc<dyn TemplateEngine>>,
}

impl fmt::Debug for AppService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppService")
            .field("routes", &self.router.len())
            .field("template_engine", &self.template_engine.is_some())
            .finish_non_exhaustive()
    }
}

impl AppService {
    /// Run `request` through the chain, writing the response to `sink`.
    pub fn serve(&self, request: Request<Vec<u8>>, sink: &mut dyn ResponseSink) {
        let mut ctx =
            Context::new(request, sink).with_template_engine(self.template_engine.clone());
        (self.chain)(&mut ctx);
    }

    pub fn router(&self) -> &Router<HandleFunc> {
        &self.router
    }

    /// Bind `addr` and serve on `may` coroutines.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        self.router.log_routes();
        let handle = MiniHttpServer(self).start(addr)?;
        info!(addr = %addr, "Server started");
        Ok(ServerHandle::new(addr, handle))
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: RawRequest, res: &mut Response) -> io::Result<()> {
        match into_http_request(req) {
            Ok(request) => self.serve(request, res),
            Err(err) => {
                warn!(error = %err, "Rejected malformed request");
                let status = StatusCode::BAD_REQUEST;
                res.status_code(usize::from(status.as_u16()), "Bad Request");
                res.body("BAD REQUEST");
            }
        }
        Ok(())
    }
}
