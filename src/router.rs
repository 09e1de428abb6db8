//! [`Router`](crate::Router) is a route table whose routes can be added and
//! removed while it is serving requests.
//!
//! Routes are registered per method. Every handler bound to a pattern that
//! matches the request path runs, in registration order, as a chain:
//!
//! ```rust
//! use megarouter::{handler_fn, Handler, Next, Router};
//! use hyper::{Body, Request, Response};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let router = Router::new();
//!
//! router
//!     .get("/user/:id", handler_fn(|req, mut res, next| async move {
//!         res.headers_mut().insert("x-seen-by", "auth".parse()?);
//!         next.run(req, res).await
//!     }))?
//!     .get("/user/*", handler_fn(|_, mut res, _| async move {
//!         *res.body_mut() = Body::from("profile");
//!         Ok(res)
//!     }))?;
//!
//! let req = Request::get("/user/7").body(Body::empty())?;
//! let res = router
//!     .middleware()
//!     .call(req, Response::new(Body::empty()), Next::noop())
//!     .await?;
//! assert!(res.headers().contains_key("x-seen-by"));
//! # Ok(())
//! # }
//! ```
//!
//! A handler that does not run its `next` ends the chain there. When every
//! matching handler advanced, or nothing matched, control passes to the
//! `next` given to the middleware.
//!
//! Clones of a `Router` share one table, so a clone kept by the application
//! can change the routes of a router already turned into a service:
//!
//! ```rust,no_run
//! use megarouter::{handler_fn, Router};
//! use hyper::Body;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let router = Router::new();
//! let service = router.clone().into_service();
//!
//! let maintenance = handler_fn(|_, mut res, _| async move {
//!     *res.body_mut() = Body::from("down for maintenance");
//!     Ok(res)
//! });
//! router.get("/*", &maintenance)?;
//!
//! // later, from anywhere holding `router`
//! router.unget("/*", Some(maintenance.into()))?;
//! # hyper::Server::bind(&([127, 0, 0, 1], 3000).into()).serve(service).await?;
//! # Ok(())
//! # }
//! ```
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use futures_util::future;
use hyper::service::Service;
use hyper::{Body, Method, Request, Response, StatusCode};
use parking_lot::RwLock;

use crate::config::RouterConfig;
use crate::error::{BoxError, Result};
use crate::handler::{Handler, HandlerFuture, Handlers, Next, SharedHandler};
use crate::middleware::Middleware;
use crate::pattern::PatternOptions;
use crate::table::{canonical_method, RouteTable};

const STANDARD_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
    Method::PATCH,
];

/// Router dispatches requests to chains of handlers via routes that can
/// change at runtime.
#[derive(Clone)]
pub struct Router {
    table: Arc<RouteTable>,
    middleware: Arc<OnceLock<Middleware>>,
    not_found: Arc<RwLock<Option<SharedHandler>>>,
}

impl Router {
    /// Creates a router for the methods of RFC 7231 and RFC 5789:
    /// `GET`, `HEAD`, `POST`, `PUT`, `DELETE`, `CONNECT`, `OPTIONS`, `TRACE`
    /// and `PATCH`. Patterns are neither strict nor case sensitive.
    pub fn new() -> Self {
        let router = Self::empty(PatternOptions::default());
        for method in STANDARD_METHODS {
            router.table.insert_method(method);
        }
        router
    }

    /// Creates a router from a [`RouterConfig`].
    /// ```rust
    /// use megarouter::{Router, RouterConfig};
    ///
    /// let router = Router::with_config(RouterConfig::default().methods(["get", "purge"])).unwrap();
    /// assert_eq!(router.methods().len(), 2);
    /// ```
    pub fn with_config(config: RouterConfig) -> Result<Self> {
        let router = Self::empty(config.pattern_options());
        for method in &config.methods {
            router.register_method(method)?;
        }
        Ok(router)
    }

    /// Creates a router with default pattern options supporting only
    /// `methods`.
    pub fn with_methods<I, S>(methods: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_config(RouterConfig::default().methods(methods))
    }

    fn empty(options: PatternOptions) -> Self {
        Self {
            table: Arc::new(RouteTable::new(options)),
            middleware: Arc::new(OnceLock::new()),
            not_found: Arc::new(RwLock::new(None)),
        }
    }

    /// Adds support for a method, which is upper-cased. Registering a
    /// method that is already supported changes nothing.
    /// ```rust
    /// use megarouter::{handler_fn, Router};
    ///
    /// let router = Router::new();
    /// router
    ///     .register_method("purge").unwrap()
    ///     .handle("PURGE", "/cache", handler_fn(|_, res, _| async move { Ok(res) })).unwrap();
    /// assert_eq!(router.route_count("purge"), 1);
    /// ```
    pub fn register_method(&self, method: &str) -> Result<&Self> {
        self.table.register_method(method)?;
        Ok(self)
    }

    /// Binds `handlers` to `pattern` for `method`, after any existing
    /// bindings. An unsupported method is registered first.
    ///
    /// `handlers` is a single handler, a list, or nested lists; each
    /// handler gets its own binding, in order. An empty list does nothing.
    /// A pattern that does not compile is rejected with
    /// [`Error::InvalidPattern`](crate::Error::InvalidPattern), leaving the
    /// table unchanged.
    /// ```rust
    /// use megarouter::{handler_fn, Router};
    ///
    /// let router = Router::new();
    /// let auth = handler_fn(|req, res, next| next.run(req, res));
    /// let teapot = handler_fn(|_, mut res, _| async move {
    ///     *res.status_mut() = hyper::StatusCode::IM_A_TEAPOT;
    ///     Ok(res)
    /// });
    ///
    /// router.handle("GET", "/teapot", [auth, teapot]).unwrap();
    /// assert_eq!(router.route_count("GET"), 2);
    /// ```
    pub fn handle(
        &self,
        method: &str,
        pattern: &str,
        handlers: impl Into<Handlers>,
    ) -> Result<&Self> {
        self.table.add(method, pattern, handlers.into())?;
        Ok(self)
    }

    /// Removes every binding of `pattern` for `method`.
    ///
    /// Patterns are compared by their compiled form, so `/a/*` and `/a/*0`
    /// name the same route. Removing from an unsupported method, or a
    /// pattern with no bindings, does nothing.
    pub fn remove(&self, method: &str, pattern: &str) -> Result<&Self> {
        self.table.remove(method, pattern)?;
        Ok(self)
    }

    /// For each of `handlers`, removes the first binding of `pattern` for
    /// `method` holding that same handler. Other bindings, including other
    /// bindings of the same handler, are kept.
    /// ```rust
    /// use megarouter::{handler_fn, Router};
    ///
    /// let router = Router::new();
    /// let log = handler_fn(|req, res, next| next.run(req, res));
    /// router.get("/", [log.clone(), log.clone()]).unwrap();
    ///
    /// router.remove_handlers("GET", "/", &log).unwrap();
    /// assert_eq!(router.route_count("GET"), 1);
    /// ```
    pub fn remove_handlers(
        &self,
        method: &str,
        pattern: &str,
        handlers: impl Into<Handlers>,
    ) -> Result<&Self> {
        self.table.remove_handlers(method, pattern, handlers.into())?;
        Ok(self)
    }

    /// Removes `handlers` from `pattern` if given, otherwise every binding of
    /// `pattern`.
    pub fn unhandle(
        &self,
        method: &str,
        pattern: &str,
        handlers: Option<Handlers>,
    ) -> Result<&Self> {
        match handlers {
            Some(handlers) => self.remove_handlers(method, pattern, handlers),
            None => self.remove(method, pattern),
        }
    }

    /// Returns the supported methods, in no particular order.
    pub fn methods(&self) -> Vec<Method> {
        self.table.methods()
    }

    /// Returns the number of bindings registered for `method`.
    pub fn route_count(&self, method: &str) -> usize {
        canonical_method(method)
            .ok()
            .and_then(|method| self.table.len(&method))
            .unwrap_or(0)
    }

    /// Returns the request-handling entry point of this router.
    ///
    /// It is built on first use; every later call, on this router or any of
    /// its clones, returns the same middleware.
    pub fn middleware(&self) -> &Middleware {
        self.middleware
            .get_or_init(|| Middleware::new(self.table.clone()))
    }

    /// Sets the handler called by [`Router::serve`] when the chain falls
    /// through. Without one, the response is `404 Not Found` with an empty
    /// body.
    ///
    /// Like the routes, the handler is shared by every clone of the router,
    /// including services created before it was set.
    pub fn not_found(&self, handler: SharedHandler) -> &Self {
        *self.not_found.write() = Some(handler);
        self
    }
}

macro_rules! method_shortcuts {
    ($($add:ident, $remove:ident => $method:literal;)*) => {
        impl Router {
            $(
                #[doc = concat!("Binds handlers to `pattern` for `", $method, "` requests.")]
                pub fn $add(&self, pattern: &str, handlers: impl Into<Handlers>) -> Result<&Self> {
                    self.handle($method, pattern, handlers)
                }

                #[doc = concat!(
                    "Removes handlers from `pattern` for `", $method, "` requests, ",
                    "or every binding of `pattern` if `handlers` is `None`."
                )]
                pub fn $remove(&self, pattern: &str, handlers: Option<Handlers>) -> Result<&Self> {
                    self.unhandle($method, pattern, handlers)
                }
            )*
        }
    };
}

method_shortcuts! {
    get, unget => "GET";
    head, unhead => "HEAD";
    post, unpost => "POST";
    put, unput => "PUT";
    delete, undelete => "DELETE";
    connect, unconnect => "CONNECT";
    options, unoptions => "OPTIONS";
    trace, untrace => "TRACE";
    patch, unpatch => "PATCH";
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("methods", &self.table.methods())
            .field("not_found", &self.not_found.read().is_some())
            .finish()
    }
}

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = Infallible;
    type Future = future::Ready<std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        let service = self.0.clone();
        future::ok(service)
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Router);

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.0.serve(req)
    }
}

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly
    /// with `Hyper`. Keep a clone of the router to change its routes while
    /// it serves.
    /// ```rust,no_run
    /// # use megarouter::Router;
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let router = Router::new();
    ///
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(router.into_service())
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService(self))
    }

    /// Runs the middleware on `req` with a fresh response. When the chain
    /// falls through, the [`not_found`](Router::not_found) handler runs, or
    /// the response becomes `404 Not Found`.
    ///
    /// Nothing runs until the returned future is polled. Errors returned by
    /// handlers are the error of the future.
    pub fn serve(&self, req: Request<Body>) -> ResponseFut {
        let middleware = self.middleware().clone();
        let not_found = self.not_found.clone();

        let inner: HandlerFuture = Box::pin(async move {
            let end = Next::new(move |req, mut res| async move {
                let handler = not_found.read().clone();
                match handler {
                    Some(handler) => handler.call(req, res, Next::noop()).await,
                    None => {
                        *res.status_mut() = StatusCode::NOT_FOUND;
                        Ok(res)
                    }
                }
            });

            middleware
                .call(req, Response::new(Body::empty()), end)
                .await
        });

        ResponseFut { inner }
    }
}

/// The future returned by [`Router::serve`].
pub struct ResponseFut {
    inner: HandlerFuture,
}

impl Future for ResponseFut {
    type Output = std::result::Result<Response<Body>, BoxError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::handler_fn;
    use crate::Error;

    #[test]
    fn defaults_to_standard_methods() {
        let router = Router::default();
        let methods = router.methods();
        assert_eq!(methods.len(), 9);
        for method in STANDARD_METHODS {
            assert!(methods.contains(&method));
        }
    }

    #[test]
    fn config_methods_are_upper_cased() {
        let router = Router::with_methods(["get", "Purge"]).unwrap();
        assert_eq!(router.route_count("GET"), 0);
        assert!(router.methods().contains(&Method::GET));
        assert!(router
            .methods()
            .iter()
            .any(|method| method.as_str() == "PURGE"));
    }

    #[test]
    fn invalid_config_method_is_rejected() {
        let err = Router::with_methods(["GET", "BAD METHOD"]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidMethod {
                method: "BAD METHOD".to_owned()
            }
        );
    }

    #[test]
    fn middleware_is_built_once() {
        let router = Router::new();
        let clone = router.clone();
        assert!(std::ptr::eq(router.middleware(), router.middleware()));
        assert!(std::ptr::eq(router.middleware(), clone.middleware()));
    }

    #[test]
    fn shortcuts_chain() {
        let h = handler_fn(|req, res, next| next.run(req, res));
        let router = Router::new();
        router
            .get("/a", &h)
            .unwrap()
            .post("/a", &h)
            .unwrap()
            .patch("/a", [h.clone(), h.clone()])
            .unwrap();

        assert_eq!(router.route_count("GET"), 1);
        assert_eq!(router.route_count("POST"), 1);
        assert_eq!(router.route_count("PATCH"), 2);

        router
            .unpatch("/a", Some(h.clone().into()))
            .unwrap()
            .unget("/a", None)
            .unwrap();
        assert_eq!(router.route_count("PATCH"), 1);
        assert_eq!(router.route_count("GET"), 0);
        assert_eq!(router.route_count("UNKNOWN"), 0);
    }

    #[tokio::test]
    async fn serve_falls_back_to_not_found() {
        let router = Router::new();
        let req = Request::get("/nothing").body(Body::empty()).unwrap();
        let res = router.serve(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn serve_runs_nothing_until_polled() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new();
        {
            let calls = calls.clone();
            router
                .get(
                    "/",
                    handler_fn(move |req, res, next| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        next.run(req, res)
                    }),
                )
                .unwrap();
        }

        let pending = router.serve(Request::get("/").body(Body::empty()).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        pending.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_is_shared_with_earlier_clones() {
        let router = Router::new();
        let earlier = router.clone();

        router.not_found(handler_fn(|_, mut res, _| async move {
            *res.status_mut() = StatusCode::GONE;
            Ok(res)
        }));

        let req = Request::get("/missing").body(Body::empty()).unwrap();
        let res = earlier.serve(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::GONE);
        assert!(format!("{:?}", earlier).contains("not_found: true"));
    }
}
