//! # MegaRouter
//!
//! MegaRouter is an HTTP route table for [hyper](https://hyper.rs) whose routes and middleware can be
//! added and removed at runtime.
//!
//! Routes are registered per request method. Unlike routers that pick a single winner, every
//! pattern matching the request path takes part: its handlers run in registration order as a
//! chain, and each handler decides whether to pass control on. Internally, patterns are compiled
//! with the [matchit](https://github.com/ibraheemdev/matchit) package.
//!
//! ## Features
//!
//! **Dynamic routes:** Handlers can be bound and unbound while the router is serving. Requests
//! already in flight keep the chain they matched.
//!
//! **Handler chains:** Any number of handlers can be bound to a pattern, and any number of
//! patterns can match a path. A handler advances the chain with `next.run(req, res).await`, or
//! ends it by returning its response. Handlers are asynchronous and may await anything before or
//! after advancing.
//!
//! **Composable:** The router's [`Middleware`] is itself a [`Handler`], so it can be mounted
//! inside another pipeline, or inside another router. It can also be served directly with
//! [`Router::into_service`].
//!
//! ## Usage
//!
//! Here is a simple example:
//!
//! ```rust,no_run
//! use megarouter::{handler_fn, Params, Router};
//! use hyper::Body;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let router = Router::new();
//!
//!     router
//!         .get("/", handler_fn(|_, mut res, _| async move {
//!             *res.body_mut() = Body::from("Hello, World!");
//!             Ok(res)
//!         }))?
//!         .get("/hello/:user", handler_fn(|req, mut res, _| async move {
//!             let user = req
//!                 .extensions()
//!                 .get::<Params>()
//!                 .and_then(|params| params.get("user"))
//!                 .unwrap_or("stranger")
//!                 .to_owned();
//!             *res.body_mut() = Body::from(format!("Hello, {}", user));
//!             Ok(res)
//!         }))?;
//!
//!     hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!         .serve(router.into_service())
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ### Named parameters
//!
//! As you can see, `:user` is a *named parameter*. The values are accessible via
//! `req.extensions().get::<Params>()`. Each handler sees the parameters of the pattern it was
//! bound to.
//!
//! Literal parts of a pattern match regardless of ASCII case, unless the router is built with
//! [`RouterConfig::sensitive`]. Named parameters only match a single path segment:
//!
//! ```ignore
//! Pattern: /user/:user
//!
//!  /user/gordon              match
//!  /user/you                 match
//!  /user/gordon/profile      no match
//!  /user/                    no match
//! ```
//!
//! ### Catch-All parameters
//!
//! The second type are *catch-all* parameters and have the form `*name`, or just `*`. Like the
//! name suggests, they match everything, including nothing. Therefore they must always be at the
//! **end** of the pattern:
//!
//! ```ignore
//! Pattern: /src/*filepath
//!
//!  /src/                     match
//!  /src/somefile.go          match
//!  /src/subdir/somefile.go   match
//! ```
//!
//! ## Chains and fallthrough
//!
//! ```rust
//! use megarouter::{handler_fn, Handler, Next, Router};
//! use hyper::{Body, Request, Response};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let router = Router::new();
//! let h1 = handler_fn(|req, res, next| next.run(req, res));
//! let h2 = handler_fn(|req, res, next| async move {
//!     tokio::task::yield_now().await;
//!     next.run(req, res).await
//! });
//! router.get("/x", [h1, h2]).unwrap();
//!
//! let fell_through = Arc::new(AtomicUsize::new(0));
//! let req = Request::get("/x").body(Body::empty()).unwrap();
//! let next = {
//!     let fell_through = fell_through.clone();
//!     Next::new(move |_, res| async move {
//!         fell_through.fetch_add(1, Ordering::SeqCst);
//!         Ok(res)
//!     })
//! };
//!
//! router
//!     .middleware()
//!     .call(req, Response::new(Body::empty()), next)
//!     .await
//!     .unwrap();
//! assert_eq!(fell_through.load(Ordering::SeqCst), 1);
//! # }
//! ```
//!
//! ### Not Found Handler
//!
//! When the router is served on its own, requests falling through the chain reach the
//! [`Router::not_found`] handler, or get an empty `404` response:
//!
//! ```rust
//! use megarouter::{handler_fn, Router};
//! use hyper::{Body, StatusCode};
//!
//! let router = Router::new();
//! router.not_found(handler_fn(|_, mut res, _| async move {
//!     *res.status_mut() = StatusCode::GONE;
//!     *res.body_mut() = Body::from("nothing here");
//!     Ok(res)
//! }));
//! ```

#![forbid(unsafe_code)]

mod config;
mod error;
mod handler;
mod middleware;
mod pattern;
mod table;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use config::{RouterConfig, DEFAULT_METHODS};
#[doc(inline)]
pub use error::{BoxError, Error, Result};
#[doc(inline)]
pub use handler::{handler_fn, Handler, HandlerFuture, Handlers, Next, SharedHandler};
#[doc(inline)]
pub use middleware::Middleware;
#[doc(inline)]
pub use pattern::{Params, Pattern, PatternOptions};
#[doc(inline)]
pub use router::Router;

// test the code examples in README.md
#[cfg(doctest)]
mod test_readme {
  macro_rules! doc_comment {
    ($x:expr) => {
        #[doc = $x]
        extern {}
    };
  }

  doc_comment!(include_str!("../README.md"));
}
