//! The router's dispatch entry point.
use std::sync::Arc;

use hyper::{Body, Request, Response};

use crate::handler::{Handler, HandlerFuture, Next};
use crate::table::RouteTable;

/// Dispatches a request to every binding matching its method and path.
///
/// Obtained from [`Router::middleware`](crate::Router::middleware). Matching
/// handlers run in registration order, each deciding whether to advance the
/// chain. Once the chain is exhausted, or when nothing matched, the outer
/// `next` runs. Since `Middleware` is itself a [`Handler`], a router can be
/// mounted inside another router.
///
/// The request method is looked up exactly as received, so an extension
/// method only matches a route list registered under the same name.
///
/// Handler errors are returned to the caller as they are.
#[derive(Clone)]
pub struct Middleware {
    table: Arc<RouteTable>,
}

impl Middleware {
    pub(crate) fn new(table: Arc<RouteTable>) -> Self {
        Self { table }
    }
}

impl Handler for Middleware {
    fn call(&self, req: Request<Body>, res: Response<Body>, next: Next) -> HandlerFuture {
        let targets = self.table.matching(req.method(), req.uri().path());

        let targets = match targets {
            Some(targets) => targets,
            None => {
                tracing::trace!(method = %req.method(), "method not registered, passing through");
                return next.run(req, res);
            }
        };

        tracing::trace!(
            method = %req.method(),
            path = %req.uri().path(),
            targets = targets.len(),
            "dispatching"
        );

        if targets.is_empty() {
            return next.run(req, res);
        }

        Next::chain(targets.into(), next).run(req, res)
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}
