//! Handlers and the continuation that chains them.
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hyper::{Body, Request, Response};

use crate::error::BoxError;
use crate::pattern::Params;

/// The future returned by a [`Handler`]: the response the chain produced.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response<Body>, BoxError>> + Send>>;

/// Represents a route handler, or middleware.
///
/// A handler receives the request, the response being built, and the
/// continuation [`Next`]. Awaiting [`Next::run`] advances to the next
/// matching handler, or to the outer pipeline once the chain is exhausted,
/// and yields the response they produced. Returning a response without
/// running `next` terminates the chain. A handler may await anything before
/// or after advancing.
///
/// Closures are turned into handlers with [`handler_fn`].
pub trait Handler: Send + Sync {
    fn call(&self, req: Request<Body>, res: Response<Body>, next: Next) -> HandlerFuture;
}

/// A shared handler. The allocation is the handler's identity: removing a
/// handler matches on the same `Arc`, not on equal behavior.
pub type SharedHandler = Arc<dyn Handler>;

/// Wraps an asynchronous closure into a [`SharedHandler`].
/// ```rust
/// use megarouter::handler_fn;
///
/// let logger = handler_fn(|req, res, next| async move {
///     println!("{} {}", req.method(), req.uri());
///     next.run(req, res).await
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(Request<Body>, Response<Body>, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Body>, BoxError>> + Send + 'static,
{
    Arc::new(HandlerFn { f })
}

struct HandlerFn<F> {
    f: F,
}

impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Request<Body>, Response<Body>, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Body>, BoxError>> + Send + 'static,
{
    fn call(&self, req: Request<Body>, res: Response<Body>, next: Next) -> HandlerFuture {
        Box::pin((self.f)(req, res, next))
    }
}

pub(crate) fn same_handler(a: &SharedHandler, b: &SharedHandler) -> bool {
    // compare data pointers only, vtables may be duplicated across codegen units
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// A normalized, ordered sequence of handlers.
///
/// Registration and removal accept anything convertible into `Handlers`: a
/// single handler, a `Vec` or array of handlers, or a list of nested
/// `Handlers`. Nested lists are flattened in order.
/// ```rust
/// use megarouter::{handler_fn, Handlers};
///
/// let a = handler_fn(|req, res, next| next.run(req, res));
/// let b = handler_fn(|req, res, next| next.run(req, res));
/// let c = handler_fn(|_, res, _| async move { Ok(res) });
///
/// let nested = Handlers::from(vec![
///     Handlers::from(a),
///     Handlers::from([b, c]),
/// ]);
/// assert_eq!(nested.len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct Handlers(Vec<SharedHandler>);

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler to the end of the sequence.
    pub fn push(mut self, handler: SharedHandler) -> Self {
        self.0.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SharedHandler> {
        self.0.iter()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").field("len", &self.0.len()).finish()
    }
}

impl From<SharedHandler> for Handlers {
    fn from(handler: SharedHandler) -> Self {
        Self(vec![handler])
    }
}

impl From<&SharedHandler> for Handlers {
    fn from(handler: &SharedHandler) -> Self {
        Self(vec![handler.clone()])
    }
}

impl From<Vec<SharedHandler>> for Handlers {
    fn from(handlers: Vec<SharedHandler>) -> Self {
        Self(handlers)
    }
}

impl<const N: usize> From<[SharedHandler; N]> for Handlers {
    fn from(handlers: [SharedHandler; N]) -> Self {
        Self(handlers.into())
    }
}

impl From<Vec<Handlers>> for Handlers {
    fn from(nested: Vec<Handlers>) -> Self {
        nested.into_iter().flatten().collect()
    }
}

impl FromIterator<SharedHandler> for Handlers {
    fn from_iter<I: IntoIterator<Item = SharedHandler>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Handlers {
    type Item = SharedHandler;
    type IntoIter = std::vec::IntoIter<SharedHandler>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A matched handler together with the parameters its pattern extracted.
pub(crate) struct Target {
    pub(crate) handler: SharedHandler,
    pub(crate) params: Params,
}

type End = Box<dyn FnOnce(Request<Body>, Response<Body>) -> HandlerFuture + Send>;

/// The continuation handed to every handler.
///
/// `Next` owns its snapshot of the matched handlers, so it can be moved
/// into a future and run after any amount of waiting. It is consumed by
/// [`run`](Next::run), so a chain advances past a handler at most once.
pub struct Next {
    targets: Arc<[Target]>,
    index: usize,
    end: End,
}

impl Next {
    /// Creates an outer continuation, which runs `end` when invoked.
    ///
    /// This is how a transport hands its own "next stage" to the router's
    /// middleware.
    /// ```rust
    /// use megarouter::{Handler, Next, Router};
    /// use hyper::{Body, Request, Response, StatusCode};
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let router = Router::new();
    /// let req = Request::get("/missing").body(Body::empty()).unwrap();
    ///
    /// let next = Next::new(|_, mut res| async move {
    ///     *res.status_mut() = StatusCode::NOT_FOUND;
    ///     Ok(res)
    /// });
    /// let res = router
    ///     .middleware()
    ///     .call(req, Response::new(Body::empty()), next)
    ///     .await
    ///     .unwrap();
    /// assert_eq!(res.status(), StatusCode::NOT_FOUND);
    /// # }
    /// ```
    pub fn new<F, Fut>(end: F) -> Self
    where
        F: FnOnce(Request<Body>, Response<Body>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<Response<Body>, BoxError>> + Send + 'static,
    {
        Self {
            targets: Arc::from(Vec::new()),
            index: 0,
            end: Box::new(move |req: Request<Body>, res: Response<Body>| -> HandlerFuture {
                Box::pin(end(req, res))
            }),
        }
    }

    /// A continuation that hands back the response unchanged.
    pub fn noop() -> Self {
        Self::new(|_, res| async move { Ok(res) })
    }

    pub(crate) fn chain(targets: Arc<[Target]>, outer: Next) -> Self {
        Self {
            targets,
            index: 0,
            end: Box::new(move |req: Request<Body>, res: Response<Body>| outer.run(req, res)),
        }
    }

    /// Advances the chain: invokes the next matching handler, or the outer
    /// continuation when none remain. Nothing runs until the returned future
    /// is polled.
    pub fn run(mut self, mut req: Request<Body>, res: Response<Body>) -> HandlerFuture {
        Box::pin(async move {
            let target = self
                .targets
                .get(self.index)
                .map(|target| (target.handler.clone(), target.params.clone()));

            match target {
                Some((handler, params)) => {
                    req.extensions_mut().insert(params);
                    self.index += 1;
                    handler.call(req, res, self).await
                }
                None => (self.end)(req, res).await,
            }
        })
    }
}

impl fmt::Debug for Next {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &(self.targets.len() - self.index))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> Request<Body> {
        Request::get("/").body(Body::empty()).unwrap()
    }

    fn pass() -> SharedHandler {
        handler_fn(|req, res, next| next.run(req, res))
    }

    #[test]
    fn nested_handlers_flatten_in_order() {
        let a = pass();
        let b = pass();
        let c = pass();

        let handlers = Handlers::from(vec![
            Handlers::from(&a),
            Handlers::from(vec![b.clone(), c.clone()]),
            Handlers::new(),
        ]);

        let flat: Vec<_> = handlers.into_iter().collect();
        assert_eq!(flat.len(), 3);
        assert!(same_handler(&flat[0], &a));
        assert!(same_handler(&flat[1], &b));
        assert!(same_handler(&flat[2], &c));
    }

    #[test]
    fn identity_is_the_allocation() {
        let a = pass();
        let twin = pass();
        assert!(same_handler(&a, &a.clone()));
        assert!(!same_handler(&a, &twin));
    }

    #[tokio::test]
    async fn chain_runs_targets_then_end() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = calls.clone();
            handler_fn(move |req, res, next| {
                calls.fetch_add(1, Ordering::SeqCst);
                next.run(req, res)
            })
        };
        let targets: Arc<[Target]> = Arc::from(vec![
            Target {
                handler: counted.clone(),
                params: Params::default(),
            },
            Target {
                handler: counted,
                params: Params::default(),
            },
        ]);

        let ended = Arc::new(AtomicUsize::new(0));
        let outer = {
            let ended = ended.clone();
            Next::new(move |_, res| async move {
                ended.fetch_add(1, Ordering::SeqCst);
                Ok(res)
            })
        };

        Next::chain(targets, outer)
            .run(request(), Response::new(Body::empty()))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_is_lazy() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = calls.clone();
            handler_fn(move |req, res, next| {
                calls.fetch_add(1, Ordering::SeqCst);
                next.run(req, res)
            })
        };
        let targets: Arc<[Target]> = Arc::from(vec![Target {
            handler: counted,
            params: Params::default(),
        }]);

        let pending = Next::chain(targets, Next::noop()).run(request(), Response::new(Body::empty()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        pending.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn params_are_visible_to_the_handler() {
        let targets: Arc<[Target]> = Arc::from(vec![Target {
            handler: handler_fn(|req, mut res, _| async move {
                let id = req
                    .extensions()
                    .get::<Params>()
                    .and_then(|params| params.get("id"))
                    .unwrap_or_default()
                    .to_owned();
                *res.body_mut() = Body::from(id);
                Ok(res)
            }),
            params: vec![("id".to_owned(), "5".to_owned())].into_iter().collect(),
        }]);

        let res = Next::chain(targets, Next::noop())
            .run(request(), Response::new(Body::empty()))
            .await
            .unwrap();
        let body = hyper::body::to_bytes(res.into_body()).await.unwrap();
        assert_eq!(&body[..], b"5");
    }
}
