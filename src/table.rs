//! The route table: per method, an ordered list of pattern bindings.
//!
//! List order is registration order. It decides both the order in which
//! matching handlers run and which binding a handler-specific removal hits.
use std::collections::HashMap;
use std::sync::Arc;

use hyper::Method;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::handler::{same_handler, Handlers, SharedHandler, Target};
use crate::pattern::{Pattern, PatternOptions};

// bindings added together share one compiled pattern
struct Binding {
    pattern: Arc<Pattern>,
    handler: SharedHandler,
}

pub(crate) struct RouteTable {
    routes: RwLock<HashMap<Method, Vec<Binding>>>,
    options: PatternOptions,
}

/// Upper-cases `name` and parses it as a method token.
pub(crate) fn canonical_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.to_ascii_uppercase().as_bytes()).map_err(|_| Error::InvalidMethod {
        method: name.to_owned(),
    })
}

impl RouteTable {
    pub(crate) fn new(options: PatternOptions) -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            options,
        }
    }

    /// Adds an empty route list for `method`. Returns false, keeping the
    /// existing bindings, if the method is already registered.
    pub(crate) fn register_method(&self, method: &str) -> Result<bool> {
        Ok(self.insert_method(canonical_method(method)?))
    }

    pub(crate) fn insert_method(&self, method: Method) -> bool {
        let mut routes = self.routes.write();
        if routes.contains_key(&method) {
            return false;
        }

        tracing::debug!(method = %method, "registered method");
        routes.insert(method, Vec::new());
        true
    }

    /// Appends one binding per handler, in order. An empty list of handlers
    /// changes nothing, and nothing is inserted if the pattern does not
    /// compile.
    pub(crate) fn add(&self, method: &str, pattern: &str, handlers: Handlers) -> Result<()> {
        if handlers.is_empty() {
            return Ok(());
        }

        let method = canonical_method(method)?;
        let compiled = Arc::new(Pattern::new(pattern, self.options)?);
        let bindings: Vec<_> = handlers
            .into_iter()
            .map(|handler| Binding {
                pattern: compiled.clone(),
                handler,
            })
            .collect();

        tracing::debug!(
            method = %method,
            pattern = %pattern,
            handlers = bindings.len(),
            "registered route"
        );
        self.routes
            .write()
            .entry(method)
            .or_insert_with(Vec::new)
            .extend(bindings);
        Ok(())
    }

    /// Removes every binding of `pattern`. Returns how many were removed.
    pub(crate) fn remove(&self, method: &str, pattern: &str) -> Result<usize> {
        let method = match canonical_method(method) {
            Ok(method) => method,
            Err(_) => return Ok(0),
        };
        if !self.routes.read().contains_key(&method) {
            return Ok(0);
        }

        let pattern = Pattern::new(pattern, self.options)?;
        let mut routes = self.routes.write();
        let list = match routes.get_mut(&method) {
            Some(list) => list,
            None => return Ok(0),
        };

        let before = list.len();
        list.retain(|binding| *binding.pattern != pattern);
        let removed = before - list.len();

        tracing::debug!(method = %method, pattern = %pattern, removed, "removed route");
        Ok(removed)
    }

    /// For each handler, removes the first binding of `pattern` holding that
    /// same handler. Returns how many were removed.
    pub(crate) fn remove_handlers(
        &self,
        method: &str,
        pattern: &str,
        handlers: Handlers,
    ) -> Result<usize> {
        if handlers.is_empty() {
            return Ok(0);
        }

        let method = match canonical_method(method) {
            Ok(method) => method,
            Err(_) => return Ok(0),
        };
        if !self.routes.read().contains_key(&method) {
            return Ok(0);
        }

        let pattern = Pattern::new(pattern, self.options)?;
        let mut routes = self.routes.write();
        let list = match routes.get_mut(&method) {
            Some(list) => list,
            None => return Ok(0),
        };

        let mut removed = 0;
        for handler in handlers.iter() {
            let position = list
                .iter()
                .position(|b| *b.pattern == pattern && same_handler(&b.handler, handler));
            if let Some(i) = position {
                list.remove(i);
                removed += 1;
            }
        }

        tracing::debug!(
            method = %method,
            pattern = %pattern,
            removed,
            "removed route handlers"
        );
        Ok(removed)
    }

    /// Snapshots the bindings of `method` matching `path`, in order.
    ///
    /// Returns `None` if the method is not registered. The lock is released
    /// before returning, so the handlers can mutate the table.
    pub(crate) fn matching(&self, method: &Method, path: &str) -> Option<Vec<Target>> {
        let routes = self.routes.read();
        let list = routes.get(method)?;

        Some(
            list.iter()
                .filter_map(|binding| {
                    binding.pattern.matches(path).map(|params| Target {
                        handler: binding.handler.clone(),
                        params,
                    })
                })
                .collect(),
        )
    }

    pub(crate) fn methods(&self) -> Vec<Method> {
        self.routes.read().keys().cloned().collect()
    }

    pub(crate) fn len(&self, method: &Method) -> Option<usize> {
        self.routes.read().get(method).map(Vec::len)
    }
}
