//! Result observers attached to a context.
//!
//! A chain is an ordered list. Chaining appends, and every completion walks the
//! list front to back, so an outer `store` clause (registered first) observes
//! before the inner ones.

use std::fmt;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::server::CommandServer;
use crate::store::StoreCallback;

/// Custom observer signature.
pub type ObserverFn = dyn Fn(&mut dyn CommandServer, &ExecutionContext, bool, i32);

/// One observer of `(success, result)` completions.
#[derive(Clone)]
pub enum ResultCallback {
    /// Write the outcome into a score, boss bar or data path.
    Store(StoreCallback),
    /// Arbitrary observer supplied by the embedding server.
    Observer(Arc<ObserverFn>),
}

impl ResultCallback {
    pub fn observer<F>(f: F) -> Self
    where
        F: Fn(&mut dyn CommandServer, &ExecutionContext, bool, i32) + 'static,
    {
        Self::Observer(Arc::new(f))
    }

    pub fn invoke(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        success: bool,
        result: i32,
    ) {
        match self {
            Self::Store(store) => store.apply(server, success, result),
            Self::Observer(observer) => observer(server, ctx, success, result),
        }
    }
}

impl fmt::Debug for ResultCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(store) => f.debug_tuple("Store").field(store).finish(),
            Self::Observer(_) => f.write_str("Observer(..)"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallbackChain {
    callbacks: Vec<ResultCallback>,
}

impl CallbackChain {
    pub fn single(callback: ResultCallback) -> Self {
        Self {
            callbacks: vec![callback],
        }
    }

    /// Append `callback` after everything already in the chain.
    pub fn then(mut self, callback: ResultCallback) -> Self {
        self.callbacks.push(callback);
        self
    }

    /// `first` followed by `second`.
    pub fn combine(first: &Self, second: &Self) -> Self {
        Self {
            callbacks: first
                .callbacks
                .iter()
                .chain(&second.callbacks)
                .cloned()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn invoke(
        &self,
        server: &mut dyn CommandServer,
        ctx: &ExecutionContext,
        success: bool,
        result: i32,
    ) {
        for callback in &self.callbacks {
            callback.invoke(server, ctx, success, result);
        }
    }
}
