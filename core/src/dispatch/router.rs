//! Pattern-to-handler dispatch
//!
//! A plain registry built at startup: pattern string to boxed async
//! handler. Decoding failures become `MalformedPayload`; anything the
//! handler itself returns passes through untouched so the delivery
//! layer can classify it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::errors::{CommandError, CommandResult};

type HandlerFuture = Pin<Box<dyn Future<Output = CommandResult<()>> + Send>>;
type Handler = Box<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Explicit command registry
#[derive(Default)]
pub struct Router {
    handlers: HashMap<&'static str, Handler>,
}

impl Router {
    /// Create an empty router
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a pattern
    ///
    /// The payload is decoded into `P` before the handler runs; a decode
    /// failure short-circuits to `MalformedPayload` without invoking it.
    pub fn register<P, F, Fut>(&mut self, pattern: &'static str, handler: F)
    where
        P: DeserializeOwned + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CommandResult<()>> + Send + 'static,
    {
        self.handlers.insert(
            pattern,
            Box::new(move |raw| match serde_json::from_value::<P>(raw) {
                Ok(payload) => Box::pin(handler(payload)),
                Err(err) => {
                    let message = err.to_string();
                    Box::pin(async move { Err(CommandError::MalformedPayload { message }) })
                }
            }),
        );
    }

    /// Patterns with a registered handler
    pub fn patterns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Dispatch a raw payload to the handler registered for `pattern`
    pub async fn route(&self, pattern: &str, payload: Value) -> CommandResult<()> {
        let handler = self
            .handlers
            .get(pattern)
            .ok_or_else(|| CommandError::UnknownPattern {
                pattern: pattern.to_string(),
            })?;
        handler(payload).await
    }
}
