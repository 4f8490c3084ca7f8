//! RPC handler registration entries.

use core::fmt;

use crate::json::RpcResponse;

/// Params handed to a handler: the request's `"params"` value, or `null`.
pub type RpcData = serde_json::Value;

type Handler<'h> = dyn FnMut(&RpcData) -> RpcResponse<'h> + 'h;

/// A method name bound to the handler that answers it.
pub struct RpcCallback<'h> {
    name: &'h str,
    handler: Box<Handler<'h>>,
}

impl<'h> RpcCallback<'h> {
    pub fn new<F>(name: &'h str, handler: F) -> Self
    where
        F: FnMut(&RpcData) -> RpcResponse<'h> + 'h,
    {
        Self {
            name,
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &'h str {
        self.name
    }

    pub(crate) fn call(&mut self, params: &RpcData) -> RpcResponse<'h> {
        (self.handler)(params)
    }
}

impl fmt::Debug for RpcCallback<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcCallback")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
