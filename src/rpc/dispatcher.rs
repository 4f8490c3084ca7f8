//! RPC registry and request dispatcher.
//!
//! The dispatcher owns the handler table and the subscribed flag. It does
//! not talk to a transport: the client feeds it `(topic, payload)` from
//! event processing and publishes the [`RpcReply`] it returns.
//!
//! ```text
//! Unsubscribed ──install──▶ Subscribed
//!      ▲                        │
//!      └──── clear (unsubscribe / connect)
//! ```

use log::{debug, info, warn};
use serde_json::Value;

use super::callback::{RpcCallback, RpcData};
use crate::config::UnknownMethodPolicy;
use crate::error::{DecodeError, Result, RpcError};
use crate::json::{RpcResponse, deserialize_bounded, serialize_keyval};
use crate::topics::{self, Topic};

/// A response ready to publish: `response[..len]` goes to `topic`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    pub topic: Topic,
    pub len: usize,
    /// False when no handler matched and a `null` reply was produced.
    pub handler_found: bool,
}

#[derive(Debug, Default)]
pub struct RpcDispatcher<'h> {
    callbacks: Vec<RpcCallback<'h>>,
    subscribed: bool,
    unknown_method: UnknownMethodPolicy,
}

impl<'h> RpcDispatcher<'h> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(unknown_method: UnknownMethodPolicy) -> Self {
        Self {
            unknown_method,
            ..Self::default()
        }
    }

    /// Install a full handler set. Rejected while another set is active;
    /// the active set is left as it was.
    pub fn install(&mut self, callbacks: impl IntoIterator<Item = RpcCallback<'h>>) -> Result<()> {
        if self.subscribed {
            warn!("RPC: already subscribed");
            return Err(RpcError::AlreadySubscribed.into());
        }
        self.callbacks = callbacks.into_iter().collect();
        self.subscribed = true;
        info!("RPC: {} handler(s) installed", self.callbacks.len());
        Ok(())
    }

    /// Drop the handler set. No-op when nothing is installed.
    pub fn clear(&mut self) {
        if self.subscribed {
            debug!("RPC: handlers cleared");
        }
        self.callbacks.clear();
        self.subscribed = false;
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn handler_count(&self) -> usize {
        self.callbacks.len()
    }

    pub fn unknown_method_policy(&self) -> UnknownMethodPolicy {
        self.unknown_method
    }

    pub fn set_unknown_method_policy(&mut self, policy: UnknownMethodPolicy) {
        self.unknown_method = policy;
    }

    /// Handle one inbound request.
    ///
    /// `response` is the `PayloadSize` buffer: the request must fit in
    /// `response.len() - 1` bytes and so must the encoded reply. On error
    /// nothing should be published.
    pub fn dispatch(
        &mut self,
        topic: &str,
        payload: &[u8],
        field_budget: usize,
        response: &mut [u8],
    ) -> Result<RpcReply> {
        if !topics::is_rpc_request(topic) {
            warn!("RPC: ignoring message on '{}'", topic);
            return Err(RpcError::UnexpectedTopic.into());
        }
        if payload.len() > response.len().saturating_sub(1) {
            warn!(
                "RPC[{}]: payload of {} bytes exceeds buffer",
                topic,
                payload.len()
            );
            return Err(DecodeError::PayloadTooLarge.into());
        }

        let request = deserialize_bounded(payload, field_budget).inspect_err(|e| {
            warn!("RPC[{}]: unable to de-serialize request: {}", topic, e);
        })?;

        let Some(method) = request.get("method").and_then(Value::as_str) else {
            warn!("RPC[{}]: RPC method is NULL", topic);
            return Err(RpcError::MissingMethod.into());
        };
        debug!("RPC[{}]: method '{}'", topic, method);

        let handler = self.callbacks.iter_mut().find(|cb| cb.name() == method);
        let (result, handler_found) = match handler {
            Some(cb) => {
                let null = Value::Null;
                let params: &RpcData = match request.get("params") {
                    Some(p) => p,
                    None => {
                        info!("RPC[{}]: no parameters passed with '{}'", topic, method);
                        &null
                    }
                };
                info!("RPC[{}]: calling '{}'", topic, method);
                (cb.call(params), true)
            }
            None => match self.unknown_method {
                UnknownMethodPolicy::ReplyNull => {
                    warn!("RPC[{}]: no handler for '{}', replying null", topic, method);
                    (RpcResponse::none(), false)
                }
                UnknownMethodPolicy::Suppress => {
                    warn!("RPC[{}]: no handler for '{}'", topic, method);
                    return Err(RpcError::HandlerNotFound.into());
                }
            },
        };

        let reply_topic = topics::response_topic(topic)?;
        let len = serialize_keyval(&result, response).inspect_err(|e| {
            warn!("RPC[{}]: unable to serialize response: {}", topic, e);
        })?;
        Ok(RpcReply {
            topic: reply_topic,
            len,
            handler_found,
        })
    }
}
