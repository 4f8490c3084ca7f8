//! Unified error types for the ThingsBoard client.
//!
//! A single `Error` enum that every subsystem converts into, so each public
//! operation reports one uniform result.  All variants are `Copy`; nothing
//! here owns heap memory, which keeps the send and dispatch paths
//! allocation-free on failure.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level client error
// ---------------------------------------------------------------------------

/// Every fallible client operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A required argument was empty (host, token, JSON text).
    InvalidArgument(&'static str),
    /// Outbound data could not be encoded into the payload buffer.
    Serialize(SerializeError),
    /// An inbound payload could not be decoded.
    Decode(DecodeError),
    /// RPC registration or dispatch failed.
    Rpc(RpcError),
    /// The transport collaborator reported a failure.
    Transport(TransportError),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(what) => write!(f, "invalid argument: {what}"),
            Self::Serialize(e) => write!(f, "serialize: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Rpc(e) => write!(f, "rpc: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Serialization errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeError {
    /// More values than the document has field slots.
    TooManyFields,
    /// Encoded JSON does not fit in `capacity - 1` bytes.
    BufferTooSmall,
    /// A value could not be written into the document.
    SerializeFailed,
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyFields => write!(f, "too much JSON fields passed"),
            Self::BufferTooSmall => write!(f, "too small buffer for JSON data"),
            Self::SerializeFailed => write!(f, "unable to serialize data"),
        }
    }
}

impl From<SerializeError> for Error {
    fn from(e: SerializeError) -> Self {
        Self::Serialize(e)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is longer than `capacity - 1` bytes.
    PayloadTooLarge,
    /// Payload is not valid JSON.
    Malformed,
    /// The document needs more field slots than the budget allows.
    FieldBudgetExceeded,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "payload exceeds buffer"),
            Self::Malformed => write!(f, "malformed JSON"),
            Self::FieldBudgetExceeded => write!(f, "field budget exceeded"),
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

// ---------------------------------------------------------------------------
// RPC errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcError {
    /// A handler set is already installed on this client.
    AlreadySubscribed,
    /// Inbound message is not addressed to the RPC request channel.
    UnexpectedTopic,
    /// Request has no string `"method"` field.
    MissingMethod,
    /// No registered handler matches the request's method.
    HandlerNotFound,
    /// Derived response topic does not fit the topic buffer.
    TopicTooLong,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySubscribed => write!(f, "already subscribed"),
            Self::UnexpectedTopic => write!(f, "not an RPC request topic"),
            Self::MissingMethod => write!(f, "RPC method is missing"),
            Self::HandlerNotFound => write!(f, "no handler for method"),
            Self::TopicTooLong => write!(f, "response topic too long"),
        }
    }
}

impl From<RpcError> for Error {
    fn from(e: RpcError) -> Self {
        Self::Rpc(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    ConnectFailed,
    PublishFailed,
    SubscribeFailed,
    UnsubscribeFailed,
    PollFailed,
    PostFailed,
    /// Server answered with a non-2xx status code.
    BadStatus(u16),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect to server failed"),
            Self::PublishFailed => write!(f, "publish failed"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::UnsubscribeFailed => write!(f, "unsubscribe failed"),
            Self::PollFailed => write!(f, "event processing failed"),
            Self::PostFailed => write!(f, "HTTP post failed"),
            Self::BadStatus(code) => write!(f, "HTTP status {code}"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Client-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
