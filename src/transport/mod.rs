//! Transport shapes wrapped by the interceptor
//!
//! Two asynchronous call shapes are supported: a promise-style transport
//! where a single call yields an eventual response ([`fetch`]), and an
//! event-driven transport where a call instance is configured, sent, and
//! completed through later lifecycle notifications ([`event`]). Real network
//! implementations of both are backed by `reqwest`; tests and embedders can
//! substitute their own implementations of the transport traits.

pub mod event;
pub mod fetch;

pub use event::{
    CallEvent, EventBackend, EventCall, EventKind, HttpEventBackend, ReadyState,
};
pub use fetch::{BodyStream, FetchRequest, FetchResponse, FetchTransport, HttpFetchTransport};
