//! # netecho
//!
//! Client-side record/replay engine for application network traffic.
//!
//! netecho wraps an application's outbound call transports, records each
//! request/response pair together with the UI actions that preceded it, and —
//! when mock mode is enabled — answers a matching new call from the store
//! instead of touching the network, replaying the originating UI actions
//! through an overlay hook.
//!
//! ## Features
//!
//! - Interception of two transport shapes: a promise-style single-call
//!   transport and an event-driven open/send transport
//! - Capture restricted to inspectable content types (JSON and text)
//! - Correlation of buffered UI actions to the network call that follows them
//! - Exact-match mocking against previously recorded calls
//! - Faithful simulation of each transport's completion protocol, including
//!   dual notification styles (subscribed events and single-slot handlers)
//! - Append-only persistent store with export/import
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     Host application                      │
//! ├───────────────────────────────────────────────────────────┤
//! │                   netecho Interceptor                     │
//! │  ┌──────────┐  ┌─────────┐  ┌───────────┐  ┌───────────┐  │
//! │  │  Action  │  │  Mock   │  │ Response  │  │Persistent │  │
//! │  │ Recorder │──│ Matcher │──│ Simulator │──│    Log    │  │
//! │  └──────────┘  └─────────┘  └───────────┘  └───────────┘  │
//! ├───────────────────────────────────────────────────────────┤
//! │          Real transports (promise / event-driven)         │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod error;
pub mod intercept;
pub mod mock;
pub mod models;
pub mod recorder;
pub mod storage;
pub mod transport;

pub use error::{EchoError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
