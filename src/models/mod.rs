//! Data models for the record/replay engine

pub mod action;
pub mod entry;

pub use action::*;
pub use entry::*;
