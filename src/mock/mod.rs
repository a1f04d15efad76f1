//! Mock matching and response simulation

pub mod matcher;
pub mod simulator;

pub use matcher::MockMatcher;
