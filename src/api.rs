//! Control surface for the installed interceptor
//!
//! Thin functions an embedding control panel can call: toggle mock mode, set
//! the overlay hook, and export/import/clear the store. All of them operate
//! on the process-wide installed interceptor.

use std::path::Path;

use crate::error::{EchoError, Result};
use crate::intercept::Interceptor;
use crate::models::UiAction;
use crate::storage;

/// Get the version of the netecho core library
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Initialize tracing output. Safe to call more than once.
pub fn init_logging() {
    let level = resolve_log_level();
    let _ = tracing_subscriber::fmt().with_max_level(level).try_init();
    tracing::info!("netecho core initialized v{}", env!("CARGO_PKG_VERSION"));
}

fn resolve_log_level() -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter;

    match std::env::var("RUST_LOG") {
        Ok(val) => match val.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" | "warning" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        },
        Err(_) => LevelFilter::INFO,
    }
}

fn installed() -> Result<std::sync::Arc<Interceptor>> {
    Interceptor::installed().ok_or(EchoError::NotInstalled)
}

/// Enable or disable mock mode process-wide.
pub fn set_mock_mode(enabled: bool) -> Result<()> {
    installed()?.config().set_mock_mode(enabled);
    Ok(())
}

/// Current state of the mock-mode flag.
pub fn mock_mode() -> Result<bool> {
    Ok(installed()?.config().mock_mode())
}

/// Replace the overlay hook invoked on each mock hit.
pub fn set_overlay_hook(hook: impl Fn(Vec<UiAction>) + Send + Sync + 'static) -> Result<()> {
    installed()?.config().set_overlay_hook(hook);
    Ok(())
}

/// The store's exact JSON content.
pub fn export_log_to_string() -> Result<String> {
    Ok(storage::export_log_to_string(installed()?.log()))
}

/// Write the store's exact JSON content to a file.
pub fn export_log_to_path(path: &Path) -> Result<()> {
    storage::export_log_to_path(installed()?.log(), path)
}

/// Replace the store with caller-supplied JSON.
pub fn import_log_from_str(raw: &str) -> Result<usize> {
    storage::import_log_from_str(installed()?.log(), raw)
}

/// Replace the store with the JSON content of a file.
pub fn import_log_from_path(path: &Path) -> Result<usize> {
    storage::import_log_from_path(installed()?.log(), path)
}

/// Remove all stored entries.
pub fn clear_log() -> Result<()> {
    installed()?.log().clear()
}

/// Number of readable stored entries.
pub fn log_len() -> Result<usize> {
    Ok(installed()?.log().len())
}
