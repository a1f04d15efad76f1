//! Export and import of the request log as a JSON file
//!
//! Export writes the store's exact serialized content; import replaces the
//! store wholesale with the supplied JSON. Imported content is parsed only to
//! confirm it is JSON, then written verbatim with no schema validation:
//! well-formed JSON of the wrong shape will silently read back as an empty
//! log and break later matching.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::storage::PersistentLog;

/// The store's exact JSON content.
pub fn export_log_to_string(log: &PersistentLog) -> String {
    log.raw_json()
}

/// Write the store's exact JSON content to `path`.
pub fn export_log_to_path(log: &PersistentLog, path: &Path) -> Result<()> {
    let raw = log.raw_json();
    fs::write(path, &raw)?;
    tracing::info!(path = %path.display(), bytes = raw.len(), "exported request log");
    Ok(())
}

/// Replace the store wholesale with the supplied JSON. Returns the number of
/// entries readable afterwards.
pub fn import_log_from_str(log: &PersistentLog, raw: &str) -> Result<usize> {
    log.replace_raw(raw)?;
    let count = log.len();
    tracing::info!(entries = count, "imported request log");
    Ok(count)
}

/// Replace the store wholesale with the JSON content of the file at `path`.
pub fn import_log_from_path(log: &PersistentLog, path: &Path) -> Result<usize> {
    let raw = fs::read_to_string(path)?;
    import_log_from_str(log, &raw)
}
