//! Entry storage and export/import

mod export;
mod request_log;

pub use export::{
    export_log_to_path, export_log_to_string, import_log_from_path, import_log_from_str,
};
pub use request_log::{PersistentLog, STORE_KEY};
