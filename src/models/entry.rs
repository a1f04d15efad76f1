//! Request log entry model
//!
//! Represents a single recorded request/response pair together with the UI
//! actions that preceded it and the page context at call time. Entries are
//! immutable once appended to the store; the serialized field names below are
//! the store's on-disk wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::UiAction;

/// The request half of a recorded call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRequest {
    pub url: String,
    pub method: String,
    /// Outgoing header map. Always empty for the event-driven transport,
    /// whose wrapper does not track individual header values.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payload: Option<String>,
}

/// The response half of a recorded call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// One recorded request/response pair with its correlated context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    /// Unique identifier for this entry
    #[serde(default)]
    pub id: String,

    pub request: RecordedRequest,
    pub response: RecordedResponse,

    /// Location of the page when the call was issued
    #[serde(rename = "pageURL")]
    pub page_url: String,

    /// When the call was issued
    pub timestamp: DateTime<Utc>,

    /// Page cookies, captured only when the call's origin matches the page
    /// origin
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cookies: Option<String>,

    /// UI actions drained from the recorder when this entry was finalized,
    /// clicks first in original order, then one input per distinct locator
    #[serde(rename = "uiActions", default)]
    pub ui_actions: Vec<UiAction>,

    /// Stack trace captured at call time
    #[serde(rename = "originTrace", default)]
    pub origin_trace: String,
}

impl RequestLogEntry {
    /// Create a new entry with a fresh id. The caller supplies the timestamp
    /// captured when the call was issued, not when the entry is finalized.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request: RecordedRequest,
        response: RecordedResponse,
        page_url: impl Into<String>,
        timestamp: DateTime<Utc>,
        cookies: Option<String>,
        ui_actions: Vec<UiAction>,
        origin_trace: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            request,
            response,
            page_url: page_url.into(),
            timestamp,
            cookies,
            ui_actions,
            origin_trace: origin_trace.into(),
        }
    }
}
