//! Synthetic response construction from matched entries
//!
//! Copies status, body, and content type verbatim from the stored entry; no
//! recomputation or re-validation. For the event-driven transport the
//! simulator also drives the call's full completion protocol, so consumers
//! observe exactly what a real completion would have delivered.

use crate::models::RequestLogEntry;
use crate::transport::{CallEvent, EventCall, EventKind, FetchResponse};

/// Mocked status text used for simulated event-call completions.
const SIMULATED_STATUS_TEXT: &str = "OK";

/// Build a synthetic promise-style response from a matched entry.
pub fn fetch_response(entry: &RequestLogEntry) -> FetchResponse {
    FetchResponse::from_text(
        entry.response.status_code,
        entry.response.body.clone(),
        entry.response.content_type.clone(),
    )
}

/// Complete an event-driven call from a matched entry.
///
/// Instance fields are set to the recorded values, then the fixed lifecycle
/// sequence fires exactly once each, in order:
/// start → state-change → progress → completion → end → state-change.
/// Every notification is delivered both to broadcast subscribers and to the
/// assigned single-slot handler of its kind.
pub fn complete_event_call(call: &EventCall, entry: &RequestLogEntry) {
    call.set_response(
        entry.response.status_code,
        SIMULATED_STATUS_TEXT,
        entry.response.body.clone(),
        Some(entry.response.content_type.clone()),
    );

    let len = entry.response.body.len() as u64;
    for kind in [
        EventKind::LoadStart,
        EventKind::ReadyStateChange,
        EventKind::Progress,
        EventKind::Load,
        EventKind::LoadEnd,
        EventKind::ReadyStateChange,
    ] {
        call.emit(CallEvent::new(kind, len, len));
    }
}
