//! Event-driven transport
//!
//! A call instance is configured with `open`, dispatched with `send`, and
//! completed through lifecycle notifications delivered after the fact. Each
//! notification reaches consumers through two mechanisms: a broadcast channel
//! anyone can subscribe to, and one assignable single-slot handler per
//! notification kind. Callers using either mechanism, or both, observe the
//! same completion.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::error::Result;

/// Lifecycle position of an event-driven call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Unsent,
    Opened,
    Done,
}

/// Notification kinds fired over a call's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LoadStart,
    ReadyStateChange,
    Progress,
    Load,
    LoadEnd,
    Error,
}

/// One lifecycle notification.
#[derive(Debug, Clone)]
pub struct CallEvent {
    pub kind: EventKind,
    pub loaded: u64,
    pub total: u64,
}

impl CallEvent {
    pub fn new(kind: EventKind, loaded: u64, total: u64) -> Self {
        Self {
            kind,
            loaded,
            total,
        }
    }
}

type SlotHandler = Box<dyn Fn(&CallEvent) + Send + Sync>;

#[derive(Default)]
struct SlotHandlers {
    on_load_start: Option<SlotHandler>,
    on_ready_state_change: Option<SlotHandler>,
    on_progress: Option<SlotHandler>,
    on_load: Option<SlotHandler>,
    on_load_end: Option<SlotHandler>,
    on_error: Option<SlotHandler>,
}

impl SlotHandlers {
    fn for_kind(&self, kind: EventKind) -> Option<&SlotHandler> {
        match kind {
            EventKind::LoadStart => self.on_load_start.as_ref(),
            EventKind::ReadyStateChange => self.on_ready_state_change.as_ref(),
            EventKind::Progress => self.on_progress.as_ref(),
            EventKind::Load => self.on_load.as_ref(),
            EventKind::LoadEnd => self.on_load_end.as_ref(),
            EventKind::Error => self.on_error.as_ref(),
        }
    }
}

#[derive(Default)]
struct CallState {
    method: Option<String>,
    url: Option<String>,
    ready_state: Option<ReadyState>,
    status: u16,
    status_text: String,
    response_text: String,
    response: Option<serde_json::Value>,
    content_type: Option<String>,
}

/// One event-driven call instance.
///
/// Completion state and notifications may be driven by the real backend or by
/// the response simulator; consumers cannot tell the difference.
pub struct EventCall {
    state: Mutex<CallState>,
    events: broadcast::Sender<CallEvent>,
    slots: Mutex<SlotHandlers>,
}

impl Default for EventCall {
    fn default() -> Self {
        let (events, _rx) = broadcast::channel(64);
        Self {
            state: Mutex::new(CallState::default()),
            events,
            slots: Mutex::new(SlotHandlers::default()),
        }
    }
}

impl EventCall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the call. Stores method and url on the instance and moves it
    /// to the opened state.
    pub fn open(&self, method: &str, url: &str) {
        {
            let mut state = self.state.lock().expect("call mutex poisoned");
            state.method = Some(method.to_string());
            state.url = Some(url.to_string());
            state.ready_state = Some(ReadyState::Opened);
        }
        self.emit(CallEvent::new(EventKind::ReadyStateChange, 0, 0));
    }

    /// Subscribe to lifecycle notifications (the "subscribe many" mechanism).
    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.events.subscribe()
    }

    pub fn set_on_load_start(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots.lock().expect("call mutex poisoned").on_load_start = Some(Box::new(handler));
    }

    pub fn set_on_ready_state_change(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots
            .lock()
            .expect("call mutex poisoned")
            .on_ready_state_change = Some(Box::new(handler));
    }

    pub fn set_on_progress(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots.lock().expect("call mutex poisoned").on_progress = Some(Box::new(handler));
    }

    pub fn set_on_load(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots.lock().expect("call mutex poisoned").on_load = Some(Box::new(handler));
    }

    pub fn set_on_load_end(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots.lock().expect("call mutex poisoned").on_load_end = Some(Box::new(handler));
    }

    pub fn set_on_error(&self, handler: impl Fn(&CallEvent) + Send + Sync + 'static) {
        self.slots.lock().expect("call mutex poisoned").on_error = Some(Box::new(handler));
    }

    /// Deliver one notification through both mechanisms: broadcast first,
    /// then the assigned single-slot handler for this kind, if any.
    pub fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event.clone());
        let slots = self.slots.lock().expect("call mutex poisoned");
        if let Some(handler) = slots.for_kind(event.kind) {
            handler(&event);
        }
    }

    /// Finalize instance fields with a completed response.
    pub fn set_response(
        &self,
        status: u16,
        status_text: impl Into<String>,
        body: impl Into<String>,
        content_type: Option<String>,
    ) {
        let body = body.into();
        let response = match &content_type {
            Some(ct) if ct.contains("json") => serde_json::from_str(&body)
                .unwrap_or_else(|_| serde_json::Value::String(body.clone())),
            _ => serde_json::Value::String(body.clone()),
        };
        let mut state = self.state.lock().expect("call mutex poisoned");
        state.ready_state = Some(ReadyState::Done);
        state.status = status;
        state.status_text = status_text.into();
        state.response_text = body;
        state.response = Some(response);
        state.content_type = content_type;
    }

    /// Mark the call failed without a response.
    pub fn fail(&self, status_text: impl Into<String>) {
        let mut state = self.state.lock().expect("call mutex poisoned");
        state.ready_state = Some(ReadyState::Done);
        state.status = 0;
        state.status_text = status_text.into();
    }

    pub fn method(&self) -> Option<String> {
        self.state.lock().expect("call mutex poisoned").method.clone()
    }

    pub fn url(&self) -> Option<String> {
        self.state.lock().expect("call mutex poisoned").url.clone()
    }

    pub fn ready_state(&self) -> Option<ReadyState> {
        self.state.lock().expect("call mutex poisoned").ready_state
    }

    pub fn status(&self) -> u16 {
        self.state.lock().expect("call mutex poisoned").status
    }

    pub fn status_text(&self) -> String {
        self.state
            .lock()
            .expect("call mutex poisoned")
            .status_text
            .clone()
    }

    pub fn response_text(&self) -> String {
        self.state
            .lock()
            .expect("call mutex poisoned")
            .response_text
            .clone()
    }

    /// Structured response value: parsed JSON when the content type includes
    /// `json`, otherwise the raw body as a string value.
    pub fn response(&self) -> Option<serde_json::Value> {
        self.state.lock().expect("call mutex poisoned").response.clone()
    }

    pub fn content_type(&self) -> Option<String> {
        self.state
            .lock()
            .expect("call mutex poisoned")
            .content_type
            .clone()
    }
}

/// The event-driven transport's real dispatch seam. Given an opened call and
/// the captured payload, an implementation performs the network operation and
/// completes the call through its lifecycle notifications.
#[async_trait]
pub trait EventBackend: Send + Sync {
    async fn execute(
        &self,
        call: std::sync::Arc<EventCall>,
        method: String,
        url: String,
        payload: Option<String>,
    ) -> Result<()>;
}

/// Real event backend backed by reqwest.
pub struct HttpEventBackend {
    client: reqwest::Client,
}

impl HttpEventBackend {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| crate::error::EchoError::Transport(anyhow::Error::new(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EventBackend for HttpEventBackend {
    async fn execute(
        &self,
        call: std::sync::Arc<EventCall>,
        method: String,
        url: String,
        payload: Option<String>,
    ) -> Result<()> {
        call.emit(CallEvent::new(EventKind::LoadStart, 0, 0));

        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|e| crate::error::EchoError::Transport(anyhow::Error::new(e)))?;
        let mut builder = self.client.request(method, &url);
        if let Some(payload) = payload {
            builder = builder.body(payload);
        }

        match builder.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let status_text = response
                    .status()
                    .canonical_reason()
                    .unwrap_or_default()
                    .to_string();
                let headers: HashMap<String, String> = response
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect();
                let content_type = headers.get("content-type").cloned();
                let body = response
                    .text()
                    .await
                    .map_err(|e| crate::error::EchoError::Transport(anyhow::Error::new(e)))?;
                let len = body.len() as u64;

                call.set_response(status, status_text, body, content_type);
                call.emit(CallEvent::new(EventKind::ReadyStateChange, len, len));
                call.emit(CallEvent::new(EventKind::Progress, len, len));
                call.emit(CallEvent::new(EventKind::Load, len, len));
                call.emit(CallEvent::new(EventKind::LoadEnd, len, len));
                Ok(())
            }
            Err(err) => {
                tracing::error!(url = %url, error = %err, "event transport dispatch failed");
                call.fail(err.to_string());
                call.emit(CallEvent::new(EventKind::Error, 0, 0));
                call.emit(CallEvent::new(EventKind::LoadEnd, 0, 0));
                Err(crate::error::EchoError::Transport(anyhow::Error::new(err)))
            }
        }
    }
}
