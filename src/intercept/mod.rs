//! Traffic interception for both transport shapes
//!
//! The [`Interceptor`] wraps the real transports without changing their call
//! signatures or return contracts. Each outgoing call either short-circuits
//! through the mock matcher and response simulator, or proceeds to the real
//! transport and — for inspectable content types — is recorded together with
//! the UI actions drained from the recorder.
//!
//! The interceptor is an explicit value constructed once with injected
//! references to the original transports. `install()`/`uninstall()` manage a
//! process-wide slot and refuse double installation.

pub mod origin;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use once_cell::sync::Lazy;
use std::backtrace::Backtrace;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{broadcast, mpsc};

use crate::error::{EchoError, Result};
use crate::mock::{simulator, MockMatcher};
use crate::models::{RecordedRequest, RecordedResponse, RequestLogEntry, UiAction};
use crate::recorder::ActionRecorder;
use crate::storage::PersistentLog;
use crate::transport::{
    BodyStream, EventBackend, EventCall, EventKind, FetchRequest, FetchResponse, FetchTransport,
};

/// Process-wide overlay hook, invoked exactly once per mock hit with the
/// matched entry's UI actions. Rendering is the host's business.
pub type OverlayHook = Arc<dyn Fn(Vec<UiAction>) + Send + Sync>;

/// Page-level context supplied by the host: current location and cookies.
pub trait PageContext: Send + Sync {
    fn page_url(&self) -> String;
    fn cookies(&self) -> String;
}

/// Shared interception switches: the process-wide mock-mode flag and the
/// overlay hook slot. Settable from an external control surface while calls
/// are in flight.
#[derive(Default)]
pub struct InterceptConfig {
    mock_mode: AtomicBool,
    overlay_hook: RwLock<Option<OverlayHook>>,
}

impl InterceptConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mock_mode(&self) -> bool {
        self.mock_mode.load(Ordering::SeqCst)
    }

    pub fn set_mock_mode(&self, enabled: bool) {
        self.mock_mode.store(enabled, Ordering::SeqCst);
        tracing::info!(enabled, "mock mode changed");
    }

    pub fn set_overlay_hook(&self, hook: impl Fn(Vec<UiAction>) + Send + Sync + 'static) {
        *self.overlay_hook.write().expect("config lock poisoned") = Some(Arc::new(hook));
    }

    fn invoke_overlay(&self, actions: Vec<UiAction>) {
        let hook = self
            .overlay_hook
            .read()
            .expect("config lock poisoned")
            .clone();
        if let Some(hook) = hook {
            tracing::debug!(actions = actions.len(), "invoking overlay hook");
            hook(actions);
        }
    }
}

/// Only JSON and text responses are inspectable; everything else passes
/// through untouched and is never logged.
fn is_recordable(content_type: &str) -> bool {
    content_type.contains("application/json") || content_type.contains("text")
}

static INSTALLED: Lazy<Mutex<Option<Arc<Interceptor>>>> = Lazy::new(|| Mutex::new(None));

/// Wraps the two real transports, recording misses and answering hits from
/// the store when mock mode is on.
pub struct Interceptor {
    fetch_transport: Arc<dyn FetchTransport>,
    event_backend: Arc<dyn EventBackend>,
    log: Arc<PersistentLog>,
    recorder: Arc<ActionRecorder>,
    matcher: MockMatcher,
    page: Arc<dyn PageContext>,
    config: Arc<InterceptConfig>,
}

impl Interceptor {
    pub fn new(
        fetch_transport: Arc<dyn FetchTransport>,
        event_backend: Arc<dyn EventBackend>,
        log: Arc<PersistentLog>,
        recorder: Arc<ActionRecorder>,
        page: Arc<dyn PageContext>,
        config: Arc<InterceptConfig>,
    ) -> Self {
        let matcher = MockMatcher::new(Arc::clone(&log));
        Self {
            fetch_transport,
            event_backend,
            log,
            recorder,
            matcher,
            page,
            config,
        }
    }

    /// Claim the process-wide interceptor slot. Fails if one is already
    /// installed.
    pub fn install(self: Arc<Self>) -> Result<()> {
        let mut guard = INSTALLED.lock().expect("install slot poisoned");
        if guard.is_some() {
            return Err(EchoError::AlreadyInstalled);
        }
        *guard = Some(self);
        tracing::info!("interceptor installed");
        Ok(())
    }

    /// Release the process-wide slot, returning the interceptor that held it.
    pub fn uninstall() -> Option<Arc<Interceptor>> {
        INSTALLED.lock().expect("install slot poisoned").take()
    }

    /// The currently installed interceptor, if any.
    pub fn installed() -> Option<Arc<Interceptor>> {
        INSTALLED.lock().expect("install slot poisoned").clone()
    }

    pub fn log(&self) -> &Arc<PersistentLog> {
        &self.log
    }

    pub fn recorder(&self) -> &Arc<ActionRecorder> {
        &self.recorder
    }

    pub fn config(&self) -> &Arc<InterceptConfig> {
        &self.config
    }

    /// Promise-style transport wrapper.
    ///
    /// On a mock hit the synthetic response returns immediately and the
    /// overlay hook runs as a deferred task; no real dispatch occurs and no
    /// entry is added. Otherwise the real dispatch proceeds, the caller gets
    /// an untouched response, and recording runs in the background once the
    /// body has fully streamed.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let url = request.url.clone();
        let method = request.method_or_default().to_string();
        let headers = request.headers.clone();
        let payload = request.payload.clone();
        let timestamp = Utc::now();
        let origin_trace = Backtrace::force_capture().to_string();

        if self.config.mock_mode() {
            if let Some(entry) = self.matcher.find(&url, payload.as_deref()) {
                tracing::warn!(url = %url, entry = %entry.id, "answering call from recorded entry");
                let actions = entry.ui_actions.clone();
                let config = Arc::clone(&self.config);
                tokio::spawn(async move {
                    config.invoke_overlay(actions);
                });
                return Ok(simulator::fetch_response(&entry));
            }
        }

        let response = match self.fetch_transport.dispatch(request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(url = %url, error = %err, "transport dispatch failed");
                return Err(err);
            }
        };

        let content_type = response.content_type().map(str::to_string);
        let content_type = match content_type {
            Some(ct) if is_recordable(&ct) => ct,
            _ => return Ok(response),
        };

        let status = response.status;
        let response_headers = response.headers;
        let (caller_body, mut recorded) = tee_body(response.body);

        let log = Arc::clone(&self.log);
        let recorder = Arc::clone(&self.recorder);
        let page = Arc::clone(&self.page);
        tokio::spawn(async move {
            let mut buf = Vec::new();
            while let Some(chunk) = recorded.recv().await {
                match chunk {
                    Ok(bytes) => buf.extend_from_slice(&bytes),
                    // Body failed mid-stream: no entry is produced.
                    Err(()) => return,
                }
            }
            let body = String::from_utf8_lossy(&buf).into_owned();
            finalize_entry(
                &log,
                &recorder,
                page.as_ref(),
                RecordedRequest {
                    url,
                    method,
                    headers,
                    payload,
                },
                status,
                body,
                content_type,
                timestamp,
                origin_trace,
            );
        });

        Ok(FetchResponse {
            status,
            headers: response_headers,
            body: caller_body,
        })
    }

    /// Event-driven transport wrapper, configure step. Stores method and url
    /// on the call instance and delegates to the original configure behavior.
    pub fn open(&self, call: &EventCall, method: &str, url: &str) {
        call.open(method, url);
    }

    /// Event-driven transport wrapper, send step.
    ///
    /// On a mock hit no real network operation happens; a deferred task
    /// drives the full simulated completion protocol and the overlay hook.
    /// Otherwise a completion listener is attached and the original send
    /// behavior runs; caller listeners and slot handlers stay untouched.
    pub fn send(&self, call: &Arc<EventCall>, payload: Option<String>) {
        let url = call.url().unwrap_or_default();
        let method = call.method().unwrap_or_else(|| "GET".to_string());
        let timestamp = Utc::now();
        let origin_trace = Backtrace::force_capture().to_string();

        if self.config.mock_mode() {
            if let Some(entry) = self.matcher.find(&url, payload.as_deref()) {
                tracing::warn!(url = %url, entry = %entry.id, "answering event call from recorded entry");
                let call = Arc::clone(call);
                let config = Arc::clone(&self.config);
                tokio::spawn(async move {
                    simulator::complete_event_call(&call, &entry);
                    config.invoke_overlay(entry.ui_actions.clone());
                });
                return;
            }
        }

        // Attach the completion listener before delegating so nothing the
        // real backend fires can be missed.
        let mut events = call.subscribe();
        let observed = Arc::clone(call);
        let log = Arc::clone(&self.log);
        let recorder = Arc::clone(&self.recorder);
        let page = Arc::clone(&self.page);
        let record_url = url.clone();
        let record_method = method.clone();
        let record_payload = payload.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => match event.kind {
                        EventKind::Load => break,
                        // Failed or aborted call: no entry is produced.
                        EventKind::Error => return,
                        _ => continue,
                    },
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return,
                }
            }

            let content_type = match observed.content_type() {
                Some(ct) if is_recordable(&ct) => ct,
                _ => return,
            };
            finalize_entry(
                &log,
                &recorder,
                page.as_ref(),
                RecordedRequest {
                    url: record_url,
                    method: record_method,
                    // Individual header values are not tracked for this
                    // transport; the headers field is legitimately empty.
                    headers: HashMap::new(),
                    payload: record_payload,
                },
                observed.status(),
                observed.response_text(),
                content_type,
                timestamp,
                origin_trace,
            );
        });

        let backend = Arc::clone(&self.event_backend);
        let call = Arc::clone(call);
        tokio::spawn(async move {
            let _ = backend.execute(call, method, url, payload).await;
        });
    }
}

/// Duplicate a body stream. The first return value is handed back to the
/// caller and stays fully intact; the second feeds the recording task with
/// every chunk independently of the caller's reads. An `Err(())` chunk means
/// the stream failed and nothing must be recorded.
fn tee_body(
    body: BodyStream,
) -> (
    BodyStream,
    mpsc::UnboundedReceiver<std::result::Result<Bytes, ()>>,
) {
    let (caller_tx, caller_rx) = mpsc::unbounded_channel::<Result<Bytes>>();
    let (record_tx, record_rx) = mpsc::unbounded_channel::<std::result::Result<Bytes, ()>>();

    tokio::spawn(async move {
        let mut body = body;
        while let Some(next) = body.next().await {
            match next {
                Ok(chunk) => {
                    let _ = record_tx.send(Ok(chunk.clone()));
                    let caller_alive = caller_tx.send(Ok(chunk)).is_ok();
                    if !caller_alive && record_tx.is_closed() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = record_tx.send(Err(()));
                    let _ = caller_tx.send(Err(err));
                    break;
                }
            }
        }
    });

    let caller_body = futures::stream::unfold(caller_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .boxed();

    (caller_body, record_rx)
}

/// Drain the recorder and append one finalized entry. Called only once a
/// response (real on this path) has fully completed.
#[allow(clippy::too_many_arguments)]
fn finalize_entry(
    log: &PersistentLog,
    recorder: &ActionRecorder,
    page: &dyn PageContext,
    request: RecordedRequest,
    status_code: u16,
    body: String,
    content_type: String,
    timestamp: DateTime<Utc>,
    origin_trace: String,
) {
    let page_url = page.page_url();
    let cookies = origin::same_origin(&request.url, &page_url).then(|| page.cookies());
    let url = request.url.clone();

    let entry = RequestLogEntry::new(
        request,
        RecordedResponse {
            status_code,
            body,
            content_type,
        },
        page_url,
        timestamp,
        cookies,
        recorder.drain(),
        origin_trace,
    );

    match log.append(entry) {
        Ok(()) => tracing::debug!(url = %url, "recorded request log entry"),
        Err(err) => tracing::error!(url = %url, error = %err, "failed to append request log entry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionKind, PathSegment, StructuralPath};
    use crate::transport::CallEvent;
    use async_trait::async_trait;
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct FakeFetchTransport {
        status: u16,
        body: String,
        content_type: String,
        dispatches: AtomicUsize,
    }

    impl FakeFetchTransport {
        fn json(body: &str) -> Self {
            Self::with_content_type(body, "application/json")
        }

        fn with_content_type(body: &str, content_type: &str) -> Self {
            Self {
                status: 200,
                body: body.to_string(),
                content_type: content_type.to_string(),
                dispatches: AtomicUsize::new(0),
            }
        }

        fn dispatch_count(&self) -> usize {
            self.dispatches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FetchTransport for FakeFetchTransport {
        async fn dispatch(&self, _request: FetchRequest) -> Result<FetchResponse> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            Ok(FetchResponse::from_text(
                self.status,
                self.body.clone(),
                self.content_type.clone(),
            ))
        }
    }

    struct FailingFetchTransport;

    #[async_trait]
    impl FetchTransport for FailingFetchTransport {
        async fn dispatch(&self, _request: FetchRequest) -> Result<FetchResponse> {
            Err(EchoError::Transport(anyhow::anyhow!("connection refused")))
        }
    }

    /// Streams the body in several chunks so tee behavior is visible.
    struct ChunkedFetchTransport {
        chunks: Vec<&'static str>,
    }

    #[async_trait]
    impl FetchTransport for ChunkedFetchTransport {
        async fn dispatch(&self, _request: FetchRequest) -> Result<FetchResponse> {
            let mut headers = HashMap::new();
            headers.insert(
                "content-type".to_string(),
                "application/json".to_string(),
            );
            let chunks: Vec<Result<Bytes>> = self
                .chunks
                .iter()
                .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                .collect();
            Ok(FetchResponse {
                status: 200,
                headers,
                body: futures::stream::iter(chunks).boxed(),
            })
        }
    }

    struct FakeEventBackend {
        status: u16,
        body: String,
        content_type: String,
        executions: AtomicUsize,
    }

    impl FakeEventBackend {
        fn json(body: &str) -> Self {
            Self {
                status: 200,
                body: body.to_string(),
                content_type: "application/json".to_string(),
                executions: AtomicUsize::new(0),
            }
        }

        fn execution_count(&self) -> usize {
            self.executions.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventBackend for FakeEventBackend {
        async fn execute(
            &self,
            call: Arc<EventCall>,
            _method: String,
            _url: String,
            _payload: Option<String>,
        ) -> Result<()> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            let len = self.body.len() as u64;
            call.emit(CallEvent::new(EventKind::LoadStart, 0, 0));
            call.set_response(
                self.status,
                "OK",
                self.body.clone(),
                Some(self.content_type.clone()),
            );
            call.emit(CallEvent::new(EventKind::ReadyStateChange, len, len));
            call.emit(CallEvent::new(EventKind::Progress, len, len));
            call.emit(CallEvent::new(EventKind::Load, len, len));
            call.emit(CallEvent::new(EventKind::LoadEnd, len, len));
            Ok(())
        }
    }

    struct FailingEventBackend;

    #[async_trait]
    impl EventBackend for FailingEventBackend {
        async fn execute(
            &self,
            call: Arc<EventCall>,
            _method: String,
            _url: String,
            _payload: Option<String>,
        ) -> Result<()> {
            call.fail("connection refused");
            call.emit(CallEvent::new(EventKind::Error, 0, 0));
            call.emit(CallEvent::new(EventKind::LoadEnd, 0, 0));
            Err(EchoError::Transport(anyhow::anyhow!("connection refused")))
        }
    }

    struct FixedPage;

    impl PageContext for FixedPage {
        fn page_url(&self) -> String {
            "https://app.example.com/home".to_string()
        }

        fn cookies(&self) -> String {
            "session=abc".to_string()
        }
    }

    fn interceptor(
        fetch: Arc<dyn FetchTransport>,
        event: Arc<dyn EventBackend>,
    ) -> Arc<Interceptor> {
        let log = Arc::new(PersistentLog::open_in_memory().expect("store initializes"));
        let recorder = Arc::new(ActionRecorder::new(Box::new(StructuralPath)));
        Arc::new(Interceptor::new(
            fetch,
            event,
            log,
            recorder,
            Arc::new(FixedPage),
            Arc::new(InterceptConfig::new()),
        ))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within timeout");
    }

    #[tokio::test]
    async fn records_json_response_with_drained_actions() {
        let transport = Arc::new(FakeFetchTransport::json("{\"a\":1}"));
        let interceptor = interceptor(transport, Arc::new(FakeEventBackend::json("{}")));

        interceptor
            .recorder()
            .observe_click(&[PathSegment::new("button", 1)]);
        interceptor
            .recorder()
            .observe_input(&[PathSegment::new("input", 1)], "hello");

        let response = interceptor
            .fetch(FetchRequest::get("https://api.example.com/x"))
            .await
            .expect("fetch ok");
        assert_eq!(response.text().await.expect("body reads"), "{\"a\":1}");

        let log = Arc::clone(interceptor.log());
        wait_until(|| log.len() == 1).await;

        let entry = &log.read_all()[0];
        assert_eq!(entry.request.url, "https://api.example.com/x");
        assert_eq!(entry.request.method, "GET");
        assert_eq!(entry.response.status_code, 200);
        assert_eq!(entry.response.body, "{\"a\":1}");
        assert_eq!(entry.response.content_type, "application/json");
        assert_eq!(entry.page_url, "https://app.example.com/home");
        // Cross-origin call: no cookies captured.
        assert_eq!(entry.cookies, None);
        assert!(!entry.origin_trace.is_empty());

        assert_eq!(entry.ui_actions.len(), 2);
        assert_eq!(entry.ui_actions[0].kind, ActionKind::Click);
        assert_eq!(entry.ui_actions[1].value.as_deref(), Some("hello"));
        // Drained into exactly one entry; the buffer is empty again.
        assert!(interceptor.recorder().is_empty());
    }

    #[tokio::test]
    async fn same_origin_calls_capture_cookies() {
        let transport = Arc::new(FakeFetchTransport::json("{}"));
        let interceptor = interceptor(transport, Arc::new(FakeEventBackend::json("{}")));

        interceptor
            .fetch(FetchRequest::get("https://app.example.com/api/x"))
            .await
            .expect("fetch ok")
            .text()
            .await
            .expect("body reads");

        let log = Arc::clone(interceptor.log());
        wait_until(|| log.len() == 1).await;
        assert_eq!(log.read_all()[0].cookies.as_deref(), Some("session=abc"));
    }

    #[tokio::test]
    async fn non_inspectable_content_types_are_never_recorded() {
        let transport = Arc::new(FakeFetchTransport::with_content_type("PNGBYTES", "image/png"));
        let interceptor = interceptor(transport, Arc::new(FakeEventBackend::json("{}")));

        let before = interceptor.log().len();
        let response = interceptor
            .fetch(FetchRequest::get("https://api.example.com/logo.png"))
            .await
            .expect("fetch ok");
        // Returned untouched.
        assert_eq!(response.text().await.expect("body reads"), "PNGBYTES");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(interceptor.log().len(), before);
    }

    #[tokio::test]
    async fn mock_disabled_always_reaches_the_real_transport() {
        let transport = Arc::new(FakeFetchTransport::json("{\"a\":1}"));
        let interceptor = interceptor(
            Arc::clone(&transport) as Arc<dyn FetchTransport>,
            Arc::new(FakeEventBackend::json("{}")),
        );

        for _ in 0..3 {
            interceptor
                .fetch(FetchRequest::get("https://api.example.com/x"))
                .await
                .expect("fetch ok")
                .text()
                .await
                .expect("body reads");
        }
        assert_eq!(transport.dispatch_count(), 3);
    }

    #[tokio::test]
    async fn mock_hit_short_circuits_without_dispatch_or_append() {
        let transport = Arc::new(FakeFetchTransport::json("{\"a\":1}"));
        let interceptor = interceptor(
            Arc::clone(&transport) as Arc<dyn FetchTransport>,
            Arc::new(FakeEventBackend::json("{}")),
        );

        interceptor
            .recorder()
            .observe_click(&[PathSegment::new("button", 1)]);
        interceptor
            .fetch(FetchRequest::get("https://api.example.com/x"))
            .await
            .expect("fetch ok")
            .text()
            .await
            .expect("body reads");
        let log = Arc::clone(interceptor.log());
        wait_until(|| log.len() == 1).await;

        let overlay_actions: Arc<Mutex<Vec<Vec<UiAction>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&overlay_actions);
        interceptor.config().set_overlay_hook(move |actions| {
            sink.lock().unwrap().push(actions);
        });
        interceptor.config().set_mock_mode(true);

        let response = interceptor
            .fetch(FetchRequest::get("https://api.example.com/x"))
            .await
            .expect("mocked fetch ok");
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.text().await.expect("body reads"), "{\"a\":1}");

        // No real dispatch beyond the first recording call, log unchanged.
        assert_eq!(transport.dispatch_count(), 1);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(log.len(), 1);

        // Overlay hook ran exactly once, with the recorded actions.
        let calls = overlay_actions.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].kind, ActionKind::Click);
    }

    #[tokio::test]
    async fn mock_miss_falls_through_to_the_real_transport() {
        let transport = Arc::new(FakeFetchTransport::json("{\"a\":1}"));
        let interceptor = interceptor(
            Arc::clone(&transport) as Arc<dyn FetchTransport>,
            Arc::new(FakeEventBackend::json("{}")),
        );
        interceptor.config().set_mock_mode(true);

        interceptor
            .fetch(FetchRequest::get("https://api.example.com/unmatched"))
            .await
            .expect("fetch ok")
            .text()
            .await
            .expect("body reads");
        assert_eq!(transport.dispatch_count(), 1);
    }

    #[tokio::test]
    async fn transport_errors_propagate_and_record_nothing() {
        let interceptor = interceptor(
            Arc::new(FailingFetchTransport),
            Arc::new(FakeEventBackend::json("{}")),
        );

        let err = interceptor
            .fetch(FetchRequest::get("https://api.example.com/x"))
            .await
            .expect_err("dispatch fails");
        assert!(matches!(err, EchoError::Transport(_)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(interceptor.log().is_empty());
    }

    #[tokio::test]
    async fn caller_stream_stays_intact_while_recording_runs_independently() {
        let transport = Arc::new(ChunkedFetchTransport {
            chunks: vec!["{\"a\"", ":1,", "\"b\":2}"],
        });
        let interceptor = interceptor(transport, Arc::new(FakeEventBackend::json("{}")));

        let response = interceptor
            .fetch(FetchRequest::get("https://api.example.com/x"))
            .await
            .expect("fetch ok");
        let log = Arc::clone(interceptor.log());

        // The recorded copy completes even before the caller reads anything.
        wait_until(|| log.len() == 1).await;
        assert_eq!(log.read_all()[0].response.body, "{\"a\":1,\"b\":2}");

        // The caller's own stream is still fully readable afterwards.
        assert_eq!(
            response.text().await.expect("body reads"),
            "{\"a\":1,\"b\":2}"
        );
    }

    #[tokio::test]
    async fn event_path_records_with_empty_headers() {
        let backend = Arc::new(FakeEventBackend::json("{\"ok\":true}"));
        let interceptor = interceptor(
            Arc::new(FakeFetchTransport::json("{}")),
            Arc::clone(&backend) as Arc<dyn EventBackend>,
        );
        interceptor
            .recorder()
            .observe_input(&[PathSegment::new("input", 1)], "query");

        let call = Arc::new(EventCall::new());
        let load_fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&load_fired);
        call.set_on_load(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        interceptor.open(&call, "POST", "https://api.example.com/search");
        interceptor.send(&call, Some("{\"q\":\"x\"}".to_string()));

        let log = Arc::clone(interceptor.log());
        wait_until(|| log.len() == 1).await;

        let entry = &log.read_all()[0];
        assert_eq!(entry.request.url, "https://api.example.com/search");
        assert_eq!(entry.request.method, "POST");
        assert_eq!(entry.request.payload.as_deref(), Some("{\"q\":\"x\"}"));
        // Header values are not tracked on this transport.
        assert!(entry.request.headers.is_empty());
        assert_eq!(entry.response.body, "{\"ok\":true}");
        assert_eq!(entry.ui_actions.len(), 1);

        // The caller's own slot handler fired independently.
        assert_eq!(load_fired.load(Ordering::SeqCst), 1);
        assert_eq!(backend.execution_count(), 1);
    }

    #[tokio::test]
    async fn event_mock_hit_simulates_completion_without_backend() {
        let backend = Arc::new(FakeEventBackend::json("{}"));
        let interceptor = interceptor(
            Arc::new(FakeFetchTransport::json("{}")),
            Arc::clone(&backend) as Arc<dyn EventBackend>,
        );

        // Record one call through the event path first.
        let first = Arc::new(EventCall::new());
        interceptor.open(&first, "POST", "https://api.example.com/search");
        interceptor.send(&first, Some("{\"q\":\"x\"}".to_string()));
        let log = Arc::clone(interceptor.log());
        wait_until(|| log.len() == 1).await;

        let overlay_hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&overlay_hits);
        interceptor.config().set_overlay_hook(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        interceptor.config().set_mock_mode(true);

        let call = Arc::new(EventCall::new());
        let mut events = call.subscribe();
        interceptor.open(&call, "POST", "https://api.example.com/search");
        interceptor.send(&call, Some("{\"q\":\"x\"}".to_string()));

        // Wait for the simulated completion.
        loop {
            let event = events.recv().await.expect("events flow");
            if event.kind == EventKind::Load {
                break;
            }
        }
        assert_eq!(call.status(), 200);
        assert_eq!(call.status_text(), "OK");
        assert_eq!(call.response_text(), "{}");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.execution_count(), 1, "no second real execution");
        assert_eq!(log.len(), 1, "no new entry on a mock hit");
        assert_eq!(overlay_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn event_errors_record_nothing() {
        let interceptor = interceptor(
            Arc::new(FakeFetchTransport::json("{}")),
            Arc::new(FailingEventBackend),
        );

        let call = Arc::new(EventCall::new());
        interceptor.open(&call, "GET", "https://api.example.com/x");
        interceptor.send(&call, None);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(interceptor.log().is_empty());
    }

    #[test]
    fn recordable_content_types() {
        assert!(is_recordable("application/json"));
        assert!(is_recordable("application/json; charset=utf-8"));
        assert!(is_recordable("text/plain"));
        assert!(is_recordable("text/html"));
        assert!(!is_recordable("image/png"));
        assert!(!is_recordable("application/octet-stream"));
    }

    #[tokio::test]
    #[serial]
    async fn install_slot_refuses_double_installation() {
        let first = interceptor(
            Arc::new(FakeFetchTransport::json("{}")),
            Arc::new(FakeEventBackend::json("{}")),
        );
        let second = interceptor(
            Arc::new(FakeFetchTransport::json("{}")),
            Arc::new(FakeEventBackend::json("{}")),
        );

        Arc::clone(&first).install().expect("first install ok");
        let err = Arc::clone(&second)
            .install()
            .expect_err("second install refused");
        assert!(matches!(err, EchoError::AlreadyInstalled));
        assert!(Interceptor::installed().is_some());

        Interceptor::uninstall().expect("uninstall returns interceptor");
        assert!(Interceptor::installed().is_none());
        second.install().expect("slot free again");
        Interceptor::uninstall();
    }
}
