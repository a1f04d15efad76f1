//! UI action buffering
//!
//! [`ActionRecorder`] buffers user interactions between network calls. Hosts
//! feed it capture-phase events (so actions are observed even if application
//! code stops propagation); the recorder itself is host-agnostic and only sees
//! structural paths. Clicks accumulate in order; input edits coalesce per
//! locator so only the latest value survives. [`ActionRecorder::drain`] hands
//! the buffered actions to exactly one log entry and clears the buffer in a
//! single atomic step.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::models::{Locator, LocatorStrategy, PathSegment, UiAction};

struct BufferedInput {
    value: String,
    timestamp: DateTime<Utc>,
}

#[derive(Default)]
struct Buffers {
    clicks: Vec<UiAction>,
    /// Latest value per locator, in first-seen order.
    inputs: Vec<(Locator, BufferedInput)>,
}

/// Buffers UI interactions until the next network call drains them.
pub struct ActionRecorder {
    strategy: Box<dyn LocatorStrategy>,
    buffers: Mutex<Buffers>,
}

impl ActionRecorder {
    pub fn new(strategy: Box<dyn LocatorStrategy>) -> Self {
        Self {
            strategy,
            buffers: Mutex::new(Buffers::default()),
        }
    }

    /// Record a click on the element at `path`. Clicks are never coalesced.
    pub fn observe_click(&self, path: &[PathSegment]) {
        let locator = self.strategy.locate(path);
        let action = UiAction::click(locator, Utc::now());
        let mut buffers = self.buffers.lock().expect("recorder mutex poisoned");
        buffers.clicks.push(action);
    }

    /// Record an input edit on the element at `path`. Repeat edits on the
    /// same locator overwrite the buffered value.
    pub fn observe_input(&self, path: &[PathSegment], value: &str) {
        let locator = self.strategy.locate(path);
        let buffered = BufferedInput {
            value: value.to_string(),
            timestamp: Utc::now(),
        };
        let mut buffers = self.buffers.lock().expect("recorder mutex poisoned");
        if let Some(slot) = buffers.inputs.iter_mut().find(|(l, _)| *l == locator) {
            slot.1 = buffered;
        } else {
            buffers.inputs.push((locator, buffered));
        }
    }

    /// Read and clear the buffered actions as one atomic step.
    ///
    /// Returns clicks first, in original order, followed by one input action
    /// per distinct locator.
    pub fn drain(&self) -> Vec<UiAction> {
        let mut buffers = self.buffers.lock().expect("recorder mutex poisoned");
        let drained = std::mem::take(&mut *buffers);
        drop(buffers);

        let mut actions = drained.clicks;
        for (locator, input) in drained.inputs {
            actions.push(UiAction::input(locator, input.value, input.timestamp));
        }
        actions
    }

    pub fn is_empty(&self) -> bool {
        let buffers = self.buffers.lock().expect("recorder mutex poisoned");
        buffers.clicks.is_empty() && buffers.inputs.is_empty()
    }
}
