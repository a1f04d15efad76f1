//! UI action model
//!
//! A [`UiAction`] captures one user interaction (a click or an input edit)
//! identified by an opaque [`Locator`]. Locators are produced by an injectable
//! [`LocatorStrategy`] from the structural path of the interaction target, so
//! hosts can plug in real DOM traversal while tests substitute deterministic
//! fakes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;

/// Kind of user interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Input,
}

/// Opaque identity of an interaction target.
///
/// Computed at event time from the target's structural position; not
/// guaranteed to remain valid if the document structure changes later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One step of a structural path: element tag name plus the element's 1-based
/// rank among same-tag siblings. Paths are ordered root first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub rank: u32,
}

impl PathSegment {
    pub fn new(tag: impl Into<String>, rank: u32) -> Self {
        Self {
            tag: tag.into(),
            rank,
        }
    }
}

/// Strategy turning a structural path into an opaque [`Locator`].
pub trait LocatorStrategy: Send + Sync {
    fn locate(&self, path: &[PathSegment]) -> Locator;
}

/// Default strategy producing an XPath-style locator such as
/// `/html[1]/body[1]/div[2]/input[1]`.
#[derive(Debug, Default)]
pub struct StructuralPath;

impl LocatorStrategy for StructuralPath {
    fn locate(&self, path: &[PathSegment]) -> Locator {
        if path.is_empty() {
            return Locator::new("/");
        }
        let mut out = String::new();
        for segment in path {
            let _ = write!(out, "/{}[{}]", segment.tag.to_ascii_lowercase(), segment.rank);
        }
        Locator(out)
    }
}

/// One recorded user interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAction {
    pub kind: ActionKind,
    pub locator: Locator,
    /// Present for input edits only: the field's value at event time.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UiAction {
    pub fn click(locator: Locator, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ActionKind::Click,
            locator,
            value: None,
            timestamp,
        }
    }

    pub fn input(locator: Locator, value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind: ActionKind::Input,
            locator,
            value: Some(value.into()),
            timestamp,
        }
    }
}
