use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Short bounded wait used for section roots and late-rendering fields.
pub const SHORT_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum DomError {
    #[error("element not found: {0}")]
    NotFound(String),
    #[error("timed out waiting for: {0}")]
    Timeout(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("captcha challenge interposed")]
    CaptchaRequired,
}

/// Element lookup strategy.
///
/// `Tag` searches descendants and yields matches in document order. `Path`
/// walks structural steps (`./div/div[2]/a[@href]`, `li[last()]`,
/// `child::*`), relative to its root or from the document when absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator<'a> {
    Tag(&'a str),
    Path(&'a str),
}

impl fmt::Display for Locator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Tag(tag) => write!(f, "<{}>", tag),
            Locator::Path(path) => write!(f, "{}", path),
        }
    }
}

/// Capability contract for the rendered-document session that all
/// extraction runs against. Implementations own navigation, lookup and
/// bounded waits; they never retry. Callers own retry policy.
pub trait DomAccessor {
    type Node: Clone;

    fn navigate(&mut self, url: &str) -> Result<(), DomError>;

    /// Viewport scroll. Non-rendering implementations may treat this as a
    /// no-op.
    fn scroll_by(&mut self, y: i64);

    fn locate(&self, root: Option<&Self::Node>, locator: &Locator)
        -> Result<Self::Node, DomError>;

    fn locate_all(&self, root: Option<&Self::Node>, locator: &Locator) -> Vec<Self::Node>;

    fn await_presence(
        &self,
        root: Option<&Self::Node>,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Node, DomError>;

    fn await_visible(
        &self,
        root: Option<&Self::Node>,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Self::Node, DomError>;

    fn text(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Simulates activation, e.g. a click on a disclosure control. Mutates
    /// document state: subsequent lookups may resolve differently.
    fn trigger(&mut self, node: &Self::Node) -> Result<(), DomError>;
}

/// Reads the text of an optional field; `None` when the element is absent.
pub fn text_of<D: DomAccessor>(dom: &D, root: &D::Node, locator: &Locator) -> Option<String> {
    dom.locate(Some(root), locator).ok().map(|node| dom.text(&node))
}

/// Bounded-wait variant of [`text_of`] for fields that render late.
pub fn await_text_of<D: DomAccessor>(
    dom: &D,
    root: &D::Node,
    locator: &Locator,
    timeout: Duration,
) -> Option<String> {
    dom.await_presence(Some(root), locator, timeout)
        .ok()
        .map(|node| dom.text(&node))
}
