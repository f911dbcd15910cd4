use async_trait::async_trait;
pub use richfill_common::error::SessionError;
use richfill_common::protocol::{ElementRef, SelectorDescriptor};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
    pub status: u16,
}

/// The page automation primitives the fill engine is built on.
///
/// Every method is a suspension point; the engine never calls two of them
/// concurrently against the same session.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Probe one selector for an attached, visible element, waiting at most `wait`.
    /// Returns `Ok(None)` when nothing matched in time.
    async fn find_visible(
        &mut self,
        selector: &SelectorDescriptor,
        wait: Duration,
    ) -> Result<Option<ElementRef>, SessionError>;

    /// Read the element's current materialized content (markup for editors,
    /// `value` for form controls).
    async fn read_content(&mut self, element: &ElementRef) -> Result<String, SessionError>;

    /// Dispatch native input events for `text`, one character at a time.
    async fn simulate_typing(
        &mut self,
        element: &ElementRef,
        text: &str,
        per_char_delay: Duration,
    ) -> Result<(), SessionError>;

    /// Run `script`, a JavaScript function expression `(el, args) => ...`,
    /// against the element in its owning document.
    async fn run_script(
        &mut self,
        element: &ElementRef,
        script: &str,
        args: Value,
    ) -> Result<Value, SessionError>;

    /// Monotonic time since the session started.
    fn elapsed(&self) -> Duration;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, _url: &str) -> Result<NavigationResult, SessionError> {
        Err(SessionError::NotSupported("navigate".into()))
    }

    /// Press a key (with optional modifiers) in the focused element.
    async fn press_key(&mut self, _key: &str, _modifiers: &[String]) -> Result<(), SessionError> {
        Err(SessionError::NotSupported("press_key".into()))
    }
}
