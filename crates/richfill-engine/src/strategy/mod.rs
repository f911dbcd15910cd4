//! Fill strategies.
//!
//! A strategy is a named, stateless technique for putting text into an
//! editor. It only touches the target editor, overwrites rather than appends,
//! and never judges its own success: the executor verifies every attempt.

use crate::handle::EditorHandle;
use crate::session::{PageSession, SessionError};
use async_trait::async_trait;
use serde_json::Value;

/// JavaScript `escapeHtml` helper, spliced into scripts with `concat!`.
macro_rules! escape_html_js {
    () => {
        r#"const escapeHtml = (s) => s
        .replace(/&/g, '&amp;')
        .replace(/</g, '&lt;')
        .replace(/>/g, '&gt;')
        .replace(/"/g, '&quot;');
    "#
    };
}

pub mod builtin;

pub use builtin::{DirectModelMutation, DocumentPatch, GenericFallback, SimulatedTyping};

#[async_trait]
pub trait FillStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Inject `content` into the editor. `Err` means the underlying call
    /// itself failed, as opposed to "ran but the content is wrong".
    async fn attempt(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        content: &str,
    ) -> Result<(), SessionError>;
}

/// Injected scripts report completion as a literal `true`.
pub(crate) fn expect_true(strategy: &str, value: Value) -> Result<(), SessionError> {
    match value {
        Value::Bool(true) => Ok(()),
        other => Err(SessionError::ScriptError(format!(
            "{} script reported failure: {}",
            strategy, other
        ))),
    }
}
