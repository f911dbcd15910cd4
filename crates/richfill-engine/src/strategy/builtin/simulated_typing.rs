use crate::handle::EditorHandle;
use crate::session::{PageSession, SessionError};
use crate::strategy::{FillStrategy, expect_true};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Types the content key by key, the way a user would.
///
/// Slowest of the techniques, but it goes through the editor's own input
/// handling, so it works on editors that reject script-level mutation.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedTyping {
    per_char_delay: Duration,
}

impl SimulatedTyping {
    pub fn new(per_char_delay: Duration) -> Self {
        Self { per_char_delay }
    }
}

impl Default for SimulatedTyping {
    fn default() -> Self {
        Self::new(Duration::from_millis(20))
    }
}

/// Focus the typing target and select everything in it.
const SELECT_ALL_SCRIPT: &str = r#"(el, args) => {
    if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {
        el.focus();
        el.select();
        return true;
    }
    const target = el.isContentEditable ? el : (el.querySelector('[contenteditable="true"]') || el);
    target.focus();
    const selection = window.getSelection();
    if (!selection) {
        return false;
    }
    const range = document.createRange();
    range.selectNodeContents(target);
    selection.removeAllRanges();
    selection.addRange(range);
    return true;
}"#;

/// Script-side delete, for sessions that cannot press keys.
const DELETE_SELECTION_SCRIPT: &str = r#"(el, args) => {
    if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {
        el.value = '';
        el.dispatchEvent(new Event('input', { bubbles: true }));
        return true;
    }
    document.execCommand('delete', false, null);
    return true;
}"#;

#[async_trait]
impl FillStrategy for SimulatedTyping {
    fn name(&self) -> &'static str {
        "simulated-typing"
    }

    async fn attempt(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        content: &str,
    ) -> Result<(), SessionError> {
        let element = &handle.element;

        let selected = session.run_script(element, SELECT_ALL_SCRIPT, json!({})).await?;
        expect_true(self.name(), selected)?;

        match session.press_key("Backspace", &[]).await {
            Ok(()) => {}
            Err(SessionError::NotSupported(_)) => {
                debug!("press_key unavailable, clearing element {} from script", element.id);
                let cleared = session
                    .run_script(element, DELETE_SELECTION_SCRIPT, json!({}))
                    .await?;
                expect_true(self.name(), cleared)?;
            }
            Err(e) => return Err(e),
        }

        session
            .simulate_typing(element, content, self.per_char_delay)
            .await
    }
}
