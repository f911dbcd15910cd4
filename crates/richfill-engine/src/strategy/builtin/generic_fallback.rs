use crate::handle::EditorHandle;
use crate::session::{PageSession, SessionError};
use crate::strategy::{FillStrategy, expect_true};
use async_trait::async_trait;
use serde_json::json;

/// Last link of every chain: a best-effort "fill" that works on form controls
/// and on any contenteditable surface, whatever engine sits behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericFallback;

const SCRIPT: &str = r#"(el, args) => {
    if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {
        const proto = el.tagName === 'INPUT' ? HTMLInputElement.prototype : HTMLTextAreaElement.prototype;
        const descriptor = Object.getOwnPropertyDescriptor(proto, 'value');
        el.focus();
        if (descriptor && descriptor.set) {
            descriptor.set.call(el, args.content);
        } else {
            el.value = args.content;
        }
    } else {
        const target = el.isContentEditable ? el : (el.querySelector('[contenteditable="true"]') || el);
        target.focus();
        let inserted = false;
        const selection = window.getSelection();
        if (selection) {
            const range = document.createRange();
            range.selectNodeContents(target);
            selection.removeAllRanges();
            selection.addRange(range);
            inserted = document.execCommand('insertText', false, args.content);
        }
        if (!inserted) {
            target.textContent = args.content;
        }
    }
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
    return true;
}"#;

#[async_trait]
impl FillStrategy for GenericFallback {
    fn name(&self) -> &'static str {
        "generic-fallback"
    }

    async fn attempt(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        content: &str,
    ) -> Result<(), SessionError> {
        let value = session
            .run_script(&handle.element, SCRIPT, json!({ "content": content }))
            .await?;
        expect_true(self.name(), value)
    }
}
