use crate::handle::EditorHandle;
use crate::session::{PageSession, SessionError};
use crate::strategy::{FillStrategy, expect_true};
use async_trait::async_trait;
use serde_json::json;

/// Patches a TipTap/ProseMirror document from script.
///
/// Prefers the editor's own `setContent` command; without an instance it
/// replaces the selection through `execCommand`, which ProseMirror turns into
/// a proper transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentPatch;

const SCRIPT: &str = concat!(
    r#"(el, args) => {
    "#,
    escape_html_js!(),
    r#"
    const root = el.matches('.ProseMirror, .tiptap') ? el : (el.querySelector('.ProseMirror, .tiptap') || el);
    const instance = root.editor || el.editor;
    if (instance && instance.commands && typeof instance.commands.setContent === 'function') {
        const html = args.content
            .split('\n')
            .map((line) => (line ? `<p>${escapeHtml(line)}</p>` : '<p></p>'))
            .join('');
        instance.commands.setContent(html, true);
        return true;
    }
    root.focus();
    const selection = window.getSelection();
    if (!selection) {
        return false;
    }
    const range = document.createRange();
    range.selectNodeContents(root);
    selection.removeAllRanges();
    selection.addRange(range);
    document.execCommand('delete', false, null);
    const inserted = document.execCommand('insertText', false, args.content);
    root.dispatchEvent(new Event('input', { bubbles: true }));
    root.dispatchEvent(new Event('change', { bubbles: true }));
    return inserted !== false;
}"#
);

#[async_trait]
impl FillStrategy for DocumentPatch {
    fn name(&self) -> &'static str {
        "document-patch"
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
