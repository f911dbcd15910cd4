use crate::handle::EditorHandle;
use crate::session::{PageSession, SessionError};
use crate::strategy::{FillStrategy, expect_true};
use async_trait::async_trait;
use serde_json::json;

/// Writes straight into Quill's document model.
///
/// Uses the live Quill instance when one is reachable; otherwise rebuilds the
/// editor's paragraph markup, which Quill re-reads on the next `input` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectModelMutation;

const SCRIPT: &str = concat!(
    r#"(el, args) => {
    "#,
    escape_html_js!(),
    r#"
    const editor = el.classList.contains('ql-editor') ? el : (el.querySelector('.ql-editor') || el);
    const container = editor.closest('.ql-container');
    let quill = (container && container.__quill) || editor.__quill || null;
    if (!quill && container && window.Quill && typeof window.Quill.find === 'function') {
        quill = window.Quill.find(container);
    }
    if (quill && typeof quill.setText === 'function') {
        quill.setText(args.content, 'user');
        return true;
    }
    editor.innerHTML = args.content
        .split('\n')
        .map((line) => (line ? `<p>${escapeHtml(line)}</p>` : '<p><br></p>'))
        .join('');
    editor.dispatchEvent(new Event('input', { bubbles: true }));
    editor.dispatchEvent(new Event('change', { bubbles: true }));
    editor.focus();
    return true;
}"#
);

#[async_trait]
impl FillStrategy for DirectModelMutation {
    fn name(&self) -> &'static str {
        "direct-model-mutation"
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
