use richfill_common::protocol::ElementRef;
use richfill_common::variant::EditorVariant;

/// A located and classified editor, owned by exactly one fill operation.
///
/// The element reference dies with the page render it came from, so a handle
/// is rebuilt from scratch on every `fill_editor` call.
#[derive(Debug, Clone)]
pub struct EditorHandle {
    pub element: ElementRef,
    pub variant: EditorVariant,
    pub resolved_selector: String,
}

impl EditorHandle {
    pub fn new(element: ElementRef, variant: EditorVariant) -> Self {
        let resolved_selector = element.selector.clone();
        Self {
            element,
            variant,
            resolved_selector,
        }
    }
}
