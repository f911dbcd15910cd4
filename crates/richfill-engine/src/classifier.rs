//! Editor Classifier
//!
//! One read-only probe script collects an [`ElementSignature`]; the variant is
//! then decided by a pure function over that signature so the same DOM
//! snapshot always yields the same answer.

use crate::session::PageSession;
use richfill_common::protocol::ElementRef;
use richfill_common::variant::EditorVariant;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

const ANCESTOR_DEPTH: u32 = 4;
const DESCENDANT_LIMIT: u32 = 64;

const PROBE_SCRIPT: &str = r#"(el, args) => {
    const classesOf = (node) => (node && node.classList ? Array.from(node.classList) : []);
    const ancestorClasses = [];
    let parent = el.parentElement;
    for (let depth = 0; parent && depth < args.ancestor_depth; depth++) {
        ancestorClasses.push(...classesOf(parent));
        parent = parent.parentElement;
    }
    const descendantClasses = [];
    const nodes = el.querySelectorAll('[class]');
    for (let i = 0; i < nodes.length && i < args.descendant_limit; i++) {
        descendantClasses.push(...classesOf(nodes[i]));
    }
    const container = el.closest('.ql-container');
    const pm = el.matches('.ProseMirror, .tiptap') ? el : el.querySelector('.ProseMirror, .tiptap');
    return {
        tag: el.tagName.toLowerCase(),
        classes: classesOf(el),
        ancestor_classes: ancestorClasses,
        descendant_classes: descendantClasses,
        content_editable: el.isContentEditable === true,
        has_quill_instance: !!((container && container.__quill) || el.__quill),
        has_tiptap_instance: !!(pm && pm.editor && pm.editor.commands),
    };
}"#;

/// Structural markers read from a resolved element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ElementSignature {
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub ancestor_classes: Vec<String>,
    #[serde(default)]
    pub descendant_classes: Vec<String>,
    #[serde(default)]
    pub content_editable: bool,
    #[serde(default)]
    pub has_quill_instance: bool,
    #[serde(default)]
    pub has_tiptap_instance: bool,
}

impl ElementSignature {
    fn own_or_descendant(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class) || self.descendant_classes.iter().any(|c| c == class)
    }

    fn is_quill(&self) -> bool {
        self.has_quill_instance
            || self.own_or_descendant("ql-editor")
            || self.ancestor_classes.iter().any(|c| c == "ql-container")
    }

    fn is_tiptap(&self) -> bool {
        self.has_tiptap_instance
            || self.own_or_descendant("tiptap")
            || self.own_or_descendant("ProseMirror")
    }

    /// Classify in fixed priority order: Quill, TipTap/ProseMirror,
    /// contenteditable, else `Unknown`.
    pub fn classify(&self) -> EditorVariant {
        if self.is_quill() {
            EditorVariant::Quill
        } else if self.is_tiptap() {
            EditorVariant::TipTapProseMirror
        } else if self.content_editable {
            EditorVariant::GenericContentEditable
        } else {
            EditorVariant::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditorClassifier;

impl EditorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Read the element's signature and classify it.
    ///
    /// A probe that errors or returns garbage classifies as `Unknown`, which
    /// still gets the generic chain.
    pub async fn classify(&self, session: &mut dyn PageSession, element: &ElementRef) -> EditorVariant {
        match self.signature(session, element).await {
            Some(signature) => {
                let variant = signature.classify();
                debug!(
                    "Element {} <{}> classes={:?} -> {}",
                    element.id, signature.tag, signature.classes, variant
                );
                variant
            }
            None => EditorVariant::Unknown,
        }
    }

    pub async fn signature(
        &self,
        session: &mut dyn PageSession,
        element: &ElementRef,
    ) -> Option<ElementSignature> {
        let args = json!({
            "ancestor_depth": ANCESTOR_DEPTH,
            "descendant_limit": DESCENDANT_LIMIT,
        });
        match session.run_script(element, PROBE_SCRIPT, args).await {
            Ok(value) => match serde_json::from_value(value) {
                Ok(signature) => Some(signature),
                Err(e) => {
                    warn!("Unreadable signature for element {}: {}", element.id, e);
                    None
                }
            },
            Err(e) => {
                warn!("Signature probe failed for element {}: {}", element.id, e);
                None
            }
        }
    }
}
