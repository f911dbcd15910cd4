use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of rich-text editor families the engine knows how to drive.
///
/// `Unknown` is a valid classification, not an error: it routes to the
/// generic fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditorVariant {
    Quill,
    #[serde(rename = "tiptap-prosemirror")]
    TipTapProseMirror,
    #[serde(rename = "generic-contenteditable")]
    GenericContentEditable,
    Unknown,
}

impl EditorVariant {
    pub const ALL: [EditorVariant; 4] = [
        EditorVariant::Quill,
        EditorVariant::TipTapProseMirror,
        EditorVariant::GenericContentEditable,
        EditorVariant::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EditorVariant::Quill => "quill",
            EditorVariant::TipTapProseMirror => "tiptap-prosemirror",
            EditorVariant::GenericContentEditable => "generic-contenteditable",
            EditorVariant::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EditorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
