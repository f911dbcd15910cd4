//! Verification Oracle
//!
//! Decides whether what the editor holds counts as the requested content.
//! Editors wrap lines in paragraphs, escape special characters, pad with
//! whitespace and append empty trailing paragraphs; none of that is a
//! mismatch. The comparison is containment of the normalized request inside
//! the normalized editor content.

use crate::handle::EditorHandle;
use crate::session::PageSession;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use tracing::debug;

lazy_static! {
    static ref LINE_BREAK_TAG: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref BLOCK_CLOSE_TAG: Regex =
        Regex::new(r"(?i)</(p|div|li|h[1-6]|blockquote|pre)\s*>").unwrap();
    static ref ANY_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref ENTITY: Regex = Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").unwrap();
}

/// Characters editors insert that carry no content.
const INVISIBLE: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FEFF}'];

/// What the oracle saw on one check.
#[derive(Debug, Clone)]
pub struct Verification {
    pub verified: bool,
    /// Raw editor content, `None` if it could not be read.
    pub observed: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier;

impl Verifier {
    pub fn new() -> Self {
        Self
    }

    /// `true` if the editor currently holds `requested`. Never errors: an
    /// unreadable editor is simply unverified.
    pub async fn verify(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        requested: &str,
    ) -> bool {
        self.check(session, handle, requested).await.verified
    }

    pub async fn check(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        requested: &str,
    ) -> Verification {
        match session.read_content(&handle.element).await {
            Ok(observed) => Verification {
                verified: content_matches(&observed, requested),
                observed: Some(observed),
            },
            Err(e) => {
                debug!("Editor {} unreadable: {}", handle.element.id, e);
                Verification {
                    verified: false,
                    observed: None,
                }
            }
        }
    }
}

/// Containment check under normalization.
///
/// Editor markup is compared only as the text a reader would see, so tag
/// names, classes and placeholder attributes never count as content. Raw
/// comparison is kept for tag-free form values, and for requests that
/// themselves carry literal `<...>` text. Empty requests only verify against
/// an empty editor.
pub fn content_matches(materialized: &str, requested: &str) -> bool {
    let wanted = normalize_text(requested);
    let is_markup = ANY_TAG.is_match(materialized);
    let rendered = normalize_markup(materialized);
    if wanted.is_empty() {
        return if is_markup {
            rendered.is_empty()
        } else {
            normalize_text(materialized).is_empty()
        };
    }
    if rendered.contains(&wanted) {
        return true;
    }
    (!is_markup || ANY_TAG.is_match(requested)) && normalize_text(materialized).contains(&wanted)
}

/// Collapse whitespace runs to single spaces, drop invisible characters and trim.
pub fn normalize_text(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || INVISIBLE.contains(&c))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn editor markup into the text a reader would see, then normalize it.
pub fn normalize_markup(markup: &str) -> String {
    let text = LINE_BREAK_TAG.replace_all(markup, "\n");
    let text = BLOCK_CLOSE_TAG.replace_all(&text, "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    normalize_text(&text)
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body
                .strip_prefix("#x")
                .or_else(|| body.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(body)
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        _ => return None,
    })
}
