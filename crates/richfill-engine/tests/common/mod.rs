#![allow(dead_code)]

use async_trait::async_trait;
use richfill_engine::error::SessionError;
use richfill_engine::protocol::{ElementRef, SelectorDescriptor};
use richfill_engine::session::PageSession;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// How the scripted editor reacts to one strategy attempt.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Render the requested content as paragraphs.
    Apply,
    /// Report success without touching the editor.
    Ignore,
    /// Leave the given markup behind.
    Garble(String),
    /// Fail the underlying call.
    Fail,
    /// Never return.
    Hang,
}

#[derive(Debug, Clone)]
struct Planted {
    selector: String,
    id: u32,
    appears_at: Duration,
}

/// In-memory page with one editor, driven entirely by virtual time.
pub struct ScriptedSession {
    started: Instant,
    planted: Vec<Planted>,
    invalid: Vec<String>,
    signature: Value,
    behaviors: HashMap<&'static str, VecDeque<Behavior>>,
    read_fails: bool,
    pub content: String,
    /// Strategy names in the order their attempts reached the page.
    pub attempts: Vec<&'static str>,
    /// Every selector probed, in order.
    pub probes: Vec<String>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            planted: Vec::new(),
            invalid: Vec::new(),
            signature: json!({ "tag": "div", "content_editable": true }),
            behaviors: HashMap::new(),
            read_fails: false,
            content: String::new(),
            attempts: Vec::new(),
            probes: Vec::new(),
        }
    }

    /// A page carrying a Quill editor at `div.ql-editor`.
    pub fn quill() -> Self {
        Self::new().with_element("div.ql-editor", 1).with_signature(json!({
            "tag": "div",
            "classes": ["ql-editor"],
            "ancestor_classes": ["ql-container", "ql-snow"],
            "content_editable": true,
        }))
    }

    /// A page carrying a TipTap editor at `.tiptap`.
    pub fn tiptap() -> Self {
        Self::new().with_element(".tiptap", 7).with_signature(json!({
            "tag": "div",
            "classes": ["tiptap", "ProseMirror"],
            "content_editable": true,
            "has_tiptap_instance": true,
        }))
    }

    pub fn with_element(self, selector: &str, id: u32) -> Self {
        self.with_late_element(selector, id, Duration::ZERO)
    }

    pub fn with_late_element(mut self, selector: &str, id: u32, appears_at: Duration) -> Self {
        self.planted.push(Planted {
            selector: selector.to_string(),
            id,
            appears_at,
        });
        self
    }

    pub fn with_invalid_selector(mut self, selector: &str) -> Self {
        self.invalid.push(selector.to_string());
        self
    }

    pub fn with_signature(mut self, signature: Value) -> Self {
        self.signature = signature;
        self
    }

    /// Script the reactions to successive attempts of `strategy`. The last
    /// behavior repeats once the queue runs down.
    pub fn on(mut self, strategy: &'static str, behaviors: impl IntoIterator<Item = Behavior>) -> Self {
        self.behaviors.insert(strategy, behaviors.into_iter().collect());
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.read_fails = true;
        self
    }

    pub fn attempts_of(&self, strategy: &str) -> usize {
        self.attempts.iter().filter(|s| **s == strategy).count()
    }

    fn next_behavior(&mut self, strategy: &'static str) -> Behavior {
        match self.behaviors.get_mut(strategy) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Behavior::Apply),
            Some(queue) => queue.front().cloned().unwrap_or(Behavior::Apply),
            None => Behavior::Apply,
        }
    }

    async fn react(&mut self, strategy: &'static str, requested: &str) -> Result<(), SessionError> {
        self.attempts.push(strategy);
        match self.next_behavior(strategy) {
            Behavior::Apply => {
                self.content = render(requested);
                Ok(())
            }
            Behavior::Ignore => Ok(()),
            Behavior::Garble(markup) => {
                self.content = markup;
                Ok(())
            }
            Behavior::Fail => Err(SessionError::ScriptError("editor rejected mutation".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

/// Paragraph markup the way rich-text editors materialize plain text.
pub fn render(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                "<p><br></p>".to_string()
            } else {
                let escaped = line
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;");
                format!("<p>{}</p>", escaped)
            }
        })
        .collect()
}

fn strategy_of(script: &str) -> Option<&'static str> {
    if script.contains("quill.setText") {
        Some("direct-model-mutation")
    } else if script.contains("commands.setContent") {
        Some("document-patch")
    } else if script.contains("HTMLInputElement.prototype") {
        Some("generic-fallback")
    } else {
        None
    }
}

#[async_trait]
impl PageSession for ScriptedSession {
    async fn find_visible(
        &mut self,
        selector: &SelectorDescriptor,
        wait: Duration,
    ) -> Result<Option<ElementRef>, SessionError> {
        self.probes.push(selector.selector.clone());
        if self.invalid.contains(&selector.selector) {
            return Err(SessionError::SelectorInvalid {
                selector: selector.selector.clone(),
            });
        }

        let now = self.elapsed();
        let planted = self
            .planted
            .iter()
            .find(|p| p.selector == selector.selector)
            .cloned();
        match planted {
            Some(p) if p.appears_at <= now + wait => {
                tokio::time::sleep(p.appears_at.saturating_sub(now)).await;
                Ok(Some(ElementRef {
                    id: p.id,
                    selector: p.selector,
                }))
            }
            _ => {
                tokio::time::sleep(wait).await;
                Ok(None)
            }
        }
    }

    async fn read_content(&mut self, element: &ElementRef) -> Result<String, SessionError> {
        if self.read_fails {
            return Err(SessionError::ElementStale { id: element.id });
        }
        Ok(self.content.clone())
    }

    async fn simulate_typing(
        &mut self,
        _element: &ElementRef,
        text: &str,
        per_char_delay: Duration,
    ) -> Result<(), SessionError> {
        tokio::time::sleep(per_char_delay * text.chars().count() as u32).await;
        self.react("simulated-typing", text).await
    }

    async fn run_script(
        &mut self,
        _element: &ElementRef,
        script: &str,
        args: Value,
    ) -> Result<Value, SessionError> {
        if script.contains("has_quill_instance") {
            return Ok(self.signature.clone());
        }
        if let Some(strategy) = strategy_of(script) {
            let requested = args["content"].as_str().unwrap_or_default().to_string();
            self.react(strategy, &requested).await?;
            return Ok(json!(true));
        }
        // Typing preparation: select-all and script-side delete.
        if script.contains("el.value = ''") {
            self.content.clear();
        }
        Ok(json!(true))
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
