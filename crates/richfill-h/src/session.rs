use crate::cdp::CdpClient;
use crate::inject;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use richfill_engine::protocol::{ElementRef, SelectorDescriptor};
use richfill_engine::session::{NavigationResult, PageSession, SessionError};
use serde_json::Value;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Pause between visibility probes while waiting on one selector.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const FOCUS_SCRIPT: &str = r#"(el, args) => {
    const target = el.isContentEditable || el.tagName === 'INPUT' || el.tagName === 'TEXTAREA'
        ? el
        : (el.querySelector('[contenteditable="true"]') || el);
    target.focus();
    return document.activeElement === target || target.contains(document.activeElement);
}"#;

/// `PageSession` over a Chromium tab driven through CDP.
pub struct HeadlessSession {
    client: Option<CdpClient>,
    visible: bool,
    started: Instant,
}

impl HeadlessSession {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            started: Instant::now(),
        }
    }

    pub fn get_client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    pub async fn launch(&mut self) -> Result<(), SessionError> {
        info!("Launching Chromium session...");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| SessionError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| SessionError::Other(e.to_string()))?;
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    fn page(&self) -> Result<&Page, SessionError> {
        self.client
            .as_ref()
            .map(|c| &c.page)
            .ok_or(SessionError::NotReady)
    }

    async fn get_navigation_result(page: &Page) -> Result<NavigationResult, SessionError> {
        let title = page
            .get_title()
            .await
            .unwrap_or_default()
            .unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult {
            url,
            title,
            status: 200,
        })
    }

    async fn dispatch_key(page: &Page, params: DispatchKeyEventParams) -> Result<(), SessionError> {
        page.execute(params)
            .await
            .map(|_| ())
            .map_err(|e| SessionError::Other(format!("Key event failed: {}", e)))
    }
}

impl Default for HeadlessSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Windows virtual key codes for the editing keys Chromium only acts on when
/// the code is present.
fn virtual_key_code(key: &str) -> Option<i64> {
    match key {
        "Backspace" => Some(8),
        "Tab" => Some(9),
        "Enter" => Some(13),
        "Escape" => Some(27),
        "Delete" => Some(46),
        _ => None,
    }
}

fn key_event(
    kind: DispatchKeyEventType,
    key: &str,
    text: Option<&str>,
    modifiers: i64,
) -> Result<DispatchKeyEventParams, SessionError> {
    // Without text a key down must be raw, or Chromium drops it.
    let kind = match (kind, text) {
        (DispatchKeyEventType::KeyDown, None) => DispatchKeyEventType::RawKeyDown,
        (kind, _) => kind,
    };
    let mut builder = DispatchKeyEventParams::builder()
        .r#type(kind)
        .key(key)
        .modifiers(modifiers);
    if let Some(code) = virtual_key_code(key) {
        builder = builder
            .code(key)
            .windows_virtual_key_code(code)
            .native_virtual_key_code(code);
    }
    if let Some(text) = text {
        builder = builder.text(text);
    }
    builder
        .build()
        .map_err(|e| SessionError::Other(format!("Failed to build key event: {:?}", e)))
}

#[async_trait]
impl PageSession for HeadlessSession {
    async fn find_visible(
        &mut self,
        selector: &SelectorDescriptor,
        wait: Duration,
    ) -> Result<Option<ElementRef>, SessionError> {
        let page = self.page()?;
        let deadline = Instant::now() + wait;

        loop {
            if let Some(id) = inject::find_visible(page, &selector.selector).await? {
                debug!("'{}' visible as element {}", selector, id);
                return Ok(Some(ElementRef {
                    id,
                    selector: selector.selector.clone(),
                }));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    async fn read_content(&mut self, element: &ElementRef) -> Result<String, SessionError> {
        inject::read_content(self.page()?, element.id).await
    }

    async fn simulate_typing(
        &mut self,
        element: &ElementRef,
        text: &str,
        per_char_delay: Duration,
    ) -> Result<(), SessionError> {
        let page = self.page()?;
        inject::call_on_element(page, element.id, FOCUS_SCRIPT, &Value::Null).await?;

        let mut buf = [0u8; 4];
        for ch in text.chars() {
            match ch {
                '\r' => continue,
                '\n' => {
                    Self::dispatch_key(
                        page,
                        key_event(DispatchKeyEventType::KeyDown, "Enter", Some("\r"), 0)?,
                    )
                    .await?;
                    Self::dispatch_key(page, key_event(DispatchKeyEventType::KeyUp, "Enter", None, 0)?)
                        .await?;
                }
                _ => {
                    let s: &str = ch.encode_utf8(&mut buf);
                    Self::dispatch_key(page, key_event(DispatchKeyEventType::KeyDown, s, Some(s), 0)?)
                        .await?;
                    Self::dispatch_key(page, key_event(DispatchKeyEventType::KeyUp, s, None, 0)?)
                        .await?;
                }
            }
            if !per_char_delay.is_zero() {
                tokio::time::sleep(per_char_delay).await;
            }
        }
        Ok(())
    }

    async fn run_script(
        &mut self,
        element: &ElementRef,
        script: &str,
        args: Value,
    ) -> Result<Value, SessionError> {
        inject::call_on_element(self.page()?, element.id, script, &args).await
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, SessionError> {
        let page = self.page()?;

        info!("Navigating to: {}", url);
        page.goto(url)
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;

        Self::get_navigation_result(page).await
    }

    async fn press_key(&mut self, key: &str, modifiers: &[String]) -> Result<(), SessionError> {
        let page = self.page()?;

        let mut modifier_flags = 0;
        for m in modifiers {
            match m.to_lowercase().as_str() {
                "alt" => modifier_flags |= 1,
                "ctrl" | "control" => modifier_flags |= 2,
                "meta" | "cmd" | "command" => modifier_flags |= 4,
                "shift" => modifier_flags |= 8,
                _ => {}
            }
        }

        Self::dispatch_key(
            page,
            key_event(DispatchKeyEventType::KeyDown, key, None, modifier_flags)?,
        )
        .await?;
        Self::dispatch_key(
            page,
            key_event(DispatchKeyEventType::KeyUp, key, None, modifier_flags)?,
        )
        .await
    }
}
