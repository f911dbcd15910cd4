use richfill_common::protocol::{RetryPolicy, SelectorDescriptor};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RichfillConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub locator: LocatorConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub title: TitleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            self.backoff_multiplier,
        )
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default = "default_candidate_wait_ms")]
    pub candidate_wait_ms: u64,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_editor_selectors")]
    pub selectors: Vec<SelectorDescriptor>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            candidate_wait_ms: default_candidate_wait_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            selectors: default_editor_selectors(),
        }
    }
}

fn default_candidate_wait_ms() -> u64 {
    1500
}

fn default_sweep_interval_ms() -> u64 {
    250
}

fn default_editor_selectors() -> Vec<SelectorDescriptor> {
    [
        "div.ql-editor",
        "[class*='ql-editor']",
        "div[data-placeholder*='正文']",
        ".tiptap",
        ".ProseMirror",
        "div[contenteditable='true']",
        ".content-input",
        "#content-input",
    ]
    .into_iter()
    .map(SelectorDescriptor::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_overall_timeout_ms")]
    pub overall_timeout_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            overall_timeout_ms: default_overall_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            typing_delay_ms: default_typing_delay_ms(),
        }
    }
}

impl FillConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }
}

fn default_overall_timeout_ms() -> u64 {
    60000
}

fn default_settle_delay_ms() -> u64 {
    500
}

fn default_typing_delay_ms() -> u64 {
    20
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleConfig {
    #[serde(default = "default_title_selectors")]
    pub selectors: Vec<SelectorDescriptor>,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            selectors: default_title_selectors(),
        }
    }
}

fn default_title_selectors() -> Vec<SelectorDescriptor> {
    vec![SelectorDescriptor::from("input[placeholder*='填写标题']")]
}
