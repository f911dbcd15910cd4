use crate::variant::EditorVariant;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

/// One candidate selector for the editor surface.
///
/// Order in a candidate list is a priority signal: earlier entries are tried
/// first on every sweep. `wait_ms` overrides the per-candidate wait window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorDescriptor {
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_ms: Option<u64>,
}

impl SelectorDescriptor {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            wait_ms: None,
        }
    }

    pub fn with_wait(mut self, wait: Duration) -> Self {
        self.wait_ms = Some(wait.as_millis() as u64);
        self
    }

    pub fn wait(&self) -> Option<Duration> {
        self.wait_ms.map(Duration::from_millis)
    }
}

impl From<&str> for SelectorDescriptor {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

impl From<String> for SelectorDescriptor {
    fn from(selector: String) -> Self {
        Self::new(selector)
    }
}

impl fmt::Display for SelectorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector)
    }
}

/// Accepts either a bare selector string or `{ selector, wait_ms }`.
impl<'de> Deserialize<'de> for SelectorDescriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bare(String),
            Full {
                selector: String,
                #[serde(default)]
                wait_ms: Option<u64>,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Bare(selector) => SelectorDescriptor::new(selector),
            Raw::Full { selector, wait_ms } => SelectorDescriptor { selector, wait_ms },
        })
    }
}

/// Session-scoped reference to a located element.
///
/// Only valid for the document it was minted against; never cache it across
/// fill operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: u32,
    pub selector: String,
}

/// Why an attempt, or a whole fill operation, did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// No candidate selector resolved to a visible element in time.
    NotFound,
    /// The strategy's script or typing call itself errored.
    StrategyExecution { code: String, message: String },
    /// The strategy ran but the editor content did not verify.
    VerificationFailed,
    /// The overall deadline expired.
    Timeout,
    /// Every strategy in the chain used up its retries.
    Exhausted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "editor not found"),
            FailureKind::StrategyExecution { code, message } => {
                write!(f, "strategy execution error [{}]: {}", code, message)
            }
            FailureKind::VerificationFailed => write!(f, "verification failed"),
            FailureKind::Timeout => write!(f, "timed out"),
            FailureKind::Exhausted => write!(f, "all strategies exhausted"),
        }
    }
}

/// Record of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub strategy: String,
    /// 1-based attempt number within this strategy.
    pub attempt: u32,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Session clock reading when the attempt finished.
    pub elapsed_ms: u64,
}

impl StrategyOutcome {
    pub fn verified(strategy: &str, attempt: u32, observed: Option<String>, at: Duration) -> Self {
        Self {
            strategy: strategy.to_string(),
            attempt,
            succeeded: true,
            observed_content: observed,
            failure: None,
            elapsed_ms: at.as_millis() as u64,
        }
    }

    pub fn failed(
        strategy: &str,
        attempt: u32,
        observed: Option<String>,
        failure: FailureKind,
        at: Duration,
    ) -> Self {
        Self {
            strategy: strategy.to_string(),
            attempt,
            succeeded: false,
            observed_content: observed,
            failure: Some(failure),
            elapsed_ms: at.as_millis() as u64,
        }
    }
}

/// Per-strategy retry schedule.
///
/// A strategy is attempted at most `max_attempts` times; the wait after the
/// attempt with zero-based index `i` is `base_delay * backoff_multiplier^i`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// `max_attempts` is raised to at least 1 and the multiplier to at least
    /// 1.0 so the delay sequence never shrinks.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_multiplier: f64) -> Self {
        let backoff_multiplier = if backoff_multiplier.is_finite() {
            backoff_multiplier.max(1.0)
        } else {
            1.0
        };
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            backoff_multiplier,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn backoff_multiplier(&self) -> f64 {
        self.backoff_multiplier
    }

    /// Delay to wait after the attempt with zero-based index `attempt_index`.
    pub fn delay_after(&self, attempt_index: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt_index).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500), 2.0)
    }
}

/// A single request to fill an editor.
#[derive(Debug, Clone)]
pub struct FillRequest {
    pub candidate_selectors: Vec<SelectorDescriptor>,
    pub content: String,
    pub overall_timeout: Duration,
}

impl FillRequest {
    pub fn new<I, S>(candidates: I, content: impl Into<String>, overall_timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectorDescriptor>,
    {
        Self {
            candidate_selectors: candidates.into_iter().map(Into::into).collect(),
            content: content.into(),
            overall_timeout,
        }
    }
}

/// Outcome of `fill_editor`, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillResult {
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<EditorVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_selector: Option<String>,
    /// Set only when `succeeded` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default)]
    pub attempts_log: Vec<StrategyOutcome>,
}

impl FillResult {
    pub fn not_found() -> Self {
        Self::failure(FailureKind::NotFound, Vec::new())
    }

    pub fn failure(kind: FailureKind, attempts_log: Vec<StrategyOutcome>) -> Self {
        Self {
            succeeded: false,
            strategy_used: None,
            variant: None,
            resolved_selector: None,
            failure: Some(kind),
            attempts_log,
        }
    }

    pub fn success(strategy: &str, attempts_log: Vec<StrategyOutcome>) -> Self {
        Self {
            succeeded: true,
            strategy_used: Some(strategy.to_string()),
            variant: None,
            resolved_selector: None,
            failure: None,
            attempts_log,
        }
    }

    pub fn on_editor(mut self, variant: EditorVariant, selector: &str) -> Self {
        self.variant = Some(variant);
        self.resolved_selector = Some(selector.to_string());
        self
    }
}
