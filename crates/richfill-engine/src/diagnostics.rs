//! Fire-and-forget observation hooks.
//!
//! Hooks are synchronous and return nothing, so they cannot steer a fill.
//! Implementations that need I/O (screenshots, dumps) must hand the work off
//! and return immediately.

use richfill_common::protocol::{ElementRef, SelectorDescriptor, StrategyOutcome};
use richfill_common::variant::EditorVariant;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{info, warn};

pub trait Diagnostics: Send + Sync {
    fn on_classified(&self, _variant: EditorVariant, _element: &ElementRef) {}

    fn on_strategy_attempt(&self, _outcome: &StrategyOutcome) {}

    fn on_locate_failed(&self, _candidates: &[SelectorDescriptor]) {}
}

/// Emits one structured log event per hook.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn on_classified(&self, variant: EditorVariant, element: &ElementRef) {
        info!(
            target: "richfill::diagnostics",
            variant = %variant,
            selector = %element.selector,
            "editor classified"
        );
    }

    fn on_strategy_attempt(&self, outcome: &StrategyOutcome) {
        let failure = outcome
            .failure
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        info!(
            target: "richfill::diagnostics",
            strategy = %outcome.strategy,
            attempt = outcome.attempt,
            succeeded = outcome.succeeded,
            elapsed_ms = outcome.elapsed_ms,
            failure = %failure,
            "strategy attempt"
        );
    }

    fn on_locate_failed(&self, candidates: &[SelectorDescriptor]) {
        let selectors: Vec<&str> = candidates.iter().map(|c| c.selector.as_str()).collect();
        info!(
            target: "richfill::diagnostics",
            candidates = ?selectors,
            "no editor located"
        );
    }
}

/// Forwards every hook to each inner collaborator in order.
#[derive(Clone, Default)]
pub struct CompositeDiagnostics {
    inner: Vec<Arc<dyn Diagnostics>>,
}

impl CompositeDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.inner.push(diagnostics);
        self
    }
}

impl Diagnostics for CompositeDiagnostics {
    fn on_classified(&self, variant: EditorVariant, element: &ElementRef) {
        for d in &self.inner {
            notify("on_classified", || d.on_classified(variant, element));
        }
    }

    fn on_strategy_attempt(&self, outcome: &StrategyOutcome) {
        for d in &self.inner {
            notify("on_strategy_attempt", || d.on_strategy_attempt(outcome));
        }
    }

    fn on_locate_failed(&self, candidates: &[SelectorDescriptor]) {
        for d in &self.inner {
            notify("on_locate_failed", || d.on_locate_failed(candidates));
        }
    }
}

/// Run a hook, containing any panic it raises.
pub(crate) fn notify(hook: &str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        warn!("Diagnostics hook {} panicked; ignoring", hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Diagnostics for Recorder {
        fn on_classified(&self, variant: EditorVariant, _element: &ElementRef) {
            self.seen.lock().unwrap().push(variant.to_string());
        }
    }

    struct Exploding;

    impl Diagnostics for Exploding {
        fn on_classified(&self, _variant: EditorVariant, _element: &ElementRef) {
            panic!("screenshot disk full");
        }
    }

    #[test]
    fn test_composite_survives_panicking_member() {
        let recorder = Arc::new(Recorder::default());
        let composite = CompositeDiagnostics::new()
            .with(Arc::new(Exploding))
            .with(recorder.clone());
        let element = ElementRef {
            id: 1,
            selector: "div.ql-editor".into(),
        };

        composite.on_classified(EditorVariant::Quill, &element);

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["quill".to_string()]);
    }
}
