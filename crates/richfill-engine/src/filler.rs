//! The `fill_editor` entry point.
//!
//! Each call re-resolves and re-classifies from scratch; nothing is carried
//! over between calls because the page may have re-rendered in between.

use crate::classifier::EditorClassifier;
use crate::config::RichfillConfig;
use crate::diagnostics::{Diagnostics, notify};
use crate::executor::{FillPhase, StrategyExecutor};
use crate::handle::EditorHandle;
use crate::locator::{LocatorResolver, remaining};
use crate::registry::StrategyRegistry;
use crate::session::PageSession;
use richfill_common::protocol::{FailureKind, FillRequest, FillResult};
use richfill_common::variant::EditorVariant;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct EditorFiller {
    locator: LocatorResolver,
    classifier: EditorClassifier,
    registry: StrategyRegistry,
    executor: StrategyExecutor,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl Default for EditorFiller {
    fn default() -> Self {
        Self::from_config(&RichfillConfig::default())
    }
}

impl EditorFiller {
    pub fn new(
        locator: LocatorResolver,
        registry: StrategyRegistry,
        executor: StrategyExecutor,
    ) -> Self {
        Self {
            locator,
            classifier: EditorClassifier::new(),
            registry,
            executor,
            diagnostics: None,
        }
    }

    pub fn from_config(config: &RichfillConfig) -> Self {
        let locator = LocatorResolver::new(
            Duration::from_millis(config.locator.candidate_wait_ms),
            Duration::from_millis(config.locator.sweep_interval_ms),
        );
        let registry =
            StrategyRegistry::with_typing_delay(Duration::from_millis(config.fill.typing_delay_ms));
        let executor = StrategyExecutor::new(
            config.retry.policy(),
            Duration::from_millis(config.fill.settle_delay_ms),
        );
        Self::new(locator, registry, executor)
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Locate, classify, then run the variant's strategy chain until the
    /// content verifies. Never errors; every failure is reported in the
    /// returned `FillResult`.
    pub async fn fill_editor(
        &self,
        session: &mut dyn PageSession,
        request: &FillRequest,
    ) -> FillResult {
        let deadline = session.elapsed().saturating_add(request.overall_timeout);
        let diagnostics = self.diagnostics.as_deref();
        debug!(
            phase = %FillPhase::Idle,
            "Fill requested: {} char(s), budget {:?}",
            request.content.chars().count(),
            request.overall_timeout
        );

        info!(
            phase = %FillPhase::Locating,
            "Locating editor among {} candidate(s)",
            request.candidate_selectors.len()
        );
        let element = match self
            .locator
            .resolve(session, &request.candidate_selectors, request.overall_timeout)
            .await
        {
            Ok(element) => element,
            Err(e) => {
                warn!(phase = %FillPhase::Failed, "{}", e);
                if let Some(d) = diagnostics {
                    notify("on_locate_failed", || {
                        d.on_locate_failed(&request.candidate_selectors)
                    });
                }
                return FillResult::not_found();
            }
        };

        info!(phase = %FillPhase::Classifying, "Classifying element {}", element.id);
        let Some(budget) = remaining(&*session, deadline) else {
            warn!(phase = %FillPhase::Failed, "Deadline reached before classification");
            return FillResult::failure(FailureKind::Timeout, Vec::new())
                .on_editor(EditorVariant::Unknown, &element.selector);
        };
        let variant = match tokio::time::timeout(budget, self.classifier.classify(session, &element))
            .await
        {
            Ok(variant) => variant,
            Err(_) => {
                warn!(phase = %FillPhase::Failed, "Deadline reached during classification");
                return FillResult::failure(FailureKind::Timeout, Vec::new())
                    .on_editor(EditorVariant::Unknown, &element.selector);
            }
        };
        if let Some(d) = diagnostics {
            notify("on_classified", || d.on_classified(variant, &element));
        }

        let handle = EditorHandle::new(element, variant);
        let chain = self.registry.chain_for(variant);
        info!(
            "Editor '{}' classified as {}; chain {:?}",
            handle.resolved_selector,
            variant,
            self.registry.chain_names(variant)
        );

        self.executor
            .execute(session, &handle, &request.content, chain, deadline, diagnostics)
            .await
            .on_editor(variant, &handle.resolved_selector)
    }
}
