use crate::strategy::{
    DirectModelMutation, DocumentPatch, FillStrategy, GenericFallback, SimulatedTyping,
};
use richfill_common::variant::EditorVariant;
use std::sync::Arc;
use std::time::Duration;

/// Static map from editor variant to its ordered strategy chain.
///
/// Built once at startup and shared read-only. Every chain ends with the same
/// generic fallback instance, so an unrecognised editor still gets a
/// best-effort attempt.
pub struct StrategyRegistry {
    quill: Vec<Arc<dyn FillStrategy>>,
    tiptap: Vec<Arc<dyn FillStrategy>>,
    generic: Vec<Arc<dyn FillStrategy>>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new(SimulatedTyping::default())
    }
}

impl StrategyRegistry {
    pub fn new(typing: SimulatedTyping) -> Self {
        let typing: Arc<dyn FillStrategy> = Arc::new(typing);
        let fallback: Arc<dyn FillStrategy> = Arc::new(GenericFallback);

        Self {
            quill: vec![
                Arc::new(DirectModelMutation),
                typing.clone(),
                fallback.clone(),
            ],
            tiptap: vec![Arc::new(DocumentPatch), typing.clone(), fallback.clone()],
            generic: vec![typing, fallback],
        }
    }

    pub fn with_typing_delay(per_char_delay: Duration) -> Self {
        Self::new(SimulatedTyping::new(per_char_delay))
    }

    pub fn chain_for(&self, variant: EditorVariant) -> &[Arc<dyn FillStrategy>] {
        match variant {
            EditorVariant::Quill => &self.quill,
            EditorVariant::TipTapProseMirror => &self.tiptap,
            EditorVariant::GenericContentEditable | EditorVariant::Unknown => &self.generic,
        }
    }

    /// Strategy names for a variant, in execution order.
    pub fn chain_names(&self, variant: EditorVariant) -> Vec<&'static str> {
        self.chain_for(variant).iter().map(|s| s.name()).collect()
    }
}
