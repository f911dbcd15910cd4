mod document_patch;
mod generic_fallback;
mod model_mutation;
mod simulated_typing;

pub use document_patch::DocumentPatch;
pub use generic_fallback::GenericFallback;
pub use model_mutation::DirectModelMutation;
pub use simulated_typing::SimulatedTyping;
