pub mod error;
pub mod protocol;
pub mod variant;

pub use error::SessionError;
pub use protocol::{
    ElementRef, FailureKind, FillRequest, FillResult, RetryPolicy, SelectorDescriptor,
    StrategyOutcome,
};
pub use variant::EditorVariant;
