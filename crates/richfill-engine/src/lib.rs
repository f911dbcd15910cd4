pub mod classifier;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod executor;
pub mod filler;
pub mod handle;
pub mod locator;
pub mod registry;
pub mod session;
pub mod strategy;
pub mod verifier;

pub use filler::EditorFiller;
pub use richfill_common::error;
pub use richfill_common::protocol;
pub use richfill_common::variant;
