pub mod artifacts;
pub mod cdp;
pub mod inject;
pub mod session;

pub use artifacts::ArtifactDiagnostics;
pub use session::HeadlessSession;
