use thiserror::Error;

/// Errors raised by a page automation session.
///
/// The fill engine never lets these escape `fill_editor`: locator probes treat
/// them as misses, strategies record them as failed attempts and the
/// verification path treats them as "unverified".
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    // ============================================================
    // Navigation Errors
    // ============================================================
    #[error("Navigation failed: {0}")]
    Navigation(String),

    // ============================================================
    // Element Errors
    // ============================================================
    #[error("Element {id} is stale (removed from DOM)")]
    ElementStale { id: u32 },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    // ============================================================
    // Execution Errors
    // ============================================================
    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Timeout: {operation}")]
    TimeoutWithContext { operation: String },

    // ============================================================
    // System Errors
    // ============================================================
    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Other: {0}")]
    Other(String),

    #[error("Not supported: {0}")]
    NotSupported(String),
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl SessionError {
    /// Stable error code, used in attempt logs and diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::Navigation(_) => "NAVIGATION_ERROR",
            SessionError::ElementStale { .. } => "ELEMENT_STALE",
            SessionError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            SessionError::ScriptError(_) => "SCRIPT_ERROR",
            SessionError::TimeoutWithContext { .. } => "TIMEOUT",
            SessionError::NotReady => "NOT_READY",
            SessionError::Io(_) => "IO_ERROR",
            SessionError::Serialization(_) => "SERIALIZATION_ERROR",
            SessionError::Other(_) => "INTERNAL_ERROR",
            SessionError::NotSupported(_) => "NOT_SUPPORTED",
        }
    }
}

/// Maps an error message thrown by an injected script to a `SessionError`.
///
/// Injected helpers throw `Error("CODE: detail")`; anything without a known
/// code prefix is a plain script error.
pub fn map_script_error(message: &str, element_id: Option<u32>) -> SessionError {
    let trimmed = message
        .trim()
        .trim_start_matches("Uncaught ")
        .trim_start_matches("Error: ");
    let (code, detail) = match trimmed.split_once(':') {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (trimmed, ""),
    };
    match code {
        "ELEMENT_STALE" => SessionError::ElementStale {
            id: element_id.unwrap_or_default(),
        },
        "SELECTOR_INVALID" => SessionError::SelectorInvalid {
            selector: detail.to_string(),
        },
        _ => SessionError::ScriptError(message.to_string()),
    }
}
