use chromiumoxide::Page;
use richfill_engine::error::{SessionError, map_script_error};
use serde_json::Value;
use std::time::Duration;

/// Page-side element registry.
///
/// Located elements are remembered in a map keyed by a numeric id, so the
/// engine can hold onto an element without the page being mutated (no marker
/// attributes). A reference whose node has left the document throws
/// `ELEMENT_STALE`. The registry lives and dies with the document.
const REGISTRY_JS: &str = r#"(() => {
    if (window.__richfill) {
        return;
    }
    const elements = new Map();
    let nextId = 1;
    const isVisible = (el) => {
        if (!el.isConnected) {
            return false;
        }
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden' || Number(style.opacity) === 0) {
            return false;
        }
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    };
    window.__richfill = {
        find(selector) {
            let nodes;
            try {
                nodes = document.querySelectorAll(selector);
            } catch (e) {
                throw new Error('SELECTOR_INVALID: ' + selector);
            }
            for (const el of nodes) {
                if (!isVisible(el)) {
                    continue;
                }
                for (const [id, known] of elements) {
                    if (known === el) {
                        return id;
                    }
                }
                const id = nextId++;
                elements.set(id, el);
                return id;
            }
            return null;
        },
        get(id) {
            const el = elements.get(id);
            if (!el || !el.isConnected) {
                elements.delete(id);
                throw new Error('ELEMENT_STALE: ' + id);
            }
            return el;
        },
        read(id) {
            const el = this.get(id);
            return el.tagName === 'INPUT' || el.tagName === 'TEXTAREA' ? el.value : el.innerHTML;
        },
        call(id, fn, args) {
            return fn(this.get(id), args);
        },
    };
})();
"#;

/// Default timeout for JavaScript evaluation (10 seconds).
/// This prevents hanging when dialogs (alert/confirm/prompt) block the JS thread.
const EVAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum retries for context errors during page navigation.
const MAX_CONTEXT_RETRIES: u32 = 10;

/// Delay between retries when context is not found (page navigating).
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

const ERROR_CODES: [&str; 2] = ["ELEMENT_STALE:", "SELECTOR_INVALID:"];

/// Check if an error indicates the page context is unavailable (e.g., during navigation).
fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Probe `selector` for a visible element; returns its registry id.
pub async fn find_visible(page: &Page, selector: &str) -> Result<Option<u32>, SessionError> {
    let expression = format!("window.__richfill.find({})", serde_json::to_string(selector)?);
    let value = evaluate(page, &expression, None).await?;
    Ok(value.as_u64().and_then(|id| u32::try_from(id).ok()))
}

/// Materialized content of a registered element.
pub async fn read_content(page: &Page, element_id: u32) -> Result<String, SessionError> {
    let expression = format!("window.__richfill.read({})", element_id);
    match evaluate(page, &expression, Some(element_id)).await? {
        Value::String(content) => Ok(content),
        Value::Null => Ok(String::new()),
        other => Err(SessionError::ScriptError(format!(
            "Unexpected content type for element {}: {}",
            element_id, other
        ))),
    }
}

/// Call `script`, a `(el, args) => ...` function expression, on a registered element.
pub async fn call_on_element(
    page: &Page,
    element_id: u32,
    script: &str,
    args: &Value,
) -> Result<Value, SessionError> {
    let expression = format!(
        "window.__richfill.call({}, {}, {})",
        element_id,
        script,
        serde_json::to_string(args)?
    );
    evaluate(page, &expression, Some(element_id)).await
}

/// Evaluate `expression` with the registry installed, retrying while the
/// page is between documents.
async fn evaluate(
    page: &Page,
    expression: &str,
    element_id: Option<u32>,
) -> Result<Value, SessionError> {
    let program = format!("{}{}", REGISTRY_JS, expression);
    let mut last_error = None;

    for attempt in 0..MAX_CONTEXT_RETRIES {
        match evaluate_with_timeout(page, &program).await {
            Ok(value) => return Ok(value),
            Err(EvalError::Timeout) => {
                return Err(SessionError::TimeoutWithContext {
                    operation: "script evaluation (possibly blocked by a dialog)".into(),
                });
            }
            Err(EvalError::Context(err_str)) => {
                tracing::debug!(
                    "Context error during evaluation (attempt {}/{}), retrying...",
                    attempt + 1,
                    MAX_CONTEXT_RETRIES
                );
                last_error = Some(err_str);
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
            Err(EvalError::Other(err_str)) => return Err(script_failure(&err_str, element_id)),
        }
    }

    Err(SessionError::Navigation(last_error.unwrap_or_else(|| {
        "Execution context unavailable after retries".to_string()
    })))
}

/// Map a CDP exception to the session taxonomy, looking for a registry code
/// anywhere in the (often wrapped) message.
fn script_failure(message: &str, element_id: Option<u32>) -> SessionError {
    let coded = ERROR_CODES
        .iter()
        .find_map(|code| message.find(code))
        .map(|at| message[at..].lines().next().unwrap_or_default());
    match coded {
        Some(coded) => map_script_error(coded, element_id),
        None => SessionError::ScriptError(message.to_string()),
    }
}

enum EvalError {
    Timeout,
    Context(String),
    Other(String),
}

async fn evaluate_with_timeout(page: &Page, expression: &str) -> Result<Value, EvalError> {
    let eval_result =
        tokio::time::timeout(EVAL_TIMEOUT, page.evaluate_expression(expression)).await;

    match eval_result {
        Err(_) => Err(EvalError::Timeout),
        Ok(Err(e)) => {
            let err_str = e.to_string();
            if is_context_error(&err_str) {
                Err(EvalError::Context(err_str))
            } else {
                Err(EvalError::Other(err_str))
            }
        }
        Ok(Ok(result)) => match result.value() {
            Some(value) => Ok(value.clone()),
            None => Ok(Value::Null),
        },
    }
}
