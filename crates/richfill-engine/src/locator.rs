//! Locator Resolver
//!
//! Sweeps an ordered candidate list until one selector yields a visible
//! element or the budget runs out. Each probe gets a short wait window of its
//! own, so a dead selector near the top of the list cannot starve the rest.

use crate::session::PageSession;
use richfill_common::protocol::{ElementRef, SelectorDescriptor};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Smallest pause between sweeps; keeps a session whose probes return
/// instantly from spinning.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Error)]
pub enum LocateError {
    #[error("No candidate selectors given")]
    NoCandidates,

    #[error("No visible editor after {sweeps} sweep(s) over {candidates} candidate(s)")]
    NotFound { candidates: usize, sweeps: u32 },
}

#[derive(Debug, Clone)]
pub struct LocatorResolver {
    default_wait: Duration,
    sweep_interval: Duration,
}

impl Default for LocatorResolver {
    fn default() -> Self {
        Self::new(Duration::from_millis(1500), Duration::from_millis(250))
    }
}

impl LocatorResolver {
    pub fn new(default_wait: Duration, sweep_interval: Duration) -> Self {
        Self {
            default_wait,
            sweep_interval: sweep_interval.max(MIN_SWEEP_INTERVAL),
        }
    }

    /// Find the first visible element matching any candidate, in priority order.
    ///
    /// The page is only queried, never mutated.
    pub async fn resolve(
        &self,
        session: &mut dyn PageSession,
        candidates: &[SelectorDescriptor],
        timeout: Duration,
    ) -> Result<ElementRef, LocateError> {
        if candidates.is_empty() {
            return Err(LocateError::NoCandidates);
        }

        let deadline = session.elapsed().saturating_add(timeout);
        let not_found = |sweeps| LocateError::NotFound {
            candidates: candidates.len(),
            sweeps,
        };
        let mut sweeps = 0;

        loop {
            sweeps += 1;
            for candidate in candidates {
                let Some(left) = remaining(&*session, deadline) else {
                    return Err(not_found(sweeps));
                };
                let wait = candidate.wait().unwrap_or(self.default_wait).min(left);

                match tokio::time::timeout(left, session.find_visible(candidate, wait)).await {
                    Ok(Ok(Some(element))) => {
                        debug!(
                            "Resolved editor via '{}' on sweep {} (element {})",
                            candidate, sweeps, element.id
                        );
                        return Ok(element);
                    }
                    Ok(Ok(None)) => debug!("No visible match for '{}'", candidate),
                    Ok(Err(e)) => warn!("Probe for '{}' failed (treated as miss): {}", candidate, e),
                    Err(_) => {
                        debug!("Probe for '{}' outlived the locate budget", candidate);
                        return Err(not_found(sweeps));
                    }
                }
            }

            let Some(left) = remaining(&*session, deadline) else {
                return Err(not_found(sweeps));
            };
            tokio::time::sleep(self.sweep_interval.min(left)).await;
        }
    }
}

/// Time left before `deadline` on the session clock, `None` once it has passed.
pub(crate) fn remaining(session: &dyn PageSession, deadline: Duration) -> Option<Duration> {
    deadline
        .checked_sub(session.elapsed())
        .filter(|left| !left.is_zero())
}
