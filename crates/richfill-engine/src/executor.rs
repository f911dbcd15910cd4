//! Strategy Executor
//!
//! Runs a strategy chain against one editor handle:
//! attempt → settle → verify, retried in place with backoff, then on to the
//! next strategy. The first verified attempt wins. An overall deadline on
//! the session clock cuts everything short; once it passes no new attempt
//! starts.
//!
//! Strictly sequential: exactly one strategy touches the handle at a time.

use crate::diagnostics::{Diagnostics, notify};
use crate::handle::EditorHandle;
use crate::locator::remaining;
use crate::session::PageSession;
use crate::strategy::FillStrategy;
use crate::verifier::Verifier;
use richfill_common::protocol::{FailureKind, FillResult, RetryPolicy, StrategyOutcome};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// States of a single fill operation. `Success`, `Exhausted` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillPhase {
    Idle,
    Locating,
    Classifying,
    ExecutingStrategy(usize),
    Verifying,
    Success,
    Exhausted,
    Failed,
}

impl fmt::Display for FillPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillPhase::Idle => write!(f, "idle"),
            FillPhase::Locating => write!(f, "locating"),
            FillPhase::Classifying => write!(f, "classifying"),
            FillPhase::ExecutingStrategy(i) => write!(f, "executing-strategy[{}]", i),
            FillPhase::Verifying => write!(f, "verifying"),
            FillPhase::Success => write!(f, "success"),
            FillPhase::Exhausted => write!(f, "exhausted"),
            FillPhase::Failed => write!(f, "failed"),
        }
    }
}

impl FillPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FillPhase::Success | FillPhase::Exhausted | FillPhase::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct StrategyExecutor {
    policy: RetryPolicy,
    settle_delay: Duration,
    verifier: Verifier,
}

impl Default for StrategyExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), Duration::from_millis(500))
    }
}

impl StrategyExecutor {
    pub fn new(policy: RetryPolicy, settle_delay: Duration) -> Self {
        Self {
            policy,
            settle_delay,
            verifier: Verifier::new(),
        }
    }

    /// Execute `chain` until one attempt verifies, the chain is exhausted, or
    /// the session clock reaches `deadline`.
    pub async fn execute(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        content: &str,
        chain: &[Arc<dyn FillStrategy>],
        deadline: Duration,
        diagnostics: Option<&dyn Diagnostics>,
    ) -> FillResult {
        let mut log: Vec<StrategyOutcome> = Vec::new();
        let max_attempts = self.policy.max_attempts();

        for (index, strategy) in chain.iter().enumerate() {
            let name = strategy.name();
            info!(phase = %FillPhase::ExecutingStrategy(index), "Trying strategy '{}'", name);

            for attempt_index in 0..max_attempts {
                let attempt = attempt_index + 1;
                let Some(budget) = remaining(&*session, deadline) else {
                    return self.timed_out(name, log);
                };

                let timed = tokio::time::timeout(
                    budget,
                    self.run_attempt(session, handle, strategy.as_ref(), content, attempt),
                )
                .await;
                let outcome = match timed {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("Attempt {} of '{}' abandoned at the deadline", attempt, name);
                        let outcome = StrategyOutcome::failed(
                            name,
                            attempt,
                            None,
                            FailureKind::Timeout,
                            session.elapsed(),
                        );
                        report(diagnostics, &outcome);
                        log.push(outcome);
                        return self.timed_out(name, log);
                    }
                };

                let verified = outcome.succeeded;
                report(diagnostics, &outcome);
                log.push(outcome);

                if verified {
                    info!(
                        phase = %FillPhase::Success,
                        "Strategy '{}' verified on attempt {}/{}", name, attempt, max_attempts
                    );
                    return FillResult::success(name, log);
                }

                if attempt < max_attempts {
                    let delay = self.policy.delay_after(attempt_index);
                    let Some(budget) = remaining(&*session, deadline) else {
                        return self.timed_out(name, log);
                    };
                    if delay >= budget {
                        // The retry could never start before the deadline.
                        return self.timed_out(name, log);
                    }
                    debug!("Retrying '{}' in {:?}", name, delay);
                    tokio::time::sleep(delay).await;
                }
            }

            warn!("Strategy '{}' exhausted {} attempt(s)", name, max_attempts);
        }

        warn!(phase = %FillPhase::Exhausted, "Every strategy in the chain failed");
        FillResult::failure(FailureKind::Exhausted, log)
    }

    async fn run_attempt(
        &self,
        session: &mut dyn PageSession,
        handle: &EditorHandle,
        strategy: &dyn FillStrategy,
        content: &str,
        attempt: u32,
    ) -> StrategyOutcome {
        let name = strategy.name();
        let executed = strategy.attempt(session, handle, content).await;
        if let Err(e) = &executed {
            debug!("'{}' attempt {} errored: {}", name, attempt, e);
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        debug!(phase = %FillPhase::Verifying, "Verifying '{}' attempt {}", name, attempt);
        let check = self.verifier.check(session, handle, content).await;
        let at = session.elapsed();

        if check.verified {
            if let Err(e) = executed {
                warn!("'{}' reported an error but the content verified: {}", name, e);
            }
            return StrategyOutcome::verified(name, attempt, check.observed, at);
        }

        let failure = match executed {
            Err(e) => FailureKind::StrategyExecution {
                code: e.code().to_string(),
                message: e.to_string(),
            },
            Ok(()) => FailureKind::VerificationFailed,
        };
        StrategyOutcome::failed(name, attempt, check.observed, failure, at)
    }

    fn timed_out(&self, strategy: &str, log: Vec<StrategyOutcome>) -> FillResult {
        warn!(
            phase = %FillPhase::Failed,
            "Deadline reached during '{}' after {} attempt(s)", strategy, log.len()
        );
        FillResult::failure(FailureKind::Timeout, log)
    }
}

fn report(diagnostics: Option<&dyn Diagnostics>, outcome: &StrategyOutcome) {
    if let Some(d) = diagnostics {
        notify("on_strategy_attempt", || d.on_strategy_attempt(outcome));
    }
}
