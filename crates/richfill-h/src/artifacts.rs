use chromiumoxide::Page;
use chromiumoxide::page::ScreenshotParams;
use richfill_engine::diagnostics::Diagnostics;
use richfill_engine::protocol::{SelectorDescriptor, StrategyOutcome};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::runtime::Handle;
use tokio::task::JoinSet;

/// Writes a screenshot and the page HTML for every failed attempt and every
/// failed locate.
///
/// Capture runs on a background task so the fill never waits on disk or CDP.
/// Call [`ArtifactDiagnostics::flush`] before closing the browser, or pending
/// captures are lost. Artifacts are numbered in the order the hooks fired.
pub struct ArtifactDiagnostics {
    page: Page,
    dir: PathBuf,
    seq: AtomicU32,
    pending: Mutex<JoinSet<()>>,
}

impl ArtifactDiagnostics {
    pub fn new(page: Page, dir: impl Into<PathBuf>) -> Self {
        Self {
            page,
            dir: dir.into(),
            seq: AtomicU32::new(1),
            pending: Mutex::new(JoinSet::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn capture(&self, label: &str) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No async runtime; skipping '{}' artifacts", label);
            return;
        };
        let stem = format!("{:03}-{}", self.seq.fetch_add(1, Ordering::Relaxed), label);
        let page = self.page.clone();
        let dir = self.dir.clone();
        let capture = async move {
            match write_artifacts(&page, &dir, &stem).await {
                Ok(()) => tracing::info!("Saved {} artifacts to {}", stem, dir.display()),
                Err(e) => tracing::warn!("Failed to save {} artifacts: {}", stem, e),
            }
        };
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .spawn_on(capture, &runtime);
    }

    /// Wait for every capture started so far.
    pub async fn flush(&self) {
        let mut pending = std::mem::take(
            &mut *self
                .pending
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        while let Some(joined) = pending.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("Artifact capture task failed: {}", e);
            }
        }
    }
}

async fn write_artifacts(
    page: &Page,
    dir: &Path,
    stem: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tokio::fs::create_dir_all(dir).await?;

    let png = page
        .screenshot(ScreenshotParams::builder().full_page(true).build())
        .await
        .map_err(|e| format!("Screenshot failed: {}", e))?;
    tokio::fs::write(dir.join(format!("{}.png", stem)), png).await?;

    let html = page
        .content()
        .await
        .map_err(|e| format!("Page source failed: {}", e))?;
    tokio::fs::write(dir.join(format!("{}.html", stem)), html).await?;

    Ok(())
}

impl Diagnostics for ArtifactDiagnostics {
    fn on_strategy_attempt(&self, outcome: &StrategyOutcome) {
        if !outcome.succeeded {
            self.capture(&format!("{}-attempt{}", outcome.strategy, outcome.attempt));
        }
    }

    fn on_locate_failed(&self, _candidates: &[SelectorDescriptor]) {
        self.capture("locate-failed");
    }
}
