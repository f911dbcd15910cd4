use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

type CdpResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// How to start Chromium.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub visible: bool,
    /// Persistent profile; a throwaway one is created when unset.
    pub user_data_dir: Option<PathBuf>,
    pub chrome_bin: Option<PathBuf>,
}

impl LaunchOptions {
    /// Options from `RICHFILL_USER_DATA_DIR` and `CHROME_BIN`.
    pub fn from_env(visible: bool) -> Self {
        Self {
            visible,
            user_data_dir: std::env::var_os("RICHFILL_USER_DATA_DIR").map(PathBuf::from),
            chrome_bin: std::env::var_os("CHROME_BIN").map(PathBuf::from),
        }
    }
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    profile: Profile,
}

struct Profile {
    dir: PathBuf,
    ephemeral: bool,
}

impl CdpClient {
    pub async fn launch(visible: bool) -> CdpResult<Self> {
        Self::launch_with(LaunchOptions::from_env(visible)).await
    }

    pub async fn launch_with(options: LaunchOptions) -> CdpResult<Self> {
        let profile = Profile::resolve(options.user_data_dir.clone())?;
        let mut config_builder = BrowserConfig::builder()
            .no_sandbox() // Often needed in docker/CI/restricted envs
            .user_data_dir(&profile.dir);

        if options.visible {
            tracing::info!("Launching browser in visible mode");
            config_builder = config_builder.with_head();
        } else {
            tracing::info!("Launching browser in headless mode");
        }

        if let Some(chrome_bin) = &options.chrome_bin {
            tracing::info!("Using custom Chrome binary: {}", chrome_bin.display());
            config_builder = config_builder.chrome_executable(chrome_bin);
        }

        let (browser, mut handler) = Browser::launch(
            config_builder
                .build()
                .map_err(|e| format!("Failed to build browser config: {}", e))?,
        )
        .await
        .map_err(|e| format!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(e) = h {
                    tracing::error!("Browser handler error (ignoring): {}", e);
                }
            }
            tracing::info!("Browser handler task ended");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| format!("Failed to create page: {}", e))?;

        forward_console(&page).await?;
        accept_dialogs(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            profile,
        })
    }

    pub async fn close(mut self) -> CdpResult<()> {
        self.browser
            .close()
            .await
            .map_err(|e| format!("Error closing browser: {}", e))?;
        self.handler_task
            .await
            .map_err(|e| format!("Error awaiting handler: {}", e))?;

        if self.profile.ephemeral {
            if let Err(e) = std::fs::remove_dir_all(&self.profile.dir) {
                tracing::debug!(
                    "Failed to clean up user-data-dir {}: {}",
                    self.profile.dir.display(),
                    e
                );
            }
        }

        Ok(())
    }
}

impl Profile {
    /// A persistent profile keeps the editor site's login between runs.
    fn resolve(configured: Option<PathBuf>) -> CdpResult<Self> {
        if let Some(dir) = configured {
            std::fs::create_dir_all(&dir)?;
            tracing::info!("Using persistent user data dir: {}", dir.display());
            return Ok(Self {
                dir,
                ephemeral: false,
            });
        }

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| format!("System clock error: {}", e))?
            .as_nanos();
        let unique = format!("richfill-chromium-profile-{}-{}", std::process::id(), nanos);
        let dir = std::env::temp_dir().join(unique);
        std::fs::create_dir_all(&dir)?;
        tracing::info!("Using isolated user data dir: {}", dir.display());
        Ok(Self {
            dir,
            ephemeral: true,
        })
    }
}

/// Page console output at debug level; editor pages are chatty.
async fn forward_console(page: &Page) -> CdpResult<()> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .map_err(|e| format!("Failed to subscribe to console events: {}", e))?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let args: Vec<String> = event
                .args
                .iter()
                .map(|arg| {
                    arg.description
                        .clone()
                        .or_else(|| arg.value.as_ref().map(|v| v.to_string()))
                        .unwrap_or_else(|| "unknown".to_string())
                })
                .collect();
            tracing::debug!("Browser Console [{:?}]: {}", event.r#type, args.join(" "));
        }
    });
    Ok(())
}

/// Auto-accept alert/confirm/prompt. A leave-page or draft-restore dialog
/// would otherwise block every injected script.
async fn accept_dialogs(page: &Page) -> CdpResult<()> {
    let mut events = page
        .event_listener::<EventJavascriptDialogOpening>()
        .await
        .map_err(|e| format!("Failed to subscribe to dialog events: {}", e))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            tracing::info!(
                "Handling JavaScript Dialog: {} ({:?})",
                event.message,
                event.r#type
            );
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                tracing::error!("Failed to handle/accept dialog: {}", e);
            }
        }
    });
    Ok(())
}
