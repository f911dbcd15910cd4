use anyhow::{Context, bail};
use clap::{ArgGroup, Parser};
use richfill_engine::EditorFiller;
use richfill_engine::compose::compose_with_topics;
use richfill_engine::config::{ConfigLoader, RichfillConfig};
use richfill_engine::diagnostics::{CompositeDiagnostics, TracingDiagnostics};
use richfill_engine::protocol::{FillRequest, FillResult, SelectorDescriptor};
use richfill_engine::session::PageSession;
use richfill_h::{ArtifactDiagnostics, HeadlessSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "richfill",
    version,
    about = "Fill a web page's rich-text editor and verify the result"
)]
#[command(group(ArgGroup::new("body").required(true).args(["content", "content_file"])))]
struct Args {
    /// Page that hosts the editor
    #[arg(long)]
    url: String,

    /// Body text
    #[arg(long)]
    content: Option<String>,

    /// Read the body text from a file
    #[arg(long)]
    content_file: Option<PathBuf>,

    /// Title text, filled into the title field before the body
    #[arg(long)]
    title: Option<String>,

    /// Hashtag appended to the body (repeatable)
    #[arg(long = "topic")]
    topics: Vec<String>,

    /// Editor selector, highest priority first (repeatable; replaces the configured list)
    #[arg(long = "selector")]
    selectors: Vec<String>,

    /// Overall timeout per fill, in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Config file (defaults to ./richfill.yaml, then ~/.richfill/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for screenshots and page dumps of failed attempts
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Launch browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ConfigLoader::load(args.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let content = match (&args.content, &args.content_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => bail!("one of --content or --content-file is required"),
    };

    let mut session = HeadlessSession::new_with_visibility(args.visible);
    session
        .launch()
        .await
        .context("Failed to launch browser")?;

    let artifacts = args.artifacts.as_ref().and_then(|dir| {
        session
            .get_client()
            .map(|client| Arc::new(ArtifactDiagnostics::new(client.page.clone(), dir)))
    });

    let outcome = run(&mut session, &args, &config, &content, artifacts.clone()).await;

    // Captures read from the page, so they must finish before the browser goes.
    if let Some(artifacts) = &artifacts {
        artifacts.flush().await;
        tracing::info!("Failure artifacts under {}", artifacts.dir().display());
    }
    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }

    let results = outcome?;
    let mut report = serde_json::Map::new();
    for (field, result) in &results {
        report.insert(field.to_string(), serde_json::to_value(result)?);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    if results.iter().any(|(_, result)| !result.succeeded) {
        bail!("editor fill failed");
    }
    Ok(())
}

async fn run(
    session: &mut HeadlessSession,
    args: &Args,
    config: &RichfillConfig,
    content: &str,
    artifacts: Option<Arc<ArtifactDiagnostics>>,
) -> anyhow::Result<Vec<(&'static str, FillResult)>> {
    session
        .navigate(&args.url)
        .await
        .with_context(|| format!("Failed to open {}", args.url))?;

    let mut diagnostics = CompositeDiagnostics::new().with(Arc::new(TracingDiagnostics));
    if let Some(artifacts) = artifacts {
        diagnostics = diagnostics.with(artifacts);
    }
    let filler = EditorFiller::from_config(config).with_diagnostics(Arc::new(diagnostics));

    let timeout = args
        .timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.fill.overall_timeout());

    let mut results = Vec::new();

    if let Some(title) = &args.title {
        let request = FillRequest::new(config.title.selectors.clone(), title.as_str(), timeout);
        let result = filler.fill_editor(session, &request).await;
        log_result("title", &result);
        results.push(("title", result));
    }

    let candidates: Vec<SelectorDescriptor> = if args.selectors.is_empty() {
        config.locator.selectors.clone()
    } else {
        args.selectors.iter().map(|s| SelectorDescriptor::from(s.as_str())).collect()
    };
    let body = compose_with_topics(content, &args.topics);
    let request = FillRequest::new(candidates, body, timeout);
    let result = filler.fill_editor(session, &request).await;
    log_result("body", &result);
    results.push(("body", result));

    Ok(results)
}

fn log_result(field: &str, result: &FillResult) {
    if result.succeeded {
        tracing::info!(
            "Filled {} with '{}' after {} attempt(s)",
            field,
            result.strategy_used.as_deref().unwrap_or("?"),
            result.attempts_log.len()
        );
    } else {
        tracing::error!(
            "Could not fill {}: {}",
            field,
            result
                .failure
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        );
    }
}
