use richfill_engine::config::loader::ConfigLoader;
use richfill_engine::config::schema::RichfillConfig;
use richfill_engine::EditorFiller;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_default_values() {
    let config = RichfillConfig::default();
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.base_delay_ms, 500);
    assert_eq!(config.fill.overall_timeout(), Duration::from_secs(60));
    assert_eq!(config.locator.selectors[0].selector, "div.ql-editor");
    assert_eq!(config.locator.selectors.len(), 8);
    assert_eq!(config.title.selectors.len(), 1);
}

#[tokio::test]
async fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r##"
retry:
  max_attempts: 5
  backoff_multiplier: 0.5
locator:
  selectors:
    - "#editor"
    - selector: ".slow-editor"
      wait_ms: 4000
fill:
  settle_delay_ms: 100
"##
    )
    .unwrap();

    let config = ConfigLoader::load_from(file.path())
        .await
        .expect("Failed to load config from file");

    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.base_delay_ms, 500);
    // Shrinking backoff is clamped to constant delays.
    let policy = config.retry.policy();
    assert_eq!(policy.base_delay(), Duration::from_millis(500));
    assert_eq!(policy.backoff_multiplier(), 1.0);
    assert_eq!(policy.delay_after(3), Duration::from_millis(500));

    assert_eq!(config.locator.selectors.len(), 2);
    assert_eq!(config.locator.selectors[0].wait(), None);
    assert_eq!(
        config.locator.selectors[1].wait(),
        Some(Duration::from_millis(4000))
    );
    assert_eq!(config.locator.candidate_wait_ms, 1500);
    assert_eq!(config.fill.settle_delay_ms, 100);
    assert_eq!(config.fill.typing_delay_ms, 20);

    let _filler = EditorFiller::from_config(&config);
}

#[tokio::test]
async fn test_explicit_path_wins() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "fill:\n  overall_timeout_ms: 1234").unwrap();

    let config = ConfigLoader::load(Some(file.path())).await.unwrap();
    assert_eq!(config.fill.overall_timeout_ms, 1234);
}

#[tokio::test]
async fn test_load_from_nonexistent_file() {
    let result =
        ConfigLoader::load_from(std::path::Path::new("/nonexistent/path/richfill.yaml")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_malformed_yaml_is_a_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "retry: [unclosed").unwrap();

    let result = ConfigLoader::load_from(file.path()).await;
    assert!(matches!(
        result,
        Err(richfill_engine::config::ConfigError::Parse(_))
    ));
}
