use sketchseek_engine::config::{API_URL_ENV, ConfigError, ConfigLoader, SketchseekConfig};
use std::time::Duration;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sketchseek.yaml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[tokio::test]
async fn test_load_full_config() {
    let (_dir, path) = write_config(
        r#"
api:
  base_url: http://search.example:8080/v1
  request_timeout_ms: 15000
polling:
  interval_ms: 250
  max_attempts: 8
search:
  providers: [crawl, mock]
  limit: 5
"#,
    );

    let config = ConfigLoader::load_from(&path).await.unwrap();
    assert_eq!(config.api.base_url, "http://search.example:8080/v1");
    assert_eq!(config.api.request_timeout(), Some(Duration::from_secs(15)));

    let poll = config.poll_config();
    assert_eq!(poll.interval, Duration::from_millis(250));
    assert_eq!(poll.max_attempts, 8);

    let search = config.search_options();
    assert_eq!(search.providers, vec!["crawl".to_string(), "mock".to_string()]);
    assert_eq!(search.limit, 5);
}

#[tokio::test]
async fn test_empty_mapping_uses_defaults() {
    let (_dir, path) = write_config("{}\n");
    let config = ConfigLoader::load_from(&path).await.unwrap();
    assert_eq!(config, SketchseekConfig::default());
}

#[tokio::test]
async fn test_malformed_yaml_is_parse_error() {
    let (_dir, path) = write_config("polling:\n  max_attempts: lots\n");
    let err = ConfigLoader::load_from(&path).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load_from(&dir.path().join("absent.yaml"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[tokio::test]
async fn test_env_override_applies_to_loaded_file() {
    let (_dir, path) = write_config("api:\n  base_url: http://from-file:8000\n");
    let config = ConfigLoader::load_from(&path).await.unwrap();

    let config = ConfigLoader::apply_env(config, |key| {
        (key == API_URL_ENV).then(|| " http://from-env:9000 ".to_string())
    });
    assert_eq!(config.api.base_url, "http://from-env:9000");
}
