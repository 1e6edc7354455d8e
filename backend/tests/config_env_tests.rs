//! Configuration file loading and environment overrides.

mod support;

use std::io::Write;
use std::time::Duration;

use cellzone::config::AppConfig;
use cellzone::VizError;
use support::with_scoped_env;
use tempfile::NamedTempFile;

const OVERRIDES: [&str; 7] = [
    "CELLZONE_PRODUCER_URL",
    "CELLZONE_KPI_URL",
    "CELLZONE_SILENCE_TIMEOUT_SECS",
    "CELLZONE_RECONNECT",
    "CELLZONE_QUALITY_CONFIG",
    "HOST",
    "PORT",
];

fn cleared<'a>(set: &[(&'a str, Option<&'a str>)]) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&str, Option<&str>)> = OVERRIDES
        .iter()
        .filter(|k| !set.iter().any(|(s, _)| s == *k))
        .map(|k| (*k, None))
        .collect();
    changes.extend_from_slice(set);
    changes
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_values_are_loaded() {
    let file = config_file(
        r#"
[producer]
base_url = "http://producer:9000/api/adb"

[stream]
silence_timeout_secs = 12
reconnect = false

[render]
width = 1024.0
height = 768.0

[server]
port = 9100
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.producer.base_url, "http://producer:9000/api/adb");
    assert_eq!(config.client_options().silence_timeout, Duration::from_secs(12));
    assert!(!config.stream.reconnect);
    assert_eq!(config.render_style().size.width, 1024.0);
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "0.0.0.0");
}

#[test]
fn test_environment_overrides_file() {
    let file = config_file("[server]\nport = 9100\n");

    let config = with_scoped_env(
        &cleared(&[
            ("CELLZONE_PRODUCER_URL", Some("http://env-producer/api")),
            ("CELLZONE_SILENCE_TIMEOUT_SECS", Some("5")),
            ("CELLZONE_RECONNECT", Some("false")),
            ("PORT", Some("7000")),
        ]),
        || {
            let mut config = AppConfig::from_file(file.path()).unwrap();
            config.apply_env().unwrap();
            config
        },
    );

    assert_eq!(config.producer.base_url, "http://env-producer/api");
    assert_eq!(config.stream.silence_timeout_secs, 5);
    assert!(!config.stream.reconnect);
    assert_eq!(config.bind_address(), "0.0.0.0:7000");
}

#[test]
fn test_invalid_port_is_configuration_error() {
    let result = with_scoped_env(&cleared(&[("PORT", Some("not-a-port"))]), || {
        AppConfig::default().apply_env()
    });

    match result {
        Err(VizError::Configuration { message, .. }) => assert!(message.contains("PORT")),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_quality_file_from_environment() {
    let quality = config_file(
        r##"
default_scheme = "mono"

[schemes.mono]
excellent = "#ffffff"
good = "#cccccc"
fair = "#888888"
poor = "#444444"
"##,
    );
    let path = quality.path().display().to_string();

    let config = with_scoped_env(&cleared(&[("CELLZONE_QUALITY_CONFIG", Some(path.as_str()))]), || {
        let mut config = AppConfig::default();
        config.apply_env().unwrap();
        config
    });

    let quality = config.quality().unwrap();
    assert_eq!(quality.default_scheme, "mono");
    assert!(quality.has_scheme("mono"));
    assert!(!quality.has_scheme("viridis"));
}

#[test]
fn test_missing_file_reports_path() {
    let err = AppConfig::from_file("/nonexistent/cellzone.toml").unwrap_err();
    assert!(matches!(err, VizError::Configuration { .. }));
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_malformed_file_is_not_replaced_by_defaults() {
    let file = config_file("[server]\nport = \"not-a-port\"\n");

    let result = with_scoped_env(&cleared(&[]), || AppConfig::load_from(Some(file.path().to_path_buf())));

    match result {
        Err(VizError::Configuration { message, .. }) => {
            assert!(message.contains("Failed to parse config file"))
        }
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn test_no_file_loads_defaults() {
    let config = with_scoped_env(&cleared(&[]), || AppConfig::load_from(None)).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_zero_silence_timeout_from_environment_rejected() {
    let result = with_scoped_env(&cleared(&[("CELLZONE_SILENCE_TIMEOUT_SECS", Some("0"))]), || {
        AppConfig::default().apply_env()
    });

    match result {
        Err(VizError::Configuration { message, .. }) => assert!(message.contains("silence_timeout_secs")),
        other => panic!("expected configuration error, got {:?}", other),
    }
}
