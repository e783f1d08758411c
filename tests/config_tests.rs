use ferrous_host::{HostConfig, HostError};
use serial_test::serial;
use std::io::Write;
use std::path::PathBuf;

const VARS: [&str; 5] = [
    "FERROUS_HOST_BIND_ADDRESS",
    "FERROUS_HOST_WORKER_THREADS",
    "FERROUS_HOST_EXPOSE_ERROR_DETAILS",
    "FERROUS_HOST_PLUGIN_DIR",
    "FERROUS_HOST_LOG_FILTER",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_toml_overrides_defaults() {
    let config = HostConfig::from_toml_str(
        r#"
        bind_address = "0.0.0.0:9090"
        expose_error_details = true
        plugin_dir = "/opt/plugins"
        "#,
    )
    .unwrap();

    assert_eq!(config.bind_address, "0.0.0.0:9090");
    assert!(config.expose_error_details);
    assert_eq!(config.plugin_dir, Some(PathBuf::from("/opt/plugins")));
    assert_eq!(config.worker_threads, 4);
    assert_eq!(config.log_filter, "info");
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "worker_threads = 2").unwrap();
    writeln!(file, "log_filter = \"ferrous_host=debug\"").unwrap();

    let config = HostConfig::from_file(file.path()).unwrap();
    assert_eq!(config.worker_threads, 2);
    assert_eq!(config.log_filter, "ferrous_host=debug");
}

#[test]
fn test_missing_file_is_config_error() {
    assert!(matches!(
        HostConfig::from_file("/definitely/not/here.toml"),
        Err(HostError::Config(_))
    ));
}

#[test]
fn test_invalid_values_rejected() {
    assert!(HostConfig::from_toml_str("worker_threads = \"four\"").is_err());
    assert!(HostConfig::from_toml_str("bind_address = \"localhost\"").is_err());
    assert!(HostConfig::from_toml_str("worker_threads = 0").is_err());
}

#[test]
#[serial]
fn test_env_defaults_when_unset() {
    clear_env();
    assert_eq!(HostConfig::from_env().unwrap(), HostConfig::default());
}

#[test]
#[serial]
fn test_env_overrides() {
    clear_env();
    std::env::set_var("FERROUS_HOST_BIND_ADDRESS", "127.0.0.1:0");
    std::env::set_var("FERROUS_HOST_WORKER_THREADS", "8");
    std::env::set_var("FERROUS_HOST_EXPOSE_ERROR_DETAILS", "true");
    std::env::set_var("FERROUS_HOST_PLUGIN_DIR", "/srv/plugins");

    let config = HostConfig::from_env();
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.bind_address, "127.0.0.1:0");
    assert_eq!(config.worker_threads, 8);
    assert!(config.expose_error_details);
    assert_eq!(config.plugin_dir, Some(PathBuf::from("/srv/plugins")));
}

#[test]
#[serial]
fn test_env_invalid_number() {
    clear_env();
    std::env::set_var("FERROUS_HOST_WORKER_THREADS", "lots");
    let result = HostConfig::from_env();
    clear_env();
    assert!(matches!(result, Err(HostError::Config(message)) if message.contains("worker_threads")));
}
