//! Integration tests for configuration loading

use frete::domain::types::LatLng;
use frete::infra::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[brand]
name = "Frete Test"
greeting = "Hello Frete!"

[messaging]
host = "wa.example"
destination = "15550001111"

[booking]
default_quantity = 25
quantity_step = 10

[tracker]
origin_lat = 12.5
origin_lng = 77.25
interval_ms = 1500
seed = 99

[identity]
api_key = "test-key"
auth_domain = "frete-test.example.com"

[metrics]
interval_secs = 15
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.brand_name(), "Frete Test");
    assert_eq!(config.greeting(), "Hello Frete!");
    assert_eq!(config.messaging_host(), "wa.example");
    assert_eq!(config.messaging_destination(), "15550001111");
    assert_eq!(config.default_quantity().get(), 25);
    assert_eq!(config.quantity_step(), 10);
    assert!(config.identity_enabled());
    assert_eq!(config.identity().auth_domain, "frete-test.example.com");
    assert_eq!(config.metrics_interval_secs(), 15);

    let tracker = config.tracker_settings();
    assert_eq!(tracker.origin, LatLng::new(12.5, 77.25));
    assert_eq!(tracker.interval, Duration::from_millis(1500));
    assert_eq!(tracker.seed, Some(99));
    // Unset fields keep their defaults
    assert_eq!(tracker.max_drift, 0.05);
    assert_eq!(tracker.marker_label, "Fretor");
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.messaging_host(), "wa.me");
    assert_eq!(config.messaging_destination(), "916388194021");
    assert_eq!(config.default_quantity().get(), 10);
    assert!(!config.identity_enabled());
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[booking\ndefault_quantity = ").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config file"));
}

#[test]
fn test_zero_quantity_clamped() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[booking]\ndefault_quantity = 0\nquantity_step = 0\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.default_quantity().get(), 1);
    assert_eq!(config.quantity_step(), 1);
}
