//! Configuration loading from TOML files
//!
//! The binary picks the file path (`--config`, then `CONFIG_FILE`, then
//! `config/dev.toml`) and hands it to `Config::load_from_path`.
//!
//! Every section and field is optional; missing values take the defaults below.

use crate::domain::types::{LatLng, Quantity};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
    pub name: String,
    /// Prefix of every booking message
    pub greeting: String,
    /// Message used by the generic "Book a Fretor" links
    pub default_message: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "Frete".to_string(),
            greeting: "Hi Frete!".to_string(),
            default_message: "Hi Frete! I want to book a Fretor visit to check quality and place a custom apparel order.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub host: String,
    /// Phone number the deep links are addressed to
    pub destination: String,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self { host: "wa.me".to_string(), destination: "916388194021".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub default_quantity: u32,
    pub quantity_step: u32,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self { default_quantity: 10, quantity_step: 5 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub zoom: u8,
    pub interval_ms: u64,
    /// Full width of the per-tick random offset on each axis
    pub step_span: f64,
    /// Maximum distance from origin on each axis
    pub max_drift: f64,
    pub tile_url: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub marker_label: String,
    pub init_retry_interval_ms: u64,
    pub init_max_attempts: u32,
    /// Fixed RNG seed for reproducible walks
    pub seed: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            origin_lat: 22.3460,
            origin_lng: 87.2310,
            zoom: 12,
            interval_ms: 3000,
            step_span: 0.01,
            max_drift: 0.05,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap".to_string(),
            max_zoom: 19,
            marker_label: "Fretor".to_string(),
            init_retry_interval_ms: 100,
            init_max_attempts: 40,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub api_key: String,
    pub auth_domain: String,
    pub project_id: String,
    pub storage_bucket: String,
    pub messaging_sender_id: String,
    pub app_id: String,
    pub measurement_id: String,
    /// Base URL of the identity toolkit REST API
    pub endpoint: String,
    pub timeout_ms: u64,
    /// Bot-check token forwarded with phone verification requests
    pub recaptcha_token: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            auth_domain: String::new(),
            project_id: String::new(),
            storage_bucket: String::new(),
            messaging_sender_id: String::new(),
            app_id: String::new(),
            measurement_id: String::new(),
            endpoint: "https://identitytoolkit.googleapis.com/v1".to_string(),
            timeout_ms: 10_000,
            recaptcha_token: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    pub brand: BrandConfig,
    pub messaging: MessagingConfig,
    pub booking: BookingConfig,
    pub tracker: TrackerConfig,
    pub identity: IdentityConfig,
    pub metrics: MetricsConfig,
}

/// Tracker parameters handed to the simulated tracker
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub origin: LatLng,
    pub zoom: u8,
    pub interval: Duration,
    pub step_span: f64,
    pub max_drift: f64,
    pub tile_url: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub marker_label: String,
    pub init_retry_interval: Duration,
    pub init_max_attempts: u32,
    pub seed: Option<u64>,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    brand: BrandConfig,
    messaging: MessagingConfig,
    booking: BookingConfig,
    tracker: TrackerConfig,
    identity: IdentityConfig,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            brand: toml_config.brand,
            messaging: toml_config.messaging,
            booking: toml_config.booking,
            tracker: toml_config.tracker,
            identity: toml_config.identity,
            metrics_interval_secs: toml_config.metrics.interval_secs.max(1),
            config_file,
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load from an explicit path, falling back to defaults on any error
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    pub fn brand_name(&self) -> &str {
        &self.brand.name
    }

    pub fn greeting(&self) -> &str {
        &self.brand.greeting
    }

    pub fn default_message(&self) -> &str {
        &self.brand.default_message
    }

    pub fn messaging_host(&self) -> &str {
        &self.messaging.host
    }

    pub fn messaging_destination(&self) -> &str {
        &self.messaging.destination
    }

    pub fn default_quantity(&self) -> Quantity {
        Quantity::new(self.booking.default_quantity)
    }

    /// Step used by the prompt's +/- buttons (at least 1)
    pub fn quantity_step(&self) -> u32 {
        self.booking.quantity_step.max(1)
    }

    pub fn identity(&self) -> &IdentityConfig {
        &self.identity
    }

    /// Whether a hosted identity provider is configured
    pub fn identity_enabled(&self) -> bool {
        !self.identity.api_key.trim().is_empty()
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        let t = &self.tracker;
        TrackerSettings {
            origin: LatLng::new(t.origin_lat, t.origin_lng),
            zoom: t.zoom.min(t.max_zoom),
            interval: Duration::from_millis(t.interval_ms.max(1)),
            step_span: t.step_span.abs(),
            max_drift: t.max_drift.abs(),
            tile_url: t.tile_url.clone(),
            attribution: t.attribution.clone(),
            max_zoom: t.max_zoom,
            marker_label: t.marker_label.clone(),
            init_retry_interval: Duration::from_millis(t.init_retry_interval_ms),
            init_max_attempts: t.init_max_attempts.max(1),
            seed: t.seed,
        }
    }

    /// Builder method for tests to pin the tracker RNG
    pub fn with_tracker_seed(mut self, seed: u64) -> Self {
        self.tracker.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.brand_name(), "Frete");
        assert_eq!(config.greeting(), "Hi Frete!");
        assert_eq!(config.messaging_host(), "wa.me");
        assert_eq!(config.messaging_destination(), "916388194021");
        assert_eq!(config.default_quantity().get(), 10);
        assert_eq!(config.quantity_step(), 5);
        assert!(!config.identity_enabled());
    }

    #[test]
    fn test_default_tracker_settings() {
        let settings = Config::default().tracker_settings();
        assert_eq!(settings.origin, LatLng::new(22.3460, 87.2310));
        assert_eq!(settings.interval, Duration::from_millis(3000));
        assert_eq!(settings.zoom, 12);
        assert_eq!(settings.max_zoom, 19);
        assert_eq!(settings.init_max_attempts, 40);
        assert_eq!(settings.init_retry_interval, Duration::from_millis(100));
        assert!((settings.step_span - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[messaging]
destination = "15550001111"

[booking]
quantity_step = 0
"#,
        )
        .unwrap();
        let config = Config::from_toml(toml_config, "inline".to_string());
        assert_eq!(config.messaging_destination(), "15550001111");
        assert_eq!(config.messaging_host(), "wa.me");
        assert_eq!(config.quantity_step(), 1);
        assert_eq!(config.default_quantity().get(), 10);
    }
}
