use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint (e.g. http://tempo:4317). Spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

/// Start a configuration builder layered as `<dir>/base.yaml` then
/// `APP_`-prefixed environment variables (`APP_SERVER__PORT=9000`).
///
/// Loads `.env` first so that both layers can see its values.
pub fn layered(configuration_directory: &Path) -> ConfigBuilder<DefaultState> {
    dotenvy::dotenv().ok();

    Cfg::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_default_address() {
        let settings = ServerSettings::default();
        assert_eq!(settings.address(), "127.0.0.1:8080");
    }

    #[test]
    fn telemetry_settings_fill_missing_fields() {
        let settings: TelemetrySettings = Cfg::builder()
            .set_override("log_level", "debug")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.log_level, "debug");
        assert!(settings.otlp_endpoint.is_none());
    }

    #[test]
    fn layered_tolerates_missing_base_file() {
        let cfg = layered(Path::new("/nonexistent/config-dir"))
            .set_default("server.port", 9100)
            .unwrap()
            .build()
            .unwrap();

        let server: ServerSettings = cfg.get("server").unwrap();
        assert_eq!(server.port, 9100);
        assert_eq!(server.host, "127.0.0.1");
    }
}
