use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, ServerSettings, TelemetrySettings};
use service_core::error::AppError;
use std::path::Path;

/// Environment variable holding the xAI API key.
pub const API_KEY_ENV: &str = "XAI_API_KEY";

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub xai: XaiSettings,
    pub chat: ChatSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct XaiSettings {
    pub base_url: String,
    /// Whole-request timeout for a completion call.
    pub timeout_secs: u64,
    /// Read from `XAI_API_KEY`. The provider reports itself unconfigured when absent.
    #[serde(default)]
    pub api_key: Option<Secret<String>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ChatSettings {
    pub variant: Variant,
    /// Overrides the variant's default model when set.
    #[serde(default)]
    pub model: Option<String>,
    pub sanitize_html: bool,
    pub max_upload_bytes: usize,
}

impl ChatSettings {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            model: None,
            sanitize_html: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Model identifier sent with every completion request.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.variant.default_model())
    }
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Page flavour: which model is asked and how its reply is shown.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Markdown reply rendered to HTML.
    Rich,
    /// Reply shown verbatim.
    Basic,
}

impl Variant {
    pub fn default_model(self) -> &'static str {
        match self {
            Variant::Rich => "grok-4-fast-reasoning",
            Variant::Basic => "grok-4",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Variant::Rich => "Grok 4 Fast",
            Variant::Basic => "Grok 4",
        }
    }

    pub fn renders_markdown(self) -> bool {
        matches!(self, Variant::Rich)
    }
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir()?;

    // Check if we're already in the grok-chat directory or at the workspace root
    let configuration_directory = if base_path.ends_with("grok-chat") {
        base_path.join("config")
    } else {
        base_path.join("grok-chat").join("config")
    };

    build_settings(&configuration_directory, std::env::var(API_KEY_ENV).ok())
}

/// Defaults, then `base.yaml` in `configuration_directory`, then `APP_`
/// environment variables. `api_key` always wins over any configured key.
pub fn build_settings(
    configuration_directory: &Path,
    api_key: Option<String>,
) -> Result<Settings, AppError> {
    let settings = core_config::layered(configuration_directory)
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5000)?
        .set_default("xai.base_url", "https://api.x.ai/v1")?
        .set_default("xai.timeout_secs", 3600)?
        .set_default("chat.variant", "rich")?
        .set_default("chat.sanitize_html", true)?
        .set_default("chat.max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES as u64)?
        .set_override_option("xai.api_key", api_key)?
        .build()?;

    Ok(settings.try_deserialize::<Settings>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_defaults() {
        assert_eq!(Variant::Rich.default_model(), "grok-4-fast-reasoning");
        assert_eq!(Variant::Basic.default_model(), "grok-4");
        assert!(Variant::Rich.renders_markdown());
        assert!(!Variant::Basic.renders_markdown());
    }

    #[test]
    fn model_override_wins() {
        let mut chat = ChatSettings::new(Variant::Basic);
        assert_eq!(chat.model(), "grok-4");

        chat.model = Some("grok-3-mini".to_string());
        assert_eq!(chat.model(), "grok-3-mini");
    }

    #[test]
    fn chat_settings_deserialize_from_yaml() {
        let yaml = "variant: basic\nsanitize_html: false\nmax_upload_bytes: 1024\n";
        let chat: ChatSettings = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(chat.variant, Variant::Basic);
        assert!(!chat.sanitize_html);
        assert_eq!(chat.max_upload_bytes, 1024);
        assert!(chat.model.is_none());
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("no-such-config");
        let settings = build_settings(&dir, None).unwrap();

        assert_eq!(settings.server.address(), "127.0.0.1:5000");
        assert_eq!(settings.xai.base_url, "https://api.x.ai/v1");
        assert_eq!(settings.xai.timeout_secs, 3600);
        assert!(settings.xai.api_key.is_none());
        assert_eq!(settings.chat.variant, Variant::Rich);
        assert_eq!(settings.chat.model(), "grok-4-fast-reasoning");
        assert!(settings.chat.sanitize_html);
        assert_eq!(settings.chat.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn shipped_base_yaml_matches_defaults() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        let settings = build_settings(&dir, Some("xai-test".to_string())).unwrap();

        assert_eq!(settings.server.address(), "127.0.0.1:5000");
        assert_eq!(settings.xai.timeout_secs, 3600);
        assert_eq!(settings.chat.model(), "grok-4-fast-reasoning");

        use secrecy::ExposeSecret;
        let key = settings.xai.api_key.unwrap();
        assert_eq!(key.expose_secret(), "xai-test");
    }
}
