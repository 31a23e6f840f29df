use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub flash: FlashConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow!("unknown log format `{other}`; expected `compact` or `json`")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlashConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub fallback_locale: Option<String>,
    /// Path to a TOML translation catalog; identifiers pass through untranslated when unset.
    #[serde(default)]
    pub translations: Option<String>,
    /// Cookie signing secret, at least 64 bytes. A random key is generated when unset.
    #[serde(default)]
    pub secret: Option<String>,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            locale: default_locale(),
            fallback_locale: None,
            translations: None,
            secret: None,
        }
    }
}

fn default_cookie_name() -> String { "_flash".to_string() }
fn default_locale() -> String { "en".to_string() }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.logging.normalize_from_env()?;
        self.flash.normalize_from_env();
        self.flash.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl LoggingConfig {
    /// `LOG_FORMAT` overrides the file setting.
    pub fn normalize_from_env(&mut self) -> Result<()> {
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            if !format.trim().is_empty() {
                self.format = LogFormat::parse(&format)?;
            }
        }
        Ok(())
    }
}

impl FlashConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(secret) = std::env::var("FLASH_SECRET") {
            if !secret.is_empty() {
                self.secret = Some(secret);
            }
        }
        if let Ok(locale) = std::env::var("FLASH_LOCALE") {
            if !locale.trim().is_empty() {
                self.locale = locale;
            }
        }
        if self.cookie_name.trim().is_empty() {
            self.cookie_name = default_cookie_name();
        }
    }

    pub fn validate(&self) -> Result<()> {
        let valid = self
            .cookie_name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'));
        if !valid {
            return Err(anyhow!("flash.cookie_name `{}` is not a valid cookie name", self.cookie_name));
        }
        if self.locale.trim().is_empty() {
            return Err(anyhow!("flash.locale is empty"));
        }
        if let Some(secret) = &self.secret {
            if secret.len() < 64 {
                return Err(anyhow!("flash.secret must be at least 64 bytes, got {}", secret.len()));
            }
        }
        if let Some(path) = &self.translations {
            if path.trim().is_empty() {
                return Err(anyhow!("flash.translations is set but empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() -> Result<()> {
        let mut cfg = load_from_str("")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.flash.cookie_name, "_flash");
        assert_eq!(cfg.flash.translations, None);
        Ok(())
    }

    #[test]
    fn reads_flash_section() -> Result<()> {
        let mut cfg = load_from_str(
            r#"
            [server]
            host = ""
            port = 3000
            worker_threads = 0

            [flash]
            cookie_name = "app_flash"
            fallback_locale = "en"
            translations = "locales/flash.toml"
            "#,
        )?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.flash.cookie_name, "app_flash");
        assert_eq!(cfg.flash.fallback_locale.as_deref(), Some("en"));
        assert_eq!(cfg.flash.translations.as_deref(), Some("locales/flash.toml"));
        Ok(())
    }

    #[test]
    fn reads_logging_and_secret() -> Result<()> {
        let secret = "s".repeat(64);
        let cfg = load_from_str(&format!(
            "[logging]\nformat = \"json\"\n\n[flash]\nsecret = \"{secret}\"\n"
        ))?;
        cfg.flash.validate()?;
        assert_eq!(cfg.logging.format, LogFormat::Json);
        assert_eq!(cfg.flash.secret.as_deref(), Some(secret.as_str()));
        assert_eq!(AppConfig::default().logging.format, LogFormat::Compact);
        Ok(())
    }

    #[test]
    fn parses_log_format_names() -> Result<()> {
        assert_eq!(LogFormat::parse("JSON")?, LogFormat::Json);
        assert_eq!(LogFormat::parse(" compact ")?, LogFormat::Compact);
        assert_eq!(LogFormat::parse("text")?, LogFormat::Compact);
        assert!(LogFormat::parse("xml").is_err());
        Ok(())
    }

    #[test]
    fn rejects_short_secret() {
        let mut cfg = AppConfig::default();
        cfg.flash.secret = Some("too-short".into());
        assert!(cfg.flash.validate().is_err());
    }

    #[test]
    fn rejects_bad_cookie_name() {
        let mut cfg = AppConfig::default();
        cfg.flash.cookie_name = "flash; Path=/".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_port_zero() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn loads_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[flash]\ncookie_name = \"from_file\"")?;
        let path = file.path().to_string_lossy().to_string();
        let cfg = load_from_file(&path)?;
        assert_eq!(cfg.flash.cookie_name, "from_file");
        Ok(())
    }
}
