// Configuration module

pub mod pipeline;
pub mod server;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::logging::LoggingConfig;
pub use pipeline::{FetchConfig, ImageConfig, WatermarkConfig};
pub use server::ServerConfig;

/// Top-level service configuration. Every section may be omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                )
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be greater than 0".to_string());
        }
        if self.server.max_body_size == 0 {
            return Err("server.max_body_size must be greater than 0".to_string());
        }
        if self.server.max_concurrent_transforms == 0 {
            return Err("server.max_concurrent_transforms must be greater than 0".to_string());
        }
        if self.fetch.timeout_secs == 0 {
            return Err("fetch.timeout_secs must be greater than 0".to_string());
        }
        if self.fetch.max_download_bytes == 0 {
            return Err("fetch.max_download_bytes must be greater than 0".to_string());
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(format!(
                "image.jpeg_quality must be between 1 and 100, got {}",
                self.image.jpeg_quality
            ));
        }
        if self.image.max_pixels == 0 {
            return Err("image.max_pixels must be greater than 0".to_string());
        }
        if let Some(font_path) = &self.watermark.font_path {
            if font_path.as_os_str().is_empty() {
                return Err("watermark.font_path must not be empty when set".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_yaml_with_env("{}").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.image.jpeg_quality, 85);
        assert!(config.watermark.font_path.is_none());
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_can_be_loaded_from_file_path() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let config_yaml = r#"
server:
  address: "127.0.0.1"
  port: 9090

fetch:
  timeout_secs: 5

image:
  jpeg_quality: 70

watermark:
  font_path: "/opt/fonts/Brand.ttf"

logging:
  format: pretty
"#;
        temp_file.write_all(config_yaml.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.max_download_bytes, 50 * 1024 * 1024);
        assert_eq!(config.image.jpeg_quality, 70);
        assert_eq!(
            config.watermark.font_path,
            Some(PathBuf::from("/opt/fonts/Brand.ttf"))
        );
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_reports_read_error() {
        let err = Config::from_file("/nonexistent/tsubame.yaml").unwrap_err();
        assert!(err.starts_with("Failed to read config file"));
    }

    #[test]
    fn test_can_substitute_env_var() {
        std::env::set_var("TSUBAME_TEST_FONT_DIR", "/srv/fonts");

        let yaml = r#"
watermark:
  font_path: "${TSUBAME_TEST_FONT_DIR}/Mono.ttf"
"#;
        let config = Config::from_yaml_with_env(yaml).unwrap();
        assert_eq!(
            config.watermark.font_path,
            Some(PathBuf::from("/srv/fonts/Mono.ttf"))
        );

        std::env::remove_var("TSUBAME_TEST_FONT_DIR");
    }

    #[test]
    fn test_missing_env_var_is_an_error() {
        let yaml = r#"
server:
  address: "${TSUBAME_TEST_UNSET_ADDRESS}"
"#;
        let err = Config::from_yaml_with_env(yaml).unwrap_err();
        assert!(err.contains("TSUBAME_TEST_UNSET_ADDRESS"));
        assert!(err.contains("referenced but not set"));
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(Config::from_yaml_with_env("server: [not, a, map]").is_err());
    }

    #[test]
    fn test_validation_rejects_zero_limits() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().unwrap_err().contains("server.port"));

        let mut config = Config::default();
        config.server.max_concurrent_transforms = 0;
        assert!(config
            .validate()
            .unwrap_err()
            .contains("max_concurrent_transforms"));

        let mut config = Config::default();
        config.fetch.max_download_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.image.max_pixels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_jpeg_quality_out_of_range() {
        let mut config = Config::default();
        config.image.jpeg_quality = 0;
        assert!(config.validate().unwrap_err().contains("jpeg_quality"));

        config.image.jpeg_quality = 101;
        assert!(config.validate().is_err());

        config.image.jpeg_quality = 100;
        assert!(config.validate().is_ok());
    }
}
