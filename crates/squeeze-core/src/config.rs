use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Paths scanned when none are given on the command line.
    #[serde(default)]
    pub input_paths: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Move originals to the trash after a conversion that saved space.
    #[serde(default)]
    pub delete_original: bool,
    /// Discard conversions that are not smaller than their original.
    #[serde(default = "default_skip_negative")]
    pub skip_negative: bool,
    /// Overrides the CPU-count worker cap.
    #[serde(default)]
    pub max_workers: Option<usize>,
}

fn default_skip_negative() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            delete_original: false,
            skip_negative: default_skip_negative(),
            max_workers: None,
        }
    }
}

/// Load `Config.toml` (optional) overlaid with `SQUEEZE_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("SQUEEZE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("input_paths")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_originals_and_skip_negative() {
        let config = AppConfig::default();
        assert!(!config.delete_original);
        assert!(config.skip_negative);
        assert!(config.max_workers.is_none());
        assert!(config.input_paths.is_empty());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config = Config::builder()
            .add_source(config::File::from_str(
                "delete_original = true\nignore_patterns = [\"**/raw/**\"]",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();

        assert!(config.delete_original);
        assert!(config.skip_negative);
        assert_eq!(config.ignore_patterns, vec!["**/raw/**".to_string()]);
    }
}
