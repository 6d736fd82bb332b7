use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Application configuration loaded from a TOML file with env overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Anthropic API key. `ANTHROPIC_API_KEY` takes priority.
    pub anthropic_api_key: String,
    /// Target model id.
    pub model: String,
    /// Map provider ("baidu" or "gaode").
    pub map: String,
    /// Travel mode ("driving" or "walking").
    pub mode: String,
    /// Tool-round budget per request.
    pub max_tool_rounds: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anthropic_api_key: String::new(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            map: "baidu".to_string(),
            mode: "driving".to_string(),
            max_tool_rounds: 8,
        }
    }
}

impl Config {
    /// Loads configuration: explicit path, or `./mapnav.toml` if present,
    /// or defaults. Environment variables override file values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Path::new("mapnav.toml");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY")
            && !key.trim().is_empty()
        {
            self.anthropic_api_key = key;
        }
        if let Ok(model) = std::env::var("MAPNAV_MODEL")
            && !model.trim().is_empty()
        {
            self.model = model;
        }
    }

    /// Checks that everything needed to talk to the LLM is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.anthropic_api_key.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "anthropic_api_key (or ANTHROPIC_API_KEY)".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("model".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
        assert_eq!(config.map, "baidu");
        assert_eq!(config.mode, "driving");
        assert_eq!(config.max_tool_rounds, 8);
        assert!(config.anthropic_api_key.is_empty());
    }

    #[test]
    fn load_from_file_reads_partial_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mapnav.toml");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "map = \"gaode\"\nmode = \"walking\"").expect("write");

        let config = Config::load(Some(&path)).expect("load");
        assert_eq!(config.map, "gaode");
        assert_eq!(config.mode, "walking");
        // Unspecified fields keep their defaults.
        assert_eq!(config.model, "claude-3-5-sonnet-20241022");
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let err = Config::load(Some(Path::new("/nonexistent/mapnav.toml")))
            .expect_err("missing file should error");
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn load_malformed_toml_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "map = [unclosed").expect("write");

        let err = Config::load(Some(&path)).expect_err("malformed toml should error");
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn validate_requires_api_key_and_model() {
        let mut config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(ref f)) if f.contains("anthropic_api_key")
        ));

        config.anthropic_api_key = "sk-test".to_string();
        assert!(config.validate().is_ok());

        config.model = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField(ref f)) if f == "model"
        ));
    }
}
