use std::collections::HashMap;
use std::env;

use serde_yaml::Value;

use super::ConfigError;
use super::probe_config::{ALL_KEYS, ProbeConfig};

const CONFIG_FILE_KEY: &str = "CONFIG_FILE";

/// Layered source of raw settings: process environment over an optional YAML file.
#[derive(Debug, Default)]
pub struct SettingsSource {
    file_values: HashMap<String, String>,
}

impl SettingsSource {
    /// Reads the YAML file named by `CONFIG_FILE`, if any.
    /// File keys are the lowercase forms of the environment keys, e.g. `api_url`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_FILE_KEY) {
            Ok(path) if !path.is_empty() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_string(),
            source,
        })?;
        log::info!("Using config file: {}", path);
        Self::from_yaml(path, &contents)
    }

    fn from_yaml(path: &str, contents: &str) -> Result<Self, ConfigError> {
        let parsed: HashMap<String, Value> =
            serde_yaml::from_str(contents).map_err(|source| ConfigError::InvalidYaml {
                path: path.to_string(),
                source,
            })?;

        let file_values = parsed
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null => return None,
                    other => {
                        log::warn!("Ignoring non-scalar config value for {}: {:?}", key, other);
                        return None;
                    }
                };
                Some((key.to_ascii_uppercase(), value))
            })
            .collect();

        Ok(SettingsSource { file_values })
    }

    /// Environment variables win over file values.
    pub fn get(&self, key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .or_else(|| self.file_values.get(key).cloned())
    }
}

/// Load the probe configuration from the environment, layered over the optional config file.
pub fn load_config() -> Result<ProbeConfig, ConfigError> {
    let source = SettingsSource::from_env()?;

    for key in source.file_values.keys() {
        if !ALL_KEYS.contains(&key.as_str()) {
            log::warn!("Unknown key in config file: {}", key.to_ascii_lowercase());
        }
    }

    ProbeConfig::from_lookup(|key| source.get(key))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_yaml_values_are_read_as_strings() {
        let yaml = r#"
            api_url: https://example.api
            method: POST
            api_response_timeout: 5
            expected_status_code: 201
            expected_body: true
            bearer_token: ~
        "#;

        let source = SettingsSource::from_yaml("inline.yml", yaml).expect("valid yaml");
        assert_eq!(source.file_values["API_URL"], "https://example.api");
        assert_eq!(source.file_values["METHOD"], "POST");
        assert_eq!(source.file_values["API_RESPONSE_TIMEOUT"], "5");
        assert_eq!(source.file_values["EXPECTED_STATUS_CODE"], "201");
        assert_eq!(source.file_values["EXPECTED_BODY"], "true");
        assert!(!source.file_values.contains_key("BEARER_TOKEN"));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = SettingsSource::from_yaml("broken.yml", "api_url: [unclosed");
        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }

    #[test]
    fn test_config_file_feeds_probe_config() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
metrics_listener: https://listener.example.io:8053
metrics_token: token-from-file
api_url: https://example.api/health
method: GET
api_response_timeout: 3
expected_status_code: 204
"#
        )
        .expect("write config");

        let path = file.path().to_str().expect("utf-8 path");
        let source = SettingsSource::from_file(path).expect("readable file");

        // Looked up through the file layer only, so the test does not depend on the environment.
        let config = ProbeConfig::from_lookup(|key| source.file_values.get(key).cloned())
            .expect("valid configuration");
        assert_eq!(config.url.as_str(), "https://example.api/health");
        assert_eq!(config.expected_status_code, 204);
        assert_eq!(config.sink.token, "token-from-file");
    }

    #[test]
    fn test_missing_file() {
        let result = SettingsSource::from_file("/definitely/not/here.yml");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
