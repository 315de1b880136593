use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime configuration for the backend tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub keyspace: String,
    /// Split size in bytes used when `splits` is requested without one.
    pub default_split_size: u64,
    /// Upper bound on selects a single query may fan out into; 0 disables
    /// the check.
    pub max_query_statements: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            keyspace: "hugegraph".into(),
            default_split_size: 64 * 1024 * 1024,
            max_query_statements: 0,
        }
    }
}

impl StoreConfig {
    pub fn development() -> Self {
        Self {
            default_split_size: 1024 * 1024,
            max_query_statements: 1_000,
            ..Self::default()
        }
    }

    pub fn production(keyspace: impl Into<String>) -> Self {
        Self {
            keyspace: keyspace.into(),
            max_query_statements: 10_000,
            ..Self::default()
        }
    }

    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = keyspace.into();
        self
    }

    pub fn with_max_query_statements(mut self, max: usize) -> Self {
        self.max_query_statements = max;
        self
    }

    pub fn validate(&self) -> Result<(), BackendError> {
        let valid_keyspace = !self.keyspace.is_empty()
            && self.keyspace.len() <= 48
            && self
                .keyspace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !self.keyspace.starts_with('_');
        if !valid_keyspace {
            return Err(BackendError::InvalidConfig {
                message: format!("invalid keyspace name '{}'", self.keyspace),
            });
        }
        if self.default_split_size == 0 {
            return Err(BackendError::InvalidConfig {
                message: "default_split_size must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, BackendError> {
        let config: StoreConfig =
            serde_json::from_str(json).map_err(|e| BackendError::InvalidConfig {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, BackendError> {
        let json = std::fs::read_to_string(path).map_err(|e| BackendError::InvalidConfig {
            message: format!("read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::StoreConfig;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        StoreConfig::default().validate().expect("default");
        StoreConfig::development().validate().expect("development");
        StoreConfig::production("graph_prod")
            .validate()
            .expect("production");
    }

    #[test]
    fn keyspace_must_be_a_plain_identifier() {
        let err = StoreConfig::default()
            .with_keyspace("bad-name")
            .validate()
            .expect_err("hyphen");
        assert_eq!(err.code_str(), "invalid_config");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config = StoreConfig::from_json_str(r#"{"keyspace":"g1","max_query_statements":4}"#)
            .expect("parse");
        assert_eq!(config.keyspace, "g1");
        assert_eq!(config.max_query_statements, 4);
        assert_eq!(
            config.default_split_size,
            StoreConfig::default().default_split_size
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"keyspace":"from_file","max_query_statements":8}}"#).expect("write");
        let config = StoreConfig::from_json_file(file.path()).expect("load");
        assert_eq!(config.keyspace, "from_file");
        assert_eq!(config.max_query_statements, 8);
    }

    #[test]
    fn invalid_json_is_reported_as_config_error() {
        let err = StoreConfig::from_json_str("{").expect_err("truncated");
        assert_eq!(err.code_str(), "invalid_config");
    }
}
