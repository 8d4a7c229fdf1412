use jsonschema::{Draft, JSONSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    ConfigFileNotFound { path: String },

    #[error("Application entry '{name}' not found in {path}")]
    EntryNotFound { name: String, path: String },

    #[error("Schema compilation failed: {message}")]
    SchemaCompilationFailed { message: String },

    #[error("Config validation failed: {}", summarize(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("YAML parsing failed: {message}")]
    YamlParsingFailed { message: String },

    #[error("JSON parsing failed: {message}")]
    JsonParsingFailed { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub json_pointer: String,
    pub message: String,
    pub schema_path: String,
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| {
            if error.json_pointer.is_empty() {
                error.message.clone()
            } else {
                format!("{}: {}", error.json_pointer, error.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Loads application entries from YAML documents shaped as
/// `<name>: { ...attributes... }` and checks each entry against a JSON schema.
pub struct ConfigManager {
    schema: Value,
}

impl ConfigManager {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    /// Load, validate and deserialize the entry `name` from `path`.
    #[instrument(skip(self))]
    pub fn load_entry<T: DeserializeOwned>(&self, path: &Path, name: &str) -> Result<T, ConfigError> {
        let entry = self.entry_value(path, name)?;
        self.validate_config_value(&entry)?;

        serde_json::from_value(entry).map_err(|e| ConfigError::JsonParsingFailed {
            message: e.to_string(),
        })
    }

    /// Validate the entry `name` from `path` without deserializing it.
    #[instrument(skip(self))]
    pub fn validate_entry(&self, path: &Path, name: &str) -> Result<(), ConfigError> {
        let entry = self.entry_value(path, name)?;
        self.validate_config_value(&entry)
    }

    /// Names of every top-level entry in `path`, sorted.
    pub fn entry_names(&self, path: &Path) -> Result<Vec<String>, ConfigError> {
        let document = load_document(path)?;
        Ok(document
            .as_object()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    pub fn validate_config_value(&self, config: &Value) -> Result<(), ConfigError> {
        let schema = self.compile_schema()?;
        let validation_result = schema.validate(config);

        if let Err(errors) = validation_result {
            let validation_errors: Vec<ValidationError> = errors
                .map(|error| ValidationError {
                    json_pointer: error.instance_path.to_string(),
                    message: error.to_string(),
                    schema_path: error.schema_path.to_string(),
                })
                .collect();

            return Err(ConfigError::ValidationFailed {
                errors: validation_errors,
            });
        }

        Ok(())
    }

    fn entry_value(&self, path: &Path, name: &str) -> Result<Value, ConfigError> {
        let mut document = load_document(path)?;
        debug!("Selecting entry {} from {:?}", name, path);

        document
            .get_mut(name)
            .map(Value::take)
            .ok_or_else(|| ConfigError::EntryNotFound {
                name: name.to_string(),
                path: path.to_string_lossy().to_string(),
            })
    }

    fn compile_schema(&self) -> Result<JSONSchema, ConfigError> {
        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&self.schema)
            .map_err(|e| ConfigError::SchemaCompilationFailed {
                message: e.to_string(),
            })
    }
}

fn load_document(path: &Path) -> Result<Value, ConfigError> {
    debug!("Loading config from: {:?}", path);

    if !path.exists() {
        return Err(ConfigError::ConfigFileNotFound {
            path: path.to_string_lossy().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        message: format!("Failed to read config file: {}", e),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParsingFailed {
        message: e.to_string(),
    })
}
