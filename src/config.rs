//! Configuration handling for kiln.
//! Locates the configuration file, parses it as JSON or YAML, validates it
//! against the embedded schema and turns it into a `Registry`.

use crate::command::CommandHandler;
use crate::constants::{CONFIG_FILES, CONFIG_SCHEMA};
use crate::error::{Error, Result};
use crate::registry::{GeneratorDefinition, Registry};
use indexmap::IndexMap;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Type of value a question produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ValueType {
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "bool")]
    Bool,
}

/// A single prompt of a generator.
#[derive(Debug, Clone, Deserialize)]
pub struct Question {
    /// Prompt text; rendered against the answers given so far
    #[serde(default)]
    pub help: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(default)]
    pub choices: Vec<String>,
    #[serde(default)]
    pub multiselect: bool,
    /// Rendered and parsed as a boolean; the question is only asked when it is true
    #[serde(default)]
    pub when: String,
}

/// On-disk layout of a kiln configuration file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub partials: IndexMap<String, String>,
    /// Operation types backed by a command line template
    #[serde(default)]
    pub operation_types: IndexMap<String, String>,
    pub generators: IndexMap<String, GeneratorDefinition>,
}

/// Returns the first configuration file found in `dir`.
///
/// # Errors
/// * `Error::ConfigError` if none of `CONFIG_FILES` exists
pub fn find_config<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    for file in CONFIG_FILES {
        let config_path = dir.as_ref().join(file);
        if config_path.is_file() {
            debug!("Loading configuration from {}", config_path.display());
            return Ok(config_path);
        }
    }

    Err(Error::ConfigError(format!(
        "no configuration file found in '{}' (tried: {})",
        dir.as_ref().display(),
        CONFIG_FILES.join(", ")
    )))
}

/// Parses configuration content, trying JSON first and YAML second.
pub fn parse_config(content: &str) -> Result<serde_json::Value> {
    match serde_json::from_str(content) {
        Ok(value) => Ok(value),
        Err(_) => serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("invalid configuration format: {e}"))),
    }
}

/// Checks a parsed configuration against the embedded JSON schema.
///
/// All violations are reported together, one per line.
pub fn validate_config(value: &serde_json::Value) -> Result<()> {
    let schema: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA)
        .map_err(|e| Error::ConfigError(format!("invalid configuration schema: {e}")))?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| Error::ConfigError(format!("invalid configuration schema: {e}")))?;

    let violations: Vec<String> = validator.iter_errors(value).map(|e| e.to_string()).collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::ConfigError(format!("invalid configuration:\n{}", violations.join("\n"))))
    }
}

/// Builds a registry from configuration content.
pub fn build_registry(content: &str) -> Result<Registry> {
    let value = parse_config(content)?;
    validate_config(&value)?;
    let config: ConfigFile = serde_json::from_value(value)
        .map_err(|e| Error::ConfigError(format!("invalid schema: {e}")))?;

    let mut registry = Registry::new();
    for (name, template) in config.partials {
        registry.register_partial(name, template);
    }
    for (name, command) in config.operation_types {
        registry.register_handler(name, CommandHandler::new(command));
    }
    for (id, generator) in config.generators {
        registry.register_generator(id, generator);
    }
    Ok(registry)
}

/// Reads and loads the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Registry> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|source| Error::ReadError { path: path.to_path_buf(), source })?;
    build_registry(&content)
}
