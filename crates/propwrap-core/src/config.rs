use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrationError, Result};

pub const DEFAULT_MARKER_ANNOTATION: &str = "org.gradle.api.tasks.Input";
pub const DEFAULT_WRAPPER_TYPE: &str = "org.gradle.api.provider.Property";
pub const DEFAULT_MUTATION_METHOD: &str = "set";

/// Migration run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    /// Qualified name of the annotation that marks a getter as migratable
    pub marker_annotation: String,
    /// Qualified name of the generic wrapper type fields are migrated to
    pub wrapper_type: String,
    /// Method on the wrapper that replaces the removed setter
    pub mutation_method: String,
    /// Run each phase with one task per compilation unit
    pub parallel: bool,
    /// Upper bound on worker threads per phase
    pub max_workers: usize,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            marker_annotation: DEFAULT_MARKER_ANNOTATION.to_string(),
            wrapper_type: DEFAULT_WRAPPER_TYPE.to_string(),
            mutation_method: DEFAULT_MUTATION_METHOD.to_string(),
            parallel: true,
            max_workers: default_workers(),
        }
    }
}

impl MigrationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker_annotation = marker.into();
        self
    }

    pub fn with_wrapper(mut self, wrapper: impl Into<String>) -> Self {
        self.wrapper_type = wrapper.into();
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_qualified_name("marker_annotation", &self.marker_annotation)?;
        check_qualified_name("wrapper_type", &self.wrapper_type)?;
        if !is_identifier(&self.mutation_method) {
            return Err(MigrationError::config(format!(
                "mutation_method '{}' is not a valid method name",
                self.mutation_method
            )));
        }
        if self.max_workers == 0 {
            return Err(MigrationError::config("max_workers must be at least 1"));
        }
        Ok(())
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn check_qualified_name(key: &str, value: &str) -> Result<()> {
    if value.is_empty() || !value.split('.').all(is_identifier) {
        return Err(MigrationError::config(format!(
            "{key} '{value}' is not a qualified name"
        )));
    }
    Ok(())
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
