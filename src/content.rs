//! Resolution of an operation's template source.

use crate::error::{Error, Result};
use crate::fs::read_file;
use serde::Deserialize;
use std::path::Path;

/// Where a single-file operation takes its template text from.
///
/// Exactly one of the two fields is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSource {
    /// Inline template text
    pub template_str: Option<String>,
    /// Template file, relative to the configuration file's directory
    pub template_file_path: Option<String>,
}

impl TemplateSource {
    pub fn inline<S: Into<String>>(template: S) -> Self {
        Self { template_str: Some(template.into()), template_file_path: None }
    }

    pub fn file<S: Into<String>>(path: S) -> Self {
        Self { template_str: None, template_file_path: Some(path.into()) }
    }

    /// Returns the raw, unrendered template text.
    ///
    /// # Errors
    /// * `Error::NoTemplateFoundError` if neither source is set
    /// * `Error::AmbiguousTemplateError` if both are set
    /// * `Error::ReadError` if the template file cannot be read
    pub fn load(&self, config_dir: &Path) -> Result<String> {
        match (&self.template_str, &self.template_file_path) {
            (Some(_), Some(_)) => Err(Error::AmbiguousTemplateError),
            (Some(template), None) => Ok(template.clone()),
            (None, Some(path)) => read_file(&config_dir.join(path)),
            (None, None) => Err(Error::NoTemplateFoundError),
        }
    }
}
