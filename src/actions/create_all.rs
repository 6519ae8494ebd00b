//! The `createAll` operation.
//!
//! Expands a glob of template files and creates one destination file per
//! match, keeping the matched file's path relative to the template base path.
//! Each file gets the same existence policy as `create`. Files are processed
//! in match order; with `haltOnError` the first failure stops the operation,
//! otherwise it is logged and the next file is processed.

use crate::actions::create::{place_file, Placed};
use crate::error::{Error, Result};
use crate::fs::{glob_files, read_file, slash_path, split_glob};
use crate::processor::{Outcome, Processor};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAll {
    pub destination_path: String,
    pub template_files_glob: String,
    /// Relative to the configuration directory; defaults to the glob's literal prefix
    pub template_base_path: Option<String>,
    pub verbose: bool,
    pub skip_if_exists: bool,
    pub overwrite: bool,
    pub halt_on_error: bool,
    /// Extensions removed from destination file names, e.g. `j2`
    pub strip_extensions: Vec<String>,
}

impl CreateAll {
    fn template_base(&self, config_dir: &Path) -> PathBuf {
        match &self.template_base_path {
            Some(base) => config_dir.join(base),
            None => {
                let (literal, rest) = split_glob(&self.template_files_glob);
                let root = config_dir.join(literal);
                // a glob naming a single file has that file as its literal prefix
                if rest.is_empty() {
                    root.parent().map(Path::to_path_buf).unwrap_or(root)
                } else {
                    root
                }
            }
        }
    }

    /// Destination path template of `template_file`, relative to the destination path.
    ///
    /// # Errors
    /// * `Error::TemplateOutsideBaseError` if `base` is not a prefix of `template_file`
    fn relative_template(&self, template_file: &Path, base: &Path) -> Result<String> {
        let relative = template_file.strip_prefix(base).map_err(|_| Error::TemplateOutsideBaseError {
            path: template_file.to_path_buf(),
            base: base.to_path_buf(),
        })?;
        Ok(self.strip_extension(slash_path(relative)))
    }

    fn strip_extension(&self, path: String) -> String {
        for extension in &self.strip_extensions {
            let suffix = format!(".{}", extension.trim_start_matches('.'));
            if let Some(stripped) = path.strip_suffix(&suffix) {
                return stripped.to_string();
            }
        }
        path
    }

    fn create_one(
        &self,
        processor: &Processor<'_>,
        data: &Value,
        template_file: &Path,
        base: &Path,
        destination_root: &Path,
    ) -> Result<Placed> {
        let relative = processor.render(&self.relative_template(template_file, base)?, data)?;
        let path = destination_root.join(relative);
        let overwrite = self.overwrite || processor.force();

        place_file(&path, self.skip_if_exists, overwrite, || {
            let template = read_file(template_file)?;
            processor.render(&template, data)
        })
    }

    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let logger = processor.logger();
        let matches = glob_files(&self.template_files_glob, processor.config_dir())?;
        if matches.is_empty() {
            return Err(Error::NoGlobMatchesError { pattern: self.template_files_glob.clone() });
        }

        let base = self.template_base(processor.config_dir());
        let destination_root = processor.resolve_path(&self.destination_path, data)?;

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for template_file in &matches {
            match self.create_one(processor, data, template_file, &base, &destination_root) {
                Ok(Placed::Created(path)) | Ok(Placed::Overwritten(path)) => {
                    if self.verbose {
                        logger.success(format!("createAll: '{}'", path.display()));
                    }
                    created.push(path);
                }
                Ok(Placed::Skipped(path)) => {
                    logger.info(format!("createAll: '{}' exists, skipping", path.display()));
                    skipped.push(path);
                }
                Err(err) if self.halt_on_error => return Err(err),
                Err(err) => {
                    logger.error(format!(
                        "createAll: failed on template '{}': {err}",
                        template_file.display()
                    ));
                    failed.push(template_file.clone());
                }
            }
        }

        let outcome = Outcome::Bulk { created, skipped, failed };
        logger.success(format!("{outcome} in '{}'", destination_root.display()));
        Ok(outcome)
    }
}
