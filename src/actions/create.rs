//! The `create` operation.

use crate::content::TemplateSource;
use crate::error::{Error, Result};
use crate::fs::{ensure_parent, write_file, WriteMode};
use crate::processor::{Outcome, Processor};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Create {
    pub file_path: String,
    pub source: TemplateSource,
    pub skip_if_exists: bool,
    pub overwrite: bool,
}

/// What `place_file` did with a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placed {
    Created(PathBuf),
    Overwritten(PathBuf),
    Skipped(PathBuf),
}

/// Applies the existence policy to `path`, then renders and writes it.
///
/// `render` only runs once the file is known to be written. Without
/// `overwrite` the file is created exclusively, so a file appearing between
/// the check and the write still fails with `FileExistsError`.
pub fn place_file<F>(path: &Path, skip_if_exists: bool, overwrite: bool, render: F) -> Result<Placed>
where
    F: FnOnce() -> Result<String>,
{
    let exists = path.exists();
    if exists && skip_if_exists {
        return Ok(Placed::Skipped(path.to_path_buf()));
    }
    if exists && !overwrite {
        return Err(Error::FileExistsError { path: path.to_path_buf() });
    }

    let content = render()?;
    ensure_parent(path)?;
    if overwrite {
        write_file(path, &content, WriteMode::Replace)?;
    } else {
        write_file(path, &content, WriteMode::CreateNew)?;
    }

    Ok(if exists { Placed::Overwritten(path.to_path_buf()) } else { Placed::Created(path.to_path_buf()) })
}

impl Create {
    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let path = processor.resolve_path(&self.file_path, data)?;
        let overwrite = self.overwrite || processor.force();

        let placed = place_file(&path, self.skip_if_exists, overwrite, || {
            processor.render_source(&self.source, data)
        })?;

        let outcome = match placed {
            Placed::Created(path) => Outcome::Written { action: "create", path },
            Placed::Overwritten(path) => Outcome::Written { action: "overwrite", path },
            Placed::Skipped(path) => {
                processor.logger().info(format!("create: '{}' exists, skipping", path.display()));
                return Ok(Outcome::Unchanged {
                    action: "create",
                    path,
                    reason: String::from("file exists"),
                });
            }
        };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}
