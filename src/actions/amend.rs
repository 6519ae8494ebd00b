//! The `append` and `prepend` operations.
//!
//! Both insert rendered content into a file, creating it when absent. With a
//! `pattern` the insertion happens at the first match (after it for append,
//! before it for prepend); otherwise at the end or the start of the file.

use crate::content::TemplateSource;
use crate::error::Result;
use crate::fs::{ensure_parent, read_optional, write_file, WriteMode};
use crate::operation::Pattern;
use crate::processor::{Outcome, Processor};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    Prepend,
}

impl Placement {
    pub fn action(self) -> &'static str {
        match self {
            Placement::Append => "append",
            Placement::Prepend => "prepend",
        }
    }

    fn fallback(self) -> &'static str {
        match self {
            Placement::Append => "appending to the end of the file",
            Placement::Prepend => "prepending to the start of the file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Amend {
    pub placement: Placement,
    pub file_path: String,
    pub source: TemplateSource,
    pub separator: String,
    pub unique: bool,
    pub pattern: Option<Pattern>,
}

/// Inserts `content` at the start or end of `existing`.
///
/// Empty existing content yields `content` alone, without a separator.
pub fn insert_default(placement: Placement, existing: &str, content: &str, separator: &str) -> String {
    if existing.is_empty() {
        return content.to_string();
    }
    match placement {
        Placement::Append => format!("{existing}{separator}{content}"),
        Placement::Prepend => format!("{content}{separator}{existing}"),
    }
}

/// Inserts `content` around the match `start..end` of `existing`.
pub fn insert_at_match(
    placement: Placement,
    existing: &str,
    (start, end): (usize, usize),
    content: &str,
    separator: &str,
) -> String {
    match placement {
        Placement::Append => {
            let (head, tail) = existing.split_at(end);
            format!("{head}{separator}{content}{tail}")
        }
        Placement::Prepend => {
            let (head, tail) = existing.split_at(start);
            format!("{head}{content}{separator}{tail}")
        }
    }
}

impl Amend {
    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let action = self.placement.action();
        let path = processor.resolve_path(&self.file_path, data)?;
        ensure_parent(&path)?;

        let existing = read_optional(&path)?;
        let file_was_absent = existing.is_none();
        let existing = existing.unwrap_or_default();

        let content = processor.render_source(&self.source, data)?;

        if self.unique && existing.contains(&content) {
            processor
                .logger()
                .info(format!("{action}: '{}' already contains the content", path.display()));
            return Ok(Outcome::Unchanged {
                action,
                path,
                reason: String::from("content already present"),
            });
        }

        let matched = match &self.pattern {
            Some(pattern) => {
                let regex = pattern.to_regex()?;
                let found = regex.find(&existing).map(|m| (m.start(), m.end()));
                if found.is_none() {
                    processor.logger().warn(format!(
                        "{action}: pattern {pattern} not found in '{}', {}",
                        path.display(),
                        self.placement.fallback()
                    ));
                }
                found
            }
            None => None,
        };

        let updated = match matched {
            Some(range) => insert_at_match(self.placement, &existing, range, &content, &self.separator),
            None => insert_default(self.placement, &existing, &content, &self.separator),
        };

        write_file(&path, &updated, WriteMode::Replace)?;

        if file_was_absent {
            processor.logger().info(format!("{action}: '{}' did not exist and was created", path.display()));
        }
        let outcome = Outcome::Written { action, path };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}
