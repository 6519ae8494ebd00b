//! The `modify` operation: replaces the first match of a pattern in an
//! existing file with rendered content.

use crate::content::TemplateSource;
use crate::error::Result;
use crate::fs::{read_file, write_file, WriteMode};
use crate::operation::Pattern;
use crate::processor::{Outcome, Processor};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct Modify {
    pub file_path: String,
    pub source: TemplateSource,
    pub pattern: Pattern,
}

/// Replaces the first match of `pattern` in `existing`; `None` if nothing matched.
///
/// Regex patterns expand `$1` in the replacement, literal patterns do not.
pub fn replace_first(existing: &str, pattern: &Pattern, replacement: &str) -> Result<Option<String>> {
    if !pattern.to_regex()?.is_match(existing) {
        return Ok(None);
    }
    Ok(Some(pattern.replace(existing, 1, replacement)?.into_owned()))
}

impl Modify {
    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let path = processor.resolve_path(&self.file_path, data)?;
        let existing = read_file(&path)?;
        let content = processor.render_source(&self.source, data)?;

        let updated = match replace_first(&existing, &self.pattern, &content)? {
            Some(updated) => updated,
            None => {
                processor
                    .logger()
                    .warn(format!("modify: pattern {} not found in '{}'", self.pattern, path.display()));
                return Ok(Outcome::Unchanged {
                    action: "modify",
                    path,
                    reason: String::from("pattern not found"),
                });
            }
        };

        write_file(&path, &updated, WriteMode::Replace)?;
        let outcome = Outcome::Written { action: "modify", path };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_replace_first_only_replaces_one_match() {
        let pattern = Pattern::Literal("x".into());
        assert_eq!(replace_first("x-x", &pattern, "y").unwrap().as_deref(), Some("y-x"));
        assert_eq!(replace_first("abc", &pattern, "y").unwrap(), None);
    }

    #[test]
    fn test_replace_first_keeps_dollar_signs_for_literals() {
        let pattern = Pattern::Literal("PLACEHOLDER".into());
        let updated = replace_first("PLACEHOLDER\n", &pattern, "echo $HOME costs $5").unwrap();
        assert_eq!(updated.as_deref(), Some("echo $HOME costs $5\n"));
    }

    #[test]
    fn test_replace_first_expands_groups() {
        let pattern = Pattern::Regex(Regex::new(r"version = (\d+)").unwrap());
        let updated = replace_first("version = 1\n", &pattern, "version = ${1}0").unwrap();
        assert_eq!(updated.as_deref(), Some("version = 10\n"));
    }
}
