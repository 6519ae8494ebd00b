//! Generator run loop.
//!
//! The `Processor` owns everything an operation needs at run time: the
//! registry, the template renderer, the destination base path and the
//! location of the configuration file. Operations run strictly in declared
//! order; a failure either halts the run or is logged and skipped according
//! to the nearest `haltOnError`.

use crate::content::TemplateSource;
use crate::dispatcher;
use crate::error::{error_chain, Error, Result};
use crate::fs;
use crate::logger::Logger;
use crate::operation::{Operation, Pattern, Predicate};
use crate::registry::Registry;
use crate::renderer::{resolve_path, TemplateRenderer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

/// Result of one dispatched operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A single file was written. `action` is `create`, `overwrite`,
    /// `append`, `prepend` or `modify`.
    Written { action: &'static str, path: PathBuf },
    /// The operation decided not to write, e.g. `skipIfExists` or a unique append.
    Unchanged { action: &'static str, path: PathBuf, reason: String },
    /// `createAll` results, in match order.
    Bulk { created: Vec<PathBuf>, skipped: Vec<PathBuf>, failed: Vec<PathBuf> },
    /// `forMany` results, totals over all items.
    FanOut { generator_id: String, items: usize, dispatched: usize, skipped: usize, failed: usize },
    /// A custom action or registered handler ran.
    Custom { name: String },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Written { action, path } => write!(f, "{action}: '{}'", path.display()),
            Outcome::Unchanged { action, path, reason } => {
                write!(f, "{action}: '{}' unchanged ({reason})", path.display())
            }
            Outcome::Bulk { created, skipped, failed } => write!(
                f,
                "createAll: {} created, {} skipped, {} failed",
                created.len(),
                skipped.len(),
                failed.len()
            ),
            Outcome::FanOut { generator_id, items, dispatched, .. } => write!(
                f,
                "forMany: '{generator_id}' ran for {items} items ({dispatched} operations)"
            ),
            Outcome::Custom { name } => write!(f, "custom: '{name}'"),
        }
    }
}

/// Totals of one pass over an operation list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Operations handed to the dispatcher
    pub dispatched: usize,
    /// Operations whose `skip` predicate held
    pub skipped: usize,
    /// Operations that failed without halting the run
    pub failed: usize,
    pub outcomes: Vec<Outcome>,
}

/// Read-only view of the current run handed to custom actions and
/// registered operation handlers.
pub struct OperationContext<'a> {
    /// Destination base path every relative output path is resolved against
    pub destination: &'a Path,
    /// Location of the configuration file
    pub config_path: &'a Path,
    pub logger: &'a Logger,
    pub renderer: &'a dyn TemplateRenderer,
}

impl OperationContext<'_> {
    /// Renders a template with the run's renderer.
    pub fn render(&self, template: &str, data: &Value) -> Result<String> {
        self.renderer.render(template, data)
    }

    /// Substitutes every match of `pattern` in a file under the destination.
    ///
    /// Returns whether the file changed; unchanged files are not rewritten.
    pub fn replace_in_file<P: AsRef<Path>>(
        &self,
        path: P,
        pattern: &Pattern,
        replacement: &str,
    ) -> Result<bool> {
        fs::replace_in_file(&self.destination.join(path), pattern, replacement)
    }
}

pub struct Processor<'a> {
    registry: &'a Registry,
    engine: &'a dyn TemplateRenderer,
    destination: PathBuf,
    config_path: PathBuf,
    config_dir: PathBuf,
    force: bool,
    logger: Logger,
}

impl<'a> Processor<'a> {
    /// Creates a processor writing below `destination`.
    ///
    /// Relative paths are anchored at the current working directory.
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        registry: &'a Registry,
        engine: &'a dyn TemplateRenderer,
        destination: P,
        config_path: Q,
    ) -> Self {
        let base_path = std::env::current_dir().unwrap_or_default();
        let destination = base_path.join(destination.as_ref());
        let config_path = base_path.join(config_path.as_ref());
        let config_dir = config_path.parent().map(Path::to_path_buf).unwrap_or(base_path);
        Self {
            registry,
            engine,
            destination,
            config_path,
            config_dir,
            force: false,
            logger: Logger::new(),
        }
    }

    /// Makes `create` and `createAll` overwrite existing files unless they skip them.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Directory template files and globs are resolved against.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn force(&self) -> bool {
        self.force
    }

    pub fn render(&self, template: &str, data: &Value) -> Result<String> {
        self.engine.render(template, data)
    }

    /// Renders a path template and anchors it at the destination.
    pub fn resolve_path(&self, path_template: &str, data: &Value) -> Result<PathBuf> {
        resolve_path(self.engine, path_template, data, &self.destination)
    }

    /// Loads a template source and renders it.
    pub fn render_source(&self, source: &TemplateSource, data: &Value) -> Result<String> {
        let template = source.load(&self.config_dir)?;
        self.render(&template, data)
    }

    pub fn context(&self) -> OperationContext<'_> {
        OperationContext {
            destination: &self.destination,
            config_path: &self.config_path,
            logger: &self.logger,
            renderer: self.engine,
        }
    }

    /// Runs every operation of the generator `generator_id` against `input`.
    ///
    /// # Errors
    /// * `Error::GeneratorNotFoundError` / `Error::MissingOperationsError`
    ///   if the generator cannot run
    /// * The first failure of an operation whose `haltOnError` is set
    pub fn run_generator(&self, generator_id: &str, input: &Value) -> Result<RunSummary> {
        let generator = self.registry.generator(generator_id).ok_or_else(|| {
            Error::GeneratorNotFoundError { generator_id: generator_id.to_string() }
        })?;
        if generator.operations.is_empty() {
            return Err(Error::MissingOperationsError { generator_id: generator_id.to_string() });
        }
        self.run_operations(&generator.operations, input, None)
    }

    /// Runs `operations` top to bottom against `input`.
    ///
    /// `halt_override` replaces each operation's own `haltOnError` when set;
    /// `forMany` uses it to apply its own policy to the target's operations.
    pub fn run_operations(
        &self,
        operations: &[Operation],
        input: &Value,
        halt_override: Option<bool>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for operation in operations {
            let data = merge_data(input, &operation.common().data);
            let halt = halt_override.unwrap_or_else(|| operation.halt_on_error());

            let result = self.should_skip(operation, &data).and_then(|skip| match skip {
                Some(reason) => Ok(Err(reason)),
                None => dispatcher::dispatch(self, operation, &data).map(Ok),
            });

            match result {
                Ok(Ok(outcome)) => {
                    summary.dispatched += 1;
                    summary.outcomes.push(outcome);
                }
                Ok(Err(reason)) => {
                    self.logger.info(format!("{}: skipped ({reason})", operation.type_name()));
                    summary.skipped += 1;
                }
                Err(err) => {
                    summary.dispatched += 1;
                    if halt {
                        // Whoever stops propagating the error reports it.
                        self.logger.debug(format!("{}: halting on error", operation.type_name()));
                        return Err(err);
                    }
                    self.log_failure(operation.type_name(), &err);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Evaluates the `skip` predicate; `Some(reason)` means skip.
    fn should_skip(&self, operation: &Operation, data: &Value) -> Result<Option<String>> {
        let predicate = match &operation.common().skip {
            Some(predicate) => predicate,
            None => return Ok(None),
        };
        match predicate {
            Predicate::Bool(skip) => Ok(skip.then(|| String::from("skip is set"))),
            Predicate::Template(template) => {
                let rendered = self.render(template, data)?;
                Ok(skip_reason(&rendered))
            }
            Predicate::Callback(callback) => match callback(data) {
                Ok(skip) => Ok(skip.then(|| String::from("skip predicate held"))),
                Err(source) => Err(Error::OperationError {
                    name: format!("{} skip", operation.type_name()),
                    source,
                }),
            },
        }
    }

    fn log_failure(&self, type_name: &str, err: &Error) {
        self.logger.error(format!("{type_name}: {err}"));
        for cause in error_chain(err).skip(1) {
            self.logger.error(format!("  caused by: {cause}"));
        }
    }
}

/// Layers `overlay` over the object `base`; overlay keys win.
///
/// A non-object `base` contributes nothing.
pub fn merge_data(base: &Value, overlay: &Map<String, Value>) -> Value {
    let mut merged = base.as_object().cloned().unwrap_or_default();
    for (key, value) in overlay {
        merged.insert(key.clone(), value.clone());
    }
    Value::Object(merged)
}

/// Interprets a rendered `skip` template.
fn skip_reason(rendered: &str) -> Option<String> {
    let trimmed = rendered.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "null" | "none" => None,
        "true" => Some(String::from("skip condition is true")),
        _ => Some(trimmed.to_string()),
    }
}
