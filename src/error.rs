//! Error handling for kiln.
//! Defines the error type shared by the operation engine, the configuration
//! loader and the command-line front end.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for kiln operations.
///
/// Variants that stem from a file system call always carry the offending path
/// and the underlying `io::Error` as their source.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations without a known path
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("failed to read '{}'", path.display())]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{}'", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The target exists and the operation asked neither to skip nor to overwrite it.
    #[error("file already exists: '{}'", path.display())]
    FileExistsError { path: PathBuf },

    #[error("no template found: set either 'templateStr' or 'templateFilePath'")]
    NoTemplateFoundError,

    #[error("ambiguous template: 'templateStr' and 'templateFilePath' are both set")]
    AmbiguousTemplateError,

    #[error("'{operation}' operation sets both 'skipIfExists' and 'overwrite'")]
    ConflictingOptionsError { operation: String },

    #[error("no files matched the glob '{pattern}'")]
    NoGlobMatchesError { pattern: String },

    #[error("template '{}' is outside the template base path '{}'", path.display(), base.display())]
    TemplateOutsideBaseError { path: PathBuf, base: PathBuf },

    #[error("invalid glob '{pattern}'")]
    GlobPatternError {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid pattern '{pattern}'")]
    PatternError {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown operation type '{type_name}'")]
    UnknownOperationTypeError { type_name: String },

    #[error("generator '{generator_id}' not found")]
    GeneratorNotFoundError { generator_id: String },

    #[error("generator '{generator_id}' has no operations")]
    MissingOperationsError { generator_id: String },

    #[error("forMany items for generator '{generator_id}' must be a list, got {found}")]
    InvalidForManyItemsError { generator_id: String, found: String },

    /// Render-time failure. `data` holds the JSON snapshot the template was rendered with.
    #[error("failed to render template {template:?}")]
    TemplateError {
        template: String,
        data: String,
        #[source]
        source: minijinja::Error,
    },

    /// Failure raised by a custom action or a registered operation handler.
    #[error("operation '{name}' failed")]
    OperationError {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("command '{command}' failed: {reason}")]
    CommandError { command: String, reason: String },

    /// Represents errors that occur during configuration parsing or processing
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("Prompt error: {0}.")]
    PromptError(#[from] dialoguer::Error),
}

/// Convenience type alias for Results with kiln's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Iterates an error and all of its sources, outermost first.
pub fn error_chain<'a>(
    err: &'a (dyn std::error::Error + 'static),
) -> impl Iterator<Item = &'a (dyn std::error::Error + 'static)> + 'a {
    std::iter::successors(Some(err), |e| e.source())
}

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The Error to handle
///
/// # Behavior
/// Prints the error message and its causes to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    for cause in error_chain(&err).skip(1) {
        eprintln!("  caused by: {cause}");
    }
    std::process::exit(1);
}
