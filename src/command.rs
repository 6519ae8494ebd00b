//! Running external commands for `custom` actions and command-backed
//! operation types.
//!
//! The command receives the operation data as JSON on stdin and inherits
//! stdout and stderr.

use crate::error::{Error, Result};
use crate::fs::ensure_dir;
use crate::processor::OperationContext;
use crate::registry::OperationHandler;
use log::debug;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Runs `command_line` in `working_dir`, writing `data` to its stdin.
///
/// # Errors
/// * `Error::CommandError` if the command line is empty or unparsable,
///   cannot be started, or exits unsuccessfully
pub fn run_command(command_line: &str, working_dir: &Path, data: &Value) -> Result<()> {
    let command_error = |reason: String| Error::CommandError { command: command_line.to_string(), reason };

    let args = shell_words::split(command_line).map_err(|e| command_error(e.to_string()))?;
    let (program, args) = args.split_first().ok_or_else(|| command_error("empty command".to_string()))?;

    ensure_dir(working_dir)?;
    debug!("Running '{}' in '{}'", command_line, working_dir.display());

    let mut child = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| command_error(e.to_string()))?;

    // Write data to stdin
    if let Some(mut stdin) = child.stdin.take() {
        // a command that never reads stdin closes the pipe early
        if let Err(e) = stdin.write_all(data.to_string().as_bytes()) {
            debug!("Command did not consume its input: {e}");
        }
    }

    let status = child.wait().map_err(|e| command_error(e.to_string()))?;
    if !status.success() {
        return Err(command_error(format!("exited with {status}")));
    }
    Ok(())
}

/// Operation type declared under `operationTypes` in the configuration file.
///
/// The command line is rendered with the operation data and its authored
/// options before it runs in the destination directory.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    command: String,
}

impl CommandHandler {
    pub fn new<S: Into<String>>(command: S) -> Self {
        Self { command: command.into() }
    }
}

impl OperationHandler for CommandHandler {
    fn execute(
        &self,
        data: &Value,
        options: &Map<String, Value>,
        context: &OperationContext<'_>,
    ) -> anyhow::Result<()> {
        let mut render_data = data.as_object().cloned().unwrap_or_default();
        render_data.extend(options.iter().map(|(k, v)| (k.clone(), v.clone())));
        let command_line = context.render(&self.command, &Value::Object(render_data))?;
        run_command(&command_line, context.destination, data)?;
        Ok(())
    }
}
