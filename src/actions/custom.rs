//! `custom` operations and operation types resolved from the registry.

use crate::command::run_command;
use crate::error::{Error, Result};
use crate::operation::Action;
use crate::processor::{Outcome, Processor};
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Custom {
    pub name: String,
    pub action: Action,
}

impl Custom {
    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        match &self.action {
            Action::Command(command) => {
                let command_line = processor.render(command, data)?;
                run_command(&command_line, processor.destination(), data)?;
            }
            Action::Callback(callback) => {
                callback(data, &processor.context())
                    .map_err(|source| Error::OperationError { name: self.name.clone(), source })?;
            }
        }

        let outcome = Outcome::Custom { name: self.name.clone() };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}

/// An operation handled by a handler registered under its type name.
#[derive(Debug, Clone)]
pub struct Registered {
    pub type_name: String,
    pub options: Map<String, Value>,
}

impl Registered {
    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let handler = processor
            .registry()
            .handler(&self.type_name)
            .ok_or_else(|| Error::UnknownOperationTypeError { type_name: self.type_name.clone() })?;

        handler
            .execute(data, &self.options, &processor.context())
            .map_err(|source| Error::OperationError { name: self.type_name.clone(), source })?;

        let outcome = Outcome::Custom { name: self.type_name.clone() };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}
