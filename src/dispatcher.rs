//! Operation dispatch.
//!
//! `decorate` fills in every default an authored operation left out and
//! rejects contradictory flags, without performing I/O. `dispatch` then routes
//! the decorated operation to its handler: built-in types first, handlers
//! from the registry second.

use crate::actions::amend::{Amend, Placement};
use crate::actions::create::Create;
use crate::actions::create_all::CreateAll;
use crate::actions::custom::{Custom, Registered};
use crate::actions::for_many::ForMany;
use crate::actions::modify::Modify;
use crate::constants::DEFAULT_SEPARATOR;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::processor::{Outcome, Processor};
use log::debug;
use serde_json::Value;

/// A fully populated operation, ready to run.
#[derive(Debug, Clone)]
pub enum Decorated {
    Create(Create),
    Amend(Amend),
    CreateAll(CreateAll),
    ForMany(ForMany),
    Custom(Custom),
    Modify(Modify),
    Registered(Registered),
}

fn exclusive(operation: &str, skip_if_exists: bool, overwrite: bool) -> Result<()> {
    if skip_if_exists && overwrite {
        return Err(Error::ConflictingOptionsError { operation: operation.to_string() });
    }
    Ok(())
}

/// Merges the type-specific defaults into `operation`.
///
/// Explicitly set fields are kept; decorating twice yields the same value.
///
/// # Errors
/// * `Error::ConflictingOptionsError` if `skipIfExists` and `overwrite` are both true
pub fn decorate(operation: &Operation) -> Result<Decorated> {
    let halt_on_error = operation.halt_on_error();
    let decorated = match operation {
        Operation::Create(op) => {
            let skip_if_exists = op.skip_if_exists.unwrap_or(false);
            let overwrite = op.overwrite.unwrap_or(false);
            exclusive("create", skip_if_exists, overwrite)?;
            Decorated::Create(Create {
                file_path: op.file_path.clone(),
                source: op.source.clone(),
                skip_if_exists,
                overwrite,
            })
        }
        Operation::Append(op) | Operation::Prepend(op) => Decorated::Amend(Amend {
            placement: if matches!(operation, Operation::Append(_)) {
                Placement::Append
            } else {
                Placement::Prepend
            },
            file_path: op.file_path.clone(),
            source: op.source.clone(),
            separator: op.separator.clone().unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
            unique: op.unique.unwrap_or(true),
            pattern: op.pattern.clone(),
        }),
        Operation::CreateAll(op) => {
            let skip_if_exists = op.skip_if_exists.unwrap_or(false);
            let overwrite = op.overwrite.unwrap_or(false);
            exclusive("createAll", skip_if_exists, overwrite)?;
            Decorated::CreateAll(CreateAll {
                destination_path: op.destination_path.clone(),
                template_files_glob: op.template_files_glob.clone(),
                template_base_path: op.template_base_path.clone(),
                verbose: op.verbose.unwrap_or(true),
                skip_if_exists,
                overwrite,
                halt_on_error,
                strip_extensions: op.strip_extensions.clone().unwrap_or_default(),
            })
        }
        Operation::ForMany(op) => Decorated::ForMany(ForMany {
            generator_id: op.generator_id.clone(),
            items: op.items.clone(),
            transform_item: op.transform_item.clone(),
            halt_on_error,
        }),
        Operation::Custom(op) => {
            Decorated::Custom(Custom { name: op.name.clone(), action: op.action.clone() })
        }
        Operation::Modify(op) => Decorated::Modify(Modify {
            file_path: op.file_path.clone(),
            source: op.source.clone(),
            pattern: op.pattern.clone(),
        }),
        Operation::Registered(op) => Decorated::Registered(Registered {
            type_name: op.type_name.clone(),
            options: op.options.clone(),
        }),
    };
    Ok(decorated)
}

/// Decorates `operation` and runs it with the effective `data`.
pub fn dispatch(processor: &Processor<'_>, operation: &Operation, data: &Value) -> Result<Outcome> {
    debug!("Dispatching '{}'", operation.type_name());
    match decorate(operation)? {
        Decorated::Create(create) => create.run(processor, data),
        Decorated::Amend(amend) => amend.run(processor, data),
        Decorated::CreateAll(create_all) => create_all.run(processor, data),
        Decorated::ForMany(for_many) => for_many.run(processor, data),
        Decorated::Custom(custom) => custom.run(processor, data),
        Decorated::Modify(modify) => modify.run(processor, data),
        Decorated::Registered(registered) => registered.run(processor, data),
    }
}
