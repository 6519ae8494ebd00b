//! kiln is a code generator runner.
//! It applies the operations of a generator (create, append, prepend,
//! createAll, forMany, custom and registered types) to a destination tree,
//! with conflict policies and partial-failure handling per operation.

/// Built-in operation implementations
pub mod actions;

/// Command-line interface module for the kiln application
pub mod cli;

/// External commands for `custom` actions and command-backed operation types
pub mod command;

/// Configuration handling
/// Supports JSON and YAML formats (kiln.json, kiln.yml, kiln.yaml)
pub mod config;

pub mod constants;

/// Template sources of file operations
pub mod content;

/// Operation defaults and routing
pub mod dispatcher;

/// Error types and handling for the kiln application
pub mod error;

/// File system primitives
pub mod fs;

pub mod logger;

/// Operations as authored
pub mod operation;

/// Answer collection
pub mod parser;

/// Generator run loop
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// Generators, partials and operation handlers
pub mod registry;

/// Template rendering
pub mod renderer;
