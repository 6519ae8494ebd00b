//! Generators, partials and custom operation handlers known to a run.
//!
//! A `Registry` is filled once while the configuration loads and is only read
//! afterwards; it is passed by reference to everything that needs it.

use crate::config::Question;
use crate::operation::Operation;
use crate::processor::OperationContext;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// A named bundle of prompts and the operations they feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratorDefinition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prompts: IndexMap<String, Question>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// Handler for an operation type that is not built in.
pub trait OperationHandler {
    /// Runs the operation.
    ///
    /// # Arguments
    /// * `data` - Effective template data of the operation
    /// * `options` - The operation's authored fields, minus `type`
    /// * `context` - Paths, logger and helpers of the current run
    fn execute(
        &self,
        data: &Value,
        options: &Map<String, Value>,
        context: &OperationContext<'_>,
    ) -> anyhow::Result<()>;
}

impl<F> OperationHandler for F
where
    F: Fn(&Value, &Map<String, Value>, &OperationContext<'_>) -> anyhow::Result<()>,
{
    fn execute(
        &self,
        data: &Value,
        options: &Map<String, Value>,
        context: &OperationContext<'_>,
    ) -> anyhow::Result<()> {
        self(data, options, context)
    }
}

#[derive(Default, Clone)]
pub struct Registry {
    generators: IndexMap<String, GeneratorDefinition>,
    handlers: IndexMap<String, Arc<dyn OperationHandler + Send + Sync>>,
    partials: IndexMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a generator. Re-registering an id replaces it in place.
    pub fn register_generator<S: Into<String>>(&mut self, id: S, generator: GeneratorDefinition) {
        self.generators.insert(id.into(), generator);
    }

    pub fn register_handler<S, H>(&mut self, name: S, handler: H)
    where
        S: Into<String>,
        H: OperationHandler + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn register_partial<S: Into<String>, T: Into<String>>(&mut self, name: S, template: T) {
        self.partials.insert(name.into(), template.into());
    }

    pub fn generator(&self, id: &str) -> Option<&GeneratorDefinition> {
        self.generators.get(id)
    }

    /// Generator ids in registration order.
    pub fn generator_ids(&self) -> Vec<&str> {
        self.generators.keys().map(String::as_str).collect()
    }

    pub fn generators(&self) -> impl Iterator<Item = (&str, &GeneratorDefinition)> {
        self.generators.iter().map(|(id, generator)| (id.as_str(), generator))
    }

    pub fn handler(&self, name: &str) -> Option<&(dyn OperationHandler + Send + Sync)> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    pub fn partials(&self) -> &IndexMap<String, String> {
        &self.partials
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("generators", &self.generators.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("partials", &self.partials.keys().collect::<Vec<_>>())
            .finish()
    }
}
