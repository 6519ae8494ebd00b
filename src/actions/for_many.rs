//! The `forMany` operation.
//!
//! Runs every operation of another generator once per item, in list order.
//! Each item is transformed, then layered over the parent data. The forMany
//! `haltOnError` decides for every sub-operation whether a failure aborts
//! the whole fan-out or is logged and skipped.

use crate::error::{Error, Result};
use crate::operation::{Items, Transform};
use crate::processor::{merge_data, Outcome, Processor};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub struct ForMany {
    pub generator_id: String,
    pub items: Items,
    pub transform_item: Option<Transform>,
    pub halt_on_error: bool,
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn parse_json(rendered: &str) -> std::result::Result<Value, serde_json::Error> {
    serde_json::from_str(rendered.trim())
}

/// Object items are spread over the parent data; anything else lands under `item`.
fn item_overlay(item: Value) -> Map<String, Value> {
    match item {
        Value::Object(fields) => fields,
        other => {
            let mut fields = Map::new();
            fields.insert(String::from("item"), other);
            fields
        }
    }
}

impl ForMany {
    fn transform_error(&self, source: anyhow::Error) -> Error {
        Error::OperationError { name: format!("forMany '{}' transformItem", self.generator_id), source }
    }

    /// Resolves `items` against the parent data.
    ///
    /// # Errors
    /// * `Error::InvalidForManyItemsError` if the value is not a list
    pub fn resolve_items(&self, processor: &Processor<'_>, data: &Value) -> Result<Vec<Value>> {
        let invalid = |found: String| Error::InvalidForManyItemsError {
            generator_id: self.generator_id.clone(),
            found,
        };

        let resolved = match &self.items {
            Items::List(items) => return Ok(items.clone()),
            Items::Template(template) => {
                let rendered = processor.render(template, data)?;
                parse_json(&rendered).map_err(|_| invalid(format!("non-JSON text {:?}", rendered.trim())))?
            }
            Items::Callback(callback) => callback(data).map_err(|source| Error::OperationError {
                name: format!("forMany '{}' items", self.generator_id),
                source,
            })?,
        };

        match resolved {
            Value::Array(items) => Ok(items),
            other => Err(invalid(type_of(&other).to_string())),
        }
    }

    /// Applies `transformItem`; without one the item is returned unchanged.
    pub fn transform(&self, processor: &Processor<'_>, item: Value, index: usize, parent: &Value) -> Result<Value> {
        let transform = match &self.transform_item {
            Some(transform) => transform,
            None => return Ok(item),
        };

        match transform {
            Transform::Callback(callback) => {
                callback(&item, index, parent).map_err(|source| self.transform_error(source))
            }
            Transform::Template(template) => {
                let context = merge_data(parent, &transform_scope(item, index));
                let rendered = processor.render(template, &context)?;
                parse_json(&rendered).map_err(|e| self.transform_error(e.into()))
            }
            Transform::Fields(fields) => {
                let context = merge_data(parent, &transform_scope(item, index));
                let mut transformed = Map::new();
                for (key, template) in fields {
                    transformed.insert(key.clone(), Value::String(processor.render(template, &context)?));
                }
                Ok(Value::Object(transformed))
            }
        }
    }

    pub fn run(&self, processor: &Processor<'_>, data: &Value) -> Result<Outcome> {
        let generator = processor.registry().generator(&self.generator_id).ok_or_else(|| {
            Error::GeneratorNotFoundError { generator_id: self.generator_id.clone() }
        })?;
        if generator.operations.is_empty() {
            return Err(Error::MissingOperationsError { generator_id: self.generator_id.clone() });
        }

        let items = self.resolve_items(processor, data)?;
        let count = items.len();
        let (mut dispatched, mut skipped, mut failed) = (0, 0, 0);

        for (index, item) in items.into_iter().enumerate() {
            processor
                .logger()
                .debug(format!("forMany: '{}' item {}/{}", self.generator_id, index + 1, count));

            let transformed = match self.transform(processor, item, index, data) {
                Ok(transformed) => transformed,
                Err(err) if self.halt_on_error => return Err(err),
                Err(err) => {
                    processor.logger().error(format!("forMany: item {index} skipped: {err}"));
                    failed += 1;
                    continue;
                }
            };

            let merged = merge_data(data, &item_overlay(transformed));
            let summary = processor.run_operations(&generator.operations, &merged, Some(self.halt_on_error))?;
            dispatched += summary.dispatched;
            skipped += summary.skipped;
            failed += summary.failed;
        }

        let outcome = Outcome::FanOut {
            generator_id: self.generator_id.clone(),
            items: count,
            dispatched,
            skipped,
            failed,
        };
        processor.logger().success(&outcome);
        Ok(outcome)
    }
}

fn transform_scope(item: Value, index: usize) -> Map<String, Value> {
    match json!({ "item": item, "index": index }) {
        Value::Object(scope) => scope,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_overlay() {
        let overlay = item_overlay(json!({"name": "a"}));
        assert_eq!(overlay.get("name"), Some(&json!("a")));

        let overlay = item_overlay(json!("plain"));
        assert_eq!(overlay.get("item"), Some(&json!("plain")));
    }

    #[test]
    fn test_type_of() {
        assert_eq!(type_of(&json!({"a": 1})), "an object");
        assert_eq!(type_of(&json!("x")), "a string");
        assert_eq!(type_of(&Value::Null), "null");
    }

    #[test]
    fn test_transform_scope() {
        let scope = transform_scope(json!("x"), 2);
        assert_eq!(Value::Object(scope), json!({"item": "x", "index": 2}));
    }
}
