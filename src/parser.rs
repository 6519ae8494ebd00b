//! Answer collection.
//! Turns a generator's prompts into template data, taking answers piped on
//! stdin first and asking the user for the rest.

use crate::config::{Question, ValueType};
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::registry::Registry;
use crate::renderer::TemplateRenderer;
use indexmap::IndexMap;
use log::debug;
use serde_json::{Map, Value};
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionType {
    MultipleChoice,
    SingleChoice,
    Text,
    YesNo,
}

/// Index of the default choice of a single choice question.
pub fn get_single_choice_default(question: &Question) -> Value {
    let default_value = question
        .default
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|default| question.choices.iter().position(|choice| choice == default))
        .unwrap_or(0);

    Value::Number(default_value.into())
}

/// Reads a choice index computed by `get_single_choice_default`; anything else is 0.
pub fn choice_index(default: &Value) -> usize {
    default.as_u64().and_then(|index| usize::try_from(index).ok()).unwrap_or(0)
}

/// The choice at `index` as template data.
pub fn choice_at(question: &Question, index: usize) -> Result<Value> {
    question
        .choices
        .get(index)
        .map(|choice| Value::String(choice.clone()))
        .ok_or_else(|| Error::ConfigError(format!("no choice at position {index}")))
}

/// One flag per choice; accepts a list of choices or an object keyed by choice.
pub fn get_multiple_choice_default(question: &Question) -> Value {
    let selected: Map<String, Value> = match &question.default {
        Some(Value::Object(default_obj)) => default_obj.clone(),
        Some(Value::Array(default_arr)) => default_arr
            .iter()
            .filter_map(|value| value.as_str().map(|s| (s.to_string(), Value::Bool(true))))
            .collect(),
        _ => Map::new(),
    };

    Value::Array(
        question.choices.iter().map(|choice| Value::Bool(selected.contains_key(choice))).collect(),
    )
}

/// Renders a string default against the answers given so far.
pub fn get_text_default(question: &Question, current_context: &Value, engine: &dyn TemplateRenderer) -> Value {
    let default_value = match question.default.as_ref().and_then(Value::as_str) {
        Some(s) => engine.render(s, current_context).unwrap_or_default(),
        None => String::new(),
    };

    Value::String(default_value)
}

pub fn get_yes_no_default(question: &Question) -> Value {
    Value::Bool(question.default.as_ref().and_then(Value::as_bool).unwrap_or(false))
}

/// Reads answers as a JSON object from stdin. Anything else counts as no answers.
pub fn load_from_stdin() -> Result<Value> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    Ok(serde_json::from_str(buffer.trim()).unwrap_or(Value::Null))
}

fn classify(question: &Question, current_context: &Value, engine: &dyn TemplateRenderer) -> (QuestionType, Value) {
    match question.value_type {
        ValueType::Str if !question.choices.is_empty() && question.multiselect => {
            (QuestionType::MultipleChoice, get_multiple_choice_default(question))
        }
        ValueType::Str if !question.choices.is_empty() => {
            (QuestionType::SingleChoice, get_single_choice_default(question))
        }
        ValueType::Str => (QuestionType::Text, get_text_default(question, current_context, engine)),
        ValueType::Bool => (QuestionType::YesNo, get_yes_no_default(question)),
    }
}

/// Value used when a question is not asked.
fn unasked_value(kind: QuestionType, default: Value, question: &Question) -> Value {
    match kind {
        QuestionType::SingleChoice => {
            choice_at(question, choice_index(&default)).unwrap_or(Value::Null)
        }
        QuestionType::MultipleChoice => Value::Array(
            question
                .choices
                .iter()
                .zip(default.as_array().cloned().unwrap_or_default())
                .filter(|(_, selected)| selected.as_bool().unwrap_or(false))
                .map(|(choice, _)| Value::String(choice.clone()))
                .collect(),
        ),
        QuestionType::Text | QuestionType::YesNo => default,
    }
}

/// Collects an answer for every question, in declaration order.
///
/// Preloaded answers win. A question whose rendered `when` is `false` is not
/// asked and takes its default value.
pub fn get_answers(
    engine: &dyn TemplateRenderer,
    prompt: &dyn Prompter,
    questions: &IndexMap<String, Question>,
    preloaded_answers: &Value,
) -> Result<Value> {
    let mut answers = Map::new();

    for (key, question) in questions {
        let current_context = Value::Object(answers.clone());

        if let Some(preloaded) = preloaded_answers.get(key) {
            debug!("Using preloaded answer for '{key}'");
            answers.insert(key.clone(), preloaded.clone());
            continue;
        }

        let (kind, default_value) = classify(question, &current_context, engine);

        let help_rendered =
            engine.render(&question.help, &current_context).unwrap_or_else(|_| question.help.clone());
        let when_rendered =
            engine.render(&question.when, &current_context).unwrap_or_else(|_| question.when.clone());
        let ask: bool = serde_json::from_str(when_rendered.trim()).unwrap_or(true);

        let value = if ask {
            prompt.answer(kind, default_value, help_rendered, question)?
        } else {
            unasked_value(kind, default_value, question)
        };
        answers.insert(key.clone(), value);
    }

    Ok(Value::Object(answers))
}

/// Picks the generator to run.
///
/// A requested id must exist. Without one, a single generator is chosen
/// directly and several are offered to the user.
///
/// # Errors
/// * `Error::GeneratorNotFoundError` if `requested` is not registered
/// * `Error::ConfigError` if the registry holds no generators
pub fn select_generator(registry: &Registry, prompt: &dyn Prompter, requested: Option<&str>) -> Result<String> {
    if let Some(id) = requested {
        return registry
            .generator(id)
            .map(|_| id.to_string())
            .ok_or_else(|| Error::GeneratorNotFoundError { generator_id: id.to_string() });
    }

    let ids = registry.generator_ids();
    match ids.as_slice() {
        [] => Err(Error::ConfigError("no generators are defined".to_string())),
        [only] => Ok(only.to_string()),
        _ => {
            let items: Vec<String> = registry
                .generators()
                .map(|(id, generator)| {
                    if generator.description.is_empty() {
                        id.to_string()
                    } else {
                        format!("{id} - {}", generator.description)
                    }
                })
                .collect();
            let index = prompt.select("Please choose a generator", &items, 0)?;
            ids.get(index)
                .map(|id| id.to_string())
                .ok_or_else(|| Error::ConfigError(format!("no generator at position {index}")))
        }
    }
}
