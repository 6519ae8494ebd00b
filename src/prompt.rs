//! Interactive prompting.
//! The `Prompter` trait decouples question handling from the terminal so the
//! answer collection in `parser` can be driven by tests.

use crate::config::Question;
use crate::error::Result;
use crate::parser::{choice_at, choice_index, QuestionType};
use dialoguer::{Confirm, FuzzySelect, Input, MultiSelect, Select};
use serde_json::Value;

pub trait Prompter {
    /// Asks the user to pick one of `items`; returns its index.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize>;

    /// Asks `question` and returns the answer as template data.
    ///
    /// `default` is the value computed by `parser` for `kind`: an index for
    /// single choice, a list of flags for multiple choice, a string or a bool.
    fn answer(&self, kind: QuestionType, default: Value, help: String, question: &Question) -> Result<Value>;
}

#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn select(&self, prompt: &str, items: &[String], default: usize) -> Result<usize> {
        let selection = FuzzySelect::new()
            .with_prompt(prompt)
            .default(default)
            .items(items)
            .interact()?;
        Ok(selection)
    }

    fn answer(&self, kind: QuestionType, default: Value, help: String, question: &Question) -> Result<Value> {
        match kind {
            QuestionType::SingleChoice => {
                let selection = Select::new()
                    .with_prompt(help)
                    .default(choice_index(&default))
                    .items(&question.choices)
                    .interact()?;
                choice_at(question, selection)
            }
            QuestionType::MultipleChoice => {
                let defaults: Vec<bool> = default
                    .as_array()
                    .map(|flags| flags.iter().map(|flag| flag.as_bool().unwrap_or(false)).collect())
                    .unwrap_or_default();
                let indices = MultiSelect::new()
                    .with_prompt(help)
                    .items(&question.choices)
                    .defaults(&defaults)
                    .interact()?;
                let answers = indices.into_iter().map(|i| choice_at(question, i)).collect::<Result<Vec<_>>>()?;
                Ok(Value::Array(answers))
            }
            QuestionType::Text => {
                let default = default.as_str().unwrap_or_default().to_string();
                let input: String = Input::new().with_prompt(help).default(default).interact_text()?;
                Ok(Value::String(input))
            }
            QuestionType::YesNo => {
                let default = default.as_bool().unwrap_or(false);
                let result = Confirm::new().with_prompt(help).default(default).interact()?;
                Ok(Value::Bool(result))
            }
        }
    }
}
