//! Operations as they are authored in a configuration file or built in Rust.
//!
//! Fields that have a default are optional here; `dispatcher::decorate`
//! turns an `Operation` into its fully populated form right before it runs.

use crate::content::TemplateSource;
use crate::error::{Error, Result};
use crate::processor::OperationContext;
use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub type PredicateFn = dyn Fn(&Value) -> anyhow::Result<bool> + Send + Sync;
pub type ItemsFn = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;
pub type TransformFn = dyn Fn(&Value, usize, &Value) -> anyhow::Result<Value> + Send + Sync;
pub type ActionFn = dyn Fn(&Value, &OperationContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// Fields every operation accepts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Common {
    /// Static data layered over the input for this operation only
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub skip: Option<Predicate>,
    #[serde(default)]
    pub halt_on_error: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperation {
    #[serde(flatten)]
    pub common: Common,
    pub file_path: String,
    #[serde(flatten)]
    pub source: TemplateSource,
    pub skip_if_exists: Option<bool>,
    pub overwrite: Option<bool>,
}

/// Shared shape of `append` and `prepend`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendOperation {
    #[serde(flatten)]
    pub common: Common,
    pub file_path: String,
    #[serde(flatten)]
    pub source: TemplateSource,
    pub separator: Option<String>,
    pub unique: Option<bool>,
    pub pattern: Option<Pattern>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllOperation {
    #[serde(flatten)]
    pub common: Common,
    pub destination_path: String,
    pub template_files_glob: String,
    pub template_base_path: Option<String>,
    pub verbose: Option<bool>,
    pub skip_if_exists: Option<bool>,
    pub overwrite: Option<bool>,
    pub strip_extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForManyOperation {
    #[serde(flatten)]
    pub common: Common,
    pub generator_id: String,
    pub items: Items,
    pub transform_item: Option<Transform>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomOperation {
    #[serde(flatten)]
    pub common: Common,
    pub name: String,
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyOperation {
    #[serde(flatten)]
    pub common: Common,
    pub file_path: String,
    #[serde(flatten)]
    pub source: TemplateSource,
    pub pattern: Pattern,
}

/// An operation whose `type` is not built in; resolved against the
/// registry's handlers at dispatch time.
#[derive(Debug, Clone, Default)]
pub struct RegisteredOperation {
    pub type_name: String,
    pub common: Common,
    /// Every authored field except `type`, passed to the handler as-is
    pub options: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Create(CreateOperation),
    Append(AmendOperation),
    Prepend(AmendOperation),
    CreateAll(CreateAllOperation),
    ForMany(ForManyOperation),
    Custom(CustomOperation),
    Modify(ModifyOperation),
    Registered(RegisteredOperation),
}

impl Operation {
    /// The `type` this operation was declared with.
    pub fn type_name(&self) -> &str {
        match self {
            Operation::Create(_) => "create",
            Operation::Append(_) => "append",
            Operation::Prepend(_) => "prepend",
            Operation::CreateAll(_) => "createAll",
            Operation::ForMany(_) => "forMany",
            Operation::Custom(_) => "custom",
            Operation::Modify(_) => "modify",
            Operation::Registered(op) => &op.type_name,
        }
    }

    pub fn common(&self) -> &Common {
        match self {
            Operation::Create(op) => &op.common,
            Operation::Append(op) | Operation::Prepend(op) => &op.common,
            Operation::CreateAll(op) => &op.common,
            Operation::ForMany(op) => &op.common,
            Operation::Custom(op) => &op.common,
            Operation::Modify(op) => &op.common,
            Operation::Registered(op) => &op.common,
        }
    }

    pub fn halt_on_error(&self) -> bool {
        self.common().halt_on_error.unwrap_or(true)
    }
}

fn from_map<T: DeserializeOwned, E: serde::de::Error>(map: Map<String, Value>) -> std::result::Result<T, E> {
    serde_json::from_value(Value::Object(map)).map_err(E::custom)
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut map = Map::<String, Value>::deserialize(deserializer)?;
        let type_name = match map.get("type") {
            Some(Value::String(type_name)) => type_name.clone(),
            Some(_) => return Err(D::Error::custom("operation 'type' must be a string")),
            None => return Err(D::Error::missing_field("type")),
        };

        let operation = match type_name.as_str() {
            "create" => Operation::Create(from_map::<_, D::Error>(map)?),
            "append" => Operation::Append(from_map::<_, D::Error>(map)?),
            "prepend" => Operation::Prepend(from_map::<_, D::Error>(map)?),
            "createAll" => Operation::CreateAll(from_map::<_, D::Error>(map)?),
            "forMany" => Operation::ForMany(from_map::<_, D::Error>(map)?),
            "custom" => Operation::Custom(from_map::<_, D::Error>(map)?),
            "modify" => Operation::Modify(from_map::<_, D::Error>(map)?),
            _ => {
                map.remove("type");
                let common = from_map::<_, D::Error>(map.clone())?;
                Operation::Registered(RegisteredOperation { type_name, common, options: map })
            }
        };
        Ok(operation)
    }
}

/// Search expression for `append`, `prepend` and `modify`.
///
/// A plain string in the configuration is a literal substring; `{ regex: "..." }`
/// is a regular expression.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "PatternRepr")]
pub enum Pattern {
    Literal(String),
    Regex(Regex),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Literal(String),
    Regex { regex: String },
}

impl TryFrom<PatternRepr> for Pattern {
    type Error = regex::Error;

    fn try_from(repr: PatternRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            PatternRepr::Literal(literal) => Ok(Pattern::Literal(literal)),
            PatternRepr::Regex { regex } => Ok(Pattern::Regex(Regex::new(&regex)?)),
        }
    }
}

impl Pattern {
    /// Compiles the pattern; literals are escaped first.
    pub fn to_regex(&self) -> Result<Cow<'_, Regex>> {
        match self {
            Pattern::Regex(regex) => Ok(Cow::Borrowed(regex)),
            Pattern::Literal(literal) => Regex::new(&regex::escape(literal))
                .map(Cow::Owned)
                .map_err(|source| Error::PatternError { pattern: literal.clone(), source }),
        }
    }

    /// Replaces up to `limit` matches in `haystack`; a limit of 0 replaces all.
    ///
    /// Regex patterns expand `$1` and `${name}` in `replacement`, literal
    /// patterns insert it verbatim.
    pub fn replace<'h>(&self, haystack: &'h str, limit: usize, replacement: &str) -> Result<Cow<'h, str>> {
        let regex = self.to_regex()?;
        Ok(match self {
            Pattern::Literal(_) => regex.replacen(haystack, limit, NoExpand(replacement)),
            Pattern::Regex(_) => regex.replacen(haystack, limit, replacement),
        })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(literal) => write!(f, "{literal:?}"),
            Pattern::Regex(regex) => write!(f, "/{}/", regex.as_str()),
        }
    }
}

/// The `skip` predicate.
#[derive(Clone, Deserialize)]
#[serde(from = "PredicateRepr")]
pub enum Predicate {
    Bool(bool),
    /// Rendered against the operation data; a truthy result skips, and any
    /// text other than `true` becomes the skip reason.
    Template(String),
    Callback(Arc<PredicateFn>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PredicateRepr {
    Bool(bool),
    Template(String),
}

impl From<PredicateRepr> for Predicate {
    fn from(repr: PredicateRepr) -> Self {
        match repr {
            PredicateRepr::Bool(value) => Predicate::Bool(value),
            PredicateRepr::Template(template) => Predicate::Template(template),
        }
    }
}

impl Predicate {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        Predicate::Callback(Arc::new(f))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Predicate::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Predicate::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// The `items` of a `forMany` operation.
#[derive(Clone, Deserialize)]
#[serde(from = "ItemsRepr")]
pub enum Items {
    List(Vec<Value>),
    /// Rendered against the parent data and parsed as JSON, e.g. `"{{ modules | tojson }}"`.
    Template(String),
    Callback(Arc<ItemsFn>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemsRepr {
    List(Vec<Value>),
    Template(String),
}

impl From<ItemsRepr> for Items {
    fn from(repr: ItemsRepr) -> Self {
        match repr {
            ItemsRepr::List(items) => Items::List(items),
            ItemsRepr::Template(template) => Items::Template(template),
        }
    }
}

impl Items {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Items::Callback(Arc::new(f))
    }
}

impl fmt::Debug for Items {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Items::List(items) => f.debug_tuple("List").field(items).finish(),
            Items::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Items::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// The `transformItem` of a `forMany` operation.
///
/// Templates see the parent data plus `item` and `index`.
#[derive(Clone, Deserialize)]
#[serde(from = "TransformRepr")]
pub enum Transform {
    /// Rendered and parsed as JSON
    Template(String),
    /// Each value rendered on its own into an object
    Fields(IndexMap<String, String>),
    Callback(Arc<TransformFn>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TransformRepr {
    Template(String),
    Fields(IndexMap<String, String>),
}

impl From<TransformRepr> for Transform {
    fn from(repr: TransformRepr) -> Self {
        match repr {
            TransformRepr::Template(template) => Transform::Template(template),
            TransformRepr::Fields(fields) => Transform::Fields(fields),
        }
    }
}

impl Transform {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value, usize, &Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Transform::Callback(Arc::new(f))
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Transform::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Transform::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// The `action` of a `custom` operation.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum Action {
    /// Command line template, run in the destination directory with the
    /// operation data as JSON on stdin.
    Command(String),
    Callback(Arc<ActionFn>),
}

impl From<String> for Action {
    fn from(command: String) -> Self {
        Action::Command(command)
    }
}

impl Action {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&Value, &OperationContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Action::Callback(Arc::new(f))
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Action::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}
