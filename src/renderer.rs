//! Template rendering for kiln.
//! Renders template strings and path templates with MiniJinja, with the
//! registry's partials and a set of string-case helpers available.
use crate::constants::{INLINE_TEMPLATE_PREFIX, TEMPLATE_CACHE_LIMIT};
use crate::error::{Error, Result};
use cruet::Inflector;
use indexmap::{IndexMap, IndexSet};
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Trait for template rendering engines.
pub trait TemplateRenderer {
    /// Renders a template string with the given context.
    ///
    /// # Arguments
    /// * `template` - Template string to render
    /// * `context` - Context variables for rendering
    ///
    /// # Returns
    /// * `Result<String>` - Rendered template string
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String>;
}

/// Renders `path_template` and resolves the result against `base_dir`.
///
/// Keys missing from `context` render as empty strings.
pub fn resolve_path(
    engine: &dyn TemplateRenderer,
    path_template: &str,
    context: &serde_json::Value,
    base_dir: &Path,
) -> Result<PathBuf> {
    let rendered = engine.render(path_template, context)?;
    Ok(base_dir.join(rendered))
}

struct Inner {
    env: Environment<'static>,
    cached: IndexSet<String>,
}

/// MiniJinja-based template rendering engine.
pub struct MiniJinjaRenderer {
    /// Environment plus the names of inline templates compiled into it
    inner: Mutex<Inner>,
}

impl MiniJinjaRenderer {
    /// Creates a new renderer with the case helpers registered.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        // template names embed the source text, never escape based on them
        env.set_auto_escape_callback(|_| AutoEscape::None);
        register_case_helpers(&mut env);
        Self { inner: Mutex::new(Inner { env, cached: IndexSet::new() }) }
    }

    /// Creates a renderer whose templates can `{% include %}` the given partials by name.
    pub fn with_partials(partials: &IndexMap<String, String>) -> Result<Self> {
        let renderer = Self::new();
        {
            let mut inner = renderer.lock();
            for (name, source) in partials {
                inner.env.add_template_owned(name.clone(), source.clone()).map_err(|e| {
                    Error::TemplateError {
                        template: source.clone(),
                        data: String::from("{}"),
                        source: e,
                    }
                })?;
            }
        }
        Ok(renderer)
    }

    /// Drops every cached inline template. Partials are kept.
    pub fn clear_cache(&self) {
        let mut inner = self.lock();
        let cached = std::mem::take(&mut inner.cached);
        for name in &cached {
            inner.env.remove_template(name);
        }
    }

    /// Number of inline templates currently compiled.
    pub fn cached_templates(&self) -> usize {
        self.lock().cached.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // the cache holds no invariant a panicking render could break
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MiniJinjaRenderer {
    fn default() -> Self {
        MiniJinjaRenderer::new()
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    /// Renders a template string using MiniJinja.
    ///
    /// # Errors
    /// * `Error::TemplateError` if the template fails to compile or render,
    ///   carrying the template and a JSON snapshot of the context
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<String> {
        let template_error = |source: minijinja::Error| Error::TemplateError {
            template: template.to_string(),
            data: serde_json::to_string(context).unwrap_or_default(),
            source,
        };

        let mut inner = self.lock();
        let name = format!("{INLINE_TEMPLATE_PREFIX}{template}");
        if !inner.cached.contains(&name) {
            inner.env.add_template_owned(name.clone(), template.to_string()).map_err(template_error)?;
            inner.cached.insert(name.clone());
            if inner.cached.len() > TEMPLATE_CACHE_LIMIT {
                if let Some(oldest) = inner.cached.shift_remove_index(0) {
                    inner.env.remove_template(&oldest);
                }
            }
        }

        let tmpl = inner.env.get_template(&name).map_err(template_error)?;
        tmpl.render(context).map_err(template_error)
    }
}

fn register_case_helpers(env: &mut Environment<'static>) {
    let helpers: [(&'static str, &'static str, fn(&str) -> String); 8] = [
        ("camel_case", "camelCase", |s| s.to_camel_case()),
        ("pascal_case", "pascalCase", |s| s.to_pascal_case()),
        ("snake_case", "snakeCase", |s| s.to_snake_case()),
        ("kebab_case", "kebabCase", |s| s.to_kebab_case()),
        ("constant_case", "constantCase", |s| s.to_screaming_snake_case()),
        ("title_case", "titleCase", |s| s.to_title_case()),
        ("sentence_case", "sentenceCase", |s| s.to_sentence_case()),
        ("train_case", "trainCase", |s| s.to_train_case()),
    ];
    for (filter, function, convert) in helpers {
        env.add_filter(filter, move |value: String| convert(&value));
        env.add_function(function, move |value: String| convert(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_is_bounded() {
        let renderer = MiniJinjaRenderer::new();
        for i in 0..TEMPLATE_CACHE_LIMIT + 10 {
            renderer.render(&format!("{i}-{{{{ x }}}}"), &json!({"x": 1})).unwrap();
        }
        assert_eq!(renderer.cached_templates(), TEMPLATE_CACHE_LIMIT);

        renderer.clear_cache();
        assert_eq!(renderer.cached_templates(), 0);
        assert_eq!(renderer.render("{{ x }}", &json!({"x": 2})).unwrap(), "2");
    }

    #[test]
    fn test_repeated_template_is_compiled_once() {
        let renderer = MiniJinjaRenderer::new();
        renderer.render("Hi {{ name }}", &json!({"name": "a"})).unwrap();
        renderer.render("Hi {{ name }}", &json!({"name": "b"})).unwrap();
        assert_eq!(renderer.cached_templates(), 1);
    }
}
