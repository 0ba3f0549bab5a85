//! Compiled templates
//!
//! A [`CompiledTemplate`] is the parsed form of a template's source text. It is
//! compiled once and can then be rendered any number of times, concurrently,
//! against different data.

use std::fmt;

use handlebars::Handlebars;
use serde_json::Value;

use crate::error::{Result, TemplateError};

/// Parsed, directly executable form of a template
///
/// Each compiled template owns a Handlebars registry holding exactly one
/// template, registered under the template's own name. HTML escaping of
/// substituted values stays enabled; missing variables render as empty.
pub struct CompiledTemplate {
    name: String,
    source: String,
    registry: Handlebars<'static>,
}

impl CompiledTemplate {
    /// Parse `source` into a compiled template named `name`
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Syntax`] when the source cannot be parsed.
    ///
    /// # Example
    ///
    /// ```rust
    /// use papersmith::CompiledTemplate;
    ///
    /// let template = CompiledTemplate::compile("invoice", "Hello {{Name}}").unwrap();
    /// let html = template.render(&serde_json::json!({ "Name": "Ada" })).unwrap();
    /// assert_eq!(html, "Hello Ada");
    /// ```
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let mut registry = Handlebars::new();
        registry
            .register_template_string(&name, &source)
            .map_err(|e| TemplateError::Syntax {
                name: name.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            name,
            source,
            registry,
        })
    }

    /// Execute the template against `data`, producing markup
    pub fn render(&self, data: &Value) -> Result<String> {
        self.registry
            .render(&self.name, data)
            .map_err(|e| TemplateError::Render {
                name: self.name.clone(),
                message: e.to_string(),
            })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw source text the template was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .field("source_len", &self.source.len())
            .finish()
    }
}
