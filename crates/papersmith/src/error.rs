//! Error types for the papersmith library
//!
//! Errors are split by stage: compiling and executing a template produces a
//! [`TemplateError`], turning rendered markup into a document produces a
//! [`RenderError`].

use thiserror::Error;

/// Template compilation and execution errors
#[derive(Error, Debug)]
pub enum TemplateError {
    /// The template source could not be parsed
    #[error("Syntax error in template '{name}': {message}")]
    Syntax { name: String, message: String },

    /// The template parsed but failed while being executed against data
    #[error("Failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

impl TemplateError {
    /// Name of the template the error belongs to
    pub fn template_name(&self) -> &str {
        match self {
            TemplateError::Syntax { name, .. } | TemplateError::Render { name, .. } => name,
        }
    }
}

/// Document conversion errors
///
/// These errors occur while converting rendered HTML into a PDF document.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to start renderer '{program}': {reason}")]
    Spawn { program: String, reason: String },

    #[error("Renderer I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer exited with status {status}: {stderr}")]
    Failed { status: i32, stderr: String },

    #[error("Renderer timed out after {timeout:?}")]
    Timeout { timeout: std::time::Duration },

    #[error("Renderer produced invalid output: {0}")]
    InvalidOutput(String),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
