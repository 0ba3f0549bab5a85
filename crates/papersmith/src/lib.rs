//! Papersmith turns named HTML templates into PDF documents.
//!
//! This crate holds the two pure building blocks of the service: compiling and
//! executing templates ([`CompiledTemplate`]) and converting the resulting
//! markup into a document ([`DocumentRenderer`]). Storage, caching and
//! registration live in `papersmith-registry`.

pub mod error;
pub mod render;
pub mod template;

pub use error::{RenderError, Result, TemplateError};
pub use render::{DocumentRenderer, WkHtmlToPdf};
pub use template::CompiledTemplate;

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
