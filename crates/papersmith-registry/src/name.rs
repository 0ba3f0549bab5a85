//! Template names
//!
//! A template name addresses a template in every store backend. It ends up as
//! the last segment of an object key, so it has to be a single path segment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegistryError;

/// Maximum length of a template name in bytes
pub const MAX_NAME_LEN: usize = 255;

/// Validated template name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TemplateName(String);

impl TemplateName {
    /// Validate and wrap a template name
    pub fn parse(name: impl Into<String>) -> Result<Self, RegistryError> {
        let name = name.into();
        Self::validate(&name).map_err(|reason| RegistryError::InvalidName {
            name: name.clone(),
            reason: reason.to_string(),
        })?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), &'static str> {
        if name.is_empty() {
            return Err("Empty name not allowed");
        }
        if name.len() > MAX_NAME_LEN {
            return Err("Name must be at most 255 bytes");
        }
        if name == "." || name == ".." {
            return Err("Relative path segments not allowed");
        }
        if name.contains(['/', '\\']) {
            return Err("Name must be a single path segment");
        }
        if name.chars().any(char::is_control) {
            return Err("Control characters not allowed");
        }
        if name.trim() != name {
            return Err("Leading or trailing whitespace not allowed");
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for TemplateName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TemplateName {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TemplateName> for String {
    fn from(name: TemplateName) -> Self {
        name.0
    }
}
