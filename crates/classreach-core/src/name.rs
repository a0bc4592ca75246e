//! Module names
//!
//! A module is named by its dotted binary class name (`com.foo.Bar`,
//! `com.foo.Outer$Inner`). The slash-separated internal form and the
//! `.class` resource path are derived only when a lookup needs them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Dotted, fully qualified class name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Wrap a dotted name
    pub fn new(dotted: impl Into<String>) -> Self {
        Self(dotted.into())
    }

    /// Build from an internal (slash-separated) name
    pub fn from_internal(internal: &str) -> Self {
        Self(internal.replace('/', "."))
    }

    /// The dotted name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Internal form, `com/foo/Bar`
    pub fn internal_name(&self) -> String {
        self.0.replace('.', "/")
    }

    /// Resource path of the class file, `com/foo/Bar.class`
    pub fn resource_path(&self) -> String {
        format!("{}.class", self.internal_name())
    }

    /// Number of dotted components (package segments plus the class itself)
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&ModuleName> for ModuleName {
    fn from(name: &ModuleName) -> Self {
        name.clone()
    }
}

impl AsRef<str> for ModuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ModuleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
