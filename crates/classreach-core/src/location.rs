//! Module locations
//!
//! A location pairs the URL of a class file's bytes with the URL of the
//! packaging root that has to be shipped to supply it:
//!
//! - `file:///repo/out/com/foo/Bar.class` lives in the directory `file:///repo/out`
//! - `jar:file:///repo/libs/x.jar!/com/foo/Bar.class` lives in the archive
//!   `file:///repo/libs/x.jar`
//!
//! Any other scheme cannot be packaged and is rejected.

use crate::name::ModuleName;
use thiserror::Error;
use url::Url;

/// Separator between the archive URL and the entry path in a `jar:` URL
pub const ARCHIVE_SEPARATOR: &str = "!/";

/// Errors that can occur while locating a module
#[derive(Debug, Error)]
pub enum LocateError {
    /// The content URL uses a scheme that has no packaging root
    #[error("Unsupported location kind: {0}")]
    UnsupportedLocationKind(Url),

    /// The content URL does not have the shape its scheme requires
    #[error("Location {url} cannot hold module {module}")]
    InvalidLocation { module: ModuleName, url: Url },
}

/// Where a module's bytes live and which packaging unit contains them
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleLocation {
    content: Url,
    packaging_root: Url,
}

impl ModuleLocation {
    /// Pair a content URL with an already known packaging root
    pub fn new(content: Url, packaging_root: Url) -> Self {
        Self {
            content,
            packaging_root,
        }
    }

    /// Derive the packaging root for `name` found at `content`
    pub fn resolve(name: &ModuleName, content: Url) -> Result<Self, LocateError> {
        let packaging_root = packaging_root(name, &content)?;
        Ok(Self {
            content,
            packaging_root,
        })
    }

    /// URL of the class file bytes
    pub fn content(&self) -> &Url {
        &self.content
    }

    /// URL of the directory or archive containing the class file
    pub fn packaging_root(&self) -> &Url {
        &self.packaging_root
    }
}

/// Packaging root of `name` given the URL of its class file
pub fn packaging_root(name: &ModuleName, content: &Url) -> Result<Url, LocateError> {
    match content.scheme() {
        "file" => directory_root(name, content),
        "jar" => archive_root(name, content),
        _ => Err(LocateError::UnsupportedLocationKind(content.clone())),
    }
}

/// Drop one trailing path segment per dotted component of the name
///
/// The separator before the first module segment goes too, unless what is
/// left is the filesystem root itself.
fn directory_root(name: &ModuleName, content: &Url) -> Result<Url, LocateError> {
    let invalid = || LocateError::InvalidLocation {
        module: name.clone(),
        url: content.clone(),
    };

    let path = content.path();
    if !path.ends_with(".class") {
        return Err(invalid());
    }
    let mut end = path.len();
    for _ in 0..name.depth() {
        end = path[..end].rfind('/').ok_or_else(invalid)?;
    }

    let root_path = if end == 0 { "/" } else { &path[..end] };
    let mut root = content.clone();
    root.set_path(root_path);
    root.set_query(None);
    root.set_fragment(None);
    Ok(root)
}

/// Everything between `jar:` and `!/`
fn archive_root(name: &ModuleName, content: &Url) -> Result<Url, LocateError> {
    let invalid = || LocateError::InvalidLocation {
        module: name.clone(),
        url: content.clone(),
    };

    let path = content.path();
    let (archive, _entry) = path.split_once(ARCHIVE_SEPARATOR).ok_or_else(invalid)?;
    Url::parse(archive).map_err(|_| invalid())
}
