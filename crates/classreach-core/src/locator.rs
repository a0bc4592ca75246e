//! Module locators
//!
//! A [`ModuleLocator`] maps a module name to its [`ModuleLocation`] and reads
//! the bytes behind it. [`ClassPathLocator`] does this over any
//! [`ResourceLookup`], such as a [`SearchPath`](crate::SearchPath).

use crate::content::{read_content, ContentError};
use crate::location::{LocateError, ModuleLocation};
use crate::name::ModuleName;
use url::Url;

/// Resolves resource paths (`com/foo/Bar.class`) to URLs
pub trait ResourceLookup {
    /// URL of the first resource with this path, if any
    fn find_resource(&self, resource: &str) -> Option<Url>;
}

impl<F> ResourceLookup for F
where
    F: Fn(&str) -> Option<Url>,
{
    fn find_resource(&self, resource: &str) -> Option<Url> {
        self(resource)
    }
}

/// Maps module names to locations and content
pub trait ModuleLocator {
    /// Locate a module
    ///
    /// `Ok(None)` means the module is simply not available; an error means
    /// it was found somewhere that cannot be packaged.
    fn locate(&self, name: &ModuleName) -> Result<Option<ModuleLocation>, LocateError>;

    /// Read the bytes of a located module
    fn read(&self, location: &ModuleLocation) -> Result<Vec<u8>, ContentError> {
        read_content(location.content())
    }
}

impl<T: ModuleLocator + ?Sized> ModuleLocator for &T {
    fn locate(&self, name: &ModuleName) -> Result<Option<ModuleLocation>, LocateError> {
        (**self).locate(name)
    }

    fn read(&self, location: &ModuleLocation) -> Result<Vec<u8>, ContentError> {
        (**self).read(location)
    }
}

/// Locator over a resource lookup
#[derive(Debug, Clone)]
pub struct ClassPathLocator<L> {
    lookup: L,
}

impl<L: ResourceLookup> ClassPathLocator<L> {
    /// Create a locator over `lookup`
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// The underlying lookup
    pub fn lookup(&self) -> &L {
        &self.lookup
    }
}

impl<L: ResourceLookup> ModuleLocator for ClassPathLocator<L> {
    fn locate(&self, name: &ModuleName) -> Result<Option<ModuleLocation>, LocateError> {
        match self.lookup.find_resource(&name.resource_path()) {
            Some(url) => ModuleLocation::resolve(name, url).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_lookup() {
        let locator = ClassPathLocator::new(|resource: &str| {
            (resource == "com/foo/Bar.class")
                .then(|| Url::parse("file:///out/com/foo/Bar.class").unwrap())
        });

        let location = locator.locate(&ModuleName::new("com.foo.Bar")).unwrap().unwrap();
        assert_eq!(location.packaging_root().as_str(), "file:///out");
        assert!(locator.locate(&ModuleName::new("com.foo.Baz")).unwrap().is_none());
    }

    #[test]
    fn test_unsupported_lookup_result() {
        let locator = ClassPathLocator::new(|resource: &str| {
            Url::parse(&format!("https://repo.example/{resource}")).ok()
        });
        assert!(matches!(
            locator.locate(&ModuleName::new("com.foo.Bar")),
            Err(LocateError::UnsupportedLocationKind(_))
        ));
    }
}
