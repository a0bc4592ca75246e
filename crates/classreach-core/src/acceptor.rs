//! Acceptor policies
//!
//! The walker asks an [`Acceptor`] about every module it manages to locate,
//! once per module, in breadth-first order. [`Decision::Expand`] records the
//! module and queues its references; [`Decision::Stop`] leaves it out of the
//! frontier.

use crate::location::ModuleLocation;
use crate::name::ModuleName;
use tracing::debug;

/// What to do with a located module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Accept the module and follow its references
    Expand,
    /// Do not follow the module's references
    Stop,
}

impl From<bool> for Decision {
    fn from(expand: bool) -> Self {
        if expand {
            Decision::Expand
        } else {
            Decision::Stop
        }
    }
}

/// Caller policy consulted for every located module
pub trait Acceptor {
    /// Judge one module
    fn decide(&mut self, name: &ModuleName, location: &ModuleLocation) -> Decision;
}

impl<F> Acceptor for F
where
    F: FnMut(&ModuleName, &ModuleLocation) -> bool,
{
    fn decide(&mut self, name: &ModuleName, location: &ModuleLocation) -> Decision {
        self(name, location).into()
    }
}

/// A module accepted during a traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedModule {
    pub name: ModuleName,
    pub location: ModuleLocation,
}

/// Acceptor that records accepted modules in visit order
///
/// Modules are accepted when they match an include prefix (or no include
/// prefixes are set) and no exclude prefix. Once `max_modules` modules are
/// accepted everything else is stopped.
#[derive(Debug, Clone, Default)]
pub struct CollectingAcceptor {
    include: Vec<String>,
    exclude: Vec<String>,
    max_modules: Option<usize>,
    accepted: Vec<AcceptedModule>,
    stopped: usize,
}

impl CollectingAcceptor {
    /// Accept everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept names starting with one of `prefixes`
    pub fn with_include<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Never accept names starting with one of `prefixes`
    pub fn with_exclude<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// Cap the number of accepted modules
    pub fn with_max_modules(mut self, max_modules: Option<usize>) -> Self {
        self.max_modules = max_modules;
        self
    }

    /// Modules accepted so far, in visit order
    pub fn accepted(&self) -> &[AcceptedModule] {
        &self.accepted
    }

    /// Consume the acceptor, returning the accepted modules
    pub fn into_accepted(self) -> Vec<AcceptedModule> {
        self.accepted
    }

    /// Number of modules that were located but stopped
    pub fn stopped(&self) -> usize {
        self.stopped
    }

    /// Whether the cap has been reached
    pub fn is_full(&self) -> bool {
        self.max_modules
            .is_some_and(|max| self.accepted.len() >= max)
    }

    fn matches(&self, name: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|prefix| name.starts_with(prefix.as_str()));
        included && !self.exclude.iter().any(|prefix| name.starts_with(prefix.as_str()))
    }
}

impl Acceptor for CollectingAcceptor {
    fn decide(&mut self, name: &ModuleName, location: &ModuleLocation) -> Decision {
        if !self.matches(name.as_str()) {
            debug!(module = %name, "filtered out");
            self.stopped += 1;
            return Decision::Stop;
        }
        if self.is_full() {
            debug!(module = %name, "module cap reached");
            self.stopped += 1;
            return Decision::Stop;
        }
        self.accepted.push(AcceptedModule {
            name: name.clone(),
            location: location.clone(),
        });
        Decision::Expand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn location() -> ModuleLocation {
        let url = Url::parse("file:///out/X.class").unwrap();
        ModuleLocation::new(url, Url::parse("file:///out").unwrap())
    }

    #[test]
    fn test_filters() {
        let mut acceptor = CollectingAcceptor::new()
            .with_include(["com.foo."])
            .with_exclude(["com.foo.internal."]);

        let loc = location();
        assert_eq!(acceptor.decide(&"com.foo.A".into(), &loc), Decision::Expand);
        assert_eq!(acceptor.decide(&"org.bar.B".into(), &loc), Decision::Stop);
        assert_eq!(
            acceptor.decide(&"com.foo.internal.C".into(), &loc),
            Decision::Stop
        );
        assert_eq!(acceptor.accepted().len(), 1);
        assert_eq!(acceptor.stopped(), 2);
    }

    #[test]
    fn test_cap() {
        let mut acceptor = CollectingAcceptor::new().with_max_modules(Some(2));
        let loc = location();
        for name in ["a.A", "a.B", "a.C"] {
            acceptor.decide(&name.into(), &loc);
        }
        assert!(acceptor.is_full());
        let names: Vec<_> = acceptor
            .into_accepted()
            .into_iter()
            .map(|module| module.name.to_string())
            .collect();
        assert_eq!(names, vec!["a.A", "a.B"]);
    }

    #[test]
    fn test_closure_acceptor() {
        let mut seen = Vec::new();
        let mut acceptor = |name: &ModuleName, _: &ModuleLocation| {
            seen.push(name.to_string());
            name.as_str() != "a.Skip"
        };
        assert_eq!(acceptor.decide(&"a.Keep".into(), &location()), Decision::Expand);
        assert_eq!(acceptor.decide(&"a.Skip".into(), &location()), Decision::Stop);
        assert_eq!(seen, vec!["a.Keep", "a.Skip"]);
    }
}
