//! Dependency traversal
//!
//! Breadth-first walk over the class reference graph. Each traversal owns
//! its own visited set and queue; the walker itself is only borrowed, so
//! independent traversals can share one walker.

use crate::acceptor::{Acceptor, Decision};
use crate::content::ContentError;
use crate::location::LocateError;
use crate::locator::ModuleLocator;
use crate::name::ModuleName;
use classreach_classfile::{ClassFormatError, ReferenceExtractor};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that abort a traversal
#[derive(Debug, Error)]
pub enum WalkError {
    /// A module was found somewhere that cannot be packaged
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// The bytes of an accepted module could not be read
    #[error("Failed to read module {module}: {source}")]
    ContentRead {
        module: ModuleName,
        #[source]
        source: ContentError,
    },

    /// The bytes of an accepted module are not a valid class file
    #[error("Malformed module {module}: {source}")]
    MalformedModule {
        module: ModuleName,
        #[source]
        source: ClassFormatError,
    },
}

/// Breadth-first dependency walker
#[derive(Debug, Clone)]
pub struct DependencyWalker<L> {
    locator: L,
    extractor: ReferenceExtractor,
}

impl<L: ModuleLocator> DependencyWalker<L> {
    /// Walker using the default platform prefix
    pub fn new(locator: L) -> Self {
        Self::with_extractor(locator, ReferenceExtractor::new())
    }

    /// Walker with a custom extractor
    pub fn with_extractor(locator: L, extractor: ReferenceExtractor) -> Self {
        Self { locator, extractor }
    }

    /// The locator
    pub fn locator(&self) -> &L {
        &self.locator
    }

    /// Walk the closure of `seeds`, consulting `acceptor` for every module found
    ///
    /// Modules that cannot be located are skipped without consulting the
    /// acceptor. Locations that cannot be packaged, unreadable content and
    /// malformed class files abort the walk; names still queued are dropped.
    pub fn traverse<I, N, A>(&self, seeds: I, acceptor: &mut A) -> Result<(), WalkError>
    where
        I: IntoIterator<Item = N>,
        N: Into<ModuleName>,
        A: Acceptor + ?Sized,
    {
        let mut visited: HashSet<ModuleName> = HashSet::new();
        let mut pending: VecDeque<ModuleName> = VecDeque::new();
        for seed in seeds {
            let seed = seed.into();
            if visited.insert(seed.clone()) {
                pending.push_back(seed);
            }
        }

        let mut expanded = 0usize;
        let mut missing = 0usize;

        while let Some(name) = pending.pop_front() {
            let Some(location) = self.locator.locate(&name)? else {
                debug!(module = %name, "not found, skipping");
                missing += 1;
                continue;
            };

            if acceptor.decide(&name, &location) == Decision::Stop {
                debug!(module = %name, "stopped by acceptor");
                continue;
            }

            let bytes = self
                .locator
                .read(&location)
                .map_err(|source| WalkError::ContentRead {
                    module: name.clone(),
                    source,
                })?;
            let references =
                self.extractor
                    .extract(&bytes)
                    .map_err(|source| WalkError::MalformedModule {
                        module: name.clone(),
                        source,
                    })?;

            let mut queued = 0usize;
            for dependency in references.dependencies() {
                if !visited.contains(dependency) {
                    let dependency = ModuleName::new(dependency);
                    visited.insert(dependency.clone());
                    pending.push_back(dependency);
                    queued += 1;
                }
            }
            expanded += 1;
            debug!(
                module = %name,
                root = %location.packaging_root(),
                references = references.len(),
                queued,
                "expanded module"
            );
        }

        info!(
            visited = visited.len(),
            expanded, missing, "dependency traversal complete"
        );
        Ok(())
    }
}

/// Walk the closure of `seeds` over `locator` with the default extractor
pub fn find_dependencies<L, I, N, A>(locator: L, seeds: I, acceptor: &mut A) -> Result<(), WalkError>
where
    L: ModuleLocator,
    I: IntoIterator<Item = N>,
    N: Into<ModuleName>,
    A: Acceptor + ?Sized,
{
    DependencyWalker::new(locator).traverse(seeds, acceptor)
}
