//! classreach core library
//!
//! Computes the transitive closure of class-file dependencies for a set of
//! seed classes:
//! - Module names and locations (content URL plus packaging root)
//! - Search paths over directories and archives
//! - Content reading for `file:` and `jar:` locations
//! - Breadth-first dependency traversal driven by an acceptor policy
//! - Configuration (classreach.toml) and closure reports

pub mod acceptor;
pub mod config;
pub mod content;
pub mod location;
pub mod locator;
pub mod name;
pub mod report;
pub mod search_path;
pub mod walker;

pub use acceptor::{AcceptedModule, Acceptor, CollectingAcceptor, Decision};
pub use config::{Config, ConfigError, FilterConfig, SearchConfig, CONFIG_FILE_NAME};
pub use content::{read_content, ContentError};
pub use location::{packaging_root, LocateError, ModuleLocation};
pub use locator::{ClassPathLocator, ModuleLocator, ResourceLookup};
pub use name::ModuleName;
pub use report::{ClosureReport, PackagingRoot, ReportedModule};
pub use search_path::{SearchEntry, SearchPath};
pub use walker::{find_dependencies, DependencyWalker, WalkError};

pub use classreach_classfile::{ReferenceExtractor, References, DEFAULT_PLATFORM_PREFIX};
