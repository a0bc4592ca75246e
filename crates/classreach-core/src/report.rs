//! Closure reports
//!
//! Summarises a traversal as the accepted modules, in visit order, and the
//! distinct packaging roots that must be shipped to supply them.

use crate::acceptor::{AcceptedModule, CollectingAcceptor};
use crate::name::ModuleName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One accepted module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedModule {
    pub name: ModuleName,
    pub content: String,
    pub root: String,
}

/// A packaging root and the accepted modules it supplies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingRoot {
    pub url: String,
    pub modules: Vec<ModuleName>,
}

/// Serialisable traversal summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosureReport {
    /// Accepted modules in visit order
    pub modules: Vec<ReportedModule>,
    /// Distinct packaging roots in order of first use
    pub roots: Vec<PackagingRoot>,
}

impl ClosureReport {
    /// Build a report from accepted modules
    pub fn from_accepted(accepted: &[AcceptedModule]) -> Self {
        let mut report = Self::default();
        let mut root_index: HashMap<&str, usize> = HashMap::new();

        for module in accepted {
            let root = module.location.packaging_root().as_str();
            let index = *root_index.entry(root).or_insert_with(|| {
                report.roots.push(PackagingRoot {
                    url: root.to_string(),
                    modules: Vec::new(),
                });
                report.roots.len() - 1
            });
            report.roots[index].modules.push(module.name.clone());
            report.modules.push(ReportedModule {
                name: module.name.clone(),
                content: module.location.content().to_string(),
                root: root.to_string(),
            });
        }
        report
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&CollectingAcceptor> for ClosureReport {
    fn from(acceptor: &CollectingAcceptor) -> Self {
        Self::from_accepted(acceptor.accepted())
    }
}
