//! Search paths
//!
//! An ordered list of directories and archives searched for class-file
//! resources. The first entry holding a resource wins. Archive entry names
//! are indexed once, when the archive is added.

use crate::location::ARCHIVE_SEPARATOR;
use crate::locator::ResourceLookup;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

/// One search path entry
#[derive(Debug, Clone)]
pub enum SearchEntry {
    /// Directory tree of class files
    Directory(PathBuf),

    /// Zip or jar archive
    Archive {
        path: PathBuf,
        url: Url,
        entries: HashSet<String>,
    },
}

impl SearchEntry {
    /// Filesystem path of the entry
    pub fn path(&self) -> &Path {
        match self {
            SearchEntry::Directory(path) => path,
            SearchEntry::Archive { path, .. } => path,
        }
    }

    fn find(&self, resource: &str) -> Option<Url> {
        match self {
            SearchEntry::Directory(dir) => {
                let candidate = dir.join(resource);
                if candidate.is_file() {
                    Url::from_file_path(&candidate).ok()
                } else {
                    None
                }
            }
            SearchEntry::Archive { url, entries, .. } => {
                if entries.contains(resource) {
                    Url::parse(&format!("jar:{url}{ARCHIVE_SEPARATOR}{resource}")).ok()
                } else {
                    None
                }
            }
        }
    }
}

/// Ordered search path
#[derive(Debug, Clone, Default)]
pub struct SearchPath {
    entries: Vec<SearchEntry>,
}

impl SearchPath {
    /// Create an empty search path
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of paths, skipping those that cannot be used
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut search_path = Self::new();
        for path in paths {
            search_path.push(path.as_ref());
        }
        search_path
    }

    /// Build from a platform path list (`a:b:c` on Unix)
    pub fn parse(classpath: &str) -> Self {
        Self::from_paths(std::env::split_paths(classpath))
    }

    /// Append a directory or archive
    ///
    /// Missing paths and unreadable archives are logged and skipped, the way
    /// a class loader ignores dead entries. Returns whether the entry was added.
    pub fn push(&mut self, path: &Path) -> bool {
        let path = match path.canonicalize() {
            Ok(path) => path,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping missing search path entry");
                return false;
            }
        };

        if path.is_dir() {
            debug!(path = %path.display(), "added directory to search path");
            self.entries.push(SearchEntry::Directory(path));
            return true;
        }

        match index_archive(&path) {
            Ok(entry) => {
                debug!(path = %path.display(), "added archive to search path");
                self.entries.push(entry);
                true
            }
            Err(reason) => {
                warn!(path = %path.display(), error = %reason, "skipping unreadable archive");
                false
            }
        }
    }

    /// Entries in search order
    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the search path has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceLookup for SearchPath {
    fn find_resource(&self, resource: &str) -> Option<Url> {
        self.entries.iter().find_map(|entry| entry.find(resource))
    }
}

fn index_archive(path: &Path) -> Result<SearchEntry, String> {
    let file = File::open(path).map_err(|err| err.to_string())?;
    let archive = zip::ZipArchive::new(file).map_err(|err| err.to_string())?;
    let entries = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(str::to_string)
        .collect();
    let url = Url::from_file_path(path).map_err(|()| "not an absolute path".to_string())?;
    Ok(SearchEntry::Archive {
        path: path.to_path_buf(),
        url,
        entries,
    })
}
