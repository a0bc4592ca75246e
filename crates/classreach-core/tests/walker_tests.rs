//! Integration tests for the dependency walker
//!
//! Uses an in-memory locator so each test spells out its reference graph.

use classreach_classfile::{ClassWriter, FieldSpec, ReferenceExtractor};
use classreach_core::{
    find_dependencies, Acceptor, ContentError, Decision, DependencyWalker, LocateError, ModuleLocation,
    ModuleLocator, ModuleName, WalkError,
};
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

/// Class file for `name` holding one field per referenced class
fn class_bytes(name: &str, refs: &[&str]) -> Vec<u8> {
    let mut writer = ClassWriter::new(&name.replace('.', "/"));
    for (i, reference) in refs.iter().enumerate() {
        let desc = format!("L{};", reference.replace('.', "/"));
        writer.add_field(FieldSpec::new(format!("f{i}"), desc));
    }
    writer.into_bytes()
}

#[derive(Default)]
struct MemoryLocator {
    urls: HashMap<String, Url>,
    content: HashMap<Url, Vec<u8>>,
    located: RefCell<Vec<String>>,
}

impl MemoryLocator {
    fn class(mut self, name: &str, refs: &[&str]) -> Self {
        let url = Url::parse(&format!("file:///mem/{}", ModuleName::new(name).resource_path()))
            .unwrap();
        self.content.insert(url.clone(), class_bytes(name, refs));
        self.urls.insert(name.to_string(), url);
        self
    }

    fn raw(mut self, name: &str, url: &str, bytes: Option<Vec<u8>>) -> Self {
        let url = Url::parse(url).unwrap();
        if let Some(bytes) = bytes {
            self.content.insert(url.clone(), bytes);
        }
        self.urls.insert(name.to_string(), url);
        self
    }
}

impl ModuleLocator for MemoryLocator {
    fn locate(&self, name: &ModuleName) -> Result<Option<ModuleLocation>, LocateError> {
        self.located.borrow_mut().push(name.to_string());
        match self.urls.get(name.as_str()) {
            Some(url) => ModuleLocation::resolve(name, url.clone()).map(Some),
            None => Ok(None),
        }
    }

    fn read(&self, location: &ModuleLocation) -> Result<Vec<u8>, ContentError> {
        self.content
            .get(location.content())
            .cloned()
            .ok_or_else(|| ContentError::UnsupportedUrl(location.content().clone()))
    }
}

/// Run a traversal, returning the names the acceptor saw
fn walk(
    locator: &MemoryLocator,
    seeds: &[&str],
    expand: impl Fn(&str) -> bool,
) -> (Vec<String>, Result<(), WalkError>) {
    let mut seen = Vec::new();
    let mut acceptor = |name: &ModuleName, _: &ModuleLocation| {
        seen.push(name.to_string());
        expand(name.as_str())
    };
    let result = DependencyWalker::new(locator).traverse(seeds.iter().copied(), &mut acceptor);
    (seen, result)
}

#[test]
fn test_breadth_first_order() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.C"])
        .class("a.B", &["a.D"])
        .class("a.C", &[])
        .class("a.D", &[]);

    let (seen, result) = walk(&locator, &["a.A"], |_| true);
    result.unwrap();
    assert_eq!(seen, vec!["a.A", "a.B", "a.C", "a.D"]);
}

#[test]
fn test_stopped_module_is_not_expanded() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.C"])
        .class("a.B", &["a.D"])
        .class("a.C", &[])
        .class("a.D", &[]);

    let (seen, result) = walk(&locator, &["a.A"], |name| name != "a.B");
    result.unwrap();
    assert_eq!(seen, vec!["a.A", "a.B", "a.C"]);
    assert!(!locator.located.borrow().contains(&"a.D".to_string()));
}

#[test]
fn test_unresolvable_module_is_skipped() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.C"])
        .class("a.B", &["a.D"])
        .class("a.D", &[]);

    let (seen, result) = walk(&locator, &["a.A"], |_| true);
    result.unwrap();
    assert_eq!(seen, vec!["a.A", "a.B", "a.D"]);
    assert!(locator.located.borrow().contains(&"a.C".to_string()));
}

#[test]
fn test_unsupported_location_aborts() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.C"])
        .raw(
            "a.B",
            "http://repo.example/a/B.class",
            Some(class_bytes("a.B", &[])),
        )
        .class("a.C", &[]);

    let (seen, result) = walk(&locator, &["a.A"], |_| true);
    assert_eq!(seen, vec!["a.A"]);
    match result {
        Err(WalkError::Locate(LocateError::UnsupportedLocationKind(url))) => {
            assert_eq!(url.scheme(), "http");
        }
        other => panic!("expected unsupported location, got {other:?}"),
    }
    assert!(!locator.located.borrow().contains(&"a.C".to_string()));
}

#[test]
fn test_cycles_terminate_and_dedup() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.A"])
        .class("a.B", &["a.C", "a.A"])
        .class("a.C", &["a.B", "a.A"]);

    let (seen, result) = walk(&locator, &["a.A"], |_| true);
    result.unwrap();
    assert_eq!(seen, vec!["a.A", "a.B", "a.C"]);
    assert_eq!(locator.located.borrow().len(), 3);
}

#[test]
fn test_duplicate_seeds_collapse() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B"])
        .class("a.B", &[]);

    let (seen, result) = walk(&locator, &["a.B", "a.A", "a.B"], |_| true);
    result.unwrap();
    assert_eq!(seen, vec!["a.B", "a.A"]);
}

#[test]
fn test_malformed_module_aborts() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B", "a.C"])
        .raw("a.B", "file:///mem/a/B.class", Some(b"garbage".to_vec()))
        .class("a.C", &[]);

    let (seen, result) = walk(&locator, &["a.A"], |_| true);
    assert_eq!(seen, vec!["a.A", "a.B"]);
    match result {
        Err(WalkError::MalformedModule { module, .. }) => assert_eq!(module.as_str(), "a.B"),
        other => panic!("expected malformed module, got {other:?}"),
    }
}

#[test]
fn test_unreadable_module_aborts() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B"])
        .raw("a.B", "file:///mem/a/B.class", None);

    let (_, result) = walk(&locator, &["a.A"], |_| true);
    assert!(matches!(
        result,
        Err(WalkError::ContentRead { module, .. }) if module.as_str() == "a.B"
    ));
}

#[test]
fn test_stopped_module_is_never_read() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B"])
        .raw("a.B", "file:///mem/a/B.class", Some(b"garbage".to_vec()));

    let (seen, result) = walk(&locator, &["a.A"], |name| name == "a.A");
    result.unwrap();
    assert_eq!(seen, vec!["a.A", "a.B"]);
}

#[test]
fn test_platform_names_are_never_located() {
    let locator = MemoryLocator::default()
        .class("a.A", &["java.util.List", "org.lib.Helper", "a.B"])
        .class("a.B", &[]);

    let walker = DependencyWalker::with_extractor(
        &locator,
        ReferenceExtractor::with_platform_prefixes(["java.", "org.lib."]),
    );
    let mut acceptor = |_: &ModuleName, _: &ModuleLocation| true;
    walker.traverse(["a.A"], &mut acceptor).unwrap();

    assert_eq!(*locator.located.borrow(), vec!["a.A", "a.B"]);
}

/// Acceptor that expands everything and counts its calls
#[derive(Default)]
struct Counting {
    calls: usize,
}

impl Acceptor for Counting {
    fn decide(&mut self, _: &ModuleName, _: &ModuleLocation) -> Decision {
        self.calls += 1;
        Decision::Expand
    }
}

#[test]
fn test_walker_is_reusable() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B"])
        .class("a.B", &[]);
    let walker = DependencyWalker::new(&locator);

    for _ in 0..2 {
        let mut acceptor = Counting::default();
        walker.traverse(["a.A"], &mut acceptor).unwrap();
        assert_eq!(acceptor.calls, 2);
    }
}

#[test]
fn test_find_dependencies_entry_point() {
    let locator = MemoryLocator::default()
        .class("a.A", &["a.B"])
        .class("a.B", &[]);

    let mut names = Vec::new();
    let mut acceptor = |name: &ModuleName, location: &ModuleLocation| {
        assert_eq!(location.packaging_root().as_str(), "file:///mem");
        names.push(name.clone());
        true
    };
    find_dependencies(&locator, vec![ModuleName::new("a.A")], &mut acceptor).unwrap();
    assert_eq!(names, vec![ModuleName::new("a.A"), ModuleName::new("a.B")]);
}
