//! Integration tests for the classreach binary.
//!
//! Runs `classreach refs` and `classreach closure` against class trees
//! written into temporary directories.

use classreach_classfile::{ClassWriter, FieldSpec};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn classreach(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_classreach"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to spawn classreach")
}

fn write_class(root: &Path, internal: &str, refs: &[&str]) {
    let mut writer = ClassWriter::new(internal);
    for (i, reference) in refs.iter().enumerate() {
        writer.add_field(FieldSpec::new(format!("f{i}"), format!("L{reference};")));
    }
    let path = root.join(format!("{internal}.class"));
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, writer.into_bytes()).unwrap();
}

// ────────────────────────────────────────────────────────────────────────────
// refs
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_refs_prints_dependencies() {
    let temp = TempDir::new().unwrap();
    write_class(temp.path(), "com/acme/App", &["com/acme/Util", "java/lang/String"]);

    let output = classreach(&["refs", "com/acme/App.class"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "com.acme.Util\n");
}

#[test]
fn test_refs_rejects_garbage() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("Bad.class"), b"\xCA\xFE").unwrap();

    let output = classreach(&["refs", "Bad.class"], temp.path());
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bad.class"));
}

// ────────────────────────────────────────────────────────────────────────────
// closure
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_closure_json() {
    let temp = TempDir::new().unwrap();
    let classes = temp.path().join("classes");
    write_class(&classes, "com/acme/App", &["com/acme/Util"]);
    write_class(&classes, "com/acme/Util", &["com/acme/App"]);

    let output = classreach(
        &["closure", "--classpath", "classes", "--json", "com.acme.App"],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["modules"][0]["name"], "com.acme.App");
    assert_eq!(report["modules"][1]["name"], "com.acme.Util");
    assert_eq!(report["roots"].as_array().unwrap().len(), 1);
}

#[test]
fn test_closure_reads_config_from_working_directory() {
    let temp = TempDir::new().unwrap();
    let classes = temp.path().join("classes");
    write_class(&classes, "com/acme/App", &["com/acme/Util", "org/lib/Helper"]);
    write_class(&classes, "com/acme/Util", &[]);
    write_class(&classes, "org/lib/Helper", &[]);
    std::fs::write(
        temp.path().join("classreach.toml"),
        "[search]\nentries = [\"classes\"]\n\n[filter]\nexclude = [\"org.lib.\"]\n",
    )
    .unwrap();

    let output = classreach(&["closure", "com.acme.App"], temp.path());
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("com.acme.App\ncom.acme.Util\n\n"));
    assert!(!stdout.contains("org.lib.Helper"));
}

#[test]
fn test_closure_requires_a_seed() {
    let temp = TempDir::new().unwrap();
    let output = classreach(&["closure"], temp.path());
    assert!(!output.status.success());
}
