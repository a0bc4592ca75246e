//! `classreach refs`: list the classes one class file refers to.

use anyhow::{Context, Result};
use clap::Args;
use classreach_classfile::ReferenceExtractor;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RefsArgs {
    /// Class file to inspect
    pub file: PathBuf,

    /// Prefix of platform classes to ignore (repeatable; replaces the default "java.")
    #[arg(long = "platform-prefix")]
    pub platform_prefixes: Vec<String>,

    /// Print the references as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(args: &RefsArgs) -> Result<()> {
    let stdout = std::io::stdout();
    run(args, &mut stdout.lock())
}

pub fn run(args: &RefsArgs, out: &mut impl Write) -> Result<()> {
    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let extractor = if args.platform_prefixes.is_empty() {
        ReferenceExtractor::new()
    } else {
        ReferenceExtractor::with_platform_prefixes(&args.platform_prefixes)
    };
    let refs = extractor
        .extract(&bytes)
        .with_context(|| format!("failed to parse {}", args.file.display()))?;

    if args.json {
        let value = serde_json::json!({
            "module": refs.this_module(),
            "dependencies": refs.dependencies().collect::<Vec<_>>(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    } else {
        for name in refs.dependencies() {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use classreach_classfile::{ClassWriter, FieldSpec, MethodSpec};
    use tempfile::TempDir;

    fn sample(temp: &TempDir) -> PathBuf {
        let mut writer = ClassWriter::new("com/acme/App");
        writer.add_field(FieldSpec::new("util", "Lcom/acme/Util;"));
        writer.add_field(FieldSpec::new("names", "Ljava/util/List;"));
        writer.add_method(MethodSpec::new("run", "(Lorg/lib/Helper;)V"));
        let path = temp.path().join("App.class");
        std::fs::write(&path, writer.into_bytes()).unwrap();
        path
    }

    fn args(file: PathBuf) -> RefsArgs {
        RefsArgs {
            file,
            platform_prefixes: Vec::new(),
            json: false,
        }
    }

    #[test]
    fn test_lists_dependencies() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        run(&args(sample(&temp)), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert!(lines.contains(&"com.acme.Util"));
        assert!(lines.contains(&"org.lib.Helper"));
        assert!(!lines.contains(&"java.util.List"));
        assert!(!lines.contains(&"com.acme.App"));
    }

    #[test]
    fn test_custom_prefixes_and_json() {
        let temp = TempDir::new().unwrap();
        let mut refs = args(sample(&temp));
        refs.platform_prefixes = vec!["org.lib.".to_string()];
        refs.json = true;

        let mut out = Vec::new();
        run(&refs, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["module"], "com.acme.App");

        let deps: Vec<_> = value["dependencies"]
            .as_array()
            .unwrap()
            .iter()
            .map(|dep| dep.as_str().unwrap())
            .collect();
        assert!(deps.contains(&"java.util.List"));
        assert!(!deps.contains(&"org.lib.Helper"));
    }

    #[test]
    fn test_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let err = run(&args(temp.path().join("Nope.class")), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Nope.class"));
    }
}
