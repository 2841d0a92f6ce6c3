use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use markdown_convert_config::{Config, ConfigError, ConfigSourceKind, FlagLayer, LoadOptions};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

#[test]
fn loads_nothing_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir))
        .expect("load defaults");

    assert_eq!(config.flags, FlagLayer::default());
    assert!(config.sources.is_empty());
}

#[test]
fn applies_precedence_across_git_root_and_local() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".markdown-convert.toml"),
        r#"
        [output]
        latex = true
        css = "root.css"

        [bench]
        repeat = 5
        "#,
    );

    let nested = git_root.join("docs");
    fs::create_dir(&nested).expect("create docs");
    write_file(
        nested.join(".markdown-convert.toml"),
        r#"
        [output]
        latex = false

        [smartypants]
        enabled = false
        "#,
    );

    let config =
        Config::load(LoadOptions::default().with_working_dir(&nested)).expect("load layered");

    assert_eq!(config.flags.latex, Some(false));
    assert_eq!(config.flags.smartypants, Some(false));
    assert_eq!(config.flags.css.as_deref(), Some("root.css"));
    assert_eq!(config.flags.repeat, Some(5));

    let kinds: Vec<_> = config.sources.iter().map(|source| source.kind).collect();
    assert_eq!(kinds, vec![ConfigSourceKind::GitRoot, ConfigSourceKind::Local]);
}

#[test]
fn override_file_beats_local_file() {
    let temp = TempDir::new().expect("tempdir");
    let root = canonical(temp.path());

    write_file(root.join(".markdown-convert.toml"), "[output]\npage = false\n");
    write_file(
        root.join("custom.toml"),
        "[output]\npage = true\ntemplate = \"layout.html\"\n",
    );

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&root)
            .with_override_path("custom.toml"),
    )
    .expect("load override");

    assert_eq!(config.flags.page, Some(true));
    assert_eq!(config.flags.template, Some(root.join("layout.html")));
    assert_eq!(
        config.sources.last().map(|source| source.kind),
        Some(ConfigSourceKind::Override)
    );
}

#[test]
fn missing_override_is_an_error() {
    let temp = TempDir::new().expect("tempdir");
    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("absent.toml"),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn unknown_keys_are_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let root = canonical(temp.path());
    write_file(root.join(".markdown-convert.toml"), "[output]\nlatx = true\n");

    let err = Config::load(LoadOptions::default().with_working_dir(&root)).unwrap_err();
    match err {
        ConfigError::Parse { path, .. } => assert_eq!(path, root.join(".markdown-convert.toml")),
        other => panic!("expected parse error, got {other:?}"),
    }
}
