//! Runs the `ktfix` binary against temporary projects.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn ktfix(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ktfix"))
        .args(args)
        .current_dir(dir)
        .env("KTFIX_CONFIG_DIR", dir.join("no-global"))
        .output()
        .expect("ktfix runs")
}

fn project(source: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".ktfix.toml"), "root = true\n").unwrap();
    fs::write(tmp.path().join("Main.kt"), source).unwrap();
    tmp
}

#[test]
fn lint_reports_and_fails() {
    let tmp = project("@Foo @Bar class FooBar { }\n");
    let output = ktfix(tmp.path(), &["lint", "--reporter", "compact"]);

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Main.kt:1:10: [standard:annotation]"), "{stdout}");
    assert!(stdout.contains("Main.kt:1:25: [standard:no-empty-block-whitespace]"), "{stdout}");
}

#[test]
fn lint_passes_on_clean_code() {
    let tmp = project("class A {}\n");
    let output = ktfix(tmp.path(), &["lint"]);
    assert!(output.status.success());
}

#[test]
fn format_rewrites_files() {
    let tmp = project("@Foo @Bar class FooBar { }\n");
    let output = ktfix(tmp.path(), &["format"]);

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(tmp.path().join("Main.kt")).unwrap(),
        "@Foo @Bar\nclass FooBar {}\n"
    );
}

#[test]
fn dry_run_leaves_files_alone() {
    let tmp = project("class A { }\n");
    let output = ktfix(tmp.path(), &["format", "--dry-run"]);

    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(tmp.path().join("Main.kt")).unwrap(),
        "class A { }\n"
    );
}

#[test]
fn properties_disable_rules() {
    let tmp = project("class A { }\n");
    let output = ktfix(
        tmp.path(),
        &["lint", "-P", "ktfix_standard_no-empty-block-whitespace=disabled"],
    );
    assert!(output.status.success());
}

#[test]
fn init_creates_a_property_file() {
    let tmp = TempDir::new().unwrap();
    let output = ktfix(tmp.path(), &["init"]);

    assert!(output.status.success());
    assert!(tmp.path().join(".ktfix.toml").exists());
    assert!(!ktfix(tmp.path(), &["init"]).status.success());
}
