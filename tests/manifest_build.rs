// tests/manifest_build.rs

//! End-to-end: a real manifest, real shell commands, real timestamps.

#![cfg(unix)]

use std::error::Error;
use std::fs;
use std::path::Path;

use buildag::cli::CliArgs;
use buildag_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

const MANIFEST: &str = r#"
[build]
root = "out"
jobs = 2

[action."a.txt"]
cmd = "printf hello > %TARGET%"
sources = ["in.txt"]

[action."b.txt"]
cmd = "cat %SOURCES% > %TARGET%"
sources = ["a.txt"]

[action."b.txt".tags]
pretty_name = "CAT"
"#;

fn args_for(manifest: &Path) -> CliArgs {
    CliArgs {
        manifest: manifest.to_string_lossy().into_owned(),
        jobs: None,
        force: false,
        clean: false,
        dry_run: false,
        log_level: None,
    }
}

#[tokio::test]
async fn manifest_chain_builds_and_is_idempotent() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let manifest_path = dir.path().join("Buildfile.toml");
    fs::write(&manifest_path, MANIFEST)?;
    fs::write(dir.path().join("in.txt"), "input\n")?;

    let summary = with_timeout(buildag::run(args_for(&manifest_path))).await?;
    assert_eq!(summary.executed, 2);
    assert!(summary.all_succeeded());

    let b = dir.path().join("out/b.txt");
    assert_eq!(fs::read_to_string(&b)?, "hello");

    // Unchanged project: the second invocation executes nothing.
    let summary = with_timeout(buildag::run(args_for(&manifest_path))).await?;
    assert_eq!(summary.executed, 0);
    assert_eq!(summary.skipped, 2);

    Ok(())
}

#[tokio::test]
async fn clean_removes_registered_targets() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let manifest_path = dir.path().join("Buildfile.toml");
    fs::write(&manifest_path, MANIFEST)?;
    fs::write(dir.path().join("in.txt"), "input\n")?;

    with_timeout(buildag::run(args_for(&manifest_path))).await?;
    assert!(dir.path().join("out/a.txt").exists());

    let mut clean_args = args_for(&manifest_path);
    clean_args.clean = true;
    with_timeout(buildag::run(clean_args)).await?;

    assert!(!dir.path().join("out/a.txt").exists());
    assert!(!dir.path().join("out/b.txt").exists());

    Ok(())
}

#[tokio::test]
async fn force_rebuilds_an_up_to_date_project() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let manifest_path = dir.path().join("Buildfile.toml");
    fs::write(&manifest_path, MANIFEST)?;
    fs::write(dir.path().join("in.txt"), "input\n")?;

    with_timeout(buildag::run(args_for(&manifest_path))).await?;

    let mut force_args = args_for(&manifest_path);
    force_args.force = true;
    let summary = with_timeout(buildag::run(force_args)).await?;

    assert_eq!(summary.executed, 2);
    assert_eq!(summary.skipped, 0);

    Ok(())
}

#[tokio::test]
async fn failing_command_is_reported_in_the_summary() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let manifest_path = dir.path().join("Buildfile.toml");
    fs::write(
        &manifest_path,
        r#"
        [action."broken"]
        cmd = "exit 3"
        "#,
    )?;

    let summary = with_timeout(buildag::run(args_for(&manifest_path))).await?;
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].ends_with("broken"));

    Ok(())
}
