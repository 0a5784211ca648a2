// src/lib.rs

pub mod action;
pub mod cli;
pub mod config;
pub mod errors;
pub mod events;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod output;
pub mod paths;
pub mod scheduler;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::action::CommandPayload;
use crate::cli::CliArgs;
use crate::config::loader::{PlannedAction, load_and_validate, plan_actions, pretty_tag};
use crate::errors::Result;
use crate::events::{AbortFlag, EventBus};
use crate::fs::{FileSystem, RealFileSystem};
use crate::output::{ProgressObserver, RequiredCheckObserver};
use crate::paths::PathContext;
use crate::scheduler::{ActionManager, RunOptions, RunSummary};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - manifest loading and planning
/// - the event bus and console observers
/// - the action manager and worker pool
pub async fn run(args: CliArgs) -> Result<RunSummary> {
    let manifest_path = PathBuf::from(&args.manifest);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let manifest = load_and_validate(&manifest_path, fs.as_ref())?;

    let ctx = path_context(&manifest_path, &manifest.build.root, manifest.build.tree.clone());
    let planned = plan_actions(&manifest, &ctx);

    if args.dry_run {
        print_dry_run(&planned);
        return Ok(RunSummary::default());
    }

    let abort = AbortFlag::new();
    let mut bus = EventBus::new();
    bus.register(Box::new(ProgressObserver::new(planned.len())));
    bus.register(Box::new(RequiredCheckObserver::new(abort.clone())));

    let options = RunOptions {
        force: args.force,
        jobs: args.jobs.or(manifest.build.jobs),
    };

    let mut manager = ActionManager::new(options, bus, abort, Arc::clone(&fs));

    for action in planned {
        if !args.clean {
            // Commands assume their target directory exists.
            if let Some(parent) = action.target.absolute.parent() {
                fs.create_dir_all(parent)?;
            }
        }
        manager.submit(
            action.target.id(),
            action.sources,
            CommandPayload::Shell(action.command),
            action.tags,
        )?;
    }

    if args.clean {
        let removed = manager.clean();
        info!(removed, "clean finished");
        return Ok(RunSummary::default());
    }

    let summary = manager.run().await?;
    info!(
        executed = summary.executed,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        "build finished"
    );
    Ok(summary)
}

/// Resolution context rooted at the manifest's directory.
///
/// - A manifest at "proj/Buildfile.toml" resolves sources under "proj/"
///   and targets under "proj/<root>".
/// - A bare filename falls back to the current working directory.
fn path_context(manifest_path: &Path, root: &str, tree: Option<String>) -> PathContext {
    let script_dir = match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let build_root = script_dir.join(root);

    let ctx = PathContext::new(script_dir, build_root);
    match tree {
        Some(tree) => ctx.with_tree(tree),
        None => ctx,
    }
}

/// Simple dry-run output: print planned actions, sources and commands.
fn print_dry_run(planned: &[PlannedAction]) {
    println!("buildag dry-run");
    println!();
    println!("actions ({}):", planned.len());

    for action in planned {
        match pretty_tag(&action.tags) {
            Some(name) => println!("  - {} ({})", action.target, name),
            None => println!("  - {}", action.target),
        }
        println!("      cmd: {}", action.command);
        if !action.sources.is_empty() {
            println!("      sources: {:?}", action.sources);
        }
    }

    debug!("dry-run complete (no execution)");
}
