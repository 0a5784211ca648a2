// src/config/validate.rs

use anyhow::{Context, Result, anyhow};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::Manifest;

/// Run basic semantic validation against a loaded manifest.
///
/// This checks:
/// - there is at least one action
/// - no action lists itself as a source
/// - `jobs`, if set, is at least 1
/// - the declared action graph has no cycles
///
/// Sources that do not name another action are input files and are *not*
/// validated here; a missing input surfaces when its command runs. The
/// engine repeats the cycle check at run time, but failing fast on a
/// malformed manifest gives a much better error than a mid-build abort.
pub fn validate_manifest(manifest: &Manifest) -> Result<()> {
    ensure_has_actions(manifest)?;
    validate_build_section(manifest)?;
    validate_self_references(manifest)?;
    validate_acyclic(manifest)?;
    Ok(())
}

fn ensure_has_actions(manifest: &Manifest) -> Result<()> {
    if manifest.action.is_empty() {
        return Err(anyhow!(
            "manifest must contain at least one [action.\"<target>\"] table"
        ));
    }
    Ok(())
}

fn validate_build_section(manifest: &Manifest) -> Result<()> {
    if manifest.build.jobs == Some(0) {
        return Err(anyhow!("[build].jobs must be >= 1 (got 0)"));
    }
    if manifest.build.root.is_empty() {
        return Err(anyhow!("[build].root must not be empty"));
    }
    Ok(())
}

fn validate_self_references(manifest: &Manifest) -> Result<()> {
    for (name, action) in manifest.action.iter() {
        if action.sources.iter().any(|src| src == name) {
            return Err(anyhow!(
                "action '{}' cannot list itself in `sources`",
                name
            ));
        }
    }
    Ok(())
}

fn validate_acyclic(manifest: &Manifest) -> Result<()> {
    // Edge direction: source action -> dependent action, so a topological
    // sort fails exactly when the declared graph is cyclic.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in manifest.action.keys() {
        graph.add_node(name.as_str());
    }

    for (name, action) in manifest.action.iter() {
        for src in action.sources.iter() {
            if manifest.action.contains_key(src) {
                graph.add_edge(src.as_str(), name.as_str(), ());
            }
        }
    }

    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| anyhow!("dependency cycle involving action '{}'", cycle.node_id()))
        .context("manifest action graph must be acyclic")
}
