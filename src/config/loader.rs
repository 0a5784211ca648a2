// src/config/loader.rs

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::action::{TagValue, Tags, TargetId};
use crate::config::model::Manifest;
use crate::config::validate::validate_manifest;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::paths::{PathContext, SourcePath, TargetPath};

/// Load a manifest from a path and run semantic validation.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: &Path, fs: &dyn FileSystem) -> Result<Manifest> {
    let contents = fs.read_to_string(path)?;
    let manifest: Manifest = toml::from_str(&contents)?;
    validate_manifest(&manifest)?;
    Ok(manifest)
}

/// One manifest action after path resolution, ready for submission.
#[derive(Debug, Clone)]
pub struct PlannedAction {
    pub target: TargetPath,
    pub sources: Vec<TargetId>,
    pub command: String,
    pub tags: Tags,
}

/// Resolve every manifest action against the given path context.
///
/// - Action keys become [`TargetPath`]s under the build root.
/// - A source naming another action resolves to that action's target; any
///   other source is an input file relative to the manifest's directory.
/// - `%TARGET%` and `%SOURCES%` placeholders in commands are expanded to
///   the resolved absolute forms, and embedded newlines are flattened so
///   multi-line TOML strings stay valid shell input.
pub fn plan_actions(manifest: &Manifest, ctx: &PathContext) -> Vec<PlannedAction> {
    // First pass: every action's resolved target, so sources can refer to
    // actions in any declaration order.
    let targets: HashMap<&str, TargetPath> = manifest
        .action
        .keys()
        .map(|name| (name.as_str(), TargetPath::new(name, ctx)))
        .collect();

    let mut planned = Vec::with_capacity(manifest.action.len());

    for (name, config) in manifest.action.iter() {
        let target = targets[name.as_str()].clone();

        let sources: Vec<TargetId> = config
            .sources
            .iter()
            .map(|src| match targets.get(src.as_str()) {
                Some(target) => target.id(),
                None => SourcePath::new(src, ctx).id(),
            })
            .collect();

        let command = expand_command(&config.cmd, &target.id(), &sources);

        let tags: Tags = config
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        debug!(target = %target, cmd = %command, "planned action");
        planned.push(PlannedAction {
            target,
            sources,
            command,
            tags,
        });
    }

    planned
}

fn expand_command(cmd: &str, target: &str, sources: &[TargetId]) -> String {
    cmd.replace("%TARGET%", target)
        .replace("%SOURCES%", &sources.join(" "))
        .replace(['\n', '\r'], " ")
}

/// Convenience used by dry-run output.
pub fn pretty_tag(tags: &Tags) -> Option<&str> {
    match tags.get("pretty_name") {
        Some(TagValue::Str(s)) => Some(s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn ctx() -> PathContext {
        PathContext::new("/proj", "/proj/build")
    }

    fn parse(toml: &str) -> Manifest {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn sources_naming_actions_resolve_to_their_targets() {
        let manifest = parse(
            r#"
            [action."obj/a.o"]
            cmd = "cc -c -o %TARGET% %SOURCES%"
            sources = ["a.c"]

            [action."prog"]
            cmd = "cc -o %TARGET% %SOURCES%"
            sources = ["obj/a.o"]
            "#,
        );

        let planned = plan_actions(&manifest, &ctx());
        let prog = planned
            .iter()
            .find(|p| p.target.relative == PathBuf::from("prog"))
            .unwrap();

        assert_eq!(prog.sources, vec!["/proj/build/obj/a.o".to_string()]);

        let obj = planned
            .iter()
            .find(|p| p.target.relative == PathBuf::from("obj/a.o"))
            .unwrap();
        assert_eq!(obj.sources, vec!["/proj/a.c".to_string()]);
    }

    #[test]
    fn placeholders_expand_to_absolute_paths() {
        let manifest = parse(
            r#"
            [action."a.o"]
            cmd = "cc -c -o %TARGET% %SOURCES%"
            sources = ["a.c"]
            "#,
        );

        let planned = plan_actions(&manifest, &ctx());
        assert_eq!(
            planned[0].command,
            "cc -c -o /proj/build/a.o /proj/a.c"
        );
    }

    #[test]
    fn multiline_commands_are_flattened() {
        let manifest = parse(
            "[action.\"a\"]\ncmd = \"\"\"echo one\necho two\"\"\"\n",
        );
        let planned = plan_actions(&manifest, &ctx());
        assert!(!planned[0].command.contains('\n'));
    }

    #[test]
    fn tree_prefix_applies_to_targets() {
        let manifest = parse(
            r#"
            [action."a.o"]
            cmd = "cc"
            "#,
        );
        let ctx = PathContext::new("/proj", "/proj/build").with_tree("debug");
        let planned = plan_actions(&manifest, &ctx);
        assert_eq!(planned[0].target.id(), "/proj/build/debug/a.o");
    }
}
