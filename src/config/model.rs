// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::action::TagValue;

/// Top-level manifest as read from a TOML file:
///
/// ```toml
/// [build]
/// root = "build"
/// jobs = 4
///
/// [action."obj/main.o"]
/// cmd = "cc -c -o %TARGET% %SOURCES%"
/// sources = ["main.c"]
///
/// [action."prog"]
/// cmd = "cc -o %TARGET% %SOURCES%"
/// sources = ["obj/main.o"]
///
/// [action."prog".tags]
/// pretty_name = "LD"
/// required = true
/// ```
///
/// Action keys are target paths relative to the build root. Sources that
/// name another action refer to that action's target; everything else is an
/// input file relative to the manifest's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// Global settings from `[build]`.
    #[serde(default)]
    pub build: BuildSection,

    /// All actions from `[action."<target>"]`.
    #[serde(default)]
    pub action: BTreeMap<String, ActionConfig>,
}

/// `[build]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Directory (relative to the manifest) under which targets are placed.
    #[serde(default = "default_root")]
    pub root: String,

    /// Optional tree name; when set, targets resolve under `<root>/<tree>`.
    #[serde(default)]
    pub tree: Option<String>,

    /// Worker pool size override. `--jobs` on the command line wins.
    #[serde(default)]
    pub jobs: Option<usize>,
}

fn default_root() -> String {
    "build".to_string()
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            root: default_root(),
            tree: None,
            jobs: None,
        }
    }
}

/// One `[action."<target>"]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    /// Shell command. `%TARGET%` and `%SOURCES%` expand to the resolved
    /// absolute target and the space-joined resolved sources.
    pub cmd: String,

    /// Dependency list: action names and/or input files.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Free-form tags forwarded to observers.
    #[serde(default)]
    pub tags: BTreeMap<String, TagValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_manifest_parses_with_defaults() {
        let manifest: Manifest = toml::from_str(
            r#"
            [action."a.o"]
            cmd = "cc -c a.c"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.build.root, "build");
        assert_eq!(manifest.build.tree, None);
        assert_eq!(manifest.action.len(), 1);
        assert!(manifest.action["a.o"].sources.is_empty());
    }

    #[test]
    fn tags_accept_mixed_value_types() {
        let manifest: Manifest = toml::from_str(
            r#"
            [action."prog"]
            cmd = "ld"
            sources = ["a.o"]

            [action."prog".tags]
            pretty_name = "LD"
            required = true
            weight = 3
            "#,
        )
        .unwrap();

        let tags = &manifest.action["prog"].tags;
        assert_eq!(tags["pretty_name"], TagValue::Str("LD".to_string()));
        assert_eq!(tags["required"], TagValue::Bool(true));
        assert_eq!(tags["weight"], TagValue::Int(3));
    }
}
