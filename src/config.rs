use bevy::log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::locate::SearchMethod;

pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// Tunables for type resolution, suggestions and find-instructions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Module path prefixes whose types only resolve when no runtime type matches.
    pub tooling_modules: Vec<String>,
    /// Crate name suffixes that also mark a crate as tooling.
    pub tooling_crate_suffixes: Vec<String>,
    pub max_suggestions: usize,
    pub default_search_method: SearchMethod,
    /// Leading marker of dynamically named slots on slot carriers.
    pub slot_prefix: String,
    pub include_inactive: bool,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            tooling_modules: vec!["bevy_dev_tools".to_string(), "bevy_remote".to_string()],
            tooling_crate_suffixes: vec!["_editor".to_string(), "_dev_tools".to_string()],
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            default_search_method: SearchMethod::ByIdOrNameOrPath,
            slot_prefix: "_".to_string(),
            include_inactive: true,
        }
    }
}

impl InspectorConfig {
    pub fn from_json_str(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }

    /// Reads the file named by `AXIOM_INSPECT_CONFIG` (default `inspect.json`),
    /// then applies environment overrides. Missing files fall back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("AXIOM_INSPECT_CONFIG")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "inspect.json".to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json_str(&contents) {
                Ok(cfg) => {
                    info!("[Axiom inspect] Loaded inspector config from {path}");
                    cfg
                }
                Err(err) => {
                    warn!("[Axiom inspect] Failed to parse {path}: {err}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };
        config.max_suggestions = env_usize("AXIOM_INSPECT_MAX_SUGGESTIONS", config.max_suggestions);
        config
    }

    /// Whether a type declared in `module_path` belongs to the tooling tier.
    pub fn is_tooling_module(&self, module_path: &str) -> bool {
        let crate_name = module_path.split("::").next().unwrap_or(module_path);
        self.tooling_crate_suffixes
            .iter()
            .any(|suffix| crate_name.ends_with(suffix.as_str()))
            || self.tooling_modules.iter().any(|prefix| {
                module_path == prefix
                    || module_path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with("::"))
            })
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = InspectorConfig::from_json_str(r#"{ "max_suggestions": 5 }"#)
            .expect("config should parse");
        assert_eq!(cfg.max_suggestions, 5);
        assert_eq!(cfg.slot_prefix, "_");
        assert_eq!(cfg.default_search_method, SearchMethod::ByIdOrNameOrPath);
    }

    #[test]
    fn search_method_parses_snake_case() {
        let cfg = InspectorConfig::from_json_str(r#"{ "default_search_method": "by_path" }"#)
            .expect("config should parse");
        assert_eq!(cfg.default_search_method, SearchMethod::ByPath);
    }

    #[test]
    fn tooling_modules_match_on_path_boundaries() {
        let cfg = InspectorConfig {
            tooling_modules: vec!["game::debug".to_string()],
            ..Default::default()
        };
        assert!(cfg.is_tooling_module("game::debug"));
        assert!(cfg.is_tooling_module("game::debug::gizmos"));
        assert!(!cfg.is_tooling_module("game::debugger"));
        assert!(!cfg.is_tooling_module("game::movement"));
        assert!(cfg.is_tooling_module("level_editor::panels"));
        assert!(cfg.is_tooling_module("bevy_dev_tools::fps_overlay"));
    }
}
