// Configuration loader - some methods reserved for future use
#![allow(dead_code)]

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sweep::SweepOptions;

/// Configuration for a reduction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    /// Explicit entry points: qualified callable signatures
    /// (`com.example.Main#main(java.lang.String[])`) or type names
    pub entry_points: Vec<String>,

    /// Patterns to retain regardless of reachability
    pub retain_patterns: Vec<String>,

    /// Replace dummy bodies with marker throws; when false, dummies
    /// silently return default values
    pub assertions_enabled: bool,

    /// Message carried by marker throws
    pub marker_message: String,

    /// Upper bound on mark+sweep rounds when convergence is slow
    pub max_passes: usize,

    /// Process compilation units in parallel
    pub parallel: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            entry_points: vec![],
            retain_patterns: vec![],
            assertions_enabled: true,
            marker_message: "unreachable code removed during reduction".to_string(),
            max_passes: 10,
            parallel: true,
        }
    }
}

impl ReducerConfig {
    /// Load configuration from a file (TOML, YAML, or JSON by extension)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "json" => serde_json::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse JSON config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try TOML first, then YAML
                if let Ok(config) = toml::from_str(&contents) {
                    Ok(config)
                } else {
                    serde_yaml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations, searching upward
    /// from the project root
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            "javatrim.toml",
            "javatrim.yml",
            "javatrim.yaml",
            "javatrim.json",
            ".javatrim.toml",
            ".javatrim.yml",
        ];

        let mut dir = Some(project_root);
        while let Some(current) = dir {
            for name in &default_names {
                let path = current.join(name);
                if path.exists() {
                    return Self::from_file(&path);
                }
            }
            dir = current.parent();
        }

        // No config file found, use defaults
        Ok(Self::default())
    }

    /// Check if a declaration should be retained by name
    pub fn should_retain(&self, name: &str) -> bool {
        self.retain_patterns.iter().any(|p| glob_match(p, name))
    }

    pub fn is_entry_point(&self, signature: &str) -> bool {
        self.entry_points.iter().any(|e| e == signature)
    }

    pub fn sweep_options(&self) -> SweepOptions {
        SweepOptions {
            assertions_enabled: self.assertions_enabled,
            marker_message: self.marker_message.clone(),
        }
    }
}

/// Simple glob matching for patterns like "*Test" or "com.example.**"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.ends_with("**") {
        let prefix = pattern.trim_end_matches("**").trim_end_matches('.');
        return text.starts_with(prefix);
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        return text.ends_with(suffix);
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return text.starts_with(prefix);
    }

    text == pattern
}
