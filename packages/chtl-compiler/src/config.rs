//! Configuration keys (spec §6.4) and the typed compiler configuration that
//! CLI flags, project files, and in-source `[Configuration]` blocks all feed
//! into (spec §10.3 in SPEC_FULL.md).

use crate::error::{CompileError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;

/// The fixed, non-keyword configuration keys spec §6.4 names.
pub const KNOWN_KEYS: &[&str] = &[
    "DEBUG_MODE",
    "INDEX_INITIAL_COUNT",
    "OPTION_COUNT",
    "DISABLE_NAME_GROUP",
    "DISABLE_STYLE_AUTO_ADD_CLASS",
    "DISABLE_STYLE_AUTO_ADD_ID",
    "DISABLE_DEFAULT_NAMESPACE",
    "DISABLE_CUSTOM_ORIGIN_TYPE",
    "DISABLE_SCRIPT_AUTO_ADD_CLASS",
    "DISABLE_SCRIPT_AUTO_ADD_ID",
];

/// A `[Configuration]` block's raw contents: known keys typed, `KEYWORD_*`
/// rebindings kept as a lookup table, and anything else passed through
/// (values are parsed as strings but interpreted per-key, per spec §6.4).
#[derive(Debug, Clone)]
pub struct Configuration {
    raw: IndexMap<String, String>,
    /// `KEYWORD_INHERIT` -> "extends", etc. Indirects the lexer's keyword
    /// table (spec §4.2).
    pub keyword_rebindings: HashMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            raw: IndexMap::new(),
            keyword_rebindings: HashMap::new(),
        }
    }
}

impl Configuration {
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(name) = key.strip_prefix("KEYWORD_") {
            self.keyword_rebindings.insert(name.to_string(), value.clone());
        }
        self.raw.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    pub fn bool_flag(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(v) => matches!(v.trim(), "true" | "1" | "yes"),
            None => default,
        }
    }

    pub fn int_value(&self, key: &str, default: i64) -> i64 {
        self.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
    }

    /// Rebind a keyword spelling, e.g. `inherit` -> user-chosen spelling.
    /// Returns the configured spelling, or `default` if unset.
    pub fn keyword<'a>(&'a self, canonical: &str, default: &'a str) -> &'a str {
        self.keyword_rebindings
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(default)
    }

    /// In strict mode, reject keys that are neither a known key nor a
    /// `KEYWORD_*` rebinding (spec §7 `Config` error kind).
    pub fn validate_strict(&self) -> Result<()> {
        for key in self.raw.keys() {
            if KNOWN_KEYS.contains(&key.as_str()) || key.starts_with("KEYWORD_") {
                continue;
            }
            return Err(CompileError::Config(crate::parse_util::Diagnostic::error(
                "unknown-configuration-key",
                format!("unknown configuration key `{key}`"),
                None,
            )));
        }
        Ok(())
    }

    pub fn disable_style_auto_add_class(&self) -> bool {
        self.bool_flag("DISABLE_STYLE_AUTO_ADD_CLASS", false)
    }

    pub fn disable_style_auto_add_id(&self) -> bool {
        self.bool_flag("DISABLE_STYLE_AUTO_ADD_ID", false)
    }

    pub fn disable_script_auto_add_class(&self) -> bool {
        self.bool_flag("DISABLE_SCRIPT_AUTO_ADD_CLASS", false)
    }

    pub fn disable_script_auto_add_id(&self) -> bool {
        self.bool_flag("DISABLE_SCRIPT_AUTO_ADD_ID", false)
    }

    pub fn disable_default_namespace(&self) -> bool {
        self.bool_flag("DISABLE_DEFAULT_NAMESPACE", false)
    }

    pub fn disable_custom_origin_type(&self) -> bool {
        self.bool_flag("DISABLE_CUSTOM_ORIGIN_TYPE", false)
    }

    pub fn disable_name_group(&self) -> bool {
        self.bool_flag("DISABLE_NAME_GROUP", false)
    }

    pub fn debug_mode(&self) -> bool {
        self.bool_flag("DEBUG_MODE", false)
    }

    pub fn index_initial_count(&self) -> i64 {
        self.int_value("INDEX_INITIAL_COUNT", 0)
    }
}

/// Merge options for the code merger (spec §4.9).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub inline_css: bool,
    pub inline_js: bool,
    pub minify_html: bool,
    pub minify_css: bool,
    pub minify_js: bool,
    pub preserve_comments: bool,
    pub output_sourcemaps: bool,
    pub separate_files: bool,
    pub css_path: Option<String>,
    pub js_path: Option<String>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            inline_css: true,
            inline_js: true,
            minify_html: false,
            minify_css: false,
            minify_js: false,
            preserve_comments: true,
            output_sourcemaps: false,
            separate_files: false,
            css_path: None,
            js_path: None,
        }
    }
}

/// The typed, merged compiler configuration threaded through the pipeline
/// (defaults, project `chtl.toml`, CLI flags, in-source `[Configuration]`,
/// in that precedence order — later layers win).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub debug: bool,
    pub strict: bool,
    pub module_paths: Vec<std::path::PathBuf>,
    pub merge: MergeOptions,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            debug: false,
            strict: false,
            module_paths: Vec::new(),
            merge: MergeOptions::default(),
        }
    }
}

/// A project's `chtl.toml` (SPEC_FULL §10.3): the `build` subcommand's
/// module search path, source include list, default output location and
/// merge options, read once at startup and folded into a [`CompilerConfig`].
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub module_paths: Vec<std::path::PathBuf>,
    pub include: Vec<std::path::PathBuf>,
    pub output: Option<std::path::PathBuf>,
    pub merge: MergeOptions,
}

impl ProjectConfig {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CompileError::io(format!("cannot read `{}`: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| {
            CompileError::Config(crate::parse_util::Diagnostic::error(
                "invalid-project-config",
                format!("`{}`: {e}", path.display()),
                None,
            ))
        })
    }

    /// Folds this project file into `config`, CLI flags still winning over
    /// anything set here (SPEC_FULL §10.3's precedence order).
    pub fn apply_to(&self, config: &mut CompilerConfig) {
        if config.module_paths.is_empty() {
            config.module_paths = self.module_paths.clone();
        }
        config.merge = self.merge.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_rebinding_is_indexed_on_set() {
        let mut cfg = Configuration::default();
        cfg.set("KEYWORD_INHERIT", "extends");
        assert_eq!(cfg.keyword("INHERIT", "inherit"), "extends");
        assert_eq!(cfg.keyword("DELETE", "delete"), "delete");
    }

    #[test]
    fn strict_mode_rejects_unknown_keys() {
        let mut cfg = Configuration::default();
        cfg.set("NOT_A_REAL_KEY", "1");
        assert!(cfg.validate_strict().is_err());
    }

    #[test]
    fn strict_mode_accepts_known_and_keyword_keys() {
        let mut cfg = Configuration::default();
        cfg.set("DEBUG_MODE", "true");
        cfg.set("KEYWORD_INHERIT", "extends");
        assert!(cfg.validate_strict().is_ok());
        assert!(cfg.debug_mode());
    }

    #[test]
    fn project_config_parses_toml() {
        let toml = r#"
            module_paths = ["modules"]
            include = ["src"]
            output = "dist"

            [merge]
            minify_html = true
        "#;
        let parsed: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(parsed.module_paths, vec![std::path::PathBuf::from("modules")]);
        assert!(parsed.merge.minify_html);
        assert!(parsed.merge.inline_css, "unset merge keys keep MergeOptions::default()");
    }
}
