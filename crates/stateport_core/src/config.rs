use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ORIGIN_HOOK: &str = "useState";
pub const DEFAULT_FRAMEWORK_MODULE: &str = "react";
pub const DEFAULT_TARGET_HOOK: &str = "useUrlState";
pub const DEFAULT_TARGET_MODULE: &str = "@/hooks/use-url-state";
pub const DEFAULT_EXTENSIONS: &[&str] = &["tsx"];

/// File looked up in the migrated directory when no `--config` is given.
pub const CONFIG_FILENAME: &str = ".stateport.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct StateportConfig {
    #[serde(default)]
    pub migration: MigrationSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct MigrationSection {
    pub origin_hook: Option<String>,
    pub framework_module: Option<String>,
    pub target_hook: Option<String>,
    pub target_module: Option<String>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Flag,
    Env,
    Config,
    Default,
}

impl ValueSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Env => "env",
            Self::Config => "config",
            Self::Default => "default",
        }
    }
}

/// Names and module paths the rewriter works against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSettings {
    pub origin_hook: String,
    pub framework_module: String,
    pub target_hook: String,
    pub target_module: String,
    pub extensions: Vec<String>,
}

impl Default for MigrationSettings {
    fn default() -> Self {
        Self {
            origin_hook: DEFAULT_ORIGIN_HOOK.to_string(),
            framework_module: DEFAULT_FRAMEWORK_MODULE.to_string(),
            target_hook: DEFAULT_TARGET_HOOK.to_string(),
            target_module: DEFAULT_TARGET_MODULE.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl MigrationSettings {
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("origin_hook", &self.origin_hook),
            ("target_hook", &self.target_hook),
        ] {
            if !is_hook_name(value) {
                bail!("{label} must be a plain identifier, got `{value}`");
            }
        }
        if self.origin_hook == self.target_hook {
            bail!(
                "origin_hook and target_hook must differ (both are `{}`)",
                self.origin_hook
            );
        }
        for (label, value) in [
            ("framework_module", &self.framework_module),
            ("target_module", &self.target_module),
        ] {
            if value.trim().is_empty() || value.contains(['"', '\'', '\n']) {
                bail!("{label} must be a non-empty module specifier without quotes");
            }
        }
        if self.extensions.is_empty() {
            bail!("at least one file extension is required");
        }
        if self.extensions.iter().any(|ext| ext.is_empty()) {
            bail!("file extensions cannot be empty");
        }
        Ok(())
    }

    pub fn matches_extension(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// Values supplied on the command line; they win over env and config.
#[derive(Debug, Clone, Default)]
pub struct SettingOverrides {
    pub target_hook: Option<String>,
    pub target_module: Option<String>,
    pub extensions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingSources {
    pub origin_hook: ValueSource,
    pub framework_module: ValueSource,
    pub target_hook: ValueSource,
    pub target_module: ValueSource,
    pub extensions: ValueSource,
}

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: MigrationSettings,
    pub sources: SettingSources,
    pub config_path: Option<PathBuf>,
}

impl ResolvedSettings {
    pub fn diagnostics(&self) -> String {
        format!(
            "config_path={}\norigin_hook={} ({})\nframework_module={} ({})\ntarget_hook={} ({})\ntarget_module={} ({})\nextensions={} ({})",
            self.config_path
                .as_deref()
                .map(normalize_for_display)
                .unwrap_or_else(|| "<none>".to_string()),
            self.settings.origin_hook,
            self.sources.origin_hook.as_str(),
            self.settings.framework_module,
            self.sources.framework_module.as_str(),
            self.settings.target_hook,
            self.sources.target_hook.as_str(),
            self.settings.target_module,
            self.sources.target_module.as_str(),
            self.settings.extensions.join(","),
            self.sources.extensions.as_str(),
        )
    }
}

/// Load and parse a config file. Returns default if the file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<StateportConfig> {
    if !config_path.exists() {
        return Ok(StateportConfig::default());
    }
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let parsed: StateportConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))?;
    Ok(parsed)
}

/// Resolve settings with precedence flag > env > config > default.
///
/// An explicit `config_path` must exist; otherwise `<directory>/.stateport.toml`
/// is used when present.
pub fn resolve_settings(
    config_path: Option<&Path>,
    directory: &Path,
    overrides: &SettingOverrides,
) -> Result<ResolvedSettings> {
    resolve_settings_with_env(config_path, directory, overrides, |key| env::var(key).ok())
}

fn resolve_settings_with_env(
    config_path: Option<&Path>,
    directory: &Path,
    overrides: &SettingOverrides,
    lookup_env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedSettings> {
    let config_path = match config_path {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => Some(directory.join(CONFIG_FILENAME)).filter(|path| path.exists()),
    };
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => StateportConfig::default(),
    };
    let section = config.migration;
    let env_value = |key: &str| {
        lookup_env(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let (origin_hook, origin_source) = pick(
        None,
        env_value("STATEPORT_ORIGIN_HOOK"),
        section.origin_hook,
        DEFAULT_ORIGIN_HOOK,
    );
    let (framework_module, framework_source) = pick(
        None,
        env_value("STATEPORT_FRAMEWORK_MODULE"),
        section.framework_module,
        DEFAULT_FRAMEWORK_MODULE,
    );
    let (target_hook, target_hook_source) = pick(
        overrides.target_hook.clone(),
        env_value("STATEPORT_TARGET_HOOK"),
        section.target_hook,
        DEFAULT_TARGET_HOOK,
    );
    let (target_module, target_module_source) = pick(
        overrides.target_module.clone(),
        env_value("STATEPORT_TARGET_MODULE"),
        section.target_module,
        DEFAULT_TARGET_MODULE,
    );

    let (extensions, extensions_source) = if let Some(list) = &overrides.extensions {
        (normalize_extensions(list), ValueSource::Flag)
    } else if let Some(list) = env_value("STATEPORT_EXTENSIONS") {
        let parts: Vec<String> = list.split(',').map(str::to_string).collect();
        (normalize_extensions(&parts), ValueSource::Env)
    } else if let Some(list) = section.extensions {
        (normalize_extensions(&list), ValueSource::Config)
    } else {
        (
            MigrationSettings::default().extensions,
            ValueSource::Default,
        )
    };

    let settings = MigrationSettings {
        origin_hook,
        framework_module,
        target_hook,
        target_module,
        extensions,
    };
    settings.validate().with_context(|| match &config_path {
        Some(path) => format!("invalid migration settings (config: {})", path.display()),
        None => "invalid migration settings".to_string(),
    })?;

    Ok(ResolvedSettings {
        settings,
        sources: SettingSources {
            origin_hook: origin_source,
            framework_module: framework_source,
            target_hook: target_hook_source,
            target_module: target_module_source,
            extensions: extensions_source,
        },
        config_path,
    })
}

fn pick(
    flag: Option<String>,
    env: Option<String>,
    config: Option<String>,
    default: &str,
) -> (String, ValueSource) {
    if let Some(value) = flag {
        return (value.trim().to_string(), ValueSource::Flag);
    }
    if let Some(value) = env {
        return (value, ValueSource::Env);
    }
    if let Some(value) = config {
        return (value.trim().to_string(), ValueSource::Config);
    }
    (default.to_string(), ValueSource::Default)
}

fn normalize_extensions(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let ext = value.trim().trim_start_matches('.').to_string();
        if !ext.is_empty() && !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

fn is_hook_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn normalize_for_display(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
