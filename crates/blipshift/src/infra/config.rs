//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::document::CoordinateFields;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".blipshift/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub workspace: Workspace,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub combine: Combine,
    #[serde(default)]
    pub display: Display,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default = "Workspace::default_directory")]
    pub directory: PathBuf,
    #[serde(default = "Workspace::default_extension")]
    pub extension: String,
    #[serde(default = "Workspace::default_fixed_suffix")]
    pub fixed_suffix: String,
}

impl Workspace {
    fn default_directory() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_extension() -> String {
        "xml".into()
    }

    fn default_fixed_suffix() -> String {
        "_fixed".into()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            extension: Self::default_extension(),
            fixed_suffix: Self::default_fixed_suffix(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(default = "Extraction::default_x_field")]
    pub x_field: String,
    #[serde(default = "Extraction::default_y_field")]
    pub y_field: String,
    #[serde(default = "Extraction::default_z_field")]
    pub z_field: String,
    #[serde(default = "Extraction::default_name_field")]
    pub name_field: String,
    /// Names never extracted, even when the node carries all three fields.
    #[serde(default)]
    pub denylist: Vec<String>,
}

impl Extraction {
    fn default_x_field() -> String {
        "X".into()
    }

    fn default_y_field() -> String {
        "Y".into()
    }

    fn default_z_field() -> String {
        "Z".into()
    }

    fn default_name_field() -> String {
        "Name".into()
    }

    pub fn fields(&self) -> CoordinateFields {
        CoordinateFields {
            x: self.x_field.clone(),
            y: self.y_field.clone(),
            z: self.z_field.clone(),
        }
    }
}

impl Default for Extraction {
    fn default() -> Self {
        Self {
            x_field: Self::default_x_field(),
            y_field: Self::default_y_field(),
            z_field: Self::default_z_field(),
            name_field: Self::default_name_field(),
            denylist: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combine {
    #[serde(default = "Combine::default_root_element")]
    pub root_element: String,
}

impl Combine {
    fn default_root_element() -> String {
        "PossibleLocations".into()
    }
}

impl Default for Combine {
    fn default() -> Self {
        Self {
            root_element: Self::default_root_element(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    #[serde(default = "Display::default_precision")]
    pub precision: usize,
}

impl Display {
    fn default_precision() -> usize {
        6
    }
}

impl Default for Display {
    fn default() -> Self {
        Self {
            precision: Self::default_precision(),
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    directory: Option<String>,
    fixed_suffix: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            directory: env::var("BLIPSHIFT_DIRECTORY").ok(),
            fixed_suffix: env::var("BLIPSHIFT_SUFFIX").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(directory: &str, fixed_suffix: &str) -> Self {
        Self {
            directory: Some(directory.to_owned()),
            fixed_suffix: Some(fixed_suffix.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    /// Built-in defaults only, ignoring user files and the environment.
    pub fn builtin() -> Result<Self> {
        Self::from_str(&DEFAULT_CONFIG)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            workspace: merge_workspace(self.workspace, other.workspace),
            extraction: merge_extraction(self.extraction, other.extraction),
            combine: Combine {
                root_element: choose(
                    self.combine.root_element,
                    other.combine.root_element,
                    Combine::default_root_element,
                ),
            },
            display: Display {
                precision: if other.display.precision != Display::default_precision() {
                    other.display.precision
                } else {
                    self.display.precision
                },
            },
        }
    }
}

fn merge_workspace(base: Workspace, overlay: Workspace) -> Workspace {
    Workspace {
        directory: if overlay.directory != Workspace::default_directory() {
            overlay.directory
        } else {
            base.directory
        },
        extension: choose(base.extension, overlay.extension, Workspace::default_extension),
        fixed_suffix: choose(
            base.fixed_suffix,
            overlay.fixed_suffix,
            Workspace::default_fixed_suffix,
        ),
    }
}

fn merge_extraction(base: Extraction, overlay: Extraction) -> Extraction {
    let mut denylist: BTreeSet<String> = base.denylist.into_iter().collect();
    denylist.extend(overlay.denylist);

    Extraction {
        x_field: choose(base.x_field, overlay.x_field, Extraction::default_x_field),
        y_field: choose(base.y_field, overlay.y_field, Extraction::default_y_field),
        z_field: choose(base.z_field, overlay.z_field, Extraction::default_z_field),
        name_field: choose(
            base.name_field,
            overlay.name_field,
            Extraction::default_name_field,
        ),
        denylist: denylist.into_iter().collect(),
    }
}

fn choose(base: String, overlay: String, default_fn: fn() -> String) -> String {
    if overlay != default_fn() {
        overlay
    } else {
        base
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("blipshift/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(directory) = env.directory {
        config.workspace.directory = PathBuf::from(directory);
    }
    if let Some(fixed_suffix) = env.fixed_suffix {
        config.workspace.fixed_suffix = fixed_suffix;
    }
    config
}
