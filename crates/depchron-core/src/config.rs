use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ingest::BindingLayout;

/// File name looked up inside the data directory.
pub const PROJECT_CONFIG_FILE: &str = "depchron.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DepchronConfig {
    #[serde(default)]
    pub inputs: InputsConfig,
    #[serde(default)]
    pub dormancy: DormancyConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputsConfig {
    #[serde(default = "default_links")]
    pub links: PathBuf,
    #[serde(default = "default_releases")]
    pub releases: PathBuf,
    #[serde(default = "default_bindings")]
    pub bindings: PathBuf,
    #[serde(default = "default_binding_delimiter")]
    pub binding_delimiter: char,
    #[serde(default = "default_project_column")]
    pub binding_project_column: String,
    #[serde(default = "default_locator_column")]
    pub binding_locator_column: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            links: default_links(),
            releases: default_releases(),
            bindings: default_bindings(),
            binding_delimiter: default_binding_delimiter(),
            binding_project_column: default_project_column(),
            binding_locator_column: default_locator_column(),
        }
    }
}

impl InputsConfig {
    /// Column layout for the bindings reader.
    ///
    /// # Errors
    ///
    /// Fails if the configured delimiter is not a single ASCII character.
    pub fn binding_layout(&self) -> Result<BindingLayout> {
        let Ok(delimiter) = u8::try_from(self.binding_delimiter) else {
            bail!(
                "binding_delimiter must be an ASCII character, got {:?}",
                self.binding_delimiter
            );
        };
        if !delimiter.is_ascii() {
            bail!(
                "binding_delimiter must be an ASCII character, got {:?}",
                self.binding_delimiter
            );
        }
        Ok(BindingLayout {
            delimiter,
            project_column: self.binding_project_column.clone(),
            locator_column: self.binding_locator_column.clone(),
        })
    }

    /// Resolve an input path against the data directory.
    #[must_use]
    pub fn resolve(data_dir: &Path, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DormancyConfig {
    /// Commit log backing the offline dormancy oracle. Without one, no
    /// dependency is ever reported dormant.
    #[serde(default)]
    pub commit_log: Option<PathBuf>,
    #[serde(default = "default_min_commits")]
    pub min_commits: usize,
    #[serde(default = "default_window_months")]
    pub window_months: u32,
    /// Per-call oracle deadline; unset means no deadline.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl Default for DormancyConfig {
    fn default() -> Self {
        Self {
            commit_log: None,
            min_commits: default_min_commits(),
            window_months: default_window_months(),
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineConfig {
    #[serde(default = "default_starting_year")]
    pub starting_year: i32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            starting_year: default_starting_year(),
        }
    }
}

/// Load the effective configuration.
///
/// Precedence: an explicit `--config` path (which must exist), then
/// `<data_dir>/depchron.toml`, then the user config
/// (`<config_dir>/depchron/config.toml`), then built-in defaults.
///
/// # Errors
///
/// Fails if the chosen file cannot be read or parsed, or if an explicit path
/// does not exist.
pub fn load_config(data_dir: &Path, explicit: Option<&Path>) -> Result<DepchronConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        return read_config(path);
    }

    let project = data_dir.join(PROJECT_CONFIG_FILE);
    if project.exists() {
        return read_config(&project);
    }

    match user_config_path() {
        Some(user) if user.exists() => read_config(&user),
        _ => Ok(DepchronConfig::default()),
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("depchron/config.toml"))
}

fn read_config(path: &Path) -> Result<DepchronConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<DepchronConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    config
        .inputs
        .binding_layout()
        .with_context(|| format!("Invalid [inputs] in {}", path.display()))?;

    Ok(config)
}

fn default_links() -> PathBuf {
    PathBuf::from("links_all.csv")
}

fn default_releases() -> PathBuf {
    PathBuf::from("release_all.csv")
}

fn default_bindings() -> PathBuf {
    PathBuf::from("githubs_sorted_for_stars.csv")
}

const fn default_binding_delimiter() -> char {
    ';'
}

fn default_project_column() -> String {
    "Project".to_string()
}

fn default_locator_column() -> String {
    "Github Link".to_string()
}

const fn default_min_commits() -> usize {
    12
}

const fn default_window_months() -> u32 {
    12
}

const fn default_starting_year() -> i32 {
    2019
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_snapshot_layout() {
        let config = DepchronConfig::default();
        assert_eq!(config.inputs.links, PathBuf::from("links_all.csv"));
        assert_eq!(config.inputs.binding_layout().unwrap(), BindingLayout::default());
        assert_eq!(config.dormancy.min_commits, 12);
        assert_eq!(config.dormancy.window_months, 12);
        assert_eq!(config.timeline.starting_year, 2019);
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "[inputs]\nlinks = \"edges.csv\"\n\n[timeline]\nstarting_year = 2015\n",
        )
        .unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.inputs.links, PathBuf::from("edges.csv"));
        assert_eq!(config.inputs.releases, PathBuf::from("release_all.csv"));
        assert_eq!(config.timeline.starting_year, 2015);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[inputs]\nlinkz = \"edges.csv\"\n").unwrap();
        assert!(load_config(dir.path(), Some(&path)).is_err());
    }

    #[test]
    fn non_ascii_delimiter_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("delim.toml");
        std::fs::write(&path, "[inputs]\nbinding_delimiter = \"§\"\n").unwrap();
        let err = load_config(dir.path(), Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("binding_delimiter"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn relative_inputs_resolve_against_data_dir() {
        let resolved = InputsConfig::resolve(Path::new("/data"), Path::new("links.csv"));
        assert_eq!(resolved, PathBuf::from("/data/links.csv"));
        let absolute = InputsConfig::resolve(Path::new("/data"), Path::new("/elsewhere/l.csv"));
        assert_eq!(absolute, PathBuf::from("/elsewhere/l.csv"));
    }
}
