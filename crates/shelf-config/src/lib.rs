//! Configuration management for shelf.
//!
//! Parses `shelf.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `~/` - expands to the home directory (path fields only)
//!
//! Expanded fields:
//! - `server.host`
//! - `workspace.markdown_root`
//! - `workspace.html_root`

mod expand;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override markdown export root.
    pub markdown_root: Option<PathBuf>,
    /// Override HTML export root.
    pub html_root: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "shelf.toml";

/// Default navigation markup filename at an export root.
const DEFAULT_NAVIGATION_FILE: &str = "index.html";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Workspace export configuration (paths are relative strings from TOML).
    #[serde(default)]
    workspace: WorkspaceConfigRaw,
    /// Feature flags.
    pub features: Features,

    /// Resolved workspace configuration (set after loading).
    #[serde(skip)]
    pub workspace_resolved: WorkspaceConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    /// Default configuration.
    ///
    /// The markdown root is left empty: it has no sensible default and must
    /// come from the config file or the command line.
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            workspace: WorkspaceConfigRaw::default(),
            features: Features::default(),
            workspace_resolved: WorkspaceConfig {
                markdown_root: PathBuf::new(),
                html_root: None,
                navigation_file: DEFAULT_NAVIGATION_FILE.to_owned(),
                default_table_variant: TableVariant::default(),
            },
            config_path: None,
        }
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7878,
        }
    }
}

/// Which variant of a tabular export is shown first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableVariant {
    /// The complete export with every row.
    #[default]
    All,
    /// The export restricted to the view's filter.
    Filtered,
}

/// Raw workspace configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WorkspaceConfigRaw {
    markdown_root: Option<String>,
    html_root: Option<String>,
    navigation_file: Option<String>,
    default_table_variant: Option<TableVariant>,
}

/// Resolved workspace configuration with absolute paths.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceConfig {
    /// Root of the markdown/CSV export. Empty until configured.
    pub markdown_root: PathBuf,
    /// Root of the optional HTML export carrying icons and colors.
    pub html_root: Option<PathBuf>,
    /// Navigation markup filename looked up at each export root.
    pub navigation_file: String,
    /// Variant shown first for tabular pages.
    pub default_table_variant: TableVariant,
}

/// Independently togglable presentation features.
///
/// Absent flags default to enabled.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Features {
    /// Full-text search endpoints.
    pub search: bool,
    /// Breadcrumb trails on pages.
    pub breadcrumbs: bool,
    /// Image reference lists on pages.
    #[serde(alias = "image_gallery")]
    pub image_gallery: bool,
    /// Heading anchor lists on pages.
    #[serde(alias = "heading_anchors")]
    pub heading_anchors: bool,
    /// Icons and value colors from the HTML export.
    pub icons: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            search: true,
            breadcrumbs: true,
            image_gallery: true,
            heading_anchors: true,
            icons: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`workspace.markdown_root`").
        field: String,
        /// Error message (e.g., "${`EXPORT_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `shelf.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. Validation runs
    /// last so that a markdown root given only on the command line is accepted.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(markdown_root) = &settings.markdown_root {
            self.workspace_resolved
                .markdown_root
                .clone_from(markdown_root);
        }
        if let Some(html_root) = &settings.html_root {
            self.workspace_resolved.html_root = Some(html_root.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Checks that all required fields are properly set and contain valid values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_workspace()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        // Port 0 is technically valid (OS assigns a random port), but it's
        // unlikely to be intentional in a config file
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate workspace configuration.
    fn validate_workspace(&self) -> Result<(), ConfigError> {
        if self.workspace_resolved.markdown_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "workspace.markdown_root is required".to_owned(),
            ));
        }
        require_non_empty(
            &self.workspace_resolved.navigation_file,
            "workspace.navigation_file",
        )?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref root) = self.workspace.markdown_root {
            self.workspace.markdown_root =
                Some(expand::expand_path(root, "workspace.markdown_root")?);
        }
        if let Some(ref root) = self.workspace.html_root {
            self.workspace.html_root = Some(expand::expand_path(root, "workspace.html_root")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.workspace_resolved = WorkspaceConfig {
            markdown_root: self
                .workspace
                .markdown_root
                .as_deref()
                .map(|root| config_dir.join(root))
                .unwrap_or_default(),
            html_root: self
                .workspace
                .html_root
                .as_deref()
                .map(|root| config_dir.join(root)),
            navigation_file: self
                .workspace
                .navigation_file
                .clone()
                .unwrap_or_else(|| DEFAULT_NAVIGATION_FILE.to_owned()),
            default_table_variant: self.workspace.default_table_variant.unwrap_or_default(),
        };
    }
}
