use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Status of config file loading
#[derive(Debug, Clone)]
pub enum ConfigLoadStatus {
    /// Config loaded successfully from existing file
    Loaded,
    /// Created default config file (first run)
    Created,
    /// Error occurred during loading, using defaults.
    /// String is used in Debug output for logging.
    #[allow(dead_code)]
    Error(String),
}

/// Text-generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never goes in the config file.
    pub api_key_env: String,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.3,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory vendor rule files are written to.
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Expand `~` to home directory in a path string
    pub fn expand_tilde(path: &str) -> PathBuf {
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }

    /// Get the expanded output directory path
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_tilde(&self.output.dir)
    }
}

/// Partial endpoint configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLlmConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key_env: Option<String>,
    pub temperature: Option<f64>,
}

/// Partial output configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialOutputConfig {
    pub dir: Option<String>,
}

/// Partial logging configuration for project overrides.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialLoggingConfig {
    pub level: Option<String>,
}

/// Project-specific configuration where every field is optional.
/// Parsed from `.devprompt` files. Fields that are `None` inherit from the
/// global config.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PartialConfig {
    pub llm: PartialLlmConfig,
    pub output: PartialOutputConfig,
    pub logging: PartialLoggingConfig,
}

/// Merge a global config with a project-level partial config.
/// Project values override global values where present.
pub fn merge_config(global: &Config, project: &PartialConfig) -> Config {
    Config {
        llm: LlmConfig {
            base_url: project
                .llm
                .base_url
                .clone()
                .unwrap_or_else(|| global.llm.base_url.clone()),
            model: project
                .llm
                .model
                .clone()
                .unwrap_or_else(|| global.llm.model.clone()),
            api_key_env: project
                .llm
                .api_key_env
                .clone()
                .unwrap_or_else(|| global.llm.api_key_env.clone()),
            temperature: project.llm.temperature.unwrap_or(global.llm.temperature),
        },
        output: OutputConfig {
            dir: project
                .output
                .dir
                .clone()
                .unwrap_or_else(|| global.output.dir.clone()),
        },
        logging: LoggingConfig {
            level: project
                .logging
                .level
                .clone()
                .unwrap_or_else(|| global.logging.level.clone()),
        },
    }
}

/// Loaded configuration with metadata
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub config_path: PathBuf,
    pub project_config_path: Option<PathBuf>,
    pub status: ConfigLoadStatus,
}

/// Get the platform-appropriate config directory
fn get_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "devprompt", "devprompt").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the full path to the config file
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.devprompt in current working directory).
pub fn get_project_config_path() -> Option<PathBuf> {
    let path = std::env::current_dir().ok()?.join(".devprompt");
    if path.exists() { Some(path) } else { None }
}

/// Load a project config (.devprompt) from the given path.
/// Returns Ok(PartialConfig) on success, Err(String) on parse/read failure.
fn load_project_config(path: &PathBuf) -> Result<PartialConfig, String> {
    let contents = fs::read_to_string(path).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_read_failed");
        format!("Failed to read .devprompt: {}", e)
    })?;

    toml::from_str::<PartialConfig>(&contents).map_err(|e| {
        warn!(path = ?path, error = %e, "project_config_parse_failed");
        format!("Invalid .devprompt: {}", e)
    })
}

/// Load configuration from file, environment, and defaults
pub fn load_config() -> LoadedConfig {
    let config_path = match get_config_path() {
        Some(path) => path,
        None => {
            warn!("Could not determine config directory, using defaults");
            return LoadedConfig {
                config: apply_env_overrides(Config::default()),
                config_path: PathBuf::from("config.toml"),
                project_config_path: None,
                status: ConfigLoadStatus::Error("Could not determine config directory".to_string()),
            };
        }
    };

    debug!("Config path: {:?}", config_path);

    let (mut config, status) = load_or_create_config(&config_path);

    // Check for project-level .devprompt file
    let project_config_path = get_project_config_path();
    if let Some(ref project_path) = project_config_path {
        match load_project_config(project_path) {
            Ok(partial) => {
                config = merge_config(&config, &partial);
                info!(path = ?project_path, "project_config_loaded");
            }
            Err(e) => {
                warn!(path = ?project_path, error = %e, "project_config_error");
                // Keep using global config only
            }
        }
    }

    let config = apply_env_overrides(config);

    LoadedConfig {
        config,
        config_path,
        project_config_path,
        status,
    }
}

/// Load config from file, or create default if not exists
fn load_or_create_config(config_path: &PathBuf) -> (Config, ConfigLoadStatus) {
    match fs::read_to_string(config_path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(config) => {
                info!("Loaded config from {:?}", config_path);
                (config, ConfigLoadStatus::Loaded)
            }
            Err(e) => {
                warn!(
                    "Config file malformed at {:?}: {}. Using defaults.",
                    config_path, e
                );
                (
                    Config::default(),
                    ConfigLoadStatus::Error(format!("Malformed TOML: {}", e)),
                )
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // Config doesn't exist, create default
            create_default_config(config_path)
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied reading config at {:?}. Using defaults.",
                config_path
            );
            (
                Config::default(),
                ConfigLoadStatus::Error("Permission denied reading config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Error reading config at {:?}: {}. Using defaults.",
                config_path, e
            );
            (
                Config::default(),
                ConfigLoadStatus::Error(format!("Read error: {}", e)),
            )
        }
    }
}

/// Create the default config file
fn create_default_config(config_path: &PathBuf) -> (Config, ConfigLoadStatus) {
    let config = Config::default();

    // Ensure parent directory exists
    if let Some(parent) = config_path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!(
            "Could not create config directory {:?}: {}. Continuing without file.",
            parent, e
        );
        return (
            config,
            ConfigLoadStatus::Error(format!("Could not create config directory: {}", e)),
        );
    }

    // Serialize to TOML
    let toml_content = match toml::to_string_pretty(&config) {
        Ok(s) => s,
        Err(e) => {
            warn!("Could not serialize default config: {}", e);
            return (
                config,
                ConfigLoadStatus::Error(format!("Serialization error: {}", e)),
            );
        }
    };

    // Write file
    match fs::write(config_path, &toml_content) {
        Ok(()) => {
            info!("Created default config at {:?}", config_path);
            (config, ConfigLoadStatus::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            warn!(
                "Permission denied creating config at {:?}. Continuing without file.",
                config_path
            );
            (
                config,
                ConfigLoadStatus::Error("Permission denied creating config".to_string()),
            )
        }
        Err(e) => {
            warn!(
                "Could not write default config to {:?}: {}. Continuing without file.",
                config_path, e
            );
            (
                config,
                ConfigLoadStatus::Error(format!("Write error: {}", e)),
            )
        }
    }
}

/// Apply environment variable overrides to config
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(url) = env::var("DEVPROMPT_BASE_URL") {
        debug!("Overriding llm.base_url from DEVPROMPT_BASE_URL");
        config.llm.base_url = url;
    }

    if let Ok(model) = env::var("DEVPROMPT_MODEL") {
        debug!("Overriding llm.model from DEVPROMPT_MODEL");
        config.llm.model = model;
    }

    if let Ok(dir) = env::var("DEVPROMPT_OUTPUT_DIR") {
        debug!("Overriding output.dir from DEVPROMPT_OUTPUT_DIR");
        config.output.dir = dir;
    }

    if let Ok(level) = env::var("DEVPROMPT_LOG") {
        debug!("Overriding logging.level from DEVPROMPT_LOG");
        config.logging.level = level;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.output.dir, ".");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = Config::expand_tilde("~/.config/test");
        assert!(!expanded.to_string_lossy().starts_with('~'));

        let no_tilde = Config::expand_tilde("/absolute/path");
        assert_eq!(no_tilde, PathBuf::from("/absolute/path"));

        let relative = Config::expand_tilde("./relative/path");
        assert_eq!(relative, PathBuf::from("./relative/path"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
[llm]
base_url = "http://localhost:8080/v1"
model = "local-model"
temperature = 0.7

[output]
dir = "./rules"

[logging]
level = "debug"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(config.llm.model, "local-model");
        assert_eq!(config.llm.temperature, 0.7);
        // api_key_env not specified, falls back to default
        assert_eq!(config.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.output.dir, "./rules");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_config_partial_deserialization() {
        // Only llm section specified, others should use defaults
        let toml_str = r#"
[llm]
model = "gpt-4o"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.output.dir, ".");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let toml_str = r#"
[llm]
model = "gpt-4o"
unknown_key = "should be ignored"

[unknown_section]
foo = "bar"
"#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn test_partial_config_empty() {
        let toml_str = "";
        let partial: PartialConfig = toml::from_str(toml_str).unwrap();
        assert!(partial.llm.base_url.is_none());
        assert!(partial.llm.model.is_none());
        assert!(partial.llm.temperature.is_none());
        assert!(partial.output.dir.is_none());
        assert!(partial.logging.level.is_none());
    }

    #[test]
    fn test_partial_config_some_fields() {
        let toml_str = r#"
[llm]
model = "gpt-4o"

[output]
dir = "./generated"
"#;

        let partial: PartialConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(partial.llm.model, Some("gpt-4o".to_string()));
        assert!(partial.llm.base_url.is_none());
        assert_eq!(partial.output.dir, Some("./generated".to_string()));
        assert!(partial.logging.level.is_none());
    }

    #[test]
    fn test_partial_config_unknown_keys_ignored() {
        let toml_str = r#"
[output]
dir = "./r"
unknown = "ignored"

[unknown_section]
foo = "bar"
"#;

        let partial: PartialConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(partial.output.dir, Some("./r".to_string()));
    }

    #[test]
    fn test_partial_config_comment_only() {
        let toml_str = "# Project-specific devprompt config\n";
        let partial: PartialConfig = toml::from_str(toml_str).unwrap();
        assert!(partial.llm.model.is_none());
        assert!(partial.output.dir.is_none());
    }

    #[test]
    fn test_merge_config_no_overrides() {
        let global = Config::default();
        let partial = PartialConfig::default();
        let merged = merge_config(&global, &partial);

        assert_eq!(merged.llm.base_url, global.llm.base_url);
        assert_eq!(merged.llm.model, global.llm.model);
        assert_eq!(merged.llm.api_key_env, global.llm.api_key_env);
        assert_eq!(merged.llm.temperature, global.llm.temperature);
        assert_eq!(merged.output.dir, global.output.dir);
        assert_eq!(merged.logging.level, global.logging.level);
    }

    #[test]
    fn test_merge_config_all_overrides() {
        let global = Config::default();
        let partial = PartialConfig {
            llm: PartialLlmConfig {
                base_url: Some("http://localhost:11434/v1".to_string()),
                model: Some("llama3".to_string()),
                api_key_env: Some("LOCAL_API_KEY".to_string()),
                temperature: Some(0.0),
            },
            output: PartialOutputConfig {
                dir: Some("./proj-rules".to_string()),
            },
            logging: PartialLoggingConfig {
                level: Some("debug".to_string()),
            },
        };
        let merged = merge_config(&global, &partial);

        assert_eq!(merged.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(merged.llm.model, "llama3");
        assert_eq!(merged.llm.api_key_env, "LOCAL_API_KEY");
        assert_eq!(merged.llm.temperature, 0.0);
        assert_eq!(merged.output.dir, "./proj-rules");
        assert_eq!(merged.logging.level, "debug");
    }

    #[test]
    fn test_merge_config_partial_overrides() {
        let global = Config::default();
        let partial: PartialConfig = toml::from_str(
            r#"
[llm]
model = "gpt-4o"

[logging]
level = "trace"
"#,
        )
        .unwrap();
        let merged = merge_config(&global, &partial);

        // Overridden fields
        assert_eq!(merged.llm.model, "gpt-4o");
        assert_eq!(merged.logging.level, "trace");

        // Inherited fields
        assert_eq!(merged.llm.base_url, global.llm.base_url);
        assert_eq!(merged.llm.temperature, global.llm.temperature);
        assert_eq!(merged.output.dir, global.output.dir);
    }
}
