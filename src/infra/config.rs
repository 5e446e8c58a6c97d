use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::validate::{
    DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_PREVIEW_CHARS, Limits,
};

/// Config file names probed in the working directory, first match wins.
const CONFIG_FILES: [&str; 4] = ["cmerge.toml", "cmerge.yaml", "cmerge.json", ".cmerge.toml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// File acceptance and preview limits
    pub limits: LimitsConfig,

    /// Merge backend location
    pub backend: BackendConfig,

    /// Output naming and destination
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig
{
    pub supported_extensions: Vec<String>,
    pub max_file_size: u64,
    pub max_preview_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig
{
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{
    /// Used when no output name is given on the command line
    pub default_filename: String,
    pub directory: Option<PathBuf>,
}

impl Default for LimitsConfig
{
    fn default() -> Self
    {
        Self {
            supported_extensions: DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_preview_chars: DEFAULT_MAX_PREVIEW_CHARS,
        }
    }
}

impl Default for BackendConfig
{
    fn default() -> Self
    {
        Self { base_url: "http://localhost:8080/api".to_string(), timeout_secs: 30 }
    }
}

impl Default for OutputConfig
{
    fn default() -> Self
    {
        Self { default_filename: "merged.txt".to_string(), directory: None }
    }
}

impl Config
{
    /// Limits as the core sees them.
    pub fn limits(&self) -> Limits
    {
        Limits {
            supported_extensions: self
                .limits
                .supported_extensions
                .clone(),
            max_file_size: self.limits.max_file_size,
            max_preview_chars: self.limits.max_preview_chars,
        }
    }

    pub fn timeout(&self) -> Duration
    {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

/// Load from the first config file found in the working directory.
pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    // Load from config files in priority order
    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Add environment variables with CMERGE_ prefix, e.g. CMERGE_BACKEND__BASE_URL
    builder = builder.add_source(
        config::Environment::with_prefix("CMERGE")
            .prefix_separator("_")
            .separator("__"),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("cmerge.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_no_file() -> Result<()>
    {
        let tmp = TempDir::new()?;
        let cfg = load_config_from(tmp.path())?;
        assert_eq!(cfg.limits.max_file_size, 10 * 1024 * 1024);
        assert_eq!(cfg.limits.max_preview_chars, 500);
        assert_eq!(cfg.output.default_filename, "merged.txt");
        Ok(())
    }

    #[test]
    fn test_partial_file_overrides_defaults() -> Result<()>
    {
        let tmp = TempDir::new()?;
        std::fs::write(
            tmp.path().join("cmerge.toml"),
            "[backend]\nbase_url = \"http://merge.internal/api\"\n\n[limits]\nmax_file_size = 1024\n",
        )?;

        let cfg = load_config_from(tmp.path())?;
        assert_eq!(cfg.backend.base_url, "http://merge.internal/api");
        assert_eq!(cfg.backend.timeout_secs, 30);
        assert_eq!(cfg.limits().max_file_size, 1024);
        assert_eq!(cfg.limits().supported_extensions.len(), 12);
        Ok(())
    }

    #[test]
    fn test_default_round_trips_through_toml() -> Result<()>
    {
        let text = toml::to_string_pretty(&Config::default())?;
        let back: Config = toml::from_str(&text)?;
        assert_eq!(back, Config::default());
        Ok(())
    }
}
