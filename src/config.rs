use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::NumberFormatOptions;

/// Contents of `~/.dmstats.toml`. Missing sections fall back to their defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub owner: OwnerConfig,
    pub export: ExportConfig,
    pub formatting: FormattingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct OwnerConfig {
    /// Account the export belongs to; "sent" and "received" are relative to it.
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/messages.json"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FormattingConfig {
    pub number_comma: bool,
    pub number_human: bool,
    pub locale: String,
    pub decimal_places: usize,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        let options = NumberFormatOptions::default();
        Self {
            number_comma: options.use_comma,
            number_human: options.use_human,
            locale: options.locale,
            decimal_places: options.decimal_places,
        }
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Invalid boolean value. Use 'true' or 'false'")
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::home_dir()
            .context("Could not find home directory")?
            .join(".dmstats.toml"))
    }

    pub fn load() -> Result<Option<Config>> {
        Self::load_from(&Self::default_path()?)
    }

    /// `Ok(None)` when there is no file at `path`.
    pub fn load_from(path: &Path) -> Result<Option<Config>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    pub fn has_owner(&self) -> bool {
        !self.owner.username.trim().is_empty()
    }

    pub fn format_options(&self) -> NumberFormatOptions {
        NumberFormatOptions {
            use_comma: self.formatting.number_comma,
            use_human: self.formatting.number_human,
            locale: self.formatting.locale.clone(),
            decimal_places: self.formatting.decimal_places,
        }
    }

    /// Apply one `dmstats config set` key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "username" => self.owner.username = value.trim().to_string(),
            "export-path" => self.export.path = PathBuf::from(value),
            "number-comma" => self.formatting.number_comma = parse_bool(value)?,
            "number-human" => self.formatting.number_human = parse_bool(value)?,
            "locale" => self.formatting.locale = value.to_string(),
            "decimal-places" => {
                self.formatting.decimal_places =
                    value.parse().context("Invalid number value")?;
            }
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        let username = if self.has_owner() {
            self.owner.username.as_str()
        } else {
            "Not set"
        };

        let mut out = String::from("🔧 Current configuration:\n");
        let _ = writeln!(out, "   Username: {username}");
        let _ = writeln!(out, "   Export Path: {}", self.export.path.display());
        let _ = writeln!(out, "   Number Comma: {}", self.formatting.number_comma);
        let _ = writeln!(out, "   Number Human: {}", self.formatting.number_human);
        let _ = writeln!(out, "   Locale: {}", self.formatting.locale);
        let _ = writeln!(out, "   Decimal Places: {}", self.formatting.decimal_places);
        out
    }
}

/// Write a default config to `path`. Returns false if one exists and `overwrite` is off.
pub fn init_config(path: &Path, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        return Ok(false);
    }
    Config::default().save_to(path)?;
    Ok(true)
}

/// Load the config at `path` (or defaults), apply `key = value` and save it back.
pub fn update_config(path: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = Config::load_from(path)?.unwrap_or_default();
    config.set_value(key, value)?;
    config.save_to(path)?;
    Ok(config)
}

// CLI helper functions
pub fn create_default_config(overwrite: bool) -> Result<()> {
    let path = Config::default_path()?;
    if init_config(&path, overwrite)? {
        println!("📝 Created default configuration file.");
        println!("📍 Set the username whose export you are analyzing:");
        println!("   dmstats config set username ...");
        println!("or edit");
        println!("   {}", path.display());
    } else {
        println!("Configuration already exists.  Pass `--overwrite` to overwrite.");
    }
    Ok(())
}

pub fn show_config() -> Result<()> {
    match Config::load()? {
        Some(config) => print!("{}", config.describe()),
        None => {
            println!("❌ No configuration file found.");
            println!("   Run 'dmstats config init' to create one.");
        }
    }
    Ok(())
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = Config::default_path()?;
    update_config(&path, key, value)?;
    println!("✅ Configuration saved to: {}", path.display());
    Ok(())
}
