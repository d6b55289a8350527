//! Config manager for loading, saving, and atomic updates.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Section-level updates (only the modified section is replaced)
//! - Validation on load
//! - Preserves comments and formatting of untouched sections with toml_edit

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::DocumentMut;

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for editing: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages the pumpsync configuration file.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Changes made here are only in memory until `save()` or
    /// `update_section()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the manager, keeping the loaded settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist or fails validation.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = parse_and_validate(&content)?;
        Ok(())
    }

    /// Load config from file, creating it with defaults if it doesn't exist.
    ///
    /// Sections missing from an existing file are filled with defaults and
    /// written back.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            let settings = parse_and_validate(&content)?;
            let doc: DocumentMut = content.parse()?;
            self.settings = settings;

            let missing: Vec<ConfigSection> = ConfigSection::ALL
                .into_iter()
                .filter(|s| !doc.contains_key(s.table_name()))
                .collect();

            for section in missing {
                tracing::debug!(
                    "Adding missing config section [{}]",
                    section.table_name()
                );
                self.update_section(section)?;
            }
        } else {
            self.settings = Settings::default();
            self.save()?;
        }
        Ok(())
    }

    /// Ensure the log directory exists when run logs are enabled.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        if self.settings.paths.write_run_logs {
            fs::create_dir_all(&self.settings.paths.logs_folder)?;
        }
        if let Some(ref root) = self.settings.paths.temp_root {
            fs::create_dir_all(root)?;
        }
        Ok(())
    }

    /// Save the entire config atomically.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Update a specific section atomically.
    ///
    /// Re-reads the file from disk, replaces only the given section with the
    /// in-memory value and writes back, leaving every other section as it was.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let current_content = if self.config_path.exists() {
            fs::read_to_string(&self.config_path)?
        } else {
            String::new()
        };

        let mut doc: DocumentMut = if current_content.is_empty() {
            DocumentMut::new()
        } else {
            current_content.parse()?
        };

        let fresh: DocumentMut = toml::to_string_pretty(&self.settings)?.parse()?;
        let name = section.table_name();

        match fresh.get(name) {
            Some(item) => {
                doc[name] = item.clone();
            }
            None => {
                // Optional-only sections may serialize to nothing.
                doc.remove(name);
            }
        }

        self.atomic_write(&doc.to_string())?;

        Ok(())
    }

    /// Generate config content with a comment above every section.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut doc: DocumentMut = toml::to_string_pretty(&self.settings)?.parse()?;

        for section in ConfigSection::ALL {
            let prefix = format!("\n# {}\n", section.description());
            let Some(item) = doc.get_mut(section.table_name()) else {
                continue;
            };
            if let Some(table) = item.as_table_mut() {
                table.decor_mut().set_prefix(prefix);
            } else if let Some(array) = item.as_array_of_tables_mut() {
                if let Some(first) = array.iter_mut().next() {
                    first.decor_mut().set_prefix(prefix);
                }
            }
        }

        let mut output = String::new();
        output.push_str("# pumpsync configuration\n");
        output.push_str(
            "# Thresholds are calibrated for one correlation utility; retune them for yours.\n",
        );
        output.push_str(&doc.to_string());
        Ok(output)
    }

    /// Write content to config file atomically.
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn parse_and_validate(content: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(content)?;
    settings.validate().map_err(ConfigError::Invalid)?;
    Ok(settings)
}
