use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NotepadError, Result, SortOption};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persisted key-value records
    pub data_dir: PathBuf,

    /// Default directory for exported backups
    pub export_dir: PathBuf,

    /// Sort option used when `list` is called without `--sort`
    pub default_sort: SortOption,

    /// Editor command used for `--editor`
    pub editor_command: Option<String>,

    /// Whether persisted records are pretty-printed
    pub pretty_storage: bool,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notepad"));
        let export_dir = dirs::download_dir().unwrap_or_else(|| data_dir.clone());

        Config {
            data_dir,
            export_dir,
            default_sort: SortOption::default(),
            editor_command: None,
            pretty_storage: false,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "notepad")
}

impl Config {
    /// Location of the configuration file when `--config` is not given.
    pub fn default_path() -> PathBuf {
        project_dirs()
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("notepad.json"))
    }

    /// Reads the configuration, falling back to defaults when the file is missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| NotepadError::ConfigError {
            message: format!("{}: {}", path.display(), e),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Applies a `key=value` assignment.
    pub fn set(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| NotepadError::ConfigError {
                message: format!("expected key=value, got '{}'", assignment),
            })?;

        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "export_dir" => self.export_dir = PathBuf::from(value),
            "default_sort" => {
                self.default_sort = value
                    .parse()
                    .map_err(|message| NotepadError::ConfigError { message })?
            }
            "editor_command" => {
                self.editor_command = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "pretty_storage" => {
                self.pretty_storage = value.parse().map_err(|_| NotepadError::ConfigError {
                    message: format!("pretty_storage must be true or false, got '{}'", value),
                })?
            }
            other => {
                return Err(NotepadError::ConfigError {
                    message: format!("unknown setting '{}'", other),
                })
            }
        }
        Ok(())
    }

    // Smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.default_sort, SortOption::CreatedNewest);
        assert!(!config.pretty_storage);
    }

    #[test]
    fn set_then_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set("default_sort = title").unwrap();
        config.set("data_dir=/tmp/notes").unwrap();
        config.set("pretty_storage=true").unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.default_sort, SortOption::AlphabeticalTitle);
        assert_eq!(loaded.data_dir, PathBuf::from("/tmp/notes"));
    }

    #[test]
    fn bad_assignments_are_rejected() {
        let mut config = Config::default();
        assert!(config.set("default_sort").is_err());
        assert!(config.set("default_sort=sideways").is_err());
        assert!(config.set("colour=blue").is_err());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"default_sort":"modified"}"#).unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_sort, SortOption::ModifiedRecent);
        assert_eq!(config.editor_command, None);
    }
}
