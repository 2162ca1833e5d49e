use crate::error::ConfigError;
use crate::richtext::rich_document::LineHeight;
use directories::ProjectDirs;
use serde::{Deserialize, Deserializer};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "Richpad";
const APPLICATION: &str = "richpad";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Editor defaults
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size of text without an explicit override, in px
    pub default_font_size: f32,
    /// Font size adjustments never go below this, in px
    pub min_font_size: f32,
    /// Display size of inserted images
    pub image_width: u32,
    pub image_height: u32,
    /// Line height a fresh editor starts with
    #[serde(deserialize_with = "deserialize_line_height")]
    pub line_height: LineHeight,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            default_font_size: 16.0,
            min_font_size: 1.0,
            image_width: 200,
            image_height: 200,
            line_height: LineHeight::Normal,
        }
    }
}

fn deserialize_line_height<'de, D>(deserializer: D) -> Result<LineHeight, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl EditorConfig {
    /// Parse a config file. A missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or the per-user config file when `None`.
    /// Broken files are reported and replaced by the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match config_file_path() {
                Some(path) => path,
                None => return Self::default(),
            },
        };

        match Self::from_path(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "loaded editor config");
                config
            }
            Err(err) => {
                tracing::warn!("{err}, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: EditorConfig = toml::from_str("default_font_size = 14.0\n").unwrap();
        assert_eq!(config.default_font_size, 14.0);
        assert_eq!(config.image_width, 200);
        assert_eq!(config.line_height, LineHeight::Normal);
    }

    #[test]
    fn test_line_height_from_string() {
        let config: EditorConfig = toml::from_str("line_height = \"1.5\"\n").unwrap();
        assert_eq!(config.line_height, LineHeight::OneAndHalf);
        assert!(toml::from_str::<EditorConfig>("line_height = \"3\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("richpad-does-not-exist/config.toml");
        assert_eq!(EditorConfig::from_path(&path).unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_broken_file_falls_back() {
        let dir = std::env::temp_dir().join(format!("richpad-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        fs::write(&path, "image_width = \"wide\"").unwrap();

        assert!(matches!(
            EditorConfig::from_path(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(EditorConfig::load(Some(&path)), EditorConfig::default());

        fs::remove_dir_all(&dir).unwrap();
    }
}
