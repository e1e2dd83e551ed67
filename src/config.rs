//! drawbot configuration.
//!
//! Loaded from `~/.drawbot/config.toml`. Every key is optional; a missing
//! file is the same as an empty one.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::render::MAX_DIMENSION;

/// Canvas width the AI is told to draw for.
pub const DEFAULT_CANVAS_WIDTH: u32 = 900;

/// Canvas height the AI is told to draw for.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 460;

/// drawbot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Width of rendered images, in pixels.
    pub canvas_width: u32,

    /// Height of rendered images, in pixels.
    pub canvas_height: u32,

    /// The user to act as when neither `--user` nor `DRAWBOT_USER` is set.
    pub default_user: Option<Uuid>,

    /// Where drawings and the session live. Defaults to `~/.drawbot/data`.
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            default_user: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load config from `~/.drawbot/config.toml`, or defaults if it doesn't exist.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if config.canvas_width == 0 || config.canvas_height == 0 {
            return Err(format!("canvas size must be non-zero in {}", path.display()));
        }
        if config.canvas_width > MAX_DIMENSION || config.canvas_height > MAX_DIMENSION {
            return Err(format!(
                "canvas size in {} exceeds the {MAX_DIMENSION}px limit",
                path.display()
            ));
        }
        if config.default_user.is_some_and(|u| u.is_nil()) {
            return Err(format!("default-user in {} is the nil UUID", path.display()));
        }

        Ok(config)
    }

    /// The config file path: `~/.drawbot/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".drawbot").join("config.toml"))
    }
}
