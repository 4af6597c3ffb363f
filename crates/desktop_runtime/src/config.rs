//! Window manager tuning constants, loadable from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Position, Size};

/// Default durable storage key for the desktop record.
pub const DEFAULT_STORAGE_KEY: &str = "desktop-state";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Diagonal placement used for windows opened without an explicit position.
pub struct CascadeConfig {
    /// Position of the first cascaded window.
    pub base: Position,
    /// Offset added per already-open window.
    pub step: i32,
    /// Offsets wrap modulo this value.
    pub max: i32,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            base: Position::new(50, 50),
            step: 30,
            max: 200,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Tunables for the desktop store, geometry, and persistence.
pub struct DesktopConfig {
    /// Durable storage key holding the persisted desktop record.
    pub storage_key: String,
    /// Quiet window before a debounced save is written.
    pub save_debounce_ms: u64,
    /// Size used when a window is opened without one.
    pub default_window_size: Size,
    /// Smallest size a resize gesture may produce.
    pub min_window_size: Size,
    /// Cascade placement for new windows.
    pub cascade: CascadeConfig,
    /// Distance in px within which a dragged window snaps to a desktop edge.
    pub snap_threshold: i32,
    /// Height of the taskbar band excluded from the window area.
    pub chrome_height: i32,
    /// Vertical position used by centered windows.
    pub center_top_margin: i32,
    /// Highest z-index reserved for desktop chrome; windows stack above it.
    pub chrome_z_index: u32,
    /// Viewport assumed until the host reports the real one.
    pub initial_viewport: Size,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            save_debounce_ms: 1_000,
            default_window_size: Size::new(640, 480),
            min_window_size: Size::new(220, 140),
            cascade: CascadeConfig::default(),
            snap_threshold: 20,
            chrome_height: 48,
            center_top_margin: 40,
            chrome_z_index: 100,
            initial_viewport: Size::new(1280, 800),
        }
    }
}

#[derive(Debug, Error)]
/// Errors raised while loading a [`DesktopConfig`].
pub enum ConfigError {
    /// The document is not valid TOML for this schema.
    #[error("desktop config parse failed: {0}")]
    Parse(#[from] toml::de::Error),
    /// The document parsed but holds values the window manager cannot work with.
    #[error("invalid desktop config: {0}")]
    Invalid(String),
}

impl DesktopConfig {
    /// Parses a TOML document; keys that are absent keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and [`ConfigError::Invalid`] when a value
    /// fails [`DesktopConfig::validate`].
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would otherwise break geometry arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cascade.max <= 0 {
            return Err(ConfigError::Invalid("cascade.max must be positive".into()));
        }
        if self.min_window_size.width <= 0 || self.min_window_size.height <= 0 {
            return Err(ConfigError::Invalid(
                "min_window_size must be positive".into(),
            ));
        }
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".into()));
        }
        if self.snap_threshold < 0 || self.chrome_height < 0 {
            return Err(ConfigError::Invalid(
                "snap_threshold and chrome_height must not be negative".into(),
            ));
        }
        Ok(())
    }
}
