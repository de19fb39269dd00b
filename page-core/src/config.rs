//! Editor configuration.
//!
//! Values come from [`EditorConfig::default`], a JSON file, and finally the
//! environment:
//!
//! - `PAGE_GRID_SIZE`: grid cell size in canvas pixels (default: 20)
//! - `PAGE_HISTORY_LIMIT`: maximum undo depth, 0 for unbounded (default: 100)
//! - `PAGE_BASE_WIDTH`: design width used for responsive scaling (default: 1920)

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{PageError, PageResult};

/// Default grid cell size in canvas pixels.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// Default maximum number of undo steps.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Default design width that responsive values are expressed against.
pub const DEFAULT_BASE_WIDTH: f64 = 1920.0;

/// Widget types that may hold children.
pub const DEFAULT_CONTAINER_TYPES: [&str; 9] = [
    "container",
    "grid-layout",
    "flex-layout",
    "split-layout",
    "tab-layout",
    "card-group",
    "responsive-container",
    "row",
    "column",
];

/// Configuration shared by the editor session and tree operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Grid cell size used when snapping.
    pub grid_size: f64,
    /// Whether moves snap to the grid.
    pub snap_to_grid: bool,
    /// Maximum undo depth (0 = unlimited).
    pub history_limit: usize,
    /// Design width for responsive scaling.
    pub base_width: f64,
    /// Container-capable widget types.
    pub container_types: Vec<String>,
    /// Local position given to a component dropped into a container.
    pub reparent_offset: (f64, f64),
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
            base_width: DEFAULT_BASE_WIDTH,
            container_types: DEFAULT_CONTAINER_TYPES
                .iter()
                .map(ToString::to_string)
                .collect(),
            reparent_offset: (10.0, 10.0),
        }
    }
}

impl EditorConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> PageResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded editor config from {}", path.as_ref().display());
        Self::from_json(&contents)
    }

    /// Create a configuration from environment variables or defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Overlay values from `PAGE_*` environment variables.
    ///
    /// Unparseable or out-of-range values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(grid) = env_value::<f64>("PAGE_GRID_SIZE").filter(|g| *g > 0.0) {
            self.grid_size = grid;
        }
        if let Some(limit) = env_value::<usize>("PAGE_HISTORY_LIMIT") {
            self.history_limit = limit;
        }
        if let Some(width) = env_value::<f64>("PAGE_BASE_WIDTH").filter(|w| *w > 0.0) {
            self.base_width = width;
        }
        self
    }

    /// Check the configuration for values the layout math cannot handle.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::Config`] for a non-positive grid size or base width.
    pub fn validate(&self) -> PageResult<()> {
        if self.grid_size.is_nan() || self.grid_size <= 0.0 {
            return Err(PageError::Config(format!(
                "grid_size must be positive (got {})",
                self.grid_size
            )));
        }
        if self.base_width.is_nan() || self.base_width <= 0.0 {
            return Err(PageError::Config(format!(
                "base_width must be positive (got {})",
                self.base_width
            )));
        }
        if self.reparent_offset.0 < 0.0 || self.reparent_offset.1 < 0.0 {
            return Err(PageError::Config("reparent_offset must be non-negative".into()));
        }
        Ok(())
    }

    /// Replace values [`Self::validate`] would reject with their defaults.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        if self.grid_size.is_nan() || self.grid_size <= 0.0 {
            tracing::warn!("Invalid grid_size {}, using {DEFAULT_GRID_SIZE}", self.grid_size);
            self.grid_size = DEFAULT_GRID_SIZE;
        }
        if self.base_width.is_nan() || self.base_width <= 0.0 {
            tracing::warn!("Invalid base_width {}, using {DEFAULT_BASE_WIDTH}", self.base_width);
            self.base_width = DEFAULT_BASE_WIDTH;
        }
        if self.reparent_offset.0 < 0.0 || self.reparent_offset.1 < 0.0 {
            tracing::warn!("Negative reparent_offset, using the default");
            self.reparent_offset = Self::default().reparent_offset;
        }
        self
    }

    /// Check whether a widget type may hold children.
    #[must_use]
    pub fn is_container(&self, kind: &str) -> bool {
        self.container_types.iter().any(|t| t == kind)
    }
}

fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        tracing::warn!("Ignoring {key}={raw:?}: not a valid value");
    }
    parsed
}
