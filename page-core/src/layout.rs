//! Canvas geometry: positions, grid snapping, collision and responsive scaling.
//!
//! Everything here is a pure value computation over canvas pixels.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_BASE_WIDTH;
use crate::{PageError, PageResult};

/// An unconstrained point, as produced by grid snapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

/// A component's canvas position.
///
/// Both coordinates are non-negative; this is checked on construction and on
/// deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Point", into = "Point")]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    /// The canvas origin.
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Create a position.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidPosition`] if either coordinate is negative
    /// or not a number.
    pub fn new(x: f64, y: f64) -> PageResult<Self> {
        if x.is_nan() || y.is_nan() || x < 0.0 || y < 0.0 {
            return Err(PageError::InvalidPosition { x, y });
        }
        Ok(Self { x, y })
    }

    /// X coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Y coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// Translate by a delta.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::InvalidPosition`] if the result leaves the canvas.
    pub fn move_by(&self, dx: f64, dy: f64) -> PageResult<Self> {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Snap to the nearest grid intersection.
    ///
    /// # Panics
    ///
    /// Panics if `grid_size` is not strictly positive.
    #[must_use]
    pub fn snap_to_grid(&self, grid_size: f64) -> Self {
        let snapped = snap_to_grid(self.x, self.y, grid_size);
        // Rounding a non-negative value to a positive multiple never goes negative.
        Self {
            x: snapped.x.max(0.0),
            y: snapped.y.max(0.0),
        }
    }

    /// Position of `self` expressed relative to `origin`, floored at zero.
    #[must_use]
    pub fn relative_to(&self, origin: &Self) -> Self {
        Self {
            x: (self.x - origin.x).max(0.0),
            y: (self.y - origin.y).max(0.0),
        }
    }

    /// Position of a local coordinate once its container sits at `origin`.
    #[must_use]
    pub fn offset_by(&self, origin: &Self) -> Self {
        Self {
            x: self.x + origin.x,
            y: self.y + origin.y,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl TryFrom<Point> for Position {
    type Error = PageError;

    fn try_from(p: Point) -> Result<Self, Self::Error> {
        Self::new(p.x, p.y)
    }
}

impl From<Position> for Point {
    fn from(p: Position) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// Round each coordinate to the nearest multiple of `grid_size`.
///
/// Idempotent: snapping a snapped point returns the same point.
///
/// # Panics
///
/// Panics if `grid_size` is not strictly positive; that is a caller bug.
#[must_use]
pub fn snap_to_grid(x: f64, y: f64, grid_size: f64) -> Point {
    assert!(grid_size > 0.0, "grid size must be positive, got {grid_size}");
    Point {
        x: (x / grid_size).round() * grid_size,
        y: (y / grid_size).round() * grid_size,
    }
}

/// Check whether both coordinates already sit on the grid.
///
/// # Panics
///
/// Panics if `grid_size` is not strictly positive.
#[must_use]
pub fn is_on_grid(x: f64, y: f64, grid_size: f64) -> bool {
    assert!(grid_size > 0.0, "grid size must be positive, got {grid_size}");
    x % grid_size == 0.0 && y % grid_size == 0.0
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Bounds {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check whether a point lies inside (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }
}

/// AABB overlap test. Rectangles that only share an edge do not collide.
#[must_use]
pub fn detect_collision(a: &Bounds, b: &Bounds) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// The intersecting rectangle, or `None` when the rectangles do not collide.
#[must_use]
pub fn overlap(a: &Bounds, b: &Bounds) -> Option<Bounds> {
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let width = a.right().min(b.right()) - x;
    let height = a.bottom().min(b.bottom()) - y;

    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    Some(Bounds::new(x, y, width, height))
}

/// Viewport parameters for responsive scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponsiveOptions {
    /// Current viewport width.
    pub viewport_width: f64,
    /// Width the design was authored at.
    #[serde(default = "ResponsiveOptions::default_base_width")]
    pub base_width: f64,
    /// Lower clamp for scaled values.
    #[serde(default)]
    pub min_width: Option<f64>,
    /// Upper clamp for scaled values.
    #[serde(default)]
    pub max_width: Option<f64>,
}

impl ResponsiveOptions {
    /// Options for a viewport against the default 1920px design width.
    #[must_use]
    pub const fn for_viewport(viewport_width: f64) -> Self {
        Self {
            viewport_width,
            base_width: DEFAULT_BASE_WIDTH,
            min_width: None,
            max_width: None,
        }
    }

    /// Set the clamp range.
    #[must_use]
    pub const fn with_clamp(mut self, min_width: Option<f64>, max_width: Option<f64>) -> Self {
        self.min_width = min_width;
        self.max_width = max_width;
        self
    }

    const fn default_base_width() -> f64 {
        DEFAULT_BASE_WIDTH
    }

    fn ratio(&self) -> f64 {
        self.viewport_width / self.base_width
    }

    fn clamp(&self, value: f64) -> f64 {
        let value = self.min_width.map_or(value, |min| value.max(min));
        self.max_width.map_or(value, |max| value.min(max))
    }
}

/// Scale a width to the viewport, then clamp.
#[must_use]
pub fn responsive_width(value: f64, options: &ResponsiveOptions) -> f64 {
    options.clamp(value * options.ratio())
}

/// Scale a horizontal coordinate to the viewport, then clamp.
#[must_use]
pub fn responsive_x(value: f64, options: &ResponsiveOptions) -> f64 {
    options.clamp(value * options.ratio())
}

/// Vertical coordinates keep their authored value; only width drives scaling.
#[must_use]
pub fn responsive_y(value: f64, _options: &ResponsiveOptions) -> f64 {
    value
}

/// Scale both dimensions by the viewport ratio.
#[must_use]
pub fn responsive_dimensions(width: f64, height: f64, options: &ResponsiveOptions) -> (f64, f64) {
    let ratio = options.ratio();
    (width * ratio, height * ratio)
}
