#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.
//!
//! All coordinates are viewport-relative (`clientX`/`clientY` space), origin
//! at the top-left corner.

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.width.min(other.width), self.height.min(other.height))
    }
}

/// The visible area of the hosting page.
pub type Viewport = Size;

/// Placement of the preview window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowRect {
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Top-left corner.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Place a window of `size` with its top-left corner at `anchor`, then
    /// pull it back inside `viewport`.
    ///
    /// The size is first limited to the viewport and then raised to `min`,
    /// so the minimum wins on viewports smaller than the minimum size. The
    /// position is clamped to `[0, viewport - size]` on both axes; when the
    /// window is larger than the viewport it is pinned to the origin.
    #[must_use]
    pub fn placed(anchor: Point, size: Size, min: Size, viewport: Viewport) -> Self {
        let size = size.min(viewport).max(min);
        let x = clamp_axis(anchor.x, size.width, viewport.width);
        let y = clamp_axis(anchor.y, size.height, viewport.height);
        Self::new(x, y, size.width, size.height)
    }

    /// Raise the size to at least `min`. Returns `true` if anything changed.
    pub fn enforce_min(&mut self, min: Size) -> bool {
        let clamped = self.size().max(min);
        let changed = clamped != self.size();
        self.width = clamped.width;
        self.height = clamped.height;
        changed
    }

    /// Whether the rectangle lies fully within the viewport.
    #[must_use]
    pub fn fits_in(&self, viewport: Viewport) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= viewport.width
            && self.y + self.height <= viewport.height
    }
}

fn clamp_axis(start: f64, extent: f64, limit: f64) -> f64 {
    let max = (limit - extent).max(0.0);
    if start.is_nan() {
        return 0.0;
    }
    start.clamp(0.0, max)
}
