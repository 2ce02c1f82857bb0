use geo::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D axis-aligned bounding box.
///
/// Coordinates are stored exactly as given: unlike `geo::Rect`, the
/// constructor does not reorder inverted corners. A box whose minimum exceeds
/// its maximum on either axis is *degenerate* and never intersects anything.
///
/// [`BoundingBox::EMPTY`] is the identity for [`BoundingBox::expand_to_include`]:
/// it covers no points, and growing it by any box yields that box.
///
/// # Examples
///
/// ```
/// use mediatree_types::bbox::BoundingBox;
///
/// let mut bbox = BoundingBox::EMPTY;
/// bbox.expand_to_include(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
/// bbox.expand_to_include(&BoundingBox::new(5.0, 5.0, 15.0, 15.0));
/// assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 15.0, 15.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x coordinate
    pub xmin: f64,
    /// Minimum y coordinate
    pub ymin: f64,
    /// Maximum x coordinate
    pub xmax: f64,
    /// Maximum y coordinate
    pub ymax: f64,
}

impl BoundingBox {
    /// The box that covers nothing.
    pub const EMPTY: BoundingBox = BoundingBox {
        xmin: f64::INFINITY,
        ymin: f64::INFINITY,
        xmax: f64::NEG_INFINITY,
        ymax: f64::NEG_INFINITY,
    };

    /// Create a bounding box from its corner coordinates.
    ///
    /// # Arguments
    ///
    /// * `xmin` - Minimum x coordinate
    /// * `ymin` - Minimum y coordinate
    /// * `xmax` - Maximum x coordinate
    /// * `ymax` - Maximum y coordinate
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Whether the minimum corner lies at or below the maximum corner on both axes.
    ///
    /// NaN coordinates make a box invalid.
    pub fn is_valid(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// Whether this is the [`BoundingBox::EMPTY`] sentinel.
    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite() && self.ymin.is_finite() && self.xmax.is_finite() && self.ymax.is_finite()
    }

    pub fn width(&self) -> f64 {
        if self.is_valid() {
            self.xmax - self.xmin
        } else {
            0.0
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_valid() {
            self.ymax - self.ymin
        } else {
            0.0
        }
    }

    /// Area of the box; zero for degenerate and empty boxes.
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Grow this box to the minimal box containing both `self` and `other`.
    ///
    /// Repeated expansion over the same set of boxes yields the same result
    /// in any order.
    pub fn expand_to_include(&mut self, other: &BoundingBox) {
        self.xmin = self.xmin.min(other.xmin);
        self.ymin = self.ymin.min(other.ymin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymax = self.ymax.max(other.ymax);
    }

    /// The minimal box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = *self;
        merged.expand_to_include(other);
        merged
    }

    /// Closed-interval overlap test. Touching edges count as intersecting.
    ///
    /// Degenerate boxes intersect nothing, including themselves.
    ///
    /// ```
    /// use mediatree_types::bbox::BoundingBox;
    ///
    /// let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    /// let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    /// assert!(a.intersects(&b));
    /// assert!(!a.intersects(&BoundingBox::new(10.0, 10.0, 0.0, 0.0)));
    /// ```
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.is_valid()
            && other.is_valid()
            && self.xmin <= other.xmin
            && self.ymin <= other.ymin
            && self.xmax >= other.xmax
            && self.ymax >= other.ymax
    }

    /// Increase in area if this box were grown to include `other`.
    ///
    /// Only meaningful as a ranking key when choosing between candidate
    /// boxes. Zero when `other` already lies inside this box.
    pub fn expansion_cost(&self, other: &BoundingBox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Convert to a `geo::Rect`, or `None` if the box is degenerate or empty.
    pub fn to_rect(&self) -> Option<Rect<f64>> {
        if !self.is_valid() {
            return None;
        }
        Some(Rect::new(
            geo::coord! { x: self.xmin, y: self.ymin },
            geo::coord! { x: self.xmax, y: self.ymax },
        ))
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}
