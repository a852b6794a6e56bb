use serde::{Deserialize, Serialize};

/// One of the three principal axes of the shared coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into `[x, y, z]` arrays.
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> [f64; 3] {
        let mut v = [0.0; 3];
        v[self.index()] = 1.0;
        v
    }

    /// Coordinate of `p` along this axis.
    pub fn coord(self, p: [f64; 3]) -> f64 {
        p[self.index()]
    }
}

/// Direction along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Pos,
    Neg,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Pos => 1.0,
            Sign::Neg => -1.0,
        }
    }
}

/// Which end of an axis an extremal or rank predicate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sense {
    /// Smallest coordinate first (`<X`).
    Min,
    /// Largest coordinate first (`>X`).
    Max,
}

/// Named axis-aligned reference planes.
///
/// Bases: `XY` x=+X normal=+Z, `YZ` x=+Y normal=+X, `XZ` x=+X normal=-Y.
/// The local y direction is always `normal × x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaneName {
    XY,
    YZ,
    XZ,
}

impl PlaneName {
    /// `(x_dir, normal)` of the plane.
    pub fn basis(self) -> ([f64; 3], [f64; 3]) {
        match self {
            PlaneName::XY => ([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            PlaneName::YZ => ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            PlaneName::XZ => ([1.0, 0.0, 0.0], [0.0, -1.0, 0.0]),
        }
    }

    /// The principal axis perpendicular to this plane. Mirroring "across XZ"
    /// flips the Y coordinate.
    pub fn normal_axis(self) -> Axis {
        match self {
            PlaneName::XY => Axis::Z,
            PlaneName::YZ => Axis::X,
            PlaneName::XZ => Axis::Y,
        }
    }
}

/// A point on a workplane, in the plane's local coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const ORIGIN: Point2D = Point2D { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn from_points(points: &[[f64; 3]]) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_to_include(*p);
        }
        bb
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    pub fn expand_to_include(&mut self, p: [f64; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.expand_to_include(other.min);
        out.expand_to_include(other.max);
        out
    }

    pub fn extent(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn center(&self) -> [f64; 3] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        ]
    }

    pub fn diagonal(&self) -> f64 {
        let e = self.extent();
        (e[0] * e[0] + e[1] * e[1] + e[2] * e[2]).sqrt()
    }

    /// True when the two boxes share a region of positive volume.
    /// Boxes that only touch along a face do not overlap.
    pub fn overlaps(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|i| self.min[i] < other.max[i] - tol && other.min[i] < self.max[i] - tol)
    }

    /// Clip to the region shared with `other`.
    pub fn intersection(&self, other: &Self) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = self.min[i].max(other.min[i]);
            out.max[i] = self.max[i].min(other.max[i]);
        }
        out
    }

    /// True when `p` lies inside the box and off its boundary.
    pub fn contains_strictly(&self, p: [f64; 3], tol: f64) -> bool {
        (0..3).all(|i| p[i] > self.min[i] + tol && p[i] < self.max[i] - tol)
    }

    /// True when `other` lies within this box (boundary included).
    pub fn encloses(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] - tol && other.max[i] <= self.max[i] + tol)
    }

    /// Nearest point of the box to `p`.
    pub fn clamp(&self, p: [f64; 3]) -> [f64; 3] {
        [
            p[0].clamp(self.min[0], self.max[0]),
            p[1].clamp(self.min[1], self.max[1]),
            p[2].clamp(self.min[2], self.max[2]),
        ]
    }

    /// Extent of the box measured along a unit direction.
    pub fn span_along(&self, dir: [f64; 3]) -> f64 {
        let e = self.extent();
        e[0] * dir[0].abs() + e[1] * dir[1].abs() + e[2] * dir[2].abs()
    }

    /// The box reflected through the plane `axis = 0`.
    pub fn reflected(&self, axis: Axis) -> Self {
        let i = axis.index();
        let mut out = *self;
        out.min[i] = -self.max[i];
        out.max[i] = -self.min[i];
        out
    }

    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() <= tol && (self.max[i] - other.max[i]).abs() <= tol
        })
    }
}

/// Tolerances for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Coordinates closer than this are treated as coincident.
    pub coincidence: f64,
    /// Two unit directions are parallel when `1 - |a·b|` is below this.
    pub angular: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            coincidence: 1e-6,
            angular: 1e-6,
        }
    }
}

impl Tolerance {
    pub fn coincident(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.coincidence
    }

    pub fn points_coincident(&self, a: &Point2D, b: &Point2D) -> bool {
        a.distance_to(b) <= self.coincidence
    }

    /// Parallel or anti-parallel. Both inputs must be unit length.
    pub fn parallel(&self, a: [f64; 3], b: [f64; 3]) -> bool {
        1.0 - dot(a, b).abs() <= self.angular
    }

    /// Same direction. Both inputs must be unit length.
    pub fn codirectional(&self, a: [f64; 3], b: [f64; 3]) -> bool {
        1.0 - dot(a, b) <= self.angular
    }

    pub fn perpendicular(&self, a: [f64; 3], b: [f64; 3]) -> bool {
        dot(a, b).abs() <= self.angular.sqrt()
    }
}

pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Normalize `a`, or `None` for a (near) zero vector.
pub fn normalize(a: [f64; 3]) -> Option<[f64; 3]> {
    let len = norm(a);
    if len < 1e-12 {
        None
    } else {
        Some([a[0] / len, a[1] / len, a[2] / len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_bases_are_right_handed() {
        for plane in [PlaneName::XY, PlaneName::YZ, PlaneName::XZ] {
            let (x, n) = plane.basis();
            let y = cross(n, x);
            assert!((dot(x, y)).abs() < 1e-12);
            assert!((norm(y) - 1.0).abs() < 1e-12);
        }
        let (x, n) = PlaneName::XZ.basis();
        assert_eq!(cross(n, x), [0.0, 0.0, 1.0], "XZ local y maps to +Z");
    }

    #[test]
    fn bounding_box_overlap_excludes_touching() {
        let a = BoundingBox::new([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]);
        let b = BoundingBox::new([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]);
        let touching = BoundingBox::new([2.0, 0.0, 0.0], [3.0, 2.0, 2.0]);
        let far = BoundingBox::new([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        assert!(a.overlaps(&b, 1e-9));
        assert!(!a.overlaps(&touching, 1e-9));
        assert!(!a.overlaps(&far, 1e-9));
    }

    #[test]
    fn bounding_box_reflection() {
        let bb = BoundingBox::new([1.0, -2.0, 0.0], [4.0, 3.0, 1.0]);
        let r = bb.reflected(Axis::X);
        assert_eq!(r.min, [-4.0, -2.0, 0.0]);
        assert_eq!(r.max, [-1.0, 3.0, 1.0]);
        assert!(r.reflected(Axis::X).approx_eq(&bb, 1e-12));
    }

    #[test]
    fn tolerance_parallel_and_perpendicular() {
        let tol = Tolerance::default();
        assert!(tol.parallel([1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]));
        assert!(!tol.codirectional([1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]));
        assert!(tol.perpendicular([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]));
        assert!(!tol.parallel([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]));
    }
}
