use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::geom::{PlaneName, Point2D};

/// A 2D coordinate frame embedded in 3D space.
///
/// Workplanes are values. Offsetting or rotating one yields a new workplane,
/// so a plane that a profile was drawn on stays valid for later steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Workplane {
    origin: Point3<f64>,
    x_dir: Unit<Vector3<f64>>,
    normal: Unit<Vector3<f64>>,
}

impl Workplane {
    /// One of the named planes through the global origin.
    pub fn named(name: PlaneName) -> Self {
        let (x, n) = name.basis();
        Self {
            origin: Point3::origin(),
            x_dir: Unit::new_unchecked(Vector3::from(x)),
            normal: Unit::new_unchecked(Vector3::from(n)),
        }
    }

    pub fn xy() -> Self {
        Self::named(PlaneName::XY)
    }

    pub fn yz() -> Self {
        Self::named(PlaneName::YZ)
    }

    pub fn xz() -> Self {
        Self::named(PlaneName::XZ)
    }

    /// Build a frame from an origin, a normal and a rough x direction.
    ///
    /// `x_dir` is projected onto the plane. Returns `None` when the normal
    /// is zero or `x_dir` is parallel to it.
    pub fn from_frame(origin: [f64; 3], x_dir: [f64; 3], normal: [f64; 3]) -> Option<Self> {
        let normal = Unit::try_new(Vector3::from(normal), 1e-12)?;
        let x = Vector3::from(x_dir);
        let x = x - normal.into_inner() * x.dot(&normal.into_inner());
        let x_dir = Unit::try_new(x, 1e-9)?;
        Some(Self {
            origin: Point3::from(origin),
            x_dir,
            normal,
        })
    }

    pub fn origin(&self) -> [f64; 3] {
        self.origin.coords.into()
    }

    pub fn x_dir(&self) -> [f64; 3] {
        self.x_dir.into_inner().into()
    }

    /// Local y direction, `normal × x_dir`.
    pub fn y_dir(&self) -> [f64; 3] {
        self.normal.cross(&self.x_dir.into_inner()).into()
    }

    pub fn normal(&self) -> [f64; 3] {
        self.normal.into_inner().into()
    }

    /// Derive a new workplane.
    ///
    /// `offset` is expressed in this plane's local frame (x, y, normal).
    /// `rotate_deg` rotates the new frame about its own local X, then Y,
    /// then Z axis, in degrees.
    pub fn transformed(&self, offset: [f64; 3], rotate_deg: [f64; 3]) -> Self {
        let x = self.x_dir.into_inner();
        let n = self.normal.into_inner();
        let y = n.cross(&x);
        let origin = self.origin + x * offset[0] + y * offset[1] + n * offset[2];

        let [rx, ry, rz] = rotate_deg.map(f64::to_radians);
        let local = Rotation3::from_axis_angle(&Vector3::x_axis(), rx)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), ry)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), rz);
        let frame = Rotation3::from_basis_unchecked(&[x, y, n]);
        let rotated = frame * local;

        Self {
            origin,
            x_dir: Unit::new_normalize(rotated * Vector3::x()),
            normal: Unit::new_normalize(rotated * Vector3::z()),
        }
    }

    /// Shift along the plane's own axes without rotating.
    pub fn offset(&self, offset: [f64; 3]) -> Self {
        self.transformed(offset, [0.0; 3])
    }

    /// Map a local point to global coordinates.
    pub fn to_global(&self, p: Point2D) -> [f64; 3] {
        let y = self.normal.cross(&self.x_dir.into_inner());
        (self.origin + self.x_dir.into_inner() * p.x + y * p.y).coords.into()
    }

    /// Project a global point onto the plane's local coordinates.
    pub fn to_local(&self, p: [f64; 3]) -> Point2D {
        let d = Point3::from(p) - self.origin;
        let y = self.normal.cross(&self.x_dir.into_inner());
        Point2D::new(d.dot(&self.x_dir.into_inner()), d.dot(&y))
    }
}

impl Default for Workplane {
    fn default() -> Self {
        Self::xy()
    }
}
