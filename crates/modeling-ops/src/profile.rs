//! Profile Builder: 2D cross-sections on a workplane.

use std::f64::consts::PI;

use fixture_types::{Point2D, Tolerance, Workplane};
use geom_kernel::PlanarWire;
use serde::{Deserialize, Serialize};

use crate::types::OpError;

/// Local axis of the workplane used as a mirror line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MirrorAxis {
    /// Mirror across the local x axis (y becomes -y).
    X,
    /// Mirror across the local y axis (x becomes -x).
    Y,
}

impl MirrorAxis {
    pub fn reflect(self, p: Point2D) -> Point2D {
        match self {
            MirrorAxis::X => Point2D::new(p.x, -p.y),
            MirrorAxis::Y => Point2D::new(-p.x, p.y),
        }
    }

    fn offset(self, p: Point2D) -> f64 {
        match self {
            MirrorAxis::X => p.y,
            MirrorAxis::Y => p.x,
        }
    }

    /// Normal of the 3D mirror plane through the workplane origin.
    pub fn plane_normal(self, plane: &Workplane) -> [f64; 3] {
        match self {
            MirrorAxis::X => plane.y_dir(),
            MirrorAxis::Y => plane.x_dir(),
        }
    }
}

/// How a half profile becomes symmetric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "axis")]
pub enum MirrorMode {
    /// Double the 2D path now.
    Path(MirrorAxis),
    /// Sweep the half and union it with its mirror image.
    Solid(MirrorAxis),
}

/// Boundary of a profile in workplane coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Path { points: Vec<Point2D>, closed: bool },
    Circle { center: Point2D, radius: f64 },
}

/// A 2D cross-section placed on a workplane.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    plane: Workplane,
    outline: Outline,
    /// Pending solid mirror, applied by the Sweep Engine.
    solid_mirror: Option<MirrorAxis>,
}

impl Profile {
    /// Axis-aligned rectangle centered on the plane origin.
    pub fn rect(plane: Workplane, width: f64, height: f64) -> Result<Self, OpError> {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return Err(OpError::InvalidParameter {
                reason: format!("rectangle {width} x {height} must have positive sides"),
            });
        }
        let (hw, hh) = (width / 2.0, height / 2.0);
        Ok(Self {
            plane,
            outline: Outline::Path {
                points: vec![
                    Point2D::new(-hw, -hh),
                    Point2D::new(hw, -hh),
                    Point2D::new(hw, hh),
                    Point2D::new(-hw, hh),
                ],
                closed: true,
            },
            solid_mirror: None,
        })
    }

    pub fn circle(plane: Workplane, center: Point2D, radius: f64) -> Result<Self, OpError> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(OpError::InvalidParameter {
                reason: format!("circle radius must be positive, got {radius}"),
            });
        }
        Ok(Self {
            plane,
            outline: Outline::Circle { center, radius },
            solid_mirror: None,
        })
    }

    /// Regular polygon centered on the plane origin, first vertex on +x.
    ///
    /// With `circumscribed` the polygon is drawn around a circle of
    /// `diameter` (the across-flats size); otherwise its vertices lie on
    /// that circle.
    pub fn regular_polygon(
        plane: Workplane,
        sides: usize,
        diameter: f64,
        circumscribed: bool,
    ) -> Result<Self, OpError> {
        if sides < 3 {
            return Err(OpError::DegenerateProfile {
                points: sides,
                required: 3,
            });
        }
        if !(diameter > 0.0 && diameter.is_finite()) {
            return Err(OpError::InvalidParameter {
                reason: format!("polygon diameter must be positive, got {diameter}"),
            });
        }
        let step = 2.0 * PI / sides as f64;
        let radius = if circumscribed {
            diameter / 2.0 / (PI / sides as f64).cos()
        } else {
            diameter / 2.0
        };
        let points = (0..sides)
            .map(|i| {
                let a = step * i as f64;
                Point2D::new(radius * a.cos(), radius * a.sin())
            })
            .collect();
        Ok(Self {
            plane,
            outline: Outline::Path {
                points,
                closed: true,
            },
            solid_mirror: None,
        })
    }

    pub fn plane(&self) -> &Workplane {
        &self.plane
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn solid_mirror(&self) -> Option<MirrorAxis> {
        self.solid_mirror
    }

    pub fn is_closed(&self) -> bool {
        match &self.outline {
            Outline::Path { closed, .. } => *closed,
            Outline::Circle { .. } => true,
        }
    }

    /// The profile boundary in global coordinates.
    pub fn to_wire(&self) -> PlanarWire {
        let normal = self.plane.normal();
        match &self.outline {
            Outline::Path { points, .. } => PlanarWire::Polygon {
                vertices: points.iter().map(|p| self.plane.to_global(*p)).collect(),
                normal,
            },
            Outline::Circle { center, radius } => PlanarWire::Circle {
                center: self.plane.to_global(*center),
                normal,
                radius: *radius,
            },
        }
    }
}

/// Build a polyline profile.
///
/// The path starts at `start`, or at the plane origin when `start` is
/// `None`, and visits `points` in order. Points are absolute plane
/// coordinates.
pub fn build(
    plane: Workplane,
    start: Option<Point2D>,
    points: &[Point2D],
    closed: bool,
    mirror: Option<MirrorMode>,
) -> Result<Profile, OpError> {
    let tol = Tolerance::default();
    let mut path: Vec<Point2D> = Vec::with_capacity(points.len() + 1);
    for p in std::iter::once(start.unwrap_or(Point2D::ORIGIN)).chain(points.iter().copied()) {
        if !(p.x.is_finite() && p.y.is_finite()) {
            return Err(OpError::InvalidParameter {
                reason: format!("profile point ({}, {}) is not finite", p.x, p.y),
            });
        }
        if path.last().is_some_and(|q| tol.points_coincident(q, &p)) {
            continue;
        }
        path.push(p);
    }
    // An explicit return to the start is the same as closing.
    if closed && path.len() > 1 && tol.points_coincident(&path[0], &path[path.len() - 1]) {
        path.pop();
    }

    let required = if closed { 3 } else { 2 };
    let distinct = count_distinct(&path, &tol);
    if distinct < required {
        return Err(OpError::DegenerateProfile {
            points: distinct,
            required,
        });
    }

    let mut solid_mirror = None;
    match mirror {
        Some(MirrorMode::Path(axis)) => path = mirror_path(&path, axis, closed, &tol),
        Some(MirrorMode::Solid(axis)) => solid_mirror = Some(axis),
        None => {}
    }

    Ok(Profile {
        plane,
        outline: Outline::Path {
            points: path,
            closed,
        },
        solid_mirror,
    })
}

fn count_distinct(points: &[Point2D], tol: &Tolerance) -> usize {
    let mut seen: Vec<Point2D> = Vec::new();
    for p in points {
        if !seen.iter().any(|q| tol.points_coincident(q, p)) {
            seen.push(*p);
        }
    }
    seen.len()
}

/// `path` followed by its reflection walked backwards. Points on the mirror
/// line are shared by both halves and kept once; a shared point that ends
/// up between two collinear segments is dropped.
fn mirror_path(path: &[Point2D], axis: MirrorAxis, closed: bool, tol: &Tolerance) -> Vec<Point2D> {
    let mut out: Vec<Point2D> = path.to_vec();
    for p in path.iter().rev() {
        let m = axis.reflect(*p);
        if out.last().is_some_and(|q| tol.points_coincident(q, &m)) {
            continue;
        }
        out.push(m);
    }
    if out.len() > 1 && tol.points_coincident(&out[0], &out[out.len() - 1]) {
        out.pop();
    }
    if !closed {
        return out;
    }

    let n = out.len();
    let keep: Vec<bool> = (0..n)
        .map(|i| {
            let p = out[i];
            if !tol.coincident(axis.offset(p), 0.0) {
                return true;
            }
            let prev = out[(i + n - 1) % n];
            let next = out[(i + 1) % n];
            let cross = (p.x - prev.x) * (next.y - p.y) - (p.y - prev.y) * (next.x - p.x);
            cross.abs() > tol.coincidence
        })
        .collect();
    out.into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

/// Fluent construction of a polyline profile.
///
/// ```ignore
/// let half = ProfileBuilder::new(Workplane::xz())
///     .line_to(8.5, 0.0)
///     .line_to(3.25, 5.25)
///     .line_to(0.0, 5.25)
///     .close()
///     .mirror_solid(MirrorAxis::Y)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    plane: Workplane,
    start: Option<Point2D>,
    points: Vec<Point2D>,
    closed: bool,
    mirror: Option<MirrorMode>,
    moved_after_line: bool,
}

impl ProfileBuilder {
    pub fn new(plane: Workplane) -> Self {
        Self {
            plane,
            start: None,
            points: Vec::new(),
            closed: false,
            mirror: None,
            moved_after_line: false,
        }
    }

    /// Set the start point. Only meaningful before the first `line_to`.
    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        if self.points.is_empty() {
            self.start = Some(Point2D::new(x, y));
        } else {
            self.moved_after_line = true;
        }
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        self.points.push(Point2D::new(x, y));
        self
    }

    pub fn close(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn mirror_path(mut self, axis: MirrorAxis) -> Self {
        self.mirror = Some(MirrorMode::Path(axis));
        self
    }

    pub fn mirror_solid(mut self, axis: MirrorAxis) -> Self {
        self.mirror = Some(MirrorMode::Solid(axis));
        self
    }

    pub fn build(self) -> Result<Profile, OpError> {
        if self.moved_after_line {
            return Err(OpError::InvalidProfile {
                reason: "move_to after line_to would start a second wire".to_string(),
            });
        }
        build(self.plane, self.start, &self.points, self.closed, self.mirror)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn path_points(profile: &Profile) -> Vec<Point2D> {
        match profile.outline() {
            Outline::Path { points, .. } => points.clone(),
            Outline::Circle { .. } => panic!("expected a path"),
        }
    }

    #[test]
    fn path_starts_at_plane_origin() {
        let profile = ProfileBuilder::new(Workplane::xy())
            .line_to(4.0, 0.0)
            .line_to(4.0, 2.0)
            .close()
            .build()
            .unwrap();
        let pts = path_points(&profile);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0], Point2D::ORIGIN);
        assert!(profile.is_closed());
    }

    #[test]
    fn explicit_start_replaces_origin() {
        let profile = ProfileBuilder::new(Workplane::xy())
            .move_to(1.0, 1.0)
            .line_to(2.0, 1.0)
            .build()
            .unwrap();
        assert_eq!(path_points(&profile)[0], Point2D::new(1.0, 1.0));
        assert!(!profile.is_closed());
    }

    #[test]
    fn too_few_distinct_points_is_degenerate() {
        let result = ProfileBuilder::new(Workplane::xy())
            .line_to(1.0, 0.0)
            .line_to(1.0, 0.0)
            .close()
            .build();
        assert!(matches!(
            result,
            Err(OpError::DegenerateProfile { points: 2, required: 3 })
        ));

        let open = build(Workplane::xy(), None, &[Point2D::ORIGIN], false, None);
        assert!(matches!(
            open,
            Err(OpError::DegenerateProfile { points: 1, required: 2 })
        ));
    }

    #[test]
    fn move_to_after_line_is_rejected() {
        let result = ProfileBuilder::new(Workplane::xy())
            .line_to(1.0, 0.0)
            .move_to(5.0, 5.0)
            .line_to(1.0, 1.0)
            .close()
            .build();
        assert!(matches!(result, Err(OpError::InvalidProfile { .. })));
    }

    #[test]
    fn path_mirror_joins_halves_without_seam_points() {
        let profile = ProfileBuilder::new(Workplane::xz())
            .line_to(8.5, 0.0)
            .line_to(3.25, 5.25)
            .line_to(0.0, 5.25)
            .close()
            .mirror_path(MirrorAxis::Y)
            .build()
            .unwrap();
        let pts = path_points(&profile);
        assert_eq!(
            pts,
            vec![
                Point2D::new(8.5, 0.0),
                Point2D::new(3.25, 5.25),
                Point2D::new(-3.25, 5.25),
                Point2D::new(-8.5, 0.0),
            ]
        );
        assert!(profile.solid_mirror().is_none());
    }

    #[test]
    fn solid_mirror_is_deferred() {
        let profile = ProfileBuilder::new(Workplane::yz())
            .line_to(2.0, 0.0)
            .line_to(2.0, 1.0)
            .close()
            .mirror_solid(MirrorAxis::Y)
            .build()
            .unwrap();
        assert_eq!(path_points(&profile).len(), 3);
        assert_eq!(profile.solid_mirror(), Some(MirrorAxis::Y));
        assert_eq!(MirrorAxis::Y.plane_normal(profile.plane()), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn circumscribed_hexagon_has_requested_flats() {
        let profile = Profile::regular_polygon(Workplane::xy(), 6, 11.0, true).unwrap();
        let pts = path_points(&profile);
        assert_eq!(pts.len(), 6);
        // flat between vertices 0 and 1 sits at the inscribed radius
        let mid = Point2D::new((pts[0].x + pts[1].x) / 2.0, (pts[0].y + pts[1].y) / 2.0);
        assert_relative_eq!(mid.distance_to(&Point2D::ORIGIN), 5.5, epsilon = 1e-9);
    }

    #[test]
    fn wire_uses_plane_basis() {
        let profile = Profile::rect(Workplane::yz(), 4.0, 2.0).unwrap();
        match profile.to_wire() {
            PlanarWire::Polygon { vertices, normal } => {
                assert_eq!(normal, [1.0, 0.0, 0.0]);
                assert_eq!(vertices[0], [0.0, -2.0, -1.0]);
            }
            other => panic!("unexpected wire {other:?}"),
        }
    }
}
