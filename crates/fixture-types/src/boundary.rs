//! Measuring planar faces from one of their straight edges.

use crate::geom::{cross, dot, normalize, scale, sub};

/// Crossings closer to the ray origin than this belong to the edge itself.
const HIT_EPS: f64 = 1e-9;

/// One curve on the boundary of a planar face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCurve {
    Segment { start: [f64; 3], end: [f64; 3] },
    /// A full circle lying in the face plane, e.g. the rim of a hole.
    Circle { center: [f64; 3], radius: f64 },
}

/// Where a face lies relative to one of its edges, and how far it reaches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Across {
    /// Unit direction from the edge into the face, perpendicular to the edge.
    pub inward: [f64; 3],
    /// Distance from the edge midpoint to the nearest other boundary curve
    /// along `inward`.
    pub width: f64,
    /// Index into the boundary slice of the curve that bounds `width`.
    pub curve: usize,
}

/// Measure a planar face from the straight edge through `mid` along
/// `edge_dir`.
///
/// `boundary` holds every other curve of the face, in any order. A ray from
/// the midpoint, perpendicular to the edge within the face plane, crosses the
/// rest of the boundary an odd number of times on the side the face lies on.
/// This holds for non-convex faces and faces with holes alike. Returns `None`
/// when neither side gives an odd count, which only happens for an open or
/// inconsistent boundary.
pub fn across_face(
    boundary: &[BoundaryCurve],
    normal: [f64; 3],
    mid: [f64; 3],
    edge_dir: [f64; 3],
) -> Option<Across> {
    let side = normalize(cross(normal, edge_dir))?;
    [side, scale(side, -1.0)].into_iter().find_map(|dir| {
        let hits = ray_hits(boundary, normal, mid, dir);
        if hits.len() % 2 == 0 {
            return None;
        }
        hits.into_iter()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(curve, width)| Across {
                inward: dir,
                width,
                curve,
            })
    })
}

/// Every crossing of the in-plane ray `origin + t·dir`, `t > 0`, with the
/// boundary, as `(curve index, t)`.
///
/// Segment endpoints on the ray count on one side only, so a ray through a
/// vertex is counted once.
fn ray_hits(
    boundary: &[BoundaryCurve],
    normal: [f64; 3],
    origin: [f64; 3],
    dir: [f64; 3],
) -> Vec<(usize, f64)> {
    let Some(lateral) = normalize(cross(normal, dir)) else {
        return Vec::new();
    };
    let mut hits = Vec::new();
    for (i, curve) in boundary.iter().enumerate() {
        match *curve {
            BoundaryCurve::Segment { start, end } => {
                let (a, b) = (sub(start, origin), sub(end, origin));
                let (ha, hb) = (dot(a, lateral), dot(b, lateral));
                if (ha > 0.0) != (hb > 0.0) {
                    let (sa, sb) = (dot(a, dir), dot(b, dir));
                    let t = sa + (sb - sa) * ha / (ha - hb);
                    if t > HIT_EPS {
                        hits.push((i, t));
                    }
                }
            }
            BoundaryCurve::Circle { center, radius } => {
                let c = sub(center, origin);
                let (s, h) = (dot(c, dir), dot(c, lateral));
                let gap = radius * radius - h * h;
                if gap > 0.0 {
                    let half = gap.sqrt();
                    hits.extend(
                        [s - half, s + half]
                            .into_iter()
                            .filter(|t| *t > HIT_EPS)
                            .map(|t| (i, t)),
                    );
                }
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const UP: [f64; 3] = [0.0, 0.0, 1.0];

    fn loop_without_first(pts: &[[f64; 3]]) -> Vec<BoundaryCurve> {
        (1..pts.len())
            .map(|i| BoundaryCurve::Segment {
                start: pts[i],
                end: pts[(i + 1) % pts.len()],
            })
            .collect()
    }

    #[test]
    fn l_shaped_face_is_measured_along_its_thin_leg() {
        // the edge (10,1)→(1,1) comes first and is left out
        let pts = [
            [10.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [1.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
        ];
        let boundary = loop_without_first(&pts);
        let across = across_face(&boundary, UP, [5.5, 1.0, 0.0], [-1.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(across.width, 1.0, epsilon = 1e-12);
        assert_relative_eq!(across.inward[1], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn hole_rim_bounds_the_width() {
        let pts = [
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
        ];
        let mut boundary = loop_without_first(&pts);
        boundary.push(BoundaryCurve::Circle {
            center: [5.0, 6.0, 0.0],
            radius: 2.0,
        });
        let across = across_face(&boundary, UP, [5.0, 0.0, 0.0], [1.0, 0.0, 0.0]).unwrap();
        assert_relative_eq!(across.width, 4.0, epsilon = 1e-12);
        assert_eq!(across.curve, boundary.len() - 1);
    }

    #[test]
    fn open_boundary_has_no_inside() {
        let boundary = [BoundaryCurve::Segment {
            start: [0.0, 5.0, 0.0],
            end: [0.0, 6.0, 0.0],
        }];
        assert!(across_face(&boundary, UP, [5.0, 0.0, 0.0], [1.0, 0.0, 0.0]).is_none());
    }
}
