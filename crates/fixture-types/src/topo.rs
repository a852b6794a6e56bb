use serde::{Deserialize, Serialize};

use crate::geom::BoundingBox;

/// The kind of topological entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoKind {
    Vertex,
    Edge,
    Face,
    Solid,
}

/// Underlying geometry of a face or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeomKind {
    Planar,
    Cylindrical,
    /// Any other swept or revolved surface.
    Revolved,
    Nurbs,
    Line,
    Circle,
    /// Any other curve.
    Curve,
    Point,
}

impl GeomKind {
    pub fn is_surface(self) -> bool {
        matches!(
            self,
            GeomKind::Planar | GeomKind::Cylindrical | GeomKind::Revolved | GeomKind::Nurbs
        )
    }
}

/// Geometric signature of a topological entity.
///
/// The selector reads nothing but signatures, so every kernel must fill in
/// the fields its predicates need: `normal` for planar faces, `direction`
/// for straight edges and cylinder axes, `centroid` and `bbox` for all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopoSignature {
    pub kind: GeomKind,
    /// Surface area (faces).
    pub area: Option<f64>,
    pub centroid: [f64; 3],
    /// Outward unit normal. `None` for curved faces.
    pub normal: Option<[f64; 3]>,
    /// Unit tangent of a straight edge, or the axis of a cylindrical face
    /// or circular edge.
    pub direction: Option<[f64; 3]>,
    /// Radius of a cylindrical face or circular edge.
    pub radius: Option<f64>,
    pub bbox: BoundingBox,
    /// Edge length (edges).
    pub length: Option<f64>,
}

impl TopoSignature {
    pub fn empty() -> Self {
        Self {
            kind: GeomKind::Point,
            area: None,
            centroid: [0.0; 3],
            normal: None,
            direction: None,
            radius: None,
            bbox: BoundingBox::empty(),
            length: None,
        }
    }
}
