//! KernelIntrospect for TruckKernel: topology queries over stored truck solids.
//!
//! Entity ids are positional: `handle * 10000 + index` for faces, with
//! offsets of 1000 for edges and 2000 for vertices.

use crate::traits::KernelIntrospect;
use crate::truck_kernel::TruckKernel;
use crate::types::*;
use std::collections::{HashMap, HashSet};

use truck_modeling::geometry::{Curve, Surface};
use truck_modeling::topology::{Edge, Face, Solid, Vertex};

const EDGE_OFFSET: u64 = 1000;
const VERTEX_OFFSET: u64 = 2000;
const STRIDE: u64 = 10000;

/// Ids are derived from the solid handle and the entity's position, so
/// they stay stable for as long as the solid does.
impl KernelIntrospect for TruckKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..faces_of(truck_solid).len() as u64)
            .map(|i| KernelId(solid.id() * STRIDE + i))
            .collect()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_edges(truck_solid).len() as u64)
            .map(|i| KernelId(solid.id() * STRIDE + EDGE_OFFSET + i))
            .collect()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        (0..unique_vertices(truck_solid).len() as u64)
            .map(|i| KernelId(solid.id() * STRIDE + VERTEX_OFFSET + i))
            .collect()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        let (handle_id, face_idx) = split(face, 0);
        let Some(truck_solid) = self.get_solid(&KernelSolidHandle(handle_id)) else {
            return Vec::new();
        };
        let Some(target) = faces_of(truck_solid).get(face_idx).copied() else {
            return Vec::new();
        };

        let index: HashMap<_, u64> = unique_edges(truck_solid)
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id(), i as u64))
            .collect();
        target
            .boundaries()
            .iter()
            .flat_map(|w| w.edge_iter())
            .filter_map(|e| index.get(&e.id()))
            .map(|i| KernelId(handle_id * STRIDE + EDGE_OFFSET + i))
            .collect()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        let (handle_id, edge_idx) = split(edge, EDGE_OFFSET);
        let Some(truck_solid) = self.get_solid(&KernelSolidHandle(handle_id)) else {
            return Vec::new();
        };
        let Some(target) = unique_edges(truck_solid).get(edge_idx).map(|e| e.id()) else {
            return Vec::new();
        };

        faces_of(truck_solid)
            .iter()
            .enumerate()
            .filter(|(_, face)| {
                face.boundaries()
                    .iter()
                    .flat_map(|w| w.edge_iter())
                    .any(|e| e.id() == target)
            })
            .map(|(fi, _)| KernelId(handle_id * STRIDE + fi as u64))
            .collect()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let handle_id = entity.0 / STRIDE;
        let Some(truck_solid) = self.get_solid(&KernelSolidHandle(handle_id)) else {
            return TopoSignature::empty();
        };

        let found = match kind {
            TopoKind::Face => faces_of(truck_solid)
                .get(split(entity, 0).1)
                .map(|f| face_signature(f)),
            TopoKind::Edge => unique_edges(truck_solid)
                .get(split(entity, EDGE_OFFSET).1)
                .map(edge_signature),
            TopoKind::Vertex => unique_vertices(truck_solid)
                .get(split(entity, VERTEX_OFFSET).1)
                .map(vertex_signature),
            TopoKind::Solid => None,
        };
        found.unwrap_or_else(TopoSignature::empty)
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<BoundingBox> {
        let truck_solid = self.get_solid(solid)?;
        let points: Vec<[f64; 3]> = unique_vertices(truck_solid)
            .iter()
            .map(|v| point_of(v))
            .collect();
        Some(BoundingBox::from_points(&points))
    }
}

fn split(id: KernelId, offset: u64) -> (u64, usize) {
    (id.0 / STRIDE, (id.0 % STRIDE).saturating_sub(offset) as usize)
}

fn faces_of(solid: &Solid) -> Vec<&Face> {
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.face_iter())
        .collect()
}

fn unique_edges(solid: &Solid) -> Vec<Edge> {
    let mut seen = HashSet::new();
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.edge_iter())
        .filter(|e| seen.insert(e.id()))
        .collect()
}

fn unique_vertices(solid: &Solid) -> Vec<Vertex> {
    let mut seen = HashSet::new();
    solid
        .boundaries()
        .iter()
        .flat_map(|shell| shell.vertex_iter())
        .filter(|v| seen.insert(v.id()))
        .collect()
}

fn point_of(v: &Vertex) -> [f64; 3] {
    let p = v.point();
    [p[0], p[1], p[2]]
}

fn face_signature(face: &Face) -> TopoSignature {
    let points: Vec<[f64; 3]> = face
        .boundaries()
        .iter()
        .flat_map(|w| w.vertex_iter())
        .map(|v| point_of(&v))
        .collect();
    let bbox = BoundingBox::from_points(&points);
    let centroid = if points.is_empty() {
        [0.0; 3]
    } else {
        let n = points.len() as f64;
        let sum = points.iter().fold([0.0; 3], |acc, p| {
            [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
        });
        [sum[0] / n, sum[1] / n, sum[2] / n]
    };

    let (kind, normal) = match face.oriented_surface() {
        Surface::Plane(plane) => {
            let n = plane.normal();
            (GeomKind::Planar, Some([n[0], n[1], n[2]]))
        }
        Surface::RevolutedCurve(_) => (GeomKind::Revolved, None),
        Surface::BSplineSurface(_) | Surface::NurbsSurface(_) => (GeomKind::Nurbs, None),
    };

    TopoSignature {
        kind,
        centroid,
        normal,
        bbox,
        ..TopoSignature::empty()
    }
}

fn edge_signature(edge: &Edge) -> TopoSignature {
    let front = point_of(&edge.front());
    let back = point_of(&edge.back());
    let delta = [back[0] - front[0], back[1] - front[1], back[2] - front[2]];
    let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();

    let (kind, direction) = match edge.curve() {
        Curve::Line(_) if length > 0.0 => (
            GeomKind::Line,
            Some([delta[0] / length, delta[1] / length, delta[2] / length]),
        ),
        _ => (GeomKind::Curve, None),
    };

    TopoSignature {
        kind,
        centroid: [
            (front[0] + back[0]) / 2.0,
            (front[1] + back[1]) / 2.0,
            (front[2] + back[2]) / 2.0,
        ],
        direction,
        bbox: BoundingBox::from_points(&[front, back]),
        length: (kind == GeomKind::Line).then_some(length),
        ..TopoSignature::empty()
    }
}

fn vertex_signature(vertex: &Vertex) -> TopoSignature {
    let p = point_of(vertex);
    TopoSignature {
        kind: GeomKind::Point,
        centroid: p,
        bbox: BoundingBox::new(p, p),
        ..TopoSignature::empty()
    }
}
