//! MockKernel: deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Extrusions produce exact analytic topology with real centroids, normals
//! and bounds. Booleans and rounding approximate their result from bounding
//! boxes and the frames of neighbouring faces. That keeps selector and
//! feature behaviour faithful for axis-aligned fixtures without a B-rep
//! evaluator.

use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;
use fixture_types::{
    across_face, add, cross, distance, dot, norm, normalize, scale, sub, BoundaryCurve,
};
use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use tracing::debug;

const EPS: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Line,
    Circle {
        center: [f64; 3],
        axis: [f64; 3],
        radius: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Surface {
    Plane { normal: [f64; 3] },
    Cylinder { axis: [f64; 3], radius: f64 },
    /// Blend surface around a circular edge.
    Revolved { axis: [f64; 3] },
}

#[derive(Debug, Clone)]
struct MockVertex {
    id: KernelId,
    position: [f64; 3],
}

/// Circles start and end on the same seam vertex.
#[derive(Debug, Clone)]
struct MockEdge {
    id: KernelId,
    start: KernelId,
    end: KernelId,
    curve: Curve,
}

#[derive(Debug, Clone)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    surface: Surface,
    centroid: [f64; 3],
    area: f64,
    bbox: BoundingBox,
}

#[derive(Debug, Clone, Default)]
struct MockSolid {
    vertices: Vec<MockVertex>,
    edges: Vec<MockEdge>,
    faces: Vec<MockFace>,
}

impl MockSolid {
    fn position(&self, vertex: KernelId) -> [f64; 3] {
        self.vertices
            .iter()
            .find(|v| v.id == vertex)
            .map(|v| v.position)
            .unwrap_or_default()
    }

    fn endpoints(&self, edge: &MockEdge) -> ([f64; 3], [f64; 3]) {
        (self.position(edge.start), self.position(edge.end))
    }

    fn edge(&self, id: KernelId) -> Option<&MockEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    fn faces_of_edge(&self, edge: KernelId) -> Vec<KernelId> {
        self.faces
            .iter()
            .filter(|f| f.edges.contains(&edge))
            .map(|f| f.id)
            .collect()
    }

    fn bbox(&self) -> BoundingBox {
        self.faces
            .iter()
            .fold(BoundingBox::empty(), |acc, f| acc.union(&f.bbox))
    }

    /// Drop edges no face references and vertices no edge references.
    fn prune(&mut self) {
        let used_edges: HashSet<KernelId> = self
            .faces
            .iter()
            .flat_map(|f| f.edges.iter().copied())
            .collect();
        self.edges.retain(|e| used_edges.contains(&e.id));
        let used_vertices: HashSet<KernelId> = self
            .edges
            .iter()
            .flat_map(|e| [e.start, e.end])
            .collect();
        self.vertices.retain(|v| used_vertices.contains(&v.id));
    }

    fn absorb(&mut self, other: MockSolid) {
        self.vertices.extend(other.vertices);
        self.edges.extend(other.edges);
        self.faces.extend(other.faces);
    }
}

/// Which rounding a blend produces. Carries the matching error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Blend {
    Fillet,
    Chamfer,
}

impl Blend {
    fn error(self, reason: String) -> KernelError {
        match self {
            Blend::Fillet => KernelError::FilletFailed { reason },
            Blend::Chamfer => KernelError::ChamferFailed { reason },
        }
    }
}

/// Deterministic test double for the geometry kernel.
/// Implements both Kernel and KernelIntrospect.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    /// Entity id to the handle of the solid that owns it.
    owners: HashMap<KernelId, u64>,
    /// Faces created by make_planar_face, awaiting extrude.
    standalone_faces: HashMap<u64, PlanarWire>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            owners: HashMap::new(),
            standalone_faces: HashMap::new(),
        }
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        let ids = solid
            .vertices
            .iter()
            .map(|v| v.id)
            .chain(solid.edges.iter().map(|e| e.id))
            .chain(solid.faces.iter().map(|f| f.id));
        for id in ids {
            self.owners.insert(id, handle.id());
        }
        self.solids.insert(handle.id(), solid);
        handle
    }

    fn get(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }

    fn owner_of(&self, entity: KernelId) -> Option<&MockSolid> {
        self.owners
            .get(&entity)
            .and_then(|h| self.solids.get(h))
    }

    /// Copy a solid with fresh ids, mapping points and directions.
    /// Returns the copy and the old-to-new id map.
    fn copy_with(
        &mut self,
        src: &MockSolid,
        point: impl Fn([f64; 3]) -> [f64; 3],
        vector: impl Fn([f64; 3]) -> [f64; 3],
    ) -> (MockSolid, HashMap<KernelId, KernelId>) {
        let mut id_map: HashMap<KernelId, KernelId> = HashMap::new();
        let mut out = MockSolid::default();

        for v in &src.vertices {
            let new_id = self.alloc_id();
            id_map.insert(v.id, new_id);
            out.vertices.push(MockVertex {
                id: new_id,
                position: point(v.position),
            });
        }
        for e in &src.edges {
            let new_id = self.alloc_id();
            id_map.insert(e.id, new_id);
            let curve = match e.curve {
                Curve::Line => Curve::Line,
                Curve::Circle {
                    center,
                    axis,
                    radius,
                } => Curve::Circle {
                    center: point(center),
                    axis: vector(axis),
                    radius,
                },
            };
            out.edges.push(MockEdge {
                id: new_id,
                start: id_map[&e.start],
                end: id_map[&e.end],
                curve,
            });
        }
        for f in &src.faces {
            let new_id = self.alloc_id();
            id_map.insert(f.id, new_id);
            let surface = match f.surface {
                Surface::Plane { normal } => Surface::Plane {
                    normal: vector(normal),
                },
                Surface::Cylinder { axis, radius } => Surface::Cylinder {
                    axis: vector(axis),
                    radius,
                },
                Surface::Revolved { axis } => Surface::Revolved { axis: vector(axis) },
            };
            let corners = box_corners(&f.bbox).map(&point);
            out.faces.push(MockFace {
                id: new_id,
                edges: f.edges.iter().map(|eid| id_map[eid]).collect(),
                surface,
                centroid: point(f.centroid),
                area: f.area,
                bbox: BoundingBox::from_points(&corners),
            });
        }
        (out, id_map)
    }

    fn copy(&mut self, src: &MockSolid) -> MockSolid {
        self.copy_with(src, |p| p, |v| v).0
    }

    fn extrude_polygon(&mut self, pts: &[[f64; 3]], dir: [f64; 3], depth: f64) -> MockSolid {
        let n = pts.len();
        let offset = scale(dir, depth);
        let top_pts: Vec<[f64; 3]> = pts.iter().map(|&p| add(p, offset)).collect();

        let bottom: Vec<MockVertex> = pts
            .iter()
            .map(|&position| MockVertex {
                id: self.alloc_id(),
                position,
            })
            .collect();
        let top: Vec<MockVertex> = top_pts
            .iter()
            .map(|&position| MockVertex {
                id: self.alloc_id(),
                position,
            })
            .collect();

        // bottom ring, top ring, then the lateral edges
        let mut edges = Vec::with_capacity(3 * n);
        for ring in [&bottom, &top] {
            for i in 0..n {
                edges.push(MockEdge {
                    id: self.alloc_id(),
                    start: ring[i].id,
                    end: ring[(i + 1) % n].id,
                    curve: Curve::Line,
                });
            }
        }
        for i in 0..n {
            edges.push(MockEdge {
                id: self.alloc_id(),
                start: bottom[i].id,
                end: top[i].id,
                curve: Curve::Line,
            });
        }

        let area = polygon_area(pts);
        let centroid = polygon_centroid(pts);
        let ccw = dot(newell_normal(pts), dir) > 0.0;

        let mut faces = Vec::with_capacity(n + 2);
        faces.push(MockFace {
            id: self.alloc_id(),
            edges: edges[..n].iter().map(|e| e.id).collect(),
            surface: Surface::Plane {
                normal: scale(dir, -1.0),
            },
            centroid,
            area,
            bbox: BoundingBox::from_points(pts),
        });
        faces.push(MockFace {
            id: self.alloc_id(),
            edges: edges[n..2 * n].iter().map(|e| e.id).collect(),
            surface: Surface::Plane { normal: dir },
            centroid: add(centroid, offset),
            area,
            bbox: BoundingBox::from_points(&top_pts),
        });
        for i in 0..n {
            let j = (i + 1) % n;
            let along = sub(pts[j], pts[i]);
            let outward = if ccw {
                cross(along, dir)
            } else {
                cross(dir, along)
            };
            let corners = [pts[i], pts[j], top_pts[j], top_pts[i]];
            faces.push(MockFace {
                id: self.alloc_id(),
                edges: vec![
                    edges[i].id,
                    edges[2 * n + j].id,
                    edges[n + i].id,
                    edges[2 * n + i].id,
                ],
                surface: Surface::Plane {
                    normal: normalize(outward).unwrap_or(dir),
                },
                centroid: mean(&corners),
                area: norm(cross(along, offset)),
                bbox: BoundingBox::from_points(&corners),
            });
        }

        let mut vertices = bottom;
        vertices.extend(top);
        MockSolid {
            vertices,
            edges,
            faces,
        }
    }

    fn extrude_circle(
        &mut self,
        center: [f64; 3],
        radius: f64,
        dir: [f64; 3],
        depth: f64,
    ) -> MockSolid {
        let offset = scale(dir, depth);
        let top_center = add(center, offset);
        let seam = add(center, scale(perpendicular(dir), radius));

        let vb = MockVertex {
            id: self.alloc_id(),
            position: seam,
        };
        let vt = MockVertex {
            id: self.alloc_id(),
            position: add(seam, offset),
        };
        let bottom_rim = MockEdge {
            id: self.alloc_id(),
            start: vb.id,
            end: vb.id,
            curve: Curve::Circle {
                center,
                axis: dir,
                radius,
            },
        };
        let top_rim = MockEdge {
            id: self.alloc_id(),
            start: vt.id,
            end: vt.id,
            curve: Curve::Circle {
                center: top_center,
                axis: dir,
                radius,
            },
        };
        let seam_edge = MockEdge {
            id: self.alloc_id(),
            start: vb.id,
            end: vt.id,
            curve: Curve::Line,
        };

        let bottom_box = circle_bbox(center, dir, radius);
        let top_box = circle_bbox(top_center, dir, radius);
        let faces = vec![
            MockFace {
                id: self.alloc_id(),
                edges: vec![bottom_rim.id],
                surface: Surface::Plane {
                    normal: scale(dir, -1.0),
                },
                centroid: center,
                area: PI * radius * radius,
                bbox: bottom_box,
            },
            MockFace {
                id: self.alloc_id(),
                edges: vec![top_rim.id],
                surface: Surface::Plane { normal: dir },
                centroid: top_center,
                area: PI * radius * radius,
                bbox: top_box,
            },
            MockFace {
                id: self.alloc_id(),
                edges: vec![bottom_rim.id, seam_edge.id, top_rim.id],
                surface: Surface::Cylinder { axis: dir, radius },
                centroid: scale(add(center, top_center), 0.5),
                area: 2.0 * PI * radius * depth,
                bbox: bottom_box.union(&top_box),
            },
        ];

        MockSolid {
            vertices: vec![vb, vt],
            edges: vec![bottom_rim, top_rim, seam_edge],
            faces,
        }
    }

    /// Union: merge both topologies, cancel faces glued back to back, weld
    /// coincident vertices and edges, and fuse coplanar faces across welded
    /// seams.
    fn union_solids(&mut self, a: &MockSolid, b: &MockSolid) -> MockSolid {
        let mut out = self.copy(a);
        let mut b = self.copy(b);

        let mut vertex_weld: HashMap<KernelId, KernelId> = HashMap::new();
        for vb in &b.vertices {
            if let Some(va) = out
                .vertices
                .iter()
                .find(|va| distance(va.position, vb.position) < EPS)
            {
                vertex_weld.insert(vb.id, va.id);
            }
        }
        b.vertices.retain(|v| !vertex_weld.contains_key(&v.id));
        for e in &mut b.edges {
            e.start = vertex_weld.get(&e.start).copied().unwrap_or(e.start);
            e.end = vertex_weld.get(&e.end).copied().unwrap_or(e.end);
        }

        let mut edge_weld: HashMap<KernelId, KernelId> = HashMap::new();
        for eb in &b.edges {
            if let Some(ea) = out.edges.iter().find(|ea| same_edge(ea, eb)) {
                edge_weld.insert(eb.id, ea.id);
            }
        }
        b.edges.retain(|e| !edge_weld.contains_key(&e.id));
        for f in &mut b.faces {
            for e in &mut f.edges {
                if let Some(w) = edge_weld.get(e) {
                    *e = *w;
                }
            }
        }

        let b_faces: HashSet<KernelId> = b.faces.iter().map(|f| f.id).collect();
        out.absorb(b);

        let mut cancelled: HashSet<KernelId> = HashSet::new();
        for fa in out.faces.iter().filter(|f| !b_faces.contains(&f.id)) {
            let partner = out.faces.iter().find(|fb| {
                b_faces.contains(&fb.id) && !cancelled.contains(&fb.id) && glued(fa, fb)
            });
            if let Some(fb) = partner {
                cancelled.insert(fa.id);
                cancelled.insert(fb.id);
            }
        }
        out.faces.retain(|f| !cancelled.contains(&f.id));

        let mut seams: Vec<KernelId> = edge_weld.values().copied().collect();
        seams.sort();
        for seam in seams {
            let adjacent: Vec<usize> = out
                .faces
                .iter()
                .enumerate()
                .filter(|(_, f)| f.edges.contains(&seam))
                .map(|(i, _)| i)
                .collect();
            if let [i, j] = adjacent[..] {
                if coplanar(&out.faces[i], &out.faces[j]) {
                    let absorbed = out.faces.remove(j);
                    fuse_faces(&mut out.faces[i], absorbed, seam);
                }
            }
        }

        out.prune();
        self.merge_collinear_edges(&mut out);
        debug!(
            cancelled = cancelled.len(),
            faces = out.faces.len(),
            "mock union"
        );
        out
    }

    /// Replace pairs of straight edges that meet end to end at a vertex of
    /// degree two and border the same faces with one edge.
    fn merge_collinear_edges(&mut self, solid: &mut MockSolid) {
        while let Some((e1, e2, shared)) = find_collinear_pair(solid) {
            let far1 = other_end(solid, e1, shared);
            let far2 = other_end(solid, e2, shared);
            let merged = self.alloc_id();
            solid.edges.retain(|e| e.id != e1 && e.id != e2);
            solid.edges.push(MockEdge {
                id: merged,
                start: far1,
                end: far2,
                curve: Curve::Line,
            });
            for f in &mut solid.faces {
                if let Some(pos) = f.edges.iter().position(|e| *e == e1) {
                    f.edges[pos] = merged;
                }
                f.edges.retain(|e| *e != e2);
            }
            solid.vertices.retain(|v| v.id != shared);
        }
    }

    /// Subtraction: faces of the target swallowed by the tool's bounds are
    /// dropped; tool faces strictly inside the target's bounds become inner
    /// walls, clipped to the target.
    fn subtract_solids(
        &mut self,
        a: &MockSolid,
        b: &MockSolid,
    ) -> Result<MockSolid, KernelError> {
        let a_box = a.bbox();
        let b_box = b.bbox();
        if !a_box.overlaps(&b_box, EPS) {
            return Err(KernelError::BooleanFailed {
                reason: "tool does not intersect the target".to_string(),
            });
        }

        let mut out = self.copy(a);
        let mut tool = self.copy(b);

        out.faces.retain(|f| !b_box.encloses(&f.bbox, EPS));
        // A tool cap flush with a surviving target face opens that face
        // instead of closing the cut.
        let flush = |f: &MockFace| match f.surface {
            Surface::Plane { normal } => out.faces.iter().any(|g| {
                matches!(g.surface, Surface::Plane { normal: m } if dot(m, normal).abs() > 1.0 - EPS)
                    && dot(sub(f.centroid, g.centroid), normal).abs() < EPS
                    && g.bbox.encloses(&point_box(f.centroid), EPS)
            }),
            _ => false,
        };
        tool.faces
            .retain(|f| a_box.contains_strictly(f.centroid, EPS) && !flush(f));
        if out.faces.is_empty() {
            return Err(KernelError::BooleanFailed {
                reason: "subtraction removes the whole target".to_string(),
            });
        }

        for f in &mut tool.faces {
            f.bbox = f.bbox.intersection(&a_box);
            match &mut f.surface {
                Surface::Plane { normal } => *normal = scale(*normal, -1.0),
                Surface::Cylinder { .. } | Surface::Revolved { .. } => {
                    f.centroid = f.bbox.center();
                }
            }
        }
        for v in &mut tool.vertices {
            v.position = a_box.clamp(v.position);
        }
        for e in &mut tool.edges {
            if let Curve::Circle { center, .. } = &mut e.curve {
                *center = a_box.clamp(*center);
            }
        }
        tool.prune();

        // Rims of the cut that lie on a surviving target face bound it too.
        for e in &tool.edges {
            let (p, q) = tool.endpoints(e);
            for f in out.faces.iter_mut() {
                let Surface::Plane { normal } = f.surface else {
                    continue;
                };
                let lies_on = |x: [f64; 3]| {
                    dot(sub(x, f.centroid), normal).abs() < EPS && f.bbox.encloses(&point_box(x), EPS)
                };
                let on_face = match e.curve {
                    Curve::Circle { center, axis, .. } => {
                        1.0 - dot(axis, normal).abs() < EPS && lies_on(center)
                    }
                    Curve::Line => lies_on(p) && lies_on(q),
                };
                if on_face {
                    f.edges.push(e.id);
                }
            }
        }

        out.absorb(tool);
        out.prune();
        Ok(out)
    }

    fn intersect_solids(
        &mut self,
        a: &MockSolid,
        b: &MockSolid,
    ) -> Result<MockSolid, KernelError> {
        let a_box = a.bbox();
        let b_box = b.bbox();
        if !a_box.overlaps(&b_box, EPS) {
            return Err(KernelError::BooleanFailed {
                reason: "solids do not intersect".to_string(),
            });
        }
        let common = a_box.intersection(&b_box);

        let mut out = self.copy(a);
        let other = self.copy(b);
        out.absorb(other);
        out.faces.retain(|f| common.encloses(&point_box(f.centroid), EPS));
        for f in &mut out.faces {
            f.bbox = f.bbox.intersection(&common);
        }
        for v in &mut out.vertices {
            v.position = common.clamp(v.position);
        }
        for e in &mut out.edges {
            if let Curve::Circle { center, .. } = &mut e.curve {
                *center = common.clamp(*center);
            }
        }
        out.prune();
        if out.faces.is_empty() {
            return Err(KernelError::BooleanFailed {
                reason: "intersection is empty".to_string(),
            });
        }
        Ok(out)
    }

    fn round_edges(
        &mut self,
        source: &MockSolid,
        edges: &[KernelId],
        size: f64,
        blend: Blend,
    ) -> Result<MockSolid, KernelError> {
        if !(size > 0.0 && size.is_finite()) {
            return Err(blend.error(format!("size must be positive, got {size}")));
        }
        for eid in edges {
            if source.edge(*eid).is_none() {
                return Err(blend.error(format!("edge {:?} not found in solid", eid)));
            }
        }

        let (mut solid, id_map) = self.copy_with(source, |p| p, |v| v);
        for eid in edges {
            self.blend_edge(&mut solid, id_map[eid], size, blend)?;
        }
        solid.prune();
        Ok(solid)
    }

    /// Replace one edge by two tangent edges set back into its faces and a
    /// blend face between them.
    fn blend_edge(
        &mut self,
        solid: &mut MockSolid,
        eid: KernelId,
        size: f64,
        blend: Blend,
    ) -> Result<(), KernelError> {
        let edge = solid
            .edge(eid)
            .cloned()
            .ok_or_else(|| blend.error(format!("edge {:?} was consumed", eid)))?;
        let adjacent: Vec<usize> = solid
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.edges.contains(&eid))
            .map(|(i, _)| i)
            .collect();
        let (i1, i2) = match adjacent[..] {
            [i1, i2] => (i1, i2),
            _ => {
                return Err(blend.error(format!(
                    "edge {:?} borders {} faces, expected 2",
                    eid,
                    adjacent.len()
                )))
            }
        };

        let (t1, t2, face, new_vertices) = match edge.curve {
            Curve::Line => self.blend_line(solid, &edge, i1, i2, size, blend)?,
            Curve::Circle {
                center,
                axis,
                radius,
            } => self.blend_circle(solid, &edge, (center, axis, radius), i1, i2, size, blend)?,
        };

        for (i, t) in [(i1, t1.id), (i2, t2.id)] {
            if let Some(pos) = solid.faces[i].edges.iter().position(|e| *e == eid) {
                solid.faces[i].edges[pos] = t;
            }
        }
        solid.edges.retain(|e| e.id != eid);
        solid.vertices.extend(new_vertices);
        solid.edges.push(t1);
        solid.edges.push(t2);
        solid.faces.push(face);
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn blend_line(
        &mut self,
        solid: &MockSolid,
        edge: &MockEdge,
        i1: usize,
        i2: usize,
        size: f64,
        blend: Blend,
    ) -> Result<(MockEdge, MockEdge, MockFace, Vec<MockVertex>), KernelError> {
        let (p, q) = solid.endpoints(edge);
        let dir = normalize(sub(q, p))
            .ok_or_else(|| blend.error(format!("edge {:?} has zero length", edge.id)))?;
        let mid = scale(add(p, q), 0.5);
        let (f1, f2) = (&solid.faces[i1], &solid.faces[i2]);
        let (w1, width1) = measure_from_edge(solid, f1, edge.id, mid, dir);
        let (w2, width2) = measure_from_edge(solid, f2, edge.id, mid, dir);

        // Interior angle between the faces sets how far a fillet reaches.
        let opening = match (f1.surface, f2.surface) {
            (Surface::Plane { normal: n1 }, Surface::Plane { normal: n2 }) => {
                PI - dot(n1, n2).clamp(-1.0, 1.0).acos()
            }
            _ => PI / 2.0,
        };
        let setback = match blend {
            Blend::Fillet => size / (opening / 2.0).tan(),
            Blend::Chamfer => size,
        };
        for (f, width) in [(f1, width1), (f2, width2)] {
            let Some(width) = width else {
                continue;
            };
            if setback >= width - EPS {
                return Err(blend.error(format!(
                    "size {size} needs {setback:.4} of face {:?}, which is {width:.4} wide",
                    f.id
                )));
            }
        }

        let off1 = scale(w1, setback);
        let off2 = scale(w2, setback);
        let corners = [add(p, off1), add(q, off1), add(p, off2), add(q, off2)];
        let new_vertices: Vec<MockVertex> = corners
            .iter()
            .map(|&position| MockVertex {
                id: self.alloc_id(),
                position,
            })
            .collect();
        let t1 = MockEdge {
            id: self.alloc_id(),
            start: new_vertices[0].id,
            end: new_vertices[1].id,
            curve: Curve::Line,
        };
        let t2 = MockEdge {
            id: self.alloc_id(),
            start: new_vertices[2].id,
            end: new_vertices[3].id,
            curve: Curve::Line,
        };

        let bisector = add(w1, w2);
        let length = distance(p, q);
        let (surface, centroid, area) = match blend {
            Blend::Fillet => {
                // The arc centre sits size / sin(opening / 2) along the unit
                // bisector; the arc midpoint is one radius back towards the edge.
                let reach = size / (opening / 2.0).sin() - size;
                let inward = normalize(bisector).unwrap_or_default();
                (
                    Surface::Cylinder { axis: dir, radius: size },
                    add(mid, scale(inward, reach)),
                    length * size * (PI - opening),
                )
            }
            Blend::Chamfer => (
                Surface::Plane {
                    normal: normalize(scale(bisector, -1.0)).unwrap_or(dir),
                },
                add(mid, scale(bisector, setback / 2.0)),
                length * distance(corners[0], corners[2]),
            ),
        };
        let mut pts = corners.to_vec();
        pts.push(centroid);
        let face = MockFace {
            id: self.alloc_id(),
            edges: vec![t1.id, t2.id],
            surface,
            centroid,
            area,
            bbox: BoundingBox::from_points(&pts),
        };
        Ok((t1, t2, face, new_vertices))
    }

    #[allow(clippy::too_many_arguments, clippy::type_complexity)]
    fn blend_circle(
        &mut self,
        solid: &MockSolid,
        edge: &MockEdge,
        (center, axis, radius): ([f64; 3], [f64; 3], f64),
        i1: usize,
        i2: usize,
        size: f64,
        blend: Blend,
    ) -> Result<(MockEdge, MockEdge, MockFace, Vec<MockVertex>), KernelError> {
        let (plane_face, plane_normal) = [i1, i2]
            .into_iter()
            .find_map(|i| match solid.faces[i].surface {
                Surface::Plane { normal } => Some((&solid.faces[i], normal)),
                _ => None,
            })
            .ok_or_else(|| {
                blend.error(format!("circular edge {:?} has no planar neighbour", edge.id))
            })?;

        // A face wider than the rim surrounds a hole; otherwise it caps a boss.
        let rim_box = circle_bbox(center, axis, radius + size);
        let outward = if plane_face.bbox.encloses(&rim_box, EPS) {
            1.0
        } else {
            -1.0
        };
        let on_plane = radius + outward * size;
        if on_plane <= EPS {
            return Err(blend.error(format!(
                "size {size} does not fit a rim of radius {radius}"
            )));
        }
        let along_wall = sub(center, scale(plane_normal, size));

        let u = perpendicular(axis);
        let v1 = MockVertex {
            id: self.alloc_id(),
            position: add(center, scale(u, on_plane)),
        };
        let v2 = MockVertex {
            id: self.alloc_id(),
            position: add(along_wall, scale(u, radius)),
        };
        let t1 = MockEdge {
            id: self.alloc_id(),
            start: v1.id,
            end: v1.id,
            curve: Curve::Circle {
                center,
                axis,
                radius: on_plane,
            },
        };
        let t2 = MockEdge {
            id: self.alloc_id(),
            start: v2.id,
            end: v2.id,
            curve: Curve::Circle {
                center: along_wall,
                axis,
                radius,
            },
        };
        let face = MockFace {
            id: self.alloc_id(),
            edges: vec![t1.id, t2.id],
            surface: Surface::Revolved { axis },
            centroid: sub(center, scale(plane_normal, size / 2.0)),
            area: 2.0 * PI * radius * size,
            bbox: circle_bbox(center, axis, on_plane.max(radius))
                .union(&circle_bbox(along_wall, axis, radius)),
        };
        Ok((t1, t2, face, vec![v1, v2]))
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(points: &[[f64; 3]]) -> [f64; 3] {
    let sum = points.iter().fold([0.0; 3], |acc, p| add(acc, *p));
    scale(sum, 1.0 / points.len().max(1) as f64)
}

/// Unnormalized polygon normal; its length is twice the enclosed area.
fn newell_normal(pts: &[[f64; 3]]) -> [f64; 3] {
    let n = pts.len();
    (0..n).fold([0.0; 3], |acc, i| add(acc, cross(pts[i], pts[(i + 1) % n])))
}

fn polygon_area(pts: &[[f64; 3]]) -> f64 {
    norm(newell_normal(pts)) / 2.0
}

fn polygon_centroid(pts: &[[f64; 3]]) -> [f64; 3] {
    let Some(unit) = normalize(newell_normal(pts)) else {
        return mean(pts);
    };
    let mut weighted = [0.0; 3];
    let mut total = 0.0;
    for i in 1..pts.len().saturating_sub(1) {
        let (a, b, c) = (pts[0], pts[i], pts[i + 1]);
        let w = dot(cross(sub(b, a), sub(c, a)), unit) / 2.0;
        weighted = add(weighted, scale(add(add(a, b), c), w / 3.0));
        total += w;
    }
    if total.abs() < EPS {
        mean(pts)
    } else {
        scale(weighted, 1.0 / total)
    }
}

/// Any unit vector perpendicular to `a`.
fn perpendicular(a: [f64; 3]) -> [f64; 3] {
    let helper = if a[0].abs() < 0.9 {
        [1.0, 0.0, 0.0]
    } else {
        [0.0, 1.0, 0.0]
    };
    normalize(cross(a, helper)).unwrap_or([1.0, 0.0, 0.0])
}

fn circle_bbox(center: [f64; 3], axis: [f64; 3], radius: f64) -> BoundingBox {
    let half = axis.map(|a| radius * (1.0 - a * a).max(0.0).sqrt());
    BoundingBox::new(sub(center, half), add(center, half))
}

fn point_box(p: [f64; 3]) -> BoundingBox {
    BoundingBox::new(p, p)
}

fn box_corners(bb: &BoundingBox) -> [[f64; 3]; 8] {
    let (lo, hi) = (bb.min, bb.max);
    [
        [lo[0], lo[1], lo[2]],
        [hi[0], lo[1], lo[2]],
        [lo[0], hi[1], lo[2]],
        [hi[0], hi[1], lo[2]],
        [lo[0], lo[1], hi[2]],
        [hi[0], lo[1], hi[2]],
        [lo[0], hi[1], hi[2]],
        [hi[0], hi[1], hi[2]],
    ]
}

/// Direction from a straight edge into `face`, and for planar faces the
/// width available on that side.
///
/// Planar faces are measured against their own boundary, so notches and
/// holes count. A boundary the ray cannot close falls back to the face's
/// bounds.
fn measure_from_edge(
    solid: &MockSolid,
    face: &MockFace,
    edge: KernelId,
    mid: [f64; 3],
    dir: [f64; 3],
) -> ([f64; 3], Option<f64>) {
    let Surface::Plane { normal } = face.surface else {
        return (into_face(face, mid, dir), None);
    };
    let boundary: Vec<BoundaryCurve> = face
        .edges
        .iter()
        .filter(|e| **e != edge)
        .filter_map(|e| solid.edge(*e))
        .map(|e| match e.curve {
            Curve::Line => {
                let (start, end) = solid.endpoints(e);
                BoundaryCurve::Segment { start, end }
            }
            Curve::Circle { center, radius, .. } => BoundaryCurve::Circle { center, radius },
        })
        .collect();
    match across_face(&boundary, normal, mid, dir) {
        Some(across) => (across.inward, Some(across.width)),
        None => {
            let w = into_face(face, mid, dir);
            (w, Some(face.bbox.span_along(w)))
        }
    }
}

/// Unit vector perpendicular to an edge, pointing from the edge towards the
/// centroid of `face`.
fn into_face(face: &MockFace, mid: [f64; 3], dir: [f64; 3]) -> [f64; 3] {
    let candidate = match face.surface {
        Surface::Plane { normal } => cross(normal, dir),
        _ => {
            let to_center = sub(face.centroid, mid);
            sub(to_center, scale(dir, dot(to_center, dir)))
        }
    };
    let w = normalize(candidate).unwrap_or_default();
    if dot(w, sub(face.centroid, mid)) < 0.0 {
        scale(w, -1.0)
    } else {
        w
    }
}

fn same_edge(a: &MockEdge, b: &MockEdge) -> bool {
    let same_ends = (a.start == b.start && a.end == b.end) || (a.start == b.end && a.end == b.start);
    same_ends
        && match (a.curve, b.curve) {
            (Curve::Line, Curve::Line) => true,
            (
                Curve::Circle {
                    center: c1,
                    radius: r1,
                    ..
                },
                Curve::Circle {
                    center: c2,
                    radius: r2,
                    ..
                },
            ) => distance(c1, c2) < EPS && (r1 - r2).abs() < EPS,
            _ => false,
        }
}

/// Two planar faces occupying the same region with opposite normals.
fn glued(a: &MockFace, b: &MockFace) -> bool {
    match (a.surface, b.surface) {
        (Surface::Plane { normal: na }, Surface::Plane { normal: nb }) => {
            dot(na, nb) < -1.0 + EPS
                && distance(a.centroid, b.centroid) < EPS
                && (a.area - b.area).abs() < EPS * a.area.max(1.0)
        }
        _ => false,
    }
}

fn coplanar(a: &MockFace, b: &MockFace) -> bool {
    match (a.surface, b.surface) {
        (Surface::Plane { normal: na }, Surface::Plane { normal: nb }) => {
            dot(na, nb) > 1.0 - EPS && dot(sub(b.centroid, a.centroid), na).abs() < EPS
        }
        _ => false,
    }
}

fn fuse_faces(into: &mut MockFace, other: MockFace, seam: KernelId) {
    let total = into.area + other.area;
    if total > 0.0 {
        into.centroid = scale(
            add(scale(into.centroid, into.area), scale(other.centroid, other.area)),
            1.0 / total,
        );
    }
    into.area = total;
    into.bbox = into.bbox.union(&other.bbox);
    into.edges.retain(|e| *e != seam);
    for e in other.edges {
        if e != seam && !into.edges.contains(&e) {
            into.edges.push(e);
        }
    }
}

fn other_end(solid: &MockSolid, edge: KernelId, vertex: KernelId) -> KernelId {
    solid
        .edge(edge)
        .map(|e| if e.start == vertex { e.end } else { e.start })
        .unwrap_or(vertex)
}

fn find_collinear_pair(solid: &MockSolid) -> Option<(KernelId, KernelId, KernelId)> {
    for v in &solid.vertices {
        let incident: Vec<&MockEdge> = solid
            .edges
            .iter()
            .filter(|e| e.start == v.id || e.end == v.id)
            .collect();
        let [e1, e2] = incident[..] else {
            continue;
        };
        if e1.curve != Curve::Line || e2.curve != Curve::Line {
            continue;
        }
        let a = sub(solid.position(other_end(solid, e1.id, v.id)), v.position);
        let b = sub(solid.position(other_end(solid, e2.id, v.id)), v.position);
        let (Some(ua), Some(ub)) = (normalize(a), normalize(b)) else {
            continue;
        };
        if dot(ua, ub) > -1.0 + EPS {
            continue;
        }
        let mut f1 = solid.faces_of_edge(e1.id);
        let mut f2 = solid.faces_of_edge(e2.id);
        f1.sort();
        f2.sort();
        if f1 == f2 {
            return Some((e1.id, e2.id, v.id));
        }
    }
    None
}

/// Reject loops whose non-adjacent segments cross.
fn check_simple_polygon(pts: &[[f64; 3]], normal: [f64; 3]) -> Result<(), KernelError> {
    let u = perpendicular(normal);
    let v = cross(normal, u);
    let flat: Vec<(f64, f64)> = pts.iter().map(|p| (dot(*p, u), dot(*p, v))).collect();
    let n = flat.len();
    let orient = |a: (f64, f64), b: (f64, f64), c: (f64, f64)| {
        (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
    };
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a, b) = (flat[i], flat[(i + 1) % n]);
            let (c, d) = (flat[j], flat[(j + 1) % n]);
            let crosses = orient(a, b, c) * orient(a, b, d) < -EPS
                && orient(c, d, a) * orient(c, d, b) < -EPS;
            if crosses {
                return Err(KernelError::InvalidGeometry {
                    reason: format!("profile segments {i} and {j} intersect"),
                });
            }
        }
    }
    Ok(())
}

impl Kernel for MockKernel {
    fn make_planar_face(&mut self, wire: &PlanarWire) -> Result<KernelId, KernelError> {
        let normal = normalize(wire.normal()).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "face normal has zero length".to_string(),
        })?;
        match wire {
            PlanarWire::Polygon { vertices, .. } => {
                if vertices.len() < 3 {
                    return Err(KernelError::InvalidGeometry {
                        reason: format!("polygon needs 3 vertices, got {}", vertices.len()),
                    });
                }
                let off_plane = vertices
                    .iter()
                    .any(|p| dot(sub(*p, vertices[0]), normal).abs() > 1e-6);
                if off_plane {
                    return Err(KernelError::InvalidGeometry {
                        reason: "polygon vertices are not coplanar".to_string(),
                    });
                }
                if polygon_area(vertices) < EPS {
                    return Err(KernelError::InvalidGeometry {
                        reason: "polygon encloses no area".to_string(),
                    });
                }
                check_simple_polygon(vertices, normal)?;
            }
            PlanarWire::Circle { radius, .. } => {
                if !(*radius > 0.0 && radius.is_finite()) {
                    return Err(KernelError::InvalidGeometry {
                        reason: format!("circle radius must be positive, got {radius}"),
                    });
                }
            }
        }
        let face_id = self.alloc_id();
        self.standalone_faces.insert(face_id.0, wire.clone());
        Ok(face_id)
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let wire = self
            .standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        let dir = normalize(direction).ok_or_else(|| KernelError::Other {
            message: "extrude direction has zero length".to_string(),
        })?;
        if !(depth > 0.0 && depth.is_finite()) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("extrude depth must be positive, got {depth}"),
            });
        }

        let solid = match wire {
            PlanarWire::Polygon { vertices, .. } => self.extrude_polygon(&vertices, dir, depth),
            PlanarWire::Circle { center, radius, .. } => {
                self.extrude_circle(center, radius, dir, depth)
            }
        };
        Ok(self.store(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        let merged = self.union_solids(&solid_a, &solid_b);
        Ok(self.store(merged))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        let result = self.subtract_solids(&solid_a, &solid_b)?;
        Ok(self.store(result))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.get(a)?.clone();
        let solid_b = self.get(b)?.clone();
        let result = self.intersect_solids(&solid_a, &solid_b)?;
        Ok(self.store(result))
    }

    fn mirror_solid(
        &mut self,
        solid: &KernelSolidHandle,
        origin: [f64; 3],
        normal: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let n = normalize(normal).ok_or_else(|| KernelError::InvalidGeometry {
            reason: "mirror normal has zero length".to_string(),
        })?;
        let source = self.get(solid)?.clone();
        let reflect = |v: [f64; 3]| sub(v, scale(n, 2.0 * dot(v, n)));
        let (mirrored, _) = self.copy_with(
            &source,
            |p| add(origin, reflect(sub(p, origin))),
            reflect,
        );
        Ok(self.store(mirrored))
    }

    fn translate_solid(
        &mut self,
        solid: &KernelSolidHandle,
        offset: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let source = self.get(solid)?.clone();
        let (moved, _) = self.copy_with(&source, |p| add(p, offset), |v| v);
        Ok(self.store(moved))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let source = self.get(solid)?.clone();
        let result = self.round_edges(&source, edges, radius, Blend::Fillet)?;
        Ok(self.store(result))
    }

    fn chamfer_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let source = self.get(solid)?.clone();
        let result = self.round_edges(&source, edges, distance, Blend::Chamfer)?;
        Ok(self.store(result))
    }
}

fn face_signature(f: &MockFace) -> TopoSignature {
    let (kind, normal, direction, radius) = match f.surface {
        Surface::Plane { normal } => (GeomKind::Planar, Some(normal), None, None),
        Surface::Cylinder { axis, radius } => {
            (GeomKind::Cylindrical, None, Some(axis), Some(radius))
        }
        Surface::Revolved { axis } => (GeomKind::Revolved, None, Some(axis), None),
    };
    TopoSignature {
        kind,
        area: Some(f.area),
        centroid: f.centroid,
        normal,
        direction,
        radius,
        bbox: f.bbox,
        length: None,
    }
}

fn edge_signature(solid: &MockSolid, e: &MockEdge) -> TopoSignature {
    match e.curve {
        Curve::Line => {
            let (p, q) = solid.endpoints(e);
            TopoSignature {
                kind: GeomKind::Line,
                area: None,
                centroid: scale(add(p, q), 0.5),
                normal: None,
                direction: normalize(sub(q, p)),
                radius: None,
                bbox: BoundingBox::from_points(&[p, q]),
                length: Some(distance(p, q)),
            }
        }
        Curve::Circle {
            center,
            axis,
            radius,
        } => TopoSignature {
            kind: GeomKind::Circle,
            area: None,
            centroid: center,
            normal: None,
            direction: Some(axis),
            radius: Some(radius),
            bbox: circle_bbox(center, axis, radius),
            length: Some(2.0 * PI * radius),
        },
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.owner_of(face)
            .and_then(|s| s.faces.iter().find(|f| f.id == face))
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        self.owner_of(edge)
            .map(|s| s.faces_of_edge(edge))
            .unwrap_or_default()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let Some(solid) = self.owner_of(entity) else {
            return TopoSignature::empty();
        };
        match kind {
            TopoKind::Face => solid
                .faces
                .iter()
                .find(|f| f.id == entity)
                .map(face_signature),
            TopoKind::Edge => solid
                .edges
                .iter()
                .find(|e| e.id == entity)
                .map(|e| edge_signature(solid, e)),
            TopoKind::Vertex => solid.vertices.iter().find(|v| v.id == entity).map(|v| {
                TopoSignature {
                    centroid: v.position,
                    bbox: point_box(v.position),
                    ..TopoSignature::empty()
                }
            }),
            TopoKind::Solid => None,
        }
        .unwrap_or_else(TopoSignature::empty)
    }

    fn bounding_box(&self, solid: &KernelSolidHandle) -> Option<BoundingBox> {
        self.solids.get(&solid.id()).map(MockSolid::bbox)
    }
}
