//! TruckKernel: real geometry kernel wrapping truck's API.

use crate::traits::Kernel;
use crate::types::*;
use std::collections::HashMap;
use std::f64::consts::PI;
use tracing::debug;

// Import truck types selectively to avoid shadowing std::result::Result
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Face, Solid, Wire};
use truck_modeling::{InnerSpace, Matrix3, Matrix4, Point3, Rad, Vector3};

/// Tolerance handed to truck's boolean engine.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Real geometry kernel backed by the truck BREP library.
///
/// Rounding operations are not available in truck; fillet and chamfer
/// report `NotSupported`.
pub struct TruckKernel {
    next_handle: u64,
    next_id: u64,
    solids: HashMap<u64, Solid>,
    /// Faces created by make_planar_face, awaiting extrude.
    standalone_faces: HashMap<u64, Face>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_id: 1,
            solids: HashMap::new(),
            standalone_faces: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Option<&Solid> {
        self.solids.get(&handle.id())
    }

    fn cloned_solid(&self, handle: &KernelSolidHandle) -> Result<Solid, KernelError> {
        self.get_solid(handle)
            .cloned()
            .ok_or(KernelError::EntityNotFound {
                id: KernelId(handle.id()),
            })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn vec3(v: [f64; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

fn point3(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

fn unit(v: [f64; 3], what: &str) -> Result<Vector3, KernelError> {
    let v = vec3(v);
    if v.magnitude() < 1e-12 {
        return Err(KernelError::InvalidGeometry {
            reason: format!("{what} has zero length"),
        });
    }
    Ok(v.normalize())
}

fn polygon_wire(vertices: &[[f64; 3]]) -> Wire {
    // Create all vertices first so edges share endpoints.
    let pts: Vec<Point3> = vertices.iter().map(|&p| point3(p)).collect();
    let verts: Vec<_> = pts.iter().map(|&p| builder::vertex(p)).collect();
    let n = pts.len();
    let edges: Vec<Edge> = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            Edge::new(
                &verts[i],
                &verts[j],
                truck_modeling::geometry::Curve::Line(truck_modeling::geometry::Line(
                    pts[i], pts[j],
                )),
            )
        })
        .collect();
    Wire::from_iter(edges)
}

fn circle_wire(center: [f64; 3], normal: Vector3, radius: f64) -> Wire {
    // Any in-plane direction serves as the seam.
    let helper = if normal.x.abs() < 0.9 {
        Vector3::unit_x()
    } else {
        Vector3::unit_y()
    };
    let radial = normal.cross(helper).normalize();
    let start = builder::vertex(point3(center) + radial * radius);
    builder::rsweep(&start, point3(center), normal, Rad(2.0 * PI))
}

impl Kernel for TruckKernel {
    fn make_planar_face(&mut self, wire: &PlanarWire) -> Result<KernelId, KernelError> {
        let normal = unit(wire.normal(), "face normal")?;
        let truck_wire = match wire {
            PlanarWire::Polygon { vertices, .. } => {
                if vertices.len() < 3 {
                    return Err(KernelError::InvalidGeometry {
                        reason: format!("polygon needs 3 vertices, got {}", vertices.len()),
                    });
                }
                polygon_wire(vertices)
            }
            PlanarWire::Circle { center, radius, .. } => {
                if !(*radius > 0.0 && radius.is_finite()) {
                    return Err(KernelError::InvalidGeometry {
                        reason: format!("circle radius must be positive, got {radius}"),
                    });
                }
                circle_wire(*center, normal, *radius)
            }
        };

        let face = builder::try_attach_plane(&[truck_wire]).map_err(|e| {
            KernelError::InvalidGeometry {
                reason: format!("failed to create planar face: {e}"),
            }
        })?;

        let face_id = self.alloc_id();
        self.standalone_faces.insert(face_id.0, face);
        Ok(face_id)
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let truck_face = self
            .standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::EntityNotFound { id: face })?;
        let dir = unit(direction, "extrude direction")?;
        if !(depth > 0.0 && depth.is_finite()) {
            return Err(KernelError::InvalidGeometry {
                reason: format!("extrude depth must be positive, got {depth}"),
            });
        }

        let solid = builder::tsweep(&truck_face, dir * depth);
        Ok(self.store_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let solid_b = self.cloned_solid(b)?;

        let result = truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let mut solid_b = self.cloned_solid(b)?;

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result =
            truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
                KernelError::BooleanFailed {
                    reason: "truck and() returned None for subtraction".to_string(),
                }
            })?;
        Ok(self.store_solid(result))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let solid_b = self.cloned_solid(b)?;

        let result =
            truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
                KernelError::BooleanFailed {
                    reason: "truck and() returned None".to_string(),
                }
            })?;
        Ok(self.store_solid(result))
    }

    fn mirror_solid(
        &mut self,
        solid: &KernelSolidHandle,
        origin: [f64; 3],
        normal: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let n = unit(normal, "mirror normal")?;
        let source = self.cloned_solid(solid)?;

        // p' = p - 2((p - o)·n)n
        let reflect = |v: Vector3| v - n * (2.0 * n.dot(v));
        let linear = Matrix3::from_cols(
            reflect(Vector3::unit_x()),
            reflect(Vector3::unit_y()),
            reflect(Vector3::unit_z()),
        );
        let shift = n * (2.0 * vec3(origin).dot(n));
        let matrix = Matrix4::from_translation(shift) * Matrix4::from(linear);

        // A reflection flips orientation; turn the shells back outward.
        let mut mirrored = builder::transformed(&source, matrix);
        mirrored.not();
        debug!(handle = solid.id(), "truck mirror");
        Ok(self.store_solid(mirrored))
    }

    fn translate_solid(
        &mut self,
        solid: &KernelSolidHandle,
        offset: [f64; 3],
    ) -> Result<KernelSolidHandle, KernelError> {
        let source = self.cloned_solid(solid)?;
        let moved = builder::translated(&source, vec3(offset));
        Ok(self.store_solid(moved))
    }

    fn fillet_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn chamfer_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _distance: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "chamfer_edges".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f64) -> PlanarWire {
        PlanarWire::Polygon {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [size, 0.0, 0.0],
                [size, size, 0.0],
                [0.0, size, 0.0],
            ],
            normal: [0.0, 0.0, 1.0],
        }
    }

    #[test]
    fn test_truck_kernel_make_face_and_extrude() {
        let mut kernel = TruckKernel::new();
        let face_id = kernel.make_planar_face(&square(1.0)).unwrap();
        let handle = kernel.extrude_face(face_id, [0.0, 0.0, 1.0], 2.0).unwrap();

        let solid = kernel.get_solid(&handle).unwrap();
        let boundaries = solid.boundaries();
        assert_eq!(boundaries.len(), 1);

        let faces: Vec<_> = boundaries[0].face_iter().collect();
        assert_eq!(faces.len(), 6, "Extruded rectangle should have 6 faces");
    }

    #[test]
    fn test_truck_kernel_circle_extrude() {
        let mut kernel = TruckKernel::new();
        let face_id = kernel
            .make_planar_face(&PlanarWire::Circle {
                center: [0.0; 3],
                normal: [0.0, 0.0, 1.0],
                radius: 1.0,
            })
            .unwrap();
        let handle = kernel.extrude_face(face_id, [0.0, 0.0, 1.0], 1.0).unwrap();
        assert!(kernel.get_solid(&handle).is_some());
    }

    #[test]
    fn test_truck_kernel_rejects_bad_input() {
        let mut kernel = TruckKernel::new();
        let degenerate = PlanarWire::Polygon {
            vertices: vec![[0.0; 3], [1.0, 0.0, 0.0]],
            normal: [0.0, 0.0, 1.0],
        };
        assert!(matches!(
            kernel.make_planar_face(&degenerate),
            Err(KernelError::InvalidGeometry { .. })
        ));

        let face_id = kernel.make_planar_face(&square(1.0)).unwrap();
        assert!(kernel.extrude_face(face_id, [0.0; 3], 1.0).is_err());
    }

    #[test]
    fn test_truck_kernel_rounding_not_supported() {
        let mut kernel = TruckKernel::new();
        let face_id = kernel.make_planar_face(&square(1.0)).unwrap();
        let handle = kernel.extrude_face(face_id, [0.0, 0.0, 1.0], 1.0).unwrap();
        assert!(matches!(
            kernel.fillet_edges(&handle, &[], 0.1),
            Err(KernelError::NotSupported { .. })
        ));
    }
}
