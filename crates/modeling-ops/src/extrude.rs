//! Sweep Engine: linear extrusion of closed profiles.

use fixture_types::{add, dot, scale, sub};
use geom_kernel::{KernelError, PlanarWire};
use tracing::debug;

use crate::boolean;
use crate::kernel_ext::{self, KernelBundle};
use crate::profile::Profile;
use crate::types::{OpError, Solid};

/// Extrude a closed profile along its plane normal.
///
/// A negative `distance` extrudes against the normal. With `symmetric` the
/// solid spans `|distance|` on each side of the plane. A profile carrying a
/// solid mirror is swept once and unioned with its reflection.
pub fn extrude(
    kb: &mut dyn KernelBundle,
    profile: &Profile,
    distance: f64,
    symmetric: bool,
) -> Result<Solid, OpError> {
    if !distance.is_finite() || distance == 0.0 {
        return Err(OpError::InvalidParameter {
            reason: format!("extrusion distance must be non-zero, got {distance}"),
        });
    }
    let normal = profile.plane().normal();
    let (shift, direction, depth) = if symmetric {
        (-distance.abs(), normal, 2.0 * distance.abs())
    } else {
        (0.0, scale(normal, distance.signum()), distance.abs())
    };

    let solid = sweep(kb, profile, shift, direction, depth)?;
    debug!(distance, symmetric, handle = solid.handle().id(), "extruded profile");

    match profile.solid_mirror() {
        Some(axis) => {
            let plane = profile.plane();
            boolean::mirror_union(kb, solid, plane.origin(), axis.plane_normal(plane))
        }
        None => Ok(solid),
    }
}

/// Extrude a profile far enough both ways to pass through all of `target`.
///
/// The result is a tool solid meant for subtraction; `target` is untouched.
pub fn extrude_through_all(
    kb: &mut dyn KernelBundle,
    profile: &Profile,
    target: &Solid,
) -> Result<Solid, OpError> {
    let bbox = kernel_ext::solid_bbox(kb.as_introspect(), target)?;
    let plane = profile.plane();
    let normal = plane.normal();
    let middle = dot(sub(bbox.center(), plane.origin()), normal);
    let reach = bbox.diagonal().max(1.0);

    let solid = sweep(kb, profile, middle - reach, normal, 2.0 * reach)?;
    debug!(reach, handle = solid.handle().id(), "extruded through all");

    match profile.solid_mirror() {
        Some(axis) => boolean::mirror_union(kb, solid, plane.origin(), axis.plane_normal(plane)),
        None => Ok(solid),
    }
}

fn sweep(
    kb: &mut dyn KernelBundle,
    profile: &Profile,
    shift: f64,
    direction: [f64; 3],
    depth: f64,
) -> Result<Solid, OpError> {
    if !profile.is_closed() {
        return Err(OpError::InvalidProfile {
            reason: "only closed profiles can be extruded".to_string(),
        });
    }
    let wire = shifted(profile.to_wire(), scale(profile.plane().normal(), shift));
    let face = kb.make_planar_face(&wire).map_err(|e| match e {
        KernelError::InvalidGeometry { reason } => OpError::InvalidProfile { reason },
        other => OpError::Kernel(other),
    })?;
    let handle = kb.extrude_face(face, direction, depth)?;
    Ok(Solid::new(handle))
}

fn shifted(wire: PlanarWire, offset: [f64; 3]) -> PlanarWire {
    match wire {
        PlanarWire::Polygon { vertices, normal } => PlanarWire::Polygon {
            vertices: vertices.into_iter().map(|v| add(v, offset)).collect(),
            normal,
        },
        PlanarWire::Circle {
            center,
            normal,
            radius,
        } => PlanarWire::Circle {
            center: add(center, offset),
            normal,
            radius,
        },
    }
}
