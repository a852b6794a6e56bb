use fixture_types::{BoundingBox, TopoKind, TopoSignature};
use geom_kernel::{Kernel, KernelId, KernelIntrospect};

use crate::types::{OpError, Solid};

/// Mutable construction and read-only introspection on one kernel object.
///
/// Operations take `&mut dyn KernelBundle` and call `as_introspect` when
/// they only need to look.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}

/// Bounds of a solid the kernel still knows about.
pub fn solid_bbox(kernel: &dyn KernelIntrospect, solid: &Solid) -> Result<BoundingBox, OpError> {
    kernel
        .bounding_box(solid.handle())
        .filter(|b| !b.is_empty())
        .ok_or_else(|| OpError::InvalidParameter {
            reason: format!("solid {} is unknown to the kernel", solid.handle().id()),
        })
}

/// Signatures of every face or edge of `solid`, in enumeration order.
pub fn signatures(
    kernel: &dyn KernelIntrospect,
    solid: &Solid,
    kind: TopoKind,
) -> Vec<(KernelId, TopoSignature)> {
    kernel.compute_all_signatures(solid.handle(), kind)
}

/// Face and edge counts, for logging.
pub fn topology_counts(kernel: &dyn KernelIntrospect, solid: &Solid) -> (usize, usize) {
    (
        kernel.list_faces(solid.handle()).len(),
        kernel.list_edges(solid.handle()).len(),
    )
}
