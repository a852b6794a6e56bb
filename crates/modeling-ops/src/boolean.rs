//! Boolean Compositor: union, subtraction and intersection of solids.

use fixture_types::Tolerance;
use geom_kernel::KernelError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kernel_ext::{self, KernelBundle};
use crate::types::{OpError, Solid};

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanKind {
    Union,
    Subtract,
    Intersect,
}

impl std::fmt::Display for BooleanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BooleanKind::Union => write!(f, "union"),
            BooleanKind::Subtract => write!(f, "subtract"),
            BooleanKind::Intersect => write!(f, "intersect"),
        }
    }
}

/// Combine two solids into a new one. Both inputs are consumed.
///
/// Subtracting a tool that does not reach the target is an error rather
/// than a silent no-op.
pub fn combine(
    kb: &mut dyn KernelBundle,
    a: Solid,
    b: Solid,
    kind: BooleanKind,
) -> Result<Solid, OpError> {
    let failure = |reason: String| OpError::BooleanFailure {
        op: kind.to_string(),
        reason,
    };

    if kind == BooleanKind::Subtract {
        let tol = Tolerance::default();
        let target = kernel_ext::solid_bbox(kb.as_introspect(), &a)?;
        let tool = kernel_ext::solid_bbox(kb.as_introspect(), &b)?;
        if !target.overlaps(&tool, tol.coincidence) {
            warn!(?target, ?tool, "subtraction tool misses the target");
            return Err(failure("tool does not intersect the target".to_string()));
        }
    }

    let result = match kind {
        BooleanKind::Union => kb.boolean_union(a.handle(), b.handle()),
        BooleanKind::Subtract => kb.boolean_subtract(a.handle(), b.handle()),
        BooleanKind::Intersect => kb.boolean_intersect(a.handle(), b.handle()),
    };
    let handle = result.map_err(|e| match e {
        KernelError::BooleanFailed { reason } => failure(reason),
        other => failure(other.to_string()),
    })?;

    let solid = Solid::new(handle);
    let (faces, edges) = kernel_ext::topology_counts(kb.as_introspect(), &solid);
    debug!(%kind, faces, edges, "combined solids");
    Ok(solid)
}

/// Apply a sequence of booleans to `initial`, left to right.
pub fn fold(
    kb: &mut dyn KernelBundle,
    initial: Solid,
    steps: Vec<(BooleanKind, Solid)>,
) -> Result<Solid, OpError> {
    steps
        .into_iter()
        .try_fold(initial, |acc, (kind, tool)| combine(kb, acc, tool, kind))
}

/// Reflected copy of `solid` through the plane at `origin` with `normal`.
pub fn mirror(
    kb: &mut dyn KernelBundle,
    solid: &Solid,
    origin: [f64; 3],
    normal: [f64; 3],
) -> Result<Solid, OpError> {
    let Some(normal) = fixture_types::normalize(normal) else {
        return Err(OpError::InvalidParameter {
            reason: "mirror plane normal is zero".to_string(),
        });
    };
    let handle = kb.mirror_solid(solid.handle(), origin, normal)?;
    Ok(Solid::new(handle))
}

/// `solid` unioned with its own reflection.
pub fn mirror_union(
    kb: &mut dyn KernelBundle,
    solid: Solid,
    origin: [f64; 3],
    normal: [f64; 3],
) -> Result<Solid, OpError> {
    let image = mirror(kb, &solid, origin, normal)?;
    combine(kb, solid, image, BooleanKind::Union)
}

/// Copy of `solid` moved by `offset`.
pub fn translate(
    kb: &mut dyn KernelBundle,
    solid: &Solid,
    offset: [f64; 3],
) -> Result<Solid, OpError> {
    if offset.iter().any(|c| !c.is_finite()) {
        return Err(OpError::InvalidParameter {
            reason: format!("translation {offset:?} is not finite"),
        });
    }
    let handle = kb.translate_solid(solid.handle(), offset)?;
    Ok(Solid::new(handle))
}
