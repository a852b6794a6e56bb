//! Feature Applier: fillets and chamfers on selected edges.

use fixture_types::{
    across_face, add, cross, dot, normalize, scale, sub, BoundaryCurve, GeomKind, TopoKind,
    Tolerance,
};
use geom_kernel::{KernelError, KernelId, KernelIntrospect};
use tracing::{debug, warn};

use crate::kernel_ext::{self, KernelBundle};
use crate::select;
use crate::types::{FeatureKind, FeatureRequest, OpError, Selection, Solid};

/// Apply a fillet or chamfer request to `solid`.
pub fn apply(
    kb: &mut dyn KernelBundle,
    solid: Solid,
    request: &FeatureRequest,
) -> Result<Solid, OpError> {
    round(kb, solid, &request.selection, request.kind, request.size)
}

/// Round the selected edges of `solid`, or the boundary edges of the
/// selected faces.
///
/// Sizes are never clamped: a size that does not fit the faces next to an
/// edge is reported as [`OpError::InfeasibleFeature`].
pub(crate) fn round(
    kb: &mut dyn KernelBundle,
    solid: Solid,
    selection: &Selection,
    kind: FeatureKind,
    size: f64,
) -> Result<Solid, OpError> {
    if !(size > 0.0 && size.is_finite()) {
        return Err(OpError::InvalidParameter {
            reason: format!("{kind} size must be positive, got {size}"),
        });
    }
    selection.check_current(&solid)?;
    if selection.is_empty() {
        debug!(%kind, size, "empty selection, solid unchanged");
        return Ok(solid);
    }

    let edges = match selection.kind() {
        TopoKind::Edge => selection.ids().to_vec(),
        TopoKind::Face => select::boundary_edges(kb.as_introspect(), selection.ids()),
        other => {
            return Err(OpError::InvalidParameter {
                reason: format!("cannot {kind} a selection of {other:?}"),
            })
        }
    };

    check_fits(kb.as_introspect(), &edges, kind, size)?;

    let result = match kind {
        FeatureKind::Fillet => kb.fillet_edges(solid.handle(), &edges, size),
        FeatureKind::Chamfer => kb.chamfer_edges(solid.handle(), &edges, size),
    };
    let handle = result.map_err(|e| blend_error(kind, size, e))?;

    let rounded = Solid::new(handle);
    let (faces, edge_count) = kernel_ext::topology_counts(kb.as_introspect(), &rounded);
    debug!(%kind, size, edges = edges.len(), faces, edge_count, "applied rounding");
    Ok(rounded)
}

/// Reject sizes that reach across a planar face next to a straight edge.
///
/// The face width is measured from the edge into the face along the face's
/// own boundary, so notches and hole rims narrow it. When the boundary that
/// limits the width is another selected edge running parallel, both
/// roundings eat into that width.
/// A blend the kernel could not fit is infeasible; anything else, such as
/// a kernel without blends, stays a kernel error.
fn blend_error(kind: FeatureKind, size: f64, err: KernelError) -> OpError {
    match err {
        KernelError::FilletFailed { reason } | KernelError::ChamferFailed { reason } => {
            warn!(%kind, size, %reason, "kernel rejected rounding");
            OpError::InfeasibleFeature { kind, size, reason }
        }
        other => OpError::Kernel(other),
    }
}

fn check_fits(
    kernel: &dyn KernelIntrospect,
    edges: &[KernelId],
    kind: FeatureKind,
    size: f64,
) -> Result<(), OpError> {
    let tol = Tolerance::default();
    let lines: Vec<(KernelId, [f64; 3], [f64; 3])> = edges
        .iter()
        .filter_map(|&e| {
            let sig = kernel.compute_signature(e, TopoKind::Edge);
            match (sig.kind, sig.direction) {
                (GeomKind::Line, Some(d)) => Some((e, d, sig.centroid)),
                _ => None,
            }
        })
        .collect();
    let parallel_sibling = |edge: KernelId, other: KernelId, direction: [f64; 3]| {
        lines
            .iter()
            .any(|&(e, d, _)| e == other && e != edge && tol.parallel(d, direction))
    };

    for &(edge, direction, midpoint) in &lines {
        for face in kernel.edge_faces(edge) {
            let fsig = kernel.compute_signature(face, TopoKind::Face);
            let (GeomKind::Planar, Some(normal)) = (fsig.kind, fsig.normal) else {
                continue;
            };
            let face_edges = kernel.face_edges(face);
            let (ids, boundary): (Vec<KernelId>, Vec<BoundaryCurve>) = face_edges
                .iter()
                .filter(|&&e| e != edge)
                .filter_map(|&e| boundary_curve(kernel, e).map(|c| (e, c)))
                .unzip();

            let (width, shares_width) = match across_face(&boundary, normal, midpoint, direction) {
                Some(across) => (
                    across.width,
                    parallel_sibling(edge, ids[across.curve], direction),
                ),
                None => {
                    let Some(mut across) = normalize(cross(normal, direction)) else {
                        continue;
                    };
                    if dot(across, sub(fsig.centroid, midpoint)) < 0.0 {
                        across = scale(across, -1.0);
                    }
                    let shares = face_edges
                        .iter()
                        .any(|&other| parallel_sibling(edge, other, direction));
                    (fsig.bbox.span_along(across), shares)
                }
            };
            let required = if shares_width { 2.0 * size } else { size };

            if required >= width - tol.coincidence {
                warn!(%kind, size, width, "rounding does not fit the adjacent face");
                return Err(OpError::InfeasibleFeature {
                    kind,
                    size,
                    reason: format!("needs {required} across a face {width:.4} wide"),
                });
            }
        }
    }
    Ok(())
}

/// The planar curve an edge traces, rebuilt from its signature.
fn boundary_curve(kernel: &dyn KernelIntrospect, edge: KernelId) -> Option<BoundaryCurve> {
    let sig = kernel.compute_signature(edge, TopoKind::Edge);
    match sig.kind {
        GeomKind::Line => {
            let half = scale(sig.direction?, sig.length? / 2.0);
            Some(BoundaryCurve::Segment {
                start: sub(sig.centroid, half),
                end: add(sig.centroid, half),
            })
        }
        GeomKind::Circle => Some(BoundaryCurve::Circle {
            center: sig.centroid,
            radius: sig.radius?,
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failed_blends_are_infeasible() {
        let failed = KernelError::FilletFailed {
            reason: "too wide".to_string(),
        };
        assert!(matches!(
            blend_error(FeatureKind::Fillet, 2.0, failed),
            OpError::InfeasibleFeature { kind: FeatureKind::Fillet, .. }
        ));

        let unsupported = KernelError::NotSupported {
            operation: "chamfer".to_string(),
        };
        assert!(matches!(
            blend_error(FeatureKind::Chamfer, 1.0, unsupported),
            OpError::Kernel(KernelError::NotSupported { .. })
        ));
    }
}
