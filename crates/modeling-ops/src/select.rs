//! Selector: pick faces or edges of a solid by geometric predicates.
//!
//! Predicates only look at entity signatures, so a selection depends on
//! where an entity is, never on when it was created.

use fixture_types::{
    dot, scale, sub, Axis, GeomKind, Predicate, Query, Sense, TopoKind,
    TopoSignature, Tolerance, Workplane,
};
use geom_kernel::{KernelId, KernelIntrospect};
use tracing::debug;

use crate::kernel_ext;
use crate::types::{OpError, Selection, Solid};

/// Evaluate `predicate` over signed candidates.
///
/// Returns the matching ids in candidate order.
pub fn evaluate(
    candidates: &[(KernelId, TopoSignature)],
    predicate: &Predicate,
    tol: &Tolerance,
) -> Result<Vec<KernelId>, OpError> {
    let all: Vec<usize> = (0..candidates.len()).collect();
    let picked = narrow(candidates, &all, predicate, tol)?;
    Ok(picked.into_iter().map(|i| candidates[i].0).collect())
}

fn narrow(
    candidates: &[(KernelId, TopoSignature)],
    within: &[usize],
    predicate: &Predicate,
    tol: &Tolerance,
) -> Result<Vec<usize>, OpError> {
    let sig = |i: usize| &candidates[i].1;
    let keep = |test: &dyn Fn(&TopoSignature) -> bool| -> Vec<usize> {
        within.iter().copied().filter(|&i| test(sig(i))).collect()
    };

    match predicate {
        Predicate::Orientation { axis, sign } => {
            let target = scale(axis.unit(), sign.factor());
            Ok(keep(&|s| s.normal.is_some_and(|n| tol.codirectional(n, target))))
        }
        Predicate::Parallel { axis } => {
            Ok(keep(&|s| direction_of(s).is_some_and(|d| tol.parallel(d, axis.unit()))))
        }
        Predicate::Perpendicular { axis } => {
            Ok(keep(&|s| direction_of(s).is_some_and(|d| tol.perpendicular(d, axis.unit()))))
        }
        Predicate::Extremal { axis, sense } => {
            let coord = |i: usize| axis.coord(sig(i).centroid);
            let best = within.iter().map(|&i| coord(i)).reduce(|a, b| match sense {
                Sense::Max => a.max(b),
                Sense::Min => a.min(b),
            });
            Ok(match best {
                Some(best) => keep(&|s| tol.coincident(axis.coord(s.centroid), best)),
                None => Vec::new(),
            })
        }
        Predicate::Rank { axis, sense, index } => {
            let groups = rank_groups(candidates, within, *axis, *sense, tol);
            if *index >= groups.len() {
                return Err(OpError::SelectionOutOfRange {
                    index: *index,
                    count: groups.len(),
                });
            }
            let level = groups[*index];
            Ok(keep(&|s| tol.coincident(axis.coord(s.centroid), level)))
        }
        Predicate::Kind { kind } => Ok(keep(&|s| s.kind == *kind)),
        Predicate::All { of } => of.iter().try_fold(within.to_vec(), |acc, p| {
            narrow(candidates, &acc, p, tol)
        }),
        Predicate::Any { of } => {
            let mut hit = vec![false; candidates.len()];
            for p in of {
                for i in narrow(candidates, within, p, tol)? {
                    hit[i] = true;
                }
            }
            Ok(within.iter().copied().filter(|&i| hit[i]).collect())
        }
    }
}

/// Face normal, or the tangent of a straight edge.
fn direction_of(sig: &TopoSignature) -> Option<[f64; 3]> {
    match sig.kind {
        GeomKind::Line => sig.direction,
        k if k.is_surface() => sig.normal,
        _ => None,
    }
}

/// Distinct coordinate levels along `axis`, in rank order.
fn rank_groups(
    candidates: &[(KernelId, TopoSignature)],
    within: &[usize],
    axis: Axis,
    sense: Sense,
    tol: &Tolerance,
) -> Vec<f64> {
    let mut coords: Vec<f64> = within
        .iter()
        .map(|&i| axis.coord(candidates[i].1.centroid))
        .collect();
    coords.sort_by(|a, b| a.total_cmp(b));
    if sense == Sense::Max {
        coords.reverse();
    }
    let mut levels: Vec<f64> = Vec::new();
    for c in coords {
        if !levels.last().is_some_and(|&l| tol.coincident(l, c)) {
            levels.push(c);
        }
    }
    levels
}

/// Select faces or edges of `solid` matching `predicate`.
pub fn select(
    kernel: &dyn KernelIntrospect,
    solid: &Solid,
    kind: TopoKind,
    predicate: &Predicate,
    tol: &Tolerance,
) -> Result<Selection, OpError> {
    if !matches!(kind, TopoKind::Face | TopoKind::Edge) {
        return Err(OpError::InvalidParameter {
            reason: format!("cannot select entities of kind {kind:?}"),
        });
    }
    let candidates = kernel_ext::signatures(kernel, solid, kind);
    let ids = evaluate(&candidates, predicate, tol)?;
    debug!(?kind, candidates = candidates.len(), selected = ids.len(), "selected");
    Ok(Selection::new(kind, ids, solid.generation()))
}

/// Select among the edges bounding the faces in `faces`.
pub fn select_edges_of(
    kernel: &dyn KernelIntrospect,
    solid: &Solid,
    faces: &Selection,
    predicate: &Predicate,
    tol: &Tolerance,
) -> Result<Selection, OpError> {
    faces.check_current(solid)?;
    if faces.kind() != TopoKind::Face {
        return Err(OpError::InvalidParameter {
            reason: format!("expected a face selection, got {:?}", faces.kind()),
        });
    }
    let candidates: Vec<(KernelId, TopoSignature)> = boundary_edges(kernel, faces.ids())
        .into_iter()
        .map(|e| (e, kernel.compute_signature(e, TopoKind::Edge)))
        .collect();
    let ids = evaluate(&candidates, predicate, tol)?;
    debug!(faces = faces.len(), candidates = candidates.len(), selected = ids.len(), "selected edges of faces");
    Ok(Selection::new(TopoKind::Edge, ids, solid.generation()))
}

/// Edges bounding any of `faces`, each once, in first-seen order.
pub(crate) fn boundary_edges(kernel: &dyn KernelIntrospect, faces: &[KernelId]) -> Vec<KernelId> {
    let mut edges: Vec<KernelId> = Vec::new();
    for &face in faces {
        for edge in kernel.face_edges(face) {
            if !edges.contains(&edge) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// Run a faces-then-edges query.
pub fn run_query(
    kernel: &dyn KernelIntrospect,
    solid: &Solid,
    query: &Query,
    tol: &Tolerance,
) -> Result<Selection, OpError> {
    match (&query.faces, &query.edges) {
        (Some(faces), None) => select(kernel, solid, TopoKind::Face, faces, tol),
        (None, Some(edges)) => select(kernel, solid, TopoKind::Edge, edges, tol),
        (Some(faces), Some(edges)) => {
            let faces = select(kernel, solid, TopoKind::Face, faces, tol)?;
            select_edges_of(kernel, solid, &faces, edges, tol)
        }
        (None, None) => Err(OpError::InvalidParameter {
            reason: "query selects neither faces nor edges".to_string(),
        }),
    }
}

/// A workplane lying on the selected coplanar planar faces.
///
/// The origin is the mean face centroid and the normal is the shared
/// outward normal. The local x axis is global X projected onto the plane,
/// or global Y when the plane faces along X.
pub fn workplane_on(
    kernel: &dyn KernelIntrospect,
    solid: &Solid,
    faces: &Selection,
) -> Result<Workplane, OpError> {
    faces.check_current(solid)?;
    if faces.kind() != TopoKind::Face || faces.is_empty() {
        return Err(OpError::InvalidParameter {
            reason: "a workplane needs at least one selected face".to_string(),
        });
    }
    let tol = Tolerance::default();
    let sigs: Vec<TopoSignature> = faces
        .ids()
        .iter()
        .map(|&f| kernel.compute_signature(f, TopoKind::Face))
        .collect();

    let Some(normal) = sigs[0].normal.filter(|_| sigs[0].kind == GeomKind::Planar) else {
        return Err(OpError::InvalidParameter {
            reason: "workplane faces must be planar".to_string(),
        });
    };
    for s in &sigs {
        let coplanar = s.normal.is_some_and(|n| tol.codirectional(n, normal))
            && dot(sub(s.centroid, sigs[0].centroid), normal).abs()
                <= tol.coincidence.max(1e-6);
        if !coplanar {
            return Err(OpError::InvalidParameter {
                reason: "workplane faces are not coplanar".to_string(),
            });
        }
    }

    let n = sigs.len() as f64;
    let origin = sigs.iter().fold([0.0; 3], |acc, s| {
        [
            acc[0] + s.centroid[0] / n,
            acc[1] + s.centroid[1] / n,
            acc[2] + s.centroid[2] / n,
        ]
    });
    let x_hint = if tol.parallel(normal, Axis::X.unit()) {
        Axis::Y.unit()
    } else {
        Axis::X.unit()
    };
    Workplane::from_frame(origin, x_hint, normal).ok_or_else(|| OpError::InvalidParameter {
        reason: "degenerate workplane frame".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture_types::{BoundingBox, Sign};

    fn face(id: u64, centroid: [f64; 3], normal: [f64; 3]) -> (KernelId, TopoSignature) {
        (
            KernelId(id),
            TopoSignature {
                kind: GeomKind::Planar,
                centroid,
                normal: Some(normal),
                bbox: BoundingBox::new(centroid, centroid),
                ..TopoSignature::empty()
            },
        )
    }

    fn line(id: u64, centroid: [f64; 3], direction: [f64; 3]) -> (KernelId, TopoSignature) {
        (
            KernelId(id),
            TopoSignature {
                kind: GeomKind::Line,
                centroid,
                direction: Some(direction),
                ..TopoSignature::empty()
            },
        )
    }

    /// A stepped block: two top levels at z=5 and z=3, bottom at z=0.
    fn stepped() -> Vec<(KernelId, TopoSignature)> {
        vec![
            face(1, [0.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            face(2, [-1.0, 0.0, 5.0], [0.0, 0.0, 1.0]),
            face(3, [1.0, 0.0, 3.0], [0.0, 0.0, 1.0]),
            face(4, [2.0, 0.0, 1.5], [1.0, 0.0, 0.0]),
            face(5, [0.0, 0.0, 4.0], [1.0, 0.0, 0.0]),
            face(6, [0.5, 2.0, 2.5], [0.0, 1.0, 0.0]),
        ]
    }

    fn ids(v: &[u64]) -> Vec<KernelId> {
        v.iter().copied().map(KernelId).collect()
    }

    #[test]
    fn orientation_matches_sign() {
        let tol = Tolerance::default();
        let up = evaluate(&stepped(), &Predicate::facing(Axis::Z, Sign::Pos), &tol).unwrap();
        assert_eq!(up, ids(&[2, 3]));
        let down = evaluate(&stepped(), &Predicate::facing(Axis::Z, Sign::Neg), &tol).unwrap();
        assert_eq!(down, ids(&[1]));
    }

    #[test]
    fn parallel_and_perpendicular_partition_box_faces() {
        let tol = Tolerance::default();
        let par = evaluate(&stepped(), &Predicate::parallel(Axis::Z), &tol).unwrap();
        let perp = evaluate(&stepped(), &Predicate::Perpendicular { axis: Axis::Z }, &tol).unwrap();
        assert_eq!(par, ids(&[1, 2, 3]));
        assert_eq!(perp, ids(&[4, 5, 6]));
    }

    #[test]
    fn extremal_includes_ties() {
        let tol = Tolerance::default();
        let cands = vec![
            line(10, [0.0, 0.0, 2.0], [1.0, 0.0, 0.0]),
            line(11, [0.0, 1.0, 2.0], [1.0, 0.0, 0.0]),
            line(12, [0.0, 1.0, 1.0], [1.0, 0.0, 0.0]),
        ];
        let top = evaluate(&cands, &Predicate::max(Axis::Z), &tol).unwrap();
        assert_eq!(top, ids(&[10, 11]));
    }

    #[test]
    fn rank_counts_distinct_levels() {
        let tol = Tolerance::default();
        let second_high = evaluate(&stepped(), &Predicate::rank(Axis::Z, Sense::Max, 1), &tol).unwrap();
        assert_eq!(second_high, ids(&[5]));
        let second_low = evaluate(&stepped(), &Predicate::rank(Axis::Z, Sense::Min, 1), &tol).unwrap();
        assert_eq!(second_low, ids(&[4]));

        let err = evaluate(&stepped(), &Predicate::rank(Axis::Z, Sense::Max, 6), &tol).unwrap_err();
        assert!(matches!(err, OpError::SelectionOutOfRange { index: 6, count: 6 }));
    }

    #[test]
    fn all_narrows_in_order() {
        let tol = Tolerance::default();
        // highest of the +X faces, not the highest face overall
        let p = Predicate::all([Predicate::facing(Axis::X, Sign::Pos), Predicate::max(Axis::Z)]);
        assert_eq!(evaluate(&stepped(), &p, &tol).unwrap(), ids(&[5]));
    }

    #[test]
    fn any_keeps_candidate_order() {
        let tol = Tolerance::default();
        let p = Predicate::any([Predicate::max(Axis::Y), Predicate::min(Axis::Z)]);
        assert_eq!(evaluate(&stepped(), &p, &tol).unwrap(), ids(&[1, 6]));
    }

    #[test]
    fn kind_filter_and_empty_result() {
        let tol = Tolerance::default();
        let mut cands = stepped();
        cands.push(line(20, [0.0; 3], [0.0, 0.0, 1.0]));
        let lines = evaluate(&cands, &Predicate::Kind { kind: GeomKind::Line }, &tol).unwrap();
        assert_eq!(lines, ids(&[20]));
        let none = evaluate(&cands, &Predicate::Kind { kind: GeomKind::Cylindrical }, &tol).unwrap();
        assert!(none.is_empty());
        assert!(evaluate(&[], &Predicate::max(Axis::X), &tol).unwrap().is_empty());
    }
}
