use serde::{Deserialize, Serialize};

use crate::geom::{Axis, Sense, Sign};
use crate::topo::GeomKind;

/// Geometric criterion for picking faces or edges of a solid.
///
/// Predicates are evaluated against entity signatures only, never against
/// the order in which entities were created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Predicate {
    /// Planar faces whose outward normal points along `sign * axis`.
    Orientation { axis: Axis, sign: Sign },
    /// Faces whose normal, or edges whose tangent, is parallel to `axis`
    /// (`|Z` in the usual selector notation).
    Parallel { axis: Axis },
    /// Faces whose normal, or straight edges whose tangent, is perpendicular
    /// to `axis` (`#Z`).
    Perpendicular { axis: Axis },
    /// Entities whose centroid is minimal or maximal along `axis`. Ties are
    /// all included.
    Extremal { axis: Axis, sense: Sense },
    /// The `index`-th group of entities ordered by centroid coordinate along
    /// `axis`. Ascending for `Min`, descending for `Max`. Coincident
    /// coordinates form one group.
    Rank { axis: Axis, sense: Sense, index: usize },
    /// Entities of one geometric kind.
    Kind { kind: GeomKind },
    /// Each predicate narrows the result of the previous one.
    All { of: Vec<Predicate> },
    /// Union of the results, in candidate order.
    Any { of: Vec<Predicate> },
}

impl Predicate {
    pub fn max(axis: Axis) -> Self {
        Predicate::Extremal { axis, sense: Sense::Max }
    }

    pub fn min(axis: Axis) -> Self {
        Predicate::Extremal { axis, sense: Sense::Min }
    }

    pub fn facing(axis: Axis, sign: Sign) -> Self {
        Predicate::Orientation { axis, sign }
    }

    pub fn parallel(axis: Axis) -> Self {
        Predicate::Parallel { axis }
    }

    pub fn rank(axis: Axis, sense: Sense, index: usize) -> Self {
        Predicate::Rank { axis, sense, index }
    }

    pub fn all(of: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::All { of: of.into_iter().collect() }
    }

    pub fn any(of: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Any { of: of.into_iter().collect() }
    }
}

/// A "faces, then their edges" selection chain.
///
/// With only `faces` set the result is a face selection. With `edges` set
/// the edge predicate runs over the edges bounding the selected faces, or
/// over every edge of the solid when `faces` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub faces: Option<Predicate>,
    #[serde(default)]
    pub edges: Option<Predicate>,
}

impl Query {
    pub fn faces(p: Predicate) -> Self {
        Self { faces: Some(p), edges: None }
    }

    pub fn edges(p: Predicate) -> Self {
        Self { faces: None, edges: Some(p) }
    }

    pub fn edges_of(faces: Predicate, edges: Predicate) -> Self {
        Self { faces: Some(faces), edges: Some(edges) }
    }
}
