use crate::feature;
use crate::kernel_ext::KernelBundle;
use crate::types::{FeatureKind, OpError, Selection, Solid};

/// Fillet (round) the selected edges of a solid with the given radius.
///
/// A face selection rounds every edge bounding those faces. An empty
/// selection returns `solid` unchanged.
pub fn apply_fillet(
    kb: &mut dyn KernelBundle,
    solid: Solid,
    selection: &Selection,
    radius: f64,
) -> Result<Solid, OpError> {
    feature::round(kb, solid, selection, FeatureKind::Fillet, radius)
}
