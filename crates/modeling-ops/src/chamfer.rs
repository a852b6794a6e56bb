use crate::feature;
use crate::kernel_ext::KernelBundle;
use crate::types::{FeatureKind, OpError, Selection, Solid};

/// Bevel the selected edges of a solid, setting each face back by `distance`.
pub fn apply_chamfer(
    kb: &mut dyn KernelBundle,
    solid: Solid,
    selection: &Selection,
    distance: f64,
) -> Result<Solid, OpError> {
    feature::round(kb, solid, selection, FeatureKind::Chamfer, distance)
}
