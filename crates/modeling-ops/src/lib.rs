pub mod boolean;
pub mod chamfer;
pub mod extrude;
pub mod feature;
pub mod fillet;
pub mod kernel_ext;
pub mod profile;
pub mod select;
pub mod types;

pub use boolean::{combine, fold, mirror, mirror_union, translate, BooleanKind};
pub use chamfer::apply_chamfer;
pub use extrude::{extrude, extrude_through_all};
pub use feature::apply;
pub use fillet::apply_fillet;
pub use kernel_ext::KernelBundle;
pub use profile::{build, MirrorAxis, MirrorMode, Outline, Profile, ProfileBuilder};
pub use select::{evaluate, run_query, select, select_edges_of, workplane_on};
pub use types::*;
