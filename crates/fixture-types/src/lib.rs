pub mod boundary;
pub mod geom;
pub mod select;
pub mod topo;
pub mod workplane;

pub use boundary::*;
pub use geom::*;
pub use select::*;
pub use topo::*;
pub use workplane::*;
