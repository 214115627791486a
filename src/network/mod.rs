//! Network construction: canonicalizing raw point input plus a reference
//! surface or mesh into an organized grid with orientation frames and
//! row-interpolating curves.

mod builder;
mod grid;

pub use builder::{
    Network, NetworkDiagnostics, NetworkOptions, ReferenceOption, build_network,
};
pub use grid::{BranchRow, OrientationFrame, PointGrid};
