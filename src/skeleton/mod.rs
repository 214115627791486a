//! Skeleton construction: re-sequencing a network's grid under a traversal
//! strategy into one ordered, continuously traversable path.

mod builder;
mod canonical;

pub use builder::{
    EdgeSide, Skeleton, SkeletonDiagnostics, SkeletonStrategy, build_skeleton,
};
pub use canonical::{CanonicalDiagnostics, CanonicalGrid, RowAxis, canonicalize_grid};
