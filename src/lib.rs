//! Skein: surface toolpath generation for strip-based fabrication.
//!
//! The pipeline converts an organized grid of spatial points plus a reference
//! surface or mesh into a continuously traversable path with per-point
//! orientation frames, then layers manufacturing metadata on top:
//!
//! 1. [`network::build_network`] canonicalizes the input into a point grid on
//!    a strip-width-grown surface, with tangent/perpendicular frames and one
//!    interpolating curve per row.
//! 2. [`skeleton::build_skeleton`] re-sequences the grid under a traversal
//!    strategy (snake, spiral, linear, edge) into one ordered path.
//! 3. [`package::SkeletonPackage`] bundles the two for downstream stages.
//! 4. [`toolpath::StripPattern`] and [`toolpath::ToolpathStack`] turn the
//!    package into per-layer oriented planes with normalized speed factors,
//!    and the output adapters remap those into device units.
//!
//! Every builder is a pure function of its inputs producing an immutable
//! aggregate; failures follow the [`error::BuildError`] taxonomy and abort
//! construction rather than exposing a partial result.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod geom;
pub mod network;
pub mod package;
pub mod skeleton;
pub mod toolpath;

pub use error::BuildError;
pub use network::{Network, NetworkOptions, ReferenceOption, build_network};
pub use package::SkeletonPackage;
pub use skeleton::{EdgeSide, Skeleton, SkeletonStrategy, build_skeleton};
pub use toolpath::{
    StripPattern, ToolpathPattern, ToolpathStack, gcode_output, robot_output,
};
