//! Geometry kernel for the toolpath pipeline.
//!
//! This module centralizes the primitive geometric operations the pipeline
//! builders consume (closest-point projection, normal/tangent evaluation,
//! curve interpolation, surface growth, ribbon construction) so the network,
//! skeleton, and toolpath layers can remain thin.

mod core;
mod curve;
mod mesh;
mod ribbon;
mod surface;

pub use self::core::{Plane, Point3, Tolerance, Vec3};
pub use curve::{
    Curve3, NurbsCurve3, Polyline3,
    // Closest-parameter and seam utilities
    SeamAnchorDiagnostics, closest_curve_parameter, rotate_seam_to_anchor,
};
pub use mesh::{TriMesh, TriMeshError};
pub use ribbon::{
    RibbonDiagnostics, RibbonError, RibbonOptions, resample_rail, ribbon_between_rails,
};
pub use surface::{
    ExtendDiagnostics, ExtendedSurface, GridSurface, PlaneSurface, Surface, SurfaceFitDiagnostics,
    SurfaceFitError, SurfaceProjection, extend_surface, surface_from_grid,
};

#[cfg(test)]
mod tests;
