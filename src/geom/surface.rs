use std::sync::Arc;

use super::core::{Point3, Tolerance, Vec3};

// ============================================================================
// Surface trait
// ============================================================================

/// Result of projecting a point onto a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProjection {
    pub u: f64,
    pub v: f64,
    pub point: Point3,
}

pub trait Surface: Send + Sync {
    fn point_at(&self, u: f64, v: f64) -> Point3;

    #[must_use]
    fn domain_u(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn domain_v(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn partial_derivatives_at(&self, u: f64, v: f64) -> (Vec3, Vec3) {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();

        let u_span = u1 - u0;
        let v_span = v1 - v0;

        let u = u.clamp(u0, u1);
        let v = v.clamp(v0, v1);

        let mut du = Vec3::ZERO;
        let mut dv = Vec3::ZERO;

        if u_span.is_finite() && u_span != 0.0 {
            let h = Tolerance::DERIVATIVE.relative_to(u_span);
            if h.is_finite() && h != 0.0 {
                let ua = (u - h).max(u0);
                let ub = (u + h).min(u1);
                if ub > ua {
                    let pa = self.point_at(ua, v);
                    let pb = self.point_at(ub, v);
                    du = pb.sub_point(pa).mul_scalar(1.0 / (ub - ua));
                }
            }
        }

        if v_span.is_finite() && v_span != 0.0 {
            let h = Tolerance::DERIVATIVE.relative_to(v_span);
            if h.is_finite() && h != 0.0 {
                let va = (v - h).max(v0);
                let vb = (v + h).min(v1);
                if vb > va {
                    let pa = self.point_at(u, va);
                    let pb = self.point_at(u, vb);
                    dv = pb.sub_point(pa).mul_scalar(1.0 / (vb - va));
                }
            }
        }

        (du, dv)
    }

    /// Unit surface normal at `(u, v)`, or `None` at degenerate parameters.
    #[must_use]
    fn normal_at(&self, u: f64, v: f64) -> Option<Vec3> {
        let (du, dv) = self.partial_derivatives_at(u, v);
        du.cross(dv).normalized()
    }

    /// Projects `query` onto the surface by closest point.
    ///
    /// Coarse grid scan over the domain followed by Gauss-Newton refinement
    /// on the squared-distance objective. The result is clamped to the
    /// surface domain.
    #[must_use]
    fn closest_point(&self, query: Point3) -> SurfaceProjection {
        let (u0, u1) = self.domain_u();
        let (v0, v1) = self.domain_v();
        let u_span = u1 - u0;
        let v_span = v1 - v0;

        const SCAN: usize = 16;
        let mut best_u = u0;
        let mut best_v = v0;
        let mut best_distance = f64::INFINITY;
        for i in 0..=SCAN {
            let u = u0 + u_span * (i as f64 / SCAN as f64);
            for j in 0..=SCAN {
                let v = v0 + v_span * (j as f64 / SCAN as f64);
                let d = self.point_at(u, v).distance_squared_to(query);
                if d < best_distance {
                    best_distance = d;
                    best_u = u;
                    best_v = v;
                }
            }
        }

        let mut u = best_u;
        let mut v = best_v;
        for _ in 0..12 {
            let p = self.point_at(u, v);
            let r = p.sub_point(query);
            let (du, dv) = self.partial_derivatives_at(u, v);

            // Normal equations of the 3x2 Jacobian
            let a = du.dot(du);
            let b = du.dot(dv);
            let c = dv.dot(dv);
            let g0 = du.dot(r);
            let g1 = dv.dot(r);

            let det = a * c - b * b;
            if !det.is_finite() || det.abs() < 1e-18 {
                break;
            }

            let step_u = (-g0 * c + g1 * b) / det;
            let step_v = (g0 * b - g1 * a) / det;

            u = (u + step_u).clamp(u0, u1);
            v = (v + step_v).clamp(v0, v1);

            let step = (step_u * step_u + step_v * step_v).sqrt();
            if step < 1e-13 {
                break;
            }
        }

        SurfaceProjection {
            u,
            v,
            point: self.point_at(u, v),
        }
    }
}

// ============================================================================
// PlaneSurface
// ============================================================================

/// A planar patch spanned by two axis vectors; `point_at(u, v)` is
/// `origin + u * x_axis + v * y_axis`, extrapolating freely outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSurface {
    pub origin: Point3,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
}

impl PlaneSurface {
    #[must_use]
    pub const fn new(origin: Point3, x_axis: Vec3, y_axis: Vec3) -> Self {
        Self {
            origin,
            x_axis,
            y_axis,
        }
    }
}

impl Surface for PlaneSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.origin
            .add_vec(self.x_axis.mul_scalar(u))
            .add_vec(self.y_axis.mul_scalar(v))
    }
}

// ============================================================================
// GridSurface
// ============================================================================

/// An interpolating surface through an organized point grid.
///
/// Bilinear patches between neighboring grid points over the unit domain,
/// with U varying along columns and V along rows. Parameters outside `[0, 1]`
/// extrapolate the boundary patches linearly, which is what allows the
/// extended-surface wrapper to grow the domain past the sampled region.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSurface {
    points: Vec<Point3>,
    u_count: usize,
    v_count: usize,
}

impl GridSurface {
    #[must_use]
    pub fn u_count(&self) -> usize {
        self.u_count
    }

    #[must_use]
    pub fn v_count(&self) -> usize {
        self.v_count
    }

    /// Grid point at `(row, col)` = `(v index, u index)`.
    #[must_use]
    pub fn grid_point(&self, row: usize, col: usize) -> Point3 {
        self.points[row * self.u_count + col]
    }
}

impl Surface for GridSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        // Cell-space coordinates; fractional parts may leave [0, 1] so the
        // boundary patches extrapolate.
        let x = u * (self.u_count - 1) as f64;
        let y = v * (self.v_count - 1) as f64;

        let i = (x.floor() as isize).clamp(0, self.u_count as isize - 2) as usize;
        let j = (y.floor() as isize).clamp(0, self.v_count as isize - 2) as usize;
        let fx = x - i as f64;
        let fy = y - j as f64;

        let p00 = self.grid_point(j, i);
        let p10 = self.grid_point(j, i + 1);
        let p01 = self.grid_point(j + 1, i);
        let p11 = self.grid_point(j + 1, i + 1);

        let bottom = p00.lerp(p10, fx);
        let top = p01.lerp(p11, fx);
        bottom.lerp(top, fy)
    }
}

// ============================================================================
// Surface fitting
// ============================================================================

/// Errors that can occur during surface fitting.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SurfaceFitError {
    /// Invalid grid dimensions (too small).
    #[error("invalid grid size: {u_count}×{v_count} (minimum 2×2)")]
    InvalidGridSize { u_count: usize, v_count: usize },

    /// Grid dimensions do not match the number of provided points.
    #[error("grid size mismatch: expected {expected} points, got {provided}")]
    GridSizeMismatch { expected: usize, provided: usize },

    /// Points are non-finite or otherwise unusable.
    #[error("degenerate point configuration: {reason}")]
    DegeneratePoints { reason: String },
}

/// Diagnostics from surface fitting operations.
#[derive(Debug, Clone, Default)]
pub struct SurfaceFitDiagnostics {
    /// Number of input points.
    pub input_point_count: usize,
    /// Grid dimensions used (u × v).
    pub grid_size: (usize, usize),
    /// Warnings generated during fitting.
    pub warnings: Vec<String>,
}

/// Fit an interpolating surface through a grid of points.
///
/// Points must be arranged in row-major order (U varies fastest):
/// `[row0_col0, row0_col1, ..., row0_colN, row1_col0, ...]`
///
/// # Errors
/// Fails on undersized grids, point-count mismatches, and non-finite input.
pub fn surface_from_grid(
    points: &[Point3],
    u_count: usize,
    v_count: usize,
) -> Result<(GridSurface, SurfaceFitDiagnostics), SurfaceFitError> {
    if u_count < 2 || v_count < 2 {
        return Err(SurfaceFitError::InvalidGridSize { u_count, v_count });
    }

    let expected = u_count * v_count;
    if points.len() != expected {
        return Err(SurfaceFitError::GridSizeMismatch {
            expected,
            provided: points.len(),
        });
    }

    for (i, p) in points.iter().enumerate() {
        if !p.is_finite() {
            return Err(SurfaceFitError::DegeneratePoints {
                reason: format!("point {i} contains NaN or infinite values"),
            });
        }
    }

    let diagnostics = SurfaceFitDiagnostics {
        input_point_count: points.len(),
        grid_size: (u_count, v_count),
        warnings: Vec::new(),
    };

    Ok((
        GridSurface {
            points: points.to_vec(),
            u_count,
            v_count,
        },
        diagnostics,
    ))
}

// ============================================================================
// Extended surface
// ============================================================================

/// Diagnostics for surface extension.
#[derive(Debug, Clone, Default)]
pub struct ExtendDiagnostics {
    /// Requested world-distance growth along U and V.
    pub u_distance: f64,
    pub v_distance: f64,
    /// Parametric margins the distances converted to.
    pub u_margin: f64,
    pub v_margin: f64,
    /// Warnings generated during extension.
    pub warnings: Vec<String>,
}

/// A surface whose parametric domain has been grown symmetrically on both
/// ends of each axis.
///
/// Evaluation passes parameters straight through to the base surface, which
/// extrapolates outside its nominal domain; only the reported domain changes.
/// Growing by zero distance is exactly the identity.
#[derive(Clone)]
pub struct ExtendedSurface {
    base: Arc<dyn Surface>,
    u_margin: f64,
    v_margin: f64,
}

impl std::fmt::Debug for ExtendedSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedSurface")
            .field("u_margin", &self.u_margin)
            .field("v_margin", &self.v_margin)
            .finish_non_exhaustive()
    }
}

impl ExtendedSurface {
    #[must_use]
    pub fn u_margin(&self) -> f64 {
        self.u_margin
    }

    #[must_use]
    pub fn v_margin(&self) -> f64 {
        self.v_margin
    }

    /// The wrapped base surface.
    #[must_use]
    pub fn base(&self) -> &Arc<dyn Surface> {
        &self.base
    }
}

impl Surface for ExtendedSurface {
    fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.base.point_at(u, v)
    }

    fn domain_u(&self) -> (f64, f64) {
        let (u0, u1) = self.base.domain_u();
        (u0 - self.u_margin, u1 + self.u_margin)
    }

    fn domain_v(&self) -> (f64, f64) {
        let (v0, v1) = self.base.domain_v();
        (v0 - self.v_margin, v1 + self.v_margin)
    }
}

/// Grow a surface by world distances along each parametric axis.
///
/// The distances are converted to parametric margins using the derivative
/// magnitudes at the domain center, so the grown region is approximately
/// `u_distance`/`v_distance` wide in model units on each side. A degenerate
/// derivative leaves the corresponding axis unextended and records a warning.
#[must_use]
pub fn extend_surface(
    base: Arc<dyn Surface>,
    u_distance: f64,
    v_distance: f64,
) -> (ExtendedSurface, ExtendDiagnostics) {
    let (u0, u1) = base.domain_u();
    let (v0, v1) = base.domain_v();
    let mid_u = 0.5 * (u0 + u1);
    let mid_v = 0.5 * (v0 + v1);

    let (du, dv) = base.partial_derivatives_at(mid_u, mid_v);

    let mut diagnostics = ExtendDiagnostics {
        u_distance,
        v_distance,
        ..Default::default()
    };

    let u_margin = margin_for(u_distance, du.length(), "u", &mut diagnostics.warnings);
    let v_margin = margin_for(v_distance, dv.length(), "v", &mut diagnostics.warnings);
    diagnostics.u_margin = u_margin;
    diagnostics.v_margin = v_margin;

    (
        ExtendedSurface {
            base,
            u_margin,
            v_margin,
        },
        diagnostics,
    )
}

fn margin_for(distance: f64, derivative_length: f64, axis: &str, warnings: &mut Vec<String>) -> f64 {
    if distance == 0.0 {
        return 0.0;
    }
    if !distance.is_finite() || distance < 0.0 {
        warnings.push(format!("extend surface: invalid {axis} distance {distance}"));
        return 0.0;
    }
    if derivative_length <= Tolerance::ZERO_LENGTH.eps || !derivative_length.is_finite() {
        warnings.push(format!(
            "extend surface: degenerate {axis} derivative, axis left unextended"
        ));
        return 0.0;
    }
    distance / derivative_length
}
