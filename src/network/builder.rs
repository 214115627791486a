use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::geom::{
    Curve3, ExtendedSurface, NurbsCurve3, Point3, Surface, Tolerance, TriMesh, Vec3,
    closest_curve_parameter, extend_surface, surface_from_grid,
};
use super::grid::{BranchRow, OrientationFrame, PointGrid};

// ============================================================================
// Reference option
// ============================================================================

/// Which reference geometry canonicalizes the input points.
///
/// Exactly one branch executes per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceOption {
    /// Fit an interpolating surface through the input points themselves.
    Points,
    /// Use a caller-supplied surface.
    Surface,
    /// Project the input points onto a caller-supplied mesh first.
    Mesh,
}

impl ReferenceOption {
    /// Resolve a host-side integer selector (0 = points, 1 = surface,
    /// 2 = mesh).
    ///
    /// # Errors
    /// Fails with `InvalidOption` outside `0..=2`.
    pub fn from_index(index: i64) -> Result<Self, BuildError> {
        match index {
            0 => Ok(Self::Points),
            1 => Ok(Self::Surface),
            2 => Ok(Self::Mesh),
            _ => Err(BuildError::InvalidOption {
                selector: "reference option",
                value: index as f64,
            }),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Surface => "surface",
            Self::Mesh => "mesh",
        }
    }
}

// ============================================================================
// Options / diagnostics
// ============================================================================

/// Options for building a [`Network`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkOptions {
    /// Physical strip width; must be strictly positive.
    pub strip_width: f64,

    /// Reference geometry selection.
    pub reference: ReferenceOption,

    /// Row-curve interpolation degree. Clamped per row to the valid range.
    pub curve_degree: usize,

    /// Endpoint nudge, as a fraction of the row-curve domain. Tangents at the
    /// first/last point of a row are evaluated this far inside the domain to
    /// avoid degenerate boundary tangents.
    pub frame_epsilon: f64,
}

impl NetworkOptions {
    #[must_use]
    pub const fn new(strip_width: f64) -> Self {
        Self {
            strip_width,
            reference: ReferenceOption::Points,
            curve_degree: 3,
            frame_epsilon: 1e-3,
        }
    }

    #[must_use]
    pub const fn with_reference(mut self, reference: ReferenceOption) -> Self {
        self.reference = reference;
        self
    }

    #[must_use]
    pub const fn with_curve_degree(mut self, degree: usize) -> Self {
        self.curve_degree = degree;
        self
    }

    #[must_use]
    pub const fn with_frame_epsilon(mut self, epsilon: f64) -> Self {
        self.frame_epsilon = epsilon;
        self
    }
}

/// Diagnostics from a network build.
#[derive(Debug, Clone, Default)]
pub struct NetworkDiagnostics {
    /// Grid dimensions (rows, cols).
    pub grid_size: (usize, usize),
    /// Which reference branch executed.
    pub reference_branch: Option<ReferenceOption>,
    /// Whether the frame surface was fitted rather than supplied.
    pub fitted_surface: bool,
    /// Parametric margins of the extended surface.
    pub extension_margins: (f64, f64),
    /// Largest distance any point moved during re-projection onto the
    /// extended surface.
    pub max_reprojection_shift: f64,
    /// Warnings generated during the build.
    pub warnings: Vec<String>,
}

// ============================================================================
// Network
// ============================================================================

/// The canonical point grid on a surface, with per-point orientation frames
/// and one interpolating curve per row.
///
/// Built once per input change; read-only thereafter.
#[derive(Debug, Clone)]
pub struct Network {
    strip_width: f64,
    grid: PointGrid,
    frames: Vec<OrientationFrame>,
    branch_frames: Vec<Option<OrientationFrame>>,
    row_curves: Vec<NurbsCurve3>,
    surface: Arc<ExtendedSurface>,
}

impl Network {
    #[must_use]
    pub fn strip_width(&self) -> f64 {
        self.strip_width
    }

    #[must_use]
    pub fn grid(&self) -> &PointGrid {
        &self.grid
    }

    /// Orientation frames in row-major grid order.
    #[must_use]
    pub fn frames(&self) -> &[OrientationFrame] {
        &self.frames
    }

    #[must_use]
    pub fn frame_at(&self, row: usize, col: usize) -> OrientationFrame {
        self.frames[row * self.grid.col_count() + col]
    }

    /// Frame of the branch cell at `col`, if one is attached there. The
    /// tangent is carried over from the main point; the perpendicular is the
    /// unit main→branch direction.
    #[must_use]
    pub fn branch_frame_at(&self, col: usize) -> Option<OrientationFrame> {
        self.branch_frames.get(col).copied().flatten()
    }

    /// One interpolating curve per row. Empty for single-column grids, where
    /// no row direction exists to interpolate along.
    #[must_use]
    pub fn row_curves(&self) -> &[NurbsCurve3] {
        &self.row_curves
    }

    /// The strip-width-grown reference surface all frames were derived from.
    #[must_use]
    pub fn extended_surface(&self) -> &Arc<ExtendedSurface> {
        &self.surface
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Build a [`Network`] from point rows and the selected reference geometry.
///
/// Exactly one reference branch executes:
/// - `Points`: fits an interpolating surface through the input grid when no
///   surface is supplied.
/// - `Surface`: requires `surface`.
/// - `Mesh`: requires `mesh`; input points are projected onto it to form the
///   organized grid, and a surface is still required or fitted for frame
///   math.
///
/// The reference surface is then grown by half the strip width along both
/// parametric directions and the organized points are re-projected onto the
/// grown surface, since growth can shift the parameterization.
///
/// `branches` attaches sparse branch points to specific columns of a
/// single-row (primary line) grid; branch points stay where the caller put
/// them, and their frames pair the main point's tangent with the unit
/// main→branch direction.
///
/// # Errors
/// `InvalidOption` for a non-positive strip width, `MissingReference` when
/// the selected branch lacks its geometry, `MalformedGrid` for ragged or
/// unusable input.
pub fn build_network(
    rows: &[Vec<Point3>],
    branches: &[(usize, Point3)],
    surface: Option<Arc<dyn Surface>>,
    mesh: Option<&TriMesh>,
    options: &NetworkOptions,
) -> Result<(Network, NetworkDiagnostics), BuildError> {
    if !options.strip_width.is_finite() || options.strip_width <= 0.0 {
        return Err(BuildError::InvalidOption {
            selector: "strip width",
            value: options.strip_width,
        });
    }

    let mut grid = PointGrid::from_rows(rows)?;
    if !branches.is_empty() {
        let branch_row = BranchRow::from_attachments(grid.col_count(), branches)?;
        grid = grid.with_branch_row(branch_row)?;
    }
    let mut diagnostics = NetworkDiagnostics {
        grid_size: (grid.row_count(), grid.col_count()),
        ..Default::default()
    };

    debug!(
        "network build: {}x{} grid, reference {}",
        grid.row_count(),
        grid.col_count(),
        options.reference.name()
    );

    // Resolve the reference branch. Exactly one executes.
    let (grid, base_surface) = match options.reference {
        ReferenceOption::Points => {
            let base = match surface {
                Some(surface) => surface,
                None => fit_frame_surface(&grid, &mut diagnostics)?,
            };
            (grid, base)
        }
        ReferenceOption::Surface => {
            let base = surface.ok_or(BuildError::MissingReference { kind: "surface" })?;
            (grid, base)
        }
        ReferenceOption::Mesh => {
            let mesh = mesh.ok_or(BuildError::MissingReference { kind: "mesh" })?;
            let projected = grid.map_points(|p| mesh.closest_point(p));
            let base = match surface {
                Some(surface) => surface,
                None => fit_frame_surface(&projected, &mut diagnostics)?,
            };
            (projected, base)
        }
    };
    diagnostics.reference_branch = Some(options.reference);

    // Grow the surface so a strip of the given width never runs off its edge.
    let half_width = 0.5 * options.strip_width;
    let (extended, extend_diag) = extend_surface(base_surface, half_width, half_width);
    diagnostics.extension_margins = (extend_diag.u_margin, extend_diag.v_margin);
    diagnostics.warnings.extend(extend_diag.warnings);

    // Re-project onto the grown surface and remember the parameters; growth
    // can shift the parameterization slightly.
    let mut parameters = Vec::with_capacity(grid.cell_count());
    let mut max_shift = 0.0f64;
    let mut projected_points = Vec::with_capacity(grid.cell_count());
    for &p in grid.points() {
        let projection = extended.closest_point(p);
        max_shift = max_shift.max(projection.point.distance_to(p));
        parameters.push((projection.u, projection.v));
        projected_points.push(projection.point);
    }
    diagnostics.max_reprojection_shift = max_shift;

    let projected_rows: Vec<Vec<Point3>> = projected_points
        .chunks(grid.col_count())
        .map(<[Point3]>::to_vec)
        .collect();
    let mut projected_grid = PointGrid::from_rows(&projected_rows)?;
    // Branch points hang off the surface; they are not re-projected.
    if let Some(branch) = grid.branch_row() {
        projected_grid = projected_grid.with_branch_row(branch.clone())?;
    }
    let grid = projected_grid;

    // One interpolating curve per row; a single-column grid has no row
    // direction to interpolate along.
    let mut row_curves = Vec::new();
    if grid.col_count() >= 2 {
        for row in 0..grid.row_count() {
            let curve = NurbsCurve3::interpolate_through_points(grid.row(row), options.curve_degree)
                .map_err(|reason| BuildError::MalformedGrid { reason })?;
            row_curves.push(curve);
        }
    } else {
        diagnostics
            .warnings
            .push("single-column grid: tangents derived from column direction".to_string());
    }

    let frames = compute_frames(
        &grid,
        &row_curves,
        &parameters,
        &extended,
        options.frame_epsilon,
        &mut diagnostics.warnings,
    );

    let branch_frames = compute_branch_frames(&grid, &frames)?;

    debug!(
        "network build: extension margins ({:.3e}, {:.3e}), max reprojection shift {:.3e}",
        diagnostics.extension_margins.0, diagnostics.extension_margins.1, max_shift
    );

    Ok((
        Network {
            strip_width: options.strip_width,
            grid,
            frames,
            branch_frames,
            row_curves,
            surface: Arc::new(extended),
        },
        diagnostics,
    ))
}

/// Frames for sparse branch cells: tangent carried over from the main point,
/// perpendicular along the unit main→branch direction.
fn compute_branch_frames(
    grid: &PointGrid,
    frames: &[OrientationFrame],
) -> Result<Vec<Option<OrientationFrame>>, BuildError> {
    let Some(branch) = grid.branch_row() else {
        return Ok(Vec::new());
    };

    let mut branch_frames = vec![None; grid.col_count()];
    for col in branch.occupied_columns() {
        let branch_point = branch.cell(col).expect("occupied column");
        let main_point = grid.at(0, col);
        let Some(direction) = branch_point.sub_point(main_point).normalized() else {
            return Err(BuildError::MalformedGrid {
                reason: format!("branch at column {col} coincides with its main point"),
            });
        };
        branch_frames[col] = Some(OrientationFrame {
            tangent: frames[col].tangent,
            perpendicular: direction,
        });
    }

    Ok(branch_frames)
}

fn fit_frame_surface(
    grid: &PointGrid,
    diagnostics: &mut NetworkDiagnostics,
) -> Result<Arc<dyn Surface>, BuildError> {
    let (fitted, fit_diag) = surface_from_grid(grid.points(), grid.col_count(), grid.row_count())?;
    diagnostics.fitted_surface = true;
    diagnostics.warnings.extend(fit_diag.warnings);
    Ok(Arc::new(fitted))
}

// ============================================================================
// Frame computation
// ============================================================================

fn compute_frames(
    grid: &PointGrid,
    row_curves: &[NurbsCurve3],
    parameters: &[(f64, f64)],
    surface: &ExtendedSurface,
    frame_epsilon: f64,
    warnings: &mut Vec<String>,
) -> Vec<OrientationFrame> {
    let up = hemisphere_reference(surface);

    let rows = grid.row_count();
    let row_indices: Vec<usize> = (0..rows).collect();

    let frame_rows: Vec<Vec<OrientationFrame>> = {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            row_indices
                .par_iter()
                .map(|&row| frames_for_row(grid, row_curves, parameters, surface, frame_epsilon, up, row))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            row_indices
                .iter()
                .map(|&row| frames_for_row(grid, row_curves, parameters, surface, frame_epsilon, up, row))
                .collect()
        }
    };

    let frames: Vec<OrientationFrame> = frame_rows.into_iter().flatten().collect();

    if frames
        .iter()
        .any(|f| f.tangent == Vec3::ZERO || f.perpendicular == Vec3::ZERO)
    {
        warnings.push("degenerate frame vectors on at least one grid cell".to_string());
    }

    frames
}

/// Normal direction defining the consistent hemisphere for the whole grid:
/// the surface normal at the domain center, flipped to non-negative world Z
/// when it has any vertical component.
fn hemisphere_reference(surface: &ExtendedSurface) -> Vec3 {
    let (u0, u1) = surface.domain_u();
    let (v0, v1) = surface.domain_v();
    let center = surface
        .normal_at(0.5 * (u0 + u1), 0.5 * (v0 + v1))
        .unwrap_or(Vec3::Z);
    if center.z < 0.0 { center.neg() } else { center }
}

fn frames_for_row(
    grid: &PointGrid,
    row_curves: &[NurbsCurve3],
    parameters: &[(f64, f64)],
    surface: &ExtendedSurface,
    frame_epsilon: f64,
    up: Vec3,
    row: usize,
) -> Vec<OrientationFrame> {
    let cols = grid.col_count();
    let samples = (cols * 8).clamp(32, 256);

    (0..cols)
        .map(|col| {
            let point = grid.at(row, col);

            let tangent = if let Some(curve) = row_curves.get(row) {
                let (a, b) = curve.domain();
                let span = b - a;
                let nudge = frame_epsilon * span;
                let mut t = closest_curve_parameter(curve, point, samples);
                // Nudge endpoint parameters inward to avoid degenerate
                // boundary tangents.
                if t - a < nudge {
                    t = a + nudge;
                } else if b - t < nudge {
                    t = b - nudge;
                }
                curve.tangent_at(t)
            } else {
                column_tangent(grid, row, col)
            }
            .unwrap_or(Vec3::ZERO);

            let (u, v) = parameters[row * cols + col];
            let normal = surface.normal_at(u, v).unwrap_or(up);
            let normal = if normal.dot(up) < 0.0 { normal.neg() } else { normal };

            let perpendicular = normal.cross(tangent).normalized().unwrap_or(Vec3::ZERO);

            OrientationFrame {
                tangent,
                perpendicular,
            }
        })
        .collect()
}

/// Fallback travel direction for single-column grids: the direction to the
/// next row, or from the previous row at the last cell.
fn column_tangent(grid: &PointGrid, row: usize, col: usize) -> Option<Vec3> {
    let rows = grid.row_count();
    if rows < 2 {
        return None;
    }
    let direction = if row + 1 < rows {
        grid.at(row + 1, col).sub_point(grid.at(row, col))
    } else {
        grid.at(row, col).sub_point(grid.at(row - 1, col))
    };
    if direction.length() <= Tolerance::ZERO_LENGTH.eps {
        None
    } else {
        direction.normalized()
    }
}
