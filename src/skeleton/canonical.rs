use serde::{Deserialize, Serialize};

use crate::geom::{Surface, Vec3};
use crate::network::{Network, PointGrid};

/// Which surface parametric axis the grid's rows run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowAxis {
    U,
    V,
}

/// Diagnostics for grid canonicalization.
#[derive(Debug, Clone, Default)]
pub struct CanonicalDiagnostics {
    /// Angular deviation of the along-row direction from the surface U axis,
    /// folded to `[0, π/2]`. `None` for degenerate grids.
    pub u_deviation: Option<f64>,
    /// Angular deviation from the surface V axis, folded to `[0, π/2]`.
    pub v_deviation: Option<f64>,
    /// Whether the row order was reversed to anchor (0,0) at the UV minimum.
    pub rows_reversed: bool,
    /// Whether the column order was reversed.
    pub cols_reversed: bool,
}

/// A grid reoriented so index (0,0) maps to the surface's UV-minimum corner.
///
/// Keeps the index mapping back to the source grid so frames computed on the
/// source orientation can be looked up per canonical cell.
#[derive(Debug, Clone)]
pub struct CanonicalGrid {
    grid: PointGrid,
    row_axis: RowAxis,
    rows_reversed: bool,
    cols_reversed: bool,
}

impl CanonicalGrid {
    #[must_use]
    pub fn grid(&self) -> &PointGrid {
        &self.grid
    }

    #[must_use]
    pub fn row_axis(&self) -> RowAxis {
        self.row_axis
    }

    /// Map a canonical cell index back to the source grid index.
    #[must_use]
    pub fn source_index(&self, row: usize, col: usize) -> (usize, usize) {
        let source_row = if self.rows_reversed {
            self.grid.row_count() - 1 - row
        } else {
            row
        };
        let source_col = if self.cols_reversed {
            self.grid.col_count() - 1 - col
        } else {
            col
        };
        (source_row, source_col)
    }
}

/// Reorient a network's grid so every traversal strategy sees the same
/// orientation: rows running up-parameter with cell (0,0) at the surface's
/// UV-minimum corner.
///
/// The along-row direction (cell (0,0) toward (0,1)) is compared against the
/// surface tangent directions at (0,0); the axis with the smaller angular
/// deviation is the canonical row axis, with U winning an exact tie. The grid
/// is then reversed along the row axis, the column axis, or both, so the
/// origin cell sits at the parametric minimum. Degenerate single-row or
/// single-column grids keep the degenerate axis as already canonical.
///
/// Canonicalization is idempotent: a grid already anchored at the UV minimum
/// is returned unchanged.
#[must_use]
pub fn canonicalize_grid(network: &Network) -> (CanonicalGrid, CanonicalDiagnostics) {
    let grid = network.grid();
    let surface = network.extended_surface();
    let rows = grid.row_count();
    let cols = grid.col_count();

    let mut diagnostics = CanonicalDiagnostics::default();

    // Elect the row axis from the along-row direction at the origin cell.
    let row_axis = if cols >= 2 {
        let along_row = grid.at(0, 1).sub_point(grid.at(0, 0));
        let origin = surface.closest_point(grid.at(0, 0));
        let (du, dv) = surface.partial_derivatives_at(origin.u, origin.v);

        let u_deviation = axis_deviation(along_row, du);
        let v_deviation = axis_deviation(along_row, dv);
        diagnostics.u_deviation = u_deviation;
        diagnostics.v_deviation = v_deviation;

        match (u_deviation, v_deviation) {
            // Ties go to the first parametric direction.
            (Some(u_dev), Some(v_dev)) if v_dev < u_dev => RowAxis::V,
            _ => RowAxis::U,
        }
    } else {
        // No along-row direction exists; the degenerate axis is already
        // canonical.
        RowAxis::U
    };

    // Anchor (0,0) at the parametric minimum by reversing whichever grid
    // axes run down-parameter.
    let project = |p| {
        let projection = surface.closest_point(p);
        (projection.u, projection.v)
    };
    let origin = project(grid.at(0, 0));
    let row_end = project(grid.at(0, cols - 1));
    let col_end = project(grid.at(rows - 1, 0));

    let (along_cols_param, down_rows_param) = match row_axis {
        RowAxis::U => ((origin.0, row_end.0), (origin.1, col_end.1)),
        RowAxis::V => ((origin.1, row_end.1), (origin.0, col_end.0)),
    };

    let cols_reversed = cols >= 2 && along_cols_param.0 > along_cols_param.1;
    let rows_reversed = rows >= 2 && down_rows_param.0 > down_rows_param.1;
    diagnostics.cols_reversed = cols_reversed;
    diagnostics.rows_reversed = rows_reversed;

    let mut canonical = grid.clone();
    if cols_reversed {
        canonical = canonical.reversed_cols();
    }
    if rows_reversed {
        canonical = canonical.reversed_rows();
    }

    (
        CanonicalGrid {
            grid: canonical,
            row_axis,
            rows_reversed,
            cols_reversed,
        },
        diagnostics,
    )
}

/// Angular deviation of `direction` from the line of `axis`, folded to
/// `[0, π/2]` so opposing directions count as aligned.
fn axis_deviation(direction: Vec3, axis: Vec3) -> Option<f64> {
    let angle = direction.angle_to(axis)?;
    Some(angle.min(std::f64::consts::PI - angle))
}
