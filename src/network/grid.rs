use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::geom::{Point3, Vec3};

/// The two unit vectors orienting a tool at one grid point: `tangent` along
/// the travel direction, `perpendicular` across the strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientationFrame {
    pub tangent: Vec3,
    pub perpendicular: Vec3,
}

/// A sparse second row of branch points, keyed by main-row column.
///
/// Absence is explicit: a column either carries a branch point or `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchRow {
    cells: Vec<Option<Point3>>,
}

impl BranchRow {
    /// Build a branch row for a grid with `cols` columns from explicit
    /// `(column, point)` attachments.
    ///
    /// # Errors
    /// Fails when an attachment column is out of range or duplicated.
    pub fn from_attachments(
        cols: usize,
        attachments: &[(usize, Point3)],
    ) -> Result<Self, BuildError> {
        let mut cells = vec![None; cols];
        for &(col, point) in attachments {
            if col >= cols {
                return Err(BuildError::MalformedGrid {
                    reason: format!("branch column {col} out of range for {cols} columns"),
                });
            }
            if cells[col].is_some() {
                return Err(BuildError::MalformedGrid {
                    reason: format!("duplicate branch attachment at column {col}"),
                });
            }
            cells[col] = Some(point);
        }
        Ok(Self { cells })
    }

    #[must_use]
    pub fn cell(&self, col: usize) -> Option<Point3> {
        self.cells.get(col).copied().flatten()
    }

    /// Columns that carry a branch point, in ascending order.
    pub fn occupied_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(col, cell)| cell.map(|_| col))
    }

    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}

/// A dense row-major grid of 3D points.
///
/// Rows are traversal lines; columns are ordered samples along a line. The
/// optional [`BranchRow`] carries the sparse second row some traversal
/// variants attach to specific columns.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGrid {
    rows: usize,
    cols: usize,
    points: Vec<Point3>,
    branch: Option<BranchRow>,
}

impl PointGrid {
    /// Build a rectangular grid from point rows.
    ///
    /// # Errors
    /// Fails when the input is empty, a row is empty, or row lengths differ.
    pub fn from_rows(rows: &[Vec<Point3>]) -> Result<Self, BuildError> {
        if rows.is_empty() {
            return Err(BuildError::MalformedGrid {
                reason: "no point rows supplied".to_string(),
            });
        }

        let cols = rows[0].len();
        if cols == 0 {
            return Err(BuildError::MalformedGrid {
                reason: "first row is empty".to_string(),
            });
        }

        let mut points = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(BuildError::MalformedGrid {
                    reason: format!(
                        "row {index} has {} points, expected {cols}",
                        row.len()
                    ),
                });
            }
            points.extend_from_slice(row);
        }

        for (index, p) in points.iter().enumerate() {
            if !p.is_finite() {
                return Err(BuildError::MalformedGrid {
                    reason: format!("point {index} contains NaN or infinite values"),
                });
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            points,
            branch: None,
        })
    }

    /// Attach a sparse branch row to a single-row grid.
    ///
    /// Branch cells hang off the main row; only the primary-line grid shape
    /// carries them.
    ///
    /// # Errors
    /// Fails when the branch row width disagrees with the grid or the grid
    /// has more than one dense row.
    pub fn with_branch_row(mut self, branch: BranchRow) -> Result<Self, BuildError> {
        if self.rows != 1 {
            return Err(BuildError::MalformedGrid {
                reason: format!("branch row requires a single-row grid, got {} rows", self.rows),
            });
        }
        if branch.len() != self.cols {
            return Err(BuildError::MalformedGrid {
                reason: format!(
                    "branch row has {} cells, expected {}",
                    branch.len(),
                    self.cols
                ),
            });
        }
        self.branch = Some(branch);
        Ok(self)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.cols
    }

    /// Number of dense cells (branch cells not included).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    #[must_use]
    pub fn at(&self, row: usize, col: usize) -> Point3 {
        self.points[row * self.cols + col]
    }

    /// One full row as a contiguous slice.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Point3] {
        &self.points[row * self.cols..(row + 1) * self.cols]
    }

    #[must_use]
    pub fn branch_row(&self) -> Option<&BranchRow> {
        self.branch.as_ref()
    }

    /// All dense points in row-major order.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Apply `f` to every dense point, preserving shape and branch row.
    #[must_use]
    pub fn map_points(&self, f: impl Fn(Point3) -> Point3) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            points: self.points.iter().map(|&p| f(p)).collect(),
            branch: self.branch.clone(),
        }
    }

    /// Grid with the row order reversed. A branch row only exists on
    /// single-row grids, where this is the identity.
    #[must_use]
    pub fn reversed_rows(&self) -> Self {
        let mut points = Vec::with_capacity(self.points.len());
        for row in (0..self.rows).rev() {
            points.extend_from_slice(self.row(row));
        }
        Self {
            rows: self.rows,
            cols: self.cols,
            points,
            branch: self.branch.clone(),
        }
    }

    /// Grid with each row's column order reversed; branch cells follow their
    /// main columns.
    #[must_use]
    pub fn reversed_cols(&self) -> Self {
        let mut points = Vec::with_capacity(self.points.len());
        for row in 0..self.rows {
            points.extend(self.row(row).iter().rev().copied());
        }
        let branch = self.branch.as_ref().map(|branch| BranchRow {
            cells: branch.cells.iter().rev().copied().collect(),
        });
        Self {
            rows: self.rows,
            cols: self.cols,
            points,
            branch,
        }
    }
}
