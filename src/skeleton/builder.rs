use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::geom::{NurbsCurve3, Point3, Tolerance};
use crate::network::{Network, OrientationFrame};
use super::canonical::{CanonicalDiagnostics, CanonicalGrid, canonicalize_grid};

// ============================================================================
// Strategy selection
// ============================================================================

/// Which boundary side the Edge strategy extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSide {
    /// All four sides, concatenated bottom → right → top → left.
    All,
    /// Row 0, left to right.
    Bottom,
    /// Last column, bottom to top.
    Right,
    /// Last row, right to left.
    Top,
    /// Column 0, top to bottom.
    Left,
}

impl EdgeSide {
    /// Resolve a host-side integer selector (0 = all, 1..=4 = single side in
    /// bottom/right/top/left order).
    ///
    /// # Errors
    /// Fails with `InvalidOption` outside `0..=4`.
    pub fn from_index(index: i64) -> Result<Self, BuildError> {
        match index {
            0 => Ok(Self::All),
            1 => Ok(Self::Bottom),
            2 => Ok(Self::Right),
            3 => Ok(Self::Top),
            4 => Ok(Self::Left),
            _ => Err(BuildError::InvalidOption {
                selector: "edge side",
                value: index as f64,
            }),
        }
    }
}

/// The closed set of traversal strategies.
///
/// No strategy is ever added without a rebuild, so dispatch is a plain match
/// over this enum rather than trait objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkeletonStrategy {
    /// Row sweep with alternating direction; consecutive output points are
    /// always grid-adjacent.
    Snake,
    /// Concentric layers traversed monotonically inward.
    Spiral,
    /// A primary line with isolated single-point branches.
    Linear,
    /// Boundary extraction.
    Edge(EdgeSide),
}

impl SkeletonStrategy {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Snake => "snake",
            Self::Spiral => "spiral",
            Self::Linear => "linear",
            Self::Edge(_) => "edge",
        }
    }
}

// ============================================================================
// Skeleton
// ============================================================================

/// One ordered traversal across a network: the flattened point path, its
/// interpolated main curve, per-layer branch curves, and the orientation
/// frames reindexed to the path order.
#[derive(Debug, Clone)]
pub struct Skeleton {
    points: Vec<Point3>,
    frames: Vec<OrientationFrame>,
    main_curve: NurbsCurve3,
    branch_curves: Vec<NurbsCurve3>,
    layer_offsets: Vec<usize>,
    strategy: SkeletonStrategy,
}

impl Skeleton {
    /// The ordered point sequence.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Orientation frames, one per sequence point, in sequence order.
    #[must_use]
    pub fn frames(&self) -> &[OrientationFrame] {
        &self.frames
    }

    /// The curve interpolated through the whole sequence.
    #[must_use]
    pub fn main_curve(&self) -> &NurbsCurve3 {
        &self.main_curve
    }

    /// Per-layer curves (one per row for Snake, per ring for Spiral, per
    /// branch for Linear; none for Edge).
    #[must_use]
    pub fn branch_curves(&self) -> &[NurbsCurve3] {
        &self.branch_curves
    }

    /// Start index of each traversal layer within the sequence.
    #[must_use]
    pub fn layer_offsets(&self) -> &[usize] {
        &self.layer_offsets
    }

    /// Points of one traversal layer.
    #[must_use]
    pub fn layer(&self, index: usize) -> &[Point3] {
        let start = self.layer_offsets[index];
        let end = self
            .layer_offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.points.len());
        &self.points[start..end]
    }

    /// Frames of one traversal layer, matching [`Self::layer`].
    #[must_use]
    pub fn layer_frames(&self, index: usize) -> &[OrientationFrame] {
        let start = self.layer_offsets[index];
        let end = self
            .layer_offsets
            .get(index + 1)
            .copied()
            .unwrap_or(self.points.len());
        &self.frames[start..end]
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_offsets.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn strategy(&self) -> SkeletonStrategy {
        self.strategy
    }
}

/// Diagnostics from a skeleton build.
#[derive(Debug, Clone, Default)]
pub struct SkeletonDiagnostics {
    /// Length of the output sequence.
    pub sequence_length: usize,
    /// Number of traversal layers.
    pub layer_count: usize,
    /// Canonicalization record.
    pub canonical: CanonicalDiagnostics,
}

// ============================================================================
// Builder
// ============================================================================

/// Re-sequence a network into one ordered traversal.
///
/// The grid is canonicalized first (see
/// [`canonicalize_grid`](crate::skeleton::canonicalize_grid)), then the
/// strategy orders the cells. The output frames are the network's frames
/// reindexed to the traversal order.
///
/// # Errors
/// `InvalidOption` for an out-of-range selector, `MalformedGrid` when the
/// grid shape does not fit the strategy (e.g. Linear on three or more rows).
pub fn build_skeleton(
    network: &Network,
    strategy: SkeletonStrategy,
) -> Result<(Skeleton, SkeletonDiagnostics), BuildError> {
    let (canonical, canonical_diag) = canonicalize_grid(network);

    debug!(
        "skeleton build: strategy {}, grid {}x{}, rows_reversed {}, cols_reversed {}",
        strategy.name(),
        canonical.grid().row_count(),
        canonical.grid().col_count(),
        canonical_diag.rows_reversed,
        canonical_diag.cols_reversed,
    );

    let built = match strategy {
        SkeletonStrategy::Snake => build_snake(network, &canonical)?,
        SkeletonStrategy::Spiral => build_spiral(network, &canonical)?,
        SkeletonStrategy::Linear => build_linear(network, &canonical)?,
        SkeletonStrategy::Edge(side) => build_edge(network, &canonical, side)?,
    };

    let diagnostics = SkeletonDiagnostics {
        sequence_length: built.points.len(),
        layer_count: built.layer_offsets.len(),
        canonical: canonical_diag,
    };

    let skeleton = Skeleton {
        main_curve: interpolate_curve(&built.points)?,
        points: built.points,
        frames: built.frames,
        branch_curves: built.branch_curves,
        layer_offsets: built.layer_offsets,
        strategy,
    };

    Ok((skeleton, diagnostics))
}

struct BuiltSequence {
    points: Vec<Point3>,
    frames: Vec<OrientationFrame>,
    branch_curves: Vec<NurbsCurve3>,
    layer_offsets: Vec<usize>,
}

/// Fit the interpolated curve for a traversal, collapsing consecutive
/// duplicate points first. Duplicates appear at side joins (Edge with
/// selector 0) and carry no curve information; keeping them would make the
/// chord-length interpolation system singular.
fn interpolate_curve(points: &[Point3]) -> Result<NurbsCurve3, BuildError> {
    let tol = Tolerance::default_geom();
    let mut deduped: Vec<Point3> = Vec::with_capacity(points.len());
    for &p in points {
        if deduped
            .last()
            .map_or(true, |&last| !tol.approx_eq_point3(last, p))
        {
            deduped.push(p);
        }
    }

    if deduped.len() < 2 {
        return Err(BuildError::MalformedGrid {
            reason: format!(
                "traversal produced {} distinct points, need at least 2 for a curve",
                deduped.len()
            ),
        });
    }
    NurbsCurve3::interpolate_through_points(&deduped, 3)
        .map_err(|reason| BuildError::MalformedGrid { reason })
}

fn cell_point(canonical: &CanonicalGrid, row: usize, col: usize) -> Point3 {
    canonical.grid().at(row, col)
}

fn cell_frame(
    network: &Network,
    canonical: &CanonicalGrid,
    row: usize,
    col: usize,
) -> OrientationFrame {
    let (source_row, source_col) = canonical.source_index(row, col);
    network.frame_at(source_row, source_col)
}

// ============================================================================
// Snake
// ============================================================================

/// Visit every row fully, alternating direction each row, so consecutive
/// output points are always grid-adjacent and a continuous tool never jumps
/// across the part.
fn build_snake(network: &Network, canonical: &CanonicalGrid) -> Result<BuiltSequence, BuildError> {
    let rows = canonical.grid().row_count();
    let cols = canonical.grid().col_count();

    let mut points = Vec::with_capacity(rows * cols);
    let mut frames = Vec::with_capacity(rows * cols);
    let mut branch_curves = Vec::with_capacity(rows);
    let mut layer_offsets = Vec::with_capacity(rows);

    for row in 0..rows {
        layer_offsets.push(points.len());

        let columns: Vec<usize> = if row % 2 == 0 {
            (0..cols).collect()
        } else {
            (0..cols).rev().collect()
        };

        let row_points: Vec<Point3> = columns
            .iter()
            .map(|&col| cell_point(canonical, row, col))
            .collect();
        for &col in &columns {
            points.push(cell_point(canonical, row, col));
            frames.push(cell_frame(network, canonical, row, col));
        }

        if row_points.len() >= 2 {
            branch_curves.push(interpolate_curve(&row_points)?);
        }
    }

    Ok(BuiltSequence {
        points,
        frames,
        branch_curves,
        layer_offsets,
    })
}

// ============================================================================
// Spiral
// ============================================================================

/// Order cells by concentric ring, outermost first, each ring circulating
/// bottom → right → top → left, so travel proceeds monotonically inward.
fn build_spiral(network: &Network, canonical: &CanonicalGrid) -> Result<BuiltSequence, BuildError> {
    let rows = canonical.grid().row_count();
    let cols = canonical.grid().col_count();

    let rings = spiral_rings(rows, cols);

    let mut points = Vec::with_capacity(rows * cols);
    let mut frames = Vec::with_capacity(rows * cols);
    let mut branch_curves = Vec::with_capacity(rings.len());
    let mut layer_offsets = Vec::with_capacity(rings.len());

    for ring in rings {
        layer_offsets.push(points.len());
        let ring_points: Vec<Point3> = ring
            .iter()
            .map(|&(row, col)| cell_point(canonical, row, col))
            .collect();
        for &(row, col) in &ring {
            points.push(cell_point(canonical, row, col));
            frames.push(cell_frame(network, canonical, row, col));
        }
        if ring_points.len() >= 2 {
            branch_curves.push(interpolate_curve(&ring_points)?);
        }
    }

    Ok(BuiltSequence {
        points,
        frames,
        branch_curves,
        layer_offsets,
    })
}

/// Concentric ring indices for an R×C grid, outermost ring first. Every cell
/// appears exactly once.
fn spiral_rings(rows: usize, cols: usize) -> Vec<Vec<(usize, usize)>> {
    let mut rings = Vec::new();

    let mut r0 = 0;
    let mut c0 = 0;
    let mut r1 = rows - 1;
    let mut c1 = cols - 1;

    while r0 <= r1 && c0 <= c1 {
        let mut ring = Vec::new();

        for col in c0..=c1 {
            ring.push((r0, col));
        }
        for row in r0 + 1..=r1 {
            ring.push((row, c1));
        }
        if r1 > r0 {
            for col in (c0..c1).rev() {
                ring.push((r1, col));
            }
        }
        if c1 > c0 {
            for row in (r0 + 1..r1).rev() {
                ring.push((row, c0));
            }
        }

        rings.push(ring);

        r0 += 1;
        c0 += 1;
        if r1 == 0 || c1 == 0 {
            break;
        }
        r1 -= 1;
        c1 -= 1;
    }

    rings
}

// ============================================================================
// Linear
// ============================================================================

/// The degenerate two-row case: a primary line with isolated single-point
/// branches. Each branch point is emitted right after its main point, stored
/// offset outward from the main point by half the strip width, and emits a
/// two-point branch curve. The branch cell's frame pairs the main tangent
/// with the main→branch direction; a full second row is treated as a branch
/// at every column.
fn build_linear(network: &Network, canonical: &CanonicalGrid) -> Result<BuiltSequence, BuildError> {
    let rows = canonical.grid().row_count();
    let cols = canonical.grid().col_count();

    if rows > 2 {
        return Err(BuildError::MalformedGrid {
            reason: format!("linear strategy expects at most 2 rows, got {rows}"),
        });
    }

    let half_width = 0.5 * network.strip_width();

    let mut points = Vec::new();
    let mut frames = Vec::new();
    let mut branch_curves = Vec::new();

    for col in 0..cols {
        let main_point = cell_point(canonical, 0, col);
        let main_frame = cell_frame(network, canonical, 0, col);
        points.push(main_point);
        frames.push(main_frame);

        // Branch point for this column, from the dense second row or the
        // sparse branch row.
        let branch_point = if rows == 2 {
            Some(cell_point(canonical, 1, col))
        } else {
            canonical
                .grid()
                .branch_row()
                .and_then(|branch| branch.cell(col))
        };

        if let Some(branch_point) = branch_point {
            let Some(direction) = branch_point.sub_point(main_point).normalized() else {
                return Err(BuildError::MalformedGrid {
                    reason: format!("branch at column {col} coincides with its main point"),
                });
            };
            let offset_branch = branch_point.add_vec(direction.mul_scalar(half_width));

            // The branch cell's pair is the main tangent and the outward
            // branch direction.
            points.push(offset_branch);
            frames.push(OrientationFrame {
                tangent: main_frame.tangent,
                perpendicular: direction,
            });

            branch_curves.push(interpolate_curve(&[main_point, offset_branch])?);
        }
    }

    Ok(BuiltSequence {
        points,
        frames,
        branch_curves,
        layer_offsets: vec![0],
    })
}

// ============================================================================
// Edge
// ============================================================================

/// Extract one boundary traversal, or all four concatenated in the fixed
/// order bottom row (left→right), last column (bottom→top), top row
/// (right→left), first column (top→bottom). Shared corner points are
/// duplicated at each join: every side is emitted whole.
fn build_edge(
    network: &Network,
    canonical: &CanonicalGrid,
    side: EdgeSide,
) -> Result<BuiltSequence, BuildError> {
    let sides: &[EdgeSide] = match side {
        EdgeSide::All => &[
            EdgeSide::Bottom,
            EdgeSide::Right,
            EdgeSide::Top,
            EdgeSide::Left,
        ],
        _ => std::slice::from_ref(&side),
    };

    let mut points = Vec::new();
    let mut frames = Vec::new();

    for &s in sides {
        for (row, col) in side_cells(canonical, s) {
            points.push(cell_point(canonical, row, col));
            frames.push(cell_frame(network, canonical, row, col));
        }
    }

    Ok(BuiltSequence {
        points,
        frames,
        branch_curves: Vec::new(),
        layer_offsets: vec![0],
    })
}

fn side_cells(canonical: &CanonicalGrid, side: EdgeSide) -> Vec<(usize, usize)> {
    let rows = canonical.grid().row_count();
    let cols = canonical.grid().col_count();

    match side {
        EdgeSide::Bottom => (0..cols).map(|col| (0, col)).collect(),
        EdgeSide::Right => (0..rows).map(|row| (row, cols - 1)).collect(),
        EdgeSide::Top => (0..cols).rev().map(|col| (rows - 1, col)).collect(),
        EdgeSide::Left => (0..rows).rev().map(|row| (row, 0)).collect(),
        EdgeSide::All => unreachable!("expanded by caller"),
    }
}
