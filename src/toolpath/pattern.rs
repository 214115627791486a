use log::debug;

use crate::error::BuildError;
use crate::geom::{Point3, Polyline3, Tolerance, rotate_seam_to_anchor};
use crate::network::OrientationFrame;
use crate::package::SkeletonPackage;

// ============================================================================
// Corner grid
// ============================================================================

/// The three-axis corner-point array a pattern produces: indexed by layer,
/// then segment along the layer, then the four segment corners
/// `[left_start, right_start, right_end, left_end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CornerGrid {
    layers: Vec<Vec<[Point3; 4]>>,
}

impl CornerGrid {
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Segments of one layer.
    #[must_use]
    pub fn layer(&self, index: usize) -> &[[Point3; 4]] {
        &self.layers[index]
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn iter_layers(&self) -> impl Iterator<Item = &[[Point3; 4]]> {
        self.layers.iter().map(Vec::as_slice)
    }
}

// ============================================================================
// Pattern contract
// ============================================================================

/// A built toolpath pattern: the seam anchor, path width, per-layer corner
/// grid, and derived boundary loops.
///
/// One concrete strategy per implementation, built once from a package.
pub trait ToolpathPattern {
    /// The anchor where each closed layer's path starts and ends.
    fn seam(&self) -> Point3;

    /// The physical path width the corners were offset by.
    fn path_width(&self) -> f64;

    /// Corner points, layer × segment × corner.
    fn corner_grid(&self) -> &CornerGrid;

    /// One closed boundary loop per layer around the offset strip.
    fn boundaries(&self) -> &[Polyline3];
}

/// Diagnostics from pattern construction.
#[derive(Debug, Clone, Default)]
pub struct PatternDiagnostics {
    /// Number of layers.
    pub layer_count: usize,
    /// Total segment count across layers.
    pub segment_count: usize,
    /// How many layers were closed and re-anchored at the seam.
    pub seam_anchored_layers: usize,
    /// Warnings generated during the build.
    pub warnings: Vec<String>,
}

// ============================================================================
// Strip pattern
// ============================================================================

/// The strip pattern: each skeleton layer becomes one toolpath layer, each
/// consecutive point pair one segment, with the four segment corners offset
/// half the path width along the per-point perpendiculars.
#[derive(Debug, Clone)]
pub struct StripPattern {
    seam: Point3,
    path_width: f64,
    corners: CornerGrid,
    boundaries: Vec<Polyline3>,
}

impl StripPattern {
    /// Build the strip pattern from a package.
    ///
    /// Closed layers (first point coincides with last) are rotated so the
    /// sequence starts at the vertex nearest the seam point, keeping seams
    /// from stacking between layers.
    ///
    /// # Errors
    /// `InvalidOption` for a non-positive path width, `MissingUpstream` when
    /// a layer is too short to form a segment.
    pub fn build(
        package: &SkeletonPackage,
        seam: Point3,
        path_width: f64,
    ) -> Result<(Self, PatternDiagnostics), BuildError> {
        if !path_width.is_finite() || path_width <= 0.0 {
            return Err(BuildError::InvalidOption {
                selector: "path width",
                value: path_width,
            });
        }

        let skeleton = package.skeleton();
        let tol = Tolerance::default_geom();
        let half_width = 0.5 * path_width;

        let mut diagnostics = PatternDiagnostics::default();
        let mut layers = Vec::with_capacity(skeleton.layer_count());
        let mut boundaries = Vec::with_capacity(skeleton.layer_count());

        for layer_index in 0..skeleton.layer_count() {
            let points = skeleton.layer(layer_index);
            let frames = skeleton.layer_frames(layer_index);

            if points.len() < 2 {
                return Err(BuildError::MissingUpstream {
                    kind: "layer with at least two points",
                });
            }

            // Re-anchor closed layers at the seam, rotating frames in step.
            let (points, frames) = if Polyline3::new(points.to_vec()).is_closed_with_tol(tol) {
                let (rotated, seam_diag) = rotate_seam_to_anchor(points, seam, tol);
                diagnostics.seam_anchored_layers += 1;
                let rotated_frames = rotate_ring(frames, seam_diag.seam_index);
                (rotated, rotated_frames)
            } else {
                (points.to_vec(), frames.to_vec())
            };

            let left: Vec<Point3> = points
                .iter()
                .zip(&frames)
                .map(|(p, f)| p.add_vec(f.perpendicular.mul_scalar(half_width)))
                .collect();
            let right: Vec<Point3> = points
                .iter()
                .zip(&frames)
                .map(|(p, f)| p.add_vec(f.perpendicular.mul_scalar(-half_width)))
                .collect();

            let segments: Vec<[Point3; 4]> = (0..points.len() - 1)
                .map(|i| [left[i], right[i], right[i + 1], left[i + 1]])
                .collect();
            diagnostics.segment_count += segments.len();
            layers.push(segments);

            boundaries.push(boundary_loop(&left, &right));
        }

        diagnostics.layer_count = layers.len();
        debug!(
            "strip pattern: {} layers, {} segments, {} seam-anchored",
            diagnostics.layer_count, diagnostics.segment_count, diagnostics.seam_anchored_layers
        );

        Ok((
            Self {
                seam,
                path_width,
                corners: CornerGrid { layers },
                boundaries,
            },
            diagnostics,
        ))
    }
}

impl ToolpathPattern for StripPattern {
    fn seam(&self) -> Point3 {
        self.seam
    }

    fn path_width(&self) -> f64 {
        self.path_width
    }

    fn corner_grid(&self) -> &CornerGrid {
        &self.corners
    }

    fn boundaries(&self) -> &[Polyline3] {
        &self.boundaries
    }
}

/// Rotate a frame ring (stored with the duplicated closing entry) to start at
/// `seam_index`, mirroring the point rotation.
fn rotate_ring(frames: &[OrientationFrame], seam_index: usize) -> Vec<OrientationFrame> {
    if frames.len() < 3 {
        return frames.to_vec();
    }
    let ring = &frames[..frames.len() - 1];
    let mut rotated = Vec::with_capacity(ring.len() + 1);
    rotated.extend_from_slice(&ring[seam_index..]);
    rotated.extend_from_slice(&ring[..seam_index]);
    rotated.push(ring[seam_index]);
    rotated
}

/// Closed outline of the offset strip: out along the left rail, back along
/// the right rail, explicitly closed.
fn boundary_loop(left: &[Point3], right: &[Point3]) -> Polyline3 {
    let mut outline = Vec::with_capacity(left.len() + right.len() + 1);
    outline.extend_from_slice(left);
    outline.extend(right.iter().rev().copied());
    outline.push(left[0]);
    Polyline3::new(outline)
}
