//! Ribbon strips between rail curves.
//!
//! Builds the triangulated strip mesh a host uses to solidify a toolpath:
//! two rail polylines (typically the left/right offsets of a skeleton at the
//! strip width) are paired up and skinned with quads, optionally extended
//! past both ends along the end tangents.

use super::core::{Point3, Tolerance};
use super::mesh::TriMesh;

/// Options for ribbon construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonOptions {
    /// Distance to extend the strip past each end along the rail tangents.
    pub end_extension: f64,
}

impl RibbonOptions {
    #[must_use]
    pub const fn new(end_extension: f64) -> Self {
        Self { end_extension }
    }
}

impl Default for RibbonOptions {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Errors that can occur during ribbon construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RibbonError {
    /// A rail has fewer than 2 points.
    #[error("ribbon rail must have at least 2 points, got {count}")]
    InsufficientRailPoints { count: usize },

    /// The rails have different point counts.
    #[error("ribbon rails must have equal point counts, got {left} and {right}")]
    RailCountMismatch { left: usize, right: usize },
}

/// Diagnostics for ribbon construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RibbonDiagnostics {
    /// Number of rungs (paired rail points) in the strip.
    pub rung_count: usize,
    /// Number of triangles emitted.
    pub triangle_count: usize,
    /// Whether the ends were extended.
    pub extended: bool,
}

/// Build a triangulated strip between two rail polylines.
///
/// Rails must run in the same direction and carry the same number of points;
/// rung `i` connects `left[i]` to `right[i]`. With a positive end extension
/// the first and last rungs are pushed outward along the rail tangents so the
/// strip overshoots its nominal span on both ends.
///
/// # Errors
/// Fails when a rail is too short or the rails disagree on point count.
pub fn ribbon_between_rails(
    left: &[Point3],
    right: &[Point3],
    options: RibbonOptions,
) -> Result<(TriMesh, RibbonDiagnostics), RibbonError> {
    if left.len() < 2 {
        return Err(RibbonError::InsufficientRailPoints { count: left.len() });
    }
    if right.len() < 2 {
        return Err(RibbonError::InsufficientRailPoints { count: right.len() });
    }
    if left.len() != right.len() {
        return Err(RibbonError::RailCountMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    let mut left = left.to_vec();
    let mut right = right.to_vec();

    let extension = options.end_extension;
    let extended = extension > 0.0 && extension.is_finite();
    if extended {
        extend_rail_ends(&mut left, extension);
        extend_rail_ends(&mut right, extension);
    }

    let n = left.len();
    let mut positions = Vec::with_capacity(2 * n);
    for i in 0..n {
        positions.push(left[i]);
        positions.push(right[i]);
    }

    // Two triangles per quad between consecutive rungs
    let mut triangles = Vec::with_capacity(2 * (n - 1));
    for i in 0..n - 1 {
        let l0 = (2 * i) as u32;
        let r0 = l0 + 1;
        let l1 = l0 + 2;
        let r1 = l0 + 3;
        triangles.push([l0, r0, r1]);
        triangles.push([l0, r1, l1]);
    }

    let diagnostics = RibbonDiagnostics {
        rung_count: n,
        triangle_count: triangles.len(),
        extended,
    };

    let mesh = TriMesh::new(positions, triangles).expect("rail pairing produces valid indices");
    Ok((mesh, diagnostics))
}

/// Push the first and last rail points outward along the end tangents.
fn extend_rail_ends(rail: &mut [Point3], distance: f64) {
    let n = rail.len();
    if let Some(dir) = rail[0].sub_point(rail[1]).normalized() {
        rail[0] = rail[0].add_vec(dir.mul_scalar(distance));
    }
    if let Some(dir) = rail[n - 1].sub_point(rail[n - 2]).normalized() {
        rail[n - 1] = rail[n - 1].add_vec(dir.mul_scalar(distance));
    }
}

/// Resample a polyline to `count` points at equal normalized-arc-length
/// parameters, so two rails of unequal density can be paired for a ribbon.
#[must_use]
pub fn resample_rail(points: &[Point3], count: usize) -> Vec<Point3> {
    let count = count.max(2);
    if points.len() < 2 {
        return points.to_vec();
    }

    let total: f64 = points
        .windows(2)
        .map(|w| w[1].sub_point(w[0]).length())
        .sum();
    if total <= Tolerance::ZERO_LENGTH.eps {
        return vec![points[0]; count];
    }

    (0..count)
        .map(|i| {
            let target = total * (i as f64 / (count - 1) as f64);
            let mut accumulated = 0.0;
            for window in points.windows(2) {
                let seg = window[1].sub_point(window[0]).length();
                if accumulated + seg >= target && seg > 0.0 {
                    return window[0].lerp(window[1], (target - accumulated) / seg);
                }
                accumulated += seg;
            }
            points[points.len() - 1]
        })
        .collect()
}
