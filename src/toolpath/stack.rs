use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::geom::{Plane, Point3, Vec3};
use super::pattern::ToolpathPattern;

/// One toolpath target: an oriented plane with its normalized speed factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolpathTarget {
    pub plane: Plane,
    /// Normalized speed in `[0, 1]`: 0 slowest, 1 fastest, 0.5 median.
    pub factor: f64,
}

/// Diagnostics from stack construction.
#[derive(Debug, Clone, Default)]
pub struct StackDiagnostics {
    /// Number of layers.
    pub layer_count: usize,
    /// Total target count across layers.
    pub target_count: usize,
    /// Segments whose plane fell back to a world-aligned orientation.
    pub degenerate_planes: usize,
    /// Warnings generated during the build.
    pub warnings: Vec<String>,
}

/// The nested per-layer, per-segment collection of oriented planes and
/// normalized speed factors consumed by the output adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolpathStack {
    layers: Vec<Vec<ToolpathTarget>>,
}

impl ToolpathStack {
    /// Build a stack from explicit nested targets.
    ///
    /// # Errors
    /// `MalformedGrid` for an empty stack, `InvalidOption` for a factor
    /// outside `[0, 1]`.
    pub fn new(layers: Vec<Vec<ToolpathTarget>>) -> Result<Self, BuildError> {
        if layers.iter().all(Vec::is_empty) {
            return Err(BuildError::MalformedGrid {
                reason: "toolpath stack has no segments".to_string(),
            });
        }
        for target in layers.iter().flatten() {
            validate_factor(target.factor)?;
        }
        Ok(Self { layers })
    }

    /// Build a stack from a pattern's corner grid and per-segment speed
    /// factors supplied by upstream analyses.
    ///
    /// `factors` must match the corner grid layer-for-layer and
    /// segment-for-segment. Each segment's plane sits at the corner centroid
    /// with X along travel, Y across the strip, Z away from the surface.
    ///
    /// # Errors
    /// `MalformedGrid` when the factor shape disagrees with the corner grid,
    /// `InvalidOption` for a factor outside `[0, 1]`.
    pub fn from_pattern(
        pattern: &dyn ToolpathPattern,
        factors: &[Vec<f64>],
    ) -> Result<(Self, StackDiagnostics), BuildError> {
        let grid = pattern.corner_grid();

        if factors.len() != grid.layer_count() {
            return Err(BuildError::MalformedGrid {
                reason: format!(
                    "factor layers {} do not match corner grid layers {}",
                    factors.len(),
                    grid.layer_count()
                ),
            });
        }

        let mut diagnostics = StackDiagnostics::default();
        let mut layers = Vec::with_capacity(grid.layer_count());

        for (layer_index, (segments, layer_factors)) in
            grid.iter_layers().zip(factors).enumerate()
        {
            if layer_factors.len() != segments.len() {
                return Err(BuildError::MalformedGrid {
                    reason: format!(
                        "layer {layer_index}: {} factors for {} segments",
                        layer_factors.len(),
                        segments.len()
                    ),
                });
            }

            let mut targets = Vec::with_capacity(segments.len());
            for (corners, &factor) in segments.iter().zip(layer_factors) {
                validate_factor(factor)?;
                let plane = segment_plane(corners).unwrap_or_else(|| {
                    diagnostics.degenerate_planes += 1;
                    Plane {
                        origin: centroid(corners),
                        ..Plane::WORLD_XY
                    }
                });
                targets.push(ToolpathTarget { plane, factor });
            }
            diagnostics.target_count += targets.len();
            layers.push(targets);
        }

        if diagnostics.degenerate_planes > 0 {
            diagnostics.warnings.push(format!(
                "{} segment(s) with degenerate orientation fell back to world axes",
                diagnostics.degenerate_planes
            ));
        }

        let stack = Self::new(layers)?;
        diagnostics.layer_count = stack.layers.len();
        Ok((stack, diagnostics))
    }

    #[must_use]
    pub fn layers(&self) -> &[Vec<ToolpathTarget>] {
        &self.layers
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Flatten the nested stack to matching plane and factor lists in
    /// layer-major order. Both output adapters and custom host
    /// post-processors consume this.
    #[must_use]
    pub fn flatten(&self) -> (Vec<Plane>, Vec<f64>) {
        let mut planes = Vec::new();
        let mut factors = Vec::new();
        for target in self.layers.iter().flatten() {
            planes.push(target.plane);
            factors.push(target.factor);
        }
        (planes, factors)
    }
}

fn validate_factor(factor: f64) -> Result<(), BuildError> {
    if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
        return Err(BuildError::InvalidOption {
            selector: "speed factor",
            value: factor,
        });
    }
    Ok(())
}

/// Oriented plane for one segment's corner quad
/// `[left_start, right_start, right_end, left_end]`.
fn segment_plane(corners: &[Point3; 4]) -> Option<Plane> {
    let [left_start, right_start, right_end, left_end] = *corners;

    let start_mid = left_start.midpoint(right_start);
    let end_mid = left_end.midpoint(right_end);

    let travel = end_mid.sub_point(start_mid);
    let across = left_start.sub_point(right_start);

    Plane::from_origin_axes(centroid(corners), travel, across)
}

fn centroid(corners: &[Point3; 4]) -> Point3 {
    let sum = corners
        .iter()
        .fold(Vec3::ZERO, |acc, p| acc.add(p.to_vec3()));
    Point3::from(sum.mul_scalar(0.25).to_array())
}
