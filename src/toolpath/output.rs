//! Output adapters: flatten a toolpath stack and remap its normalized speed
//! factors into device units.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::geom::Plane;
use super::stack::ToolpathStack;

/// A flattened toolpath: planes and speeds in matching layer-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatToolpath {
    pub planes: Vec<Plane>,
    pub speeds: Vec<f64>,
}

/// Flatten a stack for G-code output: every normalized factor is multiplied
/// by the caller's maximum speed.
///
/// # Errors
/// `InvalidOption` for a non-finite or non-positive maximum speed.
pub fn gcode_output(stack: &ToolpathStack, max_speed: f64) -> Result<FlatToolpath, BuildError> {
    if !max_speed.is_finite() || max_speed <= 0.0 {
        return Err(BuildError::InvalidOption {
            selector: "maximum speed",
            value: max_speed,
        });
    }

    let (planes, factors) = stack.flatten();
    let speeds = factors.iter().map(|f| f * max_speed).collect();

    Ok(FlatToolpath { planes, speeds })
}

/// Flatten a stack for robot output: the observed factor range is linearly
/// remapped onto `[min_speed, max_speed]` and rounded to `decimals` places.
///
/// # Errors
/// `MissingUpstream` when the stack is absent, `InvalidOption` for an
/// unusable speed interval, `DegenerateRange` when every factor is equal
/// (the remap would divide by zero).
pub fn robot_output(
    stack: Option<&ToolpathStack>,
    min_speed: f64,
    max_speed: f64,
    decimals: u32,
) -> Result<FlatToolpath, BuildError> {
    let stack = stack.ok_or(BuildError::MissingUpstream {
        kind: "toolpath stack",
    })?;

    if !min_speed.is_finite() || !max_speed.is_finite() || max_speed < min_speed {
        return Err(BuildError::InvalidOption {
            selector: "speed interval",
            value: max_speed - min_speed,
        });
    }

    let (planes, factors) = stack.flatten();

    let min_factor = factors.iter().copied().fold(f64::INFINITY, f64::min);
    let max_factor = factors.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_factor == min_factor {
        return Err(BuildError::DegenerateRange);
    }

    let scale = (max_speed - min_speed) / (max_factor - min_factor);
    let rounding = 10f64.powi(decimals as i32);
    let speeds = factors
        .iter()
        .map(|f| {
            let speed = min_speed + (f - min_factor) * scale;
            (speed * rounding).round() / rounding
        })
        .collect();

    Ok(FlatToolpath { planes, speeds })
}
