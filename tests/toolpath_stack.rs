use std::sync::Arc;

use skein_engine::error::BuildError;
use skein_engine::geom::{Curve3, Plane, PlaneSurface, Point3, Surface, Tolerance, Vec3};
use skein_engine::network::{Network, NetworkOptions, ReferenceOption, build_network};
use skein_engine::package::SkeletonPackage;
use skein_engine::skeleton::{EdgeSide, SkeletonStrategy, build_skeleton};
use skein_engine::toolpath::{
    StripPattern, ToolpathPattern, ToolpathStack, ToolpathTarget, gcode_output, robot_output,
};

fn plane_surface() -> Arc<dyn Surface> {
    Arc::new(PlaneSurface::new(
        Point3::ORIGIN,
        Vec3::X.mul_scalar(10.0),
        Vec3::Y.mul_scalar(10.0),
    ))
}

fn flat_network(rows: usize, cols: usize) -> Network {
    let grid: Vec<Vec<Point3>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| Point3::new(c as f64, r as f64, 0.0))
                .collect()
        })
        .collect();
    let options = NetworkOptions::new(0.5).with_reference(ReferenceOption::Surface);
    build_network(&grid, &[], Some(plane_surface()), None, &options)
        .expect("network build")
        .0
}

fn snake_package(rows: usize, cols: usize) -> SkeletonPackage {
    let network = Arc::new(flat_network(rows, cols));
    let (skeleton, _) = build_skeleton(&network, SkeletonStrategy::Snake).unwrap();
    SkeletonPackage::new(network, skeleton, "snake").unwrap()
}

fn uniform_factors(pattern: &StripPattern, factor: f64) -> Vec<Vec<f64>> {
    let grid = pattern.corner_grid();
    (0..grid.layer_count())
        .map(|layer| vec![factor; grid.layer(layer).len()])
        .collect()
}

// ============================================================================
// Pattern
// ============================================================================

#[test]
fn strip_pattern_offsets_corners_by_half_the_path_width() {
    let package = snake_package(3, 4);
    let seam = Point3::ORIGIN;
    let (pattern, diag) = StripPattern::build(&package, seam, 0.4).unwrap();

    assert_eq!(diag.layer_count, 3);
    assert_eq!(diag.segment_count, 3 * 3);
    assert_eq!(pattern.corner_grid().layer_count(), 3);
    assert_eq!(pattern.corner_grid().segment_count(), 9);
    assert_eq!(pattern.boundaries().len(), 3);
    assert_eq!(pattern.path_width(), 0.4);
    assert_eq!(pattern.seam(), seam);

    // First segment of row 0: corners straddle the path across Y
    let [left_start, right_start, right_end, left_end] = pattern.corner_grid().layer(0)[0];
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(left_start, Point3::new(0.0, 0.2, 0.0)));
    assert!(tol.approx_eq_point3(right_start, Point3::new(0.0, -0.2, 0.0)));
    assert!(tol.approx_eq_point3(right_end, Point3::new(1.0, -0.2, 0.0)));
    assert!(tol.approx_eq_point3(left_end, Point3::new(1.0, 0.2, 0.0)));
}

#[test]
fn strip_pattern_boundaries_are_closed_loops() {
    let package = snake_package(2, 3);
    let (pattern, _) = StripPattern::build(&package, Point3::ORIGIN, 0.4).unwrap();

    for boundary in pattern.boundaries() {
        assert!(boundary.is_closed_with_tol(Tolerance::default_geom()));
        // Out along one rail, back along the other, plus the closing point
        assert_eq!(boundary.len(), 7);
    }
}

#[test]
fn strip_pattern_rejects_non_positive_width() {
    let package = snake_package(2, 3);
    let err = StripPattern::build(&package, Point3::ORIGIN, -1.0).unwrap_err();
    assert!(matches!(
        err,
        BuildError::InvalidOption {
            selector: "path width",
            ..
        }
    ));
}

#[test]
fn closed_edge_loop_is_anchored_at_the_seam() {
    let network = Arc::new(flat_network(3, 4));
    let (skeleton, _) = build_skeleton(&network, SkeletonStrategy::Edge(EdgeSide::All)).unwrap();
    let package = SkeletonPackage::new(network, skeleton, "edge loop").unwrap();

    // Anchor near the top-right corner of the boundary loop
    let seam = Point3::new(3.2, 2.1, 0.0);
    let (pattern, diag) = StripPattern::build(&package, seam, 0.3).unwrap();

    assert_eq!(diag.seam_anchored_layers, 1);
    let [left_start, right_start, ..] = pattern.corner_grid().layer(0)[0];
    let start = left_start.midpoint(right_start);
    let tol = Tolerance::LOOSE;
    assert!(
        tol.approx_eq_point3(start, Point3::new(3.0, 2.0, 0.0)),
        "loop did not start at the seam-nearest vertex, started at {start:?}"
    );
}

// ============================================================================
// Stack
// ============================================================================

#[test]
fn stack_planes_follow_the_travel_direction() {
    let package = snake_package(2, 3);
    let (pattern, _) = StripPattern::build(&package, Point3::ORIGIN, 0.4).unwrap();
    let factors = uniform_factors(&pattern, 0.5);

    let (stack, diag) = ToolpathStack::from_pattern(&pattern, &factors).unwrap();
    assert_eq!(diag.layer_count, 2);
    assert_eq!(diag.target_count, 4);
    assert_eq!(diag.degenerate_planes, 0);

    let tol = Tolerance::LOOSE;
    // Row 0 travels +X, row 1 (snake return) travels -X
    let forward = stack.layers()[0][0].plane;
    assert!(tol.approx_eq_vec3(forward.x_axis, Vec3::X));
    assert!(tol.approx_eq_vec3(forward.z_axis, Vec3::Z));
    assert!(tol.approx_eq_point3(forward.origin, Point3::new(0.5, 0.0, 0.0)));

    let backward = stack.layers()[1][0].plane;
    assert!(tol.approx_eq_vec3(backward.x_axis, Vec3::X.neg()));
}

#[test]
fn stack_validates_factor_shape_and_range() {
    let package = snake_package(2, 3);
    let (pattern, _) = StripPattern::build(&package, Point3::ORIGIN, 0.4).unwrap();

    let short = vec![vec![0.5; 1], vec![0.5; 2]];
    assert!(matches!(
        ToolpathStack::from_pattern(&pattern, &short),
        Err(BuildError::MalformedGrid { .. })
    ));

    let out_of_range = vec![vec![0.5, 1.5], vec![0.5, 0.5]];
    assert!(matches!(
        ToolpathStack::from_pattern(&pattern, &out_of_range),
        Err(BuildError::InvalidOption {
            selector: "speed factor",
            ..
        })
    ));
}

#[test]
fn empty_stack_is_rejected() {
    assert!(matches!(
        ToolpathStack::new(vec![Vec::new()]),
        Err(BuildError::MalformedGrid { .. })
    ));
}

#[test]
fn flatten_preserves_layer_major_order() {
    let target = |x: f64, factor: f64| ToolpathTarget {
        plane: Plane {
            origin: Point3::new(x, 0.0, 0.0),
            ..Plane::WORLD_XY
        },
        factor,
    };
    let stack = ToolpathStack::new(vec![
        vec![target(0.0, 0.1), target(1.0, 0.2)],
        vec![target(2.0, 0.3)],
    ])
    .unwrap();

    let (planes, factors) = stack.flatten();
    assert_eq!(factors, vec![0.1, 0.2, 0.3]);
    assert_eq!(
        planes.iter().map(|p| p.origin.x).collect::<Vec<_>>(),
        vec![0.0, 1.0, 2.0]
    );
}

// ============================================================================
// Output adapters
// ============================================================================

fn stack_with_factors(factors: &[f64]) -> ToolpathStack {
    let targets = factors
        .iter()
        .map(|&factor| ToolpathTarget {
            plane: Plane::WORLD_XY,
            factor,
        })
        .collect();
    ToolpathStack::new(vec![targets]).unwrap()
}

#[test]
fn gcode_output_scales_factors_by_max_speed() {
    let stack = stack_with_factors(&[0.2, 0.8]);
    let flat = gcode_output(&stack, 100.0).unwrap();
    assert_eq!(flat.speeds, vec![20.0, 80.0]);
    assert_eq!(flat.planes.len(), 2);
}

#[test]
fn gcode_output_rejects_bad_max_speed() {
    let stack = stack_with_factors(&[0.2, 0.8]);
    assert!(matches!(
        gcode_output(&stack, 0.0),
        Err(BuildError::InvalidOption { .. })
    ));
}

#[test]
fn robot_output_remaps_the_observed_range() {
    let stack = stack_with_factors(&[0.0, 0.5, 1.0]);
    let flat = robot_output(Some(&stack), 10.0, 20.0, 0).unwrap();
    assert_eq!(flat.speeds, vec![10.0, 15.0, 20.0]);
}

#[test]
fn robot_output_rounds_to_requested_decimals() {
    let stack = stack_with_factors(&[0.0, 1.0 / 3.0, 1.0]);
    let flat = robot_output(Some(&stack), 0.0, 1.0, 2).unwrap();
    assert_eq!(flat.speeds, vec![0.0, 0.33, 1.0]);
}

#[test]
fn robot_output_requires_the_stack() {
    assert!(matches!(
        robot_output(None, 10.0, 20.0, 0),
        Err(BuildError::MissingUpstream {
            kind: "toolpath stack"
        })
    ));
}

#[test]
fn degenerate_factor_range_raises_instead_of_dividing_by_zero() {
    let stack = stack_with_factors(&[0.4, 0.4, 0.4]);
    assert!(matches!(
        robot_output(Some(&stack), 10.0, 20.0, 0),
        Err(BuildError::DegenerateRange)
    ));
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn points_to_robot_speeds_end_to_end() {
    let package = snake_package(3, 4);
    let (pattern, _) = StripPattern::build(&package, Point3::ORIGIN, 0.4).unwrap();

    let grid = pattern.corner_grid();
    let factors: Vec<Vec<f64>> = (0..grid.layer_count())
        .map(|layer| {
            (0..grid.layer(layer).len())
                .map(|segment| segment as f64 / (grid.layer(layer).len() - 1) as f64)
                .collect()
        })
        .collect();

    let (stack, _) = ToolpathStack::from_pattern(&pattern, &factors).unwrap();
    let flat = robot_output(Some(&stack), 5.0, 25.0, 1).unwrap();

    assert_eq!(flat.planes.len(), 9);
    assert_eq!(flat.speeds.len(), 9);
    assert!(flat.speeds.iter().all(|s| (5.0..=25.0).contains(s)));
    assert!(flat.speeds.contains(&5.0));
    assert!(flat.speeds.contains(&25.0));

    // The skeleton's main curve spans the whole traversal
    let main = package.skeleton().main_curve();
    let (a, b) = main.domain();
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(main.point_at(a), package.skeleton().points()[0]));
    assert!(tol.approx_eq_point3(
        main.point_at(b),
        *package.skeleton().points().last().unwrap()
    ));
}
