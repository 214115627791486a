use std::sync::Arc;

use crate::geom::{
    Plane, PlaneSurface, Point3, Surface, SurfaceFitError, Tolerance, Vec3, extend_surface,
    surface_from_grid,
};

fn unit_plane() -> PlaneSurface {
    PlaneSurface::new(Point3::ORIGIN, Vec3::X, Vec3::Y)
}

#[test]
fn plane_surface_evaluates_affine_combination() {
    let plane = unit_plane();
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(plane.point_at(0.25, 0.75), Point3::new(0.25, 0.75, 0.0)));
    // Extrapolation outside the unit domain is linear
    assert!(tol.approx_eq_point3(plane.point_at(-0.5, 2.0), Point3::new(-0.5, 2.0, 0.0)));
}

#[test]
fn plane_surface_normal_points_up() {
    let plane = unit_plane();
    let normal = plane.normal_at(0.5, 0.5).unwrap();
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_vec3(normal, Vec3::Z));
}

#[test]
fn grid_surface_interpolates_corner_and_midpoints() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 2.0),
    ];
    let (surface, diag) = surface_from_grid(&points, 2, 2).unwrap();
    assert_eq!(diag.grid_size, (2, 2));
    assert_eq!(diag.input_point_count, 4);

    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(surface.point_at(0.0, 0.0), points[0]));
    assert!(tol.approx_eq_point3(surface.point_at(1.0, 1.0), points[3]));
    // Bilinear center of the tilted quad
    assert!(tol.approx_eq_point3(surface.point_at(0.5, 0.5), Point3::new(0.5, 0.5, 0.5)));
}

#[test]
fn grid_surface_passes_through_every_grid_point() {
    let points: Vec<Point3> = (0..3)
        .flat_map(|row| {
            (0..4).map(move |col| {
                Point3::new(f64::from(col), f64::from(row), f64::from(col * row) * 0.1)
            })
        })
        .collect();
    let (surface, _) = surface_from_grid(&points, 4, 3).unwrap();

    let tol = Tolerance::new(1e-12);
    for row in 0..3 {
        for col in 0..4 {
            let u = f64::from(col) / 3.0;
            let v = f64::from(row) / 2.0;
            assert!(
                tol.approx_eq_point3(surface.point_at(u, v), points[row as usize * 4 + col as usize]),
                "grid point ({row},{col}) not interpolated"
            );
        }
    }
}

#[test]
fn surface_from_grid_validates_input() {
    let two = vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)];
    assert!(matches!(
        surface_from_grid(&two, 1, 2),
        Err(SurfaceFitError::InvalidGridSize { .. })
    ));
    assert!(matches!(
        surface_from_grid(&two, 2, 2),
        Err(SurfaceFitError::GridSizeMismatch { .. })
    ));

    let bad = vec![
        Point3::ORIGIN,
        Point3::new(f64::NAN, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    assert!(matches!(
        surface_from_grid(&bad, 2, 2),
        Err(SurfaceFitError::DegeneratePoints { .. })
    ));
}

#[test]
fn extending_by_zero_is_identity() {
    let plane = unit_plane();
    let (extended, diag) = extend_surface(Arc::new(plane), 0.0, 0.0);

    assert_eq!(diag.u_margin, 0.0);
    assert_eq!(diag.v_margin, 0.0);
    assert_eq!(extended.domain_u(), plane.domain_u());
    assert_eq!(extended.domain_v(), plane.domain_v());

    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(extended.point_at(0.3, 0.6), plane.point_at(0.3, 0.6)));
}

#[test]
fn extending_grows_domain_by_world_distance() {
    // 10 x 10 world-unit plane over the unit domain
    let plane = PlaneSurface::new(Point3::ORIGIN, Vec3::X.mul_scalar(10.0), Vec3::Y.mul_scalar(10.0));
    let (extended, diag) = extend_surface(Arc::new(plane), 1.0, 2.0);

    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_f64(diag.u_margin, 0.1));
    assert!(tol.approx_eq_f64(diag.v_margin, 0.2));

    let (u0, u1) = extended.domain_u();
    assert!(tol.approx_eq_f64(u0, -0.1));
    assert!(tol.approx_eq_f64(u1, 1.1));

    // The grown region evaluates past the nominal edge
    let past_edge = extended.point_at(1.1, 0.5);
    assert!(tol.approx_eq_point3(past_edge, Point3::new(11.0, 5.0, 0.0)));
}

#[test]
fn closest_point_projects_onto_plane() {
    let plane = PlaneSurface::new(Point3::ORIGIN, Vec3::X.mul_scalar(4.0), Vec3::Y.mul_scalar(4.0));
    let projection = plane.closest_point(Point3::new(1.0, 3.0, 5.0));

    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(projection.point, Point3::new(1.0, 3.0, 0.0)));
    assert!(tol.approx_eq_f64(projection.u, 0.25));
    assert!(tol.approx_eq_f64(projection.v, 0.75));
}

#[test]
fn closest_point_clamps_to_domain() {
    let plane = unit_plane();
    let projection = plane.closest_point(Point3::new(2.0, -1.0, 0.5));
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_f64(projection.u, 1.0));
    assert!(tol.approx_eq_f64(projection.v, 0.0));
}

#[test]
fn plane_axes_are_orthonormal() {
    let plane = Plane::from_origin_axes(
        Point3::new(1.0, 2.0, 3.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    )
    .unwrap();

    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_vec3(plane.x_axis, Vec3::X));
    assert!(tol.approx_eq_vec3(plane.y_axis, Vec3::Y));
    assert!(tol.approx_eq_vec3(plane.z_axis, Vec3::Z));
    assert!(Plane::from_origin_axes(Point3::ORIGIN, Vec3::X, Vec3::X.mul_scalar(3.0)).is_none());
}
