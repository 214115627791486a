use crate::geom::{
    Curve3, NurbsCurve3, Point3, Polyline3, Tolerance, Vec3, closest_curve_parameter,
    rotate_seam_to_anchor,
};

#[test]
fn polyline_point_at_walks_arc_length() {
    let polyline = Polyline3::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
    ]);

    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_f64(polyline.length(), 4.0));
    assert!(tol.approx_eq_point3(polyline.point_at(0.0), Point3::new(0.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(polyline.point_at(0.5), Point3::new(2.0, 0.0, 0.0)));
    assert!(tol.approx_eq_point3(polyline.point_at(1.0), Point3::new(2.0, 2.0, 0.0)));
    assert!(tol.approx_eq_point3(polyline.point_at(0.25), Point3::new(1.0, 0.0, 0.0)));
}

#[test]
fn polyline_closed_detection_requires_duplicate_endpoint() {
    let open = Polyline3::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ]);
    assert!(!open.is_closed());

    let closed = Polyline3::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ]);
    assert!(closed.is_closed());
}

#[test]
fn interpolated_curve_hits_endpoints_exactly() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(3.0, 1.0, 0.0),
    ];
    let curve = NurbsCurve3::interpolate_through_points(&points, 3).unwrap();

    let (a, b) = curve.domain();
    let tol = Tolerance::new(1e-9);
    assert!(tol.approx_eq_point3(curve.point_at(a), points[0]));
    assert!(tol.approx_eq_point3(curve.point_at(b), points[3]));
}

#[test]
fn interpolated_curve_passes_through_interior_points() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 0.0),
        Point3::new(2.0, -1.0, 0.5),
        Point3::new(3.0, 0.5, 1.0),
        Point3::new(4.0, 0.0, 0.0),
    ];
    let curve = NurbsCurve3::interpolate_through_points(&points, 3).unwrap();

    for q in &points {
        let t = closest_curve_parameter(&curve, *q, 256);
        let distance = curve.point_at(t).distance_to(*q);
        assert!(
            distance < 1e-6,
            "curve misses interpolation point {q:?} by {distance}"
        );
    }
}

#[test]
fn two_point_interpolation_degenerates_to_a_line() {
    let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0)];
    let curve = NurbsCurve3::interpolate_through_points(&points, 3).unwrap();

    assert_eq!(curve.degree, 1);
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(curve.point_at(0.5), Point3::new(2.0, 0.0, 0.0)));

    let tangent = curve.tangent_at(0.5).unwrap();
    assert!(Tolerance::LOOSE.approx_eq_vec3(tangent, Vec3::X));
}

#[test]
fn interpolation_rejects_single_point() {
    assert!(NurbsCurve3::interpolate_through_points(&[Point3::ORIGIN], 3).is_err());
}

#[test]
fn nurbs_constructor_validates_shape() {
    let points = vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)];
    assert!(NurbsCurve3::new(0, points.clone(), vec![0.0, 0.0, 1.0, 1.0]).is_err());
    assert!(NurbsCurve3::new(1, points.clone(), vec![0.0, 0.0, 1.0]).is_err());
    assert!(NurbsCurve3::new(1, points.clone(), vec![1.0, 0.0, 0.0, 1.0]).is_err());
    assert!(NurbsCurve3::new(1, points, vec![0.0, 0.0, 1.0, 1.0]).is_ok());
}

#[test]
fn closest_parameter_finds_nearest_segment() {
    let polyline = Polyline3::new(vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
        Point3::new(4.0, 4.0, 0.0),
    ]);

    // Query hovering over the middle of the first segment
    let t = closest_curve_parameter(&polyline, Point3::new(2.0, 1.0, 0.0), 64);
    let tol = Tolerance::LOOSE;
    assert!(tol.approx_eq_point3(polyline.point_at(t), Point3::new(2.0, 0.0, 0.0)));

    // Query past the end clamps to the last point
    let t = closest_curve_parameter(&polyline, Point3::new(5.0, 6.0, 0.0), 64);
    assert!(tol.approx_eq_point3(polyline.point_at(t), Point3::new(4.0, 4.0, 0.0)));
}

#[test]
fn seam_rotation_starts_at_nearest_vertex() {
    let ring = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 0.0),
    ];

    let anchor = Point3::new(1.2, 1.1, 0.0);
    let (rotated, diag) = rotate_seam_to_anchor(&ring, anchor, Tolerance::default_geom());

    assert!(diag.was_closed);
    assert_eq!(diag.seam_index, 2);
    assert_eq!(rotated.len(), ring.len());
    assert_eq!(rotated[0], Point3::new(1.0, 1.0, 0.0));
    assert_eq!(rotated[rotated.len() - 1], rotated[0]);
}

#[test]
fn seam_rotation_leaves_open_polylines_alone() {
    let open = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
    ];
    let (result, diag) = rotate_seam_to_anchor(&open, Point3::new(2.0, 0.0, 0.0), Tolerance::default_geom());
    assert!(!diag.was_closed);
    assert_eq!(result, open);
}
