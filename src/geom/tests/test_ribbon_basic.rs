use crate::geom::{
    Point3, RibbonError, RibbonOptions, Tolerance, resample_rail, ribbon_between_rails,
};

fn straight_rails(n: usize) -> (Vec<Point3>, Vec<Point3>) {
    let left = (0..n)
        .map(|i| Point3::new(i as f64, 1.0, 0.0))
        .collect();
    let right = (0..n)
        .map(|i| Point3::new(i as f64, -1.0, 0.0))
        .collect();
    (left, right)
}

#[test]
fn ribbon_skins_rails_with_quads() {
    let (left, right) = straight_rails(4);
    let (mesh, diag) = ribbon_between_rails(&left, &right, RibbonOptions::default()).unwrap();

    assert_eq!(diag.rung_count, 4);
    assert_eq!(diag.triangle_count, 6);
    assert!(!diag.extended);
    assert_eq!(mesh.positions().len(), 8);
    assert_eq!(mesh.triangles().len(), 6);
}

#[test]
fn ribbon_extension_pushes_ends_outward() {
    let (left, right) = straight_rails(3);
    let (mesh, diag) =
        ribbon_between_rails(&left, &right, RibbonOptions::new(0.5)).unwrap();

    assert!(diag.extended);
    let tol = Tolerance::new(1e-12);
    // First left vertex moved backwards along the rail
    assert!(tol.approx_eq_point3(mesh.positions()[0], Point3::new(-0.5, 1.0, 0.0)));
    // Last right vertex moved forwards
    let last_right = mesh.positions()[mesh.positions().len() - 1];
    assert!(tol.approx_eq_point3(last_right, Point3::new(2.5, -1.0, 0.0)));
}

#[test]
fn ribbon_rejects_bad_rails() {
    let (left, right) = straight_rails(3);
    assert!(matches!(
        ribbon_between_rails(&left[..1], &right, RibbonOptions::default()),
        Err(RibbonError::InsufficientRailPoints { count: 1 })
    ));
    assert!(matches!(
        ribbon_between_rails(&left, &right[..2], RibbonOptions::default()),
        Err(RibbonError::RailCountMismatch { left: 3, right: 2 })
    ));
}

#[test]
fn resample_rail_spaces_points_evenly() {
    let rail = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(4.0, 0.0, 0.0),
    ];
    let resampled = resample_rail(&rail, 5);

    assert_eq!(resampled.len(), 5);
    let tol = Tolerance::new(1e-12);
    for (i, p) in resampled.iter().enumerate() {
        assert!(tol.approx_eq_point3(*p, Point3::new(i as f64, 0.0, 0.0)));
    }
}

#[test]
fn resample_rail_preserves_endpoints_of_bent_rails() {
    let rail = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(3.0, 0.0, 0.0),
        Point3::new(3.0, 3.0, 0.0),
    ];
    let resampled = resample_rail(&rail, 7);

    assert_eq!(resampled.len(), 7);
    assert_eq!(resampled[0], rail[0]);
    assert_eq!(resampled[6], rail[2]);
}
