use crate::geom::{Point3, Tolerance, TriMesh, TriMeshError};

/// Unit square in the XY plane, split into two triangles.
fn square_mesh() -> TriMesh {
    TriMesh::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .unwrap()
}

#[test]
fn mesh_constructor_validates_indices() {
    assert!(matches!(
        TriMesh::new(vec![Point3::ORIGIN], vec![]),
        Err(TriMeshError::Empty)
    ));
    assert!(matches!(
        TriMesh::new(vec![Point3::ORIGIN], vec![[0, 0, 7]]),
        Err(TriMeshError::IndexOutOfBounds { index: 7, .. })
    ));
}

#[test]
fn interior_point_projects_vertically() {
    let mesh = square_mesh();
    let projected = mesh.closest_point(Point3::new(0.3, 0.4, 2.0));
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(projected, Point3::new(0.3, 0.4, 0.0)));
}

#[test]
fn point_beyond_corner_projects_to_corner() {
    let mesh = square_mesh();
    let projected = mesh.closest_point(Point3::new(2.0, 2.0, 1.0));
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(projected, Point3::new(1.0, 1.0, 0.0)));
}

#[test]
fn point_beside_edge_projects_onto_edge() {
    let mesh = square_mesh();
    let projected = mesh.closest_point(Point3::new(0.5, -1.0, 0.0));
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(projected, Point3::new(0.5, 0.0, 0.0)));
}

#[test]
fn point_on_surface_is_fixed() {
    let mesh = square_mesh();
    let on_surface = Point3::new(0.25, 0.75, 0.0);
    let projected = mesh.closest_point(on_surface);
    let tol = Tolerance::new(1e-12);
    assert!(tol.approx_eq_point3(projected, on_surface));
}
