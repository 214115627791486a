use super::core::Point3;

/// Errors that can occur constructing a triangle mesh.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TriMeshError {
    /// The mesh has no triangles.
    #[error("mesh has no triangles")]
    Empty,

    /// A triangle references a vertex index outside the position buffer.
    #[error("triangle {triangle} references vertex {index} of {count}")]
    IndexOutOfBounds {
        triangle: usize,
        index: u32,
        count: usize,
    },
}

/// An indexed triangle mesh used as projection reference geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    positions: Vec<Point3>,
    triangles: Vec<[u32; 3]>,
}

impl TriMesh {
    pub fn new(positions: Vec<Point3>, triangles: Vec<[u32; 3]>) -> Result<Self, TriMeshError> {
        if triangles.is_empty() {
            return Err(TriMeshError::Empty);
        }
        for (t, tri) in triangles.iter().enumerate() {
            for &index in tri {
                if index as usize >= positions.len() {
                    return Err(TriMeshError::IndexOutOfBounds {
                        triangle: t,
                        index,
                        count: positions.len(),
                    });
                }
            }
        }
        Ok(Self {
            positions,
            triangles,
        })
    }

    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    #[must_use]
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Closest point on the mesh surface to `query`.
    ///
    /// Brute-force scan over all triangles; reference meshes in this pipeline
    /// are organized sample grids, small enough that a spatial index would not
    /// pay for itself.
    #[must_use]
    pub fn closest_point(&self, query: Point3) -> Point3 {
        let mut best = self.positions[self.triangles[0][0] as usize];
        let mut best_distance = f64::INFINITY;

        for tri in &self.triangles {
            let a = self.positions[tri[0] as usize];
            let b = self.positions[tri[1] as usize];
            let c = self.positions[tri[2] as usize];
            let candidate = closest_point_on_triangle(query, a, b, c);
            let d = candidate.distance_squared_to(query);
            if d < best_distance {
                best_distance = d;
                best = candidate;
            }
        }

        best
    }
}

/// Closest point on triangle `abc` to `p` (Ericson's region method).
fn closest_point_on_triangle(p: Point3, a: Point3, b: Point3, c: Point3) -> Point3 {
    let ab = b.sub_point(a);
    let ac = c.sub_point(a);
    let ap = p.sub_point(a);

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p.sub_point(b);
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return a.add_vec(ab.mul_scalar(t));
    }

    let cp = p.sub_point(c);
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return a.add_vec(ac.mul_scalar(t));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b.add_vec(c.sub_point(b).mul_scalar(t));
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a.add_vec(ab.mul_scalar(v)).add_vec(ac.mul_scalar(w))
}
