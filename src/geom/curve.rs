use super::core::{Point3, Tolerance, Vec3};

pub trait Curve3 {
    fn point_at(&self, t: f64) -> Point3;

    #[must_use]
    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    #[must_use]
    fn is_closed(&self) -> bool {
        false
    }

    #[must_use]
    fn derivative_at(&self, t: f64) -> Vec3 {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return Vec3::ZERO;
        }

        let h = Tolerance::DERIVATIVE.relative_to(span);
        if !h.is_finite() || h == 0.0 {
            return Vec3::ZERO;
        }

        let t0 = (t - h).max(a);
        let t1 = (t + h).min(b);
        if t1 == t0 {
            return Vec3::ZERO;
        }

        let p0 = self.point_at(t0);
        let p1 = self.point_at(t1);
        p1.sub_point(p0).mul_scalar(1.0 / (t1 - t0))
    }

    /// Returns the unit tangent vector at parameter `t`.
    /// Returns `None` if the derivative is zero or degenerate.
    #[must_use]
    fn tangent_at(&self, t: f64) -> Option<Vec3> {
        self.derivative_at(t).normalized()
    }
}

// ============================================================================
// Polyline3
// ============================================================================

/// A polyline parameterized by normalized arc length over `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline3 {
    pub points: Vec<Point3>,
}

impl Polyline3 {
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total chord length.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[1].sub_point(w[0]).length())
            .sum()
    }

    #[must_use]
    pub fn is_closed_with_tol(&self, tol: Tolerance) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 => {
                tol.approx_eq_point3(*first, *last)
            }
            _ => false,
        }
    }
}

impl Curve3 for Polyline3 {
    fn point_at(&self, t: f64) -> Point3 {
        match self.points.len() {
            0 => Point3::ORIGIN,
            1 => self.points[0],
            _ => {
                let total = self.length();
                if total <= 0.0 || !total.is_finite() {
                    return self.points[0];
                }
                let target = t.clamp(0.0, 1.0) * total;
                let mut accumulated = 0.0;
                for window in self.points.windows(2) {
                    let seg = window[1].sub_point(window[0]).length();
                    if accumulated + seg >= target {
                        let local = if seg > 0.0 {
                            ((target - accumulated) / seg).clamp(0.0, 1.0)
                        } else {
                            0.0
                        };
                        return window[0].lerp(window[1], local);
                    }
                    accumulated += seg;
                }
                *self.points.last().expect("non-empty polyline")
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.is_closed_with_tol(Tolerance::default_geom())
    }
}

// ============================================================================
// NurbsCurve3
// ============================================================================

/// A non-rational B-spline curve.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve3 {
    pub degree: usize,
    pub control_points: Vec<Point3>,
    pub knots: Vec<f64>,
}

impl NurbsCurve3 {
    pub fn new(
        degree: usize,
        control_points: Vec<Point3>,
        knots: Vec<f64>,
    ) -> Result<Self, String> {
        if control_points.len() < 2 {
            return Err("nurbs curve requires at least 2 control points".to_string());
        }
        if degree == 0 {
            return Err("nurbs curve degree must be >= 1".to_string());
        }
        if degree >= control_points.len() {
            return Err("nurbs curve degree must be < control point count".to_string());
        }

        let expected_knot_len = control_points.len() + degree + 1;
        if knots.len() != expected_knot_len {
            return Err(format!(
                "nurbs curve knot length must be {}, got {}",
                expected_knot_len,
                knots.len()
            ));
        }

        if !is_non_decreasing(&knots) {
            return Err("nurbs curve knots must be non-decreasing".to_string());
        }

        Ok(Self {
            degree,
            control_points,
            knots,
        })
    }

    #[must_use]
    pub fn is_closed_with_tol(&self, tol: Tolerance) -> bool {
        let (a, b) = self.domain();
        let span = b - a;
        if !span.is_finite() || span == 0.0 {
            return false;
        }
        tol.approx_eq_point3(self.point_at(a), self.point_at(b))
    }

    /// Creates a B-spline curve that interpolates exactly through the given points.
    ///
    /// Uses chord-length parameterization and global curve interpolation
    /// (solving a banded linear system) to compute control points such that
    /// the resulting curve passes through all input points.
    ///
    /// # Arguments
    /// * `points` - Points to interpolate through (at least 2 required).
    /// * `degree` - Desired curve degree; clamped to `[1, n-1]`.
    ///
    /// # Returns
    /// A [`NurbsCurve3`] that passes through all input points, or an error if
    /// construction fails.
    pub fn interpolate_through_points(points: &[Point3], degree: usize) -> Result<Self, String> {
        if points.len() < 2 {
            return Err("interpolation requires at least 2 points".to_string());
        }

        // For only 2 points, use linear interpolation (degree 1)
        if points.len() == 2 {
            let knots = vec![0.0, 0.0, 1.0, 1.0];
            return Self::new(1, points.to_vec(), knots);
        }

        let n = points.len();
        let p = degree.clamp(1, n - 1);

        let params = chord_length_parameters(points);
        let knots = averaging_knot_vector(&params, p);
        let control_points = solve_interpolation_system(points, &params, &knots, p)?;

        Self::new(p, control_points, knots)
    }
}

impl Curve3 for NurbsCurve3 {
    fn point_at(&self, t: f64) -> Point3 {
        if self.control_points.is_empty() {
            return Point3::ORIGIN;
        }

        let p = self.degree;
        if p == 0 || p >= self.control_points.len() {
            return self.control_points[0];
        }

        let (a, b) = self.domain();
        let u = t.clamp(a, b);

        let n = self.control_points.len() - 1;
        let span = find_span(n, p, u, &self.knots);

        // de Boor recursion on the affected control points
        let mut d: Vec<Point3> = (0..=p)
            .map(|j| self.control_points[span - p + j])
            .collect();

        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = span - p + j;
                let denom = self.knots[i + p + 1 - r] - self.knots[i];
                let alpha = if denom.abs() > 1e-14 {
                    (u - self.knots[i]) / denom
                } else {
                    0.0
                };
                d[j] = d[j - 1].lerp(d[j], alpha);
            }
        }

        d[p]
    }

    fn domain(&self) -> (f64, f64) {
        if self.control_points.is_empty() || self.knots.is_empty() {
            return (0.0, 0.0);
        }

        let p = self.degree;
        let expected_knot_len = self.control_points.len() + p + 1;
        if p == 0 || p >= self.control_points.len() || self.knots.len() != expected_knot_len {
            return (0.0, 0.0);
        }

        (self.knots[p], self.knots[self.control_points.len()])
    }

    fn is_closed(&self) -> bool {
        self.is_closed_with_tol(Tolerance::default_geom())
    }
}

/// Finds the knot span index containing parameter `u`.
fn find_span(n: usize, p: usize, u: f64, knots: &[f64]) -> usize {
    if u >= knots[n + 1] {
        return n;
    }
    if u <= knots[p] {
        return p;
    }

    let mut low = p;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while u < knots[mid] || u >= knots[mid + 1] {
        if u < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Computes chord-length parameterization for a set of points.
///
/// Returns parameter values in [0, 1] where each parameter is proportional to
/// the cumulative chord length from the first point.
fn chord_length_parameters(points: &[Point3]) -> Vec<f64> {
    if points.len() < 2 {
        return if points.is_empty() { vec![] } else { vec![0.0] };
    }

    let mut lengths = Vec::with_capacity(points.len());
    lengths.push(0.0);

    let mut total = 0.0;
    for window in points.windows(2) {
        total += window[1].sub_point(window[0]).length();
        lengths.push(total);
    }

    if total > 0.0 {
        for length in &mut lengths {
            *length /= total;
        }
    }

    lengths
}

/// Computes knot vector using the averaging method.
///
/// For a degree-p B-spline interpolating n points with parameters t_0 ... t_{n-1},
/// the interior knots are computed as:
///   u_{j+p} = (t_j + t_{j+1} + ... + t_{j+p-1}) / p  for j = 1, ..., n-p-1
fn averaging_knot_vector(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let p = degree;

    let knot_count = n + p + 1;
    let mut knots = Vec::with_capacity(knot_count);

    // Clamped start: p+1 zeros
    for _ in 0..=p {
        knots.push(0.0);
    }

    let interior_count = if n > p + 1 { n - p - 1 } else { 0 };
    for j in 1..=interior_count {
        let sum: f64 = params[j..j + p].iter().sum();
        knots.push(sum / p as f64);
    }

    // Clamped end: p+1 ones
    for _ in 0..=p {
        knots.push(1.0);
    }

    knots
}

/// Solves the global curve interpolation system to find control points.
///
/// Given n data points Q_0 ... Q_{n-1} at parameters t_0 ... t_{n-1},
/// finds control points P_0 ... P_{n-1} such that C(t_i) = Q_i.
fn solve_interpolation_system(
    data_points: &[Point3],
    params: &[f64],
    knots: &[f64],
    degree: usize,
) -> Result<Vec<Point3>, String> {
    let n = data_points.len();
    let p = degree;

    if n < 2 {
        return Err("need at least 2 points for interpolation".to_string());
    }
    if n == 2 {
        return Ok(data_points.to_vec());
    }

    // Coefficient matrix N where N[i][j] = N_{j,p}(t_i); banded, bandwidth p+1
    let mut matrix = vec![vec![0.0; n]; n];
    for (i, &t) in params.iter().enumerate() {
        for j in 0..n {
            matrix[i][j] = basis_function(j, p, t, knots);
        }
    }

    let mut control_x = vec![0.0; n];
    let mut control_y = vec![0.0; n];
    let mut control_z = vec![0.0; n];

    let rhs_x: Vec<f64> = data_points.iter().map(|pt| pt.x).collect();
    let rhs_y: Vec<f64> = data_points.iter().map(|pt| pt.y).collect();
    let rhs_z: Vec<f64> = data_points.iter().map(|pt| pt.z).collect();

    solve_linear_system(&matrix, &rhs_x, &mut control_x)?;
    solve_linear_system(&matrix, &rhs_y, &mut control_y)?;
    solve_linear_system(&matrix, &rhs_z, &mut control_z)?;

    Ok((0..n)
        .map(|i| Point3::new(control_x[i], control_y[i], control_z[i]))
        .collect())
}

/// Computes the B-spline basis function N_{i,p}(t) using the Cox-de Boor recursion.
fn basis_function(i: usize, p: usize, t: f64, knots: &[f64]) -> f64 {
    if p == 0 {
        if i + 1 < knots.len() && t >= knots[i] && t < knots[i + 1] {
            return 1.0;
        }
        // Handle the right endpoint (t == last knot)
        if i + 1 < knots.len() && (t - knots[i + 1]).abs() < 1e-14 && t >= knots[i] {
            return 1.0;
        }
        return 0.0;
    }

    let mut result = 0.0;

    if i + p < knots.len() {
        let denom = knots[i + p] - knots[i];
        if denom.abs() > 1e-14 {
            result += (t - knots[i]) / denom * basis_function(i, p - 1, t, knots);
        }
    }

    if i + p + 1 < knots.len() && i + 1 < knots.len() {
        let denom = knots[i + p + 1] - knots[i + 1];
        if denom.abs() > 1e-14 {
            result += (knots[i + p + 1] - t) / denom * basis_function(i + 1, p - 1, t, knots);
        }
    }

    result
}

/// Solves a dense linear system Ax = b using Gaussian elimination with partial pivoting.
fn solve_linear_system(matrix: &[Vec<f64>], rhs: &[f64], result: &mut [f64]) -> Result<(), String> {
    let n = matrix.len();
    if n == 0 || rhs.len() != n || result.len() != n {
        return Err("invalid matrix dimensions".to_string());
    }

    let mut aug: Vec<Vec<f64>> = matrix
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut r = row.clone();
            r.push(rhs[i]);
            r
        })
        .collect();

    // Forward elimination with partial pivoting
    for k in 0..n {
        let mut max_row = k;
        let mut max_val = aug[k][k].abs();
        for i in (k + 1)..n {
            if aug[i][k].abs() > max_val {
                max_val = aug[i][k].abs();
                max_row = i;
            }
        }

        if max_val < 1e-14 {
            return Err("singular matrix in interpolation system".to_string());
        }

        if max_row != k {
            aug.swap(k, max_row);
        }

        let pivot = aug[k][k];
        for i in (k + 1)..n {
            let factor = aug[i][k] / pivot;
            for j in k..=n {
                aug[i][j] -= factor * aug[k][j];
            }
        }
    }

    // Back substitution
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * result[j];
        }
        if aug[i][i].abs() < 1e-14 {
            return Err("singular matrix during back substitution".to_string());
        }
        result[i] = sum / aug[i][i];
    }

    Ok(())
}

fn is_non_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] <= w[1])
}

// ============================================================================
// Closest parameter
// ============================================================================

/// Finds the curve parameter whose point is closest to `query`.
///
/// Coarse uniform sampling over the curve domain followed by golden-section
/// refinement inside the best bracket. `samples` controls the coarse density
/// (clamped to at least 8).
#[must_use]
pub fn closest_curve_parameter(curve: &impl Curve3, query: Point3, samples: usize) -> f64 {
    let (a, b) = curve.domain();
    let span = b - a;
    if !span.is_finite() || span == 0.0 {
        return a;
    }

    let samples = samples.max(8);
    let mut best_index = 0;
    let mut best_distance = f64::INFINITY;
    for i in 0..=samples {
        let t = a + span * (i as f64 / samples as f64);
        let d = curve.point_at(t).distance_squared_to(query);
        if d < best_distance {
            best_distance = d;
            best_index = i;
        }
    }

    let step = span / samples as f64;
    let mut lo = a + step * best_index.saturating_sub(1) as f64;
    let mut hi = (a + step * (best_index + 1) as f64).min(b);

    // Golden-section refinement
    const INV_PHI: f64 = 0.618_033_988_749_894_9;
    for _ in 0..48 {
        let d = hi - lo;
        if d <= 0.0 {
            break;
        }
        let t1 = hi - d * INV_PHI;
        let t2 = lo + d * INV_PHI;
        let d1 = curve.point_at(t1).distance_squared_to(query);
        let d2 = curve.point_at(t2).distance_squared_to(query);
        if d1 <= d2 {
            hi = t2;
        } else {
            lo = t1;
        }
    }

    0.5 * (lo + hi)
}

// ============================================================================
// Seam anchoring
// ============================================================================

/// Diagnostics for seam anchoring operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeamAnchorDiagnostics {
    /// Number of input points.
    pub input_point_count: usize,
    /// Whether the input was treated as closed.
    pub was_closed: bool,
    /// Index of the vertex chosen as the new seam.
    pub seam_index: usize,
}

/// Rotates a closed point loop so it starts (and ends) at the vertex nearest
/// to `anchor`.
///
/// The loop must carry an explicit duplicated closing point; the output keeps
/// the duplicate so downstream consumers see an explicit closed ring. Open
/// polylines are returned unchanged.
#[must_use]
pub fn rotate_seam_to_anchor(
    points: &[Point3],
    anchor: Point3,
    tol: Tolerance,
) -> (Vec<Point3>, SeamAnchorDiagnostics) {
    let mut diagnostics = SeamAnchorDiagnostics {
        input_point_count: points.len(),
        ..Default::default()
    };

    if points.len() < 3 {
        return (points.to_vec(), diagnostics);
    }

    let explicit_close = tol.approx_eq_point3(points[0], points[points.len() - 1]);
    diagnostics.was_closed = explicit_close;

    if !explicit_close {
        return (points.to_vec(), diagnostics);
    }

    let ring = &points[..points.len() - 1];
    let seam_index = ring
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.distance_squared_to(anchor)
                .total_cmp(&b.distance_squared_to(anchor))
        })
        .map_or(0, |(i, _)| i);
    diagnostics.seam_index = seam_index;

    let mut result = Vec::with_capacity(ring.len() + 1);
    result.extend_from_slice(&ring[seam_index..]);
    result.extend_from_slice(&ring[..seam_index]);
    result.push(ring[seam_index]);

    (result, diagnostics)
}
