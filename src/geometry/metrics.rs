//! Small vector helpers and polygon metrics on `[f64; 3]` points.
//!
//! Polygons are given as vertex loops; the area vector follows the
//! right-hand rule with respect to the loop order.

pub(crate) const EPS: f64 = 1e-12;

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

/// Arithmetic mean of the given points (origin for an empty set).
pub fn centroid<I>(points: I) -> [f64; 3]
where
    I: IntoIterator<Item = [f64; 3]>,
{
    let mut acc = [0.0; 3];
    let mut n = 0usize;
    for p in points {
        acc[0] += p[0];
        acc[1] += p[1];
        acc[2] += p[2];
        n += 1;
    }
    if n == 0 {
        return acc;
    }
    let inv = 1.0 / n as f64;
    [acc[0] * inv, acc[1] * inv, acc[2] * inv]
}

/// Newell area vector of a (possibly non-planar) polygon loop.
///
/// Its length is twice the projected area; its direction is the normal for
/// which the loop runs counter-clockwise.
pub fn polygon_area_vector(points: &[[f64; 3]]) -> [f64; 3] {
    let mut n = [0.0; 3];
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}
