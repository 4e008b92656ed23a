/// Smoothed per-vertex normals
use nalgebra::{Point3, Vector3};

use crate::geometry::Triangle;

/// Unit vector along `v`, or `v` itself when it has zero length.
pub fn normalize_or_zero(v: Vector3<f64>) -> Vector3<f64> {
    let length = v.norm();
    if length == 0.0 {
        v
    } else {
        v / length
    }
}

/// Unnormalized face normal, `(a - b) x (b - c)`. Its length is twice the
/// triangle's area.
pub fn face_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Vector3<f64> {
    (a - b).cross(&(b - c))
}

/// Area-weighted vertex normals: every face normal is added to its three
/// corners, then each sum is normalized. Triangles with an index outside
/// `vertices` contribute nothing.
pub fn vertex_normals(vertices: &[Point3<f64>], triangles: &[Triangle]) -> Vec<Vector3<f64>> {
    let mut acc = vec![Vector3::zeros(); vertices.len()];

    for triangle in triangles {
        let [i, j, k] = triangle.indices.map(|i| i as usize);
        let (Some(a), Some(b), Some(c)) = (vertices.get(i), vertices.get(j), vertices.get(k))
        else {
            continue;
        };
        let n = face_normal(a, b, c);
        acc[i] += n;
        acc[j] += n;
        acc[k] += n;
    }

    acc.into_iter().map(normalize_or_zero).collect()
}
