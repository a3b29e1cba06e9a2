use nalgebra::{Point3, Vector3};
use rand::Rng;

/// Length below which a vector is treated as degenerate.
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Normalizes `v`, returning `fallback` when `v` is too short or not finite.
pub fn normalize_or(v: &Vector3<f64>, fallback: Vector3<f64>) -> Vector3<f64> {
    let norm = v.norm();
    if norm.is_finite() && norm > DEGENERATE_EPSILON {
        v / norm
    } else {
        fallback
    }
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// A uniformly distributed unit vector drawn from `rng`.
pub fn random_unit_vector<R: Rng + ?Sized>(rng: &mut R) -> Vector3<f64> {
    loop {
        let v: Vector3<f64> = Vector3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        let norm_sq = v.norm_squared();
        if norm_sq > 1e-6 && norm_sq <= 1.0 {
            return v / norm_sq.sqrt();
        }
    }
}

pub fn is_finite_point(p: &Point3<f64>) -> bool {
    p.coords.iter().all(|c| c.is_finite())
}
