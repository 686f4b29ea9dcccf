//! Vector math on local-frame Cartesian points (meters).

/// A point or displacement `(x, y, z)` in the local frame.
pub type Point3 = (f64, f64, f64);

pub fn sub(a: Point3, b: Point3) -> Point3 {
    (a.0 - b.0, a.1 - b.1, a.2 - b.2)
}

pub fn norm(v: Point3) -> f64 {
    (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt()
}

/// Straight-line distance between two points.
pub fn distance(a: Point3, b: Point3) -> f64 {
    norm(sub(a, b))
}

pub fn cross(a: Point3, b: Point3) -> Point3 {
    (
        a.1 * b.2 - a.2 * b.1,
        a.2 * b.0 - a.0 * b.2,
        a.0 * b.1 - a.1 * b.0,
    )
}

/// Sum of segment lengths along a polyline.
pub fn path_length(points: &[Point3]) -> f64 {
    points
        .windows(2)
        .map(|pair| distance(pair[0], pair[1]))
        .sum()
}
