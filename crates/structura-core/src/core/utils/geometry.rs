use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// Unit normal of a closed polygon by Newell's method. `None` for degenerate rings.
pub fn ring_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    if points.len() < 3 {
        return None;
    }
    let mut normal = Vector3::zeros();
    for (i, current) in points.iter().enumerate() {
        let next = &points[(i + 1) % points.len()];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    normal.try_normalize(f64::EPSILON)
}

/// Rigid transform from a rotation and a translation.
pub fn rigid_transform(rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut matrix = rotation.to_homogeneous();
    matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    #[test]
    fn centroid_of_empty_is_none() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn centroid_averages_points() {
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)]).unwrap();
        assert!((c - Point3::new(1.0, 2.0, 3.0)).norm() < EPS);
    }

    #[test]
    fn ring_normal_of_planar_square_points_along_z() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let n = ring_normal(&square).unwrap();
        assert!((n - Vector3::z()).norm() < EPS);
    }

    #[test]
    fn ring_normal_of_collinear_points_is_none() {
        let line = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(ring_normal(&line).is_none());
    }

    #[test]
    fn rigid_transform_rotates_then_translates() {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let m = rigid_transform(&rotation, &Vector3::new(1.0, 0.0, 0.0));
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((p - Point3::new(1.0, 1.0, 0.0)).norm() < EPS);
    }
}
