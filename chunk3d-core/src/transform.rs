/// Axis conversion from the file's Z-up frame to right-handed Y-up
use nalgebra::{Matrix3, Point3, Vector3};

/// The file stores positions Z-up; consumers expect Y-up. The remap is a
/// rotation of -90 degrees about X: `(x, y, z) -> (x, z, -y)`.
pub struct AxisRemap;

impl AxisRemap {
    /// Rotation matrix taking file axes to consumer axes
    pub fn matrix() -> Matrix3<f64> {
        Matrix3::new(
            1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, //
            0.0, -1.0, 0.0,
        )
    }

    /// Remap one stored position, widening to double precision.
    pub fn point(x: f32, y: f32, z: f32) -> Point3<f64> {
        Point3::new(f64::from(x), f64::from(z), -f64::from(y))
    }

    /// Remap a direction vector expressed in file axes.
    pub fn vector(v: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(v.x, v.z, -v.y)
    }
}
