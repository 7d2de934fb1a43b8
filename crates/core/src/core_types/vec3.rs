//! Vector type alias for 3D positions and directions.

use nalgebra::Vector3;

/// 3D vector type for positions, offsets and wind directions.
///
/// This is a simple alias for `nalgebra::Vector3<f64>`, used for turbine
/// positions, rotor points and wake-frame coordinates.
pub type Vec3 = Vector3<f64>;

/// Horizontal unit vector pointing downwind for a meteorological direction
///
/// `wd` is the direction the wind comes from, in degrees clockwise from
/// north, so 270° (westerly) points along +x.
#[must_use]
pub fn wind_direction_vector(wd: f64) -> Vec3 {
    let rad = wd.to_radians();
    Vec3::new(-rad.sin(), -rad.cos(), 0.0)
}
