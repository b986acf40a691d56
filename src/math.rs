//! Mathematical structs and functions.

use cgmath::{Point3, Vector3};
pub use util::*;

mod util;

/// A 3D point. `x` is lateral, `y` is vertical and `z` is axial.
pub type Point3d = Point3<f64>;

/// A 3D vector. `x` is lateral, `y` is vertical and `z` is axial.
pub type Vector3d = Vector3<f64>;
