use crate::math::Vector3d;
use crate::util::Interval;
use cgmath::ElementWise;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Extra height added when resting an entity on the road, in m.
const GROUND_CLEARANCE: f64 = 0.01; // m

/// The physical bounding shape of an entity, in its local (unscaled) frame.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Footprint {
    /// An axis-aligned box.
    Box { size: Vector3d, center: Vector3d },
    /// A capsule aligned with the vertical axis.
    Capsule {
        radius: f64,
        height: f64,
        center: Vector3d,
    },
    /// No physical shape.
    None,
}

impl Footprint {
    /// Half the extents of the shape along each axis, after scaling.
    pub fn half_extents(&self, scale: Vector3d) -> Vector3d {
        let half = match *self {
            Footprint::Box { size, .. } => 0.5 * size,
            Footprint::Capsule { radius, height, .. } => {
                Vector3d::new(radius, 0.5 * f64::max(height, 2.0 * radius), radius)
            }
            Footprint::None => Vector3d::new(0.0, 0.0, 0.0),
        };
        abs(half.mul_element_wise(scale))
    }

    /// The offset of the shape's centre from the entity's origin, after scaling.
    pub fn center(&self, scale: Vector3d) -> Vector3d {
        match *self {
            Footprint::Box { center, .. } | Footprint::Capsule { center, .. } => {
                center.mul_element_wise(scale)
            }
            Footprint::None => Vector3d::new(0.0, 0.0, 0.0),
        }
    }

    /// The vertical coordinate at which to place the entity's origin
    /// so that the bottom of its shape rests on a road at height `road_y`.
    pub fn grounded_y(&self, scale: Vector3d, road_y: f64) -> f64 {
        let center = self.center(scale).y;
        let half = self.half_extents(scale).y;
        road_y - center + half + GROUND_CLEARANCE
    }

    /// The axial and lateral extents of the shape when the entity's origin is at `origin`.
    pub(crate) fn bounds(&self, scale: Vector3d, origin: Vector3d) -> [Interval<f64>; 3] {
        let centre = origin + self.center(scale);
        let half = self.half_extents(scale);
        [
            Interval::disc(centre.x, half.x),
            Interval::disc(centre.y, half.y),
            Interval::disc(centre.z, half.z),
        ]
    }
}

fn abs(v: Vector3d) -> Vector3d {
    Vector3d::new(v.x.abs(), v.y.abs(), v.z.abs())
}
