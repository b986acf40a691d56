//! Forward obstacle detection.

use crate::lane::Heading;
use crate::math::Point3d;
use crate::util::Interval;
use crate::EntityId;

/// Collision layer bit masks.
pub mod layers {
    /// Traffic entities.
    pub const TRAFFIC: u32 = 1 << 0;
    /// The player's vehicle.
    pub const PLAYER: u32 = 1 << 1;
    /// Static world geometry.
    pub const STATIC: u32 = 1 << 2;
}

/// A swept-sphere query along the axial direction.
#[derive(Clone, Copy, Debug)]
pub struct Probe {
    /// The centre of the sphere at the start of the sweep.
    pub origin: Point3d,
    /// The direction of the sweep.
    pub heading: Heading,
    /// The radius of the sphere in m.
    pub radius: f64,
    /// The maximum sweep distance in m.
    pub max_length: f64,
    /// Only colliders on one of these layers are detected.
    pub layer_mask: u32,
    /// A collider owner that is never reported, usually the prober itself.
    pub exclude: Option<EntityId>,
}

/// The nearest collider hit by a [Probe].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    /// The traffic entity that owns the collider, if any.
    pub owner: Option<EntityId>,
    /// The axial velocity of the collider's body, if it has one.
    pub axial_velocity: Option<f64>,
    /// The distance travelled by the sphere before contact, in m.
    pub distance: f64,
}

/// A spatial query service able to answer forward probes.
pub trait ObstacleSensor {
    /// Returns the nearest collider along the probe, if any.
    fn probe(&self, probe: &Probe) -> Option<ProbeHit>;
}

/// An axis-aligned collider in world space.
#[derive(Clone, Copy, Debug)]
pub struct Collider {
    /// The traffic entity that owns the collider, if any.
    pub owner: Option<EntityId>,
    /// The layer bit of the collider.
    pub layer: u32,
    /// The lateral (x) extent.
    pub lateral: Interval<f64>,
    /// The vertical (y) extent.
    pub vertical: Interval<f64>,
    /// The axial (z) extent.
    pub axial: Interval<f64>,
    /// The axial velocity of the collider's body, if it has one.
    pub axial_velocity: Option<f64>,
}

impl Collider {
    /// Computes the distance a probe sweeps before touching this collider.
    fn sweep_distance(&self, probe: &Probe) -> Option<f64> {
        let origin = probe.origin;
        if self.lateral.distance(origin.x) > probe.radius
            || self.vertical.distance(origin.y) > probe.radius
        {
            return None;
        }
        let axial = self.axial.inflate(probe.radius);
        let distance = match probe.heading {
            Heading::Forward if axial.max >= origin.z => f64::max(axial.min - origin.z, 0.0),
            Heading::Oncoming if axial.min <= origin.z => f64::max(origin.z - axial.max, 0.0),
            _ => return None,
        };
        (distance <= probe.max_length).then_some(distance)
    }
}

/// A frozen copy of the colliders in the world for one simulation step.
///
/// Every controller in a step probes the same snapshot, so the order in which
/// entities are updated does not change what they see.
#[derive(Clone, Debug, Default)]
pub struct TrafficSnapshot {
    colliders: Vec<Collider>,
}

impl TrafficSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds a collider.
    pub fn push(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// The colliders in the snapshot.
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }
}

impl Extend<Collider> for TrafficSnapshot {
    fn extend<I: IntoIterator<Item = Collider>>(&mut self, iter: I) {
        self.colliders.extend(iter);
    }
}

impl ObstacleSensor for TrafficSnapshot {
    fn probe(&self, probe: &Probe) -> Option<ProbeHit> {
        self.colliders
            .iter()
            .filter(|c| c.layer & probe.layer_mask != 0)
            .filter(|c| probe.exclude.is_none() || c.owner != probe.exclude)
            .filter_map(|c| {
                c.sweep_distance(probe).map(|distance| ProbeHit {
                    owner: c.owner,
                    axial_velocity: c.axial_velocity,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
