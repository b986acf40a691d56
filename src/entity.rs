pub use self::follow::{FollowController, FollowParams};
pub use self::footprint::Footprint;
use crate::catalog::Prefab;
use crate::lane::{Heading, Lane};
use crate::math::{Point3d, Vector3d};
use crate::sensor::{layers, Collider, ObstacleSensor};
use crate::{Category, EntityId};
use cgmath::EuclideanSpace;

mod follow;
mod footprint;

/// A pre-instantiated traffic entity.
///
/// Entities are created once and toggled between active (simulated) and
/// inactive (pooled) for the lifetime of the simulation.
#[derive(Clone, Debug)]
pub struct TrafficEntity {
    /// The entity's ID.
    id: EntityId,
    /// The pool the entity belongs to.
    category: Category,
    /// The index of the entity's prefab within its category, for unique categories.
    unique_index: Option<usize>,
    /// The name of the prefab the entity was created from.
    prefab: String,
    /// The physical bounding shape.
    footprint: Footprint,
    /// The world scale of the footprint.
    scale: Vector3d,
    /// Whether the entity is in the world.
    active: bool,
    /// The index of the lane the entity is steering towards.
    lane: usize,
    /// World space position of the entity's origin.
    position: Point3d,
    /// World space velocity in m/s.
    velocity: Vector3d,
    /// The car following controller.
    follow: FollowController,
}

impl TrafficEntity {
    /// Creates an inactive entity from a prefab.
    pub(crate) fn new(
        id: EntityId,
        category: Category,
        unique_index: Option<usize>,
        prefab: &Prefab,
    ) -> Self {
        Self {
            id,
            category,
            unique_index: unique_index.filter(|_| category.is_unique()),
            prefab: prefab.name.clone(),
            footprint: prefab.footprint,
            scale: prefab.scale,
            active: false,
            lane: 0,
            position: Point3d::origin(),
            velocity: Vector3d::new(0.0, 0.0, 0.0),
            follow: FollowController::new(),
        }
    }

    /// Gets the entity's ID.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The pool the entity belongs to.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The index of the entity's prefab within its category,
    /// or `None` for generic entities.
    pub fn unique_index(&self) -> Option<usize> {
        self.unique_index
    }

    /// The name of the prefab the entity was created from.
    pub fn prefab(&self) -> &str {
        &self.prefab
    }

    /// The physical bounding shape.
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// Whether the entity is currently in the world.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The index of the lane the entity is assigned to.
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// The direction of travel.
    pub fn heading(&self) -> Heading {
        self.follow.heading()
    }

    /// World space position of the entity's origin.
    pub fn position(&self) -> Point3d {
        self.position
    }

    /// The axial coordinate of the entity.
    pub fn axial(&self) -> f64 {
        self.position.z
    }

    /// World space velocity in m/s.
    pub fn velocity(&self) -> Vector3d {
        self.velocity
    }

    /// The car following controller.
    pub fn controller(&self) -> &FollowController {
        &self.follow
    }

    /// The vertical coordinate at which the entity rests on a road at `road_y`.
    pub fn grounded_y(&self, road_y: f64) -> f64 {
        self.footprint.grounded_y(self.scale, road_y)
    }

    /// Places the entity in the world at rest.
    pub(crate) fn activate(&mut self, lane_idx: usize, lane: Lane, y: f64, z: f64) {
        self.active = true;
        self.lane = lane_idx;
        self.position = Point3d::new(lane.offset, y, z);
        self.velocity = Vector3d::new(0.0, 0.0, 0.0);
    }

    /// Hands the entity a heading and cruise speed, with the sensor disabled until `now + grace`.
    pub(crate) fn assign(&mut self, heading: Heading, target_speed: f64, now: f64, grace: f64) {
        self.follow.assign(heading, target_speed, now, grace);
    }

    /// Removes the entity from the world.
    pub(crate) fn deactivate(&mut self) {
        self.active = false;
        self.velocity = Vector3d::new(0.0, 0.0, 0.0);
    }

    /// The entity's collider for obstacle detection.
    pub fn collider(&self) -> Collider {
        let [lateral, vertical, axial] = self.footprint.bounds(self.scale, self.position.to_vec());
        Collider {
            owner: Some(self.id),
            layer: layers::TRAFFIC,
            lateral,
            vertical,
            axial,
            axial_velocity: Some(self.velocity.z),
        }
    }

    /// Runs the car following control law for one step and writes the new velocity.
    pub(crate) fn drive(
        &mut self,
        params: &FollowParams,
        lane_offset: f64,
        now: f64,
        dt: f64,
        sensor: &dyn ObstacleSensor,
    ) -> Vector3d {
        let vel = self.velocity.z;
        let blocked = self.follow.is_sensing(now) && {
            let probe = self.follow.probe(params, self.id, self.position, vel);
            #[cfg(feature = "debug")]
            crate::debug::debug_ray("probe", probe.origin, probe.heading.sign() * probe.max_length);
            let hit = sensor.probe(&probe);
            self.follow.is_blocking(params, self.id, vel, hit)
        };
        let axial = self.follow.axial_velocity(params, vel, blocked, dt);
        let lateral = FollowController::lateral_velocity(params, self.position.x, lane_offset, dt);
        self.velocity = Vector3d::new(lateral, 0.0, axial);
        self.velocity
    }

    /// Integrates the entity's position.
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.position += dt * self.velocity;
    }
}
