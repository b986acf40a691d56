use crate::lane::Heading;
use crate::math::{move_towards, Point3d, Vector3d};
use crate::sensor::{layers, Probe, ProbeHit};
use crate::EntityId;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The parameters of the car following model, shared by all entities.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FollowParams {
    /// Acceleration towards the cruise speed, in m/s<sup>2</sup>.
    pub acceleration: f64,
    /// Deceleration when blocked, in m/s<sup>2</sup>.
    pub braking: f64,
    /// The lowest speed a blocked entity slows to, in m/s.
    pub min_follow_speed: f64,
    /// The lowest fraction of its cruise speed a blocked entity slows to.
    pub min_follow_ratio: f64,
    /// The minimum probe length in m.
    pub safe_distance: f64,
    /// The probe radius in m.
    pub probe_radius: f64,
    /// Seconds of travel at the current speed added to the probe length.
    pub probe_time: f64,
    /// Constant distance added to the speed-based probe length, in m.
    pub probe_margin: f64,
    /// Height of the probe origin above the entity's origin, in m.
    pub probe_height: f64,
    /// The maximum lateral speed when moving into lane, in m/s.
    pub lane_change_speed: f64,
    /// The closing speed above which an obstacle counts as blocking, in m/s.
    pub closing_epsilon: f64,
    /// Seconds after spawning during which the sensor is disabled.
    pub spawn_grace: f64,
    /// The layers the probe detects.
    pub layer_mask: u32,
}

impl Default for FollowParams {
    fn default() -> Self {
        Self {
            acceleration: 8.0,
            braking: 12.0,
            min_follow_speed: 6.0,
            min_follow_ratio: 0.55,
            safe_distance: 18.0,
            probe_radius: 0.6,
            probe_time: 0.8,
            probe_margin: 8.0,
            probe_height: 0.5,
            lane_change_speed: 6.0,
            closing_epsilon: 0.1,
            spawn_grace: 0.5,
            layer_mask: layers::TRAFFIC,
        }
    }
}

/// The longitudinal and lateral control law of a single entity.
#[derive(Clone, Debug)]
pub struct FollowController {
    /// The cruise speed in m/s, always positive.
    target_speed: f64,
    /// The direction of travel.
    heading: Heading,
    /// The simulation time from which the sensor is enabled, in s.
    sensor_enabled_at: f64,
    /// Whether an obstacle was blocking during the last update.
    blocked: bool,
}

impl FollowController {
    /// Creates a controller for an entity that has not been assigned a lane yet.
    pub(crate) fn new() -> Self {
        Self {
            target_speed: 0.0,
            heading: Heading::Forward,
            sensor_enabled_at: 0.0,
            blocked: false,
        }
    }

    /// Assigns a new heading and cruise speed, and disables the sensor for `grace` seconds.
    pub(crate) fn assign(&mut self, heading: Heading, target_speed: f64, now: f64, grace: f64) {
        self.heading = heading;
        self.target_speed = target_speed.abs();
        self.sensor_enabled_at = now + f64::max(grace, 0.0);
        self.blocked = false;
    }

    /// The cruise speed in m/s.
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    /// The direction of travel.
    pub fn heading(&self) -> Heading {
        self.heading
    }

    /// Whether an obstacle was blocking during the last update.
    pub fn blocked(&self) -> bool {
        self.blocked
    }

    /// Whether the sensor is enabled at time `now`.
    pub fn is_sensing(&self, now: f64) -> bool {
        now >= self.sensor_enabled_at
    }

    /// The speed a blocked entity slows down to, in m/s.
    pub fn min_follow_speed(&self, params: &FollowParams) -> f64 {
        f64::max(
            params.min_follow_speed,
            self.target_speed * params.min_follow_ratio,
        )
    }

    /// Builds the forward probe for an entity at `position` moving at axial velocity `vel`.
    pub fn probe(&self, params: &FollowParams, id: EntityId, position: Point3d, vel: f64) -> Probe {
        let sign = self.heading.sign();
        let ahead = params.probe_radius + 0.25;
        Probe {
            origin: position + Vector3d::new(0.0, params.probe_height, sign * ahead),
            heading: self.heading,
            radius: params.probe_radius,
            max_length: f64::max(
                params.safe_distance,
                vel.abs() * params.probe_time + params.probe_margin,
            ),
            layer_mask: params.layer_mask,
            exclude: Some(id),
        }
    }

    /// Decides whether a probe hit blocks an entity moving at axial velocity `vel`.
    ///
    /// Only a different entity that is being caught up with blocks. A hit without
    /// a body is assumed to move at this entity's cruise velocity.
    pub fn is_blocking(
        &self,
        params: &FollowParams,
        id: EntityId,
        vel: f64,
        hit: Option<ProbeHit>,
    ) -> bool {
        let Some(hit) = hit else {
            return false;
        };
        if hit.owner == Some(id) {
            return false;
        }
        let sign = self.heading.sign();
        let leader_vel = hit.axial_velocity.unwrap_or(sign * self.target_speed);
        let closing = (vel - leader_vel) * sign;
        closing > params.closing_epsilon
    }

    /// Computes the next axial velocity.
    pub fn axial_velocity(&mut self, params: &FollowParams, vel: f64, blocked: bool, dt: f64) -> f64 {
        self.blocked = blocked;
        let sign = self.heading.sign();
        let vel = if blocked {
            let min_vel = sign * self.min_follow_speed(params);
            move_towards(vel, min_vel, params.braking * dt)
        } else {
            move_towards(vel, sign * self.target_speed, params.acceleration * dt)
        };
        match self.heading {
            Heading::Forward => f64::max(vel, 0.0),
            Heading::Oncoming => f64::min(vel, 0.0),
        }
    }

    /// Computes the lateral velocity which moves the entity from `x` towards `lane_x`.
    pub fn lateral_velocity(params: &FollowParams, x: f64, lane_x: f64, dt: f64) -> f64 {
        if dt <= 0.0 {
            return 0.0;
        }
        let max = params.lane_change_speed.abs();
        ((lane_x - x) / dt).clamp(-max, max)
    }
}
