use crate::density::DensityCurve;
use crate::entity::FollowParams;
use crate::lane::Heading;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The settings of a [TrafficSystem](crate::TrafficSystem).
///
/// Unusual combinations (probabilities summing above one, empty pools, a
/// degenerate speed range) reduce or stop traffic rather than failing.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrafficConfig {
    /// The lateral coordinate of each lane centre in m.
    pub lane_offsets: Vec<f64>,
    /// The direction of travel of each lane.
    pub lane_headings: Vec<Heading>,
    /// The height of the road surface in m.
    pub road_y: f64,
    /// The number of generic entities to create.
    pub generic_pool_size: usize,
    /// The probability of choosing a generic entity.
    pub p_generic: f64,
    /// The probability of choosing a heavy vehicle.
    /// Characters get the remaining probability.
    pub p_heavy: f64,
    /// How far ahead of the reference point to spawn, in m.
    pub ahead: f64,
    /// How far behind the reference point entities are kept, in m.
    pub behind: f64,
    /// Extra distance beyond `ahead` before entities are despawned, in m.
    pub extra_ahead_despawn: f64,
    /// Whether spawns get denser as the reference point travels.
    pub dynamic_density: bool,
    /// The spawn step when `dynamic_density` is off, in m.
    pub spawn_step: f64,
    /// The distance travelled at which density peaks, in m.
    pub distance_for_max_density: f64,
    /// The spawn step at the start, in m.
    pub max_spawn_step: f64,
    /// The spawn step at peak density, in m.
    pub min_spawn_step: f64,
    /// The minimum gap between spawns on a lane, in m.
    pub min_gap: f64,
    /// The minimum gap before a heavy vehicle spawn, in m.
    pub min_gap_heavy: f64,
    /// The lowest cruise speed in m/s.
    pub min_speed: f64,
    /// The highest cruise speed in m/s.
    pub max_speed: f64,
    /// The car following parameters.
    pub follow: FollowParams,
    /// Seed for the random number generator; random when `None`.
    pub seed: Option<u64>,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            lane_offsets: vec![-1.625, 1.625],
            lane_headings: vec![Heading::Oncoming, Heading::Forward],
            road_y: 0.2,
            generic_pool_size: 30,
            p_generic: 0.75,
            p_heavy: 0.10,
            ahead: 120.0,
            behind: 40.0,
            extra_ahead_despawn: 20.0,
            dynamic_density: true,
            spawn_step: 12.0,
            distance_for_max_density: 3000.0,
            max_spawn_step: 18.0,
            min_spawn_step: 8.0,
            min_gap: 25.0,
            min_gap_heavy: 40.0,
            min_speed: 10.0,
            max_speed: 28.0,
            follow: FollowParams::default(),
            seed: None,
        }
    }
}

impl TrafficConfig {
    /// Parses a configuration from JSON. Missing fields take their default values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, crate::ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The density curve described by this configuration.
    pub fn density(&self) -> DensityCurve {
        if self.dynamic_density {
            DensityCurve::dynamic(
                self.distance_for_max_density,
                self.max_spawn_step,
                self.min_spawn_step,
            )
        } else {
            DensityCurve::fixed(self.spawn_step)
        }
    }
}
