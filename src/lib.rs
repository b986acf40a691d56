pub use catalog::{Prefab, PrefabCatalog};
pub use category::{Category, CategoryTable};
pub use cgmath;
pub use config::TrafficConfig;
pub use density::DensityCurve;
pub use entity::{FollowController, FollowParams, Footprint, TrafficEntity};
pub use error::ConfigError;
pub use lane::{Heading, Lane, LaneState};
pub use pool::PoolRegistry;
pub use sensor::{layers, Collider, ObstacleSensor, Probe, ProbeHit, TrafficSnapshot};
pub use simulation::TrafficSystem;
pub use sink::{ActivationCommand, EntitySink};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;

mod catalog;
mod category;
mod config;
mod debug;
mod density;
mod entity;
mod error;
mod lane;
pub mod math;
mod pool;
mod sensor;
mod simulation;
mod sink;
mod util;

new_key_type! {
    /// Unique ID of a [TrafficEntity].
    pub struct EntityId;
}

type EntitySet = SlotMap<EntityId, TrafficEntity>;
