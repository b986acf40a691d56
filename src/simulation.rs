use crate::catalog::PrefabCatalog;
use crate::category::CategoryTable;
#[cfg(feature = "debug")]
use crate::debug::{debug_line, take_debug_frame};
use crate::density::DensityCurve;
use crate::entity::TrafficEntity;
use crate::error::ConfigError;
use crate::lane::LaneState;
use crate::math::{Point3d, Vector3d};
use crate::pool::PoolRegistry;
use crate::sensor::{ObstacleSensor, TrafficSnapshot};
use crate::sink::EntitySink;
use crate::util::Interval;
use crate::{Category, EntityId, EntitySet, TrafficConfig};
use log::{debug, trace, warn};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

/// Procedural traffic around a moving reference point.
///
/// Each step, entities are spawned from the pools into a window ahead of the
/// reference point, despawned once they leave the window, and driven by
/// their car following controllers.
pub struct TrafficSystem {
    /// The configuration.
    config: TrafficConfig,
    /// Every entity ever created, active or not.
    entities: EntitySet,
    /// The inactive entities available to spawn.
    pools: PoolRegistry,
    /// The entities currently in the world, in spawn order.
    active: Vec<EntityId>,
    /// The lanes and the last spawn position on each.
    lanes: LaneState,
    /// Maps distance travelled to the spawn step.
    density: DensityCurve,
    /// Weighted category choice.
    categories: CategoryTable,
    /// The distribution of cruise speeds.
    speeds: Uniform<f64>,
    /// The random number generator.
    rng: SmallRng,
    /// The axial coordinate of the reference point at creation.
    origin_z: f64,
    /// The axial coordinate of the next spawn attempt.
    next_spawn_z: f64,
    /// The axial distance of the reference point from its origin, in m.
    distance: f64,
    /// The simulation time in s.
    time: f64,
    /// The current frame of simulation.
    frame: usize,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl TrafficSystem {
    /// Creates the traffic system and instantiates every pooled entity in an inactive state.
    ///
    /// # Parameters
    /// * `config` - The configuration
    /// * `catalog` - The prefabs of each category
    /// * `reference` - The starting position of the reference point
    pub fn new(
        config: TrafficConfig,
        catalog: &PrefabCatalog,
        reference: Point3d,
    ) -> Result<Self, ConfigError> {
        let lanes = LaneState::new(&config.lane_offsets, &config.lane_headings)?;
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        let mut entities = EntitySet::with_key();
        let mut pools = PoolRegistry::new();

        // One instance per unique prefab
        for category in [Category::Character, Category::HeavyVehicle] {
            for (idx, prefab) in catalog.prefabs(category).iter().enumerate() {
                let id = entities
                    .insert_with_key(|id| TrafficEntity::new(id, category, Some(idx), prefab));
                pools.register(category, id);
            }
        }

        // Generic copies of randomly chosen prefabs
        let generic = catalog.prefabs(Category::Generic);
        if generic.is_empty() && config.generic_pool_size > 0 {
            warn!("no generic prefabs, the generic pool will be empty");
        }
        for _ in 0..config.generic_pool_size {
            let Some(prefab) = generic.choose(&mut rng) else {
                break;
            };
            let id = entities
                .insert_with_key(|id| TrafficEntity::new(id, Category::Generic, None, prefab));
            pools.register(Category::Generic, id);
        }

        let speeds = speed_range(config.min_speed, config.max_speed);
        debug!(
            "created {} traffic entities on {} lanes",
            entities.len(),
            lanes.len()
        );

        Ok(Self {
            density: config.density(),
            categories: CategoryTable::new(config.p_generic, config.p_heavy),
            speeds: Uniform::new_inclusive(speeds.min, speeds.max),
            config,
            entities,
            pools,
            active: vec![],
            lanes,
            rng,
            origin_z: reference.z,
            next_spawn_z: reference.z,
            distance: 0.0,
            time: 0.0,
            frame: 0,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// Advances the simulation by `dt` seconds: spawns and despawns entities,
    /// runs every active controller against the current world, and integrates positions.
    pub fn step(&mut self, dt: f64, reference: Point3d, sink: &mut impl EntitySink) {
        self.tick(dt, reference, sink);
        let snapshot = self.snapshot();
        self.update_controllers(dt, &snapshot, sink);
        self.integrate(dt, sink);

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Fills the window ahead of the reference point with spawns,
    /// then despawns entities that have left the window.
    pub fn tick(&mut self, dt: f64, reference: Point3d, sink: &mut impl EntitySink) {
        self.time += f64::max(dt, 0.0);
        self.frame += 1;
        self.distance = (reference.z - self.origin_z).abs();
        let step = self.density.step(self.distance);

        // Attempts behind the window would be despawned straight away
        self.next_spawn_z = f64::max(self.next_spawn_z, reference.z - self.config.behind);

        let front = reference.z + self.config.ahead;
        while self.next_spawn_z < front {
            self.try_spawn_at(self.next_spawn_z, sink);
            self.next_spawn_z += step;
        }

        self.despawn_outside(reference, sink);
    }

    /// Runs the car following controller of every active entity and writes their velocities.
    /// All controllers probe the same `sensor`.
    pub fn update_controllers(
        &mut self,
        dt: f64,
        sensor: &dyn ObstacleSensor,
        sink: &mut impl EntitySink,
    ) {
        let params = self.config.follow;
        for &id in &self.active {
            let entity = &mut self.entities[id];
            let lane_offset = self.lanes.lane(entity.lane()).offset;
            let vel = entity.drive(&params, lane_offset, self.time, dt, sensor);
            sink.set_velocity(id, vel);
        }
    }

    /// Moves every active entity by its velocity.
    /// Hosts that run their own physics use [Self::tick] and [Self::update_controllers] instead.
    pub fn integrate(&mut self, dt: f64, sink: &mut impl EntitySink) {
        for &id in &self.active {
            let entity = &mut self.entities[id];
            entity.integrate(dt);
            sink.set_transform(id, entity.position(), entity.heading());
        }
    }

    /// Captures the colliders of all active entities.
    pub fn snapshot(&self) -> TrafficSnapshot {
        let mut snapshot = TrafficSnapshot::new();
        snapshot.extend(self.iter_active().map(|entity| entity.collider()));
        snapshot
    }

    /// Gets the current simulation frame index.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// The simulation time in s.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The configuration.
    pub fn config(&self) -> &TrafficConfig {
        &self.config
    }

    /// The lanes.
    pub fn lanes(&self) -> &LaneState {
        &self.lanes
    }

    /// The axial distance of the reference point from where it started, as of the last tick.
    pub fn distance_traveled(&self) -> f64 {
        self.distance
    }

    /// The current axial distance between spawn attempts.
    pub fn spawn_step(&self) -> f64 {
        self.density.step(self.distance)
    }

    /// The axial coordinate of the next spawn attempt.
    pub fn next_spawn_z(&self) -> f64 {
        self.next_spawn_z
    }

    /// The number of entities in the world.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The number of entities of a category waiting in their pool.
    pub fn available_count(&self, category: Category) -> usize {
        self.pools.available(category)
    }

    /// The number of entities of a category created.
    pub fn total_count(&self, category: Category) -> usize {
        self.pools.total(category)
    }

    /// Returns an iterator over the entities in the world.
    pub fn iter_active(&self) -> impl Iterator<Item = &TrafficEntity> {
        self.active.iter().map(|id| &self.entities[*id])
    }

    /// Returns an iterator over all the entities, active or not.
    pub fn iter_entities(&self) -> impl Iterator<Item = &TrafficEntity> {
        self.entities.values()
    }

    /// Gets a reference to the entity with the given ID.
    pub fn get_entity(&self, id: EntityId) -> &TrafficEntity {
        &self.entities[id]
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }

    /// The minimum gap on a lane before spawning an entity of the category.
    fn gap(&self, category: Category) -> f64 {
        match category {
            Category::HeavyVehicle => self.config.min_gap_heavy,
            _ => self.config.min_gap,
        }
    }

    /// Attempts to spawn an entity at `z`. Fails silently if no lane has room
    /// or no suitable entity is available.
    fn try_spawn_at(&mut self, z: f64, sink: &mut impl EntitySink) -> Option<EntityId> {
        if self.lanes.is_empty() {
            return None;
        }

        let lane = self.rng.gen_range(0..self.lanes.len());
        let want = self.categories.pick(self.rng.gen::<f64>())?;

        let Some((id, lane)) = self.take_entity(want, lane, z) else {
            trace!("no {:?} spawn at z = {:.1}", want, z);
            return None;
        };
        let category = self.entities[id].category();

        let lane_info = self.lanes.lane(lane);
        let target_speed = self.speeds.sample(&mut self.rng);
        let grace = self.config.follow.spawn_grace;

        let entity = &mut self.entities[id];
        let y = entity.grounded_y(self.config.road_y);
        entity.activate(lane, lane_info, y, z);
        entity.assign(lane_info.heading, target_speed, self.time, grace);

        sink.set_transform(id, entity.position(), lane_info.heading);
        sink.set_velocity(id, Vector3d::new(0.0, 0.0, 0.0));
        sink.set_active(id, true);

        #[cfg(feature = "debug")]
        debug_line(
            "spawn",
            entity.position(),
            entity.position() + Vector3d::new(0.0, 0.7, 0.0),
        );
        debug!(
            "spawned {} ({:?}) on lane {} at z = {:.1}, cruising at {:.1} m/s",
            entity.prefab(),
            category,
            lane,
            z,
            target_speed
        );

        self.lanes.record_spawn(lane, z);
        self.active.push(id);
        Some(id)
    }

    /// Takes an entity for a spawn at `z`, preferring category `want`
    /// and falling back to the other categories in a fixed order.
    /// Returns the entity with the lane that has room for its category.
    fn take_entity(&mut self, want: Category, lane: usize, z: f64) -> Option<(EntityId, usize)> {
        let fitted = self.lanes.fit(lane, z, self.gap(want))?;
        if let Some(id) = self.pools.take(want, &mut self.rng) {
            return Some((id, fitted));
        }
        let (category, fitted) = want.fallbacks().into_iter().find_map(|category| {
            if !self.pools.has_available(category) {
                return None;
            }
            let fitted = self.lanes.fit(lane, z, self.gap(category))?;
            Some((category, fitted))
        })?;
        let id = self.pools.take(category, &mut self.rng)?;
        Some((id, fitted))
    }

    /// Despawns every entity outside the window around the reference point.
    fn despawn_outside(&mut self, reference: Point3d, sink: &mut impl EntitySink) {
        let window = Interval::new(
            reference.z - self.config.behind,
            reference.z + self.config.ahead + self.config.extra_ahead_despawn,
        );
        let mut idx = self.active.len();
        while idx > 0 {
            idx -= 1;
            let id = self.active[idx];
            if !window.contains(self.entities[id].axial()) {
                self.active.remove(idx);
                self.despawn(id, sink);
            }
        }
    }

    /// Removes an entity from the world and returns it to its pool.
    fn despawn(&mut self, id: EntityId, sink: &mut impl EntitySink) {
        let entity = &mut self.entities[id];
        entity.deactivate();
        sink.set_active(id, false);
        debug!(
            "despawned {} ({:?}) at z = {:.1}",
            entity.prefab(),
            entity.category(),
            entity.axial()
        );
        self.pools.release(entity.category(), id);
    }
}

/// The range of cruise speeds. Non-finite bounds are treated as zero.
fn speed_range(min: f64, max: f64) -> Interval<f64> {
    let finite = |v: f64| if v.is_finite() { v.abs() } else { 0.0 };
    Interval::new(finite(min), finite(max)).ordered()
}
