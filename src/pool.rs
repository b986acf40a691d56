use crate::{Category, EntityId};
use rand::Rng;
use std::collections::VecDeque;

/// Tracks which pre-instantiated entities are available to spawn.
///
/// An entity handle is either held here or active in the world, never both.
#[derive(Clone, Debug, Default)]
pub struct PoolRegistry {
    /// Inactive characters, one per character prefab.
    characters: Vec<EntityId>,
    /// Inactive heavy vehicles, one per heavy vehicle prefab.
    heavy_vehicles: Vec<EntityId>,
    /// Inactive generic entities, reused in FIFO order.
    generic: VecDeque<EntityId>,
    /// The number of entities registered per category.
    totals: [usize; 3],
}

impl PoolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a newly created, inactive entity.
    pub(crate) fn register(&mut self, category: Category, id: EntityId) {
        self.totals[Self::index(category)] += 1;
        self.release(category, id);
    }

    /// The number of entities of the category currently available.
    pub fn available(&self, category: Category) -> usize {
        match category {
            Category::Generic => self.generic.len(),
            Category::HeavyVehicle => self.heavy_vehicles.len(),
            Category::Character => self.characters.len(),
        }
    }

    /// The number of entities of the category ever registered.
    pub fn total(&self, category: Category) -> usize {
        self.totals[Self::index(category)]
    }

    /// Whether any entity of the category is available.
    pub fn has_available(&self, category: Category) -> bool {
        self.available(category) > 0
    }

    /// Takes an available entity of the category.
    /// Generic entities come from the front of the queue, unique ones are picked at random.
    pub(crate) fn take(&mut self, category: Category, rng: &mut impl Rng) -> Option<EntityId> {
        match category {
            Category::Generic => self.generic.pop_front(),
            Category::HeavyVehicle => Self::take_random(&mut self.heavy_vehicles, rng),
            Category::Character => Self::take_random(&mut self.characters, rng),
        }
    }

    /// Returns a despawned entity to its pool.
    /// Releasing a unique entity that is already available has no effect.
    pub(crate) fn release(&mut self, category: Category, id: EntityId) {
        let list = match category {
            Category::Generic => return self.generic.push_back(id),
            Category::HeavyVehicle => &mut self.heavy_vehicles,
            Category::Character => &mut self.characters,
        };
        if !list.contains(&id) {
            list.push(id);
        }
    }

    fn take_random(list: &mut Vec<EntityId>, rng: &mut impl Rng) -> Option<EntityId> {
        if list.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..list.len());
        Some(list.remove(idx))
    }

    fn index(category: Category) -> usize {
        match category {
            Category::Generic => 0,
            Category::HeavyVehicle => 1,
            Category::Character => 2,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use slotmap::SlotMap;

    fn keys(n: usize) -> Vec<EntityId> {
        let mut map = SlotMap::<EntityId, ()>::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn generic_pool_is_fifo() {
        let ids = keys(3);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut pool = PoolRegistry::new();
        for id in &ids {
            pool.register(Category::Generic, *id);
        }

        let a = pool.take(Category::Generic, &mut rng).unwrap();
        assert_eq!(a, ids[0]);
        pool.release(Category::Generic, a);
        assert_eq!(pool.take(Category::Generic, &mut rng), Some(ids[1]));
        assert_eq!(pool.take(Category::Generic, &mut rng), Some(ids[2]));
        assert_eq!(pool.take(Category::Generic, &mut rng), Some(ids[0]));
        assert_eq!(pool.take(Category::Generic, &mut rng), None);
    }

    #[test]
    fn unique_release_is_idempotent() {
        let ids = keys(2);
        let mut rng = SmallRng::seed_from_u64(7);
        let mut pool = PoolRegistry::new();
        pool.register(Category::Character, ids[0]);
        pool.register(Category::Character, ids[1]);

        let a = pool.take(Category::Character, &mut rng).unwrap();
        assert_eq!(pool.available(Category::Character), 1);
        pool.release(Category::Character, a);
        pool.release(Category::Character, a);
        assert_eq!(pool.available(Category::Character), 2);
        assert_eq!(pool.total(Category::Character), 2);
    }

    #[test]
    fn unique_take_never_repeats() {
        let ids = keys(4);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut pool = PoolRegistry::new();
        for id in &ids {
            pool.register(Category::HeavyVehicle, *id);
        }
        let mut taken = (0..4)
            .map(|_| pool.take(Category::HeavyVehicle, &mut rng).unwrap())
            .collect::<Vec<_>>();
        taken.sort();
        taken.dedup();
        assert_eq!(taken.len(), 4);
        assert!(!pool.has_available(Category::HeavyVehicle));
        assert_eq!(pool.take(Category::HeavyVehicle, &mut rng), None);
    }
}
