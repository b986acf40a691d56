use crate::entity::Footprint;
use crate::math::Vector3d;
use crate::Category;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A template from which traffic entities are instantiated.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Prefab {
    /// A name used in logs and by the host to pick a visual.
    pub name: String,
    /// The physical bounding shape.
    pub footprint: Footprint,
    /// The world scale applied to the footprint.
    pub scale: Vector3d,
}

impl Prefab {
    /// Creates a prefab with a box footprint resting on its origin and unit scale.
    pub fn with_box(name: &str, width: f64, height: f64, length: f64) -> Self {
        Self {
            name: name.to_owned(),
            footprint: Footprint::Box {
                size: Vector3d::new(width, height, length),
                center: Vector3d::new(0.0, 0.0, 0.0),
            },
            scale: Vector3d::new(1.0, 1.0, 1.0),
        }
    }
}

/// The prefabs available to each category.
///
/// One entity is created per character and heavy vehicle prefab; the generic
/// pool is filled with copies of randomly chosen generic prefabs.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrefabCatalog {
    pub generic: Vec<Prefab>,
    pub heavy_vehicles: Vec<Prefab>,
    pub characters: Vec<Prefab>,
}

impl PrefabCatalog {
    /// The prefabs of a category.
    pub fn prefabs(&self, category: Category) -> &[Prefab] {
        match category {
            Category::Generic => &self.generic,
            Category::HeavyVehicle => &self.heavy_vehicles,
            Category::Character => &self.characters,
        }
    }
}
