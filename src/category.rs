use crate::math::clamp01;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a traffic entity, which determines its pool and spacing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Category {
    /// Interchangeable entities reused round-robin.
    Generic,
    /// Heavy vehicles; at most one active instance per prefab.
    HeavyVehicle,
    /// Special characters; at most one active instance per prefab.
    Character,
}

impl Category {
    /// All categories, in weighted draw order.
    pub const ALL: [Category; 3] = [
        Category::Generic,
        Category::HeavyVehicle,
        Category::Character,
    ];

    /// Whether only one instance per prefab may be active at a time.
    pub fn is_unique(self) -> bool {
        !matches!(self, Category::Generic)
    }

    /// The categories to try, in order, when this one has nothing available.
    pub fn fallbacks(self) -> [Category; 2] {
        match self {
            Category::Generic => [Category::HeavyVehicle, Category::Character],
            Category::HeavyVehicle => [Category::Generic, Category::Character],
            Category::Character => [Category::HeavyVehicle, Category::Generic],
        }
    }
}

/// A cumulative weight table used to pick a [Category] with a single uniform draw.
///
/// The generic and heavy probabilities are each clamped to [0, 1] and the character
/// probability is the clamped complement. When the first two sum above one the
/// weights are not renormalised, so characters are starved in that case.
#[derive(Clone, Copy, Debug)]
pub struct CategoryTable {
    cumulative: [f64; 3],
}

impl CategoryTable {
    /// Creates the table from the generic and heavy vehicle probabilities.
    pub fn new(p_generic: f64, p_heavy: f64) -> Self {
        let p_generic = clamp01(p_generic);
        let p_heavy = clamp01(p_heavy);
        let p_character = clamp01(1.0 - p_generic - p_heavy);
        Self {
            cumulative: [
                p_generic,
                p_generic + p_heavy,
                p_generic + p_heavy + p_character,
            ],
        }
    }

    /// The effective probability of each category, in [Category::ALL] order.
    pub fn weights(&self) -> [f64; 3] {
        let c = &self.cumulative;
        [c[0], c[1] - c[0], c[2] - c[1]]
    }

    /// Picks the first category whose cumulative weight exceeds `draw`,
    /// where `draw` is uniform in [0, 1).
    pub fn pick(&self, draw: f64) -> Option<Category> {
        self.cumulative
            .iter()
            .position(|&cum| draw < cum)
            .map(|idx| Category::ALL[idx])
    }
}
