use crate::math::{clamp01, lerp};

/// Spawn steps are never allowed below this, so the spawn frontier always advances.
const MIN_STEP: f64 = 0.1; // m

/// Maps distance travelled to the axial distance between spawn attempts.
#[derive(Clone, Copy, Debug)]
pub struct DensityCurve {
    /// Whether the step shrinks as the reference point travels.
    dynamic: bool,
    /// The step used when `dynamic` is false, in m.
    fixed_step: f64,
    /// The distance travelled at which density peaks, in m.
    distance_for_max: f64,
    /// The step at zero distance (sparse), in m.
    max_step: f64,
    /// The step at peak density, in m.
    min_step: f64,
}

impl DensityCurve {
    /// Creates a density curve that interpolates from `max_step` to `min_step`.
    pub fn dynamic(distance_for_max: f64, max_step: f64, min_step: f64) -> Self {
        Self {
            dynamic: true,
            fixed_step: max_step,
            distance_for_max: f64::max(1.0, distance_for_max),
            max_step,
            min_step: f64::min(min_step, max_step),
        }
    }

    /// Creates a density curve with a constant step.
    pub fn fixed(step: f64) -> Self {
        Self {
            dynamic: false,
            fixed_step: step,
            distance_for_max: 1.0,
            max_step: step,
            min_step: step,
        }
    }

    /// The density factor in [0, 1]: 0 is sparse, 1 is dense.
    pub fn factor(&self, distance_traveled: f64) -> f64 {
        clamp01(distance_traveled / self.distance_for_max)
    }

    /// The axial distance between consecutive spawn attempts.
    pub fn step(&self, distance_traveled: f64) -> f64 {
        let step = if self.dynamic {
            lerp(self.max_step, self.min_step, self.factor(distance_traveled))
        } else {
            self.fixed_step
        };
        if step.is_nan() {
            MIN_STEP
        } else {
            f64::max(step, MIN_STEP)
        }
    }
}
