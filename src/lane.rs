use crate::error::ConfigError;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The direction of travel along the axial coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Heading {
    /// Travels towards +z, the same way as the reference point.
    Forward,
    /// Travels towards -z, against the reference point.
    Oncoming,
}

impl Heading {
    /// The sign of the axial velocity, +1 or -1.
    pub fn sign(self) -> f64 {
        match self {
            Heading::Forward => 1.0,
            Heading::Oncoming => -1.0,
        }
    }
}

/// A single lane: a lateral offset plus a direction of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane {
    /// The lateral coordinate of the lane centre in m.
    pub offset: f64,
    /// The direction of travel.
    pub heading: Heading,
}

/// The lanes of the road, together with the axial position of the
/// most recent spawn on each lane.
#[derive(Clone, Debug)]
pub struct LaneState {
    lanes: SmallVec<[Lane; 4]>,
    last_spawn_z: SmallVec<[f64; 4]>,
}

impl LaneState {
    /// Builds the lane state from lateral offsets and per-lane headings.
    ///
    /// If `headings` does not have one entry per lane, a default is used
    /// where only the last lane travels [Heading::Forward].
    pub fn new(offsets: &[f64], headings: &[Heading]) -> Result<Self, ConfigError> {
        if offsets.is_empty() {
            return Err(ConfigError::NoLanes);
        }
        let lanes = if headings.len() == offsets.len() {
            offsets
                .iter()
                .zip(headings)
                .map(|(&offset, &heading)| Lane { offset, heading })
                .collect()
        } else {
            log::warn!(
                "{} lane headings given for {} lanes, using default headings",
                headings.len(),
                offsets.len()
            );
            let last = offsets.len() - 1;
            offsets
                .iter()
                .enumerate()
                .map(|(idx, &offset)| Lane {
                    offset,
                    heading: if idx == last {
                        Heading::Forward
                    } else {
                        Heading::Oncoming
                    },
                })
                .collect()
        };
        Ok(Self {
            lanes,
            last_spawn_z: smallvec::smallvec![f64::NEG_INFINITY; offsets.len()],
        })
    }

    /// The number of lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether there are no lanes.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Gets a lane by index.
    pub fn lane(&self, idx: usize) -> Lane {
        self.lanes[idx]
    }

    /// The lateral offsets of all lanes.
    pub fn offsets(&self) -> impl Iterator<Item = f64> + '_ {
        self.lanes.iter().map(|lane| lane.offset)
    }

    /// The lane tried when `lane` can't be used.
    pub fn fallback(&self, lane: usize) -> usize {
        (lane + 1) % self.lanes.len()
    }

    /// The axial position of the most recent spawn on the lane.
    pub fn last_spawn_z(&self, lane: usize) -> f64 {
        self.last_spawn_z[lane]
    }

    /// Records a spawn at `z` on the lane.
    pub(crate) fn record_spawn(&mut self, lane: usize, z: f64) {
        self.last_spawn_z[lane] = f64::max(self.last_spawn_z[lane], z);
    }

    /// Whether a spawn at `z` keeps at least `gap` from the previous spawn on the lane.
    pub fn has_gap(&self, lane: usize, z: f64, gap: f64) -> bool {
        z - self.last_spawn_z[lane] >= gap
    }

    /// Picks the lane to spawn on at `z`: `lane` itself if it has the gap,
    /// otherwise its fallback lane if that one does.
    pub fn fit(&self, lane: usize, z: f64, gap: f64) -> Option<usize> {
        if self.has_gap(lane, z, gap) {
            return Some(lane);
        }
        let other = self.fallback(lane);
        self.has_gap(other, z, gap).then_some(other)
    }
}
