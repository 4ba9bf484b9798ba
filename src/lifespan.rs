use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CensusError, Result};

/// A person's birth and death as offsets from the first year of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifespan {
    pub birth: i64,
    pub death: i64,
}

impl Lifespan {
    pub fn new(birth: i64, death: i64) -> Self {
        Self { birth, death }
    }

    pub fn is_alive_in(&self, offset: i64) -> bool {
        self.birth <= offset && offset <= self.death
    }
}

/// One cycle's population. Rebuilt every cycle, never retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    lifespans: Vec<Lifespan>,
}

impl Dataset {
    pub fn from_lifespans(lifespans: Vec<Lifespan>) -> Self {
        Self { lifespans }
    }

    pub fn len(&self) -> usize {
        self.lifespans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lifespans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Lifespan> {
        self.lifespans.iter()
    }
}

impl FromIterator<Lifespan> for Dataset {
    fn from_iter<I: IntoIterator<Item = Lifespan>>(iter: I) -> Self {
        Self {
            lifespans: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Lifespan;
    type IntoIter = std::slice::Iter<'a, Lifespan>;

    fn into_iter(self) -> Self::IntoIter {
        self.lifespans.iter()
    }
}

/// Draws `people` random lifespans over `year_range` offsets.
///
/// Births never land on the last offset: a birth is drawn from
/// `0..=year_range - 2` and the death from `birth..=year_range - 1`.
pub fn generate<R: Rng>(people: usize, year_range: usize, rng: &mut R) -> Result<Dataset> {
    if year_range < 2 {
        return Err(CensusError::invalid(format!(
            "year range must span at least 2 years, got {year_range}"
        )));
    }

    let last = (year_range - 1) as i64;
    Ok((0..people)
        .map(|_| {
            let birth = rng.gen_range(0..=last - 1);
            let death = rng.gen_range(birth..=last);
            Lifespan::new(birth, death)
        })
        .collect())
}
