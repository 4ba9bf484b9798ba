use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CensusError, Result};
use crate::lifespan::{Dataset, Lifespan};

/// Alive-count per year offset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct YearSeries(Vec<u32>);

impl YearSeries {
    pub fn zeros(year_range: usize) -> Self {
        Self(vec![0; year_range])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, offset: usize) -> Option<u32> {
        self.0.get(offset).copied()
    }

    pub fn counts(&self) -> &[u32] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }
}

impl From<Vec<u32>> for YearSeries {
    fn from(counts: Vec<u32>) -> Self {
        Self(counts)
    }
}

/// Counts how many people are alive in every year offset.
///
/// Runs as a difference array: +1 at each birth, -1 just past each death,
/// then a prefix sum. Any lifespan outside `0..year_range` (or ending before it
/// starts) aborts the sweep.
pub fn aggregate(dataset: &Dataset, year_range: usize) -> Result<YearSeries> {
    let mut deltas = vec![0_i64; year_range + 1];
    for (index, span) in dataset.iter().enumerate() {
        check_bounds(index, span, year_range)?;
        deltas[span.birth as usize] += 1;
        deltas[span.death as usize + 1] -= 1;
    }

    let mut alive = 0_i64;
    let counts = deltas[..year_range]
        .iter()
        .map(|delta| {
            alive += delta;
            alive as u32
        })
        .collect();
    Ok(YearSeries(counts))
}

/// Reference sweep that increments every year of every lifespan.
pub fn aggregate_naive(dataset: &Dataset, year_range: usize) -> Result<YearSeries> {
    let mut series = YearSeries::zeros(year_range);
    for (index, span) in dataset.iter().enumerate() {
        check_bounds(index, span, year_range)?;
        for year in span.birth as usize..=span.death as usize {
            series.0[year] += 1;
        }
    }
    Ok(series)
}

fn check_bounds(index: usize, span: &Lifespan, year_range: usize) -> Result<()> {
    if span.birth < 0 || span.death < span.birth || span.death >= year_range as i64 {
        warn!(
            index,
            birth = span.birth,
            death = span.death,
            year_range,
            "rejecting out-of-range lifespan"
        );
        return Err(CensusError::DataIntegrity {
            index,
            birth: span.birth,
            death: span.death,
            year_range,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifespan::generate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dataset(spans: &[(i64, i64)]) -> Dataset {
        spans.iter().map(|&(b, d)| Lifespan::new(b, d)).collect()
    }

    #[test]
    fn counts_overlapping_lifespans() {
        let data = dataset(&[(0, 2), (1, 3), (2, 2)]);
        let series = aggregate(&data, 5).unwrap();
        assert_eq!(series.counts(), &[1, 2, 3, 2, 0]);
    }

    #[test]
    fn empty_dataset_gives_zeros() {
        let series = aggregate(&Dataset::default(), 4).unwrap();
        assert_eq!(series.counts(), &[0, 0, 0, 0]);
    }

    #[test]
    fn lifespan_reaching_last_offset_is_counted() {
        let data = dataset(&[(3, 4)]);
        let series = aggregate(&data, 5).unwrap();
        assert_eq!(series.counts(), &[0, 0, 0, 1, 1]);
    }

    #[test]
    fn difference_array_matches_naive_sweep() {
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        for (people, year_range) in [(1, 2), (10, 3), (1_000, 100), (4_321, 57)] {
            let data = generate(people, year_range, &mut rng).unwrap();
            let fast = aggregate(&data, year_range).unwrap();
            let slow = aggregate_naive(&data, year_range).unwrap();
            assert_eq!(fast, slow);
        }
    }

    #[test]
    fn every_cell_counts_the_living() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let data = generate(300, 40, &mut rng).unwrap();
        let series = aggregate(&data, 40).unwrap();
        for (offset, count) in series.iter().enumerate() {
            let expected = data.iter().filter(|s| s.is_alive_in(offset as i64)).count();
            assert_eq!(count as usize, expected);
        }
    }

    #[test]
    fn death_past_range_is_rejected() {
        let data = dataset(&[(0, 1), (2, 5)]);
        let err = aggregate(&data, 5).unwrap_err();
        match err {
            CensusError::DataIntegrity {
                index,
                birth,
                death,
                year_range,
            } => {
                assert_eq!((index, birth, death, year_range), (1, 2, 5, 5));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn negative_birth_and_inverted_spans_are_rejected() {
        for spans in [[(-1, 2)], [(3, 1)]] {
            let data = dataset(&spans);
            assert!(matches!(
                aggregate(&data, 5),
                Err(CensusError::DataIntegrity { index: 0, .. })
            ));
            assert!(matches!(
                aggregate_naive(&data, 5),
                Err(CensusError::DataIntegrity { index: 0, .. })
            ));
        }
    }
}
