use serde::{Deserialize, Serialize};

use crate::series::YearSeries;

/// Busiest year offset and how many people were alive in it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakResult {
    pub year_offset: usize,
    pub count: u32,
}

/// First offset holding the maximum count; `(0, 0)` when nobody is alive.
pub fn find_peak(series: &YearSeries) -> PeakResult {
    let mut peak = PeakResult::default();
    for (offset, count) in series.iter().enumerate() {
        if count > peak.count {
            peak = PeakResult {
                year_offset: offset,
                count,
            };
        }
    }
    peak
}
