//! Mapping of a year series onto chart coordinates.
//!
//! Everything here is a pure function of its inputs: the same series, peak and
//! bounds always land on the same pixels.

use serde::{Deserialize, Serialize};

use crate::peak::PeakResult;
use crate::series::YearSeries;

/// Pixel rectangle the chart is drawn in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

/// Inclusive first and last calendar year of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearLimits {
    pub min: i32,
    pub max: i32,
}

impl YearLimits {
    pub fn year_range(&self) -> usize {
        (self.max as i64 - self.min as i64).max(0) as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub x_frac: f64,
    pub y_frac: f64,
    pub x: f64,
    pub y: f64,
    pub highlighted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub min_year: i32,
    pub mid_year: i32,
    pub max_year: i32,
    pub min_people: u32,
    pub mid_people: u32,
    pub max_people: u32,
}

/// Pixel anchors for the axis labels: year labels sit at the left, middle and
/// right of the plot, people labels at its bottom, middle and top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisAnchors {
    pub year_x: [f64; 3],
    pub people_y: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub points: Vec<ChartPoint>,
    pub labels: AxisLabels,
    pub anchors: AxisAnchors,
}

pub fn map_to_chart(
    series: &YearSeries,
    peak: &PeakResult,
    bounds: &ChartBounds,
    padding: f64,
    limits: &YearLimits,
) -> ChartData {
    let inner_width = bounds.width - 2.0 * padding;
    let inner_height = bounds.height - 2.0 * padding;
    let year_range = series.len();

    let points = series
        .iter()
        .enumerate()
        .map(|(offset, count)| {
            let x_frac = clamp01(offset as f64 / year_range as f64);
            let y_frac = if peak.count == 0 {
                0.0
            } else {
                clamp01(count as f64 / peak.count as f64)
            };
            ChartPoint {
                x_frac,
                y_frac,
                x: inner_width * x_frac + bounds.min_x,
                y: inner_height * y_frac + bounds.min_y,
                highlighted: offset == peak.year_offset,
            }
        })
        .collect();

    let labels = AxisLabels {
        min_year: limits.min,
        mid_year: ((limits.min as i64 + limits.max as i64) / 2) as i32,
        max_year: limits.max,
        min_people: 0,
        mid_people: peak.count / 2,
        max_people: peak.count,
    };

    let anchors = AxisAnchors {
        year_x: [0.0, 0.5, 1.0].map(|frac| inner_width * frac + bounds.min_x),
        people_y: [0.0, 0.5, 1.0].map(|frac| inner_height * frac + bounds.min_y),
    };

    ChartData {
        points,
        labels,
        anchors,
    }
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peak::find_peak;

    const BOUNDS: ChartBounds = ChartBounds {
        min_x: 5.0,
        min_y: 20.0,
        width: 120.0,
        height: 70.0,
    };

    const LIMITS: YearLimits = YearLimits {
        min: 1900,
        max: 1905,
    };

    fn series(counts: &[u32]) -> YearSeries {
        YearSeries::from(counts.to_vec())
    }

    #[test]
    fn points_scale_against_peak() {
        let s = series(&[1, 2, 3, 2, 0]);
        let peak = find_peak(&s);
        let chart = map_to_chart(&s, &peak, &BOUNDS, 10.0, &LIMITS);

        assert_eq!(chart.points.len(), 5);
        let third = chart.points[2];
        assert!(third.highlighted);
        assert_eq!(third.y_frac, 1.0);
        assert!((third.x_frac - 0.4).abs() < 1e-12);
        // inner area is 100 x 50
        assert!((third.x - (100.0 * 0.4 + 5.0)).abs() < 1e-9);
        assert!((third.y - (50.0 + 20.0)).abs() < 1e-9);

        let first = chart.points[0];
        assert!(!first.highlighted);
        assert_eq!(first.x, 5.0);
        assert!((first.y_frac - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(chart.points[4].y, 20.0);
        assert_eq!(chart.points.iter().filter(|p| p.highlighted).count(), 1);
    }

    #[test]
    fn zero_peak_flattens_every_point() {
        let s = series(&[0, 0, 0, 0]);
        let chart = map_to_chart(&s, &PeakResult::default(), &BOUNDS, 10.0, &LIMITS);
        assert!(chart.points.iter().all(|p| p.y_frac == 0.0 && p.y == 20.0));
        assert!(chart.points[0].highlighted);
    }

    #[test]
    fn empty_series_has_no_points() {
        let chart = map_to_chart(
            &YearSeries::default(),
            &PeakResult::default(),
            &BOUNDS,
            0.0,
            &LIMITS,
        );
        assert!(chart.points.is_empty());
        assert_eq!(chart.labels.max_people, 0);
    }

    #[test]
    fn labels_follow_limits_and_peak() {
        let s = series(&[4, 7, 1]);
        let peak = find_peak(&s);
        let limits = YearLimits {
            min: 1900,
            max: 2001,
        };
        let chart = map_to_chart(&s, &peak, &BOUNDS, 10.0, &limits);

        assert_eq!(
            chart.labels,
            AxisLabels {
                min_year: 1900,
                mid_year: 1950,
                max_year: 2001,
                min_people: 0,
                mid_people: 3,
                max_people: 7,
            }
        );
        assert_eq!(chart.anchors.year_x, [5.0, 55.0, 105.0]);
        assert_eq!(chart.anchors.people_y, [20.0, 45.0, 70.0]);
    }

    #[test]
    fn mapping_is_repeatable() {
        let s = series(&[3, 9, 9, 2, 5]);
        let peak = find_peak(&s);
        let first = map_to_chart(&s, &peak, &BOUNDS, 4.0, &LIMITS);
        let second = map_to_chart(&s, &peak, &BOUNDS, 4.0, &LIMITS);
        assert_eq!(first, second);
    }

    #[test]
    fn counts_above_peak_are_clamped() {
        let s = series(&[10, 2]);
        let peak = PeakResult {
            year_offset: 1,
            count: 2,
        };
        let chart = map_to_chart(&s, &peak, &BOUNDS, 0.0, &LIMITS);
        assert_eq!(chart.points[0].y_frac, 1.0);
    }

    #[test]
    fn year_range_from_limits() {
        assert_eq!(LIMITS.year_range(), 5);
        assert_eq!(YearLimits { min: 5, max: 2 }.year_range(), 0);
    }
}
