use std::{fmt, path::PathBuf, time::Instant};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    chart::{map_to_chart, ChartData},
    error::Result,
    lifespan::generate,
    peak::{find_peak, PeakResult},
    report::ReportWriter,
    rng::SeededRng,
    scenario::{CycleConfig, Scenario},
    series::{aggregate, YearSeries},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: Option<u64>,
    pub report_interval_cycles: u64,
    pub report_dir: PathBuf,
}

impl EngineSettings {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self {
            scenario_name: scenario.name.clone(),
            seed: scenario.seed,
            report_interval_cycles: scenario.report.interval_cycles,
            report_dir: scenario.report.dir.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StageTiming {
    pub stage: &'static str,
    pub duration_ms: f64,
}

/// Everything a renderer needs from one cycle.
#[derive(Clone, Debug, Serialize)]
pub struct CycleOutput {
    pub cycle: u64,
    pub peak_year: i32,
    pub peak_count: u32,
    pub peak: PeakResult,
    pub series: YearSeries,
    pub chart: ChartData,
    pub timings: Vec<StageTiming>,
}

impl fmt::Display for CycleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Year: {} High: {}", self.peak_year, self.peak_count)
    }
}

/// Runs generate, aggregate, peak and chart once, on freshly owned data.
///
/// The year range and chart geometry are checked before anything is drawn; an
/// empty population is allowed. The returned output carries cycle number 0;
/// [`Engine`] stamps its own count.
pub fn execute_cycle<R: Rng>(config: &CycleConfig, rng: &mut R) -> Result<CycleOutput> {
    config.validate_layout()?;
    let year_range = config.year_range();
    let mut timings = Vec::with_capacity(4);

    let dataset = timed(&mut timings, "generate", || {
        generate(config.people, year_range, rng)
    })?;
    let series = timed(&mut timings, "aggregate", || aggregate(&dataset, year_range))?;
    drop(dataset);
    let peak = timed(&mut timings, "peak", || find_peak(&series));
    let chart = timed(&mut timings, "chart", || {
        map_to_chart(&series, &peak, &config.bounds, config.padding, &config.limits)
    });

    Ok(CycleOutput {
        cycle: 0,
        peak_year: config.limits.min + peak.year_offset as i32,
        peak_count: peak.count,
        peak,
        series,
        chart,
        timings,
    })
}

fn timed<T>(timings: &mut Vec<StageTiming>, stage: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let value = f();
    timings.push(StageTiming {
        stage,
        duration_ms: start.elapsed().as_secs_f64() * 1_000.0,
    });
    value
}

pub struct EngineBuilder {
    settings: EngineSettings,
    config: CycleConfig,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings, config: CycleConfig) -> Self {
        Self { settings, config }
    }

    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(EngineSettings::from_scenario(scenario), scenario.cycle_config())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = Some(seed);
        self
    }

    pub fn with_people(mut self, people: usize) -> Self {
        self.config.people = people;
        self
    }

    pub fn build(self) -> Result<Engine> {
        self.config.validate()?;
        let rng = match self.settings.seed {
            Some(seed) => SeededRng::new(seed),
            None => SeededRng::from_entropy(),
        };
        Ok(Engine {
            rng,
            reports: ReportWriter::new(
                &self.settings.report_dir,
                self.settings.report_interval_cycles,
            ),
            config: self.config,
            settings: self.settings,
            cycle: 0,
        })
    }
}

pub struct Engine {
    rng: SeededRng,
    reports: ReportWriter,
    config: CycleConfig,
    settings: EngineSettings,
    cycle: u64,
}

impl Engine {
    pub fn run_cycle(&mut self) -> Result<CycleOutput> {
        let next = self.cycle + 1;
        let mut output = execute_cycle(&self.config, self.rng.rng_mut())?;
        output.cycle = next;
        self.cycle = next;

        info!(
            scenario = %self.settings.scenario_name,
            cycle = next,
            peak_year = output.peak_year,
            peak_count = output.peak_count,
            "cycle complete"
        );
        for timing in &output.timings {
            debug!(stage = timing.stage, duration_ms = timing.duration_ms, "stage timing");
        }

        if let Some(path) = self
            .reports
            .maybe_write(&output, &self.settings.scenario_name)?
        {
            debug!(path = %path.display(), "report written");
        }
        Ok(output)
    }

    pub fn run(&mut self, cycles: u64) -> Result<()> {
        self.run_with_hook(cycles, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, cycles: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&CycleOutput),
    {
        for _ in 0..cycles {
            let output = self.run_cycle()?;
            hook(&output);
        }
        Ok(())
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycle
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartBounds, YearLimits};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(people: usize) -> CycleConfig {
        CycleConfig {
            people,
            limits: YearLimits {
                min: 1900,
                max: 2000,
            },
            bounds: ChartBounds {
                min_x: 0.0,
                min_y: 0.0,
                width: 800.0,
                height: 400.0,
            },
            padding: 10.0,
        }
    }

    fn settings() -> EngineSettings {
        EngineSettings {
            scenario_name: "unit".into(),
            seed: Some(42),
            report_interval_cycles: 0,
            report_dir: PathBuf::from("reports_unit"),
        }
    }

    #[test]
    fn cycle_output_is_consistent() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let output = execute_cycle(&config(1000), &mut rng).unwrap();

        assert_eq!(output.series.len(), 100);
        assert_eq!(output.chart.points.len(), 100);
        assert_eq!(output.peak, find_peak(&output.series));
        assert_eq!(output.peak_year, 1900 + output.peak.year_offset as i32);
        assert_eq!(output.series.get(output.peak.year_offset), Some(output.peak_count));
        assert!(output.chart.points[output.peak.year_offset].highlighted);
        let stages: Vec<_> = output.timings.iter().map(|t| t.stage).collect();
        assert_eq!(stages, ["generate", "aggregate", "peak", "chart"]);
    }

    #[test]
    fn degenerate_config_fails_before_generation() {
        let mut bad = config(10);
        bad.limits.max = 1901;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(execute_cycle(&bad, &mut rng).is_err());
        assert!(EngineBuilder::new(settings(), bad).build().is_err());
    }

    #[test]
    fn engine_counts_cycles_and_draws_fresh_data() {
        let mut engine = EngineBuilder::new(settings(), config(500)).build().unwrap();
        let first = engine.run_cycle().unwrap();
        let second = engine.run_cycle().unwrap();

        assert_eq!(first.cycle, 1);
        assert_eq!(second.cycle, 2);
        assert_eq!(engine.cycles_completed(), 2);
        assert_ne!(first.series, second.series);
    }

    #[test]
    fn same_seed_same_cycles() {
        let mut a = EngineBuilder::new(settings(), config(500)).build().unwrap();
        let mut b = EngineBuilder::new(settings(), config(500)).build().unwrap();
        for _ in 0..3 {
            assert_eq!(a.run_cycle().unwrap().series, b.run_cycle().unwrap().series);
        }
    }

    #[test]
    fn summary_matches_high_text() {
        let mut engine = EngineBuilder::new(settings(), config(50)).build().unwrap();
        let output = engine.run_cycle().unwrap();
        assert_eq!(
            output.to_string(),
            format!("Year: {} High: {}", output.peak_year, output.peak_count)
        );
    }
}
