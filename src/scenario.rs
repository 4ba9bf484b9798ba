use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    chart::{ChartBounds, YearLimits},
    error::CensusError,
};

fn default_people() -> usize {
    1000
}

fn default_year_min() -> i32 {
    1900
}

fn default_year_max() -> i32 {
    2000
}

fn default_chart_width() -> f64 {
    800.0
}

fn default_chart_height() -> f64 {
    400.0
}

fn default_padding() -> f64 {
    10.0
}

fn default_interval_ms() -> u64 {
    500
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_people")]
    pub people: usize,
    #[serde(default)]
    pub years: YearsSection,
    #[serde(default)]
    pub chart: ChartSection,
    #[serde(default)]
    pub repeat: RepeatSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YearsSection {
    #[serde(default = "default_year_min")]
    pub min: i32,
    #[serde(default = "default_year_max")]
    pub max: i32,
}

impl Default for YearsSection {
    fn default() -> Self {
        Self {
            min: default_year_min(),
            max: default_year_max(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChartSection {
    #[serde(default)]
    pub min_x: f64,
    #[serde(default)]
    pub min_y: f64,
    #[serde(default = "default_chart_width")]
    pub width: f64,
    #[serde(default = "default_chart_height")]
    pub height: f64,
    #[serde(default = "default_padding")]
    pub padding: f64,
}

impl Default for ChartSection {
    fn default() -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: default_chart_width(),
            height: default_chart_height(),
            padding: default_padding(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RepeatSection {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl Default for RepeatSection {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_cycles: None,
        }
    }
}

impl RepeatSection {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSection {
    #[serde(default)]
    pub interval_cycles: u64,
    #[serde(default = "default_report_dir")]
    pub dir: PathBuf,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            interval_cycles: 0,
            dir: default_report_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Widest span of years a single series may cover.
pub const MAX_YEAR_RANGE: usize = 100_000;

/// Everything one cycle needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleConfig {
    pub people: usize,
    pub limits: YearLimits,
    pub bounds: ChartBounds,
    pub padding: f64,
}

impl CycleConfig {
    pub fn year_range(&self) -> usize {
        self.limits.year_range()
    }

    /// Full check for a configured run: a positive people count plus [`Self::validate_layout`].
    pub fn validate(&self) -> Result<(), CensusError> {
        if self.people == 0 {
            return Err(CensusError::invalid("people count must be positive"));
        }
        self.validate_layout()
    }

    /// Year range and chart geometry only. An empty population is allowed here.
    pub fn validate_layout(&self) -> Result<(), CensusError> {
        if self.limits.max <= self.limits.min {
            return Err(CensusError::invalid(format!(
                "year max {} must be greater than year min {}",
                self.limits.max, self.limits.min
            )));
        }
        if self.year_range() < 2 {
            return Err(CensusError::invalid(format!(
                "year range must span at least 2 years, got {}",
                self.year_range()
            )));
        }
        if self.year_range() > MAX_YEAR_RANGE {
            return Err(CensusError::invalid(format!(
                "year range {} exceeds the supported maximum of {MAX_YEAR_RANGE}",
                self.year_range()
            )));
        }
        if !(self.bounds.width > 0.0 && self.bounds.height > 0.0) {
            return Err(CensusError::invalid(format!(
                "chart dimensions must be positive, got {}x{}",
                self.bounds.width, self.bounds.height
            )));
        }
        if !(self.padding >= 0.0) {
            return Err(CensusError::invalid(format!(
                "padding must be non-negative, got {}",
                self.padding
            )));
        }
        if self.bounds.width - 2.0 * self.padding <= 0.0
            || self.bounds.height - 2.0 * self.padding <= 0.0
        {
            return Err(CensusError::invalid(format!(
                "padding {} leaves no plot area inside {}x{}",
                self.padding, self.bounds.width, self.bounds.height
            )));
        }
        Ok(())
    }
}

impl Scenario {
    pub fn cycle_config(&self) -> CycleConfig {
        CycleConfig {
            people: self.people,
            limits: YearLimits {
                min: self.years.min,
                max: self.years.max,
            },
            bounds: ChartBounds {
                min_x: self.chart.min_x,
                min_y: self.chart.min_y,
                width: self.chart.width,
                height: self.chart.height,
            },
            padding: self.chart.padding,
        }
    }

    pub fn validate(&self) -> Result<(), CensusError> {
        if self.name.trim().is_empty() {
            return Err(CensusError::invalid("scenario must define a name"));
        }
        if self.repeat.interval_ms == 0 {
            return Err(CensusError::invalid("repeat interval must be positive"));
        }
        self.cycle_config().validate()
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text).context("Failed to parse scenario")?;
        scenario.validate()?;
        Ok(scenario)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}
