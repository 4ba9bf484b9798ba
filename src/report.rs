use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{engine::CycleOutput, error::Result};

#[derive(Serialize)]
struct CycleReport<'a> {
    scenario: &'a str,
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    output: &'a CycleOutput,
}

/// Writes a JSON report of every `interval`-th cycle. An interval of 0 disables it.
pub struct ReportWriter {
    dir: PathBuf,
    interval: u64,
}

impl ReportWriter {
    pub fn new(dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn maybe_write(&self, output: &CycleOutput, scenario_name: &str) -> Result<Option<PathBuf>> {
        if self.interval == 0 || output.cycle % self.interval != 0 {
            return Ok(None);
        }

        let dir = self.dir.join(scenario_name);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("cycle_{:06}.json", output.cycle));
        let report = CycleReport {
            scenario: scenario_name,
            written_at: Utc::now(),
            output,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&path, json)?;
        Ok(Some(path))
    }
}
