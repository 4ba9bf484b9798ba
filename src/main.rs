use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lifespan_census::{
    engine::{Engine, EngineBuilder},
    scenario::{Scenario, ScenarioLoader},
    scheduler::{run_repeating, CancelHandle, RepeatSettings},
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Find the year with the most people alive")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Path to the scenario YAML file
    #[arg(long, global = true, default_value = "scenarios/twentieth_century.yaml")]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Override the number of people per dataset
    #[arg(long, global = true)]
    people: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a fixed number of cycles and print each peak
    Run {
        #[arg(long, default_value_t = 1)]
        cycles: u64,
    },
    /// Regenerate on an interval until Ctrl+C
    Repeat {
        /// Interval between cycles in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Stop after this many cycles
        #[arg(long)]
        max_cycles: Option<u64>,
    },
    /// Serve the chart page
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn build_engine(scenario: &Scenario, common: &CommonArgs) -> Result<Engine> {
    let mut builder = EngineBuilder::from_scenario(scenario);
    if let Some(seed) = common.seed {
        builder = builder.with_seed(seed);
    }
    if let Some(people) = common.people {
        builder = builder.with_people(people);
    }
    Ok(builder.build()?)
}

fn repeat_settings(scenario: &Scenario, interval_ms: Option<u64>, max_cycles: Option<u64>) -> RepeatSettings {
    RepeatSettings {
        interval: interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| scenario.repeat.interval()),
        max_cycles: max_cycles.or(scenario.repeat.max_cycles),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = ScenarioLoader::new(".").load(&cli.common.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut engine = build_engine(&scenario, &cli.common)?;
    tracing::info!(scenario = %scenario.name, seed = engine.seed(), "engine ready");

    match cli.command {
        Command::Run { cycles } => {
            engine.run_with_hook(cycles, |output| {
                println!("[cycle {}] {}", output.cycle, output);
            })?;
        }
        Command::Repeat {
            interval_ms,
            max_cycles,
        } => {
            let settings = repeat_settings(&scenario, interval_ms, max_cycles);
            let cancel = CancelHandle::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                on_signal.cancel();
            });

            let summary = run_repeating(
                Arc::new(Mutex::new(engine)),
                settings,
                cancel,
                |output| println!("[cycle {}] {}", output.cycle, output),
            )
            .await?;
            println!(
                "Scenario '{}' stopped after {} cycles ({:?}).",
                scenario.name, summary.cycles, summary.reason
            );
        }
        Command::Serve { host, port } => {
            let repeat = repeat_settings(&scenario, None, None);
            web::run(WebServerConfig {
                engine,
                repeat,
                host,
                port,
            })
            .await?;
        }
    }
    Ok(())
}
