pub mod chart;
pub mod engine;
pub mod error;
pub mod lifespan;
pub mod peak;
pub mod report;
pub mod rng;
pub mod scenario;
pub mod scheduler;
pub mod series;
pub mod web;

pub use engine::{CycleOutput, Engine, EngineBuilder, EngineSettings};
pub use error::{CensusError, Result};
pub use scenario::{CycleConfig, Scenario};
