//! Repeating mode: re-run full cycles on a fixed interval until cancelled.
//!
//! Cycles run one at a time on the blocking pool. Cancellation is checked
//! between cycles and cuts the inter-cycle sleep short; a cycle that has
//! started always finishes.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use tokio::sync::watch;
use tracing::{error, info};

use crate::{
    engine::{CycleOutput, Engine},
    error::Result,
};

/// Anything that can produce one full cycle on demand.
pub trait CycleSource: Send + 'static {
    fn next_cycle(&mut self) -> Result<CycleOutput>;
}

impl CycleSource for Engine {
    fn next_cycle(&mut self) -> Result<CycleOutput> {
        self.run_cycle()
    }
}

/// Cloneable stop switch shared between a repeating run and whoever controls it.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn same_as(&self, other: &CancelHandle) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }

    async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct RepeatSettings {
    pub interval: Duration,
    pub max_cycles: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    Cancelled,
    CycleLimit,
}

#[derive(Clone, Debug)]
pub struct RepeatSummary {
    pub cycles: u64,
    pub reason: StopReason,
}

/// Runs cycles back to back, sleeping `interval` in between, and hands each
/// output to `hook`. The first failing cycle stops the loop and is returned.
pub async fn run_repeating<S, F>(
    source: Arc<Mutex<S>>,
    settings: RepeatSettings,
    cancel: CancelHandle,
    mut hook: F,
) -> Result<RepeatSummary>
where
    S: CycleSource,
    F: FnMut(&CycleOutput),
{
    info!(interval_ms = settings.interval.as_millis() as u64, "repeating mode started");
    let mut cycles = 0_u64;

    let reason = loop {
        if cancel.is_cancelled() {
            break StopReason::Cancelled;
        }
        if settings.max_cycles.is_some_and(|max| cycles >= max) {
            break StopReason::CycleLimit;
        }

        let worker = source.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            worker
                .lock()
                .expect("cycle source lock poisoned")
                .next_cycle()
        })
        .await?;
        let output = match outcome {
            Ok(output) => output,
            Err(err) => {
                error!(cycles, error = %err, "repeating mode aborted");
                return Err(err);
            }
        };
        cycles += 1;
        hook(&output);

        if settings.max_cycles.is_some_and(|max| cycles >= max) {
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(settings.interval) => {}
            _ = cancel.cancelled() => {}
        }
    };

    info!(cycles, reason = ?reason, "repeating mode finished");
    Ok(RepeatSummary { cycles, reason })
}
