use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::context::SimulationContext;
use crate::flush::save_to_jsonl;

/// Timing and capacity knobs of a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub seed: u64,
    /// Game-speed constant: production durations are in seconds.
    pub ticks_per_second: u64,
    pub ai_tick_interval: u64,
    pub ai_first_tick: u64,
    pub collector_interval: u64,
    pub storage_interval: u64,
    pub tax_interval: u64,
    /// Execution delay of commands issued through `SimulationContext::issue`.
    pub command_delay: u64,
    pub settlement_base_limit: u32,
    /// Extra settlement capacity per storage tent.
    pub storage_limit_bonus: u32,
    pub ship_hold_limit: u32,
}

impl SimConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            ticks_per_second: 16,
            ai_tick_interval: 32,
            ai_first_tick: 31,
            collector_interval: 48,
            storage_interval: 64,
            tax_interval: 480,
            command_delay: 4,
            settlement_base_limit: 30,
            storage_limit_bonus: 10,
            ship_hold_limit: 50,
        }
    }
}

/// How long to run and where to write checkpoints.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    pub num_ticks: u64,
    /// If set, write a JSONL save every N ticks.
    pub flush_interval: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(num_ticks: u64) -> Self {
        Self {
            num_ticks,
            ..Self::default()
        }
    }
}

/// Advance the simulation, writing a checkpoint every `flush_interval` ticks
/// and after the last one.
pub fn run(ctx: &mut SimulationContext, config: &RunConfig) -> io::Result<()> {
    for offset in 0..config.num_ticks {
        let tick = ctx.tick();

        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            let is_last = offset + 1 == config.num_ticks;
            if is_last || (interval > 0 && (offset + 1) % interval == 0) {
                let checkpoint_dir = dir.join(format!("tick_{tick:08}"));
                save_to_jsonl(ctx, &checkpoint_dir)?;
                info!(tick, dir = %checkpoint_dir.display(), "checkpoint written");
            }
        }
    }
    Ok(())
}
