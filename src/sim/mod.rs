pub mod collector;
pub mod context;
pub mod production;
pub mod runner;
pub mod scheduler;
pub mod seed;

pub use context::SimulationContext;
pub use runner::{RunConfig, SimConfig, run};
pub use scheduler::{Callback, PendingCall, ScheduledCall, Scheduler};
