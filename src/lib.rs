#[macro_use]
mod macros;

pub mod ai;
pub mod command;
pub mod db;
pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod scenario;
pub mod sim;
pub mod worldgen;

pub use command::{Build, Command, CommandOutcome, Tear};
pub use error::SimError;
pub use id::{EntityId, IdGenerator};
pub use model::{BuildingRegistry, ResourceId, World};
pub use sim::{RunConfig, SimConfig, SimulationContext};
