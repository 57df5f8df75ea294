//! Procedural maps: random island shapes, map layouts and the trees and
//! deposits that start out on them.

pub mod config;
pub mod island;
pub mod map;
pub mod nature;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;

use crate::error::SimError;
use crate::id::EntityId;
use crate::model::BuildingRegistry;
use crate::sim::seed::make_seed;
use crate::sim::{SimConfig, SimulationContext};

pub use config::MapGenConfig;
pub use island::{CreationMethod, IslandIdError, RandomIslandId, create_random_island, is_random_island_id};
pub use map::{IslandPlacement, generate_map};

/// Add the island a placement describes to the world.
pub fn add_island(ctx: &mut SimulationContext, placement: &IslandPlacement) -> Result<EntityId, SimError> {
    let ground = create_random_island(&placement.id);
    let id = ctx.world.add_island(placement.origin, ground);
    ctx.world.island_mut(id)?.source = Some(placement.id.to_string());
    Ok(id)
}

/// Lay out a map and fill it with islands, trees and deposits.
pub fn populate_map(ctx: &mut SimulationContext, config: &MapGenConfig) -> Result<Vec<EntityId>, SimError> {
    let mut rng = SmallRng::seed_from_u64(make_seed(config.seed, 0, "nature"));
    let mut islands = Vec::new();
    for placement in generate_map(config) {
        let id = add_island(ctx, &placement)?;
        nature::generate_nature(ctx, id, config, &mut rng)?;
        islands.push(id);
    }
    info!(islands = islands.len(), seed = config.seed, "map generated");
    Ok(islands)
}

/// Generate a complete world on the built-in buildings.
pub fn generate_world(map: &MapGenConfig, sim: SimConfig) -> Result<SimulationContext, SimError> {
    let mut ctx = SimulationContext::new(sim, Arc::new(BuildingRegistry::builtin()));
    populate_map(&mut ctx, map)?;
    Ok(ctx)
}
