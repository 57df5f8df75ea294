use rand::{Rng, RngCore};
use tracing::debug;

use super::config::MapGenConfig;
use crate::command::{Build, place};
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingType, Rect};
use crate::sim::SimulationContext;

/// Random spots tried per clay deposit.
const DEPOSIT_ATTEMPTS: usize = 10;

fn fits(ctx: &SimulationContext, island: EntityId, area: Rect) -> Result<bool, SimError> {
    let island = ctx.world.island(island)?;
    Ok(area
        .tiles()
        .all(|t| island.is_buildable(t) && island.occupant(t).is_none()))
}

fn plant(
    ctx: &mut SimulationContext,
    island: EntityId,
    ty: &BuildingType,
    (x, y): (i32, i32),
) -> Result<EntityId, SimError> {
    let build = Build::new(ty.id, x, y, island).ownerless();
    place(ctx, &build, None)
}

/// Scatter clay deposits, then trees, over the free land of `island`.
/// Returns the number of objects placed.
pub fn generate_nature(
    ctx: &mut SimulationContext,
    island: EntityId,
    config: &MapGenConfig,
    rng: &mut dyn RngCore,
) -> Result<usize, SimError> {
    let registry = std::sync::Arc::clone(&ctx.registry);
    let land: Vec<_> = ctx.world.island(island)?.land_tiles().collect();
    if land.is_empty() {
        return Ok(0);
    }
    let mut placed = 0;

    if let Some(clay) = registry.by_name("clay_deposit") {
        let deposits = rng.random_range(0..=config.max_clay_deposits);
        for _ in 0..deposits {
            for _ in 0..DEPOSIT_ATTEMPTS {
                let (x, y) = land[rng.random_range(0..land.len())];
                if fits(ctx, island, Rect::new(x, y, clay.size.0, clay.size.1))? {
                    plant(ctx, island, clay, (x, y))?;
                    placed += 1;
                    break;
                }
            }
        }
    }

    if let Some(tree) = registry.by_name("tree") {
        for &tile in &land {
            let grows = rng.random::<f64>() < config.tree_density;
            if grows && fits(ctx, island, Rect::new(tile.0, tile.1, 1, 1))? {
                plant(ctx, island, tree, tile)?;
                placed += 1;
            }
        }
    }

    debug!(island, placed, "nature generated");
    Ok(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn trees_and_deposits_only_on_free_land() {
        let mut s = Scenario::new();
        let island = s.add_square_island((0, 0), 20);
        let mut ctx = s.build();
        let config = MapGenConfig {
            tree_density: 0.5,
            max_clay_deposits: 2,
            ..MapGenConfig::default()
        };
        let mut rng = SmallRng::seed_from_u64(3);

        let placed = generate_nature(&mut ctx, island, &config, &mut rng).unwrap();
        assert_eq!(placed, ctx.world.buildings.len());
        assert!(placed > 100);
        let tree = ctx.registry.by_name("tree").unwrap().id;
        assert!(ctx.world.natural_on(island, tree) > 100);
        assert!(ctx.world.buildings.values().all(|b| b.owner.is_none()));
    }
}
