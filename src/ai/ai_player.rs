//! Player-level AI: settlements are run by their managers, the player only
//! decides when to expand onto another island.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::personality::Personality;
use crate::command::Build;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingKind, BuildingType, Island, ResourceId};
use crate::sim::SimulationContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiPlayer {
    pub player: EntityId,
    #[serde(default)]
    pub personality: Personality,
}

impl AiPlayer {
    pub fn new(player: EntityId) -> Self {
        Self {
            player,
            personality: Personality::default(),
        }
    }
}

fn branch_office(ctx: &SimulationContext) -> Option<&BuildingType> {
    ctx.registry.first_of_kind(BuildingKind::BranchOffice)
}

/// Islands no settlement has been founded on yet, lowest id first.
fn unsettled_islands(ctx: &SimulationContext) -> impl Iterator<Item = &Island> {
    ctx.world
        .islands
        .values()
        .filter(|island| !ctx.world.settlements.values().any(|s| s.island == island.id))
}

/// First ship of `player` whose hold plus the wallet pays for `ty`.
fn paying_ship(
    ctx: &SimulationContext,
    player: EntityId,
    ty: &BuildingType,
) -> Result<Option<EntityId>, SimError> {
    let wallet = ctx.world.inventory(player)?;
    for ship in ctx.world.ships.values().filter(|s| s.owner == player) {
        let pays = ty.costs.iter().all(|(&res, &cost)| {
            let from_wallet = if res == ResourceId::GOLD { wallet.get(res) } else { 0 };
            from_wallet.saturating_add(ship.inventory.get(res)) >= cost
        });
        if pays {
            return Ok(Some(ship.id));
        }
    }
    Ok(None)
}

/// Whether `player` has somewhere to go and the means to get there.
pub fn can_found_feeder_island(ctx: &SimulationContext, player: EntityId) -> Result<bool, SimError> {
    let Some(office) = branch_office(ctx) else {
        return Ok(false);
    };
    if unsettled_islands(ctx).next().is_none() {
        return Ok(false);
    }
    Ok(paying_ship(ctx, player, office)?.is_some())
}

/// Found a settlement on the lowest-id unsettled island at the first tile a
/// branch office fits on. Returns the office, or `None` if nothing fits.
pub fn found_feeder_island(
    ctx: &mut SimulationContext,
    player: EntityId,
) -> Result<Option<EntityId>, SimError> {
    let Some(office) = branch_office(ctx) else {
        return Ok(None);
    };
    let Some(ship) = paying_ship(ctx, player, office)? else {
        return Ok(None);
    };

    let mut chosen = None;
    'islands: for island in unsettled_islands(ctx) {
        for (x, y) in island.land_tiles() {
            let build = Build::new(office.id, x, y, island.id).from_ship(ship);
            if build.check_placement(ctx, Some(player)).is_ok() {
                chosen = Some(build);
                break 'islands;
            }
        }
        debug!(player, island = island.id, "no room for a branch office");
    }
    let Some(build) = chosen else {
        return Ok(None);
    };

    let island = build.island;
    let id = ctx.execute(Some(player), build)?.built();
    info!(player, island, "founded a feeder settlement");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn two_islands(gold: u32, boards: u32) -> (SimulationContext, EntityId, EntityId) {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        s.add_ship(player, &[(ResourceId::BOARDS, boards)]);
        let home = s.add_square_island((0, 0), 30);
        let feeder = s.add_square_island((50, 0), 10);
        s.settle(player, home, (10, 10));
        s.give(player, ResourceId::GOLD, gold);
        (s.build(), player, feeder)
    }

    #[test]
    fn feeder_needs_ship_and_gold() {
        let (ctx, player, _) = two_islands(1000, 10);
        assert!(can_found_feeder_island(&ctx, player).unwrap());

        let (poor, player, _) = two_islands(100, 10);
        assert!(!can_found_feeder_island(&poor, player).unwrap());

        let (no_boards, player, _) = two_islands(1000, 2);
        assert!(!can_found_feeder_island(&no_boards, player).unwrap());
    }

    #[test]
    fn feeder_settlement_lands_on_free_island() {
        let (mut ctx, player, feeder) = two_islands(1000, 10);
        let managers_before = ctx.ai.managers.len();

        let office = found_feeder_island(&mut ctx, player).unwrap().unwrap();
        let building = ctx.world.building(office).unwrap();
        assert_eq!(building.island, feeder);
        assert_eq!((building.area.x, building.area.y), (50, 0));
        assert_eq!(ctx.ai.managers.len(), managers_before + 1);
        assert!(!can_found_feeder_island(&ctx, player).unwrap());
    }
}
