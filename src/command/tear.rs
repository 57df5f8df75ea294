use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingKind, EventKind};
use crate::sim::SimulationContext;

/// Remove a building. Tearing something that is already gone is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tear {
    pub building: EntityId,
}

impl Tear {
    pub fn new(building: EntityId) -> Self {
        Self { building }
    }

    pub fn execute(&self, ctx: &mut SimulationContext) -> Result<(), SimError> {
        tear_silently(ctx, self.building)
    }
}

/// Like [`tear_building`] but treats a missing building as done.
pub fn tear_silently(ctx: &mut SimulationContext, id: EntityId) -> Result<(), SimError> {
    match tear_building(ctx, id) {
        Ok(()) | Err(SimError::ReferenceNotFound(_)) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Remove the building, its pending calls and its footprint. Goods stored in
/// the building are lost; claimed land stays with the settlement.
pub fn tear_building(ctx: &mut SimulationContext, id: EntityId) -> Result<(), SimError> {
    let building = ctx
        .world
        .buildings
        .remove(&id)
        .ok_or(SimError::ReferenceNotFound(id))?;
    let cancelled = ctx.scheduler.cancel_all_for(id);
    ctx.world.island_mut(building.island)?.vacate(id);

    if let Some(settlement_id) = building.settlement {
        let bonus = ctx.config.storage_limit_bonus;
        if let Ok(settlement) = ctx.world.settlement_mut(settlement_id) {
            settlement.buildings.remove(&id);
            if building.kind == BuildingKind::Storage {
                let limit = settlement.inventory.default_limit().saturating_sub(bonus);
                settlement.inventory.set_default_limit(limit);
            }
        }
    }

    let name = ctx
        .registry
        .building(building.type_id)
        .map(|ty| ty.name.clone())
        .unwrap_or_default();
    info!(building = id, %name, cancelled, "torn down");
    ctx.record_event(EventKind::BuildingTorn, id, name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceId;
    use crate::scenario::Scenario;
    use crate::sim::Callback;

    #[test]
    fn tear_frees_tiles_and_cancels_calls() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        let lumberjack = s.place(settlement, "lumberjack", (8, 8));
        let mut ctx = s.build();
        assert!(ctx.scheduler.has_call(lumberjack, Callback::CollectorRound));

        Tear::new(lumberjack).execute(&mut ctx).unwrap();

        assert!(ctx.world.building(lumberjack).is_err());
        assert_eq!(ctx.world.island(island).unwrap().occupant((8, 8)), None);
        assert!(!ctx.scheduler.has_call(lumberjack, Callback::CollectorRound));
        assert!(!ctx.world.settlement(settlement).unwrap().buildings.contains(&lumberjack));
        assert_eq!(ctx.world.events.of_kind(EventKind::BuildingTorn).count(), 1);
    }

    #[test]
    fn tearing_twice_is_a_no_op() {
        let mut s = Scenario::new();
        let island = s.add_square_island((0, 0), 10);
        let tree = s.plant(island, (3, 3));
        let mut ctx = s.build();

        Tear::new(tree).execute(&mut ctx).unwrap();
        Tear::new(tree).execute(&mut ctx).unwrap();
        assert_eq!(
            tear_building(&mut ctx, tree).unwrap_err(),
            SimError::ReferenceNotFound(tree)
        );
    }

    #[test]
    fn tearing_storage_lowers_settlement_limit() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        let base = s.context().world.inventory(settlement).unwrap().limit(ResourceId::FOOD);
        let tent = s.place(settlement, "storage_tent", (8, 2));
        let mut ctx = s.build();
        let bonus = ctx.config.storage_limit_bonus;
        assert_eq!(ctx.world.inventory(settlement).unwrap().limit(ResourceId::FOOD), base + bonus);

        Tear::new(tent).execute(&mut ctx).unwrap();
        assert_eq!(ctx.world.inventory(settlement).unwrap().limit(ResourceId::FOOD), base);
    }
}
