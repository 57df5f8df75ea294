//! Builder for hand-made worlds, used by unit and integration tests.
//!
//! Everything is placed through the same construction path as real builds,
//! minus validation and charging, so producers and rounds start as usual.
//! Helpers panic on bad input.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::command::{Build, place};
use crate::id::EntityId;
use crate::model::tile_map::Tile;
use crate::model::{BuildingRegistry, Ground, ResourceId};
use crate::sim::{SimConfig, SimulationContext};

pub struct Scenario {
    ctx: SimulationContext,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// Default config, built-in buildings.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    pub fn with_config(config: SimConfig) -> Self {
        Self {
            ctx: SimulationContext::new(config, Arc::new(BuildingRegistry::builtin())),
        }
    }

    // -- Players and ships --

    pub fn add_player(&mut self, name: &str, is_ai: bool) -> EntityId {
        self.ctx.world.add_player(name, is_ai)
    }

    /// Add a ship for `owner` carrying `cargo`.
    pub fn add_ship(&mut self, owner: EntityId, cargo: &[(ResourceId, u32)]) -> EntityId {
        let index = self.ctx.world.ships.len() + 1;
        let limit = self.ctx.config.ship_hold_limit;
        let ship = self.ctx.world.add_ship(owner, &format!("Ship {index}"), limit);
        for &(res, amount) in cargo {
            self.give(ship, res, amount);
        }
        ship
    }

    // -- Islands --

    /// A `size` x `size` island of plain land with its corner at `origin`.
    pub fn add_square_island(&mut self, origin: Tile, size: i32) -> EntityId {
        let ground = (0..size)
            .flat_map(|y| (0..size).map(move |x| ((x, y), Ground::Land)))
            .collect();
        self.ctx.world.add_island(origin, ground)
    }

    /// An island from generator-local ground.
    pub fn add_island(&mut self, origin: Tile, ground: BTreeMap<Tile, Ground>) -> EntityId {
        self.ctx.world.add_island(origin, ground)
    }

    // -- Buildings --

    /// Found a settlement for `player` by placing a branch office at `tile`.
    /// Returns the settlement.
    pub fn settle(&mut self, player: EntityId, island: EntityId, tile: Tile) -> EntityId {
        let office = self.type_id("branch_office");
        let build = Build::new(office, tile.0, tile.1, island);
        let id = place(&mut self.ctx, &build, Some(player)).unwrap();
        self.ctx.world.building(id).unwrap().settlement.unwrap()
    }

    /// Place a building by type name in `settlement`, owned by its owner.
    pub fn place(&mut self, settlement: EntityId, name: &str, tile: Tile) -> EntityId {
        self.place_rotated(settlement, name, tile, 0)
    }

    pub fn place_rotated(&mut self, settlement: EntityId, name: &str, tile: Tile, rotation: u16) -> EntityId {
        let ty = self.type_id(name);
        let s = self.ctx.world.settlement(settlement).unwrap();
        let (owner, island) = (s.owner, s.island);
        let build = Build::new(ty, tile.0, tile.1, island)
            .rotated(rotation)
            .in_settlement(settlement);
        place(&mut self.ctx, &build, Some(owner)).unwrap()
    }

    /// An ownerless building (tree, deposit) at `tile`.
    pub fn place_natural(&mut self, island: EntityId, name: &str, tile: Tile) -> EntityId {
        let ty = self.type_id(name);
        let build = Build::new(ty, tile.0, tile.1, island).ownerless();
        place(&mut self.ctx, &build, None).unwrap()
    }

    /// An ownerless tree at `tile`.
    pub fn plant(&mut self, island: EntityId, tile: Tile) -> EntityId {
        self.place_natural(island, "tree", tile)
    }

    // -- Goods --

    /// Add goods to any holder. Panics if they do not fit.
    pub fn give(&mut self, holder: EntityId, res: ResourceId, amount: u32) {
        let delta = i32::try_from(amount).unwrap();
        let remainder = self.ctx.alter_inventory(holder, res, delta).unwrap();
        assert_eq!(remainder, 0, "{holder} has no room for {amount} {res}");
    }

    fn type_id(&self, name: &str) -> crate::model::BuildingTypeId {
        self.ctx
            .registry
            .by_name(name)
            .unwrap_or_else(|| panic!("no building type named {name}"))
            .id
    }

    // -- Finish --

    pub fn build(self) -> SimulationContext {
        self.ctx
    }

    /// Build and advance `ticks` ticks.
    pub fn run(self, ticks: u64) -> SimulationContext {
        let mut ctx = self.build();
        ctx.advance(ticks);
        ctx
    }

    /// Borrow the context for additional inspection.
    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    /// Borrow the context mutably for additional modifications.
    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_founds_settlement_around_office() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (10, 10));
        let ctx = s.build();

        let settlement = ctx.world.settlement(settlement).unwrap();
        assert_eq!(settlement.owner, player);
        assert_eq!(settlement.buildings.len(), 1);
        assert!(settlement.tiles.contains(&(22, 12)));
        assert!(!settlement.tiles.contains(&(25, 12)));
    }

    #[test]
    fn plant_adds_ownerless_tree() {
        let mut s = Scenario::new();
        let island = s.add_square_island((0, 0), 10);
        let tree = s.plant(island, (3, 3));
        let ctx = s.build();
        let tree = ctx.world.building(tree).unwrap();
        assert_eq!(tree.owner, None);
        assert_eq!(tree.settlement, None);
    }
}
