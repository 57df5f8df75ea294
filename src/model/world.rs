use std::collections::BTreeMap;

use super::building::{Building, BuildingKind, BuildingTypeId};
use super::event::EventLog;
use super::inventory::Inventory;
use super::island::Island;
use super::player::{Player, Ship};
use super::settlement::Settlement;
use super::terrain::Ground;
use super::tile_map::Tile;
use super::traits::HasInventory;
use crate::error::SimError;
use crate::id::{EntityId, IdGenerator};

/// Arena of every world object, keyed by stable id. Lookups are fallible so a
/// stale id surfaces as `ReferenceNotFound` instead of a panic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct World {
    pub players: BTreeMap<EntityId, Player>,
    pub ships: BTreeMap<EntityId, Ship>,
    pub islands: BTreeMap<EntityId, Island>,
    pub settlements: BTreeMap<EntityId, Settlement>,
    pub buildings: BTreeMap<EntityId, Building>,
    pub events: EventLog,
    pub id_gen: IdGenerator,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, name: &str, is_ai: bool) -> EntityId {
        let id = self.id_gen.next_id();
        self.players.insert(id, Player::new(id, name.to_string(), is_ai));
        id
    }

    pub fn add_ship(&mut self, owner: EntityId, name: &str, hold_limit: u32) -> EntityId {
        let id = self.id_gen.next_id();
        self.ships
            .insert(id, Ship::new(id, name.to_string(), owner, hold_limit));
        id
    }

    /// Place generator-local ground at `origin`.
    pub fn add_island(&mut self, origin: Tile, ground: BTreeMap<Tile, Ground>) -> EntityId {
        let id = self.id_gen.next_id();
        self.islands
            .insert(id, Island::from_local(id, origin, ground));
        id
    }

    pub fn player(&self, id: EntityId) -> Result<&Player, SimError> {
        self.players.get(&id).ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn player_mut(&mut self, id: EntityId) -> Result<&mut Player, SimError> {
        self.players
            .get_mut(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn ship(&self, id: EntityId) -> Result<&Ship, SimError> {
        self.ships.get(&id).ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn island(&self, id: EntityId) -> Result<&Island, SimError> {
        self.islands.get(&id).ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn island_mut(&mut self, id: EntityId) -> Result<&mut Island, SimError> {
        self.islands
            .get_mut(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn settlement(&self, id: EntityId) -> Result<&Settlement, SimError> {
        self.settlements
            .get(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn settlement_mut(&mut self, id: EntityId) -> Result<&mut Settlement, SimError> {
        self.settlements
            .get_mut(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn building(&self, id: EntityId) -> Result<&Building, SimError> {
        self.buildings
            .get(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    pub fn building_mut(&mut self, id: EntityId) -> Result<&mut Building, SimError> {
        self.buildings
            .get_mut(&id)
            .ok_or(SimError::ReferenceNotFound(id))
    }

    /// Any object holding goods: building, settlement, player wallet or ship.
    pub fn holder(&self, id: EntityId) -> Result<&dyn HasInventory, SimError> {
        if let Some(b) = self.buildings.get(&id) {
            return Ok(b);
        }
        if let Some(s) = self.settlements.get(&id) {
            return Ok(s);
        }
        if let Some(p) = self.players.get(&id) {
            return Ok(p);
        }
        if let Some(s) = self.ships.get(&id) {
            return Ok(s);
        }
        Err(SimError::ReferenceNotFound(id))
    }

    pub fn holder_mut(&mut self, id: EntityId) -> Result<&mut dyn HasInventory, SimError> {
        if let Some(b) = self.buildings.get_mut(&id) {
            return Ok(b);
        }
        if let Some(s) = self.settlements.get_mut(&id) {
            return Ok(s);
        }
        if let Some(p) = self.players.get_mut(&id) {
            return Ok(p);
        }
        if let Some(s) = self.ships.get_mut(&id) {
            return Ok(s);
        }
        Err(SimError::ReferenceNotFound(id))
    }

    pub fn inventory(&self, id: EntityId) -> Result<&Inventory, SimError> {
        Ok(self.holder(id)?.inventory())
    }

    pub fn inventory_mut(&mut self, id: EntityId) -> Result<&mut Inventory, SimError> {
        Ok(self.holder_mut(id)?.inventory_mut())
    }

    /// Buildings of a settlement in id order.
    pub fn buildings_in(&self, settlement: EntityId) -> impl Iterator<Item = &Building> {
        self.settlements
            .get(&settlement)
            .into_iter()
            .flat_map(|s| s.buildings.iter())
            .filter_map(|id| self.buildings.get(id))
    }

    pub fn count_buildings(&self, settlement: EntityId, type_id: BuildingTypeId) -> usize {
        self.buildings_in(settlement)
            .filter(|b| b.type_id == type_id)
            .count()
    }

    pub fn count_kind(&self, settlement: EntityId, kind: BuildingKind) -> usize {
        self.buildings_in(settlement)
            .filter(|b| b.kind == kind)
            .count()
    }

    /// Unowned buildings of a type on an island (trees, deposits).
    pub fn natural_on(&self, island: EntityId, type_id: BuildingTypeId) -> usize {
        self.buildings
            .values()
            .filter(|b| b.island == island && b.type_id == type_id && b.owner.is_none())
            .count()
    }

    /// Settlement claiming `tile` on `island`, if any.
    pub fn settlement_at(&self, island: EntityId, tile: Tile) -> Option<EntityId> {
        self.settlements
            .values()
            .find(|s| s.island == island && s.tiles.contains(&tile))
            .map(|s| s.id)
    }

    pub fn settlements_of(&self, owner: EntityId) -> impl Iterator<Item = &Settlement> {
        self.settlements.values().filter(move |s| s.owner == owner)
    }

    /// Total inhabitants across a settlement's residences.
    pub fn inhabitants(&self, settlement: EntityId) -> u32 {
        self.buildings_in(settlement)
            .filter(|b| b.kind == BuildingKind::Residence)
            .map(|b| b.inhabitants)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resource::ResourceId;

    #[test]
    fn ids_are_shared_across_object_kinds() {
        let mut world = World::new();
        let player = world.add_player("Ann", false);
        let ship = world.add_ship(player, "Gull", 30);
        let island = world.add_island((0, 0), BTreeMap::new());
        assert_eq!((player, ship, island), (1, 2, 3));
    }

    #[test]
    fn stale_ids_are_reference_errors() {
        let world = World::new();
        assert_eq!(
            world.building(42).unwrap_err(),
            SimError::ReferenceNotFound(42)
        );
        assert!(world.inventory(42).is_err());
    }

    #[test]
    fn holder_resolves_wallets_and_holds() {
        let mut world = World::new();
        let player = world.add_player("Ann", false);
        let ship = world.add_ship(player, "Gull", 30);
        world
            .inventory_mut(player)
            .unwrap()
            .alter(ResourceId::GOLD, 500);
        world
            .inventory_mut(ship)
            .unwrap()
            .alter(ResourceId::BOARDS, 12);
        assert_eq!(world.inventory(player).unwrap().get(ResourceId::GOLD), 500);
        assert_eq!(world.inventory(ship).unwrap().get(ResourceId::BOARDS), 12);
    }
}
