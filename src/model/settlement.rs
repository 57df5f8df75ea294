use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::building::Rect;
use super::inventory::Inventory;
use super::tile_map::Tile;
use super::traits::{HasInventory, HasOwner};
use crate::id::EntityId;

/// Tax setting a settlement starts with.
pub const DEFAULT_TAX_SETTING: f64 = 1.0;

/// A player's foothold on an island: one shared inventory, the claimed land
/// and every building standing on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub id: EntityId,
    pub name: String,
    pub owner: EntityId,
    pub island: EntityId,
    pub inventory: Inventory,
    pub tax_setting: f64,
    /// Whether residences may upgrade out of each level, indexed by level.
    pub upgrade_permissions: Vec<bool>,
    pub buildings: BTreeSet<EntityId>,
    pub tiles: BTreeSet<Tile>,
}

impl Settlement {
    pub fn new(
        id: EntityId,
        name: String,
        owner: EntityId,
        island: EntityId,
        inventory_limit: u32,
        levels: usize,
    ) -> Self {
        Self {
            id,
            name,
            owner,
            island,
            inventory: Inventory::new(inventory_limit),
            tax_setting: DEFAULT_TAX_SETTING,
            upgrade_permissions: vec![true; levels],
            buildings: BTreeSet::new(),
            tiles: BTreeSet::new(),
        }
    }

    /// Claim every island tile within `radius` of `area`.
    pub fn claim(&mut self, area: Rect, radius: i32, island_tiles: impl Iterator<Item = Tile>) {
        for tile in island_tiles {
            if area.distance_to_tile(tile) <= radius {
                self.tiles.insert(tile);
            }
        }
    }

    pub fn covers(&self, area: Rect) -> bool {
        area.tiles().all(|t| self.tiles.contains(&t))
    }

    pub fn may_upgrade_from(&self, level: u8) -> bool {
        self.upgrade_permissions
            .get(usize::from(level))
            .copied()
            .unwrap_or(false)
    }
}

impl HasInventory for Settlement {
    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }
}

impl HasOwner for Settlement {
    fn owner(&self) -> Option<EntityId> {
        Some(self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_uses_radius_around_footprint() {
        let mut settlement = Settlement::new(1, "Port".into(), 2, 3, 30, 3);
        let island = (0..10).flat_map(|y| (0..10).map(move |x| (x, y)));
        settlement.claim(Rect::new(4, 4, 2, 2), 1, island);
        assert!(settlement.tiles.contains(&(3, 3)));
        assert!(settlement.tiles.contains(&(6, 6)));
        assert!(!settlement.tiles.contains(&(7, 4)));
        assert!(settlement.covers(Rect::new(3, 3, 4, 4)));
        assert!(!settlement.covers(Rect::new(3, 3, 5, 1)));
    }

    #[test]
    fn permissions_outside_range_are_denied() {
        let mut settlement = Settlement::new(1, "Port".into(), 2, 3, 30, 2);
        settlement.upgrade_permissions[1] = false;
        assert!(settlement.may_upgrade_from(0));
        assert!(!settlement.may_upgrade_from(1));
        assert!(!settlement.may_upgrade_from(5));
    }
}
