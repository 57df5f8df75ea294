use serde::{Deserialize, Serialize};

use super::inventory::{Inventory, UNLIMITED};
use super::traits::{HasInventory, HasOwner};
use crate::id::EntityId;

/// A human or computer player. The wallet is an inventory so gold flows
/// through the same `alter` path as every other resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: EntityId,
    pub name: String,
    pub wallet: Inventory,
    /// Highest residence level reached in any of the player's settlements.
    pub settler_level: u8,
    pub is_ai: bool,
}

impl Player {
    pub fn new(id: EntityId, name: String, is_ai: bool) -> Self {
        Self {
            id,
            name,
            wallet: Inventory::new(UNLIMITED),
            settler_level: 0,
            is_ai,
        }
    }
}

impl HasInventory for Player {
    fn inventory(&self) -> &Inventory {
        &self.wallet
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.wallet
    }
}

/// A trading ship; its hold is the second resource source when building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: EntityId,
    pub name: String,
    pub owner: EntityId,
    pub inventory: Inventory,
}

impl Ship {
    pub fn new(id: EntityId, name: String, owner: EntityId, hold_limit: u32) -> Self {
        Self {
            id,
            name,
            owner,
            inventory: Inventory::new(hold_limit),
        }
    }
}

impl HasInventory for Ship {
    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }
}

impl HasOwner for Ship {
    fn owner(&self) -> Option<EntityId> {
        Some(self.owner)
    }
}
