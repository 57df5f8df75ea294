//! Capability traits composed by the concrete world objects.
//!
//! Buildings, settlements, players and ships share no base type; code that
//! only needs "something with an inventory" or "something with an owner" is
//! written against these traits instead.

use super::inventory::Inventory;
use super::production::Producer;
use crate::id::EntityId;

pub trait HasInventory {
    fn inventory(&self) -> &Inventory;
    fn inventory_mut(&mut self) -> &mut Inventory;
}

pub trait HasOwner {
    fn owner(&self) -> Option<EntityId>;

    fn is_owned_by(&self, player: EntityId) -> bool {
        self.owner() == Some(player)
    }
}

pub trait HasProductionState {
    fn producers(&self) -> &[Producer];
    fn producers_mut(&mut self) -> &mut [Producer];

    fn producer(&self, slot: usize) -> Option<&Producer> {
        self.producers().get(slot)
    }

    fn producer_mut(&mut self, slot: usize) -> Option<&mut Producer> {
        self.producers_mut().get_mut(slot)
    }

    /// True when at least one producer slot is running or waiting for input.
    fn is_producing(&self) -> bool {
        self.producers().iter().any(|p| p.is_active())
    }
}
