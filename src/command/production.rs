use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::id::EntityId;
use crate::model::ProducerKey;
use crate::sim::{SimulationContext, production};

/// Pause or resume one producer of a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleActive {
    pub building: EntityId,
    #[serde(default)]
    pub slot: usize,
}

impl ToggleActive {
    pub fn new(building: EntityId, slot: usize) -> Self {
        Self { building, slot }
    }

    /// Returns whether the producer is active afterwards.
    pub fn execute(&self, ctx: &mut SimulationContext) -> Result<bool, SimError> {
        production::toggle(ctx, ProducerKey::new(self.building, self.slot))
    }
}
