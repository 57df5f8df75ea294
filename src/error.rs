use thiserror::Error;

use crate::id::EntityId;
use crate::model::building::BuildingTypeId;
use crate::model::production::LineId;
use crate::model::resource::ResourceId;

/// Why a footprint cannot take a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementIssue {
    InvalidRotation(u16),
    /// Tile is water or outside the island.
    NotLand((i32, i32)),
    /// Tile is taken by a building that is not in the tear set.
    Occupied((i32, i32)),
    /// Tile lies outside the settlement's claimed area.
    OutsideSettlement((i32, i32)),
    /// Deposit-bound building without its deposit underneath.
    MissingDeposit,
    /// Branch offices founded from a ship need the ship; everything else needs
    /// a settlement.
    NoSource,
    /// Tear-set entry outside the footprint or owned by another player.
    CannotTear(EntityId),
    SettlerLevelTooLow { required: u8, actual: u8 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("placement invalid: {0:?}")]
    PlacementInvalid(PlacementIssue),
    #[error("insufficient {resource}")]
    InsufficientResources { resource: ResourceId },
    #[error("capacity overflow of {resource}: {remainder} left over")]
    CapacityOverflow { resource: ResourceId, remainder: u32 },
    #[error("no object with id {0}")]
    ReferenceNotFound(EntityId),
    #[error("no candidate available")]
    NoCandidateAvailable,
    #[error("unknown building type {0}")]
    UnknownBuildingType(BuildingTypeId),
    #[error("unknown production {0}")]
    UnknownProductionLine(LineId),
}

impl From<PlacementIssue> for SimError {
    fn from(issue: PlacementIssue) -> Self {
        SimError::PlacementInvalid(issue)
    }
}
