//! Validated mutations of the world. Commands may run long after they were
//! issued, so every one re-checks its preconditions when it executes.

pub mod build;
pub mod production;
pub mod settlement;
pub mod tear;

use serde::{Deserialize, Serialize};

pub use build::{Build, Placement, place};
pub use production::ToggleActive;
pub use settlement::{SetSettlementUpgradePermissions, SetTaxSetting};
pub use tear::Tear;

use crate::error::SimError;
use crate::id::EntityId;
use crate::sim::SimulationContext;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Build(Build),
    Tear(Tear),
    ToggleActive(ToggleActive),
    SetTaxSetting(SetTaxSetting),
    SetSettlementUpgradePermissions(SetSettlementUpgradePermissions),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Built(EntityId),
    Done,
}

impl CommandOutcome {
    pub fn built(self) -> Option<EntityId> {
        match self {
            CommandOutcome::Built(id) => Some(id),
            CommandOutcome::Done => None,
        }
    }
}

impl Command {
    /// `issuer` is `None` for world-setup commands, which skip ownership and
    /// resource checks.
    pub fn execute(
        &self,
        ctx: &mut SimulationContext,
        issuer: Option<EntityId>,
    ) -> Result<CommandOutcome, SimError> {
        match self {
            Command::Build(cmd) => cmd.execute(ctx, issuer).map(CommandOutcome::Built),
            Command::Tear(cmd) => cmd.execute(ctx).map(|()| CommandOutcome::Done),
            Command::ToggleActive(cmd) => cmd.execute(ctx).map(|_| CommandOutcome::Done),
            Command::SetTaxSetting(cmd) => cmd.execute(ctx).map(|()| CommandOutcome::Done),
            Command::SetSettlementUpgradePermissions(cmd) => {
                cmd.execute(ctx).map(|()| CommandOutcome::Done)
            }
        }
    }
}

impl From<Build> for Command {
    fn from(cmd: Build) -> Self {
        Command::Build(cmd)
    }
}

impl From<Tear> for Command {
    fn from(cmd: Tear) -> Self {
        Command::Tear(cmd)
    }
}

impl From<ToggleActive> for Command {
    fn from(cmd: ToggleActive) -> Self {
        Command::ToggleActive(cmd)
    }
}

impl From<SetTaxSetting> for Command {
    fn from(cmd: SetTaxSetting) -> Self {
        Command::SetTaxSetting(cmd)
    }
}

impl From<SetSettlementUpgradePermissions> for Command {
    fn from(cmd: SetSettlementUpgradePermissions) -> Self {
        Command::SetSettlementUpgradePermissions(cmd)
    }
}

/// A command waiting for its execution tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCommand {
    pub seq: u64,
    pub execute_at: u64,
    pub issuer: Option<EntityId>,
    pub command: Command,
}
