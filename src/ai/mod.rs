//! Computer players. Each AI settlement gets a [`SettlementManager`] that
//! the scheduler ticks; the player-level state only holds personalities.

pub mod ai_player;
pub mod builder;
pub mod chain;
pub mod constants;
pub mod evaluator;
pub mod goal;
pub mod personality;
pub mod settlement_manager;

use std::collections::BTreeMap;

use tracing::debug;

pub use ai_player::AiPlayer;
pub use constants::{BuildResult, FieldPurpose, GoalResult, TaskType};
pub use personality::Personality;
pub use settlement_manager::SettlementManager;

use crate::error::SimError;
use crate::id::EntityId;
use crate::sim::SimulationContext;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiState {
    pub players: BTreeMap<EntityId, AiPlayer>,
    /// Managers keyed by their own id, which is also their scheduler target.
    pub managers: BTreeMap<EntityId, SettlementManager>,
}

impl AiState {
    pub fn personality_of(&self, player: EntityId) -> Personality {
        self.players
            .get(&player)
            .map(|p| p.personality.clone())
            .unwrap_or_default()
    }

    pub fn manager_of(&self, settlement: EntityId) -> Option<&SettlementManager> {
        self.managers.values().find(|m| m.settlement == settlement)
    }
}

/// Give `player` a custom personality. Settlements founded afterwards use it
/// from their next tick on.
pub fn register_ai_player(ctx: &mut SimulationContext, player: EntityId, personality: Personality) {
    ctx.ai.players.insert(player, AiPlayer { player, personality });
}

/// Hook run when any settlement is founded; AI-owned ones get a manager.
pub fn settlement_founded(ctx: &mut SimulationContext, settlement: EntityId) -> Result<(), SimError> {
    let owner = ctx.world.settlement(settlement)?.owner;
    if !ctx.world.player(owner)?.is_ai {
        return Ok(());
    }
    ctx.ai
        .players
        .entry(owner)
        .or_insert_with(|| AiPlayer::new(owner));
    let manager = SettlementManager::create(ctx, settlement)?;
    debug!(settlement, manager, "ai settlement registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn only_ai_settlements_get_managers() {
        let mut s = Scenario::new();
        let human = s.add_player("Ann", false);
        let bot = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let mine = s.settle(human, island, (2, 2));
        let theirs = s.settle(bot, island, (30, 30));
        let ctx = s.build();

        assert!(ctx.ai.manager_of(mine).is_none());
        assert_eq!(ctx.ai.manager_of(theirs).map(|m| m.owner), Some(bot));
        assert!(ctx.ai.players.contains_key(&bot));
        assert!(!ctx.ai.players.contains_key(&human));
    }

    #[test]
    fn unknown_players_get_default_personality() {
        let state = AiState::default();
        assert_eq!(state.personality_of(7), Personality::default());
    }
}
