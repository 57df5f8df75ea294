use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::{AiPlayer, SettlementManager, TaskType};
use crate::command::PendingCommand;
use crate::error::SimError;
use crate::id::{EntityId, IdGenerator};
use crate::model::{Building, BuildingRegistry, Event, Island, Player, Settlement, Ship, World};
use crate::sim::{PendingCall, Scheduler, SimConfig, SimulationContext};

/// Singleton row: clock, id counter and the config the run was started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaRow {
    pub tick: u64,
    pub next_id: EntityId,
    pub config: SimConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerRow {
    pub id: EntityId,
    pub settlement: EntityId,
    pub village_built: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildQueueRow {
    pub manager: EntityId,
    pub position: u32,
    pub task: TaskType,
}

/// A full save, table by table. Row order is significant for
/// `scheduled_calls` (firing order) and `build_queue` (by position).
#[derive(Debug, Clone, PartialEq)]
pub struct SaveGame {
    pub meta: MetaRow,
    pub players: Vec<Player>,
    pub islands: Vec<Island>,
    pub settlements: Vec<Settlement>,
    pub ships: Vec<Ship>,
    pub buildings: Vec<Building>,
    pub events: Vec<Event>,
    pub scheduled_calls: Vec<PendingCall>,
    pub ai_players: Vec<AiPlayer>,
    pub managers: Vec<ManagerRow>,
    pub build_queue: Vec<BuildQueueRow>,
    pub pending_commands: Vec<PendingCommand>,
}

impl SaveGame {
    /// Snapshot a context between ticks.
    pub fn capture(ctx: &SimulationContext) -> Self {
        let world = &ctx.world;
        let mut managers = Vec::new();
        let mut build_queue = Vec::new();
        for manager in ctx.ai.managers.values() {
            managers.push(ManagerRow {
                id: manager.id,
                settlement: manager.settlement,
                village_built: manager.village_built,
            });
            build_queue.extend(manager.build_queue.iter().enumerate().map(|(i, &task)| {
                BuildQueueRow {
                    manager: manager.id,
                    position: i as u32,
                    task,
                }
            }));
        }

        Self {
            meta: MetaRow {
                tick: ctx.current_tick(),
                next_id: world.id_gen.peek(),
                config: ctx.config.clone(),
            },
            players: world.players.values().cloned().collect(),
            islands: world.islands.values().cloned().collect(),
            settlements: world.settlements.values().cloned().collect(),
            ships: world.ships.values().cloned().collect(),
            buildings: world.buildings.values().cloned().collect(),
            events: world.events.iter().cloned().collect(),
            scheduled_calls: ctx.scheduler.snapshot(),
            ai_players: ctx.ai.players.values().cloned().collect(),
            managers,
            build_queue,
            pending_commands: ctx.pending_commands.clone(),
        }
    }

    /// Rebuild a running context. Managers re-derive their chains and
    /// counters from `registry` and the restored world.
    pub fn restore(self, registry: Arc<BuildingRegistry>) -> Result<SimulationContext, SimError> {
        let world = World {
            players: self.players.into_iter().map(|p| (p.id, p)).collect(),
            ships: self.ships.into_iter().map(|s| (s.id, s)).collect(),
            islands: self.islands.into_iter().map(|i| (i.id, i)).collect(),
            settlements: self.settlements.into_iter().map(|s| (s.id, s)).collect(),
            buildings: self.buildings.into_iter().map(|b| (b.id, b)).collect(),
            events: self.events.into_iter().collect(),
            id_gen: IdGenerator::starting_from(self.meta.next_id),
        };
        let scheduler = Scheduler::restore(self.meta.tick, self.scheduled_calls);
        let mut ctx = SimulationContext::from_parts(self.meta.config, registry, world, scheduler);

        ctx.ai.players = self.ai_players.into_iter().map(|p| (p.player, p)).collect();

        let mut queues: BTreeMap<EntityId, Vec<BuildQueueRow>> = BTreeMap::new();
        for row in self.build_queue {
            queues.entry(row.manager).or_default().push(row);
        }
        for row in self.managers {
            let mut rows = queues.remove(&row.id).unwrap_or_default();
            rows.sort_by_key(|r| r.position);
            let queue: VecDeque<TaskType> = rows.into_iter().map(|r| r.task).collect();
            let manager = SettlementManager::restore(&ctx, row.id, row.settlement, queue, row.village_built)?;
            ctx.ai.managers.insert(row.id, manager);
        }

        ctx.restore_commands(self.pending_commands);
        Ok(ctx)
    }
}
