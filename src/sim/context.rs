use std::collections::VecDeque;
use std::sync::Arc;

use rand::rngs::SmallRng;
use tracing::{debug, warn};

use super::runner::SimConfig;
use super::scheduler::{Callback, ScheduledCall, Scheduler};
use super::seed::make_rng;
use super::{collector, production};
use crate::ai::{self, AiState};
use crate::command::{Command, CommandOutcome, PendingCommand};
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingRegistry, EventKind, ProducerKey, ResourceId, World};

/// Everything a tick touches: world arena, scheduler, static data, AI state
/// and the queue of delayed commands. Passed explicitly to every component.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub config: SimConfig,
    pub registry: Arc<BuildingRegistry>,
    pub world: World,
    pub scheduler: Scheduler,
    pub ai: AiState,
    pub pending_commands: Vec<PendingCommand>,
    next_command_seq: u64,
    notify_queue: VecDeque<EntityId>,
    notifying: bool,
}

impl SimulationContext {
    pub fn new(config: SimConfig, registry: Arc<BuildingRegistry>) -> Self {
        Self::from_parts(config, registry, World::new(), Scheduler::new())
    }

    pub fn from_parts(
        config: SimConfig,
        registry: Arc<BuildingRegistry>,
        world: World,
        scheduler: Scheduler,
    ) -> Self {
        Self {
            config,
            registry,
            world,
            scheduler,
            ai: AiState::default(),
            pending_commands: Vec::new(),
            next_command_seq: 0,
            notify_queue: VecDeque::new(),
            notifying: false,
        }
    }

    pub fn current_tick(&self) -> u64 {
        self.scheduler.current_tick()
    }

    /// Advance one tick: run commands that came due, then every scheduled call
    /// due now in firing order. Returns the new tick.
    pub fn tick(&mut self) -> u64 {
        let tick = self.scheduler.advance();
        self.run_due_commands(tick);
        while let Some(call) = self.scheduler.pop_due() {
            self.dispatch(call);
        }
        tick
    }

    pub fn advance(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn dispatch(&mut self, call: ScheduledCall) {
        let result = match call.callback {
            Callback::ProductionStep { slot } => {
                production::production_step(self, ProducerKey::new(call.target, slot))
            }
            Callback::SettlementManagerTick => ai::settlement_manager::run_tick(self, call.target),
            Callback::CollectorRound => collector::collector_round(self, call.target),
            Callback::StorageRound => collector::storage_round(self, call.target),
            Callback::TaxRound => collector::tax_round(self, call.target),
        };
        match result {
            Ok(()) => {}
            Err(SimError::ReferenceNotFound(id)) => {
                debug!(target_id = call.target, missing = id, callback = ?call.callback, "dropped call on removed object");
            }
            Err(err) => {
                warn!(target_id = call.target, callback = ?call.callback, %err, "scheduled call failed");
            }
        }
    }

    /// RNG stream for `discriminator` at the current tick.
    pub fn rng(&self, discriminator: &str) -> SmallRng {
        make_rng(self.config.seed, self.current_tick(), discriminator)
    }

    pub fn record_event(&mut self, kind: EventKind, entity: EntityId, description: String) {
        let tick = self.current_tick();
        self.world.events.record(tick, kind, entity, description);
    }

    // -- Inventories ---------------------------------------------------------

    /// Apply `delta` to a holder's inventory and notify its observers.
    pub fn alter_inventory(
        &mut self,
        holder: EntityId,
        res: ResourceId,
        delta: i32,
    ) -> Result<i32, SimError> {
        let remainder = self.world.inventory_mut(holder)?.alter(res, delta);
        if remainder != delta {
            self.notify(holder);
        }
        Ok(remainder)
    }

    /// Move up to `amount` of `res` from `src` to `dst`, limited by stock and
    /// free space. Returns what moved.
    pub fn transfer(
        &mut self,
        src: EntityId,
        dst: EntityId,
        res: ResourceId,
        amount: u32,
    ) -> Result<u32, SimError> {
        let available = self.world.inventory(src)?.get(res);
        let space = self.world.inventory(dst)?.free_space_for(res);
        let moved = amount.min(available).min(space);
        if moved == 0 {
            return Ok(0);
        }
        let delta = i32::try_from(moved).unwrap_or(i32::MAX);
        let taken = self.world.inventory_mut(src)?.alter(res, -delta);
        let refused = self.world.inventory_mut(dst)?.alter(res, delta);
        assert_eq!(taken, 0, "transfer took more {res} than {src} held");
        assert_eq!(refused, 0, "transfer overfilled {res} at {dst}");
        self.notify(src);
        self.notify(dst);
        Ok(delta as u32)
    }

    /// Deliver the changed notification of `holder`'s inventory to its
    /// observers in registration order. Notifications raised while delivering
    /// are queued behind the current one instead of nesting.
    pub fn notify(&mut self, holder: EntityId) {
        self.notify_queue.push_back(holder);
        if self.notifying {
            return;
        }
        self.notifying = true;
        while let Some(next) = self.notify_queue.pop_front() {
            let observers = match self.world.inventory(next) {
                Ok(inv) => inv.observers().to_vec(),
                Err(_) => continue,
            };
            for key in observers {
                if let Err(err) = production::check_startable(self, key) {
                    warn!(building = key.building, slot = key.slot, %err, "producer check failed");
                }
            }
        }
        self.notifying = false;
    }

    // -- Commands ------------------------------------------------------------

    /// Execute a command right now.
    pub fn execute(
        &mut self,
        issuer: Option<EntityId>,
        command: impl Into<Command>,
    ) -> Result<CommandOutcome, SimError> {
        let command: Command = command.into();
        command.execute(self, issuer)
    }

    /// Queue a command to run after the configured execution delay. It is
    /// validated again when it runs.
    pub fn issue(&mut self, issuer: Option<EntityId>, command: impl Into<Command>) -> u64 {
        let execute_at = self.current_tick() + self.config.command_delay.max(1);
        let seq = self.next_command_seq;
        self.next_command_seq += 1;
        self.pending_commands.push(PendingCommand {
            seq,
            execute_at,
            issuer,
            command: command.into(),
        });
        execute_at
    }

    /// Restore queued commands from a save; sequence numbers keep their order.
    pub fn restore_commands(&mut self, mut commands: Vec<PendingCommand>) {
        commands.sort_by_key(|c| (c.execute_at, c.seq));
        self.next_command_seq = commands.iter().map(|c| c.seq + 1).max().unwrap_or(0);
        self.pending_commands = commands;
    }

    fn run_due_commands(&mut self, tick: u64) {
        if self.pending_commands.is_empty() {
            return;
        }
        let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_commands)
            .into_iter()
            .partition(|c| c.execute_at <= tick);
        self.pending_commands = later;
        for pending in due {
            if let Err(err) = pending.command.execute(self, pending.issuer) {
                debug!(seq = pending.seq, %err, "delayed command rejected");
            }
        }
    }
}
