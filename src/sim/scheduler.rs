//! Tick-counted deferred calls.
//!
//! Calls are keyed by `(due tick, insertion sequence)`, so calls due on the
//! same tick fire in the order they were added on every run. Periodic work is
//! expressed by a callback adding itself again; there is no repeat primitive.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::EntityId;

/// What to run on the target object when a call fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Callback {
    /// Completion of the running cycle of producer `slot` on a building.
    ProductionStep { slot: usize },
    SettlementManagerTick,
    /// A consuming building fetches its inputs.
    CollectorRound,
    /// A storage building picks up finished goods.
    StorageRound,
    /// A settlement pays its owner.
    TaxRound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledCall {
    pub target: EntityId,
    pub callback: Callback,
    pub due: u64,
    pub seq: u64,
}

/// Persisted form of a pending call: the countdown, never an absolute tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCall {
    pub target: EntityId,
    pub callback: Callback,
    pub remaining_ticks: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheduler {
    current_tick: u64,
    next_seq: u64,
    calls: BTreeMap<(u64, u64), (EntityId, Callback)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Run `callback` on `target` after `delay` ticks. A delay of zero is
    /// treated as one: nothing scheduled from inside a tick fires in that tick.
    pub fn add_call(&mut self, target: EntityId, callback: Callback, delay: u64) -> u64 {
        let due = self.current_tick + delay.max(1);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.calls.insert((due, seq), (target, callback));
        due
    }

    /// Withdraw every pending `(target, callback)` call. Returns how many were removed.
    pub fn cancel_calls_for(&mut self, target: EntityId, callback: Callback) -> usize {
        let before = self.calls.len();
        self.calls
            .retain(|_, (t, cb)| !(*t == target && *cb == callback));
        before - self.calls.len()
    }

    /// Withdraw everything scheduled on a removed object.
    pub fn cancel_all_for(&mut self, target: EntityId) -> usize {
        let before = self.calls.len();
        self.calls.retain(|_, (t, _)| *t != target);
        before - self.calls.len()
    }

    /// Ticks until the earliest pending `(target, callback)` fires.
    pub fn remaining_ticks(&self, target: EntityId, callback: Callback) -> Option<u64> {
        self.calls
            .iter()
            .find(|(_, (t, cb))| *t == target && *cb == callback)
            .map(|(&(due, _), _)| due - self.current_tick)
    }

    pub fn has_call(&self, target: EntityId, callback: Callback) -> bool {
        self.remaining_ticks(target, callback).is_some()
    }

    /// Move the clock forward one tick and return the new tick.
    pub fn advance(&mut self) -> u64 {
        self.current_tick += 1;
        self.current_tick
    }

    /// Remove and return the next call due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<ScheduledCall> {
        let (&(due, seq), _) = self.calls.first_key_value()?;
        if due > self.current_tick {
            return None;
        }
        let (target, callback) = self.calls.remove(&(due, seq))?;
        Some(ScheduledCall {
            target,
            callback,
            due,
            seq,
        })
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Pending calls in firing order.
    pub fn snapshot(&self) -> Vec<PendingCall> {
        self.calls
            .iter()
            .map(|(&(due, _), &(target, callback))| PendingCall {
                target,
                callback,
                remaining_ticks: due - self.current_tick,
            })
            .collect()
    }

    /// Rebuild a scheduler at `current_tick` from a snapshot. Firing order is
    /// preserved because rows are re-inserted in snapshot order.
    pub fn restore(current_tick: u64, calls: impl IntoIterator<Item = PendingCall>) -> Self {
        let mut scheduler = Self {
            current_tick,
            ..Self::default()
        };
        for call in calls {
            let due = current_tick + call.remaining_ticks;
            let seq = scheduler.next_seq;
            scheduler.next_seq += 1;
            scheduler.calls.insert((due, seq), (call.target, call.callback));
        }
        scheduler
    }
}
