use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::resource::ResourceId;
use crate::id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u32);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line#{}", self.0)
    }
}

/// A static recipe: consumed resources carry negative deltas, produced ones
/// positive deltas. `duration` is in game seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub id: LineId,
    #[serde(default)]
    pub name: String,
    pub duration: u32,
    pub deltas: BTreeMap<ResourceId, i32>,
}

impl ProductionLine {
    /// Consumed resources with their (positive) required amounts.
    pub fn consumed(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.deltas
            .iter()
            .filter(|(_, d)| **d < 0)
            .map(|(&r, &d)| (r, d.unsigned_abs()))
    }

    pub fn produced(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.deltas
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(&r, &d)| (r, d as u32))
    }

    pub fn needed(&self, res: ResourceId) -> u32 {
        match self.deltas.get(&res) {
            Some(&d) if d < 0 => d.unsigned_abs(),
            _ => 0,
        }
    }

    pub fn produced_amount(&self, res: ResourceId) -> u32 {
        match self.deltas.get(&res) {
            Some(&d) if d > 0 => d as u32,
            _ => 0,
        }
    }

    pub fn total_needed(&self) -> u32 {
        self.consumed().map(|(_, a)| a).sum()
    }

    /// Primary producers (trees, fields) need nothing and run on a timer.
    pub fn is_primary(&self) -> bool {
        self.total_needed() == 0
    }

    pub fn ticks(&self, ticks_per_second: u64) -> u64 {
        u64::from(self.duration) * ticks_per_second
    }
}

/// Addresses one producer: the owning building and the producer slot on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProducerKey {
    pub building: EntityId,
    pub slot: usize,
}

impl ProducerKey {
    pub fn new(building: EntityId, slot: usize) -> Self {
        Self { building, slot }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionState {
    Inactive,
    WaitingForInput,
    Working,
    OutputReady,
}

/// Runtime production state of one producer slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub lines: Vec<LineId>,
    pub active_line: Option<LineId>,
    pub state: ProductionState,
    /// 0..=100, share of the required inputs already reserved.
    pub progress: u8,
    /// Inputs already debited from the inventory for the running cycle.
    pub reserved: BTreeMap<ResourceId, u32>,
    /// Remaining ticks of a working cycle that was paused.
    #[serde(default)]
    pub suspended_ticks: Option<u64>,
    /// Output that did not fit into the inventory on completion.
    #[serde(default)]
    pub pending_output: BTreeMap<ResourceId, u32>,
    /// Waiting because the outputs would overflow capacity.
    #[serde(default)]
    pub blocked_on_output: bool,
    /// Set on residence upgrade producers.
    #[serde(default)]
    pub upgrade: bool,
    #[serde(default)]
    pub completed_cycles: u32,
}

impl Producer {
    pub fn new(mut lines: Vec<LineId>) -> Self {
        lines.sort();
        lines.dedup();
        Self {
            lines,
            active_line: None,
            state: ProductionState::Inactive,
            progress: 0,
            reserved: BTreeMap::new(),
            suspended_ticks: None,
            pending_output: BTreeMap::new(),
            blocked_on_output: false,
            upgrade: false,
            completed_cycles: 0,
        }
    }

    pub fn upgrade(lines: Vec<LineId>) -> Self {
        Self {
            upgrade: true,
            ..Self::new(lines)
        }
    }

    pub fn is_active(&self) -> bool {
        self.state != ProductionState::Inactive
    }

    pub fn is_paused(&self) -> bool {
        !self.is_active()
    }

    /// Lowest line id, used when activating without a selected line.
    pub fn default_line(&self) -> Option<LineId> {
        self.lines.first().copied()
    }

    pub fn reserved_of(&self, res: ResourceId) -> u32 {
        self.reserved.get(&res).copied().unwrap_or(0)
    }

    pub fn reserved_total(&self) -> u32 {
        self.reserved.values().sum()
    }
}
