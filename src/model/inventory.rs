use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::production::ProducerKey;
use super::resource::ResourceId;

/// Capacity used for inventories that should never fill up (player wallets).
pub const UNLIMITED: u32 = u32::MAX;

/// Bounded per-resource storage.
///
/// Invariant: `0 <= amount <= limit` for every resource, except that lowering
/// a limit never destroys goods already stored above it.
///
/// The inventory only records who observes it; the simulation context delivers
/// the "changed" notification to those observers, in registration order, after
/// every routed `alter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    amounts: BTreeMap<ResourceId, u32>,
    default_limit: u32,
    #[serde(default)]
    limits: BTreeMap<ResourceId, u32>,
    #[serde(default)]
    observers: Vec<ProducerKey>,
}

impl Inventory {
    pub fn new(default_limit: u32) -> Self {
        Self {
            amounts: BTreeMap::new(),
            default_limit,
            limits: BTreeMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_limit(mut self, res: ResourceId, limit: u32) -> Self {
        self.limits.insert(res, limit);
        self
    }

    pub fn get(&self, res: ResourceId) -> u32 {
        self.amounts.get(&res).copied().unwrap_or(0)
    }

    pub fn limit(&self, res: ResourceId) -> u32 {
        self.limits.get(&res).copied().unwrap_or(self.default_limit)
    }

    pub fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub fn set_default_limit(&mut self, limit: u32) {
        self.default_limit = limit;
    }

    pub fn free_space_for(&self, res: ResourceId) -> u32 {
        self.limit(res).saturating_sub(self.get(res))
    }

    /// Apply `delta`, clipped to `[0, limit]`. Returns the part that could not
    /// be applied: negative when stock ran out, positive when capacity did.
    pub fn alter(&mut self, res: ResourceId, delta: i32) -> i32 {
        let current = i64::from(self.get(res));
        let upper = i64::from(self.limit(res)).max(current);
        let target = current + i64::from(delta);
        let applied = target.clamp(0, upper);
        if applied == 0 {
            self.amounts.remove(&res);
        } else {
            self.amounts.insert(res, applied as u32);
        }
        (target - applied) as i32
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceId, u32)> + '_ {
        self.amounts.iter().map(|(&r, &a)| (r, a))
    }

    pub fn total(&self) -> u64 {
        self.amounts.values().map(|&a| u64::from(a)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    pub fn add_observer(&mut self, key: ProducerKey) {
        if !self.observers.contains(&key) {
            self.observers.push(key);
        }
    }

    pub fn remove_observer(&mut self, key: ProducerKey) {
        self.observers.retain(|k| *k != key);
    }

    pub fn has_observer(&self, key: ProducerKey) -> bool {
        self.observers.contains(&key)
    }

    pub fn observers(&self) -> &[ProducerKey] {
        &self.observers
    }
}
