use serde::{Deserialize, Serialize};

/// Tunables of the AI players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    /// Chains are sized at this multiple of resident demand.
    pub slack_factor: f64,
    pub faith_min_tents: usize,
    pub textile_min_tents: usize,
    pub tents_to_build: usize,
    /// Production buildings a single storage building can serve.
    pub producers_per_storage: usize,
    pub initial_tax: f64,
    /// Tax while the first residences upgrade by hand.
    pub upgrading_tax: f64,
    pub settled_tax: f64,
    /// Residences upgraded at a time while the player is on the first tier.
    pub first_tier_upgrades: u32,
    /// Fewer free 3x3 squares than this and the AI looks for a feeder island.
    pub feeder_island_cutoff: usize,
    pub trees_per_lumberjack: usize,
    pub village_road_length: i32,
    pub found_feeder_island_priority: u32,
    pub road_network_priority: u32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            slack_factor: 1.02,
            faith_min_tents: 10,
            textile_min_tents: 16,
            tents_to_build: 16,
            producers_per_storage: 4,
            initial_tax: 0.5,
            upgrading_tax: 0.9,
            settled_tax: 0.5,
            first_tier_upgrades: 1,
            feeder_island_cutoff: 6,
            trees_per_lumberjack: 4,
            village_road_length: 12,
            found_feeder_island_priority: 200,
            road_network_priority: 100,
        }
    }
}
