use serde::{Deserialize, Serialize};

/// Configuration for map generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapGenConfig {
    /// RNG seed for deterministic generation.
    pub seed: u64,
    /// Layout method 0, 1 or 2; `None` picks one at random.
    pub method: Option<u8>,
    /// Map width in tiles (method 2).
    pub map_width: i32,
    /// Map height in tiles (method 2).
    pub map_height: i32,
    /// Island side length bounds for method 2.
    pub min_island_size: i32,
    pub max_island_size: i32,
    /// Upper bound on islands for method 2.
    pub max_islands: u32,
    /// Minimum gap between islands in tiles.
    pub min_space: i32,
    /// Mean and spread of the share of the map covered by land (method 2).
    pub land_mean: f64,
    pub land_deviation: f64,
    /// Grid cell size of the 3x3 layout (method 0).
    pub grid_spacing: i32,
    /// Island side length bounds of the 3x3 layout; the single large island
    /// is twice this size.
    pub grid_island_min: i32,
    pub grid_island_max: i32,
    /// Chance for each land tile to grow a tree.
    pub tree_density: f64,
    /// Clay deposits per island are drawn from `0..=max_clay_deposits`.
    pub max_clay_deposits: u32,
}

impl Default for MapGenConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            method: None,
            map_width: 140,
            map_height: 140,
            min_island_size: 20,
            max_island_size: 65,
            max_islands: 20,
            min_space: 2,
            land_mean: 0.45,
            land_deviation: 0.07,
            grid_spacing: 35,
            grid_island_min: 25,
            grid_island_max: 28,
            tree_density: 0.2,
            max_clay_deposits: 2,
        }
    }
}
