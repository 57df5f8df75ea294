//! Map layouts: where islands go and which random island each one is.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use super::config::MapGenConfig;
use super::island::{CreationMethod, RandomIslandId};
use crate::model::Rect;
use crate::model::tile_map::Tile;

/// Tries per island before method 2 gives up on it.
const PLACEMENT_ATTEMPTS: usize = 7;

/// Origin of the single large island.
const CENTER_ORIGIN: Tile = (20, 20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandPlacement {
    pub origin: Tile,
    pub id: RandomIslandId,
}

/// Normal sample via Box-Muller.
fn gauss(rng: &mut dyn RngCore, mean: f64, deviation: f64) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    mean + deviation * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

fn island(rng: &mut dyn RngCore, method: CreationMethod, width: i32, height: i32) -> RandomIslandId {
    RandomIslandId {
        method,
        width,
        height,
        seed: rng.random(),
    }
}

fn large_island(rng: &mut dyn RngCore, config: &MapGenConfig) -> IslandPlacement {
    let (lo, hi) = (config.grid_island_min * 2, config.grid_island_max * 2);
    let width = rng.random_range(lo..=hi);
    let height = rng.random_range(lo..=hi);
    IslandPlacement {
        origin: CENTER_ORIGIN,
        id: island(rng, CreationMethod::Large, width, height),
    }
}

/// Up to nine small islands on a jittered 3x3 grid. With fewer than two the
/// map gets one large island instead.
fn grid_layout(rng: &mut dyn RngCore, config: &MapGenConfig) -> Vec<IslandPlacement> {
    let spacing = f64::from(config.grid_spacing);
    let mut islands = Vec::new();
    for (gx, gy) in Rect::new(0, 0, 3, 3).tiles() {
        if rng.random_range(0..=2) == 0 {
            continue;
        }
        let x = (f64::from(gx) * spacing * (rng.random::<f64>() / 6.0 + 0.90)) as i32;
        let y = (f64::from(gy) * spacing * (rng.random::<f64>() / 6.0 + 0.90)) as i32;
        let width = rng.random_range(config.grid_island_min..=config.grid_island_max);
        let height = rng.random_range(config.grid_island_min..=config.grid_island_max);
        islands.push(IslandPlacement {
            origin: (x, y),
            id: island(rng, CreationMethod::Small, width, height),
        });
    }
    if islands.len() <= 1 {
        return vec![large_island(rng, config)];
    }
    islands
}

/// Randomly sized islands scattered over the map until a sampled share of
/// it is land. Islands keep `min_space` tiles apart.
fn scattered_layout(rng: &mut dyn RngCore, config: &MapGenConfig) -> Vec<IslandPlacement> {
    let (min, max) = (config.min_island_size, config.max_island_size);
    let coefficient = gauss(rng, config.land_mean, config.land_deviation).clamp(0.3, 0.6);
    let max_land = f64::from(config.map_width * config.map_height) * coefficient;

    let mut placed: Vec<Rect> = Vec::new();
    let mut islands = Vec::new();
    let mut land = 0.0;
    for _ in 0..config.max_islands {
        let size_modifier = 1.1 - 0.2 * land / max_land;
        let width = rng.random_range(min - 5..=max);
        let width = ((f64::from(width) * size_modifier).round() as i32).clamp(min, max);
        let ratio = gauss(rng, 1.0, 0.2).clamp(0.25, 4.0);
        let height = ((f64::from(width) * ratio).round() as i32).clamp(min, max);
        let size = f64::from(width * height);
        if land + size > max_land {
            continue;
        }

        for _ in 0..PLACEMENT_ATTEMPTS {
            let x = rng.random_range(0..=(config.map_width - width).max(0));
            let y = rng.random_range(0..=(config.map_height - height).max(0));
            let rect = Rect::new(x, y, width, height);
            if placed.iter().any(|other| rect.distance(other) < config.min_space) {
                continue;
            }
            islands.push(IslandPlacement {
                origin: (x, y),
                id: island(rng, CreationMethod::Varied, width, height),
            });
            placed.push(rect);
            land += size;
            break;
        }
    }
    islands
}

/// Lay out the islands of a new map. Method 0 is the 3x3 grid, 1 a single
/// large island, 2 scattered islands; unset, method 2 is picked 80% of the
/// time.
pub fn generate_map(config: &MapGenConfig) -> Vec<IslandPlacement> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let method = config.method.unwrap_or_else(|| rng.random_range(0..=9u8).min(2));
    match method {
        0 => grid_layout(&mut rng, config),
        1 => vec![large_island(&mut rng, config)],
        _ => scattered_layout(&mut rng, config),
    }
}
