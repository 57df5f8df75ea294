//! Random island shapes.
//!
//! An island is described by an id string `random:<method>:<width>:<height>:<seed>`
//! and rebuilt from it on demand, so saves only need the string. Circles and
//! rectangles are stamped onto a tile set, the largest connected piece is
//! kept, single-tile gulfs and straits are filled, and three coastline rings
//! (land to sand, sand to shallow water, shallow to deep water) are laid
//! around it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;

use crate::model::tile_map::Tile;
use crate::model::{Edge, Ground, Rect, Shell};

pub const RANDOM_ISLAND_PREFIX: &str = "random";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IslandIdError {
    #[error("not a random island id: {0}")]
    Malformed(String),
    #[error("unknown creation method {0}")]
    UnknownMethod(u8),
}

/// How the shapes of an island are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CreationMethod {
    /// Small island for the 3x3 grid layout.
    Small = 0,
    /// One large island.
    Large = 1,
    /// Freely sized islands; shapes may also cut land away.
    Varied = 2,
}

impl TryFrom<u8> for CreationMethod {
    type Error = IslandIdError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CreationMethod::Small),
            1 => Ok(CreationMethod::Large),
            2 => Ok(CreationMethod::Varied),
            other => Err(IslandIdError::UnknownMethod(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomIslandId {
    pub method: CreationMethod,
    pub width: i32,
    pub height: i32,
    pub seed: i64,
}

impl fmt::Display for RandomIslandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{RANDOM_ISLAND_PREFIX}:{}:{}:{}:{}",
            self.method as u8, self.width, self.height, self.seed
        )
    }
}

impl FromStr for RandomIslandId {
    type Err = IslandIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || IslandIdError::Malformed(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        let [prefix, method, width, height, seed] = parts[..] else {
            return Err(malformed());
        };
        if prefix != RANDOM_ISLAND_PREFIX {
            return Err(malformed());
        }
        let method: u8 = method.parse().map_err(|_| malformed())?;
        let width: u16 = width.parse().map_err(|_| malformed())?;
        let height: u16 = height.parse().map_err(|_| malformed())?;
        let seed: i64 = seed.parse().map_err(|_| malformed())?;
        Ok(Self {
            method: CreationMethod::try_from(method)?,
            width: i32::from(width),
            height: i32::from(height),
            seed,
        })
    }
}

pub fn is_random_island_id(s: &str) -> bool {
    s.parse::<RandomIslandId>().is_ok()
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Rect(Rect),
    Circle { center: Tile, radius: i32 },
}

impl Shape {
    fn tiles(&self) -> Vec<Tile> {
        match *self {
            Shape::Rect(rect) => rect.tiles().collect(),
            Shape::Circle { center: (cx, cy), radius } => (-radius..=radius)
                .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
                .filter(|(dx, dy)| dx * dx + dy * dy <= radius * radius)
                .map(|(dx, dy)| (cx + dx, cy + dy))
                .collect(),
        }
    }
}

/// Uniform in `lo..=hi`, or `lo` when the range is empty.
fn pick(rng: &mut dyn RngCore, lo: i32, hi: i32) -> i32 {
    if hi <= lo { lo } else { rng.random_range(lo..=hi) }
}

fn stamp_shapes(id: &RandomIslandId, rng: &mut dyn RngCore) -> BTreeSet<Tile> {
    let (width, height) = (id.width, id.height);
    let mut land = BTreeSet::new();

    for _ in 0..15 + width * height / 45 {
        let mut add = true;
        let mut rect_chance = 6;
        let shape_id = match id.method {
            CreationMethod::Small => rng.random_range(3..=5),
            CreationMethod::Large => rng.random_range(5..=8),
            CreationMethod::Varied => {
                let shape_id = rng.random_range(2..=8);
                rect_chance = 29;
                if rng.random_range(0..=4) == 0 {
                    rect_chance = 13;
                    add = false;
                }
                shape_id
            }
        };

        let shape = if rng.random_range(1..=rect_chance) == 1 {
            if add {
                let x = pick(rng, 8, width - 7);
                let y = pick(rng, 8, height - 7);
                Some(Shape::Rect(match id.method {
                    CreationMethod::Small => Rect::new(x - 3, y - 3, 5, 5),
                    CreationMethod::Large => Rect::new(x - 5, y - 5, 8, 8),
                    CreationMethod::Varied => {
                        let w = rng.random_range(2..=8);
                        Rect::new(x - 5, y - 5, w, rng.random_range(2..=8))
                    }
                }))
            } else {
                let x = pick(rng, 0, width);
                let y = pick(rng, 0, height);
                let w = rng.random_range(2..=8);
                Some(Shape::Rect(Rect::new(x - 5, y - 5, w, rng.random_range(2..=8))))
            }
        } else {
            let radius = shape_id;
            if !add && rng.random_range(0..=6) < 5 {
                let x = pick(rng, -radius * 3 / 2, width + radius * 3 / 2);
                let y = pick(rng, -radius * 3 / 2, height + radius * 3 / 2);
                Some(Shape::Circle { center: (x, y), radius })
            } else if width - radius - 4 >= radius + 3 && height - radius - 4 >= radius + 3 {
                let x = rng.random_range(radius + 3..=width - radius - 4);
                let y = rng.random_range(radius + 3..=height - radius - 4);
                Some(Shape::Circle { center: (x, y), radius })
            } else {
                None
            }
        };

        let Some(shape) = shape else { continue };
        for tile in shape.tiles() {
            if add {
                land.insert(tile);
            } else {
                land.remove(&tile);
            }
        }
    }
    land
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

const CROSS: [Tile; 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const RING: [Tile; 8] = [(-1, -1), (0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0)];
const KNIGHT_MOVES: [Tile; 8] = [(-2, -1), (-2, 1), (-1, -2), (-1, 2), (1, -2), (1, 2), (2, -1), (2, 1)];
const DIAGONALS: [Tile; 2] = [(-1, -1), (-1, 1)];

fn offset((x, y): Tile, (dx, dy): Tile) -> Tile {
    (x + dx, y + dy)
}

/// Largest 4-connected piece; ties go to the piece found first in tile order.
pub fn largest_component(tiles: &BTreeSet<Tile>) -> BTreeSet<Tile> {
    let mut seen = BTreeSet::new();
    let mut best = BTreeSet::new();
    for &start in tiles {
        if !seen.insert(start) {
            continue;
        }
        let mut component = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(tile) = queue.pop_front() {
            for d in CROSS {
                let next = offset(tile, d);
                if tiles.contains(&next) && seen.insert(next) {
                    component.insert(next);
                    queue.push_back(next);
                }
            }
        }
        if component.len() > best.len() {
            best = component;
        }
    }
    best
}

/// Tiles just off `tiles`, diagonals included.
pub fn outline(tiles: &BTreeSet<Tile>) -> BTreeSet<Tile> {
    tiles
        .iter()
        .flat_map(|&t| RING.iter().map(move |&d| offset(t, d)))
        .filter(|t| !tiles.contains(t))
        .collect()
}

fn is_edge(tiles: &BTreeSet<Tile>, tile: Tile) -> bool {
    RING.iter().any(|&d| !tiles.contains(&offset(tile, d)))
}

/// Tiles that would leave a one-tile gulf or strait next to `tiles`.
fn tiny_spaces(tiles: &BTreeSet<Tile>) -> BTreeSet<Tile> {
    // Water on no side, one side, or two opposite sides of an off-island tile.
    const BAD_CONFIGS: [u8; 7] = [0, 1, 2, 4, 8, 1 | 8, 2 | 4];

    let mut fill = BTreeSet::new();
    for &tile in tiles.iter().filter(|&&t| is_edge(tiles, t)) {
        let (x, y) = tile;
        for d in CROSS {
            let off = offset(tile, d);
            if tiles.contains(&off) {
                continue;
            }
            let water: u8 = CROSS
                .iter()
                .enumerate()
                .filter(|(_, n)| !tiles.contains(&offset(off, **n)))
                .map(|(i, _)| 1u8 << i)
                .sum();
            let diagonal_gulf = DIAGONALS.iter().any(|&(dx, dy)| {
                tiles.contains(&offset(off, (dx, dy))) && tiles.contains(&offset(off, (-dx, -dy)))
            });
            if BAD_CONFIGS.contains(&water) || diagonal_gulf {
                fill.insert(off);
            }
        }

        for (dx, dy) in KNIGHT_MOVES {
            if !tiles.contains(&(x + dx, y + dy)) {
                continue;
            }
            let gap = if dx.abs() == 1 {
                let gap = (x + dx, y + dy / 2);
                if tiles.contains(&gap) || tiles.contains(&(x, y + dy / 2)) {
                    continue;
                }
                gap
            } else {
                let gap = (x + dx / 2, y + dy);
                if tiles.contains(&gap) || tiles.contains(&(x + dx / 2, y)) {
                    continue;
                }
                gap
            };
            fill.insert(gap);
        }

        for (dx, dy) in DIAGONALS {
            let corner = (x + dx, y + dy);
            if !tiles.contains(&corner) && tiles.contains(&(x + 2 * dx, y + 2 * dy)) {
                fill.insert(corner);
            } else if tiles.contains(&corner)
                && !tiles.contains(&(x + dx, y))
                && !tiles.contains(&(x, y + dy))
            {
                fill.insert((x + dx, y));
            }
        }
    }
    fill
}

/// Fill one-tile gulfs and straits until none are left. Returns the added
/// tiles.
pub fn fill_tiny_spaces(tiles: &mut BTreeSet<Tile>) -> BTreeSet<Tile> {
    let mut added = BTreeSet::new();
    loop {
        let fill = tiny_spaces(tiles);
        if fill.is_empty() {
            return added;
        }
        tiles.extend(fill.iter().copied());
        added.extend(fill);
    }
}

// ---------------------------------------------------------------------------
// Coastline
// ---------------------------------------------------------------------------

const N: u8 = 1;
const NE: u8 = 1 << 1;
const E: u8 = 1 << 2;
const SE: u8 = 1 << 3;
const S: u8 = 1 << 4;
const SW: u8 = 1 << 5;
const W: u8 = 1 << 6;
const NW: u8 = 1 << 7;

/// Which of the eight neighbors of `tile` are in `tiles`; y grows southward.
pub fn neighbor_mask(tiles: &BTreeSet<Tile>, tile: Tile) -> u8 {
    [
        ((0, -1), N),
        ((1, -1), NE),
        ((1, 0), E),
        ((1, 1), SE),
        ((0, 1), S),
        ((-1, 1), SW),
        ((-1, 0), W),
        ((-1, -1), NW),
    ]
    .into_iter()
    .filter(|(d, _)| tiles.contains(&offset(tile, *d)))
    .fold(0, |mask, (_, bit)| mask | bit)
}

/// Edge variant of an outline tile from the inner ring around it, or `None`
/// for shapes no variant covers.
pub fn classify_edge(mask: u8) -> Option<Edge> {
    let straight = |side: u8, left: u8, right: u8| {
        [side, side | left, side | right, side | left | right].contains(&mask)
    };
    let has = |bits: u8| mask & bits == bits;

    if straight(S, SE, SW) {
        Some(Edge::North)
    } else if straight(E, NE, SE) {
        Some(Edge::West)
    } else if straight(N, NE, NW) {
        Some(Edge::South)
    } else if straight(W, NW, SW) {
        Some(Edge::East)
    } else if mask == SE {
        Some(Edge::OuterNorthWest)
    } else if mask == NE {
        Some(Edge::OuterSouthWest)
    } else if mask == NW {
        Some(Edge::OuterSouthEast)
    } else if mask == SW {
        Some(Edge::OuterNorthEast)
    } else if (3..=5).contains(&mask.count_ones()) {
        if has(E | SE | S) {
            Some(Edge::InnerNorthWest)
        } else if has(S | SW | W) {
            Some(Edge::InnerNorthEast)
        } else if has(W | NW | N) {
            Some(Edge::InnerSouthEast)
        } else if has(N | NE | E) {
            Some(Edge::InnerSouthWest)
        } else {
            None
        }
    } else {
        None
    }
}

/// Lay one coastline ring around `tiles`. Tiny spaces and outline tiles no
/// edge variant fits are absorbed as `filler` first, until neither is left.
fn add_shell(
    tiles: &mut BTreeSet<Tile>,
    ground: &mut BTreeMap<Tile, Ground>,
    shell: Shell,
    filler: Ground,
) {
    let ring = loop {
        for tile in fill_tiny_spaces(tiles) {
            ground.insert(tile, filler);
        }
        let (ring, odd): (Vec<_>, Vec<_>) = outline(tiles)
            .into_iter()
            .map(|t| (t, classify_edge(neighbor_mask(tiles, t))))
            .partition(|(_, edge)| edge.is_some());
        if odd.is_empty() {
            break ring;
        }
        for (tile, _) in odd {
            tiles.insert(tile);
            ground.insert(tile, filler);
        }
    };
    for (tile, edge) in ring {
        if let Some(edge) = edge {
            ground.insert(tile, Ground::Coastline { shell, edge });
            tiles.insert(tile);
        }
    }
}

/// Ground of the island `id` describes, in island-local coordinates.
/// Everything not in the map is deep water.
pub fn create_random_island(id: &RandomIslandId) -> BTreeMap<Tile, Ground> {
    let mut rng = SmallRng::seed_from_u64(id.seed as u64);
    let mut tiles = largest_component(&stamp_shapes(id, &mut rng));

    let mut ground: BTreeMap<Tile, Ground> = tiles.iter().map(|&t| (t, Ground::Land)).collect();
    if tiles.is_empty() {
        return ground;
    }
    add_shell(&mut tiles, &mut ground, Shell::Beach, Ground::Land);
    add_shell(&mut tiles, &mut ground, Shell::Coast, Ground::Sand);
    add_shell(&mut tiles, &mut ground, Shell::Deep, Ground::ShallowWater);
    ground
}
