use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::building::Rect;
use super::terrain::Ground;
use super::tile_map::{self, Tile};
use crate::id::EntityId;

/// An island placed on the world map. Tile coordinates are world coordinates;
/// `origin` is where the generator's local (0, 0) landed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Island {
    pub id: EntityId,
    pub origin: Tile,
    /// The id string the island was generated from, if any.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(with = "tile_map")]
    pub ground: BTreeMap<Tile, Ground>,
    /// Building covering each occupied tile.
    #[serde(with = "tile_map", default)]
    pub occupancy: BTreeMap<Tile, EntityId>,
}

impl Island {
    pub fn new(id: EntityId, origin: Tile) -> Self {
        Self {
            id,
            origin,
            source: None,
            ground: BTreeMap::new(),
            occupancy: BTreeMap::new(),
        }
    }

    /// Translate generator-local ground into world coordinates.
    pub fn from_local(id: EntityId, origin: Tile, local: BTreeMap<Tile, Ground>) -> Self {
        let ground = local
            .into_iter()
            .map(|((x, y), g)| ((x + origin.0, y + origin.1), g))
            .collect();
        Self {
            ground,
            ..Self::new(id, origin)
        }
    }

    pub fn ground_at(&self, tile: Tile) -> Option<Ground> {
        self.ground.get(&tile).copied()
    }

    pub fn is_buildable(&self, tile: Tile) -> bool {
        self.ground_at(tile).is_some_and(Ground::is_buildable)
    }

    pub fn occupant(&self, tile: Tile) -> Option<EntityId> {
        self.occupancy.get(&tile).copied()
    }

    pub fn occupy(&mut self, area: Rect, building: EntityId) {
        for tile in area.tiles() {
            self.occupancy.insert(tile, building);
        }
    }

    pub fn vacate(&mut self, building: EntityId) {
        self.occupancy.retain(|_, b| *b != building);
    }

    pub fn land_tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        self.ground
            .iter()
            .filter(|(_, g)| g.is_buildable())
            .map(|(&t, _)| t)
    }

    /// Bounding rectangle of everything the island covers, coastline included.
    pub fn bounds(&self) -> Option<Rect> {
        let (first, _) = self.ground.first_key_value()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in self.ground.keys() {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }
}
