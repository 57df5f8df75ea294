use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::inventory::Inventory;
use super::production::{LineId, Producer};
use super::resource::ResourceId;
use super::traits::{HasInventory, HasOwner, HasProductionState};
use crate::id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingTypeId(pub u32);

impl fmt::Display for BuildingTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Behavior family of a building type. Dispatch on this replaces per-type classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    BranchOffice,
    Storage,
    Road,
    MainSquare,
    Residence,
    Production,
    Field,
    Nature,
    Deposit,
}

impl BuildingKind {
    /// Storage-like buildings claim land and hold the settlement's goods.
    pub fn is_storage(self) -> bool {
        matches!(self, BuildingKind::BranchOffice | BuildingKind::Storage)
    }

    /// Buildings whose output is picked up by storage collectors.
    pub fn is_production(self) -> bool {
        matches!(self, BuildingKind::Production | BuildingKind::Field)
    }
}

/// One producer slot of a building type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionSpec {
    pub lines: Vec<LineId>,
    /// Residences only run this production from this level on.
    #[serde(default)]
    pub min_level: u8,
    /// Upgrade productions start inactive and raise the building level.
    #[serde(default)]
    pub upgrade: bool,
}

/// Static, data-driven description of a building type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingType {
    pub id: BuildingTypeId,
    pub name: String,
    pub kind: BuildingKind,
    pub size: (i32, i32),
    #[serde(default)]
    pub costs: BTreeMap<ResourceId, u32>,
    #[serde(default)]
    pub productions: Vec<ProductionSpec>,
    #[serde(default = "default_inventory_limit")]
    pub inventory_limit: u32,
    /// Collector / claim radius in tiles.
    #[serde(default)]
    pub radius: i32,
    /// Player tier required to build this type.
    #[serde(default)]
    pub settler_level: u8,
    /// Must replace an existing building of this type (mines on deposits).
    #[serde(default)]
    pub buildable_on: Option<BuildingTypeId>,
    #[serde(default)]
    pub inhabitants: u32,
    #[serde(default)]
    pub max_level: u8,
}

fn default_inventory_limit() -> u32 {
    8
}

impl BuildingType {
    /// Footprint size after rotation; 90° and 270° swap the axes.
    pub fn rotated_size(&self, rotation: u16) -> (i32, i32) {
        if rotation % 180 == 90 {
            (self.size.1, self.size.0)
        } else {
            self.size
        }
    }

    pub fn is_square(&self) -> bool {
        self.size.0 == self.size.1
    }

    pub fn all_lines(&self) -> impl Iterator<Item = LineId> + '_ {
        self.productions.iter().flat_map(|p| p.lines.iter().copied())
    }

    pub fn cost(&self, res: ResourceId) -> u32 {
        self.costs.get(&res).copied().unwrap_or(0)
    }
}

pub const VALID_ROTATIONS: [u16; 4] = [0, 90, 180, 270];

/// Axis-aligned tile rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w - 1
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h - 1
    }

    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32)> {
        let Rect { x, y, w, h } = *self;
        (y..y + h).flat_map(move |ty| (x..x + w).map(move |tx| (tx, ty)))
    }

    pub fn contains(&self, (tx, ty): (i32, i32)) -> bool {
        tx >= self.x && tx <= self.right() && ty >= self.y && ty <= self.bottom()
    }

    /// Chebyshev distance between the closest tiles; 0 when overlapping, 1 when adjacent.
    pub fn distance(&self, other: &Rect) -> i32 {
        let dx = (self.x - other.right()).max(other.x - self.right()).max(0);
        let dy = (self.y - other.bottom()).max(other.y - self.bottom()).max(0);
        dx.max(dy)
    }

    pub fn distance_to_tile(&self, tile: (i32, i32)) -> i32 {
        self.distance(&Rect::new(tile.0, tile.1, 1, 1))
    }

    /// Edge-adjacent tiles around the rectangle, clockwise from the top-left.
    pub fn border_tiles(&self) -> Vec<(i32, i32)> {
        let mut out = Vec::with_capacity(2 * (self.w + self.h) as usize);
        out.extend((self.x..=self.right()).map(|x| (x, self.y - 1)));
        out.extend((self.y..=self.bottom()).map(|y| (self.right() + 1, y)));
        out.extend((self.x..=self.right()).rev().map(|x| (x, self.bottom() + 1)));
        out.extend((self.y..=self.bottom()).rev().map(|y| (self.x - 1, y)));
        out
    }
}

/// A placed building instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub type_id: BuildingTypeId,
    pub kind: BuildingKind,
    pub island: EntityId,
    pub area: Rect,
    pub rotation: u16,
    pub owner: Option<EntityId>,
    pub settlement: Option<EntityId>,
    pub inventory: Inventory,
    pub producers: Vec<Producer>,
    #[serde(default)]
    pub level: u8,
    #[serde(default)]
    pub inhabitants: u32,
    pub built_at: u64,
}

impl Building {
    pub fn distance_to(&self, other: &Building) -> i32 {
        self.area.distance(&other.area)
    }

    pub fn upgrade_slot(&self) -> Option<usize> {
        self.producers.iter().position(|p| p.upgrade)
    }
}

impl HasInventory for Building {
    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }
}

impl HasOwner for Building {
    fn owner(&self) -> Option<EntityId> {
        self.owner
    }
}

impl HasProductionState for Building {
    fn producers(&self) -> &[Producer] {
        &self.producers
    }

    fn producers_mut(&mut self) -> &mut [Producer] {
        &mut self.producers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_swaps_axes() {
        let ty = BuildingType {
            id: BuildingTypeId(1),
            name: "warehouse".into(),
            kind: BuildingKind::Storage,
            size: (2, 3),
            costs: BTreeMap::new(),
            productions: Vec::new(),
            inventory_limit: 8,
            radius: 4,
            settler_level: 0,
            buildable_on: None,
            inhabitants: 0,
            max_level: 0,
        };
        assert_eq!(ty.rotated_size(0), (2, 3));
        assert_eq!(ty.rotated_size(90), (3, 2));
        assert_eq!(ty.rotated_size(180), (2, 3));
        assert_eq!(ty.rotated_size(270), (3, 2));
    }

    #[test]
    fn rect_distance_is_chebyshev_gap() {
        let a = Rect::new(0, 0, 2, 2);
        assert_eq!(a.distance(&Rect::new(2, 0, 1, 1)), 1);
        assert_eq!(a.distance(&Rect::new(1, 1, 3, 3)), 0);
        assert_eq!(a.distance(&Rect::new(5, 3, 1, 1)), 4);
        assert_eq!(a.distance_to_tile((-3, 1)), 3);
    }

    #[test]
    fn rect_tiles_cover_footprint() {
        let tiles: Vec<_> = Rect::new(4, 7, 2, 2).tiles().collect();
        assert_eq!(tiles, vec![(4, 7), (5, 7), (4, 8), (5, 8)]);
        assert!(Rect::new(4, 7, 2, 2).contains((5, 8)));
        assert!(!Rect::new(4, 7, 2, 2).contains((6, 8)));
    }

    #[test]
    fn border_excludes_corners() {
        let border = Rect::new(0, 0, 2, 1).border_tiles();
        assert_eq!(border, vec![(0, -1), (1, -1), (2, 0), (1, 1), (0, 1), (-1, 0)]);
    }
}
