use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::building::{BuildingKind, BuildingType, BuildingTypeId};
use super::production::{LineId, ProductionLine};
use super::resource::ResourceId;
use crate::error::SimError;

/// Game data shipped with the crate.
const BUILTIN_DATA: &str = include_str!("../../data/buildings.json");

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("malformed game data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("building {building} references missing {line}")]
    MissingLine {
        building: BuildingTypeId,
        line: LineId,
    },
    #[error("building {building} is buildable on missing {target}")]
    MissingBuildTarget {
        building: BuildingTypeId,
        target: BuildingTypeId,
    },
    #[error("duplicate id {0} in game data")]
    Duplicate(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryData {
    lines: Vec<ProductionLine>,
    buildings: Vec<BuildingType>,
}

/// Read-only table of production lines and building types, loaded once and
/// shared by every producer.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingRegistry {
    lines: BTreeMap<LineId, ProductionLine>,
    buildings: BTreeMap<BuildingTypeId, BuildingType>,
}

impl BuildingRegistry {
    pub fn from_json(data: &str) -> Result<Self, RegistryError> {
        let raw: RegistryData = serde_json::from_str(data)?;

        let mut lines = BTreeMap::new();
        for line in raw.lines {
            let id = line.id;
            if lines.insert(id, line).is_some() {
                return Err(RegistryError::Duplicate(id.0));
            }
        }

        let mut buildings = BTreeMap::new();
        for ty in raw.buildings {
            let id = ty.id;
            if buildings.insert(id, ty).is_some() {
                return Err(RegistryError::Duplicate(id.0));
            }
        }

        for ty in buildings.values() {
            for line in ty.all_lines() {
                if !lines.contains_key(&line) {
                    return Err(RegistryError::MissingLine {
                        building: ty.id,
                        line,
                    });
                }
            }
            if let Some(target) = ty.buildable_on
                && !buildings.contains_key(&target)
            {
                return Err(RegistryError::MissingBuildTarget {
                    building: ty.id,
                    target,
                });
            }
        }

        Ok(Self { lines, buildings })
    }

    /// The default game data. Panics only if the bundled file is broken.
    pub fn builtin() -> Self {
        Self::from_json(BUILTIN_DATA).expect("bundled game data is valid")
    }

    pub fn building(&self, id: BuildingTypeId) -> Result<&BuildingType, SimError> {
        self.buildings
            .get(&id)
            .ok_or(SimError::UnknownBuildingType(id))
    }

    pub fn line(&self, id: LineId) -> Result<&ProductionLine, SimError> {
        self.lines.get(&id).ok_or(SimError::UnknownProductionLine(id))
    }

    pub fn buildings(&self) -> impl Iterator<Item = &BuildingType> {
        self.buildings.values()
    }

    pub fn lines(&self) -> impl Iterator<Item = &ProductionLine> {
        self.lines.values()
    }

    pub fn by_name(&self, name: &str) -> Option<&BuildingType> {
        self.buildings.values().find(|b| b.name == name)
    }

    /// First building type of the given kind, by id.
    pub fn first_of_kind(&self, kind: BuildingKind) -> Option<&BuildingType> {
        self.buildings.values().find(|b| b.kind == kind)
    }

    /// Non-upgrade `(building type, line)` pairs producing `res`, ordered by
    /// building id then line id. Residences are never producers.
    pub fn producers_of(&self, res: ResourceId) -> Vec<(BuildingTypeId, LineId)> {
        let mut out = Vec::new();
        for ty in self.buildings.values() {
            if ty.kind == BuildingKind::Residence {
                continue;
            }
            for production in ty.productions.iter().filter(|p| !p.upgrade) {
                for &line_id in &production.lines {
                    if let Some(line) = self.lines.get(&line_id)
                        && line.produced_amount(res) > 0
                    {
                        out.push((ty.id, line_id));
                    }
                }
            }
        }
        out
    }

    /// Resources produced by any line of the given building type.
    pub fn produced_by(&self, id: BuildingTypeId) -> Vec<ResourceId> {
        let Some(ty) = self.buildings.get(&id) else {
            return Vec::new();
        };
        let mut out: Vec<ResourceId> = ty
            .all_lines()
            .filter_map(|l| self.lines.get(&l))
            .flat_map(|l| l.produced().map(|(r, _)| r))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
