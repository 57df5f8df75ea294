//! Placement scoring. An evaluator rates one candidate footprint; the best
//! candidate over all settlement tiles and rotations wins, ties going to the
//! first one found in tile order.

use std::sync::Arc;

use crate::command::Build;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{Building, BuildingKind, BuildingType, BuildingTypeId, Rect, Settlement};
use crate::sim::SimulationContext;

/// A scored candidate placement. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildEvaluator {
    pub building_type: BuildingTypeId,
    pub area: Rect,
    pub rotation: u16,
    pub value: f64,
    /// Total units of all resources the building costs.
    pub cost: u32,
}

impl BuildEvaluator {
    pub fn command(&self, island: EntityId, settlement: EntityId) -> Build {
        Build::new(self.building_type, self.area.x, self.area.y, island)
            .rotated(self.rotation)
            .in_settlement(settlement)
    }
}

pub trait Evaluator {
    fn name(&self) -> &'static str;

    /// Score of placing `ty` on `area`, or `None` if the spot is unusable.
    fn score(
        &self,
        ctx: &SimulationContext,
        settlement: &Settlement,
        ty: &BuildingType,
        area: Rect,
    ) -> Option<f64>;
}

fn rotations(ty: &BuildingType) -> &'static [u16] {
    if ty.is_square() { &[0] } else { &[0, 90] }
}

/// Distance to the nearest building of the settlement matching `pred`.
fn nearest(
    ctx: &SimulationContext,
    settlement: &Settlement,
    area: Rect,
    pred: impl Fn(&Building) -> bool,
) -> Option<i32> {
    ctx.world
        .buildings_in(settlement.id)
        .filter(|b| pred(b))
        .map(|b| b.area.distance(&area))
        .min()
}

/// Best legal placement of `ty` in the settlement under `evaluator`.
pub fn best_location(
    ctx: &SimulationContext,
    settlement_id: EntityId,
    ty: &BuildingType,
    evaluator: &dyn Evaluator,
) -> Result<Option<BuildEvaluator>, SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    best_among(ctx, settlement, ty, evaluator, settlement.tiles.iter().copied())
}

/// Like [`best_location`] but only over the given anchor tiles.
pub fn best_among(
    ctx: &SimulationContext,
    settlement: &Settlement,
    ty: &BuildingType,
    evaluator: &dyn Evaluator,
    anchors: impl Iterator<Item = (i32, i32)>,
) -> Result<Option<BuildEvaluator>, SimError> {
    let cost = ty.costs.values().sum();
    let mut best: Option<BuildEvaluator> = None;
    for (x, y) in anchors {
        for &rotation in rotations(ty) {
            let build = Build::new(ty.id, x, y, settlement.island)
                .rotated(rotation)
                .in_settlement(settlement.id);
            let Ok(placement) = build.check_placement(ctx, Some(settlement.owner)) else {
                continue;
            };
            let Some(value) = evaluator.score(ctx, settlement, ty, placement.area) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| value > b.value) {
                best = Some(BuildEvaluator {
                    building_type: ty.id,
                    area: placement.area,
                    rotation,
                    value,
                    cost,
                });
            }
        }
    }
    Ok(best)
}

/// Consumers near their suppliers and within reach of a storage building.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionEvaluator;

impl Evaluator for ProductionEvaluator {
    fn name(&self) -> &'static str {
        "production"
    }

    fn score(
        &self,
        ctx: &SimulationContext,
        settlement: &Settlement,
        ty: &BuildingType,
        area: Rect,
    ) -> Option<f64> {
        let registry = Arc::clone(&ctx.registry);
        let storage = nearest(ctx, settlement, area, |b| b.kind.is_storage())?;
        let reach = ctx
            .world
            .buildings_in(settlement.id)
            .filter(|b| b.kind.is_storage())
            .filter_map(|b| registry.building(b.type_id).ok())
            .map(|t| t.radius)
            .max()
            .unwrap_or(0);
        if storage > reach {
            return None;
        }

        let inputs: Vec<_> = ty
            .all_lines()
            .filter_map(|l| registry.line(l).ok())
            .flat_map(|l| l.consumed().map(|(r, _)| r))
            .collect();
        let suppliers = ctx
            .world
            .buildings
            .values()
            .filter(|b| {
                b.island == settlement.island
                    && (b.owner.is_none() || b.owner == Some(settlement.owner))
                    && b.area.distance(&area) <= ty.radius
                    && registry.produced_by(b.type_id).iter().any(|r| inputs.contains(r))
            })
            .count();

        Some(suppliers as f64 - 0.1 * f64::from(storage))
    }
}

/// Fields next to the buildings that consume their crop.
#[derive(Debug, Clone, Copy, Default)]
pub struct FarmEvaluator;

impl Evaluator for FarmEvaluator {
    fn name(&self) -> &'static str {
        "farm"
    }

    fn score(
        &self,
        ctx: &SimulationContext,
        settlement: &Settlement,
        ty: &BuildingType,
        area: Rect,
    ) -> Option<f64> {
        let registry = Arc::clone(&ctx.registry);
        let crops = registry.produced_by(ty.id);
        let consumers: Vec<_> = ctx
            .world
            .buildings_in(settlement.id)
            .filter_map(|b| {
                let t = registry.building(b.type_id).ok()?;
                let consumes = t
                    .all_lines()
                    .filter_map(|l| registry.line(l).ok())
                    .any(|l| l.consumed().any(|(r, _)| crops.contains(&r)));
                consumes.then_some((b.area.distance(&area), t.radius))
            })
            .collect();

        if consumers.is_empty() {
            let storage = nearest(ctx, settlement, area, |b| b.kind.is_storage())?;
            return Some(-0.1 * f64::from(storage));
        }
        consumers
            .iter()
            .filter(|(d, radius)| d <= radius)
            .map(|(d, _)| -f64::from(*d))
            .reduce(f64::max)
    }
}

/// Storage tents where they cut the distance of production buildings to
/// their nearest storage the most.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageEvaluator;

impl Evaluator for StorageEvaluator {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn score(
        &self,
        ctx: &SimulationContext,
        settlement: &Settlement,
        ty: &BuildingType,
        area: Rect,
    ) -> Option<f64> {
        let storages: Vec<Rect> = ctx
            .world
            .buildings_in(settlement.id)
            .filter(|b| b.kind.is_storage())
            .map(|b| b.area)
            .collect();
        let gain: i32 = ctx
            .world
            .buildings_in(settlement.id)
            .filter(|b| b.kind.is_production() && b.area.distance(&area) <= ty.radius)
            .map(|b| {
                let current = storages.iter().map(|s| s.distance(&b.area)).min().unwrap_or(i32::MAX / 2);
                (current - b.area.distance(&area)).max(0)
            })
            .sum();
        (gain > 0).then_some(f64::from(gain))
    }
}

/// Residences and the main square, as close to an anchor as possible.
#[derive(Debug, Clone, Copy)]
pub struct ResidenceEvaluator {
    pub anchor: Rect,
    pub radius: i32,
}

impl Evaluator for ResidenceEvaluator {
    fn name(&self) -> &'static str {
        "residence"
    }

    fn score(
        &self,
        ctx: &SimulationContext,
        settlement: &Settlement,
        _ty: &BuildingType,
        area: Rect,
    ) -> Option<f64> {
        let distance = self.anchor.distance(&area);
        if distance > self.radius {
            return None;
        }
        let by_road = nearest(ctx, settlement, area, |b| b.kind == BuildingKind::Road) == Some(1);
        Some(-f64::from(distance) + if by_road { 0.5 } else { 0.0 })
    }
}
