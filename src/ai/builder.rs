//! Construction helpers of the settlement manager. Every helper issues at
//! most the commands of one logical build action and reports a
//! [`BuildResult`].

use std::sync::Arc;

use tracing::debug;

use super::constants::BuildResult;
use super::evaluator::{
    BuildEvaluator, Evaluator, FarmEvaluator, ProductionEvaluator, ResidenceEvaluator,
    StorageEvaluator, best_among, best_location,
};
use super::personality::Personality;
use crate::command::Build;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingKind, BuildingType, BuildingTypeId, Rect};
use crate::sim::SimulationContext;

fn type_named<'a>(ctx: &'a SimulationContext, name: &str) -> Result<&'a BuildingType, SimError> {
    ctx.registry.by_name(name).ok_or(SimError::NoCandidateAvailable)
}

/// Whether the owner and settlement can pay for `ty` right now.
pub fn affordable(ctx: &SimulationContext, settlement_id: EntityId, ty: BuildingTypeId) -> Result<bool, SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    let probe = Build::new(ty, 0, 0, settlement.island).in_settlement(settlement_id);
    match probe.check_resources(ctx, settlement.owner, Some(settlement_id)) {
        Ok(()) => Ok(true),
        Err(SimError::InsufficientResources { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}

/// Execute the chosen candidate as the settlement owner.
fn execute_candidate(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
    candidate: &BuildEvaluator,
) -> Result<(BuildResult, Option<EntityId>), SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    let (owner, island) = (settlement.owner, settlement.island);
    match ctx.execute(Some(owner), candidate.command(island, settlement_id)) {
        Ok(outcome) => Ok((BuildResult::Ok, outcome.built())),
        Err(SimError::InsufficientResources { .. }) => Ok((BuildResult::NeedResources, None)),
        Err(SimError::PlacementInvalid(issue)) => {
            debug!(settlement = settlement_id, ?issue, "chosen location rejected");
            Ok((BuildResult::Impossible, None))
        }
        Err(err) => Err(err),
    }
}

/// Place `ty` where `evaluator` likes it best.
pub fn try_build(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
    ty: BuildingTypeId,
    evaluator: &dyn Evaluator,
) -> Result<(BuildResult, Option<EntityId>), SimError> {
    if !affordable(ctx, settlement_id, ty)? {
        return Ok((BuildResult::NeedResources, None));
    }
    let registry = Arc::clone(&ctx.registry);
    let building_type = registry.building(ty)?;
    let Some(candidate) = best_location(ctx, settlement_id, building_type, evaluator)? else {
        debug!(settlement = settlement_id, building = %building_type.name, evaluator = evaluator.name(), "no location");
        return Ok((BuildResult::Impossible, None));
    };
    execute_candidate(ctx, settlement_id, &candidate)
}

/// Build one more building of a production chain.
pub fn build_production(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
    ty: BuildingTypeId,
) -> Result<BuildResult, SimError> {
    let registry = Arc::clone(&ctx.registry);
    let building_type = registry.building(ty)?;

    if let Some(deposit) = building_type.buildable_on {
        if !affordable(ctx, settlement_id, ty)? {
            return Ok(BuildResult::NeedResources);
        }
        let settlement = ctx.world.settlement(settlement_id)?;
        let anchors: Vec<_> = deposits_in(ctx, settlement_id, deposit)?
            .into_iter()
            .map(|area| (area.x, area.y))
            .collect();
        let candidate = best_among(
            ctx,
            settlement,
            building_type,
            &ProductionEvaluator,
            anchors.into_iter(),
        )?;
        return match candidate {
            Some(candidate) => Ok(execute_candidate(ctx, settlement_id, &candidate)?.0),
            None => Ok(BuildResult::Impossible),
        };
    }

    let result = if building_type.kind == BuildingKind::Field {
        try_build(ctx, settlement_id, ty, &FarmEvaluator)?
    } else {
        try_build(ctx, settlement_id, ty, &ProductionEvaluator)?
    };
    Ok(result.0)
}

/// Footprints of unowned deposits of `deposit` type lying inside the
/// settlement's land.
pub fn deposits_in(
    ctx: &SimulationContext,
    settlement_id: EntityId,
    deposit: BuildingTypeId,
) -> Result<Vec<Rect>, SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    Ok(ctx
        .world
        .buildings
        .values()
        .filter(|b| {
            b.island == settlement.island
                && b.type_id == deposit
                && b.owner.is_none()
                && settlement.covers(b.area)
        })
        .map(|b| b.area)
        .collect())
}

fn storage_anchor(ctx: &SimulationContext, settlement_id: EntityId) -> Result<(Rect, i32), SimError> {
    let office = ctx
        .world
        .buildings_in(settlement_id)
        .find(|b| b.kind == BuildingKind::BranchOffice)
        .ok_or(SimError::NoCandidateAvailable)?;
    let radius = ctx.registry.building(office.type_id)?.radius;
    Ok((office.area, radius))
}

/// Lay the first village road: a straight line just below the branch office.
pub fn build_roads(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
    personality: &Personality,
) -> Result<BuildResult, SimError> {
    let road = type_named(ctx, "road")?.id;
    let (office, _) = storage_anchor(ctx, settlement_id)?;
    let settlement = ctx.world.settlement(settlement_id)?;
    let (owner, island) = (settlement.owner, settlement.island);

    let y = office.bottom() + 1;
    let start = office.x - personality.village_road_length / 2 + office.w / 2;
    let mut built = 0;
    let mut short = false;
    for x in start..start + personality.village_road_length {
        let build = Build::new(road, x, y, island).in_settlement(settlement_id);
        match ctx.execute(Some(owner), build) {
            Ok(_) => built += 1,
            Err(SimError::InsufficientResources { .. }) => {
                short = true;
                break;
            }
            Err(SimError::PlacementInvalid(_)) => {}
            Err(err) => return Err(err),
        }
    }
    debug!(settlement = settlement_id, built, "village roads");
    Ok(match (built, short) {
        (0, true) => BuildResult::NeedResources,
        (0, false) => BuildResult::Impossible,
        _ => BuildResult::Ok,
    })
}

pub fn build_main_square(ctx: &mut SimulationContext, settlement_id: EntityId) -> Result<BuildResult, SimError> {
    if ctx.world.count_kind(settlement_id, BuildingKind::MainSquare) > 0 {
        return Ok(BuildResult::AllBuilt);
    }
    let square = type_named(ctx, "main_square")?.id;
    let (anchor, radius) = storage_anchor(ctx, settlement_id)?;
    Ok(try_build(ctx, settlement_id, square, &ResidenceEvaluator { anchor, radius })?.0)
}

/// Residences cluster around the main square, or the branch office while
/// there is none.
pub fn build_tent(ctx: &mut SimulationContext, settlement_id: EntityId) -> Result<BuildResult, SimError> {
    let residence = type_named(ctx, "residence")?.id;
    let square = ctx
        .world
        .buildings_in(settlement_id)
        .find(|b| b.kind == BuildingKind::MainSquare)
        .map(|b| (b.area, b.type_id));
    let (anchor, radius) = match square {
        Some((area, ty)) => (area, ctx.registry.building(ty)?.radius),
        None => storage_anchor(ctx, settlement_id)?,
    };
    Ok(try_build(ctx, settlement_id, residence, &ResidenceEvaluator { anchor, radius })?.0)
}

/// Build a lumberjack near trees and plant a few more trees around it.
pub fn build_lumberjack(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
    personality: &Personality,
) -> Result<BuildResult, SimError> {
    let lumberjack = type_named(ctx, "lumberjack")?;
    let (lumberjack, radius) = (lumberjack.id, lumberjack.radius);
    let (result, built) = try_build(ctx, settlement_id, lumberjack, &ProductionEvaluator)?;
    let Some(built) = built else {
        return Ok(result);
    };

    let tree = type_named(ctx, "tree")?.id;
    let area = ctx.world.building(built)?.area;
    let settlement = ctx.world.settlement(settlement_id)?;
    let (owner, island) = (settlement.owner, settlement.island);
    let mut spots: Vec<(i32, (i32, i32))> = settlement
        .tiles
        .iter()
        .filter(|t| area.distance_to_tile(**t) <= radius)
        .map(|&t| (area.distance_to_tile(t), t))
        .collect();
    spots.sort();

    let mut planted = 0;
    for (_, (x, y)) in spots {
        if planted >= personality.trees_per_lumberjack {
            break;
        }
        let build = Build::new(tree, x, y, island).in_settlement(settlement_id);
        match ctx.execute(Some(owner), build) {
            Ok(_) => planted += 1,
            Err(SimError::InsufficientResources { .. }) => break,
            Err(SimError::PlacementInvalid(_)) => {}
            Err(err) => return Err(err),
        }
    }
    debug!(settlement = settlement_id, lumberjack = built, planted, "lumberjack built");
    Ok(result)
}

/// Production buildings per storage building within the personality's limit.
pub fn enough_collectors(
    ctx: &SimulationContext,
    settlement_id: EntityId,
    personality: &Personality,
) -> bool {
    let storages = ctx
        .world
        .buildings_in(settlement_id)
        .filter(|b| b.kind.is_storage())
        .count();
    let producers = ctx
        .world
        .buildings_in(settlement_id)
        .filter(|b| b.kind == BuildingKind::Production)
        .count();
    producers <= storages * personality.producers_per_storage
}

pub fn improve_collector_coverage(
    ctx: &mut SimulationContext,
    settlement_id: EntityId,
) -> Result<BuildResult, SimError> {
    let tent = type_named(ctx, "storage_tent")?.id;
    Ok(try_build(ctx, settlement_id, tent, &StorageEvaluator)?.0)
}

/// Number of free `size` x `size` squares on the settlement's land, counted
/// up to `limit`.
pub fn count_available_squares(
    ctx: &SimulationContext,
    settlement_id: EntityId,
    size: i32,
    limit: usize,
) -> Result<usize, SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    let island = ctx.world.island(settlement.island)?;
    let mut taken = std::collections::BTreeSet::new();
    let mut count = 0;
    for &(x, y) in &settlement.tiles {
        if count >= limit {
            break;
        }
        let area = Rect::new(x, y, size, size);
        let free = area.tiles().all(|t| {
            settlement.tiles.contains(&t)
                && island.is_buildable(t)
                && island.occupant(t).is_none()
                && !taken.contains(&t)
        });
        if free {
            taken.extend(area.tiles());
            count += 1;
        }
    }
    Ok(count)
}
