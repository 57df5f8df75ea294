//! Periodic goods movement: consumers fetching inputs, storages picking up
//! finished goods, and settlements paying taxes. Every round reschedules
//! itself and moves goods only through `SimulationContext::transfer`.

use std::sync::Arc;

use tracing::debug;

use super::context::SimulationContext;
use super::production;
use super::scheduler::Callback;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingKind, ProducerKey, ProductionState, ResourceId};

/// A consumer fetches the inputs of its active lines: first from provider
/// buildings in range (nearest first), then from the settlement inventory.
/// Residences are supplied from the settlement inventory only.
pub fn collector_round(ctx: &mut SimulationContext, building_id: EntityId) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let building = ctx.world.building(building_id)?;
    let (island, area, owner, settlement) =
        (building.island, building.area, building.owner, building.settlement);
    let radius = registry.building(building.type_id)?.radius;
    let from_providers = building.kind != BuildingKind::Residence;

    let mut wanted: Vec<(ResourceId, u32)> = Vec::new();
    for p in building.producers.iter().filter(|p| p.state == ProductionState::WaitingForInput) {
        let Some(line_id) = p.active_line else { continue };
        for (res, needed) in registry.line(line_id)?.consumed() {
            let have = building.inventory.get(res) + p.reserved_of(res);
            let want = needed
                .saturating_sub(have)
                .min(building.inventory.free_space_for(res));
            if want > 0 {
                wanted.push((res, want));
            }
        }
    }

    for (res, mut want) in wanted {
        let mut providers: Vec<(i32, EntityId)> = ctx
            .world
            .buildings
            .values()
            .filter(|b| {
                from_providers
                    && b.id != building_id
                    && b.island == island
                    && !b.kind.is_storage()
                    && b.kind != BuildingKind::Residence
                    && (b.owner.is_none() || b.owner == owner)
                    && b.inventory.get(res) > 0
                    && b.area.distance(&area) <= radius
            })
            .map(|b| (b.area.distance(&area), b.id))
            .collect();
        providers.sort();

        for (_, provider) in providers {
            if want == 0 {
                break;
            }
            want -= ctx.transfer(provider, building_id, res, want)?;
        }
        if want > 0
            && let Some(settlement) = settlement
        {
            ctx.transfer(settlement, building_id, res, want)?;
        }
    }

    let interval = ctx.config.collector_interval;
    ctx.scheduler
        .add_call(building_id, Callback::CollectorRound, interval);
    Ok(())
}

/// A storage building carries finished goods of production buildings in its
/// range into the settlement inventory.
pub fn storage_round(ctx: &mut SimulationContext, storage_id: EntityId) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let storage = ctx.world.building(storage_id)?;
    let radius = registry.building(storage.type_id)?.radius;
    let area = storage.area;

    if let Some(settlement) = storage.settlement {
        let mut sources: Vec<(i32, EntityId)> = ctx
            .world
            .buildings_in(settlement)
            .filter(|b| b.kind.is_production() && b.area.distance(&area) <= radius)
            .map(|b| (b.area.distance(&area), b.id))
            .collect();
        sources.sort();

        for (_, source) in sources {
            let type_id = ctx.world.building(source)?.type_id;
            for res in registry.produced_by(type_id) {
                let amount = ctx.world.inventory(source)?.get(res);
                if amount > 0 {
                    ctx.transfer(source, settlement, res, amount)?;
                }
            }
        }
    }

    let interval = ctx.config.storage_interval;
    ctx.scheduler
        .add_call(storage_id, Callback::StorageRound, interval);
    Ok(())
}

/// Residents pay `inhabitants x tax setting` gold to the owner. Residences
/// whose level is cleared for upgrading start their upgrade production.
pub fn tax_round(ctx: &mut SimulationContext, settlement_id: EntityId) -> Result<(), SimError> {
    let settlement = ctx.world.settlement(settlement_id)?;
    let owner = settlement.owner;
    let income = (f64::from(ctx.world.inhabitants(settlement_id)) * settlement.tax_setting).round() as i32;

    let upgradable: Vec<ProducerKey> = ctx
        .world
        .buildings_in(settlement_id)
        .filter(|b| b.kind == BuildingKind::Residence && settlement.may_upgrade_from(b.level))
        .filter_map(|b| {
            let slot = b.upgrade_slot()?;
            let ty = ctx.registry.building(b.type_id).ok()?;
            let idle = b.producers[slot].state == ProductionState::Inactive;
            (idle && b.level < ty.max_level).then(|| ProducerKey::new(b.id, slot))
        })
        .collect();

    if income > 0 {
        ctx.alter_inventory(owner, ResourceId::GOLD, income)?;
        debug!(settlement = settlement_id, income, "taxes paid");
    }
    for key in upgradable {
        production::set_active(ctx, key, true)?;
    }

    let interval = ctx.config.tax_interval;
    ctx.scheduler
        .add_call(settlement_id, Callback::TaxRound, interval);
    Ok(())
}
