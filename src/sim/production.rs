//! Producer state machine.
//!
//! `Inactive -> WaitingForInput -> Working -> (OutputReady) -> WaitingForInput`.
//! A waiting producer observes its building's inventory; every change runs
//! `check_startable`, which reserves inputs as they arrive. Once the whole
//! recipe is reserved the producer stops observing and schedules its
//! completion.

use std::sync::Arc;

use tracing::{debug, info};

use super::context::SimulationContext;
use super::scheduler::Callback;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{
    BuildingKind, EventKind, HasProductionState, Inventory, Producer, ProducerKey,
    ProductionLine, ProductionState,
};

fn producer<'a>(ctx: &'a SimulationContext, key: ProducerKey) -> Result<&'a Producer, SimError> {
    ctx.world
        .building(key.building)?
        .producer(key.slot)
        .ok_or(SimError::ReferenceNotFound(key.building))
}

fn producer_mut(
    ctx: &mut SimulationContext,
    key: ProducerKey,
) -> Result<&mut Producer, SimError> {
    ctx.world
        .building_mut(key.building)?
        .producer_mut(key.slot)
        .ok_or(SimError::ReferenceNotFound(key.building))
}

/// Whether one more cycle's output fits into the inventory.
pub fn can_produce(line: &ProductionLine, inventory: &Inventory) -> bool {
    line.produced()
        .all(|(res, amount)| u64::from(inventory.get(res)) + u64::from(amount) <= u64::from(inventory.limit(res)))
}

/// Ticks of a full cycle already covered by `reserved` inputs, rounded.
fn elapsed_equivalent(line: &ProductionLine, reserved: u32) -> u64 {
    let needed = u64::from(line.total_needed());
    if needed == 0 {
        return 0;
    }
    let duration = u64::from(line.duration);
    (2 * duration * u64::from(reserved) + needed) / (2 * needed)
}

/// Create the producer slots of a freshly built building and switch on the
/// ones its level allows. Upgrade productions start inactive.
pub fn install_producers(ctx: &mut SimulationContext, building_id: EntityId) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let building = ctx.world.building_mut(building_id)?;
    let ty = registry.building(building.type_id)?;
    building.producers = ty
        .productions
        .iter()
        .map(|spec| {
            if spec.upgrade {
                Producer::upgrade(spec.lines.clone())
            } else {
                Producer::new(spec.lines.clone())
            }
        })
        .collect();
    activate_for_level(ctx, building_id)
}

/// Switch on every non-upgrade producer whose minimum level is reached.
pub fn activate_for_level(ctx: &mut SimulationContext, building_id: EntityId) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let building = ctx.world.building(building_id)?;
    let ty = registry.building(building.type_id)?;
    let to_start: Vec<usize> = ty
        .productions
        .iter()
        .enumerate()
        .filter(|(slot, spec)| {
            !spec.upgrade
                && spec.min_level <= building.level
                && building
                    .producer(*slot)
                    .is_some_and(|p| p.state == ProductionState::Inactive && p.suspended_ticks.is_none())
        })
        .map(|(slot, _)| slot)
        .collect();
    for slot in to_start {
        set_active(ctx, ProducerKey::new(building_id, slot), true)?;
    }
    Ok(())
}

/// Switch a producer on or off; a no-op if it already is.
pub fn set_active(ctx: &mut SimulationContext, key: ProducerKey, active: bool) -> Result<(), SimError> {
    if producer(ctx, key)?.is_active() != active {
        toggle(ctx, key)?;
    }
    Ok(())
}

/// Flip a producer between inactive and active. Returns whether it is now
/// active.
///
/// Pausing a working producer keeps its reserved inputs and the ticks left in
/// the cycle; resuming continues from there.
pub fn toggle(ctx: &mut SimulationContext, key: ProducerKey) -> Result<bool, SimError> {
    let step = Callback::ProductionStep { slot: key.slot };
    let state = producer(ctx, key)?.state;

    if state != ProductionState::Inactive {
        let remaining = if state == ProductionState::Working {
            let remaining = ctx.scheduler.remaining_ticks(key.building, step);
            ctx.scheduler.cancel_calls_for(key.building, step);
            remaining
        } else {
            None
        };
        let p = producer_mut(ctx, key)?;
        p.suspended_ticks = remaining;
        p.state = ProductionState::Inactive;
        p.blocked_on_output = false;
        ctx.world.building_mut(key.building)?.inventory.remove_observer(key);
        debug!(building = key.building, slot = key.slot, ?remaining, "producer paused");
        return Ok(false);
    }

    let p = producer_mut(ctx, key)?;
    if let Some(remaining) = p.suspended_ticks.take() {
        p.state = ProductionState::Working;
        ctx.scheduler.add_call(key.building, step, remaining);
        debug!(building = key.building, slot = key.slot, remaining, "producer resumed");
        return Ok(true);
    }

    if p.active_line.is_none() {
        p.active_line = p.default_line();
    }
    if p.active_line.is_none() {
        return Ok(false);
    }
    p.state = if p.pending_output.is_empty() {
        ProductionState::WaitingForInput
    } else {
        ProductionState::OutputReady
    };
    ctx.world.building_mut(key.building)?.inventory.add_observer(key);
    check_startable(ctx, key)?;
    Ok(true)
}

/// Try to move a waiting producer into `Working`. Invoked on every change of
/// the building's inventory while the producer observes it.
pub fn check_startable(ctx: &mut SimulationContext, key: ProducerKey) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let tps = ctx.config.ticks_per_second;
    let (state, line_id) = {
        let p = producer(ctx, key)?;
        (p.state, p.active_line)
    };
    let Some(line_id) = line_id else {
        return Ok(());
    };
    let line = registry.line(line_id)?;
    let mut changed = false;

    match state {
        ProductionState::Inactive | ProductionState::Working => return Ok(()),
        ProductionState::OutputReady => {
            let building = ctx.world.building_mut(key.building)?;
            let pending = std::mem::take(&mut building.producers[key.slot].pending_output);
            let mut still_pending = pending.clone();
            for (res, amount) in pending {
                let left = building.inventory.alter(res, amount as i32);
                if left as u32 != amount {
                    changed = true;
                }
                if left > 0 {
                    still_pending.insert(res, left as u32);
                } else {
                    still_pending.remove(&res);
                }
            }
            let p = &mut building.producers[key.slot];
            p.pending_output = still_pending;
            if !p.pending_output.is_empty() {
                if changed {
                    ctx.notify(key.building);
                }
                return Ok(());
            }
            p.state = ProductionState::WaitingForInput;
        }
        ProductionState::WaitingForInput => {}
    }

    let building = ctx.world.building_mut(key.building)?;
    if !can_produce(line, &building.inventory) {
        building.producers[key.slot].blocked_on_output = true;
        if changed {
            ctx.notify(key.building);
        }
        return Ok(());
    }
    building.producers[key.slot].blocked_on_output = false;

    let delay = if line.is_primary() {
        line.ticks(tps)
    } else {
        let elapsed_before = elapsed_equivalent(line, building.producers[key.slot].reserved_total());
        for (res, needed) in line.consumed() {
            let reserved = building.producers[key.slot].reserved_of(res);
            let usable = building.inventory.get(res).min(needed.saturating_sub(reserved));
            if usable == 0 {
                continue;
            }
            let remnant = building.inventory.alter(res, -(usable as i32));
            assert_eq!(remnant, 0, "reserved more {res} than the inventory held");
            *building.producers[key.slot].reserved.entry(res).or_insert(0) += usable;
            changed = true;
        }

        let p = &mut building.producers[key.slot];
        let total = line.total_needed();
        p.progress = (u64::from(p.reserved_total()) * 100 / u64::from(total)).min(100) as u8;
        let complete = line.consumed().all(|(res, needed)| p.reserved_of(res) >= needed);
        if !complete {
            if changed {
                ctx.notify(key.building);
            }
            return Ok(());
        }
        u64::from(line.duration).saturating_sub(elapsed_before) * tps
    };

    building.producers[key.slot].state = ProductionState::Working;
    building.inventory.remove_observer(key);
    ctx.scheduler
        .add_call(key.building, Callback::ProductionStep { slot: key.slot }, delay);
    debug!(building = key.building, slot = key.slot, line = %line_id, delay, "production started");
    if changed {
        ctx.notify(key.building);
    }
    Ok(())
}

/// Completion callback of a working producer.
pub fn production_step(ctx: &mut SimulationContext, key: ProducerKey) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let (state, line_id, is_upgrade) = {
        let p = producer(ctx, key)?;
        (p.state, p.active_line, p.upgrade)
    };
    if state != ProductionState::Working {
        return Ok(());
    }
    let Some(line_id) = line_id else {
        return Ok(());
    };
    let line = registry.line(line_id)?;

    let building = ctx.world.building_mut(key.building)?;
    let reserved = building.producers[key.slot].reserved_total();
    let completed = reserved >= line.total_needed();
    if completed {
        let mut overflow = std::collections::BTreeMap::new();
        for (res, amount) in line.produced() {
            let left = building.inventory.alter(res, amount as i32);
            if left > 0 {
                overflow.insert(res, left as u32);
            }
        }
        let p = &mut building.producers[key.slot];
        p.reserved.clear();
        p.progress = 0;
        p.completed_cycles += 1;
        p.state = if overflow.is_empty() {
            ProductionState::WaitingForInput
        } else {
            ProductionState::OutputReady
        };
        p.pending_output = overflow;
    } else {
        building.producers[key.slot].state = ProductionState::WaitingForInput;
    }
    building.inventory.add_observer(key);
    let kind = building.kind;

    if completed && is_upgrade {
        complete_upgrade(ctx, key)?;
    } else if completed && kind == BuildingKind::Production {
        debug!(building = key.building, line = %line.name, "production completed");
        ctx.record_event(EventKind::ProductionCompleted, key.building, line.name.clone());
    }
    ctx.notify(key.building);
    Ok(())
}

/// Test hook: complete a working producer's cycle immediately.
pub fn finish_production_now(ctx: &mut SimulationContext, key: ProducerKey) -> Result<(), SimError> {
    if producer(ctx, key)?.state != ProductionState::Working {
        return Ok(());
    }
    ctx.scheduler
        .cancel_calls_for(key.building, Callback::ProductionStep { slot: key.slot });
    production_step(ctx, key)
}

/// The residence upgrade line finished: raise the level, stop upgrading and
/// start the needs of the new level.
fn complete_upgrade(ctx: &mut SimulationContext, key: ProducerKey) -> Result<(), SimError> {
    let registry = Arc::clone(&ctx.registry);
    let building = ctx.world.building_mut(key.building)?;
    if building.kind != BuildingKind::Residence {
        return Ok(());
    }
    let ty = registry.building(building.type_id)?;
    building.level = (building.level + 1).min(ty.max_level);
    building.inhabitants = ty.inhabitants * (u32::from(building.level) + 1);
    let (level, owner) = (building.level, building.owner);

    set_active(ctx, key, false)?;
    if let Some(owner) = owner {
        let player = ctx.world.player_mut(owner)?;
        player.settler_level = player.settler_level.max(level);
    }
    activate_for_level(ctx, key.building)?;
    ctx.record_event(EventKind::ResidenceUpgraded, key.building, format!("level {level}"));
    info!(building = key.building, level, "residence upgraded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{LineId, ResourceId};

    #[test]
    fn elapsed_equivalent_rounds_to_nearest() {
        let line = ProductionLine {
            id: LineId(1),
            name: String::new(),
            duration: 10,
            deltas: BTreeMap::from([(ResourceId::BOARDS, -3), (ResourceId::TOOLS, 1)]),
        };
        assert_eq!(elapsed_equivalent(&line, 0), 0);
        assert_eq!(elapsed_equivalent(&line, 1), 3);
        assert_eq!(elapsed_equivalent(&line, 2), 7);
        assert_eq!(elapsed_equivalent(&line, 3), 10);
    }

    #[test]
    fn can_produce_checks_every_output() {
        let line = ProductionLine {
            id: LineId(1),
            name: String::new(),
            duration: 10,
            deltas: BTreeMap::from([(ResourceId::FOOD, 2)]),
        };
        let mut inv = Inventory::new(4);
        inv.alter(ResourceId::FOOD, 2);
        assert!(can_produce(&line, &inv));
        inv.alter(ResourceId::FOOD, 1);
        assert!(!can_produce(&line, &inv));
    }
}
