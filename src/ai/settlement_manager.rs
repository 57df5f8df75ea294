//! Per-settlement AI controller.
//!
//! Every tick performs the maintenance actions and at most one construction
//! action, chosen by a fixed cascade: build queue, collector coverage, then
//! the production chains in tier order, then residences.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::builder;
use super::chain::ProductionChain;
use super::constants::{BuildResult, FieldPurpose, GoalResult, TaskType};
use super::goal::all_goals;
use super::personality::Personality;
use crate::command::{SetSettlementUpgradePermissions, SetTaxSetting, ToggleActive};
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingKind, ProductionState, ResourceId};
use crate::sim::{Callback, SimulationContext};

/// Resources with a chain, in the order they are created.
const CHAIN_RESOURCES: [ResourceId; 6] = [
    ResourceId::FOOD,
    ResourceId::TEXTILE,
    ResourceId::FAITH,
    ResourceId::EDUCATION,
    ResourceId::GET_TOGETHER,
    ResourceId::BRICKS,
];

/// Demand reported for bricks so the chain gets built at all.
const BRICKS_PLACEHOLDER_DEMAND: f64 = 0.001;

const INITIAL_QUEUE: [TaskType; 4] = [
    TaskType::VillageRoads,
    TaskType::ProductionLumberjack,
    TaskType::ProductionLumberjack,
    TaskType::VillageMainSquare,
];

#[derive(Debug, Clone, PartialEq)]
pub struct SettlementManager {
    pub id: EntityId,
    pub settlement: EntityId,
    pub owner: EntityId,
    pub build_queue: VecDeque<TaskType>,
    pub chains: BTreeMap<ResourceId, ProductionChain>,
    pub tents: usize,
    pub num_fields: BTreeMap<FieldPurpose, usize>,
    pub village_built: bool,
    pub need_materials: bool,
}

impl fmt::Display for SettlementManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SM({}/{})", self.settlement, self.id)
    }
}

impl SettlementManager {
    /// Rebuild a manager from its persisted parts. Counters are derived from
    /// the world on the next tick.
    pub fn restore(
        ctx: &SimulationContext,
        id: EntityId,
        settlement: EntityId,
        build_queue: VecDeque<TaskType>,
        village_built: bool,
    ) -> Result<Self, SimError> {
        let owner = ctx.world.settlement(settlement)?.owner;
        let tps = ctx.config.ticks_per_second;
        let chains = CHAIN_RESOURCES
            .into_iter()
            .map(|res| (res, ProductionChain::create(&ctx.registry, res, tps)))
            .collect();
        let mut manager = Self {
            id,
            settlement,
            owner,
            build_queue,
            chains,
            tents: 0,
            num_fields: BTreeMap::new(),
            village_built,
            need_materials: false,
        };
        manager.refresh_counters(ctx);
        Ok(manager)
    }

    /// Set up the manager of a freshly founded AI settlement: initial build
    /// queue, first tick, starting taxes.
    pub fn create(ctx: &mut SimulationContext, settlement: EntityId) -> Result<EntityId, SimError> {
        let id = ctx.world.id_gen.next_id();
        let manager = Self::restore(ctx, id, settlement, INITIAL_QUEUE.into(), false)?;
        let personality = ctx.ai.personality_of(manager.owner);
        manager.set_taxes_and_permissions(ctx, personality.initial_tax, false, false)?;

        let first = ctx.config.ai_first_tick;
        ctx.scheduler.add_call(id, Callback::SettlementManagerTick, first);
        info!(manager = %manager, "settlement manager created");
        ctx.ai.managers.insert(id, manager);
        Ok(id)
    }

    pub fn refresh_counters(&mut self, ctx: &SimulationContext) {
        self.tents = ctx.world.count_kind(self.settlement, BuildingKind::Residence);
        self.num_fields = FieldPurpose::ALL
            .into_iter()
            .map(|p| (p, self.count_buildings(ctx, p.building_name())))
            .collect();
    }

    pub fn count_buildings(&self, ctx: &SimulationContext, name: &str) -> usize {
        ctx.registry
            .by_name(name)
            .map(|ty| ctx.world.count_buildings(self.settlement, ty.id))
            .unwrap_or(0)
    }

    pub fn can_provide_resources(&self) -> bool {
        self.village_built
    }

    /// Units per tick the settlement produces of a raw resource.
    pub fn resource_production(&self, ctx: &SimulationContext, res: ResourceId) -> Option<f64> {
        let level = |chain_res: ResourceId| {
            self.chains
                .get(&chain_res)
                .map(|c| c.final_production_level(&ctx.world, self.settlement))
        };
        match res {
            ResourceId::WOOL => level(ResourceId::TEXTILE),
            // A tavern turns one liquor into four get-togethers.
            ResourceId::SUGAR => level(ResourceId::GET_TOGETHER).map(|l| l / 4.0),
            ResourceId::FOOD => level(ResourceId::FOOD),
            _ => None,
        }
    }

    /// Units per tick the residents consume through their running lines.
    pub fn resident_usage(&self, ctx: &SimulationContext, res: ResourceId) -> f64 {
        if res == ResourceId::BRICKS {
            return BRICKS_PLACEHOLDER_DEMAND;
        }
        let tps = ctx.config.ticks_per_second;
        ctx.world
            .buildings_in(self.settlement)
            .filter(|b| b.kind == BuildingKind::Residence)
            .flat_map(|b| b.producers.iter())
            .filter(|p| !p.upgrade && p.is_active())
            .filter_map(|p| p.active_line.or_else(|| p.default_line()))
            .filter_map(|l| ctx.registry.line(l).ok())
            .map(|line| f64::from(line.needed(res)) / line.ticks(tps).max(1) as f64)
            .sum()
    }

    fn settler_level(&self, ctx: &SimulationContext) -> Result<u8, SimError> {
        Ok(ctx.world.player(self.owner)?.settler_level)
    }

    pub fn set_taxes_and_permissions(
        &self,
        ctx: &mut SimulationContext,
        taxes: f64,
        sailors_can_upgrade: bool,
        pioneers_can_upgrade: bool,
    ) -> Result<(), SimError> {
        let settlement = ctx.world.settlement(self.settlement)?;
        let current_tax = settlement.tax_setting;
        let current = [settlement.may_upgrade_from(0), settlement.may_upgrade_from(1)];

        if (current_tax - taxes).abs() > 1e-9 {
            info!(manager = %self, from = current_tax, to = taxes, "set taxes");
            ctx.execute(Some(self.owner), SetTaxSetting::new(self.settlement, taxes))?;
        }
        for (level, allowed) in [sailors_can_upgrade, pioneers_can_upgrade].into_iter().enumerate() {
            if current[level] != allowed {
                info!(manager = %self, level, allowed, "set upgrade permissions");
                ctx.execute(
                    Some(self.owner),
                    SetSettlementUpgradePermissions::new(self.settlement, level as u8, allowed),
                )?;
            }
        }
        Ok(())
    }

    /// Pause producers whose outputs are all at capacity and resume paused
    /// ones that have room again.
    pub fn manage_production(&self, ctx: &mut SimulationContext) -> Result<(), SimError> {
        let registry = Arc::clone(&ctx.registry);
        let mut toggles = Vec::new();
        for building in ctx.world.buildings_in(self.settlement) {
            if !building.kind.is_production() {
                continue;
            }
            for (slot, producer) in building.producers.iter().enumerate() {
                let Some(line) = producer.active_line.or_else(|| producer.default_line()) else {
                    continue;
                };
                if producer.upgrade {
                    continue;
                }
                let line = registry.line(line)?;
                let mut produced = line.produced().map(|(r, _)| r).peekable();
                if produced.peek().is_none() {
                    continue;
                }
                let all_full = produced.all(|r| building.inventory.free_space_for(r) == 0);
                if all_full == producer.is_active() {
                    toggles.push((building.id, slot, all_full));
                }
            }
        }
        for (building, slot, pause) in toggles {
            ctx.execute(Some(self.owner), ToggleActive::new(building, slot))?;
            if pause {
                info!(manager = %self, building, slot, "paused production");
            } else {
                info!(manager = %self, building, slot, "resumed production");
            }
        }
        Ok(())
    }

    /// Switch on upgrade production of residences on `level` until at least
    /// `limit` of them are upgrading. Returns whether any was switched on.
    pub fn manual_upgrade(
        &self,
        ctx: &mut SimulationContext,
        level: u8,
        limit: u32,
    ) -> Result<bool, SimError> {
        let mut upgrading = 0;
        let mut paused = Vec::new();
        for building in ctx.world.buildings_in(self.settlement) {
            if building.kind != BuildingKind::Residence || building.level != level {
                continue;
            }
            let Some(slot) = building.upgrade_slot() else { continue };
            if building.producers[slot].state == ProductionState::Inactive {
                paused.push((building.id, slot));
            } else {
                upgrading += 1;
            }
        }
        if upgrading >= limit {
            return Ok(false);
        }

        let mut upgraded_any = false;
        for (building, slot) in paused {
            ctx.execute(Some(self.owner), ToggleActive::new(building, slot))?;
            debug!(manager = %self, building, "manual upgrade");
            upgrading += 1;
            upgraded_any = true;
            if upgrading >= limit {
                break;
            }
        }
        Ok(upgraded_any)
    }

    fn log_build_result(&self, result: BuildResult, name: &str) {
        match result {
            BuildResult::Ok => info!(manager = %self, "built a {name}"),
            BuildResult::NeedResources => info!(manager = %self, "not enough materials to build a {name}"),
            BuildResult::Skip => info!(manager = %self, "skipped building a {name}"),
            other => info!(manager = %self, result = ?other, "failed to build a {name}"),
        }
    }

    /// Size the chain of `res` to resident demand plus slack and build its
    /// bottleneck. Returns whether the attempt used the turn.
    fn build_chain(
        &mut self,
        ctx: &mut SimulationContext,
        res: ResourceId,
        name: &str,
        personality: &Personality,
    ) -> Result<bool, SimError> {
        let amount = self.resident_usage(ctx, res) * personality.slack_factor;
        let level = self.settler_level(ctx)?;
        let Some(chain) = self.chains.get(&res) else {
            return Ok(false);
        };
        let result = chain.build(ctx, self.settlement, level, amount)?;
        if result == BuildResult::NeedResources {
            self.need_materials = true;
        }
        if !result.consumes_turn() {
            return Ok(false);
        }
        self.log_build_result(result, name);
        Ok(true)
    }

    fn has_clay_deposit(&self, ctx: &SimulationContext) -> Result<bool, SimError> {
        let Some(deposit) = ctx.registry.by_name("clay_deposit") else {
            return Ok(false);
        };
        Ok(!builder::deposits_in(ctx, self.settlement, deposit.id)?.is_empty())
    }

    /// Highest-priority active goals first. Returns the first blocking
    /// result, or `Skip` when every goal let the tick go on.
    fn run_goals(&mut self, ctx: &mut SimulationContext, personality: &Personality) -> Result<GoalResult, SimError> {
        for goal in all_goals(personality) {
            if !goal.active(ctx, self, personality)? {
                continue;
            }
            let result = goal.execute(ctx, self, personality)?;
            debug!(manager = %self, goal = goal.personality_name(), ?result, "goal executed");
            if result != GoalResult::Skip {
                return Ok(result);
            }
        }
        Ok(GoalResult::Skip)
    }

    /// The rest of a tick after the goals ran. A settlement whose stock is
    /// reserved by a goal neither builds nor starts upgrades; with only
    /// construction blocked, upgrades still go ahead.
    fn finish_tick(
        &mut self,
        ctx: &mut SimulationContext,
        personality: &Personality,
        goals: GoalResult,
    ) -> Result<(), SimError> {
        match goals {
            GoalResult::Skip => self.build_step(ctx, personality)?,
            GoalResult::BlockSettlementResourceUsage => self.need_materials = true,
            GoalResult::BlockAllBuildingActions => {}
        }
        self.maintain_tier(ctx, personality)
    }

    /// The construction cascade; performs at most one build action.
    fn build_step(&mut self, ctx: &mut SimulationContext, personality: &Personality) -> Result<(), SimError> {
        if let Some(task) = self.build_queue.pop_front() {
            debug!(manager = %self, ?task, "build a queue item");
            let (result, name) = match task {
                TaskType::VillageRoads => (builder::build_roads(ctx, self.settlement, personality)?, "road"),
                TaskType::VillageMainSquare => (builder::build_main_square(ctx, self.settlement)?, "main square"),
                TaskType::ProductionLumberjack => {
                    (builder::build_lumberjack(ctx, self.settlement, personality)?, "lumberjack")
                }
            };
            self.log_build_result(result, name);
            return Ok(());
        }

        if !builder::enough_collectors(ctx, self.settlement, personality) {
            let result = builder::improve_collector_coverage(ctx, self.settlement)?;
            self.log_build_result(result, "storage");
            return Ok(());
        }

        let level = self.settler_level(ctx)?;
        if self.build_chain(ctx, ResourceId::FOOD, "food producer", personality)? {
            return Ok(());
        }
        if self.tents >= personality.faith_min_tents
            && self.build_chain(ctx, ResourceId::FAITH, "pavilion", personality)?
        {
            return Ok(());
        }
        if self.tents >= personality.textile_min_tents
            && level > 0
            && self.build_chain(ctx, ResourceId::TEXTILE, "textile producer", personality)?
        {
            return Ok(());
        }
        if personality.tents_to_build > self.tents {
            let result = builder::build_tent(ctx, self.settlement)?;
            self.log_build_result(result, "tent");
            if result == BuildResult::Ok {
                self.tents += 1;
            }
            return Ok(());
        }
        if self.has_clay_deposit(ctx)?
            && level > 0
            && self.build_chain(ctx, ResourceId::BRICKS, "bricks producer", personality)?
        {
            return Ok(());
        }
        if self.build_chain(ctx, ResourceId::EDUCATION, "school", personality)? {
            return Ok(());
        }
        if self.count_buildings(ctx, "brickyard") > 0
            && level > 1
            && self.build_chain(ctx, ResourceId::GET_TOGETHER, "get-together producer", personality)?
        {
            return Ok(());
        }
        if !self.village_built {
            info!(manager = %self, "village built");
        }
        self.village_built = true;
        Ok(())
    }

    /// Taxes, upgrade permissions and hand-picked upgrades by tier.
    fn maintain_tier(&self, ctx: &mut SimulationContext, personality: &Personality) -> Result<(), SimError> {
        let level = self.settler_level(ctx)?;
        let has_brickyard = self.count_buildings(ctx, "brickyard") > 0;
        let has_school = self.count_buildings(ctx, "village_school") > 0;

        if level == 0 {
            if !self.need_materials && self.manual_upgrade(ctx, 0, personality.first_tier_upgrades)? {
                self.set_taxes_and_permissions(ctx, personality.upgrading_tax, false, false)?;
            }
        } else if has_brickyard && !has_school {
            // Upgrade sailors by hand with the boards the school does not need.
            let registry = Arc::clone(&ctx.registry);
            let school_boards = registry.by_name("village_school").map_or(0, |t| t.cost(ResourceId::BOARDS));
            let per_upgrade = registry
                .by_name("residence")
                .and_then(|t| t.productions.iter().find(|p| p.upgrade))
                .and_then(|p| p.lines.first())
                .and_then(|l| registry.line(*l).ok())
                .map_or(1, |l| l.needed(ResourceId::BOARDS).max(1));
            let boards = ctx.world.inventory(self.settlement)?.get(ResourceId::BOARDS);
            let free_boards = boards.saturating_sub(school_boards) / per_upgrade;
            if free_boards > 0 && !self.need_materials {
                self.manual_upgrade(ctx, 0, free_boards)?;
            }
        } else if has_school {
            self.set_taxes_and_permissions(ctx, personality.settled_tax, true, !self.need_materials)?;
        }
        Ok(())
    }

    fn report(&self, ctx: &SimulationContext) {
        let pairs = [
            ("food", ResourceId::FOOD, ResourceId::FOOD, 1.0),
            ("wool", ResourceId::WOOL, ResourceId::TEXTILE, 1.0),
            ("sugar", ResourceId::SUGAR, ResourceId::GET_TOGETHER, 0.25),
        ];
        for (name, produced, used, factor) in pairs {
            let production = self.resource_production(ctx, produced).unwrap_or(0.0);
            let usage = self.resident_usage(ctx, used) * factor;
            debug!(manager = %self, production, usage, "{name} production");
        }
    }

    pub fn tick(&mut self, ctx: &mut SimulationContext) -> Result<(), SimError> {
        let personality = ctx.ai.personality_of(self.owner);
        self.refresh_counters(ctx);
        self.report(ctx);
        self.manage_production(ctx)?;
        self.need_materials = false;

        let goals = self.run_goals(ctx, &personality)?;
        self.finish_tick(ctx, &personality, goals)
    }
}

/// Scheduled entry point: run one tick of manager `id` and schedule the next.
/// A manager whose settlement is gone is dropped.
pub fn run_tick(ctx: &mut SimulationContext, id: EntityId) -> Result<(), SimError> {
    let mut manager = ctx
        .ai
        .managers
        .remove(&id)
        .ok_or(SimError::ReferenceNotFound(id))?;
    ctx.world.settlement(manager.settlement)?;

    let result = manager.tick(ctx);
    ctx.ai.managers.insert(id, manager);
    let interval = ctx.config.ai_tick_interval;
    ctx.scheduler
        .add_call(id, Callback::SettlementManagerTick, interval);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn ai_settlement() -> (SimulationContext, EntityId, EntityId, EntityId) {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        let ctx = s.build();
        let manager = *ctx.ai.managers.keys().next().unwrap();
        (ctx, player, settlement, manager)
    }

    #[test]
    fn new_manager_starts_with_queue_and_low_taxes() {
        let (ctx, _, settlement, manager) = ai_settlement();
        let m = &ctx.ai.managers[&manager];
        assert_eq!(m.settlement, settlement);
        assert_eq!(m.build_queue, VecDeque::from(INITIAL_QUEUE));
        let s = ctx.world.settlement(settlement).unwrap();
        assert_eq!(s.tax_setting, 0.5);
        assert!(!s.may_upgrade_from(0));
        assert!(!s.may_upgrade_from(1));
        assert_eq!(
            ctx.scheduler.remaining_ticks(manager, Callback::SettlementManagerTick),
            Some(31)
        );
    }

    #[test]
    fn each_tick_takes_one_queue_item() {
        let (mut ctx, player, _, manager) = ai_settlement();
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::GOLD, 10_000);

        ctx.advance(31);
        assert_eq!(ctx.ai.managers[&manager].build_queue.len(), 3);
        ctx.advance(31);
        assert_eq!(ctx.ai.managers[&manager].build_queue.len(), 3);
        ctx.advance(1);
        assert_eq!(ctx.ai.managers[&manager].build_queue.len(), 2);
    }

    #[test]
    fn saturated_producer_is_paused_and_resumed() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        let field = s.place(settlement, "potato_field", (16, 10));
        let mut ctx = s.build();
        let manager = ctx.ai.managers[ctx.ai.managers.keys().next().unwrap()].clone();

        ctx.world.inventory_mut(field).unwrap().alter(ResourceId::POTATOES, 4);
        manager.manage_production(&mut ctx).unwrap();
        assert!(!ctx.world.building(field).unwrap().producers[0].is_active());

        ctx.world.inventory_mut(field).unwrap().alter(ResourceId::POTATOES, -1);
        manager.manage_production(&mut ctx).unwrap();
        assert!(ctx.world.building(field).unwrap().producers[0].is_active());
    }

    #[test]
    fn manual_upgrade_respects_limit() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        let a = s.place(settlement, "residence", (16, 10));
        let b = s.place(settlement, "residence", (16, 13));
        let mut ctx = s.build();
        let manager = ctx.ai.managers[ctx.ai.managers.keys().next().unwrap()].clone();

        assert!(manager.manual_upgrade(&mut ctx, 0, 1).unwrap());
        assert!(!manager.manual_upgrade(&mut ctx, 0, 1).unwrap());
        let upgrading = [a, b]
            .iter()
            .filter(|id| {
                let r = ctx.world.building(**id).unwrap();
                r.producers[r.upgrade_slot().unwrap()].is_active()
            })
            .count();
        assert_eq!(upgrading, 1);
    }

    #[test]
    fn reserved_stock_blocks_upgrades_as_well_as_building() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        let residence = s.place(settlement, "residence", (16, 10));
        let mut ctx = s.build();
        let personality = Personality::default();
        let upgrading = |ctx: &SimulationContext| {
            let r = ctx.world.building(residence).unwrap();
            r.producers[r.upgrade_slot().unwrap()].is_active()
        };

        let mut manager = ctx.ai.managers[ctx.ai.managers.keys().next().unwrap()].clone();
        let queue = manager.build_queue.clone();
        manager
            .finish_tick(&mut ctx, &personality, GoalResult::BlockSettlementResourceUsage)
            .unwrap();
        assert!(manager.need_materials);
        assert_eq!(manager.build_queue, queue);
        assert!(!upgrading(&ctx));

        manager.need_materials = false;
        manager
            .finish_tick(&mut ctx, &personality, GoalResult::BlockAllBuildingActions)
            .unwrap();
        assert_eq!(manager.build_queue, queue);
        assert!(upgrading(&ctx));
    }

    #[test]
    fn resident_usage_counts_running_needs() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        s.place(settlement, "residence", (16, 10));
        let ctx = s.build();
        let manager = &ctx.ai.managers[ctx.ai.managers.keys().next().unwrap()];

        let food = manager.resident_usage(&ctx, ResourceId::FOOD);
        assert!((food - 1.0 / (30.0 * 16.0)).abs() < 1e-12);
        assert_eq!(manager.resident_usage(&ctx, ResourceId::TEXTILE), 0.0);
        assert_eq!(manager.resident_usage(&ctx, ResourceId::BRICKS), BRICKS_PLACEHOLDER_DEMAND);
    }

    #[test]
    fn dropped_settlement_drops_manager() {
        let (mut ctx, _, settlement, manager) = ai_settlement();
        ctx.world.settlements.remove(&settlement);
        assert_eq!(
            run_tick(&mut ctx, manager).unwrap_err(),
            SimError::ReferenceNotFound(settlement)
        );
        assert!(!ctx.ai.managers.contains_key(&manager));
    }
}
