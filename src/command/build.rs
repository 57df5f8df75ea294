use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::tear;
use crate::ai;
use crate::error::{PlacementIssue, SimError};
use crate::id::EntityId;
use crate::model::building::VALID_ROTATIONS;
use crate::model::{
    Building, BuildingKind, BuildingType, BuildingTypeId, EventKind, Inventory, Rect, ResourceId,
    Settlement,
};
use crate::sim::production;
use crate::sim::{Callback, SimulationContext};

/// Number of settler levels a settlement keeps upgrade permissions for.
const PERMISSION_LEVELS: usize = 3;

/// Construct a building at `(x, y)` on `island`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub building_type: BuildingTypeId,
    pub x: i32,
    pub y: i32,
    pub island: EntityId,
    #[serde(default)]
    pub rotation: u16,
    /// Ship paying for the building, e.g. when founding a settlement.
    #[serde(default)]
    pub ship: Option<EntityId>,
    #[serde(default)]
    pub settlement: Option<EntityId>,
    /// Buildings razed before construction.
    #[serde(default)]
    pub tear_set: BTreeSet<EntityId>,
    #[serde(default)]
    pub data: BTreeMap<String, i64>,
    #[serde(default)]
    pub ownerless: bool,
}

/// Result of a successful placement check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub area: Rect,
    /// Settlement the building joins; `None` when it founds one or is ownerless.
    pub settlement: Option<EntityId>,
    /// Deposits replaced by a deposit-bound building.
    pub replaces: Vec<EntityId>,
}

impl super::Command {
    /// Start a build command; see the `Build` builder methods.
    pub fn build(building_type: BuildingTypeId, x: i32, y: i32, island: EntityId) -> Build {
        Build::new(building_type, x, y, island)
    }
}

impl Build {
    pub fn new(building_type: BuildingTypeId, x: i32, y: i32, island: EntityId) -> Self {
        Self {
            building_type,
            x,
            y,
            island,
            rotation: 0,
            ship: None,
            settlement: None,
            tear_set: BTreeSet::new(),
            data: BTreeMap::new(),
            ownerless: false,
        }
    }

    pub fn rotated(mut self, rotation: u16) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn from_ship(mut self, ship: EntityId) -> Self {
        self.ship = Some(ship);
        self
    }

    pub fn in_settlement(mut self, settlement: EntityId) -> Self {
        self.settlement = Some(settlement);
        self
    }

    pub fn tearing(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.tear_set.extend(ids);
        self
    }

    pub fn with_data(mut self, key: &str, value: i64) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn ownerless(mut self) -> Self {
        self.ownerless = true;
        self
    }

    pub fn area(&self, ty: &BuildingType) -> Rect {
        let (w, h) = ty.rotated_size(self.rotation);
        Rect::new(self.x, self.y, w, h)
    }

    /// Validate terrain, footprint and settlement membership. With an issuer
    /// the footprint must lie in the issuer's settlement, except for a branch
    /// office founded from the issuer's ship.
    pub fn check_placement(
        &self,
        ctx: &SimulationContext,
        issuer: Option<EntityId>,
    ) -> Result<Placement, SimError> {
        let ty = ctx.registry.building(self.building_type)?;
        if !VALID_ROTATIONS.contains(&self.rotation) {
            return Err(PlacementIssue::InvalidRotation(self.rotation).into());
        }
        let island = ctx.world.island(self.island)?;
        let area = self.area(ty);

        let mut replaces = BTreeSet::new();
        for tile in area.tiles() {
            if !island.is_buildable(tile) {
                return Err(PlacementIssue::NotLand(tile).into());
            }
            if let Some(occupant) = island.occupant(tile) {
                if self.tear_set.contains(&occupant) {
                    continue;
                }
                let occupant_type = ctx
                    .world
                    .building(occupant)
                    .map_err(|_| PlacementIssue::Occupied(tile))?
                    .type_id;
                if ty.buildable_on == Some(occupant_type) {
                    replaces.insert(occupant);
                    continue;
                }
                return Err(PlacementIssue::Occupied(tile).into());
            }
        }
        if ty.buildable_on.is_some() {
            let covered = replaces.len() == 1
                && replaces
                    .iter()
                    .all(|id| ctx.world.building(*id).is_ok_and(|d| d.area == area));
            if !covered {
                return Err(PlacementIssue::MissingDeposit.into());
            }
        }

        for &id in &self.tear_set {
            let Ok(target) = ctx.world.building(id) else {
                continue;
            };
            let in_footprint = target.island == self.island && area.distance(&target.area) == 0;
            let allowed = target.owner.is_none() || target.owner == issuer;
            if !in_footprint || !allowed {
                return Err(PlacementIssue::CannotTear(id).into());
            }
        }

        let Some(issuer) = issuer else {
            let settlement = self
                .settlement
                .or_else(|| ctx.world.settlement_at(self.island, (self.x, self.y)));
            return Ok(Placement {
                area,
                settlement: if self.ownerless { None } else { settlement },
                replaces: replaces.into_iter().collect(),
            });
        };

        let player = ctx.world.player(issuer)?;
        if player.settler_level < ty.settler_level {
            return Err(PlacementIssue::SettlerLevelTooLow {
                required: ty.settler_level,
                actual: player.settler_level,
            }
            .into());
        }

        // A named ship must be one of the issuer's own.
        if let Some(ship) = self.ship
            && !ctx.world.ship(ship).is_ok_and(|s| s.owner == issuer)
        {
            return Err(PlacementIssue::NoSource.into());
        }

        let settlement = if ty.kind == BuildingKind::BranchOffice && self.settlement.is_none() {
            if self.ship.is_none() {
                return Err(PlacementIssue::NoSource.into());
            }
            if let Some(tile) = area
                .tiles()
                .find(|t| ctx.world.settlement_at(self.island, *t).is_some())
            {
                return Err(PlacementIssue::OutsideSettlement(tile).into());
            }
            None
        } else {
            let id = self
                .settlement
                .or_else(|| ctx.world.settlement_at(self.island, (self.x, self.y)))
                .ok_or(PlacementIssue::NoSource)?;
            let settlement = ctx.world.settlement(id)?;
            if settlement.owner != issuer || settlement.island != self.island {
                return Err(PlacementIssue::OutsideSettlement((self.x, self.y)).into());
            }
            if let Some(tile) = area.tiles().find(|t| !settlement.tiles.contains(t)) {
                return Err(PlacementIssue::OutsideSettlement(tile).into());
            }
            Some(id)
        };

        Ok(Placement {
            area,
            settlement,
            replaces: replaces.into_iter().collect(),
        })
    }

    /// Sources in charging order: wallet (gold only), ship, settlement.
    fn sources(&self, issuer: EntityId, settlement: Option<EntityId>) -> [Option<EntityId>; 3] {
        [Some(issuer), self.ship, settlement]
    }

    fn available(
        ctx: &SimulationContext,
        sources: &[Option<EntityId>; 3],
        res: ResourceId,
    ) -> Result<u32, SimError> {
        let mut total = 0u32;
        for (i, source) in sources.iter().enumerate() {
            let Some(id) = source else { continue };
            if i == 0 && res != ResourceId::GOLD {
                continue;
            }
            total = total.saturating_add(ctx.world.inventory(*id)?.get(res));
        }
        Ok(total)
    }

    pub fn check_resources(
        &self,
        ctx: &SimulationContext,
        issuer: EntityId,
        settlement: Option<EntityId>,
    ) -> Result<(), SimError> {
        let ty = ctx.registry.building(self.building_type)?;
        let sources = self.sources(issuer, settlement);
        for (&res, &cost) in &ty.costs {
            if Self::available(ctx, &sources, res)? < cost {
                return Err(SimError::InsufficientResources { resource: res });
            }
        }
        Ok(())
    }

    fn charge(
        &self,
        ctx: &mut SimulationContext,
        issuer: EntityId,
        settlement: Option<EntityId>,
        costs: &BTreeMap<ResourceId, u32>,
    ) -> Result<(), SimError> {
        let sources = self.sources(issuer, settlement);
        for (&res, &cost) in costs {
            let mut owed = cost as i32;
            for (i, source) in sources.iter().enumerate() {
                let Some(id) = *source else { continue };
                if owed == 0 || (i == 0 && res != ResourceId::GOLD) {
                    continue;
                }
                owed = -ctx.alter_inventory(id, res, -owed)?;
            }
            if owed != 0 {
                return Err(SimError::InsufficientResources { resource: res });
            }
        }
        Ok(())
    }

    /// Validate, tear the tear set, construct, charge and start.
    pub fn execute(
        &self,
        ctx: &mut SimulationContext,
        issuer: Option<EntityId>,
    ) -> Result<EntityId, SimError> {
        let placement = self.check_placement(ctx, issuer).inspect_err(|err| {
            debug!(building_type = %self.building_type, x = self.x, y = self.y, %err, "build rejected");
        })?;
        if let Some(issuer) = issuer {
            self.check_resources(ctx, issuer, placement.settlement)
                .inspect_err(|err| debug!(building_type = %self.building_type, %err, "build rejected"))?;
        }

        let registry = Arc::clone(&ctx.registry);
        let ty = registry.building(self.building_type)?;
        for &id in self.tear_set.iter().chain(&placement.replaces) {
            tear::tear_silently(ctx, id)?;
        }

        let owner = if self.ownerless { None } else { issuer };
        let id = construct(ctx, self, ty, placement.area, owner, placement.settlement)?;
        if let Some(issuer) = issuer {
            self.charge(ctx, issuer, placement.settlement, &ty.costs)?;
        }
        start(ctx, id)?;
        info!(building = id, name = %ty.name, x = self.x, y = self.y, "built");
        Ok(id)
    }
}

/// World-setup placement: no validation, no charge. Used for initial maps
/// and test scenarios.
pub fn place(
    ctx: &mut SimulationContext,
    build: &Build,
    owner: Option<EntityId>,
) -> Result<EntityId, SimError> {
    let registry = Arc::clone(&ctx.registry);
    let ty = registry.building(build.building_type)?;
    let area = build.area(ty);
    for &id in &build.tear_set {
        tear::tear_silently(ctx, id)?;
    }
    let settlement = build
        .settlement
        .or_else(|| ctx.world.settlement_at(build.island, (build.x, build.y)))
        .filter(|_| owner.is_some());
    let id = construct(ctx, build, ty, area, owner, settlement)?;
    start(ctx, id)?;
    Ok(id)
}

/// Create the building, register it on the island and in its settlement.
/// An owned branch office outside any settlement founds a new one.
fn construct(
    ctx: &mut SimulationContext,
    build: &Build,
    ty: &BuildingType,
    area: Rect,
    owner: Option<EntityId>,
    settlement: Option<EntityId>,
) -> Result<EntityId, SimError> {
    ctx.world.island(build.island)?;
    let id = ctx.world.id_gen.next_id();
    let tick = ctx.current_tick();

    let settlement = match (settlement, owner) {
        (None, Some(owner)) if ty.kind == BuildingKind::BranchOffice => {
            Some(found_settlement(ctx, owner, build.island)?)
        }
        (s, _) => s,
    };

    let building = Building {
        id,
        type_id: ty.id,
        kind: ty.kind,
        island: build.island,
        area,
        rotation: build.rotation,
        owner,
        settlement,
        inventory: Inventory::new(ty.inventory_limit),
        producers: Vec::new(),
        level: 0,
        inhabitants: ty.inhabitants,
        built_at: tick,
    };
    ctx.world.buildings.insert(id, building);
    ctx.world.island_mut(build.island)?.occupy(area, id);

    if let Some(settlement_id) = settlement {
        let bonus = ctx.config.storage_limit_bonus;
        // Land already claimed by another settlement stays with it.
        let free: Vec<_> = if ty.kind.is_storage() {
            ctx.world
                .island(build.island)?
                .land_tiles()
                .filter(|t| {
                    ctx.world
                        .settlement_at(build.island, *t)
                        .is_none_or(|s| s == settlement_id)
                })
                .collect()
        } else {
            Vec::new()
        };
        let settlement = ctx.world.settlement_mut(settlement_id)?;
        settlement.buildings.insert(id);
        settlement.claim(area, ty.radius, free.into_iter());
        if ty.kind == BuildingKind::Storage {
            let limit = settlement.inventory.default_limit() + bonus;
            settlement.inventory.set_default_limit(limit);
        }
    }

    ctx.record_event(EventKind::BuildingConstructed, id, ty.name.clone());
    Ok(id)
}

fn found_settlement(
    ctx: &mut SimulationContext,
    owner: EntityId,
    island: EntityId,
) -> Result<EntityId, SimError> {
    let name = format!("{} {}", ctx.world.player(owner)?.name, ctx.world.settlements.len() + 1);
    let id = ctx.world.id_gen.next_id();
    let settlement = Settlement::new(
        id,
        name.clone(),
        owner,
        island,
        ctx.config.settlement_base_limit,
        PERMISSION_LEVELS,
    );
    ctx.world.settlements.insert(id, settlement);
    let interval = ctx.config.tax_interval;
    ctx.scheduler.add_call(id, Callback::TaxRound, interval);
    ctx.record_event(EventKind::SettlementFounded, id, name);
    info!(settlement = id, owner, island, "settlement founded");
    ai::settlement_founded(ctx, id)?;
    Ok(id)
}

/// Bring a constructed building to life: producers plus its periodic rounds.
fn start(ctx: &mut SimulationContext, id: EntityId) -> Result<(), SimError> {
    production::install_producers(ctx, id)?;

    let registry = Arc::clone(&ctx.registry);
    let building = ctx.world.building(id)?;
    let consumes = building.producers.iter().flat_map(|p| p.lines.iter()).any(|l| {
        registry
            .line(*l)
            .is_ok_and(|line| !line.is_primary())
    });
    let is_storage = building.kind.is_storage() && building.settlement.is_some();

    if consumes {
        let interval = ctx.config.collector_interval;
        ctx.scheduler.add_call(id, Callback::CollectorRound, interval);
    }
    if is_storage {
        let interval = ctx.config.storage_interval;
        ctx.scheduler.add_call(id, Callback::StorageRound, interval);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn setup() -> (SimulationContext, EntityId, EntityId, EntityId) {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        (s.build(), player, island, settlement)
    }

    #[test]
    fn rejects_footprint_over_water() {
        let (ctx, player, island, settlement) = setup();
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;
        let err = Build::new(lumberjack, 29, 5, island)
            .in_settlement(settlement)
            .check_placement(&ctx, Some(player))
            .unwrap_err();
        assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::NotLand((30, 5))));
    }

    #[test]
    fn rejects_bad_rotation() {
        let (ctx, player, island, settlement) = setup();
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;
        let err = Build::new(lumberjack, 8, 8, island)
            .rotated(45)
            .in_settlement(settlement)
            .check_placement(&ctx, Some(player))
            .unwrap_err();
        assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::InvalidRotation(45)));
    }

    #[test]
    fn overlap_is_allowed_only_for_tear_set() {
        let (mut ctx, player, island, settlement) = setup();
        let tree = ctx.registry.by_name("tree").unwrap().id;
        let tree_id = place(&mut ctx, &Build::new(tree, 9, 9, island).ownerless(), None).unwrap();
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;
        let build = Build::new(lumberjack, 8, 8, island).in_settlement(settlement);

        assert_eq!(
            build.check_placement(&ctx, Some(player)).unwrap_err(),
            SimError::PlacementInvalid(PlacementIssue::Occupied((9, 9)))
        );
        assert!(build.tearing([tree_id]).check_placement(&ctx, Some(player)).is_ok());
    }

    #[test]
    fn wallet_pays_gold_only() {
        let (mut ctx, player, island, settlement) = setup();
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::GOLD, 1000);
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::BOARDS, 50);
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;
        let build = Build::new(lumberjack, 8, 8, island).in_settlement(settlement);

        assert_eq!(
            build.execute(&mut ctx, Some(player)).unwrap_err(),
            SimError::InsufficientResources {
                resource: ResourceId::BOARDS
            }
        );
        assert_eq!(ctx.world.count_buildings(settlement, lumberjack), 0);
    }

    #[test]
    fn costs_are_split_across_sources_in_order() {
        let (mut ctx, player, island, settlement) = setup();
        let ship = ctx.world.add_ship(player, "Gull", 50);
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::GOLD, 20);
        ctx.world.inventory_mut(ship).unwrap().alter(ResourceId::GOLD, 10);
        ctx.world.inventory_mut(ship).unwrap().alter(ResourceId::BOARDS, 1);
        ctx.world.inventory_mut(settlement).unwrap().alter(ResourceId::GOLD, 25);
        ctx.world.inventory_mut(settlement).unwrap().alter(ResourceId::BOARDS, 5);
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;

        Build::new(lumberjack, 8, 8, island)
            .from_ship(ship)
            .in_settlement(settlement)
            .execute(&mut ctx, Some(player))
            .unwrap();

        let gold = |ctx: &SimulationContext, id| ctx.world.inventory(id).unwrap().get(ResourceId::GOLD);
        let boards = |ctx: &SimulationContext, id| ctx.world.inventory(id).unwrap().get(ResourceId::BOARDS);
        assert_eq!((gold(&ctx, player), gold(&ctx, ship), gold(&ctx, settlement)), (0, 0, 5));
        assert_eq!((boards(&ctx, ship), boards(&ctx, settlement)), (0, 3));
    }

    #[test]
    fn branch_office_from_ship_founds_settlement() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 30);
        let ship = s.add_ship(player, &[(ResourceId::BOARDS, 10)]);
        s.give(player, ResourceId::GOLD, 1000);
        let mut ctx = s.build();
        let office = ctx.registry.by_name("branch_office").unwrap().id;

        let id = Build::new(office, 10, 10, island)
            .from_ship(ship)
            .execute(&mut ctx, Some(player))
            .unwrap();

        let settlement = ctx.world.building(id).unwrap().settlement.unwrap();
        let settlement = ctx.world.settlement(settlement).unwrap();
        assert_eq!(settlement.owner, player);
        assert!(settlement.tiles.contains(&(10, 10)));
        assert_eq!(ctx.world.inventory(player).unwrap().get(ResourceId::GOLD), 600);
        assert_eq!(ctx.world.inventory(ship).unwrap().get(ResourceId::BOARDS), 4);
        assert_eq!(ctx.world.events.of_kind(EventKind::SettlementFounded).count(), 1);
    }

    #[test]
    fn clay_pit_replaces_its_deposit() {
        let (mut ctx, player, island, settlement) = setup();
        ctx.world.player_mut(player).unwrap().settler_level = 1;
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::GOLD, 100);
        ctx.world.inventory_mut(settlement).unwrap().alter(ResourceId::BOARDS, 3);
        let deposit = ctx.registry.by_name("clay_deposit").unwrap().id;
        let pit = ctx.registry.by_name("clay_pit").unwrap().id;

        assert_eq!(
            Build::new(pit, 8, 8, island)
                .in_settlement(settlement)
                .check_placement(&ctx, Some(player))
                .unwrap_err(),
            SimError::PlacementInvalid(PlacementIssue::MissingDeposit)
        );

        let deposit_id =
            place(&mut ctx, &Build::new(deposit, 8, 8, island).ownerless(), None).unwrap();
        let pit_id = Build::new(pit, 8, 8, island)
            .in_settlement(settlement)
            .execute(&mut ctx, Some(player))
            .unwrap();
        assert!(ctx.world.building(deposit_id).is_err());
        assert_eq!(ctx.world.island(island).unwrap().occupant((9, 9)), Some(pit_id));
    }

    #[test]
    fn settlement_named_as_ship_is_rejected() {
        let (mut ctx, player, island, settlement) = setup();
        ctx.world.inventory_mut(player).unwrap().alter(ResourceId::GOLD, 100);
        ctx.world.inventory_mut(settlement).unwrap().alter(ResourceId::BOARDS, 2);
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;

        let err = Build::new(lumberjack, 8, 8, island)
            .from_ship(settlement)
            .in_settlement(settlement)
            .execute(&mut ctx, Some(player))
            .unwrap_err();
        assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::NoSource));
        assert_eq!(ctx.world.inventory(settlement).unwrap().get(ResourceId::BOARDS), 2);
        assert_eq!(ctx.world.count_buildings(settlement, lumberjack), 0);
    }

    #[test]
    fn foreign_stock_never_pays() {
        let mut s = Scenario::new();
        let ann = s.add_player("Ann", false);
        let bob = s.add_player("Bob", false);
        let home = s.add_square_island((0, 0), 30);
        let away = s.add_square_island((40, 0), 30);
        let ann_town = s.settle(ann, home, (2, 2));
        let bob_town = s.settle(bob, away, (42, 2));
        let bob_ship = s.add_ship(bob, &[(ResourceId::BOARDS, 10)]);
        s.give(ann, ResourceId::GOLD, 100);
        s.give(bob_town, ResourceId::BOARDS, 10);
        let mut ctx = s.build();
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;

        for source in [bob_town, bob_ship] {
            let err = Build::new(lumberjack, 8, 8, home)
                .from_ship(source)
                .in_settlement(ann_town)
                .execute(&mut ctx, Some(ann))
                .unwrap_err();
            assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::NoSource));
        }
        assert_eq!(ctx.world.inventory(bob_town).unwrap().get(ResourceId::BOARDS), 10);
        assert_eq!(ctx.world.inventory(bob_ship).unwrap().get(ResourceId::BOARDS), 10);
    }

    #[test]
    fn tear_set_is_limited_to_own_obstacles() {
        let mut s = Scenario::new();
        let ann = s.add_player("Ann", false);
        let bob = s.add_player("Bob", false);
        let home = s.add_square_island((0, 0), 30);
        let away = s.add_square_island((40, 0), 30);
        let ann_town = s.settle(ann, home, (2, 2));
        let bob_town = s.settle(bob, away, (42, 2));
        let far_tree = s.plant(home, (12, 12));
        let near_tree = s.plant(home, (9, 9));
        let bob_lumberjack = s.place(bob_town, "lumberjack", (46, 6));
        s.give(ann, ResourceId::GOLD, 100);
        s.give(ann_town, ResourceId::BOARDS, 10);
        let mut ctx = s.build();
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;
        let build = Build::new(lumberjack, 8, 8, home).in_settlement(ann_town);

        for target in [far_tree, bob_lumberjack] {
            let err = build
                .clone()
                .tearing([near_tree, target])
                .execute(&mut ctx, Some(ann))
                .unwrap_err();
            assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::CannotTear(target)));
            assert!(ctx.world.building(target).is_ok());
            assert!(ctx.world.building(near_tree).is_ok());
        }

        build.tearing([near_tree]).execute(&mut ctx, Some(ann)).unwrap();
        assert!(ctx.world.building(near_tree).is_err());
    }

    #[test]
    fn stale_occupant_counts_as_occupied() {
        let (mut ctx, player, island, settlement) = setup();
        let tree = ctx.registry.by_name("tree").unwrap().id;
        let tree_id = place(&mut ctx, &Build::new(tree, 9, 9, island).ownerless(), None).unwrap();
        ctx.world.buildings.remove(&tree_id);
        let lumberjack = ctx.registry.by_name("lumberjack").unwrap().id;

        let err = Build::new(lumberjack, 8, 8, island)
            .in_settlement(settlement)
            .check_placement(&ctx, Some(player))
            .unwrap_err();
        assert_eq!(err, SimError::PlacementInvalid(PlacementIssue::Occupied((9, 9))));
    }
}
