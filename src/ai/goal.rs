//! Settlement goals: objectives checked every manager tick before the build
//! cascade. The highest-priority active goal runs first; its result decides
//! whether the rest of the tick may still build.

use std::collections::{BTreeSet, VecDeque};

use tracing::info;

use super::ai_player;
use super::builder;
use super::constants::GoalResult;
use super::personality::Personality;
use super::settlement_manager::SettlementManager;
use crate::command::Build;
use crate::error::SimError;
use crate::model::BuildingKind;
use crate::model::tile_map::Tile;
use crate::sim::SimulationContext;

pub trait Goal {
    fn priority(&self) -> u32;

    fn personality_name(&self) -> &'static str;

    fn active(
        &self,
        ctx: &SimulationContext,
        manager: &SettlementManager,
        personality: &Personality,
    ) -> Result<bool, SimError>;

    fn execute(
        &self,
        ctx: &mut SimulationContext,
        manager: &mut SettlementManager,
        personality: &Personality,
    ) -> Result<GoalResult, SimError>;
}

/// Every goal, highest priority first. Equal priorities keep this order.
pub fn all_goals(personality: &Personality) -> Vec<Box<dyn Goal>> {
    let mut goals: Vec<Box<dyn Goal>> = vec![
        Box::new(FoundFeederIslandGoal {
            priority: personality.found_feeder_island_priority,
        }),
        Box::new(BuildRoadNetworkGoal {
            priority: personality.road_network_priority,
        }),
    ];
    goals.sort_by_key(|g| std::cmp::Reverse(g.priority()));
    goals
}

/// Once a settlement has run out of room, found another one on a free
/// island.
#[derive(Debug, Clone, Copy)]
pub struct FoundFeederIslandGoal {
    pub priority: u32,
}

impl FoundFeederIslandGoal {
    fn need_feeder_island(
        ctx: &SimulationContext,
        manager: &SettlementManager,
        personality: &Personality,
    ) -> Result<bool, SimError> {
        let cutoff = personality.feeder_island_cutoff;
        Ok(builder::count_available_squares(ctx, manager.settlement, 3, cutoff)? < cutoff)
    }
}

impl Goal for FoundFeederIslandGoal {
    fn priority(&self) -> u32 {
        self.priority
    }

    fn personality_name(&self) -> &'static str {
        "FoundFeederIslandGoal"
    }

    fn active(
        &self,
        ctx: &SimulationContext,
        manager: &SettlementManager,
        personality: &Personality,
    ) -> Result<bool, SimError> {
        Ok(manager.can_provide_resources()
            && Self::need_feeder_island(ctx, manager, personality)?
            && ai_player::can_found_feeder_island(ctx, manager.owner)?)
    }

    fn execute(
        &self,
        ctx: &mut SimulationContext,
        manager: &mut SettlementManager,
        _personality: &Personality,
    ) -> Result<GoalResult, SimError> {
        info!(manager = %manager, "founding a feeder island");
        ai_player::found_feeder_island(ctx, manager.owner)?;
        Ok(GoalResult::BlockSettlementResourceUsage)
    }
}

/// Connect buildings of the village to the road network.
#[derive(Debug, Clone, Copy)]
pub struct BuildRoadNetworkGoal {
    pub priority: u32,
}

fn four_neighbors((x, y): Tile) -> [Tile; 4] {
    [(x, y - 1), (x + 1, y), (x, y + 1), (x - 1, y)]
}

impl BuildRoadNetworkGoal {
    /// Road tiles of the settlement.
    fn roads(ctx: &SimulationContext, manager: &SettlementManager) -> BTreeSet<Tile> {
        ctx.world
            .buildings_in(manager.settlement)
            .filter(|b| b.kind == BuildingKind::Road)
            .flat_map(|b| b.area.tiles())
            .collect()
    }

    fn needs_road(kind: BuildingKind) -> bool {
        matches!(
            kind,
            BuildingKind::Residence | BuildingKind::MainSquare | BuildingKind::Production | BuildingKind::Storage
        )
    }

    /// Shortest path of free settlement tiles from next to an unconnected
    /// building to next to an existing road.
    fn plan(
        ctx: &SimulationContext,
        manager: &SettlementManager,
        max_len: usize,
    ) -> Result<Option<Vec<Tile>>, SimError> {
        let roads = Self::roads(ctx, manager);
        if roads.is_empty() {
            return Ok(None);
        }
        let settlement = ctx.world.settlement(manager.settlement)?;
        let island = ctx.world.island(settlement.island)?;
        let free = |t: &Tile| {
            settlement.tiles.contains(t) && island.is_buildable(*t) && island.occupant(*t).is_none()
        };
        let touches_road = |t: &Tile| four_neighbors(*t).iter().any(|n| roads.contains(n));

        for building in ctx.world.buildings_in(manager.settlement) {
            if !Self::needs_road(building.kind) {
                continue;
            }
            let area = building.area;
            let connected = roads.iter().any(|r| area.distance_to_tile(*r) == 1);
            if connected {
                continue;
            }

            let mut queue: VecDeque<Vec<Tile>> = VecDeque::new();
            let mut seen = BTreeSet::new();
            for tile in area.border_tiles() {
                if free(&tile) && seen.insert(tile) {
                    queue.push_back(vec![tile]);
                }
            }
            while let Some(path) = queue.pop_front() {
                let Some(&last) = path.last() else { continue };
                if touches_road(&last) {
                    return Ok(Some(path));
                }
                if path.len() >= max_len {
                    continue;
                }
                for next in four_neighbors(last) {
                    if free(&next) && seen.insert(next) {
                        let mut longer = path.clone();
                        longer.push(next);
                        queue.push_back(longer);
                    }
                }
            }
        }
        Ok(None)
    }
}

impl Goal for BuildRoadNetworkGoal {
    fn priority(&self) -> u32 {
        self.priority
    }

    fn personality_name(&self) -> &'static str {
        "BuildRoadNetworkGoal"
    }

    fn active(
        &self,
        ctx: &SimulationContext,
        manager: &SettlementManager,
        _personality: &Personality,
    ) -> Result<bool, SimError> {
        Ok(ctx.world.count_kind(manager.settlement, BuildingKind::MainSquare) > 0)
    }

    fn execute(
        &self,
        ctx: &mut SimulationContext,
        manager: &mut SettlementManager,
        personality: &Personality,
    ) -> Result<GoalResult, SimError> {
        let max_len = personality.village_road_length.max(1) as usize;
        let Some(path) = Self::plan(ctx, manager, max_len)? else {
            return Ok(GoalResult::Skip);
        };
        let Some(road) = ctx.registry.by_name("road").map(|t| t.id) else {
            return Ok(GoalResult::Skip);
        };
        let island = ctx.world.settlement(manager.settlement)?.island;

        let mut built = 0;
        for (x, y) in path {
            let build = Build::new(road, x, y, island).in_settlement(manager.settlement);
            match ctx.execute(Some(manager.owner), build) {
                Ok(_) => built += 1,
                Err(SimError::InsufficientResources { .. } | SimError::PlacementInvalid(_)) => break,
                Err(err) => return Err(err),
            }
        }
        if built == 0 {
            return Ok(GoalResult::Skip);
        }
        info!(manager = %manager, built, "connected a building to the road network");
        Ok(GoalResult::BlockAllBuildingActions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourceId;
    use crate::scenario::Scenario;

    #[test]
    fn goals_are_ordered_by_priority() {
        let personality = Personality::default();
        let names: Vec<_> = all_goals(&personality)
            .iter()
            .map(|g| g.personality_name())
            .collect();
        assert_eq!(names, ["FoundFeederIslandGoal", "BuildRoadNetworkGoal"]);

        let roads_first = Personality {
            road_network_priority: 500,
            ..Personality::default()
        };
        assert_eq!(all_goals(&roads_first)[0].personality_name(), "BuildRoadNetworkGoal");
    }

    #[test]
    fn road_goal_connects_unconnected_residence() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        let settlement = s.settle(player, island, (10, 10));
        s.place(settlement, "main_square", (20, 10));
        s.place(settlement, "road", (19, 10));
        s.place(settlement, "road", (10, 13));
        s.place(settlement, "residence", (10, 16));
        s.give(player, ResourceId::GOLD, 100);
        let mut ctx = s.build();
        let mut manager = ctx.ai.managers.values().next().unwrap().clone();
        let personality = Personality::default();
        let goal = BuildRoadNetworkGoal { priority: 1 };

        assert!(goal.active(&ctx, &manager, &personality).unwrap());
        assert_eq!(
            goal.execute(&mut ctx, &mut manager, &personality).unwrap(),
            GoalResult::BlockAllBuildingActions
        );
        let roads = BuildRoadNetworkGoal::roads(&ctx, &manager);
        assert!(roads.contains(&(10, 15)));
        assert!(roads.contains(&(10, 14)));
    }

    #[test]
    fn feeder_goal_needs_a_finished_village() {
        let mut s = Scenario::new();
        let player = s.add_player("Bot", true);
        let island = s.add_square_island((0, 0), 40);
        s.settle(player, island, (10, 10));
        let ctx = s.build();
        let manager = ctx.ai.managers.values().next().unwrap();
        let goal = FoundFeederIslandGoal { priority: 1 };
        assert!(!goal.active(&ctx, manager, &Personality::default()).unwrap());
    }
}
