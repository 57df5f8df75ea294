#![allow(dead_code)]

use islesim::ai::ai_player::found_feeder_island;
use islesim::id::EntityId;
use islesim::scenario::Scenario;
use islesim::worldgen::{MapGenConfig, generate_world};
use islesim::{ResourceId, SimConfig, SimulationContext};

/// A human settlement with a lumberjack among three trees and two
/// residences stocked with food.
pub struct LumberCamp {
    pub ctx: SimulationContext,
    pub player: EntityId,
    pub settlement: EntityId,
    pub lumberjack: EntityId,
    pub trees: Vec<EntityId>,
    pub residences: Vec<EntityId>,
}

pub fn lumber_camp() -> LumberCamp {
    let mut s = Scenario::new();
    let player = s.add_player("Ann", false);
    let island = s.add_square_island((0, 0), 30);
    let settlement = s.settle(player, island, (2, 2));
    let lumberjack = s.place(settlement, "lumberjack", (6, 2));
    let trees = vec![
        s.plant(island, (9, 2)),
        s.plant(island, (9, 3)),
        s.plant(island, (6, 5)),
    ];
    let residences = vec![
        s.place(settlement, "residence", (2, 7)),
        s.place(settlement, "residence", (5, 7)),
    ];
    s.give(settlement, ResourceId::FOOD, 20);
    LumberCamp {
        ctx: s.build(),
        player,
        settlement,
        lumberjack,
        trees,
        residences,
    }
}

/// A generated map with one AI player settled on its first island.
pub fn ai_world(seed: u64) -> SimulationContext {
    let map = MapGenConfig {
        seed,
        ..MapGenConfig::default()
    };
    let mut ctx = generate_world(&map, SimConfig::with_seed(seed)).unwrap();
    let bot = ctx.world.add_player("Bot", true);
    let hold = ctx.config.ship_hold_limit;
    let ship = ctx.world.add_ship(bot, "Ship 1", hold);
    ctx.alter_inventory(bot, ResourceId::GOLD, 5000).unwrap();
    ctx.alter_inventory(ship, ResourceId::BOARDS, 40).unwrap();
    let office = found_feeder_island(&mut ctx, bot)
        .unwrap()
        .expect("room for a branch office");
    let settlement = ctx.world.building(office).unwrap().settlement.unwrap();
    ctx.alter_inventory(settlement, ResourceId::BOARDS, 30).unwrap();
    ctx
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
