use islesim::ResourceId;
use islesim::id::EntityId;
use islesim::model::{Producer, ProductionState};
use islesim::scenario::Scenario;
use islesim::SimulationContext;

fn producer(ctx: &SimulationContext, building: EntityId) -> &Producer {
    &ctx.world.building(building).unwrap().producers[0]
}

fn stock(ctx: &SimulationContext, building: EntityId, res: ResourceId) -> u32 {
    ctx.world.building(building).unwrap().inventory.get(res)
}

/// A lone tree: one wood per 40 s cycle, room for a single unit.
fn lone_tree() -> (SimulationContext, EntityId) {
    let mut s = Scenario::new();
    let island = s.add_square_island((0, 0), 10);
    let tree = s.plant(island, (4, 4));
    (s.build(), tree)
}

#[test]
fn primary_cycle_takes_duration_times_speed() {
    let (mut ctx, tree) = lone_tree();
    let cycle = 40 * ctx.config.ticks_per_second;
    assert_eq!(producer(&ctx, tree).state, ProductionState::Working);

    ctx.advance(cycle - 1);
    assert_eq!(stock(&ctx, tree, ResourceId::WOOD), 0);

    ctx.advance(1);
    assert_eq!(stock(&ctx, tree, ResourceId::WOOD), 1);
    assert_eq!(producer(&ctx, tree).completed_cycles, 1);
}

#[test]
fn full_output_pauses_until_space_frees() {
    let (mut ctx, tree) = lone_tree();
    let cycle = 40 * ctx.config.ticks_per_second;
    ctx.advance(cycle);

    ctx.advance(cycle * 3);
    let p = producer(&ctx, tree);
    assert_eq!(p.state, ProductionState::WaitingForInput);
    assert!(p.blocked_on_output);
    assert_eq!(p.completed_cycles, 1);
    assert_eq!(stock(&ctx, tree, ResourceId::WOOD), 1);

    ctx.alter_inventory(tree, ResourceId::WOOD, -1).unwrap();
    ctx.tick();
    let p = producer(&ctx, tree);
    assert_eq!(p.state, ProductionState::Working);
    assert!(!p.blocked_on_output);

    ctx.advance(cycle);
    assert_eq!(producer(&ctx, tree).completed_cycles, 2);
}

#[test]
fn partial_input_waits_for_the_rest() {
    let mut s = Scenario::new();
    let owner = s.add_player("Ann", false);
    let island = s.add_square_island((0, 0), 20);
    let settlement = s.settle(owner, island, (2, 2));
    let toolmaker = s.place(settlement, "toolmaker", (8, 2));
    s.give(toolmaker, ResourceId::BOARDS, 1);
    let mut ctx = s.build();
    let tps = ctx.config.ticks_per_second;

    let p = producer(&ctx, toolmaker);
    assert_eq!(p.state, ProductionState::WaitingForInput);
    assert_eq!(p.reserved_of(ResourceId::BOARDS), 1);
    assert_eq!(p.progress, 50);
    assert_eq!(stock(&ctx, toolmaker, ResourceId::BOARDS), 0);

    ctx.advance(100 * tps);
    let p = producer(&ctx, toolmaker);
    assert_eq!(p.state, ProductionState::WaitingForInput);
    assert_eq!(p.completed_cycles, 0);

    ctx.alter_inventory(toolmaker, ResourceId::BOARDS, 1).unwrap();
    assert_eq!(producer(&ctx, toolmaker).state, ProductionState::Working);

    // Half the inputs arrived early, so half of the 30 s cycle is already done.
    ctx.advance(15 * tps - 1);
    assert_eq!(producer(&ctx, toolmaker).completed_cycles, 0);
    ctx.advance(1);
    let p = producer(&ctx, toolmaker);
    assert_eq!(p.completed_cycles, 1);
    assert!(p.reserved.is_empty());
}
