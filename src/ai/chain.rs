//! Production chains: for a top-level resource, the tree of building types
//! and lines that feed it, down to the primary producers.

use std::collections::BTreeSet;

use super::builder;
use super::constants::BuildResult;
use crate::error::SimError;
use crate::id::EntityId;
use crate::model::{BuildingRegistry, BuildingTypeId, LineId, ProductionLine, ResourceId, World};
use crate::sim::SimulationContext;

/// One way of producing a resource: a building type running a line, plus the
/// chains of the line's inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainLink {
    pub building_type: BuildingTypeId,
    pub line: LineId,
    pub settler_level: u8,
    /// Units of the chain's resource per tick of one building.
    pub rate: f64,
    /// `(units consumed per unit produced, chain of that input)`.
    pub inputs: Vec<(f64, ProductionChain)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionChain {
    pub resource: ResourceId,
    pub links: Vec<ChainLink>,
}

/// Next thing a chain needs to satisfy a demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStep {
    Build(BuildingTypeId),
    AllBuilt,
    /// Every producer of a needed resource is above the player's tier.
    Skip,
}

fn line_rate(line: &ProductionLine, res: ResourceId, ticks_per_second: u64) -> f64 {
    let ticks = line.ticks(ticks_per_second).max(1);
    f64::from(line.produced_amount(res)) / ticks as f64
}

impl ProductionChain {
    /// Build the chain of `resource` from the registry. Cycles are cut at
    /// the first repeated resource.
    pub fn create(registry: &BuildingRegistry, resource: ResourceId, ticks_per_second: u64) -> Self {
        Self::create_inner(registry, resource, ticks_per_second, &mut BTreeSet::new())
    }

    fn create_inner(
        registry: &BuildingRegistry,
        resource: ResourceId,
        ticks_per_second: u64,
        seen: &mut BTreeSet<ResourceId>,
    ) -> Self {
        seen.insert(resource);
        let mut links = Vec::new();
        for (building_type, line_id) in registry.producers_of(resource) {
            let (Ok(ty), Ok(line)) = (registry.building(building_type), registry.line(line_id)) else {
                continue;
            };
            let produced = f64::from(line.produced_amount(resource));
            let mut inputs = Vec::new();
            for (res, amount) in line.consumed() {
                if seen.contains(&res) {
                    continue;
                }
                let child = Self::create_inner(registry, res, ticks_per_second, seen);
                inputs.push((f64::from(amount) / produced, child));
            }
            links.push(ChainLink {
                building_type,
                line: line_id,
                settler_level: ty.settler_level,
                rate: line_rate(line, resource, ticks_per_second),
                inputs,
            });
        }
        seen.remove(&resource);
        Self { resource, links }
    }

    /// Building types anywhere in the chain.
    pub fn building_types(&self) -> BTreeSet<BuildingTypeId> {
        let mut out = BTreeSet::new();
        for link in &self.links {
            out.insert(link.building_type);
            for (_, child) in &link.inputs {
                out.extend(child.building_types());
            }
        }
        out
    }

    /// Capacity of the top layer in units per tick, assuming every building
    /// of the chain's types in the settlement works at full speed.
    pub fn production_level(&self, world: &World, settlement: EntityId) -> f64 {
        self.links
            .iter()
            .map(|link| world.count_buildings(settlement, link.building_type) as f64 * link.rate)
            .sum()
    }

    /// Output actually reachable: each layer is capped by what its inputs
    /// can supply.
    pub fn final_production_level(&self, world: &World, settlement: EntityId) -> f64 {
        self.links
            .iter()
            .map(|link| {
                let own = world.count_buildings(settlement, link.building_type) as f64 * link.rate;
                link.inputs
                    .iter()
                    .map(|(ratio, child)| child.final_production_level(world, settlement) / ratio)
                    .fold(own, f64::min)
            })
            .sum()
    }

    /// First link the player's tier allows.
    fn usable_link(&self, settler_level: u8) -> Option<&ChainLink> {
        self.links.iter().find(|l| l.settler_level <= settler_level)
    }

    /// What to build next so the chain delivers `amount` units per tick.
    /// Inputs are satisfied before the layer that consumes them.
    pub fn bottleneck(
        &self,
        world: &World,
        settlement: EntityId,
        settler_level: u8,
        amount: f64,
    ) -> ChainStep {
        let Some(link) = self.usable_link(settler_level) else {
            return if self.links.is_empty() {
                ChainStep::AllBuilt
            } else {
                ChainStep::Skip
            };
        };
        for (ratio, child) in &link.inputs {
            match child.bottleneck(world, settlement, settler_level, amount * ratio) {
                ChainStep::AllBuilt => {}
                step => return step,
            }
        }
        if self.production_level(world, settlement) < amount {
            ChainStep::Build(link.building_type)
        } else {
            ChainStep::AllBuilt
        }
    }

    /// Build the bottleneck of the chain for a demand of `amount` units per
    /// tick, if there is one.
    pub fn build(
        &self,
        ctx: &mut SimulationContext,
        settlement: EntityId,
        settler_level: u8,
        amount: f64,
    ) -> Result<BuildResult, SimError> {
        match self.bottleneck(&ctx.world, settlement, settler_level, amount) {
            ChainStep::Build(ty) => builder::build_production(ctx, settlement, ty),
            ChainStep::AllBuilt => Ok(BuildResult::AllBuilt),
            ChainStep::Skip => Ok(BuildResult::Skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    fn registry() -> BuildingRegistry {
        BuildingRegistry::builtin()
    }

    #[test]
    fn food_chain_runs_through_farm_to_fields() {
        let reg = registry();
        let chain = ProductionChain::create(&reg, ResourceId::FOOD, 16);
        let farm = reg.by_name("farm").unwrap().id;
        let field = reg.by_name("potato_field").unwrap().id;

        assert_eq!(chain.links.len(), 1);
        assert_eq!(chain.links[0].building_type, farm);
        let (ratio, potatoes) = &chain.links[0].inputs[0];
        assert_eq!(*ratio, 1.0);
        assert_eq!(potatoes.resource, ResourceId::POTATOES);
        assert_eq!(potatoes.links[0].building_type, field);
        assert!(potatoes.links[0].inputs.is_empty());
    }

    #[test]
    fn get_together_chain_has_three_layers() {
        let reg = registry();
        let chain = ProductionChain::create(&reg, ResourceId::GET_TOGETHER, 16);
        let names: BTreeSet<_> = chain
            .building_types()
            .into_iter()
            .map(|id| reg.building(id).unwrap().name.clone())
            .collect();
        assert_eq!(
            names,
            ["distillery", "sugarcane_field", "tavern"]
                .into_iter()
                .map(String::from)
                .collect()
        );
        // A tavern turns one liquor into four get-togethers.
        assert_eq!(chain.links[0].inputs[0].0, 0.25);
    }

    #[test]
    fn bottleneck_builds_inputs_first() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", true);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        let ctx = s.build();
        let reg = &ctx.registry;
        let chain = ProductionChain::create(reg, ResourceId::FOOD, 16);
        let field = reg.by_name("potato_field").unwrap().id;

        assert_eq!(chain.bottleneck(&ctx.world, settlement, 0, 0.0), ChainStep::AllBuilt);
        assert_eq!(chain.bottleneck(&ctx.world, settlement, 0, 0.001), ChainStep::Build(field));
    }

    #[test]
    fn bottleneck_moves_up_once_fields_exist() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", true);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        s.place(settlement, "potato_field", (8, 2));
        let ctx = s.build();
        let chain = ProductionChain::create(&ctx.registry, ResourceId::FOOD, 16);
        let farm = ctx.registry.by_name("farm").unwrap().id;

        assert_eq!(chain.bottleneck(&ctx.world, settlement, 0, 0.001), ChainStep::Build(farm));
        assert_eq!(chain.final_production_level(&ctx.world, settlement), 0.0);
    }

    #[test]
    fn chains_above_the_tier_are_skipped() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", true);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        let ctx = s.build();
        let chain = ProductionChain::create(&ctx.registry, ResourceId::TEXTILE, 16);

        assert_eq!(chain.bottleneck(&ctx.world, settlement, 0, 0.01), ChainStep::Skip);
        let weaver_or_pasture = chain.bottleneck(&ctx.world, settlement, 1, 0.01);
        assert!(matches!(weaver_or_pasture, ChainStep::Build(_)));
    }

    #[test]
    fn build_places_the_bottleneck() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", true);
        let island = s.add_square_island((0, 0), 30);
        let settlement = s.settle(player, island, (2, 2));
        s.give(player, ResourceId::GOLD, 500);
        let mut ctx = s.build();
        let chain = ProductionChain::create(&ctx.registry, ResourceId::FOOD, 16);
        let field = ctx.registry.by_name("potato_field").unwrap().id;

        assert_eq!(chain.build(&mut ctx, settlement, 0, 0.0).unwrap(), BuildResult::AllBuilt);
        assert_eq!(chain.build(&mut ctx, settlement, 0, 0.001).unwrap(), BuildResult::Ok);
        assert_eq!(ctx.world.count_buildings(settlement, field), 1);
    }
}
