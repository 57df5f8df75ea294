use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimError;
use crate::id::EntityId;
use crate::sim::SimulationContext;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetTaxSetting {
    pub settlement: EntityId,
    pub tax: f64,
}

impl SetTaxSetting {
    pub fn new(settlement: EntityId, tax: f64) -> Self {
        Self { settlement, tax }
    }

    pub fn execute(&self, ctx: &mut SimulationContext) -> Result<(), SimError> {
        let settlement = ctx.world.settlement_mut(self.settlement)?;
        settlement.tax_setting = self.tax.max(0.0);
        debug!(settlement = self.settlement, tax = settlement.tax_setting, "tax setting changed");
        Ok(())
    }
}

/// Allow or forbid residences of `level` to upgrade to the next level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSettlementUpgradePermissions {
    pub settlement: EntityId,
    pub level: u8,
    pub allowed: bool,
}

impl SetSettlementUpgradePermissions {
    pub fn new(settlement: EntityId, level: u8, allowed: bool) -> Self {
        Self {
            settlement,
            level,
            allowed,
        }
    }

    pub fn execute(&self, ctx: &mut SimulationContext) -> Result<(), SimError> {
        let settlement = ctx.world.settlement_mut(self.settlement)?;
        let level = usize::from(self.level);
        if settlement.upgrade_permissions.len() <= level {
            settlement.upgrade_permissions.resize(level + 1, true);
        }
        settlement.upgrade_permissions[level] = self.allowed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn settings_apply_to_settlement() {
        let mut s = Scenario::new();
        let player = s.add_player("Ann", false);
        let island = s.add_square_island((0, 0), 20);
        let settlement = s.settle(player, island, (2, 2));
        let mut ctx = s.build();

        ctx.execute(Some(player), SetTaxSetting::new(settlement, 0.5)).unwrap();
        ctx.execute(Some(player), SetSettlementUpgradePermissions::new(settlement, 1, false))
            .unwrap();

        let settlement = ctx.world.settlement(settlement).unwrap();
        assert_eq!(settlement.tax_setting, 0.5);
        assert!(settlement.may_upgrade_from(0));
        assert!(!settlement.may_upgrade_from(1));
    }

    #[test]
    fn missing_settlement_is_reference_error() {
        let mut ctx = Scenario::new().build();
        assert_eq!(
            SetTaxSetting::new(42, 1.0).execute(&mut ctx).unwrap_err(),
            SimError::ReferenceNotFound(42)
        );
    }
}
