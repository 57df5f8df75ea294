use serde::{Deserialize, Serialize};

/// Outcome of one AI construction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildResult {
    Ok,
    NeedResources,
    /// No legal location or the command was rejected.
    Impossible,
    /// Demand is already covered.
    AllBuilt,
    /// Deliberately not built now (tier too low); try something else.
    Skip,
}

impl BuildResult {
    /// Whether the attempt used up the settlement manager's turn.
    pub fn consumes_turn(self) -> bool {
        !matches!(self, BuildResult::AllBuilt | BuildResult::Skip)
    }
}

/// How an executed goal restricts the rest of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalResult {
    /// Continue with the next goal.
    Skip,
    /// Nothing else may spend this settlement's resources this tick.
    BlockSettlementResourceUsage,
    /// No more construction this tick.
    BlockAllBuildingActions,
}

/// Entries of a settlement manager's build queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TaskType {
    VillageRoads,
    VillageMainSquare,
    ProductionLumberjack,
}

string_enum!(TaskType {
    VillageRoads => "village_roads",
    VillageMainSquare => "village_main_square",
    ProductionLumberjack => "production_lumberjack",
});

/// What a field is planted for; fields are counted per purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldPurpose {
    PotatoField,
    Pasture,
    SugarcaneField,
}

impl FieldPurpose {
    pub const ALL: [FieldPurpose; 3] = [
        FieldPurpose::PotatoField,
        FieldPurpose::Pasture,
        FieldPurpose::SugarcaneField,
    ];

    /// Building type name of the field.
    pub fn building_name(self) -> &'static str {
        match self {
            FieldPurpose::PotatoField => "potato_field",
            FieldPurpose::Pasture => "pasture",
            FieldPurpose::SugarcaneField => "sugarcane_field",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_real_attempts_consume_the_turn() {
        assert!(BuildResult::Ok.consumes_turn());
        assert!(BuildResult::NeedResources.consumes_turn());
        assert!(BuildResult::Impossible.consumes_turn());
        assert!(!BuildResult::AllBuilt.consumes_turn());
        assert!(!BuildResult::Skip.consumes_turn());
    }

    #[test]
    fn task_type_names_round_trip() {
        let json = serde_json::to_string(&TaskType::ProductionLumberjack).unwrap();
        assert_eq!(json, "\"production_lumberjack\"");
        let back: TaskType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TaskType::ProductionLumberjack);
    }
}
