use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a tradeable good.
///
/// Serialized by name (`"boards"`, `"food"`, ...) so that static data files and
/// save files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub const GOLD: ResourceId = ResourceId(1);
    pub const WOOL: ResourceId = ResourceId(2);
    pub const TEXTILE: ResourceId = ResourceId(3);
    pub const BOARDS: ResourceId = ResourceId(4);
    pub const FOOD: ResourceId = ResourceId(5);
    pub const TOOLS: ResourceId = ResourceId(6);
    pub const BRICKS: ResourceId = ResourceId(7);
    pub const WOOD: ResourceId = ResourceId(8);
    pub const POTATOES: ResourceId = ResourceId(9);
    pub const CLAY: ResourceId = ResourceId(10);
    pub const FAITH: ResourceId = ResourceId(11);
    pub const EDUCATION: ResourceId = ResourceId(12);
    pub const GET_TOGETHER: ResourceId = ResourceId(13);
    pub const SUGAR: ResourceId = ResourceId(14);
    pub const LIQUOR: ResourceId = ResourceId(15);

    pub const ALL: [ResourceId; 15] = [
        ResourceId::GOLD,
        ResourceId::WOOL,
        ResourceId::TEXTILE,
        ResourceId::BOARDS,
        ResourceId::FOOD,
        ResourceId::TOOLS,
        ResourceId::BRICKS,
        ResourceId::WOOD,
        ResourceId::POTATOES,
        ResourceId::CLAY,
        ResourceId::FAITH,
        ResourceId::EDUCATION,
        ResourceId::GET_TOGETHER,
        ResourceId::SUGAR,
        ResourceId::LIQUOR,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceId::GOLD => "gold",
            ResourceId::WOOL => "wool",
            ResourceId::TEXTILE => "textile",
            ResourceId::BOARDS => "boards",
            ResourceId::FOOD => "food",
            ResourceId::TOOLS => "tools",
            ResourceId::BRICKS => "bricks",
            ResourceId::WOOD => "wood",
            ResourceId::POTATOES => "potatoes",
            ResourceId::CLAY => "clay",
            ResourceId::FAITH => "faith",
            ResourceId::EDUCATION => "education",
            ResourceId::GET_TOGETHER => "get_together",
            ResourceId::SUGAR => "sugar",
            ResourceId::LIQUOR => "liquor",
            _ => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Option<ResourceId> {
        ResourceId::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ResourceId {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        ResourceId::from_name(&name).ok_or_else(|| format!("unknown resource '{name}'"))
    }
}

impl From<ResourceId> for String {
    fn from(res: ResourceId) -> Self {
        res.as_str().to_string()
    }
}
