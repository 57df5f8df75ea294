use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Which transition ring a coastline tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Shell {
    /// Land to sand.
    Beach,
    /// Sand to shallow water.
    Coast,
    /// Shallow to deep water.
    Deep,
}

string_enum!(Shell {
    Beach => "beach",
    Coast => "coast",
    Deep => "deep",
});

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directional variant of a coastline tile, named after the side the water
/// lies on. `Outer*` tiles touch the inner ring only diagonally, `Inner*`
/// tiles wrap around a concave corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Edge {
    North,
    East,
    South,
    West,
    OuterNorthEast,
    OuterNorthWest,
    OuterSouthEast,
    OuterSouthWest,
    InnerNorthEast,
    InnerNorthWest,
    InnerSouthEast,
    InnerSouthWest,
}

string_enum!(Edge {
    North => "n",
    East => "e",
    South => "s",
    West => "w",
    OuterNorthEast => "outer_ne",
    OuterNorthWest => "outer_nw",
    OuterSouthEast => "outer_se",
    OuterSouthWest => "outer_sw",
    InnerNorthEast => "inner_ne",
    InnerNorthWest => "inner_nw",
    InnerSouthEast => "inner_se",
    InnerSouthWest => "inner_sw",
});

// ---------------------------------------------------------------------------
// Ground
// ---------------------------------------------------------------------------

/// Ground of a single island tile. Tiles missing from an island's ground map
/// are open deep water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ground {
    Land,
    Sand,
    ShallowWater,
    Coastline { shell: Shell, edge: Edge },
}

impl Ground {
    /// Only full land tiles take buildings.
    pub fn is_buildable(self) -> bool {
        self == Ground::Land
    }

    pub fn is_water(self) -> bool {
        match self {
            Ground::Land | Ground::Sand => false,
            Ground::ShallowWater => true,
            Ground::Coastline { shell, .. } => shell != Shell::Beach,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_land_is_buildable() {
        assert!(Ground::Land.is_buildable());
        assert!(!Ground::Sand.is_buildable());
        assert!(
            !Ground::Coastline {
                shell: Shell::Beach,
                edge: Edge::North
            }
            .is_buildable()
        );
    }

    #[test]
    fn coastline_serializes_with_names() {
        let ground = Ground::Coastline {
            shell: Shell::Coast,
            edge: Edge::InnerSouthWest,
        };
        let json = serde_json::to_string(&ground).unwrap();
        assert_eq!(json, r#"{"coastline":{"shell":"coast","edge":"inner_sw"}}"#);
        let back: Ground = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ground);
        assert!(back.is_water());
    }

    #[test]
    fn unknown_edge_name_is_rejected() {
        assert!(Edge::try_from("sideways".to_string()).is_err());
        assert_eq!(Shell::try_from("deep".to_string()), Ok(Shell::Deep));
    }

    #[test]
    fn edge_names_are_distinct() {
        assert_eq!(Edge::VARIANTS.len(), 12);
        for edge in Edge::VARIANTS {
            assert_eq!(edge.as_str().parse::<Edge>(), Ok(*edge));
        }
    }
}
