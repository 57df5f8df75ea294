//! Serde adapter for maps keyed by tile coordinates.
//!
//! JSON object keys must be strings, so `BTreeMap<(i32, i32), V>` is written as
//! a sequence of `[x, y, value]` rows instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Tile = (i32, i32);

pub fn serialize<S, V>(map: &BTreeMap<Tile, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.iter().map(|(&(x, y), v)| (x, y, v)))
}

pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<Tile, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let rows: Vec<(i32, i32, V)> = Vec::deserialize(deserializer)?;
    Ok(rows.into_iter().map(|(x, y, v)| ((x, y), v)).collect())
}
