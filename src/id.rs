use serde::{Deserialize, Serialize};

/// Stable identifier of every world object (players, islands, settlements,
/// ships, buildings, AI settlement managers).
pub type EntityId = u64;

/// Monotonic ID generator shared across all entity types.
/// IDs are unique across every object type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn starting_from(start: u64) -> Self {
        Self { next: start }
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// The ID the next call to `next_id` will hand out.
    pub fn peek(&self) -> EntityId {
        self.next
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids() {
        let mut id_gen = IdGenerator::new();
        assert_eq!(id_gen.next_id(), 1);
        assert_eq!(id_gen.next_id(), 2);
        assert_eq!(id_gen.next_id(), 3);
    }

    #[test]
    fn starting_from() {
        let mut id_gen = IdGenerator::starting_from(100);
        assert_eq!(id_gen.next_id(), 100);
        assert_eq!(id_gen.peek(), 101);
        assert_eq!(id_gen.next_id(), 101);
    }

    #[test]
    fn survives_serialization() {
        let mut id_gen = IdGenerator::new();
        id_gen.next_id();
        let json = serde_json::to_string(&id_gen).unwrap();
        let mut restored: IdGenerator = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.next_id(), 2);
    }
}
