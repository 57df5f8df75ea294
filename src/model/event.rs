use serde::{Deserialize, Serialize};

use crate::id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventKind {
    SettlementFounded,
    BuildingConstructed,
    BuildingTorn,
    ProductionCompleted,
    ResidenceUpgraded,
}

string_enum!(EventKind {
    SettlementFounded => "settlement_founded",
    BuildingConstructed => "building_constructed",
    BuildingTorn => "building_torn",
    ProductionCompleted => "production_completed",
    ResidenceUpgraded => "residence_upgraded",
});

/// One audit record. Events never feed back into the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub tick: u64,
    pub kind: EventKind,
    pub entity: EntityId,
    #[serde(default)]
    pub description: String,
}

/// Append-only log of notable state changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, tick: u64, kind: EventKind, entity: EntityId, description: String) {
        let seq = self.events.len() as u64;
        self.events.push(Event {
            seq,
            tick,
            kind,
            entity,
            description,
        });
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Event> {
        self.events.iter()
    }

    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<Event> for EventLog {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut events: Vec<Event> = iter.into_iter().collect();
        events.sort_by_key(|e| e.seq);
        Self { events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_string_round_trip() {
        for kind in [
            EventKind::SettlementFounded,
            EventKind::BuildingConstructed,
            EventKind::BuildingTorn,
            EventKind::ProductionCompleted,
            EventKind::ResidenceUpgraded,
        ] {
            let s: String = kind.into();
            assert_eq!(EventKind::try_from(s).unwrap(), kind);
        }
        assert!(EventKind::try_from("birth".to_string()).is_err());
    }

    #[test]
    fn log_keeps_sequence_order() {
        let mut log = EventLog::new();
        log.record(5, EventKind::BuildingConstructed, 10, "lumberjack".into());
        log.record(9, EventKind::BuildingTorn, 10, String::new());
        assert_eq!(log.len(), 2);
        assert_eq!(log.of_kind(EventKind::BuildingTorn).count(), 1);

        let reversed: EventLog = log.iter().rev().cloned().collect();
        assert_eq!(reversed, log);
    }
}
