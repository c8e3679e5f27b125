//! A single scheduled match and the simultaneous group of matches (one per
//! arena) that share a match number.

use crate::MatchKind;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One scheduled match in one arena. `teams` holds a fixed-size sequence of
/// corners; a `None` entry is an empty corner (a bye, or a team that has
/// dropped out).
#[derive(Debug, Clone)]
pub struct Match {
    pub num: u32,
    pub display_name: String,
    pub arena: String,
    pub teams: Vec<Option<String>>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub kind: MatchKind,
    pub use_resolved_ranking: bool,
}

/// The simultaneous group of matches sharing one global match number, one
/// per arena.
#[derive(Debug, Clone, Default)]
pub struct MatchSlot {
    pub arenas: BTreeMap<String, Match>,
}

impl MatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num(&self) -> Option<u32> {
        self.arenas.values().next().map(|m| m.num)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.arenas.values().next().map(|m| m.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_slot_reports_num_and_start_time_from_its_arenas() {
        let mut slot = MatchSlot::new();
        assert_eq!(slot.num(), None);
        assert_eq!(slot.start_time(), None);
        slot.arenas.insert(
            "A".to_string(),
            Match {
                num: 3,
                display_name: "Match 3".to_string(),
                arena: "A".to_string(),
                teams: vec![Some("AAA".to_string()), None],
                start_time: chrono::DateTime::UNIX_EPOCH,
                end_time: chrono::DateTime::UNIX_EPOCH,
                kind: MatchKind::League,
                use_resolved_ranking: false,
            },
        );
        assert_eq!(slot.num(), Some(3));
        assert_eq!(slot.start_time(), Some(chrono::DateTime::UNIX_EPOCH));
    }
}
