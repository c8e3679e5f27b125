//! Teams, arenas, and corners: the static roster a competition is built
//! against.

use crate::util::normalize::normalize_tla;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub tla: String,
    pub name: String,
    #[serde(default)]
    pub rookie: bool,
    #[serde(default)]
    pub dropped_out_after: Option<u32>,
}

impl Team {
    pub fn new(tla: impl AsRef<str>, name: impl Into<String>) -> Self {
        Self {
            tla: normalize_tla(tla),
            name: name.into(),
            rookie: false,
            dropped_out_after: None,
        }
    }

    /// True if this team is still competing as of the given league match
    /// number; drop-outs are permanent from that match onward.
    pub fn is_still_around(&self, match_number: u32) -> bool {
        match self.dropped_out_after {
            None => true,
            Some(last) => match_number <= last,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub name: String,
    pub display_name: String,
    #[serde(default = "default_colour")]
    pub colour: String,
}

fn default_colour() -> String {
    "#FFFFFF".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corner {
    pub number: u32,
    pub colour: String,
}

/// The load-time roster: teams keyed by TLA, arenas and corners in
/// load-order.
#[derive(Debug, Clone, Default)]
pub struct Teams {
    by_tla: BTreeMap<String, Team>,
}

impl Teams {
    pub fn new(teams: impl IntoIterator<Item = Team>) -> Self {
        let mut by_tla = BTreeMap::new();
        for team in teams {
            by_tla.insert(team.tla.clone(), team);
        }
        Self { by_tla }
    }

    pub fn get(&self, tla: &str) -> Option<&Team> {
        self.by_tla.get(tla)
    }

    pub fn contains(&self, tla: &str) -> bool {
        self.by_tla.contains_key(tla)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Team> {
        self.by_tla.values()
    }

    pub fn rookies(&self) -> impl Iterator<Item = &Team> {
        self.by_tla.values().filter(|t| t.rookie)
    }

    pub fn len(&self) -> usize {
        self.by_tla.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tla.is_empty()
    }
}
