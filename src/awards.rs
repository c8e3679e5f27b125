//! Derives award winners from the final (or tiebreaker) match's scored
//! positions, the rookie league standing, and any explicit overrides.

use crate::{CompstateError, CompstateResult, Match, Scores, Team};
use serde_json::Value;
use std::collections::BTreeMap;

/// Award categories, matching the rulebook's named set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Award {
    First,
    Second,
    Third,
    Rookie,
    Committee,
    Image,
    Movement,
    Web,
}

impl Award {
    pub fn name(self) -> &'static str {
        match self {
            Award::First => "first",
            Award::Second => "second",
            Award::Third => "third",
            Award::Rookie => "rookie",
            Award::Committee => "committee",
            Award::Image => "image",
            Award::Movement => "movement",
            Award::Web => "web",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "first" => Award::First,
            "second" => Award::Second,
            "third" => Award::Third,
            "rookie" => Award::Rookie,
            "committee" => Award::Committee,
            "image" => Award::Image,
            "movement" => Award::Movement,
            "web" => Award::Web,
            _ => return None,
        })
    }
}

/// Computes every award determinable from the current state. Awards whose
/// deciding match hasn't been scored yet are simply absent from the map.
pub fn compute_awards(
    scores: &Scores,
    knockout_rounds: &[Vec<Match>],
    teams: &[Team],
    tiebreaker: Option<&Match>,
    explicit: Option<&BTreeMap<String, Value>>,
) -> CompstateResult<BTreeMap<Award, Vec<String>>> {
    let mut awards = BTreeMap::new();
    awards.extend(compute_main_awards(scores, knockout_rounds, tiebreaker));
    awards.extend(compute_rookie_award(scores, teams));
    if let Some(explicit) = explicit {
        awards.extend(compute_explicit_awards(explicit)?);
    }
    Ok(awards)
}

fn compute_main_awards(
    scores: &Scores,
    knockout_rounds: &[Vec<Match>],
    tiebreaker: Option<&Match>,
) -> BTreeMap<Award, Vec<String>> {
    let mut awards = BTreeMap::new();

    let (deciding_match, positions) = if let Some(tiebreaker) = tiebreaker {
        let key = (tiebreaker.arena.clone(), tiebreaker.num);
        match scores.tiebreaker.game_positions.get(&key) {
            Some(p) => (tiebreaker.clone(), p),
            None => return awards,
        }
    } else {
        let Some(last_round) = knockout_rounds.last() else {
            return awards;
        };
        let Some(final_match) = last_round.first() else {
            return awards;
        };
        let key = (final_match.arena.clone(), final_match.num);
        match scores.knockout.base.game_positions.get(&key) {
            Some(p) => (final_match.clone(), p),
            None => return awards,
        }
    };

    for (award, place) in [(Award::First, 1u32), (Award::Second, 2), (Award::Third, 3)] {
        let mut candidates: Vec<String> = positions.get(&place).cloned().unwrap_or_default().into_iter().collect();
        candidates.sort();
        awards.insert(award, candidates);
    }

    // A 2-contestant final never populates position 3; fall back to the
    // preceding match's third place so e.g. bronze-medal matches still work.
    if awards.get(&Award::Third).map(|v| v.is_empty()).unwrap_or(false) {
        let contestants = deciding_match.teams.iter().filter(|t| t.is_some()).count();
        if contestants <= 2 {
            if let Some(preceding) = preceding_match(knockout_rounds, deciding_match.num) {
                let key = (preceding.arena.clone(), preceding.num);
                if let Some(p) = scores.knockout.base.game_positions.get(&key) {
                    let mut candidates: Vec<String> = p.get(&3).cloned().unwrap_or_default().into_iter().collect();
                    candidates.sort();
                    awards.insert(Award::Third, candidates);
                }
            }
        }
    }

    awards
}

/// The match immediately before `num` in the round preceding the final's.
fn preceding_match(knockout_rounds: &[Vec<Match>], num: u32) -> Option<&Match> {
    if knockout_rounds.len() < 2 {
        return None;
    }
    knockout_rounds[knockout_rounds.len() - 2]
        .iter()
        .filter(|m| m.num < num)
        .max_by_key(|m| m.num)
}

fn compute_rookie_award(scores: &Scores, teams: &[Team]) -> BTreeMap<Award, Vec<String>> {
    let rookie_positions: Vec<(&str, u32)> = teams
        .iter()
        .filter(|t| t.rookie)
        .filter_map(|t| scores.league.position_of(&t.tla).map(|p| (t.tla.as_str(), p)))
        .collect();

    let mut awards = BTreeMap::new();
    let Some(best) = rookie_positions.iter().map(|(_, p)| *p).min() else {
        awards.insert(Award::Rookie, Vec::new());
        return awards;
    };

    let mut winners: Vec<String> = rookie_positions
        .into_iter()
        .filter(|(_, p)| *p == best)
        .map(|(tla, _)| tla.to_string())
        .collect();
    winners.sort();
    awards.insert(Award::Rookie, winners);
    awards
}

fn compute_explicit_awards(explicit: &BTreeMap<String, Value>) -> CompstateResult<BTreeMap<Award, Vec<String>>> {
    let mut awards = BTreeMap::new();
    for (name, value) in explicit {
        let award = Award::from_name(name).ok_or_else(|| CompstateError::UnknownAward(name.clone()))?;
        let tlas = match value {
            Value::String(tla) => vec![tla.clone()],
            Value::Array(items) => items
                .iter()
                .map(|v| v.as_str().map(str::to_string).ok_or_else(|| CompstateError::UnknownAward(name.clone())))
                .collect::<CompstateResult<Vec<_>>>()?,
            _ => return Err(CompstateError::UnknownAward(name.clone())),
        };
        awards.insert(award, tlas);
    }
    Ok(awards)
}
