//! Injects an extra match when the final leaves more than one team tied for
//! first, using a fixed seating permutation of the tied contenders.

use crate::{Match, MatchKind, MatchPeriod, MatchSlot, Scores};
use chrono::{DateTime, TimeDelta, Utc};

const SEATING_PERMUTATION: [usize; 4] = [3, 2, 0, 1];

/// Builds the tiebreaker match and its enclosing period, or `None` if the
/// final hasn't been scored yet or produced a single winner.
pub fn build_tiebreaker(
    scores: &Scores,
    final_match: &Match,
    start_time: DateTime<Utc>,
    match_duration: TimeDelta,
    next_num: u32,
) -> Option<(MatchPeriod, Match)> {
    let key = (final_match.arena.clone(), final_match.num);
    let positions = scores.knockout.base.game_positions.get(&key)?;
    let winners = positions.get(&1)?;
    if winners.len() <= 1 {
        return None;
    }

    let filtered: Vec<Option<String>> = final_match
        .teams
        .iter()
        .map(|team| team.clone().filter(|tla| winners.contains(tla)))
        .collect();

    let seated: Vec<Option<String>> = (0..4)
        .map(|i| {
            let n = SEATING_PERMUTATION[i];
            filtered[SEATING_PERMUTATION[n]].clone()
        })
        .collect();

    let end_time = start_time + match_duration;
    let match_ = Match {
        num: next_num,
        display_name: format!("Tiebreaker (#{next_num})"),
        arena: final_match.arena.clone(),
        teams: seated,
        start_time,
        end_time,
        kind: MatchKind::Tiebreaker,
        use_resolved_ranking: false,
    };

    let mut slot = MatchSlot::new();
    slot.arenas.insert(match_.arena.clone(), match_.clone());

    let period = MatchPeriod {
        start_time,
        end_time,
        max_end_time: end_time,
        description: "Tiebreaker".to_string(),
        kind: MatchKind::Tiebreaker,
        matches: vec![slot],
    };

    Some((period, match_))
}
