//! Knockout bracket generation: a seeded variant that derives the bracket
//! from league standings, and a static variant that reads a fixed bracket
//! with symbolic team references. Both share the helpers in this module.

mod seeded;
mod static_;

pub use seeded::*;
pub use static_::*;

use crate::{KnockoutScores, LeagueSchedule, LeagueScores, Match, MatchKind, Team};

/// Sentinel used when upstream results needed to resolve a knockout
/// participant are not yet available.
pub const UNKNOWABLE_TEAM: &str = "???";

/// Human-readable match name, in the historical naming convention.
pub fn get_match_display_name(rounds_remaining: u32, round_num: usize, global_num: u32) -> String {
    match rounds_remaining {
        0 => format!("Final (#{global_num})"),
        1 => format!("Semi {} (#{global_num})", round_num + 1),
        2 => format!("Quarter {} (#{global_num})", round_num + 1),
        _ => format!("Match {global_num}"),
    }
}

/// The tie-resolved ranking of a match's teams, winner first, or the
/// unknowable sentinel repeated `num_teams_per_arena` times if the match
/// hasn't been scored yet.
pub fn get_ranking(scores: &KnockoutScores, match_: &Match, num_teams_per_arena: usize) -> Vec<String> {
    let key = (match_.arena.clone(), match_.num);
    match scores.resolved_positions.get(&key) {
        Some(positions) => positions.iter().map(|(tla, _)| tla.clone()).collect(),
        None => vec![UNKNOWABLE_TEAM.to_string(); num_teams_per_arena],
    }
}

/// League positions, in rank order, restricted to teams still in the
/// competition as of `for_match`.
pub fn non_dropped_out_teams(league_positions: &[(String, u32)], teams: &[Team], for_match: u32) -> Vec<String> {
    league_positions
        .iter()
        .filter(|(tla, _)| {
            teams
                .iter()
                .find(|t| &t.tla == tla)
                .map(|t| t.is_still_around(for_match))
                .unwrap_or(true)
        })
        .map(|(tla, _)| tla.clone())
        .collect()
}

/// Whether every league match in the schedule has a recorded game score.
pub fn played_all_league_matches(league_schedule: &LeagueSchedule, league_scores: &LeagueScores) -> bool {
    for period in &league_schedule.periods {
        for slot in &period.matches {
            for match_ in slot.arenas.values() {
                if match_.kind != MatchKind::League {
                    continue;
                }
                let key = (match_.arena.clone(), match_.num);
                if !league_scores.base.game_points.contains_key(&key) {
                    return false;
                }
            }
        }
    }
    true
}
