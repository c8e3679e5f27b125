//! A fixed knockout bracket read from configuration: every match's arena,
//! start time and team references are supplied up front; this scheduler
//! only resolves the team references against league standings and
//! previously-played knockout matches.

use super::{get_match_display_name, get_ranking, UNKNOWABLE_TEAM};
use super::seeded::NUM_TEAMS_PER_ARENA;
use crate::{CompstateError, CompstateResult, KnockoutScores, Match, MatchKind, MatchPeriod, MatchSlot};
use crate::util::validation::{FieldError, ValidationErrors};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;

/// One pre-configured match: which arena and when, and the team references
/// to resolve into corners (a seed reference `S{k}`, or a 3-digit
/// round/match/position reference into an earlier round).
#[derive(Debug, Clone)]
pub struct StaticMatchInfo {
    pub arena: String,
    pub start_time: DateTime<Utc>,
    pub teams: Vec<String>,
}

/// The whole fixed bracket: round number to match number to match info,
/// both 0-based and dense.
#[derive(Debug, Clone, Default)]
pub struct StaticKnockoutConfig {
    pub rounds: BTreeMap<u32, BTreeMap<u32, StaticMatchInfo>>,
    pub match_duration: TimeDelta,
    pub description: String,
}

/// Builds a knockout bracket from a [`StaticKnockoutConfig`], assuming a
/// single arena overall (per-match arenas are still taken from config, but
/// nothing here parallelises across arenas the way the seeded scheduler
/// does).
pub struct StaticKnockoutScheduler<'a> {
    config: &'a StaticKnockoutConfig,
    league_positions: &'a [(String, u32)],
    league_fully_scored: bool,
    knockout_scores: &'a KnockoutScores,
    next_num: u32,
    rounds: Vec<Vec<Match>>,
    matches: Vec<MatchSlot>,
}

impl<'a> StaticKnockoutScheduler<'a> {
    pub fn new(
        config: &'a StaticKnockoutConfig,
        league_positions: &'a [(String, u32)],
        league_fully_scored: bool,
        knockout_scores: &'a KnockoutScores,
        first_match_num: u32,
    ) -> Self {
        Self {
            config,
            league_positions,
            league_fully_scored,
            knockout_scores,
            next_num: first_match_num,
            rounds: Vec::new(),
            matches: Vec::new(),
        }
    }

    /// Resolves one team reference to a TLA, the unknowable sentinel, or an
    /// error if the reference is out of range.
    fn get_team(&self, team_ref: &str) -> CompstateResult<String> {
        if !self.league_fully_scored {
            return Ok(UNKNOWABLE_TEAM.to_string());
        }

        if let Some(rest) = team_ref.strip_prefix('S') {
            let seed: usize = rest.parse().map_err(|_| invalid_reference(team_ref))?;
            if seed == 0 {
                return Err(invalid_reference(team_ref));
            }
            return self
                .league_positions
                .get(seed - 1)
                .map(|(tla, _)| tla.clone())
                .ok_or_else(|| invalid_reference(team_ref));
        }

        let digits: Vec<u32> = team_ref.chars().map(|c| c.to_digit(10)).collect::<Option<_>>().ok_or_else(|| invalid_reference(team_ref))?;
        if digits.len() != 3 {
            return Err(invalid_reference(team_ref));
        }
        let (round_num, match_num, pos) = (digits[0] as usize, digits[1] as usize, digits[2] as usize);

        let match_ = self
            .rounds
            .get(round_num)
            .and_then(|round| round.get(match_num))
            .ok_or_else(|| invalid_reference(team_ref))?;
        let ranking = get_ranking(self.knockout_scores, match_, NUM_TEAMS_PER_ARENA);
        ranking.get(pos).cloned().ok_or_else(|| invalid_reference(team_ref))
    }

    fn add_match(&mut self, info: &StaticMatchInfo, rounds_remaining: u32, round_num: u32) -> CompstateResult<()> {
        let end_time = info.start_time + self.config.match_duration;
        let num = self.next_num;
        self.next_num += 1;

        let mut teams: Vec<Option<String>> = info
            .teams
            .iter()
            .map(|r| self.get_team(r).map(Some))
            .collect::<CompstateResult<_>>()?;
        while teams.len() < NUM_TEAMS_PER_ARENA {
            teams.push(None);
        }

        let match_ = Match {
            num,
            display_name: get_match_display_name(rounds_remaining, round_num as usize, num),
            arena: info.arena.clone(),
            teams,
            start_time: info.start_time,
            end_time,
            kind: MatchKind::Knockout,
            use_resolved_ranking: rounds_remaining != 0,
        };

        self.rounds.last_mut().unwrap().push(match_.clone());
        let mut slot = MatchSlot::new();
        slot.arenas.insert(info.arena.clone(), match_);
        self.matches.push(slot);
        Ok(())
    }

    /// Builds every configured round, in round-number order, so each
    /// round's match references into the rounds before it can resolve.
    pub fn build(mut self, start_time: DateTime<Utc>, max_end_time: DateTime<Utc>) -> CompstateResult<(MatchPeriod, Vec<Vec<Match>>)> {
        let num_rounds = self.config.rounds.len();
        for (round_num, round_info) in self.config.rounds.clone() {
            self.rounds.push(Vec::new());
            let rounds_remaining = (num_rounds as u32).saturating_sub(round_num).saturating_sub(1);
            for (match_num, match_info) in &round_info {
                self.add_match(match_info, rounds_remaining, *match_num)?;
            }
        }

        let period = MatchPeriod {
            start_time,
            end_time: max_end_time,
            max_end_time,
            description: self.config.description.clone(),
            kind: MatchKind::Knockout,
            matches: self.matches,
        };
        Ok((period, self.rounds))
    }
}

fn invalid_reference(team_ref: &str) -> CompstateError {
    let mut errs = ValidationErrors::new();
    errs.add(
        FieldError::builder()
            .set_field("static_knockout.matches")
            .add_invalid_format()
            .add_message(format!("invalid or unresolvable team reference '{team_ref}'"))
            .build(),
    );
    errs.into()
}
