//! The automatic knockout scheduler: seeds the bracket from league
//! standings and a stable RNG, then progresses round by round using
//! recorded results (or the unknowable-team sentinel while they're still
//! outstanding).

use super::{get_match_display_name, get_ranking, non_dropped_out_teams, UNKNOWABLE_TEAM};
use crate::{
    CompstateError, CompstateResult, Delay, KnockoutScores, Match, MatchKind, MatchPeriod,
    MatchPeriodClock, MatchSlot, StableRng, Team,
};
use chrono::{DateTime, TimeDelta, Utc};

pub const NUM_TEAMS_PER_ARENA: usize = 4;

/// How many of the late rounds should run on a reduced set of arenas, and
/// the extra gap inserted immediately before the final.
#[derive(Debug, Clone)]
pub struct SingleArenaSchedule {
    pub rounds: u32,
    pub arenas: Vec<String>,
}

/// Configuration for [`SeededKnockoutScheduler::build`].
#[derive(Debug, Clone)]
pub struct SeededKnockoutConfig {
    pub start_time: DateTime<Utc>,
    pub max_end_time: DateTime<Utc>,
    pub description: String,
    pub match_duration: TimeDelta,
    pub round_spacing: TimeDelta,
    pub final_delay: TimeDelta,
    pub arenas: Vec<String>,
    pub single_arena: Option<SingleArenaSchedule>,
    /// Caps the number of teams admitted to the first round; `None` takes
    /// every team still in the competition.
    pub arity: Option<usize>,
}

/// Builds a knockout bracket, seeded from league standings, round by round.
pub struct SeededKnockoutScheduler<'a> {
    config: &'a SeededKnockoutConfig,
    teams: &'a [Team],
    league_positions: &'a [(String, u32)],
    league_fully_scored: bool,
    knockout_scores: &'a KnockoutScores,
    rng: StableRng,
    clock: MatchPeriodClock,
    next_num: u32,
    rounds: Vec<Vec<Match>>,
    matches: Vec<MatchSlot>,
}

impl<'a> SeededKnockoutScheduler<'a> {
    pub fn new(
        config: &'a SeededKnockoutConfig,
        delays: &'a [Delay],
        teams: &'a [Team],
        league_positions: &'a [(String, u32)],
        league_fully_scored: bool,
        knockout_scores: &'a KnockoutScores,
        first_match_num: u32,
    ) -> Self {
        let clock = MatchPeriodClock::new(config.start_time, config.max_end_time, config.max_end_time, delays);
        Self {
            config,
            teams,
            league_positions,
            league_fully_scored,
            knockout_scores,
            rng: StableRng::seed(""),
            clock,
            next_num: first_match_num,
            rounds: Vec::new(),
            matches: Vec::new(),
        }
    }

    fn get_winners(&self, match_: &Match) -> Vec<String> {
        get_ranking(self.knockout_scores, match_, NUM_TEAMS_PER_ARENA)
            .into_iter()
            .take(2)
            .collect()
    }

    fn rounds_remaining_for(matches_in_round: usize) -> u32 {
        (matches_in_round as f64).log2().round() as u32
    }

    /// Builds the first round: `arity`-many non-dropped-out teams (by
    /// league position), replaced wholesale with the unknowable sentinel if
    /// the league isn't fully scored yet, seeded into the bracket order by
    /// [`crate::first_round_seeding`].
    fn add_first_round(&mut self) -> CompstateResult<()> {
        let mut teams = non_dropped_out_teams(self.league_positions, self.teams, self.next_num);
        if !self.league_fully_scored {
            teams = vec![UNKNOWABLE_TEAM.to_string(); teams.len()];
        }

        self.rng = StableRng::seed(teams.join(""));

        let mut arity = teams.len();
        if let Some(conf_arity) = self.config.arity {
            if conf_arity < arity {
                arity = conf_arity;
            }
        }

        let seed_groups = crate::first_round_seeding(arity);
        let matches: Vec<Vec<String>> = seed_groups
            .into_iter()
            .map(|group| group.into_iter().map(|seed| teams[seed as usize].clone()).collect())
            .collect();

        let rounds_remaining = Self::rounds_remaining_for(matches.len());
        self.add_round_of_matches(matches, &self.config.arenas.clone(), rounds_remaining)
    }

    /// Pairs up the previous round's matches and carries their winners
    /// forward into the next round's team groups.
    fn add_round(&mut self, arenas: &[String], rounds_remaining: u32) -> CompstateResult<()> {
        let prev = self.rounds.last().expect("add_round called with no prior round");
        let mut matches = Vec::with_capacity(prev.len() / 2);
        for pair in prev.chunks(2) {
            let mut teams = self.get_winners(&pair[0]);
            if let Some(second) = pair.get(1) {
                teams.extend(self.get_winners(second));
            }
            matches.push(teams);
        }
        self.add_round_of_matches(matches, arenas, rounds_remaining)
    }

    /// Lays out one round's match groups across the given arenas, filling
    /// as many simultaneous arenas as are available per timeslot and
    /// spilling into further timeslots if there are more groups than arenas.
    fn add_round_of_matches(&mut self, mut groups: Vec<Vec<String>>, arenas: &[String], rounds_remaining: u32) -> CompstateResult<()> {
        self.rounds.push(Vec::new());
        let mut round_num = 0usize;

        while !groups.is_empty() {
            let start = self.clock.current_time().ok_or(CompstateError::WrongNumberOfTeams {
                num: self.next_num,
                expected: NUM_TEAMS_PER_ARENA,
                found: 0,
            })?;
            let end = start + self.config.match_duration;

            // Every arena sharing this timeslot shares one global match
            // number, allocated once per slot (not once per arena).
            let num = self.next_num;
            self.next_num += 1;

            let mut slot = MatchSlot::new();
            for arena in arenas {
                if groups.is_empty() {
                    break;
                }
                let mut teams = groups.remove(0);
                self.rng.shuffle(&mut teams);
                let mut corners: Vec<Option<String>> =
                    teams.into_iter().map(Some).collect();
                while corners.len() < NUM_TEAMS_PER_ARENA {
                    corners.push(None);
                }

                let match_ = Match {
                    num,
                    display_name: get_match_display_name(rounds_remaining, round_num, num),
                    arena: arena.clone(),
                    teams: corners,
                    start_time: start,
                    end_time: end,
                    kind: MatchKind::Knockout,
                    use_resolved_ranking: rounds_remaining != 0,
                };
                self.rounds.last_mut().unwrap().push(match_.clone());
                slot.arenas.insert(arena.clone(), match_);

                if groups.is_empty() {
                    break;
                }
            }

            self.clock.advance_time(self.config.match_duration);
            self.matches.push(slot);
            round_num += 1;
        }

        Ok(())
    }

    /// Drives the whole bracket to completion: the seeded first round, then
    /// round after round until a single final match remains, restricting to
    /// a smaller arena set and inserting the pre-final gap as configured.
    pub fn build(mut self) -> CompstateResult<(MatchPeriod, Vec<Vec<Match>>)> {
        self.add_first_round()?;

        while self.rounds.last().map(|r| r.len()).unwrap_or(0) > 1 {
            self.clock.advance_time(self.config.round_spacing);
            let rounds_remaining = Self::rounds_remaining_for(self.rounds.last().unwrap().len());

            let arenas = match &self.config.single_arena {
                Some(single) if rounds_remaining <= single.rounds => single.arenas.clone(),
                _ => self.config.arenas.clone(),
            };

            if self.rounds.last().unwrap().len() == 2 {
                self.clock.advance_time(self.config.final_delay);
            }

            self.add_round(&arenas, rounds_remaining.saturating_sub(1))?;
        }

        let period = MatchPeriod {
            start_time: self.config.start_time,
            end_time: self.config.max_end_time,
            max_end_time: self.config.max_end_time,
            description: self.config.description.clone(),
            kind: MatchKind::Knockout,
            matches: self.matches,
        };

        Ok((period, self.rounds))
    }
}
