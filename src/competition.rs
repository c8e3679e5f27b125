//! Wires the scheduling and scoring subsystems together into one immutable,
//! fully resolved competition model, built once from a snapshot of inputs.

use crate::util::validation::{FieldError, ValidationErrors};
use crate::{
    awards, Arena, Award, CompstateError, CompstateResult, Delay, ExtraSpacing, LeagueBuilder,
    LeaguePeriodSpec, Match, MatchPeriod, MatchSlot, MatchSlotLengths, PlannedMatch, ResultSheet,
    ScorerPlugin, Scores, Team, Teams,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single named delay offset applied relative to a match's true start
/// (i.e. the start of the "match" phase, after any "pre" lead-in).
#[derive(Debug, Clone)]
pub struct StagingConfig {
    pub opens: TimeDelta,
    pub closes: TimeDelta,
    pub duration: TimeDelta,
    pub signal_teams: TimeDelta,
    pub signal_shepherds: BTreeMap<String, TimeDelta>,
}

impl StagingConfig {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.duration != self.opens - self.closes {
            let mut errs = ValidationErrors::new();
            errs.add(
                FieldError::builder()
                    .set_field("staging.duration")
                    .add_invalid_format()
                    .add_message("staging duration must equal opens - closes")
                    .build(),
            );
            return Err(errs);
        }
        Ok(())
    }
}

/// Resolved staging deadlines for one match.
#[derive(Debug, Clone)]
pub struct StagingTimes {
    pub opens: DateTime<Utc>,
    pub closes: DateTime<Utc>,
    pub duration: TimeDelta,
    pub signal_teams: DateTime<Utc>,
    pub signal_shepherds: BTreeMap<String, DateTime<Utc>>,
}

/// Which knockout scheduling strategy to use.
pub enum KnockoutScheduler {
    Seeded(crate::SeededKnockoutConfig),
    Static(crate::StaticKnockoutConfig, DateTime<Utc>, DateTime<Utc>),
}

pub struct NoTeams;
pub struct HasTeams(Vec<Team>);
pub struct NoScorer;
pub struct HasScorer(Arc<dyn ScorerPlugin>);
pub struct NoLeaguePlan;
pub struct HasLeaguePlan {
    period_specs: Vec<LeaguePeriodSpec>,
    planned: Vec<PlannedMatch>,
    slot_lengths: MatchSlotLengths,
}
pub struct NoKnockout;
pub struct HasKnockout(KnockoutScheduler);

/// Builds a [`Competition`] from input documents. The four collaborators
/// every competition needs — the roster, the scorer plugin, the league
/// plan, and the knockout configuration — are required via typestate;
/// everything else (arenas, delays, result sheets, staging, explicit
/// awards) defaults to empty/absent.
pub struct CompetitionBuilder<T, S, L, K> {
    teams: T,
    scorer: S,
    league_plan: L,
    knockout: K,
    arenas: Vec<Arena>,
    delays: Vec<Delay>,
    extra_spacing: Vec<ExtraSpacing>,
    place_points: Vec<u32>,
    league_sheets: Vec<ResultSheet>,
    knockout_sheets: Vec<ResultSheet>,
    tiebreaker_sheets: Vec<ResultSheet>,
    tiebreaker_time: Option<DateTime<Utc>>,
    staging: Option<StagingConfig>,
    explicit_awards: Option<BTreeMap<String, Value>>,
    timezone: String,
}

impl CompetitionBuilder<NoTeams, NoScorer, NoLeaguePlan, NoKnockout> {
    pub fn new() -> Self {
        Self {
            teams: NoTeams,
            scorer: NoScorer,
            league_plan: NoLeaguePlan,
            knockout: NoKnockout,
            arenas: Vec::new(),
            delays: Vec::new(),
            extra_spacing: Vec::new(),
            place_points: crate::ranker::DEFAULT_PLACE_POINTS.to_vec(),
            league_sheets: Vec::new(),
            knockout_sheets: Vec::new(),
            tiebreaker_sheets: Vec::new(),
            tiebreaker_time: None,
            staging: None,
            explicit_awards: None,
            timezone: "UTC".to_string(),
        }
    }
}

impl Default for CompetitionBuilder<NoTeams, NoScorer, NoLeaguePlan, NoKnockout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S, L, K> CompetitionBuilder<T, S, L, K> {
    pub fn set_teams(self, teams: Vec<Team>) -> CompetitionBuilder<HasTeams, S, L, K> {
        CompetitionBuilder {
            teams: HasTeams(teams),
            scorer: self.scorer,
            league_plan: self.league_plan,
            knockout: self.knockout,
            arenas: self.arenas,
            delays: self.delays,
            extra_spacing: self.extra_spacing,
            place_points: self.place_points,
            league_sheets: self.league_sheets,
            knockout_sheets: self.knockout_sheets,
            tiebreaker_sheets: self.tiebreaker_sheets,
            tiebreaker_time: self.tiebreaker_time,
            staging: self.staging,
            explicit_awards: self.explicit_awards,
            timezone: self.timezone,
        }
    }

    pub fn set_scorer(self, scorer: Arc<dyn ScorerPlugin>) -> CompetitionBuilder<T, HasScorer, L, K> {
        CompetitionBuilder {
            teams: self.teams,
            scorer: HasScorer(scorer),
            league_plan: self.league_plan,
            knockout: self.knockout,
            arenas: self.arenas,
            delays: self.delays,
            extra_spacing: self.extra_spacing,
            place_points: self.place_points,
            league_sheets: self.league_sheets,
            knockout_sheets: self.knockout_sheets,
            tiebreaker_sheets: self.tiebreaker_sheets,
            tiebreaker_time: self.tiebreaker_time,
            staging: self.staging,
            explicit_awards: self.explicit_awards,
            timezone: self.timezone,
        }
    }

    pub fn set_league_plan(
        self,
        period_specs: Vec<LeaguePeriodSpec>,
        planned: Vec<PlannedMatch>,
        slot_lengths: MatchSlotLengths,
    ) -> CompetitionBuilder<T, S, HasLeaguePlan, K> {
        CompetitionBuilder {
            teams: self.teams,
            scorer: self.scorer,
            league_plan: HasLeaguePlan {
                period_specs,
                planned,
                slot_lengths,
            },
            knockout: self.knockout,
            arenas: self.arenas,
            delays: self.delays,
            extra_spacing: self.extra_spacing,
            place_points: self.place_points,
            league_sheets: self.league_sheets,
            knockout_sheets: self.knockout_sheets,
            tiebreaker_sheets: self.tiebreaker_sheets,
            tiebreaker_time: self.tiebreaker_time,
            staging: self.staging,
            explicit_awards: self.explicit_awards,
            timezone: self.timezone,
        }
    }

    pub fn set_knockout(self, knockout: KnockoutScheduler) -> CompetitionBuilder<T, S, L, HasKnockout> {
        CompetitionBuilder {
            teams: self.teams,
            scorer: self.scorer,
            league_plan: self.league_plan,
            knockout: HasKnockout(knockout),
            arenas: self.arenas,
            delays: self.delays,
            extra_spacing: self.extra_spacing,
            place_points: self.place_points,
            league_sheets: self.league_sheets,
            knockout_sheets: self.knockout_sheets,
            tiebreaker_sheets: self.tiebreaker_sheets,
            tiebreaker_time: self.tiebreaker_time,
            staging: self.staging,
            explicit_awards: self.explicit_awards,
            timezone: self.timezone,
        }
    }

    pub fn arenas(mut self, arenas: Vec<Arena>) -> Self {
        self.arenas = arenas;
        self
    }

    pub fn delays(mut self, delays: Vec<Delay>) -> Self {
        self.delays = delays;
        self
    }

    pub fn extra_spacing(mut self, extra_spacing: Vec<ExtraSpacing>) -> Self {
        self.extra_spacing = extra_spacing;
        self
    }

    pub fn place_points(mut self, place_points: Vec<u32>) -> Self {
        self.place_points = place_points;
        self
    }

    pub fn result_sheets(
        mut self,
        league: Vec<ResultSheet>,
        knockout: Vec<ResultSheet>,
        tiebreaker: Vec<ResultSheet>,
    ) -> Self {
        self.league_sheets = league;
        self.knockout_sheets = knockout;
        self.tiebreaker_sheets = tiebreaker;
        self
    }

    pub fn tiebreaker_time(mut self, time: DateTime<Utc>) -> Self {
        self.tiebreaker_time = Some(time);
        self
    }

    pub fn staging(mut self, staging: StagingConfig) -> Self {
        self.staging = Some(staging);
        self
    }

    pub fn explicit_awards(mut self, awards: BTreeMap<String, Value>) -> Self {
        self.explicit_awards = Some(awards);
        self
    }

    pub fn timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

impl CompetitionBuilder<HasTeams, HasScorer, HasLeaguePlan, HasKnockout> {
    pub fn build(self) -> CompstateResult<Competition> {
        if let Some(staging) = &self.staging {
            staging.validate()?;
        }

        let teams = self.teams.0;
        let num_teams_per_arena = crate::knockout::NUM_TEAMS_PER_ARENA;

        let league_builder = LeagueBuilder::new(
            self.league_plan.slot_lengths,
            &self.delays,
            &self.extra_spacing,
            &teams,
            num_teams_per_arena,
        )?;
        let league_schedule = league_builder.build(&self.league_plan.period_specs, self.league_plan.planned)?;

        let league_scores_pre = crate::LeagueScores::build(&self.league_sheets, &teams, self.scorer.0.as_ref(), &self.place_points)?;
        let league_fully_scored = crate::knockout::played_all_league_matches(&league_schedule, &league_scores_pre);

        let knockout_scores_pre = crate::KnockoutScores::build(
            &self.knockout_sheets,
            &teams,
            self.scorer.0.as_ref(),
            &self.place_points,
            &league_scores_pre.positions,
        )?;

        let next_num = league_schedule.n_league_matches as u32;
        let (knockout_period, knockout_rounds) = match self.knockout.0 {
            KnockoutScheduler::Seeded(config) => {
                let scheduler = crate::SeededKnockoutScheduler::new(
                    &config,
                    &self.delays,
                    &teams,
                    &league_scores_pre.positions,
                    league_fully_scored,
                    &knockout_scores_pre,
                    next_num,
                );
                scheduler.build()?
            }
            KnockoutScheduler::Static(config, start, max_end) => {
                let scheduler = crate::StaticKnockoutScheduler::new(
                    &config,
                    &league_scores_pre.positions,
                    league_fully_scored,
                    &knockout_scores_pre,
                    next_num,
                );
                scheduler.build(start, max_end)?
            }
        };

        let scores = Scores::build(
            &self.league_sheets,
            &self.knockout_sheets,
            &self.tiebreaker_sheets,
            &teams,
            self.scorer.0.as_ref(),
            &self.place_points,
        )?;

        let final_match = knockout_rounds
            .last()
            .and_then(|round| round.first())
            .cloned()
            .ok_or_else(|| {
                CompstateError::MalformedInput(ValidationErrors {
                    errors: vec![FieldError::builder()
                        .set_field("knockout")
                        .add_required()
                        .add_message("knockout bracket produced no final match")
                        .build()],
                })
            })?;

        let (tiebreaker_period, tiebreaker_match) = match self.tiebreaker_time {
            Some(time) => crate::build_tiebreaker(
                &scores,
                &final_match,
                time,
                self.league_plan.slot_lengths.total,
                next_num + knockout_period.matches.len() as u32,
            )
            .map(|(p, m)| (Some(p), Some(m)))
            .unwrap_or((None, None)),
            None => (None, None),
        };

        let awards = awards::compute_awards(&scores, &knockout_rounds, &teams, tiebreaker_match.as_ref(), self.explicit_awards.as_ref())?;

        let mut match_periods = league_schedule.periods.clone();
        match_periods.push(knockout_period.clone());
        if let Some(tb_period) = &tiebreaker_period {
            match_periods.push(tb_period.clone());
        }

        Ok(Competition {
            teams: Teams::new(teams),
            arenas: self.arenas,
            match_periods,
            n_planned_league_matches: league_schedule.n_planned_league_matches,
            n_league_matches: league_schedule.n_league_matches,
            knockout_rounds,
            tiebreaker_match,
            scores,
            awards,
            delays: self.delays,
            staging: self.staging,
            slot_lengths: self.league_plan.slot_lengths,
            timezone: self.timezone,
        })
    }
}

/// The fully resolved, immutable competition model.
pub struct Competition {
    pub teams: Teams,
    pub arenas: Vec<Arena>,
    pub match_periods: Vec<MatchPeriod>,
    pub n_planned_league_matches: usize,
    pub n_league_matches: usize,
    pub knockout_rounds: Vec<Vec<Match>>,
    pub tiebreaker_match: Option<Match>,
    pub scores: Scores,
    pub awards: BTreeMap<Award, Vec<String>>,
    pub delays: Vec<Delay>,
    pub staging: Option<StagingConfig>,
    pub slot_lengths: MatchSlotLengths,
    pub timezone: String,
}

impl Competition {
    pub fn builder() -> CompetitionBuilder<NoTeams, NoScorer, NoLeaguePlan, NoKnockout> {
        CompetitionBuilder::new()
    }

    /// All scheduled match slots, in global-number order.
    pub fn matches(&self) -> Vec<&MatchSlot> {
        self.match_periods.iter().flat_map(|p| p.matches.iter()).collect()
    }

    pub fn n_matches(&self) -> usize {
        self.matches().len()
    }

    /// The last scheduled match: the tiebreaker if one was required,
    /// otherwise the knockout final.
    pub fn final_match(&self) -> Option<&Match> {
        self.matches().last().and_then(|slot| slot.arenas.values().next())
    }

    pub fn tiebreaker(&self) -> Option<&Match> {
        self.tiebreaker_match.as_ref()
    }

    pub fn matches_at(&self, instant: DateTime<Utc>) -> Vec<&Match> {
        self.matches()
            .into_iter()
            .flat_map(|slot| slot.arenas.values())
            .filter(|m| m.start_time <= instant && instant < m.end_time)
            .collect()
    }

    pub fn period_at(&self, instant: DateTime<Utc>) -> Option<&MatchPeriod> {
        self.match_periods
            .iter()
            .find(|p| p.start_time <= instant && instant < p.max_end_time)
    }

    /// Sum of delay amounts that have taken effect, within the period
    /// containing `instant`, up to and including `instant`.
    pub fn delay_at(&self, instant: DateTime<Utc>) -> TimeDelta {
        let Some(period) = self.period_at(instant) else {
            return TimeDelta::zero();
        };
        self.delays
            .iter()
            .filter(|d| d.at >= period.start_time && d.at <= instant)
            .fold(TimeDelta::zero(), |acc, d| acc + d.amount)
    }

    /// Staging deadlines for a match, derived from its true start (after
    /// any "pre" lead-in) and the configured staging offsets.
    pub fn get_staging_times(&self, match_: &Match) -> Option<StagingTimes> {
        let staging = self.staging.as_ref()?;
        let match_start = match_.start_time + self.slot_lengths.pre;
        Some(StagingTimes {
            opens: match_start - staging.opens,
            closes: match_start - staging.closes,
            duration: staging.duration,
            signal_teams: match_start - staging.signal_teams,
            signal_shepherds: staging
                .signal_shepherds
                .iter()
                .map(|(area, offset)| (area.clone(), match_start - *offset))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ScorerError, TeamSheetEntry};
    use rust_decimal::Decimal;

    struct OneNilScorer;
    impl ScorerPlugin for OneNilScorer {
        fn calculate_scores(
            &self,
            teams_data: &BTreeMap<String, TeamSheetEntry>,
            _arena_zones: Option<&Value>,
        ) -> Result<BTreeMap<String, Decimal>, ScorerError> {
            Ok(teams_data.keys().map(|tla| (tla.clone(), Decimal::ONE)).collect())
        }
    }

    fn t(minutes: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + TimeDelta::minutes(minutes)
    }

    #[test]
    fn end_to_end_competition_builds_a_final_match() {
        let tlas = ["AAA", "BBB", "CCC", "DDD"];
        let teams: Vec<Team> = tlas.iter().map(|t| Team::new(*t, *t)).collect();

        let slot_lengths = MatchSlotLengths {
            pre: TimeDelta::zero(),
            game: TimeDelta::minutes(5),
            post: TimeDelta::zero(),
            total: TimeDelta::minutes(5),
        };

        let mut arenas_map = BTreeMap::new();
        arenas_map.insert("A".to_string(), tlas.iter().map(|t| t.to_string()).collect());
        let planned = vec![PlannedMatch { num: 0, arenas: arenas_map }];

        let period_specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(5),
            max_end_time: t(5),
        }];

        let knockout_config = crate::SeededKnockoutConfig {
            start_time: t(10),
            max_end_time: t(100),
            description: "Knockouts".into(),
            match_duration: TimeDelta::minutes(5),
            round_spacing: TimeDelta::minutes(1),
            final_delay: TimeDelta::minutes(1),
            arenas: vec!["A".to_string()],
            single_arena: None,
            arity: None,
        };

        let competition = Competition::builder()
            .set_teams(teams)
            .set_scorer(Arc::new(OneNilScorer))
            .set_league_plan(period_specs, planned, slot_lengths)
            .set_knockout(KnockoutScheduler::Seeded(knockout_config))
            .build()
            .unwrap();

        assert!(competition.final_match().is_some());
        assert_eq!(competition.n_planned_league_matches, 1);
        assert_eq!(competition.match_periods.len(), 2);
    }
}
