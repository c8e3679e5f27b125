//! Expands the planned league match list into absolute-time slots across
//! league periods, folding in delays, extra spacing, and team drop-outs.

use crate::util::range::{contains as range_contains, parse_match_numbers};
use crate::util::validation::{FieldError, ValidationErrors};
use crate::{CompstateError, CompstateResult, Delay, Match, MatchKind, MatchPeriod, MatchPeriodClock, MatchSlot, Team};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// One period's wall-clock bounds, before any matches are built into it.
#[derive(Debug, Clone)]
pub struct LeaguePeriodSpec {
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_end_time: DateTime<Utc>,
}

/// One planned league match: arena name to ordered team-TLA list.
#[derive(Debug, Clone)]
pub struct PlannedMatch {
    pub num: u32,
    pub arenas: BTreeMap<String, Vec<String>>,
}

/// `pre + match + post == total`; `total` is the per-slot duration used to
/// advance the clock.
#[derive(Debug, Clone, Copy)]
pub struct MatchSlotLengths {
    pub pre: TimeDelta,
    pub game: TimeDelta,
    pub post: TimeDelta,
    pub total: TimeDelta,
}

impl MatchSlotLengths {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.pre + self.game + self.post != self.total {
            let mut errs = ValidationErrors::new();
            errs.add(
                FieldError::builder()
                    .set_field("match_slot_lengths.total")
                    .add_invalid_format()
                    .add_message("total must equal pre + match + post")
                    .build(),
            );
            return Err(errs);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExtraSpacing {
    pub match_numbers: String,
    pub duration: TimeDelta,
}

/// Built league schedule: the emitted periods plus bookkeeping about how
/// many of the planned matches actually fit.
#[derive(Debug, Clone)]
pub struct LeagueSchedule {
    pub periods: Vec<MatchPeriod>,
    pub n_planned_league_matches: usize,
    pub n_league_matches: usize,
}

/// Builds the league schedule from planned matches, period specs, delays,
/// per-match team lists (team identities needed for drop-out handling),
/// slot lengths, and optional extra inter-match spacing.
pub struct LeagueBuilder<'a> {
    slot_lengths: MatchSlotLengths,
    delays: &'a [Delay],
    extra_spacing: &'a [ExtraSpacing],
    teams: &'a [Team],
    num_teams_per_arena: usize,
}

impl<'a> LeagueBuilder<'a> {
    pub fn new(
        slot_lengths: MatchSlotLengths,
        delays: &'a [Delay],
        extra_spacing: &'a [ExtraSpacing],
        teams: &'a [Team],
        num_teams_per_arena: usize,
    ) -> CompstateResult<Self> {
        slot_lengths.validate()?;
        Ok(Self {
            slot_lengths,
            delays,
            extra_spacing,
            teams,
            num_teams_per_arena,
        })
    }

    fn is_still_around(&self, tla: &str, match_number: u32) -> bool {
        self.teams
            .iter()
            .find(|t| t.tla == tla)
            .map(|t| t.is_still_around(match_number))
            .unwrap_or(true)
    }

    fn parsed_spacing(&self) -> CompstateResult<Vec<(Vec<RangeInclusive<u32>>, TimeDelta)>> {
        self.extra_spacing
            .iter()
            .map(|spacing| {
                let ranges = parse_match_numbers("league.extra_spacing.match_numbers", &spacing.match_numbers)?;
                Ok((ranges, spacing.duration))
            })
            .collect()
    }

    /// Builds the schedule, consuming planned matches in numeric order
    /// across the given periods. `planned` must be ordered `0..N-1`.
    pub fn build(
        &self,
        period_specs: &[LeaguePeriodSpec],
        planned: Vec<PlannedMatch>,
    ) -> CompstateResult<LeagueSchedule> {
        let n_planned_league_matches = planned.len();
        for (i, m) in planned.iter().enumerate() {
            if m.num != i as u32 {
                let mut errs = ValidationErrors::new();
                errs.add(
                    FieldError::builder()
                        .set_field("league.matches")
                        .add_invalid_format()
                        .add_message("planned match numbers must form a contiguous 0-based range")
                        .build(),
                );
                return Err(errs.into());
            }
        }

        let spacing = self.parsed_spacing()?;
        let mut remaining = planned.into_iter();
        let mut pending: Option<PlannedMatch> = remaining.next();
        let mut periods = Vec::with_capacity(period_specs.len());

        for spec in period_specs {
            let mut clock =
                MatchPeriodClock::new(spec.start_time, spec.end_time, spec.max_end_time, self.delays);
            let mut period = MatchPeriod {
                start_time: spec.start_time,
                end_time: spec.end_time,
                max_end_time: spec.max_end_time,
                description: spec.description.clone(),
                kind: MatchKind::League,
                matches: Vec::new(),
            };

            while let Some(planned_match) = pending.take() {
                let Some(start) = clock.current_time() else {
                    pending = Some(planned_match);
                    break;
                };
                clock.advance_time(self.slot_lengths.total);

                let slot = self.build_slot(&planned_match, start)?;
                period.matches.push(slot);

                for (ranges, duration) in &spacing {
                    if range_contains(ranges, planned_match.num + 1) {
                        clock.advance_time(*duration);
                    }
                }

                pending = remaining.next();
            }

            periods.push(period);
        }

        let n_league_matches: usize = periods.iter().map(|p| p.matches.len()).sum();

        Ok(LeagueSchedule {
            periods,
            n_planned_league_matches,
            n_league_matches,
        })
    }

    fn build_slot(&self, planned: &PlannedMatch, start: DateTime<Utc>) -> CompstateResult<MatchSlot> {
        let mut slot = MatchSlot::new();
        let end = start + self.slot_lengths.total;
        for (arena, team_tlas) in &planned.arenas {
            let mut teams: Vec<Option<String>> = team_tlas
                .iter()
                .map(|tla| {
                    if self.is_still_around(tla, planned.num) {
                        Some(tla.clone())
                    } else {
                        None
                    }
                })
                .collect();
            while teams.len() < self.num_teams_per_arena {
                teams.push(None);
            }
            if teams.len() != self.num_teams_per_arena {
                return Err(CompstateError::WrongNumberOfTeams {
                    num: planned.num,
                    expected: self.num_teams_per_arena,
                    found: teams.len(),
                });
            }
            slot.arenas.insert(
                arena.clone(),
                Match {
                    num: planned.num,
                    display_name: format!("Match {}", planned.num),
                    arena: arena.clone(),
                    teams,
                    start_time: start,
                    end_time: end,
                    kind: MatchKind::League,
                    use_resolved_ranking: false,
                },
            );
        }
        Ok(slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(minutes: i64) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH + TimeDelta::minutes(minutes)
    }

    fn lengths() -> MatchSlotLengths {
        MatchSlotLengths {
            pre: TimeDelta::zero(),
            game: TimeDelta::minutes(5),
            post: TimeDelta::zero(),
            total: TimeDelta::minutes(5),
        }
    }

    fn planned(num: u32, arena: &str, teams: &[&str]) -> PlannedMatch {
        let mut arenas = BTreeMap::new();
        arenas.insert(arena.to_string(), teams.iter().map(|t| t.to_string()).collect());
        PlannedMatch { num, arenas }
    }

    #[test]
    fn simple_two_match_schedule_scenario_s1() {
        let teams = vec![];
        let builder = LeagueBuilder::new(lengths(), &[], &[], &teams, 4).unwrap();
        let specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(270),
            max_end_time: t(270),
        }];
        let plan = vec![
            planned(0, "A", &["T1", "T2", "T3", "T4"]),
            planned(1, "A", &["T1", "T2", "T3", "T4"]),
        ];
        let schedule = builder.build(&specs, plan).unwrap();
        assert_eq!(schedule.n_league_matches, 2);
        let slots = &schedule.periods[0].matches;
        assert_eq!(slots[0].start_time(), Some(t(0)));
        assert_eq!(slots[1].start_time(), Some(t(5)));
    }

    #[test]
    fn delay_pushes_later_matches_scenario_s2() {
        let teams = vec![];
        let delays = [Delay {
            at: t(2),
            amount: TimeDelta::seconds(15),
        }];
        let builder = LeagueBuilder::new(lengths(), &delays, &[], &teams, 4).unwrap();
        let specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(270),
            max_end_time: t(270),
        }];
        let plan = vec![
            planned(0, "A", &["T1", "T2", "T3", "T4"]),
            planned(1, "A", &["T1", "T2", "T3", "T4"]),
        ];
        let schedule = builder.build(&specs, plan).unwrap();
        let slots = &schedule.periods[0].matches;
        assert_eq!(slots[0].start_time(), Some(t(0)));
        assert_eq!(
            slots[1].start_time(),
            Some(t(0) + TimeDelta::minutes(5) + TimeDelta::seconds(15))
        );
    }

    #[test]
    fn dropped_out_team_is_replaced_with_none() {
        let mut teams = vec![Team::new("T1", "One")];
        teams[0].dropped_out_after = Some(0);
        let builder = LeagueBuilder::new(lengths(), &[], &[], &teams, 4).unwrap();
        let specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(270),
            max_end_time: t(270),
        }];
        let plan = vec![
            planned(0, "A", &["T1", "T2", "T3", "T4"]),
            planned(1, "A", &["T1", "T2", "T3", "T4"]),
        ];
        let schedule = builder.build(&specs, plan).unwrap();
        let slot = &schedule.periods[0].matches[1];
        let m = &slot.arenas["A"];
        assert_eq!(m.teams[0], None);
    }

    #[test]
    fn non_contiguous_match_numbers_are_rejected() {
        let teams = vec![];
        let builder = LeagueBuilder::new(lengths(), &[], &[], &teams, 4).unwrap();
        let specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(270),
            max_end_time: t(270),
        }];
        let plan = vec![planned(0, "A", &["T1", "T2", "T3", "T4"]), planned(2, "A", &["T1", "T2", "T3", "T4"])];
        assert!(builder.build(&specs, plan).is_err());
    }

    #[test]
    fn matches_that_overflow_all_periods_are_recorded_as_unscheduled() {
        let teams = vec![];
        let builder = LeagueBuilder::new(lengths(), &[], &[], &teams, 4).unwrap();
        let specs = vec![LeaguePeriodSpec {
            description: "Main".into(),
            start_time: t(0),
            end_time: t(4),
            max_end_time: t(4),
        }];
        let plan = vec![
            planned(0, "A", &["T1", "T2", "T3", "T4"]),
            planned(1, "A", &["T1", "T2", "T3", "T4"]),
        ];
        let schedule = builder.build(&specs, plan).unwrap();
        assert_eq!(schedule.n_planned_league_matches, 2);
        assert!(schedule.n_league_matches < schedule.n_planned_league_matches);
    }
}
