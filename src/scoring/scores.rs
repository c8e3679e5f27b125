//! Loads already-parsed result sheets into cumulative, ranked scores.
//!
//! Parsing the on-disk YAML result sheets and the scorer plugin itself are
//! out of this crate's scope (see `docs`); what's modeled here is the
//! boundary those collaborators cross: a [`ResultSheet`] carries one
//! match's raw per-team inputs, and a [`ScorerPlugin`] turns that into
//! game points, mirroring the historical `get_validated_scores` contract.

use super::team_score::TeamScore;
use crate::{ranker, CompstateError, CompstateResult, Team};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// A match identifier within one scores bucket: `(arena, match_number)`.
pub type MatchId = (String, u32);

/// Raw per-team inputs for one result sheet, as handed over by the
/// out-of-scope YAML loader.
#[derive(Debug, Clone)]
pub struct ResultSheet {
    pub arena: String,
    pub num: u32,
    pub teams: BTreeMap<String, TeamSheetEntry>,
    pub arena_zones: Option<Value>,
    pub other: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct TeamSheetEntry {
    pub disqualified: bool,
    pub present: bool,
    pub data: Value,
}

impl Default for TeamSheetEntry {
    fn default() -> Self {
        Self {
            disqualified: false,
            present: true,
            data: Value::Null,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("{0}")]
    Failed(String),
}

/// The injected, sport-specific scoring logic. The core depends only on
/// this trait, never on a concrete scorer.
pub trait ScorerPlugin: Send + Sync {
    fn calculate_scores(
        &self,
        teams_data: &BTreeMap<String, TeamSheetEntry>,
        arena_zones: Option<&Value>,
    ) -> Result<BTreeMap<String, Decimal>, ScorerError>;

    /// Optional extra validation of the sheet's `other` payload.
    fn validate(&self, _other: Option<&Value>) -> Result<(), ScorerError> {
        Ok(())
    }
}

fn get_validated_scores(
    scorer: &dyn ScorerPlugin,
    sheet: &ResultSheet,
) -> CompstateResult<BTreeMap<String, Decimal>> {
    let scores = scorer
        .calculate_scores(&sheet.teams, sheet.arena_zones.as_ref())
        .map_err(|e| CompstateError::ScorerFailed {
            arena: sheet.arena.clone(),
            num: sheet.num,
            message: e.to_string(),
        })?;
    scorer
        .validate(sheet.other.as_ref())
        .map_err(|e| CompstateError::ScorerFailed {
            arena: sheet.arena.clone(),
            num: sheet.num,
            message: e.to_string(),
        })?;
    Ok(scores)
}

/// Shared score bookkeeping for one portion of the competition (league,
/// knockout, or tiebreaker).
#[derive(Debug, Clone, Default)]
pub struct BaseScores {
    pub game_points: BTreeMap<MatchId, BTreeMap<String, Decimal>>,
    pub game_positions: BTreeMap<MatchId, BTreeMap<u32, HashSet<String>>>,
    pub ranked_points: BTreeMap<MatchId, BTreeMap<String, Decimal>>,
    pub teams: BTreeMap<String, TeamScore>,
}

impl BaseScores {
    fn build(
        sheets: &[ResultSheet],
        teams: &[Team],
        scorer: &dyn ScorerPlugin,
        place_points: &[u32],
    ) -> CompstateResult<Self> {
        let mut this = Self {
            teams: teams
                .iter()
                .map(|t| (t.tla.clone(), TeamScore::default()))
                .collect(),
            ..Default::default()
        };

        for sheet in sheets {
            this.load_sheet(sheet, scorer, place_points)?;
        }

        for match_points in this.game_points.values() {
            for (tla, score) in match_points {
                let team = this
                    .teams
                    .get_mut(tla)
                    .ok_or_else(|| CompstateError::InvalidTeam(tla.clone()))?;
                team.game_points += *score;
            }
        }

        Ok(this)
    }

    fn load_sheet(
        &mut self,
        sheet: &ResultSheet,
        scorer: &dyn ScorerPlugin,
        place_points: &[u32],
    ) -> CompstateResult<()> {
        let match_id: MatchId = (sheet.arena.clone(), sheet.num);
        if self.game_points.contains_key(&match_id) {
            return Err(CompstateError::DuplicateScoresheet {
                arena: sheet.arena.clone(),
                num: sheet.num,
            });
        }

        let game_points = get_validated_scores(scorer, sheet)?;

        let dsq: HashSet<&str> = sheet
            .teams
            .iter()
            .filter(|(_, entry)| entry.disqualified || !entry.present)
            .map(|(tla, _)| tla.as_str())
            .collect();

        let points_by_ref: BTreeMap<&str, Decimal> =
            game_points.iter().map(|(t, p)| (t.as_str(), *p)).collect();
        let positions = ranker::positions(&points_by_ref, &dsq);
        let ranked = ranker::ranked_points(&positions, &dsq, place_points);

        self.game_positions.insert(
            match_id.clone(),
            positions
                .into_iter()
                .map(|(pos, teams)| (pos, teams.into_iter().map(str::to_string).collect()))
                .collect(),
        );
        self.ranked_points.insert(
            match_id.clone(),
            ranked.into_iter().map(|(t, p)| (t.to_string(), p)).collect(),
        );
        self.game_points.insert(match_id, game_points);

        Ok(())
    }

    /// Highest match number for which any score data is held.
    pub fn last_scored_match(&self) -> Option<u32> {
        self.ranked_points.keys().map(|(_, num)| *num).max()
    }
}

/// League scores: cumulative league points plus a tie-aware ranking of the
/// whole roster.
#[derive(Debug, Clone, Default)]
pub struct LeagueScores {
    pub base: BaseScores,
    /// TLA to 1-based league position; ties share a position.
    pub positions: Vec<(String, u32)>,
}

impl LeagueScores {
    pub fn build(
        sheets: &[ResultSheet],
        teams: &[Team],
        scorer: &dyn ScorerPlugin,
        place_points: &[u32],
    ) -> CompstateResult<Self> {
        let mut base = BaseScores::build(sheets, teams, scorer, place_points)?;

        for match_points in base.ranked_points.clone().values() {
            for (tla, score) in match_points {
                let team = base
                    .teams
                    .get_mut(tla)
                    .ok_or_else(|| CompstateError::InvalidTeam(tla.clone()))?;
                team.league_points += *score;
            }
        }

        let positions = Self::rank_league(&base.teams);
        Ok(Self { base, positions })
    }

    /// Sorts `(tla, score)` descending by `(score, tla)`, so perfect ties
    /// are broken deterministically by TLA (not fairly, but reproducibly).
    /// Teams with equal scores share a position; the position index skips
    /// ahead by the size of the tied group.
    pub fn rank_league(team_scores: &BTreeMap<String, TeamScore>) -> Vec<(String, u32)> {
        let mut ranking: Vec<(&String, &TeamScore)> = team_scores.iter().collect();
        ranking.sort_by(|a, b| (b.1, b.0).cmp(&(a.1, a.0)));

        let mut out = Vec::with_capacity(ranking.len());
        let mut last_score: Option<&TeamScore> = None;
        let mut pos = 1u32;
        for (i, (tla, score)) in ranking.into_iter().enumerate() {
            if last_score != Some(score) {
                pos = i as u32 + 1;
            }
            out.push((tla.clone(), pos));
            last_score = Some(score);
        }
        out
    }

    pub fn position_of(&self, tla: &str) -> Option<u32> {
        self.positions.iter().find(|(t, _)| t == tla).map(|(_, p)| *p)
    }
}

/// Knockout scores: per-match tie-resolved rankings, using league position
/// as the tiebreak.
#[derive(Debug, Clone, Default)]
pub struct KnockoutScores {
    pub base: BaseScores,
    /// Per match, ordered TLA -> resolved position (winner first).
    pub resolved_positions: BTreeMap<MatchId, Vec<(String, u32)>>,
}

impl KnockoutScores {
    pub fn build(
        sheets: &[ResultSheet],
        teams: &[Team],
        scorer: &dyn ScorerPlugin,
        place_points: &[u32],
        league_positions: &[(String, u32)],
    ) -> CompstateResult<Self> {
        let base = BaseScores::build(sheets, teams, scorer, place_points)?;
        let league_lookup: BTreeMap<&str, u32> =
            league_positions.iter().map(|(t, p)| (t.as_str(), *p)).collect();

        let mut resolved_positions = BTreeMap::new();
        for (match_id, match_points) in &base.ranked_points {
            let ranking = Self::calculate_ranking(match_points, &league_lookup);
            resolved_positions.insert(match_id.clone(), ranking);
        }

        Ok(Self {
            base,
            resolved_positions,
        })
    }

    /// Key is `(points, -league_position)`; teams absent from the league
    /// use sentinel league position 0.
    pub fn calculate_ranking(
        match_points: &BTreeMap<String, Decimal>,
        league_positions: &BTreeMap<&str, u32>,
    ) -> Vec<(String, u32)> {
        let mut ranking: Vec<(&str, Decimal, i64)> = match_points
            .iter()
            .map(|(tla, points)| {
                let league_pos = league_positions.get(tla.as_str()).copied().unwrap_or(0) as i64;
                (tla.as_str(), *points, -league_pos)
            })
            .collect();
        ranking.sort_by_key(|b| std::cmp::Reverse((b.1, b.2)));

        let mut out = Vec::with_capacity(ranking.len());
        let mut last_key: Option<(Decimal, i64)> = None;
        let mut pos = 1u32;
        for (i, (tla, points, neg_league_pos)) in ranking.into_iter().enumerate() {
            let key = (points, neg_league_pos);
            if last_key != Some(key) {
                pos = i as u32 + 1;
            }
            out.push((tla.to_string(), pos));
            last_key = Some(key);
        }
        out
    }
}

/// Tiebreaker scores: same bookkeeping as the other buckets, no extra
/// derived state (there is exactly one tiebreaker match, if any).
pub type TiebreakerScores = BaseScores;

/// Owns all three score buckets and the overall "most recently scored
/// match" pointer, checked tiebreaker, then knockout, then league.
#[derive(Debug, Clone, Default)]
pub struct Scores {
    pub league: LeagueScores,
    pub knockout: KnockoutScores,
    pub tiebreaker: TiebreakerScores,
    pub last_scored_match: Option<u32>,
}

impl Scores {
    pub fn build(
        league_sheets: &[ResultSheet],
        knockout_sheets: &[ResultSheet],
        tiebreaker_sheets: &[ResultSheet],
        teams: &[Team],
        scorer: &dyn ScorerPlugin,
        place_points: &[u32],
    ) -> CompstateResult<Self> {
        let league = LeagueScores::build(league_sheets, teams, scorer, place_points)?;
        let knockout = KnockoutScores::build(
            knockout_sheets,
            teams,
            scorer,
            place_points,
            &league.positions,
        )?;
        let tiebreaker = TiebreakerScores::build(tiebreaker_sheets, teams, scorer, place_points)?;

        let last_scored_match = tiebreaker
            .last_scored_match()
            .or_else(|| knockout.base.last_scored_match())
            .or_else(|| league.base.last_scored_match());

        Ok(Self {
            league,
            knockout,
            tiebreaker,
            last_scored_match,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedScorer;
    impl ScorerPlugin for FixedScorer {
        fn calculate_scores(
            &self,
            teams_data: &BTreeMap<String, TeamSheetEntry>,
            _arena_zones: Option<&Value>,
        ) -> Result<BTreeMap<String, Decimal>, ScorerError> {
            Ok(teams_data
                .iter()
                .map(|(tla, entry)| {
                    let pts = entry
                        .data
                        .as_i64()
                        .map(Decimal::from)
                        .unwrap_or(Decimal::ZERO);
                    (tla.clone(), pts)
                })
                .collect())
        }
    }

    fn team(tla: &str) -> Team {
        Team::new(tla, tla)
    }

    fn sheet(arena: &str, num: u32, scores: &[(&str, i64)]) -> ResultSheet {
        ResultSheet {
            arena: arena.to_string(),
            num,
            teams: scores
                .iter()
                .map(|(tla, s)| {
                    (
                        tla.to_string(),
                        TeamSheetEntry {
                            data: Value::from(*s),
                            ..Default::default()
                        },
                    )
                })
                .collect(),
            arena_zones: None,
            other: None,
        }
    }

    #[test]
    fn duplicate_scoresheet_for_same_match_is_rejected() {
        let teams = vec![team("AAA"), team("BBB")];
        let sheets = vec![sheet("A", 0, &[("AAA", 1), ("BBB", 0)]); 2];
        let err = LeagueScores::build(&sheets, &teams, &FixedScorer, &ranker::DEFAULT_PLACE_POINTS)
            .unwrap_err();
        assert!(matches!(err, CompstateError::DuplicateScoresheet { .. }));
    }

    #[test]
    fn unknown_team_in_sheet_is_rejected() {
        let teams = vec![team("AAA")];
        let sheets = vec![sheet("A", 0, &[("AAA", 1), ("ZZZ", 0)])];
        let err = LeagueScores::build(&sheets, &teams, &FixedScorer, &ranker::DEFAULT_PLACE_POINTS)
            .unwrap_err();
        assert!(matches!(err, CompstateError::InvalidTeam(_)));
    }

    #[test]
    fn league_ranking_breaks_ties_by_score_then_tla_scenario_s5() {
        let teams = vec![team("ABC"), team("DEF"), team("GHI")];
        let mut scores = BTreeMap::new();
        scores.insert("ABC".to_string(), TeamScore::new(Decimal::from(4), Decimal::from(0)));
        scores.insert("DEF".to_string(), TeamScore::new(Decimal::from(4), Decimal::from(5)));
        scores.insert("GHI".to_string(), TeamScore::new(Decimal::from(0), Decimal::from(0)));
        let _ = teams;
        let ranking = LeagueScores::rank_league(&scores);
        assert_eq!(
            ranking,
            vec![
                ("DEF".to_string(), 1),
                ("ABC".to_string(), 2),
                ("GHI".to_string(), 3),
            ]
        );
    }

    #[test]
    fn league_ranking_ties_on_both_values_share_position() {
        let mut scores = BTreeMap::new();
        scores.insert("ABC".to_string(), TeamScore::new(Decimal::from(4), Decimal::from(5)));
        scores.insert("DEF".to_string(), TeamScore::new(Decimal::from(4), Decimal::from(5)));
        scores.insert("GHI".to_string(), TeamScore::new(Decimal::from(0), Decimal::from(0)));
        let ranking = LeagueScores::rank_league(&scores);
        assert_eq!(
            ranking,
            vec![
                ("DEF".to_string(), 1),
                ("ABC".to_string(), 1),
                ("GHI".to_string(), 3),
            ]
        );
    }

    #[test]
    fn knockout_resolved_positions_break_game_ties_by_league_position() {
        let mut match_points = BTreeMap::new();
        match_points.insert("AAA".to_string(), Decimal::from(5));
        match_points.insert("BBB".to_string(), Decimal::from(5));
        match_points.insert("CCC".to_string(), Decimal::from(2));
        let mut league_positions = BTreeMap::new();
        league_positions.insert("AAA", 2u32);
        league_positions.insert("BBB", 1u32);
        league_positions.insert("CCC", 3u32);
        let resolved = KnockoutScores::calculate_ranking(&match_points, &league_positions);
        // BBB has the better (lower) league position, so wins the tie.
        assert_eq!(resolved[0], ("BBB".to_string(), 1));
        assert_eq!(resolved[1], ("AAA".to_string(), 2));
        assert_eq!(resolved[2], ("CCC".to_string(), 3));
    }

    #[test]
    fn last_scored_match_checks_tiebreaker_then_knockout_then_league() {
        let teams = vec![team("AAA"), team("BBB")];
        let league_sheets = vec![sheet("A", 0, &[("AAA", 1), ("BBB", 0)])];
        let s = Scores::build(
            &league_sheets,
            &[],
            &[],
            &teams,
            &FixedScorer,
            &ranker::DEFAULT_PLACE_POINTS,
        )
        .unwrap();
        assert_eq!(s.last_scored_match, Some(0));
    }
}
