use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A team's cumulative points within one portion of the competition
/// (league, knockout, or tiebreaker). Ordered lexicographically by
/// `(league_points, game_points)`; a missing score compares less than any
/// present `TeamScore`, matching the historical "TeamScores are greater
/// than other things that have no score" rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamScore {
    pub league_points: Decimal,
    pub game_points: Decimal,
}

impl Default for TeamScore {
    fn default() -> Self {
        Self {
            league_points: Decimal::ZERO,
            game_points: Decimal::ZERO,
        }
    }
}

impl TeamScore {
    pub fn new(league_points: Decimal, game_points: Decimal) -> Self {
        Self {
            league_points,
            game_points,
        }
    }

    fn ordering_key(&self) -> (Decimal, Decimal) {
        (self.league_points, self.game_points)
    }
}

impl PartialOrd for TeamScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TeamScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering_key().cmp(&other.ordering_key())
    }
}
