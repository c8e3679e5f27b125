//! Standard competition ranking: ties share a position, the next distinct
//! value skips the positions the tie occupied.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

/// Default place-points vector for a 4-corner game, imported from the
/// historical ranker's own default.
pub const DEFAULT_PLACE_POINTS: [u32; 4] = [8, 6, 4, 2];

/// Maps 1-based position to the set of teams sharing it, in descending
/// points order. DSQ'd teams always occupy the lowest position.
pub fn positions<'a>(
    points: &BTreeMap<&'a str, Decimal>,
    dsq: &HashSet<&'a str>,
) -> BTreeMap<u32, HashSet<&'a str>> {
    let mut out: BTreeMap<u32, HashSet<&str>> = BTreeMap::new();

    let mut ranked: Vec<(&str, Decimal)> = points
        .iter()
        .filter(|(team, _)| !dsq.contains(*team))
        .map(|(team, pts)| (*team, *pts))
        .collect();
    ranked.sort_by_key(|b| std::cmp::Reverse(b.1));

    let mut pos = 1u32;
    let mut last_points: Option<Decimal> = None;
    let mut count_at_pos = 0u32;
    for (team, pts) in ranked {
        match last_points {
            Some(p) if p == pts => {
                count_at_pos += 1;
            }
            _ => {
                pos += count_at_pos;
                count_at_pos = 1;
                last_points = Some(pts);
            }
        }
        out.entry(pos).or_default().insert(team);
    }

    if !dsq.is_empty() {
        let dsq_position = (points.len() - dsq.len()) as u32 + 1;
        let entry = out.entry(dsq_position).or_default();
        for team in dsq {
            entry.insert(team);
        }
    }

    out
}

/// Splits each place's points equally among teams sharing that place; DSQ'd
/// teams score zero.
pub fn ranked_points<'a>(
    positions: &BTreeMap<u32, HashSet<&'a str>>,
    dsq: &HashSet<&'a str>,
    place_points: &[u32],
) -> BTreeMap<&'a str, Decimal> {
    let mut out = BTreeMap::new();

    for (&pos, teams) in positions {
        let all_dsq = teams.iter().all(|t| dsq.contains(t));
        if all_dsq {
            for team in teams {
                out.insert(*team, Decimal::ZERO);
            }
            continue;
        }
        let span = teams.len();
        let mut total = Decimal::ZERO;
        for i in 0..span {
            let place_index = (pos as usize - 1) + i;
            let pts = place_points
                .get(place_index)
                .copied()
                .unwrap_or(0);
            total += Decimal::from(pts);
        }
        let share = total / Decimal::from(span as u32);
        for team in teams {
            out.insert(*team, share);
        }
    }

    out
}
