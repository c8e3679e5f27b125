//! Parser for the `match_numbers` range-expression grammar used by
//! `league.extra_spacing`: comma-separated integers or `a-b` inclusive
//! ranges, whitespace tolerated.

use super::validation::{FieldError, ValidationErrors};
use std::ops::RangeInclusive;

pub fn parse_match_numbers(field: &str, expr: &str) -> Result<Vec<RangeInclusive<u32>>, ValidationErrors> {
    let mut ranges = Vec::new();
    let mut errs = ValidationErrors::new();

    for part in expr.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match parse_part(part) {
            Ok(r) => ranges.push(r),
            Err(_) => errs.add(
                FieldError::builder()
                    .set_field(field)
                    .add_invalid_format()
                    .add_message(format!("could not parse range expression part {part:?}"))
                    .build(),
            ),
        }
    }

    errs.into_result()?;
    Ok(ranges)
}

fn parse_part(part: &str) -> Result<RangeInclusive<u32>, ()> {
    if let Some((a, b)) = part.split_once('-') {
        let a: u32 = a.trim().parse().map_err(|_| ())?;
        let b: u32 = b.trim().parse().map_err(|_| ())?;
        if a > b {
            return Err(());
        }
        Ok(a..=b)
    } else {
        let n: u32 = part.parse().map_err(|_| ())?;
        Ok(n..=n)
    }
}

/// True if `num` falls within any of the parsed ranges.
pub fn contains(ranges: &[RangeInclusive<u32>], num: u32) -> bool {
    ranges.iter().any(|r| r.contains(&num))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_integers_and_ranges() {
        let ranges = parse_match_numbers("match_numbers", "1, 3-5, 9").unwrap();
        assert_eq!(ranges, vec![1..=1, 3..=5, 9..=9]);
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        let ranges = parse_match_numbers("match_numbers", " 1 - 2 , 4 ").unwrap();
        assert_eq!(ranges, vec![1..=2, 4..=4]);
    }

    #[test]
    fn rejects_malformed_expression() {
        let err = parse_match_numbers("match_numbers", "1-2-3").unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].field(), "match_numbers");
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(parse_match_numbers("match_numbers", "5-1").is_err());
    }

    #[test]
    fn contains_checks_membership() {
        let ranges = parse_match_numbers("match_numbers", "1-3,7").unwrap();
        assert!(contains(&ranges, 2));
        assert!(contains(&ranges, 7));
        assert!(!contains(&ranges, 5));
    }
}
