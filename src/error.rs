//! Error taxonomy for competition model construction.

use crate::util::validation::ValidationErrors;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompstateError {
    /// schema or structural violation in an input document
    #[error("malformed input: {0}")]
    MalformedInput(#[from] ValidationErrors),

    /// a result sheet names a team absent from the roster
    #[error("unknown team: {0}")]
    InvalidTeam(String),

    /// two result sheets were supplied for the same arena/match
    #[error("duplicate scoresheet for match {num} in arena {arena}")]
    DuplicateScoresheet { arena: String, num: u32 },

    /// a scheduled match slot's team count does not match the arena's capacity
    #[error("match {num} expected {expected} teams, found {found}")]
    WrongNumberOfTeams {
        num: u32,
        expected: usize,
        found: usize,
    },

    /// an explicit award override names an award outside the known set
    #[error("unknown award: {0}")]
    UnknownAward(String),

    /// venue/layout consistency error (out of core scope, surfaced for callers)
    #[error("venue error: {0}")]
    Venue(#[from] VenueError),

    /// the injected scorer plugin failed to calculate or validate a result sheet
    #[error("scorer plugin failed for match {num} in arena {arena}: {message}")]
    ScorerFailed {
        arena: String,
        num: u32,
        message: String,
    },
}

pub type CompstateResult<T> = Result<T, CompstateError>;

/// Venue/shepherding consistency problems. The venue/layout loader itself is
/// an external collaborator; these variants only exist so a caller driving
/// that collaborator has somewhere to report into.
#[derive(Debug, Clone, Error)]
pub enum VenueError {
    /// region referenced by the layout is not defined
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    /// a layout entry does not name a known team
    #[error("layout references unknown team: {0}")]
    LayoutTeams(String),

    /// a shepherding area references an unknown region
    #[error("unknown shepherding area: {0}")]
    ShepherdingAreas(String),

    /// two venue documents disagree about an overlapping key
    #[error("mismatch: {0}")]
    Mismatch(String),
}

/// Non-fatal problem noticed during construction (e.g. a match never
/// scored). Returned alongside a successfully built model rather than
/// aborting construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    UnscoredMatch { arena: String, num: u32 },
    PlannedMatchesExceedScheduled { planned: usize, scheduled: usize },
    TeamNotInLeague { tla: String },
}
