//! Scheduling and scoring core for a multi-arena robotics competition.
//!
//! Given teams, arenas, a planned league match list, delays observed during
//! the event, a knockout configuration, and a stream of per-match result
//! sheets, this crate builds an immutable, fully resolved model of the
//! competition: absolute-time match slots, cumulative league scores with
//! tie-resolved rankings, a progressed knockout bracket, and award winners.
//!
//! Parsing of the on-disk YAML documents and the per-game scorer plugin are
//! outside this crate's scope; [`competition`] accepts already-deserialized
//! input structs and an injected scorer closure.

mod awards;
mod competition;
mod error;
mod knockout;
mod league;
mod match_;
mod ranker;
mod rng;
mod scoring;
mod seeding;
mod team;
mod tiebreaker;
mod timing;
pub mod util;

pub use awards::*;
pub use competition::*;
pub use error::*;
pub use knockout::*;
pub use league::*;
pub use match_::*;
pub use ranker::*;
pub use rng::*;
pub use scoring::*;
pub use seeding::*;
pub use team::*;
pub use tiebreaker::*;
pub use timing::*;
