mod scores;
mod team_score;

pub use scores::*;
pub use team_score::*;
