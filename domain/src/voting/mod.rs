//! Voting: methods, weights, tallies and tie-breaking
//!
//! Everything here is pure. Collecting votes from agents happens in the
//! application layer, which feeds the collected [`Ballot`]s into a [`Tally`].

pub mod method;
pub mod result;
pub mod tally;
pub mod tie_break;
pub mod weight;

pub use method::{AbstentionPolicy, VotingMethod};
pub use result::{
    ExpertiseAssessment, ResultType, SelectedOption, SimpleVoteOutcome, TieResolution,
    VotingHistoryEntry, VotingResult,
};
pub use tally::{Abstention, Ballot, Tally, Vote, VoteWeight, TIE_EPSILON};
pub use tie_break::{StrategyApplication, TieBreakStrategy, TieContext};
pub use weight::{ExpertiseWeigher, UniformWeigher, VoteWeigher};
