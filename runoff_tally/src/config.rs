// ********* Input data structures ***********

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::Display;

/// The identifier of a candidate: a stable index into the caller-owned list
/// of candidate names. The tallying code never looks at names.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct CandidateId(pub u32);

/// One voter's raw rank assignment, as it comes out of the form data.
///
/// `ranks[c]` is the rank given to candidate `c`: 0 means that the candidate
/// was not ranked, and 1 up to the number of choice levels means "ranked at
/// that position". The same nonzero rank may legally appear for several
/// candidates (an invalid ballot in the eyes of the voting rules, but one
/// that the normalizer must repair rather than reject).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawAssignment {
    pub ranks: Vec<u32>,
}

impl RawAssignment {
    pub fn new(ranks: Vec<u32>) -> RawAssignment {
        RawAssignment { ranks }
    }

    /// True iff some nonzero rank is shared by two or more candidates.
    ///
    /// Callers use this to decide whether tie-break selection is needed at
    /// all, and to check that a reference voter is eligible for
    /// [TieBreakPolicy::AlignWithVoter].
    pub fn has_rank_collision(&self) -> bool {
        let mut seen: BTreeSet<u32> = BTreeSet::new();
        for &r in self.ranks.iter() {
            if r > 0 && !seen.insert(r) {
                return true;
            }
        }
        false
    }

    /// The number of candidates that received a nonzero rank.
    pub fn ranked_count(&self) -> usize {
        self.ranks.iter().filter(|&&r| r > 0).count()
    }
}

/// How the normalizer resolves several candidates sharing one rank.
///
/// The policy is selected once per election and threaded explicitly through
/// the normalizer.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakPolicy {
    /// Pick among the colliding candidates with the injected picker.
    Randomized,
    /// Adopt the relative order that the given voter (0-indexed into the
    /// assignment list) gave to the colliding candidates. The reference
    /// voter must itself be free of rank collisions; this is checked by the
    /// caller, not here.
    AlignWithVoter(usize),
}

/// A fully resolved ballot: candidate ids in preference order, most
/// preferred first, no duplicates.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Ballot {
    pub choices: Vec<CandidateId>,
}

// ******** Output data structures *********

/// Whether the winner set came out of a strict majority or a declared tie.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum WinnerStatus {
    Majority,
    Tied,
}

/// The outcome of one winner-finding call.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundWinners {
    pub winners: BTreeSet<CandidateId>,
    pub status: WinnerStatus,
}

/// One entry of the full ordinal ranking. When `tied` is set, every
/// candidate in the set shares `rank` and the following entry skips as many
/// rank positions as there are members.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RankingEntry {
    pub rank: u32,
    pub candidates: BTreeSet<CandidateId>,
    pub tied: bool,
}

/// Non-fatal advisories collected while normalizing a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum NormalizeWarning {
    /// The alignment voter ranked none of the colliding candidates, so the
    /// collision at `rank` was resolved with the picker instead.
    AmbiguousAlignment {
        rank: u32,
        colliding: Vec<CandidateId>,
    },
}

impl Display for NormalizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeWarning::AmbiguousAlignment { rank, .. } => {
                write!(
                    f,
                    "used the fallback pick to fix an improper vote at rank {}",
                    rank
                )
            }
        }
    }
}

/// Errors that prevent the tally from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// Every ballot ran out of candidates before a winner could be found.
    NoValidVotes,
    /// The elimination loop did not terminate within the round cap.
    NoConvergence,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::NoValidVotes => {
                write!(f, "reached a point with no valid votes left")
            }
            VotingErrors::NoConvergence => {
                write!(f, "the elimination rounds did not converge")
            }
        }
    }
}
