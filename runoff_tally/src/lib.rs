/*!
Instant-runoff tallying for ranked-choice elections.

The crate has two parts, used in sequence: [normalize_assignment] repairs a
voter's raw rank assignment (which may give the same rank to several
candidates) into a strict ordered ballot, and [find_winners] runs the
elimination rounds over the resulting ballots. [full_ranking] drives repeated
winner-finding calls to produce an ordinal ranking of every candidate.

Two rules deviate from textbook IRV on purpose and are kept as-is because
they change outcomes on some inputs: a round eliminates *every* candidate
strictly below the round's maximum first-preference count (not just the
lowest one), and an all-equal round is arbitrated by a backup-vote score
giving geometrically decaying credit (1, 1/2, 1/4, ...) to each ballot's
successive preferences.
*/

mod config;
pub mod manual;
mod normalize;

use log::{debug, info};

use std::collections::{BTreeSet, HashMap, HashSet};

pub use crate::config::*;
pub use crate::normalize::{normalize_assignment, CollisionPicker, HashPicker};

// Guard against a non-terminating elimination loop. Each round removes at
// least one candidate or returns, so any realistic election finishes far
// below this.
const MAX_ROUNDS: usize = 10_000;

/// Runs elimination rounds over the given ballots until a winner set is
/// found, with the candidates in `exclude` removed from every ballot first.
///
/// Returns a single candidate with [WinnerStatus::Majority] as soon as one
/// holds strictly more than half of the round's active first preferences, or
/// a set of candidates with [WinnerStatus::Tied] when no further elimination
/// is possible. Fails with [VotingErrors::NoValidVotes] when every ballot is
/// exhausted at the start of a round.
pub fn find_winners(
    ballots: &[Ballot],
    exclude: &HashSet<CandidateId>,
) -> Result<RoundWinners, VotingErrors> {
    let mut votes: Vec<Vec<CandidateId>> = ballots
        .iter()
        .map(|b| {
            b.choices
                .iter()
                .filter(|cid| !exclude.contains(cid))
                .cloned()
                .collect()
        })
        .collect();

    for round_id in 1..=MAX_ROUNDS {
        // First-preference counts over the ballots that still have one.
        let mut tally: HashMap<CandidateId, u64> = HashMap::new();
        for v in votes.iter() {
            if let Some(first) = v.first() {
                *tally.entry(*first).or_insert(0) += 1;
            }
        }
        if tally.is_empty() {
            return Err(VotingErrors::NoValidVotes);
        }
        let n: u64 = tally.values().sum();
        debug!(
            "find_winners: round {}: {} active ballots, top counts: {:?}",
            round_id, n, tally
        );

        let (&top_cid, &top_count) = tally.iter().max_by_key(|(_, count)| **count).unwrap();
        // Strict majority over the reals: top_count > n / 2.
        if top_count * 2 > n {
            debug!(
                "find_winners: round {}: {:?} has a majority ({} of {})",
                round_id, top_cid, top_count, n
            );
            let mut winners = BTreeSet::new();
            winners.insert(top_cid);
            return Ok(RoundWinners {
                winners,
                status: WinnerStatus::Majority,
            });
        }

        let mut removed: HashSet<CandidateId> = HashSet::new();
        let max_count = *tally.values().max().unwrap();

        if tally.values().any(|&count| count < max_count) {
            // Batch elimination: everyone strictly below the round maximum
            // goes in the same round, including candidates tied among
            // themselves below the max.
            for (&cid, &count) in tally.iter() {
                if count < max_count {
                    debug!(
                        "find_winners: round {}: removing {:?} (count {} < {})",
                        round_id, cid, count, max_count
                    );
                    removed.insert(cid);
                }
            }
        } else if votes.iter().all(|v| v.len() < 2) {
            // Complete tie and no ballot carries a backup preference.
            debug!("find_winners: round {}: tie without backup votes", round_id);
            return Ok(RoundWinners {
                winners: tally.keys().cloned().collect(),
                status: WinnerStatus::Tied,
            });
        } else {
            // Complete tie on first preferences. Arbitrate with backup
            // votes: each ballot credits 1 to its first remaining choice,
            // 1/2 to the second, 1/4 to the third, and so on. All weights
            // are powers of two, so the sums and comparisons are exact in
            // f64.
            let mut backup: HashMap<CandidateId, f64> = HashMap::new();
            for v in votes.iter() {
                let mut weight = 1.0_f64;
                for cid in v.iter() {
                    *backup.entry(*cid).or_insert(0.0) += weight;
                    weight /= 2.0;
                }
            }
            let max_score = tally
                .keys()
                .map(|cid| backup[cid])
                .fold(0.0_f64, f64::max);
            if tally.keys().any(|cid| backup[cid] < max_score) {
                for cid in tally.keys() {
                    if backup[cid] < max_score {
                        debug!(
                            "find_winners: round {}: removing {:?} (backup score {} < {})",
                            round_id, cid, backup[cid], max_score
                        );
                        removed.insert(*cid);
                    }
                }
            } else {
                // The backup scores are equal as well: the tie is final.
                // Every candidate holding any backup credit is part of it.
                debug!(
                    "find_winners: round {}: backup scores all equal, declaring a tie",
                    round_id
                );
                return Ok(RoundWinners {
                    winners: backup.keys().cloned().collect(),
                    status: WinnerStatus::Tied,
                });
            }
        }

        votes = votes
            .into_iter()
            .map(|v| {
                v.into_iter()
                    .filter(|cid| !removed.contains(cid))
                    .collect()
            })
            .collect();
    }
    Err(VotingErrors::NoConvergence)
}

/// Produces the full ordinal ranking of every candidate appearing in any
/// ballot, by repeatedly finding winners with the already-ranked candidates
/// excluded. Tied candidates share a rank and the following entry skips as
/// many positions as the tie is wide.
pub fn full_ranking(ballots: &[Ballot]) -> Result<Vec<RankingEntry>, VotingErrors> {
    let mut left: BTreeSet<CandidateId> = ballots
        .iter()
        .flat_map(|b| b.choices.iter().cloned())
        .collect();
    let mut ignore: HashSet<CandidateId> = HashSet::new();
    let mut rank: u32 = 1;
    let mut entries: Vec<RankingEntry> = Vec::new();

    while !left.is_empty() {
        let round = find_winners(ballots, &ignore)?;
        for cid in round.winners.iter() {
            ignore.insert(*cid);
            left.remove(cid);
        }
        let width = round.winners.len() as u32;
        debug!(
            "full_ranking: rank {}: {:?} (width {})",
            rank, round.winners, width
        );
        entries.push(RankingEntry {
            rank,
            candidates: round.winners,
            tied: width > 1,
        });
        rank += width;
    }
    Ok(entries)
}

/// The combined output of a whole tally run.
#[derive(Debug, Clone)]
pub struct TallyResult {
    /// The normalized ballots, one per voter, in input order.
    pub ballots: Vec<Ballot>,
    /// Normalization advisories, tagged with the 0-indexed voter.
    pub warnings: Vec<(usize, NormalizeWarning)>,
    /// The single-winner outcome.
    pub first_place: RoundWinners,
    /// The ordinal ranking of every candidate appearing in any ballot.
    pub ranking: Vec<RankingEntry>,
}

/// Normalizes every raw assignment and computes both the first-place result
/// and the full ranking in one call.
pub fn run_tally(
    raws: &[RawAssignment],
    policy: TieBreakPolicy,
    picker: &mut dyn CollisionPicker,
) -> Result<TallyResult, VotingErrors> {
    info!(
        "run_tally: processing {} raw assignments with policy {:?}",
        raws.len(),
        policy
    );

    let mut ballots: Vec<Ballot> = Vec::new();
    let mut warnings: Vec<(usize, NormalizeWarning)> = Vec::new();
    for (voter, raw) in raws.iter().enumerate() {
        let (ballot, ws) = normalize_assignment(raw, policy, raws, picker);
        debug!("run_tally: voter {}: ballot {:?}", voter, ballot);
        warnings.extend(ws.into_iter().map(|w| (voter, w)));
        ballots.push(ballot);
    }

    let first_place = find_winners(&ballots, &HashSet::new())?;
    info!("run_tally: first place: {:?}", first_place);
    let ranking = full_ranking(&ballots)?;
    Ok(TallyResult {
        ballots,
        warnings,
        first_place,
        ranking,
    })
}
