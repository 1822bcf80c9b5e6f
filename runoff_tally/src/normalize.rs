//! Conversion of raw rank assignments into strict ordered ballots.

use log::debug;

use crate::config::*;

/// The source of arbitrary choices used to resolve rank collisions.
///
/// Injecting the picker keeps the normalizer itself deterministic and
/// testable: any implementation must return the single element unchanged
/// when `choices` has exactly one member, without consuming randomness.
pub trait CollisionPicker {
    /// Picks one candidate out of a non-empty slice.
    fn pick(&mut self, choices: &[CandidateId]) -> CandidateId;
}

/// The default picker. "Random" in this context means hard to guess in
/// advance: each draw sorts the candidates by a cryptographic digest of the
/// seed, a draw counter and the candidate id, and takes the first one. The
/// whole sequence of picks is reproducible from the seed.
pub struct HashPicker {
    seed: u32,
    draws: u32,
}

impl HashPicker {
    pub fn new(seed: u32) -> HashPicker {
        HashPicker { seed, draws: 0 }
    }
}

impl CollisionPicker for HashPicker {
    fn pick(&mut self, choices: &[CandidateId]) -> CandidateId {
        if let [single] = choices {
            return *single;
        }
        self.draws += 1;
        let mut data: Vec<(String, CandidateId)> = choices
            .iter()
            .map(|cid| {
                let digest = sha256::digest(format!("{:08}{:08}{:08}", self.seed, self.draws, cid.0));
                (digest, *cid)
            })
            .collect();
        data.sort();
        data[0].1
    }
}

/// The order in which a collision-free voter ranked its candidates, used as
/// the alignment reference. Rank 0 entries are skipped.
fn preference_order(raw: &RawAssignment) -> Vec<CandidateId> {
    let mut ranked: Vec<(u32, usize)> = raw
        .ranks
        .iter()
        .enumerate()
        .filter(|(_, &r)| r > 0)
        .map(|(idx, &r)| (r, idx))
        .collect();
    ranked.sort();
    ranked
        .iter()
        .map(|&(_, idx)| CandidateId(idx as u32))
        .collect()
}

/// Turns one raw rank assignment into a strict ordered ballot.
///
/// The scan goes from the smallest positive rank upwards. Every candidate
/// holding the current rank is appended in turn: a lone holder directly, a
/// collision through the tie-break policy. Under
/// [TieBreakPolicy::AlignWithVoter] the reference voter's own relative order
/// over the colliding candidates decides; when the reference ranked none of
/// them, the picker decides instead and a non-fatal warning is recorded.
///
/// The output never contains a rank-0 candidate and its length equals the
/// number of nonzero entries in `raw`.
pub fn normalize_assignment(
    raw: &RawAssignment,
    policy: TieBreakPolicy,
    all: &[RawAssignment],
    picker: &mut dyn CollisionPicker,
) -> (Ballot, Vec<NormalizeWarning>) {
    let mut remaining = raw.ranks.clone();
    let mut choices: Vec<CandidateId> = Vec::new();
    let mut warnings: Vec<NormalizeWarning> = Vec::new();

    loop {
        let cur_rank = match remaining.iter().filter(|&&r| r > 0).min() {
            Some(&r) => r,
            None => break,
        };
        let colliding: Vec<CandidateId> = remaining
            .iter()
            .enumerate()
            .filter(|(_, &r)| r == cur_rank)
            .map(|(idx, _)| CandidateId(idx as u32))
            .collect();

        let mut picked = picker.pick(&colliding);
        if colliding.len() > 1 {
            if let TieBreakPolicy::AlignWithVoter(voter) = policy {
                let aligned = all
                    .get(voter)
                    .map(preference_order)
                    .and_then(|order| order.into_iter().find(|cid| colliding.contains(cid)));
                match aligned {
                    Some(cid) => picked = cid,
                    None => {
                        debug!(
                            "normalize_assignment: alignment voter {} ranks none of {:?}, falling back to the picker",
                            voter, colliding
                        );
                        warnings.push(NormalizeWarning::AmbiguousAlignment {
                            rank: cur_rank,
                            colliding: colliding.clone(),
                        });
                    }
                }
            }
        }

        remaining[picked.0 as usize] = 0;
        choices.push(picked);
    }

    (Ballot { choices }, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A picker that always takes the last candidate offered, to make the
    // fallback path observable in tests.
    struct LastPicker;

    impl CollisionPicker for LastPicker {
        fn pick(&mut self, choices: &[CandidateId]) -> CandidateId {
            *choices.last().unwrap()
        }
    }

    fn cid(x: u32) -> CandidateId {
        CandidateId(x)
    }

    #[test]
    fn collision_predicate() {
        assert!(!RawAssignment::new(vec![1, 2, 0, 3]).has_rank_collision());
        assert!(RawAssignment::new(vec![1, 2, 2, 0]).has_rank_collision());
        // Several unranked candidates are not a collision.
        assert!(!RawAssignment::new(vec![0, 0, 1]).has_rank_collision());
    }

    #[test]
    fn clean_assignment_is_policy_invariant() {
        let raw = RawAssignment::new(vec![2, 1, 0, 3]);
        let all = vec![raw.clone()];
        let expected = vec![cid(1), cid(0), cid(3)];

        let (b1, w1) =
            normalize_assignment(&raw, TieBreakPolicy::Randomized, &all, &mut HashPicker::new(7));
        let (b2, w2) = normalize_assignment(
            &raw,
            TieBreakPolicy::AlignWithVoter(0),
            &all,
            &mut HashPicker::new(99),
        );
        assert_eq!(b1.choices, expected);
        assert_eq!(b2.choices, expected);
        assert!(w1.is_empty());
        assert!(w2.is_empty());
    }

    #[test]
    fn ballot_length_and_no_duplicates() {
        let raw = RawAssignment::new(vec![2, 2, 2, 0, 1]);
        let all = vec![raw.clone()];
        let (ballot, _) =
            normalize_assignment(&raw, TieBreakPolicy::Randomized, &all, &mut HashPicker::new(0));
        assert_eq!(ballot.choices.len(), raw.ranked_count());
        let mut sorted = ballot.choices.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ballot.choices.len());
        // Candidate 3 was unranked and must not appear.
        assert!(!ballot.choices.contains(&cid(3)));
        // Rank 1 is unambiguous and comes first.
        assert_eq!(ballot.choices[0], cid(4));
    }

    #[test]
    fn alignment_resolves_collisions() {
        // Voter 0 gives rank 1 to candidates 0 and 1; voter 1 prefers 1 over 0.
        let raw = RawAssignment::new(vec![1, 1, 2]);
        let reference = RawAssignment::new(vec![2, 1, 3]);
        let all = vec![raw.clone(), reference];
        let (ballot, warnings) = normalize_assignment(
            &raw,
            TieBreakPolicy::AlignWithVoter(1),
            &all,
            &mut LastPicker,
        );
        assert_eq!(ballot.choices, vec![cid(1), cid(0), cid(2)]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn alignment_fallback_warns() {
        // The reference voter only ranked candidate 2, which is not part of
        // the collision between 0 and 1.
        let raw = RawAssignment::new(vec![1, 1, 2]);
        let reference = RawAssignment::new(vec![0, 0, 1]);
        let all = vec![raw.clone(), reference];
        let (ballot, warnings) = normalize_assignment(
            &raw,
            TieBreakPolicy::AlignWithVoter(1),
            &all,
            &mut LastPicker,
        );
        // The picker decided the collision.
        assert_eq!(ballot.choices, vec![cid(1), cid(0), cid(2)]);
        assert_eq!(warnings.len(), 1);
        match &warnings[0] {
            NormalizeWarning::AmbiguousAlignment { rank, colliding } => {
                assert_eq!(*rank, 1);
                assert_eq!(colliding, &vec![cid(0), cid(1)]);
            }
        }
    }

    #[test]
    fn single_choice_pick_is_deterministic() {
        let mut picker = HashPicker::new(42);
        for _ in 0..3 {
            assert_eq!(picker.pick(&[cid(5)]), cid(5));
        }
    }

    #[test]
    fn hash_picker_is_reproducible() {
        let choices = [cid(0), cid(1), cid(2)];
        let a = HashPicker::new(17).pick(&choices);
        let b = HashPicker::new(17).pick(&choices);
        assert_eq!(a, b);
        assert!(choices.contains(&a));
    }
}
