//! Vote tallying.
//!
//! Pure functions only: the same vote set and voting type always give the same
//! outcome. Used both for the authoritative close and for read-time previews.

use crate::schema::{Outcome, Vote, VoteChoice, VoteSummary, VotingType};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCounts {
    pub approve: u32,
    pub reject: u32,
    pub abstain: u32,
}

impl VoteCounts {
    pub fn from_choices<I>(choices: I) -> Self
    where
        I: IntoIterator<Item = VoteChoice>,
    {
        let mut counts = VoteCounts::default();
        for choice in choices {
            match choice {
                VoteChoice::Approve => counts.approve += 1,
                VoteChoice::Reject => counts.reject += 1,
                VoteChoice::Abstain => counts.abstain += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.approve + self.reject + self.abstain
    }
}

/// Decide a resolution from its vote counts.
///
/// An empty vote set fails under every voting type.
pub fn decide(counts: VoteCounts, voting_type: VotingType) -> Outcome {
    let total = u64::from(counts.total());
    let approve = u64::from(counts.approve);
    if total == 0 {
        return Outcome::Failed;
    }

    let passed = match voting_type {
        // Abstentions are ignored; a tie fails.
        VotingType::SimpleMajority => counts.approve > counts.reject,
        // Abstentions stay in the denominator. Exact rational form of approve/total >= 2/3.
        VotingType::TwoThirds => 3 * approve >= 2 * total,
        VotingType::Unanimous => counts.reject == 0 && counts.approve > 0,
    };

    if passed {
        Outcome::Passed
    } else {
        Outcome::Failed
    }
}

pub fn tally(votes: &[Vote], voting_type: VotingType) -> Outcome {
    decide(
        VoteCounts::from_choices(votes.iter().map(|vote| vote.vote)),
        voting_type,
    )
}

pub fn summarize(votes: &[Vote], voting_type: VotingType) -> VoteSummary {
    let counts = VoteCounts::from_choices(votes.iter().map(|vote| vote.vote));
    VoteSummary {
        approve: counts.approve,
        reject: counts.reject,
        abstain: counts.abstain,
        total: counts.total(),
        result: decide(counts, voting_type),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn counts(approve: u32, reject: u32, abstain: u32) -> VoteCounts {
        VoteCounts {
            approve,
            reject,
            abstain,
        }
    }

    #[test]
    fn simple_majority_ignores_abstentions() {
        assert_eq!(
            decide(counts(3, 2, 1), VotingType::SimpleMajority),
            Outcome::Passed
        );
        assert_eq!(
            decide(counts(1, 0, 10), VotingType::SimpleMajority),
            Outcome::Passed
        );
    }

    #[test]
    fn simple_majority_tie_fails() {
        assert_eq!(
            decide(counts(2, 2, 0), VotingType::SimpleMajority),
            Outcome::Failed
        );
    }

    #[test]
    fn two_thirds_boundaries() {
        assert_eq!(decide(counts(4, 2, 0), VotingType::TwoThirds), Outcome::Passed);
        assert_eq!(decide(counts(2, 1, 0), VotingType::TwoThirds), Outcome::Passed);
        assert_eq!(decide(counts(2, 2, 0), VotingType::TwoThirds), Outcome::Failed);
        assert_eq!(decide(counts(2, 0, 1), VotingType::TwoThirds), Outcome::Passed);
        assert_eq!(decide(counts(1, 0, 1), VotingType::TwoThirds), Outcome::Failed);
    }

    #[test]
    fn two_thirds_counts_abstentions_in_denominator() {
        assert_eq!(decide(counts(6, 0, 0), VotingType::TwoThirds), Outcome::Passed);
        assert_eq!(decide(counts(6, 0, 4), VotingType::TwoThirds), Outcome::Failed);
    }

    #[test]
    fn unanimous_cases() {
        assert_eq!(decide(counts(5, 0, 2), VotingType::Unanimous), Outcome::Passed);
        assert_eq!(decide(counts(4, 1, 0), VotingType::Unanimous), Outcome::Failed);
        assert_eq!(decide(counts(0, 0, 3), VotingType::Unanimous), Outcome::Failed);
    }

    #[test]
    fn no_votes_fails_every_type() {
        for voting_type in VotingType::ALL {
            assert_eq!(decide(counts(0, 0, 0), *voting_type), Outcome::Failed);
        }
    }

    #[test]
    fn summarize_reports_counts_and_result() {
        let votes: Vec<Vote> = [
            VoteChoice::Approve,
            VoteChoice::Approve,
            VoteChoice::Reject,
            VoteChoice::Abstain,
        ]
        .into_iter()
        .enumerate()
        .map(|(index, vote)| Vote {
            resolution_id: "res-1".to_string(),
            board_member_id: format!("member-{index}"),
            vote,
            comment: None,
            voted_at: "2026-01-01T00:00:00.000Z".to_string(),
        })
        .collect();

        let summary = summarize(&votes, VotingType::SimpleMajority);
        assert_eq!(summary.approve, 2);
        assert_eq!(summary.reject, 1);
        assert_eq!(summary.abstain, 1);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.result, Outcome::Passed);
        assert_eq!(tally(&votes, VotingType::TwoThirds), Outcome::Failed);
    }

    proptest! {
        #[test]
        fn simple_majority_matches_comparison(a in 0u32..500, r in 0u32..500, b in 0u32..500) {
            let outcome = decide(counts(a, r, b), VotingType::SimpleMajority);
            prop_assert_eq!(outcome == Outcome::Passed, a > r);
        }

        #[test]
        fn two_thirds_matches_exact_ratio(a in 0u32..500, r in 0u32..500, b in 0u32..500) {
            let total = a + r + b;
            let outcome = decide(counts(a, r, b), VotingType::TwoThirds);
            let expected = total > 0 && u64::from(a) * 3 >= u64::from(total) * 2;
            prop_assert_eq!(outcome == Outcome::Passed, expected);
        }

        #[test]
        fn unanimous_fails_on_any_rejection(a in 0u32..500, r in 1u32..500, b in 0u32..500) {
            prop_assert_eq!(decide(counts(a, r, b), VotingType::Unanimous), Outcome::Failed);
        }

        #[test]
        fn abstaining_never_turns_a_failure_into_a_pass(
            a in 0u32..200,
            r in 0u32..200,
            b in 0u32..200,
            extra in 1u32..50,
        ) {
            for voting_type in VotingType::ALL {
                if decide(counts(a, r, b), *voting_type) == Outcome::Failed {
                    prop_assert_eq!(
                        decide(counts(a, r, b + extra), *voting_type),
                        Outcome::Failed
                    );
                }
            }
        }
    }
}
