//! Vote ledger: one live vote per (resolution, member) while the resolution is open.

use crate::clock;
use crate::error::{Action, BoardResult};
use crate::lifecycle::{rejected, scoped};
use crate::membership;
use crate::schema::{ResolutionStatus, Vote, VoteChoice, VoteListing};
use crate::session::Caller;
use crate::store::ResolutionStore;
use crate::tally;
use crate::validation;
use tracing::info;

/// Cast or change the caller's vote. The previous value and timestamp are overwritten.
pub fn cast<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
    choice: VoteChoice,
    comment: Option<String>,
) -> BoardResult<Vote> {
    let comment = validation::comment(comment)?;

    store.atomically(|store| {
        let resolution = scoped(store, caller, resolution_id)?;
        membership::require(store, &resolution, &caller.member_id)?;
        if resolution.status != ResolutionStatus::Open {
            return Err(rejected(&resolution, Action::CastVote));
        }

        let vote = Vote {
            resolution_id: resolution.id,
            board_member_id: caller.member_id.clone(),
            vote: choice,
            comment,
            voted_at: clock::timestamp()?,
        };
        store.upsert_vote(&vote)?;
        info!(
            resolution_id = %vote.resolution_id,
            member_id = %vote.board_member_id,
            vote = %vote.vote,
            "vote recorded"
        );
        Ok(vote)
    })
}

/// Withdraw the caller's vote. Returns whether a vote existed; absent votes are not an error.
pub fn retract<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<bool> {
    store.atomically(|store| {
        let resolution = scoped(store, caller, resolution_id)?;
        membership::require(store, &resolution, &caller.member_id)?;
        if resolution.status != ResolutionStatus::Open {
            return Err(rejected(&resolution, Action::RetractVote));
        }

        let removed = store.delete_vote(&resolution.id, &caller.member_id)?;
        if removed {
            info!(
                resolution_id = %resolution.id,
                member_id = %caller.member_id,
                "vote retracted"
            );
        }
        Ok(removed)
    })
}

/// Votes with a computed summary. Readable in every lifecycle state.
pub fn list<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<VoteListing> {
    let resolution = scoped(store, caller, resolution_id)?;
    let votes = store.votes(&resolution.id)?;
    let summary = tally::summarize(&votes, resolution.voting_type);
    Ok(VoteListing { votes, summary })
}
