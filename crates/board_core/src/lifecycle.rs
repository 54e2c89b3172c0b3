//! Resolution lifecycle: `draft -> open -> passed | failed`.
//!
//! Every transition is a compare-and-swap on the stored status. A request that
//! loses a race observes zero affected rows and reports the status it found;
//! it never re-tallies or overwrites a terminal result.

use crate::clock;
use crate::error::{Action, BoardError, BoardResult};
use crate::schema::{
    NewResolution, Resolution, ResolutionDetail, ResolutionPatch, ResolutionStatus,
};
use crate::session::Caller;
use crate::store::{ResolutionFilter, ResolutionStore};
use crate::tally;
use crate::validation;
use tracing::{info, warn};
use uuid::Uuid;

/// Load a resolution visible to the caller. Foreign-tenant rows are `NotFound`.
pub fn scoped<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<Resolution> {
    store
        .resolution(resolution_id)?
        .filter(|resolution| resolution.organization_id == caller.organization_id)
        .ok_or_else(|| BoardError::not_found("resolution"))
}

pub(crate) fn rejected(resolution: &Resolution, requested: Action) -> BoardError {
    warn!(
        resolution_id = %resolution.id,
        status = %resolution.status,
        requested = %requested,
        "rejected lifecycle operation"
    );
    BoardError::transition(resolution.status, requested)
}

/// A guarded write matched no row: report whatever status is stored now.
fn lost_race<S: ResolutionStore>(store: &S, resolution_id: &str, requested: Action) -> BoardError {
    match store.resolution(resolution_id) {
        Ok(Some(current)) => rejected(&current, requested),
        Ok(None) => BoardError::not_found("resolution"),
        Err(err) => err,
    }
}

pub fn create<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    input: NewResolution,
) -> BoardResult<Resolution> {
    let title = validation::title(&input.title)?;
    let description = validation::description(input.description)?;

    let meeting = store
        .meeting(&input.meeting_id)?
        .filter(|meeting| meeting.organization_id == caller.organization_id)
        .ok_or_else(|| BoardError::not_found("meeting"))?;

    let now = clock::timestamp()?;
    let resolution = Resolution {
        id: Uuid::new_v4().to_string(),
        organization_id: meeting.organization_id,
        meeting_id: meeting.id,
        title,
        description,
        voting_type: input.voting_type,
        status: ResolutionStatus::Draft,
        created_by: caller.member_id.clone(),
        created_at: now.clone(),
        updated_at: now,
        closed_at: None,
    };
    store.insert_resolution(&resolution)?;

    info!(
        resolution_id = %resolution.id,
        meeting_id = %resolution.meeting_id,
        voting_type = %resolution.voting_type,
        "resolution drafted"
    );
    Ok(resolution)
}

pub fn update_metadata<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
    patch: ResolutionPatch,
) -> BoardResult<Resolution> {
    let title = patch.title.as_deref().map(validation::title).transpose()?;
    let description = match patch.description {
        Some(value) => Some(validation::description(Some(value))?),
        None => None,
    };

    store.atomically(|store| {
        let mut resolution = scoped(store, caller, resolution_id)?;
        if resolution.status.is_terminal() {
            return Err(rejected(&resolution, Action::UpdateMetadata));
        }
        if let Some(title) = title {
            resolution.title = title;
        }
        if let Some(description) = description {
            resolution.description = description;
        }
        if let Some(voting_type) = patch.voting_type {
            resolution.voting_type = voting_type;
        }
        resolution.updated_at = clock::timestamp()?;

        if !store.update_resolution_metadata(&resolution)? {
            return Err(lost_race(store, resolution_id, Action::UpdateMetadata));
        }
        info!(resolution_id = %resolution.id, "resolution metadata updated");
        Ok(resolution)
    })
}

pub fn delete<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<()> {
    store.atomically(|store| {
        let resolution = scoped(store, caller, resolution_id)?;
        if !store.delete_draft_resolution(&resolution.id)? {
            return Err(rejected(&resolution, Action::Delete));
        }
        info!(resolution_id = %resolution.id, "draft resolution deleted");
        Ok(())
    })
}

pub fn open<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<Resolution> {
    store.atomically(|store| {
        let mut resolution = scoped(store, caller, resolution_id)?;
        let now = clock::timestamp()?;
        let swapped = store.compare_and_swap_status(
            &resolution.id,
            ResolutionStatus::Draft,
            ResolutionStatus::Open,
            None,
            &now,
        )?;
        if !swapped {
            return Err(lost_race(store, resolution_id, Action::Open));
        }
        resolution.status = ResolutionStatus::Open;
        resolution.updated_at = now;
        info!(resolution_id = %resolution.id, "resolution opened for voting");
        Ok(resolution)
    })
}

/// Tally the current vote set and record the terminal status in one transaction.
pub fn close<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<ResolutionDetail> {
    store.atomically(|store| {
        let mut resolution = scoped(store, caller, resolution_id)?;
        if resolution.status != ResolutionStatus::Open {
            return Err(rejected(&resolution, Action::Close));
        }

        let votes = store.votes(&resolution.id)?;
        let summary = tally::summarize(&votes, resolution.voting_type);
        let next = summary.result.status();
        let now = clock::timestamp()?;

        let swapped = store.compare_and_swap_status(
            &resolution.id,
            ResolutionStatus::Open,
            next,
            Some(now.as_str()),
            &now,
        )?;
        if !swapped {
            return Err(lost_race(store, resolution_id, Action::Close));
        }

        resolution.status = next;
        resolution.closed_at = Some(now.clone());
        resolution.updated_at = now;
        info!(
            resolution_id = %resolution.id,
            status = %next,
            approve = summary.approve,
            reject = summary.reject,
            abstain = summary.abstain,
            "resolution closed"
        );
        Ok(ResolutionDetail {
            resolution,
            summary,
        })
    })
}

/// Resolution with a preview of the tally over its current votes.
pub fn get<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<ResolutionDetail> {
    let resolution = scoped(store, caller, resolution_id)?;
    let votes = store.votes(&resolution.id)?;
    let summary = tally::summarize(&votes, resolution.voting_type);
    Ok(ResolutionDetail {
        resolution,
        summary,
    })
}

pub fn list<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    meeting_id: Option<&str>,
    status: Option<ResolutionStatus>,
) -> BoardResult<Vec<Resolution>> {
    store.list_resolutions(&ResolutionFilter {
        organization_id: Some(caller.organization_id.clone()),
        meeting_id: meeting_id.map(str::to_string),
        status,
    })
}
