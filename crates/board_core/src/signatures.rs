//! Append-only e-signatures on passed resolutions.
//!
//! No update or delete path exists here or in the store.

use crate::clock;
use crate::error::{Action, BoardError, BoardResult};
use crate::lifecycle::{rejected, scoped};
use crate::membership;
use crate::schema::{ResolutionStatus, Signature, SignatureRequest};
use crate::session::Caller;
use crate::store::ResolutionStore;
use crate::validation;
use tracing::{info, warn};
use uuid::Uuid;

pub fn sign<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
    request: SignatureRequest,
) -> BoardResult<Signature> {
    let checked = validation::signature(request)?;

    store.atomically(|store| {
        let resolution = scoped(store, caller, resolution_id)?;
        membership::require(store, &resolution, &caller.member_id)?;
        if resolution.status != ResolutionStatus::Passed {
            return Err(rejected(&resolution, Action::Sign));
        }

        let signature = Signature {
            id: Uuid::new_v4().to_string(),
            resolution_id: resolution.id,
            board_member_id: caller.member_id.clone(),
            signature_data: checked.signature_data,
            signature_type: checked.signature_type,
            typed_name: checked.typed_name,
            ip_address: checked.ip_address,
            user_agent: checked.user_agent,
            signed_at: clock::timestamp()?,
        };

        if !store.insert_signature_if_absent(&signature)? {
            warn!(
                resolution_id = %signature.resolution_id,
                member_id = %signature.board_member_id,
                "duplicate signature rejected"
            );
            return Err(BoardError::Conflict {
                message: "board member has already signed this resolution".to_string(),
            });
        }

        info!(
            resolution_id = %signature.resolution_id,
            member_id = %signature.board_member_id,
            method = %signature.signature_type,
            ip_address = signature.ip_address.as_deref().unwrap_or("-"),
            "resolution signed"
        );
        Ok(signature)
    })
}

/// Audit view of all signatures on a resolution, oldest first.
pub fn list<S: ResolutionStore>(
    store: &S,
    caller: &Caller,
    resolution_id: &str,
) -> BoardResult<Vec<Signature>> {
    let resolution = scoped(store, caller, resolution_id)?;
    store.signatures(&resolution.id)
}
