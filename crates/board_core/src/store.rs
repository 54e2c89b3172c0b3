use crate::error::BoardResult;
use crate::schema::{BoardMember, Meeting, Resolution, ResolutionStatus, Signature, Vote};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionFilter {
    pub organization_id: Option<String>,
    pub meeting_id: Option<String>,
    pub status: Option<ResolutionStatus>,
}

/// Persistence seam for the resolution core.
///
/// Every write is a single atomic statement. Callers combine a status read with
/// a guarded write inside [`ResolutionStore::atomically`], so no operation
/// depends on in-process locking.
pub trait ResolutionStore {
    /// Run `f` as one transaction: committed on `Ok`, rolled back on `Err`.
    /// Not reentrant.
    fn atomically<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&Self) -> BoardResult<T>;

    fn meeting(&self, meeting_id: &str) -> BoardResult<Option<Meeting>>;
    fn board_member(&self, member_id: &str) -> BoardResult<Option<BoardMember>>;

    fn insert_resolution(&self, resolution: &Resolution) -> BoardResult<()>;
    fn resolution(&self, resolution_id: &str) -> BoardResult<Option<Resolution>>;
    fn list_resolutions(&self, filter: &ResolutionFilter) -> BoardResult<Vec<Resolution>>;

    /// Rewrites title, description and voting type unless the stored row is
    /// terminal. Returns whether a row changed.
    fn update_resolution_metadata(&self, resolution: &Resolution) -> BoardResult<bool>;

    /// Deletes the resolution only if it is still a draft.
    fn delete_draft_resolution(&self, resolution_id: &str) -> BoardResult<bool>;

    /// Moves `expected` to `next` in one statement. `false` means the stored
    /// status was not `expected` and nothing was written.
    fn compare_and_swap_status(
        &self,
        resolution_id: &str,
        expected: ResolutionStatus,
        next: ResolutionStatus,
        closed_at: Option<&str>,
        updated_at: &str,
    ) -> BoardResult<bool>;

    /// Last write wins per (resolution, member).
    fn upsert_vote(&self, vote: &Vote) -> BoardResult<()>;
    fn delete_vote(&self, resolution_id: &str, member_id: &str) -> BoardResult<bool>;
    fn votes(&self, resolution_id: &str) -> BoardResult<Vec<Vote>>;

    /// `false` means the member already signed; the existing row is untouched.
    fn insert_signature_if_absent(&self, signature: &Signature) -> BoardResult<bool>;
    fn signatures(&self, resolution_id: &str) -> BoardResult<Vec<Signature>>;
}
