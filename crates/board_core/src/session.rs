use crate::error::{BoardError, BoardResult};
use crate::store::ResolutionStore;

/// Authenticated identity and organization scope of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub member_id: String,
    pub organization_id: String,
}

impl Caller {
    /// Resolve the caller from a presented member identity.
    ///
    /// Missing identities and unknown or inactive members are all `Unauthorized`.
    pub fn authenticate<S: ResolutionStore>(
        store: &S,
        member_id: Option<&str>,
    ) -> BoardResult<Self> {
        let member_id = member_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(BoardError::Unauthorized)?;
        match store.board_member(member_id)? {
            Some(member) if member.active => Ok(Caller {
                member_id: member.id,
                organization_id: member.organization_id,
            }),
            _ => {
                tracing::warn!(member_id, "rejected unknown or inactive caller");
                Err(BoardError::Unauthorized)
            }
        }
    }
}
