use crate::error::{BoardError, BoardResult};
use crate::schema::Resolution;
use crate::store::ResolutionStore;

/// True iff `member_id` is an active board member of the resolution's organization.
pub fn validate<S: ResolutionStore>(
    store: &S,
    resolution: &Resolution,
    member_id: &str,
) -> BoardResult<bool> {
    Ok(store.board_member(member_id)?.is_some_and(|member| {
        member.active && member.organization_id == resolution.organization_id
    }))
}

/// Same check as [`validate`], reported as `NotFound` so other tenants' members stay invisible.
pub fn require<S: ResolutionStore>(
    store: &S,
    resolution: &Resolution,
    member_id: &str,
) -> BoardResult<()> {
    if validate(store, resolution, member_id)? {
        Ok(())
    } else {
        Err(BoardError::not_found("board member"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::roster::{self, Roster};
    use crate::schema::{ResolutionStatus, VotingType};

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        let roster = Roster::from_yaml(
            r#"
organizations:
  - { id: org-1, name: Harbor Trust }
  - { id: org-2, name: Lakeside Co-op }
meetings: []
members:
  - { id: m-1, organization_id: org-1, name: Ada }
  - { id: m-off, organization_id: org-1, name: Charles, active: false }
  - { id: x-1, organization_id: org-2, name: Outsider }
"#,
        )
        .unwrap();
        roster::import(&store, &roster).unwrap();
        store
    }

    fn resolution() -> Resolution {
        Resolution {
            id: "res-1".to_string(),
            organization_id: "org-1".to_string(),
            meeting_id: "mtg-1".to_string(),
            title: "Adopt budget".to_string(),
            description: None,
            voting_type: VotingType::SimpleMajority,
            status: ResolutionStatus::Open,
            created_by: "m-1".to_string(),
            created_at: "2026-01-05T09:00:00.000Z".to_string(),
            updated_at: "2026-01-05T09:00:00.000Z".to_string(),
            closed_at: None,
        }
    }

    #[test]
    fn only_active_members_of_the_organization_are_valid() {
        let store = store();
        let resolution = resolution();

        assert!(validate(&store, &resolution, "m-1").unwrap());
        assert!(!validate(&store, &resolution, "x-1").unwrap());
        assert!(!validate(&store, &resolution, "m-off").unwrap());
        assert!(!validate(&store, &resolution, "nobody").unwrap());
    }

    #[test]
    fn require_reports_invalid_members_as_not_found() {
        let store = store();
        let resolution = resolution();

        assert!(require(&store, &resolution, "m-1").is_ok());
        for member_id in ["x-1", "m-off", "nobody"] {
            assert!(matches!(
                require(&store, &resolution, member_id),
                Err(BoardError::NotFound {
                    entity: "board member"
                })
            ));
        }
    }
}
