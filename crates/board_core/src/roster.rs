//! Directory import: organizations, meetings and board members from a YAML roster.

use crate::db::SqliteStore;
use crate::schema::{BoardMember, Meeting, Organization};
use crate::store::ResolutionStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Roster {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    #[serde(default)]
    pub members: Vec<BoardMember>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub organizations: usize,
    pub meetings: usize,
    pub members: usize,
}

impl Roster {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading roster {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing roster {}", path.display()))
    }
}

/// Upsert the whole roster in one transaction; a bad row leaves the store untouched.
pub fn import(store: &SqliteStore, roster: &Roster) -> Result<ImportCounts> {
    store.atomically(|store| {
        for organization in &roster.organizations {
            store.upsert_organization(organization)?;
        }
        for meeting in &roster.meetings {
            store.upsert_meeting(meeting)?;
        }
        for member in &roster.members {
            store.upsert_board_member(member)?;
        }
        Ok(())
    })?;

    tracing::info!(
        organizations = roster.organizations.len(),
        meetings = roster.meetings.len(),
        members = roster.members.len(),
        "roster imported"
    );
    Ok(ImportCounts {
        organizations: roster.organizations.len(),
        meetings: roster.meetings.len(),
        members: roster.members.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = r#"
organizations:
  - id: org-1
    name: Harbor Trust
meetings:
  - id: mtg-1
    organization_id: org-1
    title: Annual meeting
    scheduled_at: "2026-03-01T17:00:00Z"
members:
  - id: m-1
    organization_id: org-1
    name: Ada Lovelace
    email: ada@example.org
    role: chair
  - id: m-2
    organization_id: org-1
    name: Charles Babbage
    email: null
    role: null
    active: false
"#;

    #[test]
    fn imports_directory_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        let roster = Roster::from_yaml(ROSTER).unwrap();
        let counts = import(&store, &roster).unwrap();
        assert_eq!(
            counts,
            ImportCounts {
                organizations: 1,
                meetings: 1,
                members: 2
            }
        );

        let ada = store.board_member("m-1").unwrap().unwrap();
        assert!(ada.active);
        assert_eq!(ada.role.as_deref(), Some("chair"));
        assert!(!store.board_member("m-2").unwrap().unwrap().active);
        assert_eq!(
            store.meeting("mtg-1").unwrap().unwrap().organization_id,
            "org-1"
        );
    }

    #[test]
    fn dangling_meeting_rolls_back_import() {
        let store = SqliteStore::open_in_memory().unwrap();
        let roster = Roster::from_yaml(
            r#"
organizations:
  - id: org-1
    name: Harbor Trust
meetings:
  - id: mtg-9
    organization_id: org-missing
    title: Orphan
    scheduled_at: null
"#,
        )
        .unwrap();
        assert!(import(&store, &roster).is_err());
        assert!(store.meeting("mtg-9").unwrap().is_none());
        let organizations: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM organizations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(organizations, 0);
    }
}
