use crate::error::BoardResult;
use crate::schema::{
    BoardMember, Meeting, Organization, Resolution, ResolutionStatus, Signature, SignatureMethod,
    Vote, VoteChoice, VotingType,
};
use crate::store::{ResolutionFilter, ResolutionStore};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};
use std::path::Path;
use std::time::Duration;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path, busy_timeout: Duration) -> BoardResult<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> BoardResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> BoardResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn upsert_organization(&self, organization: &Organization) -> BoardResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO organizations (id, name) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET name=excluded.name
            "#,
            params![organization.id, organization.name],
        )?;
        Ok(())
    }

    pub fn upsert_meeting(&self, meeting: &Meeting) -> BoardResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO meetings (id, organization_id, title, scheduled_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
              organization_id=excluded.organization_id,
              title=excluded.title,
              scheduled_at=excluded.scheduled_at
            "#,
            params![
                meeting.id,
                meeting.organization_id,
                meeting.title,
                meeting.scheduled_at
            ],
        )?;
        Ok(())
    }

    pub fn upsert_board_member(&self, member: &BoardMember) -> BoardResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO board_members (id, organization_id, name, email, role, active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
              organization_id=excluded.organization_id,
              name=excluded.name,
              email=excluded.email,
              role=excluded.role,
              active=excluded.active
            "#,
            params![
                member.id,
                member.organization_id,
                member.name,
                member.email,
                member.role,
                member.active
            ],
        )?;
        Ok(())
    }
}

fn init(conn: &Connection) -> BoardResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS meetings (
          id TEXT PRIMARY KEY,
          organization_id TEXT NOT NULL REFERENCES organizations(id),
          title TEXT NOT NULL,
          scheduled_at TEXT
        );

        CREATE TABLE IF NOT EXISTS board_members (
          id TEXT PRIMARY KEY,
          organization_id TEXT NOT NULL REFERENCES organizations(id),
          name TEXT NOT NULL,
          email TEXT,
          role TEXT,
          active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS resolutions (
          id TEXT PRIMARY KEY,
          organization_id TEXT NOT NULL REFERENCES organizations(id),
          meeting_id TEXT NOT NULL REFERENCES meetings(id),
          title TEXT NOT NULL,
          description TEXT,
          voting_type TEXT NOT NULL
            CHECK (voting_type IN ('simple_majority', 'two_thirds', 'unanimous')),
          status TEXT NOT NULL DEFAULT 'draft'
            CHECK (status IN ('draft', 'open', 'passed', 'failed')),
          created_by TEXT NOT NULL,
          created_at TEXT NOT NULL,
          updated_at TEXT NOT NULL,
          closed_at TEXT,
          CHECK ((status IN ('passed', 'failed')) = (closed_at IS NOT NULL))
        );

        CREATE INDEX IF NOT EXISTS idx_resolutions_org ON resolutions(organization_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_resolutions_meeting ON resolutions(meeting_id);

        CREATE TABLE IF NOT EXISTS votes (
          resolution_id TEXT NOT NULL REFERENCES resolutions(id) ON DELETE CASCADE,
          board_member_id TEXT NOT NULL REFERENCES board_members(id),
          vote TEXT NOT NULL CHECK (vote IN ('approve', 'reject', 'abstain')),
          comment TEXT,
          voted_at TEXT NOT NULL,
          PRIMARY KEY (resolution_id, board_member_id)
        );

        CREATE TABLE IF NOT EXISTS signatures (
          id TEXT PRIMARY KEY,
          resolution_id TEXT NOT NULL REFERENCES resolutions(id),
          board_member_id TEXT NOT NULL REFERENCES board_members(id),
          signature_data TEXT NOT NULL,
          signature_type TEXT NOT NULL CHECK (signature_type IN ('drawn', 'typed', 'uploaded')),
          typed_name TEXT,
          ip_address TEXT,
          user_agent TEXT,
          signed_at TEXT NOT NULL,
          UNIQUE (resolution_id, board_member_id)
        );
        "#,
    )?;
    Ok(())
}

const RESOLUTION_COLUMNS: &str = "id, organization_id, meeting_id, title, description, \
     voting_type, status, created_by, created_at, updated_at, closed_at";

fn resolution_from_row(row: &Row<'_>) -> rusqlite::Result<Resolution> {
    Ok(Resolution {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        meeting_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        voting_type: row.get(5)?,
        status: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        closed_at: row.get(10)?,
    })
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    Ok(Vote {
        resolution_id: row.get(0)?,
        board_member_id: row.get(1)?,
        vote: row.get(2)?,
        comment: row.get(3)?,
        voted_at: row.get(4)?,
    })
}

fn signature_from_row(row: &Row<'_>) -> rusqlite::Result<Signature> {
    Ok(Signature {
        id: row.get(0)?,
        resolution_id: row.get(1)?,
        board_member_id: row.get(2)?,
        signature_data: row.get(3)?,
        signature_type: row.get(4)?,
        typed_name: row.get(5)?,
        ip_address: row.get(6)?,
        user_agent: row.get(7)?,
        signed_at: row.get(8)?,
    })
}

impl ResolutionStore for SqliteStore {
    fn atomically<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&Self) -> BoardResult<T>,
    {
        // IMMEDIATE takes the write lock up front, so a status read inside the
        // transaction cannot be invalidated by another writer before commit.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let value = f(self)?;
        tx.commit()?;
        Ok(value)
    }

    fn meeting(&self, meeting_id: &str) -> BoardResult<Option<Meeting>> {
        let meeting = self
            .conn
            .query_row(
                "SELECT id, organization_id, title, scheduled_at FROM meetings WHERE id = ?1",
                params![meeting_id],
                |row| {
                    Ok(Meeting {
                        id: row.get(0)?,
                        organization_id: row.get(1)?,
                        title: row.get(2)?,
                        scheduled_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(meeting)
    }

    fn board_member(&self, member_id: &str) -> BoardResult<Option<BoardMember>> {
        let member = self
            .conn
            .query_row(
                r#"
                SELECT id, organization_id, name, email, role, active
                FROM board_members WHERE id = ?1
                "#,
                params![member_id],
                |row| {
                    Ok(BoardMember {
                        id: row.get(0)?,
                        organization_id: row.get(1)?,
                        name: row.get(2)?,
                        email: row.get(3)?,
                        role: row.get(4)?,
                        active: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(member)
    }

    fn insert_resolution(&self, resolution: &Resolution) -> BoardResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO resolutions ({RESOLUTION_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            params![
                resolution.id,
                resolution.organization_id,
                resolution.meeting_id,
                resolution.title,
                resolution.description,
                resolution.voting_type,
                resolution.status,
                resolution.created_by,
                resolution.created_at,
                resolution.updated_at,
                resolution.closed_at
            ],
        )?;
        Ok(())
    }

    fn resolution(&self, resolution_id: &str) -> BoardResult<Option<Resolution>> {
        let resolution = self
            .conn
            .query_row(
                &format!("SELECT {RESOLUTION_COLUMNS} FROM resolutions WHERE id = ?1"),
                params![resolution_id],
                resolution_from_row,
            )
            .optional()?;
        Ok(resolution)
    }

    fn list_resolutions(&self, filter: &ResolutionFilter) -> BoardResult<Vec<Resolution>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {RESOLUTION_COLUMNS}
            FROM resolutions
            WHERE (?1 IS NULL OR organization_id = ?1)
              AND (?2 IS NULL OR meeting_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY created_at, id
            "#
        ))?;
        let rows = stmt.query_map(
            params![filter.organization_id, filter.meeting_id, filter.status],
            resolution_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn update_resolution_metadata(&self, resolution: &Resolution) -> BoardResult<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE resolutions
            SET title = ?2, description = ?3, voting_type = ?4, updated_at = ?5
            WHERE id = ?1 AND status IN ('draft', 'open')
            "#,
            params![
                resolution.id,
                resolution.title,
                resolution.description,
                resolution.voting_type,
                resolution.updated_at
            ],
        )?;
        Ok(changed == 1)
    }

    fn delete_draft_resolution(&self, resolution_id: &str) -> BoardResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM resolutions WHERE id = ?1 AND status = 'draft'",
            params![resolution_id],
        )?;
        Ok(changed == 1)
    }

    fn compare_and_swap_status(
        &self,
        resolution_id: &str,
        expected: ResolutionStatus,
        next: ResolutionStatus,
        closed_at: Option<&str>,
        updated_at: &str,
    ) -> BoardResult<bool> {
        let changed = self.conn.execute(
            r#"
            UPDATE resolutions
            SET status = ?3, closed_at = ?4, updated_at = ?5
            WHERE id = ?1 AND status = ?2
            "#,
            params![resolution_id, expected, next, closed_at, updated_at],
        )?;
        Ok(changed == 1)
    }

    fn upsert_vote(&self, vote: &Vote) -> BoardResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO votes (resolution_id, board_member_id, vote, comment, voted_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(resolution_id, board_member_id) DO UPDATE SET
              vote=excluded.vote,
              comment=excluded.comment,
              voted_at=excluded.voted_at
            "#,
            params![
                vote.resolution_id,
                vote.board_member_id,
                vote.vote,
                vote.comment,
                vote.voted_at
            ],
        )?;
        Ok(())
    }

    fn delete_vote(&self, resolution_id: &str, member_id: &str) -> BoardResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM votes WHERE resolution_id = ?1 AND board_member_id = ?2",
            params![resolution_id, member_id],
        )?;
        Ok(changed == 1)
    }

    fn votes(&self, resolution_id: &str) -> BoardResult<Vec<Vote>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT resolution_id, board_member_id, vote, comment, voted_at
            FROM votes
            WHERE resolution_id = ?1
            ORDER BY voted_at, board_member_id
            "#,
        )?;
        let rows = stmt.query_map(params![resolution_id], vote_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_signature_if_absent(&self, signature: &Signature) -> BoardResult<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO signatures (
              id, resolution_id, board_member_id, signature_data, signature_type,
              typed_name, ip_address, user_agent, signed_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(resolution_id, board_member_id) DO NOTHING
            "#,
            params![
                signature.id,
                signature.resolution_id,
                signature.board_member_id,
                signature.signature_data,
                signature.signature_type,
                signature.typed_name,
                signature.ip_address,
                signature.user_agent,
                signature.signed_at
            ],
        )?;
        Ok(changed == 1)
    }

    fn signatures(&self, resolution_id: &str) -> BoardResult<Vec<Signature>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, resolution_id, board_member_id, signature_data, signature_type,
                   typed_name, ip_address, user_agent, signed_at
            FROM signatures
            WHERE resolution_id = ?1
            ORDER BY signed_at, board_member_id
            "#,
        )?;
        let rows = stmt.query_map(params![resolution_id], signature_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

macro_rules! sql_text_enum {
    ($($name:ty),+ $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|err| FromSqlError::Other(Box::new(err)))
                }
            }
        )+
    };
}

sql_text_enum!(VotingType, ResolutionStatus, VoteChoice, SignatureMethod);

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_organization(&Organization {
                id: "org-1".to_string(),
                name: "Harbor Trust".to_string(),
            })
            .unwrap();
        store
            .upsert_meeting(&Meeting {
                id: "mtg-1".to_string(),
                organization_id: "org-1".to_string(),
                title: "Q3 board meeting".to_string(),
                scheduled_at: None,
            })
            .unwrap();
        store
            .upsert_board_member(&BoardMember {
                id: "m-1".to_string(),
                organization_id: "org-1".to_string(),
                name: "Ada".to_string(),
                email: None,
                role: Some("chair".to_string()),
                active: true,
            })
            .unwrap();
        store
    }

    fn draft(id: &str) -> Resolution {
        Resolution {
            id: id.to_string(),
            organization_id: "org-1".to_string(),
            meeting_id: "mtg-1".to_string(),
            title: "Approve budget".to_string(),
            description: None,
            voting_type: VotingType::TwoThirds,
            status: ResolutionStatus::Draft,
            created_by: "m-1".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            updated_at: "2026-01-01T00:00:00.000Z".to_string(),
            closed_at: None,
        }
    }

    #[test]
    fn enums_round_trip_through_text_columns() {
        let store = seeded();
        store.insert_resolution(&draft("res-1")).unwrap();
        let stored = store.resolution("res-1").unwrap().unwrap();
        assert_eq!(stored.voting_type, VotingType::TwoThirds);
        assert_eq!(stored.status, ResolutionStatus::Draft);

        let raw: String = store
            .connection()
            .query_row("SELECT voting_type FROM resolutions WHERE id = 'res-1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(raw, "two_thirds");
    }

    #[test]
    fn compare_and_swap_only_applies_to_expected_status() {
        let store = seeded();
        store.insert_resolution(&draft("res-1")).unwrap();
        let at = "2026-01-02T00:00:00.000Z";

        let swap = |expected, next, closed_at: Option<&'static str>| {
            store
                .compare_and_swap_status("res-1", expected, next, closed_at, at)
                .unwrap()
        };
        assert!(!swap(ResolutionStatus::Open, ResolutionStatus::Passed, Some(at)));
        assert!(swap(ResolutionStatus::Draft, ResolutionStatus::Open, None));
        assert_eq!(
            store.resolution("res-1").unwrap().unwrap().status,
            ResolutionStatus::Open
        );
    }

    #[test]
    fn closed_at_must_accompany_terminal_status() {
        let store = seeded();
        store.insert_resolution(&draft("res-1")).unwrap();
        let at = "2026-01-02T00:00:00.000Z";
        let result = store.compare_and_swap_status(
            "res-1",
            ResolutionStatus::Draft,
            ResolutionStatus::Failed,
            None,
            at,
        );
        assert!(result.is_err());
    }

    #[test]
    fn signature_insert_is_first_write_wins() {
        let store = seeded();
        store.insert_resolution(&draft("res-1")).unwrap();
        let mut signature = Signature {
            id: "sig-1".to_string(),
            resolution_id: "res-1".to_string(),
            board_member_id: "m-1".to_string(),
            signature_data: "Ada".to_string(),
            signature_type: SignatureMethod::Typed,
            typed_name: Some("Ada".to_string()),
            ip_address: None,
            user_agent: None,
            signed_at: "2026-01-02T00:00:00.000Z".to_string(),
        };
        assert!(store.insert_signature_if_absent(&signature).unwrap());

        signature.id = "sig-2".to_string();
        signature.signature_data = "someone else".to_string();
        assert!(!store.insert_signature_if_absent(&signature).unwrap());

        let stored = store.signatures("res-1").unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "sig-1");
        assert_eq!(stored[0].signature_data, "Ada");
    }

    #[test]
    fn failed_transaction_rolls_back() {
        let store = seeded();
        let result: BoardResult<()> = store.atomically(|store| {
            store.insert_resolution(&draft("res-1"))?;
            Err(crate::error::BoardError::Unauthorized)
        });
        assert!(result.is_err());
        assert!(store.resolution("res-1").unwrap().is_none());
    }
}
