use super::{
    EmailStore, LockCondition, NewEmail, SectionLibrary, StoreResult, TemplateStore,
    UserDirectory,
};
use common::model::content::ContentDocument;
use common::model::email::{EmailRecord, EmailSummary, LockState};
use common::model::section_template::SectionTemplate;
use common::model::template::{Template, TemplateSummary};
use common::model::user::Role;
use log::debug;
use rusqlite::types::ToSql;
use rusqlite::{named_params, params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id       INTEGER PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    role     TEXT NOT NULL DEFAULT 'editor'
);

CREATE TABLE IF NOT EXISTS templates (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL UNIQUE,
    html_content TEXT NOT NULL,
    user_id      INTEGER,
    created_at   TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS section_templates (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT NOT NULL,
    type_key     TEXT NOT NULL,
    html_content TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS emails_editable (
    uuid              TEXT PRIMARY KEY,
    template_id       INTEGER NOT NULL REFERENCES templates(id),
    content_json      TEXT NOT NULL,
    user_id           INTEGER NOT NULL,
    last_modified_by  INTEGER,
    is_locked         INTEGER NOT NULL DEFAULT 0,
    locked_by_user_id INTEGER,
    created_at        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at        TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// File-backed store. A fresh connection is opened per operation, so one
/// store value can be shared by every worker and blocking task.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and applies the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let store = SqliteStore {
            path: path.as_ref().to_path_buf(),
        };
        store.connect()?.execute_batch(SCHEMA)?;
        debug!("SQLite schema ready at {}", store.path.display());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> StoreResult<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    #[cfg(test)]
    pub fn insert_user(&self, id: i64, username: &str, role: &str) -> StoreResult<()> {
        self.connect()?.execute(
            "INSERT INTO users (id, username, role) VALUES (?1, ?2, ?3)",
            params![id, username, role],
        )?;
        Ok(())
    }

    #[cfg(test)]
    pub fn insert_section_template(
        &self,
        name: &str,
        type_key: &str,
        html_content: &str,
    ) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO section_templates (name, type_key, html_content) VALUES (?1, ?2, ?3)",
            params![name, type_key, html_content],
        )?;
        Ok(conn.last_insert_rowid())
    }

    #[cfg(test)]
    pub fn raw_content(&self, uuid: &str) -> StoreResult<serde_json::Value> {
        let text: String = self.connect()?.query_row(
            "SELECT content_json FROM emails_editable WHERE uuid = ?1",
            params![uuid],
            |row| row.get(0),
        )?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Deletes a template even while emails still reference it.
    #[cfg(test)]
    pub fn remove_template_unchecked(&self, template_id: i64) -> StoreResult<()> {
        let conn = self.connect()?;
        conn.execute_batch("PRAGMA foreign_keys = OFF")?;
        conn.execute("DELETE FROM templates WHERE id = ?1", params![template_id])?;
        Ok(())
    }

    #[cfg(test)]
    pub fn insert_raw_email(
        &self,
        uuid: &str,
        template_id: i64,
        content_json: &str,
        user_id: i64,
    ) -> StoreResult<()> {
        self.connect()?.execute(
            "INSERT INTO emails_editable (uuid, template_id, content_json, user_id) VALUES (?1, ?2, ?3, ?4)",
            params![uuid, template_id, content_json, user_id],
        )?;
        Ok(())
    }
}

impl LockCondition {
    fn clause(&self) -> &'static str {
        match self {
            LockCondition::FreeOrHeldBy(_) => {
                "(is_locked = 0 OR locked_by_user_id IS NULL OR locked_by_user_id = :holder)"
            }
            LockCondition::HeldBy(_) => "(is_locked = 1 AND locked_by_user_id = :holder)",
            LockCondition::Any => "1 = 1",
        }
    }

    fn holder(&self) -> Option<i64> {
        match self {
            LockCondition::FreeOrHeldBy(user_id) | LockCondition::HeldBy(user_id) => Some(*user_id),
            LockCondition::Any => None,
        }
    }
}

/// Appends the condition's clause to `sql`, which must end in `... AND`, and
/// reports whether exactly one row changed.
fn execute_gated(
    conn: &Connection,
    sql: &str,
    condition: LockCondition,
    named: &[(&str, &dyn ToSql)],
) -> StoreResult<bool> {
    let statement = format!("{} {}", sql, condition.clause());
    let holder = condition.holder();
    let mut bound: Vec<(&str, &dyn ToSql)> = named.to_vec();
    if let Some(holder) = holder.as_ref() {
        bound.push((":holder", holder as &dyn ToSql));
    }
    let changed = conn.execute(&statement, bound.as_slice())?;
    Ok(changed == 1)
}

fn count_rows(conn: &Connection, table: &str) -> StoreResult<i64> {
    let total = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(total)
}

const EMAIL_SUMMARY_SELECT: &str = "SELECT e.uuid, e.template_id, t.name, e.created_at, e.updated_at,
        uc.username, um.username, e.is_locked, e.locked_by_user_id, ul.username
     FROM emails_editable e
     LEFT JOIN templates t ON e.template_id = t.id
     LEFT JOIN users uc ON e.user_id = uc.id
     LEFT JOIN users um ON e.last_modified_by = um.id
     LEFT JOIN users ul ON e.locked_by_user_id = ul.id
     ORDER BY e.updated_at DESC, e.rowid DESC";

impl SqliteStore {
    fn query_summaries(&self, limit: Option<usize>) -> StoreResult<Vec<EmailSummary>> {
        let conn = self.connect()?;
        // SQLite reads a negative LIMIT as "no limit".
        let limit = limit.map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));
        let mut stmt = conn.prepare(&format!("{} LIMIT ?1", EMAIL_SUMMARY_SELECT))?;
        let rows = stmt.query_map(params![limit], |row| {
            let lock = LockState::from_columns(row.get(7)?, row.get(8)?);
            Ok(EmailSummary {
                uuid: row.get(0)?,
                template_id: row.get(1)?,
                template_name: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
                creator_username: row.get(5)?,
                last_modifier_username: row.get(6)?,
                is_locked: lock != LockState::Unlocked,
                locked_by_user_id: lock.holder(),
                locked_by_username: lock.holder().and(row.get(9)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl TemplateStore for SqliteStore {
    fn get_template_html(&self, template_id: i64) -> StoreResult<Option<String>> {
        let html = self
            .connect()?
            .query_row(
                "SELECT html_content FROM templates WHERE id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(html)
    }

    fn get_template(&self, template_id: i64) -> StoreResult<Option<Template>> {
        let template = self
            .connect()?
            .query_row(
                "SELECT id, name, html_content, created_at FROM templates WHERE id = ?1",
                params![template_id],
                |row| {
                    Ok(Template {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        html_content: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(template)
    }

    fn list_templates(&self) -> StoreResult<Vec<TemplateSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM templates ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TemplateSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count_templates(&self) -> StoreResult<i64> {
        count_rows(&self.connect()?, "templates")
    }

    fn template_name_taken(&self, name: &str, except_id: Option<i64>) -> StoreResult<bool> {
        let found: Option<i64> = self
            .connect()?
            .query_row(
                "SELECT id FROM templates WHERE name = ?1 AND (?2 IS NULL OR id != ?2)",
                params![name, except_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_template(&self, name: &str, html_content: &str, user_id: i64) -> StoreResult<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO templates (name, html_content, user_id) VALUES (?1, ?2, ?3)",
            params![name, html_content, user_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_template(
        &self,
        template_id: i64,
        name: &str,
        html_content: &str,
    ) -> StoreResult<bool> {
        let changed = self.connect()?.execute(
            "UPDATE templates SET name = ?1, html_content = ?2 WHERE id = ?3",
            params![name, html_content, template_id],
        )?;
        Ok(changed == 1)
    }
}

impl EmailStore for SqliteStore {
    fn list_emails(&self) -> StoreResult<Vec<EmailSummary>> {
        self.query_summaries(None)
    }

    fn list_recent_emails(&self, limit: usize) -> StoreResult<Vec<EmailSummary>> {
        self.query_summaries(Some(limit))
    }

    fn count_emails(&self) -> StoreResult<i64> {
        count_rows(&self.connect()?, "emails_editable")
    }

    fn get_email(&self, uuid: &str) -> StoreResult<Option<EmailRecord>> {
        let row = self
            .connect()?
            .query_row(
                "SELECT e.uuid, e.template_id, COALESCE(t.name, ''), e.content_json,
                        e.is_locked, e.locked_by_user_id
                 FROM emails_editable e
                 LEFT JOIN templates t ON e.template_id = t.id
                 WHERE e.uuid = ?1",
                params![uuid],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        LockState::from_columns(row.get(4)?, row.get(5)?),
                    ))
                },
            )
            .optional()?;

        match row {
            Some((uuid, template_id, template_name, content_json, lock)) => Ok(Some(EmailRecord {
                uuid,
                template_id,
                template_name,
                content: serde_json::from_str(&content_json)?,
                lock,
            })),
            None => Ok(None),
        }
    }

    fn get_lock_state(&self, uuid: &str) -> StoreResult<Option<LockState>> {
        let state = self
            .connect()?
            .query_row(
                "SELECT is_locked, locked_by_user_id FROM emails_editable WHERE uuid = ?1",
                params![uuid],
                |row| Ok(LockState::from_columns(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(state)
    }

    fn insert_email(&self, email: &NewEmail<'_>) -> StoreResult<()> {
        let content_json = serde_json::to_string(email.content)?;
        self.connect()?.execute(
            "INSERT INTO emails_editable (uuid, template_id, content_json, user_id, is_locked, locked_by_user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                email.uuid,
                email.template_id,
                content_json,
                email.user_id,
                email.lock != LockState::Unlocked,
                email.lock.holder(),
            ],
        )?;
        Ok(())
    }

    fn update_content(
        &self,
        uuid: &str,
        content: &ContentDocument,
        user_id: i64,
        condition: LockCondition,
    ) -> StoreResult<bool> {
        let content_json = serde_json::to_string(content)?;
        execute_gated(
            &self.connect()?,
            "UPDATE emails_editable
             SET content_json = :content, last_modified_by = :user, updated_at = CURRENT_TIMESTAMP
             WHERE uuid = :uuid AND",
            condition,
            named_params! {
                ":content": content_json,
                ":user": user_id,
                ":uuid": uuid,
            },
        )
    }

    fn update_lock(
        &self,
        uuid: &str,
        condition: LockCondition,
        next: LockState,
    ) -> StoreResult<bool> {
        let is_locked = next != LockState::Unlocked;
        let next_holder = next.holder();
        execute_gated(
            &self.connect()?,
            "UPDATE emails_editable
             SET is_locked = :is_locked, locked_by_user_id = :next_holder
             WHERE uuid = :uuid AND",
            condition,
            named_params! {
                ":is_locked": is_locked,
                ":next_holder": next_holder,
                ":uuid": uuid,
            },
        )
    }

    fn delete_email(&self, uuid: &str, condition: LockCondition) -> StoreResult<bool> {
        execute_gated(
            &self.connect()?,
            "DELETE FROM emails_editable WHERE uuid = :uuid AND",
            condition,
            named_params! { ":uuid": uuid },
        )
    }
}

impl SectionLibrary for SqliteStore {
    fn list_available_sections(&self) -> StoreResult<Vec<SectionTemplate>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, type_key, html_content FROM section_templates ORDER BY name ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SectionTemplate {
                id: row.get(0)?,
                name: row.get(1)?,
                type_key: row.get(2)?,
                html_content: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_section_template(&self, id: i64) -> StoreResult<Option<SectionTemplate>> {
        let section = self
            .connect()?
            .query_row(
                "SELECT id, name, type_key, html_content FROM section_templates WHERE id = ?1",
                params![id],
                |row| {
                    Ok(SectionTemplate {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        type_key: row.get(2)?,
                        html_content: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(section)
    }
}

impl UserDirectory for SqliteStore {
    fn display_name(&self, user_id: i64) -> StoreResult<Option<String>> {
        let name = self
            .connect()?
            .query_row(
                "SELECT username FROM users WHERE id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    fn remember_user(&self, user_id: i64, username: &str, role: Role) -> StoreResult<()> {
        self.connect()?.execute(
            "INSERT INTO users (id, username, role) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET username = excluded.username, role = excluded.role",
            params![user_id, username, role.as_str()],
        )?;
        Ok(())
    }

    fn count_users(&self) -> StoreResult<i64> {
        count_rows(&self.connect()?, "users")
    }
}
