//! Collaborator contracts consumed by the editor core, and their SQLite
//! implementation.
//!
//! Every lock-sensitive write takes a [`LockCondition`] and is executed as one
//! conditional statement, so the check and the write cannot interleave with a
//! concurrent request. Writes report whether a row matched; callers decide what
//! a miss means.

mod sqlite;

pub use sqlite::SqliteStore;

use common::model::content::ContentDocument;
use common::model::email::{EmailRecord, EmailSummary, LockState};
use common::model::section_template::SectionTemplate;
use common::model::template::{Template, TemplateSummary};
use common::model::user::Role;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blocking task failed: {0}")]
    Task(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Expected lock state a conditional write is gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCondition {
    FreeOrHeldBy(i64),
    HeldBy(i64),
    Any,
}

pub struct NewEmail<'a> {
    pub uuid: &'a str,
    pub template_id: i64,
    pub content: &'a ContentDocument,
    pub user_id: i64,
    pub lock: LockState,
}

pub trait TemplateStore {
    fn get_template_html(&self, template_id: i64) -> StoreResult<Option<String>>;
    fn get_template(&self, template_id: i64) -> StoreResult<Option<Template>>;
    fn list_templates(&self) -> StoreResult<Vec<TemplateSummary>>;
    fn count_templates(&self) -> StoreResult<i64>;
    fn template_name_taken(&self, name: &str, except_id: Option<i64>) -> StoreResult<bool>;
    fn insert_template(&self, name: &str, html_content: &str, user_id: i64) -> StoreResult<i64>;
    fn update_template(&self, template_id: i64, name: &str, html_content: &str)
        -> StoreResult<bool>;
}

pub trait EmailStore {
    /// All emails, most recently updated first.
    fn list_emails(&self) -> StoreResult<Vec<EmailSummary>>;
    /// The first `limit` rows of [`EmailStore::list_emails`].
    fn list_recent_emails(&self, limit: usize) -> StoreResult<Vec<EmailSummary>>;
    fn count_emails(&self) -> StoreResult<i64>;
    fn get_email(&self, uuid: &str) -> StoreResult<Option<EmailRecord>>;
    fn get_lock_state(&self, uuid: &str) -> StoreResult<Option<LockState>>;
    fn insert_email(&self, email: &NewEmail<'_>) -> StoreResult<()>;
    /// Replaces the content and stamps the modifier, if `condition` holds.
    fn update_content(
        &self,
        uuid: &str,
        content: &ContentDocument,
        user_id: i64,
        condition: LockCondition,
    ) -> StoreResult<bool>;
    /// Compare-and-set on the lock columns.
    fn update_lock(&self, uuid: &str, condition: LockCondition, next: LockState)
        -> StoreResult<bool>;
    fn delete_email(&self, uuid: &str, condition: LockCondition) -> StoreResult<bool>;
}

pub trait SectionLibrary {
    fn list_available_sections(&self) -> StoreResult<Vec<SectionTemplate>>;
    fn get_section_template(&self, id: i64) -> StoreResult<Option<SectionTemplate>>;
}

/// Display names for user ids. Ids come from the identity layer and need not
/// have a row here.
pub trait UserDirectory {
    fn display_name(&self, user_id: i64) -> StoreResult<Option<String>>;
    /// Inserts or refreshes the row for `user_id`.
    fn remember_user(&self, user_id: i64, username: &str, role: Role) -> StoreResult<()>;
    fn count_users(&self) -> StoreResult<i64>;
}

/// Everything the editing session needs from storage.
pub trait EditorStore: TemplateStore + EmailStore + SectionLibrary + UserDirectory {}

impl<T> EditorStore for T where T: TemplateStore + EmailStore + SectionLibrary + UserDirectory {}
