use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who, if anyone, currently holds the edit lock of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user_id", rename_all = "snake_case")]
pub enum LockState {
    Unlocked,
    LockedBy(i64),
}

impl LockState {
    /// Builds the state from the `is_locked` / `locked_by_user_id` column pair.
    ///
    /// A row flagged locked without a holder is treated as unlocked, keeping
    /// `Unlocked` the only state without an owner.
    pub fn from_columns(is_locked: bool, locked_by_user_id: Option<i64>) -> Self {
        match (is_locked, locked_by_user_id) {
            (true, Some(user_id)) => LockState::LockedBy(user_id),
            _ => LockState::Unlocked,
        }
    }

    pub fn holder(&self) -> Option<i64> {
        match self {
            LockState::Unlocked => None,
            LockState::LockedBy(user_id) => Some(*user_id),
        }
    }

    pub fn is_held_by(&self, user_id: i64) -> bool {
        self.holder() == Some(user_id)
    }
}

/// Row of the email list view, with display names already joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailSummary {
    pub uuid: String,
    pub template_id: i64,
    pub template_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub creator_username: Option<String>,
    pub last_modifier_username: Option<String>,
    pub is_locked: bool,
    pub locked_by_user_id: Option<i64>,
    pub locked_by_username: Option<String>,
}

/// A stored email as loaded for editing. `content` is the raw JSON column,
/// which may still be in the legacy flat shape.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailRecord {
    pub uuid: String,
    pub template_id: i64,
    pub template_name: String,
    pub content: Value,
    pub lock: LockState,
}

/// Lock status as reported by `GET /api/emails-editable/{uuid}/lock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub is_locked: bool,
    pub locked_by_user_id: Option<i64>,
    pub locked_by_username: Option<String>,
}
