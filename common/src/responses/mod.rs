use crate::model::content::ContentDocument;
use crate::model::section_template::SectionTemplate;
use serde::Serialize;

/// How the requester may use an opened email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// The requester holds the lock and may save.
    Editable,
    /// An elevated requester peeking at an email locked by someone else.
    ReadOnly,
}

/// Everything the editor needs after "open for edit".
#[derive(Debug, Clone, Serialize)]
pub struct OpenedEmail {
    pub uuid: String,
    pub template_id: i64,
    pub template_name: String,
    pub mode: EditMode,
    pub locked_by_user_id: Option<i64>,
    pub locked_by_username: Option<String>,
    pub content: ContentDocument,
    pub section_library: Vec<SectionTemplate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedEmail {
    pub uuid: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
