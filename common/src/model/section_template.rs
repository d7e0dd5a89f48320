use serde::{Deserialize, Serialize};

/// Entry of the section library an editor can append to an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTemplate {
    pub id: i64,
    pub name: String,
    pub type_key: String,
    pub html_content: String,
}
