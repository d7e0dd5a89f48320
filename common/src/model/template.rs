use crate::model::content::Section;
use serde::{Deserialize, Serialize};

/// A stored HTML email template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub html_content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSummary {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// A template together with what the parser finds in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDetail {
    pub id: i64,
    pub name: String,
    pub html_content: String,
    /// Distinct `{{placeholder}}` names in first-occurrence order.
    pub placeholders: Vec<String>,
    pub sections: Vec<Section>,
}
