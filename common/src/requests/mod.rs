use crate::model::content::ContentMap;
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /api/emails-editable`.
#[derive(Debug, Deserialize)]
pub struct CreateEmailRequest {
    pub template_id: i64,
    #[serde(default)]
    pub initial_content: ContentMap,
}

/// Body of `PUT /api/emails-editable/{uuid}`.
///
/// Kept as raw JSON so a document without a `sections` array is reported as
/// a validation failure instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub updated_content: Value,
}

/// Body of `POST /api/emails-editable/{uuid}/sections`.
#[derive(Debug, Deserialize)]
pub struct AddSectionRequest {
    pub section_template_id: i64,
}

/// Body of `POST /api/templates/save`. Without `id` a new template is created.
#[derive(Debug, Deserialize)]
pub struct SaveTemplateRequest {
    pub id: Option<i64>,
    pub name: String,
    pub html_content: String,
}
