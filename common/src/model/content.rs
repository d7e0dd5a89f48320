use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Section type given to the single synthetic section that wraps a legacy
/// flat document when it is upgraded.
pub const LEGACY_SECTION_TYPE: &str = "legacy-content";

/// Placeholder key to value, in discovery order.
pub type ContentMap = IndexMap<String, String>;

/// One independently editable block of an email.
///
/// `html` is the snapshot of the template markup taken when the section was
/// created; later template edits never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: String,
    pub html: String,
    pub content: ContentMap,
}

impl Section {
    /// Number of synthesized `image_N` keys held by this section.
    pub fn image_key_count(&self) -> usize {
        self.content
            .keys()
            .filter(|key| key.starts_with("image_"))
            .count()
    }
}

/// The canonical, section-array content document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub sections: Vec<Section>,
}

impl ContentDocument {
    pub fn image_key_count(&self) -> usize {
        self.sections.iter().map(Section::image_key_count).sum()
    }
}

/// The two shapes a stored `content_json` column can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredContent {
    /// `{ "sections": [...] }`
    Current(ContentDocument),
    /// Pre-section flat `{ key: value }` mapping.
    Legacy(ContentMap),
}

/// Why a stored document could not be read as either schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentShapeError {
    #[error("content must be a JSON object")]
    NotAnObject,
    #[error("malformed sections array: {0}")]
    MalformedSections(String),
}

impl StoredContent {
    /// Discriminates on the presence of a `sections` array.
    ///
    /// Anything else that is an object is legacy. Non-string legacy values are
    /// kept as their JSON text, `null` as an empty string.
    pub fn from_value(value: &Value) -> Result<Self, ContentShapeError> {
        let object = value.as_object().ok_or(ContentShapeError::NotAnObject)?;

        if let Some(sections @ Value::Array(_)) = object.get("sections") {
            let sections: Vec<Section> = serde_json::from_value(sections.clone())
                .map_err(|e| ContentShapeError::MalformedSections(e.to_string()))?;
            return Ok(StoredContent::Current(ContentDocument { sections }));
        }

        let legacy = object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .collect();
        Ok(StoredContent::Legacy(legacy))
    }
}
