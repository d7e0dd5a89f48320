//! Field rules applied to submitted content.

use crate::errors::EditorError;
use common::model::content::{ContentDocument, ContentMap, StoredContent};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Content of a freshly added, still untouched rich-text field.
const EMPTY_PARAGRAPH: &str = "<p></p>";

pub fn is_link_key(key: &str) -> bool {
    key.contains("enlace") || key.ends_with("_url")
}

pub fn is_title_key(key: &str) -> bool {
    key.contains("titulo")
}

pub fn is_image_key(key: &str) -> bool {
    key.starts_with("image_")
}

pub fn validate_url(key: &str, value: &str) -> Result<(), EditorError> {
    Url::parse(value.trim())
        .map(|_| ())
        .map_err(|_| EditorError::invalid(format!("El campo '{}' debe ser una URL válida.", key)))
}

/// Rich text may be empty or an empty paragraph, but markup with no text in
/// it is rejected.
pub fn validate_rich_content(key: &str, value: &str) -> Result<(), EditorError> {
    if value.is_empty() || value == EMPTY_PARAGRAPH {
        return Ok(());
    }
    if TAG.replace_all(value, "").trim().is_empty() {
        return Err(EditorError::invalid(format!(
            "El contenido del campo '{}' no puede estar vacío.",
            key
        )));
    }
    Ok(())
}

pub fn validate_field(key: &str, value: &str) -> Result<(), EditorError> {
    if is_image_key(key) {
        Ok(())
    } else if is_link_key(key) {
        validate_url(key, value)
    } else {
        validate_rich_content(key, value)
    }
}

pub fn validate_values(values: &ContentMap) -> Result<(), EditorError> {
    values
        .iter()
        .try_for_each(|(key, value)| validate_field(key, value))
}

pub fn validate_document(document: &ContentDocument) -> Result<(), EditorError> {
    document
        .sections
        .iter()
        .try_for_each(|section| validate_values(&section.content))
}

/// Reads a document submitted for saving. Only the section-array shape is
/// accepted; legacy documents are never written back.
pub fn parse_submitted_content(value: &Value) -> Result<ContentDocument, EditorError> {
    let expected = || {
        EditorError::invalid(
            "El formato del contenido es inválido. Se esperaba un objeto con un array de secciones.",
        )
    };
    match StoredContent::from_value(value) {
        Ok(StoredContent::Current(document)) => Ok(document),
        Ok(StoredContent::Legacy(_)) => Err(expected()),
        Err(e) => Err(EditorError::invalid(format!("{}: {}", expected(), e))),
    }
}
