//! Produces canonical section-array documents from template sections, initial
//! values, or previously stored content of either schema.

use crate::editor::parser::scan_fragment;
use crate::editor::validation::{is_link_key, is_title_key};
use crate::errors::EditorError;
use common::model::content::{
    ContentDocument, ContentMap, Section, StoredContent, LEGACY_SECTION_TYPE,
};
use serde_json::Value;
use uuid::Uuid;

pub const FILLER_URL: &str = "https://example.com";
pub const FILLER_TITLE: &str = "Título de la sección";
pub const FILLER_PARAGRAPH: &str = "<p>Escribe aquí el contenido de la sección.</p>";
pub const FILLER_IMAGE: &str = "https://placehold.co/600x300";

/// Result of loading stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Already section-array; returned as stored.
    Unchanged(ContentDocument),
    /// Legacy flat content wrapped into a single section; should be written back.
    Upgraded(ContentDocument),
}

impl Normalized {
    pub fn was_upgraded(&self) -> bool {
        matches!(self, Normalized::Upgraded(_))
    }

    pub fn document(&self) -> &ContentDocument {
        match self {
            Normalized::Unchanged(document) | Normalized::Upgraded(document) => document,
        }
    }

    pub fn into_document(self) -> ContentDocument {
        match self {
            Normalized::Unchanged(document) | Normalized::Upgraded(document) => document,
        }
    }
}

/// Seeds parsed template sections with the caller's initial values. Keys the
/// template does not declare are ignored.
pub fn build_initial_content(sections: Vec<Section>, initial_values: &ContentMap) -> ContentDocument {
    let sections = sections
        .into_iter()
        .map(|mut section| {
            for (key, value) in section.content.iter_mut() {
                if let Some(initial) = initial_values.get(key) {
                    value.clone_from(initial);
                }
            }
            section
        })
        .collect();
    ContentDocument { sections }
}

/// Brings stored content to the current schema.
///
/// Section-array documents pass through untouched, so filled values are never
/// re-derived from the template. Legacy documents become one
/// `legacy-content` section holding the whole template HTML and the flat
/// mapping verbatim; `fetch_template_html` is only called in that case.
pub fn normalize_existing<F>(
    template_id: i64,
    stored: &Value,
    fetch_template_html: F,
) -> Result<Normalized, EditorError>
where
    F: FnOnce(i64) -> Result<String, EditorError>,
{
    let stored = StoredContent::from_value(stored).map_err(|e| {
        EditorError::invalid(format!("Contenido almacenado ilegible: {}", e))
    })?;

    match stored {
        StoredContent::Current(document) => Ok(Normalized::Unchanged(document)),
        StoredContent::Legacy(content) => {
            let html = fetch_template_html(template_id)?;
            Ok(Normalized::Upgraded(ContentDocument {
                sections: vec![Section {
                    id: Uuid::new_v4().to_string(),
                    section_type: LEGACY_SECTION_TYPE.to_string(),
                    html,
                    content,
                }],
            }))
        }
    }
}

fn text_filler(key: &str) -> &'static str {
    if is_link_key(key) {
        FILLER_URL
    } else if is_title_key(key) {
        FILLER_TITLE
    } else {
        FILLER_PARAGRAPH
    }
}

/// Appends a new section built from a section-library snippet.
///
/// Image keys continue from the number of `image_` keys already present in
/// the document. Keys found in link-role attributes are seeded with a URL and
/// keep it even when the same name shows up again as text.
pub fn add_section<'a>(
    document: &'a mut ContentDocument,
    section_type: &str,
    html: &str,
) -> &'a Section {
    let found = scan_fragment(html, document.image_key_count());

    let mut content = ContentMap::new();
    for key in found.link_keys {
        content.insert(key, FILLER_URL.to_string());
    }
    for key in found.text_keys {
        let filler = text_filler(&key);
        content.entry(key).or_insert_with(|| filler.to_string());
    }
    for key in found.image_keys {
        content.entry(key).or_insert_with(|| FILLER_IMAGE.to_string());
    }

    document.sections.push(Section {
        id: Uuid::new_v4().to_string(),
        section_type: section_type.to_string(),
        html: html.to_string(),
        content,
    });
    &document.sections[document.sections.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::parser::parse_template_html;
    use crate::editor::validation::validate_document;
    use serde_json::json;

    const PROMO: &str = r#"<html><body>
<table data-section-type="promo"><tr><td>
  <h1>{{titulo}}</h1><a href="{{enlace_1}}">Comprar</a><img src="{{image_src}}">
</td></tr></table>
</body></html>"#;

    fn values(pairs: &[(&str, &str)]) -> ContentMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn never_fetch(_: i64) -> Result<String, EditorError> {
        panic!("template must not be fetched for current-schema content")
    }

    #[test]
    fn initial_content_has_template_keys_only() {
        let sections = parse_template_html(PROMO);
        let document = build_initial_content(
            sections,
            &values(&[("titulo", "Rebajas"), ("desconocido", "x")]),
        );

        let content = &document.sections[0].content;
        let keys: Vec<_> = content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["titulo", "enlace_1", "image_src", "image_0"]);
        assert_eq!(content["titulo"], "Rebajas");
        assert_eq!(content["enlace_1"], "");
        assert_eq!(content["image_0"], "");
        assert!(!content.contains_key("desconocido"));
    }

    #[test]
    fn current_schema_passes_through_unchanged() {
        let stored = json!({
            "sections": [
                { "id": "b", "type": "texto", "html": "<table></table>", "content": { "zeta": "<p>1</p>", "alfa": "2" } },
                { "id": "a", "type": "pie", "html": "", "content": {} }
            ]
        });

        let normalized = normalize_existing(1, &stored, never_fetch).unwrap();
        assert!(!normalized.was_upgraded());
        assert_eq!(serde_json::to_value(normalized.document()).unwrap(), stored);
        assert_eq!(
            serde_json::to_string(normalized.document()).unwrap(),
            serde_json::to_string(&stored).unwrap()
        );
    }

    #[test]
    fn legacy_content_is_wrapped_in_one_section() {
        let template_html = "<p>{{titulo}}</p>";
        let normalized = normalize_existing(4, &json!({ "titulo": "Hola" }), |id| {
            assert_eq!(id, 4);
            Ok(template_html.to_string())
        })
        .unwrap();

        assert!(normalized.was_upgraded());
        let document = normalized.into_document();
        assert_eq!(document.sections.len(), 1);
        let section = &document.sections[0];
        assert_eq!(section.section_type, LEGACY_SECTION_TYPE);
        assert_eq!(section.html, template_html);
        assert_eq!(section.content, values(&[("titulo", "Hola")]));
        assert!(!section.id.is_empty());
    }

    #[test]
    fn legacy_upgrade_fails_without_template() {
        let result = normalize_existing(9, &json!({ "titulo": "Hola" }), |_| {
            Err(EditorError::not_found("Template no encontrado."))
        });
        assert!(matches!(result, Err(EditorError::NotFound(_))));
    }

    #[test]
    fn unreadable_content_is_a_validation_failure() {
        let result = normalize_existing(1, &json!([1, 2]), never_fetch);
        assert!(matches!(result, Err(EditorError::ValidationFailed(_))));
    }

    #[test]
    fn added_section_continues_image_numbering() {
        let mut document = ContentDocument {
            sections: vec![Section {
                id: "s0".into(),
                section_type: "cabecera".into(),
                html: String::new(),
                content: values(&[("image_0", "logo.png")]),
            }],
        };

        let added = add_section(
            &mut document,
            "galeria",
            r#"<table data-section-type="galeria"><tr><td><img src="a"><img src="b"></td></tr></table>"#,
        );
        let keys: Vec<_> = added.content.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["image_1", "image_2"]);
        assert!(added.content.values().all(|v| v == FILLER_IMAGE));

        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.sections[0].id, "s0");
        assert_eq!(document.sections[1].section_type, "galeria");
    }

    #[test]
    fn added_section_fillers_follow_key_names() {
        let mut document = ContentDocument::default();
        let html = r#"<table data-section-type="cta"><tr><td>
<h2>{{titulo_cta}}</h2><p>{{cuerpo}}</p>
<a data-editable="link" href="{{boton}}">{{boton}}</a>
<a href="{{enlace_2}}">más</a> <a href="{{web_url}}">web</a>
</td></tr></table>"#;

        let added = add_section(&mut document, "cta", html);
        assert_eq!(added.html, html);
        assert_eq!(added.content["boton"], FILLER_URL);
        assert_eq!(added.content["titulo_cta"], FILLER_TITLE);
        assert_eq!(added.content["cuerpo"], FILLER_PARAGRAPH);
        assert_eq!(added.content["enlace_2"], FILLER_URL);
        assert_eq!(added.content["web_url"], FILLER_URL);
        let keys: Vec<_> = added.content.keys().map(String::as_str).collect();
        assert_eq!(keys[0], "boton");

        validate_document(&document).unwrap();
    }
}
