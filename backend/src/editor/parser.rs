//! Turns template HTML into section descriptors.
//!
//! Sections are selected on the parsed tree. Each section's markup is then
//! taken from the template source, because the tree builder moves stray
//! content (text between `<table>` and `<tr>`, say) out of tables. The
//! placeholder pattern only ever runs over markup that has already been
//! isolated to one section.

use common::model::content::{ContentMap, Section};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use uuid::Uuid;

/// Attribute naming a top-level block's section type.
pub const SECTION_TYPE_ATTR: &str = "data-section-type";

/// `data-editable="link"` marks an element whose attribute placeholders are
/// link targets.
pub const LINK_ROLE_ATTR: &str = "data-editable";
pub const LINK_ROLE_VALUE: &str = "link";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern")
});

static SOURCE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>").expect("tag pattern")
});

static SOURCE_SECTION_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bdata-section-type\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("section attribute pattern")
});

pub fn image_key(index: usize) -> String {
    format!("image_{}", index)
}

/// Distinct `{{name}}` placeholders in first-occurrence order.
pub fn placeholder_keys(text: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for captures in PLACEHOLDER.captures_iter(text) {
        let key = &captures[1];
        if !keys.iter().any(|known| known == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

fn is_section(element: &ElementRef<'_>) -> bool {
    element.value().attr(SECTION_TYPE_ATTR).is_some()
}

fn has_section_ancestor(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_section(&ancestor))
}

fn count_images(element: ElementRef<'_>) -> usize {
    element
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|node| node.value().name() == "img")
        .count()
}

/// A marked element as written in the template source.
#[derive(Debug, PartialEq, Eq)]
struct SourceSection<'h> {
    section_type: &'h str,
    markup: &'h str,
}

struct OpenSection<'h> {
    start: usize,
    tag: String,
    section_type: &'h str,
    depth: usize,
}

fn source_section_type(attributes: &str) -> Option<&str> {
    let captures = SOURCE_SECTION_TYPE.captures(attributes)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|value| value.as_str())
}

/// Outermost marked elements of the raw source, in source order.
///
/// An element ends at the close tag that balances its own tag name; one that
/// is never closed runs to the end of the input.
fn source_sections(html: &str) -> Vec<SourceSection<'_>> {
    let mut found = Vec::new();
    let mut open: Option<OpenSection<'_>> = None;

    for captures in SOURCE_TAG.captures_iter(html) {
        let (Some(whole), Some(name), Some(attributes)) =
            (captures.get(0), captures.get(2), captures.get(3))
        else {
            continue;
        };
        let closing = !captures[1].is_empty();
        let tag = name.as_str().to_ascii_lowercase();

        match open.take() {
            None => {
                if let Some(section_type) = source_section_type(attributes.as_str()) {
                    if !closing {
                        open = Some(OpenSection {
                            start: whole.start(),
                            tag,
                            section_type,
                            depth: 1,
                        });
                    }
                }
            }
            Some(mut current) => {
                if current.tag == tag {
                    if closing {
                        current.depth -= 1;
                    } else if !attributes.as_str().trim_end().ends_with('/') {
                        current.depth += 1;
                    }
                }
                if current.depth == 0 {
                    found.push(SourceSection {
                        section_type: current.section_type,
                        markup: &html[current.start..whole.end()],
                    });
                } else {
                    open = Some(current);
                }
            }
        }
    }

    if let Some(current) = open {
        found.push(SourceSection {
            section_type: current.section_type,
            markup: &html[current.start..],
        });
    }
    found
}

/// Parses a full template into its sections, in document order.
///
/// Every marked element without a marked ancestor is a section, wherever it
/// sits in the layout; markers nested inside another section are part of
/// that section's markup. Image keys share one counter across the whole
/// template.
///
/// A section's `html` is its source text. When the source cannot be lined up
/// with the parsed tree (marked elements inside comments, for instance), the
/// serialized element is used instead.
pub fn parse_template_html(html: &str) -> Vec<Section> {
    let document = Html::parse_document(html);
    let outermost: Vec<ElementRef<'_>> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| is_section(element) && !has_section_ancestor(element))
        .collect();

    let source = source_sections(html);
    let lined_up = source.len() == outermost.len();

    let mut sections = Vec::new();
    let mut image_offset = 0;
    for (index, element) in outermost.into_iter().enumerate() {
        let section_type = element.value().attr(SECTION_TYPE_ATTR).unwrap_or_default();
        let markup = source
            .get(index)
            .filter(|written| lined_up && written.section_type == section_type)
            .map(|written| written.markup.to_string())
            .unwrap_or_else(|| element.html());
        let (section, next_offset) = extract_section(section_type, markup, image_offset);
        image_offset = next_offset;
        sections.push(section);
    }
    sections
}

fn extract_section(section_type: &str, html: String, image_offset: usize) -> (Section, usize) {
    let mut content = ContentMap::new();
    for key in placeholder_keys(&html) {
        content.insert(key, String::new());
    }

    let images = count_images(Html::parse_fragment(&html).root_element());
    let next_offset = image_offset + images;
    for index in image_offset..next_offset {
        content.entry(image_key(index)).or_default();
    }

    let section = Section {
        id: Uuid::new_v4().to_string(),
        section_type: section_type.to_string(),
        html,
        content,
    };
    (section, next_offset)
}

/// Keys found in a standalone section snippet, grouped by how they were found.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FragmentKeys {
    /// Placeholders inside attributes of `data-editable="link"` elements.
    pub link_keys: Vec<String>,
    /// Every text placeholder of the snippet, link keys included.
    pub text_keys: Vec<String>,
    pub image_keys: Vec<String>,
}

/// Scans a section snippet, numbering its images from `image_offset`.
pub fn scan_fragment(html: &str, image_offset: usize) -> FragmentKeys {
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let mut link_keys: Vec<String> = Vec::new();
    let link_elements = root
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|node| node.value().attr(LINK_ROLE_ATTR) == Some(LINK_ROLE_VALUE));
    for element in link_elements {
        for (_, value) in element.value().attrs() {
            for key in placeholder_keys(value) {
                if !link_keys.contains(&key) {
                    link_keys.push(key);
                }
            }
        }
    }

    let images = count_images(root);
    FragmentKeys {
        link_keys,
        text_keys: placeholder_keys(html),
        image_keys: (image_offset..image_offset + images).map(image_key).collect(),
    }
}
