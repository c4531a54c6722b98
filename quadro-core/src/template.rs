/// Board templates: built-in presets, validation of untrusted template JSON
/// and custom template construction.
use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Map, Value};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::ids::generate_id;
use crate::types::{Column, Layer, Template};

pub const CLASSIC_TEMPLATE_ID: &str = "classic";
pub const SIMPLE_TEMPLATE_ID: &str = "simple";
/// Prefix of user-built templates. Built-in ids never start with it.
pub const CUSTOM_TEMPLATE_PREFIX: &str = "custom";

fn non_slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug regex"))
}

/// Label and description of a layer, as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDef {
    pub label: String,
    pub description: String,
}

impl LayerDef {
    pub fn new(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Lowercase, strip diacritics, collapse non-alphanumerics into `-`.
pub fn slugify(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    non_slug_regex()
        .replace_all(&folded, "-")
        .trim_matches('-')
        .to_string()
}

fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> &'a str {
    map.get(key).and_then(Value::as_str).map(str::trim).unwrap_or("")
}

fn positional_id(prefix: &str, position: usize, seen: &HashSet<String>) -> String {
    let mut n = position;
    loop {
        let candidate = format!("{}-{}", prefix, n);
        if !seen.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Keep the well-formed entries (objects with a non-empty label) and give
/// each a unique id. Explicit ids win; a repeated explicit id drops the later
/// entry. Missing ids come from the label slug, or `<prefix>-<n>` when the
/// slug is empty or taken.
fn keyed_entries<'a>(
    raw: &'a [Value],
    fallback_prefix: &str,
) -> Vec<(String, &'a Map<String, Value>)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries = Vec::new();

    for entry in raw {
        let Some(map) = entry.as_object() else {
            continue;
        };
        let label = text_field(map, "label");
        if label.is_empty() {
            continue;
        }

        let explicit = text_field(map, "id");
        let id = if !explicit.is_empty() {
            if seen.contains(explicit) {
                log::debug!(
                    "[quadro.template] Dropping duplicate {} id {}",
                    fallback_prefix,
                    explicit
                );
                continue;
            }
            explicit.to_string()
        } else {
            let slug = slugify(label);
            if !slug.is_empty() && !seen.contains(&slug) {
                slug
            } else {
                positional_id(fallback_prefix, entries.len() + 1, &seen)
            }
        };

        seen.insert(id.clone());
        entries.push((id, map));
    }

    entries
}

/// Validate an arbitrary JSON value as a template.
///
/// Returns `None` when the name is blank or when no well-formed column or
/// no well-formed layer survives filtering.
pub fn normalize_template(candidate: &Value) -> Option<Template> {
    let map = candidate.as_object()?;
    let name = text_field(map, "name");
    if name.is_empty() {
        return None;
    }

    let columns: Vec<Column> = keyed_entries(map.get("columns")?.as_array()?, "column")
        .into_iter()
        .map(|(id, entry)| Column {
            id,
            label: text_field(entry, "label").to_string(),
        })
        .collect();

    let layers: Vec<Layer> = keyed_entries(map.get("layers")?.as_array()?, "layer")
        .into_iter()
        .map(|(id, entry)| Layer {
            id,
            label: text_field(entry, "label").to_string(),
            description: text_field(entry, "description").to_string(),
        })
        .collect();

    if columns.is_empty() || layers.is_empty() {
        return None;
    }

    let id = match text_field(map, "id") {
        "" => {
            let slug = slugify(name);
            if slug.is_empty() {
                "template".to_string()
            } else {
                slug
            }
        }
        explicit => explicit.to_string(),
    };

    Some(Template {
        id,
        name: name.to_string(),
        columns,
        layers,
    })
}

/// Build a user template from labels, through the same validation as
/// persisted templates. The id is process-unique and `custom-` prefixed.
pub fn create_custom_template<S: AsRef<str>>(
    name: &str,
    column_labels: &[S],
    layer_defs: &[LayerDef],
) -> Option<Template> {
    let columns: Vec<Value> = column_labels
        .iter()
        .map(|label| json!({ "label": label.as_ref() }))
        .collect();
    let layers: Vec<Value> = layer_defs
        .iter()
        .map(|def| json!({ "label": def.label, "description": def.description }))
        .collect();

    normalize_template(&json!({
        "id": generate_id(CUSTOM_TEMPLATE_PREFIX),
        "name": name,
        "columns": columns,
        "layers": layers,
    }))
}

fn preset(
    id: &str,
    name: &str,
    columns: &[(&str, &str)],
    layers: &[(&str, &str, &str)],
) -> Template {
    Template {
        id: id.to_string(),
        name: name.to_string(),
        columns: columns
            .iter()
            .map(|(id, label)| Column {
                id: id.to_string(),
                label: label.to_string(),
            })
            .collect(),
        layers: layers
            .iter()
            .map(|(id, label, description)| Layer {
                id: id.to_string(),
                label: label.to_string(),
                description: description.to_string(),
            })
            .collect(),
    }
}

/// The evaluation frame: stakeholders / issues / ideas across the
/// informal, formal and technical layers.
pub fn classic_template() -> Template {
    preset(
        CLASSIC_TEMPLATE_ID,
        "Quadro de Avaliação",
        &[
            ("stakeholders", "Partes Interessadas"),
            ("issues", "Problemas e Questões"),
            ("ideas", "Ideias e Soluções"),
        ],
        &[
            (
                "informal",
                "Informal",
                "Crenças, valores, hábitos e expectativas das pessoas envolvidas",
            ),
            (
                "formal",
                "Formal",
                "Normas, regras, papéis e procedimentos estabelecidos",
            ),
            (
                "technical",
                "Técnico",
                "Sistemas, ferramentas e infraestrutura técnica",
            ),
        ],
    )
}

/// A single-slot board for free-form note taking.
pub fn simple_template() -> Template {
    preset(
        SIMPLE_TEMPLATE_ID,
        "Quadro Simples",
        &[("notes", "Notas")],
        &[("general", "Geral", "")],
    )
}

pub fn builtin_templates() -> Vec<Template> {
    vec![classic_template(), simple_template()]
}

/// Fresh clone of a built-in preset, so callers can embed it freely.
pub fn builtin_template(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

pub fn is_builtin_template_id(id: &str) -> bool {
    builtin_templates().iter().any(|t| t.id == id)
}
