/// Pre-template board schema.
///
/// Older saves held a bare array of exactly three rows (informal, formal,
/// technical) whose layers were identified by display label, in several
/// spellings, with `stakeholders` / `issues` / `ideas` card arrays. Cards
/// had no color and sometimes were plain strings.
use std::collections::BTreeMap;

use serde_json::Value;

use crate::ids::generate_id;
use crate::template::{classic_template, slugify};
use crate::types::{Card, CardColor, Row};

/// Accepted layer spellings (slugified), in classic layer order.
const LEGACY_LAYER_SPELLINGS: [&[&str]; 3] = [
    &["informal"],
    &["formal"],
    &["technical", "tecnico", "tecnica", "tecnologico", "tecnologica"],
];

/// Accepted card-map keys per classic column.
const LEGACY_COLUMN_KEYS: [(&str, &[&str]); 3] = [
    ("stakeholders", &["stakeholders", "partes-interessadas", "partes"]),
    ("issues", &["issues", "problemas", "problemas-e-questoes"]),
    ("ideas", &["ideas", "ideias", "ideias-e-solucoes", "solucoes"]),
];

fn legacy_layer_label(item: &Value) -> Option<&str> {
    ["layer", "layerLabel", "title"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .filter(|label| !label.trim().is_empty())
}

/// Classic layer index for a legacy label. Matches whole slug tokens, so
/// "Camada Informal" is informal and never formal.
fn legacy_layer_index(label: &str) -> Option<usize> {
    let slug = slugify(label);
    let tokens: Vec<&str> = slug.split('-').collect();
    LEGACY_LAYER_SPELLINGS
        .iter()
        .position(|spellings| tokens.iter().any(|token| spellings.contains(token)))
}

fn parse_legacy_card(value: &Value) -> Option<Card> {
    match value {
        Value::String(content) => Some(Card {
            id: generate_id("card"),
            content: content.clone(),
            color: CardColor::default(),
        }),
        Value::Object(map) => {
            let content = map
                .get("content")
                .or_else(|| map.get("text"))
                .and_then(Value::as_str)?;
            let id = map
                .get("id")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| generate_id("card"));
            let color = map
                .get("color")
                .and_then(Value::as_str)
                .and_then(CardColor::from_name)
                .unwrap_or_default();
            Some(Card {
                id,
                content: content.to_string(),
                color,
            })
        }
        _ => None,
    }
}

/// Map a legacy row array onto the classic template.
pub fn parse_legacy_rows(value: &Value) -> Option<Vec<Row>> {
    let items = value.as_array()?;
    if items.len() != LEGACY_LAYER_SPELLINGS.len() {
        return None;
    }

    let mut slots: [Option<&Value>; 3] = [None; 3];
    for (position, item) in items.iter().enumerate() {
        item.as_object()?;
        let index = match legacy_layer_label(item) {
            Some(label) => legacy_layer_index(label)?,
            None => position,
        };
        if slots[index].replace(item).is_some() {
            return None;
        }
    }

    let template = classic_template();
    let mut rows = Vec::with_capacity(template.layers.len());
    for (layer, item) in template.layers.iter().zip(slots) {
        let item = item?;
        let source = item.get("cards")?.as_object()?;

        let mut cards = BTreeMap::new();
        for (column_id, keys) in LEGACY_COLUMN_KEYS {
            let list = match keys.iter().find_map(|key| source.get(*key)) {
                None => Vec::new(),
                Some(list) => list
                    .as_array()?
                    .iter()
                    .filter_map(parse_legacy_card)
                    .collect(),
            };
            cards.insert(column_id.to_string(), list);
        }

        rows.push(Row {
            layer_id: layer.id.clone(),
            layer_label: layer.label.clone(),
            layer_description: layer.description.clone(),
            cards,
        });
    }

    log::info!("[quadro.normalize.legacy] Migrated legacy 3x3 board");
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_layer_spellings() {
        assert_eq!(legacy_layer_index("Informal"), Some(0));
        assert_eq!(legacy_layer_index("Camada Formal"), Some(1));
        assert_eq!(legacy_layer_index("TÉCNICO"), Some(2));
        assert_eq!(legacy_layer_index("Nível tecnológico"), Some(2));
        assert_eq!(legacy_layer_index("Outro"), None);
    }

    #[test]
    fn test_parse_labeled_rows_out_of_order() {
        let rows = parse_legacy_rows(&json!([
            { "layer": "Técnico", "cards": { "ideias": ["Automatizar"] } },
            { "layer": "Informal", "cards": { "stakeholders": [{ "id": "s1", "content": "Alunos" }] } },
            { "layer": "Formal", "cards": { "problemas": [{ "text": "Regras rígidas" }] } }
        ]))
        .unwrap();

        assert_eq!(rows[0].layer_id, "informal");
        assert_eq!(rows[0].cards["stakeholders"][0].id, "s1");
        assert_eq!(rows[0].cards["stakeholders"][0].color, CardColor::Yellow);
        assert_eq!(rows[1].cards["issues"][0].content, "Regras rígidas");
        assert_eq!(rows[2].cards["ideas"][0].content, "Automatizar");
        assert!(rows[2].cards["ideas"][0].id.starts_with("card-"));
        assert!(rows.iter().all(|row| row.cards.len() == 3));
    }

    #[test]
    fn test_parse_positional_rows() {
        let rows = parse_legacy_rows(&json!([
            { "cards": { "stakeholders": [] } },
            { "cards": { "issues": [{ "id": "i1", "content": "x" }] } },
            { "cards": {} }
        ]))
        .unwrap();
        assert_eq!(rows[1].layer_id, "formal");
        assert_eq!(rows[1].cards["issues"].len(), 1);
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(parse_legacy_rows(&json!([{ "cards": {} }, { "cards": {} }])).is_none());
        assert!(parse_legacy_rows(&json!([
            { "layer": "Formal", "cards": {} },
            { "layer": "Formal", "cards": {} },
            { "layer": "Informal", "cards": {} }
        ]))
        .is_none());
        assert!(parse_legacy_rows(&json!([
            { "layer": "Informal" },
            { "layer": "Formal", "cards": {} },
            { "layer": "Técnico", "cards": {} }
        ]))
        .is_none());
        assert!(parse_legacy_rows(&json!("board")).is_none());
    }
}
