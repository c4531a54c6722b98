/// Row and card parsing against a template.
use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use super::legacy::parse_legacy_rows;
use crate::template::CLASSIC_TEMPLATE_ID;
use crate::types::{Card, CardColor, Layer, Row, Template};

/// Parse one card. Needs a non-empty string `id` and a string `content`;
/// a missing or unknown color becomes yellow.
pub fn parse_card(value: &Value) -> Option<Card> {
    let map = value.as_object()?;
    let id = map.get("id")?.as_str()?.trim();
    if id.is_empty() {
        return None;
    }
    let content = map.get("content")?.as_str()?;
    let color = map
        .get("color")
        .and_then(Value::as_str)
        .and_then(CardColor::from_name)
        .unwrap_or_default();

    Some(Card {
        id: id.to_string(),
        content: content.to_string(),
        color,
    })
}

/// Parse a card list. `None` if `value` is not an array; malformed
/// elements are dropped individually.
pub fn parse_cards(value: &Value) -> Option<Vec<Card>> {
    let items = value.as_array()?;
    let cards: Vec<Card> = items.iter().filter_map(parse_card).collect();
    if cards.len() != items.len() {
        log::warn!(
            "[quadro.normalize.rows] Dropped {} malformed card(s)",
            items.len() - cards.len()
        );
    }
    Some(cards)
}

/// Lenient row repair: every template column gets a card list, whatever the
/// source holds.
pub fn normalize_row(value: &Value, layer: &Layer, template: &Template) -> Row {
    let source = value.get("cards");
    let mut row = Row::empty(layer, template);
    for column in &template.columns {
        let cards = source
            .and_then(|cards| cards.get(column.id.as_str()))
            .and_then(parse_cards)
            .unwrap_or_default();
        row.cards.insert(column.id.clone(), cards);
    }
    row
}

/// Strict template-aware parse used for imports and legacy payloads.
///
/// `None` unless `value` is an array with exactly one row per template layer,
/// each naming a known `layerId` once. A column entry, when present, must be
/// an array.
pub fn parse_board_rows(value: &Value, template: &Template) -> Option<Vec<Row>> {
    let items = value.as_array()?;
    if items.len() != template.layers.len() {
        return None;
    }

    let mut by_layer: HashMap<&str, &Value> = HashMap::new();
    for item in items {
        let layer_id = item.get("layerId")?.as_str()?;
        template.layer(layer_id)?;
        if by_layer.insert(layer_id, item).is_some() {
            return None;
        }
    }

    template
        .layers
        .iter()
        .map(|layer| {
            let item = by_layer.get(layer.id.as_str())?;
            let cards_value = match item.get("cards") {
                None => None,
                Some(cards) if cards.is_object() => Some(cards),
                Some(_) => return None,
            };

            let mut cards = BTreeMap::new();
            for column in &template.columns {
                let parsed = match cards_value.and_then(|c| c.get(column.id.as_str())) {
                    None => Vec::new(),
                    Some(list) => parse_cards(list)?,
                };
                cards.insert(column.id.clone(), parsed);
            }

            Some(Row {
                layer_id: layer.id.clone(),
                layer_label: layer.label.clone(),
                layer_description: layer.description.clone(),
                cards,
            })
        })
        .collect()
}

/// Template-aware parse, falling back to the legacy 3×3 schema when the
/// target is the classic template.
pub fn parse_rows_for_template(value: &Value, template: &Template) -> Option<Vec<Row>> {
    parse_board_rows(value, template).or_else(|| {
        if template.id == CLASSIC_TEMPLATE_ID {
            parse_legacy_rows(value)
        } else {
            None
        }
    })
}
