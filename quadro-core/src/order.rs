/// Card ordering: order snapshots, explicit reorder maps and drag/drop moves.
///
/// Every operation here keeps the set of cards intact. Stale or malformed
/// inputs degrade to no-ops.
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Card, Row, Slot};

/// LayerId -> ColumnId -> ordered card ids.
pub type CardOrder = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Where a dragged card lands relative to the hovered card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Before,
    #[default]
    After,
}

/// A drag/drop payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMove {
    pub card_id: String,
    pub from: Slot,
    pub to: Slot,
    #[serde(default)]
    pub target_card_id: Option<String>,
    #[serde(default)]
    pub placement: Placement,
}

/// Snapshot of the current order of every slot.
pub fn build_card_order(rows: &[Row]) -> CardOrder {
    rows.iter()
        .map(|row| {
            let columns = row
                .cards
                .iter()
                .map(|(column_id, cards)| {
                    (
                        column_id.clone(),
                        cards.iter().map(|card| card.id.clone()).collect(),
                    )
                })
                .collect();
            (row.layer_id.clone(), columns)
        })
        .collect()
}

/// Read an order map from untrusted JSON. `None` unless `value` is an
/// object; malformed layer or column entries are skipped and non-string ids
/// dropped.
pub fn parse_card_order(value: &Value) -> Option<CardOrder> {
    let layers = value.as_object()?;
    let mut order = CardOrder::new();

    for (layer_id, columns) in layers {
        let Some(columns) = columns.as_object() else {
            continue;
        };
        let mut parsed = BTreeMap::new();
        for (column_id, ids) in columns {
            let Some(ids) = ids.as_array() else {
                continue;
            };
            let ids: Vec<String> = ids
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            parsed.insert(column_id.clone(), ids);
        }
        order.insert(layer_id.clone(), parsed);
    }

    Some(order)
}

/// Stable sort by first position in `ids`; cards not listed go last.
fn sort_by_order(cards: &mut [Card], ids: &[String]) {
    let mut rank: HashMap<&str, usize> = HashMap::new();
    for (index, id) in ids.iter().enumerate() {
        rank.entry(id.as_str()).or_insert(index);
    }
    cards.sort_by_key(|card| rank.get(card.id.as_str()).copied().unwrap_or(usize::MAX));
}

/// Reorder every slot listed in `order`. Slots without an entry keep their
/// order; ids naming no card are ignored.
pub fn apply_card_order(mut rows: Vec<Row>, order: &CardOrder) -> Vec<Row> {
    for row in &mut rows {
        let Some(columns) = order.get(&row.layer_id) else {
            continue;
        };
        for (column_id, cards) in row.cards.iter_mut() {
            if let Some(ids) = columns.get(column_id) {
                sort_by_order(cards, ids);
            }
        }
    }
    rows
}

/// Like [`apply_card_order`] for raw JSON; returns `rows` untouched when the
/// map is not an object.
pub fn apply_card_order_value(rows: Vec<Row>, order: &Value) -> Vec<Row> {
    match parse_card_order(order) {
        Some(order) => apply_card_order(rows, &order),
        None => {
            log::debug!("[quadro.order] Ignoring malformed card order");
            rows
        }
    }
}

/// Move a card between (or within) slots.
///
/// Returns `false` without touching `rows` when the card is not in the
/// source slot, the destination slot does not exist, the target is the
/// moved card itself, or the card is dropped on its own slot with no target.
pub fn move_card(rows: &mut [Row], request: &CardMove) -> bool {
    if request.target_card_id.as_deref() == Some(request.card_id.as_str()) {
        return false;
    }
    let same_slot = request.from == request.to;
    if same_slot && request.target_card_id.is_none() {
        return false;
    }

    let Some(to_row) = rows.iter().position(|r| r.layer_id == request.to.layer_id) else {
        log::debug!("[quadro.order] Stale move: unknown layer {}", request.to.layer_id);
        return false;
    };
    if !rows[to_row].cards.contains_key(&request.to.column_id) {
        log::debug!("[quadro.order] Stale move: unknown column {}", request.to.column_id);
        return false;
    }

    let source = rows
        .iter_mut()
        .find(|r| r.layer_id == request.from.layer_id)
        .and_then(|r| r.cards.get_mut(&request.from.column_id));
    let Some(source) = source else {
        return false;
    };
    let Some(index) = source.iter().position(|c| c.id == request.card_id) else {
        log::debug!("[quadro.order] Stale move: card {} not in source", request.card_id);
        return false;
    };
    let card = source.remove(index);

    let destination = rows[to_row]
        .cards
        .entry(request.to.column_id.clone())
        .or_default();
    let insert_at = match request.target_card_id.as_deref() {
        None => destination.len(),
        Some(target) => match destination.iter().position(|c| c.id == target) {
            Some(position) => match request.placement {
                Placement::Before => position,
                Placement::After => position + 1,
            },
            None => destination.len(),
        },
    };
    let insert_at = insert_at.min(destination.len());
    destination.insert(insert_at, card);

    !(same_slot && insert_at == index)
}

/// Placement from pointer position: above the hovered card's vertical
/// midpoint is `Before`, anything else `After`.
pub fn resolve_placement(pointer_y: f64, card_top: f64, card_height: f64) -> Placement {
    if pointer_y < card_top + card_height / 2.0 {
        Placement::Before
    } else {
        Placement::After
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::classic_template;
    use crate::types::{count_cards, empty_rows, CardColor};
    use serde_json::json;

    fn card(id: &str) -> Card {
        Card {
            id: id.to_string(),
            content: format!("<p>{}</p>", id),
            color: CardColor::Yellow,
        }
    }

    fn board() -> Vec<Row> {
        let mut rows = empty_rows(&classic_template());
        rows[0].cards.insert(
            "stakeholders".to_string(),
            vec![card("a"), card("b"), card("c")],
        );
        rows[0].cards.insert("issues".to_string(), vec![card("d")]);
        rows[1].cards.insert("ideas".to_string(), vec![card("e"), card("f")]);
        rows
    }

    fn ids(rows: &[Row], layer: usize, column: &str) -> Vec<String> {
        rows[layer].cards[column].iter().map(|c| c.id.clone()).collect()
    }

    fn request(card: &str, from: (&str, &str), to: (&str, &str)) -> CardMove {
        CardMove {
            card_id: card.to_string(),
            from: Slot::new(from.0, from.1),
            to: Slot::new(to.0, to.1),
            target_card_id: None,
            placement: Placement::After,
        }
    }

    #[test]
    fn test_order_round_trip() {
        let rows = board();
        let order = build_card_order(&rows);
        assert_eq!(apply_card_order(rows.clone(), &order), rows);
    }

    #[test]
    fn test_apply_order_reorders_and_keeps_unknowns_last() {
        let order = parse_card_order(&json!({
            "informal": { "stakeholders": ["c", "ghost", "a", "c"] }
        }))
        .unwrap();
        let rows = apply_card_order(board(), &order);
        assert_eq!(ids(&rows, 0, "stakeholders"), vec!["c", "a", "b"]);
        assert_eq!(ids(&rows, 1, "ideas"), vec!["e", "f"]);
        assert_eq!(count_cards(&rows), 6);
    }

    #[test]
    fn test_apply_order_unknowns_keep_relative_order() {
        let order = parse_card_order(&json!({ "informal": { "stakeholders": ["b"] } })).unwrap();
        let rows = apply_card_order(board(), &order);
        assert_eq!(ids(&rows, 0, "stakeholders"), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_malformed_order_is_noop() {
        let rows = board();
        assert_eq!(apply_card_order_value(rows.clone(), &json!([1, 2])), rows);
        assert_eq!(
            apply_card_order_value(rows.clone(), &json!({ "informal": 3, "formal": { "ideas": "x" } })),
            rows
        );
    }

    #[test]
    fn test_parse_order_drops_non_string_ids() {
        let order = parse_card_order(&json!({ "informal": { "issues": ["d", 4, null] } })).unwrap();
        assert_eq!(order["informal"]["issues"], vec!["d".to_string()]);
    }

    #[test]
    fn test_move_to_other_column_appends() {
        let mut rows = board();
        assert!(move_card(
            &mut rows,
            &request("a", ("informal", "stakeholders"), ("informal", "issues"))
        ));
        assert_eq!(ids(&rows, 0, "stakeholders"), vec!["b", "c"]);
        assert_eq!(ids(&rows, 0, "issues"), vec!["d", "a"]);
    }

    #[test]
    fn test_move_before_and_after_target() {
        let mut rows = board();
        let mut mv = request("a", ("informal", "stakeholders"), ("formal", "ideas"));
        mv.target_card_id = Some("f".to_string());
        mv.placement = Placement::Before;
        assert!(move_card(&mut rows, &mv));
        assert_eq!(ids(&rows, 1, "ideas"), vec!["e", "a", "f"]);

        let mut mv = request("b", ("informal", "stakeholders"), ("formal", "ideas"));
        mv.target_card_id = Some("e".to_string());
        mv.placement = Placement::After;
        assert!(move_card(&mut rows, &mv));
        assert_eq!(ids(&rows, 1, "ideas"), vec!["e", "b", "a", "f"]);
    }

    #[test]
    fn test_move_within_column() {
        let mut rows = board();
        let mut mv = request("c", ("informal", "stakeholders"), ("informal", "stakeholders"));
        mv.target_card_id = Some("a".to_string());
        mv.placement = Placement::Before;
        assert!(move_card(&mut rows, &mv));
        assert_eq!(ids(&rows, 0, "stakeholders"), vec!["c", "a", "b"]);

        let mut mv = request("c", ("informal", "stakeholders"), ("informal", "stakeholders"));
        mv.target_card_id = Some("a".to_string());
        mv.placement = Placement::Before;
        assert!(!move_card(&mut rows, &mv));
        assert_eq!(ids(&rows, 0, "stakeholders"), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_move_stale_target_appends() {
        let mut rows = board();
        let mut mv = request("a", ("informal", "stakeholders"), ("formal", "ideas"));
        mv.target_card_id = Some("deleted".to_string());
        mv.placement = Placement::Before;
        assert!(move_card(&mut rows, &mv));
        assert_eq!(ids(&rows, 1, "ideas"), vec!["e", "f", "a"]);
    }

    #[test]
    fn test_stale_moves_are_noops() {
        let rows = board();

        let mut moved = rows.clone();
        assert!(!move_card(
            &mut moved,
            &request("zzz", ("informal", "stakeholders"), ("formal", "issues"))
        ));
        assert!(!move_card(
            &mut moved,
            &request("a", ("informal", "issues"), ("formal", "issues"))
        ));
        assert!(!move_card(
            &mut moved,
            &request("a", ("informal", "stakeholders"), ("formal", "nowhere"))
        ));
        assert!(!move_card(
            &mut moved,
            &request("a", ("informal", "stakeholders"), ("nowhere", "issues"))
        ));
        assert!(!move_card(
            &mut moved,
            &request("a", ("informal", "stakeholders"), ("informal", "stakeholders"))
        ));
        let mut onto_self = request("a", ("informal", "stakeholders"), ("formal", "issues"));
        onto_self.target_card_id = Some("a".to_string());
        assert!(!move_card(&mut moved, &onto_self));

        assert_eq!(moved, rows);
    }

    #[test]
    fn test_move_preserves_cards() {
        let rows = board();
        let moves = [
            request("a", ("informal", "stakeholders"), ("technical", "ideas")),
            request("e", ("formal", "ideas"), ("informal", "stakeholders")),
            request("d", ("informal", "issues"), ("informal", "stakeholders")),
        ];
        let mut moved = rows.clone();
        for mv in &moves {
            assert!(move_card(&mut moved, mv));
        }
        assert_eq!(count_cards(&moved), count_cards(&rows));
        assert_eq!(moved[2].cards["ideas"][0], card("a"));
    }

    #[test]
    fn test_resolve_placement() {
        assert_eq!(resolve_placement(10.0, 0.0, 40.0), Placement::Before);
        assert_eq!(resolve_placement(20.0, 0.0, 40.0), Placement::After);
        assert_eq!(resolve_placement(39.0, 0.0, 40.0), Placement::After);
    }
}
