//! Repair of persisted and imported data into the current schema.
//!
//! Nothing here panics or errors on malformed input: parsers return `None`
//! and the caller picks a safe fallback. The template embedded in a project
//! is the source of truth for its rows.

pub mod legacy;
pub mod rows;

pub use legacy::parse_legacy_rows;
pub use rows::{normalize_row, parse_board_rows, parse_card, parse_cards, parse_rows_for_template};

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use crate::ids::{generate_id, timestamp_now};
use crate::template::{builtin_template, classic_template, normalize_template, CLASSIC_TEMPLATE_ID};
use crate::types::{empty_rows, Project, Row, Template, Workspace};

/// Name given to projects whose name is blank.
pub const UNTITLED_PROJECT_NAME: &str = "Projeto sem título";

pub(crate) fn text_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// A positive integer version. Fractions are floored; anything below 1,
/// non-finite or non-numeric is rejected.
pub(crate) fn parse_version(value: &Value) -> Option<u32> {
    let number = value.as_f64()?;
    if !number.is_finite() || number < 1.0 {
        return None;
    }
    Some(number.floor().min(u32::MAX as f64) as u32)
}

/// Run a typed template back through validation; classic if it fails.
fn repair_template(template: Template) -> Template {
    serde_json::to_value(&template)
        .ok()
        .and_then(|value| normalize_template(&value))
        .unwrap_or_else(|| {
            log::warn!(
                "[quadro.normalize] Embedded template {} is invalid, using classic",
                template.id
            );
            classic_template()
        })
}

/// Typed repair pass over a project.
///
/// Rows follow the template: one per layer in template order, labels copied
/// from the layer, one card list per column. Rows and card lists the template
/// does not know are dropped. Duplicate or blank card ids get fresh ids.
/// Idempotent.
pub fn normalize_project(project: Project) -> Project {
    let Project {
        id,
        name,
        focal_problem,
        author,
        version,
        created_at,
        updated_at,
        template,
        rows,
        ..
    } = project;

    let template = repair_template(template);

    let mut by_layer: HashMap<String, Row> = HashMap::new();
    for row in rows {
        by_layer.entry(row.layer_id.clone()).or_insert(row);
    }

    let mut seen_ids: HashSet<String> = HashSet::new();
    let rows = template
        .layers
        .iter()
        .map(|layer| {
            let mut source = by_layer
                .remove(&layer.id)
                .map(|row| row.cards)
                .unwrap_or_default();
            let mut cards = BTreeMap::new();
            for column in &template.columns {
                let mut list = source.remove(&column.id).unwrap_or_default();
                for card in &mut list {
                    if card.id.trim().is_empty() || !seen_ids.insert(card.id.clone()) {
                        card.id = generate_id("card");
                        seen_ids.insert(card.id.clone());
                    }
                }
                cards.insert(column.id.clone(), list);
            }
            Row {
                layer_id: layer.id.clone(),
                layer_label: layer.label.clone(),
                layer_description: layer.description.clone(),
                cards,
            }
        })
        .collect();

    Project {
        id: if id.trim().is_empty() {
            generate_id("project")
        } else {
            id
        },
        name: if name.trim().is_empty() {
            UNTITLED_PROJECT_NAME.to_string()
        } else {
            name
        },
        focal_problem,
        author,
        version: version.max(1),
        created_at,
        updated_at,
        template_id: template.id.clone(),
        template,
        rows,
    }
}

/// Rows of a persisted project, matched to the template by `layerId`.
fn parse_project_rows(value: Option<&Value>, template: &Template) -> Vec<Row> {
    let Some(items) = value.and_then(Value::as_array) else {
        return empty_rows(template);
    };

    let keyed = items
        .iter()
        .any(|item| item.get("layerId").and_then(Value::as_str).is_some());
    if !keyed {
        if template.id == CLASSIC_TEMPLATE_ID {
            if let Some(rows) = value.and_then(parse_legacy_rows) {
                return rows;
            }
        }
        if !items.is_empty() {
            log::warn!("[quadro.normalize] Unrecognized row layout, starting with an empty board");
        }
        return empty_rows(template);
    }

    let mut by_layer: HashMap<&str, &Value> = HashMap::new();
    for item in items {
        if let Some(layer_id) = item.get("layerId").and_then(Value::as_str) {
            by_layer.entry(layer_id).or_insert(item);
        }
    }

    template
        .layers
        .iter()
        .map(|layer| match by_layer.get(layer.id.as_str()) {
            Some(item) => normalize_row(item, layer, template),
            None => Row::empty(layer, template),
        })
        .collect()
}

/// Parse a persisted project of unknown shape. `None` only for non-objects.
pub fn parse_project(value: &Value) -> Option<Project> {
    let map = value.as_object()?;

    let template = map
        .get("template")
        .and_then(normalize_template)
        .or_else(|| text_field(map, "templateId").and_then(builtin_template))
        .unwrap_or_else(classic_template);
    let rows = parse_project_rows(map.get("rows"), &template);

    let text = |key: &str| text_field(map, key).unwrap_or("").to_string();
    let timestamp = |key: &str| {
        text_field(map, key)
            .filter(|ts| !ts.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(timestamp_now)
    };

    let project = Project {
        id: text("id"),
        name: text("name"),
        focal_problem: text("focalProblem"),
        author: text("author"),
        version: map.get("version").and_then(parse_version).unwrap_or(1),
        created_at: timestamp("createdAt"),
        updated_at: timestamp("updatedAt"),
        template_id: template.id.clone(),
        template,
        rows,
    };
    Some(normalize_project(project))
}

/// Parse a persisted workspace. `None` when no project survives.
pub fn parse_workspace(value: &Value) -> Option<Workspace> {
    let map = value.as_object()?;
    let items = map.get("projects")?.as_array()?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut projects = Vec::with_capacity(items.len());
    for item in items {
        match parse_project(item) {
            Some(project) if seen.insert(project.id.clone()) => projects.push(project),
            Some(project) => log::warn!(
                "[quadro.normalize] Skipping duplicate project id {}",
                project.id
            ),
            None => log::warn!("[quadro.normalize] Skipping unreadable project entry"),
        }
    }

    let first_id = projects.first()?.id.clone();
    let active_project_id = text_field(map, "activeProjectId")
        .filter(|id| projects.iter().any(|p| p.id == *id))
        .map(str::to_string)
        .unwrap_or(first_id);

    Some(Workspace {
        active_project_id,
        projects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::simple_template;
    use crate::types::{Card, CardColor, Slot};
    use serde_json::json;

    fn card(id: &str, content: &str) -> Card {
        Card {
            id: id.to_string(),
            content: content.to_string(),
            color: CardColor::Green,
        }
    }

    #[test]
    fn test_normalize_project_rederives_from_template() {
        let mut project = Project::new("P", classic_template());
        project.rows[0].layer_label = "stale".to_string();
        project.rows[0].cards.insert("gone".to_string(), vec![card("g", "x")]);
        project.rows[0].cards.remove("ideas");
        project.rows.swap(0, 2);
        project.rows.push(Row {
            layer_id: "phantom".to_string(),
            layer_label: String::new(),
            layer_description: String::new(),
            cards: BTreeMap::new(),
        });
        project.version = 0;
        project.name = "  ".to_string();

        let fixed = normalize_project(project);
        assert_eq!(fixed.rows.len(), 3);
        assert_eq!(fixed.rows[0].layer_id, "informal");
        assert_eq!(fixed.rows[0].layer_label, "Informal");
        assert!(fixed.rows[0].cards.contains_key("ideas"));
        assert!(!fixed.rows[0].cards.contains_key("gone"));
        assert_eq!(fixed.version, 1);
        assert_eq!(fixed.name, UNTITLED_PROJECT_NAME);
    }

    #[test]
    fn test_normalize_project_is_idempotent() {
        let mut project = Project::new("P", classic_template());
        let slot = Slot::new("informal", "issues");
        project.slot_mut(&slot).unwrap().extend([card("a", "1"), card("a", "2"), card("", "3")]);

        let once = normalize_project(project);
        let twice = normalize_project(once.clone());
        assert_eq!(once, twice);

        let ids: HashSet<&str> = once.slot(&slot).unwrap().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_parse_project_round_trip() {
        let mut project = Project::new("Escola", classic_template());
        project.author = "Ana".to_string();
        project
            .slot_mut(&Slot::new("technical", "ideas"))
            .unwrap()
            .push(card("c1", "<b>App</b>"));
        let project = normalize_project(project);

        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(parse_project(&value), Some(project));
    }

    #[test]
    fn test_parse_project_defaults() {
        let project = parse_project(&json!({ "version": -3, "templateId": "simple", "rows": "x" })).unwrap();
        assert_eq!(project.version, 1);
        assert_eq!(project.template, simple_template());
        assert_eq!(project.rows.len(), 1);
        assert!(!project.id.is_empty());
        assert_eq!(project.focal_problem, "");
        assert_eq!(project.name, UNTITLED_PROJECT_NAME);

        let project = parse_project(&json!({ "version": 2.7 })).unwrap();
        assert_eq!(project.version, 2);
        assert_eq!(project.template_id, "classic");

        assert!(parse_project(&json!("project")).is_none());
    }

    #[test]
    fn test_parse_project_legacy_rows() {
        let project = parse_project(&json!({
            "id": "old",
            "name": "Antigo",
            "rows": [
                { "layer": "Informal", "cards": { "stakeholders": ["Pais"] } },
                { "layer": "Formal", "cards": {} },
                { "layer": "Técnico", "cards": {} }
            ]
        }))
        .unwrap();
        assert_eq!(project.card_count(), 1);
        assert_eq!(project.rows[0].cards["stakeholders"][0].content, "Pais");
    }

    #[test]
    fn test_parse_workspace() {
        let a = Project::new("A", classic_template());
        let b = Project::new("B", simple_template());
        let value = json!({
            "activeProjectId": b.id,
            "projects": [a, b, "garbage", a]
        });

        let workspace = parse_workspace(&value).unwrap();
        assert_eq!(workspace.projects.len(), 2);
        assert_eq!(workspace.active_project_id, b.id);
    }

    #[test]
    fn test_parse_workspace_fixes_active_pointer() {
        let a = Project::new("A", classic_template());
        let workspace = parse_workspace(&json!({
            "activeProjectId": "missing",
            "projects": [a]
        }))
        .unwrap();
        assert_eq!(workspace.active_project_id, a.id);
    }

    #[test]
    fn test_parse_workspace_rejects_empty() {
        assert!(parse_workspace(&json!({ "projects": [] })).is_none());
        assert!(parse_workspace(&json!({ "projects": [1, 2] })).is_none());
        assert!(parse_workspace(&json!([])).is_none());
    }
}
