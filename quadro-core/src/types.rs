use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::{generate_id, timestamp_now};

/// Post-it colors offered by the composer. Serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    #[default]
    Yellow,
    Pink,
    Blue,
    Green,
    Orange,
    Purple,
}

impl CardColor {
    pub const ALL: [CardColor; 6] = [
        CardColor::Yellow,
        CardColor::Pink,
        CardColor::Blue,
        CardColor::Green,
        CardColor::Orange,
        CardColor::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardColor::Yellow => "yellow",
            CardColor::Pink => "pink",
            CardColor::Blue => "blue",
            CardColor::Green => "green",
            CardColor::Orange => "orange",
            CardColor::Purple => "purple",
        }
    }

    /// Look up a color by its serialized name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    /// Rich text as produced by the editor widget (HTML markup).
    pub content: String,
    #[serde(default)]
    pub color: CardColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// Board structure: ordered columns × ordered layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub columns: Vec<Column>,
    pub layers: Vec<Layer>,
}

impl Template {
    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }
}

/// Address of one column-slot on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub layer_id: String,
    pub column_id: String,
}

impl Slot {
    pub fn new(layer_id: impl Into<String>, column_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            column_id: column_id.into(),
        }
    }
}

/// Board content of one layer. Label and description are copies of the
/// template layer and are re-derived on every normalization pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub layer_id: String,
    #[serde(default)]
    pub layer_label: String,
    #[serde(default)]
    pub layer_description: String,
    #[serde(default)]
    pub cards: BTreeMap<String, Vec<Card>>,
}

impl Row {
    /// An empty row for `layer` with one card list per template column.
    pub fn empty(layer: &Layer, template: &Template) -> Self {
        Self {
            layer_id: layer.id.clone(),
            layer_label: layer.label.clone(),
            layer_description: layer.description.clone(),
            cards: template
                .columns
                .iter()
                .map(|column| (column.id.clone(), Vec::new()))
                .collect(),
        }
    }

    pub fn card_count(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }
}

/// A fresh board for `template`: one empty row per layer.
pub fn empty_rows(template: &Template) -> Vec<Row> {
    template
        .layers
        .iter()
        .map(|layer| Row::empty(layer, template))
        .collect()
}

pub fn count_cards(rows: &[Row]) -> usize {
    rows.iter().map(Row::card_count).sum()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub focal_problem: String,
    pub author: String,
    pub version: u32,
    pub created_at: String,
    pub updated_at: String,
    pub template_id: String,
    /// Embedded snapshot, so older versions stay self-describing.
    pub template: Template,
    pub rows: Vec<Row>,
}

impl Project {
    /// New version-1 project with an empty board for `template`.
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        let now = timestamp_now();
        Self {
            id: generate_id("project"),
            name: name.into(),
            focal_problem: String::new(),
            author: String::new(),
            version: 1,
            created_at: now.clone(),
            updated_at: now,
            template_id: template.id.clone(),
            rows: empty_rows(&template),
            template,
        }
    }

    pub fn card_count(&self) -> usize {
        count_cards(&self.rows)
    }

    pub fn slot(&self, slot: &Slot) -> Option<&Vec<Card>> {
        self.rows
            .iter()
            .find(|row| row.layer_id == slot.layer_id)
            .and_then(|row| row.cards.get(&slot.column_id))
    }

    pub fn slot_mut(&mut self, slot: &Slot) -> Option<&mut Vec<Card>> {
        self.rows
            .iter_mut()
            .find(|row| row.layer_id == slot.layer_id)
            .and_then(|row| row.cards.get_mut(&slot.column_id))
    }

    /// Find a card and the slot that owns it.
    pub fn find_card(&self, card_id: &str) -> Option<(Slot, &Card)> {
        self.rows.iter().find_map(|row| {
            row.cards.iter().find_map(|(column_id, cards)| {
                cards
                    .iter()
                    .find(|card| card.id == card_id)
                    .map(|card| (Slot::new(row.layer_id.clone(), column_id.clone()), card))
            })
        })
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.rows
            .iter_mut()
            .flat_map(|row| row.cards.values_mut())
            .flat_map(|cards| cards.iter_mut())
            .find(|card| card.id == card_id)
    }

    pub fn remove_card(&mut self, card_id: &str) -> Option<Card> {
        for cards in self.rows.iter_mut().flat_map(|row| row.cards.values_mut()) {
            if let Some(index) = cards.iter().position(|card| card.id == card_id) {
                return Some(cards.remove(index));
            }
        }
        None
    }
}

/// Top-level persisted aggregate. Never holds zero projects once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub active_project_id: String,
    pub projects: Vec<Project>,
}

impl Workspace {
    pub fn with_project(project: Project) -> Self {
        Self {
            active_project_id: project.id.clone(),
            projects: vec![project],
        }
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn active_index(&self) -> Option<usize> {
        self.projects
            .iter()
            .position(|p| p.id == self.active_project_id)
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.project(&self.active_project_id)
    }
}
