/// Structural edits of a project's template.
///
/// Edits are only allowed on a board without cards. Each edit recomputes the
/// full column-label and layer lists and rebuilds a custom template from
/// them; the board is then reset to empty rows for the new template. No
/// partially edited template is ever stored.
use serde::{Deserialize, Serialize};

use crate::error::BoardError;
use crate::template::{create_custom_template, LayerDef};
use crate::types::{empty_rows, Project, Template};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StructureEdit {
    RenameColumn { index: usize, label: String },
    RenameLayer { index: usize, label: String },
    DescribeLayer { index: usize, description: String },
    AddColumn { label: String },
    RemoveColumn { index: usize },
    AddLayer { label: String, description: String },
    RemoveLayer { index: usize },
    MoveColumn { from: usize, to: usize },
    MoveLayer { from: usize, to: usize },
}

/// Gate for structure edit mode: refuses while any card exists.
pub fn ensure_structure_editable(project: &Project) -> Result<(), BoardError> {
    match project.card_count() {
        0 => Ok(()),
        cards => Err(BoardError::StructureLocked { cards }),
    }
}

fn checked_index(index: usize, len: usize) -> Result<usize, BoardError> {
    if index < len {
        Ok(index)
    } else {
        Err(BoardError::StructureIndex { index, len })
    }
}

fn non_empty(label: &str) -> Result<String, BoardError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(BoardError::EmptyLabel);
    }
    Ok(label.to_string())
}

fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), BoardError> {
    let len = items.len();
    checked_index(from, len)?;
    checked_index(to, len)?;
    let item = items.remove(from);
    items.insert(to, item);
    Ok(())
}

/// Compute the template that results from `edit`, without touching any
/// project. Fails before producing anything when the edit is not allowed.
pub fn apply_structure_edit(template: &Template, edit: &StructureEdit) -> Result<Template, BoardError> {
    let mut columns: Vec<String> = template.columns.iter().map(|c| c.label.clone()).collect();
    let mut layers: Vec<LayerDef> = template
        .layers
        .iter()
        .map(|l| LayerDef::new(l.label.clone(), l.description.clone()))
        .collect();

    match edit {
        StructureEdit::RenameColumn { index, label } => {
            let index = checked_index(*index, columns.len())?;
            // An empty label drops the column during normalization.
            columns[index] = label.trim().to_string();
        }
        StructureEdit::RenameLayer { index, label } => {
            let index = checked_index(*index, layers.len())?;
            layers[index].label = non_empty(label)?;
        }
        StructureEdit::DescribeLayer { index, description } => {
            let index = checked_index(*index, layers.len())?;
            layers[index].description = description.trim().to_string();
        }
        StructureEdit::AddColumn { label } => columns.push(non_empty(label)?),
        StructureEdit::RemoveColumn { index } => {
            if columns.len() <= 1 {
                return Err(BoardError::LastColumn);
            }
            let index = checked_index(*index, columns.len())?;
            columns.remove(index);
        }
        StructureEdit::AddLayer { label, description } => {
            layers.push(LayerDef::new(non_empty(label)?, description.trim()));
        }
        StructureEdit::RemoveLayer { index } => {
            if layers.len() <= 1 {
                return Err(BoardError::LastLayer);
            }
            let index = checked_index(*index, layers.len())?;
            layers.remove(index);
        }
        StructureEdit::MoveColumn { from, to } => move_item(&mut columns, *from, *to)?,
        StructureEdit::MoveLayer { from, to } => move_item(&mut layers, *from, *to)?,
    }

    create_custom_template(&template.name, &columns, &layers).ok_or(BoardError::InvalidTemplate)
}

/// Install `template` on `project` with a fresh empty board.
pub fn reset_structure(project: &mut Project, template: Template) {
    project.rows = empty_rows(&template);
    project.template_id = template.id.clone();
    project.template = template;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::classic_template;
    use crate::types::{Card, CardColor, Slot};

    fn labels(template: &Template) -> Vec<&str> {
        template.columns.iter().map(|c| c.label.as_str()).collect()
    }

    #[test]
    fn test_gate_refuses_with_cards() {
        let mut project = Project::new("P", classic_template());
        assert!(ensure_structure_editable(&project).is_ok());

        project
            .slot_mut(&Slot::new("informal", "ideas"))
            .unwrap()
            .push(Card {
                id: "c".to_string(),
                content: "x".to_string(),
                color: CardColor::Yellow,
            });
        assert!(matches!(
            ensure_structure_editable(&project),
            Err(BoardError::StructureLocked { cards: 1 })
        ));
    }

    #[test]
    fn test_rename_and_add_column() {
        let classic = classic_template();
        let renamed = apply_structure_edit(
            &classic,
            &StructureEdit::RenameColumn {
                index: 1,
                label: "Dores".to_string(),
            },
        )
        .unwrap();
        assert_eq!(labels(&renamed), vec!["Partes Interessadas", "Dores", "Ideias e Soluções"]);
        assert_eq!(renamed.columns[1].id, "dores");
        assert!(renamed.id.starts_with("custom-"));
        assert_eq!(renamed.name, classic.name);

        let added = apply_structure_edit(
            &renamed,
            &StructureEdit::AddColumn {
                label: "Riscos".to_string(),
            },
        )
        .unwrap();
        assert_eq!(added.columns.len(), 4);
        assert_eq!(added.layers, renamed.layers);
    }

    #[test]
    fn test_layer_edits() {
        let classic = classic_template();
        let described = apply_structure_edit(
            &classic,
            &StructureEdit::DescribeLayer {
                index: 0,
                description: "Cultura".to_string(),
            },
        )
        .unwrap();
        assert_eq!(described.layers[0].description, "Cultura");

        let added = apply_structure_edit(
            &described,
            &StructureEdit::AddLayer {
                label: "Externo".to_string(),
                description: String::new(),
            },
        )
        .unwrap();
        assert_eq!(added.layers.len(), 4);

        let moved = apply_structure_edit(&added, &StructureEdit::MoveLayer { from: 3, to: 0 }).unwrap();
        assert_eq!(moved.layers[0].label, "Externo");

        let removed = apply_structure_edit(&moved, &StructureEdit::RemoveLayer { index: 0 }).unwrap();
        assert_eq!(removed.layers.len(), 3);
        assert_eq!(removed.layers[0].id, "informal");
    }

    #[test]
    fn test_rejections() {
        let classic = classic_template();
        assert!(matches!(
            apply_structure_edit(
                &classic,
                &StructureEdit::RenameLayer {
                    index: 0,
                    label: "  ".to_string()
                }
            ),
            Err(BoardError::EmptyLabel)
        ));
        assert!(matches!(
            apply_structure_edit(&classic, &StructureEdit::RemoveColumn { index: 7 }),
            Err(BoardError::StructureIndex { index: 7, len: 3 })
        ));
        assert!(matches!(
            apply_structure_edit(&classic, &StructureEdit::MoveColumn { from: 0, to: 3 }),
            Err(BoardError::StructureIndex { .. })
        ));

        let mut single = classic.clone();
        single.columns.truncate(1);
        single.layers.truncate(1);
        assert!(matches!(
            apply_structure_edit(&single, &StructureEdit::RemoveColumn { index: 0 }),
            Err(BoardError::LastColumn)
        ));
        assert!(matches!(
            apply_structure_edit(&single, &StructureEdit::RemoveLayer { index: 0 }),
            Err(BoardError::LastLayer)
        ));
        assert!(matches!(
            apply_structure_edit(
                &single,
                &StructureEdit::RenameColumn {
                    index: 0,
                    label: String::new()
                }
            ),
            Err(BoardError::InvalidTemplate)
        ));
    }

    #[test]
    fn test_empty_column_rename_drops_column() {
        let classic = classic_template();
        let edited = apply_structure_edit(
            &classic,
            &StructureEdit::RenameColumn {
                index: 0,
                label: " ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(labels(&edited), vec!["Problemas e Questões", "Ideias e Soluções"]);
    }

    #[test]
    fn test_reset_structure() {
        let mut project = Project::new("P", classic_template());
        let template = apply_structure_edit(
            &project.template,
            &StructureEdit::AddColumn {
                label: "Riscos".to_string(),
            },
        )
        .unwrap();
        reset_structure(&mut project, template.clone());

        assert_eq!(project.template_id, template.id);
        assert_eq!(project.rows.len(), 3);
        assert!(project.rows.iter().all(|row| row.cards.len() == 4 && row.card_count() == 0));
    }

    #[test]
    fn test_edit_serde_tag() {
        let edit: StructureEdit =
            serde_json::from_str(r#"{ "kind": "removeColumn", "index": 2 }"#).unwrap();
        assert_eq!(edit, StructureEdit::RemoveColumn { index: 2 });
    }
}
