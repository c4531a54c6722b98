/// Import/export document for a single project.
///
/// Exports always carry the current schema. Imports accept any older export
/// or a bare row array; every field is type-checked on its own and falls back
/// to the current project's value when missing or mistyped.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BoardError;
use crate::ids::{generate_id, timestamp_now};
use crate::normalize::{normalize_project, parse_rows_for_template, parse_version};
use crate::order::{apply_card_order, build_card_order, parse_card_order, CardOrder};
use crate::template::{builtin_template, normalize_template};
use crate::types::{Project, Row, Template};

pub const EXPORT_APP_ID: &str = "quadro-de-avaliacao";
pub const EXPORT_SCHEMA_VERSION: u32 = 4;
/// First schema version whose exports carry `cardOrder`.
pub const CARD_ORDER_SCHEMA_VERSION: u64 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub app: String,
    pub schema_version: u32,
    pub exported_at: String,
    pub project_id: String,
    pub project_name: String,
    pub focal_problem: String,
    pub author: String,
    pub project_version: u32,
    pub template_id: String,
    pub template: Template,
    pub rows: Vec<Row>,
    pub card_order: CardOrder,
}

pub fn export_project(project: &Project) -> ExportPayload {
    ExportPayload {
        app: EXPORT_APP_ID.to_string(),
        schema_version: EXPORT_SCHEMA_VERSION,
        exported_at: timestamp_now(),
        project_id: project.id.clone(),
        project_name: project.name.clone(),
        focal_problem: project.focal_problem.clone(),
        author: project.author.clone(),
        project_version: project.version,
        template_id: project.template_id.clone(),
        template: project.template.clone(),
        rows: project.rows.clone(),
        card_order: build_card_order(&project.rows),
    }
}

pub fn export_project_json(project: &Project) -> Result<String, BoardError> {
    Ok(serde_json::to_string_pretty(&export_project(project))?)
}

/// Validated content of an import, not yet bound to a project id.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedProject {
    pub name: String,
    pub focal_problem: String,
    pub author: String,
    pub version: u32,
    pub template: Template,
    pub rows: Vec<Row>,
}

impl ImportedProject {
    /// A brand-new project holding the imported content.
    pub fn into_new_project(self) -> Project {
        let now = timestamp_now();
        normalize_project(Project {
            id: generate_id("project"),
            name: self.name,
            focal_problem: self.focal_problem,
            author: self.author,
            version: self.version,
            created_at: now.clone(),
            updated_at: now,
            template_id: self.template.id.clone(),
            template: self.template,
            rows: self.rows,
        })
    }

    /// Replace `project`'s content, keeping its id and creation time.
    pub fn overwrite(self, project: &mut Project) {
        project.name = self.name;
        project.focal_problem = self.focal_problem;
        project.author = self.author;
        project.version = self.version;
        project.template_id = self.template.id.clone();
        project.template = self.template;
        project.rows = self.rows;
    }
}

fn rejected(reason: impl Into<String>) -> BoardError {
    BoardError::ImportRejected(reason.into())
}

fn text_or(map: &Map<String, Value>, key: &str, fallback: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

/// Parse import file text.
pub fn parse_import_text(text: &str, current: &Project) -> Result<ImportedProject, BoardError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| rejected(format!("not valid JSON ({})", e)))?;
    parse_import(&value, current)
}

/// Validate an import payload against the current project.
pub fn parse_import(value: &Value, current: &Project) -> Result<ImportedProject, BoardError> {
    match value {
        Value::Array(_) => {
            let rows = parse_rows_for_template(value, &current.template)
                .ok_or_else(|| rejected("rows do not match the current board"))?;
            Ok(ImportedProject {
                name: current.name.clone(),
                focal_problem: current.focal_problem.clone(),
                author: current.author.clone(),
                version: current.version,
                template: current.template.clone(),
                rows,
            })
        }
        Value::Object(map) => parse_full_payload(map, current),
        _ => Err(rejected("expected an export document or a row list")),
    }
}

fn parse_full_payload(map: &Map<String, Value>, current: &Project) -> Result<ImportedProject, BoardError> {
    if let Some(app) = map.get("app") {
        if app.as_str() != Some(EXPORT_APP_ID) {
            return Err(rejected(format!("file belongs to another application ({})", app)));
        }
    }
    let rows_value = map
        .get("rows")
        .ok_or_else(|| rejected("document has no rows"))?;

    let template = map
        .get("template")
        .and_then(normalize_template)
        .or_else(|| {
            map.get("templateId")
                .and_then(Value::as_str)
                .and_then(builtin_template)
        })
        .unwrap_or_else(|| current.template.clone());

    let mut rows = parse_rows_for_template(rows_value, &template)
        .ok_or_else(|| rejected("rows do not match the document template"))?;

    let schema = map
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if schema >= CARD_ORDER_SCHEMA_VERSION {
        if let Some(order) = map.get("cardOrder").and_then(parse_card_order) {
            rows = apply_card_order(rows, &order);
        }
    }

    Ok(ImportedProject {
        name: text_or(map, "projectName", &current.name),
        focal_problem: text_or(map, "focalProblem", &current.focal_problem),
        author: text_or(map, "author", &current.author),
        version: map
            .get("projectVersion")
            .and_then(parse_version)
            .unwrap_or(current.version),
        template,
        rows,
    })
}
