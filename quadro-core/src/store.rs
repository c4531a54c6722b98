//! Workspace store: the single mutation surface for projects and boards.
//!
//! The store owns the workspace, the undo/redo history of the active project
//! and the storage backend. Every content, metadata and structural change
//! goes through [`WorkspaceStore::update_active_project`], which records
//! history, stamps `updatedAt`, normalizes and persists.

use serde_json::Value;

use crate::config::BoardConfig;
use crate::confirm::{
    ActionOutcome, Choice, Flow, GuardedAction, PendingConfirmations, PendingId, UnsavedDraft,
};
use crate::error::BoardError;
use crate::exchange::{export_project, parse_import, parse_import_text, ExportPayload};
use crate::history::History;
use crate::ids::{generate_id, timestamp_now};
use crate::normalize::{normalize_project, parse_rows_for_template, parse_workspace};
use crate::order::{self, CardMove, CardOrder};
use crate::storage::KeyValueStorage;
use crate::structure::{apply_structure_edit, ensure_structure_editable, reset_structure, StructureEdit};
use crate::template::classic_template;
use crate::types::{Card, CardColor, Project, Slot, Template, Workspace};

/// Name of the project built from a pre-workspace save.
pub const MIGRATED_PROJECT_NAME: &str = "Projeto migrado";

/// Where the workspace came from at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Stored,
    Legacy,
    Default,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateProjectOptions {
    /// Defaults to the classic template.
    pub template: Option<Template>,
    /// Initial rows, validated against the template. Invalid rows are
    /// replaced by an empty board.
    pub rows: Option<Value>,
    pub author: Option<String>,
    pub focal_problem: Option<String>,
}

fn default_workspace(config: &BoardConfig) -> Workspace {
    let mut project = Project::new(config.default_project_name.clone(), classic_template());
    project.author = config.default_author.clone();
    Workspace::with_project(normalize_project(project))
}

fn migrate_legacy(raw: &str, config: &BoardConfig) -> Option<Workspace> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let rows_value = value.get("rows").unwrap_or(&value);
    let template = classic_template();
    let rows = parse_rows_for_template(rows_value, &template)?;

    let mut project = Project::new(MIGRATED_PROJECT_NAME, template);
    project.author = config.default_author.clone();
    project.rows = rows;
    Some(Workspace::with_project(normalize_project(project)))
}

fn read_workspace<S: KeyValueStorage>(storage: &S, config: &BoardConfig) -> (Workspace, LoadSource) {
    match storage.get(&config.workspace_key) {
        Ok(Some(raw)) => {
            let parsed = serde_json::from_str::<Value>(&raw)
                .ok()
                .and_then(|value| parse_workspace(&value));
            return match parsed {
                Some(workspace) => (workspace, LoadSource::Stored),
                None => {
                    log::warn!("[quadro.store.load] Stored workspace is unreadable, starting fresh");
                    (default_workspace(config), LoadSource::Default)
                }
            };
        }
        Ok(None) => {}
        Err(e) => {
            log::warn!("[quadro.store.load] Failed to read workspace: {}", e);
            return (default_workspace(config), LoadSource::Default);
        }
    }

    match storage.get(&config.legacy_key) {
        Ok(Some(raw)) => match migrate_legacy(&raw, config) {
            Some(workspace) => {
                log::info!("[quadro.store.load] Migrated legacy board into a new workspace");
                (workspace, LoadSource::Legacy)
            }
            None => {
                log::warn!("[quadro.store.load] Legacy board is unreadable, starting fresh");
                (default_workspace(config), LoadSource::Default)
            }
        },
        Ok(None) => (default_workspace(config), LoadSource::Default),
        Err(e) => {
            log::warn!("[quadro.store.load] Failed to read legacy board: {}", e);
            (default_workspace(config), LoadSource::Default)
        }
    }
}

pub struct WorkspaceStore<S: KeyValueStorage> {
    storage: S,
    config: BoardConfig,
    workspace: Workspace,
    source: LoadSource,
    history: History<Project>,
    structure_edit_open: bool,
    pending: PendingConfirmations,
}

impl<S: KeyValueStorage> WorkspaceStore<S> {
    /// Load the workspace from storage, migrating or falling back to a fresh
    /// default as needed, and persist the result.
    pub fn load(storage: S, config: BoardConfig) -> Self {
        let (workspace, source) = read_workspace(&storage, &config);
        log::info!(
            "[quadro.store.load] Loaded {} project(s) ({:?})",
            workspace.projects.len(),
            source
        );

        let store = Self {
            history: History::new(config.history_limit),
            storage,
            config,
            workspace,
            source,
            structure_edit_open: false,
            pending: PendingConfirmations::new(),
        };
        store.persist();
        store
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn load_source(&self) -> LoadSource {
        self.source
    }

    pub fn active_project(&self) -> Option<&Project> {
        self.workspace.active_project()
    }

    fn require_active(&self) -> Result<&Project, BoardError> {
        self.workspace
            .active_project()
            .ok_or_else(|| BoardError::ProjectNotFound(self.workspace.active_project_id.clone()))
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn total_cards(&self) -> usize {
        self.active_project().map(Project::card_count).unwrap_or(0)
    }

    /// Serialize the workspace to storage.
    pub fn save(&self) -> Result<(), BoardError> {
        let json = serde_json::to_string_pretty(&self.workspace)?;
        self.storage.set(&self.config.workspace_key, &json)?;
        Ok(())
    }

    /// Save after a committed change. Failures are logged, not surfaced.
    fn persist(&self) {
        if let Err(e) = self.save() {
            log::error!("[quadro.store.save] Failed to persist workspace: {}", e);
        }
    }

    /// History is scoped to the active project.
    fn on_active_changed(&mut self) {
        self.history.reset();
        self.structure_edit_open = false;
    }

    // ── Active project mutations ────────────────────────────────────────────

    /// Apply `updater` to the active project.
    ///
    /// Returns `false` when there is no active project or the update changes
    /// nothing; neither history nor storage is touched in that case.
    pub fn update_active_project<F>(&mut self, updater: F) -> bool
    where
        F: FnOnce(&mut Project),
    {
        let Some(index) = self.workspace.active_index() else {
            return false;
        };
        let before = &self.workspace.projects[index];
        let mut next = before.clone();
        updater(&mut next);
        let mut next = normalize_project(next);
        if next == *before {
            return false;
        }

        next.updated_at = timestamp_now();
        self.history.record(before.clone());
        self.workspace.projects[index] = next;
        self.persist();
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(index) = self.workspace.active_index() else {
            return false;
        };
        let Some(previous) = self.history.undo(&self.workspace.projects[index]) else {
            return false;
        };
        self.workspace.projects[index] = previous;
        self.persist();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(index) = self.workspace.active_index() else {
            return false;
        };
        let Some(next) = self.history.redo(&self.workspace.projects[index]) else {
            return false;
        };
        self.workspace.projects[index] = next;
        self.persist();
        true
    }

    /// Add a card from the composer. Returns its id, or `None` when the slot
    /// does not exist or the content is blank.
    pub fn add_card(&mut self, slot: &Slot, content: &str, color: CardColor) -> Option<String> {
        if content.trim().is_empty() {
            return None;
        }
        let card = Card {
            id: generate_id("card"),
            content: content.to_string(),
            color,
        };
        let card_id = card.id.clone();
        let added = self.update_active_project(|project| {
            if let Some(cards) = project.slot_mut(slot) {
                cards.push(card);
            }
        });
        added.then_some(card_id)
    }

    pub fn update_card_content(&mut self, card_id: &str, content: &str) -> bool {
        self.update_active_project(|project| {
            if let Some(card) = project.card_mut(card_id) {
                card.content = content.to_string();
            }
        })
    }

    pub fn set_card_color(&mut self, card_id: &str, color: CardColor) -> bool {
        self.update_active_project(|project| {
            if let Some(card) = project.card_mut(card_id) {
                card.color = color;
            }
        })
    }

    pub fn delete_card(&mut self, card_id: &str) -> bool {
        self.update_active_project(|project| {
            project.remove_card(card_id);
        })
    }

    /// Commit a drag/drop move. Stale payloads are silent no-ops.
    pub fn move_card(&mut self, request: &CardMove) -> bool {
        self.update_active_project(|project| {
            order::move_card(&mut project.rows, request);
        })
    }

    pub fn apply_card_order(&mut self, card_order: &CardOrder) -> bool {
        self.update_active_project(|project| {
            let rows = std::mem::take(&mut project.rows);
            project.rows = order::apply_card_order(rows, card_order);
        })
    }

    pub fn rename_project(&mut self, name: &str) -> bool {
        self.update_active_project(|project| project.name = name.trim().to_string())
    }

    pub fn set_focal_problem(&mut self, focal_problem: &str) -> bool {
        self.update_active_project(|project| project.focal_problem = focal_problem.to_string())
    }

    pub fn set_author(&mut self, author: &str) -> bool {
        self.update_active_project(|project| project.author = author.trim().to_string())
    }

    // ── Structure editing ───────────────────────────────────────────────────

    /// Open structure edit mode. Refused while the board holds cards.
    pub fn begin_structure_edit(&mut self) -> Result<(), BoardError> {
        ensure_structure_editable(self.require_active()?)?;
        self.structure_edit_open = true;
        Ok(())
    }

    pub fn end_structure_edit(&mut self) {
        self.structure_edit_open = false;
    }

    pub fn is_structure_edit_open(&self) -> bool {
        self.structure_edit_open
    }

    /// Apply one structural edit and reset the board to the rebuilt template.
    pub fn edit_structure(&mut self, edit: &StructureEdit) -> Result<(), BoardError> {
        if !self.structure_edit_open {
            return Err(BoardError::StructureEditClosed);
        }
        let project = self.require_active()?;
        ensure_structure_editable(project)?;
        let template = apply_structure_edit(&project.template, edit)?;

        self.update_active_project(|project| reset_structure(project, template));
        Ok(())
    }

    // ── Project lifecycle ───────────────────────────────────────────────────

    fn append_and_activate(&mut self, project: Project) {
        log::info!(
            "[quadro.store.project] Activating new project {} (v{})",
            project.id,
            project.version
        );
        self.workspace.active_project_id = project.id.clone();
        self.workspace.projects.push(project);
        self.on_active_changed();
        self.persist();
    }

    /// Switch the active project. Unknown ids and the current id are no-ops.
    pub fn select_project(&mut self, project_id: &str) -> bool {
        if self.workspace.project(project_id).is_none() {
            log::debug!("[quadro.store.project] Ignoring unknown project {}", project_id);
            return false;
        }
        if self.workspace.active_project_id == project_id {
            return false;
        }
        self.workspace.active_project_id = project_id.to_string();
        self.on_active_changed();
        self.persist();
        true
    }

    pub fn create_project(&mut self, name: &str, options: CreateProjectOptions) -> Project {
        let name = match name.trim() {
            "" => self.config.default_project_name.clone(),
            name => name.to_string(),
        };
        let mut project = Project::new(name, options.template.unwrap_or_else(classic_template));

        if let Some(rows) = options.rows.as_ref() {
            match parse_rows_for_template(rows, &project.template) {
                Some(rows) => project.rows = rows,
                None => log::warn!(
                    "[quadro.store.project] Initial rows do not fit template {}, starting empty",
                    project.template.id
                ),
            }
        }
        project.author = options
            .author
            .unwrap_or_else(|| self.config.default_author.clone());
        project.focal_problem = options.focal_problem.unwrap_or_default();

        let project = normalize_project(project);
        self.append_and_activate(project.clone());
        project
    }

    /// Clone a project as its next version and activate the copy.
    pub fn duplicate_project_version(&mut self, project_id: &str) -> Option<Project> {
        let source = self.workspace.project(project_id)?.clone();
        let now = timestamp_now();
        let copy = Project {
            id: generate_id("project"),
            version: source.version.saturating_add(1),
            created_at: now.clone(),
            updated_at: now,
            ..source
        };
        self.append_and_activate(copy.clone());
        Some(copy)
    }

    /// Remove the active project and activate the one before it. The last
    /// remaining project cannot be deleted.
    pub fn delete_active_project(&mut self) -> Result<Project, BoardError> {
        if self.workspace.projects.len() <= 1 {
            return Err(BoardError::LastProject);
        }
        let index = self
            .workspace
            .active_index()
            .ok_or_else(|| BoardError::ProjectNotFound(self.workspace.active_project_id.clone()))?;

        let removed = self.workspace.projects.remove(index);
        let next = index.saturating_sub(1);
        self.workspace.active_project_id = self.workspace.projects[next].id.clone();
        log::info!("[quadro.store.project] Deleted project {}", removed.id);

        self.on_active_changed();
        self.persist();
        Ok(removed)
    }

    // ── Import / export ─────────────────────────────────────────────────────

    pub fn export_active_project(&self) -> Result<ExportPayload, BoardError> {
        Ok(export_project(self.require_active()?))
    }

    pub fn export_active_json(&self) -> Result<String, BoardError> {
        Ok(serde_json::to_string_pretty(&self.export_active_project()?)?)
    }

    /// Import a payload as a brand-new active project.
    pub fn import_project_as_new(&mut self, payload: &Value) -> Result<Project, BoardError> {
        let imported = parse_import(payload, self.require_active()?)?;
        let project = imported.into_new_project();
        self.append_and_activate(project.clone());
        Ok(project)
    }

    /// Replace the active project's content with a payload (undoable).
    pub fn import_project_overwrite(&mut self, payload: &Value) -> Result<bool, BoardError> {
        let imported = parse_import(payload, self.require_active()?)?;
        Ok(self.update_active_project(|project| imported.overwrite(project)))
    }

    pub fn import_text_as_new(&mut self, text: &str) -> Result<Project, BoardError> {
        let imported = parse_import_text(text, self.require_active()?)?;
        let project = imported.into_new_project();
        self.append_and_activate(project.clone());
        Ok(project)
    }

    pub fn import_text_overwrite(&mut self, text: &str) -> Result<bool, BoardError> {
        let imported = parse_import_text(text, self.require_active()?)?;
        Ok(self.update_active_project(|project| imported.overwrite(project)))
    }

    // ── Confirmations ───────────────────────────────────────────────────────

    /// Run `action` now, or park it until the user decides what to do with
    /// `draft`.
    pub fn request(
        &mut self,
        action: GuardedAction,
        draft: Option<UnsavedDraft>,
    ) -> Result<Flow, BoardError> {
        match draft {
            Some(draft) => Ok(Flow::Pending(self.pending.park(action, draft))),
            None => Ok(Flow::Completed(self.run_action(action)?)),
        }
    }

    /// Resume a parked action with the user's choice.
    pub fn resolve(&mut self, id: PendingId, choice: Choice) -> Result<ActionOutcome, BoardError> {
        let (action, draft) = self
            .pending
            .take(id)
            .ok_or(BoardError::PendingNotFound(id.0))?;

        match choice {
            Choice::Cancel => Ok(ActionOutcome::Cancelled),
            Choice::Discard => self.run_action(action),
            Choice::Save => {
                self.check_action(&action)?;
                self.commit_draft(draft);
                self.run_action(action)
            }
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Fail the same way `run_action` would, without touching anything.
    fn check_action(&self, action: &GuardedAction) -> Result<(), BoardError> {
        match action {
            GuardedAction::SelectProject(_) | GuardedAction::CreateProject { .. } => Ok(()),
            GuardedAction::ImportAsNew(payload) => {
                parse_import(payload, self.require_active()?).map(|_| ())
            }
            GuardedAction::DeleteActiveProject => {
                if self.workspace.projects.len() <= 1 {
                    return Err(BoardError::LastProject);
                }
                self.require_active().map(|_| ())
            }
        }
    }

    fn commit_draft(&mut self, draft: UnsavedDraft) {
        match draft.card_id {
            Some(card_id) => {
                self.update_active_project(|project| {
                    if let Some(card) = project.card_mut(&card_id) {
                        card.content = draft.content;
                        card.color = draft.color;
                    }
                });
            }
            None => {
                self.add_card(&draft.slot, &draft.content, draft.color);
            }
        }
    }

    fn run_action(&mut self, action: GuardedAction) -> Result<ActionOutcome, BoardError> {
        match action {
            GuardedAction::SelectProject(id) => Ok(ActionOutcome::Selected(self.select_project(&id))),
            GuardedAction::CreateProject { name, options } => {
                Ok(ActionOutcome::Created(self.create_project(&name, options)))
            }
            GuardedAction::ImportAsNew(payload) => {
                Ok(ActionOutcome::Imported(self.import_project_as_new(&payload)?))
            }
            GuardedAction::DeleteActiveProject => {
                Ok(ActionOutcome::Deleted(self.delete_active_project()?))
            }
        }
    }
}
