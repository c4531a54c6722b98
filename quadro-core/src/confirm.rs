/// "Unsaved changes" confirmations.
///
/// An action that would leave the active project while the editor holds an
/// uncommitted draft is parked under a [`PendingId`]. The host shows its
/// save / discard / cancel dialog and later resumes the action with the
/// user's [`Choice`].
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::CreateProjectOptions;
use crate::types::{CardColor, Project, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Save,
    Discard,
    Cancel,
}

/// Editor content not yet committed to the board. `card_id` is set when an
/// existing card is being edited, `None` for a new card in the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedDraft {
    pub slot: Slot,
    pub card_id: Option<String>,
    pub content: String,
    pub color: CardColor,
}

/// Operations that change the active project and therefore need the draft
/// resolved first.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardedAction {
    SelectProject(String),
    CreateProject {
        name: String,
        options: CreateProjectOptions,
    },
    ImportAsNew(Value),
    DeleteActiveProject,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// `true` when the active project changed.
    Selected(bool),
    Created(Project),
    Imported(Project),
    Deleted(Project),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Completed(ActionOutcome),
    Pending(PendingId),
}

#[derive(Debug, Default)]
pub struct PendingConfirmations {
    next_id: u64,
    pending: HashMap<PendingId, (GuardedAction, UnsavedDraft)>,
}

impl PendingConfirmations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn park(&mut self, action: GuardedAction, draft: UnsavedDraft) -> PendingId {
        self.next_id += 1;
        let id = PendingId(self.next_id);
        self.pending.insert(id, (action, draft));
        id
    }

    pub fn take(&mut self, id: PendingId) -> Option<(GuardedAction, UnsavedDraft)> {
        self.pending.remove(&id)
    }

    pub fn contains(&self, id: PendingId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> UnsavedDraft {
        UnsavedDraft {
            slot: Slot::new("informal", "ideas"),
            card_id: None,
            content: "rascunho".to_string(),
            color: CardColor::Green,
        }
    }

    #[test]
    fn test_park_and_take() {
        let mut pending = PendingConfirmations::new();
        let first = pending.park(GuardedAction::DeleteActiveProject, draft());
        let second = pending.park(GuardedAction::SelectProject("p".to_string()), draft());
        assert_ne!(first, second);
        assert_eq!(pending.len(), 2);

        let (action, _) = pending.take(second).unwrap();
        assert_eq!(action, GuardedAction::SelectProject("p".to_string()));
        assert!(pending.take(second).is_none());
        assert!(pending.contains(first));
    }

    #[test]
    fn test_choice_serde() {
        let choice: Choice = serde_json::from_str("\"discard\"").unwrap();
        assert_eq!(choice, Choice::Discard);
    }
}
