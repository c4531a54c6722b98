use crate::storage::StorageError;

/// Refusals and failures surfaced by the store.
///
/// Every variant is raised before any mutation is applied, so the workspace
/// stays in its last valid state.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Template is invalid: it needs a name, at least one column and one layer")]
    InvalidTemplate,

    #[error("Structure cannot be edited while the board holds {cards} card(s)")]
    StructureLocked { cards: usize },

    #[error("Structure edit mode is not open")]
    StructureEditClosed,

    #[error("The board must keep at least one column")]
    LastColumn,

    #[error("The board must keep at least one layer")]
    LastLayer,

    #[error("Label must not be empty")]
    EmptyLabel,

    #[error("Index {index} out of range (board has {len})")]
    StructureIndex { index: usize, len: usize },

    #[error("The workspace must keep at least one project")]
    LastProject,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Import rejected: {0}")]
    ImportRejected(String),

    #[error("No pending confirmation with id {0}")]
    PendingNotFound(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
