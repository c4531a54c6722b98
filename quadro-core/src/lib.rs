//! Workspace, project and board state engine for the evaluation board.
//!
//! The crate owns the data model (templates, rows, cards, projects), the
//! normalization of persisted and imported JSON, card ordering, structural
//! template edits and undo/redo. Rendering and dialogs live in the host.

pub mod config;
pub mod confirm;
pub mod error;
pub mod exchange;
pub mod history;
pub mod ids;
pub mod normalize;
pub mod order;
pub mod storage;
pub mod store;
pub mod structure;
pub mod template;
pub mod types;

pub use config::BoardConfig;
pub use error::BoardError;
pub use store::{CreateProjectOptions, LoadSource, WorkspaceStore};
pub use types::{Card, CardColor, Column, Layer, Project, Row, Slot, Template, Workspace};
