//! Gesture-to-intent translators.
//!
//! Each translator picks its targets out of an inserted fragment and binds a named handler type
//! to each target. Bindings go through keyed listeners or controller replacement, so binding the
//! same element twice leaves one live handler.

pub(crate) mod edit;
pub(crate) mod reorder;
pub(crate) mod tree;
pub(crate) mod upload;

pub use edit::{InlineEditTranslator, ItemTextEditor, ListTitleEditor, TitleEditTranslator};
pub use reorder::{reorder_anchors, Anchors, ListReorder, ReorderTranslator};
pub use tree::{destination_anchor, FolderMove, FolderMoveTranslator};
pub use upload::{file_payload, FileSelection, FileSelectTranslator};
