//! Services the core borrows from its host: the document, the rendering system's event bus, the
//! drag controller, blocking dialogs, file reads and the task spawner.
//!
//! The browser host lives in `web`; [`headless::HeadlessPlatform`] scripts the same contract
//! in memory.

pub mod headless;

use crate::dom::{DomElement, Selector};
use crate::error::Result;
use crate::intent::Payload;
use futures::future::LocalBoxFuture;
use std::rc::Rc;

pub trait Platform: 'static {
    type Element: DomElement;

    fn body(&self) -> Self::Element;
    fn element_by_id(&self, id: &str) -> Option<Self::Element>;
    /// Document-wide query.
    fn query_all(&self, selector: &Selector) -> Vec<Self::Element>;

    /// Raise a named event with `detail` on `target` through the rendering system.
    fn trigger(&self, target: &Self::Element, event: &str, detail: Payload);
    /// Ask the rendering system to (re)scan `element` for its own attributes.
    fn process(&self, element: &Self::Element);
    /// The class the rendering system uses to mark in-flight requests, if it exposes one.
    fn request_class(&self) -> Option<String>;

    /// Wrap `container` in a drag controller. An existing controller on the same container is
    /// replaced.
    fn enroll_sortable(
        &self,
        container: &Self::Element,
        options: &SortOptions,
        hooks: SortHooks<Self::Element>,
    );

    fn confirm(&self, message: &str) -> bool;
    /// `None` when the user cancels.
    fn prompt(&self, message: &str) -> Option<String>;

    /// Read the first file selected in a file input. `Ok(None)` when nothing is selected.
    fn read_file(&self, input: &Self::Element) -> LocalBoxFuture<'static, Result<Option<SelectedFile>>>;
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}

/// Drag controller configuration.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortOptions {
    pub animation_ms: u32,
    /// Class of the element that starts a drag; `None` makes the whole item a handle.
    pub handle: Option<String>,
    /// Selector of draggable children; `None` means every child.
    pub draggable: Option<String>,
    /// Containers sharing a group exchange items.
    pub group: Option<String>,
    /// Allow reordering within a container.
    pub sort: bool,
    /// Render the drag ghost without native drag-and-drop.
    pub force_fallback: bool,
    /// Append the drag ghost to `<body>` instead of the container.
    pub fallback_on_body: bool,
    pub empty_insert_threshold: Option<u32>,
}

/// End of a drag within one container.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragEnd {
    pub old_index: usize,
    pub new_index: usize,
}

/// An item left its container for another one in the same group.
#[derive(Clone, Debug, PartialEq)]
pub struct DragRemove<E> {
    pub from: E,
    pub to: E,
    pub item: E,
}

pub struct SortHooks<E> {
    pub on_end: Option<Rc<dyn Fn(DragEnd)>>,
    pub on_remove: Option<Rc<dyn Fn(DragRemove<E>)>>,
}

impl<E> SortHooks<E> {
    pub fn on_end(f: impl Fn(DragEnd) + 'static) -> Self {
        Self {
            on_end: Some(Rc::new(f)),
            on_remove: None,
        }
    }

    pub fn on_remove(f: impl Fn(DragRemove<E>) + 'static) -> Self {
        Self {
            on_end: None,
            on_remove: Some(Rc::new(f)),
        }
    }
}

impl<E> Clone for SortHooks<E> {
    fn clone(&self) -> Self {
        Self {
            on_end: self.on_end.clone(),
            on_remove: self.on_remove.clone(),
        }
    }
}

/// Bytes and metadata of a selected file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub bytes: Vec<u8>,
}
