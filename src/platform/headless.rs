use super::{DragEnd, DragRemove, Platform, SelectedFile, SortHooks, SortOptions};
use crate::dom::memory::MemElement;
use crate::dom::{DomElement, DomEvent, Selector};
use crate::error::{Error, Result};
use crate::intent::Payload;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

/// An event handed to the rendering system.
#[derive(Clone, Debug, PartialEq)]
pub struct Triggered {
    pub target: MemElement,
    pub name: String,
    pub detail: Payload,
}

/// In-memory host: a `<body>` tree, recorded triggers, scripted dialog answers and files, and a
/// task queue drained by [`HeadlessPlatform::run_tasks`].
pub struct HeadlessPlatform {
    body: MemElement,
    triggered: RefCell<Vec<Triggered>>,
    processed: RefCell<Vec<MemElement>>,
    sortables: RefCell<Vec<(MemElement, SortOptions, SortHooks<MemElement>)>>,
    confirms: RefCell<VecDeque<bool>>,
    prompts: RefCell<VecDeque<Option<String>>>,
    prompt_log: RefCell<Vec<String>>,
    files: RefCell<HashMap<String, Result<SelectedFile>>>,
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    request_class: Option<String>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self {
            body: MemElement::new("body"),
            triggered: RefCell::new(Vec::new()),
            processed: RefCell::new(Vec::new()),
            sortables: RefCell::new(Vec::new()),
            confirms: RefCell::new(VecDeque::new()),
            prompts: RefCell::new(VecDeque::new()),
            prompt_log: RefCell::new(Vec::new()),
            files: RefCell::new(HashMap::new()),
            tasks: RefCell::new(Vec::new()),
            request_class: Some("htmx-request".to_string()),
        }
    }

    pub fn triggered(&self) -> Vec<Triggered> {
        self.triggered.borrow().clone()
    }

    pub fn take_triggered(&self) -> Vec<Triggered> {
        std::mem::take(&mut *self.triggered.borrow_mut())
    }

    pub fn processed(&self) -> Vec<MemElement> {
        self.processed.borrow().clone()
    }

    pub fn enrolled(&self) -> Vec<(MemElement, SortOptions)> {
        self.sortables
            .borrow()
            .iter()
            .map(|(el, opts, _)| (el.clone(), opts.clone()))
            .collect()
    }

    pub fn answer_confirm(&self, answer: bool) {
        self.confirms.borrow_mut().push_back(answer);
    }

    pub fn answer_prompt(&self, answer: Option<&str>) {
        self.prompts
            .borrow_mut()
            .push_back(answer.map(str::to_string));
    }

    /// Messages of every prompt shown so far.
    pub fn prompts_shown(&self) -> Vec<String> {
        self.prompt_log.borrow().clone()
    }

    pub fn select_file(&self, input: &MemElement, file: SelectedFile) {
        self.files.borrow_mut().insert(input.id(), Ok(file));
    }

    pub fn fail_file(&self, input: &MemElement, message: &str) {
        self.files.borrow_mut().insert(
            input.id(),
            Err(Error::FileRead {
                input: input.id(),
                message: message.to_string(),
            }),
        );
    }

    /// Drive every spawned task to completion, including tasks spawned while draining.
    pub fn run_tasks(&self) {
        loop {
            let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                futures::executor::block_on(task);
            }
        }
    }

    fn hooks_for(&self, container: &MemElement) -> Option<SortHooks<MemElement>> {
        self.sortables
            .borrow()
            .iter()
            .find(|(el, _, _)| el == container)
            .map(|(_, _, hooks)| hooks.clone())
    }

    /// Move a child of `container` from `old_index` to `new_index` and report the drop, as the
    /// drag controller would.
    pub fn drop_within(&self, container: &MemElement, old_index: usize, new_index: usize) {
        container.move_child(old_index, new_index);
        let Some(hooks) = self.hooks_for(container) else {
            return;
        };
        if let Some(on_end) = hooks.on_end {
            on_end(DragEnd {
                old_index,
                new_index,
            });
        }
    }

    /// Move `item` from `from` into `to` at `index` and report the removal from `from`.
    pub fn drop_across(&self, from: &MemElement, to: &MemElement, item: &MemElement, index: usize) {
        to.insert_child(index, item);
        let Some(hooks) = self.hooks_for(from) else {
            return;
        };
        if let Some(on_remove) = hooks.on_remove {
            on_remove(DragRemove {
                from: from.clone(),
                to: to.clone(),
                item: item.clone(),
            });
        }
    }
}

impl Default for HeadlessPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for HeadlessPlatform {
    type Element = MemElement;

    fn body(&self) -> MemElement {
        self.body.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<MemElement> {
        self.body.query_inclusive(&Selector::id(id)).into_iter().next()
    }

    fn query_all(&self, selector: &Selector) -> Vec<MemElement> {
        self.body.query_inclusive(selector)
    }

    fn trigger(&self, target: &MemElement, event: &str, detail: Payload) {
        self.triggered.borrow_mut().push(Triggered {
            target: target.clone(),
            name: event.to_string(),
            detail: detail.clone(),
        });
        let mut ev = DomEvent::new(event, target.clone());
        ev.detail = Some(detail);
        target.dispatch(&ev);
    }

    fn process(&self, element: &MemElement) {
        self.processed.borrow_mut().push(element.clone());
    }

    fn request_class(&self) -> Option<String> {
        self.request_class.clone()
    }

    fn enroll_sortable(
        &self,
        container: &MemElement,
        options: &SortOptions,
        hooks: SortHooks<MemElement>,
    ) {
        let mut sortables = self.sortables.borrow_mut();
        sortables.retain(|(el, _, _)| el != container);
        sortables.push((container.clone(), options.clone(), hooks));
    }

    fn confirm(&self, _message: &str) -> bool {
        self.confirms.borrow_mut().pop_front().unwrap_or(false)
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.prompt_log.borrow_mut().push(message.to_string());
        self.prompts.borrow_mut().pop_front().flatten()
    }

    fn read_file(&self, input: &MemElement) -> LocalBoxFuture<'static, Result<Option<SelectedFile>>> {
        let file = self.files.borrow_mut().remove(&input.id());
        async move { file.transpose() }.boxed_local()
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}
