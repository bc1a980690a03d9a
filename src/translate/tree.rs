use crate::bridge::Context;
use crate::dom::{DomElement, Selector};
use crate::intent::IntentKind;
use crate::lifecycle::Translator;
use crate::platform::{DragRemove, Platform, SortHooks, SortOptions};
use std::rc::Rc;

/// Destination of a cross-container drop: the container's id, or its parent's id when the
/// container itself has none (a nested `ul` under a folder `li`).
pub fn destination_anchor<E: DomElement>(to: &E) -> String {
    let id = to.id();
    if !id.is_empty() {
        return id;
    }
    to.parent().map(|p| p.id()).unwrap_or_default()
}

/// Re-parenting between the folders of one tree. Sorting inside a folder is disabled; only
/// moves across folders produce intents.
pub struct FolderMove<P: Platform> {
    ctx: Rc<Context<P>>,
    container: P::Element,
}

impl<P: Platform> FolderMove<P> {
    pub fn new(ctx: Rc<Context<P>>, container: P::Element) -> Rc<Self> {
        Rc::new(Self { ctx, container })
    }

    pub fn options(&self) -> SortOptions {
        let drag = &self.ctx.config.drag;
        SortOptions {
            animation_ms: drag.animation_ms,
            draggable: Some("li".to_string()),
            group: Some(drag.tree_group.clone()),
            sort: false,
            fallback_on_body: true,
            empty_insert_threshold: Some(drag.empty_insert_threshold),
            ..Default::default()
        }
    }

    pub fn attach(self: &Rc<Self>) {
        let this = self.clone();
        self.ctx.platform.enroll_sortable(
            &self.container,
            &self.options(),
            SortHooks::on_remove(move |removed| this.on_remove(removed)),
        );
    }

    pub fn on_remove(&self, removed: DragRemove<P::Element>) {
        let from_folder_id = removed.from.id();
        let from_item_id = removed.item.id();
        let to_item_id = destination_anchor(&removed.to);

        // Kept on the item too, so later requests from it still describe the move.
        removed.item.set_data("fromFolderId", &from_folder_id);
        removed.item.set_data("fromItemId", &from_item_id);
        removed.item.set_data("toItemId", &to_item_id);

        let intent = self
            .ctx
            .dispatcher
            .intent(IntentKind::FeHandleItemMove)
            .with("fromFolderId", from_folder_id)
            .with("fromItemId", from_item_id)
            .with("toItemId", to_item_id);
        self.ctx.dispatcher.raise(&removed.item, intent);
    }
}

/// Enrolls the folder containers of a file tree fragment.
pub struct FolderMoveTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> FolderMoveTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for FolderMoveTranslator<P> {
    fn name(&self) -> &'static str {
        "folder-move"
    }

    fn targets(&self, fragment: &P::Element) -> Vec<P::Element> {
        let markup = &self.ctx.config.markup;
        let folders = Selector::tag("ul").with_class(&markup.folder_class);
        let mut out = Vec::new();
        // A re-rendered folder entry is a container of its own.
        if fragment.has_class(&markup.file_folder_class) && !folders.matches(fragment) {
            out.push(fragment.clone());
        }
        out.extend(fragment.query_inclusive(&folders));
        out
    }

    fn attach(&self, target: &P::Element) {
        FolderMove::new(self.ctx.clone(), target.clone()).attach();
    }
}
