use crate::bridge::Context;
use crate::dom::{handler, DomElement, DomEvent, ListenerKey, Selector};
use crate::intent::IntentKind;
use crate::lifecycle::Translator;
use crate::platform::Platform;
use log::{debug, warn};
use std::rc::Rc;

const ITEM_FOCUS_OUT: ListenerKey = ListenerKey("item-text-commit");
const ITEM_KEY_DOWN: ListenerKey = ListenerKey("item-text-keys");
const TITLE_FOCUS_OUT: ListenerKey = ListenerKey("list-title-commit");

/// In-place editing of one list item's text.
///
/// The committed text lives in the item's `data-text`; the live text in its
/// `.TodoItem-text` child. Leaving the item commits when they differ.
pub struct ItemTextEditor<P: Platform> {
    ctx: Rc<Context<P>>,
    item: P::Element,
    text: P::Element,
}

impl<P: Platform> ItemTextEditor<P> {
    pub fn new(ctx: Rc<Context<P>>, item: P::Element, text: P::Element) -> Rc<Self> {
        Rc::new(Self { ctx, item, text })
    }

    pub fn attach(self: &Rc<Self>) {
        let this = self.clone();
        self.item.listen(
            ITEM_FOCUS_OUT,
            "focusout",
            handler(move |_: &DomEvent<P::Element>| this.commit()),
        );
        let this = self.clone();
        self.text.listen(
            ITEM_KEY_DOWN,
            "keydown",
            handler(move |ev: &DomEvent<P::Element>| this.on_key_down(ev)),
        );
    }

    pub fn commit(&self) {
        let live = self.text.text_content();
        if self.item.data("text").as_deref() == Some(live.as_str()) {
            return;
        }
        self.item.set_data("text", &live);
        let intent = self
            .ctx
            .dispatcher
            .intent(IntentKind::HandleItemTextUpdate);
        self.ctx.dispatcher.raise(&self.item, intent);
    }

    pub fn on_key_down(&self, ev: &DomEvent<P::Element>) {
        match ev.key.as_deref() {
            Some("Enter") => {
                ev.prevent_default();
                self.text.blur();
                let intent = self.ctx.dispatcher.intent(IntentKind::HandleNewItemInsert);
                self.ctx.dispatcher.raise(&self.item, intent);
            }
            Some("ArrowUp") => self.focus_neighbour(self.item.previous_sibling()),
            Some("ArrowDown") => self.focus_neighbour(self.item.next_sibling()),
            _ => {}
        }
    }

    fn focus_neighbour(&self, neighbour: Option<P::Element>) {
        let selector = Selector::class(&self.ctx.config.markup.item_text_class);
        if let Some(text) = neighbour.and_then(|n| n.query(&selector)) {
            text.focus();
        }
    }
}

/// In-place editing of a list's title. An emptied title is restored from the title element's
/// `title` attribute instead of being committed.
pub struct ListTitleEditor<P: Platform> {
    ctx: Rc<Context<P>>,
    list: P::Element,
    title: P::Element,
}

impl<P: Platform> ListTitleEditor<P> {
    pub fn new(ctx: Rc<Context<P>>, list: P::Element, title: P::Element) -> Rc<Self> {
        Rc::new(Self { ctx, list, title })
    }

    pub fn attach(self: &Rc<Self>) {
        let this = self.clone();
        self.title.listen(
            TITLE_FOCUS_OUT,
            "focusout",
            handler(move |_: &DomEvent<P::Element>| this.commit()),
        );
    }

    pub fn commit(&self) {
        let live = self.title.text_content();
        if self.list.data("title").as_deref() == Some(live.as_str()) {
            return;
        }
        if live.trim().is_empty() {
            let placeholder = self.title.attribute("title").unwrap_or_default();
            debug!("empty title on {:?}, restoring {placeholder:?}", self.list);
            self.title.set_text_content(&placeholder);
            return;
        }
        self.list.set_data("title", &live);
        let intent = self
            .ctx
            .dispatcher
            .intent(IntentKind::HandleTodoListTitleUpdate);
        self.ctx.dispatcher.raise(&self.list, intent);
    }
}

/// Binds [`ItemTextEditor`] to every item of a fragment.
pub struct InlineEditTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> InlineEditTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for InlineEditTranslator<P> {
    fn name(&self) -> &'static str {
        "item-edit"
    }

    fn targets(&self, fragment: &P::Element) -> Vec<P::Element> {
        fragment.query_inclusive(&Selector::class(&self.ctx.config.markup.item_class))
    }

    fn attach(&self, item: &P::Element) {
        let selector = Selector::class(&self.ctx.config.markup.item_text_class);
        match item.query(&selector) {
            Some(text) => ItemTextEditor::new(self.ctx.clone(), item.clone(), text).attach(),
            None => warn!("item {:?} has no {selector}", item),
        }
    }
}

/// Binds [`ListTitleEditor`] to every list of a fragment.
pub struct TitleEditTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> TitleEditTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for TitleEditTranslator<P> {
    fn name(&self) -> &'static str {
        "title-edit"
    }

    fn targets(&self, fragment: &P::Element) -> Vec<P::Element> {
        fragment.query_inclusive(&Selector::id(&self.ctx.config.markup.list_id))
    }

    fn attach(&self, list: &P::Element) {
        let selector = Selector::class(&self.ctx.config.markup.list_title_class);
        // The title sits next to the list in some layouts, so look under the parent too.
        let title = list
            .query(&selector)
            .or_else(|| list.parent().and_then(|p| p.query(&selector)));
        match title {
            Some(title) => ListTitleEditor::new(self.ctx.clone(), list.clone(), title).attach(),
            None => debug!("list {:?} has no {selector}", list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_context;
    use crate::dom::memory::MemElement;
    use crate::platform::headless::HeadlessPlatform;

    fn item(id: &str, text: &str) -> (MemElement, MemElement) {
        let item = MemElement::new("li")
            .with_id(id)
            .with_class("TodoItem")
            .with_attr("data-text", text);
        let span = MemElement::new("span")
            .with_class("TodoItem-text")
            .with_text(text);
        item.append(&span);
        (item, span)
    }

    fn list_with(platform: &HeadlessPlatform, items: &[(&str, &str)]) -> (MemElement, Vec<MemElement>) {
        let list = MemElement::new("ul").with_id("todo-list");
        let mut spans = Vec::new();
        for (id, text) in items {
            let (li, span) = item(id, text);
            list.append(&li);
            spans.push(span);
        }
        platform.body().append(&list);
        (list, spans)
    }

    #[test]
    fn test_focus_out_commits_only_changes() {
        let (platform, ctx) = test_context();
        let (list, spans) = list_with(&platform, &[("a", "milk")]);
        let t = InlineEditTranslator::new(ctx);
        for target in t.targets(&list) {
            t.attach(&target);
        }

        spans[0].focus();
        spans[0].blur();
        assert!(platform.triggered().is_empty());

        spans[0].focus();
        spans[0].set_text_content("oat milk");
        spans[0].blur();
        let sent = platform.take_triggered();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "@handle-item-text-update");
        assert_eq!(sent[0].target.id(), "a");
        assert_eq!(sent[0].target.data("text").as_deref(), Some("oat milk"));
    }

    #[test]
    fn test_emptied_item_text_is_committed() {
        let (platform, ctx) = test_context();
        let (list, spans) = list_with(&platform, &[("a", "milk")]);
        let t = InlineEditTranslator::new(ctx);
        t.attach(&t.targets(&list)[0]);

        spans[0].focus();
        spans[0].set_text_content("");
        spans[0].blur();
        assert_eq!(platform.take_triggered().len(), 1);
    }

    #[test]
    fn test_enter_inserts_once_even_when_bound_twice() {
        let (platform, ctx) = test_context();
        let (list, spans) = list_with(&platform, &[("a", "milk")]);
        let t = InlineEditTranslator::new(ctx);
        for _ in 0..2 {
            for target in t.targets(&list) {
                t.attach(&target);
            }
        }

        spans[0].focus();
        let ev = spans[0].key_down("Enter");
        assert!(ev.default_prevented());
        assert!(!spans[0].is_focused());

        let names: Vec<String> = platform.take_triggered().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["@handle-new-item-insert".to_string()]);
    }

    #[test]
    fn test_arrows_move_focus_between_items() {
        let (platform, ctx) = test_context();
        let (list, spans) = list_with(&platform, &[("a", "x"), ("b", "y"), ("c", "z")]);
        let t = InlineEditTranslator::new(ctx);
        for target in t.targets(&list) {
            t.attach(&target);
        }

        spans[1].focus();
        spans[1].key_down("ArrowUp");
        assert!(spans[0].is_focused());
        spans[0].key_down("ArrowUp");
        assert!(spans[0].is_focused());
        spans[0].key_down("ArrowDown");
        spans[1].key_down("ArrowDown");
        assert!(spans[2].is_focused());
        spans[2].key_down("ArrowDown");
        assert!(spans[2].is_focused());
        assert!(platform.triggered().is_empty());
    }

    #[test]
    fn test_title_commit_and_restore() {
        let (platform, ctx) = test_context();
        let list = MemElement::new("div")
            .with_id("todo-list")
            .with_attr("data-title", "Groceries");
        let title = MemElement::new("h2")
            .with_class("TodoList-title")
            .with_attr("title", "Untitled")
            .with_text("Groceries");
        list.append(&title);
        platform.body().append(&list);

        let t = TitleEditTranslator::new(ctx);
        t.attach(&list);
        t.attach(&list);

        title.focus();
        title.set_text_content("");
        title.blur();
        assert_eq!(title.text_content(), "Untitled");
        assert_eq!(list.data("title").as_deref(), Some("Groceries"));
        assert!(platform.triggered().is_empty());

        title.focus();
        title.set_text_content("   ");
        title.blur();
        assert_eq!(title.text_content(), "Untitled");
        assert_eq!(list.data("title").as_deref(), Some("Groceries"));
        assert!(platform.triggered().is_empty());

        title.focus();
        title.set_text_content("Errands");
        title.blur();
        let sent = platform.take_triggered();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "@handle-todo-list-title-update");
        assert_eq!(sent[0].target, list);
        assert_eq!(list.data("title").as_deref(), Some("Errands"));
    }
}
