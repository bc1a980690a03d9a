//! An in-memory element tree implementing [`DomElement`].
//!
//! It models what the translators depend on: bubbling listeners, focus moves that fire
//! `focusout`, `textContent`, `dataset` keys and child reordering. It does no layout and no
//! selector parsing beyond [`Selector`].

use super::{dataset_key, DomElement, DomEvent, Handler, ListenerKey, Selector};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

struct Node {
    tag: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    text: String,
    children: Vec<MemElement>,
    parent: Weak<RefCell<Node>>,
    listeners: Vec<(ListenerKey, String, Handler<MemElement>)>,
    focused: bool,
    editable: bool,
}

#[derive(Clone)]
pub struct MemElement(Rc<RefCell<Node>>);

impl MemElement {
    pub fn new(tag: &str) -> Self {
        Self(Rc::new(RefCell::new(Node {
            tag: tag.to_ascii_lowercase(),
            attrs: BTreeMap::new(),
            classes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: Weak::new(),
            listeners: Vec::new(),
            focused: false,
            editable: false,
        })))
    }

    pub fn with_id(self, id: &str) -> Self {
        self.set_attribute("id", id);
        self
    }

    pub fn with_class(self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.0.borrow_mut().text = text.to_string();
        self
    }

    /// Append `child`, detaching it from any previous parent first.
    pub fn append(&self, child: &MemElement) {
        let at = self.0.borrow().children.len();
        self.insert_child(at, child);
    }

    pub fn insert_child(&self, index: usize, child: &MemElement) {
        child.detach();
        child.0.borrow_mut().parent = Rc::downgrade(&self.0);
        let mut node = self.0.borrow_mut();
        let index = index.min(node.children.len());
        node.children.insert(index, child.clone());
    }

    pub fn detach(&self) {
        let parent = self.0.borrow().parent.upgrade();
        if let Some(parent) = parent {
            parent.borrow_mut().children.retain(|c| c != self);
        }
        self.0.borrow_mut().parent = Weak::new();
    }

    /// Move the child at `from` to `to`, the way a drag controller leaves the list on drop.
    pub fn move_child(&self, from: usize, to: usize) {
        let child = {
            let mut node = self.0.borrow_mut();
            if from >= node.children.len() {
                return;
            }
            node.children.remove(from)
        };
        let mut node = self.0.borrow_mut();
        let to = to.min(node.children.len());
        node.children.insert(to, child);
    }

    pub fn child_ids(&self) -> Vec<String> {
        self.children().iter().map(|c| c.id()).collect()
    }

    /// Dispatch `ev` at `self` and bubble it to the root.
    pub fn dispatch(&self, ev: &DomEvent<MemElement>) {
        let mut cur = Some(self.clone());
        while let Some(el) = cur {
            let handlers: Vec<Handler<MemElement>> = el
                .0
                .borrow()
                .listeners
                .iter()
                .filter(|(_, event, _)| event == &ev.kind)
                .map(|(_, _, h)| h.clone())
                .collect();
            for h in handlers {
                h(ev);
            }
            cur = el.parent();
        }
    }

    pub fn fire(&self, kind: &str) -> DomEvent<MemElement> {
        let ev = DomEvent::new(kind, self.clone());
        self.dispatch(&ev);
        ev
    }

    pub fn key_down(&self, key: &str) -> DomEvent<MemElement> {
        let ev = DomEvent::key("keydown", self.clone(), key);
        self.dispatch(&ev);
        ev
    }

    pub fn is_focused(&self) -> bool {
        self.0.borrow().focused
    }

    pub fn is_content_editable(&self) -> bool {
        self.0.borrow().editable
    }

    pub fn listener_count(&self) -> usize {
        self.0.borrow().listeners.len()
    }

    fn root(&self) -> MemElement {
        let mut cur = self.clone();
        while let Some(p) = cur.parent() {
            cur = p;
        }
        cur
    }

    fn focused_in_tree(&self) -> Option<MemElement> {
        let root = self.root();
        if root.is_focused() {
            return Some(root);
        }
        root.descendants().into_iter().find(|e| e.is_focused())
    }

    fn descendants(&self) -> Vec<MemElement> {
        let mut out = Vec::new();
        for child in self.children() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }
}

impl PartialEq for MemElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for MemElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.0.borrow();
        write!(f, "<{}", node.tag)?;
        if let Some(id) = node.attrs.get("id") {
            write!(f, "#{id}")?;
        }
        for class in &node.classes {
            write!(f, ".{class}")?;
        }
        write!(f, ">")
    }
}

impl DomElement for MemElement {
    fn id(&self) -> String {
        self.attribute("id").unwrap_or_default()
    }

    fn tag_name(&self) -> String {
        self.0.borrow().tag.clone()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.borrow().classes.iter().any(|c| c == class)
    }

    fn add_class(&self, class: &str) {
        if !self.has_class(class) {
            self.0.borrow_mut().classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.0.borrow_mut().classes.retain(|c| c != class);
    }

    fn attribute(&self, name: &str) -> Option<String> {
        if name == "class" {
            let node = self.0.borrow();
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        self.0.borrow().attrs.get(name).cloned()
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if name == "class" {
            self.0.borrow_mut().classes =
                value.split_whitespace().map(str::to_string).collect();
            return;
        }
        self.0
            .borrow_mut()
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    fn parent(&self) -> Option<Self> {
        self.0.borrow().parent.upgrade().map(MemElement)
    }

    fn children(&self) -> Vec<Self> {
        self.0.borrow().children.clone()
    }

    fn query_all(&self, selector: &Selector) -> Vec<Self> {
        self.descendants()
            .into_iter()
            .filter(|e| selector.matches(e))
            .collect()
    }

    fn text_content(&self) -> String {
        let node = self.0.borrow();
        let mut out = node.text.clone();
        for child in &node.children {
            out.push_str(&child.text_content());
        }
        out
    }

    fn set_text_content(&self, text: &str) {
        let children = self.children();
        for child in children {
            child.detach();
        }
        self.0.borrow_mut().text = text.to_string();
    }

    fn set_content_editable(&self, editable: bool) {
        self.0.borrow_mut().editable = editable;
    }

    fn focus(&self) {
        match self.focused_in_tree() {
            Some(current) if current == *self => return,
            Some(current) => current.blur(),
            None => {}
        }
        self.0.borrow_mut().focused = true;
        self.fire("focusin");
    }

    fn blur(&self) {
        if !self.is_focused() {
            return;
        }
        self.0.borrow_mut().focused = false;
        self.fire("focusout");
    }

    fn listen(&self, key: ListenerKey, event: &str, handler: Handler<Self>) {
        let mut node = self.0.borrow_mut();
        node.listeners.retain(|(k, _, _)| *k != key);
        node.listeners.push((key, event.to_string(), handler));
    }

    fn unlisten(&self, key: ListenerKey) {
        self.0.borrow_mut().listeners.retain(|(k, _, _)| *k != key);
    }

    fn dataset(&self) -> Vec<(String, String)> {
        self.0
            .borrow()
            .attrs
            .iter()
            .filter_map(|(name, value)| dataset_key(name).map(|k| (k, value.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::handler;
    use std::cell::Cell;

    #[test]
    fn test_listen_replaces_same_key() {
        let el = MemElement::new("div");
        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            el.listen(
                ListenerKey("click"),
                "click",
                handler(move |_| hits.set(hits.get() + 1)),
            );
        }
        el.fire("click");
        assert_eq!(hits.get(), 1);
        assert_eq!(el.listener_count(), 1);
    }

    #[test]
    fn test_events_bubble_to_ancestors() {
        let outer = MemElement::new("li");
        let inner = MemElement::new("span");
        outer.append(&inner);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        outer.listen(
            ListenerKey("outer"),
            "focusout",
            handler(move |ev: &DomEvent<MemElement>| s.borrow_mut().push(ev.target.tag_name())),
        );
        inner.focus();
        inner.blur();
        assert_eq!(*seen.borrow(), vec!["span".to_string()]);
    }

    #[test]
    fn test_focus_moves_fire_focusout_on_previous() {
        let root = MemElement::new("ul");
        let a = MemElement::new("li");
        let b = MemElement::new("li");
        root.append(&a);
        root.append(&b);
        let outs = Rc::new(Cell::new(0));
        let o = outs.clone();
        a.listen(ListenerKey("a"), "focusout", handler(move |_| o.set(o.get() + 1)));
        a.focus();
        b.focus();
        assert_eq!(outs.get(), 1);
        assert!(!a.is_focused());
        assert!(b.is_focused());
    }

    #[test]
    fn test_move_child_and_text_content() {
        let list = MemElement::new("ul");
        for id in ["a", "b", "c"] {
            list.append(&MemElement::new("li").with_id(id).with_text(id));
        }
        list.move_child(0, 2);
        assert_eq!(list.child_ids(), vec!["b", "c", "a"]);
        assert_eq!(list.text_content(), "bca");
    }

    #[test]
    fn test_dataset_and_class_attribute() {
        let el = MemElement::new("li")
            .with_attr("class", "one two")
            .with_attr("data-to-item-id", "x");
        assert!(el.has_class("two"));
        assert_eq!(el.attribute("class").as_deref(), Some("one two"));
        assert_eq!(el.dataset(), vec![("toItemId".to_string(), "x".to_string())]);
        assert_eq!(el.data("toItemId").as_deref(), Some("x"));
    }
}
