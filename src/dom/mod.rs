//! The slice of the DOM the translators need.
//!
//! Everything the core touches goes through [`DomElement`], so the same translator code runs
//! against the live document (`web::WebElement`) and against the in-memory tree in [`memory`].

pub mod memory;

use crate::intent::Payload;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Handler invoked for a DOM event.
pub type Handler<E> = Rc<dyn Fn(&DomEvent<E>)>;

pub fn handler<E, F>(f: F) -> Handler<E>
where
    F: Fn(&DomEvent<E>) + 'static,
{
    Rc::new(f)
}

/// Names a listener slot on an element.
///
/// Registering a second handler under the same key replaces the first, which is what makes
/// repeated fragment insertion safe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub &'static str);

impl ListenerKey {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

pub trait DomElement: Clone + PartialEq + fmt::Debug + 'static {
    /// Element id, or `""` when it has none.
    fn id(&self) -> String;
    /// Lowercase tag name.
    fn tag_name(&self) -> String;
    fn has_class(&self, class: &str) -> bool;
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);

    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);

    fn parent(&self) -> Option<Self>;
    /// Element children in document order.
    fn children(&self) -> Vec<Self>;
    /// Matching descendants in document order, excluding `self`.
    fn query_all(&self, selector: &Selector) -> Vec<Self>;

    fn text_content(&self) -> String;
    fn set_text_content(&self, text: &str);
    fn set_content_editable(&self, editable: bool);
    fn focus(&self);
    fn blur(&self);

    /// Register `handler` for `event` under `key`, replacing whatever was there.
    fn listen(&self, key: ListenerKey, event: &str, handler: Handler<Self>);
    fn unlisten(&self, key: ListenerKey);

    /// All `data-*` attributes, keyed the way `HTMLElement.dataset` keys them.
    fn dataset(&self) -> Vec<(String, String)>;

    fn query(&self, selector: &Selector) -> Option<Self> {
        self.query_all(selector).into_iter().next()
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, selector: &Selector) -> Option<Self> {
        let mut cur = Some(self.clone());
        while let Some(el) = cur {
            if selector.matches(&el) {
                return Some(el);
            }
            cur = el.parent();
        }
        None
    }

    /// `self` when it matches, followed by every matching descendant.
    fn query_inclusive(&self, selector: &Selector) -> Vec<Self> {
        let mut out = Vec::new();
        if selector.matches(self) {
            out.push(self.clone());
        }
        out.extend(self.query_all(selector));
        out
    }

    fn data(&self, key: &str) -> Option<String> {
        self.attribute(&data_attribute_name(key))
    }

    fn set_data(&self, key: &str, value: &str) {
        self.set_attribute(&data_attribute_name(key), value);
    }

    fn previous_sibling(&self) -> Option<Self> {
        let sibs = self.parent()?.children();
        let idx = sibs.iter().position(|s| s == self)?;
        idx.checked_sub(1).and_then(|i| sibs.get(i).cloned())
    }

    fn next_sibling(&self) -> Option<Self> {
        let sibs = self.parent()?.children();
        let idx = sibs.iter().position(|s| s == self)?;
        sibs.get(idx + 1).cloned()
    }
}

/// A simple selector: an optional tag, id, class and attribute test, all of which must hold.
///
/// Only the shapes the markup conventions need are supported; `to_css` renders the browser
/// equivalent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    class: Option<String>,
    attr: Option<(String, Option<String>)>,
}

impl Selector {
    pub fn id(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            ..Default::default()
        }
    }

    pub fn tag(tag: &str) -> Self {
        Self {
            tag: Some(tag.to_ascii_lowercase()),
            ..Default::default()
        }
    }

    /// Elements carrying the attribute, whatever its value.
    pub fn has_attr(name: &str) -> Self {
        Self {
            attr: Some((name.to_string(), None)),
            ..Default::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attr = Some((name.to_string(), Some(value.to_string())));
        self
    }

    pub fn matches<E: DomElement>(&self, el: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !el.tag_name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if &el.id() != id {
                return false;
            }
        }
        if let Some(class) = &self.class {
            if !el.has_class(class) {
                return false;
            }
        }
        match &self.attr {
            Some((name, None)) => el.attribute(name).is_some(),
            Some((name, Some(value))) => el.attribute(name).as_deref() == Some(value.as_str()),
            None => true,
        }
    }

    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(tag) = &self.tag {
            css.push_str(tag);
        }
        if let Some(id) = &self.id {
            css.push('#');
            css.push_str(id);
        }
        if let Some(class) = &self.class {
            css.push('.');
            css.push_str(class);
        }
        match &self.attr {
            Some((name, None)) => css.push_str(&format!("[{name}]")),
            Some((name, Some(value))) => css.push_str(&format!("[{name}=\"{value}\"]")),
            None => {}
        }
        if css.is_empty() {
            css.push('*');
        }
        css
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

/// A DOM event as seen by a [`Handler`].
pub struct DomEvent<E> {
    pub kind: String,
    pub target: E,
    /// `KeyboardEvent.key` for key events.
    pub key: Option<String>,
    /// `CustomEvent.detail` for intent events, already stripped of transport fields.
    pub detail: Option<Payload>,
    default_prevented: Cell<bool>,
}

impl<E> DomEvent<E> {
    pub fn new(kind: &str, target: E) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            key: None,
            detail: None,
            default_prevented: Cell::new(false),
        }
    }

    pub fn key(kind: &str, target: E, key: &str) -> Self {
        Self {
            key: Some(key.to_string()),
            ..Self::new(kind, target)
        }
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl<E: fmt::Debug> fmt::Debug for DomEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("key", &self.key)
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}

/// `data-from-folder-id` -> `fromFolderId`; `None` for non-data attributes.
pub fn dataset_key(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix("data-")?;
    let mut out = String::with_capacity(rest.len());
    let mut upper = false;
    for ch in rest.chars() {
        if ch == '-' {
            if upper {
                out.push('-');
            }
            upper = true;
            continue;
        }
        if upper && ch.is_ascii_lowercase() {
            out.push(ch.to_ascii_uppercase());
        } else {
            if upper {
                out.push('-');
            }
            out.push(ch);
        }
        upper = false;
    }
    if upper {
        out.push('-');
    }
    Some(out)
}

/// `fromFolderId` -> `data-from-folder-id`.
pub fn data_attribute_name(key: &str) -> String {
    let mut out = String::from("data-");
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
