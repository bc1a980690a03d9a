use crate::dom::{dataset_key, DomElement, DomEvent, Handler, ListenerKey, Selector};
use crate::intent::Payload;
use log::warn;
use std::fmt;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};

/// A live DOM element.
#[derive(Clone, PartialEq)]
pub struct WebElement(pub web_sys::Element);

impl WebElement {
    pub fn from_js(value: JsValue) -> Option<Self> {
        value.dyn_into::<web_sys::Element>().ok().map(Self)
    }

    fn html(&self) -> Option<&web_sys::HtmlElement> {
        self.0.dyn_ref::<web_sys::HtmlElement>()
    }

    fn slot(key: ListenerKey) -> (JsValue, JsValue) {
        (
            JsValue::from_str(&format!("__baguette_{}", key.as_str())),
            JsValue::from_str(&format!("__baguette_{}_event", key.as_str())),
        )
    }
}

impl fmt::Debug for WebElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name())?;
        let id = self.id();
        if !id.is_empty() {
            write!(f, "#{id}")?;
        }
        f.write_str(">")
    }
}

/// Intent detail carried by a `CustomEvent`, without the `elt` field the trigger adds.
///
/// `elt` is dropped from a shallow copy before serializing: the element carries htmx's own
/// bookkeeping, which refers back to the element and cannot be turned into JSON.
pub fn event_detail(ev: &web_sys::Event) -> Option<Payload> {
    let custom = ev.dyn_ref::<web_sys::CustomEvent>()?;
    let detail = custom.detail();
    let obj = detail.dyn_ref::<js_sys::Object>()?;
    let copy = js_sys::Object::assign(&js_sys::Object::new(), obj);
    let _ = js_sys::Reflect::delete_property(&copy, &JsValue::from_str("elt"));
    match super::js_to_payload(&copy) {
        Some(payload) => Some(payload),
        None => {
            warn!("{} detail is not serializable, sent without it", ev.type_());
            Some(Payload::new())
        }
    }
}

fn wrap_event(ev: &web_sys::Event, fallback: &WebElement) -> DomEvent<WebElement> {
    let target = ev
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(WebElement)
        .unwrap_or_else(|| fallback.clone());
    let mut wrapped = match ev.dyn_ref::<web_sys::KeyboardEvent>() {
        Some(key_ev) => DomEvent::key(&ev.type_(), target, &key_ev.key()),
        None => DomEvent::new(&ev.type_(), target),
    };
    wrapped.detail = event_detail(ev);
    wrapped
}

impl DomElement for WebElement {
    fn id(&self) -> String {
        self.0.id()
    }

    fn tag_name(&self) -> String {
        self.0.tag_name().to_ascii_lowercase()
    }

    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().add_1(class) {
            warn!("add class {class} on {self:?}: {e:?}");
        }
    }

    fn remove_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().remove_1(class) {
            warn!("remove class {class} on {self:?}: {e:?}");
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(e) = self.0.set_attribute(name, value) {
            warn!("set {name} on {self:?}: {e:?}");
        }
    }

    fn parent(&self) -> Option<Self> {
        self.0.parent_element().map(Self)
    }

    fn children(&self) -> Vec<Self> {
        let list = self.0.children();
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(Self)
            .collect()
    }

    fn query_all(&self, selector: &Selector) -> Vec<Self> {
        match self.0.query_selector_all(&selector.to_css()) {
            Ok(nodes) => super::elements(&nodes),
            Err(e) => {
                warn!("query {selector} under {self:?}: {e:?}");
                Vec::new()
            }
        }
    }

    fn closest(&self, selector: &Selector) -> Option<Self> {
        self.0.closest(&selector.to_css()).ok().flatten().map(Self)
    }

    fn text_content(&self) -> String {
        self.0.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, text: &str) {
        self.0.set_text_content(Some(text));
    }

    fn set_content_editable(&self, editable: bool) {
        if let Some(html) = self.html() {
            html.set_content_editable(if editable { "true" } else { "false" });
        }
    }

    fn focus(&self) {
        if let Some(Err(e)) = self.html().map(|h| h.focus()) {
            warn!("focus {self:?}: {e:?}");
        }
    }

    fn blur(&self) {
        if let Some(Err(e)) = self.html().map(|h| h.blur()) {
            warn!("blur {self:?}: {e:?}");
        }
    }

    fn listen(&self, key: ListenerKey, event: &str, handler: Handler<Self>) {
        self.unlisten(key);
        let this = self.clone();
        let callback = Closure::<dyn Fn(web_sys::Event)>::new(move |ev: web_sys::Event| {
            let wrapped = wrap_event(&ev, &this);
            handler(&wrapped);
            if wrapped.default_prevented() {
                ev.prevent_default();
            }
        })
        .into_js_value();

        if let Err(e) = self
            .0
            .add_event_listener_with_callback(event, callback.unchecked_ref())
        {
            warn!("listen {event} on {self:?}: {e:?}");
            return;
        }
        let (fn_slot, event_slot) = Self::slot(key);
        let stored = js_sys::Reflect::set(&self.0, &fn_slot, &callback)
            .and_then(|_| js_sys::Reflect::set(&self.0, &event_slot, &JsValue::from_str(event)));
        if let Err(e) = stored {
            warn!("remember listener {} on {self:?}: {e:?}", key.as_str());
        }
    }

    fn unlisten(&self, key: ListenerKey) {
        let (fn_slot, event_slot) = Self::slot(key);
        let Ok(callback) = js_sys::Reflect::get(&self.0, &fn_slot) else {
            return;
        };
        let Some(callback) = callback.dyn_ref::<js_sys::Function>() else {
            return;
        };
        let event = js_sys::Reflect::get(&self.0, &event_slot)
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        if let Err(e) = self.0.remove_event_listener_with_callback(&event, callback) {
            warn!("unlisten {event} on {self:?}: {e:?}");
        }
        let _ = js_sys::Reflect::delete_property(self.0.unchecked_ref::<js_sys::Object>(), &fn_slot);
        let _ = js_sys::Reflect::delete_property(self.0.unchecked_ref::<js_sys::Object>(), &event_slot);
    }

    fn dataset(&self) -> Vec<(String, String)> {
        self.0
            .get_attribute_names()
            .iter()
            .filter_map(|name| name.as_string())
            .filter_map(|name| {
                let key = dataset_key(&name)?;
                Some((key, self.0.get_attribute(&name).unwrap_or_default()))
            })
            .collect()
    }
}
