//! Per-request parameter computation.
//!
//! Every request the rendering system is about to send passes through [`Enricher::configure`].
//! Parameters are merged from three sources, later ones winning:
//!
//! 1. the scope of the triggering element, under the render key;
//! 2. the triggering element's `data-*` attributes;
//! 3. for intent events, the intent detail, with the render key defaulting to the event name.
//!
//! Nothing is cached: scope and data attributes are re-read for every request.

use crate::config::ClientConfig;
use crate::dom::{DomElement, Selector};
use crate::intent::Payload;
use crate::platform::Platform;
use log::{debug, warn};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// The event that caused a request.
#[derive(Clone, Debug)]
pub struct Trigger<E> {
    pub kind: String,
    pub target: E,
    pub detail: Option<Payload>,
}

impl<E> Trigger<E> {
    pub fn native(kind: &str, target: E) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            detail: None,
        }
    }

    pub fn intent(kind: &str, target: E, detail: Payload) -> Self {
        Self {
            kind: kind.to_string(),
            target,
            detail: Some(detail),
        }
    }
}

/// A request being configured: what the transport pre-filled plus what the pipeline adds.
#[derive(Clone, Debug)]
pub struct PendingRequest<E> {
    pub trigger: Trigger<E>,
    /// The element issuing the request. Busy state is shown here, and guards match on it.
    pub source: E,
    pub parameters: Payload,
    pub headers: BTreeMap<String, String>,
    pub cancelled: bool,
}

impl<E: Clone> PendingRequest<E> {
    pub fn new(trigger: Trigger<E>) -> Self {
        Self {
            source: trigger.target.clone(),
            trigger,
            parameters: Payload::new(),
            headers: BTreeMap::new(),
            cancelled: false,
        }
    }

    /// Issued by `source` rather than by the element the event reached, as when a bubbling
    /// intent from a list item is sent by the list.
    pub fn with_source(mut self, source: E) -> Self {
        self.source = source;
        self
    }
}

/// Element-specific last word on a request: may add parameters or cancel it.
pub trait RequestGuard<E> {
    fn review(&self, request: &mut PendingRequest<E>);
}

struct GuardSlot<E> {
    name: &'static str,
    element_id: String,
    guard: Rc<dyn RequestGuard<E>>,
}

pub struct Enricher<P: Platform> {
    platform: Rc<P>,
    config: Rc<ClientConfig>,
    guards: RefCell<Vec<GuardSlot<P::Element>>>,
    busy: BusyTracker<P>,
}

impl<P: Platform> Enricher<P> {
    pub fn new(platform: Rc<P>, config: Rc<ClientConfig>) -> Self {
        let busy = BusyTracker::new(platform.clone(), config.clone());
        Self {
            platform,
            config,
            guards: RefCell::new(Vec::new()),
            busy,
        }
    }

    pub fn busy(&self) -> &BusyTracker<P> {
        &self.busy
    }

    pub fn is_intent(&self, kind: &str) -> bool {
        let prefix = &self.config.intent_prefix;
        !prefix.is_empty() && kind.starts_with(prefix.as_str())
    }

    /// Value of the nearest scope marker above `el`: the marker itself, or the marked element's
    /// id when the marker is empty.
    pub fn resolve_scope(&self, el: &P::Element) -> Option<String> {
        let attr = format!("data-{}", self.config.scope_attribute);
        let scope_el = el.closest(&Selector::has_attr(&attr))?;
        match scope_el.attribute(&attr) {
            Some(v) if !v.is_empty() => Some(v),
            _ => Some(scope_el.id()),
        }
    }

    pub fn parameters(&self, trigger: &Trigger<P::Element>) -> Payload {
        let render_key = self.config.render_key.as_str();
        let mut params = Payload::new();

        match self.resolve_scope(&trigger.target) {
            Some(scope) => {
                params.insert(render_key.to_string(), Value::String(scope));
            }
            None => warn!("no scope above {:?} for {}", trigger.target, trigger.kind),
        }

        for (key, value) in trigger.target.dataset() {
            params.insert(key, Value::String(value));
        }

        if self.is_intent(&trigger.kind) {
            let mut detail = trigger.detail.clone().unwrap_or_default();
            if !has_value(detail.get(render_key)) {
                detail.insert(render_key.to_string(), Value::String(trigger.kind.clone()));
            }
            params.extend(detail);
        }

        params
    }

    pub fn configure(&self, request: &mut PendingRequest<P::Element>) {
        let computed = self.parameters(&request.trigger);
        request.parameters.extend(computed);
        request.headers.insert(
            self.config.trigger_header.clone(),
            request.trigger.kind.clone(),
        );

        let guards: Vec<Rc<dyn RequestGuard<P::Element>>> = self
            .guards
            .borrow()
            .iter()
            .filter(|slot| {
                request
                    .source
                    .closest(&Selector::id(&slot.element_id))
                    .is_some()
            })
            .map(|slot| slot.guard.clone())
            .collect();
        for guard in guards {
            guard.review(request);
            if request.cancelled {
                debug!("request for {} cancelled", request.trigger.kind);
                return;
            }
        }

        self.busy.mark(&request.source);
        debug!(
            "configured {} on {:?}: {:?}",
            request.trigger.kind, request.trigger.target, request.parameters
        );
    }

    /// Install `guard` for requests issued at or below `#element_id`. A guard already
    /// installed under `name` is replaced.
    pub fn install_guard(
        &self,
        name: &'static str,
        element_id: &str,
        guard: Rc<dyn RequestGuard<P::Element>>,
    ) {
        let mut guards = self.guards.borrow_mut();
        guards.retain(|slot| slot.name != name);
        guards.push(GuardSlot {
            name,
            element_id: element_id.to_string(),
            guard,
        });
    }

    pub fn guard_count(&self) -> usize {
        self.guards.borrow().len()
    }

    pub fn platform(&self) -> &Rc<P> {
        &self.platform
    }
}

fn has_value(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Marks companion indicators of in-flight requests.
pub struct BusyTracker<P: Platform> {
    platform: Rc<P>,
    config: Rc<ClientConfig>,
    marked: RefCell<Vec<P::Element>>,
}

impl<P: Platform> BusyTracker<P> {
    fn new(platform: Rc<P>, config: Rc<ClientConfig>) -> Self {
        Self {
            platform,
            config,
            marked: RefCell::new(Vec::new()),
        }
    }

    fn class(&self) -> String {
        self.platform
            .request_class()
            .unwrap_or_else(|| self.config.request_class.clone())
    }

    /// `#<id>-indicator` when present, else the element itself.
    pub fn indicator_for(&self, el: &P::Element) -> P::Element {
        let id = el.id();
        if !id.is_empty() {
            let indicator_id = format!("{id}{}", self.config.indicator_suffix);
            if let Some(indicator) = self.platform.element_by_id(&indicator_id) {
                return indicator;
            }
        }
        el.clone()
    }

    pub fn mark(&self, el: &P::Element) {
        let indicator = self.indicator_for(el);
        indicator.add_class(&self.class());
        let mut marked = self.marked.borrow_mut();
        if !marked.contains(&indicator) {
            marked.push(indicator);
        }
    }

    /// Clear the indicator of `el`, or every indicator when the completion can't be
    /// attributed to an element.
    pub fn finish(&self, el: Option<&P::Element>) {
        let class = self.class();
        let mut marked = self.marked.borrow_mut();
        match el {
            Some(el) => {
                let indicator = self.indicator_for(el);
                indicator.remove_class(&class);
                marked.retain(|m| m != &indicator);
            }
            None => {
                for m in marked.drain(..) {
                    m.remove_class(&class);
                }
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.marked.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemElement;
    use crate::platform::headless::HeadlessPlatform;
    use serde_json::json;

    fn setup() -> (Rc<HeadlessPlatform>, Enricher<HeadlessPlatform>) {
        let platform = Rc::new(HeadlessPlatform::new());
        let enricher = Enricher::new(platform.clone(), Rc::new(ClientConfig::new()));
        (platform, enricher)
    }

    fn payload(v: serde_json::Value) -> Payload {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn test_intent_payload_beats_data_attributes_beats_scope() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("div").with_attr("data-scope", "S");
        let button = MemElement::new("button").with_attr("data-render", "foo");
        scope.append(&button);
        platform.body().append(&scope);

        let scope_only = enricher.parameters(&Trigger::native("click", scope.clone()));
        assert_eq!(scope_only["render"], json!("S"));

        let native = enricher.parameters(&Trigger::native("click", button.clone()));
        assert_eq!(native["render"], json!("foo"));

        let intent = enricher.parameters(&Trigger::intent(
            "@handle-thing",
            button,
            payload(json!({ "render": "bar" })),
        ));
        assert_eq!(intent["render"], json!("bar"));
    }

    #[test]
    fn test_parameters_from_target_busy_on_source() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("div").with_attr("data-scope", "S");
        let list = MemElement::new("ul").with_id("todo-list");
        let indicator = MemElement::new("span").with_id("todo-list-indicator");
        let item = MemElement::new("li").with_id("i1").with_attr("data-text", "milk");
        list.append(&item);
        scope.append(&list);
        scope.append(&indicator);
        platform.body().append(&scope);

        let mut req = PendingRequest::new(Trigger::intent(
            "@handle-item-reordering",
            item.clone(),
            payload(json!({ "movedItem": "i1" })),
        ))
        .with_source(list.clone());
        enricher.configure(&mut req);

        assert_eq!(req.parameters["text"], json!("milk"));
        assert_eq!(req.parameters["movedItem"], json!("i1"));
        assert_eq!(req.parameters["render"], json!("@handle-item-reordering"));
        assert!(indicator.has_class("htmx-request"));
        assert!(!item.has_class("htmx-request"));

        enricher.busy().finish(Some(&list));
        assert!(!indicator.has_class("htmx-request"));
        assert_eq!(enricher.busy().pending(), 0);
    }

    #[test]
    fn test_render_defaults_to_intent_name() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("div").with_attr("data-scope", "S");
        let item = MemElement::new("li").with_id("i1").with_attr("data-text", "milk");
        scope.append(&item);
        platform.body().append(&scope);

        let params = enricher.parameters(&Trigger::intent(
            "@handle-item-text-update",
            item.clone(),
            Payload::new(),
        ));
        assert_eq!(params["render"], json!("@handle-item-text-update"));
        assert_eq!(params["text"], json!("milk"));

        // Empty render counts as missing.
        let params = enricher.parameters(&Trigger::intent(
            "@x",
            item,
            payload(json!({ "render": "" })),
        ));
        assert_eq!(params["render"], json!("@x"));
    }

    #[test]
    fn test_native_event_ignores_detail() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("div").with_attr("data-scope", "S");
        platform.body().append(&scope);
        let trigger = Trigger {
            kind: "click".to_string(),
            target: scope,
            detail: Some(payload(json!({ "render": "nope", "x": 1 }))),
        };
        let params = enricher.parameters(&trigger);
        assert_eq!(params["render"], json!("S"));
        assert!(!params.contains_key("x"));
    }

    #[test]
    fn test_scope_falls_back_to_id_and_is_recomputed() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("section")
            .with_id("todo-page")
            .with_attr("data-scope", "");
        let button = MemElement::new("button");
        scope.append(&button);
        platform.body().append(&scope);

        let trigger = Trigger::native("click", button.clone());
        assert_eq!(enricher.parameters(&trigger)["render"], json!("todo-page"));

        scope.set_attribute("data-scope", "renamed");
        button.set_data("extra", "1");
        let params = enricher.parameters(&trigger);
        assert_eq!(params["render"], json!("renamed"));
        assert_eq!(params["extra"], json!("1"));
    }

    #[test]
    fn test_missing_scope_omits_render() {
        let (platform, enricher) = setup();
        let button = MemElement::new("button");
        platform.body().append(&button);
        let params = enricher.parameters(&Trigger::native("click", button));
        assert!(params.is_empty());
    }

    #[test]
    fn test_configure_sets_header_and_overrides_transport_values() {
        let (platform, enricher) = setup();
        let scope = MemElement::new("div").with_attr("data-scope", "S");
        let item = MemElement::new("li").with_id("i1");
        scope.append(&item);
        platform.body().append(&scope);

        let mut req = PendingRequest::new(Trigger::intent(
            "@handle-new-item-insert",
            item.clone(),
            Payload::new(),
        ));
        req.parameters.insert("render".to_string(), json!("form-value"));
        req.parameters.insert("title".to_string(), json!("kept"));
        enricher.configure(&mut req);

        assert_eq!(req.parameters["render"], json!("@handle-new-item-insert"));
        assert_eq!(req.parameters["title"], json!("kept"));
        assert_eq!(
            req.headers.get("HX-Trigger-Event").map(String::as_str),
            Some("@handle-new-item-insert")
        );
        assert!(item.has_class("htmx-request"));
        assert_eq!(enricher.busy().pending(), 1);
    }

    struct Cancel;

    impl RequestGuard<MemElement> for Cancel {
        fn review(&self, request: &mut PendingRequest<MemElement>) {
            request.cancelled = true;
        }
    }

    #[test]
    fn test_guard_applies_only_to_its_element_and_is_replaced_by_name() {
        let (platform, enricher) = setup();
        let link = MemElement::new("a").with_id("new-list-link");
        let other = MemElement::new("a").with_id("other");
        platform.body().append(&link);
        platform.body().append(&other);

        enricher.install_guard("cancel", "new-list-link", Rc::new(Cancel));
        enricher.install_guard("cancel", "new-list-link", Rc::new(Cancel));
        assert_eq!(enricher.guard_count(), 1);

        let mut req = PendingRequest::new(Trigger::native("click", link.clone()));
        enricher.configure(&mut req);
        assert!(req.cancelled);
        assert!(!link.has_class("htmx-request"));

        let mut req = PendingRequest::new(Trigger::native("click", other.clone()));
        enricher.configure(&mut req);
        assert!(!req.cancelled);
        assert!(other.has_class("htmx-request"));
    }

    #[test]
    fn test_busy_uses_companion_indicator() {
        let (platform, enricher) = setup();
        let input = MemElement::new("input").with_id("upload");
        let indicator = MemElement::new("span").with_id("upload-indicator");
        platform.body().append(&input);
        platform.body().append(&indicator);

        enricher.busy().mark(&input);
        assert!(indicator.has_class("htmx-request"));
        assert!(!input.has_class("htmx-request"));

        enricher.busy().finish(Some(&input));
        assert!(!indicator.has_class("htmx-request"));
        assert_eq!(enricher.busy().pending(), 0);
    }

    #[test]
    fn test_unattributed_finish_clears_everything() {
        let (platform, enricher) = setup();
        let a = MemElement::new("button").with_id("a");
        let b = MemElement::new("button").with_id("b");
        platform.body().append(&a);
        platform.body().append(&b);
        enricher.busy().mark(&a);
        enricher.busy().mark(&b);
        enricher.busy().mark(&b);
        assert_eq!(enricher.busy().pending(), 2);

        enricher.busy().finish(None);
        assert!(!a.has_class("htmx-request"));
        assert!(!b.has_class("htmx-request"));
        assert_eq!(enricher.busy().pending(), 0);
    }
}
