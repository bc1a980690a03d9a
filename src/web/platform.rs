use super::element::WebElement;
use super::{js_error, payload_to_js};
use crate::dom::{DomElement, Selector};
use crate::error::{Error, Result};
use crate::intent::Payload;
use crate::platform::{DragEnd, DragRemove, Platform, SelectedFile, SortHooks, SortOptions};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = htmx, js_name = trigger)]
    fn htmx_trigger(elt: &web_sys::Element, name: &str, detail: &JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = htmx, js_name = process)]
    fn htmx_process(elt: &web_sys::Element) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = htmx, js_name = onLoad)]
    pub(super) fn htmx_on_load(callback: &js_sys::Function) -> std::result::Result<(), JsValue>;

    type Sortable;

    #[wasm_bindgen(catch, constructor)]
    fn new(el: &web_sys::Element, options: &JsValue) -> std::result::Result<Sortable, JsValue>;

    #[wasm_bindgen(catch, static_method_of = Sortable, js_name = get)]
    fn get(el: &web_sys::Element) -> std::result::Result<Option<Sortable>, JsValue>;

    #[wasm_bindgen(method)]
    fn destroy(this: &Sortable);
}

/// The live document with htmx and SortableJS loaded.
pub struct WebPlatform {
    window: web_sys::Window,
    document: web_sys::Document,
    body: WebElement,
}

impl WebPlatform {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::MissingElement("window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::MissingElement("document".into()))?;
        let body = document
            .body()
            .ok_or_else(|| Error::MissingElement("body".into()))?;
        Ok(Self {
            window,
            document,
            body: WebElement(body.into()),
        })
    }

    pub fn document(&self) -> &web_sys::Document {
        &self.document
    }
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) {
    if let Err(e) = js_sys::Reflect::set(target, &JsValue::from_str(key), value) {
        warn!("set option {key}: {e:?}");
    }
}

fn get(target: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn index(evt: &JsValue, key: &str) -> usize {
    get(evt, key).as_f64().map(|v| v.max(0.0) as usize).unwrap_or(0)
}

fn sortable_options(options: &SortOptions, hooks: SortHooks<WebElement>) -> js_sys::Object {
    let obj = js_sys::Object::new();
    set(&obj, "animation", &JsValue::from(options.animation_ms));
    if let Some(handle) = &options.handle {
        set(&obj, "handle", &JsValue::from_str(&format!(".{handle}")));
    }
    if let Some(draggable) = &options.draggable {
        set(&obj, "draggable", &JsValue::from_str(draggable));
    }
    if let Some(group) = &options.group {
        set(&obj, "group", &JsValue::from_str(group));
    }
    set(&obj, "sort", &JsValue::from_bool(options.sort));
    set(&obj, "forceFallback", &JsValue::from_bool(options.force_fallback));
    set(&obj, "fallbackOnBody", &JsValue::from_bool(options.fallback_on_body));
    if let Some(threshold) = options.empty_insert_threshold {
        set(&obj, "emptyInsertThreshold", &JsValue::from(threshold));
    }

    if let Some(on_end) = hooks.on_end {
        let callback = Closure::<dyn Fn(JsValue)>::new(move |evt: JsValue| {
            on_end(DragEnd {
                old_index: index(&evt, "oldIndex"),
                new_index: index(&evt, "newIndex"),
            });
        });
        set(&obj, "onEnd", &callback.into_js_value());
    }
    if let Some(on_remove) = hooks.on_remove {
        let callback = Closure::<dyn Fn(JsValue)>::new(move |evt: JsValue| {
            let (Some(from), Some(to), Some(item)) = (
                WebElement::from_js(get(&evt, "from")),
                WebElement::from_js(get(&evt, "to")),
                WebElement::from_js(get(&evt, "item")),
            ) else {
                warn!("drag remove without from/to/item");
                return;
            };
            on_remove(DragRemove { from, to, item });
        });
        set(&obj, "onRemove", &callback.into_js_value());
    }
    obj
}

impl Platform for WebPlatform {
    type Element = WebElement;

    fn body(&self) -> WebElement {
        self.body.clone()
    }

    fn element_by_id(&self, id: &str) -> Option<WebElement> {
        self.document.get_element_by_id(id).map(WebElement)
    }

    fn query_all(&self, selector: &Selector) -> Vec<WebElement> {
        match self.document.query_selector_all(&selector.to_css()) {
            Ok(nodes) => super::elements(&nodes),
            Err(e) => {
                warn!("query {selector}: {e:?}");
                Vec::new()
            }
        }
    }

    fn trigger(&self, target: &WebElement, event: &str, detail: Payload) {
        let sent = payload_to_js(&detail)
            .and_then(|detail| htmx_trigger(&target.0, event, &detail).map_err(js_error));
        if let Err(e) = sent {
            warn!("trigger {event} on {target:?}: {e}");
        }
    }

    fn process(&self, element: &WebElement) {
        if let Err(e) = htmx_process(&element.0) {
            warn!("process {element:?}: {}", js_error(e));
        }
    }

    fn request_class(&self) -> Option<String> {
        let htmx = get(&self.window, "htmx");
        get(&get(&htmx, "config"), "requestClass").as_string()
    }

    fn enroll_sortable(&self, container: &WebElement, options: &SortOptions, hooks: SortHooks<WebElement>) {
        match Sortable::get(&container.0) {
            Ok(Some(existing)) => existing.destroy(),
            Ok(None) => {}
            Err(e) => {
                warn!("Sortable unavailable: {}", js_error(e));
                return;
            }
        }
        if let Err(e) = Sortable::new(&container.0, &sortable_options(options, hooks)) {
            warn!("enroll {container:?}: {}", js_error(e));
        }
    }

    fn confirm(&self, message: &str) -> bool {
        self.window.confirm_with_message(message).unwrap_or(false)
    }

    fn prompt(&self, message: &str) -> Option<String> {
        self.window.prompt_with_message(message).ok().flatten()
    }

    fn read_file(&self, input: &WebElement) -> LocalBoxFuture<'static, Result<Option<SelectedFile>>> {
        let id = input.id();
        let file = input
            .0
            .dyn_ref::<web_sys::HtmlInputElement>()
            .and_then(|i| i.files())
            .and_then(|files| files.get(0));
        async move {
            let Some(file) = file else {
                return Ok(None);
            };
            let buffer = JsFuture::from(file.array_buffer())
                .await
                .map_err(|e| Error::FileRead {
                    input: id,
                    message: js_error(e).to_string(),
                })?;
            Ok(Some(SelectedFile {
                name: file.name(),
                size: file.size() as u64,
                mime: file.type_(),
                bytes: js_sys::Uint8Array::new(&buffer).to_vec(),
            }))
        }
        .boxed_local()
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        leptos::task::spawn_local(task);
    }
}
