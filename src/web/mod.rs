//! Browser entry point: htmx hooks, SortableJS controllers, and the functions pages call.

mod element;
mod platform;

pub use element::{event_detail, WebElement};
pub use platform::WebPlatform;

use crate::bridge::Bridge;
use crate::config::ClientConfig;
use crate::debounce::{Debouncer, Scheduler};
use crate::dom::DomElement;
use crate::enrich::{PendingRequest, Trigger};
use crate::error::{Error, Result};
use crate::intent::Payload;
use crate::platform::Platform;
use leptos::ev;
use leptos_dom::helpers::window_event_listener;
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

const UNLOAD_PROMPT: &str = "Leave this page?";

thread_local! {
    static BRIDGE: RefCell<Option<Rc<Bridge<WebPlatform>>>> = const { RefCell::new(None) };
}

impl From<Error> for JsValue {
    fn from(e: Error) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

pub(crate) fn js_error(e: JsValue) -> Error {
    Error::Js(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

pub(crate) fn js_to_payload(value: &JsValue) -> Option<Payload> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    let json = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&json).ok()
}

pub(crate) fn payload_to_js(payload: &Payload) -> Result<JsValue> {
    let json = serde_json::to_string(payload)?;
    js_sys::JSON::parse(&json).map_err(js_error)
}

pub(crate) fn elements(nodes: &web_sys::NodeList) -> Vec<WebElement> {
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|n| n.dyn_into::<web_sys::Element>().ok())
        .map(WebElement)
        .collect()
}

fn get(target: &JsValue, key: &str) -> JsValue {
    js_sys::Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Reads `window.BAGUETTE`; absent keys keep their defaults.
pub fn load_config() -> Result<ClientConfig> {
    let Some(window) = web_sys::window() else {
        return Ok(ClientConfig::new());
    };
    let value = get(&window, "BAGUETTE");
    if value.is_undefined() || value.is_null() || !value.is_object() {
        return Ok(ClientConfig::new());
    }
    let json = js_sys::JSON::stringify(&value)
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    ClientConfig::from_json(&json)
}

/// Timers on `window`.
pub struct WebScheduler {
    window: web_sys::Window,
}

impl WebScheduler {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| Error::MissingElement("window".into()))?;
        Ok(Self { window })
    }
}

impl Scheduler for WebScheduler {
    fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> i32 {
        let cb = Closure::once_into_js(move || callback());
        self.window
            .set_timeout_with_callback_and_timeout_and_arguments_0(cb.unchecked_ref(), delay_ms)
            .unwrap_or(0)
    }

    fn clear_timeout(&self, handle: i32) {
        self.window.clear_timeout_with_handle(handle);
    }
}

/// Debounced wrapper around a page function: `new Debounce(fn, 300).call(arg)`.
#[wasm_bindgen]
pub struct Debounce {
    inner: Debouncer<WebScheduler, JsValue>,
}

#[wasm_bindgen]
impl Debounce {
    #[wasm_bindgen(constructor)]
    pub fn new(func: js_sys::Function, wait_ms: i32) -> std::result::Result<Debounce, JsValue> {
        let scheduler = Rc::new(WebScheduler::new()?);
        let inner = Debouncer::new(scheduler, wait_ms, move |arg: JsValue| {
            if let Err(e) = func.call1(&JsValue::NULL, &arg) {
                warn!("debounced call failed: {}", js_error(e));
            }
        });
        Ok(Self { inner })
    }

    pub fn call(&self, arg: JsValue) {
        self.inner.call(arg);
    }

    pub fn cancel(&self) {
        self.inner.cancel();
    }

    #[wasm_bindgen(getter)]
    pub fn pending(&self) -> bool {
        self.inner.is_pending()
    }
}

fn with_bridge<T>(f: impl FnOnce(&Bridge<WebPlatform>) -> Result<T>) -> std::result::Result<T, JsValue> {
    let bridge = BRIDGE
        .with(|b| b.borrow().clone())
        .ok_or_else(|| Error::MissingElement("bridge".into()))?;
    Ok(f(&bridge)?)
}

#[wasm_bindgen]
pub fn delete_selected_files() -> std::result::Result<bool, JsValue> {
    with_bridge(|b| b.delete_selected_files())
}

#[wasm_bindgen]
pub fn rename_selected_file() -> std::result::Result<bool, JsValue> {
    with_bridge(|b| b.rename_selected_file())
}

/// Raise an intent from page script on `#target_id`.
#[wasm_bindgen]
pub fn raise_intent(target_id: &str, name: &str, detail: JsValue) -> std::result::Result<(), JsValue> {
    with_bridge(|b| {
        let target = b
            .context()
            .platform
            .element_by_id(target_id)
            .ok_or_else(|| Error::MissingElement(target_id.to_string()))?;
        b.raise(&target, name, js_to_payload(&detail).unwrap_or_default())
    })
}

/// The request htmx is building, as seen from its `configRequest`/`wsConfigSend` detail.
///
/// `elt` is the element issuing the request. Parameters are read from the element the
/// triggering event reached, which for a bubbling intent is a descendant of `elt`.
fn pending_request(detail: &JsValue) -> Option<PendingRequest<WebElement>> {
    let source = WebElement::from_js(get(detail, "elt"))?;
    let triggering = get(detail, "triggeringEvent");
    let trigger = match triggering.dyn_ref::<web_sys::Event>() {
        Some(ev) => {
            let target = ev
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                .map(WebElement)
                .unwrap_or_else(|| source.clone());
            match event_detail(ev) {
                Some(intent_detail) => Trigger::intent(&ev.type_(), target, intent_detail),
                None => Trigger::native(&ev.type_(), target),
            }
        }
        None => Trigger::native("", source.clone()),
    };
    Some(PendingRequest::new(trigger).with_source(source))
}

fn write_back(detail: &JsValue, request: &PendingRequest<WebElement>) -> Result<()> {
    let parameters = get(detail, "parameters");
    for (key, value) in &request.parameters {
        let value = match value {
            serde_json::Value::String(s) => JsValue::from_str(s),
            other => js_sys::JSON::parse(&other.to_string()).map_err(js_error)?,
        };
        js_sys::Reflect::set(&parameters, &JsValue::from_str(key), &value).map_err(js_error)?;
    }
    let headers = get(detail, "headers");
    for (name, value) in &request.headers {
        js_sys::Reflect::set(&headers, &JsValue::from_str(name), &JsValue::from_str(value))
            .map_err(js_error)?;
    }
    Ok(())
}

fn on_config_request(bridge: &Bridge<WebPlatform>, ev: &web_sys::Event) {
    let Some(custom) = ev.dyn_ref::<web_sys::CustomEvent>() else {
        return;
    };
    let detail = custom.detail();
    let Some(mut request) = pending_request(&detail) else {
        warn!("{} without a source element", ev.type_());
        return;
    };
    bridge.configure_request(&mut request);
    if request.cancelled {
        ev.prevent_default();
        return;
    }
    if let Err(e) = write_back(&detail, &request) {
        warn!("{}: {e}", ev.type_());
    }
}

fn listen_on(target: &web_sys::Element, event: &str, f: impl Fn(&web_sys::Event) + 'static) {
    let callback = Closure::<dyn Fn(web_sys::Event)>::new(move |ev: web_sys::Event| f(&ev));
    if let Err(e) = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
        warn!("listen {event}: {}", js_error(e));
    }
    // Page lifetime.
    callback.forget();
}

fn prompt_on_unload(ev: &web_sys::BeforeUnloadEvent) {
    ev.prevent_default();
    // Some browsers only prompt for a non-empty value.
    ev.set_return_value(UNLOAD_PROMPT);
}

fn install(bridge: Rc<Bridge<WebPlatform>>) -> Result<()> {
    let body = bridge.context().platform.body();

    for event in ["htmx:configRequest", "htmx:wsConfigSend"] {
        let b = bridge.clone();
        listen_on(&body.0, event, move |ev| on_config_request(&b, ev));
    }
    let b = bridge.clone();
    listen_on(&body.0, "htmx:afterRequest", move |ev| {
        let source = ev
            .dyn_ref::<web_sys::CustomEvent>()
            .and_then(|c| WebElement::from_js(get(&c.detail(), "elt")));
        b.request_finished(source.as_ref());
    });
    let b = bridge.clone();
    listen_on(&body.0, "htmx:wsAfterMessage", move |_| b.request_finished(None));

    if bridge.config().confirm_unload {
        let _unload = window_event_listener(ev::beforeunload, |ev| prompt_on_unload(&ev));
    }

    let b = bridge.clone();
    let on_load = Closure::<dyn Fn(JsValue)>::new(move |elt: JsValue| match WebElement::from_js(elt) {
        Some(fragment) => b.on_load(&fragment),
        None => warn!("onLoad with a non-element"),
    });
    platform::htmx_on_load(on_load.as_ref().unchecked_ref()).map_err(js_error)?;
    on_load.forget();

    // htmx only reports loads after registration; a body it already initialised is walked here.
    let state = bridge.context().platform.document().ready_state();
    if state != "loading" {
        bridge.on_load(&body);
    }
    Ok(())
}

// Only register the start function for normal builds, wasm-bindgen-test brings its own entry.
#[cfg_attr(not(test), wasm_bindgen(start))]
pub fn start() -> std::result::Result<(), JsValue> {
    console_error_panic_hook::set_once();
    let config = load_config();
    let level = config.as_ref().map(|c| c.log_level()).unwrap_or(log::LevelFilter::Info);
    crate::logging::init(level);
    let config = config.unwrap_or_else(|e| {
        warn!("BAGUETTE ignored: {e}");
        ClientConfig::new()
    });

    let platform = Rc::new(WebPlatform::new()?);
    let bridge = Rc::new(Bridge::new(platform, config));
    install(bridge.clone())?;
    BRIDGE.with(|b| b.replace(Some(bridge)));
    info!("baguette client ready");
    Ok(())
}
