use crate::bridge::Context;
use crate::dom::{handler, DomElement, DomEvent, ListenerKey, Selector};
use crate::intent::{IntentKind, Payload};
use crate::lifecycle::Translator;
use crate::platform::{Platform, SelectedFile};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::FutureExt;
use log::{debug, warn};
use serde_json::Value;
use std::rc::Rc;

const FILE_CHANGE: ListenerKey = ListenerKey("file-select");

/// Upload payload for `file` picked in the input `id`, namespaced by that id so several inputs
/// can share one server handler.
pub fn file_payload(id: &str, file: &SelectedFile) -> Payload {
    let mut payload = Payload::new();
    payload.insert(id.to_string(), Value::String(STANDARD.encode(&file.bytes)));
    payload.insert(format!("{id}_filename"), Value::String(file.name.clone()));
    payload.insert(format!("{id}_filesize"), Value::from(file.size));
    payload.insert(format!("{id}_filetype"), Value::String(file.mime.clone()));
    payload
}

/// Reads the selection of one file input and raises `file-ready` once the bytes are in.
pub struct FileSelection<P: Platform> {
    ctx: Rc<Context<P>>,
    input: P::Element,
}

impl<P: Platform> FileSelection<P> {
    pub fn new(ctx: Rc<Context<P>>, input: P::Element) -> Rc<Self> {
        Rc::new(Self { ctx, input })
    }

    pub fn attach(self: &Rc<Self>) {
        let this = self.clone();
        self.input.listen(
            FILE_CHANGE,
            "change",
            handler(move |_: &DomEvent<P::Element>| this.on_change()),
        );
    }

    pub fn on_change(self: &Rc<Self>) {
        if self.input.id().is_empty() {
            warn!("file input {:?} has no id, selection ignored", self.input);
            return;
        }
        let read = self.ctx.platform.read_file(&self.input);
        let this = self.clone();
        self.ctx.platform.spawn_local(
            async move {
                match read.await {
                    Ok(Some(file)) => this.ready(&file),
                    Ok(None) => debug!("no file selected in {:?}", this.input),
                    Err(e) => warn!("{e}"),
                }
            }
            .boxed_local(),
        );
    }

    fn ready(&self, file: &SelectedFile) {
        let mut payload = file_payload(&self.input.id(), file);
        if let Some(scope) = self.ctx.enricher.resolve_scope(&self.input) {
            payload.insert(self.ctx.config.render_key.clone(), Value::String(scope));
        }
        self.ctx.enricher.busy().mark(&self.input);
        let intent = self
            .ctx
            .dispatcher
            .intent(IntentKind::FileReady)
            .with_payload(payload);
        self.ctx.dispatcher.raise(&self.input, intent);
    }
}

/// Binds [`FileSelection`] to every file input of a fragment.
pub struct FileSelectTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> FileSelectTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for FileSelectTranslator<P> {
    fn name(&self) -> &'static str {
        "file-select"
    }

    fn targets(&self, fragment: &P::Element) -> Vec<P::Element> {
        fragment.query_inclusive(&Selector::tag("input").with_attr("type", "file"))
    }

    fn attach(&self, input: &P::Element) {
        FileSelection::new(self.ctx.clone(), input.clone()).attach();
    }
}
