use crate::error::{Error, Result};
use crate::platform::Platform;
use log::debug;
use serde_json::Value;
use std::rc::Rc;
use strum::{EnumString, IntoStaticStr};

/// Intent detail and request parameters share one shape: string keys, JSON scalars (and the
/// occasional array of ids).
pub type Payload = serde_json::Map<String, Value>;

/// Intents raised by the built-in translators and commands, without the reserved prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum IntentKind {
    HandleItemReordering,
    HandleItemTextUpdate,
    HandleNewItemInsert,
    HandleTodoListTitleUpdate,
    FeHandleItemMove,
    FileReady,
    HandleFileDeletes,
    HandleFileRename,
}

/// A completed gesture, ready to be handed to the event bus.
#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    name: String,
    payload: Payload,
}

impl Intent {
    pub fn new(prefix: &str, kind: IntentKind) -> Self {
        let kind: &'static str = kind.into();
        Self {
            name: format!("{prefix}{kind}"),
            payload: Payload::new(),
        }
    }

    /// An application-defined intent; the name must carry `prefix`.
    pub fn named(prefix: &str, name: &str) -> Result<Self> {
        if prefix.is_empty() || !name.starts_with(prefix) || name.len() == prefix.len() {
            return Err(Error::InvalidIntentName {
                name: name.to_string(),
                prefix: prefix.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            payload: Payload::new(),
        })
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload.extend(payload);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }
}

/// Hands intents to the rendering system's event bus.
pub struct Dispatcher<P: Platform> {
    platform: Rc<P>,
    prefix: String,
}

impl<P: Platform> Dispatcher<P> {
    pub fn new(platform: Rc<P>, prefix: &str) -> Self {
        Self {
            platform,
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn intent(&self, kind: IntentKind) -> Intent {
        Intent::new(&self.prefix, kind)
    }

    pub fn raise(&self, target: &P::Element, intent: Intent) {
        debug!("raise {} on {:?} {:?}", intent.name, target, intent.payload);
        self.platform.trigger(target, &intent.name, intent.payload);
    }
}
