//! Page-level commands of the file manager and todo views.

use crate::bridge::Context;
use crate::dom::{handler, DomElement, DomEvent, ListenerKey, Selector};
use crate::enrich::{PendingRequest, RequestGuard};
use crate::error::{Error, Result};
use crate::intent::IntentKind;
use crate::lifecycle::Translator;
use crate::platform::Platform;
use log::debug;
use serde_json::Value;
use std::rc::Rc;

const RENAME_FOCUS_OUT: ListenerKey = ListenerKey("file-rename-commit");

pub const NEW_LIST_PROMPT: &str = "Create a list";
pub const DELETE_CONFIRM: &str = "Delete the currently selected files?";

/// Asks for the new list's name before the create request leaves.
pub struct NewListPrompt<P: Platform> {
    platform: Rc<P>,
}

impl<P: Platform> NewListPrompt<P> {
    pub fn new(platform: Rc<P>) -> Self {
        Self { platform }
    }
}

impl<P: Platform> RequestGuard<P::Element> for NewListPrompt<P> {
    fn review(&self, request: &mut PendingRequest<P::Element>) {
        loop {
            let Some(answer) = self.platform.prompt(NEW_LIST_PROMPT) else {
                request.cancelled = true;
                return;
            };
            let name = answer.trim();
            if !name.is_empty() {
                request
                    .parameters
                    .insert("name".to_string(), Value::String(name.to_string()));
                return;
            }
        }
    }
}

/// Installs [`NewListPrompt`] whenever the new-list link is in the document.
pub struct NewListTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> NewListTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for NewListTranslator<P> {
    fn name(&self) -> &'static str {
        "new-list"
    }

    fn targets(&self, _fragment: &P::Element) -> Vec<P::Element> {
        self.ctx
            .platform
            .element_by_id(&self.ctx.config.markup.new_list_link_id)
            .into_iter()
            .collect()
    }

    fn attach(&self, link: &P::Element) {
        self.ctx.enricher.install_guard(
            "new-list-prompt",
            &link.id(),
            Rc::new(NewListPrompt::new(self.ctx.platform.clone())),
        );
    }
}

fn context_menu<P: Platform>(ctx: &Context<P>) -> Result<P::Element> {
    let id = &ctx.config.markup.context_menu_id;
    ctx.platform
        .element_by_id(id)
        .ok_or_else(|| Error::MissingElement(id.clone()))
}

/// Ask before deleting the selected entries. Returns whether a delete was requested.
pub fn delete_selected_files<P: Platform>(ctx: &Rc<Context<P>>) -> Result<bool> {
    let selected = ctx
        .platform
        .query_all(&Selector::class(&ctx.config.markup.selected_class));
    if selected.is_empty() {
        debug!("nothing selected to delete");
        return Ok(false);
    }
    let menu = context_menu(ctx)?;
    if !ctx.platform.confirm(DELETE_CONFIRM) {
        return Ok(false);
    }
    let ids: Vec<Value> = selected.iter().map(|el| Value::String(el.id())).collect();
    let intent = ctx
        .dispatcher
        .intent(IntentKind::HandleFileDeletes)
        .with("path_ids", ids);
    ctx.dispatcher.raise(&menu, intent);
    Ok(true)
}

/// Make the label of the first selected entry editable; leaving it requests the rename.
/// Returns whether a label was found.
pub fn rename_selected_file<P: Platform>(ctx: &Rc<Context<P>>) -> Result<bool> {
    let markup = &ctx.config.markup;
    let label = ctx
        .platform
        .query_all(&Selector::class(&markup.selected_class))
        .into_iter()
        .find_map(|entry| {
            entry
                .children()
                .into_iter()
                .find(|c| c.has_class(&markup.label_class))
        });
    let Some(label) = label else {
        debug!("no selected label to rename");
        return Ok(false);
    };
    let menu = context_menu(ctx)?;

    let old_name = label.text_content();
    let ctx2 = ctx.clone();
    label.listen(
        RENAME_FOCUS_OUT,
        "focusout",
        handler(move |ev: &DomEvent<P::Element>| {
            let label = &ev.target;
            label.unlisten(RENAME_FOCUS_OUT);
            label.set_content_editable(false);
            let new_name = label.text_content();
            if new_name == old_name {
                return;
            }
            let path_id = label.parent().map(|p| p.id()).unwrap_or_default();
            let intent = ctx2
                .dispatcher
                .intent(IntentKind::HandleFileRename)
                .with("path_id", path_id)
                .with("old_name", old_name.clone())
                .with("new_name", new_name);
            ctx2.dispatcher.raise(&menu, intent);
        }),
    );
    label.set_content_editable(true);
    label.focus();
    Ok(true)
}
