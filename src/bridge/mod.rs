//! Wiring between the rendering system's hooks and the pipeline.

use crate::commands::{self, NewListTranslator};
use crate::config::ClientConfig;
use crate::enrich::{Enricher, PendingRequest};
use crate::error::Result;
use crate::intent::{Dispatcher, Intent, Payload};
use crate::lifecycle::FragmentObserver;
use crate::platform::Platform;
use crate::translate::{
    FileSelectTranslator, FolderMoveTranslator, InlineEditTranslator, ReorderTranslator,
    TitleEditTranslator,
};
use std::rc::Rc;

/// What every translator and command works against.
pub struct Context<P: Platform> {
    pub platform: Rc<P>,
    pub config: Rc<ClientConfig>,
    pub dispatcher: Dispatcher<P>,
    pub enricher: Enricher<P>,
}

impl<P: Platform> Context<P> {
    pub fn new(platform: Rc<P>, config: ClientConfig) -> Rc<Self> {
        let config = Rc::new(config);
        Rc::new(Self {
            dispatcher: Dispatcher::new(platform.clone(), &config.intent_prefix),
            enricher: Enricher::new(platform.clone(), config.clone()),
            platform,
            config,
        })
    }
}

/// The page-lifetime pipeline: observer, enrichment and commands behind one handle.
pub struct Bridge<P: Platform> {
    ctx: Rc<Context<P>>,
    observer: FragmentObserver<P>,
}

impl<P: Platform> Bridge<P> {
    /// A bridge with every built-in translator registered.
    pub fn new(platform: Rc<P>, config: ClientConfig) -> Self {
        let ctx = Context::new(platform, config);
        let mut observer = FragmentObserver::new(ctx.clone());
        observer.register(Box::new(ReorderTranslator::new(ctx.clone())));
        observer.register(Box::new(FolderMoveTranslator::new(ctx.clone())));
        observer.register(Box::new(InlineEditTranslator::new(ctx.clone())));
        observer.register(Box::new(TitleEditTranslator::new(ctx.clone())));
        observer.register(Box::new(FileSelectTranslator::new(ctx.clone())));
        observer.register(Box::new(NewListTranslator::new(ctx.clone())));
        Self { ctx, observer }
    }

    pub fn context(&self) -> &Rc<Context<P>> {
        &self.ctx
    }

    pub fn observer(&self) -> &FragmentObserver<P> {
        &self.observer
    }

    pub fn config(&self) -> &ClientConfig {
        &self.ctx.config
    }

    pub fn on_load(&self, fragment: &P::Element) {
        self.observer.on_load(fragment);
    }

    pub fn configure_request(&self, request: &mut PendingRequest<P::Element>) {
        self.ctx.enricher.configure(request);
    }

    /// A request finished; `None` when the transport can't say which element sent it.
    pub fn request_finished(&self, source: Option<&P::Element>) {
        self.ctx.enricher.busy().finish(source);
    }

    pub fn delete_selected_files(&self) -> Result<bool> {
        commands::delete_selected_files(&self.ctx)
    }

    pub fn rename_selected_file(&self) -> Result<bool> {
        commands::rename_selected_file(&self.ctx)
    }

    /// Raise an intent by name from outside the built-in translators.
    pub fn raise(&self, target: &P::Element, name: &str, detail: Payload) -> Result<()> {
        let intent = Intent::named(self.ctx.dispatcher.prefix(), name)?.with_payload(detail);
        self.ctx.dispatcher.raise(target, intent);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> (
    Rc<crate::platform::headless::HeadlessPlatform>,
    Rc<Context<crate::platform::headless::HeadlessPlatform>>,
) {
    let platform = Rc::new(crate::platform::headless::HeadlessPlatform::new());
    let ctx = Context::new(platform.clone(), ClientConfig::new());
    (platform, ctx)
}
