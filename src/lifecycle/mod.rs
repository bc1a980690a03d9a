//! Entry point for every inserted fragment.

use crate::bridge::Context;
use crate::dom::DomElement;
use crate::platform::Platform;
use log::debug;
use std::rc::Rc;

/// Binds one kind of gesture inside inserted fragments.
pub trait Translator<P: Platform> {
    fn name(&self) -> &'static str;

    /// Elements of `fragment` (itself included) this translator binds. Nested targets count.
    fn targets(&self, fragment: &P::Element) -> Vec<P::Element>;

    /// Bind `target`. Binding an element twice must leave a single live handler.
    fn attach(&self, target: &P::Element);
}

/// Runs every registered translator over each inserted fragment, in registration order.
pub struct FragmentObserver<P: Platform> {
    ctx: Rc<Context<P>>,
    translators: Vec<Box<dyn Translator<P>>>,
}

impl<P: Platform> FragmentObserver<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self {
            ctx,
            translators: Vec::new(),
        }
    }

    pub fn register(&mut self, translator: Box<dyn Translator<P>>) {
        self.translators.push(translator);
    }

    pub fn translator_names(&self) -> Vec<&'static str> {
        self.translators.iter().map(|t| t.name()).collect()
    }

    pub fn on_load(&self, fragment: &P::Element) {
        if *fragment == self.ctx.platform.body() {
            self.prepare_body(fragment);
        }
        for translator in &self.translators {
            for target in translator.targets(fragment) {
                debug!("{} attach {:?}", translator.name(), target);
                translator.attach(&target);
            }
        }
    }

    /// Wire the socket extension and scope inclusion onto `<body>`, then let the rendering
    /// system pick the new attributes up.
    fn prepare_body(&self, body: &P::Element) {
        let config = &self.ctx.config;
        body.set_attribute("hx-ext", "ws");
        match body.attribute("ws-connect") {
            Some(endpoint) if !endpoint.is_empty() => debug!("keeping ws-connect {endpoint}"),
            _ => body.set_attribute("ws-connect", &config.default_endpoint),
        }
        body.set_attribute(
            "hx-include",
            &format!("closest *[data-{}]", config.scope_attribute),
        );
        self.ctx.platform.process(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_context;
    use crate::dom::memory::MemElement;
    use std::cell::RefCell;

    struct Recorder {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl Translator<crate::platform::headless::HeadlessPlatform> for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        fn targets(&self, fragment: &MemElement) -> Vec<MemElement> {
            fragment.query_inclusive(&crate::dom::Selector::class("x"))
        }

        fn attach(&self, target: &MemElement) {
            self.seen.borrow_mut().push(target.id());
        }
    }

    #[test]
    fn test_body_is_prepared_once_per_load() {
        let (platform, ctx) = test_context();
        let observer = FragmentObserver::new(ctx);
        let body = platform.body();

        observer.on_load(&body);
        assert_eq!(body.attribute("hx-ext").as_deref(), Some("ws"));
        assert_eq!(body.attribute("ws-connect").as_deref(), Some("127.0.0.1:8080/"));
        assert_eq!(
            body.attribute("hx-include").as_deref(),
            Some("closest *[data-scope]")
        );
        assert_eq!(platform.processed(), vec![body.clone()]);

        let frag = MemElement::new("div");
        body.append(&frag);
        observer.on_load(&frag);
        assert_eq!(platform.processed().len(), 1);
    }

    #[test]
    fn test_existing_endpoint_is_kept() {
        let (platform, ctx) = test_context();
        let body = platform.body();
        body.set_attribute("ws-connect", "example.org/ws");
        FragmentObserver::new(ctx).on_load(&body);
        assert_eq!(body.attribute("ws-connect").as_deref(), Some("example.org/ws"));
    }

    #[test]
    fn test_translators_see_nested_and_standalone_targets() {
        let (_, ctx) = test_context();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut observer = FragmentObserver::new(ctx);
        observer.register(Box::new(Recorder { seen: seen.clone() }));

        let outer = MemElement::new("div").with_id("outer");
        let a = MemElement::new("p").with_id("a").with_class("x");
        let wrap = MemElement::new("div");
        let b = MemElement::new("p").with_id("b").with_class("x");
        outer.append(&a);
        outer.append(&wrap);
        wrap.append(&b);

        observer.on_load(&outer);
        observer.on_load(&b);
        assert_eq!(*seen.borrow(), vec!["a", "b", "b"]);
        assert_eq!(observer.translator_names(), vec!["recorder"]);
    }
}
