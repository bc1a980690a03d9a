use crate::bridge::Context;
use crate::dom::{DomElement, Selector};
use crate::intent::IntentKind;
use crate::lifecycle::Translator;
use crate::platform::{DragEnd, Platform, SortHooks, SortOptions};
use log::debug;
use std::rc::Rc;

/// Where a moved item landed, expressed by one neighbour.
///
/// `before_item` is the item now right after the moved one; `after_item` the item right before
/// it. Only one is filled: `after_item` when the item became last, `before_item` otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchors {
    pub moved_item: String,
    pub before_item: String,
    pub after_item: String,
}

/// Anchors for a drop, computed from the post-move child ids. `None` when nothing moved.
pub fn reorder_anchors(ids: &[String], drop: DragEnd) -> Option<Anchors> {
    if drop.old_index == drop.new_index {
        return None;
    }
    let new = drop.new_index;
    let moved_item = ids.get(new)?.clone();
    let is_last = new + 1 == ids.len();

    let (before_item, after_item) = if is_last {
        let prev = new
            .checked_sub(1)
            .and_then(|i| ids.get(i))
            .cloned()
            .unwrap_or_default();
        (String::new(), prev)
    } else {
        (ids[new + 1].clone(), String::new())
    };

    Some(Anchors {
        moved_item,
        before_item,
        after_item,
    })
}

/// Drag reordering for one flat list.
pub struct ListReorder<P: Platform> {
    ctx: Rc<Context<P>>,
    container: P::Element,
}

impl<P: Platform> ListReorder<P> {
    pub fn new(ctx: Rc<Context<P>>, container: P::Element) -> Rc<Self> {
        Rc::new(Self { ctx, container })
    }

    pub fn options(&self) -> SortOptions {
        SortOptions {
            animation_ms: self.ctx.config.drag.animation_ms,
            handle: Some(self.ctx.config.markup.drag_handle_class.clone()),
            sort: true,
            force_fallback: true,
            ..Default::default()
        }
    }

    pub fn attach(self: &Rc<Self>) {
        let this = self.clone();
        self.ctx.platform.enroll_sortable(
            &self.container,
            &self.options(),
            SortHooks::on_end(move |end| this.on_end(end)),
        );
    }

    pub fn on_end(&self, end: DragEnd) {
        let ids: Vec<String> = self.container.children().iter().map(|c| c.id()).collect();
        let Some(anchors) = reorder_anchors(&ids, end) else {
            debug!("drop on {:?} left order unchanged", self.container);
            return;
        };
        let intent = self
            .ctx
            .dispatcher
            .intent(IntentKind::HandleItemReordering)
            .with("movedItem", anchors.moved_item)
            .with("beforeItem", anchors.before_item)
            .with("afterItem", anchors.after_item);
        self.ctx.dispatcher.raise(&self.container, intent);
    }
}

/// Enrolls every `#todo-list` found in a fragment.
pub struct ReorderTranslator<P: Platform> {
    ctx: Rc<Context<P>>,
}

impl<P: Platform> ReorderTranslator<P> {
    pub fn new(ctx: Rc<Context<P>>) -> Self {
        Self { ctx }
    }
}

impl<P: Platform> Translator<P> for ReorderTranslator<P> {
    fn name(&self) -> &'static str {
        "reorder"
    }

    fn targets(&self, fragment: &P::Element) -> Vec<P::Element> {
        fragment.query_inclusive(&Selector::id(&self.ctx.config.markup.list_id))
    }

    fn attach(&self, target: &P::Element) {
        ListReorder::new(self.ctx.clone(), target.clone()).attach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::test_context;
    use crate::dom::memory::MemElement;
    use serde_json::json;

    fn ids(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_move_no_anchors() {
        let order = ids(&["a", "b", "c"]);
        for i in 0..3 {
            assert_eq!(
                reorder_anchors(&order, DragEnd { old_index: i, new_index: i }),
                None
            );
        }
    }

    #[test]
    fn test_move_to_middle_reports_following_item() {
        // [A,B,C,D] with A dragged to index 2 -> [B,C,A,D]
        let order = ids(&["B", "C", "A", "D"]);
        let a = reorder_anchors(&order, DragEnd { old_index: 0, new_index: 2 }).expect("moved");
        assert_eq!(a.moved_item, "A");
        assert_eq!(a.before_item, "D");
        assert_eq!(a.after_item, "");
    }

    #[test]
    fn test_move_to_end_reports_preceding_item() {
        let order = ids(&["B", "C", "D", "A"]);
        let a = reorder_anchors(&order, DragEnd { old_index: 0, new_index: 3 }).expect("moved");
        assert_eq!(a.moved_item, "A");
        assert_eq!(a.before_item, "");
        assert_eq!(a.after_item, "D");
    }

    #[test]
    fn test_move_to_front_reports_following_item() {
        let order = ids(&["D", "A", "B", "C"]);
        let a = reorder_anchors(&order, DragEnd { old_index: 3, new_index: 0 }).expect("moved");
        assert_eq!(a.moved_item, "D");
        assert_eq!(a.before_item, "A");
        assert_eq!(a.after_item, "");
    }

    #[test]
    fn test_every_move_names_exactly_one_real_neighbour() {
        let base = ["a", "b", "c", "d", "e"];
        for old in 0..base.len() {
            for new in 0..base.len() {
                let mut order = ids(&base);
                let moved = order.remove(old);
                order.insert(new, moved.clone());
                let got = reorder_anchors(&order, DragEnd { old_index: old, new_index: new });
                if old == new {
                    assert!(got.is_none());
                    continue;
                }
                let got = got.expect("moved");
                assert_eq!(got.moved_item, moved);
                if new == order.len() - 1 {
                    assert_eq!(got.after_item, order[new - 1]);
                    assert!(got.before_item.is_empty());
                } else {
                    assert_eq!(got.before_item, order[new + 1]);
                    assert!(got.after_item.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_drop_raises_reordering_intent_on_list() {
        let (platform, ctx) = test_context();
        let list = MemElement::new("ul").with_id("todo-list");
        for id in ["A", "B", "C", "D"] {
            list.append(&MemElement::new("li").with_id(id).with_class("TodoItem"));
        }
        platform.body().append(&list);

        ReorderTranslator::new(ctx.clone()).attach(&list);
        let (_, opts) = platform.enrolled().pop().expect("enrolled");
        assert_eq!(opts.handle.as_deref(), Some("TodoItem-dragHandle"));
        assert!(opts.force_fallback);
        assert_eq!(opts.animation_ms, 150);

        platform.drop_within(&list, 0, 2);
        assert_eq!(list.child_ids(), vec!["B", "C", "A", "D"]);

        let sent = platform.take_triggered();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "@handle-item-reordering");
        assert_eq!(sent[0].target, list);
        assert_eq!(sent[0].detail["movedItem"], json!("A"));
        assert_eq!(sent[0].detail["beforeItem"], json!("D"));
        assert_eq!(sent[0].detail["afterItem"], json!(""));

        platform.drop_within(&list, 1, 1);
        assert!(platform.triggered().is_empty());
    }

    #[test]
    fn test_targets_list_itself_or_inside_main() {
        let (_, ctx) = test_context();
        let t = ReorderTranslator::new(ctx);
        let main = MemElement::new("div").with_id("main");
        let list = MemElement::new("ul").with_id("todo-list");
        main.append(&list);
        assert_eq!(t.targets(&main), vec![list.clone()]);
        assert_eq!(t.targets(&list), vec![list.clone()]);
        assert!(t.targets(&MemElement::new("li")).is_empty());
    }
}
