use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One-shot timers.
pub trait Scheduler {
    /// Run `callback` after `delay_ms`; returns a handle for [`Scheduler::clear_timeout`].
    fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> i32;
    fn clear_timeout(&self, handle: i32);
}

/// Coalesces a burst of calls into one call after `wait_ms` of quiet.
///
/// Each [`Debouncer::call`] cancels the pending timer and schedules a new one carrying the
/// latest argument, so only the last call of a burst runs.
pub struct Debouncer<S: Scheduler, A: 'static> {
    scheduler: Rc<S>,
    wait_ms: i32,
    action: Rc<dyn Fn(A)>,
    pending: Rc<Cell<Option<i32>>>,
}

impl<S: Scheduler, A: 'static> Debouncer<S, A> {
    pub fn new(scheduler: Rc<S>, wait_ms: i32, action: impl Fn(A) + 'static) -> Self {
        Self {
            scheduler,
            wait_ms,
            action: Rc::new(action),
            pending: Rc::new(Cell::new(None)),
        }
    }

    pub fn call(&self, arg: A) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.clear_timeout(handle);
        }
        let action = self.action.clone();
        let pending = self.pending.clone();
        let handle = self.scheduler.set_timeout(
            self.wait_ms,
            Box::new(move || {
                pending.set(None);
                action(arg);
            }),
        );
        self.pending.set(Some(handle));
    }

    pub fn cancel(&self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.clear_timeout(handle);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl<S: Scheduler, A: 'static> Drop for Debouncer<S, A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A manually advanced clock for driving [`Debouncer`] without a browser.
#[derive(Default)]
pub struct ManualScheduler {
    now_ms: Cell<i64>,
    next_handle: Cell<i32>,
    timers: RefCell<Vec<(i32, i64, Box<dyn FnOnce()>)>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward and run every timer that came due, in due order.
    pub fn advance(&self, ms: i64) {
        let target = self.now_ms.get() + ms;
        loop {
            let due = {
                let mut timers = self.timers.borrow_mut();
                timers.sort_by_key(|(_, at, _)| *at);
                match timers.first() {
                    Some((_, at, _)) if *at <= target => Some(timers.remove(0)),
                    _ => None,
                }
            };
            let Some((_, at, callback)) = due else {
                break;
            };
            self.now_ms.set(at);
            callback();
        }
        self.now_ms.set(target);
    }

    pub fn pending(&self) -> usize {
        self.timers.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay_ms: i32, callback: Box<dyn FnOnce()>) -> i32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        let at = self.now_ms.get() + i64::from(delay_ms.max(0));
        self.timers.borrow_mut().push((handle, at, callback));
        handle
    }

    fn clear_timeout(&self, handle: i32) {
        self.timers.borrow_mut().retain(|(h, _, _)| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_runs_last_call_once() {
        let clock = Rc::new(ManualScheduler::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let d = Debouncer::new(clock.clone(), 300, move |q: String| s.borrow_mut().push(q));

        d.call("a".to_string());
        clock.advance(100);
        d.call("ab".to_string());
        clock.advance(100);
        d.call("abc".to_string());
        assert_eq!(clock.pending(), 1);

        clock.advance(299);
        assert!(seen.borrow().is_empty());
        clock.advance(1);
        assert_eq!(*seen.borrow(), vec!["abc".to_string()]);
        assert!(!d.is_pending());

        clock.advance(1000);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_calls_after_quiet_period_each_run() {
        let clock = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let d = Debouncer::new(clock.clone(), 50, move |_: ()| c.set(c.get() + 1));
        d.call(());
        clock.advance(60);
        d.call(());
        clock.advance(60);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_cancel_and_drop_clear_the_timer() {
        let clock = Rc::new(ManualScheduler::new());
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let d = Debouncer::new(clock.clone(), 50, move |_: ()| c.set(c.get() + 1));
        d.call(());
        d.cancel();
        assert_eq!(clock.pending(), 0);
        d.call(());
        drop(d);
        clock.advance(100);
        assert_eq!(count.get(), 0);
    }
}
