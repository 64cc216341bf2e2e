//! Typed, single-threaded event channel.
//!
//! Models raise events through an [`EventChannel`]; views subscribe and keep
//! the returned [`Subscription`] for as long as they want to be notified.
//!
//! # Delivery
//!
//! - Handlers run synchronously, in subscription order.
//! - An event emitted while the channel is already dispatching is queued and
//!   delivered once the current handler returns. Handlers therefore never
//!   interleave, and events are seen in the order they were raised.
//! - A subscription cancelled mid-dispatch receives nothing further.
//! - Handlers subscribed mid-dispatch start with the next event.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Handler<E> = Rc<dyn Fn(&E)>;
type Filter<E> = Box<dyn Fn(&E) -> bool>;

struct Listener<E> {
    id: u64,
    /// One-shot listeners are released on the first event passing `filter`.
    once: Option<Filter<E>>,
    handler: Handler<E>,
}

struct ChannelInner<E> {
    listeners: RefCell<Vec<Listener<E>>>,
    queue: RefCell<VecDeque<E>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
}

/// Type-erased view of a channel, so subscriptions need no type parameter.
trait Unsubscribe {
    fn unsubscribe(&self, id: u64);
    fn is_subscribed(&self, id: u64) -> bool;
}

impl<E> Unsubscribe for ChannelInner<E> {
    fn unsubscribe(&self, id: u64) {
        // Dropped outside the borrow: a handler may own subscriptions itself.
        let removed: Vec<Listener<E>> = {
            let mut listeners = self.listeners.borrow_mut();
            let (removed, kept) = listeners.drain(..).partition(|l| l.id == id);
            *listeners = kept;
            removed
        };
        drop(removed);
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.listeners.borrow().iter().any(|l| l.id == id)
    }
}

/// Resets the dispatching flag even if a handler panics.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Observer channel owned by a model.
pub struct EventChannel<E> {
    inner: Rc<ChannelInner<E>>,
}

impl<E: 'static> EventChannel<E> {
    /// Channel with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ChannelInner {
                listeners: RefCell::new(Vec::new()),
                queue: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                next_id: Cell::new(1),
            }),
        }
    }

    /// Subscribe for every future event.
    pub fn subscribe(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        self.add_listener(None, Rc::new(handler))
    }

    /// Subscribe for the next event only; the subscription is released
    /// before the handler runs.
    pub fn subscribe_once(&self, handler: impl Fn(&E) + 'static) -> Subscription {
        self.subscribe_once_matching(|_| true, handler)
    }

    /// Subscribe for the first event accepted by `filter`. Events rejected by
    /// the filter are not delivered and do not consume the subscription.
    pub fn subscribe_once_matching(
        &self,
        filter: impl Fn(&E) -> bool + 'static,
        handler: impl Fn(&E) + 'static,
    ) -> Subscription {
        self.add_listener(Some(Box::new(filter)), Rc::new(handler))
    }

    /// Number of live subscriptions.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Raise an event.
    pub fn emit(&self, event: E) {
        self.inner.queue.borrow_mut().push_back(event);
        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);
        let _guard = DispatchGuard(&self.inner.dispatching);
        loop {
            let next = self.inner.queue.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            self.dispatch(&event);
        }
    }

    fn dispatch(&self, event: &E) {
        let ids: Vec<u64> = self.inner.listeners.borrow().iter().map(|l| l.id).collect();
        for id in ids {
            let handler = {
                let mut listeners = self.inner.listeners.borrow_mut();
                let Some(pos) = listeners.iter().position(|l| l.id == id) else {
                    continue;
                };
                let accepted = listeners[pos].once.as_ref().map(|filter| filter(event));
                match accepted {
                    None => Rc::clone(&listeners[pos].handler),
                    Some(true) => listeners.remove(pos).handler,
                    Some(false) => continue,
                }
            };
            handler(event);
        }
    }

    fn add_listener(&self, once: Option<Filter<E>>, handler: Handler<E>) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push(Listener { id, once, handler });

        let weak: Weak<ChannelInner<E>> = Rc::downgrade(&self.inner);
        let channel: Weak<dyn Unsubscribe> = weak;
        Subscription { id, channel }
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("queued", &self.inner.queue.borrow().len())
            .field("dispatching", &self.inner.dispatching.get())
            .finish()
    }
}

/// Disposable subscription handle. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    channel: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Release the subscription now.
    pub fn cancel(self) {}

    /// Whether the handler is still registered (a fired once-subscription
    /// or a dropped channel both report `false`).
    pub fn is_active(&self) -> bool {
        self.channel
            .upgrade()
            .is_some_and(|channel| channel.is_subscribed(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(channel) = self.channel.upgrade() {
            channel.unsubscribe(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
