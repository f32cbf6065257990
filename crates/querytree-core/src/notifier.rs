//! Synchronous publish/subscribe primitive
//!
//! Subscriptions are keyed by event name and delivered in registration order
//! before [`Notifier::emit`] returns. Handlers only see the event envelope,
//! never the emitter, so they cannot mutate the tree that is notifying them.

use std::fmt;

/// Name used to subscribe to every event.
pub const ANY_EVENT: &str = "*";

/// Something that can be published through a [`Notifier`].
pub trait Event {
    fn name(&self) -> &'static str;
}

/// Handle returned by [`Notifier::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Event envelope handed to subscribers.
///
/// A subscriber may call [`Signal::prevent_default`] on a cancellable event;
/// the emitter checks [`Signal::is_default_prevented`] once delivery is over.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal<E> {
    event: E,
    default_prevented: bool,
}

impl<E> Signal<E> {
    pub fn new(event: E) -> Self {
        Self {
            event,
            default_prevented: false,
        }
    }

    pub fn event(&self) -> &E {
        &self.event
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn into_event(self) -> E {
        self.event
    }
}

type Handler<E> = Box<dyn FnMut(&mut Signal<E>)>;

struct Subscriber<E> {
    id: SubscriptionId,
    name: String,
    handler: Handler<E>,
}

/// Ordered list of subscribers per event name.
pub struct Notifier<E> {
    next_id: u64,
    subscribers: Vec<Subscriber<E>>,
}

impl<E: Event> Notifier<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Subscribe to `name` (or [`ANY_EVENT`]).
    pub fn on<F>(&mut self, name: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&mut Signal<E>) + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push(Subscriber {
            id,
            name: name.to_string(),
            handler: Box::new(handler),
        });
        id
    }

    /// Remove one subscription. Returns false if it was already gone.
    pub fn off(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    /// Remove every subscription registered under `name`.
    pub fn off_all(&mut self, name: &str) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.name != name);
        before - self.subscribers.len()
    }

    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.iter().filter(|s| s.name == name).count()
    }

    /// Deliver `event` to its subscribers and hand the envelope back.
    pub fn emit(&mut self, event: E) -> Signal<E> {
        let mut signal = Signal::new(event);
        let name = signal.event.name();
        for subscriber in self
            .subscribers
            .iter_mut()
            .filter(|s| s.name == name || s.name == ANY_EVENT)
        {
            (subscriber.handler)(&mut signal);
        }
        signal
    }
}

impl<E: Event> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field(
                "subscribers",
                &self.subscribers.iter().map(|s| &s.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}
