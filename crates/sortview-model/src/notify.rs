//! Change notification from a model to its attached clients.
//!
//! # Design
//!
//! [`UpdateNotifier`] keeps its callbacks as `Weak` references; the strong
//! half lives in the [`Subscription`] guard handed back to the subscriber.
//! Dropping the guard unregisters the callback. Dead entries are pruned
//! lazily on the next [`notify`](UpdateNotifier::notify).
//!
//! # Re-entrancy
//!
//! Callbacks are collected before any of them runs and invoked with no
//! internal borrow held, so a callback may subscribe, query the model, or
//! trigger another notification.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use bitflags::bitflags;

bitflags! {
    /// Hints attached to an update notification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u8 {
        /// Every index previously handed out by the model is now invalid.
        const INVALIDATE_ALL_INDEXES  = 0b0001;
        /// Existing indexes still address the same cells.
        const DONT_INVALIDATE_INDEXES = 0b0010;
    }
}

impl Default for UpdateFlags {
    fn default() -> Self {
        Self::INVALIDATE_ALL_INDEXES
    }
}

type CallbackRc = Rc<dyn Fn(UpdateFlags)>;
type CallbackWeak = Weak<dyn Fn(UpdateFlags)>;

/// Registry of "model did update" callbacks.
#[derive(Default)]
pub struct UpdateNotifier {
    subscribers: RefCell<Vec<CallbackWeak>>,
    notifications: Cell<u64>,
}

impl std::fmt::Debug for UpdateNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("subscriber_count", &self.subscriber_count())
            .field("notifications", &self.notifications.get())
            .finish()
    }
}

impl UpdateNotifier {
    /// Create a notifier with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered until the returned guard is
    /// dropped.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(UpdateFlags) + 'static) -> Subscription {
        let strong: CallbackRc = Rc::new(callback);
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Invoke every live callback in registration order.
    pub fn notify(&self, flags: UpdateFlags) {
        self.notifications.set(self.notifications.get() + 1);
        let callbacks: Vec<CallbackRc> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for callback in callbacks {
            callback(flags);
        }
    }

    /// Registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Number of [`notify`](Self::notify) calls so far.
    #[must_use]
    pub fn notification_count(&self) -> u64 {
        self.notifications.get()
    }
}

/// RAII guard for a registered callback.
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
