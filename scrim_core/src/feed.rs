// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bounds-changed notification feed.
//!
//! Every [`VisualTree`](crate::visual::VisualTree) owns a [`BoundsFeed`].
//! Interested parties call [`subscribe`](BoundsFeed::subscribe) with a target
//! and receive a [`Subscription`] guard. During
//! [`evaluate`](crate::visual::VisualTree::evaluate) the tree publishes the
//! set of visuals whose bounds changed, which raises the pending flag of every
//! matching subscription. Subscribers poll the flag with
//! [`Subscription::take_pending`].
//!
//! Dropping a `Subscription` unregisters it. There is no other way to
//! unsubscribe, so a subscription can never outlive its guard.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::visual::VisualId;

struct Subscriber {
    id: u64,
    target: VisualId,
    pending: Rc<Cell<bool>>,
}

#[derive(Default)]
struct FeedInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Shared registry of bounds subscriptions.
///
/// Cloning a feed yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct BoundsFeed {
    inner: Rc<RefCell<FeedInner>>,
}

impl fmt::Debug for BoundsFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundsFeed")
            .field("subscribers", &self.inner.borrow().subscribers.len())
            .finish()
    }
}

impl BoundsFeed {
    /// Creates an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to bounds changes of `target`.
    ///
    /// The returned subscription starts out pending so the first poll always
    /// computes an initial value.
    #[must_use]
    pub fn subscribe(&self, target: VisualId) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let pending = Rc::new(Cell::new(true));
        inner.subscribers.push(Subscriber {
            id,
            target,
            pending: Rc::clone(&pending),
        });
        Subscription {
            id,
            target,
            pending,
            feed: Rc::downgrade(&self.inner),
        }
    }

    /// Marks every subscription whose target is in `changed` as pending.
    ///
    /// Returns the number of subscriptions notified.
    pub fn publish(&self, changed: &[VisualId]) -> usize {
        let inner = self.inner.borrow();
        let mut notified = 0;
        for sub in &inner.subscribers {
            if changed.contains(&sub.target) {
                sub.pending.set(true);
                notified += 1;
            }
        }
        notified
    }

    /// Returns the number of live subscriptions for `target`.
    #[must_use]
    pub fn live_subscriptions(&self, target: VisualId) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|sub| sub.target == target)
            .count()
    }

    /// Returns the total number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Returns whether no subscriptions are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Guard for one bounds subscription; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    target: VisualId,
    pending: Rc<Cell<bool>>,
    feed: Weak<RefCell<FeedInner>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("pending", &self.pending.get())
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Returns the subscribed target.
    #[must_use]
    pub fn target(&self) -> VisualId {
        self.target
    }

    /// Returns whether a notification is waiting, without consuming it.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.get()
    }

    /// Consumes the pending notification, if any.
    pub fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }

    /// Forces the next poll to recompute.
    pub fn invalidate(&self) {
        self.pending.set(true);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The feed may already be gone if the tree was dropped first.
        if let Some(feed) = self.feed.upgrade() {
            feed.borrow_mut().subscribers.retain(|sub| sub.id != self.id);
        }
    }
}
