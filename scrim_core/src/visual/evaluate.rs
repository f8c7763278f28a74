// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change evaluation.
//!
//! Evaluation follows the drain pattern for each dirty channel:
//!
//! 1. **BOUNDS**: Drain affected indices (marked visuals plus their
//!    descendants) and publish them to the tree's
//!    [`BoundsFeed`](crate::feed::BoundsFeed). Delivery is synchronous, so
//!    every subscriber is pending before `evaluate` returns.
//! 2. **SCROLL**: Drain presenters whose offset changed.
//! 3. **TOPOLOGY**: Drain and discard.
//!
//! Attach/detach edges and destroyed handles are not dirty channels: their
//! order matters, so they are queued as they happen and moved out wholesale.

use alloc::vec::Vec;

use super::id::VisualId;
use super::store::VisualTree;
use crate::dirty;

/// A visual entering or leaving the live tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The visual became reachable from a root.
    Attached(VisualId),
    /// The visual stopped being reachable from a root.
    Detached(VisualId),
}

impl LifecycleEvent {
    /// Returns the visual the event refers to.
    #[must_use]
    pub const fn visual(self) -> VisualId {
        match self {
            Self::Attached(id) | Self::Detached(id) => id,
        }
    }
}

/// The set of changes produced by a single [`VisualTree::evaluate`] call.
#[derive(Clone, Debug, Default)]
pub struct TreeChanges {
    /// Attach/detach edges in the order they happened.
    pub lifecycle: Vec<LifecycleEvent>,
    /// Visuals destroyed since the last evaluate.
    pub destroyed: Vec<VisualId>,
    /// Visuals whose position or size changed, including descendants of moved
    /// visuals.
    pub bounds: Vec<VisualId>,
    /// Scroll presenters whose offset changed.
    pub scrolled: Vec<VisualId>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl TreeChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.lifecycle.clear();
        self.destroyed.clear();
        self.bounds.clear();
        self.scrolled.clear();
        self.topology_changed = false;
    }

    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lifecycle.is_empty()
            && self.destroyed.is_empty()
            && self.bounds.is_empty()
            && self.scrolled.is_empty()
            && !self.topology_changed
    }
}

impl VisualTree {
    /// Drains all pending changes and publishes bounds notifications.
    pub fn evaluate(&mut self) -> TreeChanges {
        let mut changes = TreeChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer
    /// to avoid allocation.
    pub fn evaluate_into(&mut self, changes: &mut TreeChanges) {
        changes.clear();

        let dirty_bounds: Vec<u32> = self
            .dirty
            .drain(dirty::BOUNDS)
            .affected()
            .deterministic()
            .run()
            .collect();
        changes.bounds = dirty_bounds
            .into_iter()
            .filter_map(|idx| self.id_at(idx))
            .collect();
        self.feed.publish(&changes.bounds);

        let scrolled: Vec<u32> = self
            .dirty
            .drain(dirty::SCROLL)
            .deterministic()
            .run()
            .collect();
        changes.scrolled = scrolled
            .into_iter()
            .filter_map(|idx| self.id_at(idx))
            .collect();

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        core::mem::swap(&mut self.pending_lifecycle, &mut changes.lifecycle);
        core::mem::swap(&mut self.pending_destroyed, &mut changes.destroyed);
    }
}
