// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Scrim uses multi-channel dirty tracking (via [`understory_dirty`]) to turn
//! collaborator mutations of the visual tree into bounds-changed
//! notifications.
//!
//! # Propagation semantics
//!
//! - **Propagating**: [`BOUNDS`] uses
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and has dependency edges
//!   from child to parent. Moving or resizing a visual marks its whole subtree,
//!   because every descendant's position relative to the rest of the tree
//!   moved with it. Scrolling a presenter marks its content the same way.
//!
//! - **Local-only**: [`SCROLL`] marks only the presenter whose offset
//!   changed.
//!
//! - **Structural**: [`TOPOLOGY`] is marked on topology mutations. It is
//!   drained and discarded; attach/detach edges are recorded separately so
//!   their order survives.
//!
//! # Consumption
//!
//! [`VisualTree::evaluate`](crate::visual::VisualTree::evaluate) drains every
//! channel, publishes the BOUNDS result to the
//! [`BoundsFeed`](crate::feed::BoundsFeed), and reports everything in
//! [`TreeChanges`](crate::visual::TreeChanges).

use understory_dirty::Channel;

/// Position or size changed; propagates to descendants.
pub const BOUNDS: Channel = Channel::new(0);

/// Scroll offset changed; local to the presenter.
pub const SCROLL: Channel = Channel::new(1);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(2);
