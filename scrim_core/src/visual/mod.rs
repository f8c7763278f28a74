// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained visual tree.
//!
//! The tree stands in for the UI framework the engine cooperates with. It
//! owns everything the engine consumes but does not compute itself:
//!
//! - **Identity**: a generational [`VisualId`] handle that becomes stale
//!   when the visual is destroyed.
//! - **Topology**: parent, first-child, and sibling links forming an ordered
//!   tree. Child order is z-order.
//! - **Geometry** set by collaborators: bounds in the parent's space, desired
//!   size, render transform, and clip.
//! - **Roles** ([`VisualRole`]) describing container shapes: scroll
//!   presenters with an offset and optional [`ContentTemplate`], and layer
//!   stacks implementing [`LayerHost`].
//! - **Liveness**: whether a visual hangs beneath a root.
//!
//! [`VisualTree::evaluate`] turns mutations into [`TreeChanges`] and publishes
//! bounds notifications through the tree's [`BoundsFeed`](crate::feed::BoundsFeed).

mod evaluate;
mod geometry;
mod host;
mod id;
mod store;
mod traverse;

pub use evaluate::{LifecycleEvent, TreeChanges};
pub use host::{
    ContentTemplate, LayerHost, LayerKind, LayerManager, LayerSlot, ScrollState, VisualRole,
};
pub use id::{INVALID, VisualId};
pub use store::VisualTree;
pub use traverse::{Ancestors, Children};
