// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay surfaces that keep adorners aligned with their targets.
//!
//! `scrim_core` attaches *adorners* (focus rings, validation markers,
//! selection handles) to arbitrary *target* visuals in a retained visual
//! tree and keeps each adorner pixel-aligned over its target while the
//! target moves, resizes, scrolls, or leaves and re-enters the tree. It is
//! `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! ```text
//!   VisualTree mutations
//!       │
//!       ▼
//!   VisualTree::evaluate() ──► TreeChanges ──► AdornerEngine::layout()
//!       │                                           │
//!       ▼                                           ├─► lifecycle: attach / detach / dispose
//!   BoundsFeed::publish()                           │
//!       │                                           ├─► LayerLocator::locate() ──► inject()
//!       ▼                                           │
//!   Subscription (pending) ──► BoundsTracker::poll() ──► OverlaySurface::arrange()
//! ```
//!
//! **[`visual`]**: struct-of-arrays visual tree with generational handles.
//! It plays the UI framework: topology, geometry, container roles, liveness,
//! and change evaluation.
//!
//! **[`dirty`]**: dirty channels over `understory_dirty`. BOUNDS propagates
//! to descendants; SCROLL and TOPOLOGY are local.
//!
//! **[`feed`]**: the bounds notification feed and its disposable
//! subscriptions.
//!
//! **[`bounds`]**: [`TransformedBounds`](bounds::TransformedBounds) and the
//! per-adorner [`BoundsTracker`](bounds::BoundsTracker).
//!
//! **[`locate`]**: host classification and the
//! [`LayerLocator`](locate::LayerLocator) that resolves and caches surfaces.
//!
//! **[`inject`]**: restructures hosts so a surface renders above their
//! content.
//!
//! **[`surface`]**: the [`OverlaySurface`](surface::OverlaySurface) canvas
//! and its measure/arrange.
//!
//! **[`binder`]**: per-target bindings and the
//! [`AdornerEngine`](binder::AdornerEngine) driving them.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types, with
//! zero-overhead [`Tracer`](trace::Tracer) wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod binder;
pub mod bounds;
pub mod config;
pub mod dirty;
pub mod feed;
pub mod inject;
pub mod locate;
pub mod surface;
pub mod trace;
pub mod visual;

pub use binder::{AdornerBinding, AdornerEngine, BindingState};
pub use config::EngineConfig;
pub use locate::{HostKind, LayerLocator};
pub use surface::{OverlaySurface, SurfaceKey};
