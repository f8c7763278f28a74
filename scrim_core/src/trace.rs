// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the adorner pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! engine calls at each stage. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Degraded outcomes that are never surfaced as errors (an unsupported host
//! shape, a stale bounds notification) are reported here.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::binder::BindingState;
use crate::bounds::TransformedBounds;
use crate::inject::InjectError;
use crate::locate::HostKind;
use crate::visual::VisualId;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a visual's overlay surface is resolved.
#[derive(Clone, Copy, Debug)]
pub struct SurfaceResolvedEvent {
    /// The visual that asked for a surface.
    pub requester: VisualId,
    /// The host carrying the surface.
    pub host: VisualId,
    /// How the host was classified.
    pub kind: HostKind,
    /// Whether the surface was injected by this request (as opposed to found
    /// in the cache).
    pub injected: bool,
}

/// Emitted when a host candidate could not take a surface.
#[derive(Clone, Copy, Debug)]
pub struct InjectionSkippedEvent {
    /// The rejected host.
    pub host: VisualId,
    /// How the host was classified.
    pub kind: HostKind,
    /// Why injection failed.
    pub reason: InjectError,
}

/// Emitted when a binding changes state.
#[derive(Clone, Copy, Debug)]
pub struct BindingTransitionEvent {
    /// The adorned target.
    pub target: VisualId,
    /// The adorner.
    pub adorner: VisualId,
    /// State before the transition.
    pub from: BindingState,
    /// State after the transition.
    pub to: BindingState,
}

/// Emitted when a binding is torn down and forgotten.
#[derive(Clone, Copy, Debug)]
pub struct BindingDisposedEvent {
    /// The adorned target.
    pub target: VisualId,
    /// The released adorner.
    pub adorner: VisualId,
}

/// Emitted when a tracker publishes new bounds.
#[derive(Clone, Copy, Debug)]
pub struct BoundsPublishedEvent {
    /// The adorned target.
    pub target: VisualId,
    /// The host the bounds are relative to.
    pub host: VisualId,
    /// The published bounds.
    pub bounds: TransformedBounds,
}

/// Emitted when a bounds notification arrives for a target that already left
/// the live tree.
#[derive(Clone, Copy, Debug)]
pub struct StaleBoundsEvent {
    /// The detached target.
    pub target: VisualId,
}

/// Per-pass summary produced by [`AdornerEngine::layout`](crate::AdornerEngine::layout).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutPassEvent {
    /// Monotonic layout pass counter.
    pub pass_index: u64,
    /// Bindings that moved to [`BindingState::Attached`].
    pub attached: u32,
    /// Bindings that moved to [`BindingState::Detached`].
    pub detached: u32,
    /// Bindings disposed because their target was destroyed.
    pub disposed: u32,
    /// Trackers that published changed bounds.
    pub bounds_published: u32,
    /// Surfaces whose children were measured and arranged.
    pub surfaces_arranged: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a surface is resolved for a visual.
    fn on_surface_resolved(&mut self, e: &SurfaceResolvedEvent) {
        _ = e;
    }

    /// Called when a host candidate is rejected by the injector.
    fn on_injection_skipped(&mut self, e: &InjectionSkippedEvent) {
        _ = e;
    }

    /// Called on every binding state transition.
    fn on_binding_transition(&mut self, e: &BindingTransitionEvent) {
        _ = e;
    }

    /// Called when a binding is disposed.
    fn on_binding_disposed(&mut self, e: &BindingDisposedEvent) {
        _ = e;
    }

    /// Called when a tracker publishes changed bounds.
    fn on_bounds_published(&mut self, e: &BoundsPublishedEvent) {
        _ = e;
    }

    /// Called when a stale bounds notification is discarded.
    fn on_stale_bounds(&mut self, e: &StaleBoundsEvent) {
        _ = e;
    }

    /// Called at the end of every layout pass.
    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates one forwarding method per event.
macro_rules! tracer_methods {
    ($($(#[$doc:meta])* $name:ident => $hook:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            #[inline]
            pub fn $name(&mut self, e: &$ty) {
                #[cfg(feature = "trace")]
                if let Some(s) = &mut self.sink {
                    s.$hook(e);
                }
                #[cfg(not(feature = "trace"))]
                {
                    _ = e;
                }
            }
        )*
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    tracer_methods! {
        /// Emits a [`SurfaceResolvedEvent`].
        surface_resolved => on_surface_resolved(SurfaceResolvedEvent);
        /// Emits an [`InjectionSkippedEvent`].
        injection_skipped => on_injection_skipped(InjectionSkippedEvent);
        /// Emits a [`BindingTransitionEvent`].
        binding_transition => on_binding_transition(BindingTransitionEvent);
        /// Emits a [`BindingDisposedEvent`].
        binding_disposed => on_binding_disposed(BindingDisposedEvent);
        /// Emits a [`BoundsPublishedEvent`].
        bounds_published => on_bounds_published(BoundsPublishedEvent);
        /// Emits a [`StaleBoundsEvent`].
        stale_bounds => on_stale_bounds(StaleBoundsEvent);
        /// Emits a [`LayoutPassEvent`].
        layout_pass => on_layout_pass(LayoutPassEvent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
