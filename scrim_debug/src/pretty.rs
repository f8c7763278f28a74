// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use scrim_core::trace::{
    BindingDisposedEvent, BindingTransitionEvent, BoundsPublishedEvent, InjectionSkippedEvent,
    LayoutPassEvent, StaleBoundsEvent, SurfaceResolvedEvent, TraceSink,
};
use scrim_core::visual::VisualId;

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Compact `index@generation` form.
fn id(v: VisualId) -> String {
    format!("{}@{}", v.index(), v.generation())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_surface_resolved(&mut self, e: &SurfaceResolvedEvent) {
        let how = if e.injected { "injected" } else { "cached" };
        let _ = writeln!(
            self.writer,
            "[surface] requester={} host={} kind={:?} {how}",
            id(e.requester),
            id(e.host),
            e.kind,
        );
    }

    fn on_injection_skipped(&mut self, e: &InjectionSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[surface:skip] host={} kind={:?}: {}",
            id(e.host),
            e.kind,
            e.reason,
        );
    }

    fn on_binding_transition(&mut self, e: &BindingTransitionEvent) {
        let _ = writeln!(
            self.writer,
            "[binding] target={} adorner={} {:?} -> {:?}",
            id(e.target),
            id(e.adorner),
            e.from,
            e.to,
        );
    }

    fn on_binding_disposed(&mut self, e: &BindingDisposedEvent) {
        let _ = writeln!(
            self.writer,
            "[binding:dispose] target={} adorner={}",
            id(e.target),
            id(e.adorner),
        );
    }

    fn on_bounds_published(&mut self, e: &BoundsPublishedEvent) {
        let r = e.bounds.surface_rect();
        let _ = writeln!(
            self.writer,
            "[bounds] target={} host={} at ({:.1}, {:.1}) size {:.1}x{:.1}{}",
            id(e.target),
            id(e.host),
            r.x0,
            r.y0,
            r.width(),
            r.height(),
            if e.bounds.valid { "" } else { " INVALID" },
        );
    }

    fn on_stale_bounds(&mut self, e: &StaleBoundsEvent) {
        let _ = writeln!(self.writer, "[bounds:stale] target={}", id(e.target));
    }

    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        let _ = writeln!(
            self.writer,
            "[pass] {} attached={} detached={} disposed={} published={} arranged={}",
            e.pass_index,
            e.attached,
            e.detached,
            e.disposed,
            e.bounds_published,
            e.surfaces_arranged,
        );
    }
}
