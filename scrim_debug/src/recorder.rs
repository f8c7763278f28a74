// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].

use kurbo::{Affine, Rect};
use scrim_core::HostKind;
use scrim_core::binder::BindingState;
use scrim_core::bounds::TransformedBounds;
use scrim_core::inject::InjectError;
use scrim_core::trace::{
    BindingDisposedEvent, BindingTransitionEvent, BoundsPublishedEvent, InjectionSkippedEvent,
    LayoutPassEvent, StaleBoundsEvent, SurfaceResolvedEvent, TraceSink,
};
use scrim_core::visual::VisualId;

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_SURFACE_RESOLVED: u8 = 1;
const TAG_INJECTION_SKIPPED: u8 = 2;
const TAG_BINDING_TRANSITION: u8 = 3;
const TAG_BINDING_DISPOSED: u8 = 4;
const TAG_BOUNDS_PUBLISHED: u8 = 5;
const TAG_STALE_BOUNDS: u8 = 6;
const TAG_LAYOUT_PASS: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_id(&mut self, v: VisualId) {
        self.write_u32(v.index());
        self.write_u32(v.generation());
    }

    fn write_kind(&mut self, k: HostKind) {
        self.write_u8(match k {
            HostKind::Generic => 0,
            HostKind::ScrollableSingleChild => 1,
            HostKind::ScrollableTemplated => 2,
            HostKind::LayerManager => 3,
        });
    }

    fn write_state(&mut self, s: BindingState) {
        self.write_u8(match s {
            BindingState::Unbound => 0,
            BindingState::Attached => 1,
            BindingState::Detached => 2,
        });
    }

    fn write_bounds(&mut self, b: &TransformedBounds) {
        for v in [b.bounds.x0, b.bounds.y0, b.bounds.x1, b.bounds.y1] {
            self.write_f64(v);
        }
        for v in b.transform.as_coeffs() {
            self.write_f64(v);
        }
        self.write_u8(u8::from(b.valid));
    }
}

impl TraceSink for RecorderSink {
    fn on_surface_resolved(&mut self, e: &SurfaceResolvedEvent) {
        self.write_u8(TAG_SURFACE_RESOLVED);
        self.write_id(e.requester);
        self.write_id(e.host);
        self.write_kind(e.kind);
        self.write_u8(u8::from(e.injected));
    }

    fn on_injection_skipped(&mut self, e: &InjectionSkippedEvent) {
        self.write_u8(TAG_INJECTION_SKIPPED);
        self.write_id(e.host);
        self.write_kind(e.kind);
        match e.reason {
            InjectError::UnsupportedHostShape(kind) => self.write_kind(kind),
        }
    }

    fn on_binding_transition(&mut self, e: &BindingTransitionEvent) {
        self.write_u8(TAG_BINDING_TRANSITION);
        self.write_id(e.target);
        self.write_id(e.adorner);
        self.write_state(e.from);
        self.write_state(e.to);
    }

    fn on_binding_disposed(&mut self, e: &BindingDisposedEvent) {
        self.write_u8(TAG_BINDING_DISPOSED);
        self.write_id(e.target);
        self.write_id(e.adorner);
    }

    fn on_bounds_published(&mut self, e: &BoundsPublishedEvent) {
        self.write_u8(TAG_BOUNDS_PUBLISHED);
        self.write_id(e.target);
        self.write_id(e.host);
        self.write_bounds(&e.bounds);
    }

    fn on_stale_bounds(&mut self, e: &StaleBoundsEvent) {
        self.write_u8(TAG_STALE_BOUNDS);
        self.write_id(e.target);
    }

    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        self.write_u8(TAG_LAYOUT_PASS);
        self.write_u64(e.pass_index);
        self.write_u32(e.attached);
        self.write_u32(e.detached);
        self.write_u32(e.disposed);
        self.write_u32(e.bounds_published);
        self.write_u32(e.surfaces_arranged);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`SurfaceResolvedEvent`].
    SurfaceResolved(SurfaceResolvedEvent),
    /// An [`InjectionSkippedEvent`].
    InjectionSkipped(InjectionSkippedEvent),
    /// A [`BindingTransitionEvent`].
    BindingTransition(BindingTransitionEvent),
    /// A [`BindingDisposedEvent`].
    BindingDisposed(BindingDisposedEvent),
    /// A [`BoundsPublishedEvent`].
    BoundsPublished(BoundsPublishedEvent),
    /// A [`StaleBoundsEvent`].
    StaleBounds(StaleBoundsEvent),
    /// A [`LayoutPassEvent`].
    LayoutPass(LayoutPassEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_bool(&mut self) -> Option<bool> {
        self.read_u8().map(|b| b != 0)
    }

    fn read_id(&mut self) -> Option<VisualId> {
        Some(VisualId::from_raw(self.read_u32()?, self.read_u32()?))
    }

    fn read_kind(&mut self) -> Option<HostKind> {
        Some(match self.read_u8()? {
            0 => HostKind::Generic,
            1 => HostKind::ScrollableSingleChild,
            2 => HostKind::ScrollableTemplated,
            _ => HostKind::LayerManager,
        })
    }

    fn read_state(&mut self) -> Option<BindingState> {
        Some(match self.read_u8()? {
            0 => BindingState::Unbound,
            1 => BindingState::Attached,
            _ => BindingState::Detached,
        })
    }

    fn read_bounds(&mut self) -> Option<TransformedBounds> {
        let bounds = Rect::new(
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
            self.read_f64()?,
        );
        let mut coeffs = [0.0; 6];
        for c in &mut coeffs {
            *c = self.read_f64()?;
        }
        Some(TransformedBounds {
            bounds,
            transform: Affine::new(coeffs),
            valid: self.read_bool()?,
        })
    }

    fn decode_surface_resolved(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::SurfaceResolved(SurfaceResolvedEvent {
            requester: self.read_id()?,
            host: self.read_id()?,
            kind: self.read_kind()?,
            injected: self.read_bool()?,
        }))
    }

    fn decode_injection_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::InjectionSkipped(InjectionSkippedEvent {
            host: self.read_id()?,
            kind: self.read_kind()?,
            reason: InjectError::UnsupportedHostShape(self.read_kind()?),
        }))
    }

    fn decode_binding_transition(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BindingTransition(BindingTransitionEvent {
            target: self.read_id()?,
            adorner: self.read_id()?,
            from: self.read_state()?,
            to: self.read_state()?,
        }))
    }

    fn decode_binding_disposed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BindingDisposed(BindingDisposedEvent {
            target: self.read_id()?,
            adorner: self.read_id()?,
        }))
    }

    fn decode_bounds_published(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::BoundsPublished(BoundsPublishedEvent {
            target: self.read_id()?,
            host: self.read_id()?,
            bounds: self.read_bounds()?,
        }))
    }

    fn decode_stale_bounds(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::StaleBounds(StaleBoundsEvent {
            target: self.read_id()?,
        }))
    }

    fn decode_layout_pass(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayoutPass(LayoutPassEvent {
            pass_index: self.read_u64()?,
            attached: self.read_u32()?,
            detached: self.read_u32()?,
            disposed: self.read_u32()?,
            bounds_published: self.read_u32()?,
            surfaces_arranged: self.read_u32()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_SURFACE_RESOLVED => self.decode_surface_resolved(),
            TAG_INJECTION_SKIPPED => self.decode_injection_skipped(),
            TAG_BINDING_TRANSITION => self.decode_binding_transition(),
            TAG_BINDING_DISPOSED => self.decode_binding_disposed(),
            TAG_BOUNDS_PUBLISHED => self.decode_bounds_published(),
            TAG_STALE_BOUNDS => self.decode_stale_bounds(),
            TAG_LAYOUT_PASS => self.decode_layout_pass(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
