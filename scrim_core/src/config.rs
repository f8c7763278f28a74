// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

/// Default z-index requested for overlay layers in a layer manager.
///
/// High enough to sit above any content layer; the injector still clamps it
/// below the lowest top-level layer.
pub const OVERLAY_Z_INDEX: i32 = i32::MAX - 1000;

/// Tunables for an [`AdornerEngine`](crate::AdornerEngine).
///
/// The engine never reads ambient state; everything it needs beyond the
/// visual tree comes through this struct.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    /// Z-index requested when injecting into a layer manager.
    pub overlay_z_index: i32,
    /// Restore the scroll offset after restructuring a presenter's content.
    pub restore_scroll_offset: bool,
    /// Bounds that differ by no more than this (in device-independent units)
    /// count as unchanged and do not invalidate the surface.
    pub bounds_epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

impl EngineConfig {
    /// Defaults for desktop hosts.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            overlay_z_index: OVERLAY_Z_INDEX,
            restore_scroll_offset: true,
            bounds_epsilon: 0.0,
        }
    }

    /// Like [`desktop`](Self::desktop), but ignores sub-pixel jitter when
    /// deciding whether to re-arrange.
    #[must_use]
    pub const fn coarse() -> Self {
        Self {
            bounds_epsilon: 0.5,
            ..Self::desktop()
        }
    }
}
