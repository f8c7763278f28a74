// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay surfaces.
//!
//! An [`OverlaySurface`] is a transparent canvas injected into a host. It
//! fills its parent, and each adorner child is placed from the
//! [`TransformedBounds`] its [`BoundsTracker`] publishes:
//!
//! - measured to the bounds' size,
//! - given the bounds' transform as a render transform about its own origin,
//! - clipped to the bounds.
//!
//! Children without valid bounds stretch over the whole surface. Child order
//! is insertion order, which is z-order.

use alloc::vec::Vec;
use core::fmt;

use kurbo::{Affine, Point, Rect, Size};

use crate::bounds::{BoundsTracker, TransformedBounds};
use crate::locate::HostKind;
use crate::trace::Tracer;
use crate::visual::{VisualId, VisualTree};

/// Identifies an [`OverlaySurface`] within a [`LayerLocator`](crate::LayerLocator).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SurfaceKey(pub(crate) u32);

impl fmt::Debug for SurfaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceKey({})", self.0)
    }
}

#[derive(Debug)]
struct AdornerEntry {
    adorner: VisualId,
    tracker: BoundsTracker,
}

/// A host-filling canvas that positions adorners over their targets.
#[derive(Debug)]
pub struct OverlaySurface {
    key: SurfaceKey,
    host: VisualId,
    visual: VisualId,
    kind: HostKind,
    entries: Vec<AdornerEntry>,
    needs_arrange: bool,
    arranged_size: Option<Size>,
}

impl OverlaySurface {
    pub(crate) fn new(key: SurfaceKey, host: VisualId, visual: VisualId, kind: HostKind) -> Self {
        Self {
            key,
            host,
            visual,
            kind,
            entries: Vec::new(),
            needs_arrange: true,
            arranged_size: None,
        }
    }

    /// Returns the surface's key.
    #[must_use]
    pub fn key(&self) -> SurfaceKey {
        self.key
    }

    /// Returns the host carrying the surface.
    #[must_use]
    pub fn host(&self) -> VisualId {
        self.host
    }

    /// Returns the surface's own canvas visual.
    #[must_use]
    pub fn visual(&self) -> VisualId {
        self.visual
    }

    /// Returns how the host was classified when the surface was injected.
    #[must_use]
    pub fn kind(&self) -> HostKind {
        self.kind
    }

    /// Returns the number of adorners on the surface.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the surface holds no adorners.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the adorners in z-order, bottom-most first.
    pub fn adorners(&self) -> impl Iterator<Item = VisualId> + '_ {
        self.entries.iter().map(|e| e.adorner)
    }

    /// Returns whether `adorner` is on this surface.
    #[must_use]
    pub fn contains(&self, adorner: VisualId) -> bool {
        self.entries.iter().any(|e| e.adorner == adorner)
    }

    /// Returns the target `adorner` is tracking.
    #[must_use]
    pub fn target_of(&self, adorner: VisualId) -> Option<VisualId> {
        self.entry(adorner).map(|e| e.tracker.target())
    }

    /// Returns the last bounds published for `adorner`'s target.
    #[must_use]
    pub fn bounds_of(&self, adorner: VisualId) -> Option<TransformedBounds> {
        self.entry(adorner).and_then(|e| e.tracker.current())
    }

    /// Returns whether the surface still hangs beneath its host.
    #[must_use]
    pub fn is_mounted(&self, tree: &VisualTree) -> bool {
        tree.is_alive(self.host)
            && tree.is_alive(self.visual)
            && tree.is_ancestor_of(self.host, self.visual)
    }

    /// Registers `adorner` for `target`, starts tracking, and appends the
    /// adorner on top of the existing ones.
    ///
    /// Returns `false` if the adorner is already on this surface. An adorner
    /// that still has another parent is moved.
    pub fn add_adorner(&mut self, tree: &mut VisualTree, adorner: VisualId, target: VisualId) -> bool {
        if self.contains(adorner) {
            return false;
        }
        if tree.parent(adorner).is_some() {
            tree.remove_from_parent(adorner);
        }
        tree.add_child(self.visual, adorner);
        self.entries.push(AdornerEntry {
            adorner,
            tracker: BoundsTracker::new(tree, target),
        });
        self.needs_arrange = true;
        true
    }

    /// Removes `adorner`, disposing its tracking subscription.
    ///
    /// Returns `false` if the adorner is not on this surface.
    pub fn remove_adorner(&mut self, tree: &mut VisualTree, adorner: VisualId) -> bool {
        let Some(pos) = self.entries.iter().position(|e| e.adorner == adorner) else {
            return false;
        };
        // Dropping the entry drops its subscription.
        self.entries.remove(pos);
        if tree.is_alive(adorner) {
            if tree.parent(adorner) == Some(self.visual) {
                tree.remove_from_parent(adorner);
            }
            tree.set_render_transform(adorner, Affine::IDENTITY);
            tree.set_clip(adorner, None);
        }
        self.needs_arrange = true;
        true
    }

    /// Polls every tracker and returns how many published changed bounds.
    ///
    /// Entries whose adorner was destroyed behind the surface's back are
    /// dropped.
    pub fn update_bounds(&mut self, tree: &VisualTree, epsilon: f64, tracer: &mut Tracer<'_>) -> u32 {
        let before = self.entries.len();
        self.entries.retain(|e| tree.is_alive(e.adorner));
        if self.entries.len() != before {
            self.needs_arrange = true;
        }

        let mut published = 0;
        for entry in &mut self.entries {
            if entry.tracker.poll(tree, self.host, epsilon, tracer) {
                published += 1;
                self.needs_arrange = true;
            }
        }
        published
    }

    /// Runs measure and arrange if bounds changed or the parent was resized.
    /// For scrollable hosts the wrapper panel is first refitted to the
    /// content beside the canvas.
    ///
    /// Returns whether a pass ran.
    pub fn layout(&mut self, tree: &mut VisualTree) -> bool {
        let Some(parent) = tree.parent(self.visual) else {
            return false;
        };
        if self.kind.is_scrollable() {
            self.fit_wrapper(tree, parent);
        }
        let final_size = tree.size(parent);
        if !self.needs_arrange && self.arranged_size == Some(final_size) {
            return false;
        }
        let _ = self.measure(tree, final_size);
        let _ = self.arrange(tree, final_size);
        true
    }

    /// Measures each adorner against its target's size, or `available` when
    /// it has no valid bounds. The canvas itself asks for no space.
    pub fn measure(&self, tree: &mut VisualTree, available: Size) -> Size {
        for entry in &self.entries {
            let desired = entry
                .tracker
                .valid_bounds()
                .map_or(available, |b| b.bounds.size());
            tree.set_desired_size(entry.adorner, desired);
        }
        Size::ZERO
    }

    /// Places every adorner and returns `final_size`.
    ///
    /// With a zero-area host, or for an adorner whose target is not live,
    /// the adorner gets an empty clip and renders nothing.
    pub fn arrange(&mut self, tree: &mut VisualTree, final_size: Size) -> Size {
        tree.set_bounds(self.visual, Rect::from_origin_size(Point::ZERO, final_size));
        let empty_host = final_size.width <= 0.0 || final_size.height <= 0.0;

        for entry in &self.entries {
            let adorner = entry.adorner;
            if empty_host || !tree.is_live(entry.tracker.target()) {
                tree.set_clip(adorner, Some(Rect::ZERO));
                continue;
            }
            match entry.tracker.valid_bounds() {
                Some(tb) => {
                    tree.set_bounds(adorner, tb.bounds);
                    tree.set_render_transform(adorner, tb.transform);
                    tree.set_clip(adorner, Some(tb.bounds));
                }
                None => {
                    tree.set_bounds(adorner, Rect::from_origin_size(Point::ZERO, final_size));
                    tree.set_render_transform(adorner, Affine::IDENTITY);
                    tree.set_clip(adorner, None);
                }
            }
        }

        self.needs_arrange = false;
        self.arranged_size = Some(final_size);
        final_size
    }

    /// Grows or shrinks the wrapper panel of a scrollable host to cover the
    /// content it stacks under the canvas.
    fn fit_wrapper(&self, tree: &mut VisualTree, panel: VisualId) {
        let extent = tree
            .children(panel)
            .filter(|&c| c != self.visual)
            .map(|c| tree.bounds(c))
            .fold(Size::ZERO, |acc, b| {
                Size::new(acc.width.max(b.x1), acc.height.max(b.y1))
            });
        let origin = tree.bounds(panel).origin();
        tree.set_bounds(panel, Rect::from_origin_size(origin, extent));
    }

    fn entry(&self, adorner: VisualId) -> Option<&AdornerEntry> {
        self.entries.iter().find(|e| e.adorner == adorner)
    }
}
