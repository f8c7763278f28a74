// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live target bounds for one adorner.
//!
//! A [`BoundsTracker`] holds a [`Subscription`] on its target. Each time the
//! subscription fires, the tracker walks the coordinate chain from the target
//! to the host, adds the host's scroll offset when the host scrolls, and
//! publishes a fresh [`TransformedBounds`].
//!
//! The result is expressed in the overlay surface's space. Surfaces sit at the
//! origin of the host's content, so for scroll hosts "host space plus scroll
//! offset" is exactly the surface's space, and the adorner scrolls along with
//! the content it decorates.
//!
//! Transforms are translation-only. Rotated or scaled targets are tracked by
//! their translated origin; this is a known limitation.

use kurbo::{Affine, Point, Rect, Size};

use crate::feed::Subscription;
use crate::trace::{BoundsPublishedEvent, StaleBoundsEvent, Tracer};
use crate::visual::{VisualId, VisualTree};

/// Where an adorner must render, relative to its overlay surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformedBounds {
    /// The target's rectangle in its own local space (origin at zero).
    pub bounds: Rect,
    /// Translation from target-local space into surface space.
    pub transform: Affine,
    /// Whether the bounds could be computed at all.
    pub valid: bool,
}

impl TransformedBounds {
    /// Bounds for a target that cannot be related to its host.
    pub const INVALID: Self = Self {
        bounds: Rect::ZERO,
        transform: Affine::IDENTITY,
        valid: false,
    };

    /// Computes the bounds of `target` relative to `host`.
    ///
    /// The size is the larger of the rendered and last desired size in each
    /// dimension, which hides transient zero sizes during reflow.
    #[must_use]
    pub fn compute(tree: &VisualTree, target: VisualId, host: VisualId) -> Self {
        let Some(mut origin) = tree.translate_point(target, host, Point::ZERO) else {
            return Self::INVALID;
        };
        if let Some(scroll) = tree.scroll_offset(host) {
            origin += scroll;
        }
        let rendered = tree.size(target);
        let desired = tree.desired_size(target);
        let size = Size::new(
            rendered.width.max(desired.width),
            rendered.height.max(desired.height),
        );
        let bounds = Rect::from_origin_size(Point::ZERO, size);
        let transform = Affine::translate(origin.to_vec2());
        Self {
            bounds,
            transform,
            valid: transform.is_finite() && bounds.is_finite(),
        }
    }

    /// Returns the bounds mapped into surface space.
    #[must_use]
    pub fn surface_rect(&self) -> Rect {
        self.transform.transform_rect_bbox(self.bounds)
    }

    /// Returns whether `other` differs from `self` by at most `epsilon` in
    /// every coordinate.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        if self.valid != other.valid {
            return false;
        }
        let a = self.surface_rect();
        let b = other.surface_rect();
        (a.x0 - b.x0).abs() <= epsilon
            && (a.y0 - b.y0).abs() <= epsilon
            && (a.x1 - b.x1).abs() <= epsilon
            && (a.y1 - b.y1).abs() <= epsilon
    }
}

/// Keeps a [`TransformedBounds`] up to date for one target.
#[derive(Debug)]
pub struct BoundsTracker {
    subscription: Subscription,
    current: Option<TransformedBounds>,
}

impl BoundsTracker {
    /// Starts tracking `target`. The first poll always computes.
    #[must_use]
    pub fn new(tree: &VisualTree, target: VisualId) -> Self {
        Self {
            subscription: tree.feed().subscribe(target),
            current: None,
        }
    }

    /// Returns the tracked target.
    #[must_use]
    pub fn target(&self) -> VisualId {
        self.subscription.target()
    }

    /// Returns the last published bounds.
    #[must_use]
    pub fn current(&self) -> Option<TransformedBounds> {
        self.current
    }

    /// Returns the last published bounds if they are valid.
    #[must_use]
    pub fn valid_bounds(&self) -> Option<TransformedBounds> {
        self.current.filter(|b| b.valid)
    }

    /// Forces the next poll to recompute.
    pub fn invalidate(&self) {
        self.subscription.invalidate();
    }

    /// Consumes a pending notification and republishes.
    ///
    /// Notifications for a target that is no longer in the live tree are
    /// discarded. Returns `true` when newly published bounds differ from the
    /// previous ones by more than `epsilon`.
    pub fn poll(
        &mut self,
        tree: &VisualTree,
        host: VisualId,
        epsilon: f64,
        tracer: &mut Tracer<'_>,
    ) -> bool {
        if !self.subscription.take_pending() {
            return false;
        }
        let target = self.target();
        if !tree.is_live(target) {
            tracer.stale_bounds(&StaleBoundsEvent { target });
            return false;
        }
        let next = TransformedBounds::compute(tree, target, host);
        let changed = self.current.is_none_or(|prev| !prev.approx_eq(&next, epsilon));
        if changed {
            // The threshold is measured from the last published bounds.
            self.current = Some(next);
            tracer.bounds_published(&BoundsPublishedEvent {
                target,
                host,
                bounds: next,
            });
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Vec2;

    use super::*;
    use crate::visual::VisualRole;

    #[test]
    fn generic_host_bounds_are_unchanged() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.add_child(root, target);
        tree.set_bounds(target, Rect::new(50.0, 50.0, 70.0, 70.0));

        let tb = TransformedBounds::compute(&tree, target, root);
        assert!(tb.valid);
        assert_eq!(tb.bounds, Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(tb.surface_rect(), Rect::new(50.0, 50.0, 70.0, 70.0));
    }

    #[test]
    fn scroll_host_adds_offset_back() {
        let mut tree = VisualTree::new();
        let presenter = tree.create_root(VisualRole::scroll_presenter());
        let content = tree.create_visual(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.set_content(presenter, Some(content));
        tree.add_child(content, target);
        tree.set_bounds(target, Rect::new(0.0, 1200.0, 100.0, 1240.0));
        tree.set_scroll_offset(presenter, Vec2::new(0.0, 700.0));

        let tb = TransformedBounds::compute(&tree, target, presenter);
        // Surface space is content space.
        assert_eq!(tb.transform.translation(), Vec2::new(0.0, 1200.0));
        assert_eq!(tb.bounds.size(), Size::new(100.0, 40.0));
    }

    #[test]
    fn desired_size_covers_zero_rendered_size() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.add_child(root, target);
        tree.set_desired_size(target, Size::new(30.0, 12.0));

        let tb = TransformedBounds::compute(&tree, target, root);
        assert_eq!(tb.bounds.size(), Size::new(30.0, 12.0));
    }

    #[test]
    fn unrelated_host_is_invalid() {
        let mut tree = VisualTree::new();
        let a = tree.create_root(VisualRole::Panel);
        let b = tree.create_root(VisualRole::Panel);
        assert!(!TransformedBounds::compute(&tree, a, b).valid);
    }

    #[test]
    fn poll_publishes_once_per_notification() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.add_child(root, target);
        tree.set_bounds(target, Rect::new(0.0, 0.0, 10.0, 10.0));
        let _ = tree.evaluate();

        let mut tracker = BoundsTracker::new(&tree, target);
        let mut tracer = Tracer::none();
        assert!(tracker.poll(&tree, root, 0.0, &mut tracer));
        assert!(!tracker.poll(&tree, root, 0.0, &mut tracer));

        tree.set_bounds(target, Rect::new(5.0, 0.0, 15.0, 10.0));
        let _ = tree.evaluate();
        assert!(tracker.poll(&tree, root, 0.0, &mut tracer));
        assert_eq!(
            tracker.current().map(|b| b.surface_rect()),
            Some(Rect::new(5.0, 0.0, 15.0, 10.0))
        );
    }

    #[test]
    fn epsilon_suppresses_jitter() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.add_child(root, target);
        tree.set_bounds(target, Rect::new(0.0, 0.0, 10.0, 10.0));

        let mut tracker = BoundsTracker::new(&tree, target);
        let mut tracer = Tracer::none();
        assert!(tracker.poll(&tree, root, 0.5, &mut tracer));

        tree.set_bounds(target, Rect::new(0.25, 0.0, 10.25, 10.0));
        let _ = tree.evaluate();
        assert!(!tracker.poll(&tree, root, 0.5, &mut tracer));
    }

    #[test]
    fn stale_notification_is_discarded() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let target = tree.create_visual(VisualRole::Element);
        tree.add_child(root, target);

        let mut tracker = BoundsTracker::new(&tree, target);
        tree.remove_from_parent(target);
        let _ = tree.evaluate();

        assert!(!tracker.poll(&tree, root, 0.0, &mut Tracer::none()));
        assert_eq!(tracker.current(), None);
    }

    #[test]
    fn dropping_tracker_releases_subscription() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let tracker = BoundsTracker::new(&tree, root);
        assert_eq!(tree.feed().live_subscriptions(root), 1);
        drop(tracker);
        assert_eq!(tree.feed().live_subscriptions(root), 0);
    }
}
