// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate-space conversion along the parent chain.
//!
//! Each visual maps into its parent's space by its render transform (about its
//! own origin) followed by its offset. Children of a scroll presenter are
//! additionally shifted by the negated scroll offset.

use kurbo::{Affine, Point, Rect};

use super::host::VisualRole;
use super::id::{INVALID, VisualId};
use super::store::VisualTree;

impl VisualTree {
    /// Returns the transform from a visual's local space to its parent's.
    #[must_use]
    pub fn local_to_parent(&self, id: VisualId) -> Affine {
        self.validate(id);
        self.local_to_parent_at(id.idx)
    }

    /// Returns the transform from a visual's local space to the space of the
    /// top-most ancestor, together with that ancestor.
    #[must_use]
    pub fn transform_to_root(&self, id: VisualId) -> (Affine, VisualId) {
        self.validate(id);
        let mut transform = Affine::IDENTITY;
        let mut idx = id.idx;
        loop {
            let parent = self.parent[idx as usize];
            if parent == INVALID {
                return (transform, self.id_unchecked(idx));
            }
            transform = self.local_to_parent_at(idx) * transform;
            idx = parent;
        }
    }

    /// Returns the transform from `from`'s local space to `to`'s local space.
    ///
    /// Returns `None` if the two visuals do not share a root. No common
    /// ancestor with an identity transform is assumed.
    #[must_use]
    pub fn transform_between(&self, from: VisualId, to: VisualId) -> Option<Affine> {
        let (from_root, root_a) = self.transform_to_root(from);
        let (to_root, root_b) = self.transform_to_root(to);
        (root_a == root_b).then(|| to_root.inverse() * from_root)
    }

    /// Maps `point` from `from`'s local space into `to`'s local space.
    #[must_use]
    pub fn translate_point(&self, from: VisualId, to: VisualId, point: Point) -> Option<Point> {
        self.transform_between(from, to).map(|t| t * point)
    }

    /// Returns the rectangle a visual covers on screen, expressed in
    /// `relative_to`'s space.
    ///
    /// The local rectangle is intersected with the visual's clip. Returns
    /// `None` when the visual is not live, the two visuals do not share a
    /// root, or nothing remains visible after clipping.
    #[must_use]
    pub fn rendered_rect(&self, id: VisualId, relative_to: VisualId) -> Option<Rect> {
        if !self.is_live(id) {
            return None;
        }
        let i = id.idx as usize;
        let local = Rect::from_origin_size(Point::ZERO, self.size[i]);
        let visible = match self.clip[i] {
            Some(clip) => local.intersect(clip),
            None => local,
        };
        if visible.area() <= 0.0 {
            return None;
        }
        self.transform_between(id, relative_to)
            .map(|t| t.transform_rect_bbox(visible))
    }

    fn local_to_parent_at(&self, idx: u32) -> Affine {
        let i = idx as usize;
        let mut transform = Affine::translate(self.offset[i]) * self.render_transform[i];
        let parent = self.parent[i];
        if parent != INVALID {
            if let VisualRole::ScrollPresenter(state) = &self.role[parent as usize] {
                transform = Affine::translate(-state.offset) * transform;
            }
        }
        transform
    }
}
