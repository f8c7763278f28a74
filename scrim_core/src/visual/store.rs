// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays visual storage with allocation, topology, and geometry.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{Affine, Rect, Size, Vec2};
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::evaluate::LifecycleEvent;
use super::host::{ContentTemplate, LayerHost, LayerKind, LayerManager, VisualRole};
use super::id::{INVALID, VisualId};
use super::traverse::{Ancestors, Children};
use crate::dirty;
use crate::feed::BoundsFeed;

/// Struct-of-arrays storage for all visuals.
///
/// Visuals are addressed by [`VisualId`] handles. Internally, each visual
/// occupies a slot in parallel arrays. Destroyed visuals are recycled via a
/// free list, and generation counters prevent stale handle access.
///
/// A visual is *live* when its ancestor chain ends in a root created with
/// [`create_root`](Self::create_root). Entering or leaving the live tree is
/// recorded as a [`LifecycleEvent`] and reported by
/// [`evaluate`](Self::evaluate).
#[derive(Debug)]
pub struct VisualTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Geometry (set by collaborators) --
    pub(crate) offset: Vec<Vec2>,
    pub(crate) size: Vec<Size>,
    pub(crate) desired: Vec<Size>,
    pub(crate) render_transform: Vec<Affine>,
    pub(crate) clip: Vec<Option<Rect>>,

    // -- Container state --
    pub(crate) role: Vec<VisualRole>,
    pub(crate) live: Vec<bool>,
    pub(crate) is_root: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Change tracking --
    pub(crate) dirty: DirtyTracker<u32>,
    pub(crate) feed: BoundsFeed,
    pub(crate) pending_lifecycle: Vec<LifecycleEvent>,
    pub(crate) pending_destroyed: Vec<VisualId>,
}

impl Default for VisualTree {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            offset: Vec::new(),
            size: Vec::new(),
            desired: Vec::new(),
            render_transform: Vec::new(),
            clip: Vec::new(),
            role: Vec::new(),
            live: Vec::new(),
            is_root: Vec::new(),
            generation: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            feed: BoundsFeed::new(),
            pending_lifecycle: Vec::new(),
            pending_destroyed: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new detached visual and returns its handle.
    ///
    /// The visual starts at the origin with zero size, no render transform,
    /// no clip, and no parent.
    pub fn create_visual(&mut self, role: VisualRole) -> VisualId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.offset[i] = Vec2::ZERO;
            self.size[i] = Size::ZERO;
            self.desired[i] = Size::ZERO;
            self.render_transform[i] = Affine::IDENTITY;
            self.clip[i] = None;
            self.role[i] = role;
            self.live[i] = false;
            self.is_root[i] = false;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.offset.push(Vec2::ZERO);
            self.size.push(Size::ZERO);
            self.desired.push(Size::ZERO);
            self.render_transform.push(Affine::IDENTITY);
            self.clip.push(None);
            self.role.push(role);
            self.live.push(false);
            self.is_root.push(false);
            self.generation.push(0);
            idx
        };

        self.dirty.mark(idx, dirty::TOPOLOGY);
        self.id_unchecked(idx)
    }

    /// Creates a root visual. Roots are live for their whole lifetime and
    /// everything attached beneath them is live too.
    pub fn create_root(&mut self, role: VisualRole) -> VisualId {
        let id = self.create_visual(role);
        self.is_root[id.idx as usize] = true;
        self.set_subtree_live(id.idx, true);
        id
    }

    /// Destroys a visual, freeing its slot for reuse.
    ///
    /// A live visual leaves the live tree first, so a `Detached` event
    /// precedes its entry in [`TreeChanges::destroyed`](super::TreeChanges).
    ///
    /// # Panics
    ///
    /// Panics if the visual has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_visual(&mut self, id: VisualId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy visual with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.remove_from_parent(id);
        } else if self.live[idx as usize] {
            self.set_subtree_live(idx, false);
        }
        // Drops any template or layer stack the slot carried.
        self.role[idx as usize] = VisualRole::Element;

        self.dirty.remove_key(idx);
        self.generation[idx as usize] += 1;
        self.free_list.push(idx);
        self.pending_destroyed.push(id);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to an existing visual.
    #[must_use]
    pub fn is_alive(&self, id: VisualId) -> bool {
        (id.idx < self.len)
            && self.generation[id.idx as usize] == id.generation
            && !self.free_list.contains(&id.idx)
    }

    /// Returns whether the visual exists and is attached to a root.
    #[must_use]
    pub fn is_live(&self, id: VisualId) -> bool {
        self.is_alive(id) && self.live[id.idx as usize]
    }

    /// Returns the handle for raw slot `idx`, if that slot holds a visual.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> Option<VisualId> {
        let id = self.id_unchecked(idx);
        (idx < self.len && self.is_alive(id)).then_some(id)
    }

    /// Returns the bounds notification feed for this tree.
    #[must_use]
    pub fn feed(&self) -> &BoundsFeed {
        &self.feed
    }

    // -- Topology API --

    /// Adds `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: VisualId, child: VisualId) {
        self.validate(parent);
        self.validate(child);
        let p = parent.idx;
        let c = child.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        assert!(!self.is_root[c as usize], "a root cannot be a child");

        self.parent[c as usize] = p;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }

        self.after_link(p, c);
    }

    /// Inserts `child` before `sibling` in the sibling list.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: VisualId, sibling: VisualId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.after_link(p, c);
    }

    /// Removes `child` from its current parent.
    ///
    /// Removing the content of a scroll presenter resets the presenter's
    /// scroll offset to zero, since its scrollable extent collapses.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the visual has no parent.
    pub fn remove_from_parent(&mut self, child: VisualId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "visual has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);
        self.dirty.remove_dependency(c, p, dirty::BOUNDS);

        if let VisualRole::ScrollPresenter(state) = &mut self.role[p as usize] {
            if state.offset != Vec2::ZERO {
                state.offset = Vec2::ZERO;
                self.dirty.mark(p, dirty::SCROLL);
            }
        }
        if let VisualRole::LayerManager(mgr) = &mut self.role[p as usize] {
            mgr.remove_layer(child);
        }

        if self.live[c as usize] {
            self.set_subtree_live(c, false);
        }
        self.dirty.mark_with(c, dirty::BOUNDS, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to the end of `new_parent`'s children.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: VisualId, new_parent: VisualId) {
        self.validate(child);
        if self.parent[child.idx as usize] != INVALID {
            self.remove_from_parent(child);
        }
        self.add_child(new_parent, child);
    }

    /// Returns the parent of a visual, if any.
    #[must_use]
    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_unchecked(p))
    }

    /// Returns an iterator over the direct children of a visual.
    #[must_use]
    pub fn children(&self, id: VisualId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns an iterator over the strict ancestors of a visual, innermost
    /// first.
    #[must_use]
    pub fn ancestors(&self, id: VisualId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, self.parent[id.idx as usize])
    }

    /// Returns whether `ancestor` is a strict ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: VisualId, descendant: VisualId) -> bool {
        self.validate(ancestor);
        self.ancestors(descendant).any(|a| a == ancestor)
    }

    /// Returns the top-most ancestor of a visual (the visual itself if it has
    /// no parent).
    #[must_use]
    pub fn root_of(&self, id: VisualId) -> VisualId {
        self.ancestors(id).last().unwrap_or(id)
    }

    // -- Role API --

    /// Returns the role of a visual.
    #[must_use]
    pub fn role(&self, id: VisualId) -> &VisualRole {
        self.validate(id);
        &self.role[id.idx as usize]
    }

    /// Returns the layer stack of a layer-manager visual.
    #[must_use]
    pub fn layer_host(&self, id: VisualId) -> Option<&LayerManager> {
        match self.role(id) {
            VisualRole::LayerManager(mgr) => Some(mgr),
            _ => None,
        }
    }

    /// Registers `layer` in the layer stack of `host` and inserts it into the
    /// child list at the position its z-index dictates.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `host` is not a layer manager, or `layer`
    /// already has a parent.
    pub fn add_layer(&mut self, host: VisualId, layer: VisualId, z_index: i32, kind: LayerKind) {
        self.validate(host);
        self.validate(layer);
        let before = match &mut self.role[host.idx as usize] {
            VisualRole::LayerManager(mgr) => mgr.add_layer(layer, z_index, kind),
            _ => panic!("{host:?} is not a layer manager"),
        };
        match before {
            Some(sibling) => self.insert_before(layer, sibling),
            None => self.add_child(host, layer),
        }
    }

    // -- Scroll presenter API --

    /// Returns the scroll offset of a presenter, or `None` for other roles.
    #[must_use]
    pub fn scroll_offset(&self, id: VisualId) -> Option<Vec2> {
        match self.role(id) {
            VisualRole::ScrollPresenter(state) => Some(state.offset),
            _ => None,
        }
    }

    /// Sets the scroll offset of a presenter.
    ///
    /// Marks the SCROLL channel for the presenter and the BOUNDS channel for
    /// its content subtree.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the visual is not a scroll presenter.
    pub fn set_scroll_offset(&mut self, id: VisualId, offset: Vec2) {
        self.validate(id);
        let VisualRole::ScrollPresenter(state) = &mut self.role[id.idx as usize] else {
            panic!("{id:?} is not a scroll presenter");
        };
        if state.offset == offset {
            return;
        }
        state.offset = offset;
        self.dirty.mark(id.idx, dirty::SCROLL);
        let mut child = self.first_child[id.idx as usize];
        while child != INVALID {
            self.dirty.mark_with(child, dirty::BOUNDS, &EagerPolicy);
            child = self.next_sibling[child as usize];
        }
    }

    /// Returns the content of a presenter (its first child).
    #[must_use]
    pub fn content(&self, id: VisualId) -> Option<VisualId> {
        self.children(id).next()
    }

    /// Replaces the content of a scroll presenter.
    ///
    /// Any previous content is detached, which resets the scroll offset.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale or `id` is not a scroll presenter.
    pub fn set_content(&mut self, id: VisualId, content: Option<VisualId>) {
        assert!(
            self.role(id).is_scroll_presenter(),
            "{id:?} is not a scroll presenter"
        );
        if let Some(old) = self.content(id) {
            self.remove_from_parent(old);
        }
        if let Some(content) = content {
            self.add_child(id, content);
        }
    }

    /// Installs a content template on a presenter and realizes it for `item`.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or `id` is not a scroll presenter.
    pub fn set_content_template(
        &mut self,
        id: VisualId,
        template: Box<dyn ContentTemplate>,
        item: u64,
    ) {
        self.validate(id);
        let VisualRole::ScrollPresenter(state) = &mut self.role[id.idx as usize] else {
            panic!("{id:?} is not a scroll presenter");
        };
        state.template = Some(template);
        state.item = item;
        self.realize_content(id);
    }

    /// Changes the data item of a templated presenter and re-realizes it.
    pub fn set_content_item(&mut self, id: VisualId, item: u64) {
        self.validate(id);
        if let VisualRole::ScrollPresenter(state) = &mut self.role[id.idx as usize] {
            state.item = item;
        }
        self.realize_content(id);
    }

    /// Rebuilds the content of a templated presenter from its template.
    ///
    /// Returns the new content root, or `None` if the presenter has no
    /// template.
    pub fn realize_content(&mut self, id: VisualId) -> Option<VisualId> {
        self.validate(id);
        let (mut template, item) = match &mut self.role[id.idx as usize] {
            VisualRole::ScrollPresenter(state) => (state.template.take()?, state.item),
            _ => return None,
        };
        if let Some(old) = self.content(id) {
            self.remove_from_parent(old);
        }
        let built = template.build(self, item);
        self.add_child(id, built);
        if let VisualRole::ScrollPresenter(state) = &mut self.role[id.idx as usize] {
            state.template = Some(template);
        }
        Some(built)
    }

    /// Removes the content template of a presenter without touching the
    /// realized content.
    pub(crate) fn take_content_template(
        &mut self,
        id: VisualId,
    ) -> Option<Box<dyn ContentTemplate>> {
        self.validate(id);
        match &mut self.role[id.idx as usize] {
            VisualRole::ScrollPresenter(state) => state.template.take(),
            _ => None,
        }
    }

    /// Stores a content template on a presenter without realizing it.
    pub(crate) fn put_content_template(&mut self, id: VisualId, template: Box<dyn ContentTemplate>) {
        self.validate(id);
        if let VisualRole::ScrollPresenter(state) = &mut self.role[id.idx as usize] {
            state.template = Some(template);
        }
    }

    // -- Geometry getters --

    /// Returns the bounds of a visual in its parent's space.
    #[must_use]
    pub fn bounds(&self, id: VisualId) -> Rect {
        self.validate(id);
        let i = id.idx as usize;
        Rect::from_origin_size(self.offset[i].to_point(), self.size[i])
    }

    /// Returns the rendered size of a visual.
    #[must_use]
    pub fn size(&self, id: VisualId) -> Size {
        self.validate(id);
        self.size[id.idx as usize]
    }

    /// Returns the last desired (measured) size of a visual.
    #[must_use]
    pub fn desired_size(&self, id: VisualId) -> Size {
        self.validate(id);
        self.desired[id.idx as usize]
    }

    /// Returns the render transform of a visual.
    #[must_use]
    pub fn render_transform(&self, id: VisualId) -> Affine {
        self.validate(id);
        self.render_transform[id.idx as usize]
    }

    /// Returns the clip rectangle of a visual, in its local space.
    #[must_use]
    pub fn clip(&self, id: VisualId) -> Option<Rect> {
        self.validate(id);
        self.clip[id.idx as usize]
    }

    // -- Geometry mutation (auto-marks dirty) --

    /// Sets the bounds of a visual in its parent's space.
    ///
    /// Marks the BOUNDS channel with eager propagation to descendants.
    pub fn set_bounds(&mut self, id: VisualId, bounds: Rect) {
        self.validate(id);
        let i = id.idx as usize;
        let offset = bounds.origin().to_vec2();
        let size = bounds.size();
        if self.offset[i] == offset && self.size[i] == size {
            return;
        }
        self.offset[i] = offset;
        self.size[i] = size;
        self.dirty.mark_with(id.idx, dirty::BOUNDS, &EagerPolicy);
    }

    /// Sets the desired (measured) size of a visual.
    pub fn set_desired_size(&mut self, id: VisualId, size: Size) {
        self.validate(id);
        if self.desired[id.idx as usize] == size {
            return;
        }
        self.desired[id.idx as usize] = size;
        self.dirty.mark_with(id.idx, dirty::BOUNDS, &EagerPolicy);
    }

    /// Sets the render transform, applied about the visual's own origin.
    pub fn set_render_transform(&mut self, id: VisualId, transform: Affine) {
        self.validate(id);
        if self.render_transform[id.idx as usize] == transform {
            return;
        }
        self.render_transform[id.idx as usize] = transform;
        self.dirty.mark_with(id.idx, dirty::BOUNDS, &EagerPolicy);
    }

    /// Sets the clip rectangle of a visual, in its local space.
    pub fn set_clip(&mut self, id: VisualId, clip: Option<Rect>) {
        self.validate(id);
        self.clip[id.idx as usize] = clip;
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: VisualId) {
        assert!(
            id.idx < self.len && self.generation[id.idx as usize] == id.generation,
            "stale VisualId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    pub(crate) fn id_unchecked(&self, idx: u32) -> VisualId {
        VisualId {
            idx,
            generation: self.generation.get(idx as usize).copied().unwrap_or(0),
        }
    }

    /// Shared tail of every link operation.
    fn after_link(&mut self, p: u32, c: u32) {
        let _ = self.dirty.add_dependency(c, p, dirty::BOUNDS);
        self.dirty.mark_with(c, dirty::BOUNDS, &EagerPolicy);
        self.dirty.mark(p, dirty::TOPOLOGY);
        if self.live[p as usize] && !self.live[c as usize] {
            self.set_subtree_live(c, true);
        }
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Flips liveness for the subtree rooted at `idx`, recording one
    /// lifecycle event per visual in pre-order.
    fn set_subtree_live(&mut self, idx: u32, live: bool) {
        let mut stack = Vec::new();
        stack.push(idx);
        while let Some(i) = stack.pop() {
            self.live[i as usize] = live;
            let id = self.id_unchecked(i);
            self.pending_lifecycle.push(if live {
                LifecycleEvent::Attached(id)
            } else {
                LifecycleEvent::Detached(id)
            });
            // Push in reverse so the first child is visited first.
            let start = stack.len();
            let mut child = self.first_child[i as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            stack[start..].reverse();
        }
    }
}
