// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container roles and the capabilities hosts expose to the engine.
//!
//! A visual's [`VisualRole`] describes what kind of container it is. Only
//! three roles carry host-specific state:
//!
//! - [`ScrollState`] for scroll presenters: the current scroll offset plus an
//!   optional [`ContentTemplate`] that produces the presenter's content.
//! - [`LayerManager`] for layer stacks, which implements [`LayerHost`].
//! - [`VisualRole::OverlaySurface`] marks the canvas the engine injects.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Vec2;

use super::id::VisualId;
use super::store::VisualTree;

/// Produces presenter content for a data item.
///
/// Templates are invoked by [`VisualTree::realize_content`]. The returned
/// visual must be parentless; the tree attaches it as the presenter's content.
pub trait ContentTemplate: fmt::Debug {
    /// Builds the visual subtree for `item` and returns its root.
    fn build(&mut self, tree: &mut VisualTree, item: u64) -> VisualId;
}

/// What kind of container a visual is.
#[derive(Debug, Default)]
pub enum VisualRole {
    /// A leaf or otherwise opaque element.
    #[default]
    Element,
    /// A plain stacking panel; children overlap at their own offsets.
    Panel,
    /// A scrollable viewport presenting a single content child.
    ScrollPresenter(ScrollState),
    /// A stack of z-ordered layers.
    LayerManager(LayerManager),
    /// An injected overlay canvas.
    OverlaySurface,
}

impl VisualRole {
    /// Creates a scroll presenter role with no content and a zero offset.
    #[must_use]
    pub fn scroll_presenter() -> Self {
        Self::ScrollPresenter(ScrollState::default())
    }

    /// Creates an empty layer manager role.
    #[must_use]
    pub fn layer_manager() -> Self {
        Self::LayerManager(LayerManager::default())
    }

    /// Returns whether this role scrolls its content.
    #[must_use]
    pub fn is_scroll_presenter(&self) -> bool {
        matches!(self, Self::ScrollPresenter(_))
    }

    /// Returns whether this role is a layer stack.
    #[must_use]
    pub fn is_layer_manager(&self) -> bool {
        matches!(self, Self::LayerManager(_))
    }
}

/// Per-presenter scroll state.
#[derive(Debug, Default)]
pub struct ScrollState {
    /// Current scroll offset; content is displayed at `-offset`.
    pub(crate) offset: Vec2,
    /// Template that produces the content, if the presenter is templated.
    pub(crate) template: Option<Box<dyn ContentTemplate>>,
    /// Data item handed to the template.
    pub(crate) item: u64,
}

impl ScrollState {
    /// Returns the current scroll offset.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Returns whether content is produced by a template.
    #[must_use]
    pub fn is_templated(&self) -> bool {
        self.template.is_some()
    }
}

/// The kind of a layer in a [`LayerManager`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Ordinary application content.
    Content,
    /// An adorner overlay.
    Overlay,
    /// Modal dialogs, popups, tooltips; always above overlays.
    TopLevel,
}

/// One registered layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerSlot {
    /// The layer's visual.
    pub visual: VisualId,
    /// Stacking order; higher renders above lower.
    pub z_index: i32,
    /// What the layer holds.
    pub kind: LayerKind,
}

/// The "add layer at z-index" capability of a layer-stack container.
pub trait LayerHost {
    /// Returns the registered layers, bottom-most first.
    fn layers(&self) -> &[LayerSlot];

    /// Registers `layer` at `z_index`.
    ///
    /// Returns the already-registered layer that `layer` must be inserted
    /// before in the child list, or `None` to append it.
    fn add_layer(&mut self, layer: VisualId, z_index: i32, kind: LayerKind) -> Option<VisualId>;

    /// Unregisters `layer`. Returns `false` if it was not registered.
    fn remove_layer(&mut self, layer: VisualId) -> bool;

    /// Returns the lowest z-index among [`LayerKind::TopLevel`] layers.
    fn lowest_top_level_z(&self) -> Option<i32> {
        self.layers()
            .iter()
            .filter(|slot| slot.kind == LayerKind::TopLevel)
            .map(|slot| slot.z_index)
            .min()
    }

    /// Returns the highest z-index among [`LayerKind::Content`] layers.
    fn highest_content_z(&self) -> Option<i32> {
        self.layers()
            .iter()
            .filter(|slot| slot.kind == LayerKind::Content)
            .map(|slot| slot.z_index)
            .max()
    }
}

/// A z-ordered layer stack.
///
/// Layers with equal z-index keep their registration order.
#[derive(Clone, Debug, Default)]
pub struct LayerManager {
    layers: Vec<LayerSlot>,
}

impl LayerHost for LayerManager {
    fn layers(&self) -> &[LayerSlot] {
        &self.layers
    }

    fn add_layer(&mut self, layer: VisualId, z_index: i32, kind: LayerKind) -> Option<VisualId> {
        let pos = self
            .layers
            .iter()
            .position(|slot| slot.z_index > z_index)
            .unwrap_or(self.layers.len());
        self.layers.insert(
            pos,
            LayerSlot {
                visual: layer,
                z_index,
                kind,
            },
        );
        self.layers.get(pos + 1).map(|slot| slot.visual)
    }

    fn remove_layer(&mut self, layer: VisualId) -> bool {
        let before = self.layers.len();
        self.layers.retain(|slot| slot.visual != layer);
        self.layers.len() != before
    }
}
