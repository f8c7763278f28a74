// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay surface injection.
//!
//! [`inject`] places a fresh overlay canvas into a host so that it renders
//! above the host's content and shares its coordinate space:
//!
//! | Host shape                 | Strategy                                          |
//! |----------------------------|---------------------------------------------------|
//! | [`HostKind::LayerManager`] | register as an overlay layer below top-level ones |
//! | [`HostKind::ScrollableSingleChild`] | wrap the content in a panel `[content, surface]` |
//! | [`HostKind::ScrollableTemplated`]   | wrap the template so every realization carries the surface |
//! | [`HostKind::Generic`]      | append the surface as the last child              |
//!
//! Restructuring a scroll presenter detaches its content, which resets the
//! scroll offset. The offset is snapshotted first and restored afterwards so
//! the user's scroll position survives.
//!
//! Injection is idempotent per host: if the expected position already holds
//! an overlay canvas, that canvas is returned instead of a second one.

use alloc::boxed::Box;
use core::fmt;

use kurbo::{Point, Rect, Size, Vec2};

use crate::config::EngineConfig;
use crate::locate::HostKind;
use crate::visual::{ContentTemplate, LayerHost, LayerKind, VisualId, VisualRole, VisualTree};

/// Why a host could not take an overlay surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectError {
    /// The host has a shape the injector cannot restructure, such as a scroll
    /// presenter with neither content nor template.
    UnsupportedHostShape(HostKind),
}

impl fmt::Display for InjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedHostShape(kind) => {
                write!(f, "cannot inject an overlay surface into a {kind:?} host")
            }
        }
    }
}

impl core::error::Error for InjectError {}

/// Injects an overlay surface into `host` and returns the canvas visual.
///
/// `kind` must be the host's current [`classify`](crate::locate::classify)
/// result.
///
/// # Errors
///
/// Returns [`InjectError::UnsupportedHostShape`] when the host cannot be
/// restructured. The tree is left untouched in that case.
pub fn inject(
    tree: &mut VisualTree,
    host: VisualId,
    kind: HostKind,
    config: &EngineConfig,
) -> Result<VisualId, InjectError> {
    if let Some(existing) = find_existing(tree, host, kind) {
        return Ok(existing);
    }
    match kind {
        HostKind::Generic => Ok(inject_generic(tree, host)),
        HostKind::LayerManager => inject_layer(tree, host, config),
        HostKind::ScrollableSingleChild => inject_single_child(tree, host, config),
        HostKind::ScrollableTemplated => inject_templated(tree, host, config),
    }
}

/// Looks for an overlay canvas already sitting where `kind` would put one.
#[must_use]
pub fn find_existing(tree: &VisualTree, host: VisualId, kind: HostKind) -> Option<VisualId> {
    let parent = match kind {
        HostKind::Generic | HostKind::LayerManager => host,
        HostKind::ScrollableSingleChild | HostKind::ScrollableTemplated => tree.content(host)?,
    };
    tree.children(parent)
        .find(|&c| matches!(tree.role(c), VisualRole::OverlaySurface))
}

fn inject_generic(tree: &mut VisualTree, host: VisualId) -> VisualId {
    let surface = tree.create_visual(VisualRole::OverlaySurface);
    tree.add_child(host, surface);
    let size = tree.size(host);
    fill(tree, surface, size);
    surface
}

fn inject_layer(
    tree: &mut VisualTree,
    host: VisualId,
    config: &EngineConfig,
) -> Result<VisualId, InjectError> {
    let Some(mgr) = tree.layer_host(host) else {
        return Err(InjectError::UnsupportedHostShape(HostKind::LayerManager));
    };
    let z = overlay_z(mgr, config.overlay_z_index);
    let surface = tree.create_visual(VisualRole::OverlaySurface);
    tree.add_layer(host, surface, z, LayerKind::Overlay);
    let size = tree.size(host);
    fill(tree, surface, size);
    Ok(surface)
}

/// Picks a z-index at or above every content layer and strictly below every
/// top-level layer. Below-top-level wins when both cannot hold.
fn overlay_z(mgr: &dyn LayerHost, requested: i32) -> i32 {
    let mut z = requested;
    if let Some(content) = mgr.highest_content_z() {
        z = z.max(content);
    }
    if let Some(top) = mgr.lowest_top_level_z() {
        z = z.min(top.saturating_sub(1));
    }
    z
}

fn inject_single_child(
    tree: &mut VisualTree,
    host: VisualId,
    config: &EngineConfig,
) -> Result<VisualId, InjectError> {
    let Some(content) = tree.content(host) else {
        return Err(InjectError::UnsupportedHostShape(
            HostKind::ScrollableSingleChild,
        ));
    };
    let offset = tree.scroll_offset(host).unwrap_or(Vec2::ZERO);

    tree.set_content(host, None);
    let panel = tree.create_visual(VisualRole::Panel);
    let extent = extent_of(tree.bounds(content));
    tree.add_child(panel, content);
    let surface = tree.create_visual(VisualRole::OverlaySurface);
    tree.add_child(panel, surface);
    fill(tree, panel, extent);
    fill(tree, surface, extent);
    tree.set_content(host, Some(panel));

    if config.restore_scroll_offset {
        tree.set_scroll_offset(host, offset);
    }
    Ok(surface)
}

fn inject_templated(
    tree: &mut VisualTree,
    host: VisualId,
    config: &EngineConfig,
) -> Result<VisualId, InjectError> {
    let Some(inner) = tree.take_content_template(host) else {
        return Err(InjectError::UnsupportedHostShape(
            HostKind::ScrollableTemplated,
        ));
    };
    let offset = tree.scroll_offset(host).unwrap_or(Vec2::ZERO);

    let surface = tree.create_visual(VisualRole::OverlaySurface);
    tree.put_content_template(host, Box::new(OverlayTemplate { inner, surface }));
    let _ = tree.realize_content(host);

    if config.restore_scroll_offset {
        tree.set_scroll_offset(host, offset);
    }
    Ok(surface)
}

/// A content template that stacks one shared overlay canvas over whatever
/// the wrapped template produces.
///
/// The canvas moves into each new realization, so re-templating the
/// presenter keeps the surface (and the adorners on it).
#[derive(Debug)]
pub struct OverlayTemplate {
    inner: Box<dyn ContentTemplate>,
    surface: VisualId,
}

impl OverlayTemplate {
    /// Returns the shared overlay canvas.
    #[must_use]
    pub fn surface(&self) -> VisualId {
        self.surface
    }
}

impl ContentTemplate for OverlayTemplate {
    fn build(&mut self, tree: &mut VisualTree, item: u64) -> VisualId {
        let built = self.inner.build(tree, item);
        let panel = tree.create_visual(VisualRole::Panel);
        let extent = extent_of(tree.bounds(built));
        tree.add_child(panel, built);
        fill(tree, panel, extent);
        if tree.is_alive(self.surface) {
            tree.reparent(self.surface, panel);
            fill(tree, self.surface, extent);
        }
        panel
    }
}

/// Size needed to cover `bounds` from the origin.
fn extent_of(bounds: Rect) -> Size {
    Size::new(bounds.x1.max(0.0), bounds.y1.max(0.0))
}

fn fill(tree: &mut VisualTree, id: VisualId, size: Size) {
    tree.set_bounds(id, Rect::from_origin_size(Point::ZERO, size));
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::locate::classify;

    #[derive(Debug)]
    struct RowTemplate;

    impl ContentTemplate for RowTemplate {
        fn build(&mut self, tree: &mut VisualTree, item: u64) -> VisualId {
            let row = tree.create_visual(VisualRole::Panel);
            let height = 100.0 + 100.0 * f64::from(u8::try_from(item).unwrap_or(0));
            tree.set_bounds(row, Rect::new(0.0, 0.0, 200.0, height));
            row
        }
    }

    fn kinds(tree: &VisualTree, id: VisualId) -> Vec<bool> {
        tree.children(id)
            .map(|c| matches!(tree.role(c), VisualRole::OverlaySurface))
            .collect()
    }

    #[test]
    fn generic_host_gets_surface_last() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        tree.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 200.0));
        let child = tree.create_visual(VisualRole::Element);
        tree.add_child(root, child);

        let cfg = EngineConfig::default();
        let surface = inject(&mut tree, root, classify(&tree, root), &cfg).unwrap();
        assert_eq!(kinds(&tree, root), [false, true]);
        assert_eq!(tree.size(surface), Size::new(300.0, 200.0));
    }

    #[test]
    fn second_injection_reuses_canvas() {
        let mut tree = VisualTree::new();
        let root = tree.create_root(VisualRole::Panel);
        let cfg = EngineConfig::default();
        let a = inject(&mut tree, root, HostKind::Generic, &cfg).unwrap();
        let b = inject(&mut tree, root, HostKind::Generic, &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(tree.children(root).count(), 1);
    }

    #[test]
    fn layer_surface_sits_between_content_and_top_level() {
        let mut tree = VisualTree::new();
        let mgr = tree.create_root(VisualRole::layer_manager());
        let content = tree.create_visual(VisualRole::Panel);
        let modal = tree.create_visual(VisualRole::Panel);
        tree.add_layer(mgr, content, 0, LayerKind::Content);
        tree.add_layer(mgr, modal, 100, LayerKind::TopLevel);

        let cfg = EngineConfig::default();
        let surface = inject(&mut tree, mgr, classify(&tree, mgr), &cfg).unwrap();
        let order: Vec<_> = tree.children(mgr).collect();
        assert_eq!(order, [content, surface, modal]);

        let slot = tree
            .layer_host(mgr)
            .unwrap()
            .layers()
            .iter()
            .find(|s| s.visual == surface)
            .copied()
            .unwrap();
        assert_eq!(slot.z_index, 99);
        assert_eq!(slot.kind, LayerKind::Overlay);
    }

    #[test]
    fn layer_surface_uses_configured_z_without_top_level() {
        let mut tree = VisualTree::new();
        let mgr = tree.create_root(VisualRole::layer_manager());
        let cfg = EngineConfig::default();
        let surface = inject(&mut tree, mgr, HostKind::LayerManager, &cfg).unwrap();
        let z = tree.layer_host(mgr).unwrap().layers()[0].z_index;
        assert_eq!(tree.children(mgr).next(), Some(surface));
        assert_eq!(z, crate::config::OVERLAY_Z_INDEX);
    }

    #[test]
    fn single_child_is_wrapped_and_offset_restored() {
        let mut tree = VisualTree::new();
        let presenter = tree.create_root(VisualRole::scroll_presenter());
        let content = tree.create_visual(VisualRole::Panel);
        tree.set_bounds(content, Rect::new(0.0, 0.0, 400.0, 2000.0));
        tree.set_content(presenter, Some(content));
        tree.set_scroll_offset(presenter, Vec2::new(0.0, 700.0));

        let cfg = EngineConfig::default();
        let kind = classify(&tree, presenter);
        assert_eq!(kind, HostKind::ScrollableSingleChild);
        let surface = inject(&mut tree, presenter, kind, &cfg).unwrap();

        let panel = tree.content(presenter).unwrap();
        assert_ne!(panel, content);
        let order: Vec<_> = tree.children(panel).collect();
        assert_eq!(order, [content, surface]);
        assert_eq!(tree.scroll_offset(presenter), Some(Vec2::new(0.0, 700.0)));
        assert_eq!(tree.size(surface), Size::new(400.0, 2000.0));
    }

    #[test]
    fn offset_restore_can_be_disabled() {
        let mut tree = VisualTree::new();
        let presenter = tree.create_root(VisualRole::scroll_presenter());
        let content = tree.create_visual(VisualRole::Panel);
        tree.set_content(presenter, Some(content));
        tree.set_scroll_offset(presenter, Vec2::new(0.0, 50.0));

        let cfg = EngineConfig {
            restore_scroll_offset: false,
            ..EngineConfig::default()
        };
        inject(&mut tree, presenter, HostKind::ScrollableSingleChild, &cfg).unwrap();
        assert_eq!(tree.scroll_offset(presenter), Some(Vec2::ZERO));
    }

    #[test]
    fn empty_presenter_is_unsupported() {
        let mut tree = VisualTree::new();
        let presenter = tree.create_root(VisualRole::scroll_presenter());
        let cfg = EngineConfig::default();
        let kind = classify(&tree, presenter);
        assert_eq!(
            inject(&mut tree, presenter, kind, &cfg),
            Err(InjectError::UnsupportedHostShape(
                HostKind::ScrollableSingleChild
            ))
        );
        assert_eq!(tree.children(presenter).count(), 0);
    }

    #[test]
    fn templated_presenter_keeps_surface_across_items() {
        let mut tree = VisualTree::new();
        let presenter = tree.create_root(VisualRole::scroll_presenter());
        tree.set_content_template(presenter, Box::new(RowTemplate), 0);
        tree.set_scroll_offset(presenter, Vec2::new(0.0, 30.0));

        let cfg = EngineConfig::default();
        let kind = classify(&tree, presenter);
        assert_eq!(kind, HostKind::ScrollableTemplated);
        let surface = inject(&mut tree, presenter, kind, &cfg).unwrap();

        let panel = tree.content(presenter).unwrap();
        assert_eq!(kinds(&tree, panel), [false, true]);
        assert_eq!(tree.scroll_offset(presenter), Some(Vec2::new(0.0, 30.0)));

        tree.set_content_item(presenter, 2);
        let panel = tree.content(presenter).unwrap();
        assert_eq!(tree.parent(surface), Some(panel));
        assert_eq!(tree.size(surface), Size::new(200.0, 300.0));
        assert_eq!(
            find_existing(&tree, presenter, HostKind::ScrollableTemplated),
            Some(surface)
        );
    }

    #[test]
    fn error_displays_host_kind() {
        let err = InjectError::UnsupportedHostShape(HostKind::ScrollableTemplated);
        assert_eq!(
            alloc::format!("{err}"),
            "cannot inject an overlay surface into a ScrollableTemplated host"
        );
    }
}
