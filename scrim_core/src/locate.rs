// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay surface resolution.
//!
//! [`LayerLocator::locate`] answers "which overlay surface should an adorner
//! for this target live on?" by walking the requester's ancestor chain:
//!
//! 1. Scroll presenters, innermost first (the requester itself included),
//!    that contain the target. The first one that already carries a surface,
//!    or accepts an injected one, wins.
//! 2. The nearest layer manager.
//! 3. The root of the tree, whatever its shape.
//!
//! Surfaces are cached per host. A cache hit is only trusted while the
//! surface still hangs beneath its host; a host that rebuilt its content
//! evicts the entry and the next lookup injects again.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::config::EngineConfig;
use crate::inject::inject;
use crate::surface::{OverlaySurface, SurfaceKey};
use crate::trace::{InjectionSkippedEvent, SurfaceResolvedEvent, Tracer};
use crate::visual::{VisualId, VisualRole, VisualTree};

/// Host shapes the injector knows how to restructure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostKind {
    /// Any other container; the surface becomes its last child.
    Generic,
    /// A scroll presenter showing a single content child.
    ScrollableSingleChild,
    /// A scroll presenter whose content comes from a template.
    ScrollableTemplated,
    /// A z-ordered layer stack.
    LayerManager,
}

impl HostKind {
    /// Returns whether hosts of this kind scroll their content.
    #[must_use]
    pub const fn is_scrollable(self) -> bool {
        matches!(self, Self::ScrollableSingleChild | Self::ScrollableTemplated)
    }
}

/// Classifies `host` by its role. Pure.
#[must_use]
pub fn classify(tree: &VisualTree, host: VisualId) -> HostKind {
    match tree.role(host) {
        VisualRole::ScrollPresenter(state) if state.is_templated() => {
            HostKind::ScrollableTemplated
        }
        VisualRole::ScrollPresenter(_) => HostKind::ScrollableSingleChild,
        VisualRole::LayerManager(_) => HostKind::LayerManager,
        _ => HostKind::Generic,
    }
}

/// Resolves and caches overlay surfaces per host.
#[derive(Debug, Default)]
pub struct LayerLocator {
    surfaces: BTreeMap<SurfaceKey, OverlaySurface>,
    by_host: BTreeMap<VisualId, SurfaceKey>,
    next_key: u32,
}

impl LayerLocator {
    /// Creates an empty locator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds or creates the surface that should carry adorners for `target`,
    /// searching upwards from `requester`.
    ///
    /// Returns `None` when `requester` is not in a live tree, or no
    /// candidate host accepted a surface.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn locate(
        &mut self,
        tree: &mut VisualTree,
        requester: VisualId,
        target: VisualId,
        config: &EngineConfig,
        tracer: &mut Tracer<'_>,
    ) -> Option<SurfaceKey> {
        assert!(tree.is_alive(target), "stale VisualId: {target:?}");
        let chain: Vec<VisualId> = core::iter::once(requester)
            .chain(tree.ancestors(requester))
            .collect();
        if !tree.is_live(requester) {
            return None;
        }

        let mut tried: Vec<VisualId> = Vec::new();
        let scroll_hosts = chain.iter().copied().filter(|&v| {
            tree.role(v).is_scroll_presenter() && (v == target || tree.is_ancestor_of(v, target))
        });
        for host in scroll_hosts.collect::<Vec<_>>() {
            tried.push(host);
            if let Some(key) = self.resolve_host(tree, requester, host, config, tracer) {
                return Some(key);
            }
        }

        let layer_manager = chain
            .iter()
            .copied()
            .find(|&v| tree.role(v).is_layer_manager());
        let root = chain.last().copied();
        for host in [layer_manager, root].into_iter().flatten() {
            if tried.contains(&host) {
                continue;
            }
            tried.push(host);
            if let Some(key) = self.resolve_host(tree, requester, host, config, tracer) {
                return Some(key);
            }
        }
        None
    }

    /// Returns the cached surface for `host` if it is still mounted.
    #[must_use]
    pub fn cached(&self, tree: &VisualTree, host: VisualId) -> Option<SurfaceKey> {
        let key = *self.by_host.get(&host)?;
        self.surfaces
            .get(&key)
            .is_some_and(|s| s.is_mounted(tree))
            .then_some(key)
    }

    /// Returns a surface by key.
    #[must_use]
    pub fn surface(&self, key: SurfaceKey) -> Option<&OverlaySurface> {
        self.surfaces.get(&key)
    }

    /// Returns a surface by key, mutably.
    pub fn surface_mut(&mut self, key: SurfaceKey) -> Option<&mut OverlaySurface> {
        self.surfaces.get_mut(&key)
    }

    /// Iterates over every known surface in creation order.
    pub fn surfaces(&self) -> impl Iterator<Item = &OverlaySurface> {
        self.surfaces.values()
    }

    pub(crate) fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut OverlaySurface> {
        self.surfaces.values_mut()
    }

    /// Returns the number of known surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Returns whether no surface has been resolved yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Forgets surfaces whose host was destroyed, and empty surfaces that
    /// were evicted from the cache. Returns the number removed.
    pub fn prune(&mut self, tree: &VisualTree) -> usize {
        let by_host = &mut self.by_host;
        let before = self.surfaces.len();
        self.surfaces.retain(|key, surface| {
            if !tree.is_alive(surface.host()) {
                by_host.remove(&surface.host());
                return false;
            }
            let cached = by_host.get(&surface.host()) == Some(key);
            cached || !surface.is_empty()
        });
        before - self.surfaces.len()
    }

    fn resolve_host(
        &mut self,
        tree: &mut VisualTree,
        requester: VisualId,
        host: VisualId,
        config: &EngineConfig,
        tracer: &mut Tracer<'_>,
    ) -> Option<SurfaceKey> {
        let kind = classify(tree, host);
        if let Some(key) = self.cached(tree, host) {
            tracer.surface_resolved(&SurfaceResolvedEvent {
                requester,
                host,
                kind,
                injected: false,
            });
            return Some(key);
        }
        // Evict: the host dropped the surface when it rebuilt its content.
        self.by_host.remove(&host);

        match inject(tree, host, kind, config) {
            Ok(visual) => {
                let key = SurfaceKey(self.next_key);
                self.next_key += 1;
                self.surfaces
                    .insert(key, OverlaySurface::new(key, host, visual, kind));
                self.by_host.insert(host, key);
                tracer.surface_resolved(&SurfaceResolvedEvent {
                    requester,
                    host,
                    kind,
                    injected: true,
                });
                Some(key)
            }
            Err(reason) => {
                tracer.injection_skipped(&InjectionSkippedEvent { host, kind, reason });
                None
            }
        }
    }
}
