// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adorner bindings and the engine that drives them.
//!
//! Each adorned target carries at most one [`AdornerBinding`]. A binding is a
//! small state machine:
//!
//! ```text
//!   Unbound ──target live──▶ Attached ──target detached──▶ Detached
//!                               ▲                              │
//!                               └──────target re-attached──────┘
//! ```
//!
//! Replacing or clearing the adorner, or destroying the target, disposes the
//! binding from any state. Disposal always releases the bounds subscription
//! and removes the adorner from its surface.
//!
//! [`AdornerEngine::layout`] is the per-frame entry point. It drains the
//! tree's pending changes, applies lifecycle transitions, refreshes bounds,
//! and lays out every surface that needs it.

use alloc::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::locate::LayerLocator;
use crate::surface::{OverlaySurface, SurfaceKey};
use crate::trace::{BindingDisposedEvent, BindingTransitionEvent, LayoutPassEvent, Tracer};
use crate::visual::{LifecycleEvent, VisualId, VisualTree};

/// Where a binding is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Set, but the target has not been in a live tree yet.
    Unbound,
    /// The adorner is on a surface and tracking its target.
    Attached,
    /// The target left the live tree; the adorner is off every surface.
    Detached,
}

/// The association between one target and its adorner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdornerBinding {
    /// The adorned visual.
    pub target: VisualId,
    /// The visual rendered over it.
    pub adorner: VisualId,
    /// Current lifecycle state.
    pub state: BindingState,
    /// The surface holding the adorner while attached.
    pub surface: Option<SurfaceKey>,
}

/// Binds adorners to targets and keeps them positioned.
#[derive(Debug, Default)]
pub struct AdornerEngine {
    config: EngineConfig,
    bindings: BTreeMap<VisualId, AdornerBinding>,
    locator: LayerLocator,
    pass_index: u64,
}

impl AdornerEngine {
    /// Creates an engine with no bindings.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            bindings: BTreeMap::new(),
            locator: LayerLocator::new(),
            pass_index: 0,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the surface locator.
    #[must_use]
    pub fn locator(&self) -> &LayerLocator {
        &self.locator
    }

    /// Sets or clears the adorner of `target`.
    ///
    /// Setting the adorner a target already has is a no-op. Setting a
    /// different one disposes the previous binding first. An adorner moves
    /// off any other target it was bound to. If the target is already live,
    /// the adorner attaches immediately.
    ///
    /// # Panics
    ///
    /// Panics if `target` or `adorner` is stale.
    pub fn set_adorner(
        &mut self,
        tree: &mut VisualTree,
        target: VisualId,
        adorner: Option<VisualId>,
        tracer: &mut Tracer<'_>,
    ) {
        assert!(tree.is_alive(target), "stale VisualId: {target:?}");
        let Some(adorner) = adorner else {
            let _ = self.clear_adorner(tree, target, tracer);
            return;
        };
        assert!(tree.is_alive(adorner), "stale VisualId: {adorner:?}");

        if self.adorner(target) == Some(adorner) {
            return;
        }
        let _ = self.clear_adorner(tree, target, tracer);
        if let Some(previous) = self.target_of(adorner) {
            let _ = self.clear_adorner(tree, previous, tracer);
        }

        let binding = self.bindings.entry(target).or_insert(AdornerBinding {
            target,
            adorner,
            state: BindingState::Unbound,
            surface: None,
        });
        if tree.is_live(target) {
            attach(&mut self.locator, &self.config, binding, tree, tracer);
        }
    }

    /// Disposes the binding of `target` and returns its adorner.
    pub fn clear_adorner(
        &mut self,
        tree: &mut VisualTree,
        target: VisualId,
        tracer: &mut Tracer<'_>,
    ) -> Option<VisualId> {
        let mut binding = self.bindings.remove(&target)?;
        release(&mut self.locator, &mut binding, tree);
        tracer.binding_disposed(&BindingDisposedEvent {
            target,
            adorner: binding.adorner,
        });
        Some(binding.adorner)
    }

    /// Returns the adorner bound to `target`.
    #[must_use]
    pub fn adorner(&self, target: VisualId) -> Option<VisualId> {
        self.bindings.get(&target).map(|b| b.adorner)
    }

    /// Returns the target `adorner` is bound to.
    #[must_use]
    pub fn target_of(&self, adorner: VisualId) -> Option<VisualId> {
        self.bindings
            .values()
            .find(|b| b.adorner == adorner)
            .map(|b| b.target)
    }

    /// Returns the binding of `target`.
    #[must_use]
    pub fn binding(&self, target: VisualId) -> Option<&AdornerBinding> {
        self.bindings.get(&target)
    }

    /// Iterates over all bindings, ordered by target.
    pub fn bindings(&self) -> impl Iterator<Item = &AdornerBinding> {
        self.bindings.values()
    }

    /// Returns the surface currently holding `target`'s adorner.
    ///
    /// # Panics
    ///
    /// Panics if `target` is stale.
    #[must_use]
    pub fn surface_of(&self, tree: &VisualTree, target: VisualId) -> Option<&OverlaySurface> {
        assert!(tree.is_alive(target), "stale VisualId: {target:?}");
        let key = self.bindings.get(&target)?.surface?;
        self.locator.surface(key)
    }

    /// Returns a surface by key.
    #[must_use]
    pub fn surface(&self, key: SurfaceKey) -> Option<&OverlaySurface> {
        self.locator.surface(key)
    }

    /// Resolves the surface an adorner for `visual` would use, injecting one
    /// if needed.
    ///
    /// Returns `None` if the visual is not in a live tree.
    pub fn resolve_surface(
        &mut self,
        tree: &mut VisualTree,
        visual: VisualId,
        tracer: &mut Tracer<'_>,
    ) -> Option<SurfaceKey> {
        self.locator
            .locate(tree, visual, visual, &self.config, tracer)
    }

    /// Runs one layout pass and returns its summary.
    ///
    /// The pass:
    ///
    /// 1. Evaluates the tree and applies attach/detach transitions in event
    ///    order. A detach for a target that is live again by the end of the
    ///    batch is ignored.
    /// 2. Disposes bindings whose target or adorner was destroyed.
    /// 3. Prunes surfaces that are gone or unused.
    /// 4. Polls every bounds tracker and lays out surfaces that changed.
    pub fn layout(&mut self, tree: &mut VisualTree, tracer: &mut Tracer<'_>) -> LayoutPassEvent {
        self.pass_index += 1;
        let mut summary = LayoutPassEvent {
            pass_index: self.pass_index,
            ..LayoutPassEvent::default()
        };
        let changes = tree.evaluate();

        for event in &changes.lifecycle {
            let visual = event.visual();
            let Some(binding) = self.bindings.get_mut(&visual) else {
                continue;
            };
            match event {
                LifecycleEvent::Attached(_) => {
                    if tree.is_live(visual)
                        && attach(&mut self.locator, &self.config, binding, tree, tracer)
                    {
                        summary.attached += 1;
                    }
                }
                LifecycleEvent::Detached(_) => {
                    if !tree.is_live(visual) && detach(&mut self.locator, binding, tree, tracer) {
                        summary.detached += 1;
                    }
                }
            }
        }

        for &gone in &changes.destroyed {
            let target = if self.bindings.contains_key(&gone) {
                Some(gone)
            } else {
                self.target_of(gone)
            };
            if let Some(target) = target {
                let _ = self.clear_adorner(tree, target, tracer);
                summary.disposed += 1;
            }
        }

        let _ = self.locator.prune(tree);

        let epsilon = self.config.bounds_epsilon;
        for surface in self.locator.surfaces_mut() {
            summary.bounds_published += surface.update_bounds(tree, epsilon, tracer);
            if surface.layout(tree) {
                summary.surfaces_arranged += 1;
            }
        }

        tracer.layout_pass(&summary);
        summary
    }
}

/// Resolves a surface for the binding's target and moves the adorner onto it.
///
/// Returns whether the binding transitioned into [`BindingState::Attached`].
fn attach(
    locator: &mut LayerLocator,
    config: &EngineConfig,
    binding: &mut AdornerBinding,
    tree: &mut VisualTree,
    tracer: &mut Tracer<'_>,
) -> bool {
    // A destroyed adorner is disposed later in the same pass.
    if !tree.is_alive(binding.adorner) {
        return false;
    }
    let Some(key) = locator.locate(tree, binding.target, binding.target, config, tracer) else {
        return false;
    };
    let current = binding
        .surface
        .and_then(|k| locator.surface(k))
        .is_some_and(|s| s.key() == key && s.contains(binding.adorner));
    if !current {
        if let Some(old) = binding.surface.and_then(|k| locator.surface_mut(k)) {
            old.remove_adorner(tree, binding.adorner);
        }
        if let Some(surface) = locator.surface_mut(key) {
            surface.add_adorner(tree, binding.adorner, binding.target);
        }
        binding.surface = Some(key);
    }
    transition(binding, BindingState::Attached, tracer)
}

/// Takes the adorner off its surface. Returns whether the binding was
/// attached.
fn detach(
    locator: &mut LayerLocator,
    binding: &mut AdornerBinding,
    tree: &mut VisualTree,
    tracer: &mut Tracer<'_>,
) -> bool {
    if binding.state != BindingState::Attached {
        return false;
    }
    release(locator, binding, tree);
    transition(binding, BindingState::Detached, tracer)
}

fn release(locator: &mut LayerLocator, binding: &mut AdornerBinding, tree: &mut VisualTree) {
    if let Some(surface) = binding.surface.take().and_then(|k| locator.surface_mut(k)) {
        surface.remove_adorner(tree, binding.adorner);
    }
}

fn transition(binding: &mut AdornerBinding, to: BindingState, tracer: &mut Tracer<'_>) -> bool {
    let from = binding.state;
    if from == to {
        return false;
    }
    binding.state = to;
    tracer.binding_transition(&BindingTransitionEvent {
        target: binding.target,
        adorner: binding.adorner,
        from,
        to,
    });
    true
}
