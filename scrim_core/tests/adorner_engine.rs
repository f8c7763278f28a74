// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end behavior of the adorner engine over a visual tree.

use kurbo::{Rect, Size, Vec2};
use scrim_core::trace::Tracer;
use scrim_core::visual::{ContentTemplate, LayerHost, LayerKind, VisualId, VisualRole, VisualTree};
use scrim_core::{AdornerEngine, BindingState, EngineConfig, HostKind};

fn assert_close(a: Option<Rect>, b: Option<Rect>) {
    let (a, b) = (a.expect("rect a"), b.expect("rect b"));
    for (x, y) in [(a.x0, b.x0), (a.y0, b.y0), (a.x1, b.x1), (a.y1, b.y1)] {
        assert!((x - y).abs() <= 1.0, "{a:?} vs {b:?}");
    }
}

fn element(tree: &mut VisualTree, parent: VisualId, bounds: Rect) -> VisualId {
    let id = tree.create_visual(VisualRole::Element);
    tree.add_child(parent, id);
    tree.set_bounds(id, bounds);
    id
}

/// A 400x500 viewport scrolling a 2000px tall column.
struct ScrollFixture {
    tree: VisualTree,
    presenter: VisualId,
    target: VisualId,
}

fn scroll_fixture(offset: f64) -> ScrollFixture {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 400.0, 500.0));
    let presenter = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(root, presenter);
    tree.set_bounds(presenter, Rect::new(0.0, 0.0, 400.0, 500.0));
    let content = tree.create_visual(VisualRole::Panel);
    tree.set_bounds(content, Rect::new(0.0, 0.0, 400.0, 2000.0));
    tree.set_content(presenter, Some(content));
    let target = element(&mut tree, content, Rect::new(0.0, 1200.0, 100.0, 1240.0));
    tree.set_scroll_offset(presenter, Vec2::new(0.0, offset));
    ScrollFixture {
        tree,
        presenter,
        target,
    }
}

#[test]
fn scroll_host_places_adorner_in_viewport() {
    let ScrollFixture {
        mut tree,
        presenter,
        target,
    } = scroll_fixture(700.0);
    let adorner = tree.create_visual(VisualRole::Element);
    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    let surface = engine.surface_of(&tree, target).expect("attached");
    assert_eq!(surface.host(), presenter);
    assert_eq!(surface.kind(), HostKind::ScrollableSingleChild);
    assert_eq!(tree.scroll_offset(presenter), Some(Vec2::new(0.0, 700.0)));

    let rendered = tree.rendered_rect(adorner, presenter).expect("visible");
    assert_eq!(rendered, Rect::new(0.0, 500.0, 100.0, 540.0));
    let clip = tree.clip(adorner).expect("clipped");
    assert_eq!(clip.size(), Size::new(100.0, 40.0));
    assert_eq!(clip.area(), 4000.0);
}

#[test]
fn adorner_rect_matches_target_rect() {
    let ScrollFixture {
        mut tree,
        presenter,
        target,
    } = scroll_fixture(250.0);
    let adorner = tree.create_visual(VisualRole::Element);
    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    assert_close(
        tree.rendered_rect(adorner, presenter),
        tree.rendered_rect(target, presenter),
    );
}

#[test]
fn scrolling_moves_adorner_with_content() {
    let ScrollFixture {
        mut tree,
        presenter,
        target,
    } = scroll_fixture(700.0);
    let adorner = tree.create_visual(VisualRole::Element);
    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);
    let before = tree.rendered_rect(adorner, presenter).expect("visible");
    let surface_before = engine
        .surface_of(&tree, target)
        .and_then(|s| s.bounds_of(adorner))
        .expect("bounds");

    let (dx, dy) = (0.0, 150.0);
    tree.set_scroll_offset(presenter, Vec2::new(dx, 700.0 + dy));
    let _ = engine.layout(&mut tree, &mut tracer);

    let after = tree.rendered_rect(adorner, presenter).expect("visible");
    assert_eq!(after.origin() - before.origin(), Vec2::new(-dx, -dy));
    assert_close(Some(after), tree.rendered_rect(target, presenter));
    // Surface space is content space; scrolling does not republish.
    let surface_after = engine
        .surface_of(&tree, target)
        .and_then(|s| s.bounds_of(adorner))
        .expect("bounds");
    assert_eq!(surface_before, surface_after);
}

#[test]
fn generic_host_bounds_are_identical() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 200.0));
    let target = element(&mut tree, root, Rect::new(50.0, 50.0, 70.0, 70.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    let surface = engine.surface_of(&tree, target).expect("attached");
    assert_eq!(surface.kind(), HostKind::Generic);
    assert_eq!(tree.bounds(surface.visual()).origin().to_vec2(), Vec2::ZERO);
    let tb = surface.bounds_of(adorner).expect("bounds");
    assert_eq!(tb.surface_rect(), Rect::new(50.0, 50.0, 70.0, 70.0));
    assert_eq!(
        tree.rendered_rect(adorner, root),
        Some(Rect::new(50.0, 50.0, 70.0, 70.0))
    );
}

#[test]
fn layer_manager_overlay_sits_below_modal() {
    let mut tree = VisualTree::new();
    let window = tree.create_root(VisualRole::layer_manager());
    tree.set_bounds(window, Rect::new(0.0, 0.0, 800.0, 600.0));
    let content = tree.create_visual(VisualRole::Panel);
    tree.add_layer(window, content, 0, LayerKind::Content);
    tree.set_bounds(content, Rect::new(0.0, 0.0, 800.0, 600.0));
    let modal = tree.create_visual(VisualRole::Panel);
    tree.add_layer(window, modal, 2, LayerKind::TopLevel);
    let target = element(&mut tree, content, Rect::new(10.0, 10.0, 110.0, 30.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    let surface = engine.surface_of(&tree, target).expect("attached").visual();
    let layers = tree.layer_host(window).expect("layer manager").layers();
    let z = |v| {
        layers
            .iter()
            .find(|s| s.visual == v)
            .map(|s| s.z_index)
            .expect("registered")
    };
    assert!(z(surface) < z(modal));
    assert!(z(surface) >= z(content));
    let order: Vec<_> = tree.children(window).collect();
    assert_eq!(order, [content, surface, modal]);
    assert_close(
        tree.rendered_rect(adorner, window),
        tree.rendered_rect(target, window),
    );
}

#[test]
fn resolving_twice_returns_same_surface() {
    let ScrollFixture {
        mut tree,
        presenter,
        target,
    } = scroll_fixture(0.0);
    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();

    let a = engine.resolve_surface(&mut tree, target, &mut tracer);
    let b = engine.resolve_surface(&mut tree, target, &mut tracer);
    assert!(a.is_some());
    assert_eq!(a, b);
    assert_eq!(engine.locator().len(), 1);
    let panel = tree.content(presenter).expect("content");
    let surfaces = tree
        .children(panel)
        .filter(|&c| matches!(tree.role(c), VisualRole::OverlaySurface))
        .count();
    assert_eq!(surfaces, 1);
}

#[test]
fn reattach_restores_position() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 200.0));
    let column = element(&mut tree, root, Rect::new(20.0, 0.0, 120.0, 200.0));
    let target = element(&mut tree, column, Rect::new(0.0, 40.0, 100.0, 60.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);
    let before = tree.rendered_rect(adorner, root);
    assert!(before.is_some());

    tree.remove_from_parent(target);
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.detached, 1);
    assert_eq!(
        engine.binding(target).map(|b| b.state),
        Some(BindingState::Detached)
    );
    assert_eq!(tree.rendered_rect(adorner, root), None);

    tree.add_child(column, target);
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.attached, 1);
    assert_eq!(tree.rendered_rect(adorner, root), before);
}

#[test]
fn detach_cycles_leave_no_subscriptions() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
    let target = element(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);
    assert_eq!(tree.feed().live_subscriptions(target), 1);

    for _ in 0..5 {
        tree.remove_from_parent(target);
        let _ = engine.layout(&mut tree, &mut tracer);
        tree.add_child(root, target);
        let _ = engine.layout(&mut tree, &mut tracer);
        assert_eq!(tree.feed().live_subscriptions(target), 1);
    }
    tree.remove_from_parent(target);
    let _ = engine.layout(&mut tree, &mut tracer);
    assert_eq!(tree.feed().live_subscriptions(target), 0);
    assert!(tree.feed().is_empty());
}

#[test]
fn unsupported_host_falls_back_outward() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 200.0, 200.0));
    // An empty presenter adorned directly: nothing to wrap inside it.
    let presenter = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(root, presenter);
    tree.set_bounds(presenter, Rect::new(10.0, 10.0, 60.0, 60.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, presenter, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    let surface = engine.surface_of(&tree, presenter).expect("attached");
    assert_eq!(surface.host(), root);
    assert_eq!(tree.children(presenter).count(), 0);
    assert_eq!(
        tree.rendered_rect(adorner, root),
        Some(Rect::new(10.0, 10.0, 60.0, 60.0))
    );
}

#[test]
fn target_moving_between_hosts_moves_adorner() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 400.0, 400.0));
    let presenter = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(root, presenter);
    tree.set_bounds(presenter, Rect::new(0.0, 200.0, 400.0, 400.0));
    let content = tree.create_visual(VisualRole::Panel);
    tree.set_bounds(content, Rect::new(0.0, 0.0, 400.0, 800.0));
    tree.set_content(presenter, Some(content));
    let target = element(&mut tree, root, Rect::new(5.0, 5.0, 25.0, 25.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);
    assert_eq!(engine.surface_of(&tree, target).map(|s| s.host()), Some(root));

    tree.reparent(target, content);
    let _ = engine.layout(&mut tree, &mut tracer);
    let surface = engine.surface_of(&tree, target).expect("attached");
    assert_eq!(surface.host(), presenter);
    assert!(surface.contains(adorner));
    assert_close(
        tree.rendered_rect(adorner, root),
        tree.rendered_rect(target, root),
    );
}

#[test]
fn resizing_target_republishes_bounds() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 300.0));
    let target = element(&mut tree, root, Rect::new(10.0, 10.0, 30.0, 30.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let first = engine.layout(&mut tree, &mut tracer);
    assert_eq!(first.bounds_published, 1);
    assert_eq!(first.surfaces_arranged, 1);

    let idle = engine.layout(&mut tree, &mut tracer);
    assert_eq!(idle.bounds_published, 0);
    assert_eq!(idle.surfaces_arranged, 0);

    tree.set_bounds(target, Rect::new(10.0, 10.0, 90.0, 50.0));
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.bounds_published, 1);
    assert_eq!(
        tree.rendered_rect(adorner, root),
        Some(Rect::new(10.0, 10.0, 90.0, 50.0))
    );
}

#[derive(Debug)]
struct CardTemplate;

impl ContentTemplate for CardTemplate {
    fn build(&mut self, tree: &mut VisualTree, _item: u64) -> VisualId {
        let card = tree.create_visual(VisualRole::Panel);
        tree.set_bounds(card, Rect::new(0.0, 0.0, 300.0, 900.0));
        card
    }
}

#[test]
fn templated_host_keeps_surface_across_realizations() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 300.0, 300.0));
    let presenter = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(root, presenter);
    tree.set_bounds(presenter, Rect::new(0.0, 0.0, 300.0, 300.0));
    tree.set_content_template(presenter, Box::new(CardTemplate), 0);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    let key = engine
        .resolve_surface(&mut tree, presenter, &mut tracer)
        .expect("surface");
    let surface = engine.surface(key).expect("known");
    assert_eq!(surface.kind(), HostKind::ScrollableTemplated);
    assert_eq!(surface.host(), presenter);

    tree.set_content_item(presenter, 1);
    let again = engine.resolve_surface(&mut tree, presenter, &mut tracer);
    assert_eq!(again, Some(key));
}

#[test]
fn destroying_adorner_disposes_binding() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
    let target = element(&mut tree, root, Rect::new(0.0, 0.0, 10.0, 10.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    tree.destroy_visual(adorner);
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.disposed, 1);
    assert_eq!(engine.binding(target), None);
    assert_eq!(tree.feed().live_subscriptions(target), 0);
}

#[test]
fn content_laid_out_after_injection_shows_adorner() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 400.0, 500.0));
    let presenter = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(root, presenter);
    tree.set_bounds(presenter, Rect::new(0.0, 0.0, 400.0, 500.0));
    let content = tree.create_visual(VisualRole::Panel);
    tree.set_content(presenter, Some(content));
    let target = tree.create_visual(VisualRole::Element);
    tree.add_child(content, target);

    let adorner = tree.create_visual(VisualRole::Element);
    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);
    assert_eq!(tree.rendered_rect(adorner, presenter), None);

    tree.set_bounds(content, Rect::new(0.0, 0.0, 400.0, 2000.0));
    tree.set_bounds(target, Rect::new(0.0, 100.0, 100.0, 140.0));
    tree.set_scroll_offset(presenter, Vec2::new(0.0, 50.0));
    for _ in 0..3 {
        let _ = engine.layout(&mut tree, &mut tracer);
    }

    assert_eq!(
        tree.rendered_rect(target, presenter),
        Some(Rect::new(0.0, 50.0, 100.0, 90.0))
    );
    assert_close(
        tree.rendered_rect(adorner, presenter),
        tree.rendered_rect(target, presenter),
    );
    let surface = engine.surface_of(&tree, target).expect("attached").visual();
    assert_eq!(tree.size(surface), Size::new(400.0, 2000.0));

    // Growing the content later grows the canvas with it.
    tree.set_bounds(content, Rect::new(0.0, 0.0, 400.0, 3000.0));
    let _ = engine.layout(&mut tree, &mut tracer);
    assert_eq!(tree.size(surface), Size::new(400.0, 3000.0));
}

#[test]
fn adorner_destroyed_while_target_detached_is_disposed() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
    let target = tree.create_visual(VisualRole::Element);
    tree.set_bounds(target, Rect::new(0.0, 0.0, 10.0, 10.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::default();
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    assert_eq!(engine.binding(target).map(|b| b.state), Some(BindingState::Unbound));

    tree.destroy_visual(adorner);
    tree.add_child(root, target);
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.attached, 0);
    assert_eq!(pass.disposed, 1);
    assert_eq!(engine.binding(target), None);
    assert_eq!(tree.feed().live_subscriptions(target), 0);
}

#[test]
#[should_panic(expected = "stale VisualId")]
fn stale_target_fails_fast() {
    let mut tree = VisualTree::new();
    let _root = tree.create_root(VisualRole::Panel);
    let target = tree.create_visual(VisualRole::Element);
    let adorner = tree.create_visual(VisualRole::Element);
    tree.destroy_visual(target);

    let mut engine = AdornerEngine::default();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut Tracer::none());
}

#[test]
fn coarse_config_ignores_subpixel_jitter() {
    let mut tree = VisualTree::new();
    let root = tree.create_root(VisualRole::Panel);
    tree.set_bounds(root, Rect::new(0.0, 0.0, 100.0, 100.0));
    let target = element(&mut tree, root, Rect::new(10.0, 10.0, 20.0, 20.0));
    let adorner = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::new(EngineConfig::coarse());
    let mut tracer = Tracer::none();
    engine.set_adorner(&mut tree, target, Some(adorner), &mut tracer);
    let _ = engine.layout(&mut tree, &mut tracer);

    tree.set_bounds(target, Rect::new(10.2, 10.0, 20.2, 20.0));
    let pass = engine.layout(&mut tree, &mut tracer);
    assert_eq!(pass.bounds_published, 0);
    assert_eq!(pass.surfaces_arranged, 0);
}

#[test]
fn layer_host_trait_reports_overlay() {
    let mut tree = VisualTree::new();
    let window = tree.create_root(VisualRole::layer_manager());
    let content = tree.create_visual(VisualRole::Panel);
    tree.add_layer(window, content, 0, LayerKind::Content);
    let target = element(&mut tree, content, Rect::new(0.0, 0.0, 5.0, 5.0));

    let mut engine = AdornerEngine::default();
    let _ = engine.resolve_surface(&mut tree, target, &mut Tracer::none());
    let mgr: &dyn LayerHost = tree.layer_host(window).expect("layer manager");
    assert!(mgr.layers().iter().any(|s| s.kind == LayerKind::Overlay));
}
