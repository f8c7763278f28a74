// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated layout loop that exercises the adorner engine end to end.
//!
//! Builds a window (a layer manager with a content layer and a modal layer),
//! a scroll viewer with a tall column, and a templated detail pane. Adorners
//! are attached to targets in each, then the loop scrolls, re-templates,
//! detaches, and re-attaches while recording events to both a
//! [`PrettyPrintSink`](scrim_debug::pretty::PrettyPrintSink) and a
//! [`RecorderSink`](scrim_debug::recorder::RecorderSink). Finally it exports
//! a Chrome trace JSON file.

use std::fs::File;
use std::io::BufWriter;

use kurbo::{Rect, Vec2};
use scrim_core::trace::{
    BindingDisposedEvent, BindingTransitionEvent, BoundsPublishedEvent, InjectionSkippedEvent,
    LayoutPassEvent, StaleBoundsEvent, SurfaceResolvedEvent, TraceSink, Tracer,
};
use scrim_core::visual::{ContentTemplate, LayerKind, VisualId, VisualRole, VisualTree};
use scrim_core::{AdornerEngine, EngineConfig};

use scrim_debug::pretty::PrettyPrintSink;
use scrim_debug::recorder::RecorderSink;

const PASS_COUNT: u32 = 12;
const ROW_HEIGHT: f64 = 40.0;

/// Forwards every event to two sinks.
struct Tee<'a> {
    a: &'a mut dyn TraceSink,
    b: &'a mut dyn TraceSink,
}

impl TraceSink for Tee<'_> {
    fn on_surface_resolved(&mut self, e: &SurfaceResolvedEvent) {
        self.a.on_surface_resolved(e);
        self.b.on_surface_resolved(e);
    }

    fn on_injection_skipped(&mut self, e: &InjectionSkippedEvent) {
        self.a.on_injection_skipped(e);
        self.b.on_injection_skipped(e);
    }

    fn on_binding_transition(&mut self, e: &BindingTransitionEvent) {
        self.a.on_binding_transition(e);
        self.b.on_binding_transition(e);
    }

    fn on_binding_disposed(&mut self, e: &BindingDisposedEvent) {
        self.a.on_binding_disposed(e);
        self.b.on_binding_disposed(e);
    }

    fn on_bounds_published(&mut self, e: &BoundsPublishedEvent) {
        self.a.on_bounds_published(e);
        self.b.on_bounds_published(e);
    }

    fn on_stale_bounds(&mut self, e: &StaleBoundsEvent) {
        self.a.on_stale_bounds(e);
        self.b.on_stale_bounds(e);
    }

    fn on_layout_pass(&mut self, e: &LayoutPassEvent) {
        self.a.on_layout_pass(e);
        self.b.on_layout_pass(e);
    }
}

/// Detail pane content: a header and a body whose height depends on the item.
#[derive(Debug)]
struct DetailTemplate;

impl ContentTemplate for DetailTemplate {
    fn build(&mut self, tree: &mut VisualTree, item: u64) -> VisualId {
        let pane = tree.create_visual(VisualRole::Panel);
        let header = tree.create_visual(VisualRole::Element);
        tree.add_child(pane, header);
        tree.set_bounds(header, Rect::new(0.0, 0.0, 240.0, 32.0));
        let body = tree.create_visual(VisualRole::Element);
        tree.add_child(pane, body);
        let lines = f64::from(u8::try_from(item % 8).unwrap_or(0) + 4);
        tree.set_bounds(body, Rect::new(0.0, 32.0, 240.0, 32.0 + lines * 20.0));
        tree.set_bounds(pane, Rect::new(0.0, 0.0, 240.0, 32.0 + lines * 20.0));
        pane
    }
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let mut pretty = PrettyPrintSink::new(Box::new(std::io::stdout()));
    let mut recorder = RecorderSink::new();

    // -- window ------------------------------------------------------------
    let mut tree = VisualTree::new();
    let window = tree.create_root(VisualRole::layer_manager());
    tree.set_bounds(window, Rect::new(0.0, 0.0, 800.0, 600.0));

    let content = tree.create_visual(VisualRole::Panel);
    tree.add_layer(window, content, 0, LayerKind::Content);
    tree.set_bounds(content, Rect::new(0.0, 0.0, 800.0, 600.0));
    let modal = tree.create_visual(VisualRole::Panel);
    tree.add_layer(window, modal, 2, LayerKind::TopLevel);

    // A search box directly in the content layer.
    let search = tree.create_visual(VisualRole::Element);
    tree.add_child(content, search);
    tree.set_bounds(search, Rect::new(16.0, 16.0, 336.0, 48.0));

    // A scroll viewer showing 50 rows.
    let viewer = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(content, viewer);
    tree.set_bounds(viewer, Rect::new(16.0, 64.0, 336.0, 584.0));
    let column = tree.create_visual(VisualRole::Panel);
    tree.set_bounds(column, Rect::new(0.0, 0.0, 320.0, 50.0 * ROW_HEIGHT));
    tree.set_content(viewer, Some(column));
    let rows: Vec<VisualId> = (0..50_u32)
        .map(|i| {
            let row = tree.create_visual(VisualRole::Element);
            tree.add_child(column, row);
            let y = f64::from(i) * ROW_HEIGHT;
            tree.set_bounds(row, Rect::new(0.0, y, 320.0, y + ROW_HEIGHT));
            row
        })
        .collect();

    // A templated detail pane.
    let detail = tree.create_visual(VisualRole::scroll_presenter());
    tree.add_child(content, detail);
    tree.set_bounds(detail, Rect::new(368.0, 64.0, 784.0, 584.0));
    tree.set_content_template(detail, Box::new(DetailTemplate), 0);

    // -- adorners ----------------------------------------------------------
    let focus_ring = tree.create_visual(VisualRole::Element);
    let row_marker = tree.create_visual(VisualRole::Element);
    let pane_marker = tree.create_visual(VisualRole::Element);

    let mut engine = AdornerEngine::new(EngineConfig::coarse());
    {
        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        engine.set_adorner(&mut tree, search, Some(focus_ring), &mut tracer);
        engine.set_adorner(&mut tree, rows[30], Some(row_marker), &mut tracer);
        engine.set_adorner(&mut tree, detail, Some(pane_marker), &mut tracer);
    }

    // -- simulated loop ----------------------------------------------------
    for pass in 0..PASS_COUNT {
        match pass {
            // Scroll the viewer a row at a time.
            1..=4 => {
                let offset = tree.scroll_offset(viewer).unwrap_or(Vec2::ZERO);
                tree.set_scroll_offset(viewer, offset + Vec2::new(0.0, ROW_HEIGHT));
            }
            // Show a different item in the detail pane.
            5 => tree.set_content_item(detail, 3),
            // Pull the marked row out of the list, then put it back.
            6 => tree.remove_from_parent(rows[30]),
            8 => tree.add_child(column, rows[30]),
            // Move the focus ring from the search box to a row.
            9 => {
                let mut tracer = Tracer::new(&mut recorder);
                engine.set_adorner(&mut tree, rows[2], Some(focus_ring), &mut tracer);
            }
            // Resize the search box; its adorner is gone, nothing republishes.
            10 => tree.set_bounds(search, Rect::new(16.0, 16.0, 400.0, 48.0)),
            _ => {}
        }

        let mut tee = Tee {
            a: &mut pretty,
            b: &mut recorder,
        };
        let mut tracer = Tracer::new(&mut tee);
        let _ = engine.layout(&mut tree, &mut tracer);
    }

    for (name, adorner) in [
        ("focus ring", focus_ring),
        ("row marker", row_marker),
        ("pane marker", pane_marker),
    ] {
        match tree.rendered_rect(adorner, window) {
            Some(r) => println!(
                "{name}: ({:.0}, {:.0}) {:.0}x{:.0}",
                r.x0,
                r.y0,
                r.width(),
                r.height()
            ),
            None => println!("{name}: hidden"),
        }
    }

    // -- export Chrome trace -----------------------------------------------
    let path = "overlay_trace.json";
    let file = File::create(path).expect("failed to create overlay_trace.json");
    let mut writer = BufWriter::new(file);
    scrim_debug::chrome::export(recorder.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} ({PASS_COUNT} layout passes)");
}
