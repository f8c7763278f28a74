// Copyright 2026 the Scrim Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! The engine has no clock, so timestamps are logical: each recorded event
//! advances time by one microsecond, and each layout pass is drawn as a
//! complete slice spanning the events it produced.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use scrim_core::visual::VisualId;

use crate::recorder::{RecordedEvent, decode};

const TID_SURFACES: u32 = 0;
const TID_BINDINGS: u32 = 1;
const TID_BOUNDS: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut pass_start = 0_u64;

    for (seq, recorded) in (0_u64..).zip(decode(bytes)) {
        match recorded {
            RecordedEvent::SurfaceResolved(e) => {
                events.push(instant(
                    "SurfaceResolved",
                    "Locator",
                    seq,
                    TID_SURFACES,
                    json!({
                        "requester": id(e.requester),
                        "host": id(e.host),
                        "kind": format!("{:?}", e.kind),
                        "injected": e.injected,
                    }),
                ));
            }
            RecordedEvent::InjectionSkipped(e) => {
                events.push(instant(
                    "InjectionSkipped",
                    "Locator",
                    seq,
                    TID_SURFACES,
                    json!({
                        "host": id(e.host),
                        "kind": format!("{:?}", e.kind),
                        "reason": e.reason.to_string(),
                    }),
                ));
            }
            RecordedEvent::BindingTransition(e) => {
                events.push(instant(
                    &format!("{:?}", e.to),
                    "Binding",
                    seq,
                    TID_BINDINGS,
                    json!({
                        "target": id(e.target),
                        "adorner": id(e.adorner),
                        "from": format!("{:?}", e.from),
                    }),
                ));
            }
            RecordedEvent::BindingDisposed(e) => {
                events.push(instant(
                    "Disposed",
                    "Binding",
                    seq,
                    TID_BINDINGS,
                    json!({
                        "target": id(e.target),
                        "adorner": id(e.adorner),
                    }),
                ));
            }
            RecordedEvent::BoundsPublished(e) => {
                let r = e.bounds.surface_rect();
                events.push(instant(
                    "BoundsPublished",
                    "Bounds",
                    seq,
                    TID_BOUNDS,
                    json!({
                        "target": id(e.target),
                        "host": id(e.host),
                        "rect": [r.x0, r.y0, r.width(), r.height()],
                        "valid": e.bounds.valid,
                    }),
                ));
            }
            RecordedEvent::StaleBounds(e) => {
                events.push(instant(
                    "StaleBounds",
                    "Bounds",
                    seq,
                    TID_BOUNDS,
                    json!({ "target": id(e.target) }),
                ));
            }
            RecordedEvent::LayoutPass(e) => {
                events.push(json!({
                    "ph": "X",
                    "name": "LayoutPass",
                    "cat": "Engine",
                    "ts": pass_start,
                    "dur": seq + 1 - pass_start,
                    "pid": 0,
                    "tid": TID_SURFACES,
                    "args": {
                        "pass_index": e.pass_index,
                        "attached": e.attached,
                        "detached": e.detached,
                        "disposed": e.disposed,
                        "bounds_published": e.bounds_published,
                        "surfaces_arranged": e.surfaces_arranged,
                    }
                }));
                pass_start = seq + 1;
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, ts: u64, tid: u32, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": tid,
        "s": "t",
        "args": args,
    })
}

fn id(v: VisualId) -> String {
    format!("{}@{}", v.index(), v.generation())
}
