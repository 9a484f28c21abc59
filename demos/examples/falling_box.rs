// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A tiny physics stepper driving swept queries.
//!
//! A player box is thrown across a floor with a wall and a step on it. Each
//! tick moves the box one axis at a time: a query sweeps the axis, the first
//! contact on the face moving forward stops the motion there, and velocity
//! along that axis is zeroed.
//!
//! Run:
//! - `cargo run -p understory_demos --example falling_box`
//!
//! Set `RUST_LOG=debug` (or `trace`) to see the queries being built.

use tracing::info;
use understory_collision::{Collision, CollisionType, get_1d_query};
use understory_inverted_index::{Aabb3D, Axis, BoxId, InvertedIndex};

const GRAVITY: f32 = -9.81;
const TICK: f32 = 1.0 / 20.0;

#[derive(Debug)]
struct Body {
    aabb: Aabb3D,
    velocity: [f32; 3],
}

fn build_world() -> (InvertedIndex, Vec<&'static str>) {
    let mut idx = InvertedIndex::new();
    let mut names = Vec::new();
    let mut add = |name, aabb| {
        let id: BoxId = idx.index(aabb);
        assert_eq!(id.get() as usize, names.len(), "ids are dense");
        names.push(name);
    };
    add("floor", Aabb3D::new(-20.0, -1.0, -20.0, 20.0, 0.0, 20.0));
    add("step", Aabb3D::new(3.0, 0.0, -2.0, 5.0, 0.5, 2.0));
    add("wall", Aabb3D::new(8.0, 0.0, -5.0, 9.0, 4.0, 5.0));
    // No volume: indexed, but never collides.
    add("decal", Aabb3D::new(1.0, 0.0, -1.0, 2.0, 0.0, 1.0));
    (idx, names)
}

/// Move `body` along `axis` for `dt`, stopping at the first contact ahead.
fn step_axis(
    idx: &InvertedIndex,
    names: &[&str],
    body: &mut Body,
    axis: Axis,
    dt: f32,
    tick: u32,
) {
    let v = body.velocity[axis.index()];
    if v == 0.0 {
        return;
    }
    let mut query = get_1d_query(tick, body.aabb, dt, axis, v, idx, None);
    // Contacts on the face we move towards stop us: new entries, and
    // resting contacts that were already there.
    let front = if v > 0.0 {
        axis.max_face()
    } else {
        axis.min_face()
    };
    let blocks = |c: &&Collision| {
        c.kind == CollisionType::Entry || (c.kind == CollisionType::Static && c.face == front)
    };
    let mut hits: Vec<Collision> = Vec::new();
    // Walk forward one event at a time until something blocks.
    let stop = loop {
        let limit = query.next_event_time().unwrap_or(dt);
        hits.clear();
        query.get_collisions(limit, &mut hits);
        if let Some(hit) = hits.iter().find(blocks) {
            break Some(*hit);
        }
        if query.is_finished() {
            break None;
        }
    };

    let travelled = match stop {
        Some(hit) => {
            info!(
                tick,
                ?axis,
                other = names[hit.id.get() as usize],
                face = ?hit.face,
                dtime = hit.dtime,
                "contact"
            );
            body.velocity[axis.index()] = 0.0;
            v * hit.dtime
        }
        None => v * dt,
    };
    body.aabb = body.aabb.translated(axis, travelled);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (idx, names) = build_world();
    for (i, name) in names.iter().enumerate() {
        let id = BoxId::new(u32::try_from(i).expect("few boxes"));
        if idx.is_inert(id) {
            info!(name, "inert box");
        }
    }

    let mut body = Body {
        aabb: Aabb3D::new(0.0, 3.0, -0.5, 1.0, 4.0, 0.5),
        velocity: [4.0, 0.0, 0.0],
    };

    for tick in 0..60 {
        body.velocity[Axis::Y.index()] += GRAVITY * TICK;
        for axis in [Axis::Y, Axis::X, Axis::Z] {
            step_axis(&idx, &names, &mut body, axis, TICK, tick);
        }
        if tick % 10 == 0 {
            info!(
                tick,
                x = body.aabb.min_x,
                y = body.aabb.min_y,
                vx = body.velocity[0],
                vy = body.velocity[1],
                "body"
            );
        }
    }

    let mut out = Vec::new();
    let _ = get_1d_query(u32::MAX, body.aabb, 0.0, Axis::Y, 0.0, &idx, Some(&mut out));
    for c in &out {
        info!(
            other = names[c.id.get() as usize],
            face = ?c.face,
            overlap = c.overlap,
            "resting contact"
        );
    }
}
