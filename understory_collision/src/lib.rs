// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_collision --heading-base-level=0

//! Understory Collision: swept box queries over an inverted AABB index.
//!
//! Given an [`InvertedIndex`] of static boxes, this crate answers "what does a
//! box moving along one axis hit, and when?" for a physics step.
//!
//! - [`CollisionQueryContext`] tracks, for one moving box, which faces of
//!   each nearby indexed box line up with it, and reports a [`Collision`]
//!   whenever all three axes line up.
//! - [`CollisionQuery`] sweeps the box forward or backward along one axis,
//!   walking the index's sorted face sequences in time order.
//! - [`get_1d_query`] builds both from a box, a velocity and a time step.
//!
//! Contacts present before any motion are reported as
//! [`CollisionType::Static`] with `dtime == 0`; contacts made and broken
//! during the sweep are [`CollisionType::Entry`] and [`CollisionType::Exit`],
//! stamped with the time they happen.
//!
//! # Example
//!
//! ```rust
//! use understory_collision::{CollisionType, get_1d_query};
//! use understory_inverted_index::{Aabb3D, Axis, Face, InvertedIndex};
//!
//! let mut idx = InvertedIndex::new();
//! let floor = idx.index(Aabb3D::new(-10.0, -1.0, -10.0, 10.0, 0.0, 10.0));
//!
//! // A player two units above the floor, falling at 4 units per second.
//! let player = Aabb3D::new(0.0, 2.0, 0.0, 1.0, 4.0, 1.0);
//! let mut query = get_1d_query(0, player, 1.0, Axis::Y, -4.0, &idx, None);
//!
//! let mut hits = Vec::new();
//! query.get_collisions(1.0, &mut hits);
//! assert_eq!(hits[0].id, floor);
//! assert_eq!(hits[0].kind, CollisionType::Entry);
//! assert_eq!(hits[0].face, Face::MinY);
//! assert_eq!(hits[0].dtime, 0.5);
//! ```
//!
//! ## Features
//!
//! - `std`: enables `std` support in the index and in `tracing`.
//!
//! [`InvertedIndex`]: understory_inverted_index::InvertedIndex

#![no_std]

extern crate alloc;

mod collision;
mod context;
mod query;

pub use collision::{Collision, CollisionType};
pub use context::CollisionQueryContext;
pub use query::{CollisionQuery, Direction, get_1d_query};
