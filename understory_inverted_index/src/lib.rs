// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_inverted_index --heading-base-level=0

//! Understory Inverted Index: a face-sorted index over 3D axis-aligned boxes.
//!
//! The index answers "which boxes could a box moving along one axis touch,
//! and where?" without storing boxes as records. Each of the six faces of a
//! box (`MinX` .. `MaxZ`) has its own sorted sequence of offsets, and each
//! entry of a sequence lists the ids of the boxes that have that face there.
//!
//! - [`InvertedIndex::index`] appends a box and returns its [`BoxId`].
//! - Bound searches (`lower`/`upper`, forward and backward, whole-sequence or
//!   within a range) return [`Handle`]s into a face sequence.
//! - [`InvertedIndex::interval`] and [`InvertedIndex::half_open_interval`]
//!   slice a face sequence by offset.
//! - [`InvertedIndex::axis_overlap`] and [`InvertedIndex::overlapping`] find
//!   boxes intersecting a range or a box, using the id-ordered set algebra in
//!   [`postings`].
//!
//! The index is append-only: ids are dense, sequential and never reused.
//! Boxes without volume are given an id but never enter a face sequence.
//!
//! Sweeping collision queries on top of this index live in the
//! `understory_collision` crate.
//!
//! # Example
//!
//! ```rust
//! use understory_inverted_index::{Aabb3D, Face, InvertedIndex};
//!
//! let mut idx = InvertedIndex::new();
//! let floor = idx.index(Aabb3D::new(-10.0, -1.0, -10.0, 10.0, 0.0, 10.0));
//! let crate_ = idx.index(Aabb3D::new(2.0, 0.0, 2.0, 3.0, 1.0, 3.0));
//!
//! // The first MinX entry at or after 0.0 is the crate.
//! let h = idx.lower_attribute_bound(Face::MinX, 0.0);
//! assert_eq!(idx.attribute_index(h).ids(), &[crate_]);
//!
//! // A player standing on the floor touches it.
//! let player = Aabb3D::new(0.0, 0.0, 0.0, 0.5, 1.8, 0.5);
//! assert_eq!(idx.overlapping(&player), vec![floor]);
//! ```
//!
//! ## Features
//!
//! - `std`: enables `std` support in `tracing` and `thiserror`. The crate
//!   itself is `no_std` + `alloc` either way.
//!
//! ### Float semantics
//!
//! Face offsets must not be NaN. Debug builds assert on insertion.

#![no_std]

extern crate alloc;

mod handle;
mod index;
pub mod postings;
mod types;

pub use handle::{Handle, HandleError};
pub use index::{AttributeIndex, AxisHit, BoxId, InvertedIndex};
pub use types::{Aabb3D, Axis, Face, FaceMask};
