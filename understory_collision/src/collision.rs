// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision records.

use understory_inverted_index::{BoxId, Face};

/// How a contact came about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CollisionType {
    /// The moving box reached the candidate during the sweep.
    Entry,
    /// The boxes already touched or overlapped when the context was built.
    Static,
    /// The moving box left the candidate during the sweep.
    Exit,
}

/// One contact between a moving box and an indexed box.
///
/// A box touching a candidate on several faces at once (resting in a corner,
/// say) yields one record per touching face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Collision {
    /// Caller-chosen id of the context that found the contact.
    pub context_id: u32,
    /// How the contact came about.
    pub kind: CollisionType,
    /// The face of the moving box that is in contact.
    pub face: Face,
    /// The indexed box.
    pub id: BoxId,
    /// Penetration depth along `face`; zero when the faces just touch.
    pub overlap: f32,
    /// Time into the query at which the contact happens; zero for [`CollisionType::Static`].
    pub dtime: f32,
}
