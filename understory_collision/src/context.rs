// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-mover candidate tracking.

use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_inverted_index::{Aabb3D, Axis, BoxId, Face, FaceMask, InvertedIndex};

use crate::collision::{Collision, CollisionType};

/// What the context knows about one candidate box.
#[derive(Copy, Clone, Debug, Default)]
struct Detail {
    /// Faces of the candidate that currently line up with the mover.
    mask: FaceMask,
    /// Last recorded offset of each face, indexed by [`Face::index`].
    offsets: [f32; 6],
}

impl Detail {
    fn set(&mut self, face: Face, offset: f32) {
        self.offsets[face.index()] = offset;
        self.mask |= face.mask();
    }

    fn has(&self, face: Face) -> bool {
        self.mask.contains(face.mask())
    }
}

/// The working set of one moving box against an [`InvertedIndex`].
///
/// For every candidate box the context keeps a [`FaceMask`] of the faces that
/// line up with the mover on their axis. When each axis has at least one such
/// face, the boxes touch or overlap and the context emits [`Collision`]
/// records. Candidates whose mask drains to empty are forgotten, so the map
/// stays small over a long sweep.
///
/// The context borrows the index, which therefore cannot gain boxes while the
/// context is alive.
#[derive(Clone, Debug)]
pub struct CollisionQueryContext<'a> {
    context_id: u32,
    aabb: Aabb3D,
    widths: [f32; 3],
    index: &'a InvertedIndex,
    details: HashMap<BoxId, Detail>,
    pending: Vec<Collision>,
}

impl<'a> CollisionQueryContext<'a> {
    /// Seed a context for a box at `aabb`.
    ///
    /// Every indexed box that touches or overlaps `aabb` is reported as a
    /// [`CollisionType::Static`] collision with `dtime == 0`. Those records are
    /// appended to `out` when given; otherwise they are held back and handed
    /// out by [`take_pending`](Self::take_pending).
    pub fn new(
        context_id: u32,
        aabb: Aabb3D,
        index: &'a InvertedIndex,
        out: Option<&mut Vec<Collision>>,
    ) -> Self {
        let mut ctx = Self {
            context_id,
            aabb,
            widths: aabb.widths(),
            index,
            details: HashMap::new(),
            pending: Vec::new(),
        };
        let mut statics = Vec::new();
        let found: usize = Axis::ALL
            .into_iter()
            .map(|axis| ctx.init(axis, &mut statics))
            .sum();
        tracing::debug!(
            context_id,
            candidates = ctx.details.len(),
            statics = found,
            "collision context seeded"
        );
        match out {
            Some(out) => out.append(&mut statics),
            None => ctx.pending = statics,
        }
        ctx
    }

    /// Seed the candidates of one axis.
    ///
    /// Boxes whose extent on `axis` reaches the mover's are entered with both
    /// faces of the axis. Boxes entirely before or after the mover are left to
    /// the sweep.
    fn init(&mut self, axis: Axis, out: &mut Vec<Collision>) -> usize {
        let (lo, hi) = (
            self.aabb.face(axis.min_face()),
            self.aabb.face(axis.max_face()),
        );
        let mut count = 0;
        for hit in self.index.axis_overlap(axis, lo, hi) {
            let detail = self.details.entry(hit.id).or_default();
            detail.set(axis.min_face(), hit.min);
            detail.set(axis.max_face(), hit.max);
            if detail.mask.covers_all_axes() {
                count += self.register_collision(hit.id, None, CollisionType::Static, 0.0, out);
            }
        }
        count
    }

    /// The caller-chosen id stamped on every record.
    #[inline]
    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    /// Current position of the moving box.
    #[inline]
    pub fn aabb(&self) -> Aabb3D {
        self.aabb
    }

    /// The index this context reads from.
    #[inline]
    pub fn index(&self) -> &'a InvertedIndex {
        self.index
    }

    /// Number of boxes currently tracked.
    #[inline]
    pub fn candidate_count(&self) -> usize {
        self.details.len()
    }

    /// The lined-up faces of a tracked box and their recorded offsets.
    pub fn valid_faces(&self, id: BoxId) -> Option<(FaceMask, [f32; 6])> {
        self.details.get(&id).map(|d| (d.mask, d.offsets))
    }

    /// Signed distance from each face of the mover to the opposite face of a tracked box.
    ///
    /// The array is indexed by the mover's [`Face::index`]. An entry is `None`
    /// when the box's opposite face is not lined up. Each distance is the
    /// mover's face offset minus the box's face offset, so a mover standing
    /// on a floor sees `Some(0.0)` at [`Face::MinY`].
    pub fn face_distances(&self, id: BoxId) -> Option<[Option<f32>; 6]> {
        let detail = self.details.get(&id)?;
        let faces = self.aabb.faces();
        Some(Face::ALL.map(|face| {
            let opposite = face.opposite();
            detail
                .has(opposite)
                .then(|| faces[face.index()] - detail.offsets[opposite.index()])
        }))
    }

    /// Move the static records held back at construction into `out`.
    pub fn take_pending(&mut self, out: &mut Vec<Collision>) -> usize {
        let count = self.pending.len();
        out.append(&mut self.pending);
        count
    }

    /// Whether static records are still held back.
    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Record that the candidates `ids` have `face` at `offset` lined up with the mover.
    ///
    /// A candidate whose mask becomes complete through this call is reported,
    /// with the mover's face opposite `face` as the trigger. Returns the
    /// number of records appended.
    pub fn add(
        &mut self,
        face: Face,
        offset: f32,
        ids: &[BoxId],
        kind: CollisionType,
        dtime: f32,
        out: &mut Vec<Collision>,
    ) -> usize {
        let mut count = 0;
        for &id in ids {
            let detail = self.details.entry(id).or_default();
            let was_full = detail.mask.covers_all_axes();
            detail.set(face, offset);
            if !was_full && detail.mask.covers_all_axes() {
                count += self.register_collision(id, Some(face.opposite()), kind, dtime, out);
            }
        }
        count
    }

    /// Record that the candidates `ids` leave the mover's reach through `face` at `offset`.
    ///
    /// A candidate that still touches the mover gets a final report before
    /// both faces of the axis are cleared. Candidates left with no faces are
    /// forgotten; ids that are not tracked are ignored.
    pub fn remove(
        &mut self,
        face: Face,
        offset: f32,
        ids: &[BoxId],
        kind: CollisionType,
        dtime: f32,
        out: &mut Vec<Collision>,
    ) -> usize {
        let mut count = 0;
        for &id in ids {
            let Some(detail) = self.details.get_mut(&id) else {
                continue;
            };
            detail.set(face, offset);
            if detail.mask.covers_all_axes() {
                count += self.register_collision(id, Some(face.opposite()), kind, dtime, out);
            }
            let Some(detail) = self.details.get_mut(&id) else {
                continue;
            };
            detail.mask.remove(FaceMask::of_axis(face.axis()));
            if detail.mask.is_empty() {
                self.details.remove(&id);
            }
        }
        count
    }

    /// Emit the records for a candidate whose mask is complete.
    ///
    /// One record is written for each face of the mover that is the trigger
    /// or that sits exactly on the candidate's opposite face. A candidate
    /// overlapping the mover without any touching face gets a single record
    /// for the face with the least penetration.
    fn register_collision(
        &self,
        id: BoxId,
        trigger: Option<Face>,
        kind: CollisionType,
        dtime: f32,
        out: &mut Vec<Collision>,
    ) -> usize {
        let Some(detail) = self.details.get(&id) else {
            return 0;
        };
        let faces = self.aabb.faces();
        let penetration = |face: Face| {
            let other = detail.offsets[face.opposite().index()];
            if face.is_min() {
                other - faces[face.index()]
            } else {
                faces[face.index()] - other
            }
        };
        let record = |face: Face| Collision {
            context_id: self.context_id,
            kind,
            face,
            id,
            overlap: penetration(face),
            dtime,
        };

        let before = out.len();
        for face in Face::ALL {
            let opposite = face.opposite();
            let touching = detail.has(opposite)
                && detail.offsets[opposite.index()] == faces[face.index()];
            if Some(face) == trigger || touching {
                out.push(record(face));
            }
        }
        if out.len() == before {
            let least = Face::ALL
                .into_iter()
                .filter(|f| detail.has(f.opposite()))
                .min_by(|a, b| penetration(*a).total_cmp(&penetration(*b)));
            if let Some(face) = least {
                out.push(record(face));
            }
        }
        out.len() - before
    }

    /// Place the mover so that its face opposite `face` sits at `offset`.
    fn place(&mut self, face: Face, offset: f32) {
        let mover = face.opposite();
        let width = self.widths[mover.axis().index()];
        let (min, max) = if mover.is_min() {
            (offset, offset + width)
        } else {
            (offset - width, offset)
        };
        match mover.axis() {
            Axis::X => (self.aabb.min_x, self.aabb.max_x) = (min, max),
            Axis::Y => (self.aabb.min_y, self.aabb.max_y) = (min, max),
            Axis::Z => (self.aabb.min_z, self.aabb.max_z) = (min, max),
        }
    }

    /// Advance the mover onto candidates' `face` at `offset` and add them as entries.
    ///
    /// `face` is the candidates' face; the mover's opposite face is moved to
    /// `offset`.
    pub fn move_add(
        &mut self,
        face: Face,
        offset: f32,
        ids: &[BoxId],
        dtime: f32,
        out: &mut Vec<Collision>,
    ) -> usize {
        self.place(face, offset);
        self.add(face, offset, ids, CollisionType::Entry, dtime, out)
    }

    /// Advance the mover off candidates' `face` at `offset` and remove them as exits.
    pub fn move_remove(
        &mut self,
        face: Face,
        offset: f32,
        ids: &[BoxId],
        dtime: f32,
        out: &mut Vec<Collision>,
    ) -> usize {
        self.place(face, offset);
        self.remove(face, offset, ids, CollisionType::Exit, dtime, out)
    }
}
