// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The inverted index: one sorted offset sequence per face.

use alloc::vec::Vec;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::handle::{Handle, HandleError};
use crate::postings::{self, Merge, Posting};
use crate::types::{Aabb3D, Axis, Face};

/// Identifier of an indexed box.
///
/// Ids are dense and sequential, starting at zero in insertion order. They are
/// never reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(u32);

impl BoxId {
    /// Wrap a raw id.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// One entry of a face sequence: an offset and every box with that face there.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeIndex {
    offset: f32,
    ids: SmallVec<[BoxId; 4]>,
}

impl AttributeIndex {
    fn new(offset: f32, id: BoxId) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        Self { offset, ids }
    }

    #[cfg(test)]
    pub(crate) fn from_ids(offset: f32, ids: &[u32]) -> Self {
        Self {
            offset,
            ids: ids.iter().copied().map(BoxId::new).collect(),
        }
    }

    /// The face offset shared by all ids of this entry.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The boxes with a face at this offset, in ascending id order.
    #[inline]
    pub fn ids(&self) -> &[BoxId] {
        &self.ids
    }
}

/// A box that overlaps a query range on one axis, with both of its face offsets there.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AxisHit {
    /// The box.
    pub id: BoxId,
    /// Offset of the box's min face on the axis.
    pub min: f32,
    /// Offset of the box's max face on the axis.
    pub max: f32,
}

/// Inverted index over axis-aligned boxes.
///
/// Instead of storing each box as six coordinates, the index keeps one sorted
/// sequence per [`Face`], mapping each distinct offset to the ids of the boxes
/// that have that face there. Sweeping a face of a moving box through space is
/// then a walk along one sequence, and the ids met on the way are the only
/// boxes that can start or stop touching it.
///
/// The index is append-only. Bound searches and accessors take `&self` and
/// never change what the index contains.
#[derive(Clone, Debug, Default)]
pub struct InvertedIndex {
    faces: [Vec<AttributeIndex>; 6],
    generations: [u32; 6],
    count: u32,
    max_width: [f32; 3],
    inert: HashSet<BoxId>,
}

impl InvertedIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box to the index and return its id.
    ///
    /// A box with no volume (zero, negative or NaN width on some axis) still
    /// receives a fresh id, but it is not entered into any face and does not
    /// count towards [`max_width`](Self::max_width): it can never be found by
    /// a search. Such ids are reported by [`is_inert`](Self::is_inert).
    pub fn index(&mut self, aabb: Aabb3D) -> BoxId {
        let id = BoxId(self.count);
        self.count = self
            .count
            .checked_add(1)
            .expect("inverted index ran out of 32-bit box ids");

        if aabb.is_degenerate() {
            tracing::warn!(
                id = id.get(),
                ?aabb,
                "degenerate box indexed as inert; it will never collide"
            );
            self.inert.insert(id);
            return id;
        }

        for face in Face::ALL {
            self.insert_face(face, aabb.face(face), id);
        }
        for (max, width) in self.max_width.iter_mut().zip(aabb.widths()) {
            if width > *max {
                *max = width;
            }
        }
        id
    }

    fn insert_face(&mut self, face: Face, offset: f32, id: BoxId) {
        debug_assert!(!offset.is_nan(), "face offsets must not be NaN");
        let entries = &mut self.faces[face.index()];
        let pos = entries.partition_point(|e| e.offset < offset);
        match entries.get_mut(pos) {
            Some(entry) if entry.offset == offset => entry.ids.push(id),
            _ => {
                entries.insert(pos, AttributeIndex::new(offset, id));
                // Every entry from `pos` on moved, so older handles are stale.
                self.generations[face.index()] = self.generations[face.index()].wrapping_add(1);
            }
        }
    }

    /// Number of ids handed out, inert boxes included.
    #[inline]
    pub fn len(&self) -> usize {
        self.count as usize
    }

    /// Whether no box has been indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether `id` was given to a degenerate box that is not in any face.
    pub fn is_inert(&self, id: BoxId) -> bool {
        self.inert.contains(&id)
    }

    /// Largest `max - min` per axis over all indexed boxes, as `[x, y, z]`.
    #[inline]
    pub fn max_width(&self) -> [f32; 3] {
        self.max_width
    }

    /// Largest `max - min` along one axis.
    #[inline]
    pub fn max_width_along(&self, axis: Axis) -> f32 {
        self.max_width[axis.index()]
    }

    /// All entries of one face, in ascending offset order.
    #[inline]
    pub fn entries(&self, face: Face) -> &[AttributeIndex] {
        &self.faces[face.index()]
    }

    /// Handle to the first entry of `face`.
    #[inline]
    pub fn begin(&self, face: Face) -> Handle {
        self.handle_at(face, 0)
    }

    /// Handle one past the last entry of `face`.
    #[inline]
    pub fn end(&self, face: Face) -> Handle {
        self.handle_at(face, self.len_of(face))
    }

    /// A current handle to an arbitrary position of `face`.
    #[inline]
    pub fn handle_at(&self, face: Face, position: isize) -> Handle {
        Handle::new(face, position, self.generations[face.index()])
    }

    #[allow(
        clippy::cast_possible_wrap,
        reason = "A Vec never holds more than isize::MAX elements."
    )]
    fn len_of(&self, face: Face) -> isize {
        self.faces[face.index()].len() as isize
    }

    fn check(&self, face: Face, handle: Handle) -> Result<(), HandleError> {
        if handle.face() != face {
            return Err(HandleError::WrongFace {
                expected: face,
                found: handle.face(),
            });
        }
        let expected = self.generations[face.index()];
        if handle.generation() != expected {
            return Err(HandleError::Stale {
                face,
                expected,
                found: handle.generation(),
            });
        }
        Ok(())
    }

    /// Slice bounds of a `[begin, end)` range of handles.
    #[allow(
        clippy::cast_sign_loss,
        reason = "Positions are checked to lie in 0..=len before the cast."
    )]
    fn range(&self, face: Face, begin: Handle, end: Handle) -> (usize, usize) {
        for h in [begin, end] {
            if let Err(err) = self.check(face, h) {
                panic!("inverted index invariant violated: {err}");
            }
        }
        let len = self.len_of(face);
        let (lo, hi) = (begin.position(), end.position());
        assert!(
            0 <= lo && lo <= hi && hi <= len,
            "inverted index invariant violated: range [{lo}, {hi}) is not within {face:?} (0..={len})"
        );
        (lo as usize, hi as usize)
    }

    #[allow(
        clippy::cast_possible_wrap,
        reason = "A Vec never holds more than isize::MAX elements."
    )]
    fn handle(&self, face: Face, position: usize) -> Handle {
        self.handle_at(face, position as isize)
    }

    /// Handle to the first entry of `face` whose offset is `>= offset`.
    pub fn lower_attribute_bound(&self, face: Face, offset: f32) -> Handle {
        let entries = self.entries(face);
        self.handle(face, entries.partition_point(|e| e.offset < offset))
    }

    /// Like [`lower_attribute_bound`](Self::lower_attribute_bound), searching only `[begin, end)`.
    ///
    /// Returns `begin` if every entry in the range is `>= offset` and `end` if none is.
    ///
    /// # Panics
    ///
    /// Panics if `begin` or `end` is stale or belongs to another face, if
    /// `begin` is after `end`, or if either lies outside `0..=len`.
    pub fn lower_attribute_bound_in(
        &self,
        face: Face,
        offset: f32,
        begin: Handle,
        end: Handle,
    ) -> Handle {
        let (lo, hi) = self.range(face, begin, end);
        let found = self.entries(face)[lo..hi].partition_point(|e| e.offset < offset);
        self.handle(face, lo + found)
    }

    /// Handle to the first entry of `face` whose offset is `> offset`.
    pub fn upper_attribute_bound(&self, face: Face, offset: f32) -> Handle {
        let entries = self.entries(face);
        self.handle(face, entries.partition_point(|e| e.offset <= offset))
    }

    /// Like [`upper_attribute_bound`](Self::upper_attribute_bound), searching only `[begin, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `begin` or `end` is stale or belongs to another face, if
    /// `begin` is after `end`, or if either lies outside `0..=len`.
    pub fn upper_attribute_bound_in(
        &self,
        face: Face,
        offset: f32,
        begin: Handle,
        end: Handle,
    ) -> Handle {
        let (lo, hi) = self.range(face, begin, end);
        let found = self.entries(face)[lo..hi].partition_point(|e| e.offset <= offset);
        self.handle(face, lo + found)
    }

    /// Handle to the last entry of `face` whose offset is `<= offset`, or `-1`.
    ///
    /// This is the lower bound when walking the sequence in descending order.
    pub fn lower_back_attribute_bound(&self, face: Face, offset: f32) -> Handle {
        self.upper_attribute_bound(face, offset).prev()
    }

    /// Descending lower bound over the entries from `begin` down to `end` (exclusive).
    ///
    /// `begin >= end`; the range is the ascending range `[end + 1, begin + 1)`
    /// searched with [`upper_attribute_bound_in`](Self::upper_attribute_bound_in).
    ///
    /// # Panics
    ///
    /// Panics if `begin` or `end` is stale or belongs to another face, if
    /// `begin` is before `end`, or if either lies outside `-1..len`.
    pub fn lower_back_attribute_bound_in(
        &self,
        face: Face,
        offset: f32,
        begin: Handle,
        end: Handle,
    ) -> Handle {
        self.upper_attribute_bound_in(face, offset, end.next(), begin.next())
            .prev()
    }

    /// Handle to the last entry of `face` whose offset is `< offset`, or `-1`.
    ///
    /// This is the upper bound when walking the sequence in descending order.
    pub fn upper_back_attribute_bound(&self, face: Face, offset: f32) -> Handle {
        self.lower_attribute_bound(face, offset).prev()
    }

    /// Descending upper bound over the entries from `begin` down to `end` (exclusive).
    ///
    /// # Panics
    ///
    /// Panics if `begin` or `end` is stale or belongs to another face, if
    /// `begin` is before `end`, or if either lies outside `-1..len`.
    pub fn upper_back_attribute_bound_in(
        &self,
        face: Face,
        offset: f32,
        begin: Handle,
        end: Handle,
    ) -> Handle {
        self.lower_attribute_bound_in(face, offset, end.next(), begin.next())
            .prev()
    }

    /// The entry a handle points at.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, out of range, or belongs to another face
    /// than its own. Use [`try_attribute_index`](Self::try_attribute_index) to
    /// get a [`HandleError`] instead.
    pub fn attribute_index(&self, handle: Handle) -> &AttributeIndex {
        match self.try_attribute_index(handle) {
            Ok(entry) => entry,
            Err(err) => panic!("inverted index invariant violated: {err}"),
        }
    }

    /// The entry a handle points at, or why it cannot be read.
    pub fn try_attribute_index(&self, handle: Handle) -> Result<&AttributeIndex, HandleError> {
        let face = handle.face();
        self.check(face, handle)?;
        let entries = self.entries(face);
        usize::try_from(handle.position())
            .ok()
            .and_then(|pos| entries.get(pos))
            .ok_or(HandleError::OutOfRange {
                face,
                position: handle.position(),
                len: entries.len(),
            })
    }

    /// Entries of `face` in the open interval `(a, b)` if `a < b`, or in the
    /// closed interval `[b, a]` if `b < a`.
    pub fn interval(&self, face: Face, a: f32, b: f32) -> &[AttributeIndex] {
        let lo = self.upper_attribute_bound(face, a).position();
        let hi = self.lower_attribute_bound(face, b).position();
        self.slice(face, lo, hi)
    }

    /// Entries of `face` in `[a, b)` if `a <= b`, or in `(b, a]` if `b < a`.
    pub fn half_open_interval(&self, face: Face, a: f32, b: f32) -> &[AttributeIndex] {
        if b < a {
            let lo = self.upper_attribute_bound(face, a).position();
            let hi = self.upper_attribute_bound(face, b).position();
            self.slice(face, lo, hi)
        } else {
            let lo = self.lower_attribute_bound(face, a).position();
            let hi = self.lower_attribute_bound(face, b).position();
            self.slice(face, lo, hi)
        }
    }

    #[allow(
        clippy::cast_sign_loss,
        reason = "Forward bounds are never negative."
    )]
    fn slice(&self, face: Face, a: isize, b: isize) -> &[AttributeIndex] {
        let (lo, hi) = if b < a { (b, a) } else { (a, b) };
        &self.entries(face)[lo as usize..hi as usize]
    }

    /// Boxes whose extent on `axis` intersects the closed range `[lo, hi]`, in id order.
    ///
    /// A box can only reach into the range if its min face lies in
    /// `[lo - w, hi]` and its max face in `[lo, hi + w]`, where `w` is the
    /// largest width along the axis; the result is the intersection of those
    /// two windows.
    pub fn axis_overlap(&self, axis: Axis, lo: f32, hi: f32) -> Vec<AxisHit> {
        let w = self.max_width_along(axis);
        let mins: Vec<Posting> = Merge::new(self.interval(axis.min_face(), hi, lo - w)).collect();
        let maxs: Vec<Posting> = Merge::new(self.interval(axis.max_face(), hi + w, lo)).collect();
        postings::intersect(&mins, &maxs)
            .into_iter()
            .map(|(id, min, max)| AxisHit { id, min, max })
            .collect()
    }

    /// Ids of the boxes that intersect `aabb`, touching included, in id order.
    pub fn overlapping(&self, aabb: &Aabb3D) -> Vec<BoxId> {
        let mut sets = Axis::ALL.map(|axis| {
            self.axis_overlap(
                axis,
                aabb.face(axis.min_face()),
                aabb.face(axis.max_face()),
            )
            .into_iter()
            .map(|hit| Posting {
                id: hit.id,
                offset: hit.min,
            })
            .collect::<Vec<_>>()
        });
        // Intersect the smallest sets first.
        sets.sort_by_key(Vec::len);
        let [a, b, c] = sets;
        let ab: Vec<Posting> = postings::intersect(&a, &b)
            .into_iter()
            .map(|(id, offset, _)| Posting { id, offset })
            .collect();
        postings::intersect(&ab, &c)
            .into_iter()
            .map(|(id, _, _)| id)
            .collect()
    }
}
