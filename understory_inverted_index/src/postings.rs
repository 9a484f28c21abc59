// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Id-ordered posting lists built from runs of face entries.
//!
//! Every entry of a face sequence holds its ids in ascending order, because ids
//! are handed out in increasing order and appended. A run of entries can
//! therefore be merged into one id-ordered list with a heap, and two such
//! lists can be intersected or subtracted by walking them side by side.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::index::{AttributeIndex, BoxId};

/// One id together with the offset of the face it was found on.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Posting {
    /// The box.
    pub id: BoxId,
    /// Offset of the face entry the id came from.
    pub offset: f32,
}

/// Id-ordered merge over the id lists of a run of entries of one face.
///
/// Since a box contributes exactly one offset per face, the merged stream never
/// repeats an id.
#[derive(Clone, Debug)]
pub struct Merge<'a> {
    entries: &'a [AttributeIndex],
    // (next id, entry, position of that id in the entry)
    heap: BinaryHeap<Reverse<(BoxId, usize, usize)>>,
}

impl<'a> Merge<'a> {
    /// Merge the ids of all `entries`.
    pub fn new(entries: &'a [AttributeIndex]) -> Self {
        let heap = entries
            .iter()
            .enumerate()
            .filter_map(|(e, entry)| entry.ids().first().map(|&id| Reverse((id, e, 0))))
            .collect();
        Self { entries, heap }
    }
}

impl Iterator for Merge<'_> {
    type Item = Posting;

    fn next(&mut self) -> Option<Posting> {
        let Reverse((id, e, pos)) = self.heap.pop()?;
        let entry = &self.entries[e];
        if let Some(&next) = entry.ids().get(pos + 1) {
            self.heap.push(Reverse((next, e, pos + 1)));
        }
        Some(Posting {
            id,
            offset: entry.offset(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .heap
            .iter()
            .map(|Reverse((_, e, pos))| self.entries[*e].ids().len() - pos)
            .sum();
        (remaining, Some(remaining))
    }
}

/// First position in `list[from..]` whose id is `>= id`, as an absolute position.
///
/// Gallops from `from` so that skipping a short distance stays cheap.
fn skip_to(list: &[Posting], from: usize, id: BoxId) -> usize {
    let mut lo = from;
    let mut step = 1;
    while lo + step < list.len() && list[lo + step].id < id {
        lo += step;
        step *= 2;
    }
    let hi = (lo + step + 1).min(list.len());
    let lo = lo.min(hi);
    lo + list[lo..hi].partition_point(|p| p.id < id)
}

/// Ids present in both lists, with the offset from each.
///
/// Both inputs must be sorted by id without repeats.
pub fn intersect(a: &[Posting], b: &[Posting]) -> Vec<(BoxId, f32, f32)> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let (x, y) = (a[i], b[j]);
        if x.id == y.id {
            out.push((x.id, x.offset, y.offset));
            i += 1;
            j += 1;
        } else if x.id < y.id {
            i = skip_to(a, i, y.id);
        } else {
            j = skip_to(b, j, x.id);
        }
    }
    out
}

/// Postings of `a` whose id does not appear in `b`.
///
/// Both inputs must be sorted by id without repeats.
pub fn difference(a: &[Posting], b: &[Posting]) -> Vec<Posting> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &p in a {
        j = skip_to(b, j, p.id);
        if b.get(j).is_none_or(|q| q.id != p.id) {
            out.push(p);
        }
    }
    out
}
